// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use thicket_graph::{DependencyGraph, GraphTraverser, NodeTree, TraversalScratch};

#[derive(Clone)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u32(&mut self) -> u32 {
        // Numerical Recipes LCG parameters.
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 32) as u32
    }

    fn below(&mut self, upper_exclusive: u32) -> u32 {
        if upper_exclusive == 0 {
            return 0;
        }
        self.next_u32() % upper_exclusive
    }
}

/// Complete `arity`-ary tree stored in heap order.
struct HeapTree {
    len: u32,
    arity: u32,
}

impl NodeTree<u32> for HeapTree {
    fn parent(&self, node: u32) -> Option<u32> {
        (node > 0).then(|| (node - 1) / self.arity)
    }

    fn first_child(&self, node: u32) -> Option<u32> {
        let first = node.checked_mul(self.arity)?.checked_add(1)?;
        (first < self.len).then_some(first)
    }

    fn next_sibling(&self, node: u32) -> Option<u32> {
        let next = node + 1;
        (node > 0 && next < self.len && (next - 1) / self.arity == (node - 1) / self.arity)
            .then_some(next)
    }
}

/// Every node references `refs` earlier nodes, like `use` and `fill="url(#…)"`
/// pointing back into `defs`.
fn build_reference_graph(n: u32, refs: u32, seed: u64) -> DependencyGraph<u32> {
    let mut graph = DependencyGraph::new();
    let mut rng = Lcg::new(seed);
    for dependent in 1..n {
        for _ in 0..refs.min(dependent) {
            let target = rng.below(dependent);
            let _ = graph.add_dependency(dependent, target);
        }
    }
    graph
}

fn bench_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("thicket_graph");
    group.sample_size(50);

    for &(n, refs) in &[(256_u32, 1_u32), (256, 4), (4_096, 1), (4_096, 4)] {
        group.bench_function(format!("build(n={n},r={refs})"), |b| {
            b.iter(|| black_box(build_reference_graph(n, refs, 0x7C1E_0000_0000_0001)));
        });

        let graph = build_reference_graph(n, refs, 0x7C1E_0000_0000_0001);
        let mut scratch = TraversalScratch::new();
        group.bench_function(format!("transitive_dependents(n={n},r={refs})"), |b| {
            b.iter(|| {
                let mut count = 0_u32;
                graph.for_each_transitive_dependent(0, &mut scratch, |_| count += 1);
                black_box(count)
            });
        });

        group.bench_function(format!("remove_subtree(n={n},r={refs})"), |b| {
            let tree = HeapTree { len: n, arity: 4 };
            b.iter_batched(
                || graph.clone(),
                |mut graph| {
                    graph.remove_subtree(0, &tree);
                    black_box(graph)
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_traverser(c: &mut Criterion) {
    let mut group = c.benchmark_group("thicket_traverser");
    group.sample_size(50);

    for &len in &[1_024_u32, 16_384] {
        let tree = HeapTree { len, arity: 4 };
        let leaf = len - 1;

        group.bench_function(format!("root_path(n={len})"), |b| {
            b.iter(|| {
                let mut trav = GraphTraverser::new(false);
                trav.add_root_path(&tree, leaf);
                let mut visited = 0_u32;
                let _ = trav.traverse(&tree, &mut |_: u32| -> Result<(), ()> {
                    visited += 1;
                    Ok(())
                });
                black_box(visited)
            });
        });

        group.bench_function(format!("indirect_flood(n={len})"), |b| {
            let mut scratch = Some(TraversalScratch::with_capacity(len as usize));
            b.iter(|| {
                let mut trav =
                    GraphTraverser::with_scratch(scratch.take().unwrap_or_default(), true);
                trav.add_subtree(&tree, 1);
                let mut visited = 0_u32;
                let _ = trav.traverse(&tree, &mut |_: u32| -> Result<(), ()> {
                    visited += 1;
                    Ok(())
                });
                scratch = Some(trav.into_scratch());
                black_box(visited)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_graph, bench_traverser);
criterion_main!(benches);
