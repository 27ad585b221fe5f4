// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Invariant checks for `DependencyGraph` under long random edit sequences.

use thicket_graph::{DependencyGraph, NodeTree};

/// Simple deterministic LCG so the sequences are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next_u32(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 33) as u32
    }

    fn below(&mut self, n: u32) -> u32 {
        self.next_u32() % n
    }
}

const NODES: u32 = 24;

fn assert_symmetric(graph: &DependencyGraph<u32>) {
    for a in 0..NODES {
        for b in 0..NODES {
            let forward = graph.dependents(a).any(|n| n == b);
            let backward = graph.dependencies(b).any(|n| n == a);
            assert_eq!(
                forward, backward,
                "{b} in dependents({a}) disagrees with dependencies({b})"
            );
        }
    }
    assert!(graph.is_consistent(), "internal maps out of sync");
}

#[test]
fn symmetry_holds_under_random_edits() {
    let mut rng = Lcg(0x5eed);
    let mut graph = DependencyGraph::<u32>::new();

    for _ in 0..2_000 {
        let a = rng.below(NODES);
        let b = rng.below(NODES);
        match rng.below(10) {
            0..=5 => {
                graph.add_dependency(a, b).unwrap();
            }
            6 | 7 => graph.remove_target_node(a),
            _ => graph.remove_node(a),
        }
        assert_symmetric(&graph);
    }
}

#[test]
fn double_add_matches_single_add() {
    let mut once = DependencyGraph::<u32>::new();
    let mut twice = DependencyGraph::<u32>::new();
    once.add_dependency(1, 2).unwrap();
    twice.add_dependency(1, 2).unwrap();
    twice.add_dependency(1, 2).unwrap();
    assert_eq!(once.dependent_set(2), twice.dependent_set(2));
}

/// Complete binary tree over `0..n` with node 0 detached.
struct Heap(u32);

impl NodeTree<u32> for Heap {
    fn parent(&self, node: u32) -> Option<u32> {
        (node > 0).then(|| (node - 1) / 2)
    }

    fn first_child(&self, node: u32) -> Option<u32> {
        let child = node * 2 + 1;
        (child < self.0).then_some(child)
    }

    fn next_sibling(&self, node: u32) -> Option<u32> {
        (node % 2 == 1 && node + 1 < self.0).then_some(node + 1)
    }
}

#[test]
fn remove_subtree_leaves_no_trace() {
    // Subtree rooted at 0 covers 0..15; 100.. are unrelated nodes.
    let tree = Heap(15);
    let mut rng = Lcg(7);
    let mut graph = DependencyGraph::<u32>::new();

    for _ in 0..300 {
        let a = if rng.below(2) == 0 { rng.below(15) } else { 100 + rng.below(5) };
        let b = if rng.below(2) == 0 { rng.below(15) } else { 100 + rng.below(5) };
        graph.add_dependency(a, b).unwrap();
    }

    graph.remove_subtree(0, &tree);

    for n in 0..15 {
        assert!(!graph.has_dependents(n), "{n} still has dependents");
        assert_eq!(graph.dependencies(n).count(), 0, "{n} still has targets");
        for other in 100..105 {
            assert!(
                !graph.dependents(other).any(|d| d == n),
                "{n} still depends on {other}"
            );
        }
    }
    assert!(graph.is_consistent(), "internal maps out of sync");
}
