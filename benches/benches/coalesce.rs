// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use kurbo::Rect;
use thicket_region::{InvalidState, RegionConfig, coalesce};

const CANVAS: Rect = Rect::new(0.0, 0.0, 1920.0, 1080.0);

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

    fn below(&mut self, upper_exclusive: u32) -> f64 {
        f64::from(self.next_u32() % upper_exclusive.max(1))
    }
}

/// Small damage rectangles scattered over the canvas, like hover and
/// caret repaints.
fn scattered(count: usize, max_side: u32, seed: u64) -> Vec<Rect> {
    let mut rng = Lcg::new(seed);
    (0..count)
        .map(|_| {
            let x = rng.below(1920);
            let y = rng.below(1080);
            let w = 1.0 + rng.below(max_side);
            let h = 1.0 + rng.below(max_side);
            Rect::new(x, y, x + w, y + h)
        })
        .collect()
}

fn bench_coalesce(c: &mut Criterion) {
    let mut group = c.benchmark_group("thicket_region");
    group.sample_size(50);
    let config = RegionConfig::default();

    for &count in &[4_usize, 64, 1_024] {
        let rects = scattered(count, 64, 0x5EED_0000_0000_0001);

        group.bench_function(format!("coalesce(n={count})"), |b| {
            b.iter(|| black_box(coalesce(black_box(&rects), &config)));
        });

        group.bench_function(format!("invalidate(n={count})"), |b| {
            b.iter_batched(
                || InvalidState::new(CANVAS),
                |mut invalid| {
                    for &rect in &rects {
                        let _ = invalid.invalidate(rect);
                    }
                    black_box(invalid)
                },
                BatchSize::SmallInput,
            );
        });

        let mut filled = InvalidState::new(CANVAS);
        for &rect in &rects {
            let _ = filled.invalidate(rect);
        }
        group.bench_function(format!("get_invalid_area(n={count})"), |b| {
            b.iter(|| black_box(filled.get_invalid_area(CANVAS)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_coalesce);
criterion_main!(benches);
