// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Invalidate/validate behavior and the coalescing bound over random input.

use kurbo::{Point, Rect};
use thicket_region::{InvalidState, Region, RegionConfig, coalesce};

struct Lcg(u64);

impl Lcg {
    fn next_u32(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 33) as u32
    }

    fn coord(&mut self, max: u32) -> f64 {
        f64::from(self.next_u32() % max)
    }

    fn rect(&mut self, max: u32) -> Rect {
        let x = self.coord(max);
        let y = self.coord(max);
        let w = self.coord(max / 4) + 1.0;
        let h = self.coord(max / 4) + 1.0;
        Rect::new(x, y, x + w, y + h)
    }
}

const D: Rect = Rect::new(0.0, 0.0, 640.0, 480.0);

#[test]
fn whole_canvas_round_trip() {
    let mut state = InvalidState::new(D);
    state.reset();
    state.validate(D);
    assert!(state.region().is_empty());

    state.invalidate(D).unwrap();
    state.validate(D);
    assert!(state.region().is_empty());
}

#[test]
fn sub_rect_round_trip() {
    let mut state = InvalidState::new(D);
    let r = Rect::new(12.0, 30.0, 90.0, 77.0);
    state.invalidate(r).unwrap();
    state.validate(r);
    assert!(state.region().is_empty());
}

#[test]
fn validating_one_of_two_leaves_the_other() {
    let mut state = InvalidState::new(D);
    let r1 = Rect::new(0.0, 0.0, 50.0, 50.0);
    let r2 = Rect::new(100.0, 100.0, 160.0, 130.0);
    state.invalidate(r1).unwrap();
    state.invalidate(r2).unwrap();
    state.validate(r1);

    let left = state.region();
    assert_eq!(left.area(), r2.area());
    assert!(left.contains_point(Point::new(130.0, 115.0)));
    assert!(!left.contains_point(Point::new(25.0, 25.0)));
}

#[test]
fn coalescing_bound_holds_for_random_regions() {
    let mut rng = Lcg(0xdead_beef);
    for round in 0..200 {
        let mut state = InvalidState::new(D);
        for _ in 0..(1 + round % 25) {
            state.invalidate(rng.rect(640)).unwrap();
        }
        let target = rng.rect(640).union(Rect::new(100.0, 100.0, 400.0, 300.0));
        let expected = state.region().intersection(target);
        let areas = state.get_invalid_area(target);

        assert!(areas.len() <= 4, "round {round}: {} areas", areas.len());
        for a in &areas {
            assert!(a.area() >= 0.0, "negative area");
        }
        // Every expected pixel is covered by some output rect.
        let mut covered = Region::new();
        for a in &areas {
            covered.include(*a).unwrap();
        }
        let mut missing = expected.clone();
        for a in &areas {
            missing.subtract(*a);
        }
        assert!(missing.is_empty(), "round {round}: output misses {missing:?}");
        assert!(covered.area() >= expected.area(), "round {round}: lost area");
    }
}

#[test]
fn coalesce_respects_custom_threshold() {
    let rects = [
        Rect::new(0.0, 0.0, 10.0, 10.0),
        Rect::new(300.0, 0.0, 310.0, 10.0),
    ];
    // Union overhead is 2900 square pixels.
    let loose = coalesce(&rects, &RegionConfig::default());
    assert_eq!(loose.len(), 1);
    let tight = coalesce(&rects, &RegionConfig::default().with_merge_threshold(2_000.0));
    assert_eq!(tight.len(), 2);
}
