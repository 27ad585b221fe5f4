// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reducing a scattered set of rectangles to a few paint passes.

use kurbo::Rect;
use smallvec::SmallVec;

/// Default pairwise merge threshold, in square pixels.
pub const DEFAULT_MERGE_THRESHOLD: f64 = 40_000.0;

/// Tuning for [`coalesce`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RegionConfig {
    /// Two coalesced rectangles are merged when the pixels their union adds
    /// beyond the two originals stay below this area.
    pub merge_threshold: f64,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            merge_threshold: DEFAULT_MERGE_THRESHOLD,
        }
    }
}

impl RegionConfig {
    /// Returns a copy with `merge_threshold` replaced.
    #[must_use]
    pub fn with_merge_threshold(mut self, merge_threshold: f64) -> Self {
        self.merge_threshold = merge_threshold;
        self
    }
}

/// Coalesces `rects` into at most four covering rectangles.
///
/// 1. The rectangles with the minimum left, minimum top, maximum right and
///    maximum bottom edges are picked as seeds (one rectangle may fill more
///    than one slot).
/// 2. Every other rectangle is absorbed by the seed whose area grows least.
/// 3. Seeds are then merged pairwise, cheapest first, while the union adds
///    less than [`RegionConfig::merge_threshold`] pixels over the pair.
///
/// The union of the output always covers the union of the input.
///
/// # Example
///
/// ```
/// use kurbo::Rect;
/// use thicket_region::{RegionConfig, coalesce};
///
/// let rects = [
///     Rect::new(0.0, 0.0, 10.0, 10.0),
///     Rect::new(12.0, 0.0, 20.0, 10.0),
///     Rect::new(1000.0, 1000.0, 1010.0, 1010.0),
/// ];
/// let out = coalesce(&rects, &RegionConfig::default());
/// assert_eq!(out.len(), 2);
/// ```
#[must_use]
pub fn coalesce(rects: &[Rect], config: &RegionConfig) -> SmallVec<[Rect; 4]> {
    let mut out: SmallVec<[Rect; 4]> = SmallVec::new();
    if rects.len() <= 1 {
        out.extend(rects.iter().copied());
        return out;
    }

    let extremal = extremal_indices(rects);
    for &i in &extremal {
        out.push(rects[i]);
    }

    for (i, &rect) in rects.iter().enumerate() {
        if extremal.contains(&i) {
            continue;
        }
        let best = cheapest(out.iter().map(|seed| seed.union(rect).area() - seed.area()));
        out[best] = out[best].union(rect);
    }

    while out.len() > 1 {
        let mut best: Option<(usize, usize, f64)> = None;
        for i in 0..out.len() {
            for j in i + 1..out.len() {
                let overhead = out[i].union(out[j]).area() - (out[i].area() + out[j].area());
                if best.is_none_or(|(_, _, b)| overhead < b) {
                    best = Some((i, j, overhead));
                }
            }
        }
        match best {
            Some((i, j, overhead)) if overhead < config.merge_threshold => {
                out[i] = out[i].union(out[j]);
                out.remove(j);
            }
            _ => break,
        }
    }

    out
}

/// Distinct indices of the min-left, min-top, max-right and max-bottom rects,
/// in that order.
fn extremal_indices(rects: &[Rect]) -> SmallVec<[usize; 4]> {
    let mut left = 0;
    let mut top = 0;
    let mut right = 0;
    let mut bottom = 0;
    for (i, r) in rects.iter().enumerate().skip(1) {
        if r.x0 < rects[left].x0 {
            left = i;
        }
        if r.y0 < rects[top].y0 {
            top = i;
        }
        if r.x1 > rects[right].x1 {
            right = i;
        }
        if r.y1 > rects[bottom].y1 {
            bottom = i;
        }
    }
    let mut out: SmallVec<[usize; 4]> = SmallVec::new();
    for i in [left, top, right, bottom] {
        if !out.contains(&i) {
            out.push(i);
        }
    }
    out
}

/// Index of the smallest value; ties go to the earliest.
fn cheapest(costs: impl Iterator<Item = f64>) -> usize {
    let mut best = 0;
    let mut best_cost = f64::INFINITY;
    for (i, cost) in costs.enumerate() {
        if cost < best_cost {
            best = i;
            best_cost = cost;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covers(out: &[Rect], input: &[Rect]) -> bool {
        input
            .iter()
            .all(|r| out.iter().any(|o| o.union(*r) == *o))
    }

    #[test]
    fn trivial_inputs_pass_through() {
        let config = RegionConfig::default();
        assert!(coalesce(&[], &config).is_empty());
        let one = [Rect::new(1.0, 2.0, 3.0, 4.0)];
        assert_eq!(coalesce(&one, &config).as_slice(), &one);
    }

    #[test]
    fn one_rect_in_every_extremal_slot() {
        let big = Rect::new(0.0, 0.0, 100.0, 100.0);
        let inner = [big, Rect::new(10.0, 10.0, 20.0, 20.0), Rect::new(50.0, 50.0, 60.0, 60.0)];
        let out = coalesce(&inner, &RegionConfig::default());
        assert_eq!(out.as_slice(), &[big]);
    }

    #[test]
    fn far_corners_pair_up_into_columns() {
        let rects = [
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(990.0, 0.0, 1000.0, 10.0),
            Rect::new(0.0, 990.0, 10.0, 1000.0),
            Rect::new(990.0, 990.0, 1000.0, 1000.0),
        ];
        let out = coalesce(&rects, &RegionConfig::default());
        // The bottom-right corner joins the right seed; the two left corners
        // then merge because the column between them is cheap.
        assert_eq!(
            out.as_slice(),
            &[
                Rect::new(0.0, 0.0, 10.0, 1000.0),
                Rect::new(990.0, 0.0, 1000.0, 1000.0),
            ]
        );
        assert!(covers(&out, &rects));
    }

    #[test]
    fn zero_threshold_keeps_seeds() {
        let rects = [
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(20.0, 0.0, 30.0, 10.0),
        ];
        let config = RegionConfig::default().with_merge_threshold(0.0);
        assert_eq!(coalesce(&rects, &config).len(), 2);
        let merged = coalesce(&rects, &RegionConfig::default());
        assert_eq!(merged.as_slice(), &[Rect::new(0.0, 0.0, 30.0, 10.0)]);
    }

    #[test]
    fn absorbs_into_cheapest_seed() {
        // Seeds: left/top = a, right/bottom = b. c sits next to b.
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(1000.0, 1000.0, 1010.0, 1010.0);
        let c = Rect::new(995.0, 1000.0, 999.0, 1005.0);
        let out = coalesce(&[a, b, c], &RegionConfig::default().with_merge_threshold(0.0));
        assert_eq!(out.as_slice(), &[a, Rect::new(995.0, 1000.0, 1010.0, 1010.0)]);
    }
}
