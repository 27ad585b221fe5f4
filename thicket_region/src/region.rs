// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sets of non-overlapping pixel rectangles.

use alloc::vec::Vec;
use core::fmt;

use kurbo::{Point, Rect, Vec2};
use smallvec::SmallVec;

/// Error returned when a region cannot grow.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub enum RegionError {
    /// The rectangle list could not be extended. The region is unchanged.
    OutOfMemory,
}

impl fmt::Debug for RegionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => f.write_str("RegionError::OutOfMemory"),
        }
    }
}

impl fmt::Display for RegionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => f.write_str("out of memory while growing a region"),
        }
    }
}

impl core::error::Error for RegionError {}

/// A union of pairwise non-overlapping rectangles on the pixel grid.
///
/// Rectangles added with [`include`](Self::include) are expanded outward to
/// whole pixels; rectangles removed with [`subtract`](Self::subtract) are
/// shrunk inward, so a region never claims a partially painted pixel is
/// clean.
///
/// # Example
///
/// ```
/// use kurbo::Rect;
/// use thicket_region::Region;
///
/// let mut region = Region::new();
/// region.include(Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
/// region.include(Rect::new(5.0, 5.0, 15.0, 15.0)).unwrap();
/// assert_eq!(region.area(), 175.0);
///
/// region.subtract(Rect::new(0.0, 0.0, 15.0, 15.0));
/// assert!(region.is_empty());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Region {
    rects: Vec<Rect>,
}

impl Region {
    /// Creates an empty region.
    #[must_use]
    pub fn new() -> Self {
        Self { rects: Vec::new() }
    }

    /// Creates a region covering `rect`.
    #[must_use]
    pub fn from_rect(rect: Rect) -> Self {
        let rect = rect.expand();
        let mut rects = Vec::new();
        if !is_empty_rect(rect) {
            rects.push(rect);
        }
        Self { rects }
    }

    /// Returns `true` if the region covers no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// The rectangles making up the region, pairwise disjoint.
    #[must_use]
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Total covered area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.rects.iter().map(Rect::area).sum()
    }

    /// Smallest rectangle covering the region, or `Rect::ZERO` if empty.
    #[must_use]
    pub fn bounding_box(&self) -> Rect {
        let mut it = self.rects.iter().copied();
        match it.next() {
            Some(first) => it.fold(first, |acc, r| acc.union(r)),
            None => Rect::ZERO,
        }
    }

    /// Returns `true` if `pt` lies inside one of the rectangles.
    #[must_use]
    pub fn contains_point(&self, pt: Point) -> bool {
        self.rects.iter().any(|r| r.contains(pt))
    }

    /// Adds `rect` to the region.
    ///
    /// Only the parts of `rect` not already covered are stored.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::OutOfMemory`] if the rectangle list cannot
    /// grow; the region is left as it was.
    pub fn include(&mut self, rect: Rect) -> Result<(), RegionError> {
        let rect = rect.expand();
        if is_empty_rect(rect) {
            return Ok(());
        }
        if self.rects.iter().any(|r| contains_rect(*r, rect)) {
            return Ok(());
        }

        let mut pieces: SmallVec<[Rect; 8]> = SmallVec::new();
        pieces.push(rect);
        for existing in &self.rects {
            if !overlaps(*existing, rect) {
                continue;
            }
            let mut next: SmallVec<[Rect; 8]> = SmallVec::new();
            for piece in pieces.drain(..) {
                next.extend(difference(piece, *existing));
            }
            pieces = next;
            if pieces.is_empty() {
                return Ok(());
            }
        }

        self.rects
            .try_reserve(pieces.len())
            .map_err(|_| RegionError::OutOfMemory)?;
        self.rects.extend(pieces);
        Ok(())
    }

    /// Removes `rect` from the region.
    pub fn subtract(&mut self, rect: Rect) {
        let rect = rect.trunc();
        if is_empty_rect(rect) {
            return;
        }
        let mut kept = Vec::with_capacity(self.rects.len());
        for r in self.rects.drain(..) {
            if overlaps(r, rect) {
                kept.extend(difference(r, rect));
            } else {
                kept.push(r);
            }
        }
        self.rects = kept;
    }

    /// Clips the region to `clip`.
    pub fn intersect_rect(&mut self, clip: Rect) {
        self.rects.retain_mut(|r| {
            *r = r.intersect(clip);
            !is_empty_rect(*r)
        });
    }

    /// Returns the part of the region inside `clip`.
    #[must_use]
    pub fn intersection(&self, clip: Rect) -> Self {
        let mut out = self.clone();
        out.intersect_rect(clip);
        out
    }

    /// Shifts every rectangle by `delta`.
    pub fn translate(&mut self, delta: Vec2) {
        for r in &mut self.rects {
            *r = *r + delta;
        }
    }

    /// Removes everything.
    pub fn clear(&mut self) {
        self.rects.clear();
    }
}

pub(crate) fn is_empty_rect(r: Rect) -> bool {
    !(r.x0 < r.x1 && r.y0 < r.y1)
}

/// Positive-area overlap test; touching edges do not overlap.
pub(crate) fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

pub(crate) fn contains_rect(outer: Rect, inner: Rect) -> bool {
    outer.x0 <= inner.x0 && outer.y0 <= inner.y0 && outer.x1 >= inner.x1 && outer.y1 >= inner.y1
}

/// `a` minus `b` as up to four disjoint bands.
fn difference(a: Rect, b: Rect) -> SmallVec<[Rect; 4]> {
    let mut out: SmallVec<[Rect; 4]> = SmallVec::new();
    if !overlaps(a, b) {
        out.push(a);
        return out;
    }
    if b.y0 > a.y0 {
        out.push(Rect::new(a.x0, a.y0, a.x1, b.y0));
    }
    if b.y1 < a.y1 {
        out.push(Rect::new(a.x0, b.y1, a.x1, a.y1));
    }
    let mid_y0 = a.y0.max(b.y0);
    let mid_y1 = a.y1.min(b.y1);
    if b.x0 > a.x0 {
        out.push(Rect::new(a.x0, mid_y0, b.x0, mid_y1));
    }
    if b.x1 < a.x1 {
        out.push(Rect::new(b.x1, mid_y0, a.x1, mid_y1));
    }
    out
}
