// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel buffers the renderer paints into.

use alloc::vec::Vec;

use kurbo::Rect;

use crate::error::RenderError;

/// Integer bounds `(x0, y0, x1, y1)` of `rect` snapped outward to the grid.
#[expect(
    clippy::cast_possible_truncation,
    reason = "values are integral after expand and clamped to the i32 range"
)]
pub(crate) fn pixel_bounds(rect: Rect) -> (i32, i32, i32, i32) {
    let r = rect.expand();
    let clamp = |v: f64| v.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32;
    (clamp(r.x0), clamp(r.y0), clamp(r.x1), clamp(r.y1))
}

fn span(lo: i32, hi: i32) -> usize {
    usize::try_from(i64::from(hi) - i64::from(lo)).unwrap_or(0)
}

fn alloc_pixels(len: usize) -> Result<Vec<u32>, RenderError> {
    let mut pixels = Vec::new();
    pixels
        .try_reserve_exact(len)
        .map_err(|_| RenderError::OutOfMemory)?;
    pixels.resize(len, 0);
    Ok(pixels)
}

/// Overlap of two pixel rectangles, or `None` if they do not overlap.
fn overlap(a: (i32, i32, i32, i32), b: (i32, i32, i32, i32)) -> Option<(i32, i32, i32, i32)> {
    let r = (a.0.max(b.0), a.1.max(b.1), a.2.min(b.2), a.3.min(b.3));
    (r.0 < r.2 && r.1 < r.3).then_some(r)
}

/// A premultiplied ARGB raster covering a rectangle of the canvas.
///
/// Coordinates passed to every method are canvas pixels, not offsets into
/// the buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct Surface {
    x: i32,
    y: i32,
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl core::fmt::Debug for Surface {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Surface")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Surface {
    /// Allocates a transparent surface covering `area`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::OutOfMemory`] if the buffer cannot be
    /// allocated.
    pub fn new(area: Rect) -> Result<Self, RenderError> {
        let (x0, y0, x1, y1) = pixel_bounds(area);
        let (width, height) = (span(x0, x1), span(y0, y1));
        let len = width
            .checked_mul(height)
            .ok_or(RenderError::OutOfMemory)?;
        Ok(Self {
            x: x0,
            y: y0,
            width,
            height,
            pixels: alloc_pixels(len)?,
        })
    }

    /// Canvas area covered by the surface.
    #[must_use]
    pub fn area(&self) -> Rect {
        let (x1, y1) = self.far_corner();
        Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(x1),
            f64::from(y1),
        )
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major pixel data.
    #[must_use]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Pixel at canvas position `(x, y)`, if covered.
    #[must_use]
    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Fills the part of `rect` covered by the surface with `color`.
    pub fn fill(&mut self, rect: Rect, color: u32) {
        let Some((x0, y0, x1, y1)) = overlap(self.bounds(), pixel_bounds(rect)) else {
            return;
        };
        for y in y0..y1 {
            if let (Some(start), Some(end)) = (self.index(x0, y), self.index(x1 - 1, y)) {
                self.pixels[start..=end].fill(color);
            }
        }
    }

    /// Copies the pixels `other` shares with `self`.
    pub fn blit_from(&mut self, other: &Self) {
        let Some((x0, y0, x1, y1)) = overlap(self.bounds(), other.bounds()) else {
            return;
        };
        for y in y0..y1 {
            let dst = self.index(x0, y).zip(self.index(x1 - 1, y));
            let src = other.index(x0, y).zip(other.index(x1 - 1, y));
            if let (Some((ds, de)), Some((ss, se))) = (dst, src) {
                self.pixels[ds..=de].copy_from_slice(&other.pixels[ss..=se]);
            }
        }
    }

    /// Moves the surface to cover the same-sized area at `(x, y)`.
    ///
    /// Pixels of the canvas area both positions cover keep their content;
    /// the rest becomes transparent.
    pub fn shift_within(&mut self, x: i32, y: i32) {
        let dx = i64::from(self.x) - i64::from(x);
        let dy = i64::from(self.y) - i64::from(y);
        self.move_content(dx, dy);
        self.x = x;
        self.y = y;
    }

    /// Moves the content by `(dx, dy)` while the surface stays in place.
    ///
    /// Used when the canvas itself is panned.
    pub fn scroll(&mut self, dx: i32, dy: i32) {
        self.move_content(i64::from(dx), i64::from(dy));
    }

    /// Copies the part of `rect` covered by the surface.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::OutOfMemory`] if the copy cannot be allocated.
    pub fn copy_rect(&self, rect: Rect) -> Result<Bitmap, RenderError> {
        let Some((x0, y0, x1, y1)) = overlap(self.bounds(), pixel_bounds(rect)) else {
            return Ok(Bitmap::default());
        };
        let (width, height) = (span(x0, x1), span(y0, y1));
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(width * height)
            .map_err(|_| RenderError::OutOfMemory)?;
        for y in y0..y1 {
            if let (Some(start), Some(end)) = (self.index(x0, y), self.index(x1 - 1, y)) {
                pixels.extend_from_slice(&self.pixels[start..=end]);
            }
        }
        Ok(Bitmap {
            x: x0,
            y: y0,
            width,
            height,
            pixels,
        })
    }

    pub(crate) fn bounds(&self) -> (i32, i32, i32, i32) {
        let (x1, y1) = self.far_corner();
        (self.x, self.y, x1, y1)
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "surface extents were derived from i32 bounds"
    )]
    fn far_corner(&self) -> (i32, i32) {
        (
            (i64::from(self.x) + self.width as i64) as i32,
            (i64::from(self.y) + self.height as i64) as i32,
        )
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let col = usize::try_from(i64::from(x) - i64::from(self.x)).ok()?;
        let row = usize::try_from(i64::from(y) - i64::from(self.y)).ok()?;
        (col < self.width && row < self.height).then(|| row * self.width + col)
    }

    /// Moves buffer content by `(dx, dy)` pixels, clearing what is vacated.
    fn move_content(&mut self, dx: i64, dy: i64) {
        let (w, h) = (self.width, self.height);
        let (Ok(adx), Ok(ady)) = (usize::try_from(dx.abs()), usize::try_from(dy.abs())) else {
            self.pixels.fill(0);
            return;
        };
        if adx >= w || ady >= h {
            self.pixels.fill(0);
            return;
        }
        if adx == 0 && ady == 0 {
            return;
        }

        let run = w - adx;
        let (src_col, dst_col) = if dx >= 0 { (0, adx) } else { (adx, 0) };
        let rows = h - ady;
        let mut copy_row = |i: usize| {
            let (src_row, dst_row) = if dy >= 0 { (i, i + ady) } else { (i + ady, i) };
            let src = src_row * w + src_col;
            self.pixels.copy_within(src..src + run, dst_row * w + dst_col);
        };
        // Rows moving down are copied bottom-up so no source is overwritten.
        if dy > 0 {
            (0..rows).rev().for_each(&mut copy_row);
        } else {
            (0..rows).for_each(&mut copy_row);
        }

        let vacated_rows = if dy >= 0 { 0..ady } else { h - ady..h };
        for row in vacated_rows {
            self.pixels[row * w..(row + 1) * w].fill(0);
        }
        let vacated_cols = if dx >= 0 { 0..adx } else { w - adx..w };
        if !vacated_cols.is_empty() {
            for row in 0..h {
                let base = row * w;
                self.pixels[base + vacated_cols.start..base + vacated_cols.end].fill(0);
            }
        }
    }
}

/// An owned copy of part of a [`Surface`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bitmap {
    x: i32,
    y: i32,
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl Bitmap {
    /// Canvas position of the top-left pixel.
    #[must_use]
    pub fn origin(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns `true` if the bitmap holds no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Row-major pixel data.
    #[must_use]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Pixel at canvas position `(x, y)`, if covered.
    #[must_use]
    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        let col = usize::try_from(i64::from(x) - i64::from(self.x)).ok()?;
        let row = usize::try_from(i64::from(y) - i64::from(self.y)).ok()?;
        (col < self.width && row < self.height).then(|| self.pixels[row * self.width + col])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(x0: f64, y0: f64, x1: f64, y1: f64) -> Surface {
        Surface::new(Rect::new(x0, y0, x1, y1)).unwrap()
    }

    #[test]
    fn new_snaps_to_pixels() {
        let s = surface(0.5, 1.2, 9.5, 4.0);
        assert_eq!(s.area(), Rect::new(0.0, 1.0, 10.0, 4.0));
        assert_eq!((s.width(), s.height()), (10, 3));
        assert!(s.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn fill_is_clipped() {
        let mut s = surface(0.0, 0.0, 4.0, 4.0);
        s.fill(Rect::new(2.0, 2.0, 10.0, 10.0), 7);
        assert_eq!(s.pixel(1, 1), Some(0));
        assert_eq!(s.pixel(3, 3), Some(7));
        assert_eq!(s.pixel(4, 4), None);
    }

    #[test]
    fn shift_keeps_common_pixels() {
        let mut s = surface(0.0, 0.0, 4.0, 4.0);
        s.fill(Rect::new(2.0, 2.0, 3.0, 3.0), 9);
        s.shift_within(1, 1);
        assert_eq!(s.area(), Rect::new(1.0, 1.0, 5.0, 5.0));
        assert_eq!(s.pixel(2, 2), Some(9));
        assert_eq!(s.pixel(4, 4), Some(0), "newly covered pixels are cleared");
        assert_eq!(s.pixels().iter().filter(|&&p| p == 9).count(), 1);
    }

    #[test]
    fn shift_up_left_keeps_common_pixels() {
        let mut s = surface(4.0, 4.0, 8.0, 8.0);
        s.fill(Rect::new(4.0, 4.0, 6.0, 6.0), 3);
        s.shift_within(2, 3);
        assert_eq!(s.pixel(4, 4), Some(3));
        assert_eq!(s.pixel(5, 5), Some(3));
        assert_eq!(s.pixel(2, 3), Some(0));
        assert_eq!(s.pixels().iter().filter(|&&p| p == 3).count(), 4);
    }

    #[test]
    fn scroll_moves_content() {
        let mut s = surface(0.0, 0.0, 4.0, 4.0);
        s.fill(Rect::new(0.0, 0.0, 1.0, 1.0), 5);
        s.scroll(2, 1);
        assert_eq!(s.pixel(0, 0), Some(0));
        assert_eq!(s.pixel(2, 1), Some(5));
        s.scroll(-10, 0);
        assert!(s.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn blit_copies_overlap_only() {
        let mut old = surface(0.0, 0.0, 4.0, 4.0);
        old.fill(Rect::new(0.0, 0.0, 4.0, 4.0), 1);
        let mut new = surface(2.0, 2.0, 8.0, 8.0);
        new.blit_from(&old);
        assert_eq!(new.pixel(3, 3), Some(1));
        assert_eq!(new.pixel(4, 4), Some(0));
        assert_eq!(new.pixels().iter().filter(|&&p| p == 1).count(), 4);
    }

    #[test]
    fn copy_rect_clips() {
        let mut s = surface(0.0, 0.0, 4.0, 4.0);
        s.fill(Rect::new(1.0, 1.0, 2.0, 2.0), 4);
        let bitmap = s.copy_rect(Rect::new(1.0, 1.0, 9.0, 3.0)).unwrap();
        assert_eq!(bitmap.origin(), (1, 1));
        assert_eq!((bitmap.width(), bitmap.height()), (3, 2));
        assert_eq!(bitmap.pixel(1, 1), Some(4));
        assert!(s.copy_rect(Rect::new(10.0, 10.0, 12.0, 12.0)).unwrap().is_empty());
    }
}
