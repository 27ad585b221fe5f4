// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Invalid-area bookkeeping for one renderer.

use kurbo::{Rect, Vec2};
use smallvec::SmallVec;

use crate::coalesce::{RegionConfig, coalesce};
use crate::region::{Region, RegionError, is_empty_rect};

/// Pixels of a canvas that still need to be repainted.
///
/// Two kinds of invalidation are tracked:
///
/// - the geometric region, fed by [`invalidate`](Self::invalidate) and
///   consumed by [`validate`](Self::validate) as areas get painted;
/// - the extra rectangle, fed by
///   [`add_extra_invalidation`](Self::add_extra_invalidation) for changes
///   that only alter how something is painted, not where.
///
/// With the `multipass` feature, extra invalidation goes straight into the
/// region as well. Without it, the renderer folds it in once per area setup
/// through [`flush_extra`](Self::flush_extra).
///
/// # Example
///
/// ```
/// use kurbo::Rect;
/// use thicket_region::InvalidState;
///
/// let mut state = InvalidState::new(Rect::new(0.0, 0.0, 100.0, 100.0));
/// state.invalidate(Rect::new(10.0, 10.0, 20.0, 20.0)).unwrap();
/// state.invalidate(Rect::new(-50.0, 0.0, 5.0, 5.0)).unwrap(); // clipped
///
/// let areas = state.get_invalid_area(Rect::new(0.0, 0.0, 100.0, 100.0));
/// assert!(areas.len() <= 4);
///
/// for area in areas {
///     state.validate(area);
/// }
/// assert!(state.is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct InvalidState {
    dimension: Rect,
    region: Region,
    extra: Rect,
    config: RegionConfig,
}

impl InvalidState {
    /// Creates a state for a canvas of `dimension`, entirely valid.
    #[must_use]
    pub fn new(dimension: Rect) -> Self {
        Self::with_config(dimension, RegionConfig::default())
    }

    /// Creates a state with explicit coalescing parameters.
    #[must_use]
    pub fn with_config(dimension: Rect, config: RegionConfig) -> Self {
        Self {
            dimension: dimension.expand(),
            region: Region::new(),
            extra: Rect::ZERO,
            config,
        }
    }

    /// Canvas extent.
    #[must_use]
    pub fn dimension(&self) -> Rect {
        self.dimension
    }

    /// Changes the canvas extent.
    ///
    /// The region is clipped to the new extent but not grown; call
    /// [`reset`](Self::reset) when nothing on the new canvas is known to be
    /// valid.
    pub fn set_dimension(&mut self, dimension: Rect) {
        self.dimension = dimension.expand();
        self.region.intersect_rect(self.dimension);
        self.extra = self.extra.intersect(self.dimension);
    }

    /// Coalescing parameters.
    #[must_use]
    pub fn config(&self) -> &RegionConfig {
        &self.config
    }

    /// The geometric invalid region.
    #[must_use]
    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Returns `true` if there is nothing left to repaint.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.region.is_empty() && is_empty_rect(self.extra)
    }

    /// Marks `rect` as needing repaint, clipped to the canvas.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::OutOfMemory`] if the region cannot grow.
    pub fn invalidate(&mut self, rect: Rect) -> Result<(), RegionError> {
        let clipped = rect.intersect(self.dimension);
        if is_empty_rect(clipped) {
            return Ok(());
        }
        self.region.include(clipped).inspect_err(|_| {
            tracing::warn!(?rect, "dropping invalidation, region could not grow");
        })
    }

    /// Marks `rect` as painted.
    pub fn validate(&mut self, rect: Rect) {
        self.region.subtract(rect);
    }

    /// Records a paint-only invalidation.
    ///
    /// # Errors
    ///
    /// With the `multipass` feature, returns [`RegionError::OutOfMemory`] if
    /// the region cannot grow. Otherwise this never fails.
    pub fn add_extra_invalidation(&mut self, rect: Rect) -> Result<(), RegionError> {
        let clipped = rect.intersect(self.dimension);
        if is_empty_rect(clipped) {
            return Ok(());
        }
        self.extra = if is_empty_rect(self.extra) {
            clipped
        } else {
            self.extra.union(clipped)
        };
        #[cfg(feature = "multipass")]
        self.region.include(clipped)?;
        Ok(())
    }

    /// Accumulated paint-only invalidation, or `Rect::ZERO`.
    #[must_use]
    pub fn extra_invalidation(&self) -> Rect {
        self.extra
    }

    /// Returns and clears the accumulated paint-only invalidation.
    pub fn take_extra_invalidation(&mut self) -> Rect {
        core::mem::replace(&mut self.extra, Rect::ZERO)
    }

    /// Moves extra invalidation into the region and clears it.
    ///
    /// With `multipass` the region already holds it, so this only clears.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::OutOfMemory`] if the region cannot grow; the
    /// extra rectangle is kept in that case.
    pub fn flush_extra(&mut self) -> Result<(), RegionError> {
        if is_empty_rect(self.extra) {
            return Ok(());
        }
        #[cfg(not(feature = "multipass"))]
        self.region.include(self.extra)?;
        self.extra = Rect::ZERO;
        Ok(())
    }

    /// The invalid parts of `target` as at most four paint passes.
    ///
    /// The list is meant to be consumed from the back.
    #[must_use]
    pub fn get_invalid_area(&self, target: Rect) -> SmallVec<[Rect; 4]> {
        let clipped = self.region.intersection(target);
        coalesce(clipped.rects(), &self.config)
    }

    /// Invalidates the whole canvas and forgets extra invalidation.
    pub fn reset(&mut self) {
        self.region = Region::from_rect(self.dimension);
        self.extra = Rect::ZERO;
    }

    /// Shifts the region and extra invalidation by whole pixels.
    ///
    /// Parts shifted off the canvas are dropped.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        let delta = Vec2::new(dx, dy).round();
        self.region.translate(delta);
        self.region.intersect_rect(self.dimension);
        if !is_empty_rect(self.extra) {
            self.extra = (self.extra + delta).intersect(self.dimension);
        }
    }
}
