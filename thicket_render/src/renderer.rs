// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The incremental paint driver.

use kurbo::{Rect, Vec2};
use smallvec::SmallVec;
use thicket_region::{InvalidState, Region};
use tracing::{debug, trace, warn};

use crate::config::{RenderPolicy, RendererConfig};
use crate::error::{PaintError, RenderError};
use crate::seams::{PaintOutcome, Painter, RenderListener, Scheduler, StopHandle};
use crate::surface::{Bitmap, Surface, pixel_bounds};

/// Where the renderer is in its work loop.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RendererState {
    /// No area is set up.
    #[default]
    Idle,
    /// About to pick the next sub-area.
    AreaSetup,
    /// Painting the current sub-area.
    AreaRender,
    /// Every sub-area of the set-up area is painted.
    Done,
}

/// Result of a successful [`Renderer::update`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RenderStatus {
    /// The set-up area is fully painted.
    Done,
    /// The update yielded and a continuation was scheduled.
    TimedOut,
}

/// Repaints the invalid parts of a canvas into a cached surface.
///
/// Call [`setup`](Self::setup) with the area that must be on screen, then
/// [`update`](Self::update). The invalid region inside the area is split
/// into at most four sub-areas, painted last to first; each painted
/// sub-area is validated.
///
/// With [`RenderPolicy::Async`] the painter may time out. The update then
/// returns [`RenderStatus::TimedOut`] after asking the [`Scheduler`] for a
/// continuation, and [`resume`](Self::resume) repaints the same sub-area.
///
/// # Example
///
/// ```
/// use kurbo::Rect;
/// use thicket_render::{PaintError, PaintOutcome, Painter, RenderStatus, Renderer, Surface};
///
/// struct Fill;
///
/// impl Painter for Fill {
///     fn paint(&mut self, s: &mut Surface, area: Rect, _: bool) -> Result<PaintOutcome, PaintError> {
///         s.fill(area, 0xff00_00ff);
///         Ok(PaintOutcome::Done)
///     }
/// }
///
/// let mut renderer = Renderer::new(Rect::new(0.0, 0.0, 64.0, 64.0), 1.0);
/// renderer.setup(Rect::new(0.0, 0.0, 64.0, 64.0)).unwrap();
/// let status = renderer.update(&mut Fill, &mut (), &mut ()).unwrap();
///
/// assert_eq!(status, RenderStatus::Done);
/// assert!(renderer.invalid_state().is_empty());
/// let bitmap = renderer.result(Rect::new(0.0, 0.0, 8.0, 8.0)).unwrap();
/// assert_eq!(bitmap.pixel(3, 3), Some(0xff00_00ff));
/// ```
#[derive(Debug)]
pub struct Renderer {
    config: RendererConfig,
    state: RendererState,
    invalid: InvalidState,
    target: Option<Surface>,
    area: Rect,
    sub_areas: SmallVec<[Rect; 4]>,
    current: Option<Rect>,
    scale: f64,
    stop: StopHandle,
    last_error: Option<PaintError>,
}

impl Renderer {
    /// A renderer for a canvas of `dimension` with everything invalid.
    #[must_use]
    pub fn new(dimension: Rect, scale: f64) -> Self {
        Self::with_config(dimension, scale, RendererConfig::default())
    }

    /// A renderer with explicit options.
    #[must_use]
    pub fn with_config(dimension: Rect, scale: f64, config: RendererConfig) -> Self {
        let mut invalid = InvalidState::with_config(dimension, config.region);
        invalid.reset();
        Self {
            config,
            state: RendererState::Idle,
            invalid,
            target: None,
            area: Rect::ZERO,
            sub_areas: SmallVec::new(),
            current: None,
            scale,
            stop: StopHandle::default(),
            last_error: None,
        }
    }

    /// Current options.
    #[must_use]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Changes the policy and partial-result options.
    ///
    /// Coalescing parameters only take effect for a new renderer.
    pub fn set_config(&mut self, config: RendererConfig) {
        self.config = config;
    }

    /// Where the work loop is.
    #[must_use]
    pub fn state(&self) -> RendererState {
        self.state
    }

    /// Returns `true` while a set-up area is not finished.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(
            self.state,
            RendererState::AreaSetup | RendererState::AreaRender
        )
    }

    /// The area passed to the last [`setup`](Self::setup), clipped to the
    /// canvas, or `Rect::ZERO` when idle.
    #[must_use]
    pub fn area(&self) -> Rect {
        self.area
    }

    /// Whether the set-up area covers `area`.
    #[must_use]
    pub fn contains(&self, area: Rect) -> bool {
        let outer = pixel_bounds(self.area);
        let inner = pixel_bounds(area);
        self.state != RendererState::Idle
            && outer.0 <= inner.0
            && outer.1 <= inner.1
            && outer.2 >= inner.2
            && outer.3 >= inner.3
    }

    /// Canvas scale factor.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// What still needs painting.
    #[must_use]
    pub fn invalid_state(&self) -> &InvalidState {
        &self.invalid
    }

    /// Mutable access for invalidation from outside.
    pub fn invalid_state_mut(&mut self) -> &mut InvalidState {
        &mut self.invalid
    }

    /// The cached surface, once one is allocated.
    #[must_use]
    pub fn target(&self) -> Option<&Surface> {
        self.target.as_ref()
    }

    /// A handle that requests a stop at the next safe point.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// The error that stopped the last update, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<PaintError> {
        self.last_error
    }

    /// Prepares painting of the invalid parts of `area`.
    ///
    /// Any unfinished work is discarded. The render target is moved or grown
    /// to cover `area`, extra invalidation is folded into the region, and
    /// the sub-area work list is computed.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::OutOfMemory`] if the render target or the
    /// invalid region could not grow.
    pub fn setup(&mut self, area: Rect) -> Result<(), RenderError> {
        self.discard_progress();
        self.last_error = None;

        let area = area.expand().intersect(self.invalid.dimension());
        if area.area() > 0.0 {
            self.set_target(area)?;
        }
        self.invalid.flush_extra()?;
        self.sub_areas = self.invalid.get_invalid_area(area);
        self.area = area;
        self.transition(RendererState::AreaSetup);
        debug!(?area, sub_areas = self.sub_areas.len(), "render area set up");
        Ok(())
    }

    /// Paints until the set-up area is done or the painter yields.
    ///
    /// Timeouts are only offered to the painter under
    /// [`RenderPolicy::Async`]; a painter that times out anyway yields the
    /// same way.
    ///
    /// # Errors
    ///
    /// - [`RenderError::NotSetUp`] if no area is set up.
    /// - [`RenderError::Stopped`] if a stop was requested through a
    ///   [`StopHandle`]; the listener is told with
    ///   [`on_stopped`](RenderListener::on_stopped).
    /// - [`RenderError::Paint`] if the painter failed; the renderer is
    ///   stopped and the listener is told with
    ///   [`on_error`](RenderListener::on_error).
    pub fn update<P, L, S>(
        &mut self,
        painter: &mut P,
        listener: &mut L,
        scheduler: &mut S,
    ) -> Result<RenderStatus, RenderError>
    where
        P: Painter + ?Sized,
        L: RenderListener + ?Sized,
        S: Scheduler + ?Sized,
    {
        let allow_timeout = self.config.policy == RenderPolicy::Async;
        let mut painted = 0_usize;
        loop {
            if self.stop.take() {
                return Err(self.apply_deferred_stop(listener));
            }
            match self.state {
                RendererState::Idle => return Err(RenderError::NotSetUp),
                RendererState::Done => return Ok(RenderStatus::Done),
                RendererState::AreaSetup => {
                    let Some(next) = self.sub_areas.pop() else {
                        self.transition(RendererState::Done);
                        listener.on_area_done(self.area);
                        return Ok(RenderStatus::Done);
                    };
                    let over_budget = self
                        .config
                        .max_sub_areas_per_update
                        .is_some_and(|max| painted >= max);
                    if allow_timeout && over_budget {
                        self.sub_areas.push(next);
                        return Ok(self.yield_to(listener, scheduler));
                    }
                    self.current = Some(next);
                    self.transition(RendererState::AreaRender);
                }
                RendererState::AreaRender => {
                    let (Some(sub_area), Some(target)) = (self.current, self.target.as_mut())
                    else {
                        self.transition(RendererState::AreaSetup);
                        continue;
                    };
                    trace!(?sub_area, "painting sub-area");
                    let outcome = painter.paint(target, sub_area, allow_timeout);
                    if self.stop.take() {
                        return Err(self.apply_deferred_stop(listener));
                    }
                    match outcome {
                        Ok(PaintOutcome::Done) => {
                            self.invalid.validate(sub_area);
                            self.current = None;
                            painted += 1;
                            self.transition(RendererState::AreaSetup);
                        }
                        Ok(PaintOutcome::TimedOut) => {
                            return Ok(self.yield_to(listener, scheduler));
                        }
                        Err(e) => {
                            warn!(?sub_area, %e, "paint failed, stopping renderer");
                            self.discard_progress();
                            self.last_error = Some(e);
                            listener.on_error(&e);
                            return Err(RenderError::Paint(e));
                        }
                    }
                }
            }
        }
    }

    /// Continuation entry point for a yielded update.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Stopped`] if the renderer was stopped since
    /// it yielded, otherwise as for [`update`](Self::update).
    pub fn resume<P, L, S>(
        &mut self,
        painter: &mut P,
        listener: &mut L,
        scheduler: &mut S,
    ) -> Result<RenderStatus, RenderError>
    where
        P: Painter + ?Sized,
        L: RenderListener + ?Sized,
        S: Scheduler + ?Sized,
    {
        if !self.is_active() {
            debug!("stale continuation");
            return Err(RenderError::Stopped);
        }
        self.update(painter, listener, scheduler)
    }

    /// Discards unfinished work.
    ///
    /// Painted pixels stay in the target; unpainted sub-areas stay invalid.
    /// A painter holding a [`StopHandle`] uses
    /// [`StopHandle::request`] instead.
    pub fn stop(&mut self) {
        if self.is_active() {
            debug!(area = ?self.area, "renderer stopped");
        }
        self.discard_progress();
    }

    /// Pans the canvas by `(dx, dy)` pixels.
    ///
    /// Cached pixels and the invalid region move along; the strip the
    /// content moved away from becomes invalid.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::OutOfMemory`] if the invalid region could not
    /// grow.
    pub fn move_by(&mut self, dx: i32, dy: i32) -> Result<(), RenderError> {
        self.stop();
        let delta = Vec2::new(f64::from(dx), f64::from(dy));
        self.invalid.translate(delta.x, delta.y);
        if let Some(target) = self.target.as_mut() {
            let area = target.area();
            target.scroll(dx, dy);
            let mut vacated = Region::from_rect(area);
            vacated.subtract(area + delta);
            for &rect in vacated.rects() {
                self.invalid.invalidate(rect)?;
            }
        }
        debug!(dx, dy, "renderer moved");
        Ok(())
    }

    /// The canvas was resized or rescaled.
    ///
    /// The render target is dropped and everything becomes invalid.
    pub fn scale_changed(&mut self, dimension: Rect, scale: f64) {
        self.stop();
        self.target = None;
        self.scale = scale;
        self.invalid.set_dimension(dimension);
        self.invalid.reset();
        debug!(?dimension, scale, "renderer rescaled");
    }

    /// Copies `area` out of the render target.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NotSetUp`] before the first
    /// [`setup`](Self::setup), or [`RenderError::OutOfMemory`] if the copy
    /// cannot be allocated.
    pub fn result(&self, area: Rect) -> Result<Bitmap, RenderError> {
        self.target
            .as_ref()
            .ok_or(RenderError::NotSetUp)?
            .copy_rect(area)
    }

    /// Makes the render target cover `area`.
    ///
    /// In order of preference: keep a target that already covers it, shift
    /// a large enough target, or allocate a new one and copy the overlap.
    /// Pixels the target did not cover before are invalidated.
    fn set_target(&mut self, area: Rect) -> Result<(), RenderError> {
        let (x0, y0, x1, y1) = pixel_bounds(area);
        let Some(target) = self.target.as_mut() else {
            let fresh = Surface::new(area)?;
            self.invalid.invalidate(fresh.area())?;
            debug!(?area, "render target allocated");
            self.target = Some(fresh);
            return Ok(());
        };

        let old = target.area();
        let (ox0, oy0, ox1, oy1) = target.bounds();
        if ox0 <= x0 && oy0 <= y0 && ox1 >= x1 && oy1 >= y1 {
            trace!(?area, "area inside render target");
            return Ok(());
        }

        let fits = i64::from(x1) - i64::from(x0) <= i64::from(ox1) - i64::from(ox0)
            && i64::from(y1) - i64::from(y0) <= i64::from(oy1) - i64::from(oy0);
        if fits {
            // Move as little as possible while still covering `area`.
            let nx = ox0.clamp(x1 - (ox1 - ox0), x0);
            let ny = oy0.clamp(y1 - (oy1 - oy0), y0);
            target.shift_within(nx, ny);
            debug!(?area, from = ?old, to = ?target.area(), "render target shifted");
        } else {
            let mut grown = Surface::new(area)?;
            grown.blit_from(target);
            *target = grown;
            debug!(?area, from = ?old, "render target reallocated");
        }

        let mut uncovered = Region::from_rect(target.area());
        uncovered.subtract(old);
        for &rect in uncovered.rects() {
            self.invalid.invalidate(rect)?;
        }
        Ok(())
    }

    fn yield_to<L, S>(&mut self, listener: &mut L, scheduler: &mut S) -> RenderStatus
    where
        L: RenderListener + ?Sized,
        S: Scheduler + ?Sized,
    {
        debug!(area = ?self.area, remaining = self.sub_areas.len(), "update yielded");
        if self.config.allow_partial {
            listener.on_area_partial(self.area);
        }
        scheduler.schedule_continuation();
        RenderStatus::TimedOut
    }

    fn apply_deferred_stop<L: RenderListener + ?Sized>(&mut self, listener: &mut L) -> RenderError {
        debug!(area = ?self.area, "deferred stop applied");
        self.discard_progress();
        listener.on_stopped();
        RenderError::Stopped
    }

    fn discard_progress(&mut self) {
        self.sub_areas.clear();
        self.current = None;
        self.area = Rect::ZERO;
        self.stop.take();
        self.transition(RendererState::Idle);
    }

    fn transition(&mut self, to: RendererState) {
        if self.state != to {
            trace!(from = ?self.state, ?to, "renderer state");
            self.state = to;
        }
    }
}
