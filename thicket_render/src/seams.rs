// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! What the renderer calls out to.

use alloc::rc::Rc;
use core::cell::Cell;

use kurbo::Rect;

use crate::error::PaintError;
use crate::surface::Surface;

/// Result of painting one sub-area.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PaintOutcome {
    /// The sub-area is fully painted.
    Done,
    /// The painter gave up its time slice. The same sub-area is painted
    /// again when the renderer resumes.
    TimedOut,
}

/// Paints document content into a surface.
///
/// This is where a paint-tree traversal plugs in.
pub trait Painter {
    /// Paints `area` of the canvas into `surface`.
    ///
    /// When `allow_timeout` is set the painter may return
    /// [`PaintOutcome::TimedOut`] at any point it can resume from.
    ///
    /// # Errors
    ///
    /// Returns the error that aborted the traversal.
    fn paint(
        &mut self,
        surface: &mut Surface,
        area: Rect,
        allow_timeout: bool,
    ) -> Result<PaintOutcome, PaintError>;
}

/// Observes renderer progress.
///
/// Every method defaults to doing nothing.
pub trait RenderListener {
    /// All invalid parts of `area` are painted.
    fn on_area_done(&mut self, area: Rect) {
        let _ = area;
    }

    /// The update yielded; `area` holds a mix of new and old pixels that may
    /// be shown while waiting.
    fn on_area_partial(&mut self, area: Rect) {
        let _ = area;
    }

    /// The painter failed and the renderer stopped.
    fn on_error(&mut self, error: &PaintError) {
        let _ = error;
    }

    /// A stop requested through a [`StopHandle`] was applied.
    fn on_stopped(&mut self) {}
}

impl RenderListener for () {}

/// Runs [`Renderer::resume`](crate::Renderer::resume) later.
pub trait Scheduler {
    /// Arranges for the renderer to be resumed from the event loop.
    fn schedule_continuation(&mut self);
}

/// Drops every request. Only suitable for [`RenderPolicy::Sync`](crate::RenderPolicy::Sync)
/// with a painter that never times out.
impl Scheduler for () {
    fn schedule_continuation(&mut self) {}
}

/// Requests a deferred stop of a [`Renderer`](crate::Renderer).
///
/// A painter cannot reach the renderer while it is painting, but it can hold
/// a handle. The stop is applied once the current paint call returns.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Rc<Cell<bool>>);

impl StopHandle {
    /// Requests a stop.
    pub fn request(&self) {
        self.0.set(true);
    }

    /// Whether a stop is pending.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.0.get()
    }

    pub(crate) fn take(&self) -> bool {
        self.0.replace(false)
    }
}
