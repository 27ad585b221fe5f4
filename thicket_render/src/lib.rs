// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thicket Render: the incremental paint driver.
//!
//! A [`Renderer`] owns the [`thicket_region::InvalidState`] of one canvas and
//! a cached [`Surface`] covering the part of the canvas last shown. Each
//! update repaints only the invalid parts of the requested area, coalesced
//! into at most four sub-areas:
//!
//! ```text
//! Idle ──setup──▶ AreaSetup ──▶ AreaRender ──▶ AreaSetup ── … ──▶ Done
//!                     ▲              │
//!                     └── resume ◀───┘ (timed out: continuation scheduled)
//! ```
//!
//! The seams are traits:
//!
//! - [`Painter`]: paints one sub-area, possibly yielding.
//! - [`RenderListener`]: hears about finished, partial and failed areas.
//! - [`Scheduler`]: runs [`Renderer::resume`] later from the event loop.
//!
//! Everything is single-threaded. "Asynchronous" means the update returns
//! early and is continued by a later callback; a stop requested while a
//! paint call is on the stack (through a [`StopHandle`]) takes effect when
//! that call returns.
//!
//! Render-target moves and state transitions are logged with `tracing` at
//! `debug` and `trace` level; painter failures at `warn`.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod config;
mod error;
mod renderer;
mod seams;
mod surface;

pub use config::{RenderPolicy, RendererConfig};
pub use error::{PaintError, RenderError};
pub use renderer::{RenderStatus, Renderer, RendererState};
pub use seams::{PaintOutcome, Painter, RenderListener, Scheduler, StopHandle};
pub use surface::{Bitmap, Surface};
