// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thicket Region: invalid-area tracking for incremental repaint.
//!
//! - [`Region`]: a union of disjoint pixel rectangles with include,
//!   subtract, clip and translate.
//! - [`coalesce`] and [`RegionConfig`]: reduce any rectangle list to at most
//!   four covering rectangles so scattered damage costs a bounded number of
//!   paint passes.
//! - [`InvalidState`]: the per-renderer record of what still needs painting,
//!   split into a geometric region and a paint-only extra rectangle.
//!
//! Rectangles are [`kurbo::Rect`] in device pixels. Everything that enters a
//! region is snapped outward to whole pixels.
//!
//! ## Features
//!
//! - `std` (default): forwards to `kurbo/std`.
//! - `libm`: float math for `no_std` builds.
//! - `multipass`: extra invalidation also feeds the geometric region as soon
//!   as it is recorded.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod coalesce;
mod invalid;
mod region;

pub use coalesce::{DEFAULT_MERGE_THRESHOLD, RegionConfig, coalesce};
pub use invalid::InvalidState;
pub use region::{Region, RegionError};
