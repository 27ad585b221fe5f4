// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thicket Dynamic: turning live SVG document mutations into invalidation.
//!
//! Every mutation of a rendered SVG document (an attribute set from script,
//! a node inserted by the parser, text edited in place) is reported to a
//! [`ChangeHandler`]. The handler decides, per notification, which render
//! state must be recomputed and which pixels must be repainted:
//!
//! - **Repaint reasons** ([`RepaintReason`], [`ReasonEffects`]): a fixed
//!   decision table of side effects per kind of change.
//! - **Ancestor propagation**: every ancestor with render state learns that
//!   something below it changed; text layouts and fonts are invalidated as a
//!   whole.
//! - **Dependent sweep**: elements that reference the changed one (through
//!   the [`thicket_graph::DependencyGraph`] kept in the
//!   [`DocumentContext`]) are marked too, transitively.
//! - **Transform fast path**: a `transform` change on an element nothing
//!   depends on is pushed straight into its paint node.
//!
//! The handler never paints. It records invalid areas through the
//! [`ChangeHost`] and asks it to schedule an update.
//!
//! ## Document model
//!
//! The document is reached through the [`SvgDocument`] trait: tree structure,
//! element capabilities ([`ElementCaps`]), ids and per-element
//! [`RenderState`]. [`Tree`] is a small arena implementation for embedders
//! without a DOM of their own, and for tests.
//!
//! ## Instrumentation
//!
//! [`ChangeCounters`] on the context counts ancestor walks, sweeps, marked
//! dependents, fast paths and font cascades. Decisions are also logged with
//! `tracing` at `trace` and `debug` level.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod attr;
mod context;
mod document;
mod error;
mod fonts;
mod handler;
mod host;
mod mark;
mod reason;
mod repaint;
mod shadow;
mod state;
mod sweep;
mod tree;

pub use attr::{AttrName, Namespace};
pub use context::{ChangeConfig, ChangeCounters, DocumentContext, DocumentKind};
pub use document::{ElementCaps, ElementKind, NodeId, SvgDocument};
pub use error::{ChangeError, HostError};
pub use handler::ChangeHandler;
pub use host::{ChangeHost, InlineLoad};
pub use reason::{PropsChanged, ReasonEffects, RepaintReason};
pub use state::{InvalidFlags, PaintNode, RenderState};
pub use tree::Tree;
