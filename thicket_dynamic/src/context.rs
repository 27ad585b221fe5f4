// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-document state that outlives a single change.

use alloc::string::String;
use alloc::vec::Vec;

use thicket_graph::DependencyGraph;

use crate::document::NodeId;

/// Where a document lives.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DocumentKind {
    /// A document shown on its own or inline in a host page.
    #[default]
    Standalone,
    /// A resource document shown through an element of a parent document.
    ///
    /// Repaints are forwarded to `referencing`, and dependencies are
    /// registered in the parent's graph.
    External {
        /// The element in the parent document that shows this one.
        referencing: NodeId,
    },
}

/// Tuning for change handling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChangeConfig {
    /// Run the font cascade when font elements change.
    pub track_fonts: bool,
    /// Initial capacity of the visited sets of a dependent sweep.
    pub sweep_capacity_hint: usize,
}

impl Default for ChangeConfig {
    fn default() -> Self {
        Self {
            track_fonts: true,
            sweep_capacity_hint: 16,
        }
    }
}

impl ChangeConfig {
    /// Returns a copy with `track_fonts` replaced.
    #[must_use]
    pub fn with_track_fonts(mut self, track_fonts: bool) -> Self {
        self.track_fonts = track_fonts;
        self
    }

    /// Returns a copy with `sweep_capacity_hint` replaced.
    #[must_use]
    pub fn with_sweep_capacity_hint(mut self, hint: usize) -> Self {
        self.sweep_capacity_hint = hint;
        self
    }
}

/// How often each part of change handling ran.
///
/// Counters only grow; reset them with [`DocumentContext::take_counters`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeCounters {
    /// Ancestor walks done while marking elements.
    pub ancestor_walks: u64,
    /// Dependent sweeps started.
    pub dependency_sweeps: u64,
    /// Dependents marked by sweeps.
    pub dependents_marked: u64,
    /// Transform changes handled by updating the paint node in place.
    pub transform_fast_paths: u64,
    /// Whole-document font cascades.
    pub font_rebuilds: u64,
}

/// State of one document shared by every change handled in it.
#[derive(Debug, Default)]
pub struct DocumentContext {
    pub(crate) graph: Option<DependencyGraph<NodeId>>,
    pub(crate) kind: DocumentKind,
    pub(crate) invalidation_pending: bool,
    pub(crate) contains_tref: bool,
    pub(crate) view_fragment: Option<String>,
    pub(crate) pending_discards: Vec<NodeId>,
    pub(crate) counters: ChangeCounters,
    pub(crate) config: ChangeConfig,
    pub(crate) in_font_rebuild: bool,
}

impl DocumentContext {
    /// Context for a standalone document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for a resource document shown by `referencing`.
    #[must_use]
    pub fn external(referencing: NodeId) -> Self {
        Self {
            kind: DocumentKind::External { referencing },
            ..Self::default()
        }
    }

    /// Returns a copy with `config` replaced.
    #[must_use]
    pub fn with_config(mut self, config: ChangeConfig) -> Self {
        self.config = config;
        self
    }

    /// Where the document lives.
    #[must_use]
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Change handling tuning.
    #[must_use]
    pub fn config(&self) -> &ChangeConfig {
        &self.config
    }

    /// The dependency graph, if any reference has been registered.
    #[must_use]
    pub fn graph(&self) -> Option<&DependencyGraph<NodeId>> {
        self.graph.as_ref()
    }

    /// The dependency graph, created on first use.
    ///
    /// External documents get `None`: their references go to the parent
    /// document's graph through
    /// [`ChangeHost::parent_graph`](crate::ChangeHost::parent_graph).
    pub fn ensure_graph(&mut self) -> Option<&mut DependencyGraph<NodeId>> {
        if matches!(self.kind, DocumentKind::External { .. }) {
            return None;
        }
        Some(self.graph.get_or_insert_with(DependencyGraph::new))
    }

    /// Drops the dependency graph.
    pub fn clear_graph(&mut self) {
        self.graph = None;
    }

    /// Whether a scheduled update has not run yet.
    #[must_use]
    pub fn invalidation_pending(&self) -> bool {
        self.invalidation_pending
    }

    /// Called by the host once the scheduled update ran.
    pub fn set_invalidation_pending(&mut self, pending: bool) {
        self.invalidation_pending = pending;
    }

    /// Records that the document contains a `tref` element, which makes
    /// character data anywhere under an element with an id relevant.
    pub fn set_contains_tref(&mut self, contains: bool) {
        self.contains_tref = contains;
    }

    /// The fragment identifier the document was opened with, naming the
    /// active `view` element.
    #[must_use]
    pub fn view_fragment(&self) -> Option<&str> {
        self.view_fragment.as_deref()
    }

    /// Sets the fragment identifier naming the active `view` element.
    pub fn set_view_fragment(&mut self, fragment: Option<&str>) {
        self.view_fragment = fragment.map(String::from);
    }

    /// Elements a `discard` element scheduled for removal, oldest first.
    pub fn take_pending_discards(&mut self) -> Vec<NodeId> {
        core::mem::take(&mut self.pending_discards)
    }

    /// Instrumentation counters.
    #[must_use]
    pub fn counters(&self) -> &ChangeCounters {
        &self.counters
    }

    /// Returns the counters and resets them.
    pub fn take_counters(&mut self) -> ChangeCounters {
        core::mem::take(&mut self.counters)
    }
}
