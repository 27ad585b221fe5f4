// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collaborators outside the document tree.

use kurbo::Rect;
use thicket_graph::DependencyGraph;
use thicket_region::InvalidState;

use crate::document::NodeId;
use crate::error::HostError;

/// Whether an embedded document is ready to take part in layout.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum InlineLoad {
    /// The embedded document exists.
    #[default]
    Ready,
    /// The embedded document is still loading; layout will be requested
    /// again once it arrives.
    Pending,
}

/// The image, renderer, animation and layout services a document lives in.
///
/// The first five methods are required: they are how an invalidation
/// reaches the screen. The rest are notifications for optional subsystems
/// and default to doing nothing.
pub trait ChangeHost {
    /// Invalid-area state of the active renderer, if any.
    fn invalid_state(&mut self) -> Option<&mut InvalidState>;

    /// Whether the document is currently shown.
    fn is_visible(&self) -> bool;

    /// Requests a layout and paint pass at the next opportunity.
    fn schedule_update(&mut self);

    /// Requests repaint of `area` without a layout pass.
    fn queue_invalidate(&mut self, area: Rect);

    /// Repaints `referencing`, the element in the parent document that shows
    /// this (external) document.
    fn invalidate_referencing_element(&mut self, referencing: NodeId);

    /// Whether a renderer is in the middle of an update.
    fn renderer_active(&self) -> bool {
        false
    }

    /// Stops the active renderer.
    fn stop_renderer(&mut self) {}

    /// Invalidates the whole canvas.
    fn invalidate_all(&mut self) {
        if let Some(state) = self.invalid_state() {
            state.reset();
        }
    }

    /// Dependency graph of the parent document.
    ///
    /// Only asked for by external documents
    /// ([`DocumentKind::External`](crate::DocumentKind::External)), which
    /// register and look up references there instead of keeping a graph of
    /// their own. Node handles of both documents meet in that graph, so they
    /// must not collide (see [`Tree::with_index_base`](crate::Tree::with_index_base)).
    /// Returning `None` leaves the references untracked.
    fn parent_graph(&mut self) -> Option<&mut DependencyGraph<NodeId>> {
        None
    }

    /// Sets up animations found in a freshly inserted subtree.
    ///
    /// # Errors
    ///
    /// Returns an error if the timeline could not be updated.
    fn prepare_animations(&mut self, root: NodeId) -> Result<(), HostError> {
        let _ = root;
        Ok(())
    }

    /// Recomputes the timing of a timed element.
    fn invalidate_timing_element(&mut self, node: NodeId) {
        let _ = node;
    }

    /// Marks animated properties of `node` stale.
    fn mark_animation_props_dirty(&mut self, node: NodeId) {
        let _ = node;
    }

    /// Starts loading resources `node` references.
    fn load_external_references(&mut self, node: NodeId) {
        let _ = node;
    }

    /// Makes sure the document embedded by `node` exists.
    fn load_inline_document(&mut self, node: NodeId) -> InlineLoad {
        let _ = node;
        InlineLoad::Ready
    }

    /// Marks the layout box hosting the document dirty.
    fn mark_host_frame_dirty(&mut self) {}

    /// Called before a removed subtree is processed.
    fn subtree_removed(&mut self, root: NodeId) {
        let _ = root;
    }

    /// Rebuilds glyph data of a font element.
    fn rebuild_font_info(&mut self, font: NodeId) {
        let _ = font;
    }

    /// The `class` attribute of `node` changed.
    fn class_changed(&mut self, node: NodeId) {
        let _ = node;
    }
}
