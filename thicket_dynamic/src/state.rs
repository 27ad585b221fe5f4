// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-element render state touched by change handling.

use kurbo::{Affine, Rect};

bitflags::bitflags! {
    /// How much of an element's render state must be recomputed.
    ///
    /// `SUBTREE`, `STRUCTURE` and `ADDED` form increasing levels; see
    /// [`InvalidFlags::level`]. `FONT_METRICS` is orthogonal.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct InvalidFlags: u8 {
        /// Some descendant needs to be revisited.
        const SUBTREE      = 0b0000_0001;
        /// Children were added, removed or reordered.
        const STRUCTURE    = 0b0000_0010;
        /// The element itself must be laid out from scratch.
        const ADDED        = 0b0000_0100;
        /// Font-relative lengths must be recomputed.
        const FONT_METRICS = 0b0000_1000;
    }
}

impl InvalidFlags {
    /// Highest level set, `0` when none of the ordered levels are.
    #[must_use]
    pub fn level(self) -> u8 {
        if self.contains(Self::ADDED) {
            3
        } else if self.contains(Self::STRUCTURE) {
            2
        } else if self.contains(Self::SUBTREE) {
            1
        } else {
            0
        }
    }
}

/// Paint-tree node attached to an element after layout.
#[derive(Clone, Debug, PartialEq)]
pub struct PaintNode {
    /// Whether the node is part of the paint tree being rendered.
    pub attached: bool,
    /// Transform from the parent's user space to screen space.
    pub parent_ctm: Affine,
    /// The element's own transform.
    pub transform: Affine,
    /// Bounds in the element's user space.
    pub local_bounds: Rect,
    /// Whether painting this node feeds a filter effect.
    pub affects_filter: bool,
}

impl PaintNode {
    /// An attached node with identity transforms.
    #[must_use]
    pub fn new(local_bounds: Rect) -> Self {
        Self {
            attached: true,
            parent_ctm: Affine::IDENTITY,
            transform: Affine::IDENTITY,
            local_bounds,
            affects_filter: false,
        }
    }

    /// Screen-space bounding box, snapped outward to whole pixels.
    #[must_use]
    pub fn screen_extents(&self) -> Rect {
        (self.parent_ctm * self.transform)
            .transform_rect_bbox(self.local_bounds)
            .expand()
    }
}

/// Layout and paint bookkeeping for one element.
///
/// Created lazily: most elements only get one once they are laid out or
/// touched by a change.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderState {
    /// Pending invalidation.
    pub invalid: InvalidFlags,
    /// Last known screen-space extents.
    pub screen_extents: Rect,
    /// Paint node, if one is attached.
    pub paint_node: Option<PaintNode>,
    /// Whether the cached bounding box is still valid.
    pub bbox_valid: bool,
    /// Set once a `discard` element has scheduled this element for removal.
    pub discarded: bool,
    /// Set on font elements whose glyph data must be rebuilt.
    pub font_data_dirty: bool,
    /// Whether cached presentation attributes can be reused.
    pub trusted_pres_attrs: bool,
    /// Whether the element keeps a paint buffer.
    pub buffered: bool,
}

impl RenderState {
    /// A state with an attached paint node covering `local_bounds`.
    #[must_use]
    pub fn with_paint_node(local_bounds: Rect) -> Self {
        let node = PaintNode::new(local_bounds);
        Self {
            screen_extents: node.screen_extents(),
            paint_node: Some(node),
            bbox_valid: true,
            trusted_pres_attrs: true,
            ..Self::default()
        }
    }

    /// Whether a paint node is attached.
    #[must_use]
    pub fn has_attached_paint_node(&self) -> bool {
        self.paint_node.as_ref().is_some_and(|n| n.attached)
    }

    /// Adds `flags` to the pending invalidation.
    pub fn add_invalid(&mut self, flags: InvalidFlags) {
        self.invalid |= flags;
    }
}
