// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The document model change handling reads from and writes to.

use alloc::vec::Vec;

use kurbo::Affine;
use thicket_graph::NodeTree;

use crate::error::ChangeError;
use crate::state::RenderState;

/// Identifier for an element in a document arena.
///
/// It consists of a slot index and a generation counter. A freed slot is
/// reused with a higher generation, so a stale `NodeId` never aliases a
/// different live element.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Element types the change handler tells apart.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[expect(missing_docs, reason = "variants are named after the SVG elements they stand for")]
pub enum ElementKind {
    Svg,
    #[default]
    G,
    Defs,
    Symbol,
    Use,
    Rect,
    Circle,
    Path,
    Image,
    FeImage,
    /// The `animation` element embedding another SVG document.
    Animation,
    Audio,
    Video,
    Text,
    TextArea,
    TSpan,
    TRef,
    TextPath,
    Font,
    FontFace,
    Style,
    Animate,
    AnimateTransform,
    AnimateMotion,
    Set,
    Discard,
    View,
    LinearGradient,
    RadialGradient,
    Stop,
    Pattern,
    Mask,
    ClipPath,
    Filter,
    Marker,
    /// Anything else.
    Other,
}

bitflags::bitflags! {
    /// Capabilities of an element resolved from its [`ElementKind`].
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ElementCaps: u16 {
        /// Defines a font.
        const FONT           = 1 << 0;
        /// Root of a text layout.
        const TEXT_ROOT      = 1 << 1;
        /// Driven by the animation timeline.
        const TIMED          = 1 << 2;
        /// An animation element.
        const ANIMATION      = 1 << 3;
        /// A `use` element with a shadow tree.
        const USE            = 1 << 4;
        /// A node of a `use` shadow tree.
        const SHADOW         = 1 << 5;
        /// Establishes a viewport.
        const VIEWPORT       = 1 << 6;
        /// Shows an external resource.
        const EXTERNAL_PROXY = 1 << 7;
        /// A `view` element.
        const VIEW           = 1 << 8;
        /// A `discard` element.
        const DISCARD        = 1 << 9;
        /// A `style` element.
        const STYLE          = 1 << 10;
        /// A `tref` element.
        const TREF           = 1 << 11;
    }
}

impl ElementKind {
    /// Capabilities of this element type.
    ///
    /// [`ElementCaps::SHADOW`] depends on where the element lives, not on
    /// its type, and is never returned here.
    #[must_use]
    pub fn caps(self) -> ElementCaps {
        match self {
            Self::Svg => ElementCaps::VIEWPORT,
            Self::Use => ElementCaps::USE,
            Self::Image | Self::FeImage => ElementCaps::EXTERNAL_PROXY,
            Self::Animation => ElementCaps::EXTERNAL_PROXY | ElementCaps::TIMED,
            Self::Audio | Self::Video => ElementCaps::TIMED,
            Self::Text | Self::TextArea => ElementCaps::TEXT_ROOT,
            Self::TRef => ElementCaps::TREF,
            Self::Font | Self::FontFace => ElementCaps::FONT,
            Self::Style => ElementCaps::STYLE,
            Self::Animate | Self::AnimateTransform | Self::AnimateMotion | Self::Set => {
                ElementCaps::ANIMATION | ElementCaps::TIMED
            }
            Self::Discard => ElementCaps::DISCARD | ElementCaps::ANIMATION | ElementCaps::TIMED,
            Self::View => ElementCaps::VIEW,
            _ => ElementCaps::empty(),
        }
    }
}

/// A live SVG document as seen by [`ChangeHandler`](crate::ChangeHandler).
///
/// Tree structure comes from [`NodeTree`]. The remaining methods expose the
/// per-element data change handling reads and the few mutations it performs
/// itself (render-state creation, style loading, shadow-tree teardown).
/// Methods with a default body are hooks an embedder without the matching
/// feature can ignore.
pub trait SvgDocument: NodeTree<NodeId> {
    /// The outermost `svg` element.
    fn root(&self) -> NodeId;

    /// Capabilities of `node`.
    fn caps(&self, node: NodeId) -> ElementCaps;

    /// The `id` attribute of `node`, if set and non-empty.
    fn id(&self, node: NodeId) -> Option<&str>;

    /// Every element in the document with `id`, in document order.
    fn elements_by_id(&self, id: &str) -> Vec<NodeId>;

    /// Render state of `node`, if it has one.
    fn render_state(&self, node: NodeId) -> Option<&RenderState>;

    /// Mutable render state of `node`, if it has one.
    fn render_state_mut(&mut self, node: NodeId) -> Option<&mut RenderState>;

    /// Creates render state for `node`, or returns the existing one.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeError::OutOfMemory`] if it cannot be allocated.
    fn create_render_state(&mut self, node: NodeId) -> Result<&mut RenderState, ChangeError>;

    /// Computes style for `node` so it can be queried before layout.
    ///
    /// # Errors
    ///
    /// Returns an error if style computation fails.
    fn load_style(&mut self, node: NodeId) -> Result<(), ChangeError> {
        let _ = node;
        Ok(())
    }

    /// The transform `node` currently resolves to, `None` for identity.
    fn local_transform(&self, node: NodeId) -> Option<Affine>;

    /// Marks the computed style of `node` stale.
    fn mark_props_dirty(&mut self, node: NodeId) {
        let _ = node;
    }

    /// Reparses an inline `style` of `node` that uses font-relative units.
    ///
    /// Returns `true` if it had any.
    fn reparse_font_relative_style(&mut self, node: NodeId) -> bool {
        let _ = node;
        false
    }

    /// Reloads the style sheet held by a `style` element.
    ///
    /// # Errors
    ///
    /// Returns an error if the sheet cannot be parsed.
    fn reload_style_sheet(&mut self, node: NodeId) -> Result<(), ChangeError> {
        let _ = node;
        Ok(())
    }

    /// Records whether the shadow tree of a `use` element is built.
    fn set_shadow_tree_built(&mut self, use_element: NodeId, built: bool) {
        let _ = (use_element, built);
    }

    /// For a shadow node, the element it was cloned from.
    fn shadow_source(&self, node: NodeId) -> Option<NodeId> {
        let _ = node;
        None
    }

    /// Unlinks `node` from its parent, keeping its subtree intact.
    fn detach(&mut self, node: NodeId);

    /// Frees a detached subtree.
    fn release(&mut self, node: NodeId) {
        let _ = node;
    }

    /// Whether `node` is reachable from [`root`](Self::root).
    fn is_connected(&self, node: NodeId) -> bool {
        let root = self.root();
        node == root || self.is_ancestor_of(root, node)
    }
}
