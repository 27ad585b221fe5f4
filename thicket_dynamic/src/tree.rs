// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A minimal arena document.

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::Affine;
use thicket_graph::NodeTree;

use crate::document::{ElementCaps, ElementKind, NodeId, SvgDocument};
use crate::error::ChangeError;
use crate::state::{InvalidFlags, RenderState};

#[derive(Clone, Debug, Default)]
struct Element {
    kind: ElementKind,
    id: Option<String>,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
    render_state: Option<RenderState>,
    transform: Option<Affine>,
    shadow_source: Option<NodeId>,
    shadow_built: bool,
    style_loads: u32,
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    element: Option<Element>,
}

/// Arena-backed [`SvgDocument`].
///
/// Elements are created detached with [`create`](Self::create) and linked
/// with [`append`](Self::append). Handles of released elements go stale and
/// are ignored by every query.
///
/// # Example
///
/// ```
/// use thicket_dynamic::{ElementKind, SvgDocument, Tree};
/// use thicket_graph::NodeTree;
///
/// let mut tree = Tree::new();
/// let root = tree.root();
/// let g = tree.create(ElementKind::G);
/// tree.append(root, g);
/// tree.set_id(g, Some("layer"));
///
/// assert_eq!(tree.parent(g), Some(root));
/// assert_eq!(tree.elements_by_id("layer"), [g]);
/// ```
#[derive(Clone, Debug)]
pub struct Tree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    base: u32,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// A document holding only its root `svg` element.
    #[must_use]
    pub fn new() -> Self {
        Self::with_index_base(0)
    }

    /// Like [`new`](Self::new), but element handles start at slot `base`.
    ///
    /// An external document registers its references in the parent
    /// document's graph; giving the two trees disjoint bases keeps their
    /// handles apart there.
    #[must_use]
    pub fn with_index_base(base: u32) -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            free: Vec::new(),
            base,
            root: NodeId::new(base, 1),
        };
        tree.root = tree.create(ElementKind::Svg);
        tree
    }

    /// Creates a detached element.
    pub fn create(&mut self, kind: ElementKind) -> NodeId {
        let element = Element {
            kind,
            ..Element::default()
        };
        if let Some(idx) = self.free.pop() {
            if let Some(slot) = self.slots.get_mut((idx - self.base) as usize) {
                slot.generation += 1;
                slot.element = Some(element);
                return NodeId::new(idx, slot.generation);
            }
        }
        let len = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 1,
            element: Some(element),
        });
        NodeId::new(self.base.saturating_add(len), 1)
    }

    /// Creates a shadow-tree clone of `source`.
    pub fn create_shadow(&mut self, kind: ElementKind, source: NodeId) -> NodeId {
        let node = self.create(kind);
        if let Some(e) = self.get_mut(node) {
            e.shadow_source = Some(source);
        }
        node
    }

    /// Appends `child`, which must be detached, as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.parent(child).is_none(), "child is already linked");
        if !self.is_alive(parent) || !self.is_alive(child) {
            return;
        }
        let prev = self.get(parent).and_then(|p| p.last_child);
        if let Some(c) = self.get_mut(child) {
            c.parent = Some(parent);
            c.prev_sibling = prev;
            c.next_sibling = None;
        }
        match prev {
            Some(prev) => {
                if let Some(p) = self.get_mut(prev) {
                    p.next_sibling = Some(child);
                }
            }
            None => {
                if let Some(p) = self.get_mut(parent) {
                    p.first_child = Some(child);
                }
            }
        }
        if let Some(p) = self.get_mut(parent) {
            p.last_child = Some(child);
        }
    }

    /// Whether `node` refers to a live element.
    #[must_use]
    pub fn is_alive(&self, node: NodeId) -> bool {
        self.get(node).is_some()
    }

    /// Element type of `node`.
    #[must_use]
    pub fn kind(&self, node: NodeId) -> Option<ElementKind> {
        self.get(node).map(|e| e.kind)
    }

    /// Sets or clears the `id` attribute.
    pub fn set_id(&mut self, node: NodeId, id: Option<&str>) {
        if let Some(e) = self.get_mut(node) {
            e.id = id.filter(|s| !s.is_empty()).map(String::from);
        }
    }

    /// Sets the transform [`local_transform`](SvgDocument::local_transform)
    /// reports.
    pub fn set_transform(&mut self, node: NodeId, transform: Option<Affine>) {
        if let Some(e) = self.get_mut(node) {
            e.transform = transform;
        }
    }

    /// Replaces the render state of `node`.
    pub fn set_render_state(&mut self, node: NodeId, state: Option<RenderState>) {
        if let Some(e) = self.get_mut(node) {
            e.render_state = state;
        }
    }

    /// Whether the shadow tree of a `use` element is marked built.
    #[must_use]
    pub fn is_shadow_tree_built(&self, node: NodeId) -> bool {
        self.get(node).is_some_and(|e| e.shadow_built)
    }

    /// How many times [`load_style`](SvgDocument::load_style) ran for `node`.
    #[must_use]
    pub fn style_loads(&self, node: NodeId) -> u32 {
        self.get(node).map_or(0, |e| e.style_loads)
    }

    fn slot_index(&self, node: NodeId) -> Option<usize> {
        node.idx().checked_sub(self.base as usize)
    }

    fn get(&self, node: NodeId) -> Option<&Element> {
        self.slots
            .get(self.slot_index(node)?)
            .filter(|s| s.generation == node.1)
            .and_then(|s| s.element.as_ref())
    }

    fn get_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        let index = self.slot_index(node)?;
        self.slots
            .get_mut(index)
            .filter(|s| s.generation == node.1)
            .and_then(|s| s.element.as_mut())
    }
}

impl NodeTree<NodeId> for Tree {
    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node)?.parent
    }

    fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.get(node)?.first_child
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.get(node)?.next_sibling
    }
}

impl SvgDocument for Tree {
    fn root(&self) -> NodeId {
        self.root
    }

    fn caps(&self, node: NodeId) -> ElementCaps {
        let Some(e) = self.get(node) else {
            return ElementCaps::empty();
        };
        let mut caps = e.kind.caps();
        if e.shadow_source.is_some() {
            caps |= ElementCaps::SHADOW;
        }
        caps
    }

    fn id(&self, node: NodeId) -> Option<&str> {
        self.get(node)?.id.as_deref()
    }

    fn elements_by_id(&self, id: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .filter(|&n| self.id(n) == Some(id))
            .collect()
    }

    fn render_state(&self, node: NodeId) -> Option<&RenderState> {
        self.get(node)?.render_state.as_ref()
    }

    fn render_state_mut(&mut self, node: NodeId) -> Option<&mut RenderState> {
        self.get_mut(node)?.render_state.as_mut()
    }

    fn create_render_state(&mut self, node: NodeId) -> Result<&mut RenderState, ChangeError> {
        let e = self.get_mut(node).ok_or(ChangeError::UnknownNode)?;
        Ok(e.render_state.get_or_insert_with(|| RenderState {
            invalid: InvalidFlags::ADDED,
            ..RenderState::default()
        }))
    }

    fn load_style(&mut self, node: NodeId) -> Result<(), ChangeError> {
        let e = self.get_mut(node).ok_or(ChangeError::UnknownNode)?;
        e.style_loads += 1;
        Ok(())
    }

    fn local_transform(&self, node: NodeId) -> Option<Affine> {
        self.get(node)?.transform
    }

    fn set_shadow_tree_built(&mut self, use_element: NodeId, built: bool) {
        if let Some(e) = self.get_mut(use_element) {
            e.shadow_built = built;
        }
    }

    fn shadow_source(&self, node: NodeId) -> Option<NodeId> {
        self.get(node)?.shadow_source
    }

    fn detach(&mut self, node: NodeId) {
        let Some(e) = self.get(node) else {
            return;
        };
        let (parent, prev, next) = (e.parent, e.prev_sibling, e.next_sibling);
        let Some(parent) = parent else {
            return;
        };
        match prev {
            Some(prev) => {
                if let Some(p) = self.get_mut(prev) {
                    p.next_sibling = next;
                }
            }
            None => {
                if let Some(p) = self.get_mut(parent) {
                    p.first_child = next;
                }
            }
        }
        match next {
            Some(next) => {
                if let Some(n) = self.get_mut(next) {
                    n.prev_sibling = prev;
                }
            }
            None => {
                if let Some(p) = self.get_mut(parent) {
                    p.last_child = prev;
                }
            }
        }
        if let Some(e) = self.get_mut(node) {
            e.parent = None;
            e.prev_sibling = None;
            e.next_sibling = None;
        }
    }

    fn release(&mut self, node: NodeId) {
        debug_assert!(self.parent(node).is_none(), "release requires a detached root");
        let doomed: Vec<NodeId> = self.descendants(node).collect();
        for n in doomed {
            let Some(index) = self.slot_index(n) else {
                continue;
            };
            if let Some(slot) = self.slots.get_mut(index) {
                slot.element = None;
                self.free.push(n.0);
            }
        }
    }
}
