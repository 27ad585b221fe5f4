// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Entry points called when the document changes.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use thicket_graph::DependencyGraph;
use tracing::debug;

use crate::attr::{AttrName, Namespace};
use crate::context::{DocumentContext, DocumentKind};
use crate::document::{ElementCaps, NodeId, SvgDocument};
use crate::error::ChangeError;
use crate::host::{ChangeHost, InlineLoad};
use crate::reason::{PropsChanged, RepaintReason};
use crate::state::InvalidFlags;

/// Turns document mutations into invalidation.
///
/// A handler borrows the document, its [`DocumentContext`] and the
/// [`ChangeHost`] for the duration of one or more notifications. It keeps no
/// state of its own; everything that outlives a call lives in the context.
///
/// Notifications must arrive in the order the mutations happened. Within one
/// call, ancestors are invalidated before dependents are swept, and nothing
/// is painted: the host is only asked to schedule an update.
///
/// # Example
///
/// ```
/// use thicket_dynamic::{
///     AttrName, ChangeHandler, ChangeHost, DocumentContext, ElementKind, Namespace,
///     NodeId, SvgDocument, Tree,
/// };
/// use thicket_region::InvalidState;
///
/// #[derive(Default)]
/// struct Host {
///     updates: u32,
/// }
///
/// impl ChangeHost for Host {
///     fn invalid_state(&mut self) -> Option<&mut InvalidState> { None }
///     fn is_visible(&self) -> bool { true }
///     fn schedule_update(&mut self) { self.updates += 1; }
///     fn queue_invalidate(&mut self, _: kurbo::Rect) {}
///     fn invalidate_referencing_element(&mut self, _: NodeId) {}
/// }
///
/// let mut tree = Tree::new();
/// let rect = tree.create(ElementKind::Rect);
/// tree.append(tree.root(), rect);
///
/// let mut ctx = DocumentContext::new();
/// let mut host = Host::default();
/// ChangeHandler::new(&mut tree, &mut ctx, &mut host)
///     .handle_attribute_change(rect, AttrName::Fill, Namespace::Svg, false)
///     .unwrap();
///
/// assert_eq!(host.updates, 1);
/// assert!(ctx.invalidation_pending());
/// assert!(tree.render_state(rect).is_some());
/// ```
pub struct ChangeHandler<'a, D: ?Sized, H: ?Sized> {
    pub(crate) doc: &'a mut D,
    pub(crate) ctx: &'a mut DocumentContext,
    pub(crate) host: &'a mut H,
}

impl<D: ?Sized, H: ?Sized> fmt::Debug for ChangeHandler<'_, D, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeHandler")
            .field("ctx", &self.ctx)
            .finish_non_exhaustive()
    }
}

impl<'a, D, H> ChangeHandler<'a, D, H>
where
    D: SvgDocument + ?Sized,
    H: ChangeHost + ?Sized,
{
    /// Borrows everything a notification needs.
    pub fn new(doc: &'a mut D, ctx: &'a mut DocumentContext, host: &'a mut H) -> Self {
        Self { doc, ctx, host }
    }

    /// An attribute of `node` was set, changed or removed.
    ///
    /// # Errors
    ///
    /// Returns an error if render state or graph bookkeeping could not be
    /// allocated, or a host hook failed.
    pub fn handle_attribute_change(
        &mut self,
        node: NodeId,
        attr: AttrName,
        ns: Namespace,
        was_removed: bool,
    ) -> Result<(), ChangeError> {
        debug!(?node, ?attr, ?ns, was_removed, "attribute changed");
        let caps = self.doc.caps(node);
        let mut reason = RepaintReason::AttributeChanged;

        match ns {
            Namespace::Svg => {
                if caps.contains(ElementCaps::VIEW) {
                    if self.is_current_view(node) {
                        self.mark_whole_svg_for_repaint()?;
                        return Ok(());
                    }
                } else if caps.contains(ElementCaps::VIEWPORT) {
                    let is_root = node == self.doc.root();
                    if attr.is_viewport_geometry() {
                        if is_root {
                            self.doc.mark_props_dirty(node);
                            self.host.mark_host_frame_dirty();
                        }
                        if let Some(state) = self.doc.render_state_mut(node) {
                            state.add_invalid(InvalidFlags::FONT_METRICS);
                        }
                        reason = RepaintReason::ElementStructure;
                    } else if attr == AttrName::Opacity && is_root {
                        self.host.mark_host_frame_dirty();
                    }
                }

                if attr.is_presentation() {
                    if attr.is_inherited_paint() {
                        self.mark_dependent_nodes_for_repaint(None, Some(node))?;
                    } else if attr == AttrName::AudioLevel {
                        self.host.mark_animation_props_dirty(node);
                    } else if attr == AttrName::Display {
                        reason = RepaintReason::ElementStructure;
                    }
                    if let Some(state) = self.doc.render_state_mut(node) {
                        state.trusted_pres_attrs = false;
                        if attr == AttrName::BufferedRendering {
                            state.buffered = false;
                        } else if attr.affects_font_metrics() {
                            state.add_invalid(InvalidFlags::FONT_METRICS);
                        }
                    }
                } else if attr == AttrName::Class {
                    self.host.class_changed(node);
                } else if attr.is_transform()
                    && self.computed_invalid_level(node) < InvalidFlags::ADDED.level()
                    && !self.has_dependents_in_chain(node)
                    && self.update_paint_node_transform(node)?
                {
                    return Ok(());
                }
            }
            Namespace::XLink => {
                if attr == AttrName::Href {
                    if caps.contains(ElementCaps::USE) {
                        self.remove_shadow_tree(node)?;
                        self.remove_all_shadow_trees_referring_to(node)?;
                    } else if caps.contains(ElementCaps::EXTERNAL_PROXY) {
                        self.host.load_external_references(node);
                    }
                }
            }
            Namespace::Xml | Namespace::Other => return Ok(()),
        }

        let parent = self.doc.parent(node);
        self.mark_for_repaint(node, parent, reason)?;

        if self.has_graph() {
            if attr == AttrName::Id {
                self.handle_removed_id(node)?;
                if !was_removed {
                    if let Some(id) = self.doc.id(node).map(String::from) {
                        self.handle_new_id(node, &id)?;
                    }
                }
            }
            self.mark_dependent_nodes_for_repaint(Some(node), None)?;
            if let Some(graph) = self.graph_mut() {
                graph.remove_target_node(node);
            }
        }
        Ok(())
    }

    /// The style system reported property changes on `node`.
    ///
    /// # Errors
    ///
    /// As for [`handle_attribute_change`](Self::handle_attribute_change).
    pub fn handle_element_change(
        &mut self,
        node: NodeId,
        changes: PropsChanged,
    ) -> Result<(), ChangeError> {
        debug!(?node, ?changes, "element properties changed");
        if changes.contains(PropsChanged::AUDIO_LEVEL) {
            self.host.mark_animation_props_dirty(node);
        }
        let Some(reason) = changes.reason() else {
            return Ok(());
        };
        let parent = self.doc.parent(node);
        self.mark_for_repaint(node, parent, reason)?;
        if self.has_graph() {
            self.mark_dependent_nodes_for_repaint(Some(node), None)?;
            if let Some(graph) = self.graph_mut() {
                graph.remove_target_node(node);
            }
        }
        Ok(())
    }

    /// `child` was inserted under or removed from `parent`.
    ///
    /// For a removal, `child` must already be detached.
    ///
    /// # Errors
    ///
    /// As for [`handle_attribute_change`](Self::handle_attribute_change).
    pub fn handle_document_changed(
        &mut self,
        parent: NodeId,
        child: NodeId,
        is_addition: bool,
    ) -> Result<(), ChangeError> {
        debug!(?parent, ?child, is_addition, "document changed");
        if is_addition {
            self.handle_insertion(parent, child)
        } else {
            self.handle_removal(parent, child)
        }
    }

    fn handle_insertion(&mut self, parent: NodeId, child: NodeId) -> Result<(), ChangeError> {
        let subtree: Vec<NodeId> = self.doc.descendants(child).collect();
        for node in subtree {
            self.host.load_external_references(node);
        }

        self.mark_for_repaint(child, Some(parent), RepaintReason::ElementAdded)?;
        self.remove_all_shadow_trees_referring_to(parent)?;

        if self.contains_current_view(child) {
            self.host.invalidate_all();
            return Ok(());
        }

        self.host.prepare_animations(child)?;

        if self.has_graph() {
            let had_new_ids = self.handle_new_ids(child)?;
            self.mark_dependent_nodes_for_repaint(Some(parent), None)?;
            if had_new_ids {
                self.update_unresolved_dependencies();
            }
        }
        Ok(())
    }

    fn handle_removal(&mut self, parent: NodeId, child: NodeId) -> Result<(), ChangeError> {
        debug_assert!(
            self.doc.parent(child).is_none(),
            "removed child must be detached"
        );
        self.host.subtree_removed(child);
        self.mark_for_repaint(child, Some(parent), RepaintReason::ElementRemoved)?;

        if let Some(paint_node) = self
            .doc
            .render_state_mut(child)
            .and_then(|s| s.paint_node.as_mut())
        {
            paint_node.attached = false;
        }

        self.fixup_after_remove(child, parent)?;

        // A removed or ancestor view element may have been the active view.
        let mut cursor = Some(child);
        while let Some(node) = cursor {
            let current = if node == child {
                self.was_current_view(node)
            } else {
                self.is_current_view(node)
            };
            if self.doc.caps(node).contains(ElementCaps::VIEW) && current {
                self.host.invalidate_all();
                return Ok(());
            }
            cursor = if node == child {
                Some(parent)
            } else {
                self.doc.parent(node)
            };
        }

        if self.has_graph() {
            self.mark_dependent_nodes_for_repaint(Some(parent), Some(child))?;
            self.remove_subtree_from_dependency_graph(child);
        }
        Ok(())
    }

    /// The parser finished `node`.
    ///
    /// # Errors
    ///
    /// As for [`handle_attribute_change`](Self::handle_attribute_change).
    pub fn handle_end_element(&mut self, node: NodeId) -> Result<(), ChangeError> {
        let caps = self.doc.caps(node);
        if caps.intersects(ElementCaps::ANIMATION | ElementCaps::DISCARD) {
            return Ok(());
        }
        debug!(?node, "element parsed");
        let parent = self.doc.parent(node);
        self.mark_for_repaint(node, parent, RepaintReason::ElementParsed)?;
        if let Some(parent) = parent {
            self.remove_all_shadow_trees_referring_to(parent)?;
        }

        if self.contains_current_view(node) {
            self.host.invalidate_all();
            return Ok(());
        }

        self.host.prepare_animations(node)?;

        if self.has_graph() {
            self.handle_new_ids(node)?;
            self.mark_dependent_nodes_for_repaint(parent, None)?;
        }
        Ok(())
    }

    /// The resource an element embeds changed, or finished loading.
    ///
    /// Unless `content_changed` is set, shadow trees of `use` elements that
    /// reference `node` are rebuilt.
    ///
    /// # Errors
    ///
    /// As for [`handle_attribute_change`](Self::handle_attribute_change).
    pub fn handle_inline_changed(
        &mut self,
        node: NodeId,
        content_changed: bool,
    ) -> Result<(), ChangeError> {
        debug!(?node, content_changed, "inline resource changed");
        if self.doc.caps(node).contains(ElementCaps::EXTERNAL_PROXY) {
            if self.host.load_inline_document(node) == InlineLoad::Pending {
                return Ok(());
            }
            self.host.prepare_animations(node)?;
        }

        if self.host.renderer_active() {
            self.host.stop_renderer();
        }

        let parent = self.doc.parent(node);
        self.mark_for_repaint(node, parent, RepaintReason::AttributeChanged)?;

        if self.has_graph() {
            self.mark_dependent_nodes_for_repaint(Some(node), None)?;
            if !content_changed {
                let users = self.dependents_of(node);
                for user in users {
                    if self.doc.caps(user).contains(ElementCaps::USE) {
                        self.remove_shadow_tree(user)?;
                        self.remove_all_shadow_trees_referring_to(user)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Text content of `node` changed.
    ///
    /// Only text under a text root matters, or, in documents with `tref`,
    /// text under any element with an id.
    ///
    /// # Errors
    ///
    /// As for [`handle_attribute_change`](Self::handle_attribute_change).
    pub fn handle_character_data_changed(&mut self, node: NodeId) -> Result<(), ChangeError> {
        let has_tref = self.ctx.contains_tref;
        let mut meaningful = false;
        let mut cursor = Some(node);
        while let Some(n) = cursor {
            if self.doc.caps(n).contains(ElementCaps::TEXT_ROOT)
                || (has_tref && self.doc.id(n).is_some())
            {
                meaningful = true;
                break;
            }
            cursor = self.doc.parent(n);
        }
        let Some(text_parent) = self.doc.parent(node) else {
            return Ok(());
        };
        if !meaningful {
            return Ok(());
        }
        debug!(?node, "character data changed");
        self.mark_for_repaint(node, Some(text_parent), RepaintReason::AttributeChanged)?;
        if self.has_graph() {
            self.mark_dependent_nodes_for_repaint(Some(node), None)?;
        }
        Ok(())
    }

    /// A `discard` element fired for `node`.
    ///
    /// The element is hidden right away and queued for removal; the host
    /// drains the queue with [`DocumentContext::take_pending_discards`].
    pub fn handle_element_discard(&mut self, node: NodeId) {
        debug!(?node, "element discarded");
        if let Some(state) = self.doc.render_state_mut(node) {
            state.discarded = true;
        }
        self.update_paint_node(node);
        self.ctx.pending_discards.push(node);
    }

    /// Repaints the whole document.
    ///
    /// # Errors
    ///
    /// As for [`mark_for_repaint`](Self::mark_for_repaint).
    pub fn mark_whole_svg_for_repaint(&mut self) -> Result<(), ChangeError> {
        let root = self.doc.root();
        self.mark_for_repaint(root, None, RepaintReason::AttributeChanged)
    }

    /// This document is external and the element in the parent document
    /// that shows it must be laid out again.
    ///
    /// Call on the handler of the parent document.
    ///
    /// # Errors
    ///
    /// As for [`mark_for_repaint`](Self::mark_for_repaint).
    pub fn handle_referenced_document_changed(
        &mut self,
        referencing: NodeId,
    ) -> Result<(), ChangeError> {
        let parent = self.doc.parent(referencing);
        self.mark_for_repaint(referencing, parent, RepaintReason::InlineChanged)
    }

    /// Whether `node` is the element the view fragment resolves to.
    fn is_current_view(&self, node: NodeId) -> bool {
        self.ctx
            .view_fragment
            .as_deref()
            .is_some_and(|fragment| self.doc.elements_by_id(fragment).first() == Some(&node))
    }

    /// Id comparison for nodes no longer reachable from the root.
    fn was_current_view(&self, node: NodeId) -> bool {
        match (self.ctx.view_fragment.as_deref(), self.doc.id(node)) {
            (Some(fragment), Some(id)) => fragment == id,
            _ => false,
        }
    }

    /// Whether the active view element is `node` or below it.
    fn contains_current_view(&self, node: NodeId) -> bool {
        let Some(fragment) = self.ctx.view_fragment.as_deref() else {
            return false;
        };
        let Some(&view) = self.doc.elements_by_id(fragment).first() else {
            return false;
        };
        self.doc.caps(node).contains(ElementCaps::VIEW)
            && (view == node || self.doc.is_ancestor_of(node, view))
    }

    /// Pending level of `node`, with structural invalidation of an ancestor
    /// counting as a full relayout.
    fn computed_invalid_level(&self, node: NodeId) -> u8 {
        let own = self.doc.render_state(node).map_or(0, |s| s.invalid.level());
        let above = self
            .doc
            .ancestors(node)
            .filter_map(|a| self.doc.render_state(a))
            .any(|s| s.invalid.level() >= InvalidFlags::STRUCTURE.level());
        if above {
            InvalidFlags::ADDED.level()
        } else {
            own
        }
    }

    fn has_dependents_in_chain(&mut self, node: NodeId) -> bool {
        let chain: Vec<NodeId> = core::iter::once(node)
            .chain(self.doc.ancestors(node))
            .collect();
        let Some(graph) = self.graph_mut() else {
            return false;
        };
        chain.into_iter().any(|n| graph.has_dependents(n))
    }

    /// The graph references of this document are registered in: its own,
    /// or the parent document's for an external document.
    pub(crate) fn graph_mut(&mut self) -> Option<&mut DependencyGraph<NodeId>> {
        if self.is_external() {
            self.host.parent_graph()
        } else {
            self.ctx.graph.as_mut()
        }
    }

    pub(crate) fn has_graph(&mut self) -> bool {
        self.graph_mut().is_some()
    }

    pub(crate) fn dependents_of(&mut self, target: NodeId) -> Vec<NodeId> {
        self.graph_mut()
            .map(|g| g.dependents_vec(target))
            .unwrap_or_default()
    }

    pub(crate) fn is_external(&self) -> bool {
        matches!(self.ctx.kind, DocumentKind::External { .. })
    }
}
