// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tearing down `use` shadow trees whose source changed.
//!
//! A shadow tree is a clone of the referenced content. It is never patched
//! in place: when anything it was cloned from changes, it is destroyed and
//! rebuilt by the next layout pass.

use alloc::vec::Vec;

use tracing::trace;

use crate::document::{ElementCaps, NodeId, SvgDocument};
use crate::error::ChangeError;
use crate::handler::ChangeHandler;
use crate::host::ChangeHost;
use crate::reason::RepaintReason;
use crate::state::InvalidFlags;

impl<D, H> ChangeHandler<'_, D, H>
where
    D: SvgDocument + ?Sized,
    H: ChangeHost + ?Sized,
{
    /// Destroys the shadow tree of `use_element` and marks it for rebuild.
    pub(crate) fn remove_shadow_tree(&mut self, use_element: NodeId) -> Result<(), ChangeError> {
        debug_assert!(
            self.doc.caps(use_element).contains(ElementCaps::USE),
            "not a use element"
        );
        trace!(?use_element, "removing shadow tree");
        let shadow_roots: Vec<NodeId> = self
            .doc
            .children(use_element)
            .filter(|&c| self.doc.caps(c).contains(ElementCaps::SHADOW))
            .collect();
        for root in shadow_roots {
            self.destroy_shadow_tree(root, use_element, false)?;
        }
        self.doc.set_shadow_tree_built(use_element, false);

        let chain: Vec<NodeId> = core::iter::once(use_element)
            .chain(self.doc.ancestors(use_element))
            .collect();
        for node in chain {
            if let Some(state) = self.doc.render_state_mut(node) {
                state.add_invalid(InvalidFlags::SUBTREE);
            }
        }
        Ok(())
    }

    fn destroy_shadow_tree(
        &mut self,
        shadow_root: NodeId,
        parent: NodeId,
        repaint: bool,
    ) -> Result<(), ChangeError> {
        debug_assert!(
            self.doc.caps(shadow_root).contains(ElementCaps::SHADOW),
            "not a shadow node"
        );
        self.doc.detach(shadow_root);
        if repaint {
            self.mark_for_repaint(shadow_root, Some(parent), RepaintReason::ElementRemoved)?;
        }
        self.remove_subtree_from_dependency_graph(shadow_root);
        self.doc.release(shadow_root);
        Ok(())
    }

    /// Drops a detached subtree from the dependency graph.
    pub fn remove_subtree_from_dependency_graph(&mut self, root: NodeId) {
        let graph = if self.is_external() {
            self.host.parent_graph()
        } else {
            self.ctx.graph.as_mut()
        };
        if let Some(graph) = graph {
            graph.remove_subtree(root, &*self.doc);
        }
    }

    /// Destroys the shadow trees of `use` elements that reference `element`
    /// or one of its ancestors.
    pub(crate) fn remove_all_shadow_trees_referring_to(
        &mut self,
        element: NodeId,
    ) -> Result<(), ChangeError> {
        if !self.has_graph() {
            return Ok(());
        }
        let chain: Vec<NodeId> = core::iter::once(element)
            .chain(self.doc.ancestors(element))
            .collect();
        for node in chain {
            for user in self.dependents_of(node) {
                if self.doc.caps(user).contains(ElementCaps::USE) {
                    self.remove_shadow_tree(user)?;
                }
            }
        }
        Ok(())
    }

    /// Destroys shadow trees of the `use` elements among the dependents of
    /// `target`. Returns `true` if there were any.
    fn remove_depending_use_subtrees(&mut self, target: NodeId) -> Result<bool, ChangeError> {
        let mut removed = false;
        for user in self.dependents_of(target) {
            let caps = self.doc.caps(user);
            let is_use = caps.contains(ElementCaps::USE)
                || (caps.contains(ElementCaps::SHADOW)
                    && self
                        .doc
                        .shadow_source(user)
                        .is_some_and(|s| self.doc.caps(s).contains(ElementCaps::USE)));
            if !is_use {
                continue;
            }
            removed = true;
            if let Some(first) = self.doc.first_child(user) {
                self.destroy_shadow_tree(first, user, true)?;
            }
            self.doc.set_shadow_tree_built(user, false);
        }
        Ok(removed)
    }

    /// Invalidates shadow trees cloned from a removed subtree or from the
    /// ancestors it was removed from.
    pub(crate) fn fixup_after_remove(
        &mut self,
        removed: NodeId,
        parent: NodeId,
    ) -> Result<(), ChangeError> {
        if !self.has_graph() {
            return Ok(());
        }

        // Pre-order walk of `removed`, skipping the rest of a subtree once
        // one of its nodes fed a shadow tree.
        let mut cursor = Some(removed);
        while let Some(node) = cursor {
            let skip = self.remove_depending_use_subtrees(node)?;
            cursor = if skip {
                self.next_outside(node, removed)
            } else {
                self.doc
                    .first_child(node)
                    .or_else(|| self.next_outside(node, removed))
            };
        }

        let chain: Vec<NodeId> = core::iter::once(parent)
            .chain(self.doc.ancestors(parent))
            .collect();
        for node in chain {
            self.remove_depending_use_subtrees(node)?;
        }
        Ok(())
    }

    /// Next node in pre-order after the subtree of `node`, staying under
    /// `root`.
    fn next_outside(&self, mut node: NodeId, root: NodeId) -> Option<NodeId> {
        loop {
            if node == root {
                return None;
            }
            if let Some(sibling) = self.doc.next_sibling(node) {
                return Some(sibling);
            }
            node = self.doc.parent(node)?;
        }
    }
}
