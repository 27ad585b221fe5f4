// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Propagating a change to the elements that reference it.

use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashSet;
use thicket_graph::DependencyGraph;
use tracing::{trace, warn};

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
    /// Marks everything that transitively references the changed nodes.
    ///
    /// The changed nodes are `with_parents` and its ancestors, plus
    /// `with_children` and its descendants. Each round marks the dependents
    /// of the current frontier, and those dependents together with their
    /// ancestors form the next frontier. A dependent is marked at most once
    /// per sweep, so reference cycles terminate.
    pub(crate) fn mark_dependent_nodes_for_repaint(
        &mut self,
        with_parents: Option<NodeId>,
        with_children: Option<NodeId>,
    ) -> Result<(), ChangeError> {
        if !self.has_graph() {
            return Ok(());
        }
        debug_assert!(
            with_parents.is_none() || with_parents != with_children,
            "the same node cannot seed both directions"
        );
        self.ctx.counters.dependency_sweeps += 1;

        let hint = self.ctx.config.sweep_capacity_hint;
        let mut modified: HashSet<NodeId> = HashSet::new();
        modified
            .try_reserve(hint)
            .map_err(|_| ChangeError::OutOfMemory)?;
        if let Some(node) = with_parents {
            modified.insert(node);
            modified.extend(self.doc.ancestors(node));
        }
        if let Some(node) = with_children {
            modified.extend(self.doc.descendants(node));
        }

        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut affected: HashSet<NodeId> = HashSet::new();
        while !modified.is_empty() {
            for node in modified.drain() {
                for dependent in self.dependents_of(node) {
                    if !visited.insert(dependent) {
                        continue;
                    }
                    if !self.doc.is_connected(dependent) {
                        continue;
                    }
                    let reason = if self.doc.caps(dependent).contains(ElementCaps::USE) {
                        RepaintReason::ElementStructure
                    } else {
                        RepaintReason::AttributeChanged
                    };
                    trace!(?node, ?dependent, ?reason, "marking dependent");
                    let parent = self.doc.parent(dependent);
                    self.mark_for_repaint(dependent, parent, reason)?;
                    self.ctx.counters.dependents_marked += 1;

                    affected.insert(dependent);
                    affected.extend(self.doc.ancestors(dependent));
                }
            }
            core::mem::swap(&mut modified, &mut affected);
        }
        Ok(())
    }

    /// Marks the direct dependents of `target` and sweeps from each.
    fn invalidate_dependents(&mut self, target: NodeId) -> Result<(), ChangeError> {
        for dependent in self.dependents_of(target) {
            let parent = self.doc.parent(dependent);
            self.mark_for_repaint(dependent, parent, RepaintReason::AttributeChanged)?;
            self.mark_dependent_nodes_for_repaint(Some(dependent), None)?;
        }
        Ok(())
    }

    /// `element` lost its id, or is about to get a new one.
    pub(crate) fn handle_removed_id(&mut self, element: NodeId) -> Result<(), ChangeError> {
        self.invalidate_dependents(element)?;
        if let Some(graph) = self.graph_mut() {
            graph.remove_target_node(element);
        }
        Ok(())
    }

    /// `element` now carries `id`.
    ///
    /// If it became the first match for `id`, references that resolved to
    /// the former first match now resolve to `element`.
    pub(crate) fn handle_new_id(&mut self, element: NodeId, id: &str) -> Result<(), ChangeError> {
        let matches = self.doc.elements_by_id(id);
        if matches.first() != Some(&element) {
            return Ok(());
        }
        let Some(&former) = matches.get(1) else {
            return Ok(());
        };
        trace!(?element, ?former, "id now resolves to a new element");
        self.invalidate_dependents(former)?;
        if let Some(graph) = self.graph_mut() {
            graph.remove_target_node(former);
        }
        Ok(())
    }

    /// Runs [`handle_new_id`](Self::handle_new_id) for every element with an
    /// id under `root`. Returns `true` if there was any.
    pub(crate) fn handle_new_ids(&mut self, root: NodeId) -> Result<bool, ChangeError> {
        let with_ids: Vec<(NodeId, String)> = self
            .doc
            .descendants(root)
            .filter_map(|n| self.doc.id(n).map(|id| (n, id.into())))
            .collect();
        let had_new_ids = !with_ids.is_empty();
        for (node, id) in with_ids {
            self.handle_new_id(node, &id)?;
        }
        Ok(had_new_ids)
    }

    /// New ids appeared: every element whose reference failed to resolve
    /// gets another chance at the next layout.
    pub(crate) fn update_unresolved_dependencies(&mut self) {
        let Some(graph) = self.graph_mut() else {
            return;
        };
        let unresolved: Vec<NodeId> = graph.unresolved().collect();
        graph.clear_unresolved_dependencies();

        for node in unresolved {
            let Some(state) = self.doc.render_state_mut(node) else {
                continue;
            };
            state.add_invalid(InvalidFlags::ADDED);
            trace!(?node, "retrying unresolved reference");

            let mut cursor = self.doc.parent(node);
            while let Some(ancestor) = cursor {
                match self.doc.render_state_mut(ancestor) {
                    Some(state) if state.invalid.level() < InvalidFlags::SUBTREE.level() => {
                        state.add_invalid(InvalidFlags::SUBTREE);
                    }
                    _ => break,
                }
                cursor = self.doc.parent(ancestor);
            }
        }
    }

    /// The graph to register references in, created on first use.
    fn ensure_graph(&mut self) -> Option<&mut DependencyGraph<NodeId>> {
        if self.is_external() {
            self.host.parent_graph()
        } else {
            self.ctx.ensure_graph()
        }
    }

    /// Registers that `dependent` references `target`.
    ///
    /// External documents register it in the parent document's graph, see
    /// [`ChangeHost::parent_graph`]. Called by layout when it resolves a reference. Failures are logged
    /// and swallowed: a missing edge only means a later change of `target`
    /// may not reach `dependent`.
    pub fn add_dependency(&mut self, dependent: NodeId, target: NodeId) {
        let Some(graph) = self.ensure_graph() else {
            trace!(?dependent, ?target, "no graph to register the dependency in");
            return;
        };
        if let Err(e) = graph.add_dependency(dependent, target) {
            warn!(?dependent, ?target, %e, "dropping dependency");
        }
    }

    /// Registers that `dependent` references an id nothing carries yet.
    pub fn add_unresolved_dependency(&mut self, dependent: NodeId) {
        let Some(graph) = self.ensure_graph() else {
            trace!(?dependent, "no graph to register the unresolved dependency in");
            return;
        };
        if let Err(e) = graph.add_unresolved_dependency(dependent) {
            warn!(?dependent, %e, "dropping unresolved dependency");
        }
    }
}
