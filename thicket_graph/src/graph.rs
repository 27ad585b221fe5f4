// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bidirectional reference graph between document nodes.

use alloc::vec::Vec;
use core::fmt;
use core::hash::Hash;

use hashbrown::{HashMap, HashSet};

use crate::set::{NodeSet, NodeSetIter};
use crate::traverse::TraversalScratch;
use crate::tree::NodeTree;

/// Error returned by fallible graph operations.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub enum GraphError {
    /// An adjacency list or map entry could not be allocated.
    ///
    /// The operation that reported it left the graph unchanged.
    OutOfMemory,
}

impl fmt::Debug for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => f.write_str("GraphError::OutOfMemory"),
        }
    }
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => f.write_str("out of memory while updating the dependency graph"),
        }
    }
}

impl core::error::Error for GraphError {}

/// Reference graph: "dependent uses target" edges between document nodes.
///
/// Two inverse maps are kept so both directions are O(1) lookups:
///
/// - by target: who references this node (what must be repainted when it
///   changes);
/// - by dependent: which nodes this node references.
///
/// A third set records nodes whose reference could not be resolved when it
/// was registered, so they can be revisited when new ids appear.
///
/// # Lazy target removal
///
/// [`remove_target_node`](Self::remove_target_node) only drops the by-target
/// entry. The matching by-dependent entries are left in place and are
/// treated as stale: [`dependencies`](Self::dependencies) filters them out
/// and they are purged the next time the dependent registers a dependency or
/// is removed. Observable queries therefore stay symmetric while removal
/// stays O(1) on the hot path.
///
/// # Example
///
/// ```
/// use thicket_graph::DependencyGraph;
///
/// let mut graph = DependencyGraph::<u32>::new();
///
/// // 2 references 1, 3 references 1
/// graph.add_dependency(2, 1).unwrap();
/// graph.add_dependency(3, 1).unwrap();
///
/// let users: Vec<_> = graph.dependents(1).collect();
/// assert_eq!(users, [2, 3]);
/// assert!(graph.dependencies(2).any(|t| t == 1));
///
/// // Changing 1 no longer needs to reach anyone.
/// graph.remove_target_node(1);
/// assert!(graph.dependent_set(1).is_none());
/// assert_eq!(graph.dependencies(2).count(), 0);
/// ```
///
/// # See Also
///
/// - [`NodeSet`]: Adjacency list type.
/// - [`GraphTraverser`](crate::GraphTraverser): Tree walker used alongside the graph.
#[derive(Clone)]
pub struct DependencyGraph<K>
where
    K: Copy + Eq + Hash,
{
    /// target -> nodes that reference it.
    by_target: HashMap<K, NodeSet<K>>,
    /// dependent -> nodes it references. May hold stale entries, see type docs.
    by_dependent: HashMap<K, NodeSet<K>>,
    unresolved: HashSet<K>,
}

impl<K> fmt::Debug for DependencyGraph<K>
where
    K: Copy + Eq + Hash + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyGraph")
            .field("by_target", &self.by_target)
            .field("by_dependent", &self.by_dependent)
            .field("unresolved", &self.unresolved)
            .finish()
    }
}

impl<K> Default for DependencyGraph<K>
where
    K: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> DependencyGraph<K>
where
    K: Copy + Eq + Hash,
{
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_target: HashMap::new(),
            by_dependent: HashMap::new(),
            unresolved: HashSet::new(),
        }
    }

    /// Returns `true` if the graph holds no edges and no unresolved nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty() && self.by_dependent.is_empty() && self.unresolved.is_empty()
    }

    /// Records that `dependent` references `target`.
    ///
    /// Idempotent: adding an existing edge is a no-op returning `Ok(false)`.
    /// Stale entries of `dependent` left behind by
    /// [`remove_target_node`](Self::remove_target_node) are purged first.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::OutOfMemory`] if either side could not grow. In
    /// that case the graph is exactly as it was before the call; the edge is
    /// simply missing, so a later change to `target` may not reach
    /// `dependent`.
    pub fn add_dependency(&mut self, dependent: K, target: K) -> Result<bool, GraphError> {
        self.purge_stale(dependent);

        self.by_target
            .try_reserve(1)
            .map_err(|_| GraphError::OutOfMemory)?;
        self.by_dependent
            .try_reserve(1)
            .map_err(|_| GraphError::OutOfMemory)?;

        let users = self.by_target.entry(target).or_default();
        let inserted = match users.add(dependent) {
            Ok(inserted) => inserted,
            Err(err) => {
                if users.is_empty() {
                    self.by_target.remove(&target);
                }
                return Err(err);
            }
        };

        let uses = self.by_dependent.entry(dependent).or_default();
        if let Err(err) = uses.add(target) {
            if uses.is_empty() {
                self.by_dependent.remove(&dependent);
            }
            if inserted {
                Self::unlink(&mut self.by_target, target, dependent);
            }
            return Err(err);
        }

        Ok(inserted)
    }

    /// Nodes that reference `target`, or `None` if nothing does.
    ///
    /// The borrow ties the result to the graph; copy the members out before
    /// mutating.
    #[must_use]
    pub fn dependent_set(&self, target: K) -> Option<&NodeSet<K>> {
        self.by_target.get(&target)
    }

    /// Iterates the nodes that reference `target`.
    ///
    /// Absent entries iterate as empty.
    pub fn dependents(&self, target: K) -> NodeSetIter<'_, K> {
        self.by_target
            .get(&target)
            .map_or_else(NodeSetIter::empty, NodeSet::iter)
    }

    /// Returns `true` if anything references `target`.
    #[must_use]
    pub fn has_dependents(&self, target: K) -> bool {
        self.by_target.contains_key(&target)
    }

    /// Iterates the nodes that `dependent` references.
    ///
    /// Entries made stale by [`remove_target_node`](Self::remove_target_node)
    /// are skipped.
    pub fn dependencies(&self, dependent: K) -> impl Iterator<Item = K> + '_ {
        self.by_dependent
            .get(&dependent)
            .into_iter()
            .flat_map(NodeSet::iter)
            .filter(move |&target| self.is_live(dependent, target))
    }

    /// Drops the by-target entry of `target`.
    ///
    /// The nodes that referenced `target` are not touched; their now stale
    /// forward entries are hidden from queries and purged lazily. Use
    /// [`remove_node`](Self::remove_node) when the node itself goes away.
    pub fn remove_target_node(&mut self, target: K) {
        self.by_target.remove(&target);
    }

    /// Removes `node` from the graph in both directions.
    pub fn remove_node(&mut self, node: K) {
        if let Some(users) = self.by_target.remove(&node) {
            for user in &users {
                Self::unlink(&mut self.by_dependent, user, node);
            }
        }
        if let Some(uses) = self.by_dependent.remove(&node) {
            for target in &uses {
                Self::unlink(&mut self.by_target, target, node);
            }
        }
        self.unresolved.remove(&node);
    }

    /// Removes `root` and every node below it.
    ///
    /// `root` must already be detached from its parent.
    pub fn remove_subtree<T>(&mut self, root: K, tree: &T)
    where
        T: NodeTree<K> + ?Sized,
    {
        debug_assert!(
            tree.parent(root).is_none(),
            "remove_subtree requires a detached root"
        );
        for node in tree.descendants(root) {
            self.remove_node(node);
        }
    }

    /// Records that `node` failed to resolve one of its references.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::OutOfMemory`] if the set could not grow.
    pub fn add_unresolved_dependency(&mut self, node: K) -> Result<bool, GraphError> {
        self.unresolved
            .try_reserve(1)
            .map_err(|_| GraphError::OutOfMemory)?;
        Ok(self.unresolved.insert(node))
    }

    /// Forgets every unresolved node.
    pub fn clear_unresolved_dependencies(&mut self) {
        self.unresolved.clear();
    }

    /// Iterates nodes with unresolved references, in no particular order.
    pub fn unresolved(&self) -> impl Iterator<Item = K> + '_ {
        self.unresolved.iter().copied()
    }

    /// Returns `true` if any node has an unresolved reference.
    #[must_use]
    pub fn has_unresolved(&self) -> bool {
        !self.unresolved.is_empty()
    }

    /// Drops all state.
    pub fn clear(&mut self) {
        self.by_target.clear();
        self.by_dependent.clear();
        self.unresolved.clear();
    }

    /// Calls `f` for every node that transitively references `key`.
    ///
    /// Each node is reported once, so reference cycles terminate.
    pub fn for_each_transitive_dependent(
        &self,
        key: K,
        scratch: &mut TraversalScratch<K>,
        mut f: impl FnMut(K),
    ) {
        scratch.reset();
        scratch.mark(key);
        scratch.push_all(self.dependents(key));

        while let Some(next) = scratch.next_unvisited() {
            f(next);
            scratch.push_all(self.dependents(next));
        }
    }

    /// Checks the symmetry invariant.
    ///
    /// Every by-target edge must be mirrored by a by-dependent entry, and no
    /// map holds an empty set. By-dependent entries without a mirror are the
    /// stale leftovers of lazy target removal and are allowed.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let no_empty = self.by_target.values().all(|s| !s.is_empty())
            && self.by_dependent.values().all(|s| !s.is_empty());
        no_empty
            && self.by_target.iter().all(|(&target, users)| {
                users.iter().all(|user| {
                    self.by_dependent
                        .get(&user)
                        .is_some_and(|uses| uses.contains(target))
                })
            })
    }

    fn is_live(&self, dependent: K, target: K) -> bool {
        self.by_target
            .get(&target)
            .is_some_and(|users| users.contains(dependent))
    }

    fn purge_stale(&mut self, dependent: K) {
        let Some(uses) = self.by_dependent.get_mut(&dependent) else {
            return;
        };
        let by_target = &self.by_target;
        uses.retain(|target| {
            by_target
                .get(&target)
                .is_some_and(|users| users.contains(dependent))
        });
        if uses.is_empty() {
            self.by_dependent.remove(&dependent);
        }
    }

    fn unlink(map: &mut HashMap<K, NodeSet<K>>, key: K, member: K) {
        if let Some(set) = map.get_mut(&key) {
            set.remove(member);
            if set.is_empty() {
                map.remove(&key);
            }
        }
    }

    /// Collects the nodes that reference `target`.
    ///
    /// Convenience for callers that need to mutate the graph while walking.
    #[must_use]
    pub fn dependents_vec(&self, target: K) -> Vec<K> {
        self.dependents(target).collect()
    }
}

impl<K> Drop for DependencyGraph<K>
where
    K: Copy + Eq + Hash,
{
    fn drop(&mut self) {
        debug_assert!(
            self.is_consistent(),
            "dependency graph dropped with asymmetric edges"
        );
    }
}
