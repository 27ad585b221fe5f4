// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Worklist walks over the document tree and the reference graph.

use alloc::vec::Vec;
use core::fmt;
use core::hash::Hash;

use hashbrown::HashSet;

use crate::tree::NodeTree;

/// Pending nodes plus the set of nodes a walk has already reached.
///
/// A walk pushes candidates and pulls them back with `next_unvisited`,
/// which hands out each node at most once per [`reset`](Self::reset).
/// Invalidation runs one walk per mutation, so keeping an instance around
/// lets the buffers warm up once.
///
/// # See Also
///
/// - [`DependencyGraph::for_each_transitive_dependent`](crate::DependencyGraph::for_each_transitive_dependent)
/// - [`GraphTraverser::with_scratch`]
pub struct TraversalScratch<K> {
    pending: Vec<K>,
    reached: HashSet<K>,
}

impl<K: fmt::Debug> fmt::Debug for TraversalScratch<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraversalScratch")
            .field("pending", &self.pending.len())
            .field("reached", &self.reached.len())
            .finish()
    }
}

impl<K> Default for TraversalScratch<K> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            reached: HashSet::new(),
        }
    }
}

impl<K> TraversalScratch<K>
where
    K: Copy + Eq + Hash,
{
    /// Creates empty buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates buffers sized for walks reaching about `nodes` nodes.
    #[must_use]
    pub fn with_capacity(nodes: usize) -> Self {
        Self {
            pending: Vec::with_capacity(nodes),
            reached: HashSet::with_capacity(nodes),
        }
    }

    /// Forgets every pending and reached node, keeping capacity.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.reached.clear();
    }

    /// Records `node` as reached without handing it out.
    pub(crate) fn mark(&mut self, node: K) -> bool {
        self.reached.insert(node)
    }

    pub(crate) fn is_marked(&self, node: K) -> bool {
        self.reached.contains(&node)
    }

    pub(crate) fn push(&mut self, node: K) {
        self.pending.push(node);
    }

    pub(crate) fn push_all(&mut self, nodes: impl IntoIterator<Item = K>) {
        self.pending.extend(nodes);
    }

    /// Pops pending nodes until one has not been reached yet, marks it and
    /// returns it.
    pub(crate) fn next_unvisited(&mut self) -> Option<K> {
        while let Some(node) = self.pending.pop() {
            if self.reached.insert(node) {
                return Some(node);
            }
        }
        None
    }

    /// Drops the pending nodes of an aborted walk.
    pub(crate) fn abandon(&mut self) {
        self.pending.clear();
    }
}

/// Callback invoked once per node reached by a [`GraphTraverser`].
pub trait Visitor<K> {
    /// Error that aborts the walk.
    type Error;

    /// Visits `node`.
    ///
    /// # Errors
    ///
    /// Any error stops [`GraphTraverser::traverse`] immediately and is returned
    /// to its caller.
    fn visit(&mut self, node: K) -> Result<(), Self::Error>;
}

impl<K, E, F> Visitor<K> for F
where
    F: FnMut(K) -> Result<(), E>,
{
    type Error = E;

    fn visit(&mut self, node: K) -> Result<(), E> {
        self(node)
    }
}

/// Stack-and-visited-set flood fill seeded from tree positions.
///
/// Seeds are pushed with [`add_root_path`](Self::add_root_path) and
/// [`add_subtree`](Self::add_subtree). [`traverse`](Self::traverse) pops the
/// stack, visits each unmarked node, marks it, and pushes its tree
/// neighbours: the parent always, and the children too when the traverser
/// was built with `indirect` set.
///
/// # Example
///
/// ```
/// use thicket_graph::{GraphTraverser, NodeTree};
///
/// // 0 -> 1 -> 2
/// struct Chain;
/// impl NodeTree<u32> for Chain {
///     fn parent(&self, n: u32) -> Option<u32> { n.checked_sub(1) }
///     fn first_child(&self, n: u32) -> Option<u32> { (n < 2).then_some(n + 1) }
///     fn next_sibling(&self, _: u32) -> Option<u32> { None }
/// }
///
/// let mut seen = Vec::new();
/// let mut trav = GraphTraverser::new(false);
/// trav.add_root_path(&Chain, 2);
/// trav.traverse(&Chain, &mut |n: u32| -> Result<(), ()> {
///     seen.push(n);
///     Ok(())
/// })
/// .unwrap();
/// seen.sort();
/// assert_eq!(seen, [0, 1]);
/// ```
#[derive(Debug)]
pub struct GraphTraverser<K>
where
    K: Copy + Eq + Hash,
{
    scratch: TraversalScratch<K>,
    indirect: bool,
}

impl<K> GraphTraverser<K>
where
    K: Copy + Eq + Hash,
{
    /// Creates a traverser. `indirect` also follows child links.
    #[must_use]
    pub fn new(indirect: bool) -> Self {
        Self {
            scratch: TraversalScratch::new(),
            indirect,
        }
    }

    /// Creates a traverser reusing existing scratch buffers.
    #[must_use]
    pub fn with_scratch(mut scratch: TraversalScratch<K>, indirect: bool) -> Self {
        scratch.reset();
        Self { scratch, indirect }
    }

    /// Returns the scratch buffers for reuse.
    #[must_use]
    pub fn into_scratch(self) -> TraversalScratch<K> {
        self.scratch
    }

    /// Marks `node` as visited so the walk will not visit it.
    ///
    /// Returns `true` if the node was not marked before.
    pub fn mark(&mut self, node: K) -> bool {
        self.scratch.mark(node)
    }

    /// Returns `true` if `node` has been marked or visited.
    #[must_use]
    pub fn is_marked(&self, node: K) -> bool {
        self.scratch.is_marked(node)
    }

    /// Pushes every strict ancestor of `node`.
    pub fn add_root_path<T>(&mut self, tree: &T, node: K)
    where
        T: NodeTree<K> + ?Sized,
    {
        self.scratch.push_all(tree.ancestors(node));
    }

    /// Pushes `node` and every descendant.
    pub fn add_subtree<T>(&mut self, tree: &T, node: K)
    where
        T: NodeTree<K> + ?Sized,
    {
        self.scratch.push_all(tree.descendants(node));
    }

    /// Drains the work stack.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `visitor`; the remaining stack is
    /// discarded.
    pub fn traverse<T, V>(&mut self, tree: &T, visitor: &mut V) -> Result<(), V::Error>
    where
        T: NodeTree<K> + ?Sized,
        V: Visitor<K> + ?Sized,
    {
        while let Some(node) = self.scratch.next_unvisited() {
            if let Err(err) = visitor.visit(node) {
                self.scratch.abandon();
                return Err(err);
            }
            if let Some(parent) = tree.parent(node) {
                self.scratch.push(parent);
            }
            if self.indirect {
                self.scratch.push_all(tree.children(node));
            }
        }
        Ok(())
    }
}
