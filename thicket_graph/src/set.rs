// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Small deduplicating node sets used as adjacency lists.

use smallvec::SmallVec;

use crate::graph::GraphError;

/// An order-preserving, deduplicating set of node references.
///
/// Membership tests are linear. Dependency fan-out is typically a handful of
/// nodes, so the first four entries are stored inline and growth beyond that
/// spills to the heap with amortized doubling.
///
/// # Example
///
/// ```
/// use thicket_graph::NodeSet;
///
/// let mut set = NodeSet::<u32>::new();
/// assert_eq!(set.add(7), Ok(true));
/// assert_eq!(set.add(7), Ok(false));
/// assert!(set.contains(7));
///
/// let mut iter = set.iter();
/// assert_eq!(iter.next(), Some(7));
/// assert_eq!(iter.next(), None);
/// iter.restart();
/// assert_eq!(iter.next(), Some(7));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeSet<K> {
    nodes: SmallVec<[K; 4]>,
}

impl<K> Default for NodeSet<K> {
    fn default() -> Self {
        Self {
            nodes: SmallVec::new(),
        }
    }
}

impl<K: Copy + Eq> NodeSet<K> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: SmallVec::new(),
        }
    }

    /// Adds `node` if it is not already present.
    ///
    /// Returns `Ok(true)` if the node was inserted and `Ok(false)` if it was
    /// already a member. The only failure is running out of memory while
    /// growing, in which case the set is unchanged.
    pub fn add(&mut self, node: K) -> Result<bool, GraphError> {
        if self.contains(node) {
            return Ok(false);
        }
        self.nodes
            .try_reserve(1)
            .map_err(|_| GraphError::OutOfMemory)?;
        self.nodes.push(node);
        Ok(true)
    }

    /// Removes `node`, preserving the order of the remaining members.
    ///
    /// Returns `true` if the node was present.
    pub fn remove(&mut self, node: K) -> bool {
        match self.nodes.iter().position(|&n| n == node) {
            Some(pos) => {
                self.nodes.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Returns `true` if `node` is a member.
    #[must_use]
    pub fn contains(&self, node: K) -> bool {
        self.nodes.contains(&node)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the set has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Members in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[K] {
        &self.nodes
    }

    /// Returns a restartable cursor over the members.
    ///
    /// The borrow prevents mutation while the cursor is alive; callers that
    /// need to mutate the owning graph while walking should copy the members
    /// out first.
    #[must_use]
    pub fn iter(&self) -> NodeSetIter<'_, K> {
        NodeSetIter {
            nodes: &self.nodes,
            pos: 0,
        }
    }

    /// Removes every member for which `keep` returns `false`.
    pub(crate) fn retain(&mut self, mut keep: impl FnMut(K) -> bool) {
        self.nodes.retain(|n| keep(*n));
    }
}

/// Forward-only cursor over a [`NodeSet`] that can be rewound.
#[derive(Clone, Debug)]
pub struct NodeSetIter<'a, K> {
    nodes: &'a [K],
    pos: usize,
}

impl<K> NodeSetIter<'_, K> {
    pub(crate) fn empty() -> Self {
        Self { nodes: &[], pos: 0 }
    }

    /// Rewinds the cursor to the first member.
    pub fn restart(&mut self) {
        self.pos = 0;
    }
}

impl<K: Copy> Iterator for NodeSetIter<'_, K> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        let node = *self.nodes.get(self.pos)?;
        self.pos += 1;
        Some(node)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.nodes.len() - self.pos;
        (rest, Some(rest))
    }
}

impl<K: Copy> ExactSizeIterator for NodeSetIter<'_, K> {}

impl<'a, K: Copy + Eq> IntoIterator for &'a NodeSet<K> {
    type Item = K;
    type IntoIter = NodeSetIter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
