// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Read-only view of the document tree.

/// Parent/child structure of an externally owned document tree.
///
/// The graph and traversers never own nodes; they only ask the tree about
/// structure. Implementors provide the three primitive links and get the
/// walking iterators for free.
pub trait NodeTree<K: Copy + Eq> {
    /// Parent of `node`, or `None` for a root or detached node.
    fn parent(&self, node: K) -> Option<K>;

    /// First child of `node`.
    fn first_child(&self, node: K) -> Option<K>;

    /// Next sibling of `node`.
    fn next_sibling(&self, node: K) -> Option<K>;

    /// Strict ancestors of `node`, nearest first.
    fn ancestors(&self, node: K) -> Ancestors<'_, Self, K> {
        Ancestors {
            tree: self,
            next: self.parent(node),
        }
    }

    /// Direct children of `node` in document order.
    fn children(&self, node: K) -> Children<'_, Self, K> {
        Children {
            tree: self,
            next: self.first_child(node),
        }
    }

    /// `root` and all of its descendants in pre-order.
    fn descendants(&self, root: K) -> Descendants<'_, Self, K> {
        Descendants {
            tree: self,
            root,
            next: Some(root),
        }
    }

    /// Returns `true` if `ancestor` is a strict ancestor of `node`.
    fn is_ancestor_of(&self, ancestor: K, node: K) -> bool {
        self.ancestors(node).any(|a| a == ancestor)
    }
}

/// Iterator returned by [`NodeTree::ancestors`].
#[derive(Debug)]
pub struct Ancestors<'a, T: ?Sized, K> {
    tree: &'a T,
    next: Option<K>,
}

impl<T, K> Iterator for Ancestors<'_, T, K>
where
    T: NodeTree<K> + ?Sized,
    K: Copy + Eq,
{
    type Item = K;

    fn next(&mut self) -> Option<K> {
        let node = self.next?;
        self.next = self.tree.parent(node);
        Some(node)
    }
}

/// Iterator returned by [`NodeTree::children`].
#[derive(Debug)]
pub struct Children<'a, T: ?Sized, K> {
    tree: &'a T,
    next: Option<K>,
}

impl<T, K> Iterator for Children<'_, T, K>
where
    T: NodeTree<K> + ?Sized,
    K: Copy + Eq,
{
    type Item = K;

    fn next(&mut self) -> Option<K> {
        let node = self.next?;
        self.next = self.tree.next_sibling(node);
        Some(node)
    }
}

/// Iterator returned by [`NodeTree::descendants`].
///
/// Walks sibling and parent links, so it needs no stack.
#[derive(Debug)]
pub struct Descendants<'a, T: ?Sized, K> {
    tree: &'a T,
    root: K,
    next: Option<K>,
}

impl<T, K> Iterator for Descendants<'_, T, K>
where
    T: NodeTree<K> + ?Sized,
    K: Copy + Eq,
{
    type Item = K;

    fn next(&mut self) -> Option<K> {
        let node = self.next?;
        self.next = match self.tree.first_child(node) {
            Some(child) => Some(child),
            None => {
                let mut cur = node;
                loop {
                    if cur == self.root {
                        break None;
                    }
                    if let Some(sibling) = self.tree.next_sibling(cur) {
                        break Some(sibling);
                    }
                    match self.tree.parent(cur) {
                        Some(parent) => cur = parent,
                        None => break None,
                    }
                }
            }
        };
        Some(node)
    }
}

#[cfg(test)]
pub(crate) mod test_tree {
    use alloc::vec::Vec;

    use super::NodeTree;

    /// Index-based tree for unit tests: `parents[i]` is the parent of `i`.
    #[derive(Debug, Default)]
    pub(crate) struct VecTree {
        pub(crate) parents: Vec<Option<u32>>,
    }

    impl VecTree {
        pub(crate) fn new(parents: &[Option<u32>]) -> Self {
            Self {
                parents: parents.to_vec(),
            }
        }
    }

    impl NodeTree<u32> for VecTree {
        fn parent(&self, node: u32) -> Option<u32> {
            self.parents.get(node as usize).copied().flatten()
        }

        fn first_child(&self, node: u32) -> Option<u32> {
            (0..self.parents.len() as u32).find(|&i| self.parent(i) == Some(node))
        }

        fn next_sibling(&self, node: u32) -> Option<u32> {
            let parent = self.parent(node)?;
            (node + 1..self.parents.len() as u32).find(|&i| self.parent(i) == Some(parent))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_tree::VecTree;
    use super::*;
    use alloc::vec::Vec;

    //      0
    //     / \
    //    1   4
    //   / \
    //  2   3
    fn sample() -> VecTree {
        VecTree::new(&[None, Some(0), Some(1), Some(1), Some(0)])
    }

    #[test]
    fn ancestors_nearest_first() {
        let tree = sample();
        let up: Vec<_> = tree.ancestors(3).collect();
        assert_eq!(up, [1, 0]);
        assert_eq!(tree.ancestors(0).next(), None);
    }

    #[test]
    fn descendants_preorder_stays_under_root() {
        let tree = sample();
        let all: Vec<_> = tree.descendants(0).collect();
        assert_eq!(all, [0, 1, 2, 3, 4]);
        let sub: Vec<_> = tree.descendants(1).collect();
        assert_eq!(sub, [1, 2, 3]);
        let leaf: Vec<_> = tree.descendants(3).collect();
        assert_eq!(leaf, [3]);
    }

    #[test]
    fn children_in_order() {
        let tree = sample();
        let kids: Vec<_> = tree.children(1).collect();
        assert_eq!(kids, [2, 3]);
        assert!(tree.is_ancestor_of(0, 3));
        assert!(!tree.is_ancestor_of(4, 3));
    }
}
