// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thicket Graph: reference tracking between SVG document nodes.
//!
//! SVG elements reference each other (`use`, gradients, patterns, masks,
//! filters, markers, text paths). When a referenced element changes, every
//! element that uses it must be repainted too. This crate keeps that
//! bookkeeping without ever walking the whole document:
//!
//! - **Node sets** ([`NodeSet`], [`NodeSetIter`]): small deduplicating
//!   adjacency lists with a restartable cursor.
//! - **Dependency graph** ([`DependencyGraph`]): two inverse maps
//!   (target to dependents, dependent to targets) plus the set of nodes whose
//!   references are still unresolved.
//! - **Tree walking** ([`NodeTree`], [`GraphTraverser`], [`Visitor`]): a
//!   worklist flood fill seeded from an ancestor chain or a subtree.
//! - **Scratch buffers** ([`TraversalScratch`]): pending and reached nodes
//!   shared by the tree walker and transitive dependent walks.
//!
//! Nodes are opaque `Copy + Eq + Hash` handles into an arena owned by the
//! embedder. The graph never dereferences them; the embedder must call
//! [`DependencyGraph::remove_node`] or [`DependencyGraph::remove_subtree`]
//! before a handle dies.
//!
//! ## Quick Start
//!
//! ```rust
//! use thicket_graph::DependencyGraph;
//!
//! let mut graph = DependencyGraph::<u32>::new();
//!
//! // <use id="10" href="#1"/> and <use id="11" href="#10"/>
//! graph.add_dependency(10, 1).unwrap();
//! graph.add_dependency(11, 10).unwrap();
//!
//! // Everything that must be repainted when 1 changes.
//! let mut scratch = Default::default();
//! let mut affected = Vec::new();
//! graph.for_each_transitive_dependent(1, &mut scratch, |n| affected.push(n));
//! affected.sort();
//! assert_eq!(affected, [10, 11]);
//!
//! // A reference to an id that does not exist yet.
//! graph.add_unresolved_dependency(12).unwrap();
//! assert!(graph.unresolved().any(|n| n == 12));
//! ```
//!
//! ## Failure Model
//!
//! Every operation that allocates reports [`GraphError::OutOfMemory`] instead
//! of aborting, and leaves the graph unchanged when it does. A missing edge
//! only means a later change may fail to reach a dependent.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod graph;
mod set;
mod traverse;
mod tree;

pub use graph::{DependencyGraph, GraphError};
pub use set::{NodeSet, NodeSetIter};
pub use traverse::{GraphTraverser, TraversalScratch, Visitor};
pub use tree::{Ancestors, Children, Descendants, NodeTree};
