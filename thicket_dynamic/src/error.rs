// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;

use thicket_graph::GraphError;
use thicket_region::RegionError;

/// Failure reported by a [`ChangeHost`](crate::ChangeHost) hook.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub enum HostError {
    /// The collaborator ran out of memory.
    OutOfMemory,
    /// The collaborator failed for another reason.
    Failed(&'static str),
}

impl fmt::Debug for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => f.write_str("HostError::OutOfMemory"),
            Self::Failed(what) => write!(f, "HostError::Failed({what:?})"),
        }
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => f.write_str("host ran out of memory"),
            Self::Failed(what) => write!(f, "host failed: {what}"),
        }
    }
}

impl core::error::Error for HostError {}

/// Error returned by [`ChangeHandler`](crate::ChangeHandler) entry points.
///
/// Every variant is a soft failure: the document stays usable, but some
/// change may not be repainted until the next full invalidation.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub enum ChangeError {
    /// Render state or scratch space could not be allocated.
    OutOfMemory,
    /// A node handle no longer refers to a live element.
    UnknownNode,
    /// The dependency graph could not be updated.
    Graph(GraphError),
    /// The invalid region could not grow.
    Region(RegionError),
    /// A host hook failed.
    Host(HostError),
}

impl fmt::Debug for ChangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => f.write_str("ChangeError::OutOfMemory"),
            Self::UnknownNode => f.write_str("ChangeError::UnknownNode"),
            Self::Graph(e) => write!(f, "ChangeError::Graph({e:?})"),
            Self::Region(e) => write!(f, "ChangeError::Region({e:?})"),
            Self::Host(e) => write!(f, "ChangeError::Host({e:?})"),
        }
    }
}

impl fmt::Display for ChangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => f.write_str("out of memory while handling a document change"),
            Self::UnknownNode => f.write_str("node is not part of the document"),
            Self::Graph(e) => write!(f, "dependency graph: {e}"),
            Self::Region(e) => write!(f, "invalid region: {e}"),
            Self::Host(e) => write!(f, "{e}"),
        }
    }
}

impl core::error::Error for ChangeError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Graph(e) => Some(e),
            Self::Region(e) => Some(e),
            Self::Host(e) => Some(e),
            Self::OutOfMemory | Self::UnknownNode => None,
        }
    }
}

impl From<GraphError> for ChangeError {
    fn from(e: GraphError) -> Self {
        Self::Graph(e)
    }
}

impl From<RegionError> for ChangeError {
    fn from(e: RegionError) -> Self {
        Self::Region(e)
    }
}

impl From<HostError> for ChangeError {
    fn from(e: HostError) -> Self {
        Self::Host(e)
    }
}
