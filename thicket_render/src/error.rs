// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;

use thicket_region::RegionError;

/// Error reported by a [`Painter`](crate::Painter).
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub enum PaintError {
    /// The painter ran out of memory.
    OutOfMemory,
    /// The paint traversal failed, for example on a malformed paint node.
    Failed(&'static str),
}

impl fmt::Debug for PaintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => f.write_str("PaintError::OutOfMemory"),
            Self::Failed(what) => write!(f, "PaintError::Failed({what:?})"),
        }
    }
}

impl fmt::Display for PaintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => f.write_str("out of memory while painting"),
            Self::Failed(what) => write!(f, "paint failed: {what}"),
        }
    }
}

impl core::error::Error for PaintError {}

/// Error returned by the [`Renderer`](crate::Renderer).
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub enum RenderError {
    /// A render target or the invalid region could not grow.
    OutOfMemory,
    /// The painter failed. The renderer is stopped and needs a new
    /// [`setup`](crate::Renderer::setup).
    Paint(PaintError),
    /// [`update`](crate::Renderer::update) was called with no area set up.
    NotSetUp,
    /// A stop requested during the update was applied.
    Stopped,
}

impl fmt::Debug for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => f.write_str("RenderError::OutOfMemory"),
            Self::Paint(e) => f.debug_tuple("RenderError::Paint").field(e).finish(),
            Self::NotSetUp => f.write_str("RenderError::NotSetUp"),
            Self::Stopped => f.write_str("RenderError::Stopped"),
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => f.write_str("out of memory while rendering"),
            Self::Paint(e) => write!(f, "{e}"),
            Self::NotSetUp => f.write_str("no render area has been set up"),
            Self::Stopped => f.write_str("rendering was stopped"),
        }
    }
}

impl core::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Paint(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PaintError> for RenderError {
    fn from(e: PaintError) -> Self {
        Self::Paint(e)
    }
}

impl From<RegionError> for RenderError {
    fn from(e: RegionError) -> Self {
        match e {
            RegionError::OutOfMemory => Self::OutOfMemory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn paint_errors_keep_their_source() {
        let e = RenderError::from(PaintError::Failed("bad node"));
        assert_eq!(e.to_string(), "paint failed: bad node");
        assert!(core::error::Error::source(&e).is_some());
        assert_eq!(
            RenderError::from(RegionError::OutOfMemory),
            RenderError::OutOfMemory
        );
    }
}
