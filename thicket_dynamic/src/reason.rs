// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Why an element is marked for repaint, and what each reason implies.

use crate::state::InvalidFlags;

/// Cause of a repaint request.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RepaintReason {
    /// The element left the document.
    ElementRemoved,
    /// The element was inserted into the document.
    ElementAdded,
    /// The element's structure changed in a way that needs a new layout.
    ElementStructure,
    /// The parser finished the element.
    ElementParsed,
    /// Only how the element is painted changed.
    PaintDetailChanged,
    /// An attribute changed.
    AttributeChanged,
    /// An embedded resource the element shows changed.
    InlineChanged,
}

/// Side effects a [`RepaintReason`] triggers inside
/// [`ChangeHandler::mark_for_repaint`](crate::ChangeHandler::mark_for_repaint).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ReasonEffects {
    /// Create missing render state (timed elements are handed to the
    /// animation scheduler instead).
    pub ensure_render_state: bool,
    /// Load style for the subtree when the element has no render state yet.
    pub load_style: bool,
    /// Mark the parent's render state [`InvalidFlags::STRUCTURE`].
    pub parent_structure: bool,
    /// Push paint-only invalidation through the paint node, when the element
    /// already has render state.
    pub extra_invalidation: bool,
    /// Schedule an update even when nothing was invalidated yet.
    pub always_schedule: bool,
    /// Flags added to the element's own render state, if it has one.
    pub own_flags: InvalidFlags,
}

impl RepaintReason {
    /// The fixed decision table.
    ///
    /// | reason | render state | style | parent | extra | schedule | own flags |
    /// |---|---|---|---|---|---|---|
    /// | removed | | | structure | yes | if state | |
    /// | added | | yes | structure | | always | added |
    /// | structure | create | | structure | yes | always | added |
    /// | parsed | | yes | structure | | always | added |
    /// | paint detail | | | | yes | if state | subtree |
    /// | attribute | create | | | yes | always | added |
    /// | inline | | | | yes | if state | added |
    #[must_use]
    pub fn effects(self) -> ReasonEffects {
        let none = ReasonEffects::default();
        match self {
            Self::ElementRemoved => ReasonEffects {
                parent_structure: true,
                extra_invalidation: true,
                ..none
            },
            Self::ElementAdded | Self::ElementParsed => ReasonEffects {
                load_style: true,
                parent_structure: true,
                always_schedule: true,
                own_flags: InvalidFlags::ADDED,
                ..none
            },
            Self::ElementStructure => ReasonEffects {
                ensure_render_state: true,
                parent_structure: true,
                extra_invalidation: true,
                always_schedule: true,
                own_flags: InvalidFlags::ADDED,
                ..none
            },
            Self::PaintDetailChanged => ReasonEffects {
                extra_invalidation: true,
                own_flags: InvalidFlags::SUBTREE,
                ..none
            },
            Self::AttributeChanged => ReasonEffects {
                ensure_render_state: true,
                extra_invalidation: true,
                always_schedule: true,
                own_flags: InvalidFlags::ADDED,
                ..none
            },
            Self::InlineChanged => ReasonEffects {
                extra_invalidation: true,
                own_flags: InvalidFlags::ADDED,
                ..none
            },
        }
    }
}

bitflags::bitflags! {
    /// Property changes reported by the style system for one element.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PropsChanged: u8 {
        /// Paint-only properties changed.
        const REPAINT     = 0b0000_0001;
        /// Geometry-affecting properties changed.
        const RELAYOUT    = 0b0000_0010;
        /// `display` changed.
        const DISPLAY     = 0b0000_0100;
        /// `audio-level` changed.
        const AUDIO_LEVEL = 0b0000_1000;
    }
}

impl PropsChanged {
    /// Reason implied by these changes; later flags in the order repaint,
    /// relayout, display take precedence.
    #[must_use]
    pub fn reason(self) -> Option<RepaintReason> {
        let mut reason = None;
        if self.contains(Self::REPAINT) {
            reason = Some(RepaintReason::PaintDetailChanged);
        }
        if self.contains(Self::RELAYOUT) {
            reason = Some(RepaintReason::AttributeChanged);
        }
        if self.contains(Self::DISPLAY) {
            reason = Some(RepaintReason::ElementStructure);
        }
        reason
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removal_never_adds_own_flags() {
        let e = RepaintReason::ElementRemoved.effects();
        assert!(e.own_flags.is_empty());
        assert!(!e.always_schedule);
        assert!(e.parent_structure);
    }

    #[test]
    fn paint_detail_leaves_structure_alone() {
        let e = RepaintReason::PaintDetailChanged.effects();
        assert!(!e.parent_structure);
        assert!(!e.ensure_render_state);
        assert_eq!(e.own_flags, InvalidFlags::SUBTREE);
    }

    #[test]
    fn display_wins_over_repaint() {
        assert_eq!(PropsChanged::empty().reason(), None);
        assert_eq!(
            PropsChanged::REPAINT.reason(),
            Some(RepaintReason::PaintDetailChanged)
        );
        assert_eq!(
            (PropsChanged::REPAINT | PropsChanged::DISPLAY).reason(),
            Some(RepaintReason::ElementStructure)
        );
        assert_eq!(PropsChanged::AUDIO_LEVEL.reason(), None);
    }
}
