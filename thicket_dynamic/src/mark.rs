// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The common sink of every change notification.

use alloc::vec::Vec;

use tracing::{trace, warn};

use crate::context::DocumentKind;
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
    /// Records that `element` must be repainted because of `reason`.
    ///
    /// `parent` is where the ancestor walk starts. It is passed explicitly
    /// because a removed element no longer has one.
    ///
    /// The side effects follow [`RepaintReason::effects`]. In addition,
    /// every ancestor with render state is marked
    /// [`InvalidFlags::SUBTREE`], a text root above `element` is laid out
    /// again as a whole, and a font element at or above `element` triggers
    /// the font cascade.
    ///
    /// # Errors
    ///
    /// Returns an error if render state or style could not be created, or
    /// if the invalid region could not grow.
    pub fn mark_for_repaint(
        &mut self,
        element: NodeId,
        parent: Option<NodeId>,
        reason: RepaintReason,
    ) -> Result<(), ChangeError> {
        trace!(?element, ?reason, "mark for repaint");
        let caps = self.doc.caps(element);
        let effects = reason.effects();
        let mut has_state = self.doc.render_state(element).is_some();

        if effects.ensure_render_state {
            if caps.contains(ElementCaps::TIMED) {
                self.host.invalidate_timing_element(element);
            } else if !has_state {
                self.doc.create_render_state(element)?;
                has_state = true;
            }
        }

        if effects.load_style && !has_state && !caps.contains(ElementCaps::SHADOW) {
            let subtree: Vec<NodeId> = self.doc.descendants(element).collect();
            for node in subtree {
                self.doc.load_style(node)?;
            }
        }

        if let Some(state) = parent
            .filter(|_| effects.parent_structure)
            .and_then(|p| self.doc.render_state_mut(p))
        {
            state.add_invalid(InvalidFlags::STRUCTURE);
        }

        let add_extra = effects.extra_invalidation && has_state;
        let mut schedule = add_extra || effects.always_schedule;

        if let Some(state) = self.doc.render_state_mut(element) {
            state.add_invalid(effects.own_flags);
        }

        if add_extra && self.update_paint_node(element) {
            schedule = true;
        }

        let mut font_element = caps.contains(ElementCaps::FONT).then_some(element);
        let mut invalidate_text_subtree = caps.contains(ElementCaps::TEXT_ROOT);

        self.ctx.counters.ancestor_walks += 1;
        let mut cursor = parent;
        while let Some(ancestor) = cursor {
            if let Some(state) = self.doc.render_state_mut(ancestor) {
                state.add_invalid(InvalidFlags::SUBTREE);
            }
            let ancestor_caps = self.doc.caps(ancestor);
            if ancestor_caps.contains(ElementCaps::FONT) {
                font_element = Some(ancestor);
            }
            if ancestor_caps.contains(ElementCaps::TEXT_ROOT) {
                // Text layout depends on every glyph before the change.
                let grandparent = self.doc.parent(ancestor);
                self.mark_for_repaint(ancestor, grandparent, RepaintReason::AttributeChanged)?;
                invalidate_text_subtree = true;
            }
            cursor = self.doc.parent(ancestor);
        }

        if invalidate_text_subtree {
            self.invalidate_text_subtree(element);
        }

        if let Some(font) = font_element.filter(|_| self.ctx.config.track_fonts) {
            if let Some(state) = self.doc.render_state_mut(font) {
                state.font_data_dirty = true;
            }
            // While parsing, fonts are rebuilt once the font element itself
            // is complete.
            if caps.contains(ElementCaps::FONT) || reason != RepaintReason::ElementParsed {
                if self.doc.is_connected(font) {
                    self.host.rebuild_font_info(font);
                }
                if let Err(e) = self.handle_fonts_changed() {
                    warn!(?font, %e, "font cascade failed");
                }
            }
        }

        if schedule {
            self.schedule_invalidation();
        }
        Ok(())
    }

    /// Marks the whole text layout containing `element` for relayout.
    fn invalidate_text_subtree(&mut self, element: NodeId) {
        let start = core::iter::once(element)
            .chain(self.doc.ancestors(element))
            .find(|&n| self.doc.caps(n).contains(ElementCaps::TEXT_ROOT))
            .unwrap_or(element);
        let subtree: Vec<NodeId> = self.doc.descendants(start).collect();
        for node in subtree {
            if let Some(state) = self.doc.render_state_mut(node) {
                state.add_invalid(InvalidFlags::ADDED);
            }
        }
    }

    /// Pushes paint-only invalidation of `element` to the renderer.
    ///
    /// Returns `false` if there is no renderer or no paint node.
    pub(crate) fn update_paint_node(&mut self, element: NodeId) -> bool {
        let Some(state) = self.doc.render_state(element) else {
            return false;
        };
        if state.paint_node.is_none() {
            return false;
        }
        let extents = state.screen_extents;
        let Some(invalid) = self.host.invalid_state() else {
            return false;
        };
        if let Err(e) = invalid.add_extra_invalidation(extents) {
            warn!(?element, %e, "dropping paint invalidation");
        }
        true
    }

    fn schedule_invalidation(&mut self) {
        match self.ctx.kind {
            DocumentKind::External { referencing } => {
                self.host.invalidate_referencing_element(referencing);
            }
            DocumentKind::Standalone => {
                // One update request per pending layout pass.
                if !self.ctx.invalidation_pending && self.host.is_visible() {
                    self.host.schedule_update();
                }
                self.ctx.invalidation_pending = true;
            }
        }
    }
}
