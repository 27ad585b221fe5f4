// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Invalidation after the set of SVG fonts changed.

use alloc::vec::Vec;

use tracing::debug;

use crate::attr::{AttrName, Namespace};
use crate::document::{ElementCaps, NodeId, SvgDocument};
use crate::error::ChangeError;
use crate::handler::ChangeHandler;
use crate::host::ChangeHost;
use crate::state::InvalidFlags;

impl<D, H> ChangeHandler<'_, D, H>
where
    D: SvgDocument + ?Sized,
    H: ChangeHost + ?Sized,
{
    /// A font was added, removed or changed.
    ///
    /// Which font any text resolves to may have changed, so the whole
    /// document is walked once: font-relative inline styles are reparsed,
    /// style sheets reloaded, and every text root outside a font element is
    /// handled as if its `font-family` changed. Calls made while a cascade
    /// is already running return immediately.
    ///
    /// # Errors
    ///
    /// Returns the first error of a style-sheet reload or of the text-root
    /// invalidation.
    pub fn handle_fonts_changed(&mut self) -> Result<(), ChangeError> {
        if self.ctx.in_font_rebuild {
            return Ok(());
        }
        self.ctx.in_font_rebuild = true;
        let result = self.rebuild_fonts();
        self.ctx.in_font_rebuild = false;
        result
    }

    fn rebuild_fonts(&mut self) -> Result<(), ChangeError> {
        self.ctx.counters.font_rebuilds += 1;
        let root = self.doc.root();
        debug!(?root, "fonts changed");

        let nodes: Vec<NodeId> = self.doc.descendants(root).collect();
        for node in nodes {
            if self.doc.reparse_font_relative_style(node) {
                self.doc.mark_props_dirty(node);
            }
            let caps = self.doc.caps(node);
            if caps.contains(ElementCaps::STYLE) {
                self.doc.reload_style_sheet(node)?;
                if let Some(state) = self.doc.render_state_mut(root) {
                    state.add_invalid(InvalidFlags::ADDED);
                }
            }
            if caps.contains(ElementCaps::TEXT_ROOT) && !self.has_font_ancestor(node) {
                self.handle_attribute_change(node, AttrName::FontFamily, Namespace::Svg, false)?;
            }
        }

        if let Some(state) = self.doc.render_state_mut(root) {
            state.add_invalid(InvalidFlags::FONT_METRICS);
        }
        Ok(())
    }

    fn has_font_ancestor(&self, node: NodeId) -> bool {
        self.doc
            .ancestors(node)
            .any(|a| self.doc.caps(a).contains(ElementCaps::FONT))
    }
}
