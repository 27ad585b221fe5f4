// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Repaints that bypass layout.

use alloc::vec::Vec;

use kurbo::{Affine, Rect};
use thicket_graph::{GraphTraverser, Visitor};
use thicket_region::{Region, RegionError};
use tracing::{debug, warn};

use crate::document::{NodeId, SvgDocument};
use crate::error::ChangeError;
use crate::handler::ChangeHandler;
use crate::host::ChangeHost;
use crate::reason::RepaintReason;

/// Collects the screen extents of every visited element.
struct RepaintTraverser<'a, D: ?Sized> {
    doc: &'a D,
    region: Region,
}

impl<D: SvgDocument + ?Sized> RepaintTraverser<'_, D> {
    fn repaint_area(doc: &D, node: NodeId) -> Rect {
        doc.render_state(node)
            .map_or(Rect::ZERO, |s| s.screen_extents)
    }
}

impl<D: SvgDocument + ?Sized> Visitor<NodeId> for RepaintTraverser<'_, D> {
    type Error = RegionError;

    fn visit(&mut self, node: NodeId) -> Result<(), RegionError> {
        let area = Self::repaint_area(self.doc, node);
        if area.area() > 0.0 {
            self.region.include(area)?;
        }
        Ok(())
    }
}

fn union_nonempty(a: Rect, b: Rect) -> Rect {
    match (a.area() > 0.0, b.area() > 0.0) {
        (true, true) => a.union(b),
        (true, false) => a,
        (false, _) => b,
    }
}

impl<D, H> ChangeHandler<'_, D, H>
where
    D: SvgDocument + ?Sized,
    H: ChangeHost + ?Sized,
{
    /// Repaints `element` and the elements above it without a layout pass.
    ///
    /// Falls back to [`RepaintReason::PaintDetailChanged`] when there is no
    /// renderer, no render state, or nothing on screen to repaint.
    ///
    /// # Errors
    ///
    /// Returns an error if the repaint region could not be built.
    pub fn repaint_element(&mut self, element: NodeId) -> Result<(), ChangeError> {
        let has_renderer = self.host.invalid_state().is_some();
        if has_renderer && self.doc.render_state(element).is_some() {
            let mut repaint_area = Rect::ZERO;
            if self.has_graph() {
                let mut trav = GraphTraverser::new(false);
                let mut visitor = RepaintTraverser {
                    doc: &*self.doc,
                    region: Region::new(),
                };
                trav.add_root_path(&*self.doc, element);
                visitor.visit(element)?;
                trav.mark(element);
                trav.traverse(&*self.doc, &mut visitor)?;

                let region = visitor.region;
                if let Some(invalid) = self.host.invalid_state() {
                    for &rect in region.rects() {
                        invalid.invalidate(rect)?;
                        repaint_area = union_nonempty(repaint_area, rect);
                    }
                }
            } else {
                repaint_area = RepaintTraverser::repaint_area(&*self.doc, element);
                if repaint_area.area() > 0.0 {
                    if let Some(invalid) = self.host.invalid_state() {
                        invalid.invalidate(repaint_area)?;
                    }
                }
            }

            if repaint_area.area() > 0.0 {
                debug!(?element, ?repaint_area, "repainting without layout");
                self.host.queue_invalidate(repaint_area);
                return Ok(());
            }
        }

        let parent = self.doc.parent(element);
        self.mark_for_repaint(element, parent, RepaintReason::PaintDetailChanged)
    }

    /// Applies a new transform straight to the paint node of `element`.
    ///
    /// Returns `false`, leaving everything untouched, when the element has
    /// no attached paint node, there is no renderer, the node feeds a filter,
    /// or the document is external.
    pub(crate) fn update_paint_node_transform(
        &mut self,
        element: NodeId,
    ) -> Result<bool, ChangeError> {
        if self.is_external() {
            debug!(?element, "transform fast path refused: external document");
            return Ok(false);
        }
        let usable = self
            .doc
            .render_state(element)
            .and_then(|s| s.paint_node.as_ref())
            .is_some_and(|n| n.attached && !n.affects_filter);
        if !usable || self.host.invalid_state().is_none() {
            debug!(?element, "transform fast path refused");
            return Ok(false);
        }

        let transform = self
            .doc
            .local_transform(element)
            .unwrap_or(Affine::IDENTITY);
        let Some(state) = self.doc.render_state_mut(element) else {
            return Ok(false);
        };
        let Some(paint_node) = state.paint_node.as_mut() else {
            return Ok(false);
        };
        paint_node.transform = transform;
        let ctm = paint_node.parent_ctm * transform;
        let new_extents = paint_node.screen_extents();
        let own_extents = union_nonempty(state.screen_extents, new_extents);
        state.screen_extents = new_extents;
        let update_extents = union_nonempty(own_extents, self.refresh_extents_below(element, ctm));

        if update_extents.area() > 0.0 {
            if let Some(invalid) = self.host.invalid_state() {
                if let Err(e) = invalid.invalidate(update_extents) {
                    warn!(?element, %e, "dropping transform invalidation");
                }
            }
            if !self.ctx.invalidation_pending {
                self.host.queue_invalidate(update_extents);
            }
        }

        self.invalidate_parent_bbox(element);
        self.ctx.counters.transform_fast_paths += 1;
        debug!(?element, ?update_extents, "transform fast path");
        Ok(true)
    }

    /// Pushes `ctm`, the new screen transform of `element`, into the cached
    /// transforms and extents of the paint nodes below it.
    ///
    /// Returns the union of the old and new extents of every attached node
    /// that moved.
    fn refresh_extents_below(&mut self, element: NodeId, ctm: Affine) -> Rect {
        let mut damage = Rect::ZERO;
        let mut stack: Vec<(NodeId, Affine)> =
            self.doc.children(element).map(|c| (c, ctm)).collect();
        while let Some((node, parent_ctm)) = stack.pop() {
            let mut child_ctm = parent_ctm;
            if let Some(state) = self.doc.render_state_mut(node) {
                if let Some(paint_node) = state.paint_node.as_mut() {
                    paint_node.parent_ctm = parent_ctm;
                    child_ctm = parent_ctm * paint_node.transform;
                    let new_extents = paint_node.screen_extents();
                    if paint_node.attached {
                        damage = union_nonempty(
                            damage,
                            union_nonempty(state.screen_extents, new_extents),
                        );
                    }
                    state.screen_extents = new_extents;
                }
            }
            stack.extend(self.doc.children(node).map(|c| (c, child_ctm)));
        }
        damage
    }

    /// Clears cached bounding boxes above `element`, up to the first
    /// ancestor without render state.
    fn invalidate_parent_bbox(&mut self, element: NodeId) {
        let mut cursor = self.doc.parent(element);
        while let Some(parent) = cursor {
            let Some(state) = self.doc.render_state_mut(parent) else {
                break;
            };
            state.bbox_valid = false;
            cursor = self.doc.parent(parent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_skips_empty_sides() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 20.0, 30.0, 30.0);
        assert_eq!(union_nonempty(Rect::ZERO, a), a);
        assert_eq!(union_nonempty(a, Rect::ZERO), a);
        assert_eq!(union_nonempty(a, b), Rect::new(0.0, 0.0, 30.0, 30.0));
        assert_eq!(union_nonempty(Rect::ZERO, Rect::ZERO), Rect::ZERO);
    }
}
