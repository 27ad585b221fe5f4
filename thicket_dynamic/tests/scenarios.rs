// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end change handling on small documents.

use kurbo::{Affine, Rect};
use thicket_dynamic::{
    AttrName, ChangeHandler, ChangeHost, DocumentContext, ElementKind, InvalidFlags, Namespace,
    NodeId, RenderState, SvgDocument, Tree,
};
use thicket_graph::DependencyGraph;
use thicket_region::InvalidState;

#[derive(Default)]
struct Host {
    invalid: Option<InvalidState>,
    parent_graph: Option<DependencyGraph<NodeId>>,
    updates: u32,
    queued: Vec<Rect>,
    referencing: Vec<NodeId>,
    font_rebuilds: u32,
}

impl Host {
    fn with_renderer() -> Self {
        Self {
            invalid: Some(InvalidState::new(Rect::new(0.0, 0.0, 200.0, 200.0))),
            ..Self::default()
        }
    }
}

impl ChangeHost for Host {
    fn invalid_state(&mut self) -> Option<&mut InvalidState> {
        self.invalid.as_mut()
    }

    fn is_visible(&self) -> bool {
        true
    }

    fn schedule_update(&mut self) {
        self.updates += 1;
    }

    fn queue_invalidate(&mut self, area: Rect) {
        self.queued.push(area);
    }

    fn invalidate_referencing_element(&mut self, referencing: NodeId) {
        self.referencing.push(referencing);
    }

    fn rebuild_font_info(&mut self, _font: NodeId) {
        self.font_rebuilds += 1;
    }

    fn parent_graph(&mut self) -> Option<&mut DependencyGraph<NodeId>> {
        self.parent_graph.as_mut()
    }
}

fn child(tree: &mut Tree, parent: NodeId, kind: ElementKind) -> NodeId {
    let node = tree.create(kind);
    tree.append(parent, node);
    node
}

fn invalid(tree: &Tree, node: NodeId) -> InvalidFlags {
    tree.render_state(node)
        .map_or(InvalidFlags::empty(), |s| s.invalid)
}

#[test]
fn ancestors_with_state_learn_about_changes_below() {
    let mut tree = Tree::new();
    let root = tree.root();
    let a = child(&mut tree, root, ElementKind::G);
    let b = child(&mut tree, a, ElementKind::G);
    let c = child(&mut tree, b, ElementKind::Rect);
    tree.set_render_state(a, Some(RenderState::default()));

    let mut ctx = DocumentContext::new();
    let mut host = Host::with_renderer();
    let mut handler = ChangeHandler::new(&mut tree, &mut ctx, &mut host);
    handler
        .handle_attribute_change(c, AttrName::Fill, Namespace::Svg, false)
        .unwrap();
    handler.repaint_element(b).unwrap();
    handler.repaint_element(root).unwrap();

    assert!(invalid(&tree, a).contains(InvalidFlags::SUBTREE));
    assert!(tree.render_state(b).is_none(), "repaint must not create state");
    assert!(invalid(&tree, c).contains(InvalidFlags::ADDED));
    assert_eq!(ctx.counters().ancestor_walks, 3);
}

#[test]
fn repaint_without_graph_queues_own_extents() {
    let mut tree = Tree::new();
    let root = tree.root();
    let rect = child(&mut tree, root, ElementKind::Rect);
    let mut state = RenderState::with_paint_node(Rect::new(10.0, 10.0, 30.0, 20.0));
    state.screen_extents = Rect::new(10.0, 10.0, 30.0, 20.0);
    tree.set_render_state(rect, Some(state));

    let mut ctx = DocumentContext::new();
    let mut host = Host::with_renderer();
    ChangeHandler::new(&mut tree, &mut ctx, &mut host)
        .repaint_element(rect)
        .unwrap();

    assert_eq!(host.queued, [Rect::new(10.0, 10.0, 30.0, 20.0)]);
    assert_eq!(host.updates, 0, "no layout pass needed");
    let region = host.invalid.as_ref().unwrap().region();
    assert_eq!(region.area(), 200.0);
}

#[test]
fn dependent_sweep_is_transitive_and_survives_cycles() {
    let mut tree = Tree::new();
    let root = tree.root();
    let t = child(&mut tree, root, ElementKind::LinearGradient);
    let x = child(&mut tree, root, ElementKind::Pattern);
    let y = child(&mut tree, root, ElementKind::Rect);

    let mut ctx = DocumentContext::new();
    let mut host = Host::default();
    let mut handler = ChangeHandler::new(&mut tree, &mut ctx, &mut host);
    handler.add_dependency(x, t);
    handler.add_dependency(y, x);
    handler.add_dependency(t, y);
    handler
        .handle_attribute_change(t, AttrName::Other, Namespace::Svg, false)
        .unwrap();

    assert!(invalid(&tree, x).contains(InvalidFlags::ADDED));
    assert!(invalid(&tree, y).contains(InvalidFlags::ADDED));
    let counters = ctx.counters();
    assert_eq!(counters.dependency_sweeps, 1);
    assert_eq!(counters.dependents_marked, 3, "x, y and t once each");

    let graph = ctx.graph().unwrap();
    assert!(!graph.has_dependents(t), "changed target forgets its dependents");
    assert!(graph.has_dependents(x));
}

#[test]
fn new_id_retries_unresolved_references() {
    let mut tree = Tree::new();
    let root = tree.root();
    let user = child(&mut tree, root, ElementKind::Rect);
    tree.set_render_state(user, Some(RenderState::default()));

    let mut ctx = DocumentContext::new();
    let mut host = Host::default();
    ChangeHandler::new(&mut tree, &mut ctx, &mut host).add_unresolved_dependency(user);
    assert!(ctx.graph().unwrap().has_unresolved());

    let target = tree.create(ElementKind::LinearGradient);
    tree.set_id(target, Some("foo"));
    tree.append(root, target);
    ChangeHandler::new(&mut tree, &mut ctx, &mut host)
        .handle_document_changed(root, target, true)
        .unwrap();

    assert!(invalid(&tree, user).contains(InvalidFlags::ADDED));
    assert!(!ctx.graph().unwrap().has_unresolved());
    assert_eq!(tree.style_loads(target), 1);
}

#[test]
fn transform_change_takes_the_fast_path() {
    let mut tree = Tree::new();
    let root = tree.root();
    let rect = child(&mut tree, root, ElementKind::Rect);
    tree.set_render_state(root, Some(RenderState::with_paint_node(Rect::ZERO)));
    tree.set_render_state(
        rect,
        Some(RenderState::with_paint_node(Rect::new(0.0, 0.0, 10.0, 10.0))),
    );
    tree.set_transform(rect, Some(Affine::translate((50.0, 50.0))));

    let mut ctx = DocumentContext::new();
    let mut host = Host::with_renderer();
    ChangeHandler::new(&mut tree, &mut ctx, &mut host)
        .handle_attribute_change(rect, AttrName::Transform, Namespace::Svg, false)
        .unwrap();

    let counters = ctx.counters();
    assert_eq!(counters.transform_fast_paths, 1);
    assert_eq!(counters.ancestor_walks, 0);
    assert_eq!(counters.dependency_sweeps, 0);

    let state = tree.render_state(rect).unwrap();
    assert_eq!(state.screen_extents, Rect::new(50.0, 50.0, 60.0, 60.0));
    assert!(state.invalid.is_empty());
    let root_state = tree.render_state(root).unwrap();
    assert!(root_state.invalid.is_empty());
    assert!(!root_state.bbox_valid);
    assert_eq!(host.queued, [Rect::new(0.0, 0.0, 60.0, 60.0)]);
    assert_eq!(host.updates, 0);
}

#[test]
fn transform_fast_path_moves_the_paint_nodes_below() {
    let mut tree = Tree::new();
    let root = tree.root();
    let group = child(&mut tree, root, ElementKind::G);
    let rect = child(&mut tree, group, ElementKind::Rect);
    tree.set_render_state(
        group,
        Some(RenderState::with_paint_node(Rect::new(0.0, 0.0, 20.0, 20.0))),
    );
    tree.set_render_state(
        rect,
        Some(RenderState::with_paint_node(Rect::new(0.0, 0.0, 10.0, 10.0))),
    );
    tree.set_transform(group, Some(Affine::translate((50.0, 0.0))));

    let mut ctx = DocumentContext::new();
    let mut host = Host::with_renderer();
    ChangeHandler::new(&mut tree, &mut ctx, &mut host)
        .handle_attribute_change(group, AttrName::Transform, Namespace::Svg, false)
        .unwrap();
    assert_eq!(ctx.counters().transform_fast_paths, 1);

    let state = tree.render_state(rect).unwrap();
    let paint_node = state.paint_node.as_ref().unwrap();
    assert_eq!(paint_node.parent_ctm, Affine::translate((50.0, 0.0)));
    assert_eq!(state.screen_extents, Rect::new(50.0, 0.0, 60.0, 10.0));
    assert_eq!(host.queued, [Rect::new(0.0, 0.0, 70.0, 20.0)]);
}

#[test]
fn transform_change_with_dependents_goes_through_layout() {
    let mut tree = Tree::new();
    let root = tree.root();
    let shape = child(&mut tree, root, ElementKind::Path);
    let marker_user = child(&mut tree, root, ElementKind::Path);
    tree.set_render_state(
        shape,
        Some(RenderState::with_paint_node(Rect::new(0.0, 0.0, 10.0, 10.0))),
    );

    let mut ctx = DocumentContext::new();
    let mut host = Host::with_renderer();
    let mut handler = ChangeHandler::new(&mut tree, &mut ctx, &mut host);
    handler.add_dependency(marker_user, shape);
    handler
        .handle_attribute_change(shape, AttrName::Transform, Namespace::Svg, false)
        .unwrap();

    assert_eq!(ctx.counters().transform_fast_paths, 0);
    assert_eq!(ctx.counters().dependency_sweeps, 1);
    assert!(invalid(&tree, shape).contains(InvalidFlags::ADDED));
    assert!(invalid(&tree, marker_user).contains(InvalidFlags::ADDED));
    assert_eq!(host.updates, 1);
}

#[test]
fn removal_marks_parent_and_drops_graph_entries() {
    let mut tree = Tree::new();
    let root = tree.root();
    tree.set_render_state(root, Some(RenderState::default()));
    let gradient = child(&mut tree, root, ElementKind::LinearGradient);
    let user = child(&mut tree, root, ElementKind::Rect);
    tree.set_render_state(
        gradient,
        Some(RenderState::with_paint_node(Rect::new(0.0, 0.0, 10.0, 10.0))),
    );

    let mut ctx = DocumentContext::new();
    let mut host = Host::with_renderer();
    ChangeHandler::new(&mut tree, &mut ctx, &mut host).add_dependency(user, gradient);

    tree.detach(gradient);
    ChangeHandler::new(&mut tree, &mut ctx, &mut host)
        .handle_document_changed(root, gradient, false)
        .unwrap();

    assert!(invalid(&tree, root).contains(InvalidFlags::STRUCTURE));
    assert!(invalid(&tree, user).contains(InvalidFlags::ADDED));
    assert!(!tree.render_state(gradient).unwrap().has_attached_paint_node());
    let graph = ctx.graph().unwrap();
    assert!(!graph.has_dependents(gradient));
    assert!(graph.is_consistent());
    let extra = host.invalid.as_ref().unwrap().extra_invalidation();
    assert_eq!(extra, Rect::new(0.0, 0.0, 10.0, 10.0));
}

#[test]
fn external_documents_redirect_to_the_referencing_element() {
    let mut outer = Tree::new();
    let image = outer.create(ElementKind::Image);
    outer.append(outer.root(), image);

    let mut tree = Tree::with_index_base(1 << 16);
    let root = tree.root();
    let rect = child(&mut tree, root, ElementKind::Rect);
    tree.set_render_state(
        rect,
        Some(RenderState::with_paint_node(Rect::new(0.0, 0.0, 10.0, 10.0))),
    );

    let mut ctx = DocumentContext::external(image);
    let mut host = Host {
        parent_graph: Some(DependencyGraph::new()),
        ..Host::with_renderer()
    };
    ChangeHandler::new(&mut tree, &mut ctx, &mut host).add_dependency(root, rect);

    assert!(ctx.graph().is_none());
    let parent_graph = host.parent_graph.as_ref().unwrap();
    assert_eq!(parent_graph.dependents_vec(rect), [root]);

    ChangeHandler::new(&mut tree, &mut ctx, &mut host)
        .handle_attribute_change(rect, AttrName::Transform, Namespace::Svg, false)
        .unwrap();

    assert_eq!(ctx.counters().transform_fast_paths, 0);
    assert!(!ctx.invalidation_pending());
    assert_eq!(host.updates, 0);
    assert!(!host.referencing.is_empty());
    assert!(host.referencing.iter().all(|&n| n == image));
}

#[test]
fn external_documents_sweep_dependents_through_the_parent_graph() {
    let mut tree = Tree::with_index_base(1 << 16);
    let root = tree.root();
    let defs = child(&mut tree, root, ElementKind::Defs);
    let gradient = child(&mut tree, defs, ElementKind::LinearGradient);
    let user = child(&mut tree, root, ElementKind::Rect);

    let mut ctx = DocumentContext::external(Tree::new().root());
    let mut host = Host {
        parent_graph: Some(DependencyGraph::new()),
        ..Host::default()
    };
    ChangeHandler::new(&mut tree, &mut ctx, &mut host)
        .handle_attribute_change(gradient, AttrName::Other, Namespace::Svg, false)
        .unwrap();
    assert!(invalid(&tree, user).is_empty(), "no reference registered yet");

    let mut handler = ChangeHandler::new(&mut tree, &mut ctx, &mut host);
    handler.add_dependency(user, gradient);
    handler
        .handle_attribute_change(gradient, AttrName::Other, Namespace::Svg, false)
        .unwrap();

    assert!(invalid(&tree, user).contains(InvalidFlags::ADDED));
    assert_eq!(ctx.counters().dependents_marked, 1);
    let parent_graph = host.parent_graph.as_ref().unwrap();
    assert!(!parent_graph.has_dependents(gradient));
    assert!(parent_graph.is_consistent());
}

#[test]
fn external_documents_without_a_parent_graph_track_nothing() {
    let mut tree = Tree::new();
    let root = tree.root();
    let gradient = child(&mut tree, root, ElementKind::LinearGradient);
    let user = child(&mut tree, root, ElementKind::Rect);

    let mut ctx = DocumentContext::external(Tree::new().root());
    let mut host = Host::default();
    let mut handler = ChangeHandler::new(&mut tree, &mut ctx, &mut host);
    handler.add_dependency(user, gradient);
    handler
        .handle_attribute_change(gradient, AttrName::Other, Namespace::Svg, false)
        .unwrap();

    assert!(ctx.graph().is_none());
    assert!(invalid(&tree, user).is_empty());
    assert_eq!(ctx.counters().dependency_sweeps, 0);
}

#[test]
fn discarded_elements_are_queued() {
    let mut tree = Tree::new();
    let root = tree.root();
    let rect = child(&mut tree, root, ElementKind::Rect);
    tree.set_render_state(rect, Some(RenderState::default()));

    let mut ctx = DocumentContext::new();
    let mut host = Host::default();
    ChangeHandler::new(&mut tree, &mut ctx, &mut host).handle_element_discard(rect);

    assert!(tree.render_state(rect).unwrap().discarded);
    assert_eq!(ctx.take_pending_discards(), [rect]);
    assert!(ctx.take_pending_discards().is_empty());
}

#[test]
fn font_changes_relayout_text_outside_fonts() {
    let mut tree = Tree::new();
    let root = tree.root();
    tree.set_render_state(root, Some(RenderState::default()));
    let font = child(&mut tree, root, ElementKind::Font);
    let glyph = child(&mut tree, font, ElementKind::Other);
    let text = child(&mut tree, root, ElementKind::Text);
    tree.set_render_state(font, Some(RenderState::default()));
    tree.set_render_state(text, Some(RenderState::default()));

    let mut ctx = DocumentContext::new();
    let mut host = Host::default();
    ChangeHandler::new(&mut tree, &mut ctx, &mut host)
        .handle_attribute_change(glyph, AttrName::Other, Namespace::Svg, false)
        .unwrap();

    assert!(tree.render_state(font).unwrap().font_data_dirty);
    assert_eq!(host.font_rebuilds, 1);
    assert_eq!(ctx.counters().font_rebuilds, 1);
    let text_flags = invalid(&tree, text);
    assert!(text_flags.contains(InvalidFlags::ADDED | InvalidFlags::FONT_METRICS));
    assert!(invalid(&tree, root).contains(InvalidFlags::FONT_METRICS));
}

#[test]
fn font_tracking_can_be_disabled() {
    let mut tree = Tree::new();
    let root = tree.root();
    let font = child(&mut tree, root, ElementKind::Font);
    let glyph = child(&mut tree, font, ElementKind::Other);

    let config = thicket_dynamic::ChangeConfig::default().with_track_fonts(false);
    let mut ctx = DocumentContext::new().with_config(config);
    let mut host = Host::default();
    ChangeHandler::new(&mut tree, &mut ctx, &mut host)
        .handle_attribute_change(glyph, AttrName::Other, Namespace::Svg, false)
        .unwrap();

    assert_eq!(host.font_rebuilds, 0);
    assert_eq!(ctx.counters().font_rebuilds, 0);
}

#[test]
fn changing_a_use_source_tears_down_its_shadow_tree() {
    let mut tree = Tree::new();
    let root = tree.root();
    let source = child(&mut tree, root, ElementKind::G);
    let use_element = child(&mut tree, root, ElementKind::Use);
    let shadow = tree.create_shadow(ElementKind::G, source);
    tree.append(use_element, shadow);
    tree.set_shadow_tree_built(use_element, true);

    let mut ctx = DocumentContext::new();
    let mut host = Host::default();
    ChangeHandler::new(&mut tree, &mut ctx, &mut host).add_dependency(use_element, source);

    let added = child(&mut tree, source, ElementKind::Circle);
    ChangeHandler::new(&mut tree, &mut ctx, &mut host)
        .handle_document_changed(source, added, true)
        .unwrap();

    assert!(!tree.is_alive(shadow));
    assert!(!tree.is_shadow_tree_built(use_element));
    assert!(invalid(&tree, use_element).contains(InvalidFlags::ADDED));
}

#[test]
fn current_view_change_repaints_everything() {
    let mut tree = Tree::new();
    let root = tree.root();
    let view = child(&mut tree, root, ElementKind::View);
    tree.set_id(view, Some("zoomed"));

    let mut ctx = DocumentContext::new();
    ctx.set_view_fragment(Some("zoomed"));
    let mut host = Host::default();
    ChangeHandler::new(&mut tree, &mut ctx, &mut host)
        .handle_attribute_change(view, AttrName::ViewBox, Namespace::Svg, false)
        .unwrap();

    assert!(invalid(&tree, root).contains(InvalidFlags::ADDED));
    assert!(tree.render_state(view).is_none());
    assert_eq!(host.updates, 1);
}

#[test]
fn text_outside_text_roots_is_ignored() {
    let mut tree = Tree::new();
    let root = tree.root();
    let g = child(&mut tree, root, ElementKind::G);
    let loose = child(&mut tree, g, ElementKind::Other);
    let text = child(&mut tree, root, ElementKind::Text);
    let run = child(&mut tree, text, ElementKind::Other);

    let mut ctx = DocumentContext::new();
    let mut host = Host::default();
    let mut handler = ChangeHandler::new(&mut tree, &mut ctx, &mut host);
    handler.handle_character_data_changed(loose).unwrap();
    assert!(tree.render_state(loose).is_none());

    let mut handler = ChangeHandler::new(&mut tree, &mut ctx, &mut host);
    handler.handle_character_data_changed(run).unwrap();
    assert!(invalid(&tree, text).contains(InvalidFlags::ADDED));
    assert!(invalid(&tree, run).contains(InvalidFlags::ADDED));
}
