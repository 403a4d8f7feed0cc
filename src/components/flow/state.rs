use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info, warn};

use super::config::FlowConfig;
use super::error::FlowResult;
use super::hit;
use super::interaction::{InteractionController, Modifiers, PointerButton, PointerEvent, PointerTarget};
use super::layout;
use super::model::GraphModel;
use super::render::{Frame, RenderAdapter};
use super::types::{FlowData, Point, Size};
use super::viewport::ViewportController;

/// Everything one canvas owns. The component forwards DOM input here and
/// renders from [`FlowState::frame`].
pub struct FlowState {
	pub model: GraphModel,
	pub viewport: ViewportController,
	pub interaction: InteractionController,
	pub config: FlowConfig,
	pub width: f64,
	pub height: f64,
	pub flow_time: f64,
	dirty: Rc<Cell<bool>>,
}

impl FlowState {
	pub fn new(data: &FlowData, config: FlowConfig, width: f64, height: f64) -> FlowResult<Self> {
		let mut model = GraphModel::new();
		let mut key_to_id = HashMap::new();

		for node in &data.nodes {
			let id = model.add_node(node.position, node.payload.clone());
			if key_to_id.insert(node.key.clone(), id).is_some() {
				warn!("duplicate node key {:?}; edges will use the later node", node.key);
			}
		}
		for edge in &data.edges {
			let (Some(&src), Some(&tgt)) = (key_to_id.get(&edge.source), key_to_id.get(&edge.target))
			else {
				warn!("dropping edge {} -> {}: unknown key", edge.source, edge.target);
				continue;
			};
			if let Err(e) = model.add_edge(src, tgt, edge.payload.clone()) {
				warn!("dropping edge {} -> {}: {e}", edge.source, edge.target);
			}
		}

		let viewport = ViewportController::new(&config.viewport)?;
		let mut interaction = InteractionController::new(&config);
		interaction.attach(&mut model);

		let dirty = Rc::new(Cell::new(true));
		let flag = dirty.clone();
		model.subscribe(move |_| flag.set(true));

		info!(
			"canvas loaded with {} nodes and {} edges",
			model.node_count(),
			model.edge_count()
		);

		Ok(Self {
			model,
			viewport,
			interaction,
			config,
			width,
			height,
			flow_time: 0.0,
			dirty,
		})
	}

	pub fn target_at(&self, screen: Point) -> PointerTarget {
		hit::target_at(&self.model, &self.viewport.viewport(), screen)
	}

	fn event(&self, screen: Point, button: PointerButton, modifiers: Modifiers) -> PointerEvent {
		PointerEvent::new(screen, self.target_at(screen))
			.with_button(button)
			.with_modifiers(modifiers)
	}

	pub fn pointer_down(&mut self, screen: Point, button: PointerButton, modifiers: Modifiers) {
		let ev = self.event(screen, button, modifiers);
		self.interaction.pointer_down(ev, &self.model, &self.viewport);
		self.mark_dirty();
	}

	pub fn pointer_move(&mut self, screen: Point, modifiers: Modifiers) {
		let ev = self.event(screen, PointerButton::Primary, modifiers);
		self.interaction.pointer_move(ev, &mut self.model, &mut self.viewport);
		self.mark_dirty();
	}

	pub fn pointer_up(&mut self, screen: Point, modifiers: Modifiers) {
		let ev = self.event(screen, PointerButton::Primary, modifiers);
		self.interaction.pointer_up(ev, &mut self.model);
		self.mark_dirty();
	}

	pub fn pointer_leave(&mut self) {
		self.interaction.pointer_leave();
		self.mark_dirty();
	}

	pub fn wheel(&mut self, screen: Point, delta_y: f64) {
		self.interaction.wheel(screen, delta_y, &mut self.viewport);
		self.mark_dirty();
	}

	pub fn key(&mut self, key: &str) -> bool {
		let handled = self.interaction.key(key, &mut self.model, &mut self.viewport);
		self.mark_dirty();
		handled
	}

	fn center(&self) -> Point {
		Point::new(self.width / 2.0, self.height / 2.0)
	}

	pub fn zoom_in(&mut self) {
		self.zoom_by(self.config.viewport.zoom_step);
	}

	pub fn zoom_out(&mut self) {
		self.zoom_by(1.0 / self.config.viewport.zoom_step);
	}

	fn zoom_by(&mut self, factor: f64) {
		if let Err(e) = self.viewport.zoom(factor, self.center()) {
			debug!("zoom ignored: {e}");
		}
		self.mark_dirty();
	}

	/// Frames every node. An empty graph resets the view instead.
	pub fn fit_view(&mut self) {
		let screen = Size::new(self.width, self.height);
		match hit::graph_bounds(self.model.nodes()) {
			Some(bounds) => {
				if let Err(e) = self.viewport.fit_view(bounds, screen, self.config.viewport.fit_padding) {
					debug!("fit view ignored: {e}");
				}
			}
			None => self.viewport.reset(),
		}
		self.mark_dirty();
	}

	pub fn toggle_interactive(&mut self) -> bool {
		let next = !self.interaction.is_interactive();
		self.interaction.set_interactive(next, &mut self.model, &mut self.viewport);
		info!("canvas {}", if next { "unlocked" } else { "locked" });
		self.mark_dirty();
		next
	}

	/// Repositions nodes with a force-directed relaxation. Skipped while
	/// locked or mid-interaction.
	pub fn auto_layout(&mut self) {
		if !self.interaction.is_interactive() || !self.interaction.mode().is_idle() {
			return;
		}
		let positions = layout::relax(&self.model.snapshot(), self.config.layout_steps);
		for (id, p) in positions {
			if let Err(e) = self.model.move_node(id, p) {
				warn!("layout skipped {id}: {e}");
			}
		}
	}

	/// Asks the adapter to size every node that has no measured size yet.
	pub fn measure_nodes(&mut self, adapter: &impl RenderAdapter) {
		let unmeasured: Vec<_> = self
			.model
			.snapshot()
			.nodes
			.into_iter()
			.filter(|n| n.size.is_none())
			.collect();
		for node in unmeasured {
			let size = adapter.measure(&node);
			if let Err(e) = self.model.set_node_size(node.id, size) {
				warn!("could not size {}: {e}", node.id);
			}
		}
	}

	pub fn frame(&mut self) -> Frame {
		self.interaction.sync();
		Frame {
			snapshot: self.model.snapshot(),
			viewport: self.viewport.viewport(),
			mode: *self.interaction.mode(),
			selection: self.interaction.selection().clone(),
			hovered: self.interaction.hovered(),
			interactive: self.interaction.is_interactive(),
			width: self.width,
			height: self.height,
			flow_time: self.flow_time,
		}
	}

	pub fn tick(&mut self, dt: f64) {
		self.flow_time += dt;
	}

	/// Whether anything changed since the last call.
	pub fn take_dirty(&self) -> bool {
		self.dirty.replace(false)
	}

	fn mark_dirty(&self) {
		self.dirty.set(true);
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.mark_dirty();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::flow::interaction::InteractionMode;
	use crate::components::flow::model::{ChangeKind, GraphChange};
	use crate::components::flow::types::{EdgePayload, FlowEdge, FlowNode, NodePayload};
	use crate::components::flow::viewport::Viewport;
	use std::cell::RefCell;

	fn data() -> FlowData {
		let node = |key: &str, x, y, payload| FlowNode {
			key: key.into(),
			position: Point::new(x, y),
			payload,
		};
		let edge = |s: &str, t: &str| FlowEdge {
			source: s.into(),
			target: t.into(),
			payload: EdgePayload::default(),
		};
		FlowData {
			nodes: vec![
				node("in", 0.0, 0.0, NodePayload::input("in")),
				node("mid", 0.0, 120.0, NodePayload::default_node("mid")),
				node("out", 0.0, 240.0, NodePayload::output("out")),
			],
			edges: vec![edge("in", "mid"), edge("mid", "out"), edge("mid", "nope"), edge("in", "mid")],
		}
	}

	fn state() -> FlowState {
		FlowState::new(&data(), FlowConfig::default(), 800.0, 600.0).unwrap()
	}

	#[test]
	fn load_skips_bad_edges() {
		let s = state();
		assert_eq!(s.model.node_count(), 3);
		assert_eq!(s.model.edge_count(), 2);
	}

	#[test]
	fn pointer_input_is_routed_through_hit_testing() {
		let mut s = state();
		s.pointer_down(Point::new(10.0, 130.0), PointerButton::Primary, Modifiers::default());
		assert!(matches!(s.interaction.mode(), InteractionMode::Dragging { .. }));
		s.pointer_move(Point::new(110.0, 130.0), Modifiers::default());
		s.pointer_up(Point::new(110.0, 130.0), Modifiers::default());

		let snap = s.model.snapshot();
		assert_eq!(snap.nodes[1].position, Point::new(100.0, 120.0));
	}

	#[test]
	fn dragging_a_connection_between_handles_adds_edge() {
		let mut s = state();
		// in.source (75, 40) -> out.target (75, 240)
		s.pointer_down(Point::new(75.0, 40.0), PointerButton::Primary, Modifiers::default());
		s.pointer_move(Point::new(75.0, 180.0), Modifiers::default());
		s.pointer_up(Point::new(75.0, 240.0), Modifiers::default());
		assert_eq!(s.model.edge_count(), 3);
	}

	#[test]
	fn controls_zoom_around_center() {
		let mut s = state();
		let c = Point::new(400.0, 300.0);
		let under = s.viewport.to_canvas(c);
		s.zoom_in();
		assert!(s.viewport.scale() > 1.0);
		assert!(s.viewport.to_screen(under).distance(c) < 1e-9);
		s.zoom_out();
		assert!((s.viewport.scale() - 1.0).abs() < 1e-9);
	}

	#[test]
	fn fit_view_frames_all_nodes() {
		let mut s = state();
		s.fit_view();
		let snap = s.model.snapshot();
		for node in &snap.nodes {
			let p = s.viewport.to_screen(node.position);
			assert!(p.x >= 0.0 && p.x <= 800.0 && p.y >= 0.0 && p.y <= 600.0);
		}
	}

	#[test]
	fn locking_blocks_edits() {
		let mut s = state();
		assert!(!s.toggle_interactive());
		s.pointer_down(Point::new(10.0, 130.0), PointerButton::Primary, Modifiers::default());
		assert!(s.interaction.mode().is_idle());
		let before = s.model.snapshot();
		s.auto_layout();
		assert_eq!(s.model.snapshot(), before);
	}

	#[test]
	fn fit_view_on_empty_graph_resets_view() {
		let mut s = FlowState::new(&FlowData::default(), FlowConfig::default(), 800.0, 600.0).unwrap();
		s.viewport.pan(40.0, -25.0);
		s.zoom_in();
		s.fit_view();
		assert_eq!(s.viewport.viewport(), Viewport::default());
	}

	#[test]
	fn auto_layout_moves_nodes_and_reports_updates() {
		let stacked = FlowData {
			nodes: ["a", "b", "c"]
				.into_iter()
				.map(|key| FlowNode {
					key: key.into(),
					position: Point::default(),
					payload: NodePayload::default_node(key),
				})
				.collect(),
			edges: Vec::new(),
		};
		let mut s = FlowState::new(&stacked, FlowConfig::default(), 800.0, 600.0).unwrap();
		let seen: Rc<RefCell<Vec<GraphChange>>> = Rc::default();
		let sink = seen.clone();
		s.model.subscribe(move |c| sink.borrow_mut().push(c.clone()));

		s.auto_layout();

		let seen = seen.borrow();
		assert_eq!(seen.len(), 3);
		assert!(seen.iter().all(|c| c.kind == ChangeKind::Updated));
		let moved = s.model.nodes().filter(|n| n.position != Point::default()).count();
		assert!(moved >= 2);
	}

	struct FixedSize;

	impl RenderAdapter for FixedSize {
		fn measure(&self, node: &crate::components::flow::types::Node) -> Size {
			Size::new(20.0 * node.payload.label().len() as f64, 50.0)
		}

		fn render(&self, _frame: &Frame) {}
	}

	#[test]
	fn measuring_sizes_only_unmeasured_nodes() {
		let mut s = state();
		let first = s.model.snapshot().nodes[0].id;
		s.model.set_node_size(first, Size::new(1.0, 1.0)).unwrap();
		s.measure_nodes(&FixedSize);

		let snap = s.model.snapshot();
		assert_eq!(snap.nodes[0].size, Some(Size::new(1.0, 1.0)));
		assert_eq!(snap.nodes[1].size, Some(Size::new(60.0, 50.0)));
		assert_eq!(snap.nodes[2].size, Some(Size::new(60.0, 50.0)));
	}

	#[test]
	fn frame_reflects_interaction() {
		let mut s = state();
		s.pointer_down(Point::new(10.0, 130.0), PointerButton::Primary, Modifiers::default());
		let frame = s.frame();
		assert_eq!(frame.mode.active_node(), Some(frame.snapshot.nodes[1].id));
		assert!(frame.selection.nodes.contains(&frame.snapshot.nodes[1].id));
		assert_eq!((frame.width, frame.height), (800.0, 600.0));
	}

	#[test]
	fn model_changes_mark_frame_dirty() {
		let mut s = state();
		assert!(s.take_dirty());
		assert!(!s.take_dirty());
		s.model.add_node(Point::default(), NodePayload::default_node("x"));
		assert!(s.take_dirty());
	}
}
