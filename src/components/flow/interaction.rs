//! Input state machine.
//!
//! Raw pointer, wheel and key input arrives here with its screen position
//! and the element under it already identified. The controller turns it into
//! [`GraphModel`] and [`ViewportController`] mutations:
//!
//! - `Idle -> Dragging -> Idle` moves a node,
//! - `Idle -> Connecting -> Idle` draws an edge between handles,
//! - `Idle -> PanningViewport -> Idle` pans the view.
//!
//! Any failed mutation aborts the interaction and returns to `Idle`; the
//! failure is logged and otherwise swallowed.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::mem;
use std::rc::Rc;

use log::debug;

use super::config::FlowConfig;
use super::model::{ChangeKind, GraphModel, ListenerId};
use super::types::{EdgeId, EdgePayload, HandleKind, NodeId, Point};
use super::viewport::{Viewport, ViewportController};

/// The element a pointer event landed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerTarget {
	Canvas,
	Node(NodeId),
	Handle { node: NodeId, kind: HandleKind },
	Edge(EdgeId),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PointerButton {
	#[default]
	Primary,
	Middle,
	Secondary,
}

impl PointerButton {
	/// Maps `MouseEvent.button`.
	pub fn from_dom(button: i16) -> Self {
		match button {
			1 => PointerButton::Middle,
			2 => PointerButton::Secondary,
			_ => PointerButton::Primary,
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
	pub shift: bool,
	pub ctrl: bool,
	pub alt: bool,
	pub meta: bool,
}

impl Modifiers {
	pub fn any(&self) -> bool {
		self.shift || self.ctrl || self.alt || self.meta
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
	/// Screen coordinates relative to the canvas element.
	pub position: Point,
	pub target: PointerTarget,
	pub button: PointerButton,
	pub modifiers: Modifiers,
}

impl PointerEvent {
	pub fn new(position: Point, target: PointerTarget) -> Self {
		Self {
			position,
			target,
			button: PointerButton::Primary,
			modifiers: Modifiers::default(),
		}
	}

	pub fn with_button(mut self, button: PointerButton) -> Self {
		self.button = button;
		self
	}

	pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
		self.modifiers = modifiers;
		self
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum InteractionMode {
	#[default]
	Idle,
	Dragging {
		node: NodeId,
		/// Pointer offset from the node origin, in canvas units.
		grab_offset: Point,
		/// Position before the drag, restored on cancel.
		origin: Point,
	},
	Connecting {
		from: NodeId,
		handle: HandleKind,
		/// Current pointer position in canvas units.
		cursor: Point,
	},
	PanningViewport {
		last: Point,
		/// View before the pan, restored on cancel.
		origin: Viewport,
	},
}

impl InteractionMode {
	pub fn is_idle(&self) -> bool {
		matches!(self, InteractionMode::Idle)
	}

	/// The node this interaction is acting on, if any.
	pub fn active_node(&self) -> Option<NodeId> {
		match self {
			InteractionMode::Dragging { node, .. } => Some(*node),
			InteractionMode::Connecting { from, .. } => Some(*from),
			_ => None,
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
	pub nodes: BTreeSet<NodeId>,
	pub edges: BTreeSet<EdgeId>,
}

impl Selection {
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty() && self.edges.is_empty()
	}

	pub fn clear(&mut self) {
		self.nodes.clear();
		self.edges.clear();
	}
}

#[derive(Default)]
struct Removed {
	nodes: Vec<NodeId>,
	edges: Vec<EdgeId>,
}

pub struct InteractionController {
	mode: InteractionMode,
	selection: Selection,
	hovered: Option<PointerTarget>,
	interactive: bool,
	pan_requires_modifier: bool,
	snap_grid: Option<f64>,
	zoom_step: f64,
	delete_keys: Vec<String>,
	cancel_keys: Vec<String>,
	removed: Rc<RefCell<Removed>>,
	listener: Option<ListenerId>,
}

impl InteractionController {
	pub fn new(config: &FlowConfig) -> Self {
		Self {
			mode: InteractionMode::Idle,
			selection: Selection::default(),
			hovered: None,
			interactive: true,
			pan_requires_modifier: config.pan_requires_modifier,
			snap_grid: config.snap_grid.filter(|g| *g > 0.0),
			zoom_step: config.viewport.zoom_step,
			delete_keys: config.delete_keys.clone(),
			cancel_keys: config.cancel_keys.clone(),
			removed: Rc::default(),
			listener: None,
		}
	}

	/// Subscribes to `model` so removed ids drop out of the selection and an
	/// interaction whose node disappears is aborted.
	pub fn attach(&mut self, model: &mut GraphModel) {
		if let Some(old) = self.listener.take() {
			model.unsubscribe(old);
		}
		let removed = self.removed.clone();
		self.listener = Some(model.subscribe(move |change| {
			if change.kind == ChangeKind::Removed {
				let mut r = removed.borrow_mut();
				r.nodes.extend_from_slice(&change.nodes);
				r.edges.extend_from_slice(&change.edges);
			}
		}));
	}

	pub fn mode(&self) -> &InteractionMode {
		&self.mode
	}

	pub fn selection(&self) -> &Selection {
		&self.selection
	}

	pub fn hovered(&self) -> Option<PointerTarget> {
		self.hovered
	}

	pub fn is_interactive(&self) -> bool {
		self.interactive
	}

	/// Applies pending removals reported by the model.
	pub fn sync(&mut self) {
		let Removed { nodes, edges } = mem::take(&mut *self.removed.borrow_mut());
		if nodes.is_empty() && edges.is_empty() {
			return;
		}
		for id in &nodes {
			self.selection.nodes.remove(id);
		}
		for id in &edges {
			self.selection.edges.remove(id);
		}
		let gone = |target: &PointerTarget| match target {
			PointerTarget::Node(n) | PointerTarget::Handle { node: n, .. } => nodes.contains(n),
			PointerTarget::Edge(e) => edges.contains(e),
			PointerTarget::Canvas => false,
		};
		if self.hovered.as_ref().is_some_and(gone) {
			self.hovered = None;
		}
		let aborted = match self.mode {
			InteractionMode::Dragging { node, .. } => nodes.contains(&node),
			InteractionMode::Connecting { from, .. } => nodes.contains(&from),
			_ => false,
		};
		if aborted {
			debug!("aborting {:?}: node removed", self.mode);
			self.mode = InteractionMode::Idle;
		}
	}

	pub fn pointer_down(
		&mut self,
		ev: PointerEvent,
		model: &GraphModel,
		viewport: &ViewportController,
	) {
		self.sync();
		if self.mode != InteractionMode::Idle || ev.button == PointerButton::Secondary {
			return;
		}

		if ev.button == PointerButton::Middle {
			self.start_pan(ev.position, viewport);
			return;
		}

		match ev.target {
			PointerTarget::Canvas => {
				if !ev.modifiers.shift {
					self.selection.clear();
				}
				if !self.pan_requires_modifier || ev.modifiers.any() {
					self.start_pan(ev.position, viewport);
				}
			}
			_ if !self.interactive => {}
			PointerTarget::Node(id) => {
				let Some(node) = model.node(id) else {
					return;
				};
				self.select_node(id, ev.modifiers.shift);
				let p = viewport.to_canvas(ev.position);
				self.mode = InteractionMode::Dragging {
					node: id,
					grab_offset: p - node.position,
					origin: node.position,
				};
				debug!("drag start {id}");
			}
			PointerTarget::Handle { node, kind } => {
				if !model.node(node).is_some_and(|n| n.payload.has_handle(kind)) {
					debug!("{node} has no {kind:?} handle");
					return;
				}
				self.mode = InteractionMode::Connecting {
					from: node,
					handle: kind,
					cursor: viewport.to_canvas(ev.position),
				};
				debug!("connect start {node} ({kind:?})");
			}
			PointerTarget::Edge(id) => {
				if !ev.modifiers.shift {
					self.selection.clear();
				}
				self.selection.edges.insert(id);
			}
		}
	}

	pub fn pointer_move(
		&mut self,
		ev: PointerEvent,
		model: &mut GraphModel,
		viewport: &mut ViewportController,
	) {
		self.sync();
		match &mut self.mode {
			InteractionMode::Idle => {
				self.hovered = (ev.target != PointerTarget::Canvas).then_some(ev.target);
			}
			InteractionMode::Dragging {
				node, grab_offset, ..
			} => {
				let (id, offset) = (*node, *grab_offset);
				let p = snap(self.snap_grid, viewport.to_canvas(ev.position) - offset);
				if let Err(e) = model.move_node(id, p) {
					debug!("drag aborted: {e}");
					self.mode = InteractionMode::Idle;
				}
			}
			InteractionMode::Connecting { cursor, .. } => {
				*cursor = viewport.to_canvas(ev.position);
				self.hovered = (ev.target != PointerTarget::Canvas).then_some(ev.target);
			}
			InteractionMode::PanningViewport { last, .. } => {
				let d = ev.position - *last;
				*last = ev.position;
				viewport.pan(d.x, d.y);
			}
		}
	}

	pub fn pointer_up(&mut self, ev: PointerEvent, model: &mut GraphModel) {
		self.sync();
		let InteractionMode::Connecting { from, handle, .. } = mem::take(&mut self.mode) else {
			return;
		};
		let PointerTarget::Handle { node, kind } = ev.target else {
			debug!("connection from {from} dropped on {:?}", ev.target);
			return;
		};
		let has_handle = model.node(node).is_some_and(|n| n.payload.has_handle(kind));
		if node == from || kind != handle.opposite() || !has_handle {
			debug!("connection from {from} rejected by handle on {node}");
			return;
		}
		let (source, target) = match handle {
			HandleKind::Source => (from, node),
			HandleKind::Target => (node, from),
		};
		match model.add_edge(source, target, EdgePayload::default()) {
			Ok(id) => debug!("connected {source} -> {target} as {id}"),
			Err(e) => debug!("connection not created: {e}"),
		}
	}

	/// Pointer left the canvas: finish drags and pans, drop connections.
	pub fn pointer_leave(&mut self) {
		self.sync();
		self.hovered = None;
		self.mode = InteractionMode::Idle;
	}

	/// Zooms at `position`. Ignored while an interaction is in progress.
	pub fn wheel(&mut self, position: Point, delta_y: f64, viewport: &mut ViewportController) {
		if !self.mode.is_idle() {
			debug!("zoom ignored during {:?}", self.mode);
			return;
		}
		let factor = if delta_y > 0.0 {
			1.0 / self.zoom_step
		} else if delta_y < 0.0 {
			self.zoom_step
		} else {
			return;
		};
		if let Err(e) = viewport.zoom(factor, position) {
			debug!("zoom ignored: {e}");
			self.mode = InteractionMode::Idle;
		}
	}

	/// Handles a key by its `KeyboardEvent.key` name. Returns whether the
	/// key was consumed.
	pub fn key(
		&mut self,
		key: &str,
		model: &mut GraphModel,
		viewport: &mut ViewportController,
	) -> bool {
		self.sync();
		if self.cancel_keys.iter().any(|k| k == key) {
			let active = self.mode != InteractionMode::Idle;
			self.cancel(model, viewport);
			return active;
		}
		if self.delete_keys.iter().any(|k| k == key) {
			return self.delete_selected(model) > 0;
		}
		false
	}

	/// Returns to `Idle`, undoing the effect of the interaction in progress.
	pub fn cancel(&mut self, model: &mut GraphModel, viewport: &mut ViewportController) {
		self.sync();
		match mem::take(&mut self.mode) {
			InteractionMode::Dragging { node, origin, .. } => {
				if let Err(e) = model.move_node(node, origin) {
					debug!("drag cancel could not restore {node}: {e}");
				}
			}
			InteractionMode::PanningViewport { origin, .. } => viewport.set_viewport(origin),
			InteractionMode::Connecting { .. } | InteractionMode::Idle => {}
		}
	}

	/// Removes the selected edges and nodes. Only acts while `Idle` and
	/// interactive. Returns how many selected items were removed.
	pub fn delete_selected(&mut self, model: &mut GraphModel) -> usize {
		self.sync();
		if self.mode != InteractionMode::Idle || !self.interactive {
			return 0;
		}
		let selection = mem::take(&mut self.selection);
		let mut removed = 0;
		for id in selection.edges {
			// already gone if a selected node took it with it
			if model.remove_edge(id).is_ok() {
				removed += 1;
			}
		}
		for id in selection.nodes {
			if model.remove_node(id).is_ok() {
				removed += 1;
			}
		}
		self.sync();
		removed
	}

	/// Locks or unlocks editing. Locking cancels the current interaction.
	pub fn set_interactive(
		&mut self,
		interactive: bool,
		model: &mut GraphModel,
		viewport: &mut ViewportController,
	) {
		if !interactive {
			self.cancel(model, viewport);
			self.selection.clear();
		}
		self.interactive = interactive;
	}

	fn select_node(&mut self, id: NodeId, additive: bool) {
		if !additive {
			self.selection.clear();
		}
		self.selection.nodes.insert(id);
	}

	fn start_pan(&mut self, position: Point, viewport: &ViewportController) {
		self.mode = InteractionMode::PanningViewport {
			last: position,
			origin: viewport.viewport(),
		};
	}
}

fn snap(grid: Option<f64>, p: Point) -> Point {
	match grid {
		Some(g) => Point::new((p.x / g).round() * g, (p.y / g).round() * g),
		None => p,
	}
}
