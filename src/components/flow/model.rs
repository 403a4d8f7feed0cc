//! Authoritative node/edge store.
//!
//! All mutation goes through [`GraphModel`]. Every successful mutation emits
//! exactly one [`GraphChange`] to the registered listeners, synchronously and
//! in registration order, before the mutating call returns.

use std::collections::BTreeMap;

use log::debug;

use super::error::{FlowError, FlowResult, ItemRef};
use super::types::{Edge, EdgeId, EdgePayload, Node, NodeId, NodePayload, Point, Size};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
	Added,
	Removed,
	Updated,
}

/// One mutation, with every id it touched.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphChange {
	pub kind: ChangeKind,
	pub nodes: Vec<NodeId>,
	pub edges: Vec<EdgeId>,
}

impl GraphChange {
	fn node(kind: ChangeKind, id: NodeId) -> Self {
		Self {
			kind,
			nodes: vec![id],
			edges: Vec::new(),
		}
	}

	fn edge(kind: ChangeKind, id: EdgeId) -> Self {
		Self {
			kind,
			nodes: Vec::new(),
			edges: vec![id],
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&GraphChange)>;

/// Read-only copy of the graph, ordered by id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphSnapshot {
	pub nodes: Vec<Node>,
	pub edges: Vec<Edge>,
	/// Number of mutations applied when the snapshot was taken.
	pub version: u64,
}

impl GraphSnapshot {
	pub fn node(&self, id: NodeId) -> Option<&Node> {
		self.nodes
			.binary_search_by_key(&id, |n| n.id)
			.ok()
			.map(|i| &self.nodes[i])
	}
}

#[derive(Default)]
pub struct GraphModel {
	nodes: BTreeMap<NodeId, Node>,
	edges: BTreeMap<EdgeId, Edge>,
	next_node: u64,
	next_edge: u64,
	version: u64,
	listeners: Vec<(ListenerId, Listener)>,
	next_listener: u64,
}

impl GraphModel {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_node(&mut self, position: Point, payload: NodePayload) -> NodeId {
		let id = NodeId(self.next_node);
		self.next_node += 1;
		self.nodes.insert(
			id,
			Node {
				id,
				position,
				payload,
				size: None,
			},
		);
		self.emit(GraphChange::node(ChangeKind::Added, id));
		id
	}

	/// Adds a directed edge. Self-loops are allowed; an identical
	/// `source -> target` pair is rejected with `DuplicateEdge`.
	pub fn add_edge(
		&mut self,
		source: NodeId,
		target: NodeId,
		payload: EdgePayload,
	) -> FlowResult<EdgeId> {
		for node in [source, target] {
			if !self.nodes.contains_key(&node) {
				return Err(FlowError::UnknownNode { node });
			}
		}
		if let Some(existing) = self.find_edge(source, target) {
			return Err(FlowError::DuplicateEdge {
				source_node: source,
				target_node: target,
				existing,
			});
		}

		let id = EdgeId(self.next_edge);
		self.next_edge += 1;
		self.edges.insert(
			id,
			Edge {
				id,
				source,
				target,
				payload,
			},
		);
		self.emit(GraphChange::edge(ChangeKind::Added, id));
		Ok(id)
	}

	/// Removes the node and every edge incident to it, as one change.
	pub fn remove_node(&mut self, id: NodeId) -> FlowResult<Node> {
		let node = self
			.nodes
			.remove(&id)
			.ok_or(FlowError::NotFound(ItemRef::Node(id)))?;
		let incident: Vec<EdgeId> = self.incident_edges(id);
		for edge in &incident {
			self.edges.remove(edge);
		}
		debug!("removed {id} with {} incident edges", incident.len());
		self.emit(GraphChange {
			kind: ChangeKind::Removed,
			nodes: vec![id],
			edges: incident,
		});
		Ok(node)
	}

	pub fn remove_edge(&mut self, id: EdgeId) -> FlowResult<Edge> {
		let edge = self
			.edges
			.remove(&id)
			.ok_or(FlowError::NotFound(ItemRef::Edge(id)))?;
		self.emit(GraphChange::edge(ChangeKind::Removed, id));
		Ok(edge)
	}

	pub fn move_node(&mut self, id: NodeId, position: Point) -> FlowResult<()> {
		self.node_mut(id)?.position = position;
		self.emit(GraphChange::node(ChangeKind::Updated, id));
		Ok(())
	}

	pub fn update_node(&mut self, id: NodeId, payload: NodePayload) -> FlowResult<()> {
		self.node_mut(id)?.payload = payload;
		self.emit(GraphChange::node(ChangeKind::Updated, id));
		Ok(())
	}

	/// Records the size the renderer measured for a node.
	pub fn set_node_size(&mut self, id: NodeId, size: Size) -> FlowResult<()> {
		self.node_mut(id)?.size = Some(size);
		self.emit(GraphChange::node(ChangeKind::Updated, id));
		Ok(())
	}

	pub fn node(&self, id: NodeId) -> Option<&Node> {
		self.nodes.get(&id)
	}

	pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
		self.edges.get(&id)
	}

	pub fn nodes(&self) -> impl DoubleEndedIterator<Item = &Node> {
		self.nodes.values()
	}

	pub fn edges(&self) -> impl DoubleEndedIterator<Item = &Edge> {
		self.edges.values()
	}

	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	pub fn edge_count(&self) -> usize {
		self.edges.len()
	}

	pub fn find_edge(&self, source: NodeId, target: NodeId) -> Option<EdgeId> {
		self.edges
			.values()
			.find(|e| e.source == source && e.target == target)
			.map(|e| e.id)
	}

	pub fn incident_edges(&self, node: NodeId) -> Vec<EdgeId> {
		self.edges
			.values()
			.filter(|e| e.touches(node))
			.map(|e| e.id)
			.collect()
	}

	pub fn snapshot(&self) -> GraphSnapshot {
		GraphSnapshot {
			nodes: self.nodes.values().cloned().collect(),
			edges: self.edges.values().cloned().collect(),
			version: self.version,
		}
	}

	pub fn version(&self) -> u64 {
		self.version
	}

	/// Registers a listener. Listeners are called in registration order.
	pub fn subscribe(&mut self, listener: impl FnMut(&GraphChange) + 'static) -> ListenerId {
		let id = ListenerId(self.next_listener);
		self.next_listener += 1;
		self.listeners.push((id, Box::new(listener)));
		id
	}

	pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
		let before = self.listeners.len();
		self.listeners.retain(|(lid, _)| *lid != id);
		self.listeners.len() != before
	}

	fn node_mut(&mut self, id: NodeId) -> FlowResult<&mut Node> {
		self.nodes
			.get_mut(&id)
			.ok_or(FlowError::NotFound(ItemRef::Node(id)))
	}

	fn emit(&mut self, change: GraphChange) {
		self.version += 1;
		for (_, listener) in &mut self.listeners {
			listener(&change);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::cell::RefCell;
	use std::rc::Rc;

	fn label(s: &str) -> NodePayload {
		NodePayload::default_node(s)
	}

	#[test]
	fn remove_node_cascades_to_incident_edges() {
		let mut model = GraphModel::new();
		let n1 = model.add_node(Point::new(0.0, 0.0), label("n1"));
		let n2 = model.add_node(Point::new(100.0, 100.0), label("n2"));
		model.add_edge(n1, n2, EdgePayload::default()).unwrap();

		model.remove_node(n1).unwrap();

		assert_eq!(model.node_count(), 1);
		assert!(model.node(n2).is_some());
		assert_eq!(model.edge_count(), 0);
	}

	#[test]
	fn add_edge_rejects_unknown_endpoints() {
		let mut model = GraphModel::new();
		let n1 = model.add_node(Point::default(), label("a"));
		let ghost = NodeId(99);

		assert_eq!(
			model.add_edge(n1, ghost, EdgePayload::default()),
			Err(FlowError::UnknownNode { node: ghost })
		);
		assert_eq!(
			model.add_edge(ghost, n1, EdgePayload::default()),
			Err(FlowError::UnknownNode { node: ghost })
		);
		assert_eq!(model.edge_count(), 0);
	}

	#[test]
	fn duplicate_directed_edge_is_rejected_but_reverse_is_not() {
		let mut model = GraphModel::new();
		let a = model.add_node(Point::default(), label("a"));
		let b = model.add_node(Point::default(), label("b"));
		let ab = model.add_edge(a, b, EdgePayload::default()).unwrap();

		assert_eq!(
			model.add_edge(a, b, EdgePayload::default()),
			Err(FlowError::DuplicateEdge {
				source_node: a,
				target_node: b,
				existing: ab,
			})
		);
		assert!(model.add_edge(b, a, EdgePayload::default()).is_ok());
		assert_eq!(model.edge_count(), 2);
	}

	#[test]
	fn missing_ids_report_not_found() {
		let mut model = GraphModel::new();
		let id = NodeId(7);
		assert_eq!(
			model.move_node(id, Point::default()),
			Err(FlowError::NotFound(ItemRef::Node(id)))
		);
		assert!(matches!(
			model.remove_node(id),
			Err(FlowError::NotFound(ItemRef::Node(_)))
		));
		assert!(matches!(
			model.remove_edge(EdgeId(3)),
			Err(FlowError::NotFound(ItemRef::Edge(EdgeId(3))))
		));
		assert_eq!(model.version(), 0);
	}

	#[test]
	fn update_node_replaces_payload() {
		let mut model = GraphModel::new();
		let a = model.add_node(Point::new(4.0, 5.0), label("a"));
		let seen: Rc<RefCell<Vec<GraphChange>>> = Rc::default();
		let sink = seen.clone();
		model.subscribe(move |c| sink.borrow_mut().push(c.clone()));

		model.update_node(a, NodePayload::output("sink")).unwrap();

		let node = model.node(a).unwrap();
		assert_eq!(node.payload, NodePayload::output("sink"));
		assert_eq!(node.position, Point::new(4.0, 5.0));
		assert_eq!(*seen.borrow(), vec![GraphChange::node(ChangeKind::Updated, a)]);

		let ghost = NodeId(42);
		assert_eq!(
			model.update_node(ghost, label("x")),
			Err(FlowError::NotFound(ItemRef::Node(ghost)))
		);
		assert_eq!(seen.borrow().len(), 1);
	}

	#[test]
	fn ids_are_not_reused_after_removal() {
		let mut model = GraphModel::new();
		let a = model.add_node(Point::default(), label("a"));
		model.remove_node(a).unwrap();
		let b = model.add_node(Point::default(), label("b"));
		assert_ne!(a, b);
	}

	#[test]
	fn listeners_receive_changes_in_order() {
		let mut model = GraphModel::new();
		let seen: Rc<RefCell<Vec<GraphChange>>> = Rc::default();
		let sink = seen.clone();
		model.subscribe(move |c| sink.borrow_mut().push(c.clone()));

		let a = model.add_node(Point::default(), label("a"));
		let b = model.add_node(Point::default(), label("b"));
		let e = model.add_edge(a, b, EdgePayload::default()).unwrap();
		model.move_node(b, Point::new(5.0, 5.0)).unwrap();
		model.remove_node(a).unwrap();

		let seen = seen.borrow();
		assert_eq!(seen.len(), 5);
		assert_eq!(seen[0], GraphChange::node(ChangeKind::Added, a));
		assert_eq!(seen[2], GraphChange::edge(ChangeKind::Added, e));
		assert_eq!(seen[3], GraphChange::node(ChangeKind::Updated, b));
		assert_eq!(
			seen[4],
			GraphChange {
				kind: ChangeKind::Removed,
				nodes: vec![a],
				edges: vec![e],
			}
		);
	}

	#[test]
	fn failed_mutations_emit_nothing() {
		let mut model = GraphModel::new();
		let count = Rc::new(RefCell::new(0));
		let c = count.clone();
		model.subscribe(move |_| *c.borrow_mut() += 1);

		let _ = model.move_node(NodeId(1), Point::default());
		let _ = model.add_edge(NodeId(1), NodeId(2), EdgePayload::default());
		assert_eq!(*count.borrow(), 0);
	}

	#[test]
	fn unsubscribed_listener_is_silent() {
		let mut model = GraphModel::new();
		let count = Rc::new(RefCell::new(0));
		let c = count.clone();
		let id = model.subscribe(move |_| *c.borrow_mut() += 1);
		model.add_node(Point::default(), label("a"));
		assert!(model.unsubscribe(id));
		assert!(!model.unsubscribe(id));
		model.add_node(Point::default(), label("b"));
		assert_eq!(*count.borrow(), 1);
	}

	#[test]
	fn snapshot_is_detached_from_later_mutation() {
		let mut model = GraphModel::new();
		let a = model.add_node(Point::new(1.0, 2.0), label("a"));
		let snap = model.snapshot();
		model.move_node(a, Point::new(9.0, 9.0)).unwrap();

		assert_eq!(snap.node(a).map(|n| n.position), Some(Point::new(1.0, 2.0)));
		assert_eq!(snap.version + 1, model.version());
	}
}
