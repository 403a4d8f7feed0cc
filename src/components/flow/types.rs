use std::fmt;
use std::ops::{Add, Sub};

/// Stable identifier of a node. Never reused within one model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "n{}", self.0)
	}
}

/// Stable identifier of an edge. Never reused within one model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(pub u64);

impl fmt::Display for EdgeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "e{}", self.0)
	}
}

/// A 2D point. Whether it is in canvas or screen units depends on context.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn distance(self, other: Point) -> f64 {
		let (dx, dy) = (self.x - other.x, self.y - other.y);
		(dx * dx + dy * dy).sqrt()
	}

	pub fn is_finite(self) -> bool {
		self.x.is_finite() && self.y.is_finite()
	}
}

impl Add for Point {
	type Output = Point;

	fn add(self, rhs: Point) -> Point {
		Point::new(self.x + rhs.x, self.y + rhs.y)
	}
}

impl Sub for Point {
	type Output = Point;

	fn sub(self, rhs: Point) -> Point {
		Point::new(self.x - rhs.x, self.y - rhs.y)
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
	pub width: f64,
	pub height: f64,
}

impl Size {
	pub const fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}
}

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl Rect {
	pub fn new(origin: Point, size: Size) -> Self {
		Self {
			x: origin.x,
			y: origin.y,
			width: size.width,
			height: size.height,
		}
	}

	pub fn contains(&self, p: Point) -> bool {
		p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
	}

	pub fn center(&self) -> Point {
		Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
	}

	/// Smallest rectangle covering both.
	pub fn union(&self, other: &Rect) -> Rect {
		let (x, y) = (self.x.min(other.x), self.y.min(other.y));
		let right = (self.x + self.width).max(other.x + other.width);
		let bottom = (self.y + self.height).max(other.y + other.height);
		Rect {
			x,
			y,
			width: right - x,
			height: bottom - y,
		}
	}
}

/// Which end of a connection a handle accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandleKind {
	/// Outgoing edges start here (bottom-center of the node).
	Source,
	/// Incoming edges end here (top-center of the node).
	Target,
}

impl HandleKind {
	pub fn opposite(self) -> Self {
		match self {
			HandleKind::Source => HandleKind::Target,
			HandleKind::Target => HandleKind::Source,
		}
	}
}

/// Node content, tagged by kind. The kind decides which handles exist.
#[derive(Clone, Debug, PartialEq)]
pub enum NodePayload {
	/// Entry node: source handle only.
	Input { label: String },
	/// Pass-through node: both handles.
	Default { label: String },
	/// Sink node: target handle only.
	Output { label: String },
}

impl NodePayload {
	pub fn input(label: impl Into<String>) -> Self {
		NodePayload::Input { label: label.into() }
	}

	pub fn default_node(label: impl Into<String>) -> Self {
		NodePayload::Default { label: label.into() }
	}

	pub fn output(label: impl Into<String>) -> Self {
		NodePayload::Output { label: label.into() }
	}

	pub fn label(&self) -> &str {
		match self {
			NodePayload::Input { label }
			| NodePayload::Default { label }
			| NodePayload::Output { label } => label,
		}
	}

	pub fn has_handle(&self, kind: HandleKind) -> bool {
		!matches!(
			(self, kind),
			(NodePayload::Input { .. }, HandleKind::Target)
				| (NodePayload::Output { .. }, HandleKind::Source)
		)
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EdgePayload {
	pub label: Option<String>,
	/// Drawn as a moving dashed line.
	pub animated: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	pub id: NodeId,
	/// Top-left corner in canvas units.
	pub position: Point,
	pub payload: NodePayload,
	/// Measured by the renderer; `None` until then.
	pub size: Option<Size>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
	pub id: EdgeId,
	pub source: NodeId,
	pub target: NodeId,
	pub payload: EdgePayload,
}

impl Edge {
	pub fn touches(&self, node: NodeId) -> bool {
		self.source == node || self.target == node
	}
}

/// Declarative seed for a canvas. Keys are only used to wire edges while loading.
#[derive(Clone, Debug)]
pub struct FlowNode {
	pub key: String,
	pub position: Point,
	pub payload: NodePayload,
}

#[derive(Clone, Debug)]
pub struct FlowEdge {
	pub source: String,
	pub target: String,
	pub payload: EdgePayload,
}

#[derive(Clone, Debug, Default)]
pub struct FlowData {
	pub nodes: Vec<FlowNode>,
	pub edges: Vec<FlowEdge>,
}
