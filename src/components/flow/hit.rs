//! Canvas geometry shared by hit testing and rendering.
//!
//! Everything here works in canvas units; hit radii scale with zoom like
//! the nodes they belong to.

use super::interaction::PointerTarget;
use super::model::GraphModel;
use super::types::{HandleKind, Node, Point, Rect, Size};
use super::viewport::Viewport;

pub const DEFAULT_NODE_SIZE: Size = Size::new(150.0, 40.0);
pub const HANDLE_RADIUS: f64 = 4.0;
pub const HANDLE_HIT_RADIUS: f64 = 9.0;
pub const EDGE_HIT_DISTANCE: f64 = 6.0;
const CURVE_SAMPLES: usize = 32;

pub fn node_rect(node: &Node) -> Rect {
	Rect::new(node.position, node.size.unwrap_or(DEFAULT_NODE_SIZE))
}

/// Target handles sit on the top edge, source handles on the bottom edge.
pub fn handle_position(node: &Node, kind: HandleKind) -> Point {
	let r = node_rect(node);
	match kind {
		HandleKind::Target => Point::new(r.x + r.width / 2.0, r.y),
		HandleKind::Source => Point::new(r.x + r.width / 2.0, r.y + r.height),
	}
}

/// Cubic bezier control points leaving `from` downward and entering `to` from above.
pub fn edge_curve(from: Point, to: Point) -> [Point; 4] {
	let offset = ((to.y - from.y).abs() * 0.5).max(25.0);
	[
		from,
		Point::new(from.x, from.y + offset),
		Point::new(to.x, to.y - offset),
		to,
	]
}

pub fn bezier_point(curve: &[Point; 4], t: f64) -> Point {
	let u = 1.0 - t;
	let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
	Point::new(
		a * curve[0].x + b * curve[1].x + c * curve[2].x + d * curve[3].x,
		a * curve[0].y + b * curve[1].y + c * curve[2].y + d * curve[3].y,
	)
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
	let (abx, aby) = (b.x - a.x, b.y - a.y);
	let len2 = abx * abx + aby * aby;
	if len2 == 0.0 {
		return p.distance(a);
	}
	let t = (((p.x - a.x) * abx + (p.y - a.y) * aby) / len2).clamp(0.0, 1.0);
	p.distance(Point::new(a.x + abx * t, a.y + aby * t))
}

/// Distance from `p` to the curve, approximated by a polyline.
pub fn distance_to_curve(p: Point, curve: &[Point; 4]) -> f64 {
	let mut prev = curve[0];
	let mut best = f64::INFINITY;
	for i in 1..=CURVE_SAMPLES {
		let next = bezier_point(curve, i as f64 / CURVE_SAMPLES as f64);
		best = best.min(distance_to_segment(p, prev, next));
		prev = next;
	}
	best
}

/// Bounding box of all nodes, or `None` for an empty graph.
pub fn graph_bounds<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Option<Rect> {
	nodes
		.into_iter()
		.map(node_rect)
		.reduce(|acc, r| acc.union(&r))
}

/// Identifies what lies under a screen point. Handles win over node bodies,
/// node bodies over edges; later nodes are drawn on top and win ties.
pub fn target_at(model: &GraphModel, viewport: &Viewport, screen: Point) -> PointerTarget {
	let p = viewport.to_canvas(screen);

	for node in model.nodes().rev() {
		for kind in [HandleKind::Source, HandleKind::Target] {
			if node.payload.has_handle(kind)
				&& handle_position(node, kind).distance(p) < HANDLE_HIT_RADIUS
			{
				return PointerTarget::Handle {
					node: node.id,
					kind,
				};
			}
		}
	}

	if let Some(node) = model.nodes().rev().find(|n| node_rect(n).contains(p)) {
		return PointerTarget::Node(node.id);
	}

	for edge in model.edges().rev() {
		let (Some(src), Some(tgt)) = (model.node(edge.source), model.node(edge.target))
		else {
			continue;
		};
		let curve = edge_curve(
			handle_position(src, HandleKind::Source),
			handle_position(tgt, HandleKind::Target),
		);
		if distance_to_curve(p, &curve) < EDGE_HIT_DISTANCE {
			return PointerTarget::Edge(edge.id);
		}
	}

	PointerTarget::Canvas
}
