//! Force-directed auto layout.
//!
//! Node centers are fed to a `force_graph` simulation, edges become springs,
//! and the settled centers are converted back to top-left positions.

use force_graph::{EdgeData, ForceGraph, NodeData, SimulationParameters};
use std::collections::HashMap;

use super::hit::node_rect;
use super::model::GraphSnapshot;
use super::types::{NodeId, Point};

const STEP: f32 = 0.016;
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;
const SPREAD: f64 = 30.0;

/// Nudges the k-th repeat of a center onto a sunflower spiral around it.
/// The simulation exerts no force between coincident nodes.
fn spread(center: Point, k: usize) -> Point {
	if k == 0 {
		return center;
	}
	let (angle, radius) = (k as f64 * GOLDEN_ANGLE, SPREAD * (k as f64).sqrt());
	center + Point::new(radius * angle.cos(), radius * angle.sin())
}

/// Runs `steps` simulation ticks and returns the new position of every node
/// whose result is finite, ordered by id.
pub fn relax(snapshot: &GraphSnapshot, steps: usize) -> Vec<(NodeId, Point)> {
	let mut graph: ForceGraph<NodeId, ()> = ForceGraph::new(SimulationParameters {
		force_charge: 12000.0,
		force_spring: 0.3,
		force_max: 280.0,
		node_speed: 7000.0,
		damping_factor: 0.95,
	});
	let mut idx = HashMap::new();
	let mut half = HashMap::new();
	let mut seen: HashMap<(u64, u64), usize> = HashMap::new();

	for node in &snapshot.nodes {
		let r = node_rect(node);
		let c = r.center();
		let repeats = seen.entry((c.x.to_bits(), c.y.to_bits())).or_insert(0);
		let c = spread(c, *repeats);
		*repeats += 1;
		let i = graph.add_node(NodeData {
			x: c.x as f32,
			y: c.y as f32,
			mass: 10.0,
			is_anchor: false,
			user_data: node.id,
		});
		idx.insert(node.id, i);
		half.insert(node.id, Point::new(r.width / 2.0, r.height / 2.0));
	}
	for edge in &snapshot.edges {
		if let (Some(&src), Some(&tgt)) = (idx.get(&edge.source), idx.get(&edge.target)) {
			// self-loops would pull a node onto itself
			if src != tgt {
				graph.add_edge(src, tgt, EdgeData::default());
			}
		}
	}

	for _ in 0..steps {
		graph.update(STEP);
	}

	let mut out = Vec::with_capacity(snapshot.nodes.len());
	graph.visit_nodes(|node| {
		let id = node.data.user_data;
		let p = Point::new(node.x() as f64, node.y() as f64) - half[&id];
		if p.is_finite() {
			out.push((id, p));
		}
	});
	out.sort_by_key(|(id, _)| *id);
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::flow::model::GraphModel;
	use crate::components::flow::types::{EdgePayload, NodePayload};

	#[test]
	fn empty_graph_yields_nothing() {
		assert!(relax(&GraphModel::new().snapshot(), 10).is_empty());
	}

	#[test]
	fn zero_steps_keeps_positions() {
		let mut model = GraphModel::new();
		let a = model.add_node(Point::new(0.0, 0.0), NodePayload::input("a"));
		let b = model.add_node(Point::new(300.0, 40.0), NodePayload::output("b"));
		model.add_edge(a, b, EdgePayload::default()).unwrap();

		let out = relax(&model.snapshot(), 0);
		assert_eq!(out.len(), 2);
		assert_eq!(out[0].0, a);
		assert!(out[0].1.distance(Point::new(0.0, 0.0)) < 1e-3);
		assert!(out[1].1.distance(Point::new(300.0, 40.0)) < 1e-3);
	}

	#[test]
	fn stacked_nodes_are_pulled_apart() {
		let mut model = GraphModel::new();
		let ids: Vec<_> = (0..3)
			.map(|i| model.add_node(Point::default(), NodePayload::default_node(format!("{i}"))))
			.collect();
		model.add_edge(ids[0], ids[1], EdgePayload::default()).unwrap();

		let out = relax(&model.snapshot(), 300);
		assert_eq!(out.len(), 3);
		for (i, (_, p)) in out.iter().enumerate() {
			assert!(p.is_finite());
			for (_, q) in &out[i + 1..] {
				assert!(p.distance(*q) > 1.0, "{p:?} and {q:?} still overlap");
			}
		}
	}

	#[test]
	fn relaxed_positions_are_finite() {
		let mut model = GraphModel::new();
		let ids: Vec<_> = (0..6)
			.map(|i| {
				model.add_node(
					Point::new(i as f64 * 40.0, (i % 2) as f64 * 90.0),
					NodePayload::default_node(format!("{i}")),
				)
			})
			.collect();
		for w in ids.windows(2) {
			model.add_edge(w[0], w[1], EdgePayload::default()).unwrap();
		}
		let out = relax(&model.snapshot(), 50);
		assert_eq!(out.len(), 6);
		assert!(out.iter().all(|(_, p)| p.is_finite()));
	}
}
