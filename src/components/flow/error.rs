//! Error types for canvas core operations.

use thiserror::Error;

use super::types::{NodeId, EdgeId};

/// Result type alias for canvas core operations.
pub type FlowResult<T> = Result<T, FlowError>;

/// Recoverable failures of model and viewport operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlowError {
	/// An edge endpoint does not exist.
	#[error("unknown node: {node}")]
	UnknownNode { node: NodeId },

	/// The same directed edge already exists.
	#[error("edge {source_node} -> {target_node} already exists as {existing}")]
	DuplicateEdge {
		source_node: NodeId,
		target_node: NodeId,
		existing: EdgeId,
	},

	/// The addressed node or edge is absent.
	#[error("{0} not found")]
	NotFound(ItemRef),

	/// A scale or zoom factor is unusable.
	#[error("value {value} out of range [{min}, {max}]")]
	OutOfRange { value: f64, min: f64, max: f64 },
}

/// Names the item a `NotFound` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRef {
	Node(NodeId),
	Edge(EdgeId),
}

impl std::fmt::Display for ItemRef {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ItemRef::Node(id) => write!(f, "node {id}"),
			ItemRef::Edge(id) => write!(f, "edge {id}"),
		}
	}
}
