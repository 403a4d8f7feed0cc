//! Node-graph canvas: an owned graph model, viewport transform and input
//! state machine, drawn through a [`RenderAdapter`].

mod component;
pub mod config;
pub mod error;
pub mod hit;
pub mod interaction;
pub mod layout;
pub mod model;
pub mod render;
pub mod state;
pub mod types;
pub mod viewport;

pub use component::FlowCanvas;
pub use config::{BackgroundConfig, BackgroundVariant, ControlsConfig, FlowConfig, ViewportConfig};
pub use error::{FlowError, FlowResult, ItemRef};
pub use interaction::{
	InteractionController, InteractionMode, Modifiers, PointerButton, PointerEvent, PointerTarget,
	Selection,
};
pub use model::{ChangeKind, GraphChange, GraphModel, GraphSnapshot, ListenerId};
pub use render::{Frame, RenderAdapter};
pub use state::FlowState;
pub use types::{
	Edge, EdgeId, EdgePayload, FlowData, FlowEdge, FlowNode, HandleKind, Node, NodeId, NodePayload,
	Point, Rect, Size,
};
pub use viewport::{Viewport, ViewportController};
