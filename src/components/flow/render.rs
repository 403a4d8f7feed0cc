use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::config::{BackgroundConfig, BackgroundVariant};
use super::hit::{
	DEFAULT_NODE_SIZE, HANDLE_RADIUS, bezier_point, edge_curve, handle_position, node_rect,
};
use super::interaction::{InteractionMode, PointerTarget, Selection};
use super::model::GraphSnapshot;
use super::types::{HandleKind, Node, Point, Rect, Size};
use super::viewport::Viewport;

const NODE_FILL: &str = "#ffffff";
const NODE_STROKE: &str = "#1a192b";
const EDGE_STROKE: &str = "#b1b1b7";
const EDGE_ACTIVE: &str = "#555555";
const HANDLE_FILL: &str = "#1a192b";
const VALID_HANDLE: &str = "#2ca02c";
const FONT: &str = "12px sans-serif";
const LABEL_PADDING: f64 = 10.0;

/// Everything a renderer needs for one visual frame.
#[derive(Clone, Debug)]
pub struct Frame {
	pub snapshot: GraphSnapshot,
	pub viewport: Viewport,
	pub mode: InteractionMode,
	pub selection: Selection,
	pub hovered: Option<PointerTarget>,
	pub interactive: bool,
	pub width: f64,
	pub height: f64,
	/// Seconds since start, drives animated edges.
	pub flow_time: f64,
}

/// Boundary to whatever draws the canvas.
pub trait RenderAdapter {
	/// Size a node will occupy once drawn, in canvas units.
	fn measure(&self, node: &Node) -> Size;

	fn render(&self, frame: &Frame);
}

pub struct CanvasRenderer {
	ctx: CanvasRenderingContext2d,
	background: Option<BackgroundConfig>,
}

impl CanvasRenderer {
	pub fn new(ctx: CanvasRenderingContext2d, background: Option<BackgroundConfig>) -> Self {
		Self { ctx, background }
	}
}

impl RenderAdapter for CanvasRenderer {
	fn measure(&self, node: &Node) -> Size {
		self.ctx.set_font(FONT);
		let text = self
			.ctx
			.measure_text(node.payload.label())
			.map(|m| m.width())
			.unwrap_or(0.0);
		Size::new(
			(text + 2.0 * LABEL_PADDING).max(DEFAULT_NODE_SIZE.width),
			DEFAULT_NODE_SIZE.height,
		)
	}

	fn render(&self, frame: &Frame) {
		let ctx = &self.ctx;
		let fill = self
			.background
			.as_ref()
			.map(|b| b.fill.as_str())
			.unwrap_or(NODE_FILL);
		ctx.set_fill_style_str(fill);
		ctx.fill_rect(0.0, 0.0, frame.width, frame.height);
		if let Some(bg) = &self.background {
			draw_background(bg, frame, ctx);
		}

		let vp = frame.viewport;
		ctx.save();
		let _ = ctx.translate(vp.translation.x, vp.translation.y);
		let _ = ctx.scale(vp.scale, vp.scale);
		draw_edges(frame, ctx);
		draw_connection_line(frame, ctx);
		draw_nodes(frame, ctx);
		ctx.restore();
	}
}

/// Pattern is laid out in screen space so it stays crisp while following pan/zoom.
fn draw_background(bg: &BackgroundConfig, frame: &Frame, ctx: &CanvasRenderingContext2d) {
	let vp = frame.viewport;
	let gap = bg.gap * vp.scale;
	if gap < 4.0 {
		return;
	}
	let (x0, y0) = (vp.translation.x.rem_euclid(gap), vp.translation.y.rem_euclid(gap));
	ctx.set_fill_style_str(&bg.color);
	ctx.set_stroke_style_str(&bg.color);
	ctx.set_line_width(bg.size);

	match bg.variant {
		BackgroundVariant::Lines => {
			ctx.begin_path();
			let mut x = x0;
			while x <= frame.width {
				ctx.move_to(x, 0.0);
				ctx.line_to(x, frame.height);
				x += gap;
			}
			let mut y = y0;
			while y <= frame.height {
				ctx.move_to(0.0, y);
				ctx.line_to(frame.width, y);
				y += gap;
			}
			ctx.stroke();
		}
		BackgroundVariant::Dots | BackgroundVariant::Cross => {
			let arm = 3.0 * vp.scale;
			let radius = (bg.size * vp.scale).max(0.5);
			let mut y = y0;
			while y <= frame.height {
				let mut x = x0;
				while x <= frame.width {
					ctx.begin_path();
					if bg.variant == BackgroundVariant::Dots {
						let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
						ctx.fill();
					} else {
						ctx.move_to(x - arm, y);
						ctx.line_to(x + arm, y);
						ctx.move_to(x, y - arm);
						ctx.line_to(x, y + arm);
						ctx.stroke();
					}
					x += gap;
				}
				y += gap;
			}
		}
	}
}

fn bezier_path(ctx: &CanvasRenderingContext2d, c: &[Point; 4]) {
	ctx.begin_path();
	ctx.move_to(c[0].x, c[0].y);
	ctx.bezier_curve_to(c[1].x, c[1].y, c[2].x, c[2].y, c[3].x, c[3].y);
}

fn set_dash(ctx: &CanvasRenderingContext2d, dash: f64, gap: f64) {
	let _ = ctx.set_line_dash(&js_sys::Array::of2(
		&JsValue::from_f64(dash),
		&JsValue::from_f64(gap),
	));
}

fn clear_dash(ctx: &CanvasRenderingContext2d) {
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_edges(frame: &Frame, ctx: &CanvasRenderingContext2d) {
	let snap = &frame.snapshot;
	let focus = match frame.hovered {
		Some(PointerTarget::Node(n)) | Some(PointerTarget::Handle { node: n, .. }) => Some(n),
		_ => frame.mode.active_node(),
	};

	for edge in &snap.edges {
		let (Some(src), Some(tgt)) = (snap.node(edge.source), snap.node(edge.target)) else {
			continue;
		};
		let curve = edge_curve(
			handle_position(src, HandleKind::Source),
			handle_position(tgt, HandleKind::Target),
		);
		let active = frame.selection.edges.contains(&edge.id)
			|| frame.hovered == Some(PointerTarget::Edge(edge.id))
			|| focus.is_some_and(|n| edge.touches(n));

		ctx.set_stroke_style_str(if active { EDGE_ACTIVE } else { EDGE_STROKE });
		ctx.set_line_width(if active { 2.0 } else { 1.0 });
		if edge.payload.animated {
			set_dash(ctx, 5.0, 5.0);
			ctx.set_line_dash_offset(-(frame.flow_time * 30.0) % 10.0);
		}
		bezier_path(ctx, &curve);
		ctx.stroke();
		clear_dash(ctx);

		if let Some(label) = &edge.payload.label {
			let mid = bezier_point(&curve, 0.5);
			ctx.set_font(FONT);
			let w = ctx.measure_text(label).map(|m| m.width()).unwrap_or(0.0);
			ctx.set_fill_style_str(NODE_FILL);
			ctx.fill_rect(mid.x - w / 2.0 - 4.0, mid.y - 9.0, w + 8.0, 18.0);
			ctx.set_fill_style_str(NODE_STROKE);
			ctx.set_text_align("center");
			ctx.set_text_baseline("middle");
			let _ = ctx.fill_text(label, mid.x, mid.y);
		}
	}
}

fn draw_connection_line(frame: &Frame, ctx: &CanvasRenderingContext2d) {
	let InteractionMode::Connecting {
		from,
		handle,
		cursor,
	} = frame.mode
	else {
		return;
	};
	let Some(node) = frame.snapshot.node(from) else {
		return;
	};
	let start = handle_position(node, handle);
	let curve = match handle {
		HandleKind::Source => edge_curve(start, cursor),
		HandleKind::Target => edge_curve(cursor, start),
	};
	ctx.set_stroke_style_str(EDGE_STROKE);
	ctx.set_line_width(1.0);
	bezier_path(ctx, &curve);
	ctx.stroke();
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, r: &Rect, radius: f64) {
	let (x, y, w, h) = (r.x, r.y, r.width, r.height);
	ctx.begin_path();
	ctx.move_to(x + radius, y);
	let _ = ctx.arc_to(x + w, y, x + w, y + h, radius);
	let _ = ctx.arc_to(x + w, y + h, x, y + h, radius);
	let _ = ctx.arc_to(x, y + h, x, y, radius);
	let _ = ctx.arc_to(x, y, x + w, y, radius);
	ctx.close_path();
}

fn draw_nodes(frame: &Frame, ctx: &CanvasRenderingContext2d) {
	let dragging = match frame.mode {
		InteractionMode::Dragging { node, .. } => Some(node),
		_ => None,
	};
	// handles that would complete the connection in progress
	let wanted = match frame.mode {
		InteractionMode::Connecting { from, handle, .. } => Some((from, handle.opposite())),
		_ => None,
	};

	for node in &frame.snapshot.nodes {
		let r = node_rect(node);
		let selected = frame.selection.nodes.contains(&node.id);
		let hovered = frame.hovered == Some(PointerTarget::Node(node.id));

		if dragging == Some(node.id) {
			ctx.set_shadow_color("rgba(0, 0, 0, 0.25)");
			ctx.set_shadow_blur(8.0);
		}
		rounded_rect(ctx, &r, 3.0);
		ctx.set_fill_style_str(NODE_FILL);
		ctx.fill();
		ctx.set_shadow_blur(0.0);
		ctx.set_stroke_style_str(NODE_STROKE);
		ctx.set_line_width(if selected { 2.0 } else if hovered { 1.5 } else { 1.0 });
		ctx.stroke();

		ctx.set_fill_style_str(NODE_STROKE);
		ctx.set_font(FONT);
		ctx.set_text_align("center");
		ctx.set_text_baseline("middle");
		let c = r.center();
		let _ = ctx.fill_text(node.payload.label(), c.x, c.y);

		for kind in [HandleKind::Target, HandleKind::Source] {
			if !node.payload.has_handle(kind) {
				continue;
			}
			let p = handle_position(node, kind);
			let valid = wanted.is_some_and(|(from, k)| from != node.id && k == kind);
			let radius = if valid { HANDLE_RADIUS * 1.5 } else { HANDLE_RADIUS };
			ctx.begin_path();
			let _ = ctx.arc(p.x, p.y, radius, 0.0, 2.0 * PI);
			ctx.set_fill_style_str(if valid { VALID_HANDLE } else { HANDLE_FILL });
			ctx.fill();
			ctx.set_stroke_style_str(NODE_FILL);
			ctx.set_line_width(1.0);
			ctx.stroke();
		}
	}
}
