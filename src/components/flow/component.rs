use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::error;
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent, Window,
};

use super::config::{BackgroundConfig, ControlsConfig, FlowConfig};
use super::interaction::{Modifiers, PointerButton};
use super::render::{CanvasRenderer, RenderAdapter};
use super::state::FlowState;
use super::types::{FlowData, Point};

type Shared = Rc<RefCell<Option<FlowState>>>;

fn modifiers(ev: &MouseEvent) -> Modifiers {
	Modifiers {
		shift: ev.shift_key(),
		ctrl: ev.ctrl_key(),
		alt: ev.alt_key(),
		meta: ev.meta_key(),
	}
}

fn local_point(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> Point {
	let rect = canvas.get_bounding_client_rect();
	Point::new(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

/// Node-graph canvas with optional background grid and pan/zoom controls.
#[component]
pub fn FlowCanvas(
	#[prop(into)] data: Signal<FlowData>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
	#[prop(default = FlowConfig::default())] config: FlowConfig,
	#[prop(default = Some(BackgroundConfig::default()))] background: Option<BackgroundConfig>,
	#[prop(default = Some(ControlsConfig::default()))] controls: Option<ControlsConfig>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: Shared = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (state_init, animate_init, resize_cb_init) =
		(state.clone(), animate.clone(), resize_cb.clone());
	let locked = RwSignal::new(false);

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			error!("no window; canvas not started");
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((800.0, 600.0))
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			error!("2d context unavailable");
			return;
		};
		let renderer = CanvasRenderer::new(ctx, background.clone());
		let mut flow = match FlowState::new(&data.get(), config.clone(), w, h) {
			Ok(flow) => flow,
			Err(e) => {
				error!("invalid canvas configuration: {e}");
				return;
			}
		};
		flow.measure_nodes(&renderer);
		flow.fit_view();
		*state_init.borrow_mut() = Some(flow);

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (state_anim, animate_inner) = (state_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				s.tick(0.016);
				let animated = s.model.edges().any(|e| e.payload.animated);
				if s.take_dirty() || animated {
					s.measure_nodes(&renderer);
					renderer.render(&s.frame());
					// sizing above marks dirty again
					s.take_dirty();
				}
			}
			if let (Some(win), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let _ = canvas.focus();
		let p = local_point(&canvas, &ev);
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.pointer_down(p, PointerButton::from_dom(ev.button()), modifiers(&ev));
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let p = local_point(&canvas.into(), &ev);
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			s.pointer_move(p, modifiers(&ev));
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let p = local_point(&canvas.into(), &ev);
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			s.pointer_up(p, modifiers(&ev));
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.pointer_leave();
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let p = local_point(&canvas.into(), &ev);
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			s.wheel(p, ev.delta_y());
		}
	};

	let state_kd = state.clone();
	let on_keydown = move |ev: KeyboardEvent| {
		if let Some(ref mut s) = *state_kd.borrow_mut() {
			if s.key(&ev.key()) {
				ev.prevent_default();
			}
		}
	};

	let controls_view = controls.map(|c| {
		let (s_in, s_out, s_fit, s_lock, s_layout) = (
			state.clone(),
			state.clone(),
			state.clone(),
			state.clone(),
			state.clone(),
		);
		view! {
			<div class="flow-controls" style="position: absolute; left: 15px; bottom: 15px; display: flex; flex-direction: column; box-shadow: 0 0 2px 1px rgba(0, 0, 0, 0.08);">
				{c.show_zoom.then(|| view! {
					<button title="zoom in" on:click=move |_| {
						if let Some(ref mut s) = *s_in.borrow_mut() { s.zoom_in(); }
					}>"+"</button>
					<button title="zoom out" on:click=move |_| {
						if let Some(ref mut s) = *s_out.borrow_mut() { s.zoom_out(); }
					}>"−"</button>
				})}
				{c.show_fit_view.then(|| view! {
					<button title="fit view" on:click=move |_| {
						if let Some(ref mut s) = *s_fit.borrow_mut() { s.fit_view(); }
					}>"⛶"</button>
				})}
				{c.show_interactive.then(|| view! {
					<button title="toggle interactivity" on:click=move |_| {
						if let Some(ref mut s) = *s_lock.borrow_mut() {
							locked.set(!s.toggle_interactive());
						}
					}>{move || if locked.get() { "🔒" } else { "🔓" }}</button>
				})}
				{c.show_layout.then(|| view! {
					<button title="auto layout" on:click=move |_| {
						if let Some(ref mut s) = *s_layout.borrow_mut() { s.auto_layout(); }
					}>"⟲"</button>
				})}
			</div>
		}
	});

	view! {
		<div class="flow-canvas" style="position: relative; width: 100%; height: 100%;">
			<canvas
				node_ref=canvas_ref
				tabindex="0"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				on:keydown=on_keydown
				style="display: block; outline: none; cursor: default;"
			/>
			{controls_view}
		</div>
	}
}
