use leptos::prelude::*;

use crate::components::flow::{
	BackgroundConfig, ControlsConfig, EdgePayload, FlowCanvas, FlowData, FlowEdge, FlowNode,
	NodePayload, Point,
};

/// Starter graph shown on first load.
fn sample_data() -> FlowData {
	let node = |key: &str, x: f64, y: f64, payload: NodePayload| FlowNode {
		key: key.into(),
		position: Point::new(x, y),
		payload,
	};
	let edge = |source: &str, target: &str, animated: bool| FlowEdge {
		source: source.into(),
		target: target.into(),
		payload: EdgePayload {
			label: None,
			animated,
		},
	};

	FlowData {
		nodes: vec![
			node("input", 250.0, 0.0, NodePayload::input("Input")),
			node("a", 100.0, 120.0, NodePayload::default_node("Default A")),
			node("b", 400.0, 120.0, NodePayload::default_node("Default B")),
			node("output", 250.0, 260.0, NodePayload::output("Output")),
		],
		edges: vec![
			edge("input", "a", false),
			edge("input", "b", true),
			edge("a", "output", false),
		],
	}
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let graph_data = Signal::derive(sample_data);

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="h-screen w-screen" style="width: 100vw; height: 100vh;">
				<FlowCanvas
					data=graph_data
					fullscreen=true
					background=Some(BackgroundConfig::default())
					controls=Some(ControlsConfig::default())
				/>
			</div>
		</ErrorBoundary>
	}
}
