//! Canvas configuration. Every struct has usable defaults so a bare
//! `<FlowCanvas />` behaves like the stock widget.

use super::viewport::Viewport;

#[derive(Clone, Debug, PartialEq)]
pub struct ViewportConfig {
	pub min_scale: f64,
	pub max_scale: f64,
	/// Multiplier applied per wheel notch or zoom button press.
	pub zoom_step: f64,
	pub initial: Viewport,
	/// Fraction of the fitted bounds added as margin on each side.
	pub fit_padding: f64,
}

impl Default for ViewportConfig {
	fn default() -> Self {
		Self {
			min_scale: 0.5,
			max_scale: 2.0,
			zoom_step: 1.2,
			initial: Viewport::default(),
			fit_padding: 0.1,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct FlowConfig {
	pub viewport: ViewportConfig,
	/// Background drags pan only with a modifier key or the middle button.
	pub pan_requires_modifier: bool,
	/// Dragged positions round to this step when set.
	pub snap_grid: Option<f64>,
	/// Keys (as reported by `KeyboardEvent.key`) that delete the selection.
	pub delete_keys: Vec<String>,
	/// Keys that cancel the current interaction.
	pub cancel_keys: Vec<String>,
	/// Relaxation steps run by auto layout.
	pub layout_steps: usize,
}

impl Default for FlowConfig {
	fn default() -> Self {
		Self {
			viewport: ViewportConfig::default(),
			pan_requires_modifier: true,
			snap_grid: None,
			delete_keys: vec!["Delete".into(), "Backspace".into()],
			cancel_keys: vec!["Escape".into()],
			layout_steps: 300,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackgroundVariant {
	Dots,
	Lines,
	Cross,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BackgroundConfig {
	pub variant: BackgroundVariant,
	/// Grid spacing in canvas units.
	pub gap: f64,
	/// Dot radius or line/cross stroke width, in screen pixels.
	pub size: f64,
	pub color: String,
	pub fill: String,
}

impl Default for BackgroundConfig {
	fn default() -> Self {
		Self {
			variant: BackgroundVariant::Dots,
			gap: 20.0,
			size: 1.0,
			color: "#91919a".into(),
			fill: "#ffffff".into(),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControlsConfig {
	pub show_zoom: bool,
	pub show_fit_view: bool,
	pub show_interactive: bool,
	pub show_layout: bool,
}

impl Default for ControlsConfig {
	fn default() -> Self {
		Self {
			show_zoom: true,
			show_fit_view: true,
			show_interactive: true,
			show_layout: true,
		}
	}
}
