//! Pan/zoom transform between canvas and screen coordinates.
//!
//! `screen = canvas * scale + translation`, so
//! `canvas = (screen - translation) / scale`.

use super::config::ViewportConfig;
use super::error::{FlowError, FlowResult};
use super::types::{Point, Rect, Size};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
	pub translation: Point,
	pub scale: f64,
}

impl Default for Viewport {
	fn default() -> Self {
		Self {
			translation: Point::default(),
			scale: 1.0,
		}
	}
}

impl Viewport {
	pub fn to_canvas(&self, screen: Point) -> Point {
		Point::new(
			(screen.x - self.translation.x) / self.scale,
			(screen.y - self.translation.y) / self.scale,
		)
	}

	pub fn to_screen(&self, canvas: Point) -> Point {
		Point::new(
			canvas.x * self.scale + self.translation.x,
			canvas.y * self.scale + self.translation.y,
		)
	}
}

#[derive(Clone, Debug)]
pub struct ViewportController {
	viewport: Viewport,
	min_scale: f64,
	max_scale: f64,
	initial: Viewport,
}

impl Default for ViewportController {
	fn default() -> Self {
		let config = ViewportConfig::default();
		Self {
			viewport: config.initial,
			min_scale: config.min_scale,
			max_scale: config.max_scale,
			initial: config.initial,
		}
	}
}

impl ViewportController {
	/// Fails with `OutOfRange` when the bounds are not `0 < min <= max`.
	/// The initial scale is clamped into the bounds.
	pub fn new(config: &ViewportConfig) -> FlowResult<Self> {
		let (min, max) = (config.min_scale, config.max_scale);
		if !(min.is_finite() && max.is_finite() && min > 0.0 && min <= max) {
			return Err(FlowError::OutOfRange {
				value: min,
				min: f64::MIN_POSITIVE,
				max,
			});
		}
		let initial = Viewport {
			translation: config.initial.translation,
			scale: config.initial.scale.clamp(min, max),
		};
		Ok(Self {
			viewport: initial,
			min_scale: min,
			max_scale: max,
			initial,
		})
	}

	pub fn viewport(&self) -> Viewport {
		self.viewport
	}

	pub fn scale(&self) -> f64 {
		self.viewport.scale
	}

	pub fn translation(&self) -> Point {
		self.viewport.translation
	}

	pub fn scale_bounds(&self) -> (f64, f64) {
		(self.min_scale, self.max_scale)
	}

	pub fn pan(&mut self, dx: f64, dy: f64) {
		self.viewport.translation = self.viewport.translation + Point::new(dx, dy);
	}

	pub fn set_translation(&mut self, translation: Point) {
		self.viewport.translation = translation;
	}

	/// Replaces the whole view, clamping its scale into the bounds.
	pub fn set_viewport(&mut self, viewport: Viewport) {
		self.viewport = Viewport {
			translation: viewport.translation,
			scale: viewport.scale.clamp(self.min_scale, self.max_scale),
		};
	}

	/// Multiplies the scale by `factor`, keeping the canvas point under
	/// `anchor` (screen units) fixed.
	///
	/// The resulting scale is clamped to the configured bounds. Only an
	/// unusable factor (zero, negative, NaN or infinite) is rejected with
	/// `OutOfRange`. Returns the applied scale.
	pub fn zoom(&mut self, factor: f64, anchor: Point) -> FlowResult<f64> {
		if !(factor.is_finite() && factor > 0.0) {
			return Err(FlowError::OutOfRange {
				value: factor,
				min: 0.0,
				max: f64::INFINITY,
			});
		}
		self.zoom_to(self.viewport.scale * factor, anchor)
	}

	/// Sets an absolute scale anchored at `anchor`, clamped like [`Self::zoom`].
	pub fn zoom_to(&mut self, scale: f64, anchor: Point) -> FlowResult<f64> {
		if !(scale.is_finite() && scale > 0.0) || !anchor.is_finite() {
			return Err(FlowError::OutOfRange {
				value: scale,
				min: self.min_scale,
				max: self.max_scale,
			});
		}
		let new_scale = scale.clamp(self.min_scale, self.max_scale);
		let ratio = new_scale / self.viewport.scale;
		let t = self.viewport.translation;
		self.viewport.translation = Point::new(
			anchor.x - (anchor.x - t.x) * ratio,
			anchor.y - (anchor.y - t.y) * ratio,
		);
		self.viewport.scale = new_scale;
		Ok(new_scale)
	}

	/// Centers `bounds` (canvas units) in a screen area of `screen` size,
	/// leaving `padding` of the bounds as margin on each side.
	pub fn fit_view(&mut self, bounds: Rect, screen: Size, padding: f64) -> FlowResult<()> {
		if !(screen.width > 0.0 && screen.height > 0.0) {
			return Err(FlowError::OutOfRange {
				value: screen.width.min(screen.height),
				min: f64::MIN_POSITIVE,
				max: f64::INFINITY,
			});
		}
		let grow = 1.0 + 2.0 * padding.max(0.0);
		let (w, h) = (bounds.width.max(1.0) * grow, bounds.height.max(1.0) * grow);
		let scale = (screen.width / w)
			.min(screen.height / h)
			.clamp(self.min_scale, self.max_scale);
		let c = bounds.center();
		self.viewport = Viewport {
			translation: Point::new(
				screen.width / 2.0 - c.x * scale,
				screen.height / 2.0 - c.y * scale,
			),
			scale,
		};
		Ok(())
	}

	pub fn reset(&mut self) {
		self.viewport = self.initial;
	}

	pub fn to_canvas(&self, screen: Point) -> Point {
		self.viewport.to_canvas(screen)
	}

	pub fn to_screen(&self, canvas: Point) -> Point {
		self.viewport.to_screen(canvas)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn close(a: Point, b: Point) -> bool {
		a.distance(b) < 1e-9
	}

	#[test]
	fn zoom_to_cursor_from_identity() {
		let mut vc = ViewportController::default();
		let applied = vc.zoom(2.0, Point::new(50.0, 50.0)).unwrap();
		assert_eq!(applied, 2.0);
		assert_eq!(vc.scale(), 2.0);
		assert_eq!(vc.translation(), Point::new(-50.0, -50.0));
	}

	#[test]
	fn zoom_clamps_to_bounds() {
		let mut vc = ViewportController::default();
		assert_eq!(vc.zoom(100.0, Point::default()).unwrap(), 2.0);
		assert_eq!(vc.zoom(0.0001, Point::default()).unwrap(), 0.5);
	}

	#[test]
	fn zoom_rejects_degenerate_factors() {
		let mut vc = ViewportController::default();
		for factor in [0.0, -1.0, f64::NAN, f64::INFINITY] {
			assert!(matches!(
				vc.zoom(factor, Point::default()),
				Err(FlowError::OutOfRange { .. })
			));
		}
		assert_eq!(vc.viewport(), Viewport::default());
	}

	#[test]
	fn anchor_stays_put_when_clamped() {
		let mut vc = ViewportController::default();
		vc.pan(13.0, -7.0);
		let anchor = Point::new(120.0, 40.0);
		let under = vc.to_canvas(anchor);
		vc.zoom(50.0, anchor).unwrap();
		assert!(close(vc.to_screen(under), anchor));
	}

	#[test]
	fn pan_accumulates() {
		let mut vc = ViewportController::default();
		vc.pan(10.0, 5.0);
		vc.pan(-3.0, 5.0);
		assert_eq!(vc.translation(), Point::new(7.0, 10.0));
	}

	#[test]
	fn invalid_bounds_are_rejected() {
		let config = ViewportConfig {
			min_scale: 0.0,
			..ViewportConfig::default()
		};
		assert!(ViewportController::new(&config).is_err());
		let config = ViewportConfig {
			min_scale: 3.0,
			max_scale: 1.0,
			..ViewportConfig::default()
		};
		assert!(ViewportController::new(&config).is_err());
	}

	#[test]
	fn fit_view_centers_bounds() {
		let mut vc = ViewportController::default();
		let bounds = Rect::new(Point::new(100.0, 100.0), Size::new(200.0, 100.0));
		vc.fit_view(bounds, Size::new(800.0, 600.0), 0.0).unwrap();
		assert_eq!(vc.scale(), 2.0);
		assert!(close(vc.to_screen(bounds.center()), Point::new(400.0, 300.0)));
	}

	#[test]
	fn zoom_to_sets_absolute_scale_around_anchor() {
		let mut vc = ViewportController::default();
		vc.pan(20.0, 10.0);
		let anchor = Point::new(200.0, 150.0);
		let under = vc.to_canvas(anchor);

		assert_eq!(vc.zoom_to(1.5, anchor).unwrap(), 1.5);
		assert_eq!(vc.scale(), 1.5);
		assert!(close(vc.to_screen(under), anchor));

		assert_eq!(vc.zoom_to(10.0, anchor).unwrap(), 2.0);
		assert!(close(vc.to_screen(under), anchor));
		assert!(matches!(
			vc.zoom_to(-1.0, anchor),
			Err(FlowError::OutOfRange { .. })
		));
		assert!(vc.zoom_to(1.0, Point::new(f64::NAN, 0.0)).is_err());
		assert_eq!(vc.scale(), 2.0);
	}

	#[test]
	fn set_viewport_clamps_scale() {
		let mut vc = ViewportController::default();
		vc.set_viewport(Viewport {
			translation: Point::new(3.0, 4.0),
			scale: 9.0,
		});
		assert_eq!(vc.scale(), 2.0);
		assert_eq!(vc.translation(), Point::new(3.0, 4.0));
	}

	#[test]
	fn reset_restores_initial() {
		let mut vc = ViewportController::default();
		vc.pan(5.0, 5.0);
		vc.zoom(1.5, Point::new(1.0, 1.0)).unwrap();
		vc.reset();
		assert_eq!(vc.viewport(), Viewport::default());
	}
}
