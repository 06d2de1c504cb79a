use kurbo::Shape as _;

use crate::foundation::core::{BezPath, Point, Rect};

/// Flattening tolerance for arcs, in pixels.
pub const PATH_TOLERANCE: f64 = 0.05;

/// Clamp a corner radius so that `2 * radius <= min(width, height)`.
///
/// Oversized radii are silently reduced; negative or NaN radii become 0.
pub fn clamp_radius(width: f64, height: f64, radius: f64) -> f64 {
    let limit = (width.min(height) / 2.0).max(0.0);
    if radius.is_nan() {
        return 0.0;
    }
    radius.min(limit).max(0.0)
}

/// Rounded rectangle outline with a clamped radius.
pub fn rounded_rect_path(rect: Rect, radius: f64) -> BezPath {
    let rect = rect.abs();
    let r = clamp_radius(rect.width(), rect.height(), radius);
    if r == 0.0 {
        return rect.to_path(PATH_TOLERANCE);
    }
    kurbo::RoundedRect::from_rect(rect, r).to_path(PATH_TOLERANCE)
}

/// Full circle.
pub fn circle_path(center: Point, radius: f64) -> BezPath {
    kurbo::Circle::new(center, radius.max(0.0)).to_path(PATH_TOLERANCE)
}

#[cfg(test)]
#[path = "../../tests/unit/compile/geometry.rs"]
mod tests;
