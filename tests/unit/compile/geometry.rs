use kurbo::Shape;

use super::*;

#[test]
fn clamp_radius_limits_to_half_shorter_side() {
    assert_eq!(clamp_radius(100.0, 40.0, 10.0), 10.0);
    assert_eq!(clamp_radius(100.0, 40.0, 30.0), 20.0);
    assert_eq!(clamp_radius(40.0, 100.0, 1e9), 20.0);
    assert_eq!(clamp_radius(10.0, 10.0, -3.0), 0.0);
    assert_eq!(clamp_radius(10.0, 10.0, f64::NAN), 0.0);
    assert_eq!(clamp_radius(0.0, 10.0, 5.0), 0.0);
}

#[test]
fn rounded_rect_path_stays_inside_rect() {
    let rect = Rect::new(2.0, 2.0, 228.0, 228.0);
    let path = rounded_rect_path(rect, 20.0);
    let bb = path.bounding_box();
    assert!((bb.x0 - rect.x0).abs() < 1e-6);
    assert!((bb.y1 - rect.y1).abs() < 1e-6);
    // Corner is cut away.
    assert!(!path.contains(Point::new(2.5, 2.5)));
    assert!(path.contains(Point::new(115.0, 115.0)));
}

#[test]
fn oversized_radius_degrades_to_stadium_not_error() {
    let rect = Rect::new(0.0, 0.0, 100.0, 20.0);
    let path = rounded_rect_path(rect, 500.0);
    let bb = path.bounding_box();
    assert!((bb.width() - 100.0).abs() < 1e-6);
    assert!((bb.height() - 20.0).abs() < 1e-6);
    assert!(path.contains(Point::new(50.0, 10.0)));
}

#[test]
fn zero_radius_is_plain_rect() {
    let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
    let path = rounded_rect_path(rect, 0.0);
    assert!(path.contains(Point::new(0.1, 0.1)));
}

#[test]
fn circle_path_has_requested_extent() {
    let c = Point::new(115.0, 115.0);
    let path = circle_path(c, 29.5);
    let bb = path.bounding_box();
    assert!((bb.width() - 59.0).abs() < 1e-6);
    assert!((bb.center() - c).hypot() < 1e-6);
}
