//! Geometry helpers shared by selection, manipulation and rendering

use std::ops::{Add, Mul, Sub};

/// Point or displacement in scene units (capture pixels)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Point) -> f64 {
        (self - other).length()
    }

    /// Angle of this vector in degrees, measured with `atan2`
    pub fn angle_degrees(self) -> f64 {
        self.y.atan2(self.x).to_degrees()
    }

    /// Rotate about `center` by `degrees` (clockwise on screen, y down)
    pub fn rotate_about(self, center: Point, degrees: f64) -> Point {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let d = self - center;
        Point::new(
            center.x + d.x * cos - d.y * sin,
            center.y + d.x * sin + d.y * cos,
        )
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in scene units
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }
}

/// Axis-aligned rectangle spanned by two corner points, in either order
pub fn normalize_rect(a: Point, b: Point) -> Bounds {
    Bounds {
        x: a.x.min(b.x),
        y: a.y.min(b.y),
        width: (a.x - b.x).abs(),
        height: (a.y - b.y).abs(),
    }
}

/// Displacement below which no lock axis is chosen
pub const AXIS_LOCK_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Axis of greater absolute displacement, once past the threshold
pub fn dominant_axis(delta: Point) -> Option<Axis> {
    if delta.x.abs().max(delta.y.abs()) < AXIS_LOCK_THRESHOLD {
        return None;
    }
    if delta.x.abs() > delta.y.abs() {
        Some(Axis::Horizontal)
    } else {
        Some(Axis::Vertical)
    }
}

/// Sticky axis lock for one gesture.
///
/// The axis is decided on the first displacement past the threshold and is
/// never re-evaluated afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisLock {
    axis: Option<Axis>,
}

impl AxisLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn axis(&self) -> Option<Axis> {
        self.axis
    }

    /// Decide the axis from the displacement since gesture start
    pub fn update(&mut self, delta: Point) -> Option<Axis> {
        if self.axis.is_none() {
            self.axis = dominant_axis(delta);
        }
        self.axis
    }

    /// Snap `p` onto the locked axis through `anchor`
    pub fn constrain(&self, anchor: Point, p: Point) -> Point {
        match self.axis {
            Some(Axis::Horizontal) => Point::new(p.x, anchor.y),
            Some(Axis::Vertical) => Point::new(anchor.x, p.y),
            None => p,
        }
    }
}

/// Two wing endpoints of an arrow head drawn at `end`.
///
/// Head length is `max(12, thickness * 4)` and the wings spread 0.6 × length
/// in total across the shaft. Shorter than a pixel collapses both wings to
/// `end`.
pub fn arrow_head(start: Point, end: Point, thickness: f64) -> (Point, Point) {
    let shaft = end - start;
    let len = shaft.length();
    if len < 1.0 {
        return (end, end);
    }

    let head_length = (thickness * 4.0).max(12.0);
    let half_width = 0.6 * head_length / 2.0;
    let dir = shaft * (1.0 / len);
    let perp = Point::new(-dir.y, dir.x);
    let base = end - dir * head_length;

    (base + perp * half_width, base - perp * half_width)
}

/// Shortest distance from `p` to the segment `a`-`b`
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = (((p - a).x * ab.x + (p - a).y * ab.y) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn normalize_rect_is_order_independent() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(10.0, -5.0),
            Point::new(-3.5, 7.25),
            Point::new(10.0, 10.0),
        ];
        for a in points {
            for b in points {
                assert_eq!(normalize_rect(a, b), normalize_rect(b, a));
            }
        }
        assert_eq!(
            normalize_rect(Point::new(10.0, 2.0), Point::new(4.0, 8.0)),
            Bounds::new(4.0, 2.0, 6.0, 6.0)
        );
    }

    #[test]
    fn axis_lock_waits_for_threshold() {
        let mut lock = AxisLock::new();
        assert_eq!(lock.update(Point::new(3.0, 1.0)), None);
        assert_eq!(lock.update(Point::new(6.0, 2.0)), Some(Axis::Horizontal));
    }

    #[test]
    fn axis_lock_is_sticky() {
        let mut lock = AxisLock::new();
        assert_eq!(lock.update(Point::new(1.0, 9.0)), Some(Axis::Vertical));
        assert_eq!(lock.update(Point::new(80.0, 2.0)), Some(Axis::Vertical));
        let snapped = lock.constrain(Point::new(5.0, 5.0), Point::new(80.0, 2.0));
        assert_eq!(snapped, Point::new(5.0, 2.0));
    }

    #[test]
    fn arrow_head_wings_are_symmetric() {
        let (left, right) = arrow_head(Point::new(0.0, 0.0), Point::new(100.0, 0.0), 3.0);
        // length = max(12, 12) = 12, half width = 3.6
        assert!(close(left.x, 88.0) && close(right.x, 88.0));
        assert!(close(left.y, 3.6) && close(right.y, -3.6));
    }

    #[test]
    fn arrow_head_scales_with_thickness() {
        let (left, _) = arrow_head(Point::new(0.0, 0.0), Point::new(0.0, 100.0), 10.0);
        // length = 40, half width = 12, perpendicular of (0,1) is (-1,0)
        assert!(close(left.x, -12.0));
        assert!(close(left.y, 60.0));
    }

    #[test]
    fn arrow_head_collapses_when_degenerate() {
        let end = Point::new(5.0, 5.0);
        assert_eq!(arrow_head(Point::new(5.4, 5.4), end, 3.0), (end, end));
    }

    #[test]
    fn rotate_about_quarter_turn() {
        let p = Point::new(10.0, 0.0).rotate_about(Point::new(0.0, 0.0), 90.0);
        assert!(close(p.x, 0.0) && close(p.y, 10.0));
    }

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!(close(distance_to_segment(Point::new(5.0, 3.0), a, b), 3.0));
        assert!(close(distance_to_segment(Point::new(13.0, 4.0), a, b), 5.0));
    }
}
