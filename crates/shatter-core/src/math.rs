use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb2 {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb2 {
    /// An inverted box that any `include` call will replace.
    pub const EMPTY: Aabb2 = Aabb2 {
        min: Vec2::new(f32::INFINITY, f32::INFINITY),
        max: Vec2::new(f32::NEG_INFINITY, f32::NEG_INFINITY),
    };

    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Smallest box holding every point. Empty input yields `EMPTY`.
    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Self {
        let mut aabb = Self::EMPTY;
        for p in points {
            aabb.include(p);
        }
        aabb
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn include(&mut self, p: Vec2) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(&self, other: &Aabb2) -> Aabb2 {
        Aabb2::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Grow the box by `margin` on every side.
    pub fn expanded(&self, margin: f32) -> Aabb2 {
        Aabb2::new(self.min - Vec2::splat(margin), self.max + Vec2::splat(margin))
    }

    pub fn intersects(&self, other: &Aabb2) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Overlapping region, or `None` when the boxes are disjoint.
    pub fn intersection(&self, other: &Aabb2) -> Option<Aabb2> {
        if !self.intersects(other) {
            return None;
        }
        Some(Aabb2::new(self.min.max(other.min), self.max.min(other.max)))
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

/// Rigid 2-D transform: rotate by `angle` (radians, counter-clockwise),
/// then translate by `position`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform2 {
    pub position: Vec2,
    pub angle: f32,
}

impl Transform2 {
    pub const IDENTITY: Transform2 = Transform2 {
        position: Vec2::ZERO,
        angle: 0.0,
    };

    pub fn new(position: Vec2, angle: f32) -> Self {
        Self { position, angle }
    }

    pub fn rotation(&self) -> Vec2 {
        Vec2::from_angle(self.angle)
    }

    /// Map a local point into the parent frame.
    pub fn apply(&self, p: Vec2) -> Vec2 {
        self.rotation().rotate(p) + self.position
    }

    /// Map a parent-frame point back into the local frame.
    pub fn apply_inverse(&self, p: Vec2) -> Vec2 {
        Vec2::from_angle(-self.angle).rotate(p - self.position)
    }

    /// Rotate a direction without translating it.
    pub fn rotate(&self, v: Vec2) -> Vec2 {
        self.rotation().rotate(v)
    }
}

/// Shortest distance from `p` to the segment `a`-`b`.
pub fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Perpendicular distance from `p` to the infinite line through `a`-`b`.
pub fn distance_to_line(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len = ab.length();
    if len <= f32::EPSILON {
        return p.distance(a);
    }
    ab.perp_dot(p - a).abs() / len
}

/// Whether segments `a`-`b` and `c`-`d` intersect, touching included.
pub fn segments_intersect(a: Vec2, b: Vec2, c: Vec2, d: Vec2) -> bool {
    let d1 = (b - a).perp_dot(c - a);
    let d2 = (b - a).perp_dot(d - a);
    let d3 = (d - c).perp_dot(a - c);
    let d4 = (d - c).perp_dot(b - c);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(a, b, c))
        || (d2 == 0.0 && on_segment(a, b, d))
        || (d3 == 0.0 && on_segment(c, d, a))
        || (d4 == 0.0 && on_segment(c, d, b))
}

/// Whether `p`, already known to be collinear with `a`-`b`, lies within it.
fn on_segment(a: Vec2, b: Vec2, p: Vec2) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Signed area of a closed polygon. Positive for counter-clockwise winding
/// (y up).
pub fn signed_area(points: &[Vec2]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        sum += a.perp_dot(b);
    }
    sum * 0.5
}

/// Area of the triangle `a`, `b`, `c` (always non-negative).
pub fn triangle_area(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - a).abs() * 0.5
}

/// Even-odd point-in-polygon test.
pub fn point_in_polygon(p: Vec2, polygon: &[Vec2]) -> bool {
    let mut inside = false;
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_to_segment_endpoints_and_interior() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(4.0, 0.0);
        assert!((distance_to_segment(Vec2::new(2.0, 3.0), a, b) - 3.0).abs() < 1e-6);
        assert!((distance_to_segment(Vec2::new(-3.0, 4.0), a, b) - 5.0).abs() < 1e-6);
        assert!((distance_to_segment(Vec2::new(1.0, 1.0), a, a) - 2f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_distance_to_line_ignores_extent() {
        let d = distance_to_line(Vec2::new(10.0, 2.0), Vec2::ZERO, Vec2::X);
        assert!((d - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_segments_intersect() {
        let o = Vec2::ZERO;
        assert!(segments_intersect(o, Vec2::new(2.0, 2.0), Vec2::new(0.0, 2.0), Vec2::new(2.0, 0.0)));
        assert!(!segments_intersect(o, Vec2::X, Vec2::new(0.0, 1.0), Vec2::new(1.0, 1.0)));
        // Touching at an endpoint counts.
        assert!(segments_intersect(o, Vec2::X, Vec2::X, Vec2::new(1.0, 5.0)));
    }

    #[test]
    fn test_signed_area_winding() {
        let ccw = [Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y];
        assert!((signed_area(&ccw) - 1.0).abs() < 1e-6);
        let cw: Vec<Vec2> = ccw.iter().rev().copied().collect();
        assert!((signed_area(&cw) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_point_in_polygon() {
        let square = [Vec2::ZERO, Vec2::new(2.0, 0.0), Vec2::new(2.0, 2.0), Vec2::new(0.0, 2.0)];
        assert!(point_in_polygon(Vec2::ONE, &square));
        assert!(!point_in_polygon(Vec2::new(3.0, 1.0), &square));
    }

    #[test]
    fn test_transform_inverse() {
        let t = Transform2::new(Vec2::new(3.0, -1.0), 0.7);
        let p = Vec2::new(1.5, 2.5);
        let back = t.apply_inverse(t.apply(p));
        assert!(back.distance(p) < 1e-5, "{back:?} != {p:?}");
    }

    #[test]
    fn test_aabb_intersection() {
        let a = Aabb2::new(Vec2::ZERO, Vec2::splat(2.0));
        let b = Aabb2::new(Vec2::ONE, Vec2::splat(3.0));
        let c = Aabb2::new(Vec2::splat(5.0), Vec2::splat(6.0));
        assert_eq!(a.intersection(&b), Some(Aabb2::new(Vec2::ONE, Vec2::splat(2.0))));
        assert!(a.intersection(&c).is_none());
        assert!(Aabb2::from_points(std::iter::empty()).is_empty());
    }
}
