use glam::Vec2;
use serde::{Deserialize, Serialize};
use shatter_core::math::{point_in_polygon, signed_area, Aabb2};

/// Authored model-space polygon that pins any terrain overlapping it to
/// the static group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    points: Vec<Vec2>,
    #[serde(skip, default = "empty_bounds")]
    bounds: Aabb2,
}

fn empty_bounds() -> Aabb2 {
    Aabb2::EMPTY
}

impl Anchor {
    /// Build an anchor from a closed contour. Returns None for contours with
    /// fewer than three points or no area.
    pub fn new(points: Vec<Vec2>) -> Option<Self> {
        if points.len() < 3 || signed_area(&points).abs() <= f32::EPSILON {
            return None;
        }
        let bounds = Aabb2::from_points(points.iter().copied());
        Some(Self { points, bounds })
    }

    /// Axis-aligned rectangular anchor.
    pub fn rect(min: Vec2, max: Vec2) -> Option<Self> {
        Self::new(vec![
            min,
            Vec2::new(max.x, min.y),
            max,
            Vec2::new(min.x, max.y),
        ])
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn bounds(&self) -> Aabb2 {
        if self.bounds.is_empty() {
            Aabb2::from_points(self.points.iter().copied())
        } else {
            self.bounds
        }
    }

    /// Whether a model-space point lies inside the contour.
    pub fn contains(&self, p: Vec2) -> bool {
        self.bounds().contains(p) && point_in_polygon(p, &self.points)
    }
}
