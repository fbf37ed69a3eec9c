//! Mass, centroid and rotational inertia of triangle sets.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use shatter_core::math::triangle_area;

use crate::triangulate::Triangle;

/// Aggregate mass properties. `inertia` is about `centroid`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MassProperties {
    pub mass: f32,
    pub area: f32,
    pub centroid: Vec2,
    pub inertia: f32,
}

impl MassProperties {
    pub fn is_empty(&self) -> bool {
        self.mass <= 0.0
    }
}

/// Running sums over triangles, each with its own density.
#[derive(Debug, Clone, Copy, Default)]
pub struct MassAccumulator {
    mass: f64,
    area: f64,
    first_moment: [f64; 2],
    // About the origin.
    inertia: f64,
}

impl MassAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_triangle(&mut self, tri: &Triangle, density: f32) {
        let area = triangle_area(tri[0], tri[1], tri[2]) as f64;
        if area <= 0.0 {
            return;
        }
        let mass = area * density as f64;
        let c = (tri[0] + tri[1] + tri[2]) / 3.0;
        let (cx, cy) = (c.x as f64, c.y as f64);

        let sides = tri[0].distance_squared(tri[1])
            + tri[1].distance_squared(tri[2])
            + tri[2].distance_squared(tri[0]);
        let own = mass * sides as f64 / 36.0;

        self.mass += mass;
        self.area += area;
        self.first_moment[0] += mass * cx;
        self.first_moment[1] += mass * cy;
        self.inertia += own + mass * (cx * cx + cy * cy);
    }

    pub fn add_triangles<'a>(&mut self, tris: impl IntoIterator<Item = &'a Triangle>, density: f32) {
        for tri in tris {
            self.add_triangle(tri, density);
        }
    }

    /// Fold the sums into properties about the mass centroid.
    pub fn finish(&self) -> MassProperties {
        if self.mass <= 0.0 {
            return MassProperties::default();
        }
        let cx = self.first_moment[0] / self.mass;
        let cy = self.first_moment[1] / self.mass;
        let inertia = (self.inertia - self.mass * (cx * cx + cy * cy)).max(0.0);
        MassProperties {
            mass: self.mass as f32,
            area: self.area as f32,
            centroid: Vec2::new(cx as f32, cy as f32),
            inertia: inertia as f32,
        }
    }
}

/// Mass properties of a uniformly dense triangle set.
pub fn mass_properties(tris: &[Triangle], density: f32) -> MassProperties {
    let mut acc = MassAccumulator::new();
    acc.add_triangles(tris, density);
    acc.finish()
}
