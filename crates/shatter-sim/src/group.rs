//! Groups: the rigid bodies shapes are attached to.

use glam::Vec2;
use shatter_core::math::Transform2;
use shatter_core::types::ShapeId;
use shatter_mesh::mass::MassProperties;

use crate::physics::BodyHandle;

/// Placement and motion of a group at the moment it was taken apart.
///
/// World position of a model point is `transform.apply(p - centroid)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicsSnapshot {
    pub transform: Transform2,
    pub centroid: Vec2,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
}

impl DynamicsSnapshot {
    /// The static frame: model space is world space and nothing moves.
    pub const AT_REST: DynamicsSnapshot = DynamicsSnapshot {
        transform: Transform2::IDENTITY,
        centroid: Vec2::ZERO,
        linear_velocity: Vec2::ZERO,
        angular_velocity: 0.0,
    };

    /// Place a body whose centroid moved to `new_centroid` (model space)
    /// so every model point keeps its world position, and carry over the
    /// rigid-body velocity of that point.
    pub fn rebase(&self, new_centroid: Vec2) -> (Transform2, Vec2, f32) {
        let offset = new_centroid - self.centroid;
        let position = self.transform.apply(offset);
        let r = self.transform.rotate(offset);
        let velocity = self.linear_velocity + self.angular_velocity * r.perp();
        (
            Transform2::new(position, self.transform.angle),
            velocity,
            self.angular_velocity,
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticGroup {
    pub(crate) shapes: Vec<ShapeId>,
    pub(crate) body: Option<BodyHandle>,
}

#[derive(Debug, Clone)]
pub struct DynamicGroup {
    pub(crate) shapes: Vec<ShapeId>,
    pub(crate) body: Option<BodyHandle>,
    pub(crate) transform: Transform2,
    pub(crate) centroid: Vec2,
    pub(crate) linear_velocity: Vec2,
    pub(crate) angular_velocity: f32,
    pub(crate) mass: MassProperties,
}

impl DynamicGroup {
    pub(crate) fn from_snapshot(snapshot: &DynamicsSnapshot) -> Self {
        Self {
            shapes: Vec::new(),
            body: None,
            transform: snapshot.transform,
            centroid: snapshot.centroid,
            linear_velocity: snapshot.linear_velocity,
            angular_velocity: snapshot.angular_velocity,
            mass: MassProperties::default(),
        }
    }

    pub fn linear_velocity(&self) -> Vec2 {
        self.linear_velocity
    }

    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    pub fn mass(&self) -> MassProperties {
        self.mass
    }
}

/// Every shape belongs to exactly one group.
#[derive(Debug, Clone)]
pub enum Group {
    Static(StaticGroup),
    Dynamic(DynamicGroup),
}

impl Group {
    pub fn is_static(&self) -> bool {
        matches!(self, Group::Static(_))
    }

    pub fn shapes(&self) -> &[ShapeId] {
        match self {
            Group::Static(g) => &g.shapes,
            Group::Dynamic(g) => &g.shapes,
        }
    }

    pub(crate) fn shapes_mut(&mut self) -> &mut Vec<ShapeId> {
        match self {
            Group::Static(g) => &mut g.shapes,
            Group::Dynamic(g) => &mut g.shapes,
        }
    }

    pub fn body(&self) -> Option<BodyHandle> {
        match self {
            Group::Static(g) => g.body,
            Group::Dynamic(g) => g.body,
        }
    }

    pub fn transform(&self) -> Transform2 {
        match self {
            Group::Static(_) => Transform2::IDENTITY,
            Group::Dynamic(g) => g.transform,
        }
    }

    /// Model-space point the body frame is centered on.
    pub fn centroid(&self) -> Vec2 {
        match self {
            Group::Static(_) => Vec2::ZERO,
            Group::Dynamic(g) => g.centroid,
        }
    }

    pub fn model_to_world(&self, p: Vec2) -> Vec2 {
        self.transform().apply(p - self.centroid())
    }

    pub fn world_to_model(&self, p: Vec2) -> Vec2 {
        self.transform().apply_inverse(p) + self.centroid()
    }

    pub fn snapshot(&self) -> DynamicsSnapshot {
        match self {
            Group::Static(_) => DynamicsSnapshot::AT_REST,
            Group::Dynamic(g) => DynamicsSnapshot {
                transform: g.transform,
                centroid: g.centroid,
                linear_velocity: g.linear_velocity,
                angular_velocity: g.angular_velocity,
            },
        }
    }

    pub fn as_dynamic(&self) -> Option<&DynamicGroup> {
        match self {
            Group::Dynamic(g) => Some(g),
            Group::Static(_) => None,
        }
    }

    pub(crate) fn remove_shape(&mut self, shape: ShapeId) {
        self.shapes_mut().retain(|&s| s != shape);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_model_world_round_trip() {
        let mut dynamic = DynamicGroup::from_snapshot(&DynamicsSnapshot::AT_REST);
        dynamic.transform = Transform2::new(Vec2::new(10.0, -3.0), 0.7);
        dynamic.centroid = Vec2::new(2.0, 2.0);
        let group = Group::Dynamic(dynamic);
        let p = Vec2::new(3.5, 1.25);
        let back = group.world_to_model(group.model_to_world(p));
        assert!(back.distance(p) < 1e-5);
        assert_eq!(group.model_to_world(Vec2::new(2.0, 2.0)), Vec2::new(10.0, -3.0));
    }

    #[test]
    fn test_rebase_keeps_world_placement() {
        let snapshot = DynamicsSnapshot {
            transform: Transform2::new(Vec2::new(5.0, 5.0), FRAC_PI_2),
            centroid: Vec2::new(1.0, 0.0),
            linear_velocity: Vec2::new(1.0, 0.0),
            angular_velocity: 2.0,
        };
        let new_centroid = Vec2::new(2.0, 0.0);
        let (transform, velocity, spin) = snapshot.rebase(new_centroid);

        let old_world = snapshot.transform.apply(new_centroid - snapshot.centroid);
        assert!(transform.position.distance(old_world) < 1e-5);
        assert!((transform.angle - FRAC_PI_2).abs() < 1e-6);
        assert_eq!(spin, 2.0);
        // Offset (1, 0) rotated a quarter turn is (0, 1); w x r = (-2, 0).
        assert!(velocity.distance(Vec2::new(-1.0, 0.0)) < 1e-5, "got {velocity:?}");
    }

    #[test]
    fn test_static_frame_is_identity() {
        let group = Group::Static(StaticGroup::default());
        let p = Vec2::new(4.0, -1.0);
        assert_eq!(group.model_to_world(p), p);
        assert_eq!(group.snapshot(), DynamicsSnapshot::AT_REST);
    }
}
