//! Boundary to the rigid-body engine.
//!
//! The terrain only ever creates bodies, attaches triangle colliders, sets
//! mass properties and reads body state back. Solving and broad-phase stay
//! on the other side of `PhysicsBackend`.

use glam::Vec2;
use shatter_core::math::Transform2;

use crate::registry::{Arena, Handle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle {
    pub index: u32,
    pub generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderHandle {
    pub index: u32,
    pub generation: u32,
}

macro_rules! impl_handle {
    ($ty:ty) => {
        impl Handle for $ty {
            fn from_parts(index: u32, generation: u32) -> Self {
                Self { index, generation }
            }
            fn index(&self) -> u32 {
                self.index
            }
            fn generation(&self) -> u32 {
                self.generation
            }
        }
    };
}

impl_handle!(BodyHandle);
impl_handle!(ColliderHandle);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Static,
    Dynamic,
}

/// Everything needed to spawn a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub transform: Transform2,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
}

impl BodyDesc {
    pub fn fixed() -> Self {
        Self {
            kind: BodyKind::Static,
            transform: Transform2::IDENTITY,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
        }
    }
}

/// Body placement and motion as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub transform: Transform2,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
}

pub trait PhysicsBackend {
    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle;

    /// Remove a body. Callers remove its colliders first.
    fn remove_body(&mut self, body: BodyHandle);

    /// Attach a triangle collider given in the body's local frame.
    fn add_collider(&mut self, body: BodyHandle, triangle: [Vec2; 3], friction: f32)
        -> ColliderHandle;

    fn remove_collider(&mut self, collider: ColliderHandle);

    /// Mass and rotational inertia about the body origin.
    fn set_mass_properties(&mut self, body: BodyHandle, mass: f32, inertia: f32);

    fn body_state(&self, body: BodyHandle) -> Option<BodyState>;
}

#[derive(Debug, Clone)]
struct HeadlessBody {
    kind: BodyKind,
    state: BodyState,
    mass: f32,
    inertia: f32,
    colliders: usize,
}

#[derive(Debug, Clone)]
struct HeadlessCollider {
    body: BodyHandle,
    triangle: [Vec2; 3],
    friction: f32,
}

/// In-memory backend without contacts: bodies integrate their velocity
/// (plus optional gravity) and nothing else. Used by tests and the bench
/// runner.
#[derive(Debug, Clone, Default)]
pub struct HeadlessPhysics {
    bodies: Arena<BodyHandle, HeadlessBody>,
    colliders: Arena<ColliderHandle, HeadlessCollider>,
    pub gravity: Vec2,
}

impl HeadlessPhysics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gravity(gravity: Vec2) -> Self {
        Self {
            gravity,
            ..Self::default()
        }
    }

    /// Explicit Euler step over every dynamic body with mass.
    pub fn step(&mut self, dt: f32) {
        let handles = self.bodies.handles();
        for handle in handles {
            let Some(body) = self.bodies.get_mut(handle) else {
                continue;
            };
            if body.kind != BodyKind::Dynamic || body.mass <= 0.0 {
                continue;
            }
            let state = &mut body.state;
            state.linear_velocity += self.gravity * dt;
            state.transform.position += state.linear_velocity * dt;
            state.transform.angle += state.angular_velocity * dt;
        }
    }

    /// Overwrite a body's velocities, as a solver impulse would.
    pub fn set_velocity(&mut self, body: BodyHandle, linear: Vec2, angular: f32) {
        if let Some(b) = self.bodies.get_mut(body) {
            b.state.linear_velocity = linear;
            b.state.angular_velocity = angular;
        }
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    pub fn colliders_of(&self, body: BodyHandle) -> usize {
        self.bodies.get(body).map(|b| b.colliders).unwrap_or(0)
    }

    pub fn body_kind(&self, body: BodyHandle) -> Option<BodyKind> {
        self.bodies.get(body).map(|b| b.kind)
    }

    pub fn mass_of(&self, body: BodyHandle) -> Option<(f32, f32)> {
        self.bodies.get(body).map(|b| (b.mass, b.inertia))
    }

    /// Total collider area attached to a body.
    pub fn collider_area(&self, body: BodyHandle) -> f32 {
        self.colliders
            .iter()
            .filter(|(_, c)| c.body == body)
            .map(|(_, c)| {
                let [a, b, d] = c.triangle;
                (b - a).perp_dot(d - a).abs() * 0.5
            })
            .sum()
    }

    pub fn friction_of(&self, collider: ColliderHandle) -> Option<f32> {
        self.colliders.get(collider).map(|c| c.friction)
    }
}

impl PhysicsBackend for HeadlessPhysics {
    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        self.bodies.insert(HeadlessBody {
            kind: desc.kind,
            state: BodyState {
                transform: desc.transform,
                linear_velocity: desc.linear_velocity,
                angular_velocity: desc.angular_velocity,
            },
            mass: 0.0,
            inertia: 0.0,
            colliders: 0,
        })
    }

    fn remove_body(&mut self, body: BodyHandle) {
        if let Some(b) = self.bodies.remove(body) {
            if b.colliders > 0 {
                log::warn!("body {body:?} removed with {} colliders attached", b.colliders);
            }
        }
    }

    fn add_collider(
        &mut self,
        body: BodyHandle,
        triangle: [Vec2; 3],
        friction: f32,
    ) -> ColliderHandle {
        if let Some(b) = self.bodies.get_mut(body) {
            b.colliders += 1;
        }
        self.colliders.insert(HeadlessCollider {
            body,
            triangle,
            friction,
        })
    }

    fn remove_collider(&mut self, collider: ColliderHandle) {
        if let Some(c) = self.colliders.remove(collider) {
            if let Some(b) = self.bodies.get_mut(c.body) {
                b.colliders = b.colliders.saturating_sub(1);
            }
        }
    }

    fn set_mass_properties(&mut self, body: BodyHandle, mass: f32, inertia: f32) {
        if let Some(b) = self.bodies.get_mut(body) {
            b.mass = mass;
            b.inertia = inertia;
        }
    }

    fn body_state(&self, body: BodyHandle) -> Option<BodyState> {
        self.bodies.get(body).map(|b| b.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dynamic_at(position: Vec2) -> BodyDesc {
        BodyDesc {
            kind: BodyKind::Dynamic,
            transform: Transform2::new(position, 0.0),
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
        }
    }

    #[test]
    fn test_collider_bookkeeping() {
        let mut physics = HeadlessPhysics::new();
        let body = physics.create_body(&BodyDesc::fixed());
        let tri = [Vec2::ZERO, Vec2::X, Vec2::Y];
        let c = physics.add_collider(body, tri, 0.5);
        assert_eq!(physics.colliders_of(body), 1);
        assert!((physics.collider_area(body) - 0.5).abs() < 1e-6);
        assert_eq!(physics.friction_of(c), Some(0.5));
        physics.remove_collider(c);
        assert_eq!(physics.colliders_of(body), 0);
        physics.remove_body(body);
        assert!(physics.body_state(body).is_none());
    }

    #[test]
    fn test_step_moves_only_dynamic_bodies_with_mass() {
        let mut physics = HeadlessPhysics::with_gravity(Vec2::new(0.0, -10.0));
        let fixed = physics.create_body(&BodyDesc::fixed());
        let massless = physics.create_body(&dynamic_at(Vec2::ZERO));
        let falling = physics.create_body(&dynamic_at(Vec2::ZERO));
        physics.set_mass_properties(falling, 1.0, 1.0);

        physics.step(0.1);

        let moved = physics.body_state(falling).expect("falling body");
        assert!(moved.linear_velocity.y < 0.0);
        assert!(moved.transform.position.y < 0.0);
        let still = physics.body_state(massless).expect("massless body");
        assert_eq!(still.transform.position, Vec2::ZERO);
        let anchor = physics.body_state(fixed).expect("static body");
        assert_eq!(anchor.linear_velocity, Vec2::ZERO);
    }

    #[test]
    fn test_spin_integrates_angle() {
        let mut physics = HeadlessPhysics::new();
        let body = physics.create_body(&dynamic_at(Vec2::ZERO));
        physics.set_mass_properties(body, 2.0, 1.0);
        physics.set_velocity(body, Vec2::ZERO, 1.0);
        physics.step(0.5);
        let state = physics.body_state(body).expect("body");
        assert!((state.transform.angle - 0.5).abs() < 1e-6);
    }
}
