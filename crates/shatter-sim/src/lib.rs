pub mod cutting;
pub mod error;
pub mod events;
pub mod group;
pub mod partition;
pub mod physics;
pub mod registry;
pub mod shape;
pub mod terrain;

pub use cutting::CutResult;
pub use error::TerrainError;
pub use events::TerrainEvent;
pub use group::{DynamicGroup, DynamicsSnapshot, Group, StaticGroup};
pub use physics::{
    BodyDesc, BodyHandle, BodyKind, BodyState, ColliderHandle, HeadlessPhysics, PhysicsBackend,
};
pub use shape::Shape;
pub use terrain::{RenderBatch, Terrain, TerrainStats};
