use glam::Vec2;
use shatter_core::types::{CutKind, GroupId, ShapeId};

/// Notifications for gameplay code, drained once per step.
#[derive(Debug, Clone, PartialEq)]
pub enum TerrainEvent {
    /// A cut changed the terrain. `positions` are the world positions of
    /// the affected cells.
    CutPerformed { kind: CutKind, positions: Vec<Vec2> },
    /// A static shape broke free and joined a dynamic group.
    ShapeDetached { shape: ShapeId, group: GroupId },
}
