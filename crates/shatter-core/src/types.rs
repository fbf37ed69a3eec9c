use glam::IVec2;
use serde::{Deserialize, Serialize};

/// Newtype for material identifiers. The terrain treats it as opaque
/// apart from looking up density in the material table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MaterialId(pub u16);

/// Grid coordinate of a cell.
pub type VoxelCoord = IVec2;

/// Generation-checked handle to a shape slot.
///
/// A handle stays valid only while the slot's generation matches; a
/// destroyed shape bumps the generation so stale voxel back-references
/// resolve to nothing instead of aliasing the slot's next occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId {
    pub index: u32,
    pub generation: u32,
}

/// Generation-checked handle to a group slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId {
    pub index: u32,
    pub generation: u32,
}

/// Geometric primitive a cut was performed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CutKind {
    Line,
    Disk,
    Shape,
}

impl CutKind {
    pub fn name(self) -> &'static str {
        match self {
            CutKind::Line => "line",
            CutKind::Disk => "disk",
            CutKind::Shape => "shape",
        }
    }
}
