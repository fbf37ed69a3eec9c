pub mod anchor;
pub mod error;
pub mod flood;
pub mod grid;
pub mod level;
pub mod sector;

pub use anchor::Anchor;
pub use error::GridError;
pub use grid::{Voxel, VoxelGrid};
pub use level::LevelImage;
pub use sector::SectorGrid;
