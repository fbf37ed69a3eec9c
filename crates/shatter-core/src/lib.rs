pub mod config;
pub mod constants;
pub mod direction;
pub mod error;
pub mod material;
pub mod math;
pub mod rng;
pub mod types;

pub use config::TerrainConfig;
pub use error::{ConfigError, MaterialError};
pub use types::{CutKind, GroupId, MaterialId, ShapeId, VoxelCoord};
