use shatter_core::error::ConfigError;
use shatter_world::error::GridError;
use thiserror::Error;

/// Errors raised while building a terrain. Once built, terrain operations
/// are total.
#[derive(Debug, Error)]
pub enum TerrainError {
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid level: {0}")]
    Grid(#[from] GridError),
}
