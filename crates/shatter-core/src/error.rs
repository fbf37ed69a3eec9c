use thiserror::Error;

/// Errors raised while loading or validating a `TerrainConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse terrain config RON: {0}")]
    ParseError(String),

    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Errors raised while loading a material table.
#[derive(Debug, Error)]
pub enum MaterialError {
    #[error("Failed to parse materials RON: {0}")]
    ParseError(String),

    #[error("duplicate material id {0}")]
    DuplicateId(u16),

    #[error("material {id} has non-positive density {density}")]
    InvalidDensity { id: u16, density: f32 },
}
