/// Load-time errors for grids and level images. Nothing after load fails.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("grid must have non-zero dimensions (got {width}x{height})")]
    EmptyGrid { width: u32, height: u32 },

    #[error("grid of {cells} cells exceeds the configured maximum of {max}")]
    TooLarge { cells: u64, max: u32 },

    #[error("level `{field}` has {actual} entries, expected {expected}")]
    ImageSizeMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Failed to parse level RON: {0}")]
    ParseError(String),

    #[error("unknown level glyph {0:?}")]
    UnknownGlyph(char),
}
