use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ISOLEVEL, DEFAULT_SECTOR_SIZE, MAX_GRID_CELLS, PARTITION_DELAY_STEPS,
    PHYSICS_TIMESTEP,
};
use crate::error::ConfigError;

/// Tuning parameters for a terrain instance.
///
/// Every field has a default, so a RON file only needs to list the values
/// it overrides: `(cell_scale: 0.25, sector_size: 16)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// World-space side length of one cell.
    pub cell_scale: f32,
    /// Side length in cells of the sectors that bound cut queries.
    pub sector_size: u32,
    /// Marching-squares isolevel as a fraction of full occupancy.
    pub isolevel: f32,
    /// Douglas-Peucker tolerance in cell units.
    pub simplify_tolerance: f32,
    /// Minimum spacing between consecutive perimeter points, in cell units.
    pub min_point_spacing: f32,
    /// Density used for cells whose material is not in the table.
    pub default_density: f32,
    /// Friction used for cells whose material is not in the table.
    pub default_friction: f32,
    /// Seconds between the first dirtying cut and the partition pass.
    pub partition_delay: f64,
    /// Largest grid accepted at load time.
    pub max_grid_cells: u32,
    /// Seed for the per-cell cosmetic hash.
    pub seed: u32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            cell_scale: 1.0,
            sector_size: DEFAULT_SECTOR_SIZE,
            isolevel: DEFAULT_ISOLEVEL,
            simplify_tolerance: 0.15,
            min_point_spacing: 0.05,
            default_density: 1.0,
            default_friction: 0.7,
            partition_delay: PARTITION_DELAY_STEPS * PHYSICS_TIMESTEP,
            max_grid_cells: MAX_GRID_CELLS,
            seed: 0,
        }
    }
}

impl TerrainConfig {
    /// Parse and validate a config from RON.
    pub fn from_ron_str(ron_str: &str) -> Result<Self, ConfigError> {
        let options = ron::Options::default();
        let config: TerrainConfig = options
            .from_str(ron_str)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cell_scale > 0.0 && self.cell_scale.is_finite()) {
            return Err(invalid("cell_scale", format!("{} must be > 0", self.cell_scale)));
        }
        if self.sector_size < 2 {
            return Err(invalid("sector_size", format!("{} must be >= 2", self.sector_size)));
        }
        if !(self.isolevel > 0.0 && self.isolevel < 1.0) {
            return Err(invalid("isolevel", format!("{} must be in (0, 1)", self.isolevel)));
        }
        if self.simplify_tolerance < 0.0 {
            return Err(invalid("simplify_tolerance", "must not be negative".into()));
        }
        if self.min_point_spacing < 0.0 {
            return Err(invalid("min_point_spacing", "must not be negative".into()));
        }
        if self.default_density <= 0.0 {
            return Err(invalid("default_density", "must be > 0".into()));
        }
        if self.partition_delay < 0.0 {
            return Err(invalid("partition_delay", "must not be negative".into()));
        }
        Ok(())
    }

    /// Radius of the circle circumscribing one cell.
    pub fn voxel_radius(&self) -> f32 {
        self.cell_scale * std::f32::consts::SQRT_2 * 0.5
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::InvalidValue { field, reason }
}
