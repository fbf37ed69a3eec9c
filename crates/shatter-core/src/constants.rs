//! Single source of truth for shared terrain constants.
//! Tunable values live in `TerrainConfig`; these are the fixed
//! properties of the voxel representation itself.

/// Occupancy of a completely filled cell.
pub const FULL_OCCUPANCY: u8 = 255;

/// Cells below this occupancy are logically empty: no links, no owner.
pub const MIN_OCCUPANCY: u8 = 32;

/// Strength value marking an immutable ("fixed") cell.
pub const FIXED_STRENGTH: u8 = 255;

/// Default marching-squares isolevel as a fraction of full occupancy.
pub const DEFAULT_ISOLEVEL: f32 = 0.5;

/// Default sector side length in cells.
pub const DEFAULT_SECTOR_SIZE: u32 = 32;

/// Upper bound on grid cells accepted at load time (4096 x 4096).
pub const MAX_GRID_CELLS: u32 = 16_777_216;

/// Points of an extracted loop closer than this (in cell units) are merged.
pub const COINCIDENT_EPSILON: f32 = 1.0e-3;

/// Triangles smaller than this (in square cell units) are dropped.
pub const DEGENERATE_AREA_EPSILON: f32 = 1.0e-4;

/// Clusters with this many cells or fewer are discarded as noise.
pub const NOISE_CLUSTER_CELLS: usize = 1;

/// Default deferral between the first dirtying cut and the partition pass,
/// expressed in physics steps.
pub const PARTITION_DELAY_STEPS: f64 = 3.0;

/// Physics step assumed when converting `PARTITION_DELAY_STEPS` to seconds.
pub const PHYSICS_TIMESTEP: f64 = 1.0 / 60.0;

/// Number of compass neighbors per cell.
pub const NEIGHBOR_COUNT: usize = 8;
