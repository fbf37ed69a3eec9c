//! Polygon pipeline for terrain shapes: marching squares contour
//! extraction, Douglas-Peucker simplification, triangulation with holes,
//! and mass properties of the resulting triangles.
//!
//! Everything here works on plain scalar fields and point lists so it can
//! be exercised without a voxel grid.

pub mod contour;
pub mod marching;
pub mod mass;
pub mod simplify;
pub mod triangulate;
pub mod vertex;

pub use contour::{collapse_coincident, stitch_loops, EdgeKey};
pub use marching::{extract_contours, marching_segments, ScalarField};
pub use mass::{mass_properties, MassAccumulator, MassProperties};
pub use simplify::{douglas_peucker, simplify_loop, simplify_loops};
pub use triangulate::{triangulate_loops, Triangle};
pub use vertex::{RenderMesh, TerrainVertex};
