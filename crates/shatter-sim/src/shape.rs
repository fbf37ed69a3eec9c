//! Shapes: connected voxel regions with one mesh and one set of colliders.

use glam::{IVec2, Vec2};
use shatter_core::config::TerrainConfig;
use shatter_core::constants::{COINCIDENT_EPSILON, DEGENERATE_AREA_EPSILON};
use shatter_core::material::MaterialTable;
use shatter_core::math::Aabb2;
use shatter_core::types::{GroupId, ShapeId};
use shatter_mesh::marching::{extract_contours, ScalarField};
use shatter_mesh::mass::{MassAccumulator, MassProperties};
use shatter_mesh::simplify::simplify_loops;
use shatter_mesh::triangulate::{triangulate_loops, Triangle};
use shatter_mesh::vertex::RenderMesh;
use shatter_world::grid::VoxelGrid;

use crate::physics::ColliderHandle;

/// A connected voxel region inside one sector.
///
/// Geometry (`loops`, `triangles`, `bounds`) is in grid model space.
#[derive(Debug, Clone)]
pub struct Shape {
    pub(crate) id: ShapeId,
    pub(crate) sector: usize,
    pub(crate) voxels: Vec<usize>,
    pub(crate) loops: Vec<Vec<Vec2>>,
    pub(crate) triangles: Vec<Triangle>,
    pub(crate) bounds: Aabb2,
    pub(crate) density: f32,
    pub(crate) friction: f32,
    pub(crate) mass: MassProperties,
    pub(crate) fixed: bool,
    pub(crate) entirely_fixed: bool,
    pub(crate) cut_off: bool,
    pub(crate) group: Option<GroupId>,
    pub(crate) mesh: RenderMesh,
    pub(crate) colliders: Vec<ColliderHandle>,
}

impl Shape {
    pub fn id(&self) -> ShapeId {
        self.id
    }

    pub fn sector(&self) -> usize {
        self.sector
    }

    /// Grid indices of the cells this shape owns.
    pub fn voxels(&self) -> &[usize] {
        &self.voxels
    }

    /// Simplified perimeter loops. Outer boundaries wind clockwise, holes
    /// counter-clockwise.
    pub fn loops(&self) -> &[Vec<Vec2>] {
        &self.loops
    }

    pub fn hole_count(&self) -> usize {
        self.loops
            .iter()
            .filter(|l| shatter_core::math::signed_area(l) > 0.0)
            .count()
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn bounds(&self) -> Aabb2 {
        self.bounds
    }

    pub fn density(&self) -> f32 {
        self.density
    }

    pub fn mass(&self) -> MassProperties {
        self.mass
    }

    /// Contains at least one immutable cell.
    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    pub fn is_entirely_fixed(&self) -> bool {
        self.entirely_fixed
    }

    /// Has been part of a dynamic group at some point.
    pub fn is_cut_off(&self) -> bool {
        self.cut_off
    }

    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    /// Render buffers in the owning group's frame.
    pub fn mesh(&self) -> &RenderMesh {
        &self.mesh
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }
}

/// Geometry and material summary derived from a voxel set.
#[derive(Debug, Clone)]
pub(crate) struct ShapeGeometry {
    pub loops: Vec<Vec<Vec2>>,
    pub triangles: Vec<Triangle>,
    pub bounds: Aabb2,
    pub density: f32,
    pub friction: f32,
    pub mass: MassProperties,
    pub fixed: bool,
    pub entirely_fixed: bool,
}

/// Run the polygon pipeline over a voxel set.
///
/// The scalar field is each cell's occupancy for cells in `voxels` and zero
/// everywhere else. Returns None when nothing triangulates.
pub(crate) fn build_geometry(
    grid: &VoxelGrid,
    voxels: &[usize],
    config: &TerrainConfig,
    materials: &MaterialTable,
) -> Option<ShapeGeometry> {
    if voxels.is_empty() {
        return None;
    }
    let cell = grid.cell_scale();

    let mut min = IVec2::MAX;
    let mut max = IVec2::MIN;
    for &v in voxels {
        let c = grid.coords_of(v);
        min = min.min(c);
        max = max.max(c);
    }
    let size = max - min + IVec2::ONE;

    let mut field = ScalarField::new(size.x as usize, size.y as usize);
    let mut density_sum = 0.0f32;
    let mut friction_sum = 0.0f32;
    let mut fixed_count = 0usize;
    for &v in voxels {
        let voxel = grid.voxel(v);
        let local = grid.coords_of(v) - min;
        field.set(local.x as usize, local.y as usize, voxel.density());
        density_sum += materials.density_or(voxel.material, config.default_density);
        friction_sum += materials.friction_or(voxel.material, config.default_friction);
        if voxel.is_fixed() {
            fixed_count += 1;
        }
    }

    let origin = min.as_vec2();
    let loops: Vec<Vec<Vec2>> = extract_contours(&field, config.isolevel, COINCIDENT_EPSILON)
        .into_iter()
        .map(|l| l.into_iter().map(|p| (p + origin) * cell).collect())
        .collect();

    let min_area = DEGENERATE_AREA_EPSILON * cell * cell;
    let loops = simplify_loops(
        &loops,
        config.simplify_tolerance * cell,
        config.min_point_spacing * cell,
        min_area,
    );
    let triangles = triangulate_loops(&loops, min_area);
    if triangles.is_empty() {
        return None;
    }

    let density = density_sum / voxels.len() as f32;
    let mut acc = MassAccumulator::new();
    acc.add_triangles(&triangles, density);

    Some(ShapeGeometry {
        bounds: Aabb2::from_points(triangles.iter().flatten().copied()),
        loops,
        triangles,
        density,
        friction: friction_sum / voxels.len() as f32,
        mass: acc.finish(),
        fixed: fixed_count > 0,
        entirely_fixed: fixed_count == voxels.len(),
    })
}

impl Shape {
    pub(crate) fn new(
        id: ShapeId,
        sector: usize,
        voxels: Vec<usize>,
        geometry: ShapeGeometry,
        cut_off: bool,
    ) -> Self {
        Self {
            id,
            sector,
            voxels,
            loops: geometry.loops,
            triangles: geometry.triangles,
            bounds: geometry.bounds,
            density: geometry.density,
            friction: geometry.friction,
            mass: geometry.mass,
            fixed: geometry.fixed,
            entirely_fixed: geometry.entirely_fixed,
            cut_off,
            group: None,
            mesh: RenderMesh::default(),
            colliders: Vec::new(),
        }
    }
}
