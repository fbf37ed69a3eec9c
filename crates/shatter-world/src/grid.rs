//! Dense voxel storage and neighbor topology.
//!
//! Cells live in one row-major arena (row 0 at the bottom, y up). Neighbor
//! "pointers" are computed indices; whether two neighbors are connected is
//! recorded as a bit in each cell's link mask, and every link is mirrored
//! on both endpoints.

use glam::{IVec2, Vec2};
use shatter_core::constants::{FIXED_STRENGTH, MAX_GRID_CELLS, MIN_OCCUPANCY};
use shatter_core::direction::{Direction, ALL_DIRECTIONS, FORWARD_DIRECTIONS};
use shatter_core::rng::cell_hash;
use shatter_core::types::{MaterialId, ShapeId};

use crate::error::GridError;

/// A single grid cell.
#[derive(Debug, Clone, Default)]
pub struct Voxel {
    /// How full the cell is (0 = empty, 255 = full).
    pub occupancy: u8,
    /// Resistance to ablation (255 = immutable).
    pub strength: u8,
    /// Opaque material id, used for density lookups.
    pub material: MaterialId,
    /// Cosmetic per-cell seed.
    pub seed: u32,
    links: u8,
    visit: u32,
    owner: Option<ShapeId>,
}

impl Voxel {
    /// Immutable cells are never ablated by cuts.
    pub fn is_fixed(&self) -> bool {
        self.strength == FIXED_STRENGTH
    }

    /// Whether the cell holds enough material to take part in topology.
    pub fn is_occupied(&self) -> bool {
        self.occupancy >= MIN_OCCUPANCY
    }

    /// Raw link mask, one bit per `Direction`.
    pub fn links(&self) -> u8 {
        self.links
    }

    pub fn is_linked(&self, dir: Direction) -> bool {
        self.links & dir.bit() != 0
    }

    /// Shape currently claiming this cell, if any.
    pub fn owner(&self) -> Option<ShapeId> {
        self.owner
    }

    /// Occupancy as a 0..1 scalar.
    pub fn density(&self) -> f32 {
        self.occupancy as f32 / 255.0
    }
}

/// Fixed-size 2-D grid of voxels.
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    width: u32,
    height: u32,
    cell_scale: f32,
    cells: Vec<Voxel>,
    /// Flood-fill visit generation; bumped once per traversal.
    generation: u32,
}

impl VoxelGrid {
    /// Allocate an empty `width` x `height` grid.
    pub fn new(width: u32, height: u32, cell_scale: f32) -> Result<Self, GridError> {
        Self::with_limits(width, height, cell_scale, MAX_GRID_CELLS, 0)
    }

    /// Allocate an empty grid, checking against `max_cells` and seeding the
    /// per-cell cosmetic hash with `seed`.
    pub fn with_limits(
        width: u32,
        height: u32,
        cell_scale: f32,
        max_cells: u32,
        seed: u32,
    ) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::EmptyGrid { width, height });
        }
        let cells = width as u64 * height as u64;
        if cells > max_cells as u64 {
            return Err(GridError::TooLarge {
                cells,
                max: max_cells,
            });
        }

        let mut grid = Self {
            width,
            height,
            cell_scale,
            cells: vec![Voxel::default(); cells as usize],
            generation: 0,
        };
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let idx = grid.flat(x, y);
                grid.cells[idx].seed = cell_hash(x, y, seed);
            }
        }
        Ok(grid)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn cell_scale(&self) -> f32 {
        self.cell_scale
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    fn flat(&self, x: i32, y: i32) -> usize {
        (x as u32 + y as u32 * self.width) as usize
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    /// Flat index of a coordinate, or None when out of bounds.
    pub fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        self.in_bounds(x, y).then(|| self.flat(x, y))
    }

    pub fn coords_of(&self, index: usize) -> IVec2 {
        let w = self.width as usize;
        IVec2::new((index % w) as i32, (index / w) as i32)
    }

    pub fn voxel_at(&self, x: i32, y: i32) -> Option<&Voxel> {
        self.index_of(x, y).map(|i| &self.cells[i])
    }

    pub fn voxel_at_mut(&mut self, x: i32, y: i32) -> Option<&mut Voxel> {
        self.index_of(x, y).map(move |i| &mut self.cells[i])
    }

    /// Bounds-unchecked lookup for loops that have already clamped their
    /// range. Out-of-range coordinates are a caller bug.
    #[inline]
    pub fn voxel_at_unchecked(&self, x: i32, y: i32) -> &Voxel {
        debug_assert!(self.in_bounds(x, y), "({x}, {y}) outside grid");
        &self.cells[self.flat(x, y)]
    }

    pub fn voxel(&self, index: usize) -> &Voxel {
        &self.cells[index]
    }

    pub fn voxel_mut(&mut self, index: usize) -> &mut Voxel {
        &mut self.cells[index]
    }

    pub fn voxels(&self) -> &[Voxel] {
        &self.cells
    }

    /// Index of the neighbor in `dir`, or None at the grid edge.
    pub fn neighbor(&self, index: usize, dir: Direction) -> Option<usize> {
        let c = self.coords_of(index) + dir.offset();
        self.index_of(c.x, c.y)
    }

    /// Index of the neighbor in `dir` if the two cells are linked.
    pub fn linked_neighbor(&self, index: usize, dir: Direction) -> Option<usize> {
        if self.cells[index].is_linked(dir) {
            self.neighbor(index, dir)
        } else {
            None
        }
    }

    pub fn is_linked(&self, index: usize, dir: Direction) -> bool {
        self.cells[index].is_linked(dir)
    }

    /// Overwrite a cell's contents. Links are left alone; call `relink_all`
    /// (or `link_cell`) once the image is in place.
    pub fn set_cell(&mut self, index: usize, occupancy: u8, strength: u8, material: MaterialId) {
        let cell = &mut self.cells[index];
        cell.occupancy = occupancy;
        cell.strength = strength;
        cell.material = material;
    }

    /// Link every pair of occupied neighbors and clear every other link.
    pub fn relink_all(&mut self) {
        for cell in &mut self.cells {
            cell.links = 0;
        }
        for index in 0..self.cells.len() {
            if !self.cells[index].is_occupied() {
                continue;
            }
            for dir in FORWARD_DIRECTIONS {
                if let Some(n) = self.neighbor(index, dir) {
                    if self.cells[n].is_occupied() {
                        self.cells[index].links |= dir.bit();
                        self.cells[n].links |= dir.opposite().bit();
                    }
                }
            }
        }
    }

    /// Sever every link of a cell and empty it. The owner back-reference is
    /// kept until the owning shape is re-carved.
    pub fn disconnect(&mut self, index: usize) {
        for dir in ALL_DIRECTIONS {
            self.disconnect_edge(index, dir);
        }
        self.cells[index].occupancy = 0;
    }

    /// Sever the single link between a cell and its neighbor in `dir`.
    /// Returns whether a link existed.
    pub fn disconnect_edge(&mut self, index: usize, dir: Direction) -> bool {
        if !self.cells[index].is_linked(dir) {
            return false;
        }
        self.cells[index].links &= !dir.bit();
        if let Some(n) = self.neighbor(index, dir) {
            self.cells[n].links &= !dir.opposite().bit();
        }
        true
    }

    pub fn owner(&self, index: usize) -> Option<ShapeId> {
        self.cells[index].owner
    }

    pub fn set_owner(&mut self, index: usize, owner: Option<ShapeId>) {
        self.cells[index].owner = owner;
    }

    /// Cell center in model space.
    pub fn model_position(&self, index: usize) -> Vec2 {
        self.coords_of(index).as_vec2() * self.cell_scale
    }

    /// Nearest cell coordinate to a model-space point (may be out of bounds).
    pub fn cell_at_model(&self, p: Vec2) -> IVec2 {
        (p / self.cell_scale).round().as_ivec2()
    }

    /// Clamp an inclusive cell rectangle to the grid. None if nothing is left.
    pub fn clamp_rect(&self, min: IVec2, max: IVec2) -> Option<(IVec2, IVec2)> {
        let lo = min.max(IVec2::ZERO);
        let hi = max.min(IVec2::new(self.width as i32 - 1, self.height as i32 - 1));
        (lo.x <= hi.x && lo.y <= hi.y).then_some((lo, hi))
    }

    /// Sum of occupancy over the whole grid.
    pub fn total_occupancy(&self) -> u64 {
        self.cells.iter().map(|c| c.occupancy as u64).sum()
    }

    /// Start a new flood-fill generation and return it.
    pub(crate) fn next_generation(&mut self) -> u32 {
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            // Wrapped: stale tags could alias the new generation.
            for cell in &mut self.cells {
                cell.visit = 0;
            }
            self.generation = 1;
        }
        self.generation
    }

    #[inline]
    pub(crate) fn visit_tag(&self, index: usize) -> u32 {
        self.cells[index].visit
    }

    #[inline]
    pub(crate) fn set_visit_tag(&mut self, index: usize, generation: u32) {
        self.cells[index].visit = generation;
    }
}
