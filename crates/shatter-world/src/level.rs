use serde::{Deserialize, Serialize};
use shatter_core::constants::{FIXED_STRENGTH, FULL_OCCUPANCY};
use shatter_core::material::MaterialTable;
use shatter_core::types::MaterialId;
use shatter_core::TerrainConfig;

use crate::error::GridError;
use crate::grid::VoxelGrid;

/// Rasterized level source: one entry per cell, row-major, row 0 at the
/// bottom.
///
/// `strength` and `material` may be left empty. An empty `material` means
/// every cell uses material 0; an empty `strength` takes each cell's
/// strength from its material's default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelImage {
    pub width: u32,
    pub height: u32,
    pub occupancy: Vec<u8>,
    #[serde(default)]
    pub strength: Vec<u8>,
    #[serde(default)]
    pub material: Vec<u16>,
}

impl LevelImage {
    /// Uniform image: every cell gets the same occupancy and strength.
    pub fn filled(width: u32, height: u32, occupancy: u8, strength: u8) -> Self {
        let n = (width * height) as usize;
        Self {
            width,
            height,
            occupancy: vec![occupancy; n],
            strength: vec![strength; n],
            material: Vec::new(),
        }
    }

    /// Build an image from a per-cell function returning
    /// `(occupancy, strength, material)`.
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> (u8, u8, u16),
    {
        let n = (width * height) as usize;
        let mut image = Self {
            width,
            height,
            occupancy: Vec::with_capacity(n),
            strength: Vec::with_capacity(n),
            material: Vec::with_capacity(n),
        };
        for y in 0..height {
            for x in 0..width {
                let (occupancy, strength, material) = f(x, y);
                image.occupancy.push(occupancy);
                image.strength.push(strength);
                image.material.push(material);
            }
        }
        image
    }

    /// Parse a small text picture, top row first:
    /// `#` full mutable rock, `X` full fixed rock, `+` half-full rock,
    /// `.` or space empty.
    pub fn from_ascii(rows: &[&str]) -> Result<Self, GridError> {
        let height = rows.len() as u32;
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as u32;
        let n = (width * height) as usize;
        let mut image = Self {
            width,
            height,
            occupancy: vec![0; n],
            strength: vec![0; n],
            material: vec![0; n],
        };
        for (r, line) in rows.iter().enumerate() {
            let y = height as usize - 1 - r;
            for (x, ch) in line.chars().enumerate() {
                let i = y * width as usize + x;
                let (occupancy, strength, material) = match ch {
                    '#' => (FULL_OCCUPANCY, 0, 1),
                    'X' => (FULL_OCCUPANCY, FIXED_STRENGTH, 2),
                    '+' => (128, 0, 1),
                    '.' | ' ' => (0, 0, 0),
                    other => return Err(GridError::UnknownGlyph(other)),
                };
                image.occupancy[i] = occupancy;
                image.strength[i] = strength;
                image.material[i] = material;
            }
        }
        Ok(image)
    }

    /// Parse a level from RON.
    pub fn from_ron_str(ron_str: &str) -> Result<Self, GridError> {
        let options = ron::Options::default();
        let image: LevelImage = options
            .from_str(ron_str)
            .map_err(|e| GridError::ParseError(e.to_string()))?;
        image.validate()?;
        Ok(image)
    }

    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Check that every per-cell array matches the image size.
    pub fn validate(&self) -> Result<(), GridError> {
        let expected = self.cell_count();
        let check = |field: &'static str, actual: usize, optional: bool| {
            if actual == expected || (optional && actual == 0) {
                Ok(())
            } else {
                Err(GridError::ImageSizeMismatch {
                    field,
                    expected,
                    actual,
                })
            }
        };
        check("occupancy", self.occupancy.len(), false)?;
        check("strength", self.strength.len(), true)?;
        check("material", self.material.len(), true)
    }
}

impl VoxelGrid {
    /// Allocate a grid sized to the image, copy the image in and wire links
    /// between all occupied neighbors.
    pub fn from_level(
        image: &LevelImage,
        config: &TerrainConfig,
        materials: &MaterialTable,
    ) -> Result<Self, GridError> {
        image.validate()?;
        let mut grid = VoxelGrid::with_limits(
            image.width,
            image.height,
            config.cell_scale,
            config.max_grid_cells,
            config.seed,
        )?;

        for i in 0..image.cell_count() {
            let material = MaterialId(image.material.get(i).copied().unwrap_or(0));
            let strength = match image.strength.get(i) {
                Some(&s) => s,
                None => materials.get(material).map(|m| m.strength).unwrap_or(0),
            };
            grid.set_cell(i, image.occupancy[i], strength, material);
        }
        grid.relink_all();

        log::info!(
            "Loaded {}x{} level ({} occupied cells)",
            image.width,
            image.height,
            grid.voxels().iter().filter(|v| v.is_occupied()).count()
        );
        Ok(grid)
    }
}
