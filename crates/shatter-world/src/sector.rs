//! Fixed-size spatial sectors over the grid.
//!
//! Sectors only bound how much of the level a cut has to look at. Each
//! sector owns the cells in its square, so the marching-squares quads of
//! neighbouring sectors tile the level without overlap.

use glam::{IVec2, Vec2};
use shatter_core::math::Aabb2;

/// Sector layout for a grid of a given size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorGrid {
    sector_size: u32,
    cols: u32,
    rows: u32,
}

impl SectorGrid {
    pub fn new(grid_width: u32, grid_height: u32, sector_size: u32) -> Self {
        let sector_size = sector_size.max(1);
        Self {
            sector_size,
            cols: grid_width.div_ceil(sector_size),
            rows: grid_height.div_ceil(sector_size),
        }
    }

    pub fn sector_size(&self) -> u32 {
        self.sector_size
    }

    /// Number of sectors.
    pub fn len(&self) -> usize {
        (self.cols * self.rows) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sector index holding a cell coordinate. The coordinate must be inside
    /// the grid.
    pub fn sector_of(&self, cell: IVec2) -> usize {
        let s = self.sector_size as i32;
        let sx = (cell.x / s) as u32;
        let sy = (cell.y / s) as u32;
        (sx + sy * self.cols) as usize
    }

    /// Inclusive cell range covered by a sector, not clamped to the grid.
    pub fn cell_range(&self, sector: usize) -> (IVec2, IVec2) {
        let s = self.sector_size as i32;
        let sx = (sector as u32 % self.cols) as i32;
        let sy = (sector as u32 / self.cols) as i32;
        let min = IVec2::new(sx * s, sy * s);
        (min, min + IVec2::splat(s - 1))
    }

    /// Sectors whose cells fall inside an inclusive cell rectangle.
    pub fn sectors_in_rect(&self, min: IVec2, max: IVec2) -> Vec<usize> {
        let s = self.sector_size as i32;
        let lo = (min.max(IVec2::ZERO)) / s;
        let hi = (max / s).min(IVec2::new(self.cols as i32 - 1, self.rows as i32 - 1));
        let mut out = Vec::new();
        for sy in lo.y..=hi.y {
            for sx in lo.x..=hi.x {
                out.push((sx + sy * self.cols as i32) as usize);
            }
        }
        out
    }

    /// Model-space rectangle spanned by a sector's cells, including the half
    /// cell around the outermost centers.
    pub fn model_bounds(&self, sector: usize, cell_scale: f32) -> Aabb2 {
        let (min, max) = self.cell_range(sector);
        Aabb2::new(
            (min.as_vec2() - Vec2::splat(0.5)) * cell_scale,
            (max.as_vec2() + Vec2::splat(0.5)) * cell_scale,
        )
    }

    /// Split a model-space segment at sector boundaries. Each piece is
    /// returned with the sector its midpoint falls in; pieces outside the
    /// sector layout are dropped.
    pub fn split_segment(&self, a: Vec2, b: Vec2, cell_scale: f32) -> Vec<(usize, Vec2, Vec2)> {
        let step = self.sector_size as f32 * cell_scale;
        // Sector k spans [k*step - half, (k+1)*step - half) in model space.
        let half = 0.5 * cell_scale;
        let mut ts = vec![0.0f32, 1.0];
        for axis in 0..2 {
            let (pa, pb) = (a[axis], b[axis]);
            if (pb - pa).abs() <= f32::EPSILON {
                continue;
            }
            let lo = pa.min(pb);
            let hi = pa.max(pb);
            let mut k = ((lo + half) / step).ceil() as i32;
            loop {
                let boundary = k as f32 * step - half;
                if boundary >= hi {
                    break;
                }
                let t = (boundary - pa) / (pb - pa);
                if t > 0.0 && t < 1.0 {
                    ts.push(t);
                }
                k += 1;
            }
        }
        ts.sort_by(|x, y| x.total_cmp(y));
        ts.dedup();

        let mut out = Vec::new();
        for pair in ts.windows(2) {
            let p0 = a.lerp(b, pair[0]);
            let p1 = a.lerp(b, pair[1]);
            let mid = (p0 + p1) * 0.5;
            let cell = ((mid + Vec2::splat(half)) / cell_scale).floor().as_ivec2();
            let s = self.sector_size as i32;
            if cell.x < 0 || cell.y < 0 {
                continue;
            }
            let sector = cell / s;
            if sector.x >= self.cols as i32 || sector.y >= self.rows as i32 {
                continue;
            }
            out.push(((sector.x + sector.y * self.cols as i32) as usize, p0, p1));
        }
        out
    }
}
