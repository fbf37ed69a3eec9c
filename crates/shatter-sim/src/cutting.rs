//! Line, disk and shape-versus-shape cuts.
//!
//! Cuts only change cell occupancy and links, then mark the owning shapes
//! dirty. Meshes and bodies catch up in the next partition pass.

use std::collections::BTreeSet;
use std::f32::consts::SQRT_2;
use std::ops::{BitOr, BitOrAssign};

use glam::Vec2;
use shatter_core::constants::FULL_OCCUPANCY;
use shatter_core::direction::ALL_DIRECTIONS;
use shatter_core::math::{distance_to_segment, segments_intersect, Aabb2};
use shatter_core::types::{CutKind, GroupId, ShapeId};
use shatter_world::grid::VoxelGrid;

use crate::terrain::{world_bounds, Terrain};

/// Bit set describing what a cut did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct CutResult(u8);

impl CutResult {
    pub const NONE: CutResult = CutResult(0);
    /// Some occupancy changed.
    pub const AFFECTED_VOXELS: CutResult = CutResult(1 << 0);
    /// Some link was severed or some cell emptied.
    pub const AFFECTED_CONNECTIVITY: CutResult = CutResult(1 << 1);
    /// The cut reached immutable cells, which were left as they were.
    pub const HIT_FIXED_VOXELS: CutResult = CutResult(1 << 2);

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: CutResult) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether the terrain changed at all.
    pub fn changed(self) -> bool {
        self.0 & (Self::AFFECTED_VOXELS.0 | Self::AFFECTED_CONNECTIVITY.0) != 0
    }
}

impl BitOr for CutResult {
    type Output = CutResult;
    fn bitor(self, rhs: CutResult) -> CutResult {
        CutResult(self.0 | rhs.0)
    }
}

impl BitOrAssign for CutResult {
    fn bitor_assign(&mut self, rhs: CutResult) {
        self.0 |= rhs.0;
    }
}

/// Remove `255 * (1 - strength/255) * cut_strength * falloff` from a
/// mutable cell and empty it once it drops below the link threshold.
fn ablate(grid: &mut VoxelGrid, index: usize, cut_strength: f32, falloff: f32) -> CutResult {
    let voxel = grid.voxel(index);
    let resistance = 1.0 - voxel.strength as f32 / FULL_OCCUPANCY as f32;
    let amount = FULL_OCCUPANCY as f32 * resistance * cut_strength * falloff;
    let before = voxel.occupancy;
    let after = (before as f32 - amount).round().clamp(0.0, before as f32) as u8;
    if after == before {
        return CutResult::NONE;
    }
    grid.voxel_mut(index).occupancy = after;
    let mut result = CutResult::AFFECTED_VOXELS;
    if !grid.voxel(index).is_occupied() {
        result |= empty_cell(grid, index);
    }
    result
}

fn empty_cell(grid: &mut VoxelGrid, index: usize) -> CutResult {
    let had_links = grid.voxel(index).links() != 0;
    let had_material = grid.voxel(index).occupancy > 0;
    grid.disconnect(index);
    let mut result = CutResult::NONE;
    if had_links {
        result |= CutResult::AFFECTED_CONNECTIVITY;
    }
    if had_material {
        result |= CutResult::AFFECTED_VOXELS;
    }
    result
}

/// Line cut against one shape's cells, in the shape's model space.
#[allow(clippy::too_many_arguments)]
fn ablate_segment(
    grid: &mut VoxelGrid,
    voxels: &[usize],
    a: Vec2,
    b: Vec2,
    half_thickness: f32,
    cut_strength: f32,
    radius: f32,
    touched: &mut Vec<usize>,
) -> CutResult {
    let mut result = CutResult::NONE;
    let reach = half_thickness + radius;
    let link_reach = grid.cell_scale() * SQRT_2;
    let dir = b - a;

    for &i in voxels {
        if !grid.voxel(i).is_occupied() {
            continue;
        }
        let p = grid.model_position(i);
        let d = distance_to_segment(p, a, b);

        if d <= reach {
            if grid.voxel(i).is_fixed() {
                result |= CutResult::HIT_FIXED_VOXELS;
            } else {
                let falloff = ((reach - d) / (2.0 * radius)).clamp(0.0, 1.0);
                let r = ablate(grid, i, cut_strength, falloff);
                if !r.is_empty() {
                    touched.push(i);
                }
                result |= r;
            }
        }

        if d > link_reach {
            continue;
        }
        for dir8 in ALL_DIRECTIONS {
            let Some(n) = grid.linked_neighbor(i, dir8) else {
                continue;
            };
            if grid.voxel(i).is_fixed() && grid.voxel(n).is_fixed() {
                continue;
            }
            let q = grid.model_position(n);
            let side_p = dir.perp_dot(p - a);
            let side_q = dir.perp_dot(q - a);
            // An end resting on the line counts as crossing; a link lying
            // along it does not.
            let crosses = side_p * side_q <= 0.0 && (side_p != 0.0 || side_q != 0.0);
            if crosses && segments_intersect(p, q, a, b) {
                grid.disconnect_edge(i, dir8);
                result |= CutResult::AFFECTED_CONNECTIVITY;
                touched.push(i);
                touched.push(n);
            }
        }
    }
    result
}

fn ablate_disk(
    grid: &mut VoxelGrid,
    voxels: &[usize],
    center: Vec2,
    disk_radius: f32,
    cut_strength: f32,
    radius: f32,
    touched: &mut Vec<usize>,
) -> CutResult {
    let mut result = CutResult::NONE;
    for &i in voxels {
        if !grid.voxel(i).is_occupied() {
            continue;
        }
        let d = grid.model_position(i).distance(center);
        if d > disk_radius + radius {
            continue;
        }
        if grid.voxel(i).is_fixed() {
            result |= CutResult::HIT_FIXED_VOXELS;
            continue;
        }
        let r = if d <= disk_radius - radius {
            empty_cell(grid, i)
        } else {
            let falloff = ((disk_radius + radius - d) / (2.0 * radius)).clamp(0.0, 1.0);
            ablate(grid, i, cut_strength, falloff)
        };
        if !r.is_empty() {
            touched.push(i);
        }
        result |= r;
    }
    result
}

/// A shape picked as a cut target and the group it currently moves with.
struct Target {
    shape: ShapeId,
    group: GroupId,
}

impl Terrain {
    /// Shapes whose world bounds meet `area`. Static shapes are looked up
    /// through the sectors `area` covers, dynamic ones by their body bounds.
    fn shapes_near(&self, area: Aabb2, exclude_group: Option<GroupId>) -> Vec<Target> {
        let mut found = BTreeSet::new();
        let margin = self.grid.cell_scale();

        if let Some(sg) = self.static_group.filter(|&g| Some(g) != exclude_group) {
            let lo = self.grid.cell_at_model(area.min) - 1;
            let hi = self.grid.cell_at_model(area.max) + 1;
            if let Some((lo, hi)) = self.grid.clamp_rect(lo, hi) {
                for sector in self.sectors.sectors_in_rect(lo, hi) {
                    for &id in &self.sector_shapes[sector] {
                        let Some(shape) = self.shapes.get(id) else {
                            continue;
                        };
                        if shape.group == Some(sg) && shape.bounds.expanded(margin).intersects(&area) {
                            found.insert((id, sg));
                        }
                    }
                }
            }
        }

        for (gid, group) in self.groups.iter() {
            if group.is_static() || Some(gid) == exclude_group {
                continue;
            }
            for &id in group.shapes() {
                let Some(shape) = self.shapes.get(id) else {
                    continue;
                };
                if world_bounds(group, shape.bounds.expanded(margin)).intersects(&area) {
                    found.insert((id, gid));
                }
            }
        }

        found
            .into_iter()
            .map(|(shape, group)| Target { shape, group })
            .collect()
    }

    /// Cut along a world-space segment.
    ///
    /// `strength` is clamped to `[0, 1]`; zero does nothing.
    pub fn cut_line(&mut self, start: Vec2, end: Vec2, thickness: f32, strength: f32) -> CutResult {
        let strength = strength.clamp(0.0, 1.0);
        if strength <= 0.0 {
            return CutResult::NONE;
        }
        let half = thickness.max(0.0) * 0.5;
        let radius = self.config.voxel_radius();
        let cell = self.grid.cell_scale();
        let reach = half + radius + cell;

        // Static terrain: chunk the segment per sector so long cuts only
        // query the sectors they pass through.
        let mut targets = Vec::new();
        let mut seen = BTreeSet::new();
        for (_, p0, p1) in self.sectors.split_segment(start, end, cell) {
            let piece = Aabb2::from_points([p0, p1]).expanded(reach);
            for t in self.shapes_near(piece, None) {
                if seen.insert(t.shape) {
                    targets.push(t);
                }
            }
        }
        // Pieces outside the grid are dropped by the split; dynamic bodies
        // may be anywhere, so test them against the whole segment.
        let whole = Aabb2::from_points([start, end]).expanded(reach);
        for t in self.shapes_near(whole, self.static_group) {
            if seen.insert(t.shape) {
                targets.push(t);
            }
        }

        let mut result = CutResult::NONE;
        let mut touched = Vec::new();
        for target in &targets {
            let Some(group) = self.groups.get(target.group) else {
                continue;
            };
            let a = group.world_to_model(start);
            let b = group.world_to_model(end);
            let Some(shape) = self.shapes.get(target.shape) else {
                continue;
            };
            result |= ablate_segment(
                &mut self.grid,
                &shape.voxels,
                a,
                b,
                half,
                strength,
                radius,
                &mut touched,
            );
        }
        self.finish_cut(CutKind::Line, result, touched)
    }

    /// Cut a world-space disk.
    pub fn cut_disk(&mut self, center: Vec2, disk_radius: f32, strength: f32) -> CutResult {
        let strength = strength.clamp(0.0, 1.0);
        if strength <= 0.0 || disk_radius <= 0.0 {
            return CutResult::NONE;
        }
        let radius = self.config.voxel_radius();
        let area = Aabb2::new(center, center).expanded(disk_radius + radius);

        let mut result = CutResult::NONE;
        let mut touched = Vec::new();
        for target in self.shapes_near(area, None) {
            let Some(group) = self.groups.get(target.group) else {
                continue;
            };
            let local = group.world_to_model(center);
            let Some(shape) = self.shapes.get(target.shape) else {
                continue;
            };
            result |= ablate_disk(
                &mut self.grid,
                &shape.voxels,
                local,
                disk_radius,
                strength,
                radius,
                &mut touched,
            );
        }
        self.finish_cut(CutKind::Disk, result, touched)
    }

    /// Use one shape as the blade against every overlapping shape of other
    /// groups. Overlapping cells on both sides lose material.
    pub fn cut_with_shape(&mut self, cutter: ShapeId, strength: f32) -> CutResult {
        let strength = strength.clamp(0.0, 1.0);
        if strength <= 0.0 {
            return CutResult::NONE;
        }
        let Some(cutter_shape) = self.shapes.get(cutter) else {
            return CutResult::NONE;
        };
        let Some(cutter_group_id) = cutter_shape.group else {
            return CutResult::NONE;
        };
        let Some(cutter_group) = self.groups.get(cutter_group_id) else {
            return CutResult::NONE;
        };

        let radius = self.config.voxel_radius();
        let contact = 2.0 * radius;
        let contact_sq = contact * contact;

        let blade: Vec<(usize, Vec2)> = cutter_shape
            .voxels
            .iter()
            .filter(|&&i| self.grid.voxel(i).is_occupied())
            .map(|&i| (i, cutter_group.model_to_world(self.grid.model_position(i))))
            .collect();
        if blade.is_empty() {
            return CutResult::NONE;
        }
        let blade_area = Aabb2::from_points(blade.iter().map(|(_, p)| *p)).expanded(contact);

        let mut cells: Vec<(usize, Vec2)> = Vec::new();
        for target in self.shapes_near(blade_area, Some(cutter_group_id)) {
            let (Some(shape), Some(group)) =
                (self.shapes.get(target.shape), self.groups.get(target.group))
            else {
                continue;
            };
            for &i in &shape.voxels {
                if !self.grid.voxel(i).is_occupied() {
                    continue;
                }
                let p = group.model_to_world(self.grid.model_position(i));
                if blade_area.contains(p) {
                    cells.push((i, p));
                }
            }
        }

        let mut result = CutResult::NONE;
        let mut touched = Vec::new();
        for &(bi, bp) in &blade {
            for &(ti, tp) in &cells {
                let d_sq = bp.distance_squared(tp);
                if d_sq >= contact_sq {
                    continue;
                }
                let overlap = (1.0 - d_sq / contact_sq).clamp(0.0, 1.0);
                for index in [bi, ti] {
                    let voxel = self.grid.voxel(index);
                    if !voxel.is_occupied() {
                        continue;
                    }
                    if voxel.is_fixed() {
                        result |= CutResult::HIT_FIXED_VOXELS;
                        continue;
                    }
                    let r = ablate(&mut self.grid, index, strength, overlap);
                    if !r.is_empty() {
                        touched.push(index);
                    }
                    result |= r;
                }
            }
        }
        self.finish_cut(CutKind::Shape, result, touched)
    }

    /// Record world positions of the touched cells and queue their shapes.
    fn finish_cut(&mut self, kind: CutKind, result: CutResult, mut touched: Vec<usize>) -> CutResult {
        if touched.is_empty() {
            return result;
        }
        touched.sort_unstable();
        touched.dedup();

        let mut positions = Vec::with_capacity(touched.len());
        for &i in &touched {
            let Some(owner) = self.grid.owner(i) else {
                continue;
            };
            let model = self.grid.model_position(i);
            let world = self
                .shapes
                .get(owner)
                .and_then(|s| s.group)
                .and_then(|g| self.groups.get(g))
                .map(|g| g.model_to_world(model))
                .unwrap_or(model);
            positions.push(world);
            self.partitioner.mark_dirty(owner, self.time);
        }

        log::debug!(
            "{} cut touched {} cells ({:#05b})",
            kind.name(),
            touched.len(),
            result.bits()
        );
        self.pending_cuts.push((kind, positions));
        result
    }
}
