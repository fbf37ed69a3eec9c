//! The terrain: grid, shapes, groups and the bookkeeping between them.

use std::collections::BTreeSet;
use std::mem;

use glam::{IVec2, Vec2};
use serde::Serialize;
use shatter_core::config::TerrainConfig;
use shatter_core::constants::NOISE_CLUSTER_CELLS;
use shatter_core::material::MaterialTable;
use shatter_core::math::{Aabb2, Transform2};
use shatter_core::types::{CutKind, GroupId, ShapeId};
use shatter_mesh::vertex::RenderMesh;
use shatter_world::anchor::Anchor;
use shatter_world::grid::VoxelGrid;
use shatter_world::level::LevelImage;
use shatter_world::sector::SectorGrid;

use crate::error::TerrainError;
use crate::events::TerrainEvent;
use crate::group::{DynamicsSnapshot, Group};
use crate::partition::{Origin, Partitioner};
use crate::physics::{BodyState, PhysicsBackend};
use crate::registry::Arena;
use crate::shape::{build_geometry, Shape};

/// One shape's render buffers and the transform to draw them with.
#[derive(Debug, Clone, Copy)]
pub struct RenderBatch<'a> {
    pub shape: ShapeId,
    pub group: GroupId,
    pub transform: Transform2,
    pub mesh: &'a RenderMesh,
}

/// Counters for logging and the bench report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TerrainStats {
    pub shapes: usize,
    pub static_shapes: usize,
    pub dynamic_groups: usize,
    pub triangles: usize,
    pub occupied_voxels: usize,
    pub total_occupancy: u64,
}

pub struct Terrain {
    pub(crate) config: TerrainConfig,
    pub(crate) materials: MaterialTable,
    pub(crate) grid: VoxelGrid,
    pub(crate) sectors: SectorGrid,
    pub(crate) sector_shapes: Vec<Vec<ShapeId>>,
    pub(crate) shapes: Arena<ShapeId, Shape>,
    pub(crate) groups: Arena<GroupId, Group>,
    pub(crate) static_group: Option<GroupId>,
    pub(crate) anchors: Vec<Anchor>,
    pub(crate) partitioner: Partitioner,
    pub(crate) pending_cuts: Vec<(CutKind, Vec<Vec2>)>,
    pub(crate) events: Vec<TerrainEvent>,
    pub(crate) time: f64,
}

impl Terrain {
    /// Load a level, carve it into one shape per connected cluster per
    /// sector and run the first partition pass.
    ///
    /// Anchors are needed up front: terrain they do not pin is dynamic
    /// from the first pass on.
    pub fn new(
        level: &LevelImage,
        config: TerrainConfig,
        materials: MaterialTable,
        anchors: Vec<Anchor>,
        physics: &mut dyn PhysicsBackend,
    ) -> Result<Self, TerrainError> {
        config.validate()?;
        let grid = VoxelGrid::from_level(level, &config, &materials)?;
        let sectors = SectorGrid::new(grid.width(), grid.height(), config.sector_size);

        let mut terrain = Self {
            partitioner: Partitioner::new(config.partition_delay),
            sector_shapes: vec![Vec::new(); sectors.len()],
            config,
            materials,
            grid,
            sectors,
            shapes: Arena::new(),
            groups: Arena::new(),
            static_group: None,
            anchors,
            pending_cuts: Vec::new(),
            events: Vec::new(),
            time: 0.0,
        };

        let mut carved = Vec::new();
        for sector in 0..terrain.sectors.len() {
            let (lo, hi) = terrain.sectors.cell_range(sector);
            let Some((lo, hi)) = terrain.grid.clamp_rect(lo, hi) else {
                continue;
            };
            for y in lo.y..=hi.y {
                for x in lo.x..=hi.x {
                    let Some(index) = terrain.grid.index_of(x, y) else {
                        continue;
                    };
                    let voxel = terrain.grid.voxel(index);
                    if !voxel.is_occupied() || voxel.owner().is_some() {
                        continue;
                    }
                    let cluster = terrain.collect_sector_cluster(index, sector);
                    let origin = Origin {
                        group: None,
                        snapshot: DynamicsSnapshot::AT_REST,
                        cut_off: false,
                    };
                    if let Some(id) = terrain.create_shape(sector, cluster, origin.cut_off) {
                        carved.push((id, origin));
                    }
                }
            }
        }

        log::info!(
            "Carved {} shapes from {}x{} level in {} sectors",
            carved.len(),
            terrain.grid.width(),
            terrain.grid.height(),
            terrain.sectors.len()
        );

        terrain.assemble(carved, Vec::new(), BTreeSet::new(), physics);
        Ok(terrain)
    }

    /// Unowned occupied cells linked to `origin` inside one sector.
    pub(crate) fn collect_sector_cluster(&mut self, origin: usize, sector: usize) -> Vec<usize> {
        let width = self.grid.width() as i32;
        let sectors = self.sectors;
        self.grid.collect_component(origin, |i, v| {
            let coord = IVec2::new(i as i32 % width, i as i32 / width);
            v.is_occupied() && v.owner().is_none() && sectors.sector_of(coord) == sector
        })
    }

    /// Turn a voxel cluster into a registered shape. Clusters too small to
    /// matter, or that triangulate to nothing, are emptied instead.
    pub(crate) fn create_shape(
        &mut self,
        sector: usize,
        voxels: Vec<usize>,
        cut_off: bool,
    ) -> Option<ShapeId> {
        if voxels.len() <= NOISE_CLUSTER_CELLS {
            for &v in &voxels {
                self.grid.disconnect(v);
            }
            return None;
        }

        let Some(geometry) = build_geometry(&self.grid, &voxels, &self.config, &self.materials)
        else {
            log::debug!("discarding {}-cell cluster with no triangles", voxels.len());
            for &v in &voxels {
                self.grid.disconnect(v);
            }
            return None;
        };

        let id = self
            .shapes
            .insert_with(|id| Shape::new(id, sector, voxels, geometry, cut_off));
        if let Some(shape) = self.shapes.get(id) {
            for &v in &shape.voxels {
                self.grid.set_owner(v, Some(id));
            }
        }
        self.sector_shapes[sector].push(id);
        Some(id)
    }

    /// Advance to `now`: pull body placement from physics, run a partition
    /// pass once the debounce window has passed and publish cut events.
    pub fn step(&mut self, now: f64, physics: &mut dyn PhysicsBackend) {
        self.time = now;
        self.sync_from_physics(physics);

        for (kind, positions) in self.pending_cuts.drain(..) {
            self.events.push(TerrainEvent::CutPerformed { kind, positions });
        }

        if self.partitioner.is_due(now) {
            self.run_partition(physics);
        }
    }

    /// Run a partition pass immediately, ignoring the debounce window.
    pub fn partition_now(&mut self, physics: &mut dyn PhysicsBackend) {
        self.run_partition(physics);
    }

    fn sync_from_physics(&mut self, physics: &dyn PhysicsBackend) {
        for id in self.groups.handles() {
            let Some(Group::Dynamic(group)) = self.groups.get_mut(id) else {
                continue;
            };
            let Some(BodyState {
                transform,
                linear_velocity,
                angular_velocity,
            }) = group.body.and_then(|b| physics.body_state(b))
            else {
                continue;
            };
            group.transform = transform;
            group.linear_velocity = linear_velocity;
            group.angular_velocity = angular_velocity;
        }
    }

    /// Add an anchor. It only affects shapes classified from now on, and
    /// never shapes that were already cut off.
    pub fn add_anchor(&mut self, anchor: Anchor) {
        self.anchors.push(anchor);
    }

    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    pub fn drain_events(&mut self) -> Vec<TerrainEvent> {
        mem::take(&mut self.events)
    }

    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn sectors(&self) -> &SectorGrid {
        &self.sectors
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(id)
    }

    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter().map(|(_, s)| s)
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id)
    }

    pub fn groups(&self) -> impl Iterator<Item = (GroupId, &Group)> {
        self.groups.iter()
    }

    pub fn static_group(&self) -> Option<GroupId> {
        self.static_group
    }

    /// Shape owning the cell nearest a world point, searching static terrain
    /// first and then every dynamic group.
    pub fn shape_at(&self, world: Vec2) -> Option<ShapeId> {
        let mut order: Vec<(GroupId, &Group)> = self.groups.iter().collect();
        order.sort_by_key(|(_, g)| !g.is_static());
        order.into_iter().find_map(|(_, group)| {
            let c = self.grid.cell_at_model(group.world_to_model(world));
            let owner = self.grid.voxel_at(c.x, c.y)?.owner()?;
            let shape = self.shapes.get(owner)?;
            group.shapes().contains(&shape.id).then_some(owner)
        })
    }

    /// True while cuts are waiting for a partition pass.
    pub fn has_pending_partition(&self) -> bool {
        self.partitioner.has_dirty()
    }

    /// World-space bounds of a shape under its group's current transform.
    pub fn shape_world_bounds(&self, id: ShapeId) -> Option<Aabb2> {
        let shape = self.shapes.get(id)?;
        let group = self.groups.get(shape.group?)?;
        Some(world_bounds(group, shape.bounds))
    }

    pub fn render_batches(&self) -> Vec<RenderBatch<'_>> {
        self.shapes
            .iter()
            .filter_map(|(id, shape)| {
                let group_id = shape.group?;
                let group = self.groups.get(group_id)?;
                Some(RenderBatch {
                    shape: id,
                    group: group_id,
                    transform: group.transform(),
                    mesh: &shape.mesh,
                })
            })
            .collect()
    }

    pub fn stats(&self) -> TerrainStats {
        let mut stats = TerrainStats::default();
        for (_, shape) in self.shapes.iter() {
            stats.shapes += 1;
            stats.triangles += shape.triangles.len();
            if shape.group.is_some() && shape.group == self.static_group {
                stats.static_shapes += 1;
            }
        }
        stats.dynamic_groups = self.groups.iter().filter(|(_, g)| !g.is_static()).count();
        stats.occupied_voxels = self.grid.voxels().iter().filter(|v| v.is_occupied()).count();
        stats.total_occupancy = self.grid.total_occupancy();
        stats
    }

    /// Texture coordinate of a model-space point over the whole level.
    pub(crate) fn uv_of(&self, p: Vec2) -> Vec2 {
        let size = Vec2::new(self.grid.width() as f32, self.grid.height() as f32);
        (p / self.grid.cell_scale() + Vec2::splat(0.5)) / size
    }
}

/// Box around a model-space box after mapping it through a group frame.
pub(crate) fn world_bounds(group: &Group, model: Aabb2) -> Aabb2 {
    if group.is_static() {
        return model;
    }
    Aabb2::from_points(
        [
            model.min,
            Vec2::new(model.max.x, model.min.y),
            model.max,
            Vec2::new(model.min.x, model.max.y),
        ]
        .map(|p| group.model_to_world(p)),
    )
}
