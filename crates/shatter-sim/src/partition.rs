//! Group partitioning: after cuts, re-derive which shapes exist, which of
//! them are still connected, and which rigid body each component rides on.
//!
//! A pass only touches dirty shapes, the shapes next to them and the
//! groups they belonged to. Everything else keeps its body and colliders.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use shatter_core::direction::ALL_DIRECTIONS;
use shatter_core::types::{GroupId, ShapeId};
use shatter_mesh::mass::MassAccumulator;
use shatter_mesh::vertex::RenderMesh;

use crate::events::TerrainEvent;
use crate::group::{DynamicGroup, DynamicsSnapshot, Group, StaticGroup};
use crate::physics::{BodyDesc, BodyKind, PhysicsBackend};
use crate::terrain::Terrain;

/// Debounce state and the set of shapes waiting for a pass.
#[derive(Debug, Clone)]
pub struct Partitioner {
    delay: f64,
    first_dirty: Option<f64>,
    dirty: BTreeSet<ShapeId>,
}

impl Partitioner {
    pub fn new(delay: f64) -> Self {
        Self {
            delay,
            first_dirty: None,
            dirty: BTreeSet::new(),
        }
    }

    pub fn delay(&self) -> f64 {
        self.delay
    }

    /// Queue a shape. The debounce window starts at the first mark after a
    /// pass.
    pub fn mark_dirty(&mut self, shape: ShapeId, now: f64) {
        self.dirty.insert(shape);
        self.first_dirty.get_or_insert(now);
    }

    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn is_due(&self, now: f64) -> bool {
        self.first_dirty.is_some_and(|t| now - t >= self.delay)
    }

    pub(crate) fn take_dirty(&mut self) -> Vec<ShapeId> {
        self.first_dirty = None;
        std::mem::take(&mut self.dirty).into_iter().collect()
    }
}

/// Where a freshly carved shape came from.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Origin {
    pub group: Option<GroupId>,
    pub snapshot: DynamicsSnapshot,
    pub cut_off: bool,
}

/// A destroyed dirty shape whose cells wait to be re-carved.
struct Parent {
    voxels: Vec<usize>,
    sector: usize,
    origin: Origin,
}

struct Component {
    shapes: Vec<ShapeId>,
    is_static: bool,
}

impl Terrain {
    pub(crate) fn run_partition(&mut self, physics: &mut dyn PhysicsBackend) {
        let dirty = self.partitioner.take_dirty();
        if dirty.is_empty() {
            return;
        }

        let mut touched = BTreeSet::new();
        let mut parents = Vec::with_capacity(dirty.len());
        for &id in &dirty {
            if let Some(parent) = self.disassemble(id, &mut touched, physics) {
                parents.push(parent);
            }
        }

        let mut new_shapes = Vec::new();
        for parent in &parents {
            for &v in &parent.voxels {
                let voxel = self.grid.voxel(v);
                if !voxel.is_occupied() || voxel.owner().is_some() {
                    continue;
                }
                let cluster = self.collect_sector_cluster(v, parent.sector);
                if let Some(id) = self.create_shape(parent.sector, cluster, parent.origin.cut_off) {
                    new_shapes.push((id, parent.origin));
                }
            }
        }

        let fresh: HashSet<ShapeId> = new_shapes.iter().map(|(id, _)| *id).collect();
        let mut live_seeds = BTreeSet::new();
        for parent in &parents {
            for &v in &parent.voxels {
                for dir in ALL_DIRECTIONS {
                    let Some(owner) = self.grid.neighbor(v, dir).and_then(|n| self.grid.owner(n))
                    else {
                        continue;
                    };
                    if !fresh.contains(&owner) && self.shapes.contains(owner) {
                        live_seeds.insert(owner);
                    }
                }
            }
        }
        for &gid in &touched {
            if let Some(Group::Dynamic(group)) = self.groups.get(gid) {
                live_seeds.extend(group.shapes.iter().copied());
            }
        }

        log::debug!(
            "Partition pass: {} dirty shapes, {} carved, {} live seeds",
            dirty.len(),
            new_shapes.len(),
            live_seeds.len()
        );
        self.assemble(new_shapes, live_seeds.into_iter().collect(), touched, physics);
    }

    /// Take a dirty shape apart: free its colliders, leave its group and
    /// release its cells.
    fn disassemble(
        &mut self,
        id: ShapeId,
        touched: &mut BTreeSet<GroupId>,
        physics: &mut dyn PhysicsBackend,
    ) -> Option<Parent> {
        let shape = self.shapes.remove(id)?;
        for &collider in &shape.colliders {
            physics.remove_collider(collider);
        }

        let mut snapshot = DynamicsSnapshot::AT_REST;
        if let Some(gid) = shape.group {
            if let Some(group) = self.groups.get_mut(gid) {
                snapshot = group.snapshot();
                group.remove_shape(id);
            }
            touched.insert(gid);
        }

        self.sector_shapes[shape.sector].retain(|&s| s != id);
        for &v in &shape.voxels {
            if self.grid.owner(v) == Some(id) {
                self.grid.set_owner(v, None);
            }
        }

        Some(Parent {
            sector: shape.sector,
            origin: Origin {
                group: shape.group,
                snapshot,
                cut_off: shape.cut_off,
            },
            voxels: shape.voxels,
        })
    }

    /// Classify components reachable from the seeds, move shapes into their
    /// groups, then rebuild and prune every group that changed.
    pub(crate) fn assemble(
        &mut self,
        new_shapes: Vec<(ShapeId, Origin)>,
        live_seeds: Vec<ShapeId>,
        mut touched: BTreeSet<GroupId>,
        physics: &mut dyn PhysicsBackend,
    ) {
        let origins: HashMap<ShapeId, Origin> = new_shapes.iter().copied().collect();
        let mut seeds: Vec<ShapeId> = new_shapes.iter().map(|(id, _)| *id).collect();
        seeds.extend(live_seeds);

        let mut visited: HashSet<ShapeId> = HashSet::new();
        let mut claimed: HashSet<GroupId> = HashSet::new();
        for seed in seeds {
            if visited.contains(&seed) || !self.shapes.contains(seed) {
                continue;
            }
            let Some(component) = self.classify(seed) else {
                continue;
            };
            visited.extend(component.shapes.iter().copied());
            if component.is_static {
                self.join_static(&component.shapes, &mut touched, physics);
            } else {
                self.join_dynamic(&component.shapes, &origins, &mut claimed, &mut touched, physics);
            }
        }

        for &gid in &touched {
            self.resynthesize(gid, physics);
        }
        self.prune(&touched, physics);
    }

    /// Flood the component around a seed. Stops at the first immutable
    /// cell, in which case only the shapes seen so far are returned.
    fn classify(&mut self, seed: ShapeId) -> Option<Component> {
        let shape = self.shapes.get(seed)?;
        let start = shape.voxels.iter().copied().find(|&v| {
            self.grid.voxel(v).is_occupied() && self.grid.owner(v) == Some(seed)
        })?;

        let mut members = BTreeSet::new();
        let mut cells = Vec::new();
        let complete = self.grid.flood_fill(
            start,
            |_, v| v.is_occupied() && v.owner().is_some(),
            |i, v| {
                if let Some(owner) = v.owner() {
                    members.insert(owner);
                }
                if v.is_fixed() {
                    return false;
                }
                cells.push(i);
                true
            },
        );
        let shapes: Vec<ShapeId> = members.into_iter().collect();
        if !complete {
            return Some(Component {
                shapes,
                is_static: true,
            });
        }

        let cut_off = shapes
            .iter()
            .any(|&id| self.shapes.get(id).is_some_and(|s| s.cut_off));
        let anchored = !cut_off
            && cells.iter().any(|&i| {
                let p = self.grid.model_position(i);
                self.anchors.iter().any(|a| a.contains(p))
            });
        Some(Component {
            shapes,
            is_static: anchored,
        })
    }

    fn ensure_static_group(&mut self) -> GroupId {
        if let Some(gid) = self.static_group.filter(|&g| self.groups.contains(g)) {
            return gid;
        }
        let gid = self.groups.insert(Group::Static(StaticGroup::default()));
        self.static_group = Some(gid);
        gid
    }

    fn move_shape(
        &mut self,
        id: ShapeId,
        to: GroupId,
        touched: &mut BTreeSet<GroupId>,
        physics: &mut dyn PhysicsBackend,
    ) {
        let Some(shape) = self.shapes.get_mut(id) else {
            return;
        };
        if shape.group == Some(to) {
            return;
        }
        for collider in shape.colliders.drain(..) {
            physics.remove_collider(collider);
        }
        if let Some(old) = shape.group.replace(to) {
            if let Some(group) = self.groups.get_mut(old) {
                group.remove_shape(id);
            }
            touched.insert(old);
        }
        if let Some(group) = self.groups.get_mut(to) {
            group.shapes_mut().push(id);
        }
        touched.insert(to);
    }

    fn join_static(
        &mut self,
        shapes: &[ShapeId],
        touched: &mut BTreeSet<GroupId>,
        physics: &mut dyn PhysicsBackend,
    ) {
        let gid = self.ensure_static_group();
        for &id in shapes {
            self.move_shape(id, gid, touched, physics);
        }
    }

    /// Put a free component on a body. The dynamic group contributing the
    /// most shapes is reused unless an earlier component already took it.
    fn join_dynamic(
        &mut self,
        shapes: &[ShapeId],
        origins: &HashMap<ShapeId, Origin>,
        claimed: &mut HashSet<GroupId>,
        touched: &mut BTreeSet<GroupId>,
        physics: &mut dyn PhysicsBackend,
    ) {
        let mut counts: BTreeMap<GroupId, usize> = BTreeMap::new();
        let mut snapshots: HashMap<GroupId, DynamicsSnapshot> = HashMap::new();
        for &id in shapes {
            let (group, snapshot) = match origins.get(&id) {
                Some(origin) => (origin.group, origin.snapshot),
                None => {
                    let group = self.shapes.get(id).and_then(|s| s.group);
                    let snapshot = group
                        .and_then(|g| self.groups.get(g))
                        .map(|g| g.snapshot())
                        .unwrap_or(DynamicsSnapshot::AT_REST);
                    (group, snapshot)
                }
            };
            if let Some(g) = group {
                *counts.entry(g).or_default() += 1;
                snapshots.entry(g).or_insert(snapshot);
            }
        }

        let reusable = most_shapes(counts.iter().filter(|(g, _)| {
            !claimed.contains(*g) && matches!(self.groups.get(**g), Some(Group::Dynamic(_)))
        }));

        let target = match reusable {
            Some(gid) => gid,
            None => {
                let snapshot = most_shapes(counts.iter())
                    .and_then(|g| snapshots.get(&g).copied())
                    .unwrap_or(DynamicsSnapshot::AT_REST);
                self.groups
                    .insert(Group::Dynamic(DynamicGroup::from_snapshot(&snapshot)))
            }
        };
        claimed.insert(target);
        touched.insert(target);

        for &id in shapes {
            let previous = match origins.get(&id) {
                Some(origin) => origin.group,
                None => self.shapes.get(id).and_then(|s| s.group),
            };
            let was_static = previous.is_some() && previous == self.static_group;
            self.move_shape(id, target, touched, physics);
            if let Some(shape) = self.shapes.get_mut(id) {
                // Shapes that load free are cut off without ever detaching.
                if !shape.cut_off {
                    shape.cut_off = true;
                    if was_static {
                        self.events.push(TerrainEvent::ShapeDetached {
                            shape: id,
                            group: target,
                        });
                    }
                }
            }
        }
    }

    fn resynthesize(&mut self, gid: GroupId, physics: &mut dyn PhysicsBackend) {
        let Some(group) = self.groups.get(gid) else {
            return;
        };
        if group.shapes().is_empty() {
            return;
        }
        debug_assert!(
            group
                .shapes()
                .iter()
                .all(|&s| self.shapes.get(s).is_some_and(|shape| shape.group == Some(gid))),
            "group {gid:?} lists a shape it does not own"
        );
        if group.is_static() {
            self.resynthesize_static(gid, physics);
        } else {
            self.resynthesize_dynamic(gid, physics);
        }
    }

    /// The static body stays put; only shapes that joined since the last
    /// pass get colliders and meshes.
    fn resynthesize_static(&mut self, gid: GroupId, physics: &mut dyn PhysicsBackend) {
        let Some(Group::Static(group)) = self.groups.get(gid) else {
            return;
        };
        let members = group.shapes.clone();
        let existing = group.body;
        let body = match existing {
            Some(body) => body,
            None => {
                let body = physics.create_body(&BodyDesc::fixed());
                if let Some(Group::Static(group)) = self.groups.get_mut(gid) {
                    group.body = Some(body);
                }
                body
            }
        };

        let mut attached = 0;
        for id in members {
            let Some(shape) = self.shapes.get(id) else {
                continue;
            };
            if !shape.colliders.is_empty() {
                continue;
            }
            let mesh = RenderMesh::from_triangles(&shape.triangles, |p| p, |p| self.uv_of(p));
            let colliders = shape
                .triangles
                .iter()
                .map(|t| physics.add_collider(body, *t, shape.friction))
                .collect();
            if let Some(shape) = self.shapes.get_mut(id) {
                shape.mesh = mesh;
                shape.colliders = colliders;
            }
            attached += 1;
        }
        log::debug!("Static group: attached {attached} shapes");
    }

    /// Rebuild a dynamic body from scratch around the new centroid,
    /// keeping every cell where it was in the world.
    fn resynthesize_dynamic(&mut self, gid: GroupId, physics: &mut dyn PhysicsBackend) {
        let Some(group) = self.groups.get(gid) else {
            return;
        };
        let members = group.shapes().to_vec();
        let snapshot = group.snapshot();
        let old_body = group.body();

        for &id in &members {
            if let Some(shape) = self.shapes.get_mut(id) {
                for collider in shape.colliders.drain(..) {
                    physics.remove_collider(collider);
                }
            }
        }
        if let Some(body) = old_body {
            physics.remove_body(body);
        }

        let mut acc = MassAccumulator::new();
        for &id in &members {
            if let Some(shape) = self.shapes.get(id) {
                acc.add_triangles(&shape.triangles, shape.density);
            }
        }
        let mass = acc.finish();
        let centroid = mass.centroid;
        let (transform, linear_velocity, angular_velocity) = snapshot.rebase(centroid);

        let body = physics.create_body(&BodyDesc {
            kind: BodyKind::Dynamic,
            transform,
            linear_velocity,
            angular_velocity,
        });
        physics.set_mass_properties(body, mass.mass, mass.inertia);

        for &id in &members {
            let Some(shape) = self.shapes.get(id) else {
                continue;
            };
            let mesh =
                RenderMesh::from_triangles(&shape.triangles, |p| p - centroid, |p| self.uv_of(p));
            let colliders = shape
                .triangles
                .iter()
                .map(|t| physics.add_collider(body, t.map(|p| p - centroid), shape.friction))
                .collect();
            if let Some(shape) = self.shapes.get_mut(id) {
                shape.mesh = mesh;
                shape.colliders = colliders;
            }
        }

        if let Some(Group::Dynamic(group)) = self.groups.get_mut(gid) {
            group.body = Some(body);
            group.transform = transform;
            group.centroid = centroid;
            group.linear_velocity = linear_velocity;
            group.angular_velocity = angular_velocity;
            group.mass = mass;
        }
        log::debug!(
            "Dynamic group {:?}: {} shapes, mass {:.3}",
            gid,
            members.len(),
            mass.mass
        );
    }

    /// Destroy groups left without shapes.
    fn prune(&mut self, touched: &BTreeSet<GroupId>, physics: &mut dyn PhysicsBackend) {
        for &gid in touched {
            if !self.groups.get(gid).is_some_and(|g| g.shapes().is_empty()) {
                continue;
            }
            if let Some(group) = self.groups.remove(gid) {
                if let Some(body) = group.body() {
                    physics.remove_body(body);
                }
            }
            if self.static_group == Some(gid) {
                self.static_group = None;
            }
        }
    }
}

/// Group contributing the most shapes. Ties go to the lowest id so
/// repeated passes pick the same group.
fn most_shapes<'a>(candidates: impl Iterator<Item = (&'a GroupId, &'a usize)>) -> Option<GroupId> {
    candidates
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
        .map(|(g, _)| *g)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debounce_window() {
        let mut p = Partitioner::new(0.05);
        assert!(!p.is_due(10.0), "nothing dirty");
        let id = ShapeId {
            index: 0,
            generation: 0,
        };
        p.mark_dirty(id, 1.0);
        p.mark_dirty(id, 1.04);
        assert!(!p.is_due(1.04));
        assert!(p.is_due(1.05));
        assert_eq!(p.take_dirty(), vec![id]);
        assert!(!p.has_dirty());
        assert!(!p.is_due(2.0));
    }
}
