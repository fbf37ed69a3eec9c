use std::collections::BTreeSet;

use glam::Vec2;
use shatter_core::config::TerrainConfig;
use shatter_core::material::MaterialTable;
use shatter_core::types::{CutKind, ShapeId};
use shatter_sim::{CutResult, HeadlessPhysics, Terrain, TerrainError, TerrainEvent};
use shatter_world::{Anchor, LevelImage};

fn terrain_with(
    level: &LevelImage,
    anchors: Vec<Anchor>,
    physics: &mut HeadlessPhysics,
) -> Terrain {
    Terrain::new(
        level,
        TerrainConfig::default(),
        MaterialTable::default(),
        anchors,
        physics,
    )
    .expect("terrain")
}

fn anchor(min: (f32, f32), max: (f32, f32)) -> Anchor {
    Anchor::rect(Vec2::new(min.0, min.1), Vec2::new(max.0, max.1)).expect("anchor")
}

/// Shape sets per group, sorted so passes can be compared.
fn membership(terrain: &Terrain) -> Vec<(bool, Vec<ShapeId>)> {
    let mut out: Vec<(bool, Vec<ShapeId>)> = terrain
        .groups()
        .map(|(_, g)| {
            let mut shapes = g.shapes().to_vec();
            shapes.sort();
            (g.is_static(), shapes)
        })
        .collect();
    out.sort();
    out
}

fn dynamic_groups(terrain: &Terrain) -> usize {
    terrain.groups().filter(|(_, g)| !g.is_static()).count()
}

#[test]
fn test_anchored_block_loads_as_one_static_shape() {
    let mut physics = HeadlessPhysics::new();
    let level = LevelImage::filled(10, 10, 255, 0);
    let terrain = terrain_with(&level, vec![anchor((-1.0, -1.0), (10.0, 10.0))], &mut physics);

    let stats = terrain.stats();
    assert_eq!(stats.shapes, 1);
    assert_eq!(stats.static_shapes, 1);
    assert_eq!(stats.dynamic_groups, 0);
    assert_eq!(physics.body_count(), 1);

    let shape = terrain.shapes().next().expect("shape");
    assert!(!shape.is_cut_off());
    assert!(shape.collider_count() > 0);
    assert!(!shape.mesh().is_empty());
}

#[test]
fn test_unanchored_block_is_dynamic_from_the_start() {
    let mut physics = HeadlessPhysics::new();
    let level = LevelImage::filled(6, 6, 255, 0);
    let mut terrain = terrain_with(&level, Vec::new(), &mut physics);

    assert_eq!(terrain.static_group(), None);
    assert_eq!(dynamic_groups(&terrain), 1);
    assert!(terrain.shapes().all(|s| s.is_cut_off()));
    let events = terrain.drain_events();
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, TerrainEvent::ShapeDetached { .. })),
        "loading free terrain is not a detach: {events:?}"
    );
}

#[test]
fn test_fixed_rock_is_static_without_anchor() {
    let mut physics = HeadlessPhysics::new();
    let level = LevelImage::from_ascii(&["XXXXXX", "XXXXXX", "XXXXXX"]).expect("level");
    let mut terrain = terrain_with(&level, Vec::new(), &mut physics);
    assert_eq!(terrain.stats().static_shapes, 1);

    let before = terrain.grid().total_occupancy();
    let result = terrain.cut_disk(Vec2::new(2.0, 1.0), 1.5, 1.0);
    assert_eq!(result, CutResult::HIT_FIXED_VOXELS);
    assert_eq!(terrain.grid().total_occupancy(), before);
    assert!(!terrain.has_pending_partition());
}

#[test]
fn test_disk_in_anchored_block_leaves_a_hole() {
    let mut physics = HeadlessPhysics::new();
    let level = LevelImage::filled(10, 10, 255, 0);
    let mut terrain = terrain_with(&level, vec![anchor((-1.0, -1.0), (10.0, 10.0))], &mut physics);

    let result = terrain.cut_disk(Vec2::new(4.5, 4.5), 1.0, 1.0);
    assert!(result.contains(CutResult::AFFECTED_VOXELS));
    assert!(terrain.has_pending_partition());
    terrain.partition_now(&mut physics);

    let stats = terrain.stats();
    assert_eq!(stats.shapes, 1, "the ring stays connected");
    assert_eq!(stats.static_shapes, 1);
    let shape = terrain.shapes().next().expect("shape");
    assert_eq!(shape.hole_count(), 1);
    assert_eq!(physics.body_count(), 1, "static body is kept");
}

#[test]
fn test_line_splits_free_block_into_two_resting_bodies() {
    let mut physics = HeadlessPhysics::new();
    let level = LevelImage::filled(10, 10, 255, 0);
    let mut terrain = terrain_with(&level, Vec::new(), &mut physics);
    terrain.drain_events();

    let result = terrain.cut_line(Vec2::new(-1.0, 4.5), Vec2::new(10.0, 4.5), 0.5, 1.0);
    assert!(result.contains(CutResult::AFFECTED_CONNECTIVITY));
    terrain.partition_now(&mut physics);

    assert_eq!(terrain.stats().shapes, 2);
    assert_eq!(dynamic_groups(&terrain), 2);
    assert_eq!(physics.body_count(), 2);
    for (_, group) in terrain.groups() {
        let dynamic = group.as_dynamic().expect("dynamic");
        assert!(dynamic.linear_velocity().length() < 1e-5);
        assert!(dynamic.angular_velocity().abs() < 1e-5);
        let body = group.body().expect("body");
        let (mass, _) = physics.mass_of(body).expect("mass");
        assert!(mass > 0.0);
    }
    // Both halves were already detached, so no new detach events.
    assert!(terrain
        .drain_events()
        .iter()
        .all(|e| !matches!(e, TerrainEvent::ShapeDetached { .. })));
}

#[test]
fn test_narrow_strip_halves_fall_separately() {
    let mut physics = HeadlessPhysics::new();
    let level = LevelImage::filled(3, 10, 255, 0);
    let mut terrain = terrain_with(&level, Vec::new(), &mut physics);

    terrain.cut_line(Vec2::new(-1.0, 4.5), Vec2::new(3.0, 4.5), 0.5, 1.0);
    terrain.partition_now(&mut physics);

    let stats = terrain.stats();
    assert_eq!(stats.shapes, 2);
    assert_eq!(stats.dynamic_groups, 2);
    assert!(stats.triangles > 0);
    for (_, group) in terrain.groups() {
        let dynamic = group.as_dynamic().expect("dynamic");
        assert_eq!(dynamic.linear_velocity(), Vec2::ZERO);
        assert_eq!(dynamic.angular_velocity(), 0.0);
    }
}

#[test]
fn test_line_along_cell_centers_still_splits_strip() {
    let mut physics = HeadlessPhysics::new();
    let level = LevelImage::filled(3, 10, 255, 0);
    let mut terrain = terrain_with(&level, Vec::new(), &mut physics);

    let result = terrain.cut_line(Vec2::new(-1.0, 5.0), Vec2::new(3.0, 5.0), 0.5, 1.0);
    assert!(result.contains(CutResult::AFFECTED_CONNECTIVITY), "got {result:?}");
    terrain.partition_now(&mut physics);

    let stats = terrain.stats();
    assert_eq!(stats.shapes, 2);
    assert_eq!(stats.dynamic_groups, 2);
    for x in 0..3 {
        assert_eq!(terrain.grid().voxel_at(x, 5).map(|v| v.owner()), Some(None));
    }
}

#[test]
fn test_shape_cuts_only_where_bodies_overlap() {
    let mut physics = HeadlessPhysics::new();
    let level = LevelImage::from_fn(12, 4, |x, _| {
        if x < 5 || x > 6 {
            (255, 0, 1)
        } else {
            (0, 0, 0)
        }
    });
    let mut terrain = terrain_with(&level, vec![anchor((-1.0, -1.0), (5.0, 4.0))], &mut physics);
    let falling = terrain
        .shapes()
        .find(|s| s.is_cut_off())
        .map(|s| s.id())
        .expect("free block");
    let ground = terrain
        .shapes()
        .find(|s| !s.is_cut_off())
        .map(|s| s.id())
        .expect("pinned block");
    let occupancy = |t: &Terrain, id: ShapeId| -> u64 {
        let shape = t.shape(id).expect("shape");
        shape
            .voxels()
            .iter()
            .map(|&v| t.grid().voxel(v).occupancy as u64)
            .sum()
    };

    assert!(terrain.cut_with_shape(falling, 1.0).is_empty(), "blocks are apart");

    let group = terrain.shape(falling).and_then(|s| s.group()).expect("group");
    let body = terrain.group(group).and_then(|g| g.body()).expect("body");
    physics.set_velocity(body, Vec2::new(-1.0, 0.0), 0.0);
    physics.step(2.5);
    terrain.step(0.01, &mut physics);

    let before = (occupancy(&terrain, ground), occupancy(&terrain, falling));
    let result = terrain.cut_with_shape(falling, 1.0);
    assert!(result.contains(CutResult::AFFECTED_VOXELS));
    assert!(occupancy(&terrain, ground) < before.0);
    assert!(occupancy(&terrain, falling) < before.1);
    assert!(terrain.has_pending_partition());
}

#[test]
fn test_collider_area_matches_shape_area() {
    let mut physics = HeadlessPhysics::new();
    let level = LevelImage::filled(10, 10, 255, 0);
    let mut terrain = terrain_with(&level, Vec::new(), &mut physics);
    terrain.cut_line(Vec2::new(-1.0, 4.5), Vec2::new(10.0, 4.5), 0.5, 1.0);
    terrain.partition_now(&mut physics);

    for (_, group) in terrain.groups() {
        let body = group.body().expect("body");
        let expected: f32 = group
            .shapes()
            .iter()
            .filter_map(|&id| terrain.shape(id))
            .map(|s| s.mass().area)
            .sum();
        let actual = physics.collider_area(body);
        assert!((actual - expected).abs() < 1e-3, "{actual} != {expected}");
    }
}

#[test]
fn test_cut_off_pieces_ignore_later_anchors() {
    let mut physics = HeadlessPhysics::new();
    let level = LevelImage::filled(10, 10, 255, 0);
    let mut terrain = terrain_with(&level, vec![anchor((-1.0, -1.0), (10.0, 4.2))], &mut physics);
    assert_eq!(terrain.stats().static_shapes, 1);

    terrain.cut_line(Vec2::new(-1.0, 4.5), Vec2::new(10.0, 4.5), 0.0, 1.0);
    terrain.partition_now(&mut physics);
    assert_eq!(terrain.stats().static_shapes, 1, "lower half stays pinned");
    assert_eq!(dynamic_groups(&terrain), 1, "upper half falls free");
    let detached = terrain
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, TerrainEvent::ShapeDetached { .. }))
        .count();
    assert_eq!(detached, 1);

    terrain.add_anchor(anchor((-1.0, -1.0), (10.0, 10.0)));
    terrain.cut_line(Vec2::new(4.5, 4.6), Vec2::new(4.5, 11.0), 0.0, 1.0);
    terrain.partition_now(&mut physics);

    assert_eq!(terrain.stats().static_shapes, 1);
    assert_eq!(dynamic_groups(&terrain), 2);
    for (_, group) in terrain.groups().filter(|(_, g)| !g.is_static()) {
        for &id in group.shapes() {
            assert!(terrain.shape(id).expect("shape").is_cut_off());
        }
    }
}

#[test]
fn test_cuts_never_add_material() {
    let mut physics = HeadlessPhysics::new();
    let level = LevelImage::filled(12, 8, 255, 0);
    let mut terrain = terrain_with(&level, vec![anchor((-1.0, -1.0), (12.0, 1.0))], &mut physics);
    let cells = terrain.grid().len();

    let mut last = terrain.grid().total_occupancy();
    for round in 0..3 {
        match round {
            0 => terrain.cut_line(Vec2::new(0.0, 7.0), Vec2::new(11.0, 2.0), 0.8, 0.6),
            1 => terrain.cut_disk(Vec2::new(6.0, 4.0), 2.0, 0.5),
            _ => terrain.cut_line(Vec2::new(3.0, -1.0), Vec2::new(3.0, 9.0), 0.0, 1.0),
        };
        terrain.partition_now(&mut physics);
        let now = terrain.grid().total_occupancy();
        assert!(now <= last, "occupancy grew from {last} to {now}");
        assert_eq!(terrain.grid().len(), cells);
        last = now;
    }
}

#[test]
fn test_zero_strength_changes_nothing() {
    let mut physics = HeadlessPhysics::new();
    let level = LevelImage::filled(8, 8, 255, 0);
    let mut terrain = terrain_with(&level, vec![anchor((-1.0, -1.0), (8.0, 8.0))], &mut physics);
    let before = terrain.grid().total_occupancy();

    assert!(terrain.cut_line(Vec2::ZERO, Vec2::splat(7.0), 2.0, 0.0).is_empty());
    assert!(terrain.cut_disk(Vec2::splat(4.0), 3.0, 0.0).is_empty());
    assert_eq!(terrain.grid().total_occupancy(), before);
    assert!(!terrain.has_pending_partition());
    terrain.step(1.0, &mut physics);
    assert!(terrain.drain_events().is_empty());
}

#[test]
fn test_repeated_partition_is_stable() {
    let mut physics = HeadlessPhysics::new();
    let level = LevelImage::filled(10, 10, 255, 0);
    let mut terrain = terrain_with(&level, vec![anchor((-1.0, -1.0), (10.0, 2.0))], &mut physics);
    terrain.cut_line(Vec2::new(-1.0, 6.5), Vec2::new(10.0, 6.5), 0.5, 1.0);
    terrain.partition_now(&mut physics);

    let first = membership(&terrain);
    let bodies = physics.body_count();
    terrain.partition_now(&mut physics);
    assert_eq!(membership(&terrain), first);
    assert_eq!(physics.body_count(), bodies);
}

#[test]
fn test_every_shape_has_one_group() {
    let mut physics = HeadlessPhysics::new();
    let level = LevelImage::filled(20, 12, 255, 0);
    let config = TerrainConfig {
        sector_size: 8,
        ..TerrainConfig::default()
    };
    let mut terrain = Terrain::new(
        &level,
        config,
        MaterialTable::default(),
        vec![anchor((-1.0, -1.0), (20.0, 1.0))],
        &mut physics,
    )
    .expect("terrain");
    terrain.cut_line(Vec2::new(-1.0, 5.5), Vec2::new(21.0, 5.5), 0.5, 1.0);
    terrain.cut_disk(Vec2::new(10.0, 2.0), 1.5, 1.0);
    terrain.partition_now(&mut physics);

    let mut listed = BTreeSet::new();
    for (gid, group) in terrain.groups() {
        for &id in group.shapes() {
            assert!(listed.insert(id), "{id:?} listed twice");
            assert_eq!(terrain.shape(id).expect("shape").group(), Some(gid));
        }
    }
    let all: BTreeSet<ShapeId> = terrain.shapes().map(|s| s.id()).collect();
    assert_eq!(listed, all);

    for shape in terrain.shapes() {
        for &v in shape.voxels() {
            assert_eq!(terrain.grid().owner(v), Some(shape.id()));
        }
    }
}

#[test]
fn test_step_publishes_cuts_and_waits_for_delay() {
    let mut physics = HeadlessPhysics::new();
    let level = LevelImage::filled(10, 10, 255, 0);
    let mut terrain = terrain_with(&level, vec![anchor((-1.0, -1.0), (10.0, 10.0))], &mut physics);

    terrain.cut_disk(Vec2::new(5.0, 5.0), 2.0, 1.0);
    assert!(terrain.drain_events().is_empty(), "events wait for step");

    terrain.step(0.01, &mut physics);
    let events = terrain.drain_events();
    match events.as_slice() {
        [TerrainEvent::CutPerformed { kind, positions }] => {
            assert_eq!(*kind, CutKind::Disk);
            assert!(!positions.is_empty());
        }
        other => panic!("unexpected events {other:?}"),
    }
    assert!(terrain.has_pending_partition());

    terrain.step(1.0, &mut physics);
    assert!(!terrain.has_pending_partition());
    assert!(terrain.drain_events().is_empty());
}

#[test]
fn test_step_follows_falling_bodies() {
    let mut physics = HeadlessPhysics::with_gravity(Vec2::new(0.0, -10.0));
    let level = LevelImage::filled(4, 4, 255, 0);
    let mut terrain = terrain_with(&level, Vec::new(), &mut physics);
    let id = terrain.shapes().next().expect("shape").id();
    let before = terrain.shape_world_bounds(id).expect("bounds");

    physics.step(0.1);
    terrain.step(0.1, &mut physics);
    let after = terrain.shape_world_bounds(id).expect("bounds");
    assert!((before.min.y - after.min.y - 0.1).abs() < 1e-4);
    assert!((before.min.x - after.min.x).abs() < 1e-4);

    // Cuts follow the body to its new place.
    let center = (after.min + after.max) * 0.5;
    assert_eq!(terrain.shape_at(center), Some(id));
    assert!(terrain
        .cut_disk(center, 1.0, 1.0)
        .contains(CutResult::AFFECTED_VOXELS));
}

#[test]
fn test_invalid_inputs_are_rejected() {
    let mut physics = HeadlessPhysics::new();
    let level = LevelImage::filled(4, 4, 255, 0);
    let bad_config = TerrainConfig {
        cell_scale: 0.0,
        ..TerrainConfig::default()
    };
    let err = Terrain::new(&level, bad_config, MaterialTable::default(), Vec::new(), &mut physics);
    assert!(matches!(err, Err(TerrainError::Config(_))));

    let mut broken = LevelImage::filled(4, 4, 255, 0);
    broken.occupancy.pop();
    let err = Terrain::new(
        &broken,
        TerrainConfig::default(),
        MaterialTable::default(),
        Vec::new(),
        &mut physics,
    );
    assert!(matches!(err, Err(TerrainError::Grid(_))));
}
