use glam::Vec2;
use shatter_core::constants::{FIXED_STRENGTH, FULL_OCCUPANCY};
use shatter_core::rng::{cell_hash, hash_to_unit};
use shatter_world::{Anchor, LevelImage};

/// What a scene does to the terrain each step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CutScript {
    /// A thin line sweeping across the level, one column band per step.
    Sweep { thickness: f32 },
    /// Disks dropped at hashed positions.
    Craters { radius: f32 },
    /// Alternate lines and disks.
    Mixed { thickness: f32, radius: f32 },
}

/// Configuration for a single benchmark scene.
pub struct SceneConfig {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
    pub sector_size: u32,
    /// Fraction of the level height pinned by the bedrock anchor.
    pub anchored_fraction: f32,
    pub script: CutScript,
}

/// Return the standard suite of benchmark scenes (64x64 to 512x256 cells).
pub fn standard_scenes() -> Vec<SceneConfig> {
    vec![
        SceneConfig {
            name: "64x64-sweep",
            width: 64,
            height: 64,
            sector_size: 16,
            anchored_fraction: 0.25,
            script: CutScript::Sweep { thickness: 0.5 },
        },
        SceneConfig {
            name: "128x128-craters",
            width: 128,
            height: 128,
            sector_size: 32,
            anchored_fraction: 0.25,
            script: CutScript::Craters { radius: 4.0 },
        },
        SceneConfig {
            name: "256x128-mixed",
            width: 256,
            height: 128,
            sector_size: 32,
            anchored_fraction: 0.2,
            script: CutScript::Mixed {
                thickness: 1.0,
                radius: 6.0,
            },
        },
        SceneConfig {
            name: "512x256-craters",
            width: 512,
            height: 256,
            sector_size: 64,
            anchored_fraction: 0.1,
            script: CutScript::Craters { radius: 8.0 },
        },
    ]
}

/// Rock with hashed caves and a fixed bedrock row.
/// Material distribution: ~70% stone(1), ~20% soft soil(2), ~10% cave air.
pub fn generate_level(config: &SceneConfig, seed: u32) -> LevelImage {
    LevelImage::from_fn(config.width, config.height, |x, y| {
        if y == 0 {
            return (FULL_OCCUPANCY, FIXED_STRENGTH, 1);
        }
        let hash = cell_hash(x as i32 / 3, y as i32 / 3, seed) % 100;
        match hash {
            0..=69 => (FULL_OCCUPANCY, 40, 1),
            70..=89 => (200, 0, 2),
            _ => (0, 0, 0),
        }
    })
}

/// Bedrock anchor spanning the bottom of the level.
pub fn bedrock_anchor(config: &SceneConfig, cell_scale: f32) -> Option<Anchor> {
    let top = config.height as f32 * config.anchored_fraction * cell_scale;
    let right = config.width as f32 * cell_scale;
    Anchor::rect(Vec2::splat(-cell_scale), Vec2::new(right, top))
}

/// One scripted cut in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cut {
    Line {
        start: Vec2,
        end: Vec2,
        thickness: f32,
    },
    Disk {
        center: Vec2,
        radius: f32,
    },
}

/// The cut a scene performs at `step`.
pub fn cut_for_step(config: &SceneConfig, step: u32, cell_scale: f32) -> Cut {
    let size = Vec2::new(config.width as f32, config.height as f32) * cell_scale;
    let hashed = |salt: i32| {
        Vec2::new(
            hash_to_unit(cell_hash(step as i32, salt, 0x5eed)),
            hash_to_unit(cell_hash(salt, step as i32, 0x5eed)),
        ) * size
    };
    let sweep = |thickness: f32| {
        let x = (step % config.width) as f32 * cell_scale + 0.5 * cell_scale;
        Cut::Line {
            start: Vec2::new(x, size.y + cell_scale),
            end: Vec2::new(x + size.x * 0.1, size.y * 0.3),
            thickness,
        }
    };
    match config.script {
        CutScript::Sweep { thickness } => sweep(thickness),
        CutScript::Craters { radius } => Cut::Disk {
            center: hashed(1),
            radius,
        },
        CutScript::Mixed { thickness, radius } => {
            if step % 2 == 0 {
                sweep(thickness)
            } else {
                Cut::Disk {
                    center: hashed(2),
                    radius,
                }
            }
        }
    }
}
