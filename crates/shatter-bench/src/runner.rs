use std::time::Instant;

use shatter_core::config::TerrainConfig;
use shatter_core::constants::PHYSICS_TIMESTEP;
use shatter_core::material::MaterialTable;
use shatter_sim::{HeadlessPhysics, Terrain, TerrainError, TerrainStats};

use crate::scenes::{bedrock_anchor, cut_for_step, generate_level, Cut, SceneConfig};

/// Timing data for a single benchmark run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TimingSeries {
    pub mean_ms: f64,
    pub median_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

/// Result of a single scene benchmark.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BenchmarkResult {
    pub scene_name: String,
    pub cells: u32,
    pub step_count: u32,
    pub load_ms: f64,
    pub final_shapes: usize,
    pub final_dynamic_groups: usize,
    pub final_triangles: usize,
    pub timings: TimingSeries,
}

/// Runs scenes against the headless physics backend.
pub struct BenchmarkRunner {
    config: TerrainConfig,
    materials: MaterialTable,
    step_count: u32,
}

impl BenchmarkRunner {
    pub fn new(config: TerrainConfig, materials: MaterialTable, step_count: u32) -> Self {
        Self {
            config,
            materials,
            step_count,
        }
    }

    /// Run a single benchmark scene and return timing results.
    ///
    /// Each timed step is one scripted cut, one physics step and one
    /// terrain step (which partitions whenever the debounce window ends).
    pub fn run_scene(&self, scene: &SceneConfig) -> Result<BenchmarkResult, TerrainError> {
        log::info!(
            "Running scene '{}' ({}x{} cells)...",
            scene.name,
            scene.width,
            scene.height
        );

        let config = TerrainConfig {
            sector_size: scene.sector_size,
            ..self.config.clone()
        };
        let cell = config.cell_scale;
        let level = generate_level(scene, config.seed);
        let anchors = bedrock_anchor(scene, cell).into_iter().collect();
        let mut physics = HeadlessPhysics::with_gravity(glam::Vec2::new(0.0, -9.81));

        let load_start = Instant::now();
        let mut terrain = Terrain::new(&level, config, self.materials.clone(), anchors, &mut physics)?;
        let load_ms = load_start.elapsed().as_secs_f64() * 1000.0;
        log::info!("  Loaded in {load_ms:.2}ms: {}", describe(&terrain.stats()));

        let dt = PHYSICS_TIMESTEP;
        let mut now = 0.0;
        let mut step_times = Vec::with_capacity(self.step_count as usize);
        for step in 0..self.step_count {
            let step_start = Instant::now();

            match cut_for_step(scene, step, cell) {
                Cut::Line {
                    start,
                    end,
                    thickness,
                } => terrain.cut_line(start, end, thickness, 1.0),
                Cut::Disk { center, radius } => terrain.cut_disk(center, radius, 1.0),
            };
            physics.step(dt as f32);
            now += dt;
            terrain.step(now, &mut physics);
            terrain.drain_events();

            step_times.push(step_start.elapsed().as_secs_f64() * 1000.0);
        }
        // Settle whatever the last cuts left pending.
        terrain.partition_now(&mut physics);

        let stats = terrain.stats();
        let timings = compute_timings(&step_times);
        log::info!(
            "  Done: mean={:.2}ms, p95={:.2}ms, p99={:.2}ms, {}",
            timings.mean_ms,
            timings.p95_ms,
            timings.p99_ms,
            describe(&stats)
        );

        Ok(BenchmarkResult {
            scene_name: scene.name.to_string(),
            cells: scene.width * scene.height,
            step_count: self.step_count,
            load_ms,
            final_shapes: stats.shapes,
            final_dynamic_groups: stats.dynamic_groups,
            final_triangles: stats.triangles,
            timings,
        })
    }
}

fn describe(stats: &TerrainStats) -> String {
    format!(
        "{} shapes ({} static), {} dynamic groups, {} triangles",
        stats.shapes, stats.static_shapes, stats.dynamic_groups, stats.triangles
    )
}

/// Compute timing statistics from a list of step times in milliseconds.
pub fn compute_timings(times: &[f64]) -> TimingSeries {
    if times.is_empty() {
        return TimingSeries {
            mean_ms: 0.0,
            median_ms: 0.0,
            p95_ms: 0.0,
            p99_ms: 0.0,
            min_ms: 0.0,
            max_ms: 0.0,
        };
    }

    let mut sorted = times.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };
    let p95_idx = ((n as f64) * 0.95).ceil() as usize;
    let p99_idx = ((n as f64) * 0.99).ceil() as usize;

    TimingSeries {
        mean_ms: mean,
        median_ms: median,
        p95_ms: sorted[p95_idx.min(n - 1)],
        p99_ms: sorted[p99_idx.min(n - 1)],
        min_ms: sorted[0],
        max_ms: sorted[n - 1],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenes::{CutScript, SceneConfig};

    #[test]
    fn test_timing_stats() {
        let t = compute_timings(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(t.min_ms, 1.0);
        assert_eq!(t.max_ms, 4.0);
        assert_eq!(t.median_ms, 2.5);
        assert_eq!(t.mean_ms, 2.5);
        assert_eq!(t.p95_ms, 4.0);
        assert_eq!(compute_timings(&[]).max_ms, 0.0);
    }

    #[test]
    fn test_small_scene_runs() {
        let scene = SceneConfig {
            name: "tiny",
            width: 24,
            height: 16,
            sector_size: 8,
            anchored_fraction: 0.25,
            script: CutScript::Mixed {
                thickness: 0.5,
                radius: 2.0,
            },
        };
        let runner = BenchmarkRunner::new(TerrainConfig::default(), MaterialTable::default(), 6);
        let result = runner.run_scene(&scene).expect("scene");
        assert_eq!(result.step_count, 6);
        assert_eq!(result.cells, 384);
        assert!(result.timings.min_ms <= result.timings.max_ms);
        assert!(result.final_shapes > 0, "the bedrock row survives");
    }
}
