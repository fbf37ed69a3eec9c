use std::path::PathBuf;
use std::process;

use shatter_bench::report;
use shatter_bench::runner::BenchmarkRunner;
use shatter_bench::scenes;
use shatter_core::config::TerrainConfig;
use shatter_core::material::load_materials_from_str;

const DEFAULT_CONFIG: &str = include_str!("../../../data/terrain.ron");
const DEFAULT_MATERIALS: &str = include_str!("../../../data/materials.ron");

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();

    let mut baseline_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut regression_threshold = 10.0f64;
    let mut step_count = 120u32;
    let mut scene_filter: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--baseline" => {
                i += 1;
                baseline_path = Some(PathBuf::from(arg_value(&args, i)));
            }
            "--output" => {
                i += 1;
                output_path = Some(PathBuf::from(arg_value(&args, i)));
            }
            "--config" => {
                i += 1;
                config_path = Some(PathBuf::from(arg_value(&args, i)));
            }
            "--regression-threshold" => {
                i += 1;
                regression_threshold = parse_or_exit(arg_value(&args, i), "--regression-threshold");
            }
            "--steps" => {
                i += 1;
                step_count = parse_or_exit(arg_value(&args, i), "--steps");
            }
            "--scene" => {
                i += 1;
                scene_filter = Some(arg_value(&args, i).to_string());
            }
            "--help" | "-h" => {
                eprintln!("Usage: bench-runner [OPTIONS]");
                eprintln!("  --baseline <path>              Load baseline JSON for comparison");
                eprintln!("  --output <path>                Save current results as JSON baseline");
                eprintln!("  --config <path>                Terrain config RON (default: data/terrain.ron)");
                eprintln!(
                    "  --regression-threshold <pct>   Regression threshold percentage (default: 10)"
                );
                eprintln!("  --steps <n>                    Steps per scene (default: 120)");
                eprintln!("  --scene <name>                 Only run scenes whose name contains <name>");
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    let config_src = match &config_path {
        Some(path) => std::fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("Cannot read {}: {e}", path.display());
            process::exit(1);
        }),
        None => DEFAULT_CONFIG.to_string(),
    };
    let config = TerrainConfig::from_ron_str(&config_src).unwrap_or_else(|e| {
        eprintln!("Invalid terrain config: {e}");
        process::exit(1);
    });
    let materials = load_materials_from_str(DEFAULT_MATERIALS).unwrap_or_else(|e| {
        eprintln!("Invalid material data: {e}");
        process::exit(1);
    });
    log::info!(
        "Cell scale {}, {} materials, {} steps per scene",
        config.cell_scale,
        materials.len(),
        step_count
    );

    let runner = BenchmarkRunner::new(config, materials, step_count);

    let scene_configs: Vec<_> = scenes::standard_scenes()
        .into_iter()
        .filter(|s| scene_filter.as_deref().map_or(true, |f| s.name.contains(f)))
        .collect();
    let mut results = Vec::new();

    for scene in &scene_configs {
        match runner.run_scene(scene) {
            Ok(result) => results.push(result),
            Err(e) => {
                eprintln!("Scene '{}' failed: {e}", scene.name);
                process::exit(1);
            }
        }
    }

    // Print markdown summary
    println!("\n## Benchmark Results\n");
    println!("{}", report::format_markdown(&results));

    if let Some(ref path) = output_path {
        let baseline = report::Baseline {
            timestamp: run_label(),
            results: results.clone(),
        };
        if let Err(e) = report::save_baseline(path, &baseline) {
            eprintln!("Failed to save baseline: {e}");
            process::exit(1);
        }
        log::info!("Saved baseline to {}", path.display());
    }

    if let Some(ref path) = baseline_path {
        if let Some(baseline) = report::load_baseline(path) {
            let regressions = report::compare(&results, &baseline, regression_threshold);
            println!(
                "{}",
                report::format_comparison(&regressions, regression_threshold)
            );
            if !regressions.is_empty() {
                eprintln!(
                    "ERROR: {} regressions detected, exiting with code 1",
                    regressions.len()
                );
                process::exit(1);
            }
        } else {
            log::warn!("Baseline file not found: {}", path.display());
        }
    }

    log::info!("Benchmark complete.");
}

fn arg_value(args: &[String], i: usize) -> &str {
    match args.get(i) {
        Some(v) => v.as_str(),
        None => {
            eprintln!("Missing value for {}", args[i - 1]);
            process::exit(1);
        }
    }
}

fn parse_or_exit<T: std::str::FromStr>(value: &str, flag: &str) -> T {
    value.parse().unwrap_or_else(|_| {
        eprintln!("invalid {flag} value: {value}");
        process::exit(1);
    })
}

/// Seconds since the Unix epoch; enough to tell baselines apart.
fn run_label() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("bench-{secs}")
}
