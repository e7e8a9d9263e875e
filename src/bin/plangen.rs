use bevy::log::tracing_subscriber::{self, EnvFilter};
use clap::Parser;
use settlement_planner::config::{PlannerConfig, load_config, load_config_from};
use settlement_planner::errors::PlannerResult;
use settlement_planner::plan::RoadKind;
use settlement_planner::terrain::BuildArea;
use std::path::{Path, PathBuf};

mod plangen {
    pub mod cli_utils;
    pub mod plan_generator;
    pub mod terrain_builder;
}

use plangen::cli_utils::*;
use plangen::plan_generator::{PlanGenerationConfig, PlanGenerator, PlanOutcome, TerrainInput};
use plangen::terrain_builder::TerrainBuilder;

#[derive(Parser, Clone)]
#[command(name = "plangen")]
#[command(about = "Place districts on terrain and connect them with roads")]
struct Args {
    /// Plan name
    #[arg(long, default_value = "settlement")]
    name: String,

    /// Build area size in blocks (format: WIDTHxDEPTH)
    #[arg(long, default_value = "128x128")]
    size: String,

    /// Absolute corner of the build area (format: X,Z)
    #[arg(long, default_value = "0,0", allow_hyphen_values = true)]
    origin: String,

    /// Output file path relative to plans/ directory (e.g., "run.plan" or "folder/run.plan")
    #[arg(long)]
    output: Option<String>,

    /// Terrain type preset (flat, hills, perlin, mountains, ridged, valleys)
    #[arg(long, default_value = "hills")]
    terrain_type: String,

    /// Grayscale heightmap image to read instead of generating terrain
    #[arg(long)]
    heightmap: Option<PathBuf>,

    /// Height of the darkest heightmap pixel
    #[arg(long, default_value = "60")]
    min_height: i32,

    /// Height of the brightest heightmap pixel
    #[arg(long, default_value = "100")]
    max_height: i32,

    /// Random seed for reproducible runs
    #[arg(long)]
    seed: Option<u32>,

    /// Terrain amplitude (overrides the preset)
    #[arg(long)]
    amplitude: Option<f32>,

    /// Base noise frequency (overrides the preset)
    #[arg(long)]
    frequency: Option<f32>,

    /// Number of noise octaves (overrides the preset)
    #[arg(long)]
    octaves: Option<u32>,

    /// Ground level generated terrain is built around
    #[arg(long)]
    base_height: Option<i32>,

    /// Tree density (0.0-1.0, chance per column)
    #[arg(long, default_value = "0.0")]
    trees: f32,

    /// Districts as RADIUS:MIN_SCORE pairs (e.g., "70:0.01,30:0.2"), replacing the configured ones
    #[arg(long)]
    districts: Option<String>,

    /// Gates cut into each district wall
    #[arg(long, default_value = "4")]
    gates: u32,

    /// Config file to use instead of the user config
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn planner_config(args: &Args) -> PlannerResult<PlannerConfig> {
    let mut config = match &args.config {
        Some(path) => load_config_from(path)?,
        None => load_config(),
    };
    if let Some(districts) = &args.districts {
        config.districts.requests = parse_districts(districts)?;
    }
    Ok(config)
}

fn main() -> PlannerResult<()> {
    init_logging();
    let args = Args::parse();

    // Parse and validate all CLI arguments
    let (width, depth) = parse_size(&args.size)?;
    let origin = parse_origin(&args.origin)?;
    let planner = planner_config(&args)?;
    let seed = args.seed.unwrap_or_else(rand::random);
    let output_filename = args
        .output
        .clone()
        .unwrap_or_else(|| format!("{}.plan", args.name));

    // Validate output path early to catch obvious issues
    validate_output_path(&output_filename)?;

    let terrain = match args.heightmap.clone() {
        Some(path) => TerrainInput::Heightmap {
            path,
            origin,
            min_height: args.min_height,
            max_height: args.max_height,
        },
        None => TerrainInput::Generated {
            generator: TerrainBuilder::new(args.terrain_type.clone())
                .seed(Some(seed))
                .amplitude(args.amplitude)
                .frequency(args.frequency)
                .octaves(args.octaves)
                .base_height(args.base_height)
                .trees(validate_density(args.trees))
                .build()?,
            area: BuildArea::new(origin, width, depth)?,
        },
    };

    let outcome = PlanGenerator::generate(PlanGenerationConfig {
        name: args.name.clone(),
        terrain,
        planner,
        seed: seed as u64,
        gates_per_district: args.gates,
    })?;

    // Save and display results
    let path = outcome.plan.save_to_file(&output_filename)?;

    print_plan_summary(&outcome, &path);
    Ok(())
}

fn print_plan_summary(outcome: &PlanOutcome, path: &Path) {
    let plan = &outcome.plan;

    println!("Plan saved successfully to: {}", path.display());
    println!("\nPlan summary:");
    println!(
        "  Build area: {}x{} at {}",
        plan.area.width, plan.area.depth, plan.area.origin
    );
    println!(
        "  Districts: {} placed out of {} requested",
        plan.districts.len(),
        outcome.requested_districts
    );
    println!(
        "  Roads: {} between districts, {} from gates",
        plan.road_count(RoadKind::BetweenDistricts),
        plan.road_count(RoadKind::GateAccess)
    );
    println!("  Structure blocks placed: {}", outcome.placed_blocks);

    for district in &plan.districts {
        println!(
            "    District {}: center={}, ground y={}, radius={}, score={:.3}, columns={}, gates={}",
            district.id,
            district.center,
            district.ground.y,
            district.radius,
            district.score,
            district.footprint.len(),
            district.gates.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from([
            "plangen",
            "--size",
            "64x96",
            "--origin",
            "-32,16",
            "--terrain-type",
            "flat",
            "--seed",
            "12345",
            "--districts",
            "20:0.1,10:0.01",
        ]);

        assert_eq!(parse_size(&args.size).unwrap(), (64, 96));
        assert_eq!(
            parse_origin(&args.origin).unwrap(),
            bevy::prelude::IVec2::new(-32, 16)
        );

        let config = planner_config(&args).unwrap();
        assert_eq!(config.districts.requests.len(), 2);
        assert_eq!(config.districts.requests[0].radius, 20);

        let generator = TerrainBuilder::new(args.terrain_type.clone())
            .seed(args.seed)
            .build()
            .unwrap();
        assert_eq!(generator.seed, 12345);
    }
}
