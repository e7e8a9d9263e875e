use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use settlement_planner::config::PlannerConfig;
use settlement_planner::errors::PlannerResult;
use settlement_planner::placement::{BlockLog, BlockPlacer};
use settlement_planner::plan::TerritoryPlan;
use settlement_planner::session::PlacementSession;
use settlement_planner::terrain::{BuildArea, HeightField, TerrainSource};
use settlement_planner::terrain_generation::{ImageTerrain, TerrainGenerator};
use settlement_planner::territory::{District, StructureGenerator, TerritoryAllocator, border_points};
use std::path::PathBuf;

const WALL_HEIGHT: i32 = 4;

/// Where the terrain of a run comes from
pub enum TerrainInput {
    Generated {
        generator: TerrainGenerator,
        area: BuildArea,
    },
    Heightmap {
        path: PathBuf,
        origin: IVec2,
        min_height: i32,
        max_height: i32,
    },
}

pub struct PlanGenerationConfig {
    pub name: String,
    pub terrain: TerrainInput,
    pub planner: PlannerConfig,
    pub seed: u64,
    pub gates_per_district: u32,
}

/// What a run produced besides the plan itself
pub struct PlanOutcome {
    pub plan: TerritoryPlan,
    pub placed_blocks: usize,
    pub requested_districts: usize,
}

/// Rings every district with a low wall along its footprint border and cuts
/// gates where random rays leave the footprint
pub struct PerimeterWallGenerator<R> {
    rng: R,
    gate_count: u32,
    wall_height: i32,
}

impl<R: Rng> PerimeterWallGenerator<R> {
    pub fn new(rng: R, gate_count: u32) -> Self {
        Self {
            rng,
            gate_count,
            wall_height: WALL_HEIGHT,
        }
    }
}

impl<R: Rng> StructureGenerator for PerimeterWallGenerator<R> {
    fn generate(
        &mut self,
        district: &District,
        height_field: &HeightField,
        placer: &mut dyn BlockPlacer,
    ) -> Vec<IVec3> {
        let footprint = district.footprint_set();
        let gates: Vec<IVec2> = border_points(
            &mut self.rng,
            &footprint,
            district.center,
            self.gate_count,
            district.radius,
        );

        let wall: Vec<IVec3> = district
            .footprint
            .iter()
            .filter(|column| {
                !gates.contains(column)
                    && [IVec2::X, IVec2::NEG_X, IVec2::Y, IVec2::NEG_Y]
                        .iter()
                        .any(|offset| !footprint.contains(&(**column + *offset)))
            })
            .filter_map(|column| height_field.height_at(column.x, column.y).map(|y| (column, y)))
            .flat_map(|(column, ground)| {
                (0..self.wall_height).map(move |dy| IVec3::new(column.x, ground + dy, column.y))
            })
            .collect();
        placer.place(&wall);

        let mut gates: Vec<IVec3> = gates
            .into_iter()
            .filter_map(|gate| height_field.coord_to_ground(gate.x, gate.y).ok())
            .collect();
        gates.sort_by_key(|gate| (gate.x, gate.z));
        gates.dedup();
        debug!(
            "District {}: {} wall blocks, {} gates",
            district.id,
            wall.len(),
            gates.len()
        );
        gates
    }
}

pub struct PlanGenerator;

impl PlanGenerator {
    fn load_terrain(input: TerrainInput) -> PlannerResult<Box<dyn TerrainSource>> {
        match input {
            TerrainInput::Generated { generator, area } => {
                println!(
                    "Generating {}x{} terrain at {} (seed: {})",
                    area.width, area.depth, area.origin, generator.seed
                );
                Ok(Box::new(generator.generate(area)?))
            }
            TerrainInput::Heightmap {
                path,
                origin,
                min_height,
                max_height,
            } => {
                println!(
                    "Reading heightmap {} (heights {min_height}..={max_height})",
                    path.display()
                );
                Ok(Box::new(ImageTerrain::open(
                    &path, origin, min_height, max_height,
                )?))
            }
        }
    }

    pub fn generate(config: PlanGenerationConfig) -> PlannerResult<PlanOutcome> {
        println!("Generating plan: {name}", name = config.name);
        let terrain = Self::load_terrain(config.terrain)?;

        let mut session =
            PlacementSession::from_source(terrain.as_ref(), config.planner.terrain.max_ground_scan)?
                .with_road_max_step(config.planner.roads.max_step);

        let allocation = config.planner.to_allocation_config();
        let requested_districts = allocation.districts.len();
        println!("Placing {requested_districts} districts");

        let mut generator = PerimeterWallGenerator::new(
            Pcg64::seed_from_u64(config.seed.wrapping_add(1)),
            config.gates_per_district,
        );
        let mut log = BlockLog::default();
        let plan = TerritoryAllocator::new(&mut session, allocation, Pcg64::seed_from_u64(config.seed))
            .run(&mut generator, &mut log)?;

        Ok(PlanOutcome {
            plan,
            placed_blocks: log.blocks.len(),
            requested_districts,
        })
    }
}
