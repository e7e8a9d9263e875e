use crate::errors::{PlannerError, PlannerResult};
use crate::terrain::{BuildArea, Grid, TerrainSource};
use bevy::prelude::*;
use image::DynamicImage;
use noise::{MultiFractal, NoiseFn, Perlin, RidgedMulti};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use std::collections::HashMap;
use std::path::Path;

pub const DEFAULT_BASE_HEIGHT: i32 = 64;

const GROUND_BLOCK: &str = "minecraft:grass_block";
const SUBSOIL_BLOCK: &str = "minecraft:dirt";
const AIR_BLOCK: &str = "minecraft:air";
const LOG_BLOCK: &str = "minecraft:oak_log";
const LEAVES_BLOCK: &str = "minecraft:oak_leaves";

/// Block at `y` in a plain column whose top solid block sits at `ground`
fn column_block(ground: i32, y: i32) -> &'static str {
    match y.cmp(&ground) {
        std::cmp::Ordering::Greater => AIR_BLOCK,
        std::cmp::Ordering::Equal => GROUND_BLOCK,
        std::cmp::Ordering::Less => SUBSOIL_BLOCK,
    }
}

/// Terrain generation algorithms
#[derive(Debug, Clone)]
pub enum TerrainAlgorithm {
    Flat {
        height: f32,
    },
    Perlin {
        amplitude: f32,
        frequency: f32,
        octaves: u32,
    },
    Ridged {
        amplitude: f32,
        frequency: f32,
        octaves: u32,
    },
}

/// Noise-driven terrain generator producing block columns
#[derive(Debug, Clone)]
pub struct TerrainGenerator {
    pub seed: u32,
    pub algorithm: TerrainAlgorithm,
    /// Ground level the noise offsets are added to
    pub base_height: i32,
    /// Chance per column of growing a tree
    pub tree_density: f32,
}

impl TerrainGenerator {
    /// Create a new terrain generator
    pub fn new(seed: u32, algorithm: TerrainAlgorithm) -> Self {
        Self {
            seed,
            algorithm,
            base_height: DEFAULT_BASE_HEIGHT,
            tree_density: 0.0,
        }
    }

    pub fn with_trees(mut self, density: f32) -> Self {
        self.tree_density = density.clamp(0.0, 1.0);
        self
    }

    /// Elevation offsets for every column of the area, x-major
    fn offsets(&self, area: BuildArea) -> Grid<f64> {
        let (width, depth) = (area.width as usize, area.depth as usize);
        match &self.algorithm {
            TerrainAlgorithm::Flat { height } => Grid::filled(width, depth, *height as f64),
            TerrainAlgorithm::Perlin {
                amplitude,
                frequency,
                octaves,
            } => {
                let perlin = Perlin::new(self.seed);
                Grid::from_fn(width, depth, |x, z| {
                    let world_x = x as f64 * *frequency as f64;
                    let world_z = z as f64 * *frequency as f64;

                    let mut noise_value = 0.0;
                    let mut current_amplitude = *amplitude as f64;
                    let mut current_frequency = 1.0;
                    for _ in 0..*octaves {
                        noise_value += perlin
                            .get([world_x * current_frequency, world_z * current_frequency])
                            * current_amplitude;
                        current_amplitude *= 0.5; // Persistence
                        current_frequency *= 2.0; // Lacunarity
                    }
                    noise_value
                })
            }
            TerrainAlgorithm::Ridged {
                amplitude,
                frequency,
                octaves,
            } => {
                let ridged = RidgedMulti::<Perlin>::new(self.seed)
                    .set_octaves(*octaves as usize)
                    .set_frequency(*frequency as f64);
                Grid::from_fn(width, depth, |x, z| {
                    ridged.get([x as f64, z as f64]) * *amplitude as f64
                })
            }
        }
    }

    /// Generate terrain over `area`
    pub fn generate(&self, area: BuildArea) -> PlannerResult<SyntheticTerrain> {
        let offsets = self.offsets(area);
        let ground = Grid::from_fn(offsets.width(), offsets.depth(), |x, z| {
            self.base_height + offsets[(x, z)].round() as i32
        });
        let mut terrain = SyntheticTerrain::from_ground(area, ground)?;

        if self.tree_density > 0.0 {
            let mut rng = Pcg64::seed_from_u64(self.seed as u64);
            let mut planted = 0usize;
            for x in 0..area.width as i32 {
                for z in 0..area.depth as i32 {
                    if rng.gen_range(0.0..1.0) < self.tree_density {
                        let trunk = rng.gen_range(4..=6);
                        terrain.plant_tree(area.to_absolute(IVec2::new(x, z)), trunk);
                        planted += 1;
                    }
                }
            }
            debug!("Planted {planted} trees");
        }

        Ok(terrain)
    }
}

/// Get a predefined terrain preset
pub fn get_terrain_preset(name: &str, seed: Option<u32>) -> Option<TerrainGenerator> {
    let seed = seed.unwrap_or_else(rand::random);

    match name {
        "flat" => Some(TerrainGenerator::new(
            seed,
            TerrainAlgorithm::Flat { height: 0.0 },
        )),
        "hills" => Some(TerrainGenerator::new(
            seed,
            TerrainAlgorithm::Perlin {
                amplitude: 12.0,
                frequency: 0.01,
                octaves: 4,
            },
        )),
        "perlin" => Some(TerrainGenerator::new(
            seed,
            TerrainAlgorithm::Perlin {
                amplitude: 20.0,
                frequency: 0.02,
                octaves: 5,
            },
        )),
        "mountains" | "ridged" => Some(TerrainGenerator::new(
            seed,
            TerrainAlgorithm::Ridged {
                amplitude: 20.0,
                frequency: 0.005,
                octaves: 5,
            },
        )),
        "valleys" => Some(TerrainGenerator::new(
            seed,
            TerrainAlgorithm::Ridged {
                amplitude: -20.0, // Negative amplitude creates valleys
                frequency: 0.008,
                octaves: 4,
            },
        )),
        _ => None,
    }
}

/// In-memory terrain: solid ground columns plus scattered vegetation.
///
/// The raw surface it reports counts logs and leaves as ground, like a
/// world-surface heightmap does.
#[derive(Debug, Clone)]
pub struct SyntheticTerrain {
    area: BuildArea,
    ground: Grid<i32>,
    surface: Grid<i32>,
    vegetation: HashMap<IVec3, &'static str>,
}

impl SyntheticTerrain {
    /// Terrain with the top solid block of each column at `ground` (x-major)
    pub fn from_ground(area: BuildArea, ground: Grid<i32>) -> PlannerResult<Self> {
        if ground.width() != area.width as usize || ground.depth() != area.depth as usize {
            return Err(PlannerError::HeightmapSizeMismatch {
                expected: area.column_count(),
                actual: ground.cells().len(),
            });
        }
        let surface = Grid::from_fn(ground.width(), ground.depth(), |x, z| ground[(x, z)] + 1);
        Ok(Self {
            area,
            ground,
            surface,
            vegetation: HashMap::new(),
        })
    }

    pub fn flat(area: BuildArea, ground: i32) -> Self {
        let (width, depth) = (area.width as usize, area.depth as usize);
        Self {
            area,
            ground: Grid::filled(width, depth, ground),
            surface: Grid::filled(width, depth, ground + 1),
            vegetation: HashMap::new(),
        }
    }

    pub fn ground_at(&self, x: i32, z: i32) -> Option<i32> {
        let (rx, rz) = self.area.relative_index(IVec2::new(x, z))?;
        Some(self.ground[(rx, rz)])
    }

    fn set_block(&mut self, position: IVec3, block: &'static str) {
        let Some((rx, rz)) = self.area.relative_index(position.xz()) else {
            return;
        };
        if position.y <= self.ground[(rx, rz)] {
            return;
        }
        self.vegetation.insert(position, block);
        let surface = &mut self.surface[(rx, rz)];
        *surface = (*surface).max(position.y + 1);
    }

    /// Grow a log trunk on an absolute column, capped with leaves on top and
    /// around its crown
    pub fn plant_tree(&mut self, column: IVec2, trunk_height: i32) {
        let Some(ground) = self.ground_at(column.x, column.y) else {
            return;
        };
        for dy in 1..=trunk_height {
            self.set_block(IVec3::new(column.x, ground + dy, column.y), LOG_BLOCK);
        }
        let crown = ground + trunk_height;
        self.set_block(IVec3::new(column.x, crown + 1, column.y), LEAVES_BLOCK);
        for offset in [IVec2::X, IVec2::NEG_X, IVec2::Y, IVec2::NEG_Y] {
            let leaf = column + offset;
            for y in [crown, crown + 1] {
                let position = IVec3::new(leaf.x, y, leaf.y);
                if !self.vegetation.contains_key(&position) {
                    self.set_block(position, LEAVES_BLOCK);
                }
            }
        }
    }

    pub fn tree_block_count(&self) -> usize {
        self.vegetation.len()
    }
}

impl TerrainSource for SyntheticTerrain {
    fn build_area(&self) -> BuildArea {
        self.area
    }

    fn surface_height(&self, x: i32, z: i32) -> i32 {
        self.area
            .relative_index(IVec2::new(x, z))
            .map(|(rx, rz)| self.surface[(rx, rz)])
            .unwrap_or(DEFAULT_BASE_HEIGHT)
    }

    fn block_id(&self, position: IVec3) -> &str {
        if let Some(&block) = self.vegetation.get(&position) {
            return block;
        }
        match self.ground_at(position.x, position.z) {
            Some(ground) => column_block(ground, position.y),
            None => AIR_BLOCK,
        }
    }
}

/// Terrain read from a grayscale heightmap image. Image x maps to world x,
/// image y to world z.
#[derive(Debug, Clone)]
pub struct ImageTerrain {
    area: BuildArea,
    ground: Grid<i32>,
}

impl ImageTerrain {
    pub fn open(path: &Path, origin: IVec2, min_height: i32, max_height: i32) -> PlannerResult<Self> {
        let image = image::open(path)?;
        info!(
            "Loaded heightmap {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Self::from_image(&image, origin, min_height, max_height)
    }

    /// Map luminance linearly onto `[min_height, max_height]`
    pub fn from_image(
        image: &DynamicImage,
        origin: IVec2,
        min_height: i32,
        max_height: i32,
    ) -> PlannerResult<Self> {
        let luma = image.to_luma16();
        let area = BuildArea::new(origin, luma.width(), luma.height())?;
        let span = (max_height - min_height) as f32;
        let ground = Grid::from_fn(area.width as usize, area.depth as usize, |x, z| {
            let value = luma.get_pixel(x as u32, z as u32).0[0] as f32 / u16::MAX as f32;
            min_height + (value * span).round() as i32
        });
        Ok(Self { area, ground })
    }

    pub fn ground_at(&self, x: i32, z: i32) -> Option<i32> {
        let (rx, rz) = self.area.relative_index(IVec2::new(x, z))?;
        Some(self.ground[(rx, rz)])
    }
}

impl TerrainSource for ImageTerrain {
    fn build_area(&self) -> BuildArea {
        self.area
    }

    fn surface_height(&self, x: i32, z: i32) -> i32 {
        self.ground_at(x, z).map_or(DEFAULT_BASE_HEIGHT, |ground| ground + 1)
    }

    fn block_id(&self, position: IVec3) -> &str {
        match self.ground_at(position.x, position.z) {
            Some(ground) => column_block(ground, position.y),
            None => AIR_BLOCK,
        }
    }
}
