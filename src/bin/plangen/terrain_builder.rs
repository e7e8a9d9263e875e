use settlement_planner::errors::{PlannerError, PlannerResult};
use settlement_planner::terrain_generation::{TerrainAlgorithm, TerrainGenerator, get_terrain_preset};

pub struct TerrainBuilder {
    terrain_type: String,
    seed: Option<u32>,
    amplitude: Option<f32>,
    frequency: Option<f32>,
    octaves: Option<u32>,
    base_height: Option<i32>,
    tree_density: f32,
}

impl TerrainBuilder {
    pub fn new(terrain_type: String) -> Self {
        Self {
            terrain_type,
            seed: None,
            amplitude: None,
            frequency: None,
            octaves: None,
            base_height: None,
            tree_density: 0.0,
        }
    }

    pub fn seed(mut self, seed: Option<u32>) -> Self {
        self.seed = seed;
        self
    }

    pub fn amplitude(mut self, amplitude: Option<f32>) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn frequency(mut self, frequency: Option<f32>) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn octaves(mut self, octaves: Option<u32>) -> Self {
        self.octaves = octaves;
        self
    }

    pub fn base_height(mut self, base_height: Option<i32>) -> Self {
        self.base_height = base_height;
        self
    }

    pub fn trees(mut self, density: f32) -> Self {
        self.tree_density = density;
        self
    }

    fn has_manual_parameters(&self) -> bool {
        self.amplitude.is_some() || self.frequency.is_some() || self.octaves.is_some()
    }

    pub fn build(self) -> PlannerResult<TerrainGenerator> {
        let Some(mut generator) = get_terrain_preset(&self.terrain_type, self.seed) else {
            return Err(PlannerError::InvalidConfig {
                reason: format!(
                    "Unknown terrain type: '{}'. Available: flat, hills, perlin, mountains, ridged, valleys",
                    self.terrain_type
                ),
            });
        };

        if self.has_manual_parameters() {
            generator.algorithm = self.override_preset_params(generator.algorithm);
        }
        if let Some(base_height) = self.base_height {
            generator.base_height = base_height;
        }
        Ok(generator.with_trees(self.tree_density))
    }

    fn override_preset_params(&self, algorithm: TerrainAlgorithm) -> TerrainAlgorithm {
        match algorithm {
            TerrainAlgorithm::Flat { height } => {
                println!(
                    "Warning: Manual terrain parameters (amplitude, frequency, octaves) are ignored for 'flat' terrain type"
                );
                TerrainAlgorithm::Flat { height }
            }
            TerrainAlgorithm::Perlin {
                amplitude,
                frequency,
                octaves,
            } => TerrainAlgorithm::Perlin {
                amplitude: self.amplitude.unwrap_or(amplitude),
                frequency: self.frequency.unwrap_or(frequency),
                octaves: self.octaves.unwrap_or(octaves),
            },
            TerrainAlgorithm::Ridged {
                amplitude,
                frequency,
                octaves,
            } => TerrainAlgorithm::Ridged {
                amplitude: self.amplitude.unwrap_or(amplitude),
                frequency: self.frequency.unwrap_or(frequency),
                octaves: self.octaves.unwrap_or(octaves),
            },
        }
    }
}
