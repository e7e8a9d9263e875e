use crate::errors::{PlannerError, PlannerResult};
use crate::placement::ScoreWeights;
use crate::terrain::constants::*;
use crate::territory::{AllocationConfig, DistrictRequest};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use validator::Validate;

pub mod range_types;

use range_types::*;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Validate)]
#[serde(default)]
// NOTE: When adding new sections, keep the defaults in step with terrain::constants
pub struct PlannerConfig {
    #[validate(nested)]
    pub scoring: ScoringSettings,
    #[validate(nested)]
    pub districts: DistrictSettings,
    #[validate(nested)]
    pub region: RegionSettings,
    #[validate(nested)]
    pub roads: RoadSettings,
    #[validate(nested)]
    pub terrain: TerrainSettings,
}

/// Sub-score weights used when placing districts
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Validate)]
#[serde(default)]
pub struct ScoringSettings {
    pub flatness: ScoreFactor,
    pub height: ScoreFactor,
    pub centerness: ScoreFactor,
    pub bonus: ScoreFactor,
    #[validate(range(max = 64))]
    pub bonus_window: u32,
    pub apply_bonus: bool,
    pub bonus_multiplier: BonusMultiplier,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            flatness: ScoreFactor::new(DEFAULT_DISTRICT_FLATNESS),
            height: ScoreFactor::new(DEFAULT_DISTRICT_HEIGHT),
            centerness: ScoreFactor::new(DEFAULT_DISTRICT_CENTERNESS),
            bonus: ScoreFactor::default(),
            bonus_window: DEFAULT_BONUS_WINDOW,
            apply_bonus: true,
            bonus_multiplier: BonusMultiplier::new(DEFAULT_BONUS_MULTIPLIER),
        }
    }
}

/// One requested district as written in the config file
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Validate)]
pub struct DistrictSpec {
    #[validate(range(min = 1, max = 4096))]
    pub radius: u32,
    pub min_score: MinScore,
}

impl Default for DistrictSpec {
    fn default() -> Self {
        Self {
            radius: DEFAULT_DISTRICT_RADIUS,
            min_score: MinScore::new(DEFAULT_DISTRICT_TOLERANCE),
        }
    }
}

impl From<DistrictSpec> for DistrictRequest {
    fn from(spec: DistrictSpec) -> Self {
        DistrictRequest {
            radius: spec.radius,
            min_score: spec.min_score.get(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Validate)]
#[serde(default)]
pub struct DistrictSettings {
    #[validate(range(min = 1, max = 256))]
    pub sampling: u32,
    #[validate(range(min = 1, max = 1000))]
    pub max_attempts: u32,
    #[validate(range(min = 1, max = 64))]
    pub radius_step: u32,
    pub allow_adjacent: bool,
    #[validate(nested)]
    pub requests: Vec<DistrictSpec>,
}

impl Default for DistrictSettings {
    fn default() -> Self {
        Self {
            sampling: DEFAULT_DISTRICT_SAMPLING,
            max_attempts: DEFAULT_PLACEMENT_ATTEMPTS,
            radius_step: DEFAULT_RADIUS_STEP,
            allow_adjacent: true,
            requests: vec![DistrictSpec::default()],
        }
    }
}

/// Footprint growth limits
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Validate)]
#[serde(default)]
pub struct RegionSettings {
    #[validate(range(min = 0, max = 255))]
    pub max_rel_diff: i32,
    #[validate(range(min = 0, max = 255))]
    pub max_abs_diff: i32,
}

impl Default for RegionSettings {
    fn default() -> Self {
        Self {
            max_rel_diff: DEFAULT_MAX_REL_DIFF,
            max_abs_diff: DEFAULT_MAX_ABS_DIFF,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Validate)]
#[serde(default)]
pub struct RoadSettings {
    /// Largest elevation step a road edge may bridge
    #[validate(range(min = 0, max = 255))]
    pub max_step: i32,
    #[validate(range(max = 256))]
    pub gate_road_count: u32,
    pub gate_road_radius_factor: RadiusFactor,
}

impl Default for RoadSettings {
    fn default() -> Self {
        Self {
            max_step: DEFAULT_ROAD_MAX_STEP,
            gate_road_count: DEFAULT_GATE_ROAD_COUNT,
            gate_road_radius_factor: RadiusFactor::new(DEFAULT_GATE_ROAD_RADIUS_FACTOR),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Validate)]
#[serde(default)]
pub struct TerrainSettings {
    /// How far below the raw surface the vegetation correction may look
    #[validate(range(min = 1, max = 512))]
    pub max_ground_scan: u32,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            max_ground_scan: DEFAULT_MAX_GROUND_SCAN,
        }
    }
}

impl PlannerConfig {
    /// Re-apply the newtype ranges, which deserialization bypasses
    pub fn clamped(mut self) -> Self {
        let scoring = &mut self.scoring;
        scoring.flatness = ScoreFactor::new(scoring.flatness.get());
        scoring.height = ScoreFactor::new(scoring.height.get());
        scoring.centerness = ScoreFactor::new(scoring.centerness.get());
        scoring.bonus = ScoreFactor::new(scoring.bonus.get());
        scoring.bonus_multiplier = BonusMultiplier::new(scoring.bonus_multiplier.get());
        for request in &mut self.districts.requests {
            request.min_score = MinScore::new(request.min_score.get());
        }
        self.roads.gate_road_radius_factor =
            RadiusFactor::new(self.roads.gate_road_radius_factor.get());
        self
    }

    pub fn score_weights(&self) -> ScoreWeights {
        ScoreWeights {
            flatness: self.scoring.flatness.get(),
            height: self.scoring.height.get(),
            centerness: self.scoring.centerness.get(),
            bonus: self.scoring.bonus.get(),
            bonus_window: self.scoring.bonus_window,
        }
    }

    pub fn to_allocation_config(&self) -> AllocationConfig {
        AllocationConfig {
            districts: self
                .districts
                .requests
                .iter()
                .copied()
                .map(DistrictRequest::from)
                .collect(),
            sampling: self.districts.sampling,
            weights: self.score_weights(),
            max_attempts: self.districts.max_attempts,
            radius_step: self.districts.radius_step,
            allow_adjacent: self.districts.allow_adjacent,
            bonus_multiplier: self
                .scoring
                .apply_bonus
                .then(|| self.scoring.bonus_multiplier.get()),
            max_rel_diff: self.region.max_rel_diff,
            max_abs_diff: self.region.max_abs_diff,
            gate_road_count: self.roads.gate_road_count,
            gate_road_radius_factor: self.roads.gate_road_radius_factor.get(),
        }
    }

    fn parse(contents: &str) -> PlannerResult<Self> {
        let config = toml::from_str::<PlannerConfig>(contents)?.clamped();
        config
            .validate()
            .map_err(|errors| PlannerError::InvalidConfig {
                reason: errors.to_string(),
            })?;
        Ok(config)
    }
}

pub fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().and_then(|mut path| {
        path.push("settlement_planner");
        fs::create_dir_all(&path).ok()?;
        path.push("config.toml");
        Some(path)
    })
}

/// Load the user config, falling back to defaults when it is missing or broken
pub fn load_config() -> PlannerConfig {
    if let Some(config_path) = get_config_path() {
        if let Ok(contents) = fs::read_to_string(&config_path) {
            if let Ok(config) = PlannerConfig::parse(&contents) {
                return config;
            }
        }
    }
    PlannerConfig::default()
}

/// Load an explicit config file, reporting every failure
pub fn load_config_from(path: &Path) -> PlannerResult<PlannerConfig> {
    let contents = fs::read_to_string(path)?;
    PlannerConfig::parse(&contents)
}

pub fn save_config(config: &PlannerConfig) -> PlannerResult<()> {
    let config_path = get_config_path().ok_or(PlannerError::ConfigDirNotFound)?;
    save_config_to(config, &config_path)
}

pub fn save_config_to(config: &PlannerConfig, path: &Path) -> PlannerResult<()> {
    let contents = toml::to_string_pretty(config)?;
    fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allocation_config_matches_constants() {
        let allocation = PlannerConfig::default().to_allocation_config();

        assert_eq!(allocation, AllocationConfig::default());
        assert_eq!(allocation.districts.len(), 1);
        assert_eq!(allocation.districts[0].radius, 70);
        assert_eq!(allocation.sampling, 15);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = PlannerConfig::default();
        config.districts.requests.push(DistrictSpec {
            radius: 30,
            min_score: MinScore::new(0.2),
        });
        config.roads.max_step = 2;

        let contents = toml::to_string_pretty(&config).unwrap();
        let parsed = PlannerConfig::parse(&contents).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let mut config = PlannerConfig::default();
        config.scoring.flatness = ScoreFactor::from(40.0);
        let contents = toml::to_string_pretty(&config).unwrap();

        let parsed = PlannerConfig::parse(&contents).unwrap();
        assert_eq!(parsed.scoring.flatness.get(), 10.0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = PlannerConfig::default();
        config.districts.sampling = 0;
        let contents = toml::to_string_pretty(&config).unwrap();

        assert!(matches!(
            PlannerConfig::parse(&contents),
            Err(PlannerError::InvalidConfig { .. })
        ));
        assert!(matches!(
            PlannerConfig::parse("districts = 3"),
            Err(PlannerError::TomlDeserialize(_))
        ));
    }

    #[test]
    fn test_disabled_bonus() {
        let mut config = PlannerConfig::default();
        config.scoring.apply_bonus = false;
        assert_eq!(config.to_allocation_config().bonus_multiplier, None);
    }

    #[test]
    fn test_load_config_from_file() {
        let path = std::env::temp_dir().join("settlement_planner_config_test.toml");
        let mut config = PlannerConfig::default();
        config.terrain.max_ground_scan = 32;
        save_config_to(&config, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.terrain.max_ground_scan, 32);
        std::fs::remove_file(&path).unwrap();
    }
}
