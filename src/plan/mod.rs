use crate::errors::{PlannerError, PlannerResult};
use crate::terrain::BuildArea;
use crate::territory::District;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use validator::{Validate, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoadKind {
    /// Links two consecutive districts
    BetweenDistricts,
    /// Leads from a structure's gates to the surrounding land
    GateAccess,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Road {
    pub kind: RoadKind,
    #[validate(length(min = 1))]
    pub points: Vec<IVec3>,
}

/// Result of one allocation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TerritoryPlan {
    pub area: BuildArea,
    #[validate(nested)]
    pub districts: Vec<District>,
    #[validate(nested)]
    pub roads: Vec<Road>,
}

fn describe(errors: &ValidationErrors) -> String {
    errors
        .errors()
        .iter()
        .map(|(field, kind)| format!("{field}: {kind:?}"))
        .collect::<Vec<String>>()
        .join("; ")
}

impl TerritoryPlan {
    pub fn new(area: BuildArea, districts: Vec<District>, roads: Vec<Road>) -> PlannerResult<Self> {
        let plan = Self {
            area,
            districts,
            roads,
        };
        plan.check()?;
        Ok(plan)
    }

    /// Field validation plus containment of every district center
    pub fn check(&self) -> PlannerResult<()> {
        self.validate().map_err(|errors| PlannerError::InvalidPlanData {
            reason: format!("Plan validation failed: {}", describe(&errors)),
        })?;

        if let Some(district) = self
            .districts
            .iter()
            .find(|district| !self.area.contains_point(district.center))
        {
            return Err(PlannerError::InvalidPlanData {
                reason: format!(
                    "District {} center {:?} lies outside the build area",
                    district.id, district.center
                ),
            });
        }
        Ok(())
    }

    pub fn road_count(&self, kind: RoadKind) -> usize {
        self.roads.iter().filter(|road| road.kind == kind).count()
    }

    /// Get the plans directory path
    pub fn get_plans_dir() -> PlannerResult<PathBuf> {
        Ok(std::env::current_dir()?.join("plans"))
    }

    /// Resolve a file name inside the plans directory, refusing anything that
    /// could escape it
    fn plan_path(filename: &Path) -> PlannerResult<PathBuf> {
        let escapes = filename.is_absolute()
            || filename
                .components()
                .any(|component| !matches!(component, Component::Normal(_)));
        if escapes || filename.as_os_str().is_empty() {
            return Err(PlannerError::InvalidPlanData {
                reason: format!("Plan path must be relative without '..': {}", filename.display()),
            });
        }
        Ok(Self::get_plans_dir()?.join(filename))
    }

    /// Load a plan from the plans directory
    pub fn load_from_file<P: AsRef<Path>>(filename: P) -> PlannerResult<Self> {
        let file_path = Self::plan_path(filename.as_ref())?;
        if !file_path.exists() {
            return Err(PlannerError::PlanFileNotFound { path: file_path });
        }

        let data = std::fs::read(&file_path)?;
        let (plan, _): (TerritoryPlan, usize) =
            bincode::serde::decode_from_slice(&data, bincode::config::standard()).map_err(|e| {
                PlannerError::CorruptedPlanFile {
                    reason: format!("Failed to deserialize plan data: {e}"),
                }
            })?;

        plan.check()?;
        Ok(plan)
    }

    /// Save the plan to the plans directory, returning the written path
    pub fn save_to_file<P: AsRef<Path>>(&self, filename: P) -> PlannerResult<PathBuf> {
        self.check()?;
        let file_path = Self::plan_path(filename.as_ref())?;

        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data =
            bincode::serde::encode_to_vec(self, bincode::config::standard()).map_err(|e| {
                PlannerError::InvalidPlanData {
                    reason: format!("Failed to serialize plan: {e}"),
                }
            })?;
        std::fs::write(&file_path, data)?;

        info!("Plan saved to {}", file_path.display());
        Ok(file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn district(center: IVec2) -> District {
        District {
            id: 0,
            center,
            ground: IVec3::new(center.x, 64, center.y),
            radius: 5,
            score: 0.8,
            footprint: vec![center],
            gates: vec![],
        }
    }

    fn area() -> BuildArea {
        BuildArea::new(IVec2::new(0, 0), 32, 32).unwrap()
    }

    #[test]
    fn test_plan_creation() {
        let road = Road {
            kind: RoadKind::BetweenDistricts,
            points: vec![IVec3::new(1, 64, 1), IVec3::new(2, 64, 2)],
        };
        let plan = TerritoryPlan::new(area(), vec![district(IVec2::new(10, 10))], vec![road]).unwrap();

        assert_eq!(plan.road_count(RoadKind::BetweenDistricts), 1);
        assert_eq!(plan.road_count(RoadKind::GateAccess), 0);
    }

    #[test]
    fn test_district_outside_area_is_invalid() {
        let result = TerritoryPlan::new(area(), vec![district(IVec2::new(40, 10))], vec![]);
        assert!(matches!(result, Err(PlannerError::InvalidPlanData { .. })));
    }

    #[test]
    fn test_empty_road_is_invalid() {
        let road = Road {
            kind: RoadKind::GateAccess,
            points: vec![],
        };
        assert!(TerritoryPlan::new(area(), vec![], vec![road]).is_err());
    }

    #[test]
    fn test_zero_radius_district_is_invalid() {
        let mut bad = district(IVec2::new(3, 3));
        bad.radius = 0;
        assert!(TerritoryPlan::new(area(), vec![bad], vec![]).is_err());
    }

    #[test]
    fn test_plan_paths_cannot_escape() {
        assert!(TerritoryPlan::plan_path(Path::new("../outside.plan")).is_err());
        assert!(TerritoryPlan::plan_path(Path::new("/tmp/absolute.plan")).is_err());
        assert!(TerritoryPlan::plan_path(Path::new("")).is_err());

        let path = TerritoryPlan::plan_path(Path::new("runs/first.plan")).unwrap();
        assert!(path.ends_with("plans/runs/first.plan"));
    }

    #[test]
    fn test_plan_survives_bincode() {
        let road = Road {
            kind: RoadKind::GateAccess,
            points: vec![IVec3::new(5, 70, -3), IVec3::new(6, 71, -3)],
        };
        let plan = TerritoryPlan::new(area(), vec![district(IVec2::new(8, 9))], vec![road]).unwrap();

        let data = bincode::serde::encode_to_vec(&plan, bincode::config::standard()).unwrap();
        let (decoded, _): (TerritoryPlan, usize) =
            bincode::serde::decode_from_slice(&data, bincode::config::standard()).unwrap();
        assert_eq!(decoded, plan);
    }

    #[test]
    fn test_load_missing_plan() {
        let result = TerritoryPlan::load_from_file("definitely_missing_plan_file.plan");
        assert!(matches!(result, Err(PlannerError::PlanFileNotFound { .. })));
    }
}
