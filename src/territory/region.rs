use crate::errors::{PlannerError, PlannerResult};
use crate::terrain::HeightField;
use crate::terrain::constants::{DEFAULT_MAX_ABS_DIFF, DEFAULT_MAX_REL_DIFF};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const NEIGHBOURS: [IVec2; 4] = [
    IVec2::new(1, 0),
    IVec2::new(0, 1),
    IVec2::new(-1, 0),
    IVec2::new(0, -1),
];

/// Whether `column` lies within `max_distance` of `start`, measured on the
/// integer offset so far-off world coordinates stay exact
fn within_reach(start: IVec2, column: IVec2, max_distance: f32) -> bool {
    let dx = column.x as i64 - start.x as i64;
    let dz = column.y as i64 - start.y as i64;
    let reach = max_distance as f64;
    ((dx * dx + dz * dz) as f64) <= reach * reach
}

/// Admission rules for footprint growth
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthConstraints {
    /// Largest elevation step between two adjacent footprint columns
    pub max_rel_diff: i32,
    /// Largest elevation difference between any footprint column and the seed
    pub max_abs_diff: i32,
    /// Euclidean reach from the seed
    pub max_distance: f32,
}

impl GrowthConstraints {
    pub fn new(max_distance: f32) -> Self {
        Self {
            max_rel_diff: DEFAULT_MAX_REL_DIFF,
            max_abs_diff: DEFAULT_MAX_ABS_DIFF,
            max_distance,
        }
    }
}

/// Constrained flood fill over a height field
pub struct RegionGrower<'a> {
    height_field: &'a HeightField,
}

impl<'a> RegionGrower<'a> {
    pub fn new(height_field: &'a HeightField) -> Self {
        Self { height_field }
    }

    /// Claim every column reachable from `start` through 4-connected steps
    /// that respect `constraints`, skipping `excluded` columns.
    ///
    /// A seed that is itself excluded yields an empty footprint.
    pub fn grow(
        &self,
        start: IVec2,
        constraints: &GrowthConstraints,
        excluded: &HashSet<IVec2>,
    ) -> PlannerResult<HashSet<IVec2>> {
        let start_height = self
            .height_field
            .height_at(start.x, start.y)
            .ok_or(PlannerError::OutsideBuildArea {
                x: start.x,
                z: start.y,
            })?;

        let mut region = HashSet::new();
        if excluded.contains(&start) {
            return Ok(region);
        }

        let mut explored = HashSet::from([start]);
        let mut to_explore = vec![start];

        while let Some(current) = to_explore.pop() {
            region.insert(current);
            // Popped columns were bounds-checked when pushed
            let Some(current_height) = self.height_field.height_at(current.x, current.y) else {
                continue;
            };

            for direction in NEIGHBOURS {
                let neighbour = current + direction;
                if explored.contains(&neighbour) || excluded.contains(&neighbour) {
                    continue;
                }
                if !within_reach(start, neighbour, constraints.max_distance) {
                    continue;
                }
                let Some(height) = self.height_field.height_at(neighbour.x, neighbour.y) else {
                    continue;
                };
                if (height - current_height).abs() > constraints.max_rel_diff
                    || (height - start_height).abs() > constraints.max_abs_diff
                {
                    continue;
                }

                explored.insert(neighbour);
                to_explore.push(neighbour);
            }
        }

        debug!(
            "Grew region of {} columns from {:?} (max distance {})",
            region.len(),
            start,
            constraints.max_distance
        );
        Ok(region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::BuildArea;

    fn area() -> BuildArea {
        BuildArea::new(IVec2::new(-5, 10), 30, 30).unwrap()
    }

    #[test]
    fn test_region_respects_max_distance() {
        let field = HeightField::flat(area(), 64);
        let grower = RegionGrower::new(&field);
        let start = IVec2::new(10, 25);

        let region = grower
            .grow(start, &GrowthConstraints::new(6.0), &HashSet::new())
            .unwrap();

        assert!(region.contains(&start));
        assert!(region.contains(&IVec2::new(16, 25)));
        assert!(!region.contains(&IVec2::new(17, 25)));
        assert!(
            region
                .iter()
                .all(|c| c.as_vec2().distance(start.as_vec2()) <= 6.0)
        );
    }

    #[test]
    fn test_region_stays_within_reach_far_from_origin() {
        let origin = IVec2::new(20_000_000, 20_000_000);
        let field = HeightField::flat(BuildArea::new(origin, 50, 50).unwrap(), 64);
        let grower = RegionGrower::new(&field);
        let start = origin + IVec2::new(21, 21);

        let region = grower
            .grow(start, &GrowthConstraints::new(3.0), &HashSet::new())
            .unwrap();

        // Lattice points of a disk of radius 3
        assert_eq!(region.len(), 29);
        assert!(region.iter().all(|c| {
            let offset = *c - start;
            offset.x * offset.x + offset.y * offset.y <= 9
        }));
        assert!(!region.contains(&(start + IVec2::new(-3, -3))));
    }

    #[test]
    fn test_region_never_contains_excluded() {
        let field = HeightField::flat(area(), 64);
        let grower = RegionGrower::new(&field);
        let excluded: HashSet<IVec2> = (0..30).map(|z| IVec2::new(8, 10 + z)).collect();

        let region = grower
            .grow(IVec2::new(5, 20), &GrowthConstraints::new(10.0), &excluded)
            .unwrap();

        assert!(region.is_disjoint(&excluded));
        // The excluded wall at x = 8 cuts the field in two
        assert!(region.iter().all(|c| c.x < 8));
    }

    #[test]
    fn test_single_free_neighbour() {
        let field = HeightField::flat(area(), 64);
        let grower = RegionGrower::new(&field);
        let start = IVec2::new(0, 20);
        let free = IVec2::new(1, 20);
        let area = field.area();
        let excluded: HashSet<IVec2> = (0..30)
            .flat_map(|x| (0..30).map(move |z| area.to_absolute(IVec2::new(x, z))))
            .filter(|c| *c != start && *c != free)
            .collect();

        let region = grower
            .grow(start, &GrowthConstraints::new(50.0), &excluded)
            .unwrap();

        assert_eq!(region, HashSet::from([start, free]));
    }

    #[test]
    fn test_steps_and_relief_limit_growth() {
        let area = BuildArea::new(IVec2::ZERO, 10, 1).unwrap();
        // Ramp climbing one block per column, then a cliff
        let heights = vec![60, 61, 62, 63, 64, 70, 70, 70, 70, 70];
        let field = HeightField::from_heights(area, heights).unwrap();
        let grower = RegionGrower::new(&field);

        let smooth = GrowthConstraints {
            max_rel_diff: 1,
            max_abs_diff: 15,
            max_distance: 20.0,
        };
        let region = grower.grow(IVec2::ZERO, &smooth, &HashSet::new()).unwrap();
        assert_eq!(region.len(), 5);

        let shallow = GrowthConstraints {
            max_abs_diff: 2,
            ..smooth
        };
        let region = grower.grow(IVec2::ZERO, &shallow, &HashSet::new()).unwrap();
        assert_eq!(region.len(), 3);
    }

    #[test]
    fn test_seed_outside_area_is_an_error() {
        let field = HeightField::flat(area(), 64);
        let grower = RegionGrower::new(&field);

        let result = grower.grow(IVec2::new(-6, 10), &GrowthConstraints::new(3.0), &HashSet::new());
        assert!(matches!(result, Err(PlannerError::OutsideBuildArea { x: -6, z: 10 })));
    }

    #[test]
    fn test_excluded_seed_yields_empty_region() {
        let field = HeightField::flat(area(), 64);
        let grower = RegionGrower::new(&field);
        let start = IVec2::new(3, 15);

        let region = grower
            .grow(start, &GrowthConstraints::new(3.0), &HashSet::from([start]))
            .unwrap();
        assert!(region.is_empty());
    }
}
