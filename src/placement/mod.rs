use crate::errors::{PlannerError, PlannerResult};
use crate::terrain::HeightField;
use crate::terrain::constants::BONUS_NEIGHBOURHOOD_FACTOR;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

pub mod occupancy;
pub mod scoring;

pub use occupancy::{BlockLog, BlockPlacer, FnPlacer, OccupancyTracker, OccupyOnPlace};
pub use scoring::{PlacementRequest, ScoreGrid, ScoreWeights};

/// A selected build coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Absolute column
    pub position: IVec2,
    /// Score-grid cell the column was picked from
    pub cell: UVec2,
    pub score: f32,
    pub radius: u32,
}

/// Pick the best column for `request` against the current occupancy state.
///
/// On success with a bonus multiplier set, the bonus grid around the pick is
/// scaled so later queries cluster near (or avoid) it.
pub fn best_placement(
    height_field: &HeightField,
    tracker: &mut OccupancyTracker,
    request: &PlacementRequest,
) -> PlannerResult<Placement> {
    let area = height_field.area();
    let limit = area.width.min(area.depth);
    if request.radius == 0 || request.radius > limit {
        return Err(PlannerError::InvalidRadius {
            radius: request.radius,
            limit,
        });
    }

    let grid = ScoreGrid::compute(height_field, tracker, request);
    let (cell, score) = grid.best_cell().unwrap_or((UVec2::ZERO, 0.0));

    // A zero score is a veto even when the threshold allows it
    if score <= 0.0 || score < request.min_score {
        return Err(PlannerError::NoValidPosition {
            radius: request.radius,
            best_score: score,
            min_score: request.min_score,
        });
    }

    let relative = grid.cell_to_relative(cell);
    if let Some(multiplier) = request.bonus_multiplier {
        let half = (request.radius as f32 * BONUS_NEIGHBOURHOOD_FACTOR).ceil() as usize;
        tracker.apply_bonus(relative, half, multiplier);
    }

    let position = area.to_absolute(relative.as_ivec2());
    debug!(
        "Best placement for radius {}: {:?} (cell {:?}, score {:.4})",
        request.radius, position, cell, score
    );

    Ok(Placement {
        position,
        cell,
        score,
        radius: request.radius,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::BuildArea;

    fn flat_field() -> HeightField {
        HeightField::flat(BuildArea::new(IVec2::new(100, 200), 50, 50).unwrap(), 64)
    }

    #[test]
    fn test_flat_field_picks_center() {
        let field = flat_field();
        let mut tracker = OccupancyTracker::new(field.area());
        let request = PlacementRequest::new(5).sampling(5).min_score(0.0);

        let placement = best_placement(&field, &mut tracker, &request).unwrap();
        assert_eq!(placement.cell, UVec2::new(4, 4));
        assert_eq!(placement.position, IVec2::new(120, 220));
    }

    #[test]
    fn test_placement_avoids_occupied_area() {
        let field = flat_field();
        let mut tracker = OccupancyTracker::new(field.area());
        tracker.occupy_area(UVec2::new(4, 4), 5, 5);
        let request = PlacementRequest::new(5).sampling(5).min_score(0.0);

        let placement = best_placement(&field, &mut tracker, &request).unwrap();
        let relative = field.area().to_relative(placement.position);

        // Clearance window [p - 10, p + 10) must miss the reserved [15, 25)
        let overlaps_axis = |p: i32| p - 10 < 25 && p + 10 > 15;
        assert!(!(overlaps_axis(relative.x) && overlaps_axis(relative.y)));
    }

    #[test]
    fn test_threshold_yields_no_valid_position() {
        let field = flat_field();
        let mut tracker = OccupancyTracker::new(field.area());
        let request = PlacementRequest::new(5).sampling(5).min_score(2.0);

        let err = best_placement(&field, &mut tracker, &request).unwrap_err();
        assert!(matches!(err, PlannerError::NoValidPosition { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_fully_occupied_field_has_no_position() {
        let field = flat_field();
        let mut tracker = OccupancyTracker::new(field.area());
        tracker.occupy_area(UVec2::new(0, 0), 1, 100);
        let request = PlacementRequest::new(5).sampling(5).min_score(0.0);

        assert!(matches!(
            best_placement(&field, &mut tracker, &request),
            Err(PlannerError::NoValidPosition { .. })
        ));
    }

    #[test]
    fn test_oversized_radius_rejected() {
        let field = flat_field();
        let mut tracker = OccupancyTracker::new(field.area());

        let err = best_placement(&field, &mut tracker, &PlacementRequest::new(51)).unwrap_err();
        assert!(matches!(err, PlannerError::InvalidRadius { limit: 50, .. }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_bonus_applied_after_selection() {
        let field = flat_field();
        let mut tracker = OccupancyTracker::new(field.area());
        let request = PlacementRequest::new(5)
            .sampling(5)
            .min_score(0.0)
            .apply_bonus(1.5);

        best_placement(&field, &mut tracker, &request).unwrap();

        // ceil(5 * 1.1) = 6 around relative (20, 20)
        assert_eq!(tracker.bonus()[(20, 20)], 1.5);
        assert_eq!(tracker.bonus()[(14, 25)], 1.5);
        assert_eq!(tracker.bonus()[(26, 20)], 1.0);
        assert_eq!(tracker.bonus()[(13, 20)], 1.0);
    }
}
