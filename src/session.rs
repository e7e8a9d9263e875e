use crate::errors::{PlannerError, PlannerResult};
use crate::pathfinding::{RoadGraph, RoadPath};
use crate::placement::{
    BlockPlacer, OccupancyTracker, OccupyOnPlace, Placement, PlacementRequest, ScoreGrid,
    best_placement,
};
use crate::terrain::constants::DEFAULT_ROAD_MAX_STEP;
use crate::terrain::{HeightField, TerrainSource};
use crate::territory::region::{GrowthConstraints, RegionGrower};
use bevy::prelude::*;
use std::collections::HashSet;

/// Run-scoped owner of every mutable planning structure.
///
/// Occupancy, bonus and the road graph live here and nowhere else; the height
/// field is fixed once the session exists.
#[derive(Debug, Clone)]
pub struct PlacementSession {
    height_field: HeightField,
    occupancy: OccupancyTracker,
    roads: Option<RoadGraph>,
    road_max_step: i32,
}

impl PlacementSession {
    pub fn new(height_field: HeightField) -> Self {
        let occupancy = OccupancyTracker::new(height_field.area());
        Self {
            height_field,
            occupancy,
            roads: None,
            road_max_step: DEFAULT_ROAD_MAX_STEP,
        }
    }

    /// Ingest a terrain source and start a session on it
    pub fn from_source(source: &dyn TerrainSource, max_ground_scan: u32) -> PlannerResult<Self> {
        Ok(Self::new(HeightField::from_source(source, max_ground_scan)?))
    }

    pub fn with_road_max_step(mut self, max_step: i32) -> Self {
        self.road_max_step = max_step;
        self
    }

    pub fn height_field(&self) -> &HeightField {
        &self.height_field
    }

    pub fn occupancy(&self) -> &OccupancyTracker {
        &self.occupancy
    }

    /// Borrow the read-only terrain alongside the mutable occupancy state
    pub fn split_mut(&mut self) -> (&HeightField, &mut OccupancyTracker) {
        (&self.height_field, &mut self.occupancy)
    }

    pub fn coord_to_ground(&self, x: i32, z: i32) -> PlannerResult<IVec3> {
        self.height_field.coord_to_ground(x, z)
    }

    /// Score grid for `request` against the current occupancy state
    pub fn score_grid(&self, request: &PlacementRequest) -> ScoreGrid {
        ScoreGrid::compute(&self.height_field, &self.occupancy, request)
    }

    pub fn best_placement(&mut self, request: &PlacementRequest) -> PlannerResult<Placement> {
        best_placement(&self.height_field, &mut self.occupancy, request)
    }

    pub fn occupy_area(&mut self, cell: UVec2, sampling: u32, radius: u32) {
        self.occupancy.occupy_area(cell, sampling, radius);
    }

    pub fn occupy_coordinate(&mut self, column: IVec2) -> bool {
        self.occupancy.occupy_coordinate(column)
    }

    /// Reserve a grown footprint, returning how many columns landed in the area
    pub fn commit_footprint(&mut self, footprint: &HashSet<IVec2>) -> usize {
        self.occupancy.occupy_footprint(footprint)
    }

    /// Wrap a placer so everything it builds is reserved first
    pub fn occupy_on_place<P: BlockPlacer>(&mut self, placer: P) -> OccupyOnPlace<'_, P> {
        self.occupancy.wrap(placer)
    }

    pub fn grow_region(
        &self,
        start: IVec2,
        constraints: &GrowthConstraints,
        excluded: &HashSet<IVec2>,
    ) -> PlannerResult<HashSet<IVec2>> {
        RegionGrower::new(&self.height_field).grow(start, constraints, excluded)
    }

    /// Build the road graph. Later calls keep the existing graph and its
    /// reinforced weights.
    pub fn build_road_graph(&mut self) -> &RoadGraph {
        self.roads
            .get_or_insert_with(|| RoadGraph::build(&self.height_field, self.road_max_step))
    }

    pub fn is_road_graph_built(&self) -> bool {
        self.roads.is_some()
    }

    pub fn road_graph(&self) -> Option<&RoadGraph> {
        self.roads.as_ref()
    }

    /// Cheapest road from the nearest source to `destination`, reinforcing the
    /// edges it uses
    pub fn compute_road(&mut self, sources: &[IVec2], destination: IVec2) -> PlannerResult<RoadPath> {
        let roads = self.roads.as_mut().ok_or(PlannerError::RoadGraphNotBuilt)?;
        roads.path(sources, destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::BlockLog;
    use crate::terrain::BuildArea;

    fn flat_session() -> PlacementSession {
        let area = BuildArea::new(IVec2::new(0, 0), 50, 50).unwrap();
        PlacementSession::new(HeightField::flat(area, 64))
    }

    #[test]
    fn test_flat_scenario_returns_center() {
        let mut session = flat_session();
        let request = PlacementRequest::new(5).sampling(5).min_score(0.0);

        let placement = session.best_placement(&request).unwrap();
        assert_eq!(placement.position, IVec2::new(20, 20));
    }

    #[test]
    fn test_second_placement_avoids_first() {
        let mut session = flat_session();
        let request = PlacementRequest::new(5).sampling(5).min_score(0.0);

        let first = session.best_placement(&request).unwrap();
        session.occupy_area(first.cell, 5, 5);
        let second = session.best_placement(&request).unwrap();

        assert_ne!(first.position, second.position);
        let score = session.score_grid(&request).scores()[(4, 4)];
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_compute_road_requires_graph() {
        let mut session = flat_session();
        let result = session.compute_road(&[IVec2::new(1, 1)], IVec2::new(5, 5));
        assert!(matches!(result, Err(PlannerError::RoadGraphNotBuilt)));

        session.build_road_graph();
        assert!(session.is_road_graph_built());
        let road = session
            .compute_road(&[IVec2::new(1, 1)], IVec2::new(5, 5))
            .unwrap();
        assert_eq!(road.cost, 800);
        assert_eq!(road.end(), Some(IVec3::new(5, 64, 5)));
    }

    #[test]
    fn test_rebuilding_keeps_reinforced_weights() {
        let mut session = flat_session();
        session.build_road_graph();
        session
            .compute_road(&[IVec2::new(0, 0)], IVec2::new(3, 0))
            .unwrap();
        session.build_road_graph();

        let graph = session.road_graph().unwrap();
        assert_eq!(graph.edge_weight(IVec2::new(0, 0), IVec2::new(1, 0)), Some(50));
    }

    #[test]
    fn test_occupy_on_place_feeds_scoring() {
        let mut session = flat_session();
        let mut log = BlockLog::default();
        {
            let mut placer = session.occupy_on_place(&mut log);
            placer.place(&[IVec3::new(20, 65, 20)]);
        }

        assert_eq!(log.blocks.len(), 1);
        let request = PlacementRequest::new(5).sampling(5).min_score(0.0);
        let placement = session.best_placement(&request).unwrap();
        assert_ne!(placement.position, IVec2::new(20, 20));
    }

    #[test]
    fn test_grow_and_commit_footprint() {
        let mut session = flat_session();
        let footprint = session
            .grow_region(IVec2::new(25, 25), &GrowthConstraints::new(3.0), &HashSet::new())
            .unwrap();

        assert_eq!(session.commit_footprint(&footprint), footprint.len());
        assert!(!session.occupancy().is_free(IVec2::new(25, 28)));
        assert!(session.occupancy().is_free(IVec2::new(25, 29)));
    }
}
