use crate::errors::{PlannerError, PlannerResult};
use crate::placement::{BlockPlacer, PlacementRequest, ScoreWeights};
use crate::plan::{Road, RoadKind, TerritoryPlan};
use crate::session::PlacementSession;
use crate::terrain::HeightField;
use crate::terrain::constants::*;
use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use validator::Validate;

pub mod perimeter;
pub mod region;

pub use perimeter::{border_points, border_points_from_outside, circle_around};
pub use region::{GrowthConstraints, RegionGrower};

/// Requested district size and the lowest placement score accepted for it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct DistrictRequest {
    #[validate(range(min = 1, max = 4096))]
    pub radius: u32,
    #[validate(range(min = 0.0))]
    pub min_score: f32,
}

impl Default for DistrictRequest {
    fn default() -> Self {
        Self {
            radius: DEFAULT_DISTRICT_RADIUS,
            min_score: DEFAULT_DISTRICT_TOLERANCE,
        }
    }
}

/// Everything one allocation run needs besides the session
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationConfig {
    pub districts: Vec<DistrictRequest>,
    pub sampling: u32,
    pub weights: ScoreWeights,
    /// Placement attempts per district, shrinking the radius after each miss
    pub max_attempts: u32,
    pub radius_step: u32,
    pub allow_adjacent: bool,
    pub bonus_multiplier: Option<f32>,
    pub max_rel_diff: i32,
    pub max_abs_diff: i32,
    pub gate_road_count: u32,
    pub gate_road_radius_factor: f32,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            districts: vec![DistrictRequest::default()],
            sampling: DEFAULT_DISTRICT_SAMPLING,
            weights: ScoreWeights {
                flatness: DEFAULT_DISTRICT_FLATNESS,
                height: DEFAULT_DISTRICT_HEIGHT,
                centerness: DEFAULT_DISTRICT_CENTERNESS,
                ..ScoreWeights::default()
            },
            max_attempts: DEFAULT_PLACEMENT_ATTEMPTS,
            radius_step: DEFAULT_RADIUS_STEP,
            allow_adjacent: true,
            bonus_multiplier: Some(DEFAULT_BONUS_MULTIPLIER),
            max_rel_diff: DEFAULT_MAX_REL_DIFF,
            max_abs_diff: DEFAULT_MAX_ABS_DIFF,
            gate_road_count: DEFAULT_GATE_ROAD_COUNT,
            gate_road_radius_factor: DEFAULT_GATE_ROAD_RADIUS_FACTOR,
        }
    }
}

impl AllocationConfig {
    fn placement_request(&self, radius: u32, min_score: f32) -> PlacementRequest {
        let request = PlacementRequest::new(radius)
            .sampling(self.sampling)
            .weights(self.weights)
            .min_score(min_score)
            .allow_adjacent(self.allow_adjacent);
        match self.bonus_multiplier {
            Some(multiplier) => request.apply_bonus(multiplier),
            None => request,
        }
    }

    fn growth(&self, radius: u32) -> GrowthConstraints {
        GrowthConstraints {
            max_rel_diff: self.max_rel_diff,
            max_abs_diff: self.max_abs_diff,
            max_distance: radius as f32,
        }
    }
}

/// A claimed territory. Its footprint stays reserved for the rest of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct District {
    pub id: u32,
    pub center: IVec2,
    /// Center lifted onto the ground
    pub ground: IVec3,
    #[validate(range(min = 1))]
    pub radius: u32,
    pub score: f32,
    /// Claimed columns, sorted
    pub footprint: Vec<IVec2>,
    /// Exits exposed by the structure built on the district
    pub gates: Vec<IVec3>,
}

impl District {
    pub fn footprint_set(&self) -> HashSet<IVec2> {
        self.footprint.iter().copied().collect()
    }
}

/// Builds the geometry of a district.
///
/// Generators only ever see a placer that reserves what it builds; they never
/// touch the occupancy grids themselves. The returned points are the gates
/// roads should reach.
pub trait StructureGenerator {
    fn generate(
        &mut self,
        district: &District,
        height_field: &HeightField,
        placer: &mut dyn BlockPlacer,
    ) -> Vec<IVec3>;
}

/// Places districts one after another, claims their footprints and links
/// them with roads
pub struct TerritoryAllocator<'s, R: Rng> {
    session: &'s mut PlacementSession,
    config: AllocationConfig,
    rng: R,
    claimed: HashSet<IVec2>,
    districts: Vec<District>,
    roads: Vec<Road>,
}

impl<'s, R: Rng> TerritoryAllocator<'s, R> {
    pub fn new(session: &'s mut PlacementSession, config: AllocationConfig, rng: R) -> Self {
        Self {
            session,
            config,
            rng,
            claimed: HashSet::new(),
            districts: Vec::new(),
            roads: Vec::new(),
        }
    }

    pub fn districts(&self) -> &[District] {
        &self.districts
    }

    pub fn roads(&self) -> &[Road] {
        &self.roads
    }

    /// Place every requested district, skipping those that find no spot
    pub fn allocate_districts(&mut self) -> PlannerResult<usize> {
        let requests = self.config.districts.clone();
        for request in requests {
            request
                .validate()
                .map_err(|errors| PlannerError::InvalidConfig {
                    reason: format!("District request {request:?}: {errors}"),
                })?;
            match self.place_district(request)? {
                Some(district) => {
                    info!(
                        "District {} placed at {:?} with radius {} ({} columns)",
                        district.id,
                        district.center,
                        district.radius,
                        district.footprint.len()
                    );
                    self.districts.push(district);
                }
                None => warn!(
                    "No valid spot for a district of radius {}, continuing without it",
                    request.radius
                ),
            }
        }
        Ok(self.districts.len())
    }

    fn place_district(&mut self, request: DistrictRequest) -> PlannerResult<Option<District>> {
        let area = self.session.height_field().area();
        let mut radius = request.radius.min(area.width.min(area.depth));

        for attempt in 0..self.config.max_attempts {
            if radius == 0 {
                break;
            }
            debug!("District attempt {attempt}: radius {radius}");
            let placement_request = self.config.placement_request(radius, request.min_score);

            let placement = match self.session.best_placement(&placement_request) {
                Ok(placement) => placement,
                Err(PlannerError::NoValidPosition { best_score, .. }) => {
                    debug!(
                        "No spot for radius {radius} (best score {best_score:.4}), shrinking by {}",
                        self.config.radius_step
                    );
                    radius = radius.saturating_sub(self.config.radius_step);
                    continue;
                }
                Err(err) => return Err(err),
            };

            let footprint = self.session.grow_region(
                placement.position,
                &self.config.growth(radius),
                &self.claimed,
            )?;
            self.session.commit_footprint(&footprint);
            self.claimed.extend(footprint.iter().copied());

            let mut footprint: Vec<IVec2> = footprint.into_iter().collect();
            footprint.sort_by_key(|column| (column.x, column.y));

            let center = placement.position;
            return Ok(Some(District {
                id: self.districts.len() as u32,
                center,
                ground: self.session.coord_to_ground(center.x, center.y)?,
                radius,
                score: placement.score,
                footprint,
                gates: Vec::new(),
            }));
        }

        Ok(None)
    }

    /// Link consecutive districts with roads
    pub fn connect_districts(&mut self) -> PlannerResult<()> {
        self.session.build_road_graph();
        let centers: Vec<IVec2> = self.districts.iter().map(|d| d.center).collect();

        for pair in centers.windows(2) {
            let (from, to) = (pair[1], pair[0]);
            debug!("Computing road between districts {:?} and {:?}", from, to);
            if let Some(road) = self.road(RoadKind::BetweenDistricts, &[from], to)? {
                self.roads.push(road);
            }
        }
        Ok(())
    }

    /// Hand every district to `generator`, then run roads from the gates it
    /// exposes to random points around the district
    pub fn build_structures<G: StructureGenerator + ?Sized>(
        &mut self,
        generator: &mut G,
        placer: &mut dyn BlockPlacer,
    ) -> PlannerResult<()> {
        self.session.build_road_graph();

        for index in 0..self.districts.len() {
            let gates = {
                let (height_field, tracker) = self.session.split_mut();
                let mut committing = tracker.wrap(&mut *placer);
                generator.generate(&self.districts[index], height_field, &mut committing)
            };
            self.districts[index].gates = gates;
            self.connect_gates(index)?;
        }
        Ok(())
    }

    fn connect_gates(&mut self, index: usize) -> PlannerResult<()> {
        let district = &self.districts[index];
        if district.gates.is_empty() {
            return Ok(());
        }
        let gates: Vec<IVec2> = district.gates.iter().map(|gate| gate.xz()).collect();
        let reach = district.radius as f32 * self.config.gate_road_radius_factor;
        let center = district.center;

        let area = self.session.height_field().area();
        let targets: Vec<IVec2> = circle_around(
            &mut self.rng,
            center,
            reach,
            self.config.gate_road_count,
        )
        .into_iter()
        .filter(|target| area.contains_point(*target))
        .collect();

        debug!(
            "Routing {} gate roads around district {}",
            targets.len(),
            index
        );
        for target in targets {
            if let Some(road) = self.road(RoadKind::GateAccess, &gates, target)? {
                self.roads.push(road);
            }
        }
        Ok(())
    }

    /// Compute one road, absorbing unreachable destinations
    fn road(&mut self, kind: RoadKind, sources: &[IVec2], destination: IVec2) -> PlannerResult<Option<Road>> {
        match self.session.compute_road(sources, destination) {
            Ok(path) => Ok(Some(Road {
                kind,
                points: path.points,
            })),
            Err(err) if err.is_recoverable() => {
                warn!("Skipping {kind:?} road: {err}");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Full run: place districts, connect them, build their structures
    pub fn run<G: StructureGenerator + ?Sized>(
        mut self,
        generator: &mut G,
        placer: &mut dyn BlockPlacer,
    ) -> PlannerResult<TerritoryPlan> {
        self.allocate_districts()?;
        self.connect_districts()?;
        self.build_structures(generator, placer)?;

        let area = self.session.height_field().area();
        TerritoryPlan::new(area, self.districts, self.roads)
    }
}
