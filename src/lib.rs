pub mod config;
pub mod errors;
pub mod pathfinding;
pub mod placement;
pub mod plan;
pub mod session;
pub mod terrain;
pub mod terrain_generation;
pub mod territory;

// Selective re-exports for external consumers

pub use errors::{PlannerError, PlannerResult};

pub use placement::{BlockPlacer, Placement, PlacementRequest, ScoreWeights};
pub use plan::{Road, RoadKind, TerritoryPlan};
pub use session::PlacementSession;
pub use terrain::{BuildArea, HeightField, TerrainSource};
pub use territory::{AllocationConfig, District, DistrictRequest, StructureGenerator, TerritoryAllocator};
