/// Constants for terrain ingestion and territory planning
/// Block id fragments skipped when looking for solid ground under a column
pub const VEGETATION_PATTERNS: [&str; 5] = ["air", "leaves", "log", "vine", "bamboo"];
pub const DEFAULT_MAX_GROUND_SCAN: u32 = 64;

/// Default values for placement scoring
pub const DEFAULT_MIN_SCORE: f32 = 0.1;
pub const DEFAULT_BONUS_WINDOW: u32 = 2;
pub const DEFAULT_BONUS_MULTIPLIER: f32 = 1.5;
pub const BONUS_NEIGHBOURHOOD_FACTOR: f32 = 1.1;

/// Default values for district allocation
pub const DEFAULT_DISTRICT_RADIUS: u32 = 70;
pub const DEFAULT_DISTRICT_TOLERANCE: f32 = 0.01;
pub const DEFAULT_DISTRICT_SAMPLING: u32 = 15;
pub const DEFAULT_PLACEMENT_ATTEMPTS: u32 = 50;
pub const DEFAULT_RADIUS_STEP: u32 = 2;
pub const DEFAULT_DISTRICT_FLATNESS: f32 = 3.0;
pub const DEFAULT_DISTRICT_HEIGHT: f32 = 0.5;
pub const DEFAULT_DISTRICT_CENTERNESS: f32 = 1.3;

/// Default values for footprint growth
pub const DEFAULT_MAX_REL_DIFF: i32 = 1;
pub const DEFAULT_MAX_ABS_DIFF: i32 = 15;

/// Road graph constants
pub const ROAD_BASE_COST: u64 = 100;
pub const ROAD_HEIGHT_COST_SCALE: i64 = 10;
pub const ROAD_CARDINAL_FACTOR: u64 = 1;
pub const ROAD_DIAGONAL_FACTOR: u64 = 2;
pub const DEFAULT_ROAD_MAX_STEP: i32 = 1;
pub const DEFAULT_GATE_ROAD_COUNT: u32 = 15;
pub const DEFAULT_GATE_ROAD_RADIUS_FACTOR: f32 = 1.5;
