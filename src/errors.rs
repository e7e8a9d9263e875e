use bevy::prelude::*;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlannerError {
    // Placement-related errors
    #[error("No valid position found for radius {radius} (best score {best_score:.4} < {min_score})")]
    NoValidPosition {
        radius: u32,
        best_score: f32,
        min_score: f32,
    },

    #[error("No road leads to {destination:?}")]
    PathNotFound { destination: IVec2 },

    #[error("Road graph has not been built for this session")]
    RoadGraphNotBuilt,

    #[error("Coordinate ({x}, {z}) lies outside the build area")]
    OutsideBuildArea { x: i32, z: i32 },

    #[error("Radius {radius} exceeds the build area limit {limit}")]
    InvalidRadius { radius: u32, limit: u32 },

    // Terrain-related errors
    #[error("Build area of {width}x{depth} has no columns")]
    DegenerateBuildArea { width: u32, depth: u32 },

    #[error("Heightmap holds {actual} columns but the build area needs {expected}")]
    HeightmapSizeMismatch { expected: usize, actual: usize },

    #[error("Failed to read heightmap image: {0}")]
    HeightmapImage(#[from] image::ImageError),

    // Config-related errors
    #[error("Failed to get config directory")]
    ConfigDirNotFound,

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize config: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Failed to deserialize config: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    // Plan file errors
    #[error("Plan file not found at path: {path}")]
    PlanFileNotFound { path: PathBuf },

    #[error("Corrupted plan file: {reason}")]
    CorruptedPlanFile { reason: String },

    #[error("Invalid plan data: {reason}")]
    InvalidPlanData { reason: String },
}

impl PlannerError {
    /// Errors the allocator absorbs by degrading the run instead of aborting it
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PlannerError::NoValidPosition { .. } | PlannerError::PathNotFound { .. }
        )
    }
}

/// Result type alias for all operations
pub type PlannerResult<T> = Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planner_error_display() {
        let err = PlannerError::PathNotFound {
            destination: IVec2::new(10, -4),
        };
        assert!(err.to_string().contains("No road leads to"));

        let err = PlannerError::ConfigDirNotFound;
        assert_eq!(err.to_string(), "Failed to get config directory");

        let err = PlannerError::NoValidPosition {
            radius: 12,
            best_score: 0.05,
            min_score: 0.1,
        };
        assert!(err.to_string().contains("radius 12"));
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(
            PlannerError::NoValidPosition {
                radius: 5,
                best_score: 0.0,
                min_score: 0.1
            }
            .is_recoverable()
        );
        assert!(
            PlannerError::PathNotFound {
                destination: IVec2::ZERO
            }
            .is_recoverable()
        );
        assert!(
            !PlannerError::DegenerateBuildArea { width: 0, depth: 4 }.is_recoverable()
        );
        assert!(!PlannerError::RoadGraphNotBuilt.is_recoverable());
    }
}
