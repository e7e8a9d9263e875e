use crate::errors::{PlannerError, PlannerResult};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Axis-aligned build rectangle in absolute block coordinates.
///
/// Horizontal coordinates are carried as `IVec2` where `x` is the world x
/// axis and `y` is the world z axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildArea {
    pub origin: IVec2,
    pub width: u32,
    pub depth: u32,
}

impl BuildArea {
    /// Create a build area, rejecting rectangles without any column
    pub fn new(origin: IVec2, width: u32, depth: u32) -> PlannerResult<Self> {
        if width == 0 || depth == 0 {
            return Err(PlannerError::DegenerateBuildArea { width, depth });
        }
        Ok(Self {
            origin,
            width,
            depth,
        })
    }

    /// First absolute coordinate past the area on both axes
    pub fn end(&self) -> IVec2 {
        self.origin + IVec2::new(self.width as i32, self.depth as i32)
    }

    /// Check if an absolute column lies inside the area
    pub fn contains(&self, x: i32, z: i32) -> bool {
        let end = self.end();
        x >= self.origin.x && z >= self.origin.y && x < end.x && z < end.y
    }

    pub fn contains_point(&self, absolute: IVec2) -> bool {
        self.contains(absolute.x, absolute.y)
    }

    pub fn to_relative(&self, absolute: IVec2) -> IVec2 {
        absolute - self.origin
    }

    pub fn to_absolute(&self, relative: IVec2) -> IVec2 {
        relative + self.origin
    }

    /// Convert an absolute column into grid indices, returning None if out of bounds
    pub fn relative_index(&self, absolute: IVec2) -> Option<(usize, usize)> {
        if !self.contains_point(absolute) {
            return None;
        }
        let relative = self.to_relative(absolute);
        Some((relative.x as usize, relative.y as usize))
    }

    pub fn column_count(&self) -> usize {
        self.width as usize * self.depth as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_area_rejected() {
        assert!(BuildArea::new(IVec2::ZERO, 0, 10).is_err());
        assert!(BuildArea::new(IVec2::ZERO, 10, 0).is_err());
        assert!(BuildArea::new(IVec2::ZERO, 1, 1).is_ok());
    }

    #[test]
    fn test_coordinate_translation() {
        let area = BuildArea::new(IVec2::new(-20, 100), 30, 40).unwrap();

        assert_eq!(area.to_relative(IVec2::new(-20, 100)), IVec2::ZERO);
        assert_eq!(area.to_absolute(IVec2::new(5, 7)), IVec2::new(-15, 107));
        assert_eq!(area.relative_index(IVec2::new(-11, 139)), Some((9, 39)));
        assert_eq!(area.relative_index(IVec2::new(10, 100)), None);
        assert_eq!(area.relative_index(IVec2::new(-21, 100)), None);
    }

    #[test]
    fn test_containment() {
        let area = BuildArea::new(IVec2::new(0, 0), 16, 8).unwrap();

        assert!(area.contains(0, 0));
        assert!(area.contains(15, 7));
        assert!(!area.contains(16, 7));
        assert!(!area.contains(3, -1));

        assert_eq!(area.column_count(), 128);
    }
}
