use super::constants::VEGETATION_PATTERNS;
use super::coordinates::BuildArea;
use bevy::prelude::*;

/// External terrain provider consumed once when a height field is built
pub trait TerrainSource {
    /// Rectangle of absolute columns the planner may build on
    fn build_area(&self) -> BuildArea;

    /// Raw surface estimate for an absolute column: the first free block above
    /// whatever the source considers ground (logs included, leaves excluded)
    fn surface_height(&self, x: i32, z: i32) -> i32;

    /// Block identity at an absolute position, e.g. `minecraft:oak_log`
    fn block_id(&self, position: IVec3) -> &str;
}

/// Set of id fragments a block must contain one of to match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPattern {
    fragments: Vec<String>,
}

impl BlockPattern {
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: fragments.into_iter().map(Into::into).collect(),
        }
    }

    /// Air and the vegetation blocks that make raw heightmaps float above the ground
    pub fn vegetation() -> Self {
        Self::new(VEGETATION_PATTERNS)
    }

    pub fn matches(&self, block_id: &str) -> bool {
        self.fragments
            .iter()
            .any(|fragment| block_id.contains(fragment.as_str()))
    }
}

impl Default for BlockPattern {
    fn default() -> Self {
        Self::vegetation()
    }
}

/// Walk down a column from just below the raw estimate while blocks match the
/// exclusion pattern. Returns the lowest matching position's elevation, i.e.
/// the free block resting on solid ground.
///
/// Returns None when the top block is already solid (no correction needed) or
/// when no solid block shows up within `max_scan` blocks.
pub fn corrected_surface(
    source: &dyn TerrainSource,
    x: i32,
    z: i32,
    pattern: &BlockPattern,
    max_scan: u32,
) -> Option<i32> {
    let estimate = source.surface_height(x, z);
    let mut y = estimate - 1;
    let mut lowest_match = None;

    for _ in 0..max_scan {
        if !pattern.matches(source.block_id(IVec3::new(x, y, z))) {
            return lowest_match;
        }
        lowest_match = Some(y);
        y -= 1;
    }

    None
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::collections::HashMap;

    /// Terrain fixture: solid ground at `ground`, optional log trunks on top
    pub struct ColumnTerrain {
        pub area: BuildArea,
        pub ground: Vec<i32>,
        pub trunks: HashMap<IVec2, i32>,
    }

    impl ColumnTerrain {
        pub fn flat(area: BuildArea, ground: i32) -> Self {
            Self {
                area,
                ground: vec![ground; area.column_count()],
                trunks: HashMap::new(),
            }
        }

        fn ground_at(&self, x: i32, z: i32) -> i32 {
            let (rx, rz) = self
                .area
                .relative_index(IVec2::new(x, z))
                .unwrap_or((0, 0));
            self.ground[rx * self.area.depth as usize + rz]
        }
    }

    impl TerrainSource for ColumnTerrain {
        fn build_area(&self) -> BuildArea {
            self.area
        }

        fn surface_height(&self, x: i32, z: i32) -> i32 {
            let trunk = self.trunks.get(&IVec2::new(x, z)).copied().unwrap_or(0);
            self.ground_at(x, z) + trunk + 1
        }

        fn block_id(&self, position: IVec3) -> &str {
            let ground = self.ground_at(position.x, position.z);
            let trunk = self
                .trunks
                .get(&IVec2::new(position.x, position.z))
                .copied()
                .unwrap_or(0);
            if position.y <= ground {
                "minecraft:grass_block"
            } else if position.y <= ground + trunk {
                "minecraft:oak_log"
            } else {
                "minecraft:air"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::ColumnTerrain;
    use super::*;

    #[test]
    fn test_vegetation_pattern() {
        let pattern = BlockPattern::vegetation();
        assert!(pattern.matches("minecraft:air"));
        assert!(pattern.matches("minecraft:birch_leaves"));
        assert!(pattern.matches("minecraft:stripped_spruce_log"));
        assert!(pattern.matches("minecraft:cave_vines"));
        assert!(!pattern.matches("minecraft:grass_block"));
        assert!(!pattern.matches("minecraft:stone"));
    }

    #[test]
    fn test_solid_column_needs_no_correction() {
        let area = BuildArea::new(IVec2::ZERO, 4, 4).unwrap();
        let terrain = ColumnTerrain::flat(area, 63);

        let corrected = corrected_surface(&terrain, 1, 1, &BlockPattern::vegetation(), 64);
        assert_eq!(corrected, None);
        assert_eq!(terrain.surface_height(1, 1), 64);
    }

    #[test]
    fn test_trunk_column_is_corrected_to_ground() {
        let area = BuildArea::new(IVec2::ZERO, 4, 4).unwrap();
        let mut terrain = ColumnTerrain::flat(area, 63);
        terrain.trunks.insert(IVec2::new(2, 3), 5);

        assert_eq!(terrain.surface_height(2, 3), 69);
        let corrected = corrected_surface(&terrain, 2, 3, &BlockPattern::vegetation(), 64);
        assert_eq!(corrected, Some(64));
    }

    #[test]
    fn test_bounded_scan_gives_up() {
        let area = BuildArea::new(IVec2::ZERO, 4, 4).unwrap();
        let mut terrain = ColumnTerrain::flat(area, 63);
        terrain.trunks.insert(IVec2::new(0, 0), 10);

        let corrected = corrected_surface(&terrain, 0, 0, &BlockPattern::vegetation(), 4);
        assert_eq!(corrected, None);
    }
}
