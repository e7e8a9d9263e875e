use crate::terrain::{BuildArea, Grid};
use bevy::prelude::*;

/// Anything that puts blocks into the world
pub trait BlockPlacer {
    fn place(&mut self, coords: &[IVec3]);
}

impl<P: BlockPlacer + ?Sized> BlockPlacer for &mut P {
    fn place(&mut self, coords: &[IVec3]) {
        (**self).place(coords);
    }
}

/// Adapter turning a closure into a placer
pub struct FnPlacer<F>(pub F);

impl<F: FnMut(&[IVec3])> BlockPlacer for FnPlacer<F> {
    fn place(&mut self, coords: &[IVec3]) {
        (self.0)(coords);
    }
}

/// Placer that only remembers what it was asked to place
#[derive(Debug, Default, Clone)]
pub struct BlockLog {
    pub blocks: Vec<IVec3>,
}

impl BlockPlacer for BlockLog {
    fn place(&mut self, coords: &[IVec3]) {
        self.blocks.extend_from_slice(coords);
    }
}

/// Occupancy and bonus grids at height-field resolution.
///
/// Occupancy holds 1.0 for free ground and 0.0 for reserved ground; cells only
/// ever move towards 0 during a run. Bonus is a multiplicative attractant that
/// starts at 1.0 everywhere.
#[derive(Debug, Clone)]
pub struct OccupancyTracker {
    area: BuildArea,
    occupancy: Grid<f32>,
    bonus: Grid<f32>,
}

impl OccupancyTracker {
    pub fn new(area: BuildArea) -> Self {
        let (width, depth) = (area.width as usize, area.depth as usize);
        Self {
            area,
            occupancy: Grid::filled(width, depth, 1.0),
            bonus: Grid::filled(width, depth, 1.0),
        }
    }

    pub fn area(&self) -> BuildArea {
        self.area
    }

    pub fn occupancy(&self) -> &Grid<f32> {
        &self.occupancy
    }

    pub fn bonus(&self) -> &Grid<f32> {
        &self.bonus
    }

    /// Reserve the square window around score cell `cell` (score-grid indices
    /// at stride `sampling`)
    pub fn occupy_area(&mut self, cell: UVec2, sampling: u32, radius: u32) {
        let x = (cell.x * sampling) as usize;
        let z = (cell.y * sampling) as usize;
        self.occupancy.fill_window(x, z, radius as usize, 0.0);
    }

    /// Reserve a single absolute column. Returns false when it lies outside the area.
    pub fn occupy_coordinate(&mut self, absolute: IVec2) -> bool {
        match self.area.relative_index(absolute) {
            Some((x, z)) => {
                self.occupancy[(x, z)] = 0.0;
                true
            }
            None => false,
        }
    }

    /// Reserve every column of a footprint, returning how many landed in the area
    pub fn occupy_footprint<'a>(&mut self, footprint: impl IntoIterator<Item = &'a IVec2>) -> usize {
        footprint
            .into_iter()
            .filter(|&&column| self.occupy_coordinate(column))
            .count()
    }

    pub fn is_free(&self, absolute: IVec2) -> bool {
        self.area
            .relative_index(absolute)
            .is_some_and(|(x, z)| self.occupancy[(x, z)] > 0.0)
    }

    /// Multiply the bonus grid over the square window around a relative column
    pub fn apply_bonus(&mut self, relative: UVec2, half: usize, multiplier: f32) {
        let (cx, cz) = (relative.x as usize, relative.y as usize);
        let xs = cx.saturating_sub(half)..(cx + half).min(self.bonus.width());
        let zs = cz.saturating_sub(half)..(cz + half).min(self.bonus.depth());
        for x in xs {
            for z in zs.clone() {
                self.bonus[(x, z)] *= multiplier;
            }
        }
    }

    /// Wrap a placer so every column it is about to build on gets reserved first
    pub fn wrap<P: BlockPlacer>(&mut self, placer: P) -> OccupyOnPlace<'_, P> {
        OccupyOnPlace {
            tracker: self,
            inner: placer,
        }
    }
}

/// Commit-on-build middleware returned by [`OccupancyTracker::wrap`]
pub struct OccupyOnPlace<'a, P> {
    tracker: &'a mut OccupancyTracker,
    inner: P,
}

impl<P: BlockPlacer> BlockPlacer for OccupyOnPlace<'_, P> {
    fn place(&mut self, coords: &[IVec3]) {
        for coord in coords {
            // Blocks outside the build area are still placed, just not tracked
            self.tracker.occupy_coordinate(IVec2::new(coord.x, coord.z));
        }
        self.inner.place(coords);
    }
}
