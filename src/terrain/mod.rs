use crate::errors::{PlannerError, PlannerResult};
use bevy::prelude::*;
use std::ops::{Index, IndexMut, Range};

pub mod constants;
pub mod coordinates;
pub mod source;

pub use coordinates::BuildArea;
pub use source::{BlockPattern, TerrainSource, corrected_surface};

/// Dense 2D grid indexed by relative `(x, z)`, stored x-major.
///
/// A "row" is every cell sharing the same `x`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    width: usize,
    depth: usize,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn filled(width: usize, depth: usize, value: T) -> Self {
        Self {
            width,
            depth,
            cells: vec![value; width * depth],
        }
    }

    pub fn from_fn(width: usize, depth: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut cells = Vec::with_capacity(width * depth);
        for x in 0..width {
            for z in 0..depth {
                cells.push(f(x, z));
            }
        }
        Self {
            width,
            depth,
            cells,
        }
    }

    /// Build from an x-major vector, validating its length
    pub fn from_vec(width: usize, depth: usize, cells: Vec<T>) -> PlannerResult<Self> {
        if cells.len() != width * depth {
            return Err(PlannerError::HeightmapSizeMismatch {
                expected: width * depth,
                actual: cells.len(),
            });
        }
        Ok(Self {
            width,
            depth,
            cells,
        })
    }

    /// Keep every `stride`-th row and column, no averaging
    pub fn sample(&self, stride: usize) -> Grid<T> {
        let stride = stride.max(1);
        let width = self.width.div_ceil(stride);
        let depth = self.depth.div_ceil(stride);
        Grid::from_fn(width, depth, |x, z| self[(x * stride, z * stride)].clone())
    }

    /// Overwrite every cell of the square window around `(x, z)`
    pub fn fill_window(&mut self, x: usize, z: usize, half: usize, value: T) {
        let (xs, zs) = (self.window_range(x, half, self.width), self.window_range(z, half, self.depth));
        for wx in xs {
            for wz in zs.clone() {
                self[(wx, wz)] = value.clone();
            }
        }
    }
}

impl<T> Grid<T> {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn get(&self, x: usize, z: usize) -> Option<&T> {
        if x >= self.width || z >= self.depth {
            return None;
        }
        self.cells.get(x * self.depth + z)
    }

    pub fn get_mut(&mut self, x: usize, z: usize) -> Option<&mut T> {
        if x >= self.width || z >= self.depth {
            return None;
        }
        self.cells.get_mut(x * self.depth + z)
    }

    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    /// Cells of one row (fixed `x`)
    pub fn row(&self, x: usize) -> &[T] {
        &self.cells[x * self.depth..(x + 1) * self.depth]
    }

    /// Iterate `((x, z), &value)` in x-major order
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &T)> {
        let depth = self.depth;
        self.cells
            .iter()
            .enumerate()
            .map(move |(index, value)| ((index / depth, index % depth), value))
    }

    /// Half-open window `[center - half, center + half)` clipped to `len`,
    /// never narrower than the center cell itself
    fn window_range(&self, center: usize, half: usize, len: usize) -> Range<usize> {
        let start = center.saturating_sub(half);
        let end = (center + half).min(len).max((center + 1).min(len));
        start..end
    }

    /// Values of the square window around `(x, z)`
    pub fn window(&self, x: usize, z: usize, half: usize) -> impl Iterator<Item = &T> {
        let xs = self.window_range(x, half, self.width);
        let zs = self.window_range(z, half, self.depth);
        xs.flat_map(move |wx| zs.clone().map(move |wz| &self.cells[wx * self.depth + wz]))
    }
}

impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    fn index(&self, (x, z): (usize, usize)) -> &T {
        &self.cells[x * self.depth + z]
    }
}

impl<T> IndexMut<(usize, usize)> for Grid<T> {
    fn index_mut(&mut self, (x, z): (usize, usize)) -> &mut T {
        &mut self.cells[x * self.depth + z]
    }
}

/// Ground elevation for every column of a build area, corrected once for
/// floating vegetation and read-only afterwards
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    area: BuildArea,
    heights: Grid<i32>,
}

impl HeightField {
    /// Ingest a terrain source, pulling floating logs and leaves down to the ground
    pub fn from_source(source: &dyn TerrainSource, max_ground_scan: u32) -> PlannerResult<Self> {
        Self::from_source_with_pattern(source, &BlockPattern::vegetation(), max_ground_scan)
    }

    pub fn from_source_with_pattern(
        source: &dyn TerrainSource,
        pattern: &BlockPattern,
        max_ground_scan: u32,
    ) -> PlannerResult<Self> {
        let area = source.build_area();
        ensure_not_degenerate(area)?;
        let mut corrected_columns = 0usize;

        let heights = Grid::from_fn(area.width as usize, area.depth as usize, |rx, rz| {
            let absolute = area.to_absolute(IVec2::new(rx as i32, rz as i32));
            match corrected_surface(source, absolute.x, absolute.y, pattern, max_ground_scan) {
                Some(ground) => {
                    corrected_columns += 1;
                    ground
                }
                None => source.surface_height(absolute.x, absolute.y),
            }
        });

        info!(
            "Height field: {width}x{depth} columns, {corrected} corrected for vegetation",
            width = area.width,
            depth = area.depth,
            corrected = corrected_columns
        );

        Ok(Self { area, heights })
    }

    /// Build from already-corrected x-major heights
    pub fn from_heights(area: BuildArea, heights: Vec<i32>) -> PlannerResult<Self> {
        ensure_not_degenerate(area)?;
        let heights = Grid::from_vec(area.width as usize, area.depth as usize, heights)?;
        Ok(Self { area, heights })
    }

    /// Create a flat height field for testing
    pub fn flat(area: BuildArea, height: i32) -> Self {
        Self {
            area,
            heights: Grid::filled(area.width as usize, area.depth as usize, height),
        }
    }

    pub fn area(&self) -> BuildArea {
        self.area
    }

    pub fn heights(&self) -> &Grid<i32> {
        &self.heights
    }

    pub fn width(&self) -> usize {
        self.heights.width()
    }

    pub fn depth(&self) -> usize {
        self.heights.depth()
    }

    /// Elevation at a relative column
    pub fn relative_height(&self, x: usize, z: usize) -> Option<i32> {
        self.heights.get(x, z).copied()
    }

    /// Elevation at an absolute column
    pub fn height_at(&self, x: i32, z: i32) -> Option<i32> {
        let (rx, rz) = self.area.relative_index(IVec2::new(x, z))?;
        self.relative_height(rx, rz)
    }

    /// Lift an absolute column onto the ground
    pub fn coord_to_ground(&self, x: i32, z: i32) -> PlannerResult<IVec3> {
        self.height_at(x, z)
            .map(|y| IVec3::new(x, y, z))
            .ok_or(PlannerError::OutsideBuildArea { x, z })
    }

    /// Stride-sampled elevations for cheaper scoring passes
    pub fn downsample(&self, stride: usize) -> Grid<i32> {
        self.heights.sample(stride)
    }
}

fn ensure_not_degenerate(area: BuildArea) -> PlannerResult<()> {
    if area.width == 0 || area.depth == 0 {
        return Err(PlannerError::DegenerateBuildArea {
            width: area.width,
            depth: area.depth,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::source::test_support::ColumnTerrain;
    use super::*;

    #[test]
    fn test_grid_indexing_is_x_major() {
        let grid = Grid::from_fn(3, 2, |x, z| (x * 10 + z) as i32);
        assert_eq!(grid.cells(), &[0, 1, 10, 11, 20, 21]);
        assert_eq!(grid[(2, 1)], 21);
        assert_eq!(grid.row(1), &[10, 11]);
        assert_eq!(grid.get(3, 0), None);
        assert_eq!(grid.get(0, 2), None);
    }

    #[test]
    fn test_grid_from_vec_checks_size() {
        assert!(Grid::from_vec(2, 2, vec![1, 2, 3]).is_err());
        assert!(Grid::from_vec(2, 2, vec![1, 2, 3, 4]).is_ok());
    }

    #[test]
    fn test_stride_sampling() {
        let grid = Grid::from_fn(7, 5, |x, z| (x * 10 + z) as i32);
        let sampled = grid.sample(3);

        assert_eq!(sampled.width(), 3);
        assert_eq!(sampled.depth(), 2);
        assert_eq!(sampled[(0, 0)], 0);
        assert_eq!(sampled[(1, 1)], 33);
        assert_eq!(sampled[(2, 1)], 63);
    }

    #[test]
    fn test_window_is_half_open_and_clipped() {
        let grid = Grid::from_fn(10, 10, |x, z| (x * 10 + z) as i32);

        let values: Vec<i32> = grid.window(5, 5, 2).copied().collect();
        assert_eq!(values.len(), 16);
        assert!(values.contains(&33));
        assert!(values.contains(&66));
        assert!(!values.contains(&77));

        let corner: Vec<i32> = grid.window(0, 0, 3).copied().collect();
        assert_eq!(corner.len(), 9);

        let single: Vec<i32> = grid.window(4, 4, 0).copied().collect();
        assert_eq!(single, vec![44]);
    }

    #[test]
    fn test_fill_window() {
        let mut grid = Grid::filled(6, 6, 1.0f32);
        grid.fill_window(1, 1, 2, 0.0);

        assert_eq!(grid[(0, 0)], 0.0);
        assert_eq!(grid[(2, 2)], 0.0);
        assert_eq!(grid[(3, 3)], 1.0);
        assert_eq!(grid.cells().iter().filter(|&&v| v == 0.0).count(), 9);
    }

    #[test]
    fn test_height_field_corrects_trunks() {
        let area = BuildArea::new(IVec2::new(100, -50), 8, 8).unwrap();
        let mut terrain = ColumnTerrain::flat(area, 70);
        terrain.trunks.insert(IVec2::new(103, -47), 6);

        let field = HeightField::from_source(&terrain, 64).unwrap();

        assert_eq!(field.height_at(103, -47), Some(71));
        assert_eq!(field.height_at(100, -50), Some(71));
        assert!(field.heights().cells().iter().all(|&h| h == 71));
    }

    #[test]
    fn test_degenerate_area_is_fatal() {
        let area = BuildArea {
            origin: IVec2::ZERO,
            width: 0,
            depth: 3,
        };
        assert!(HeightField::from_heights(area, vec![]).is_err());
    }

    #[test]
    fn test_coord_to_ground() {
        let area = BuildArea::new(IVec2::new(10, 10), 4, 4).unwrap();
        let heights = (0..16).collect();
        let field = HeightField::from_heights(area, heights).unwrap();

        assert_eq!(field.coord_to_ground(11, 12).unwrap(), IVec3::new(11, 6, 12));
        assert!(field.coord_to_ground(9, 12).is_err());
    }

    #[test]
    fn test_downsample() {
        let area = BuildArea::new(IVec2::ZERO, 4, 4).unwrap();
        let field = HeightField::from_heights(area, (0..16).collect()).unwrap();
        let sampled = field.downsample(2);

        assert_eq!(sampled.width(), 2);
        assert_eq!(sampled.cells(), &[0, 2, 8, 10]);
    }
}
