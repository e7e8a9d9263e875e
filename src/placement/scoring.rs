use super::occupancy::OccupancyTracker;
use crate::terrain::constants::*;
use crate::terrain::{Grid, HeightField};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Multipliers applied to the independent sub-scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub flatness: f32,
    pub height: f32,
    pub centerness: f32,
    /// Scale of the bonus sub-score
    pub bonus: f32,
    /// Half-size (in height-field columns) of the window averaged for the bonus sub-score
    pub bonus_window: u32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            flatness: 1.0,
            height: 1.0,
            centerness: 1.0,
            bonus: 1.0,
            bonus_window: DEFAULT_BONUS_WINDOW,
        }
    }
}

/// Parameters for one best-placement query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementRequest {
    pub radius: u32,
    /// Score-grid stride; defaults to the radius
    pub sampling: Option<u32>,
    pub weights: ScoreWeights,
    pub min_score: f32,
    /// Use a clearance window of `radius` instead of `2 * radius`
    pub allow_adjacent: bool,
    /// Multiplier applied to the bonus grid around a successful pick, if any
    pub bonus_multiplier: Option<f32>,
}

impl PlacementRequest {
    pub fn new(radius: u32) -> Self {
        Self {
            radius,
            sampling: None,
            weights: ScoreWeights::default(),
            min_score: DEFAULT_MIN_SCORE,
            allow_adjacent: false,
            bonus_multiplier: None,
        }
    }

    pub fn sampling(mut self, sampling: u32) -> Self {
        self.sampling = Some(sampling);
        self
    }

    pub fn weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn allow_adjacent(mut self, allow: bool) -> Self {
        self.allow_adjacent = allow;
        self
    }

    pub fn apply_bonus(mut self, multiplier: f32) -> Self {
        self.bonus_multiplier = Some(multiplier);
        self
    }

    pub fn effective_sampling(&self) -> u32 {
        self.sampling.unwrap_or(self.radius).max(1)
    }

    /// Half-size of the occupancy window that must be free around a pick
    pub fn clearance(&self) -> u32 {
        if self.allow_adjacent {
            self.radius
        } else {
            2 * self.radius
        }
    }

    /// Width, in score cells, of the zeroed band along every edge
    pub fn edge_band(&self) -> usize {
        self.radius.div_ceil(self.effective_sampling()) as usize
    }
}

/// Composite suitability grid, recomputed from scratch for every query
#[derive(Debug, Clone)]
pub struct ScoreGrid {
    sampling: usize,
    scores: Grid<f32>,
}

impl ScoreGrid {
    pub fn compute(
        height_field: &HeightField,
        tracker: &OccupancyTracker,
        request: &PlacementRequest,
    ) -> Self {
        let sampling = request.effective_sampling() as usize;
        let radius = request.radius as usize;
        let weights = &request.weights;

        let height = height_score(height_field, sampling, weights.height);
        let (width, depth) = (height.width(), height.depth());
        let centerness = centerness_score(width, depth, weights.centerness);
        let flatness = flatness_score(height_field, sampling, radius, weights.flatness);
        let occupation = occupation_score(
            tracker.occupancy(),
            sampling,
            request.clearance() as usize,
        );
        let bonus = bonus_score(
            tracker.bonus(),
            sampling,
            weights.bonus_window as usize,
            weights.bonus,
        );

        let mut scores = Grid::from_fn(width, depth, |x, z| {
            height[(x, z)]
                * centerness[(x, z)]
                * flatness[(x, z)]
                * occupation[(x, z)]
                * bonus[(x, z)]
        });
        exclude_edges(&mut scores, request.edge_band());

        Self { sampling, scores }
    }

    pub fn scores(&self) -> &Grid<f32> {
        &self.scores
    }

    pub fn sampling(&self) -> usize {
        self.sampling
    }

    /// Highest scoring cell; ties go to the first cell in x-major order
    pub fn best_cell(&self) -> Option<(UVec2, f32)> {
        let mut best: Option<(UVec2, f32)> = None;
        for ((x, z), &score) in self.scores.iter() {
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((UVec2::new(x as u32, z as u32), score));
            }
        }
        best
    }

    /// Relative height-field column of a score cell
    pub fn cell_to_relative(&self, cell: UVec2) -> UVec2 {
        cell * self.sampling as u32
    }
}

/// Divide each row by its own maximum and scale to `max_value`.
///
/// Rows whose maximum is zero stay at zero.
pub fn normalize_rows(grid: &Grid<f32>, max_value: f32) -> Grid<f32> {
    let row_max: Vec<f32> = (0..grid.width())
        .map(|x| grid.row(x).iter().copied().fold(f32::MIN, f32::max))
        .collect();
    Grid::from_fn(grid.width(), grid.depth(), |x, z| {
        if row_max[x] == 0.0 {
            0.0
        } else {
            grid[(x, z)] / row_max[x] * max_value
        }
    })
}

/// Elevation normalized per row, so the highest column of each row scores 1
pub fn height_score(height_field: &HeightField, sampling: usize, factor: f32) -> Grid<f32> {
    let sampled = height_field.downsample(sampling);
    let scaled = Grid::from_fn(sampled.width(), sampled.depth(), |x, z| {
        sampled[(x, z)] as f32 * factor
    });
    normalize_rows(&scaled, 1.0)
}

/// Population variance of the full-resolution elevations around every sampled column
pub fn variance_map(height_field: &HeightField, sampling: usize, blur: usize) -> Grid<f32> {
    let heights = height_field.heights();
    let width = heights.width().div_ceil(sampling);
    let depth = heights.depth().div_ceil(sampling);
    Grid::from_fn(width, depth, |x, z| {
        let (mut count, mut sum, mut sum_sq) = (0.0f64, 0.0f64, 0.0f64);
        for &h in heights.window(x * sampling, z * sampling, blur) {
            let h = h as f64;
            count += 1.0;
            sum += h;
            sum_sq += h * h;
        }
        let mean = sum / count;
        (sum_sq / count - mean * mean).max(0.0) as f32
    })
}

/// Low local variance scores high; each row's roughest cell scores 0
pub fn flatness_score(
    height_field: &HeightField,
    sampling: usize,
    blur: usize,
    factor: f32,
) -> Grid<f32> {
    let normalized = normalize_rows(&variance_map(height_field, sampling, blur), 1.0);
    Grid::from_fn(normalized.width(), normalized.depth(), |x, z| {
        (1.0 - normalized[(x, z)]) * factor
    })
}

/// Radial decay from the grid center: 1 at the center, 0 at the corners
pub fn centerness_score(width: usize, depth: usize, factor: f32) -> Grid<f32> {
    let center = Vec2::new((width as f32 - 1.0) / 2.0, (depth as f32 - 1.0) / 2.0);
    let max_distance = center.length();
    Grid::from_fn(width, depth, |x, z| {
        if max_distance == 0.0 {
            return factor;
        }
        let distance = Vec2::new(x as f32, z as f32).distance(center);
        (max_distance - distance) / max_distance * factor
    })
}

/// Minimum occupancy over the window around each sampled column
pub fn occupation_score(occupancy: &Grid<f32>, sampling: usize, blur: usize) -> Grid<f32> {
    let width = occupancy.width().div_ceil(sampling);
    let depth = occupancy.depth().div_ceil(sampling);
    Grid::from_fn(width, depth, |x, z| {
        occupancy
            .window(x * sampling, z * sampling, blur)
            .copied()
            .fold(f32::MAX, f32::min)
    })
}

/// Local bonus sum over a small window around each sampled column, divided by
/// the window's cell count and scaled by `factor`.
///
/// Averaging instead of summing keeps an untouched bonus grid at exactly
/// `factor` and keeps windows clipped at the grid edge on the same scale as
/// interior ones.
pub fn bonus_score(bonus: &Grid<f32>, sampling: usize, window: usize, factor: f32) -> Grid<f32> {
    let width = bonus.width().div_ceil(sampling);
    let depth = bonus.depth().div_ceil(sampling);
    Grid::from_fn(width, depth, |x, z| {
        let (count, sum) = bonus
            .window(x * sampling, z * sampling, window)
            .fold((0usize, 0.0f32), |(count, sum), &value| (count + 1, sum + value));
        sum / count as f32 * factor
    })
}

/// Zero a band of `band` cells along all four edges
pub fn exclude_edges(grid: &mut Grid<f32>, band: usize) {
    let (width, depth) = (grid.width(), grid.depth());
    for x in 0..width {
        for z in 0..depth {
            if x < band || z < band || x + band >= width || z + band >= depth {
                grid[(x, z)] = 0.0;
            }
        }
    }
}
