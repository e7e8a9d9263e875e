use crate::errors::{PlannerError, PlannerResult};
use crate::terrain::constants::*;
use crate::terrain::{BuildArea, HeightField};
use bevy::prelude::*;
use ::pathfinding::prelude::dijkstra;

/// Neighbour offsets with their cost factor. Opposite directions sit in
/// adjacent slots, so `direction ^ 1` is the way back.
const NEIGHBOURS: [(IVec2, u64); 8] = [
    (IVec2::new(1, 0), ROAD_CARDINAL_FACTOR),
    (IVec2::new(-1, 0), ROAD_CARDINAL_FACTOR),
    (IVec2::new(0, 1), ROAD_CARDINAL_FACTOR),
    (IVec2::new(0, -1), ROAD_CARDINAL_FACTOR),
    (IVec2::new(1, 1), ROAD_DIAGONAL_FACTOR),
    (IVec2::new(-1, -1), ROAD_DIAGONAL_FACTOR),
    (IVec2::new(1, -1), ROAD_DIAGONAL_FACTOR),
    (IVec2::new(-1, 1), ROAD_DIAGONAL_FACTOR),
];

/// Cost of stepping across an elevation change `dh`
pub fn edge_cost(dh: i32, factor: u64) -> u64 {
    let climb = dh as i64 * ROAD_HEIGHT_COST_SCALE;
    (ROAD_BASE_COST + (climb * climb) as u64) * factor
}

/// Search node: a surface cell, or the virtual origin joined to every source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoadNode {
    Origin,
    Cell(usize),
}

/// A realized road: surface coordinates from source to destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoadPath {
    pub points: Vec<IVec3>,
    /// Total weight under the edge weights in force when it was computed
    pub cost: u64,
}

impl RoadPath {
    pub fn start(&self) -> Option<IVec3> {
        self.points.first().copied()
    }

    pub fn end(&self) -> Option<IVec3> {
        self.points.last().copied()
    }
}

/// Weighted 8-connected graph over every surface column of a height field.
///
/// Edge weights are symmetric and only ever decrease: each road realized
/// through [`RoadGraph::path`] halves the weight of every edge it uses.
#[derive(Debug, Clone)]
pub struct RoadGraph {
    area: BuildArea,
    depth: usize,
    surface: Vec<IVec3>,
    weights: Vec<[Option<u64>; 8]>,
}

impl RoadGraph {
    /// Connect every pair of neighbouring columns whose elevation differs by
    /// at most `max_step`
    pub fn build(height_field: &HeightField, max_step: i32) -> Self {
        let area = height_field.area();
        let heights = height_field.heights();
        let (width, depth) = (heights.width(), heights.depth());

        let surface: Vec<IVec3> = heights
            .iter()
            .map(|((x, z), &y)| {
                let absolute = area.to_absolute(IVec2::new(x as i32, z as i32));
                IVec3::new(absolute.x, y, absolute.y)
            })
            .collect();

        let weights: Vec<[Option<u64>; 8]> = heights
            .iter()
            .map(|((x, z), &h)| {
                let mut edges = [None; 8];
                for (slot, (offset, factor)) in NEIGHBOURS.iter().enumerate() {
                    let nx = x as i32 + offset.x;
                    let nz = z as i32 + offset.y;
                    if nx < 0 || nz < 0 || nx as usize >= width || nz as usize >= depth {
                        continue;
                    }
                    let dh = heights[(nx as usize, nz as usize)] - h;
                    if dh.abs() <= max_step {
                        edges[slot] = Some(edge_cost(dh, *factor));
                    }
                }
                edges
            })
            .collect();

        let graph = Self {
            area,
            depth,
            surface,
            weights,
        };
        info!(
            "Road graph: {nodes} nodes, {edges} edges (max step {max_step})",
            nodes = graph.node_count(),
            edges = graph.edge_count()
        );
        graph
    }

    pub fn node_count(&self) -> usize {
        self.surface.len()
    }

    /// Undirected edge count
    pub fn edge_count(&self) -> usize {
        self.weights
            .iter()
            .map(|edges| edges.iter().flatten().count())
            .sum::<usize>()
            / 2
    }

    fn node_index(&self, column: IVec2) -> Option<usize> {
        let (x, z) = self.area.relative_index(column)?;
        Some(x * self.depth + z)
    }

    fn direction(from: IVec2, to: IVec2) -> Option<usize> {
        let delta = to - from;
        NEIGHBOURS.iter().position(|(offset, _)| *offset == delta)
    }

    /// Current weight of the edge between two absolute columns
    pub fn edge_weight(&self, from: IVec2, to: IVec2) -> Option<u64> {
        let index = self.node_index(from)?;
        self.node_index(to)?;
        self.weights[index][Self::direction(from, to)?]
    }

    /// Total current weight of a walk, None if any step is not an edge
    pub fn path_weight(&self, points: &[IVec3]) -> Option<u64> {
        points
            .windows(2)
            .map(|step| self.edge_weight(step[0].xz(), step[1].xz()))
            .sum()
    }

    fn successors(&self, node: &RoadNode, sources: &[usize]) -> Vec<(RoadNode, u64)> {
        match *node {
            RoadNode::Origin => sources.iter().map(|&s| (RoadNode::Cell(s), 0)).collect(),
            RoadNode::Cell(index) => {
                let column = self.surface[index].xz();
                self.weights[index]
                    .iter()
                    .zip(NEIGHBOURS.iter())
                    .filter_map(|(weight, (offset, _))| {
                        let weight = (*weight)?;
                        let neighbour = self.node_index(column + *offset)?;
                        Some((RoadNode::Cell(neighbour), weight))
                    })
                    .collect()
            }
        }
    }

    /// Cheapest road from the nearest of `sources` to `destination` under the
    /// current weights, without reinforcing it
    pub fn shortest_path(&self, sources: &[IVec2], destination: IVec2) -> PlannerResult<RoadPath> {
        let goal = self
            .node_index(destination)
            .ok_or(PlannerError::PathNotFound { destination })?;
        let source_nodes: Vec<usize> = sources
            .iter()
            .filter_map(|&source| self.node_index(source))
            .collect();
        if source_nodes.is_empty() {
            return Err(PlannerError::PathNotFound { destination });
        }

        let (nodes, cost) = dijkstra(
            &RoadNode::Origin,
            |node| self.successors(node, &source_nodes),
            |node| *node == RoadNode::Cell(goal),
        )
        .ok_or(PlannerError::PathNotFound { destination })?;

        let points = nodes
            .into_iter()
            .filter_map(|node| match node {
                RoadNode::Origin => None,
                RoadNode::Cell(index) => Some(self.surface[index]),
            })
            .collect();
        Ok(RoadPath { points, cost })
    }

    /// Cheapest road to `destination`, then halve every edge it used so later
    /// roads prefer to follow it
    pub fn path(&mut self, sources: &[IVec2], destination: IVec2) -> PlannerResult<RoadPath> {
        let road = self.shortest_path(sources, destination)?;
        self.reinforce(&road.points);
        debug!(
            "Road of {} points to {:?} (cost {})",
            road.points.len(),
            destination,
            road.cost
        );
        Ok(road)
    }

    fn reinforce(&mut self, points: &[IVec3]) {
        for step in points.windows(2) {
            let (from, to) = (step[0].xz(), step[1].xz());
            let (Some(a), Some(b), Some(direction)) = (
                self.node_index(from),
                self.node_index(to),
                Self::direction(from, to),
            ) else {
                continue;
            };
            for (node, slot) in [(a, direction), (b, direction ^ 1)] {
                if let Some(weight) = self.weights[node][slot].as_mut() {
                    *weight /= 2;
                }
            }
        }
    }
}
