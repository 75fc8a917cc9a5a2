//! Per-boid neighbor statistics gathered through the spatial grid.
//!
//! Cells are as wide as the view distance, so a boid's neighbors lie in its
//! own cell or the adjacent ones. Only the 2x2 block leaning toward the half
//! of the cell the boid sits in is scanned: neighbors near the far corners
//! of the other six adjacent cells are missed, in exchange for visiting four
//! buckets instead of nine.

use nalgebra::Vector2;

use super::grid::{AgentIndex, CellCoord, SpatialGrid};
use super::{normalize_or, Boid, Bounds, Direction, Position};
use crate::app_settings::SimulationSettings;

/// Averages of the flocking neighbors of one boid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborSummary {
    /// Mean neighbor position, in the boid's own frame across the seam
    pub average_position: Position,
    /// Normalized mean neighbor heading
    pub average_direction: Direction,
    /// Normalized inverse-square pull toward close neighbors
    pub average_separation: Vector2<f32>,
    pub count: usize,
    pub separation_count: usize,
}

impl NeighborSummary {
    /// A summary that contributes no force to `boid`.
    pub fn isolated(boid: &Boid) -> Self {
        Self {
            average_position: boid.position,
            average_direction: boid.direction,
            average_separation: Vector2::zeros(),
            count: 0,
            separation_count: 0,
        }
    }
}

/// The (up to) four distinct cells scanned for one boid.
#[derive(Debug, Clone, Copy)]
pub struct ScanWindow {
    cells: [CellCoord; 4],
    len: usize,
}

impl ScanWindow {
    /// Picks the 2x2 block around `position`, extending toward the next cell
    /// on each axis when the position is in the far half of its cell and
    /// toward the previous one otherwise.
    pub fn around(grid: &SpatialGrid, position: &Position) -> Self {
        let home = grid.cell_of(position);
        let half = grid.cell_size() / 2.0;
        let offset_x = position.x - home.column as f32 * grid.cell_size();
        let offset_y = position.y - home.row as f32 * grid.cell_size();
        let step_x: i64 = if offset_x >= half { 1 } else { -1 };
        let step_y: i64 = if offset_y >= half { 1 } else { -1 };

        let (column, row) = (home.column as i64, home.row as i64);
        let mut window = Self {
            cells: [home; 4],
            len: 0,
        };
        for (dx, dy) in [(0, 0), (step_x, 0), (0, step_y), (step_x, step_y)] {
            let cell = grid.wrapped(column + dx, row + dy);
            // Narrow grids wrap the neighbor back onto the home cell.
            if !window.cells().contains(&cell) {
                window.cells[window.len] = cell;
                window.len += 1;
            }
        }
        window
    }

    pub fn cells(&self) -> &[CellCoord] {
        &self.cells[..self.len]
    }
}

/// Gathers the neighbor statistics of `agent` from the current, unmodified state.
pub fn summarize(
    agent: AgentIndex,
    boids: &[Boid],
    grid: &SpatialGrid,
    settings: &SimulationSettings,
    bounds: &Bounds,
) -> NeighborSummary {
    let boid = &boids[agent];
    let view_sq = settings.view_distance_sq();
    let avoid_sq = settings.avoid_distance_sq();

    let mut position_sum = Vector2::zeros();
    let mut direction_sum = Vector2::zeros();
    let mut separation_sum = Vector2::zeros();
    let mut count = 0usize;
    let mut separation_count = 0usize;

    let window = ScanWindow::around(grid, &boid.position);
    for &cell in window.cells() {
        for other_index in grid.bucket(cell) {
            if other_index == agent {
                continue;
            }
            let other = &boids[other_index];
            let delta = bounds.shortest_delta(&boid.position, &other.position);
            let distance_sq = delta.norm_squared();
            if distance_sq > view_sq {
                continue;
            }
            if boid.position.dot(&other.position) < settings.view_dot_threshold {
                continue;
            }

            position_sum += boid.position + delta;
            direction_sum += other.direction;
            count += 1;

            // Coincident boids have no direction to separate along.
            if distance_sq < avoid_sq && distance_sq > 0.0 {
                separation_sum += delta / distance_sq;
                separation_count += 1;
            }
        }
    }

    if count == 0 {
        return NeighborSummary::isolated(boid);
    }

    let average_separation = if separation_count == 0 {
        Vector2::zeros()
    } else {
        normalize_or(separation_sum / separation_count as f32, Vector2::zeros())
    };

    NeighborSummary {
        average_position: position_sum / count as f32,
        average_direction: normalize_or(direction_sum / count as f32, boid.direction),
        average_separation,
        count,
        separation_count,
    }
}

/// Fills `out[i]` with the summary of boid `i`. Reads `boids` only, so every
/// summary reflects the same snapshot.
pub fn aggregate(
    boids: &[Boid],
    grid: &SpatialGrid,
    settings: &SimulationSettings,
    bounds: &Bounds,
    out: &mut [NeighborSummary],
) {
    debug_assert_eq!(boids.len(), out.len());
    for (agent, summary) in out.iter_mut().enumerate() {
        *summary = summarize(agent, boids, grid, settings, bounds);
    }
}
