use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::app_settings::{ConfigError, SimulationSettings};

pub mod area;
pub mod forces;
pub mod grid;
pub mod neighbors;

use area::AreaEffect;
use grid::{AgentIndex, CellCoord, SpatialGrid};
use neighbors::NeighborSummary;

pub type Position = Vector2<f32>;
pub type Direction = Vector2<f32>;

/// Vectors shorter than this are treated as zero when normalizing.
pub const NORMALIZE_EPSILON: f32 = 1e-6;

/// Normalizes `vector`, or returns `fallback` when it is too short to have a direction.
pub fn normalize_or(vector: Vector2<f32>, fallback: Vector2<f32>) -> Vector2<f32> {
    vector.try_normalize(NORMALIZE_EPSILON).unwrap_or(fallback)
}

/// Wraps `value` into `[lo, hi)`.
pub fn wrap(value: f32, lo: f32, hi: f32) -> f32 {
    let wrapped = (value - lo).rem_euclid(hi - lo) + lo;
    // rem_euclid can round up to the span for tiny negative inputs
    if wrapped >= hi {
        lo
    } else {
        wrapped
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boid {
    pub position: Position,
    /// Unit heading
    pub direction: Direction,
}

impl Boid {
    pub fn new(position: Position, direction: Direction) -> Self {
        Self {
            position,
            direction,
        }
    }
}

/// Extent of the toroidal simulation plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn wrap(&self, position: Position) -> Position {
        Position::new(
            wrap(position.x, 0.0, self.width),
            wrap(position.y, 0.0, self.height),
        )
    }

    /// Offset from `from` to the nearest image of `to` on the torus.
    pub fn shortest_delta(&self, from: &Position, to: &Position) -> Vector2<f32> {
        let mut delta = to - from;
        if delta.x > self.width / 2.0 {
            delta.x -= self.width;
        } else if delta.x < -self.width / 2.0 {
            delta.x += self.width;
        }
        if delta.y > self.height / 2.0 {
            delta.y -= self.height;
        } else if delta.y < -self.height / 2.0 {
            delta.y += self.height;
        }
        delta
    }
}

/// What happened during one [`Flock::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Agents that changed grid cells
    pub migrations: usize,
    /// Agents that saw no flocking neighbor
    pub isolated: usize,
}

/// A fixed population of boids indexed by a uniform grid.
pub struct Flock {
    boids: Vec<Boid>,
    grid: SpatialGrid,
    summaries: Vec<NeighborSummary>,
    settings: SimulationSettings,
    bounds: Bounds,
}

impl Flock {
    /// Seeds `settings.agent_count` boids at random positions and headings.
    pub fn new(settings: SimulationSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        let mut rng = StdRng::seed_from_u64(settings.seed);
        let boids = (0..settings.agent_count)
            .map(|_| random_boid(&mut rng, &settings))
            .collect();
        Self::assemble(settings, boids)
    }

    /// Builds a flock from caller-placed boids. The population size comes
    /// from `boids`; positions are wrapped and headings normalized.
    pub fn from_boids(settings: SimulationSettings, boids: Vec<Boid>) -> Result<Self, ConfigError> {
        let settings = SimulationSettings {
            agent_count: boids.len(),
            ..settings
        };
        settings.validate()?;
        let bounds = Bounds::new(settings.width, settings.height);
        let boids = boids
            .into_iter()
            .map(|boid| {
                Boid::new(
                    bounds.wrap(boid.position),
                    normalize_or(boid.direction, Direction::new(1.0, 0.0)),
                )
            })
            .collect();
        Self::assemble(settings, boids)
    }

    fn assemble(settings: SimulationSettings, boids: Vec<Boid>) -> Result<Self, ConfigError> {
        let mut grid = SpatialGrid::new(&settings)?;
        grid.populate(boids.iter().map(|boid| &boid.position));
        let summaries = boids.iter().map(NeighborSummary::isolated).collect();
        log::info!(
            "flock of {} boids on a {}x{} grid ({} cells of {})",
            boids.len(),
            grid.columns(),
            grid.rows(),
            grid.cell_count(),
            grid.cell_size()
        );

        Ok(Self {
            boids,
            grid,
            summaries,
            bounds: Bounds::new(settings.width, settings.height),
            settings,
        })
    }

    pub fn boids(&self) -> &[Boid] {
        &self.boids
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn len(&self) -> usize {
        self.boids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boids.is_empty()
    }

    /// Cell the agent's current position maps to.
    pub fn cell_of(&self, agent: AgentIndex) -> CellCoord {
        self.grid.cell_of(&self.boids[agent].position)
    }

    /// Advances the flock by `dt` seconds.
    ///
    /// Aggregates neighbor statistics for every boid from the state at the
    /// start of the step, then steers and moves every boid, then re-links
    /// the boids that crossed a cell boundary.
    pub fn step(&mut self, area: &AreaEffect, dt: f32) -> StepStats {
        neighbors::aggregate(
            &self.boids,
            &self.grid,
            &self.settings,
            &self.bounds,
            &mut self.summaries,
        );

        let travel = self.settings.move_speed * dt.max(0.0);
        let mut isolated = 0;
        for (boid, summary) in self.boids.iter_mut().zip(&self.summaries) {
            if summary.count == 0 {
                isolated += 1;
            }
            boid.direction = forces::steer(boid, summary, area, &self.settings);
            boid.position = self.bounds.wrap(boid.position + boid.direction * travel);
        }

        let boids = &self.boids;
        let migrations = self.grid.maintain(|agent| boids[agent].position);

        StepStats {
            migrations,
            isolated,
        }
    }
}

fn random_boid(rng: &mut StdRng, settings: &SimulationSettings) -> Boid {
    let position = Position::new(
        rng.gen_range(0.0..settings.width),
        rng.gen_range(0.0..settings.height),
    );
    let direction = loop {
        let x: i32 = rng.gen_range(-64..=64);
        let y: i32 = rng.gen_range(-64..=64);
        if x != 0 || y != 0 {
            break Direction::new(x as f32, y as f32).normalize();
        }
    };
    Boid::new(position, direction)
}
