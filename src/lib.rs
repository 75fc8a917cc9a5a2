//! Grid-indexed boids flocking on a wrap-around plane.
//!
//! The simulation core lives in [`physics`]: a [`Flock`] owns a fixed arena
//! of boids and a uniform [`SpatialGrid`] whose buckets are linked through
//! per-boid indices. [`ui`] and [`rendering`] are the pieces the windowed
//! front-end uses to feed input in and draw the flock.

pub mod app_settings;
pub mod physics;
pub mod rendering;
pub mod ui;

pub use app_settings::{AppSettings, ConfigError, SettingsError, SimulationSettings};
pub use physics::area::{AreaEffect, AreaMode};
pub use physics::grid::{AgentIndex, CellCoord, SpatialGrid};
pub use physics::neighbors::NeighborSummary;
pub use physics::{Boid, Bounds, Direction, Flock, Position, StepStats};
