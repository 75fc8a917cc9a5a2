//! Uniform bucket grid over the wrap-around simulation plane.
//!
//! Each cell stores only the head of its bucket; the rest of the bucket is
//! threaded through a per-agent `next` link owned by the grid. Links are
//! allocated once for the whole population, so inserting, removing and
//! migrating agents never touches the allocator.

use crate::app_settings::{ConfigError, SimulationSettings};
use crate::physics::Position;

/// Dense index of an agent in the flock's arena.
pub type AgentIndex = usize;

/// Column/row address of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoord {
    pub column: usize,
    pub row: usize,
}

impl CellCoord {
    pub fn new(column: usize, row: usize) -> Self {
        Self { column, row }
    }
}

pub struct SpatialGrid {
    cell_size: f32,
    columns: usize,
    rows: usize,
    heads: Vec<Option<AgentIndex>>,
    next: Vec<Option<AgentIndex>>,
}

impl SpatialGrid {
    /// Builds an empty grid sized for the settings' plane, cell size and population.
    pub fn new(settings: &SimulationSettings) -> Result<Self, ConfigError> {
        let cell_size = settings.cell_size();
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(ConfigError::InvalidCellSize(cell_size));
        }
        if settings.width <= 0.0 || settings.height <= 0.0 {
            return Err(ConfigError::InvalidDimensions {
                width: settings.width,
                height: settings.height,
            });
        }
        let columns = (settings.width / cell_size).ceil() as usize;
        let rows = (settings.height / cell_size).ceil() as usize;

        Ok(Self {
            cell_size,
            columns,
            rows,
            heads: vec![None; columns * rows],
            next: vec![None; settings.agent_count],
        })
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell_count(&self) -> usize {
        self.heads.len()
    }

    /// Number of agents the link table was sized for.
    pub fn capacity(&self) -> usize {
        self.next.len()
    }

    /// Maps a position to its cell, wrapping each axis around the grid.
    pub fn cell_of(&self, position: &Position) -> CellCoord {
        let column = (position.x / self.cell_size).floor() as i64;
        let row = (position.y / self.cell_size).floor() as i64;
        self.wrapped(column, row)
    }

    /// Wraps a possibly out-of-range column/row pair back onto the torus.
    pub fn wrapped(&self, column: i64, row: i64) -> CellCoord {
        CellCoord {
            column: column.rem_euclid(self.columns as i64) as usize,
            row: row.rem_euclid(self.rows as i64) as usize,
        }
    }

    pub fn index(&self, cell: CellCoord) -> usize {
        cell.row * self.columns + cell.column
    }

    /// Inverse of [`SpatialGrid::index`].
    pub fn coord(&self, index: usize) -> CellCoord {
        CellCoord {
            column: index % self.columns,
            row: index / self.columns,
        }
    }

    pub fn head(&self, cell: CellCoord) -> Option<AgentIndex> {
        self.heads[self.index(cell)]
    }

    pub fn next_in_cell(&self, agent: AgentIndex) -> Option<AgentIndex> {
        self.next[agent]
    }

    /// Iterates the agents linked into `cell`, head first.
    pub fn bucket(&self, cell: CellCoord) -> Bucket<'_> {
        Bucket {
            grid: self,
            cursor: self.head(cell),
        }
    }

    /// Pushes `agent` as the new head of `cell`.
    pub fn insert(&mut self, agent: AgentIndex, cell: CellCoord) {
        let index = self.index(cell);
        self.insert_at(agent, index);
    }

    /// Unlinks `agent` from `cell`. `predecessor` is the agent linked just
    /// before it, or `None` when `agent` is the bucket head.
    pub fn remove(&mut self, agent: AgentIndex, cell: CellCoord, predecessor: Option<AgentIndex>) {
        let index = self.index(cell);
        self.remove_at(agent, index, predecessor);
    }

    /// Moves `agent` from the bucket of `from` to the head of `to`.
    pub fn migrate(
        &mut self,
        agent: AgentIndex,
        from: CellCoord,
        to: CellCoord,
        predecessor: Option<AgentIndex>,
    ) {
        let (from, to) = (self.index(from), self.index(to));
        self.remove_at(agent, from, predecessor);
        self.insert_at(agent, to);
    }

    /// Drops every bucket.
    pub fn clear(&mut self) {
        self.heads.iter_mut().for_each(|head| *head = None);
        self.next.iter_mut().for_each(|link| *link = None);
    }

    /// Links every agent into the cell its position maps to.
    pub fn populate<'a, I>(&mut self, positions: I)
    where
        I: IntoIterator<Item = &'a Position>,
    {
        self.clear();
        for (agent, position) in positions.into_iter().enumerate() {
            let cell = self.cell_of(position);
            self.insert(agent, cell);
        }
    }

    /// Re-links every agent whose position now maps to a different cell.
    /// Returns the number of agents that changed buckets.
    pub fn maintain<F>(&mut self, mut position_of: F) -> usize
    where
        F: FnMut(AgentIndex) -> Position,
    {
        let mut migrations = 0;
        for cell in 0..self.heads.len() {
            let mut predecessor = None;
            let mut cursor = self.heads[cell];
            while let Some(agent) = cursor {
                // Read the link before the agent is unlinked.
                cursor = self.next[agent];
                let target = self.index(self.cell_of(&position_of(agent)));
                if target == cell {
                    predecessor = Some(agent);
                    continue;
                }
                let (from, to) = (self.coord(cell), self.coord(target));
                log::trace!("agent {} migrates {:?} -> {:?}", agent, from, to);
                self.migrate(agent, from, to, predecessor);
                migrations += 1;
            }
        }
        migrations
    }

    fn insert_at(&mut self, agent: AgentIndex, cell: usize) {
        self.next[agent] = self.heads[cell];
        self.heads[cell] = Some(agent);
    }

    fn remove_at(&mut self, agent: AgentIndex, cell: usize, predecessor: Option<AgentIndex>) {
        let successor = self.next[agent].take();
        match predecessor {
            Some(previous) => {
                debug_assert_eq!(self.next[previous], Some(agent));
                self.next[previous] = successor;
            }
            None => {
                debug_assert_eq!(self.heads[cell], Some(agent));
                self.heads[cell] = successor;
            }
        }
    }
}

/// Iterator over one cell's bucket.
pub struct Bucket<'a> {
    grid: &'a SpatialGrid,
    cursor: Option<AgentIndex>,
}

impl Iterator for Bucket<'_> {
    type Item = AgentIndex;

    fn next(&mut self) -> Option<Self::Item> {
        let agent = self.cursor?;
        self.cursor = self.grid.next[agent];
        Some(agent)
    }
}
