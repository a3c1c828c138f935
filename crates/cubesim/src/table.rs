//! # Table
//!
//! Where the cubes sit. Each cube occupies one grid cell; two cubes in
//! edge-adjacent cells are neighbors.
//!
//! ```text
//!            (x, y-1) Top
//! (x-1, y) Left  [cube]  Right (x+1, y)
//!            (x, y+1) Bottom
//! ```
//!
//! New cubes are flowed into rows with one empty cell between them, so the
//! table starts with no links. Moving a cube recomputes its four slots from
//! the grid and pushes them through `NeighborGraph::set_neighbor`.

use std::collections::HashMap;

use cubesim_core::{GraphResult, NeighborGraph, NodeId, Side};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Grid coordinate of a cube, `y` grows downward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cell {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Cell {
    /// Creates a cell.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell touching `side` of this one.
    #[must_use]
    pub const fn toward(self, side: Side) -> Self {
        match side {
            Side::Top => Self::new(self.x, self.y - 1),
            Side::Left => Self::new(self.x - 1, self.y),
            Side::Bottom => Self::new(self.x, self.y + 1),
            Side::Right => Self::new(self.x + 1, self.y),
            Side::NoSide => self,
        }
    }
}

/// Cube positions on the table.
#[derive(Debug)]
pub struct Table {
    columns: usize,
    positions: HashMap<NodeId, Cell>,
    occupied: HashMap<Cell, NodeId>,
}

impl Table {
    /// Creates an empty table flowing `columns` cubes per row.
    #[must_use]
    pub fn new(columns: usize) -> Self {
        Self {
            columns: columns.max(1),
            positions: HashMap::new(),
            occupied: HashMap::new(),
        }
    }

    /// Flow-layout cell of the `n`th cube.
    #[must_use]
    pub fn flow_cell(&self, n: usize) -> Cell {
        let col = (n % self.columns) as i32;
        let row = (n / self.columns) as i32;
        Cell::new(col * 2, row * 2)
    }

    /// Puts `node` at its flow-layout cell. Returns that cell.
    pub fn place(&mut self, node: NodeId) -> Cell {
        let cell = self.flow_cell(node.index());
        self.positions.insert(node, cell);
        self.occupied.insert(cell, node);
        tracing::debug!(%node, x = cell.x, y = cell.y, "placed");
        cell
    }

    /// Number of cubes on the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Where `node` sits.
    #[must_use]
    pub fn position(&self, node: NodeId) -> Option<Cell> {
        self.positions.get(&node).copied()
    }

    /// Who sits at `cell`.
    #[must_use]
    pub fn occupant(&self, cell: Cell) -> Option<NodeId> {
        self.occupied.get(&cell).copied()
    }

    /// Drags `node` to `to` and relinks it.
    ///
    /// Returns `false`, changing nothing, when `to` is taken by another
    /// cube or `node` is not on the table.
    ///
    /// # Errors
    ///
    /// Whatever `NeighborGraph::set_neighbor` reports.
    pub fn move_cube(&mut self, graph: &NeighborGraph, node: NodeId, to: Cell) -> GraphResult<bool> {
        let Some(from) = self.position(node) else {
            return Ok(false);
        };
        if from == to {
            return Ok(true);
        }
        if self.occupied.contains_key(&to) {
            tracing::debug!(%node, x = to.x, y = to.y, "drop refused, cell occupied");
            return Ok(false);
        }

        self.occupied.remove(&from);
        self.occupied.insert(to, node);
        self.positions.insert(node, to);
        self.relink(graph, node)?;
        Ok(true)
    }

    /// Sets every slot of `node` from what is around it on the grid.
    ///
    /// # Errors
    ///
    /// Whatever `NeighborGraph::set_neighbor` reports.
    pub fn relink(&self, graph: &NeighborGraph, node: NodeId) -> GraphResult<()> {
        let Some(cell) = self.position(node) else {
            return Ok(());
        };
        for side in Side::ALL {
            graph.set_neighbor(node, side, self.occupant(cell.toward(side)))?;
        }
        Ok(())
    }
}

/// One scripted UI gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gesture {
    /// Drop a cube on a cell.
    Drag {
        /// Cube being dragged.
        node: NodeId,
        /// Target cell.
        to: Cell,
    },
    /// Tap a cube.
    Touch(NodeId),
}

/// Seeded source of gestures standing in for a user's mouse.
#[derive(Debug)]
pub struct DragScript {
    rng: ChaCha8Rng,
}

impl DragScript {
    /// Chance that a gesture is a tap instead of a drag.
    const TOUCH_PROBABILITY: f64 = 0.2;

    /// Creates a script; the same seed gives the same gestures.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Picks the next gesture, `None` on an empty table.
    ///
    /// Drags aim next to another cube so links actually form.
    pub fn next(&mut self, table: &Table) -> Option<Gesture> {
        let count = table.len();
        if count == 0 {
            return None;
        }
        let node = NodeId::new(self.rng.gen_range(0..count) as u32);
        if self.rng.gen_bool(Self::TOUCH_PROBABILITY) {
            return Some(Gesture::Touch(node));
        }

        let anchor = NodeId::new(self.rng.gen_range(0..count) as u32);
        let side = Side::ALL[self.rng.gen_range(0..Side::ALL.len())];
        let to = table.position(anchor)?.toward(side);
        Some(Gesture::Drag { node, to })
    }
}
