//! # Stand-In Engine
//!
//! A small engine in the spirit of the cube apps the simulator hosts. Each
//! cube shows a color; tapping a cube advances it, and cubes that end up in
//! one connected group adopt the color of the group's lowest id.
//!
//! Callbacks only record what happened. Painting is done by [`StandInEngine::paint`]
//! after the tick, so surfaces are written with the graph lock released.

use std::collections::VecDeque;
use std::sync::Arc;

use cubesim_core::shared::{CubeId, NeighborRecord, Rgb, SCREEN_SIZE};
use cubesim_core::{Engine, GraphResult, NeighborGraph, Side};

/// Colors a cube cycles through when tapped.
const COLORS: [Rgb; 6] = [
    Rgb::new(220, 40, 40),
    Rgb::new(240, 160, 20),
    Rgb::new(230, 220, 40),
    Rgb::new(40, 180, 60),
    Rgb::new(40, 110, 220),
    Rgb::new(150, 60, 200),
];

/// Palette slot holding the cube's color.
const FILL: u32 = 1;
/// Palette slot used for link markers.
const MARKER: u32 = 2;

/// Counters of what the engine saw.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Touches received.
    pub touches: u64,
    /// Neighbor-added records received.
    pub links_added: u64,
    /// Neighbor-removed records received.
    pub links_removed: u64,
    /// Neighborhood-changed signals received.
    pub neighborhood_changes: u64,
    /// Connected groups after the last neighborhood change.
    pub groups: usize,
    /// Cubes repainted.
    pub repaints: u64,
}

/// Engine run by the host on its engine thread.
#[derive(Debug)]
pub struct StandInEngine {
    capacity: usize,
    graph: Option<Arc<NeighborGraph>>,
    color: Vec<usize>,
    dirty: Vec<bool>,
    stats: EngineStats,
}

impl StandInEngine {
    /// Creates an engine declaring `capacity` cubes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            graph: None,
            color: (0..capacity).map(|i| i % COLORS.len()).collect(),
            dirty: vec![true; capacity],
            stats: EngineStats::default(),
        }
    }

    /// Connects the engine to the graph built from its capacity.
    pub fn attach(&mut self, graph: Arc<NeighborGraph>) {
        self.graph = Some(graph);
    }

    /// Counters so far.
    #[must_use]
    pub const fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Color index cube `cube` currently shows.
    #[must_use]
    pub fn color_of(&self, cube: CubeId) -> Option<usize> {
        cube.index().and_then(|i| self.color.get(i)).copied()
    }

    /// Repaints every cube touched by the last tick. Returns how many.
    ///
    /// # Errors
    ///
    /// Whatever the graph's drawing calls report.
    pub fn paint(&mut self) -> GraphResult<usize> {
        let Some(graph) = self.graph.clone() else {
            return Ok(0);
        };
        let mut painted = 0;
        for index in 0..self.capacity {
            if !std::mem::take(&mut self.dirty[index]) {
                continue;
            }
            let cube = CubeId::from_index(index);
            graph.set_palette_color(cube, FILL as usize, COLORS[self.color[index]])?;
            graph.set_palette_color(cube, MARKER as usize, Rgb::new(255, 255, 255))?;
            graph.clear_screen(cube, FILL)?;
            for side in Side::ALL {
                if graph.neighborhood_cube_at(cube, side)?.is_valid() {
                    draw_marker(&graph, cube, side)?;
                }
            }
            painted += 1;
        }
        self.stats.repaints += painted as u64;
        Ok(painted)
    }

    fn mark(&mut self, cube: CubeId) {
        if let Some(dirty) = cube.index().and_then(|i| self.dirty.get_mut(i)) {
            *dirty = true;
        }
    }

    /// Recolors every connected group after the lowest id in it.
    fn regroup(&mut self, graph: &NeighborGraph) -> GraphResult<usize> {
        let registered = graph.len().min(self.capacity);
        let mut group = vec![usize::MAX; registered];
        let mut groups = 0;

        for root in 0..registered {
            if group[root] != usize::MAX {
                continue;
            }
            groups += 1;
            group[root] = root;
            let mut queue = VecDeque::from([root]);
            while let Some(index) = queue.pop_front() {
                for side in Side::ALL {
                    let other = graph.neighborhood_cube_at(CubeId::from_index(index), side)?;
                    if let Some(other) = other.index().filter(|&o| o < registered) {
                        if group[other] == usize::MAX {
                            group[other] = root;
                            queue.push_back(other);
                        }
                    }
                }
            }
        }

        for (index, &root) in group.iter().enumerate() {
            if root != index && self.color[index] != self.color[root] {
                self.color[index] = self.color[root];
                self.dirty[index] = true;
            }
        }
        Ok(groups)
    }
}

fn draw_marker(graph: &NeighborGraph, cube: CubeId, side: Side) -> GraphResult<()> {
    let last = SCREEN_SIZE - 1;
    for i in 0..SCREEN_SIZE {
        let (x, y) = match side {
            Side::Top => (i, 0),
            Side::Left => (0, i),
            Side::Bottom => (i, last),
            Side::Right | Side::NoSide => (last, i),
        };
        graph.draw_point(cube, x, y, MARKER)?;
    }
    Ok(())
}

impl Engine for StandInEngine {
    fn cube_capacity(&self) -> usize {
        self.capacity
    }

    fn on_touch(&mut self, cube: CubeId) {
        self.stats.touches += 1;
        if let Some(color) = cube.index().and_then(|i| self.color.get_mut(i)) {
            *color = (*color + 1) % COLORS.len();
        }
        self.mark(cube);
        self.log(&format!("cube {} tapped", cube.0));
    }

    fn on_neighbor_added(&mut self, record: NeighborRecord) {
        self.stats.links_added += 1;
        self.mark(record.first);
        self.mark(record.second);
        tracing::debug!(
            first = record.first.0,
            second = record.second.0,
            first_side = ?record.first_side(),
            second_side = ?record.second_side(),
            "engine: neighbor added"
        );
    }

    fn on_neighbor_removed(&mut self, record: NeighborRecord) {
        self.stats.links_removed += 1;
        self.mark(record.first);
        self.mark(record.second);
        tracing::debug!(
            first = record.first.0,
            second = record.second.0,
            "engine: neighbor removed"
        );
    }

    fn on_neighborhood_changed(&mut self) {
        self.stats.neighborhood_changes += 1;
        let Some(graph) = self.graph.clone() else {
            return;
        };
        match self.regroup(&graph) {
            Ok(groups) => {
                self.stats.groups = groups;
                self.log(&format!("{groups} group(s) on the table"));
            }
            Err(e) => tracing::warn!(error = %e, "regroup failed"),
        }
    }
}
