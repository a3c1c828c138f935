//! # UI Thread
//!
//! Owns the table and the cube screens. Each step it:
//!
//! 1. drains hook messages marshaled from the engine thread and redraws the
//!    link outline of every cube whose neighbors changed
//! 2. plays one scripted gesture (drag or tap) against the graph
//!
//! Graph mutations happen here while the engine thread ticks; the graph lock
//! keeps the two apart.

use std::sync::Arc;
use std::time::Duration;

use cubesim_core::shared::SCREEN_SIZE;
use cubesim_core::{GraphResult, HookMessage, HookReceiver, NeighborGraph, NodeId, Side, Surface};

use crate::control::RunControl;
use crate::surface::PixelSurface;
use crate::table::{DragScript, Gesture, Table};

/// Palette slot of the outline drawn on linked edges.
const OUTLINE: u32 = 3;
/// Inset of the outline from the screen edge.
const INSET: u32 = 2;

/// Counters of the UI thread.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UiStats {
    /// Drags that landed.
    pub drags: u64,
    /// Drags refused on an occupied cell.
    pub refused: u64,
    /// Taps sent.
    pub touches: u64,
    /// Hook messages handled.
    pub hooks: u64,
}

/// State owned by the UI thread.
#[derive(Debug)]
pub struct Ui {
    graph: Arc<NeighborGraph>,
    table: Table,
    script: DragScript,
    surfaces: Vec<Arc<PixelSurface>>,
    hooks: HookReceiver,
    stats: UiStats,
}

impl Ui {
    /// Creates the UI over already registered and placed cubes.
    ///
    /// `surfaces[i]` must be the surface registered for `NodeId(i)`.
    #[must_use]
    pub fn new(
        graph: Arc<NeighborGraph>,
        table: Table,
        script: DragScript,
        surfaces: Vec<Arc<PixelSurface>>,
        hooks: HookReceiver,
    ) -> Self {
        Self {
            graph,
            table,
            script,
            surfaces,
            hooks,
            stats: UiStats::default(),
        }
    }

    /// Counters so far.
    #[must_use]
    pub const fn stats(&self) -> &UiStats {
        &self.stats
    }

    /// The table.
    #[must_use]
    pub const fn table(&self) -> &Table {
        &self.table
    }

    /// Handles every pending hook message. Returns how many.
    ///
    /// # Errors
    ///
    /// Whatever the graph queries report.
    pub fn pump_hooks(&mut self) -> GraphResult<usize> {
        let mut handled = 0;
        while let Some(HookMessage::NeighborsChanged { node, frame }) = self.hooks.try_recv() {
            tracing::trace!(%node, frame, "neighbors changed");
            self.outline(node)?;
            handled += 1;
        }
        self.stats.hooks += handled as u64;
        Ok(handled)
    }

    /// Plays one scripted gesture.
    ///
    /// # Errors
    ///
    /// Whatever the graph reports.
    pub fn step(&mut self) -> GraphResult<()> {
        match self.script.next(&self.table) {
            Some(Gesture::Drag { node, to }) => {
                if self.table.move_cube(&self.graph, node, to)? {
                    self.stats.drags += 1;
                } else {
                    self.stats.refused += 1;
                }
            }
            Some(Gesture::Touch(node)) => {
                self.graph.touch(node)?;
                self.stats.touches += 1;
            }
            None => {}
        }
        Ok(())
    }

    /// Runs until the engine thread stops, then handles the last hooks.
    ///
    /// # Errors
    ///
    /// The first graph error; the run is asked to stop before returning it.
    pub fn run(mut self, control: &RunControl, interval: Duration) -> GraphResult<UiStats> {
        let result = self.run_until_stopped(control, interval);
        if result.is_err() {
            control.request_stop();
        }
        result.map(|()| self.stats)
    }

    fn run_until_stopped(&mut self, control: &RunControl, interval: Duration) -> GraphResult<()> {
        while control.is_running() {
            self.pump_hooks()?;
            if !control.stop_requested() {
                self.step()?;
            }
            std::thread::sleep(interval);
        }
        self.pump_hooks()?;
        Ok(())
    }

    /// Draws an outline along each linked edge of `node`.
    fn outline(&self, node: NodeId) -> GraphResult<()> {
        let Some(surface) = self.surfaces.get(node.index()) else {
            return Ok(());
        };
        for side in Side::ALL {
            if self.graph.neighbor(node, side)?.is_some() {
                draw_edge(surface.as_ref(), side);
            }
        }
        Ok(())
    }
}

fn draw_edge(surface: &dyn Surface, side: Side) {
    let far = SCREEN_SIZE - 1 - INSET;
    for i in INSET..=far {
        let (x, y) = match side {
            Side::Top => (i, INSET),
            Side::Left => (INSET, i),
            Side::Bottom => (i, far),
            Side::Right | Side::NoSide => (far, i),
        };
        surface.plot(x, y, OUTLINE);
    }
}
