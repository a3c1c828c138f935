//! # Simulator Run
//!
//! Wires one run together:
//!
//! ```text
//!  main thread            engine thread                 UI thread
//!  ───────────            ─────────────                 ─────────
//!  build graph  ───────►  TickLoop                      Ui::run
//!  register cubes         └─ FrameCoordinator::tick ──► HookReceiver
//!  spawn threads             └─ StandInEngine::paint    DragScript gestures
//!  wait on done channel ◄─ EngineSummary                   │
//!  join UI thread  ◄───────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Sender};
use cubesim_core::{
    ChannelHooks, FrameCoordinator, FrameStats, GraphError, GraphResult, NeighborGraph,
};
use thiserror::Error;

use crate::config::SimConfig;
use crate::control::RunControl;
use crate::engine::{EngineStats, StandInEngine};
use crate::surface::PixelSurface;
use crate::table::{DragScript, Table};
use crate::tick::{TickLoop, TickStats};
use crate::ui::{Ui, UiStats};

/// Errors ending a run.
#[derive(Debug, Error)]
pub enum SimError {
    /// The graph rejected an operation.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// A worker thread could not be started.
    #[error("failed to spawn {0} thread: {1}")]
    Spawn(&'static str, std::io::Error),

    /// A worker thread panicked or vanished without reporting.
    #[error("{0} thread ended abnormally")]
    ThreadLost(&'static str),
}

/// What the engine thread reports when it stops.
#[derive(Clone, Copy, Debug)]
pub struct EngineSummary {
    /// Frame coordinator totals.
    pub frames: FrameStats,
    /// Tick pacing.
    pub ticks: TickStats,
    /// Engine counters.
    pub engine: EngineStats,
}

/// Everything a finished run produced.
#[derive(Clone, Copy, Debug)]
pub struct RunSummary {
    /// Engine thread report.
    pub engine: EngineSummary,
    /// UI thread counters.
    pub ui: UiStats,
}

/// Runs the simulator until `config.frames` ticks ran or `control` asks
/// to stop.
///
/// # Errors
///
/// [`SimError`] from either thread.
pub fn run(config: &SimConfig, control: &Arc<RunControl>) -> Result<RunSummary, SimError> {
    let mut engine = StandInEngine::new(config.capacity);
    let graph = Arc::new(NeighborGraph::for_engine(&engine, config.graph)?);
    engine.attach(Arc::clone(&graph));

    let mut table = Table::new(config.table_columns);
    let mut surfaces = Vec::with_capacity(graph.capacity());
    for _ in 0..graph.capacity() {
        let surface = Arc::new(PixelSurface::new());
        let node = graph.register_node(Arc::clone(&surface) as Arc<dyn cubesim_core::Surface>)?;
        table.place(node);
        surfaces.push(surface);
    }
    tracing::info!(cubes = graph.len(), "table ready");

    let (hooks, receiver) = ChannelHooks::pair();
    let ui = Ui::new(
        Arc::clone(&graph),
        table,
        DragScript::new(config.seed),
        surfaces,
        receiver,
    );

    let (done_tx, done_rx) = bounded(1);
    control.set_running(true);

    let engine_thread = {
        let control = Arc::clone(control);
        let frames = FrameCoordinator::new(Arc::clone(&graph));
        let (tick_rate, max_frames) = (config.tick_rate, config.frames);
        thread::Builder::new()
            .name("engine".to_owned())
            .spawn(move || engine_main(frames, engine, &hooks, &control, tick_rate, max_frames, &done_tx))
    };
    let engine_thread = match engine_thread {
        Ok(handle) => handle,
        Err(e) => {
            control.set_running(false);
            return Err(SimError::Spawn("engine", e));
        }
    };

    let ui_thread = {
        let control = Arc::clone(control);
        let interval = Duration::from_millis(config.drag_interval_ms);
        thread::Builder::new()
            .name("ui".to_owned())
            .spawn(move || ui.run(&control, interval))
    };
    let ui_thread = match ui_thread {
        Ok(handle) => handle,
        Err(e) => {
            stop_engine(engine_thread, control);
            return Err(SimError::Spawn("ui", e));
        }
    };

    // Completion report; a closed channel means the engine thread died.
    let engine_result = done_rx.recv().map_err(|_| SimError::ThreadLost("engine"));
    if engine_thread.join().is_err() {
        control.set_running(false);
    }
    let ui_result = ui_thread.join().map_err(|_| SimError::ThreadLost("ui"))?;

    let engine = engine_result??;
    let ui = ui_result?;
    Ok(RunSummary { engine, ui })
}

/// Asks the engine thread to stop and waits for it. Returns false if it
/// panicked.
fn stop_engine(engine_thread: JoinHandle<()>, control: &RunControl) -> bool {
    control.request_stop();
    let joined = engine_thread.join().is_ok();
    if !joined {
        control.set_running(false);
        tracing::error!("engine thread panicked while stopping");
    }
    joined
}

fn engine_main(
    mut frames: FrameCoordinator,
    mut engine: StandInEngine,
    hooks: &ChannelHooks,
    control: &RunControl,
    tick_rate: u32,
    max_frames: u64,
    done: &Sender<GraphResult<EngineSummary>>,
) {
    let mut tick_loop = TickLoop::new(tick_rate);
    let result = drive(&mut frames, &mut engine, hooks, control, &mut tick_loop, max_frames);
    control.set_running(false);

    let report = result.map(|()| EngineSummary {
        frames: *frames.stats(),
        ticks: *tick_loop.stats(),
        engine: *engine.stats(),
    });
    match &report {
        Ok(summary) => tracing::info!(ticks = summary.frames.ticks, "engine stopped"),
        Err(e) => tracing::error!(error = %e, "engine stopped on error"),
    }
    let _ = done.send(report);
}

fn drive(
    frames: &mut FrameCoordinator,
    engine: &mut StandInEngine,
    hooks: &ChannelHooks,
    control: &RunControl,
    tick_loop: &mut TickLoop,
    max_frames: u64,
) -> GraphResult<()> {
    engine.paint()?;
    loop {
        while tick_loop.should_tick() {
            if control.stop_requested() || (max_frames > 0 && tick_loop.tick_count() >= max_frames) {
                return Ok(());
            }
            let start = tick_loop.begin_tick();
            let frame = frames.graph().frame();
            frames.tick(engine, &hooks.for_frame(frame));
            engine.paint()?;
            tick_loop.end_tick(start);
        }
        if control.stop_requested() {
            return Ok(());
        }
        tick_loop.wait_for_next_tick();
    }
}
