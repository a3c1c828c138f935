//! # CUBESIM
//!
//! Runs the simulator headless.
//!
//! ```bash
//! # Defaults
//! cubesim
//!
//! # With a config file, more logging
//! RUST_LOG=debug cubesim sim.toml
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use cubesim::{RunControl, SimConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_CONFIG: &str = "cubesim.toml";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG), PathBuf::from);
    let config = SimConfig::load(&path)?;

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_filter))?;
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    tracing::info!(
        config = %path.display(),
        cubes = config.capacity,
        tick_rate = config.tick_rate,
        frames = config.frames,
        "cubesim starting"
    );

    let control = Arc::new(RunControl::new());
    let summary = cubesim::run(&config, &control)?;

    let frames = summary.engine.frames;
    let ticks = summary.engine.ticks;
    tracing::info!(
        ticks = frames.ticks,
        delivered = frames.delivered,
        collapsed = frames.collapsed,
        missed = frames.missed_events,
        hooks = frames.hooks_run,
        max_locked_us = frames.max_locked_us,
        avg_tick_us = ticks.avg_tick_us,
        late_ticks = ticks.late_ticks,
        "engine summary"
    );
    tracing::info!(
        drags = summary.ui.drags,
        refused = summary.ui.refused,
        touches = summary.ui.touches,
        groups = summary.engine.engine.groups,
        "ui summary"
    );
    Ok(())
}
