//! # CUBESIM
//!
//! Desktop host for the cube neighbor simulator.
//!
//! ## Threads
//!
//! - **UI thread** - owns the table and the cube screens, drags cubes
//!   around and taps them, redraws outlines when hooks arrive
//! - **Engine thread** - ticks the frame coordinator at a fixed rate and
//!   runs the stand-in engine
//!
//! The two only meet at the neighbor graph (one lock) and the hook channel.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod control;
pub mod engine;
pub mod sim;
pub mod surface;
pub mod table;
pub mod tick;
pub mod ui;

pub use config::{ConfigError, SimConfig};
pub use control::RunControl;
pub use engine::{EngineStats, StandInEngine};
pub use sim::{run, EngineSummary, RunSummary, SimError};
pub use surface::PixelSurface;
pub use table::{Cell, DragScript, Gesture, Table};
pub use tick::{TickLoop, TickStats};
pub use ui::{Ui, UiStats};
