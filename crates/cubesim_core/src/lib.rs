//! # CUBESIM Core
//!
//! The neighbor graph of simulated cubes and its frame-synchronized event
//! dispatch.
//!
//! - Cubes placed side by side become neighbors; links are always symmetric
//! - Every link change and touch is queued the moment it happens
//! - Once per engine frame, the queue is drained in order and delivered
//!
//! ## Architecture Rules
//!
//! 1. **One lock** - the whole graph and its queue sit behind a single
//!    re-entrant mutex; there are no per-node locks
//! 2. **One mutation entry point** - only `NeighborGraph::set_neighbor`
//!    writes neighbor slots, so both ends of a link change together
//! 3. **Hooks outside the lock** - per-node hooks run only after a tick has
//!    released the graph lock; surfaces are called without the graph's own
//!    state borrowed
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cubesim_core::{FrameCoordinator, GraphConfig, NeighborGraph, NullSurface, Side};
//!
//! let graph = Arc::new(NeighborGraph::new(2, GraphConfig::default())?);
//! let a = graph.register_node(Arc::new(NullSurface))?;
//! let b = graph.register_node(Arc::new(NullSurface))?;
//! graph.set_neighbor(a, Side::Right, Some(b))?;
//!
//! let mut frames = FrameCoordinator::new(Arc::clone(&graph));
//! frames.tick(&mut engine, &|node| println!("{node} changed"));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod frame;
pub mod graph;
pub mod node;
pub mod side;

pub use config::GraphConfig;
pub use engine::{
    ChannelHooks, Delivered, Engine, HookMessage, HookReceiver, NodeHooks, NullSurface,
    RecordingEngine, Surface,
};
pub use error::{GraphError, GraphResult};
pub use events::{EventQueue, PendingEvent};
pub use frame::{FrameCoordinator, FrameReport, FrameStats};
pub use graph::NeighborGraph;
pub use node::{CubeNode, NodeId};
pub use side::Side;

pub use cubesim_shared as shared;
