//! # Engine Boundary
//!
//! Traits the outside world implements to plug into the graph.
//!
//! ```text
//!   core defines:          outside implements:
//! ┌──────────────────┐    ┌───────────────────────────────┐
//! │ trait Engine     │ ←─ │ native engine / stand-in      │
//! │ trait Surface    │ ←─ │ rendering back end, per cube  │
//! │ trait NodeHooks  │ ←─ │ UI thread (via ChannelHooks)  │
//! └──────────────────┘    └───────────────────────────────┘
//! ```
//!
//! `Engine` callbacks run inside the locked phase of a tick, on the ticking
//! thread. `Surface` and `NodeHooks` calls are always made with the graph
//! lock released.

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use cubesim_shared::{CubeId, NeighborRecord, Rgb, DEFAULT_CAPACITY};

use crate::node::NodeId;

/// Callback surface of the simulation engine.
///
/// The engine may call back into the graph from any of these methods
/// (queries, touch, even `set_neighbor`); the graph lock is re-entrant.
pub trait Engine {
    /// Number of cubes the engine can address. Asked once, at startup.
    fn cube_capacity(&self) -> usize;

    /// A cube was touched.
    fn on_touch(&mut self, cube: CubeId);

    /// Two cubes became neighbors.
    fn on_neighbor_added(&mut self, record: NeighborRecord);

    /// Two cubes stopped being neighbors.
    fn on_neighbor_removed(&mut self, record: NeighborRecord);

    /// At least one link changed since the previous tick.
    fn on_neighborhood_changed(&mut self);

    /// Log line coming from the engine.
    fn log(&mut self, message: &str) {
        tracing::info!(target: "cubesim::engine", "{}", message);
    }
}

/// Rendering back end of one cube.
///
/// Implementations own whatever pixels exist; the core only forwards
/// requests and never takes its lock around them. A request made from an
/// engine callback still runs inside the tick's locked phase.
pub trait Surface: Send + Sync {
    /// Fills the screen with a palette entry.
    fn clear(&self, color_index: u32);

    /// Writes one pixel.
    fn plot(&self, x: u32, y: u32, color_index: u32);

    /// A palette entry changed.
    fn palette_changed(&self, _index: usize, _color: Rgb) {}
}

/// Surface that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSurface;

impl Surface for NullSurface {
    fn clear(&self, _color_index: u32) {}
    fn plot(&self, _x: u32, _y: u32, _color_index: u32) {}
}

/// Per-node "neighbors changed" hook, run in the unlocked phase of a tick.
pub trait NodeHooks {
    /// Called exactly once per tick for each node whose links changed.
    fn neighbors_changed(&self, node: NodeId);
}

impl<F> NodeHooks for F
where
    F: Fn(NodeId),
{
    fn neighbors_changed(&self, node: NodeId) {
        self(node);
    }
}

/// Message carried to the thread that owns the node's resources.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookMessage {
    /// The node's neighbors changed during the given frame.
    NeighborsChanged {
        /// Node whose links changed.
        node: NodeId,
        /// Frame that observed the change.
        frame: u64,
    },
}

/// Hooks that marshal every call onto a channel.
///
/// The ticking thread never touches UI-owned state; the UI thread drains
/// the matching [`HookReceiver`] on its own schedule.
#[derive(Clone, Debug)]
pub struct ChannelHooks {
    sender: Sender<HookMessage>,
    frame: u64,
}

impl ChannelHooks {
    /// Creates a connected sender/receiver pair.
    #[must_use]
    pub fn pair() -> (Self, HookReceiver) {
        let (sender, receiver) = unbounded();
        (Self { sender, frame: 0 }, HookReceiver { receiver })
    }

    /// Returns a copy stamped with `frame`.
    #[must_use]
    pub fn for_frame(&self, frame: u64) -> Self {
        Self {
            sender: self.sender.clone(),
            frame,
        }
    }
}

impl NodeHooks for ChannelHooks {
    fn neighbors_changed(&self, node: NodeId) {
        let message = HookMessage::NeighborsChanged {
            node,
            frame: self.frame,
        };
        if self.sender.send(message).is_err() {
            tracing::debug!("hook receiver gone, dropping change for {}", node);
        }
    }
}

/// Receiving end of [`ChannelHooks`].
#[derive(Debug)]
pub struct HookReceiver {
    receiver: Receiver<HookMessage>,
}

impl HookReceiver {
    /// Receives one pending message without blocking.
    #[must_use]
    pub fn try_recv(&self) -> Option<HookMessage> {
        match self.receiver.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Drains every pending message into `handler`. Returns how many ran.
    pub fn drain(&self, mut handler: impl FnMut(HookMessage)) -> usize {
        let mut count = 0;
        while let Some(message) = self.try_recv() {
            handler(message);
            count += 1;
        }
        count
    }
}

/// A notification as the engine received it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivered {
    /// `on_touch`.
    Touch(CubeId),
    /// `on_neighbor_added`.
    Added(NeighborRecord),
    /// `on_neighbor_removed`.
    Removed(NeighborRecord),
    /// `on_neighborhood_changed`.
    NeighborhoodChanged,
}

/// Engine that records every callback in order.
///
/// Handy for replays and tests.
#[derive(Clone, Debug)]
pub struct RecordingEngine {
    /// Capacity reported to the graph.
    pub capacity: usize,
    /// Everything delivered so far.
    pub delivered: Vec<Delivered>,
    /// Log lines received.
    pub logs: Vec<String>,
}

impl RecordingEngine {
    /// Creates an empty recorder declaring the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an empty recorder declaring `capacity` cubes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            delivered: Vec::new(),
            logs: Vec::new(),
        }
    }

    /// Takes everything recorded so far.
    pub fn take(&mut self) -> Vec<Delivered> {
        std::mem::take(&mut self.delivered)
    }
}

impl Default for RecordingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for RecordingEngine {
    fn cube_capacity(&self) -> usize {
        self.capacity
    }

    fn on_touch(&mut self, cube: CubeId) {
        self.delivered.push(Delivered::Touch(cube));
    }

    fn on_neighbor_added(&mut self, record: NeighborRecord) {
        self.delivered.push(Delivered::Added(record));
    }

    fn on_neighbor_removed(&mut self, record: NeighborRecord) {
        self.delivered.push(Delivered::Removed(record));
    }

    fn on_neighborhood_changed(&mut self) {
        self.delivered.push(Delivered::NeighborhoodChanged);
    }

    fn log(&mut self, message: &str) {
        self.logs.push(message.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_hooks_carry_frame() {
        let (hooks, receiver) = ChannelHooks::pair();
        let hooks = hooks.for_frame(7);
        hooks.neighbors_changed(NodeId::new(2));
        hooks.neighbors_changed(NodeId::new(0));

        let mut seen = Vec::new();
        assert_eq!(receiver.drain(|m| seen.push(m)), 2);
        assert_eq!(
            seen,
            vec![
                HookMessage::NeighborsChanged { node: NodeId::new(2), frame: 7 },
                HookMessage::NeighborsChanged { node: NodeId::new(0), frame: 7 },
            ]
        );
        assert!(receiver.try_recv().is_none());
    }

    #[test]
    fn test_closure_hooks() {
        let count = std::cell::Cell::new(0);
        let hooks = |_node: NodeId| count.set(count.get() + 1);
        hooks.neighbors_changed(NodeId::new(1));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_recording_engine_order() {
        let mut engine = RecordingEngine::new();
        engine.on_touch(CubeId(1));
        engine.on_neighborhood_changed();
        engine.log("hello");
        assert_eq!(
            engine.take(),
            vec![Delivered::Touch(CubeId(1)), Delivered::NeighborhoodChanged]
        );
        assert_eq!(engine.logs, vec!["hello".to_owned()]);
        assert!(engine.delivered.is_empty());
    }
}
