//! # Pending Events
//!
//! Notifications queued at the moment of mutation and delivered, in order,
//! by the next frame tick.
//!
//! Events carry [`NodeId`] handles. They are resolved to engine-visible
//! `CubeId`s only at delivery, so the ids reflect the registry at that
//! point rather than at enqueue.

use std::collections::VecDeque;

use cubesim_shared::NeighborRecord;

use crate::engine::Engine;
use crate::node::NodeId;
use crate::side::Side;

/// A notification awaiting delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PendingEvent {
    /// `node` gained `other` on `side`.
    NeighborAdded {
        /// Side of `node`.
        side: Side,
        /// Node whose slot was written.
        node: NodeId,
        /// The new neighbor.
        other: NodeId,
    },
    /// `node` lost `other` on `side`.
    NeighborRemoved {
        /// Side of `node`.
        side: Side,
        /// Node whose slot was cleared.
        node: NodeId,
        /// The former neighbor.
        other: NodeId,
    },
    /// `node` was touched.
    Touched {
        /// The touched node.
        node: NodeId,
    },
}

/// Undirected link identity: `(a, side, b)` and `(b, side.opposite(), a)`
/// name the same link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EdgeKey {
    node: NodeId,
    side: Side,
    other: NodeId,
}

impl EdgeKey {
    /// Canonical form: the endpoint whose side is right or bottom comes first.
    #[must_use]
    pub fn new(node: NodeId, side: Side, other: NodeId) -> Self {
        match side {
            Side::Right | Side::Bottom => Self { node, side, other },
            _ => Self {
                node: other,
                side: side.opposite(),
                other: node,
            },
        }
    }
}

impl PendingEvent {
    /// The link this event concerns, if any.
    #[must_use]
    pub fn edge(&self) -> Option<EdgeKey> {
        match *self {
            Self::NeighborAdded { side, node, other } | Self::NeighborRemoved { side, node, other } => {
                Some(EdgeKey::new(node, side, other))
            }
            Self::Touched { .. } => None,
        }
    }

    /// Resolves handles and hands the event to the engine.
    pub fn deliver<E: Engine + ?Sized>(&self, engine: &mut E) {
        match *self {
            Self::NeighborAdded { side, node, other } => {
                engine.on_neighbor_added(record(side, node, other));
            }
            Self::NeighborRemoved { side, node, other } => {
                engine.on_neighbor_removed(record(side, node, other));
            }
            Self::Touched { node } => engine.on_touch(node.cube_id()),
        }
    }
}

fn record(side: Side, node: NodeId, other: NodeId) -> NeighborRecord {
    NeighborRecord {
        first: node.cube_id(),
        first_side: side.to_wire() as u8,
        second: other.cube_id(),
        second_side: side.opposite().to_wire() as u8,
    }
}

/// An event plus the frame that was current when it was queued.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueuedEvent {
    /// The event.
    pub event: PendingEvent,
    /// Completed-tick count at enqueue.
    pub frame: u64,
}

/// FIFO of pending events.
///
/// Not synchronized on its own: it lives inside the graph state and is only
/// touched under the graph lock.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<QueuedEvent>,
}

impl EventQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event stamped with `frame`.
    pub fn push(&mut self, event: PendingEvent, frame: u64) {
        tracing::trace!(?event, frame, "event queued");
        self.events.push_back(QueuedEvent { event, frame });
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Checks if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Pending events, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &PendingEvent> {
        self.events.iter().map(|queued| &queued.event)
    }

    /// Counts events queued before `frame`.
    #[must_use]
    pub fn older_than(&self, frame: u64) -> usize {
        self.events.iter().filter(|queued| queued.frame < frame).count()
    }

    /// Takes every pending event, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<PendingEvent> {
        self.events.drain(..).map(|queued| queued.event).collect()
    }
}

/// Drops links that were created and destroyed within one batch.
///
/// Every `NeighborAdded(e)` followed later by a `NeighborRemoved(e)` of the
/// same link is removed together with that removal. Everything else keeps
/// its relative order. Returns the number of events dropped.
pub fn collapse_transient(events: &mut Vec<PendingEvent>) -> usize {
    let mut dropped = vec![false; events.len()];

    for (i, event) in events.iter().enumerate() {
        let PendingEvent::NeighborAdded { .. } = event else {
            continue;
        };
        let Some(edge) = event.edge() else { continue };

        let later = events
            .iter()
            .enumerate()
            .skip(i + 1)
            .filter(|(j, _)| !dropped[*j])
            .find(|(_, candidate)| candidate.edge() == Some(edge));

        // Only an immediate removal cancels; a re-add means the link was live.
        if let Some((j, PendingEvent::NeighborRemoved { .. })) = later {
            dropped[i] = true;
            dropped[j] = true;
        }
    }

    let before = events.len();
    let mut index = 0;
    events.retain(|_| {
        let keep = !dropped[index];
        index += 1;
        keep
    });
    before - events.len()
}
