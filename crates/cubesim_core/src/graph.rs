//! # Neighbor Graph
//!
//! The owning registry of cubes and the single entry point for changing who
//! touches whom.
//!
//! ## Locking
//!
//! ```text
//!  UI thread (drag)          engine thread (tick)
//!        │                          │
//!        ▼                          ▼
//!  set_neighbor()  ──┐      ┌── FrameCoordinator::tick()
//!  touch()           │      │     locked:  latch + drain + deliver
//!                    ▼      ▼
//!            ┌───────────────────────┐
//!            │ ReentrantMutex        │  one lock for every node
//!            │  └ RefCell<GraphState>│  and the event queue
//!            └───────────────────────┘
//! ```
//!
//! There are no per-node locks. Every mutation holds the graph lock for its
//! whole duration, so a half-written link is never visible to another
//! thread. The lock is re-entrant so that engine callbacks made during a
//! tick can query (or even mutate) the graph from the ticking thread.

use std::cell::RefCell;
use std::sync::Arc;

use cubesim_shared::{CubeId, Rgb, MAX_CUBES};
use parking_lot::ReentrantMutex;

use crate::config::GraphConfig;
use crate::engine::{Engine, Surface};
use crate::error::{GraphError, GraphResult};
use crate::events::{EventQueue, PendingEvent};
use crate::node::{CubeNode, NodeId};
use crate::side::Side;

/// Everything guarded by the graph lock.
#[derive(Debug)]
pub(crate) struct GraphState {
    pub(crate) nodes: Vec<CubeNode>,
    pub(crate) queue: EventQueue,
    /// Completed ticks.
    pub(crate) frame: u64,
    /// Set by a tick that latched at least one changed node.
    pub(crate) neighborhood_stale: bool,
}

impl GraphState {
    fn check(&self, node: NodeId) -> GraphResult<usize> {
        let index = node.index();
        if index < self.nodes.len() {
            Ok(index)
        } else {
            Err(GraphError::UnknownNode(index))
        }
    }

    fn set_neighbor(&mut self, node: NodeId, side: Side, other: Option<NodeId>) -> GraphResult<()> {
        let slot = side.slot()?;
        let opposite = side.opposite();
        let opposite_slot = opposite.slot()?;
        let index = self.check(node)?;
        if let Some(other) = other {
            self.check(other)?;
            if other == node {
                return Err(GraphError::SelfNeighbor(index));
            }
        }

        let current = self.nodes[index].neighbors()[slot];
        if current == other {
            return Ok(());
        }

        let frame = self.frame;

        if let Some(old) = current {
            debug_assert_eq!(self.nodes[old.index()].neighbors()[opposite_slot], Some(node));
            self.nodes[old.index()].set_slot(opposite_slot, None);
            self.nodes[index].set_slot(slot, None);
            self.queue.push(PendingEvent::NeighborRemoved { side, node, other: old }, frame);
            tracing::debug!("unlinked {} {:?} from {}", node, side, old);
        }

        let Some(other) = other else {
            return Ok(());
        };

        // The new neighbor may already be held on the facing side. Detach that
        // before linking so no back-reference ever points at an overwritten slot.
        if let Some(displaced) = self.nodes[other.index()].neighbors()[opposite_slot] {
            debug_assert_ne!(displaced, node);
            self.nodes[displaced.index()].set_slot(slot, None);
            self.nodes[other.index()].set_slot(opposite_slot, None);
            self.queue.push(
                PendingEvent::NeighborRemoved { side: opposite, node: other, other: displaced },
                frame,
            );
            tracing::debug!("unlinked {} {:?} from {}", other, opposite, displaced);
        }

        self.nodes[index].set_slot(slot, Some(other));
        self.nodes[other.index()].set_slot(opposite_slot, Some(node));
        self.queue.push(PendingEvent::NeighborAdded { side, node, other }, frame);
        tracing::debug!("linked {} {:?} to {}", node, side, other);

        Ok(())
    }
}

/// The neighbor graph: all cubes, their links, and the pending event queue.
///
/// Share it as `Arc<NeighborGraph>` between the UI thread and the engine
/// thread; every method takes `&self`.
pub struct NeighborGraph {
    capacity: usize,
    config: GraphConfig,
    pub(crate) state: ReentrantMutex<RefCell<GraphState>>,
}

impl NeighborGraph {
    /// Creates an empty graph that accepts up to `capacity` cubes.
    ///
    /// # Errors
    ///
    /// [`GraphError::CapacityTooLarge`] when `capacity` exceeds what a
    /// byte-sized cube id can name.
    pub fn new(capacity: usize, config: GraphConfig) -> GraphResult<Self> {
        if capacity > MAX_CUBES {
            return Err(GraphError::CapacityTooLarge {
                requested: capacity,
                max: MAX_CUBES,
            });
        }
        Ok(Self {
            capacity,
            config,
            state: ReentrantMutex::new(RefCell::new(GraphState {
                nodes: Vec::with_capacity(capacity),
                queue: EventQueue::new(),
                frame: 0,
                neighborhood_stale: false,
            })),
        })
    }

    /// Creates a graph sized by the engine's capacity answer.
    ///
    /// # Errors
    ///
    /// See [`NeighborGraph::new`].
    pub fn for_engine<E: Engine + ?Sized>(engine: &E, config: GraphConfig) -> GraphResult<Self> {
        let capacity = engine.cube_capacity();
        tracing::info!(capacity, "engine declared cube capacity");
        Self::new(capacity, config)
    }

    /// Capacity fixed at startup.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Configuration this graph was built with.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Number of registered cubes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read(|state| state.nodes.len())
    }

    /// Checks if no cube is registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Completed ticks.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.read(|state| state.frame)
    }

    /// Registers a new cube with its rendering surface.
    ///
    /// # Errors
    ///
    /// [`GraphError::CapacityExceeded`] when the registry is full; the
    /// registry is left unchanged.
    pub fn register_node(&self, surface: Arc<dyn Surface>) -> GraphResult<NodeId> {
        self.write(|state| {
            let index = state.nodes.len();
            if index >= self.capacity {
                return Err(GraphError::CapacityExceeded { capacity: self.capacity });
            }
            let id = NodeId::new(index as u32);
            state.nodes.push(CubeNode::new(id, surface));
            tracing::info!("registered {} ({}/{})", id, index + 1, self.capacity);
            Ok(id)
        })
    }

    /// Makes `other` the neighbor of `node` on `side`, keeping both ends in sync.
    ///
    /// Passing `None` clears the side. Setting the current neighbor again is
    /// a no-op. Any link displaced on either end is detached first and
    /// reported as removed; then exactly one add is queued.
    ///
    /// # Errors
    ///
    /// - [`GraphError::InvalidSide`] for `Side::NoSide`
    /// - [`GraphError::UnknownNode`] for handles this graph never issued
    /// - [`GraphError::SelfNeighbor`] when `other == Some(node)`
    ///
    /// On error the graph is unchanged.
    pub fn set_neighbor(&self, node: NodeId, side: Side, other: Option<NodeId>) -> GraphResult<()> {
        self.write(|state| state.set_neighbor(node, side, other))
    }

    /// Clears `side` of `node`.
    ///
    /// # Errors
    ///
    /// See [`NeighborGraph::set_neighbor`].
    pub fn clear_neighbor(&self, node: NodeId, side: Side) -> GraphResult<()> {
        self.set_neighbor(node, side, None)
    }

    /// Queues a touch notification for `node`.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownNode`] for handles this graph never issued.
    pub fn touch(&self, node: NodeId) -> GraphResult<()> {
        self.write(|state| {
            state.check(node)?;
            let frame = state.frame;
            state.queue.push(PendingEvent::Touched { node }, frame);
            Ok(())
        })
    }

    /// Live neighbor of `node` on `side`.
    ///
    /// # Errors
    ///
    /// [`GraphError::InvalidSide`] or [`GraphError::UnknownNode`].
    pub fn neighbor(&self, node: NodeId, side: Side) -> GraphResult<Option<NodeId>> {
        self.read(|state| state.nodes[state.check(node)?].neighbor(side))
    }

    /// Neighbor of `node` on `side` as of the last completed tick.
    ///
    /// # Errors
    ///
    /// [`GraphError::InvalidSide`] or [`GraphError::UnknownNode`].
    pub fn latched_neighbor(&self, node: NodeId, side: Side) -> GraphResult<Option<NodeId>> {
        self.read(|state| state.nodes[state.check(node)?].latched_neighbor(side))
    }

    /// Runs `f` against a copy of one node taken under the lock.
    ///
    /// The lock is released before `f` runs, so `f` may call back into the
    /// graph.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownNode`] for handles this graph never issued.
    pub fn with_node<R>(&self, node: NodeId, f: impl FnOnce(&CubeNode) -> R) -> GraphResult<R> {
        let copy = self.read(|state| state.check(node).map(|index| state.nodes[index].clone()))?;
        Ok(f(&copy))
    }

    /// Copy of the pending events, oldest first.
    #[must_use]
    pub fn pending_events(&self) -> Vec<PendingEvent> {
        self.read(|state| state.queue.iter().copied().collect())
    }

    /// Checks that every link is mirrored by its back-link.
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        self.read(|state| {
            state.nodes.iter().all(|node| {
                Side::ALL.iter().zip(node.neighbors()).all(|(side, slot)| match slot {
                    None => true,
                    Some(other) => state
                        .nodes
                        .get(other.index())
                        .and_then(|other| other.neighbor(side.opposite()).ok())
                        == Some(Some(node.id())),
                })
            })
        })
    }

    // =========================================================================
    // Engine-facing queries and requests, keyed by byte-sized cube id
    // =========================================================================

    /// Who is `cube`'s neighbor on `side` as of the last completed tick.
    ///
    /// Returns `CubeId::INVALID` when there is none, and also when `cube` is
    /// within capacity but not registered yet.
    ///
    /// # Errors
    ///
    /// [`GraphError::InvalidSide`], or [`GraphError::CubeIdOutOfRange`]
    /// when `cube` is at or above the declared capacity.
    pub fn neighborhood_cube_at(&self, cube: CubeId, side: Side) -> GraphResult<CubeId> {
        side.slot()?;
        let Some(node) = self.resolve(cube)? else {
            return Ok(CubeId::INVALID);
        };
        Ok(self
            .latched_neighbor(node, side)?
            .map_or(CubeId::INVALID, NodeId::cube_id))
    }

    /// Stores a palette entry of `cube` and tells its surface.
    ///
    /// Unregistered ids within capacity are ignored.
    ///
    /// # Errors
    ///
    /// [`GraphError::CubeIdOutOfRange`] or
    /// [`GraphError::PaletteIndexOutOfRange`].
    pub fn set_palette_color(&self, cube: CubeId, index: usize, color: Rgb) -> GraphResult<()> {
        match self.resolve(cube)? {
            Some(node) => self.set_node_palette_color(node, index, color),
            None => Ok(()),
        }
    }

    /// Stores a palette entry of `node` and tells its surface.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownNode`] or [`GraphError::PaletteIndexOutOfRange`].
    pub fn set_node_palette_color(&self, node: NodeId, index: usize, color: Rgb) -> GraphResult<()> {
        let surface = self.write(|state| {
            let slot = state.check(node)?;
            let cube = &mut state.nodes[slot];
            cube.set_palette_color(index, color)?;
            Ok(Arc::clone(cube.surface()))
        })?;
        surface.palette_changed(index, color);
        Ok(())
    }

    /// Forwards a screen clear to `cube`'s surface.
    ///
    /// # Errors
    ///
    /// [`GraphError::CubeIdOutOfRange`].
    pub fn clear_screen(&self, cube: CubeId, color_index: u32) -> GraphResult<()> {
        if let Some(surface) = self.surface_of(cube)? {
            surface.clear(color_index);
        }
        Ok(())
    }

    /// Forwards a pixel write to `cube`'s surface.
    ///
    /// # Errors
    ///
    /// [`GraphError::CubeIdOutOfRange`].
    pub fn draw_point(&self, cube: CubeId, x: u32, y: u32, color_index: u32) -> GraphResult<()> {
        if let Some(surface) = self.surface_of(cube)? {
            surface.plot(x, y, color_index);
        }
        Ok(())
    }

    /// Maps an engine id to a handle: error above capacity, `None` when
    /// not registered yet.
    fn resolve(&self, cube: CubeId) -> GraphResult<Option<NodeId>> {
        let index = usize::from(cube.0);
        if index >= self.capacity {
            return Err(GraphError::CubeIdOutOfRange {
                id: cube.0,
                capacity: self.capacity,
            });
        }
        Ok(self.read(|state| (index < state.nodes.len()).then(|| NodeId::new(u32::from(cube.0)))))
    }

    /// Clones the surface out so it can be used with the lock released.
    fn surface_of(&self, cube: CubeId) -> GraphResult<Option<Arc<dyn Surface>>> {
        let Some(node) = self.resolve(cube)? else {
            return Ok(None);
        };
        self.with_node(node, |node| Arc::clone(node.surface())).map(Some)
    }

    #[inline]
    fn read<R>(&self, f: impl FnOnce(&GraphState) -> R) -> R {
        let guard = self.state.lock();
        let state = guard.borrow();
        f(&state)
    }

    #[inline]
    fn write<R>(&self, f: impl FnOnce(&mut GraphState) -> R) -> R {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        f(&mut state)
    }
}

impl std::fmt::Debug for NeighborGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NeighborGraph")
            .field("capacity", &self.capacity)
            .field("config", &self.config)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
