//! # Cube Nodes
//!
//! A node is one simulated cube: four neighbor slots, the four slots as
//! latched at the last frame tick, a palette, and a stale flag.
//!
//! Nodes live in the graph's arena and refer to each other by [`NodeId`]
//! handles, never by reference. Only the graph writes neighbor slots, which
//! is what keeps links symmetric.

use std::fmt;
use std::sync::Arc;

use cubesim_shared::{CubeId, Rgb, PALETTE_SIZE};

use crate::engine::Surface;
use crate::error::{GraphError, GraphResult};
use crate::side::{Side, NUM_SIDES};

/// Stable handle to a node: its position in the registry.
///
/// Nodes are never destroyed, so a handle stays valid for the life of the
/// graph that issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates a handle from a registry index.
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the registry index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Resolves to the engine-visible id.
    #[inline]
    #[must_use]
    pub const fn cube_id(self) -> CubeId {
        CubeId::from_index(self.index())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cube#{}", self.0)
    }
}

/// Neighbor slots, one per side in [`Side::ALL`] order.
pub type Slots = [Option<NodeId>; NUM_SIDES];

/// One cube in the graph.
#[derive(Clone)]
pub struct CubeNode {
    id: NodeId,
    /// Live links, written only by `NeighborGraph::set_neighbor`.
    neighbors: Slots,
    /// Links as of the last tick.
    latched: Slots,
    palette: [Rgb; PALETTE_SIZE],
    /// Set when a tick saw the live links differ from the latched ones.
    stale: bool,
    surface: Arc<dyn Surface>,
}

impl CubeNode {
    pub(crate) fn new(id: NodeId, surface: Arc<dyn Surface>) -> Self {
        Self {
            id,
            neighbors: [None; NUM_SIDES],
            latched: [None; NUM_SIDES],
            palette: [Rgb::BLACK; PALETTE_SIZE],
            stale: false,
            surface,
        }
    }

    /// This node's handle.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Live neighbor on `side`.
    ///
    /// # Errors
    ///
    /// [`GraphError::InvalidSide`] for `Side::NoSide`.
    #[inline]
    pub fn neighbor(&self, side: Side) -> GraphResult<Option<NodeId>> {
        Ok(self.neighbors[side.slot()?])
    }

    /// Neighbor on `side` as of the last completed tick.
    ///
    /// # Errors
    ///
    /// [`GraphError::InvalidSide`] for `Side::NoSide`.
    #[inline]
    pub fn latched_neighbor(&self, side: Side) -> GraphResult<Option<NodeId>> {
        Ok(self.latched[side.slot()?])
    }

    /// All live slots.
    #[inline]
    #[must_use]
    pub const fn neighbors(&self) -> &Slots {
        &self.neighbors
    }

    /// Whether a latch flagged this node and the tick has not cleared it yet.
    ///
    /// Latching and clearing happen in the same locked phase, so from outside
    /// a tick this reads `false`; it is `true` only inside that phase.
    #[inline]
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        self.stale
    }

    /// Stores a palette entry.
    ///
    /// # Errors
    ///
    /// [`GraphError::PaletteIndexOutOfRange`] when `index >= PALETTE_SIZE`.
    pub fn set_palette_color(&mut self, index: usize, color: Rgb) -> GraphResult<()> {
        let slot = self
            .palette
            .get_mut(index)
            .ok_or(GraphError::PaletteIndexOutOfRange { index })?;
        *slot = color;
        Ok(())
    }

    /// Reads a palette entry.
    ///
    /// # Errors
    ///
    /// [`GraphError::PaletteIndexOutOfRange`] when `index >= PALETTE_SIZE`.
    pub fn palette_color(&self, index: usize) -> GraphResult<Rgb> {
        self.palette
            .get(index)
            .copied()
            .ok_or(GraphError::PaletteIndexOutOfRange { index })
    }

    /// The rendering surface attached at registration.
    #[inline]
    #[must_use]
    pub fn surface(&self) -> &Arc<dyn Surface> {
        &self.surface
    }

    #[inline]
    pub(crate) fn set_slot(&mut self, slot: usize, other: Option<NodeId>) {
        self.neighbors[slot] = other;
    }

    /// Copies live slots into the latched ones.
    ///
    /// Returns true (and marks the node stale) if anything changed.
    pub(crate) fn latch(&mut self) -> bool {
        if self.neighbors == self.latched {
            return false;
        }
        self.latched = self.neighbors;
        self.stale = true;
        true
    }

    /// Clears the stale flag, returning its previous value.
    #[inline]
    pub(crate) fn take_stale(&mut self) -> bool {
        std::mem::take(&mut self.stale)
    }
}

impl fmt::Debug for CubeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CubeNode")
            .field("id", &self.id)
            .field("neighbors", &self.neighbors)
            .field("latched", &self.latched)
            .field("stale", &self.stale)
            .finish_non_exhaustive()
    }
}
