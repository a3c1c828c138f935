//! # Graph Error Types
//!
//! All errors the neighbor graph can report. Every one of them is a
//! programming or capacity error surfaced at the call site; none is retryable.

use thiserror::Error;

/// Errors that can occur while mutating or querying the neighbor graph.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphError {
    /// The sentinel "no side" value was passed where a real side is required.
    #[error("side must be one of top, left, bottom or right")]
    InvalidSide,

    /// A node handle that was never issued by this graph.
    #[error("unknown node handle: {0}")]
    UnknownNode(usize),

    /// A cube id at or above the engine-declared capacity.
    #[error("cube id {id} is outside the declared capacity of {capacity}")]
    CubeIdOutOfRange {
        /// The offending id.
        id: u8,
        /// Capacity declared at startup.
        capacity: usize,
    },

    /// A node was asked to neighbor itself.
    #[error("node {0} cannot be its own neighbor")]
    SelfNeighbor(usize),

    /// Registering one more node would exceed the declared capacity.
    #[error("can't add any more cubes: capacity {capacity} reached")]
    CapacityExceeded {
        /// Capacity declared at startup.
        capacity: usize,
    },

    /// The engine declared more cubes than a byte-sized id can name.
    #[error("capacity {requested} exceeds the id space of {max} cubes")]
    CapacityTooLarge {
        /// Capacity the engine asked for.
        requested: usize,
        /// Largest capacity the wire format supports.
        max: usize,
    },

    /// A palette index outside `0..PALETTE_SIZE`.
    #[error("palette index {index} is out of range")]
    PaletteIndexOutOfRange {
        /// The offending index.
        index: usize,
    },
}

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;
