//! # CUBESIM Shared
//!
//! Wire-level types used on both sides of the engine boundary.
//!
//! ## CRITICAL RULE
//!
//! Every type here has a fixed, byte-level meaning agreed with the native
//! simulation engine:
//! - Cube ids are one byte, with `0xFF` reserved for "no such cube"
//! - Sides are one byte: top, left, bottom, right, with `0xFF` for "no side"
//! - Palette colors are three bytes of RGB
//!
//! If you change a discriminant here, the engine build has to change too.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod protocol;

pub use constants::{DEFAULT_CAPACITY, MAX_CUBES, PALETTE_SIZE, SCREEN_SIZE, TICK_RATE};
pub use protocol::{CubeId, NeighborRecord, Rgb, WireSide};
