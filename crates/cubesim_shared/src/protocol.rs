//! Wire types exchanged with the simulation engine.
//!
//! These types are passed across the callback boundary by value.
//! Both sides must agree on these definitions.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Byte-sized cube identifier as seen by the engine.
///
/// The id is the cube's position in the registry. `CubeId::INVALID`
/// (`0xFF`) means "no such cube".
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable, Serialize, Deserialize)]
pub struct CubeId(pub u8);

impl CubeId {
    /// The reserved "no such cube" id.
    pub const INVALID: Self = Self(0xFF);

    /// Builds an id from a registry index.
    ///
    /// Returns `INVALID` when the index does not fit below the sentinel.
    #[inline]
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        if index < Self::INVALID.0 as usize {
            Self(index as u8)
        } else {
            Self::INVALID
        }
    }

    /// Returns the registry index, or `None` for the sentinel.
    #[inline]
    #[must_use]
    pub const fn index(self) -> Option<usize> {
        if self.is_valid() {
            Some(self.0 as usize)
        } else {
            None
        }
    }

    /// Checks whether this id names a cube.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0
    }
}

impl Default for CubeId {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Side discriminants as the engine numbers them.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireSide {
    /// Top edge.
    Top = 0,
    /// Left edge.
    Left = 1,
    /// Bottom edge.
    Bottom = 2,
    /// Right edge.
    Right = 3,
    /// "No side" sentinel (`-1` as a signed byte).
    NoSide = 0xFF,
}

impl WireSide {
    /// Decodes a raw byte. Anything outside the four sides maps to `NoSide`.
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Top,
            1 => Self::Left,
            2 => Self::Bottom,
            3 => Self::Right,
            _ => Self::NoSide,
        }
    }
}

/// Payload of a neighbor-added or neighbor-removed notification.
///
/// `first` touches `second` with its `first_side`; `second` touches back
/// with `second_side`, which is always the opposite of `first_side`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize)]
pub struct NeighborRecord {
    /// Cube whose side changed.
    pub first: CubeId,
    /// Side of `first` (a `WireSide` discriminant).
    pub first_side: u8,
    /// Cube on the other end of the link.
    pub second: CubeId,
    /// Side of `second` facing `first`.
    pub second_side: u8,
}

impl NeighborRecord {
    /// Returns `first_side` decoded.
    #[inline]
    #[must_use]
    pub const fn first_side(&self) -> WireSide {
        WireSide::from_u8(self.first_side)
    }

    /// Returns `second_side` decoded.
    #[inline]
    #[must_use]
    pub const fn second_side(&self) -> WireSide {
        WireSide::from_u8(self.second_side)
    }
}

/// Palette color, one byte per channel.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize)]
pub struct Rgb {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
}

impl Rgb {
    /// Black, the color of a fresh palette slot.
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// Creates a color from its channels.
    #[inline]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}
