//! # Cube Sides
//!
//! The four edges of a cube, plus the "no side" sentinel the engine uses.

use cubesim_shared::WireSide;
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, GraphResult};

/// One edge of a cube.
///
/// `NoSide` exists only so engine values can be represented faithfully;
/// every graph operation rejects it with [`GraphError::InvalidSide`].
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Top edge.
    Top = 0,
    /// Left edge.
    Left = 1,
    /// Bottom edge.
    Bottom = 2,
    /// Right edge.
    Right = 3,
    /// Sentinel, never a valid argument.
    NoSide = 0xFF,
}

/// Number of real sides.
pub const NUM_SIDES: usize = 4;

impl Side {
    /// The four real sides, in slot order.
    pub const ALL: [Self; NUM_SIDES] = [Self::Top, Self::Left, Self::Bottom, Self::Right];

    /// Checks that this is one of the four real sides.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        !matches!(self, Self::NoSide)
    }

    /// Returns the facing side. `NoSide` has no opposite and maps to itself.
    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::NoSide => Self::NoSide,
        }
    }

    /// Slot index of a real side.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidSide`] for `NoSide`.
    #[inline]
    pub const fn slot(self) -> GraphResult<usize> {
        match self {
            Self::NoSide => Err(GraphError::InvalidSide),
            side => Ok(side as usize),
        }
    }

    /// Encodes for the engine.
    #[inline]
    #[must_use]
    pub const fn to_wire(self) -> WireSide {
        match self {
            Self::Top => WireSide::Top,
            Self::Left => WireSide::Left,
            Self::Bottom => WireSide::Bottom,
            Self::Right => WireSide::Right,
            Self::NoSide => WireSide::NoSide,
        }
    }

    /// Decodes an engine value.
    #[inline]
    #[must_use]
    pub const fn from_wire(side: WireSide) -> Self {
        match side {
            WireSide::Top => Self::Top,
            WireSide::Left => Self::Left,
            WireSide::Bottom => Self::Bottom,
            WireSide::Right => Self::Right,
            WireSide::NoSide => Self::NoSide,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_is_an_involution() {
        for side in Side::ALL {
            assert_ne!(side.opposite(), side);
            assert_eq!(side.opposite().opposite(), side);
        }
        assert_eq!(Side::NoSide.opposite(), Side::NoSide);
    }

    #[test]
    fn test_slots_match_all_order() {
        for (i, side) in Side::ALL.iter().enumerate() {
            assert_eq!(side.slot(), Ok(i));
        }
        assert_eq!(Side::NoSide.slot(), Err(GraphError::InvalidSide));
        assert!(!Side::NoSide.is_valid());
    }

    #[test]
    fn test_wire_encoding() {
        for side in Side::ALL {
            assert_eq!(Side::from_wire(side.to_wire()), side);
        }
        assert_eq!(Side::Right.to_wire() as u8, 3);
        assert_eq!(Side::from_wire(WireSide::from_u8(9)), Side::NoSide);
    }
}
