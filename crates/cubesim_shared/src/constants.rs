//! # Engine Boundary Constants
//!
//! Values baked into both this crate and the engine build.
//!
//! **CRITICAL:** Changing any of these requires rebuilding the engine.

// =============================================================================
// CUBE IDS
// =============================================================================

/// Highest number of cubes that can ever be registered.
///
/// Ids are a single byte and `0xFF` is reserved for "no such cube",
/// which leaves 255 usable ids.
pub const MAX_CUBES: usize = 255;

/// Capacity declared by the stand-in engine when nothing else is configured.
pub const DEFAULT_CAPACITY: usize = 3;

// =============================================================================
// DISPLAY
// =============================================================================

/// Number of entries in each cube's palette.
pub const PALETTE_SIZE: usize = 16;

/// Width and height of a cube's screen in pixels.
pub const SCREEN_SIZE: u32 = 128;

// =============================================================================
// TIMING
// =============================================================================

/// Frame ticks per second requested by the engine.
pub const TICK_RATE: u32 = 60;
