//! # Pixel Surface
//!
//! In-memory screen of one cube: `SCREEN_SIZE` x `SCREEN_SIZE` palette
//! indices plus the palette itself. Stands in for the window a desktop
//! build would paint.

use cubesim_core::Surface;
use cubesim_shared::{Rgb, PALETTE_SIZE, SCREEN_SIZE};
use parking_lot::Mutex;

const PIXELS: usize = (SCREEN_SIZE * SCREEN_SIZE) as usize;

#[derive(Debug)]
struct Screen {
    pixels: Vec<u8>,
    palette: [Rgb; PALETTE_SIZE],
    clears: u64,
    plots: u64,
}

/// Screen owned by the UI thread, written by engine requests.
#[derive(Debug)]
pub struct PixelSurface {
    screen: Mutex<Screen>,
}

impl PixelSurface {
    /// Creates a black screen.
    #[must_use]
    pub fn new() -> Self {
        Self {
            screen: Mutex::new(Screen {
                pixels: vec![0; PIXELS],
                palette: [Rgb::BLACK; PALETTE_SIZE],
                clears: 0,
                plots: 0,
            }),
        }
    }

    /// Palette index at `(x, y)`, `None` off screen.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<u8> {
        offset(x, y).map(|i| self.screen.lock().pixels[i])
    }

    /// Color at `(x, y)` after palette lookup.
    #[must_use]
    pub fn color_at(&self, x: u32, y: u32) -> Option<Rgb> {
        let screen = self.screen.lock();
        offset(x, y).map(|i| screen.palette[usize::from(screen.pixels[i])])
    }

    /// Palette entry `index`, if in range.
    #[must_use]
    pub fn palette_entry(&self, index: usize) -> Option<Rgb> {
        self.screen.lock().palette.get(index).copied()
    }

    /// `(clears, plots)` applied so far.
    #[must_use]
    pub fn counters(&self) -> (u64, u64) {
        let screen = self.screen.lock();
        (screen.clears, screen.plots)
    }
}

impl Default for PixelSurface {
    fn default() -> Self {
        Self::new()
    }
}

fn offset(x: u32, y: u32) -> Option<usize> {
    (x < SCREEN_SIZE && y < SCREEN_SIZE).then(|| (y * SCREEN_SIZE + x) as usize)
}

fn palette_index(color_index: u32) -> Option<u8> {
    u8::try_from(color_index)
        .ok()
        .filter(|&i| usize::from(i) < PALETTE_SIZE)
}

impl Surface for PixelSurface {
    fn clear(&self, color_index: u32) {
        let Some(index) = palette_index(color_index) else {
            tracing::debug!(color_index, "clear with out-of-range color ignored");
            return;
        };
        let mut screen = self.screen.lock();
        screen.pixels.fill(index);
        screen.clears += 1;
    }

    fn plot(&self, x: u32, y: u32, color_index: u32) {
        let (Some(i), Some(index)) = (offset(x, y), palette_index(color_index)) else {
            return;
        };
        let mut screen = self.screen.lock();
        screen.pixels[i] = index;
        screen.plots += 1;
    }

    fn palette_changed(&self, index: usize, color: Rgb) {
        if let Some(entry) = self.screen.lock().palette.get_mut(index) {
            *entry = color;
        }
    }
}
