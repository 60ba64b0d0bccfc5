//! The fixed demonstration pattern: equal-width colour bands across the
//! active window of every visible line.

use super::timing::{BAND_COUNT, Timing};

bitflags::bitflags! {
    /// 3-bit RGB output word. Bit positions match the colour pins, so the
    /// value can be written to the port as-is.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Color: u8 {
        const RED   = 0b0000_0001;
        const GREEN = 0b0000_0010;
        const BLUE  = 0b0000_0100;

        const BLACK   = 0;
        const CYAN    = Self::GREEN.bits() | Self::BLUE.bits();
        const YELLOW  = Self::RED.bits() | Self::GREEN.bits();
        const MAGENTA = Self::RED.bits() | Self::BLUE.bits();
        const WHITE   = Self::RED.bits() | Self::GREEN.bits() | Self::BLUE.bits();
    }
}

pub const PALETTE: [Color; BAND_COUNT] = [
    Color::BLACK,
    Color::RED,
    Color::GREEN,
    Color::BLUE,
    Color::CYAN,
    Color::YELLOW,
    Color::MAGENTA,
    Color::WHITE,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    /// Tick offset from the counter restart at which this colour is driven.
    pub start: u16,
    pub color: Color,
}

/// Band start offsets for one active line, plus the offset where the output
/// is blanked again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandSchedule {
    bands: [Band; BAND_COUNT],
    end: u16,
}

impl BandSchedule {
    /// Bands are `h_active / BAND_COUNT` ticks wide; the last one absorbs the
    /// remainder of the integer division.
    pub const fn new(timing: &Timing, palette: &[Color; BAND_COUNT]) -> Self {
        let start = timing.active_start();
        let width = timing.h_active / BAND_COUNT as u16;
        let mut bands = [Band {
            start,
            color: Color::BLACK,
        }; BAND_COUNT];
        let mut k = 0;
        while k < BAND_COUNT {
            bands[k] = Band {
                start: start + k as u16 * width,
                color: palette[k],
            };
            k += 1;
        }
        Self {
            bands,
            end: timing.active_end(),
        }
    }

    #[inline(always)]
    pub fn bands(&self) -> &[Band; BAND_COUNT] {
        &self.bands
    }

    #[inline(always)]
    pub fn end(&self) -> u16 {
        self.end
    }

    pub fn width(&self, index: usize) -> u16 {
        let next = match self.bands.get(index + 1) {
            Some(band) => band.start,
            None => self.end,
        };
        next - self.bands[index].start
    }

    /// Colour the pattern drives at `tick`, or black outside the window.
    pub fn color_at(&self, tick: u16) -> Color {
        if tick >= self.end {
            return Color::BLACK;
        }
        self.bands
            .iter()
            .rev()
            .find(|band| band.start <= tick)
            .map(|band| band.color)
            .unwrap_or(Color::BLACK)
    }
}
