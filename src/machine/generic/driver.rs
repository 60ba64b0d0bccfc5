//! Per-line work of the frame clock interrupt.

use super::hal::VideoHardware;
use super::pattern::{BandSchedule, Color};
use super::phase::{Phase, PhaseCounter};
use super::timing::{BAND_COUNT, Timing};

/// Vertical phase state plus the precomputed per-line schedule. Only the frame
/// clock handler touches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalDriver {
    counter: PhaseCounter,
    bands: BandSchedule,
    sync_edge: u16,
}

impl SignalDriver {
    pub const fn new(timing: &Timing, palette: &[Color; BAND_COUNT]) -> Self {
        Self {
            counter: PhaseCounter::new(timing.vertical()),
            bands: BandSchedule::new(timing, palette),
            sync_edge: timing.active_start(),
        }
    }

    #[inline(always)]
    pub fn phase(&self) -> Phase {
        self.counter.phase()
    }

    pub fn counter(&self) -> &PhaseCounter {
        &self.counter
    }

    pub fn bands(&self) -> &BandSchedule {
        &self.bands
    }

    /// Tick at which the software sync line changes level.
    pub fn sync_edge(&self) -> u16 {
        self.sync_edge
    }

    /// Whether the line about to be handled toggles the sync line. The sync
    /// pulse starts on the last front porch line and ends on the last sync
    /// line, so it is exactly as long as the sync phase.
    #[inline(always)]
    pub fn toggles_sync(&self) -> bool {
        matches!(self.counter.phase(), Phase::SyncPulse | Phase::FrontPorch)
            && self.counter.is_last_line()
    }

    /// Handle one frame clock event. Must finish within one line period.
    #[inline(always)]
    pub fn on_frame_clock<H: VideoHardware>(&mut self, hw: &mut H) {
        match self.counter.phase() {
            Phase::ActiveVideo => {
                for band in self.bands.bands() {
                    hw.wait_until_tick(band.start);
                    hw.set_color(band.color);
                }
                hw.wait_until_tick(self.bands.end());
                hw.set_color(Color::BLACK);
            }
            Phase::SyncPulse | Phase::FrontPorch => {
                if self.counter.is_last_line() {
                    hw.wait_until_tick(self.sync_edge);
                    hw.toggle_vsync();
                }
            }
            Phase::BackPorch => {}
        }
        self.counter.advance();
    }
}
