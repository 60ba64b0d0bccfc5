//! Video timing constants for a 640x480-class VGA mode on a 16 MHz part.
//! Timer1 runs without a prescaler, so one tick is one CPU cycle: a 507 tick
//! line lasts 31.69us (31.56 kHz) and a 524 line field refreshes at 60.2 Hz.

use super::phase::{Phase, PhaseLengths};

pub const H_SYNC_TICKS: u16 = 61;
pub const H_BACK_PORCH_TICKS: u16 = 30;
pub const H_ACTIVE_TICKS: u16 = 406;
pub const H_FRONT_PORCH_TICKS: u16 = 10;
pub const H_FULL_LINE_NB_TICKS: u16 =
    H_SYNC_TICKS + H_BACK_PORCH_TICKS + H_ACTIVE_TICKS + H_FRONT_PORCH_TICKS;

pub const V_SYNC_LINES: u16 = 2;
pub const V_BACK_PORCH_LINES: u16 = 31;
pub const V_ACTIVE_LINES: u16 = 480;
pub const V_FRONT_PORCH_LINES: u16 = 11;
pub const V_FULL_FIELD_NB_LINES: u16 =
    V_SYNC_LINES + V_BACK_PORCH_LINES + V_ACTIVE_LINES + V_FRONT_PORCH_LINES;

/// Number of equal-width colour bands drawn across the active window.
pub const BAND_COUNT: usize = 8;

pub const CPU_FREQ_HZ: u32 = 16_000_000;

pub const VGA_640X480: Timing = Timing {
    h_sync: H_SYNC_TICKS,
    h_bp: H_BACK_PORCH_TICKS,
    h_active: H_ACTIVE_TICKS,
    h_fp: H_FRONT_PORCH_TICKS, // Htot = 507
    v_sync: V_SYNC_LINES,
    v_bp: V_BACK_PORCH_LINES,
    v_active: V_ACTIVE_LINES,
    v_fp: V_FRONT_PORCH_LINES, // Vtot = 524
};

const _: () = assert!(VGA_640X480.htot() == 507);
const _: () = assert!(VGA_640X480.vtot() == 524);
// The horizontal phases are addressed with the 8-bit counter low byte, one
// wait at a time, so no single gap may reach a full byte.
const _: () = assert!(H_ACTIVE_TICKS / BAND_COUNT as u16 + H_ACTIVE_TICKS % BAND_COUNT as u16 <= 255);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    pub h_sync: u16,
    pub h_bp: u16,
    pub h_active: u16,
    pub h_fp: u16, // h_sync + h_bp + h_active + h_fp = Htot, in ticks

    pub v_sync: u16,
    pub v_bp: u16,
    pub v_active: u16,
    pub v_fp: u16, // v_sync + v_bp + v_active + v_fp = Vtot, in lines
}

impl Timing {
    pub const fn htot(&self) -> u16 {
        self.h_sync + self.h_bp + self.h_active + self.h_fp
    }

    pub const fn vtot(&self) -> u16 {
        self.v_sync + self.v_bp + self.v_active + self.v_fp
    }

    pub const fn ticks_per_field(&self) -> u32 {
        self.htot() as u32 * self.vtot() as u32
    }

    /// Tick lengths measured by the hardware timer.
    pub const fn horizontal(&self) -> PhaseLengths {
        PhaseLengths::new(self.h_sync, self.h_bp, self.h_active, self.h_fp)
    }

    /// Line counts derived by counting frame clock events.
    pub const fn vertical(&self) -> PhaseLengths {
        PhaseLengths::new(self.v_sync, self.v_bp, self.v_active, self.v_fp)
    }

    /// First tick of active video, which is also where the software-driven
    /// sync line changes level.
    pub const fn active_start(&self) -> u16 {
        self.h_sync + self.h_bp
    }

    pub const fn active_end(&self) -> u16 {
        self.active_start() + self.h_active
    }

    /// Horizontal phase containing `tick`, with the offset into that phase.
    pub fn horizontal_phase(&self, tick: u16) -> (Phase, u16) {
        let lengths = self.horizontal();
        let tick = tick % self.htot();
        let mut phase = Phase::SyncPulse;
        loop {
            let start = lengths.start_of(phase);
            if tick < start + lengths.get(phase) {
                return (phase, tick - start);
            }
            phase = phase.next();
        }
    }

    pub fn line_frequency_hz(&self) -> f64 {
        CPU_FREQ_HZ as f64 / self.htot() as f64
    }

    pub fn field_frequency_hz(&self) -> f64 {
        CPU_FREQ_HZ as f64 / self.ticks_per_field() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_507_ticks_per_line() {
        assert_eq!(VGA_640X480.htot(), H_FULL_LINE_NB_TICKS);
        assert_eq!(VGA_640X480.horizontal().total(), 507);
    }

    #[test]
    fn test_line_count() {
        assert_eq!(VGA_640X480.vtot(), V_FULL_FIELD_NB_LINES);
        assert_eq!(VGA_640X480.vertical().total(), 524);
        assert_eq!(VGA_640X480.ticks_per_field(), 507 * 524);
    }

    #[test]
    fn test_active_window() {
        assert_eq!(VGA_640X480.active_start(), 91);
        assert_eq!(VGA_640X480.active_end(), 497);
    }

    #[test]
    fn test_vga_frequencies() {
        let line = VGA_640X480.line_frequency_hz();
        let field = VGA_640X480.field_frequency_hz();
        assert!((31_000.0..32_000.0).contains(&line), "{line}");
        assert!((59.5..60.5).contains(&field), "{field}");
    }

    #[test]
    fn test_horizontal_phase() {
        assert_eq!(VGA_640X480.horizontal_phase(0), (Phase::SyncPulse, 0));
        assert_eq!(VGA_640X480.horizontal_phase(60), (Phase::SyncPulse, 60));
        assert_eq!(VGA_640X480.horizontal_phase(61), (Phase::BackPorch, 0));
        assert_eq!(VGA_640X480.horizontal_phase(91), (Phase::ActiveVideo, 0));
        assert_eq!(VGA_640X480.horizontal_phase(496), (Phase::ActiveVideo, 405));
        assert_eq!(VGA_640X480.horizontal_phase(497), (Phase::FrontPorch, 0));
        assert_eq!(VGA_640X480.horizontal_phase(506), (Phase::FrontPorch, 9));
        assert_eq!(VGA_640X480.horizontal_phase(507), (Phase::SyncPulse, 0));
    }
}
