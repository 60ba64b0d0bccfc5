//! Timer1 with the clock running at CPU speed. Counter values are computed
//! from the cycle they are observed on instead of being stepped.

use tracing::{trace, warn};

use crate::machine::atmega328p::registers::*;

/// The 16-bit counter wraps from MAX to BOTTOM.
const COUNTER_WRAP: u64 = 0x1_0000;

#[derive(Debug, Clone, Default)]
pub struct Timer1 {
    pub tccr1a: u8,
    pub tccr1b: u8,
    pub tccr1c: u8,
    pub icr1: u16,
    pub ocr1a: u16,
    pub ocr1b: u16,
    pub timsk1: u8,
    /// Shared high byte latch of the 16-bit registers.
    temp: u8,
    base_count: u16,
    base_cycle: u64,
    /// Capture events on or before this cycle are acknowledged.
    capture_cleared: u64,
}

impl Timer1 {
    pub fn mode(&self) -> u8 {
        waveform_mode(self.tccr1a, self.tccr1b)
    }

    pub fn running(&self) -> bool {
        self.tccr1b & Tccr1b::CLOCK_SELECT.bits() != 0
    }

    pub fn top(&self) -> u16 {
        match self.mode() {
            WGM_FAST_PWM_ICR1 => self.icr1,
            15 => self.ocr1a,
            _ => 0xffff,
        }
    }

    pub fn period(&self) -> u64 {
        self.top() as u64 + 1
    }

    pub fn count_at(&self, cycle: u64) -> u16 {
        if !self.running() || cycle <= self.base_cycle {
            return self.base_count;
        }
        let elapsed = cycle - self.base_cycle;
        let base = self.base_count as u64;
        if self.base_count > self.top() {
            // Above TOP the counter misses the compare and runs on to MAX.
            let to_bottom = COUNTER_WRAP - base;
            if elapsed < to_bottom {
                return (base + elapsed) as u16;
            }
            return ((elapsed - to_bottom) % self.period()) as u16;
        }
        ((base + elapsed) % self.period()) as u16
    }

    /// First cycle at or after `cycle` on which the counter sits at TOP.
    pub fn top_from(&self, cycle: u64) -> Option<u64> {
        if !self.running() {
            return None;
        }
        let cycle = cycle.max(self.base_cycle);
        let count = self.count_at(cycle) as u64;
        let top = self.top() as u64;
        let ahead = if count > top {
            COUNTER_WRAP - count + top
        } else {
            top - count
        };
        Some(cycle + ahead)
    }

    /// Number of TOP cycles in `from..=to`.
    pub fn tops_between(&self, from: u64, to: u64) -> u64 {
        match self.top_from(from) {
            Some(first) if first <= to => 1 + (to - first) / self.period(),
            _ => 0,
        }
    }

    /// Cycle on which the next unacknowledged capture flag is raised.
    pub fn next_capture(&self) -> Option<u64> {
        self.top_from(self.capture_cleared + 1)
    }

    /// Hardware clears `ICF1` when its vector executes.
    pub fn acknowledge_capture(&mut self, cycle: u64) {
        self.capture_cleared = cycle;
    }

    pub fn capture_enabled(&self) -> bool {
        self.timsk1 & Timsk1::ICIE1.bits() != 0
    }

    /// Level of the OC1A waveform output for a counter value. Only the
    /// inverting fast PWM setting is modelled: cleared at BOTTOM, set on
    /// compare match.
    pub fn oc1a_high(&self, count: u16) -> bool {
        let com1a = Tccr1a::from_bits_truncate(self.tccr1a);
        if !com1a.contains(Tccr1a::COM1A1 | Tccr1a::COM1A0) {
            return false;
        }
        count >= self.ocr1a
    }

    /// Ticks per period during which OC1A is low.
    pub fn oc1a_low_ticks(&self) -> u16 {
        (0..=self.top()).filter(|&count| !self.oc1a_high(count)).count() as u16
    }

    fn rebase(&mut self, cycle: u64, count: u16) {
        self.base_count = count;
        self.base_cycle = cycle;
    }

    pub fn read(&mut self, addr: u16, cycle: u64) -> u8 {
        match addr {
            TCCR1A => self.tccr1a,
            TCCR1B => self.tccr1b,
            TCCR1C => self.tccr1c,
            TCNT1L => {
                let count = self.count_at(cycle);
                self.temp = (count >> 8) as u8;
                count as u8
            }
            ICR1L => {
                self.temp = (self.icr1 >> 8) as u8;
                self.icr1 as u8
            }
            TCNT1H | ICR1H | OCR1AH | OCR1BH => self.temp,
            OCR1AL => self.ocr1a as u8,
            OCR1BL => self.ocr1b as u8,
            TIMSK1 => self.timsk1,
            TIFR1 => {
                if self.next_capture().is_some_and(|flag| flag < cycle) {
                    Timsk1::ICIE1.bits()
                } else {
                    0
                }
            }
            _ => 0,
        }
    }

    pub fn write(&mut self, addr: u16, value: u8, cycle: u64) {
        let wide = |temp: u8| u16::from_le_bytes([value, temp]);
        match addr {
            TCCR1A => {
                let count = self.count_at(cycle);
                self.tccr1a = value;
                self.rebase(cycle, count);
            }
            TCCR1B => {
                let count = self.count_at(cycle);
                let was_running = self.running();
                self.tccr1b = value;
                self.rebase(cycle, count);
                if self.running() && !was_running {
                    trace!(cycle, mode = self.mode(), top = self.top(), "Timer1 started");
                    if self.mode() != WGM_FAST_PWM_ICR1 {
                        warn!("Timer1 mode {} is not modelled", self.mode());
                    }
                }
            }
            TCCR1C => self.tccr1c = value,
            TCNT1H | ICR1H | OCR1AH | OCR1BH => self.temp = value,
            TCNT1L => self.rebase(cycle, wide(self.temp)),
            ICR1L => self.icr1 = wide(self.temp),
            OCR1AL => self.ocr1a = wide(self.temp),
            OCR1BL => self.ocr1b = wide(self.temp),
            TIMSK1 => self.timsk1 = value,
            TIFR1 => {
                // Writing a one clears the flag.
                if value & Timsk1::ICIE1.bits() != 0 {
                    self.capture_cleared = cycle;
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode14(top: u16, ocr: u16) -> Timer1 {
        let mut timer = Timer1::default();
        timer.write(TCCR1A, (Tccr1a::COM1A1 | Tccr1a::COM1A0 | Tccr1a::WGM11).bits(), 0);
        timer.write(ICR1H, (top >> 8) as u8, 0);
        timer.write(ICR1L, top as u8, 0);
        timer.write(OCR1AH, (ocr >> 8) as u8, 0);
        timer.write(OCR1AL, ocr as u8, 0);
        timer.write(
            TCCR1B,
            (Tccr1b::WGM13 | Tccr1b::WGM12 | Tccr1b::CS10).bits(),
            100,
        );
        timer
    }

    #[test]
    fn test_counter_wraps_at_top() {
        let timer = mode14(506, 61);
        assert_eq!(timer.mode(), WGM_FAST_PWM_ICR1);
        assert_eq!(timer.period(), 507);
        assert_eq!(timer.count_at(100), 0);
        assert_eq!(timer.count_at(101), 1);
        assert_eq!(timer.count_at(100 + 506), 506);
        assert_eq!(timer.count_at(100 + 507), 0);
    }

    #[test]
    fn test_counter_loaded_above_top_runs_to_max() {
        let mut timer = Timer1::default();
        timer.write(TCCR1A, (Tccr1a::COM1A1 | Tccr1a::COM1A0 | Tccr1a::WGM11).bits(), 0);
        timer.write(ICR1H, (506_u16 >> 8) as u8, 0);
        timer.write(ICR1L, 506_u16 as u8, 0);
        timer.write(TCNT1H, (600_u16 >> 8) as u8, 0);
        timer.write(TCNT1L, 600_u16 as u8, 0);
        timer.write(
            TCCR1B,
            (Tccr1b::WGM13 | Tccr1b::WGM12 | Tccr1b::CS10).bits(),
            100,
        );

        let bottom = 100 + 0x1_0000 - 600;
        assert_eq!(timer.count_at(100), 600);
        assert_eq!(timer.count_at(bottom - 1), 0xffff);
        assert_eq!(timer.count_at(bottom), 0);
        assert_eq!(timer.count_at(bottom + 507), 0);
        assert_eq!(timer.top_from(0), Some(bottom + 506));
        assert_eq!(timer.top_from(bottom + 507), Some(bottom + 506 + 507));
        assert_eq!(timer.next_capture(), Some(bottom + 506));
        assert_eq!(timer.tops_between(100, bottom + 506 + 507), 2);
    }

    #[test]
    fn test_stopped_counter_holds() {
        let mut timer = Timer1::default();
        timer.write(TCNT1H, 0x01, 0);
        timer.write(TCNT1L, 0x23, 0);
        assert_eq!(timer.count_at(1000), 0x123);
        assert_eq!(timer.top_from(0), None);
    }

    #[test]
    fn test_wide_read_latches_high_byte() {
        let mut timer = mode14(506, 61);
        let low = timer.read(TCNT1L, 100 + 300);
        // High byte is the one latched by the low read, not the live one.
        let high = timer.read(TCNT1H, 100 + 400);
        assert_eq!(u16::from_le_bytes([low, high]), 300);
    }

    #[test]
    fn test_capture_events() {
        let mut timer = mode14(506, 61);
        assert_eq!(timer.next_capture(), Some(100 + 506));
        timer.acknowledge_capture(100 + 510);
        assert_eq!(timer.next_capture(), Some(100 + 506 + 507));
        assert_eq!(timer.tops_between(0, 100 + 506 + 507 * 3), 4);
        assert_eq!(timer.tops_between(100 + 507, 100 + 1013), 1);
        assert_eq!(timer.tops_between(100 + 507, 100 + 1012), 0);
    }

    #[test]
    fn test_clearing_flag_by_writing_one() {
        let mut timer = mode14(506, 61);
        assert_ne!(timer.read(TIFR1, 100 + 600) & Timsk1::ICIE1.bits(), 0);
        timer.write(TIFR1, 0xff, 100 + 600);
        assert_eq!(timer.read(TIFR1, 100 + 601) & Timsk1::ICIE1.bits(), 0);
    }

    #[test]
    fn test_oc1a_low_for_sync_width() {
        let timer = mode14(506, 61);
        assert!(!timer.oc1a_high(0));
        assert!(!timer.oc1a_high(60));
        assert!(timer.oc1a_high(61));
        assert!(timer.oc1a_high(506));
        assert_eq!(timer.oc1a_low_ticks(), 61);
    }
}
