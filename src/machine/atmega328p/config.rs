//! One-time setup of the output pins and of Timer1 as the frame clock.
//!
//! Everything here runs with interrupts disabled and goes through
//! [`RegisterBus`], so the simulator executes the same register writes as the
//! firmware.

use crate::machine::generic::driver::SignalDriver;
use crate::machine::generic::hal::RegisterBus;
use crate::machine::generic::pattern::PALETTE;
use crate::machine::generic::timing::Timing;

use super::registers::*;

/// Colour pins and both sync pins become outputs. Colour starts black and
/// VSYNC idles high (negative polarity).
pub fn configure_outputs<B: RegisterBus>(bus: &mut B) {
    bus.modify(PORTC, |v| v & !COLOR_PINS);
    bus.modify(DDRC, |v| v | COLOR_PINS);
    bus.modify(PORTB, |v| v | VSYNC_PIN);
    bus.modify(DDRB, |v| v | HSYNC_PIN | VSYNC_PIN);
}

/// Program Timer1 to restart every `timing.htot()` ticks, emit HSYNC on OC1A
/// and raise the capture interrupt once per line. Competing timer interrupts
/// are switched off; the counter is started last.
pub fn configure_frame_clock<B: RegisterBus>(bus: &mut B, timing: &Timing) {
    bus.write(TCCR1B, 0);

    bus.write(TIMSK0, 0);
    bus.write(TIMSK2, 0);

    // Inverting OC1A: cleared at BOTTOM, set on compare match, so the pulse
    // is low for the first `h_sync` ticks of the line.
    bus.write(
        TCCR1A,
        (Tccr1a::COM1A1 | Tccr1a::COM1A0 | Tccr1a::WGM11).bits(),
    );
    bus.write(TCCR1C, 0);
    bus.write_wide(ICR1L, timing.htot() - 1);
    bus.write_wide(OCR1AL, timing.h_sync);
    bus.write_wide(TCNT1L, 0);

    bus.write(TIFR0, 0xff);
    bus.write(TIFR1, 0xff);
    bus.write(TIFR2, 0xff);
    bus.write(TIMSK1, Timsk1::ICIE1.bits());

    bus.write(
        TCCR1B,
        (Tccr1b::WGM13 | Tccr1b::WGM12 | Tccr1b::CS10).bits(),
    );
}

/// Everything `initialize` does short of enabling interrupts: outputs first,
/// then the cold-start driver state, then the armed timer.
pub fn initialize<B: RegisterBus>(bus: &mut B, timing: &Timing) -> SignalDriver {
    configure_outputs(bus);
    let driver = SignalDriver::new(timing, &PALETTE);
    configure_frame_clock(bus, timing);
    driver
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::generic::phase::Phase;
    use crate::machine::generic::timing::VGA_640X480;

    /// Flat register file recording the write order.
    struct Bus {
        mem: [u8; 0x100],
        writes: Vec<(u16, u8)>,
    }

    impl RegisterBus for Bus {
        fn read(&mut self, addr: u16) -> u8 {
            self.mem[addr as usize]
        }

        fn write(&mut self, addr: u16, value: u8) {
            self.mem[addr as usize] = value;
            self.writes.push((addr, value));
        }
    }

    fn bus() -> Bus {
        let mut bus = Bus {
            mem: [0; 0x100],
            writes: Vec::new(),
        };
        // Arduino core leaves Timer0 overflow running.
        bus.mem[TIMSK0 as usize] = 0x01;
        bus.mem[PORTC as usize] = 0xff;
        bus
    }

    fn position(bus: &Bus, addr: u16) -> usize {
        bus.writes
            .iter()
            .rposition(|(a, _)| *a == addr)
            .unwrap_or_else(|| panic!("no write to {addr:02X}"))
    }

    #[test]
    fn test_frame_clock_registers() {
        let mut bus = bus();
        configure_frame_clock(&mut bus, &VGA_640X480);
        let wide = |lo: u16| u16::from_le_bytes([bus.mem[lo as usize], bus.mem[lo as usize + 1]]);
        assert_eq!(wide(ICR1L), 506);
        assert_eq!(wide(OCR1AL), 61);
        assert_eq!(wide(TCNT1L), 0);
        assert_eq!(
            waveform_mode(bus.mem[TCCR1A as usize], bus.mem[TCCR1B as usize]),
            WGM_FAST_PWM_ICR1
        );
        assert_eq!(bus.mem[TCCR1B as usize] & Tccr1b::CLOCK_SELECT.bits(), 1);
        assert_eq!(bus.mem[TIMSK1 as usize], Timsk1::ICIE1.bits());
        assert_eq!(bus.mem[TIMSK0 as usize], 0);
        assert_eq!(bus.mem[TIMSK2 as usize], 0);
    }

    #[test]
    fn test_wide_writes_high_byte_first() {
        let mut bus = bus();
        configure_frame_clock(&mut bus, &VGA_640X480);
        assert!(position(&bus, ICR1H) < position(&bus, ICR1L));
        assert!(position(&bus, OCR1AH) < position(&bus, OCR1AL));
    }

    #[test]
    fn test_timer_started_last() {
        let mut bus = bus();
        configure_frame_clock(&mut bus, &VGA_640X480);
        assert_eq!(position(&bus, TCCR1B), bus.writes.len() - 1);
        assert_eq!(bus.writes[0], (TCCR1B, 0));
    }

    #[test]
    fn test_initialize_outputs_before_timer() {
        let mut bus = bus();
        let driver = initialize(&mut bus, &VGA_640X480);
        assert_eq!(driver.phase(), Phase::FrontPorch);
        assert_eq!(driver.counter().remaining(), 11);
        assert_eq!(bus.mem[DDRC as usize] & COLOR_PINS, COLOR_PINS);
        assert_eq!(bus.mem[PORTC as usize] & COLOR_PINS, 0);
        assert_eq!(bus.mem[DDRB as usize], HSYNC_PIN | VSYNC_PIN);
        assert_eq!(bus.mem[PORTB as usize] & VSYNC_PIN, VSYNC_PIN);
        assert!(position(&bus, DDRB) < position(&bus, TCCR1B));
        assert!(position(&bus, DDRC) < position(&bus, TCCR1B));
    }
}
