//! ATmega328P data-space addresses and bit layouts for the registers the
//! video engine touches.

pub const PINB: u16 = 0x23;
pub const DDRB: u16 = 0x24;
pub const PORTB: u16 = 0x25;
pub const PINC: u16 = 0x26;
pub const DDRC: u16 = 0x27;
pub const PORTC: u16 = 0x28;

pub const TIFR0: u16 = 0x35;
pub const TIFR1: u16 = 0x36;
pub const TIFR2: u16 = 0x37;

pub const TIMSK0: u16 = 0x6E;
pub const TIMSK1: u16 = 0x6F;
pub const TIMSK2: u16 = 0x70;

pub const TCCR1A: u16 = 0x80;
pub const TCCR1B: u16 = 0x81;
pub const TCCR1C: u16 = 0x82;
pub const TCNT1L: u16 = 0x84;
pub const TCNT1H: u16 = 0x85;
pub const ICR1L: u16 = 0x86;
pub const ICR1H: u16 = 0x87;
pub const OCR1AL: u16 = 0x88;
pub const OCR1AH: u16 = 0x89;
pub const OCR1BL: u16 = 0x8A;
pub const OCR1BH: u16 = 0x8B;

/// `PB1`, driven by the OC1A waveform output.
pub const HSYNC_PIN: u8 = 1 << 1;
/// `PB2`, toggled by writing to `PINB`.
pub const VSYNC_PIN: u8 = 1 << 2;
/// `PC0..PC2`, red, green and blue.
pub const COLOR_PINS: u8 = 0b0000_0111;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Tccr1a: u8 {
        const COM1A1 = 1 << 7;
        const COM1A0 = 1 << 6;
        const COM1B1 = 1 << 5;
        const COM1B0 = 1 << 4;
        const WGM11  = 1 << 1;
        const WGM10  = 1 << 0;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Tccr1b: u8 {
        const ICNC1 = 1 << 7;
        const ICES1 = 1 << 6;
        const WGM13 = 1 << 4;
        const WGM12 = 1 << 3;
        const CS12  = 1 << 2;
        const CS11  = 1 << 1;
        const CS10  = 1 << 0;

        const CLOCK_SELECT = Self::CS12.bits() | Self::CS11.bits() | Self::CS10.bits();
    }

    /// Timer1 interrupt mask; the flag register `TIFR1` shares the layout.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Timsk1: u8 {
        const ICIE1  = 1 << 5;
        const OCIE1B = 1 << 2;
        const OCIE1A = 1 << 1;
        const TOIE1  = 1 << 0;
    }
}

/// Waveform generation mode assembled from the `WGM1x` bits spread over
/// `TCCR1A` and `TCCR1B`.
pub const fn waveform_mode(tccr1a: u8, tccr1b: u8) -> u8 {
    (tccr1a & 0b11) | ((tccr1b >> 1) & 0b1100)
}

/// Fast PWM, TOP = `ICR1`, `ICF1` set at TOP.
pub const WGM_FAST_PWM_ICR1: u8 = 14;
