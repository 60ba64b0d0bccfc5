//! Data-space view of the simulated ATmega328P: ports B and C, the Timer1
//! model and the other timers' interrupt registers.

use tracing::trace;

use crate::machine::atmega328p::registers::*;
use crate::machine::generic::delay::cost::{LDS, LDS_SAMPLE, OUT};
use crate::machine::generic::hal::RegisterBus;
use crate::machine::generic::pattern::Color;

use super::cpu::cost::{IN, STS};
use super::timer::Timer1;

/// Registers below this address are reachable with `in`/`out`.
const IO_SPACE_END: u16 = 0x60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Port {
    pub ddr: u8,
    pub port: u8,
}

impl Port {
    /// Writing ones to `PINx` inverts the matching `PORTx` bits.
    pub fn toggle(&mut self, mask: u8) {
        self.port ^= mask;
    }

    /// Level driven onto an output pin. Inputs read as `None`.
    pub fn output(&self, mask: u8) -> Option<bool> {
        (self.ddr & mask == mask).then_some(self.port & mask != 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinChange {
    Color(Color),
    /// New VSYNC level.
    Vsync(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinWrite {
    pub cycle: u64,
    pub change: PinChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusWrite {
    pub cycle: u64,
    pub addr: u16,
    pub value: u8,
}

#[derive(Debug, Clone)]
pub struct Mcu {
    pub cycle: u64,
    pub portb: Port,
    pub portc: Port,
    pub timer1: Timer1,
    pub timsk0: u8,
    pub timsk2: u8,
    pins: Vec<PinWrite>,
    bus_log: Option<Vec<BusWrite>>,
}

impl Default for Mcu {
    fn default() -> Self {
        Self::new()
    }
}

impl Mcu {
    /// State left behind by a typical startup runtime: Timer0 overflow
    /// interrupt enabled, everything else at reset values.
    pub fn new() -> Self {
        Self {
            cycle: 0,
            portb: Port::default(),
            portc: Port::default(),
            timer1: Timer1::default(),
            timsk0: 0x01,
            timsk2: 0,
            pins: Vec::new(),
            bus_log: None,
        }
    }

    pub fn spend(&mut self, cycles: u64) {
        self.cycle += cycles;
    }

    /// Keep every bus write from now on.
    pub fn log_bus(&mut self) {
        self.bus_log = Some(Vec::new());
    }

    pub fn take_bus_log(&mut self) -> Vec<BusWrite> {
        self.bus_log.take().unwrap_or_default()
    }

    /// Output changes since the last call.
    pub fn drain_pins(&mut self) -> std::vec::Drain<'_, PinWrite> {
        self.pins.drain(..)
    }

    pub fn color(&self) -> Color {
        Color::from_bits_truncate(self.portc.port & self.portc.ddr & COLOR_PINS)
    }

    pub fn vsync(&self) -> Option<bool> {
        self.portb.output(VSYNC_PIN)
    }

    /// Counter value visible on `cycle`.
    pub fn tick_at(&self, cycle: u64) -> u16 {
        self.timer1.count_at(cycle)
    }

    fn load(&mut self, addr: u16, cycle: u64) -> u8 {
        match addr {
            PINB => self.portb.port,
            DDRB => self.portb.ddr,
            PORTB => self.portb.port,
            PINC => self.portc.port,
            DDRC => self.portc.ddr,
            PORTC => self.portc.port,
            TIMSK0 => self.timsk0,
            TIMSK2 => self.timsk2,
            _ => self.timer1.read(addr, cycle),
        }
    }

    fn store(&mut self, addr: u16, value: u8, cycle: u64) {
        let vsync = self.vsync();
        match addr {
            PINB => self.portb.toggle(value),
            DDRB => self.portb.ddr = value,
            PORTB => self.portb.port = value,
            PINC => self.portc.toggle(value),
            DDRC => self.portc.ddr = value,
            PORTC => self.portc.port = value,
            TIMSK0 => self.timsk0 = value,
            TIMSK2 => self.timsk2 = value,
            TIFR0 | TIFR2 => {}
            _ => self.timer1.write(addr, value, cycle),
        }

        if matches!(addr, PINC | PORTC) && self.portc.ddr & COLOR_PINS != 0 {
            let change = PinChange::Color(self.color());
            self.pins.push(PinWrite { cycle, change });
        }
        if let (Some(before), Some(after)) = (vsync, self.vsync())
            && before != after
        {
            trace!(cycle, level = after, "VSYNC");
            let change = PinChange::Vsync(after);
            self.pins.push(PinWrite { cycle, change });
        }
    }
}

impl RegisterBus for Mcu {
    /// `in` below the extended I/O space, `lds` above it. `lds` samples on its
    /// second cycle.
    fn read(&mut self, addr: u16) -> u8 {
        if addr < IO_SPACE_END {
            let value = self.load(addr, self.cycle);
            self.spend(IN);
            value
        } else {
            let value = self.load(addr, self.cycle + LDS_SAMPLE as u64);
            self.spend(LDS as u64);
            value
        }
    }

    /// `out` or `sts`. Effects are visible from the issue cycle.
    fn write(&mut self, addr: u16, value: u8) {
        let cycle = self.cycle;
        if let Some(log) = &mut self.bus_log {
            log.push(BusWrite { cycle, addr, value });
        }
        self.store(addr, value, cycle);
        self.spend(if addr < IO_SPACE_END { OUT as u64 } else { STS });
    }
}
