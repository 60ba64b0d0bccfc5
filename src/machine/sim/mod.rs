//! Cycle-level simulation of the firmware on an ATmega328P.
//!
//! The configurator and [`SignalDriver`] run unchanged against [`Mcu`]; the
//! simulator only supplies the timing of everything around them: the idle
//! loop, interrupt entry, the compiled handler's fixed costs, and the wait
//! sequence. One call to [`System::step`] is one frame clock interrupt.

pub mod cpu;
pub mod delay;
pub mod mcu;
pub mod timer;

use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::machine::atmega328p;
use crate::machine::atmega328p::registers::{PINB, PORTC, VSYNC_PIN};
use crate::machine::generic::driver::SignalDriver;
use crate::machine::generic::hal::{RegisterBus, VideoHardware};
use crate::machine::generic::pattern::Color;
use crate::machine::generic::phase::Phase;
use crate::machine::generic::timing::Timing;

use self::cpu::{Cpu, IsrModel, cost};
use self::delay::WaitOutcome;
use self::mcu::{BusWrite, Mcu, PinChange};

#[derive(Debug, Error)]
pub enum SimError {
    #[error("line {line}: wait for tick {target} sampled the counter at {sampled}, too late")]
    TimingViolation { line: u64, target: u16, sampled: u16 },
    #[error("line {line}: {lost} frame clock event(s) lost while the handler ran")]
    MissedFrameClock { line: u64, lost: u64 },
    #[error("frame clock is not running")]
    FrameClockStopped,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimConfig {
    pub isr: IsrModel,
    /// Report timing violations and lost events as errors instead of logging
    /// them and carrying on.
    pub strict: bool,
}

/// An output change, `offset` cycles after the start of its line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub offset: u32,
    pub change: PinChange,
}

/// Everything one frame clock event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord {
    /// Number of the event since `initialize`.
    pub index: u64,
    /// Phase the driver was in when the event arrived.
    pub phase: Phase,
    /// Cycle on which the counter restarted at 0 for this line.
    pub origin: u64,
    /// Counter value on the handler's first instruction.
    pub entry_tick: u16,
    pub events: Vec<Transition>,
    pub waits: Vec<WaitOutcome>,
    pub lost: u64,
}

impl LineRecord {
    pub fn colors(&self) -> impl Iterator<Item = (u32, Color)> + '_ {
        self.events.iter().filter_map(|t| match t.change {
            PinChange::Color(color) => Some((t.offset, color)),
            _ => None,
        })
    }

    pub fn vsync(&self) -> impl Iterator<Item = (u32, bool)> + '_ {
        self.events.iter().filter_map(|t| match t.change {
            PinChange::Vsync(level) => Some((t.offset, level)),
            _ => None,
        })
    }

    pub fn violations(&self) -> impl Iterator<Item = &WaitOutcome> + '_ {
        self.waits.iter().filter(|w| !w.reachable())
    }
}

/// What the driver sees as hardware while the simulated handler runs.
struct SimHardware<'a> {
    mcu: &'a mut Mcu,
    waits: Vec<WaitOutcome>,
}

impl VideoHardware for SimHardware<'_> {
    fn wait_until_tick(&mut self, tick: u16) {
        self.mcu.spend(cost::ARGUMENT_SETUP);
        let outcome = delay::wait_until_tick(self.mcu, tick);
        self.waits.push(outcome);
    }

    fn set_color(&mut self, color: Color) {
        self.mcu.write(PORTC, color.bits());
    }

    fn toggle_vsync(&mut self) {
        self.mcu.write(PINB, VSYNC_PIN);
    }
}

pub struct System {
    mcu: Mcu,
    cpu: Cpu,
    driver: SignalDriver,
    config: SimConfig,
    timing: Timing,
    init_writes: Vec<BusWrite>,
    lines: u64,
}

impl System {
    /// Run `initialize()` on a freshly reset part.
    pub fn new(timing: &Timing, config: SimConfig) -> Self {
        let mut mcu = Mcu::new();
        mcu.log_bus();
        let driver = atmega328p::config::initialize(&mut mcu, timing);
        let init_writes = mcu.take_bus_log();

        let mut cpu = Cpu::default();
        mcu.spend(cost::SEI);
        cpu.sei(mcu.cycle);
        debug!(
            cycle = mcu.cycle,
            writes = init_writes.len(),
            "initialized, interrupts enabled"
        );

        // Output setup is not part of any line.
        mcu.drain_pins().for_each(drop);

        Self {
            mcu,
            cpu,
            driver,
            config,
            timing: *timing,
            init_writes,
            lines: 0,
        }
    }

    pub fn mcu(&self) -> &Mcu {
        &self.mcu
    }

    pub fn driver(&self) -> &SignalDriver {
        &self.driver
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Register writes made by `initialize()`, in order.
    pub fn init_writes(&self) -> &[BusWrite] {
        &self.init_writes
    }

    pub fn lines(&self) -> u64 {
        self.lines
    }

    /// Width of the hardware sync pulse in ticks, from the timer settings.
    pub fn hsync_ticks(&self) -> u16 {
        self.mcu.timer1.oc1a_low_ticks()
    }

    /// Wait for the next frame clock event and run the handler for it.
    pub fn step(&mut self) -> Result<LineRecord, SimError> {
        let line = self.lines;
        let timer = &self.mcu.timer1;
        if !timer.capture_enabled() || !self.cpu.interrupts_enabled {
            return Err(SimError::FrameClockStopped);
        }
        let flag = timer.next_capture().ok_or(SimError::FrameClockStopped)?;

        let boundary = self.cpu.interrupt_boundary(flag);
        let vector = boundary + cost::INTERRUPT_RESPONSE;

        // Every TOP since the last acknowledge sets the same flag again.
        let tops = timer.tops_between(flag, vector);
        let lost = tops.saturating_sub(1);
        let origin = flag + (tops.max(1) - 1) * timer.period() + 1;
        self.mcu.timer1.acknowledge_capture(vector);
        if lost > 0 {
            warn!(line, lost, "frame clock events lost");
        }

        self.mcu.cycle = vector + cost::VECTOR_JUMP;
        let entry_tick = self.mcu.tick_at(self.mcu.cycle);

        let isr = self.config.isr;
        self.mcu.spend(isr.prologue + isr.dispatch);

        let phase = self.driver.phase();
        let mut hw = SimHardware {
            mcu: &mut self.mcu,
            waits: Vec::new(),
        };
        self.driver.on_frame_clock(&mut hw);
        let waits = hw.waits;

        self.mcu.spend(isr.advance + isr.epilogue + cost::RETI);
        self.cpu.idle_since = self.mcu.cycle;

        let events = self
            .mcu
            .drain_pins()
            .map(|pin| Transition {
                offset: (pin.cycle - origin) as u32,
                change: pin.change,
            })
            .collect();

        let record = LineRecord {
            index: line,
            phase,
            origin,
            entry_tick,
            events,
            waits,
            lost,
        };
        let (entry_phase, _) = self.timing.horizontal_phase(entry_tick);
        trace!(
            line,
            ?phase,
            entry_tick,
            ?entry_phase,
            end = self.mcu.cycle - origin,
            "frame clock"
        );
        self.lines += 1;

        // The line is fully accounted for before either error is reported, so
        // stepping on stays in step with the driver.
        if lost > 0 && self.config.strict {
            return Err(SimError::MissedFrameClock { line, lost });
        }
        if let Some(late) = record.violations().next() {
            warn!(
                line,
                target = late.target,
                sampled = late.sampled,
                "timing violation"
            );
            if self.config.strict {
                return Err(SimError::TimingViolation {
                    line,
                    target: late.target,
                    sampled: late.sampled,
                });
            }
        }
        Ok(record)
    }

    /// One full vertical period of events.
    pub fn run_frame(&mut self) -> Result<Vec<LineRecord>, SimError> {
        (0..self.timing.vtot()).map(|_| self.step()).collect()
    }
}
