//! Interrupt timing of the AVR core around the frame clock handler.

/// Instruction and interrupt costs the simulator charges outside the wait
/// sequence, which uses [`crate::machine::generic::delay::cost`].
pub mod cost {
    /// Push of the return address plus clearing `I`.
    pub const INTERRUPT_RESPONSE: u64 = 4;
    /// `jmp` in the vector table.
    pub const VECTOR_JUMP: u64 = 3;
    pub const RETI: u64 = 4;
    /// The foreground `rjmp .` the handler preempts.
    pub const IDLE_LOOP: u64 = 2;
    pub const SEI: u64 = 1;
    pub const IN: u64 = 1;
    pub const STS: u64 = 2;
    /// Loading the target tick and the next colour before each wait.
    pub const ARGUMENT_SETUP: u64 = 2;
}

/// Cycles the compiled handler spends outside the driver's waits and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsrModel {
    /// Register saves before the body.
    pub prologue: u64,
    /// Loading the driver state and branching on the phase.
    pub dispatch: u64,
    /// Decrementing the line counter and moving to the next phase.
    pub advance: u64,
    /// Register restores before `reti`.
    pub epilogue: u64,
}

impl Default for IsrModel {
    fn default() -> Self {
        Self {
            prologue: 16,
            dispatch: 6,
            advance: 12,
            epilogue: 16,
        }
    }
}

impl IsrModel {
    pub fn with_prologue(self, prologue: u64) -> Self {
        Self { prologue, ..self }
    }
}

/// Core state relevant to interrupt dispatch. The foreground is always the
/// idle loop, so only the point where it resumed matters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cpu {
    pub interrupts_enabled: bool,
    pub idle_since: u64,
}

impl Cpu {
    pub fn sei(&mut self, cycle: u64) {
        self.interrupts_enabled = true;
        self.idle_since = cycle;
    }

    /// First instruction boundary of the idle loop at which an interrupt
    /// flagged on cycle `flag` is taken. At least one loop instruction runs
    /// after `reti` or `sei` before the next interrupt.
    pub fn interrupt_boundary(&self, flag: u64) -> u64 {
        let first = self.idle_since + cost::IDLE_LOOP;
        if flag < first {
            first
        } else {
            let k = (flag - self.idle_since) / cost::IDLE_LOOP + 1;
            self.idle_since + k * cost::IDLE_LOOP
        }
    }
}
