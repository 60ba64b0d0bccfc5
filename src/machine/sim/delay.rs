//! The cycle-exact wait executed instruction by instruction against the
//! simulated counter.

use crate::machine::atmega328p::registers::TCNT1L;
use crate::machine::generic::delay::cost::*;
use crate::machine::generic::delay::{DelayPlan, UNIT_CYCLES, WAIT_OVERHEAD_CYCLES, low_byte};
use crate::machine::generic::hal::RegisterBus;

use super::mcu::Mcu;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOutcome {
    pub target: u16,
    /// Full counter value seen by the `lds`. The code only gets the low byte.
    pub sampled: u16,
    pub plan: DelayPlan,
    /// Cycle on which the instruction after the wait issues.
    pub exit: u64,
    pub exit_tick: u16,
}

impl WaitOutcome {
    /// Whether the wait released on the tick it was asked for.
    pub fn reachable(&self) -> bool {
        self.exit_tick == self.target
    }
}

pub fn wait_until_tick(mcu: &mut Mcu, target: u16) -> WaitOutcome {
    let c = |cost: u8| cost as u64;
    let sampled = mcu.tick_at(mcu.cycle + c(LDS_SAMPLE));
    let low = low_byte(target);

    // lds now, TCNT1L
    let sampled_low = mcu.read(TCNT1L);
    // sub; subi
    let mut remaining = low.wrapping_sub(sampled_low);
    mcu.spend(c(SUB));
    remaining = remaining.wrapping_sub(WAIT_OVERHEAD_CYCLES);
    mcu.spend(c(SUBI));
    // mov; andi
    let pad = remaining & (UNIT_CYCLES - 1);
    mcu.spend(c(MOV) + c(ANDI));
    // lsr; lsr
    let mut loops = remaining >> 2;
    mcu.spend(2 * c(LSR));
    // ldi; ldi; sub; sbc; ijmp into the no-op sled
    mcu.spend(2 * c(LDI) + c(SUB) + c(SBC) + c(IJMP));
    for _ in 0..pad {
        mcu.spend(c(NOP));
    }
    loop {
        mcu.spend(c(NOP));
        let (next, borrow) = loops.overflowing_sub(1);
        loops = next;
        mcu.spend(c(SUBI));
        if borrow {
            mcu.spend(c(BRCC_NOT_TAKEN));
            break;
        }
        mcu.spend(c(BRCC_TAKEN));
    }

    WaitOutcome {
        target,
        sampled,
        plan: DelayPlan::new(sampled_low, low),
        exit: mcu.cycle,
        exit_tick: mcu.tick_at(mcu.cycle),
    }
}
