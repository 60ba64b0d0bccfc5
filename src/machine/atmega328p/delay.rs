use core::arch::asm;

use crate::machine::generic::delay::{UNIT_CYCLES, WAIT_OVERHEAD_CYCLES};

use super::registers::TCNT1L;

/// Spin until `TCNT1L == target`, exiting on exactly that cycle.
///
/// Cycle counts (see `generic::delay::cost`): after the counter is sampled in
/// the second cycle of `lds`, 13 cycles reach the no-op sled, the sled burns
/// `pad` cycles, and the loop burns `4 * loops + 3`. The `subi` of the
/// overhead constant makes the total equal to the raw distance.
#[inline(always)]
pub fn wait_until_tick(target: u8) {
    unsafe {
        asm!(
            "lds {now}, {tcnt1l}",
            "sub {target}, {now}",
            "subi {target}, {overhead}",
            "mov {pad}, {target}",
            "andi {pad}, {pad_mask}",
            "lsr {target}",
            "lsr {target}",
            "ldi r30, pm_lo8(3f)",
            "ldi r31, pm_hi8(3f)",
            "sub r30, {pad}",
            "sbc r31, r1",
            "ijmp",
            "nop",
            "nop",
            "nop",
            "3:",
            "2:",
            "nop",
            "subi {target}, 1",
            "brcc 2b",
            tcnt1l = const TCNT1L,
            overhead = const WAIT_OVERHEAD_CYCLES,
            pad_mask = const UNIT_CYCLES - 1,
            target = inout(reg_upper) target => _,
            now = out(reg) _,
            pad = out(reg_upper) _,
            out("r30") _,
            out("r31") _,
            options(nostack),
        );
    }
}
