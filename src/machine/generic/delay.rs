//! Cost model of the cycle-exact wait.
//!
//! The wait samples the timer counter once, then burns exactly as many cycles
//! as are left until the target tick: `delta` is split into `loops` iterations
//! of a [`UNIT_CYCLES`] loop plus `pad` single-cycle no-ops reached through a
//! branch table. Every path through the routine costs the same fixed overhead,
//! so the instruction after the wait always issues on the target tick.
//!
//! The costs below are AVR instruction timings. They are a calibration: a
//! different part or a different instruction sequence needs a new table.

/// AVR instruction cycle counts used by the wait sequence.
pub mod cost {
    pub const LDS: u8 = 2;
    /// Cycle within `LDS` on which the I/O register is read.
    pub const LDS_SAMPLE: u8 = 1;
    pub const SUB: u8 = 1;
    pub const SUBI: u8 = 1;
    pub const MOV: u8 = 1;
    pub const ANDI: u8 = 1;
    pub const LSR: u8 = 1;
    pub const LDI: u8 = 1;
    pub const SBC: u8 = 1;
    pub const IJMP: u8 = 2;
    pub const NOP: u8 = 1;
    pub const BRCC_TAKEN: u8 = 2;
    pub const BRCC_NOT_TAKEN: u8 = 1;
    pub const OUT: u8 = 1;
}

use cost::*;

use super::timing::{BAND_COUNT, H_ACTIVE_TICKS, H_BACK_PORCH_TICKS, H_SYNC_TICKS};

/// Cycles per loop iteration.
pub const UNIT_CYCLES: u8 = 4;

/// Cycles from the counter sample to the first padding no-op: the rest of the
/// `LDS`, the arithmetic splitting `delta`, and the indirect jump.
pub const DISPATCH_CYCLES: u8 =
    (LDS - LDS_SAMPLE) + SUB + SUBI + MOV + ANDI + 2 * LSR + 2 * LDI + SUB + SBC + IJMP;

pub const LOOP_CYCLES: u8 = NOP + SUBI + BRCC_TAKEN;
pub const LOOP_EXIT_CYCLES: u8 = NOP + SUBI + BRCC_NOT_TAKEN;

/// Fixed part of every wait. Subtracted from the raw distance before it is
/// split, which is what makes the exit land on the target itself.
pub const WAIT_OVERHEAD_CYCLES: u8 = DISPATCH_CYCLES + LOOP_EXIT_CYCLES;

/// Longest distance a wait is planned for. A sample further than this before
/// the target is read as the target having already passed, since only the low
/// byte of the counter is compared.
pub const MAX_WAIT_TICKS: u8 = i8::MAX as u8;

/// Cycles burnt by each entry of the no-op branch table.
pub const PAD_PATHS: [u8; UNIT_CYCLES as usize] = [0, NOP, 2 * NOP, 3 * NOP];

const _: () = assert!(LOOP_CYCLES == UNIT_CYCLES);
const _: () = assert!(UNIT_CYCLES.is_power_of_two());
const _: () = assert!(WAIT_OVERHEAD_CYCLES == 16);
// The first wait of a line and the widest band both fit under the bound.
const _: () = assert!(H_SYNC_TICKS + H_BACK_PORCH_TICKS <= MAX_WAIT_TICKS as u16);
const _: () = assert!(
    H_ACTIVE_TICKS - (BAND_COUNT as u16 - 1) * (H_ACTIVE_TICKS / BAND_COUNT as u16)
        <= MAX_WAIT_TICKS as u16
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayPlan {
    pub loops: u8,
    pub pad: u8,
}

impl DelayPlan {
    /// Plan a wait from a sampled counter low byte to `target`. Arithmetic
    /// wraps like the 8-bit registers it models: an unreachable target turns
    /// into a wait that is about 256 ticks too long.
    #[inline(always)]
    pub const fn new(sampled: u8, target: u8) -> Self {
        Self::from_delta(target.wrapping_sub(sampled).wrapping_sub(WAIT_OVERHEAD_CYCLES))
    }

    #[inline(always)]
    pub const fn from_delta(delta: u8) -> Self {
        Self {
            loops: delta >> UNIT_CYCLES.trailing_zeros(),
            pad: delta & (UNIT_CYCLES - 1),
        }
    }

    /// The delta this plan burns on top of the fixed overhead.
    pub const fn delta(&self) -> u8 {
        self.loops * UNIT_CYCLES + self.pad
    }

    /// Cycles from the counter sample to the exit of the wait.
    pub const fn cycles(&self) -> u16 {
        DISPATCH_CYCLES as u16
            + PAD_PATHS[self.pad as usize] as u16
            + self.loops as u16 * LOOP_CYCLES as u16
            + LOOP_EXIT_CYCLES as u16
    }

    /// Whether a wait sampled at `sampled` can still land on `target`. Too
    /// close and the overhead overshoots it; more than [`MAX_WAIT_TICKS`] ahead
    /// means `target` is behind the sample and the low byte wrapped.
    pub const fn is_reachable(sampled: u8, target: u8) -> bool {
        let distance = target.wrapping_sub(sampled);
        distance >= WAIT_OVERHEAD_CYCLES && distance <= MAX_WAIT_TICKS
    }
}

/// Low byte of a tick offset, as compared against `TCNT1L`.
#[inline(always)]
pub const fn low_byte(tick: u16) -> u8 {
    (tick & 0xff) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_overhead() {
        assert_eq!(DISPATCH_CYCLES, 13);
        assert_eq!(LOOP_EXIT_CYCLES, 3);
        assert_eq!(WAIT_OVERHEAD_CYCLES, 16);
    }

    #[test]
    fn test_exit_lands_on_target() {
        for sampled in 0..=255_u8 {
            for target in 0..=255_u8 {
                if !DelayPlan::is_reachable(sampled, target) {
                    continue;
                }
                let plan = DelayPlan::new(sampled, target);
                assert!(plan.pad < UNIT_CYCLES);
                let exit = sampled.wrapping_add(plan.cycles() as u8);
                assert_eq!(exit, target, "sampled {sampled} target {target} {plan:?}");
            }
        }
    }

    /// Cost must be `1 * delta + WAIT_OVERHEAD_CYCLES` in every remainder
    /// class, i.e. the padding exactly makes up for the short loop.
    #[test]
    fn test_cost_is_affine_per_remainder_class() {
        for class in 0..UNIT_CYCLES {
            let samples: Vec<(u16, u16)> = (WAIT_OVERHEAD_CYCLES as u16..=255)
                .filter(|d| *d as u8 % UNIT_CYCLES == class)
                .map(|d| {
                    let plan = DelayPlan::new(0, d as u8);
                    (d, plan.cycles())
                })
                .collect();
            assert!(samples.len() > 2);
            let (d0, c0) = samples[0];
            for (d, c) in &samples[1..] {
                assert_eq!(c - c0, d - d0, "class {class}");
            }
            assert_eq!(c0, d0, "class {class}");
        }
    }

    #[test]
    fn test_minimum_wait() {
        let plan = DelayPlan::new(100, 100 + WAIT_OVERHEAD_CYCLES);
        assert_eq!(plan, DelayPlan { loops: 0, pad: 0 });
        assert_eq!(plan.cycles(), WAIT_OVERHEAD_CYCLES as u16);
    }

    #[test]
    fn test_unreachable_target_wraps() {
        assert!(!DelayPlan::is_reachable(95, 91));
        assert!(!DelayPlan::is_reachable(80, 91));
        let plan = DelayPlan::new(95, 91);
        // 91 - 95 - 16 wraps to 236
        assert_eq!(plan.delta(), 236);
    }

    #[rstest]
    #[case(92, 91)]
    #[case(95, 91)]
    #[case(97, 91)]
    #[case(200, 91)]
    #[case(91 + 128, 91)]
    #[case(low_byte(300), low_byte(291))]
    fn test_target_behind_sample_is_unreachable(#[case] sampled: u8, #[case] target: u8) {
        assert!(!DelayPlan::is_reachable(sampled, target));
    }

    #[rstest]
    #[case(91 - 16, 91)]
    #[case(91 - 56, 91)]
    #[case(0, 91)]
    #[case(220, 91)]
    #[case(low_byte(291 - 56), low_byte(291))]
    fn test_schedule_distances_are_reachable(#[case] sampled: u8, #[case] target: u8) {
        assert!(DelayPlan::is_reachable(sampled, target));
    }

    #[test]
    fn test_wrapping_across_low_byte() {
        // Band at tick 291 waited for from tick 245.
        let plan = DelayPlan::new(245, low_byte(291));
        assert!(DelayPlan::is_reachable(245, low_byte(291)));
        assert_eq!(plan.delta() as u16 + WAIT_OVERHEAD_CYCLES as u16, 291 - 245);
    }
}
