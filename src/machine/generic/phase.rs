//! The four timing regions of a raster line or field, and the counter that
//! walks through them one frame clock event at a time.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Phase {
    SyncPulse = 0,
    BackPorch = 1,
    ActiveVideo = 2,
    FrontPorch = 3,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::SyncPulse,
        Phase::BackPorch,
        Phase::ActiveVideo,
        Phase::FrontPorch,
    ];

    /// The phase that follows this one. The discriminants are laid out so the
    /// successor is a 2-bit wrapping increment.
    #[inline(always)]
    pub const fn next(self) -> Phase {
        Phase::from_index((self as u8).wrapping_add(1))
    }

    #[inline(always)]
    const fn from_index(index: u8) -> Phase {
        match index & 0b11 {
            0 => Phase::SyncPulse,
            1 => Phase::BackPorch,
            2 => Phase::ActiveVideo,
            _ => Phase::FrontPorch,
        }
    }

    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Length of each phase, in lines (vertical) or ticks (horizontal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseLengths([u16; 4]);

impl PhaseLengths {
    /// Panics during const evaluation if any phase is empty, so a bad timing
    /// table fails the build instead of costing cycles at run time.
    pub const fn new(sync: u16, back_porch: u16, active: u16, front_porch: u16) -> Self {
        assert!(
            sync > 0 && back_porch > 0 && active > 0 && front_porch > 0,
            "every phase needs at least one line"
        );
        Self([sync, back_porch, active, front_porch])
    }

    #[inline(always)]
    pub const fn get(&self, phase: Phase) -> u16 {
        self.0[phase.index()]
    }

    pub const fn total(&self) -> u16 {
        self.0[0] + self.0[1] + self.0[2] + self.0[3]
    }

    /// Offset of the first line/tick of `phase`, counted from the start of
    /// the sync pulse.
    pub const fn start_of(&self, phase: Phase) -> u16 {
        let mut offset = 0;
        let mut i = 0;
        while i < phase.index() {
            offset += self.0[i];
            i += 1;
        }
        offset
    }
}

/// Current phase plus the number of lines left in it, including the current
/// one. `0 < remaining <= lengths.get(phase)` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseCounter {
    lengths: PhaseLengths,
    phase: Phase,
    remaining: u16,
}

impl PhaseCounter {
    /// Cold-start state: the top of the front porch.
    pub const fn new(lengths: PhaseLengths) -> Self {
        Self::at(lengths, Phase::FrontPorch)
    }

    /// The first line of `phase`, with its full allotment loaded.
    pub const fn at(lengths: PhaseLengths, phase: Phase) -> Self {
        Self {
            lengths,
            phase,
            remaining: lengths.get(phase),
        }
    }

    #[inline(always)]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline(always)]
    pub fn remaining(&self) -> u16 {
        self.remaining
    }

    #[inline(always)]
    pub fn is_last_line(&self) -> bool {
        self.remaining == 1
    }

    pub fn lengths(&self) -> &PhaseLengths {
        &self.lengths
    }

    /// Consume one line. Moves to the next phase and reloads its length once
    /// the current one is exhausted.
    #[inline(always)]
    pub fn advance(&mut self) {
        self.remaining -= 1;
        if self.remaining == 0 {
            self.phase = self.phase.next();
            self.remaining = self.lengths.get(self.phase);
        }
    }
}
