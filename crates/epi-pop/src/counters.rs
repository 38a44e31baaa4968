//! Live-population counters, one per compartment.
//!
//! Maintained at every transition so prevalences never require a scan of
//! the register.

use epi_core::fatal;

use crate::person::{State, STATE_COUNT};

/// Count of live persons in each compartment.
#[derive(Clone, Debug, Default)]
pub struct StateCounts {
    counts: [u64; STATE_COUNT],
}

impl StateCounts {
    pub fn new() -> Self {
        StateCounts::default()
    }

    #[inline]
    pub fn get(&self, state: State) -> u64 {
        self.counts[state.index()]
    }

    /// A person entered `state` from outside the population (birth or
    /// immigration).
    #[inline]
    pub fn enter(&mut self, state: State) {
        self.counts[state.index()] += 1;
    }

    /// A person left `state` and the population (death or emigration).
    #[inline]
    pub fn leave(&mut self, state: State) {
        if self.counts[state.index()] == 0 {
            fatal(609, &format!("state counter fell negative ({state})"));
        }
        self.counts[state.index()] -= 1;
    }

    /// A live person moved between compartments.
    #[inline]
    pub fn transition(&mut self, from: State, to: State) {
        self.leave(from);
        self.enter(to);
    }

    /// Total live persons; equals the register's live count at all times.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}
