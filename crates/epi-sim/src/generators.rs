//! External event generators.
//!
//! Births and immigrations are not caused by anything inside the
//! population, so each is driven by a reserved pseudo-person whose only
//! event is "fire": create one new person, then reschedule yourself one
//! inter-arrival interval ahead. The intervals come from the annual rates
//! of the current calendar year and are refreshed when the year advances.

use epi_pop::{Cohort, Pending};

use crate::sim::Simulation;

impl Simulation {
    /// One birth, and the next one scheduled `1/rate` ahead.
    pub(crate) fn birth_pulse(&mut self) {
        self.refresh_arrival_rates();

        let now = self.queue.now();
        self.birth(now);

        let interval = self.years_per_birth;
        let generator = self.register.birth_generator();
        self.register.person_mut(generator).pending = Pending::BirthPulse;
        self.queue.schedule(generator, now + interval);
    }

    /// One immigrant — cohort drawn from the year's foreign fraction — and
    /// the next arrival scheduled `1/rate` ahead.
    pub(crate) fn immigration_pulse(&mut self) {
        self.refresh_arrival_rates();

        let now = self.queue.now();
        let y = self.year();
        let cohort = if self.rng.rand() < self.data.foreign_fraction(y) {
            Cohort::Foreign
        } else {
            Cohort::Native
        };
        let id = self.register.allocate(cohort);
        self.immigrate(id);

        let interval = self.years_per_immigrant;
        let generator = self.register.immigration_generator();
        self.register.person_mut(generator).pending = Pending::ImmigrationPulse;
        self.queue.schedule(generator, now + interval);
    }
}
