//! The `Simulation` context and its dispatch loop.
//!
//! Everything a run mutates — random stream, event queue, register,
//! counters, tallies — lives in one `Simulation` value owned by the caller.
//! Replicate runs construct independent values with distinct seeds; there
//! are no process-wide singletons to reinitialise.
//!
//! States never change spontaneously: every change is induced by a
//! dispatched event, scheduled in advance from distributions that may
//! depend on the person and the calendar year. The clock jumps from one
//! event to the next, so a quiet population costs nothing to simulate.

use epi_core::{fatal, Lcg, PersonId};
use epi_io::{Shape, Table};
use epi_model::{
    CohortLifespan, Dataset, EmigrationModel, ExponentialEmigration, LifespanModel, ModelResult,
    Params, RecoveryModel, SpreadRecovery, AGE_CLASSES,
};
use epi_pop::{Cohort, Pending, Register, Sex, Slot, StateCounts, Subcohort};
use epi_schedule::EventQueue;

use crate::stats::StepStats;

/// Instants that could otherwise coincide with the current instant are
/// pushed this far forward, so an event never fires at a zero interval.
pub const EPSILON: f64 = 1e-10;

/// Aggregates handed back when a run completes, for fitting harnesses that
/// drive the simulator as a subroutine.
pub struct RunSummary {
    /// Notification rates per 100 000 by group, year, sex, and age class
    /// (year-major within group).
    pub rates: Vec<f64>,
    /// Notification counts corrected by the observed/model population
    /// ratio, in the same order.
    pub corrected_counts: Vec<f64>,
    /// Events dispatched over the whole run.
    pub events: u64,
    /// Deaths over the whole run.
    pub deaths: u64,
    /// Live population at the end of the run.
    pub final_population: u64,
}

// ── Simulation ────────────────────────────────────────────────────────────────

/// One complete run: parameters, data, and every piece of mutable state.
pub struct Simulation {
    pub params: Params,
    pub data: Dataset,
    pub rng: Lcg,
    pub queue: EventQueue,
    pub register: Register,
    pub counts: StateCounts,

    pub lifespan: Box<dyn LifespanModel>,
    pub emigration: Box<dyn EmigrationModel>,
    pub recovery: Box<dyn RecoveryModel>,

    // ── Tallies ───────────────────────────────────────────────────────────
    /// Events dispatched since the last report.
    pub(crate) events_since_report: u64,
    /// Deaths since the last report.
    pub(crate) deaths_since_report: u64,
    pub(crate) events_total: u64,
    pub(crate) deaths_total: u64,
    pub(crate) births_total: u64,
    pub(crate) immigrations_total: u64,
    pub(crate) emigrations_total: u64,
    /// Live persons once the initial population stood complete.
    pub(crate) initial_live: u64,
    /// First and second moments of age at death.
    pub(crate) age_sum: f64,
    pub(crate) age_sq_sum: f64,
    pub(crate) age_n: f64,
    pub(crate) steps: StepStats,

    // ── Generator state ───────────────────────────────────────────────────
    /// Current inter-arrival intervals, refreshed each calendar year.
    pub(crate) years_per_birth: f64,
    pub(crate) years_per_immigrant: f64,
    pub(crate) last_rate_year: i64,

    // ── Aggregation arrays ────────────────────────────────────────────────
    /// Mid-year model population by (age class, sex, group, year).
    pub(crate) census: Table,
    /// Notified cases by (age class, sex, group, site, year).
    pub(crate) notifications: Table,

    /// Seed the stream actually started from, for run records.
    pub(crate) start_seed: u32,
}

impl Simulation {
    /// Build a ready-to-run simulation. `rng` must already be seeded; the
    /// production lifespan/emigration/recovery models are installed (swap
    /// the public fields before [`Simulation::run`] for calibration work).
    pub fn new(params: Params, data: Dataset, rng: Lcg) -> ModelResult<Simulation> {
        let years = params.years();
        let capacity = (params.capacity / params.scale) as u32;
        let max_foreign = (params.max_foreign / params.scale) as u32;

        let register = Register::new(capacity, max_foreign);
        let mut queue = EventQueue::new(
            register.max_person(),
            register.max_person() as usize,
            epi_schedule::DEFAULT_CYCLE_YEARS,
        );
        queue.set_horizon(params.t1);

        let start_seed = rng.ending_seed();
        Ok(Simulation {
            queue,
            register,
            counts: StateCounts::new(),
            rng,

            lifespan: Box::new(CohortLifespan),
            emigration: Box::new(ExponentialEmigration),
            recovery: Box::new(SpreadRecovery::default()),

            events_since_report: 0,
            deaths_since_report: 0,
            events_total: 0,
            deaths_total: 0,
            births_total: 0,
            immigrations_total: 0,
            emigrations_total: 0,
            initial_live: 0,
            age_sum: 0.0,
            age_sq_sum: 0.0,
            age_n: 0.0,
            steps: StepStats::new(),

            years_per_birth: 0.0,
            years_per_immigrant: 0.0,
            last_rate_year: 0,

            census: Table::zeros(Shape::new(&[
                ('a', AGE_CLASSES),
                ('s', 2),
                ('r', 3),
                ('y', years),
            ])?),
            notifications: Table::zeros(Shape::new(&[
                ('a', AGE_CLASSES),
                ('s', 2),
                ('r', 3),
                ('d', 2),
                ('y', years),
            ])?),

            start_seed,
            params,
            data,
        })
    }

    /// The clock.
    #[inline]
    pub fn now(&self) -> f64 {
        self.queue.now()
    }

    /// Year index of the clock into the year-dimensioned tables.
    #[inline]
    pub(crate) fn year(&self) -> usize {
        self.data.year_index(self.queue.now())
    }

    pub fn start_seed(&self) -> u32 {
        self.start_seed
    }

    // ── Initialisation ────────────────────────────────────────────────────

    /// Position the clock, set the generator rates, build the initial
    /// population, and fire both generators once.
    pub fn init(&mut self) {
        let t0 = self.params.t0;
        self.queue.start_time(t0);
        self.last_rate_year = t0 as i64;

        // Inter-arrival intervals from the first year's annual rates. A
        // zero rate pushes the interval past the horizon so the generator
        // idles rather than divides by zero.
        self.years_per_birth = interval_for(self.data.births(0), self.params.years(), "births");
        self.years_per_immigrant =
            interval_for(self.data.immigrants(0), self.params.years(), "immigrants");

        self.init_population();
        self.initial_live = self.register.live_count();

        self.birth_pulse();
        self.immigration_pulse();
    }

    /// Build the starting population from the initial census tables: one
    /// person per counted head, with age, state, and first event assigned.
    fn init_population(&mut self) {
        for age in 0..epi_model::AGES {
            for sex in [Sex::Male, Sex::Female] {
                // Native-born.
                let n = self.data.initial_population(age, sex.index(), Cohort::Native.index());
                for _ in 0..n as u64 {
                    let id = self.register.allocate(Cohort::Native);
                    let years_frac = self.rng.rand();
                    let person = self.register.person_mut(id);
                    *person = Default::default();
                    person.sex = sex;
                    person.cohort = Cohort::Native;
                    person.subcohort = Subcohort::Baseline;
                    person.set_time(Slot::Birth, self.queue.now() - (age as f64 + years_frac));
                    self.setup_initial_person(id);
                    self.assign_initial_state(id, age);
                }

                // Foreign-born, with the high-incidence and co-infection
                // splits drawn per person.
                let n = self.data.initial_population(age, sex.index(), Cohort::Foreign.index());
                for _ in 0..n as u64 {
                    let id = self.register.allocate(Cohort::Foreign);
                    let years_frac = self.rng.rand();
                    let mut subcohort = Subcohort::Baseline;
                    if self.rng.rand() < self.data.initial_high_incidence(age, sex) {
                        subcohort = Subcohort::HighIncidence;
                        if self.rng.rand() < self.data.coinfection_prevalence(sex, 0) {
                            subcohort = Subcohort::Coinfected;
                        }
                    }
                    let person = self.register.person_mut(id);
                    *person = Default::default();
                    person.sex = sex;
                    person.cohort = Cohort::Foreign;
                    person.subcohort = subcohort;
                    person.set_time(Slot::Birth, self.queue.now() - (age as f64 + years_frac));
                    self.setup_initial_person(id);
                    self.assign_initial_state(id, age);
                }
            }
        }
    }

    // ── Main loop ─────────────────────────────────────────────────────────

    /// Run to the horizon (or queue exhaustion), reporting every `tgap`
    /// years, and return the final aggregates.
    pub fn run(&mut self) -> RunSummary {
        self.init();

        let mut reporter = crate::report::Reporter::new(self.params.tgap);
        reporter.report(self);

        loop {
            let prev = self.queue.now();
            let Some((person, te)) = self.queue.next() else { break };
            self.steps.record(prev, te);
            self.events_since_report += 1;
            self.events_total += 1;
            self.dispatch(person);

            if self.queue.now() - reporter.last_report() >= self.params.tgap {
                reporter.report(self);
            }
        }

        reporter.report(self);
        reporter.finish(self)
    }

    /// Invoke the handler selected by the person's pending tag.
    pub fn dispatch(&mut self, id: PersonId) {
        match self.register.person(id).pending {
            Pending::Vaccinate => {
                self.vaccinate(id);
            }
            Pending::Transmit => {
                self.transmit(id);
            }
            Pending::ToRemote => {
                self.to_remote(id);
            }
            Pending::Disease => {
                self.disease(id);
            }
            Pending::Death => {
                self.death(id);
            }
            Pending::Mutate => {
                self.mutate(id);
            }
            Pending::Emigrate => {
                self.emigrate(id);
            }
            Pending::BirthPulse => {
                self.birth_pulse();
            }
            Pending::ImmigrationPulse => {
                self.immigration_pulse();
            }
            Pending::Report => {
                self.report_case(id);
            }
        }
    }

    // ── Shared helpers for the handlers ───────────────────────────────────

    /// Refresh the generator intervals when the calendar year advances.
    pub(crate) fn refresh_arrival_rates(&mut self) {
        let year_now = self.queue.now() as i64;
        if year_now > self.last_rate_year {
            let y = self.year();
            self.years_per_birth =
                interval_for(self.data.births(y), self.params.years(), "births");
            self.years_per_immigrant =
                interval_for(self.data.immigrants(y), self.params.years(), "immigrants");
            self.last_rate_year = year_now;
        }
    }

    /// Draw remaining lifespan through the installed model; fatal if the
    /// draw lands in the past.
    pub(crate) fn draw_death(&mut self, sex: Sex, age: f64) -> f64 {
        let now = self.queue.now();
        let wd = now + self.lifespan.years_remaining(&mut self.rng, &self.data, sex, age, now);
        if wd < now {
            fatal(850, &format!("death drawn before the present (t={now}, wd={wd})"));
        }
        wd
    }

    /// Draw the emigration instant for the given origin group.
    pub(crate) fn draw_emigration(&mut self, sex: Sex, group: usize) -> f64 {
        let rate = self.params.emigration[sex.index()][group];
        self.queue.now() + self.emigration.years_until(&mut self.rng, rate)
    }

    /// Memory held by the main data structures, bytes.
    pub fn memory_bytes(&self) -> usize {
        self.register.memory_bytes() + self.queue.memory_bytes()
    }
}

/// Inter-arrival interval for an annual rate; a vanishing rate maps to an
/// interval beyond any horizon.
fn interval_for(annual_rate: f64, years: usize, what: &str) -> f64 {
    if annual_rate <= 0.0001 {
        println!("{what} are zero!");
        (years * 100) as f64
    } else {
        1.0 / annual_rate
    }
}
