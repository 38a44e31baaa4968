//! Unit and end-to-end tests for epi-sim.

use epi_core::Lcg;
use epi_model::{Dataset, Params};
use epi_pop::{Pending, Slot};

use crate::sim::Simulation;
use crate::stats::{fmt_years, StepStats};

/// A laptop-scale configuration: tens of thousands of people, a few
/// hundred arrivals a year.
fn small_sim(seed: u32) -> Simulation {
    let mut params = Params::default();
    params.capacity = 30_000.0;
    params.max_foreign = 10_000.0;
    params.scale = 1.0;
    let data = Dataset::synthetic(&params, 2_000, 8_000, 100.0, 50.0).unwrap();
    Simulation::new(params, data, Lcg::new(seed)).unwrap()
}

/// Scan-based audit: every live person holds exactly one queue entry, and
/// for the slot-backed pending kinds the stored candidate equals the queue
/// instant. Counters must sum to the live population.
fn audit(sim: &Simulation) {
    let mut scheduled = 0usize;
    for id in sim.register.live_ids() {
        assert!(sim.queue.is_scheduled(id), "live person {id} has no queue entry");
        scheduled += 1;

        let p = sim.register.person(id);
        let slot = match p.pending {
            Pending::Transmit => Some(Slot::Transmit),
            Pending::ToRemote => Some(Slot::Exit),
            Pending::Disease => Some(Slot::Disease),
            Pending::Death => Some(Slot::Death),
            Pending::Mutate => Some(Slot::Mutate),
            Pending::Emigrate => Some(Slot::Emigrate),
            Pending::Report => Some(Slot::Report),
            // Vaccination instants are not retained in the record, and the
            // generator pulses belong to the pseudo-persons.
            Pending::Vaccinate => None,
            Pending::BirthPulse | Pending::ImmigrationPulse => None,
        };
        if let Some(slot) = slot {
            assert_eq!(
                sim.queue.scheduled_time(id),
                Some(p.time(slot)),
                "pending candidate mismatch for {id} ({:?})",
                p.pending
            );
        }
    }

    for generator in [sim.register.birth_generator(), sim.register.immigration_generator()] {
        assert!(sim.queue.is_scheduled(generator), "generator {generator} unscheduled");
        scheduled += 1;
    }

    assert_eq!(sim.queue.len(), scheduled, "queue holds entries for no-longer-live slots");
    assert_eq!(sim.counts.total(), sim.register.live_count(), "counter drift");
}

// ── Initialisation ────────────────────────────────────────────────────────────

mod init {
    use super::*;

    #[test]
    fn initial_population_matches_census_tables() {
        let mut sim = small_sim(1);
        sim.init();
        // The synthetic tables spread people over 80 ages × 2 sexes with
        // integer counts per cell: 12/cell foreign, 50/cell native. The
        // two generator pulses fired at init add one birth (native) and
        // one immigrant (either cohort).
        let expect_foreign = (2_000 / 160) * 160;
        let expect_native = (8_000 / 160) * 160;
        assert_eq!(
            sim.register.live_count(),
            (expect_foreign + expect_native + 2) as u64
        );
        let foreign = sim.register.foreign_range().len();
        assert!(foreign == expect_foreign || foreign == expect_foreign + 1);
        audit(&sim);
    }

    #[test]
    fn clock_starts_at_t0() {
        let mut sim = small_sim(2);
        sim.init();
        assert_eq!(sim.now(), sim.params.t0);
    }

    #[test]
    fn compartments_are_populated() {
        let mut sim = small_sim(3);
        sim.init();
        use epi_pop::State;
        // The synthetic entry-state tables put ~80% uninfected, some
        // immune, and a sprinkling of infections and disease.
        assert!(sim.counts.get(State::Uninfected) > 0);
        assert!(sim.counts.get(State::Immune) > 0);
        assert!(sim.counts.get(State::RemoteInfection) > 0);
    }
}

// ── Engine invariants under dispatch ──────────────────────────────────────────

mod invariants {
    use super::*;

    #[test]
    fn one_queue_entry_per_live_person_throughout() {
        let mut sim = small_sim(4);
        sim.init();
        audit(&sim);

        for step in 0..30_000 {
            let Some((person, _te)) = sim.queue.next() else { break };
            sim.dispatch(person);
            if step % 5_000 == 0 {
                audit(&sim);
            }
        }
        audit(&sim);
    }

    #[test]
    fn clock_never_goes_backwards() {
        let mut sim = small_sim(5);
        sim.init();
        let mut last = sim.now();
        for _ in 0..20_000 {
            let Some((person, te)) = sim.queue.next() else { break };
            assert!(te >= last);
            last = te;
            sim.dispatch(person);
        }
    }
}

// ── End-to-end smoke ──────────────────────────────────────────────────────────

mod smoke {
    use super::*;

    #[test]
    fn full_run_conserves_population() {
        let mut sim = small_sim(0);
        let summary = sim.run();

        // Flow conservation: everyone who entered either left or is still
        // here.
        let entered = sim.births_total + sim.immigrations_total;
        let left = summary.deaths + sim.emigrations_total;
        let initial = sim.initial_live;
        assert_eq!(
            initial + entered - left,
            summary.final_population,
            "population flow does not balance"
        );

        // The generators fire at 1/rate intervals, so arrival totals track
        // the annual rates within a percent.
        let years = sim.params.t1 - sim.params.t0;
        let expect_births = 100.0 * years;
        let expect_immigrants = 50.0 * years;
        assert!(
            (sim.births_total as f64 - expect_births).abs() / expect_births < 0.01,
            "births {} vs {expect_births}",
            sim.births_total
        );
        assert!(
            (sim.immigrations_total as f64 - expect_immigrants).abs() / expect_immigrants < 0.01,
            "immigrations {} vs {expect_immigrants}",
            sim.immigrations_total
        );

        // Every arrival and departure was a dispatched event.
        assert!(summary.events >= sim.births_total + sim.immigrations_total + left);
        assert_eq!(sim.now().floor(), sim.params.t1 - 1.0);
        audit(&sim);
    }

    #[test]
    fn identical_seeds_replicate_exactly() {
        let a = small_sim(42).run();
        let b = small_sim(42).run();
        assert_eq!(a.events, b.events);
        assert_eq!(a.deaths, b.deaths);
        assert_eq!(a.final_population, b.final_population);
        assert_eq!(a.rates, b.rates);
    }

    #[test]
    fn different_seeds_diverge() {
        let a = small_sim(1).run();
        let b = small_sim(2).run();
        assert_ne!(a.events, b.events);
    }

    #[test]
    fn summary_dimensions_match_aggregation_window() {
        let mut sim = small_sim(7);
        let summary = sim.run();
        let y_first = sim.data.year_index(sim.params.notify_start_year);
        let cells = 3 * (sim.params.years() - y_first) * 2 * 4;
        assert_eq!(summary.rates.len(), cells);
        assert_eq!(summary.corrected_counts.len(), cells);
    }
}

// ── Step statistics ───────────────────────────────────────────────────────────

mod stats {
    use super::*;

    #[test]
    fn moments_and_extremes() {
        let mut s = StepStats::new();
        s.record(0.0, 1.0);
        s.record(1.0, 4.0);
        s.record(4.0, 6.0);
        assert_eq!(s.count(), 3.0);
        assert_eq!(s.mean(), 2.0);
        assert_eq!(s.min(), 1.0);
        assert_eq!(s.max(), 3.0);
        let rv = s.root_variance();
        assert!((rv - (2.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn fmt_years_picks_units() {
        assert_eq!(fmt_years(0.0), "0 seconds");
        assert_eq!(fmt_years(2.5), "2.5 years");
        assert_eq!(fmt_years(1.0), "1.0 year");
        assert!(fmt_years(0.5).ends_with("days"));
        assert!(fmt_years(1.0 / 365.25 / 24.0).ends_with("hour"));
        assert!(fmt_years(30.0 / 365.25 / 24.0 / 3600.0).ends_with("seconds"));
    }
}
