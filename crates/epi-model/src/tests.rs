//! Unit tests for epi-model.

use epi_core::Lcg;
use epi_pop::Sex;

use crate::data::{age_class, Dataset, Route};
use crate::dists::{
    CohortLifespan, ExponentialLifespan, GompertzLifespan, LifespanModel, RecoveryModel,
    RecoverySpread, SpreadRecovery,
};
use crate::params::{Params, PARAM_NAMES};

fn small_dataset() -> (Params, Dataset) {
    let params = Params::default();
    let data = Dataset::synthetic(&params, 10_000, 40_000, 500.0, 200.0).unwrap();
    (params, data)
}

// ── Params ────────────────────────────────────────────────────────────────────

mod params {
    use super::*;

    #[test]
    fn set_known_names() {
        let mut p = Params::default();
        assert!(p.set("pcc", 0.25));
        assert_eq!(p.pcc, 0.25);
        assert!(p.set("d1adult", 0.2));
        assert_eq!(p.risk_adult[0], 0.2);
        assert!(p.set("rd3", 0.8));
        assert_eq!(p.recovery[2], [0.8, 0.8]);
    }

    #[test]
    fn unknown_name_is_rejected() {
        let mut p = Params::default();
        assert!(!p.set("nosuchparam", 1.0));
    }

    #[test]
    fn every_registered_name_round_trips() {
        let mut p = Params::default();
        for (i, name) in PARAM_NAMES.iter().enumerate() {
            let v = 0.001 * (i + 1) as f64;
            assert!(p.set(name, v), "unregistered name {name}");
            assert_eq!(p.get(name), Some(v), "get mismatch for {name}");
        }
    }

    #[test]
    fn display_line_lists_all() {
        let p = Params::default();
        let line = p.display_line();
        for name in PARAM_NAMES {
            assert!(line.contains(&format!(" {name}=")), "missing {name}");
        }
    }
}

// ── Dataset derivation ────────────────────────────────────────────────────────

mod dataset {
    use super::*;

    #[test]
    fn age_classes_split_at_bounds() {
        assert_eq!(age_class(0.0), 0);
        assert_eq!(age_class(14.99), 0);
        assert_eq!(age_class(15.0), 1);
        assert_eq!(age_class(44.99), 1);
        assert_eq!(age_class(45.0), 2);
        assert_eq!(age_class(65.0), 3);
        assert_eq!(age_class(120.0), 3);
    }

    #[test]
    fn year_index_clamps_to_window() {
        let (_, data) = small_dataset();
        assert_eq!(data.year_index(1981.0), 0);
        assert_eq!(data.year_index(1981.9), 0);
        assert_eq!(data.year_index(1995.5), 14);
        assert_eq!(data.year_index(1900.0), 0);
        assert_eq!(data.year_index(2050.0), 28);
    }

    #[test]
    fn lifespan_is_future_and_bounded() {
        let (_, data) = small_dataset();
        let mut rng = Lcg::new(5);
        for _ in 0..2_000 {
            let age = rng.rand() * 100.0;
            let w = data.sample_lifespan(&mut rng, Sex::Female, age, 1990.0);
            assert!(w >= 0.0);
            assert!(age + w <= 122.0, "lived to {}", age + w);
        }
    }

    #[test]
    fn remote_route_onset_is_nonnegative() {
        let (_, data) = small_dataset();
        let mut rng = Lcg::new(6);
        for _ in 0..2_000 {
            let age = rng.rand() * 90.0;
            let w = data.time_to_disease(&mut rng, Route::Remote, Sex::Male, 0, age, 0.0);
            assert!(w >= 0.0);
        }
    }

    /// The recent route either fires within the five-year window or lands
    /// past the horizon — never in between.
    #[test]
    fn recent_route_is_window_or_never() {
        let (_, data) = small_dataset();
        let mut rng = Lcg::new(7);
        let horizon = 2.0 * data.years() as f64;
        for _ in 0..5_000 {
            let w = data.time_to_disease(&mut rng, Route::Recent, Sex::Male, 2, 30.0, 0.0);
            assert!(w <= 5.0 || w >= horizon, "onset at {w}");
        }
    }

    /// Time already infected shrinks both the probability and the window.
    #[test]
    fn recent_route_conditions_on_time_infected() {
        let (_, data) = small_dataset();
        let mut rng = Lcg::new(8);
        for _ in 0..5_000 {
            let w = data.time_to_disease(&mut rng, Route::Recent, Sex::Male, 2, 30.0, 3.0);
            assert!(w <= 2.0 + 1e-9 || w >= 2.0 * data.years() as f64, "onset at {w}");
        }
    }

    #[test]
    fn entry_state_encoding_in_range() {
        let (_, data) = small_dataset();
        let mut rng = Lcg::new(9);
        for _ in 0..2_000 {
            let k = data.immigrant_entry_state(&mut rng, 30, 0, 5);
            assert!(k <= 7, "entry state {k}");
            let k = data.initial_entry_state(&mut rng, 50, Sex::Female, 1);
            assert!(k <= 7, "initial state {k}");
        }
    }

    #[test]
    fn immigrant_ages_span_classes() {
        let (_, data) = small_dataset();
        let mut rng = Lcg::new(10);
        let mut seen = [false; 6];
        for _ in 0..5_000 {
            let age = data.immigrant_age(&mut rng, 3, Sex::Male, 0);
            assert!((0.0..121.0).contains(&age));
            let class = match age {
                a if a < 15.0 => 0,
                a if a < 25.0 => 1,
                a if a < 35.0 => 2,
                a if a < 45.0 => 3,
                a if a < 60.0 => 4,
                _ => 5,
            };
            seen[class] = true;
        }
        assert!(seen.iter().all(|&s| s), "classes seen: {seen:?}");
    }
}

// ── Distributions ─────────────────────────────────────────────────────────────

mod dists {
    use super::*;

    #[test]
    fn exponential_lifespan_mean() {
        let (_, data) = small_dataset();
        let model = ExponentialLifespan { rate: [0.02, 0.02] };
        let mut rng = Lcg::new(11);
        let n = 20_000;
        let mean: f64 = (0..n)
            .map(|_| model.years_remaining(&mut rng, &data, Sex::Male, 30.0, 1990.0))
            .sum::<f64>()
            / n as f64;
        // The tail guard truncates at 10/rate, pulling the mean slightly
        // under 1/rate.
        assert!((mean - 50.0).abs() < 2.5, "mean {mean}");
    }

    #[test]
    fn gompertz_lifespan_shortens_with_age() {
        let (_, data) = small_dataset();
        let model = GompertzLifespan { baseline: 1e-4, shape: 0.09, makeham: 0.0 };
        let mut rng = Lcg::new(12);
        let n = 10_000;
        let mean_at = |rng: &mut Lcg, age: f64| -> f64 {
            (0..n)
                .map(|_| model.years_remaining(rng, &data, Sex::Male, age, 1990.0))
                .sum::<f64>()
                / n as f64
        };
        let young = mean_at(&mut rng, 20.0);
        let old = mean_at(&mut rng, 70.0);
        assert!(young > old + 10.0, "young {young}, old {old}");
    }

    #[test]
    fn cohort_lifespan_matches_dataset_sampler() {
        let (_, data) = small_dataset();
        let model = CohortLifespan;
        let mut a = Lcg::new(13);
        let mut b = Lcg::new(13);
        for _ in 0..100 {
            let x = model.years_remaining(&mut a, &data, Sex::Female, 40.0, 1990.0);
            let y = data.sample_lifespan(&mut b, Sex::Female, 40.0, 1990.0);
            assert_eq!(x, y);
        }
    }

    #[test]
    fn fixed_recovery_is_mean_duration() {
        let mut rng = Lcg::new(14);
        let model = SpreadRecovery { spread: RecoverySpread::Fixed, mu: 0.0, sigma: 0.0 };
        assert_eq!(model.years_until(&mut rng, 0.5), 2.0);
    }

    #[test]
    fn spread_recovery_is_always_positive() {
        let mut rng = Lcg::new(15);
        for spread in [
            RecoverySpread::Exponential,
            RecoverySpread::Uniform,
            RecoverySpread::LogNormal,
            RecoverySpread::Gauss,
            RecoverySpread::Cauchy,
        ] {
            let model = SpreadRecovery { spread, mu: 0.0, sigma: 0.1 };
            for _ in 0..2_000 {
                assert!(model.years_until(&mut rng, 0.5) > 0.0);
            }
        }
    }
}
