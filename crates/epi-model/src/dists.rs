//! Configuration-selected sampling distributions.
//!
//! The model seams where a distribution is a run-time choice are expressed
//! as small traits with one sampling method each, so a calibration run can
//! swap the lifespan source (constant hazard for ODE cross-checks, Gompertz
//! for closed-form work, cohort life tables for production) without
//! touching the handlers.

use epi_core::Lcg;
use epi_pop::Sex;

use crate::data::Dataset;

// ── Lifespan ──────────────────────────────────────────────────────────────────

/// Source of remaining-lifetime draws.
pub trait LifespanModel {
    /// Years until death for a person of `age` at instant `now`.
    fn years_remaining(&self, rng: &mut Lcg, data: &Dataset, sex: Sex, age: f64, now: f64) -> f64;
}

/// Constant hazard of death, by sex. Matches ordinary-differential-equation
/// formulations; used for calibration, not production.
pub struct ExponentialLifespan {
    pub rate: [f64; 2],
}

impl LifespanModel for ExponentialLifespan {
    fn years_remaining(&self, rng: &mut Lcg, _data: &Dataset, sex: Sex, _age: f64, _now: f64) -> f64 {
        rng.expon(self.rate[sex.index()])
    }
}

/// Gompertz–Makeham mortality: hazard `a·e^{b·age} + c`.
///
/// The Gompertz part inverts in closed form conditioned on the age already
/// reached; the Makeham term is an independent competing exponential, so
/// the minimum of the two draws has exactly the summed hazard.
pub struct GompertzLifespan {
    /// Baseline hazard `a` at age 0.
    pub baseline: f64,
    /// Exponential slope `b` of hazard with age.
    pub shape: f64,
    /// Age-independent hazard `c` (0 for pure Gompertz).
    pub makeham: f64,
}

impl LifespanModel for GompertzLifespan {
    fn years_remaining(&self, rng: &mut Lcg, _data: &Dataset, _sex: Sex, age: f64, _now: f64) -> f64 {
        let mut u = rng.rand();
        while u == 0.0 {
            u = rng.rand();
        }
        let hazard_at_age = self.baseline * (self.shape * age).exp();
        let gompertz = (1.0 + self.shape * (-u.ln()) / hazard_at_age).ln() / self.shape;
        if self.makeham > 0.0 {
            gompertz.min(rng.expon(self.makeham))
        } else {
            gompertz
        }
    }
}

/// Cohort life tables: inverse-CDF over the empirical cumulative mortality
/// of the person's birth cohort, conditioned on current age.
pub struct CohortLifespan;

impl LifespanModel for CohortLifespan {
    fn years_remaining(&self, rng: &mut Lcg, data: &Dataset, sex: Sex, age: f64, now: f64) -> f64 {
        data.sample_lifespan(rng, sex, age, now)
    }
}

// ── Emigration ────────────────────────────────────────────────────────────────

/// Source of time-until-emigration draws. Many draws land beyond the run
/// horizon or the person's death; those persons simply never emigrate.
pub trait EmigrationModel {
    fn years_until(&self, rng: &mut Lcg, annual_rate: f64) -> f64;
}

/// Constant annual emigration hazard.
pub struct ExponentialEmigration;

impl EmigrationModel for ExponentialEmigration {
    fn years_until(&self, rng: &mut Lcg, annual_rate: f64) -> f64 {
        rng.expon(annual_rate)
    }
}

// ── Recovery ──────────────────────────────────────────────────────────────────

/// Shape of the disease-duration distribution around the mean `1/rate`.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub enum RecoverySpread {
    /// Memoryless duration (completely random).
    #[default]
    Exponential,
    /// Everyone recovers at exactly the mean.
    Fixed,
    /// Uniform variation of ±`sigma` around the mean.
    Uniform,
    /// Lognormal variation with parameters (`mu`, `sigma`).
    LogNormal,
    /// Gaussian variation with SD `sigma`, truncated positive.
    Gauss,
    /// Cauchy variation with half-width `sigma`, truncated positive.
    Cauchy,
}

/// Source of time-until-recovery draws for diseased persons.
pub trait RecoveryModel {
    fn years_until(&self, rng: &mut Lcg, rate: f64) -> f64;
}

/// Recovery after `1/rate` years plus the configured spread, floored at a
/// slight positive delay so recovery can never precede onset.
pub struct SpreadRecovery {
    pub spread: RecoverySpread,
    pub mu: f64,
    pub sigma: f64,
}

impl Default for SpreadRecovery {
    fn default() -> Self {
        SpreadRecovery { spread: RecoverySpread::Exponential, mu: 0.0, sigma: 0.1 }
    }
}

impl RecoveryModel for SpreadRecovery {
    fn years_until(&self, rng: &mut Lcg, rate: f64) -> f64 {
        let w = match self.spread {
            RecoverySpread::Exponential => return rng.expon(rate),
            RecoverySpread::Fixed => 0.0,
            RecoverySpread::Uniform => rng.uniform(-self.sigma, self.sigma),
            RecoverySpread::LogNormal => rng.lognormal(self.mu, self.sigma),
            RecoverySpread::Gauss => rng.gauss(0.0, self.sigma),
            RecoverySpread::Cauchy => rng.cauchy(0.0, self.sigma),
        };
        (w + 1.0 / rate).max(1e-9)
    }
}
