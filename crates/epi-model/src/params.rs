//! Model parameters.
//!
//! Every parameter has a built-in default; the command line overrides them
//! through the name registry in [`Params::set`]. Array-valued parameters
//! register one name per element so a fitting harness can vary any of them
//! independently.
//!
//! Index conventions: sex arrays are `[male, female]`; group arrays are
//! `[foreign, native]` or `[foreign, native, high-incidence]`; disease-route
//! arrays are `[primary, reactivation, reinfection]` with the non-pulmonary
//! duals at `[3..6]` where six entries exist.

/// All run-time parameters of the model.
#[derive(Clone, Debug)]
pub struct Params {
    // ── Run window ────────────────────────────────────────────────────────
    /// First simulated year.
    pub t0: f64,
    /// Horizon; the run ends before this year.
    pub t1: f64,
    /// Population scale divisor applied to count-valued input files
    /// (1 = full national scale).
    pub scale: f64,
    /// Register capacity at full scale (divided by `scale` when sizing).
    pub capacity: f64,
    /// Slots reserved for the foreign-born cohort at full scale.
    pub max_foreign: f64,
    /// First year notifications are aggregated and the census taken.
    pub notify_start_year: f64,

    // ── Transmission ──────────────────────────────────────────────────────
    /// Effective contacts per year per smear-positive pulmonary case,
    /// by `[sex][cohort]`.
    pub contacts: [[f64; 2]; 2],
    /// Probability an effective contact is a close contact, drawn from the
    /// source's own cohort.
    pub pcc: f64,

    // ── Vaccination ───────────────────────────────────────────────────────
    /// Vaccine efficacy by cohort.
    pub vaccine_efficacy: [f64; 2],
    /// Coverage at the target age, by cohort.
    pub vaccine_coverage: [f64; 2],
    /// Target age of vaccination, by cohort.
    pub vaccine_age: [f64; 2],
    /// Births from this year on are no longer vaccinated.
    pub vaccine_end_year: f64,
    /// Immigrant catch-up vaccination stops at this year.
    pub vaccine_catchup_end: f64,

    // ── Infection course ──────────────────────────────────────────────────
    /// Years from a recent (re)infection to remote infection.
    pub latency_years: f64,
    /// Recovery rate per disease compartment `[route 0..6][sex]`.
    pub recovery: [[f64; 2]; 6],
    /// Strain mutation rate while merely infected.
    pub mutation_infected: f64,
    /// Strain mutation rate while diseased.
    pub mutation_diseased: f64,

    // ── Disease progression ───────────────────────────────────────────────
    /// Risk anchors for males at ages 0–10 and 20+, per route.
    /// Recent and reinfection anchors are five-year cumulative risks;
    /// reactivation anchors are annual rates.
    pub risk_child: [f64; 3],
    pub risk_adult: [f64; 3],
    /// Female:male risk ratios `[route][child, adult]`.
    pub sex_ratio: [[f64; 2]; 3],
    /// Multiplier from native-born to foreign-born risks.
    pub df: f64,
    /// Further multiplier for the co-infected group.
    pub coinfection_factor: f64,
    /// Fraction of all disease that is respiratory; converts the
    /// respiratory-only child anchors to all-site risks.
    pub respiratory_fraction: f64,
    /// Fraction of disease that is pulmonary, by `[sex][cohort]`.
    pub pulmonary_fraction: [[f64; 2]; 2],

    // ── Demography ────────────────────────────────────────────────────────
    /// Annual emigration rate by `[sex][origin group]`.
    pub emigration: [[f64; 3]; 2],

    // ── Reporting ─────────────────────────────────────────────────────────
    /// Fraction of cases notified.
    pub report_fraction: f64,
    /// Years between status reports.
    pub tgap: f64,

    // ── Random stream ─────────────────────────────────────────────────────
    /// ≥0 seeds deterministically; <0 derives a time-based seed offset by
    /// the magnitude.
    pub randseq: f64,
    /// Nonzero: chain the stream through the next-seed file.
    pub nextseed: f64,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            t0: 1981.0,
            t1: 2010.0,
            scale: 1.0,
            capacity: 75_000_000.0,
            max_foreign: 10_000_000.0,
            notify_start_year: 1999.0,

            contacts: [[6.0, 6.0], [6.0, 6.0]],
            pcc: 0.50,

            vaccine_efficacy: [0.71, 0.71],
            vaccine_coverage: [0.80, 0.80],
            vaccine_age: [13.0, 13.0],
            vaccine_end_year: 1993.0,
            vaccine_catchup_end: 2005.0,

            latency_years: 5.0,
            recovery: [[0.5, 0.5]; 6],
            mutation_infected: 0.1 * 0.01,
            mutation_diseased: 0.01,

            risk_child: [0.0406, 0.000_000_000_982, 0.0689],
            risk_adult: [0.138, 0.000_299, 0.0825],
            sex_ratio: [
                [1.0, 1.0],
                [1.0, 0.000_048 / 0.000_299],
                [1.0, 0.0001 / 0.0825],
            ],
            df: 2.0,
            coinfection_factor: 7.0,
            respiratory_fraction: 0.77,
            pulmonary_fraction: [
                [0.528_236_447, 0.468_333_833],
                [0.740_686_033, 0.672_633_119],
            ],

            emigration: [
                [0.028_88, 0.002_80, 0.020_09],
                [0.026_56, 0.002_25, 0.015_28],
            ],

            report_fraction: 0.75,
            tgap: 0.5,

            randseq: 0.0,
            nextseed: 0.0,
        }
    }
}

/// Registered parameter names, in display order.
pub const PARAM_NAMES: &[&str] = &[
    "randseq", "nextseed", "scale", "capacity", "maxforeign", "tgap", "pcc", "proprep", "df",
    "ehiv", "presp", "latency",
    "cmf", "cmn", "cff", "cfn", "v1f", "v1n", "v2f", "v2n", "v3f", "v3n", "mi", "md",
    "d1child", "d1adult", "d2child", "d2adult", "d3child", "d3adult",
    "rd1", "rd2", "rd3", "rd4", "rd5", "rd6",
    "emf", "emn", "emh", "eff", "efn", "efh",
];

impl Params {
    /// Set a registered parameter by name. Returns `false` for unknown
    /// names so the caller can report and skip.
    pub fn set(&mut self, name: &str, value: f64) -> bool {
        match name {
            "randseq" => self.randseq = value,
            "nextseed" => self.nextseed = value,
            "scale" => self.scale = value,
            "capacity" => self.capacity = value,
            "maxforeign" => self.max_foreign = value,
            "tgap" => self.tgap = value,
            "pcc" => self.pcc = value,
            "proprep" => self.report_fraction = value,
            "df" => self.df = value,
            "ehiv" => self.coinfection_factor = value,
            "presp" => self.respiratory_fraction = value,
            "latency" => self.latency_years = value,

            "cmf" => self.contacts[0][0] = value,
            "cmn" => self.contacts[0][1] = value,
            "cff" => self.contacts[1][0] = value,
            "cfn" => self.contacts[1][1] = value,

            "v1f" => self.vaccine_efficacy[0] = value,
            "v1n" => self.vaccine_efficacy[1] = value,
            "v2f" => self.vaccine_coverage[0] = value,
            "v2n" => self.vaccine_coverage[1] = value,
            "v3f" => self.vaccine_age[0] = value,
            "v3n" => self.vaccine_age[1] = value,

            "mi" => self.mutation_infected = value,
            "md" => self.mutation_diseased = value,

            "d1child" => self.risk_child[0] = value,
            "d1adult" => self.risk_adult[0] = value,
            "d2child" => self.risk_child[1] = value,
            "d2adult" => self.risk_adult[1] = value,
            "d3child" => self.risk_child[2] = value,
            "d3adult" => self.risk_adult[2] = value,

            "rd1" => self.recovery[0] = [value, value],
            "rd2" => self.recovery[1] = [value, value],
            "rd3" => self.recovery[2] = [value, value],
            "rd4" => self.recovery[3] = [value, value],
            "rd5" => self.recovery[4] = [value, value],
            "rd6" => self.recovery[5] = [value, value],

            "emf" => self.emigration[0][0] = value,
            "emn" => self.emigration[0][1] = value,
            "emh" => self.emigration[0][2] = value,
            "eff" => self.emigration[1][0] = value,
            "efn" => self.emigration[1][1] = value,
            "efh" => self.emigration[1][2] = value,

            _ => return false,
        }
        true
    }

    /// Current value of a registered parameter.
    pub fn get(&self, name: &str) -> Option<f64> {
        Some(match name {
            "randseq" => self.randseq,
            "nextseed" => self.nextseed,
            "scale" => self.scale,
            "capacity" => self.capacity,
            "maxforeign" => self.max_foreign,
            "tgap" => self.tgap,
            "pcc" => self.pcc,
            "proprep" => self.report_fraction,
            "df" => self.df,
            "ehiv" => self.coinfection_factor,
            "presp" => self.respiratory_fraction,
            "latency" => self.latency_years,

            "cmf" => self.contacts[0][0],
            "cmn" => self.contacts[0][1],
            "cff" => self.contacts[1][0],
            "cfn" => self.contacts[1][1],

            "v1f" => self.vaccine_efficacy[0],
            "v1n" => self.vaccine_efficacy[1],
            "v2f" => self.vaccine_coverage[0],
            "v2n" => self.vaccine_coverage[1],
            "v3f" => self.vaccine_age[0],
            "v3n" => self.vaccine_age[1],

            "mi" => self.mutation_infected,
            "md" => self.mutation_diseased,

            "d1child" => self.risk_child[0],
            "d1adult" => self.risk_adult[0],
            "d2child" => self.risk_child[1],
            "d2adult" => self.risk_adult[1],
            "d3child" => self.risk_child[2],
            "d3adult" => self.risk_adult[2],

            "rd1" => self.recovery[0][0],
            "rd2" => self.recovery[1][0],
            "rd3" => self.recovery[2][0],
            "rd4" => self.recovery[3][0],
            "rd5" => self.recovery[4][0],
            "rd6" => self.recovery[5][0],

            "emf" => self.emigration[0][0],
            "emn" => self.emigration[0][1],
            "emh" => self.emigration[0][2],
            "eff" => self.emigration[1][0],
            "efn" => self.emigration[1][1],
            "efh" => self.emigration[1][2],

            _ => return None,
        })
    }

    /// One line listing every registered parameter, for run records: a run
    /// is replicable from its output plus the input files.
    pub fn display_line(&self) -> String {
        let mut line = String::from("Parameters:");
        for name in PARAM_NAMES {
            line.push_str(&format!(" {}={}", name, self.get(name).unwrap()));
        }
        line
    }

    /// Simulated years in the run window.
    #[inline]
    pub fn years(&self) -> usize {
        (self.t1 - self.t0) as usize
    }
}
