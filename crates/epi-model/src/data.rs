//! The input dataset and the tables derived from it.
//!
//! All files are read once at initialisation; nothing here allocates or
//! parses during the run. Counts in the input files can be rescaled by the
//! `scale` parameter so a national dataset drives a laptop-sized run.
//!
//! # Table conventions
//!
//! Cumulative tables destined for inverse-CDF sampling carry sentinel
//! tails: the remote-progression table extends its last real value and
//! closes with probability 1 at a far-future age, so a draw that should
//! never happen lands thousands of years out instead of overflowing the
//! table. The paired age axes carry the matching sentinel entries.

use std::path::Path;

use epi_core::{check_cumulative, interp, rand_f, Lcg};
use epi_io::{read_file, Rescale, Shape, Table};
use epi_pop::Sex;

use crate::error::{ModelError, ModelResult};
use crate::params::Params;

/// Ages 0..=120 carried by the age-indexed tables.
pub const AGES: usize = 121;
/// Entries in the mortality age axis (ages 0..=121).
pub const MORT_AGES: usize = 122;
/// Entries in the remote-progression table: ages plus two sentinels.
const REMOTE_ENTRIES: usize = MORT_AGES + 2;
/// First birth-cohort year of the mortality tables.
pub const FIRST_COHORT_YEAR: f64 = 1870.0;
/// Notification age classes: 0–14, 15–44, 45–64, 65+.
pub const AGE_CLASSES: usize = 4;

/// Route into active disease, named by the source compartment.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Route {
    Recent = 0,
    Remote = 1,
    Reinfection = 2,
}

/// Notification age class of an age in years.
#[inline]
pub fn age_class(age: f64) -> usize {
    if age < 15.0 {
        0
    } else if age < 45.0 {
        1
    } else if age < 65.0 {
        2
    } else {
        3
    }
}

// ── Dataset ───────────────────────────────────────────────────────────────────

/// Every input table of a run, plus the derived progression tables.
pub struct Dataset {
    t0: f64,
    t1: f64,
    years: usize,

    // ── Demography ────────────────────────────────────────────────────────
    births_per_year: Vec<f64>,
    immigrants_per_year: Vec<f64>,
    /// Fraction of immigrants who are foreign-born, by year.
    foreign_fraction: Vec<f64>,
    /// Fraction of foreign-born immigrants from high-incidence origins.
    high_incidence_fraction: Vec<f64>,
    /// Fraction of newborns who are male.
    male_birth_fraction: Vec<f64>,
    /// Co-infection prevalence among high-incidence immigrants `(s, y)`.
    coinfection_prevalence: Table,
    /// Fraction of immigrants who are male `(y, group)`.
    immigrant_male_fraction: Table,
    /// Immigrant age-class probabilities as read `(y, s, group, class6)`.
    immigrant_age_raw: Table,

    // ── Initial population ────────────────────────────────────────────────
    /// Counts by `(age, sex, cohort)` at the first simulated year.
    initial_population: Table,
    /// High-incidence fraction of the initial foreign-born `(age, sex)`.
    initial_high_incidence: Table,
    /// Cumulative entry-state probabilities at initialisation
    /// `(age, sex, group, state9)`.
    initial_state: Table,

    // ── Infection and mortality ───────────────────────────────────────────
    /// Cumulative entry-state probabilities for immigrants
    /// `(age, group, year, state9)`.
    immigrant_state: Table,
    /// Cohort life tables: cumulative death probability
    /// `(birth cohort, sex, age)`.
    mortality: Table,
    /// Case fatality `(age, site, year)`; site 0 = non-pulmonary.
    case_fatality: Table,
    /// Smear-positive fraction by age.
    smear_positive: Vec<f64>,

    /// Observed population sizes `(age class, sex, group, year)` used to
    /// correct notification counts.
    observed_population: Table,

    // ── Derived tables ────────────────────────────────────────────────────
    /// Five-year cumulative progression risk `(sex, group, age)` for the
    /// recent and reinfection routes.
    d_recent: Table,
    d_reinf: Table,
    /// Cumulative lifetime progression `(sex, group, age + sentinels)` for
    /// the remote route.
    d_remote: Table,
    /// Cumulative immigrant age classes `(y, s, group, class7)`.
    immigrant_age_cum: Table,
    /// Relative-risk-by-year-since-infection cumulative table and its axis.
    rel_risk: [f64; 6],
    rel_risk_years: [f64; 6],
    /// Value axis for entry-state draws.
    state_values: [f64; 9],
    /// Age axes for inverse-CDF sampling.
    mort_ages: Vec<f64>,
    remote_ages: Vec<f64>,
}

impl Dataset {
    // ── Loading ───────────────────────────────────────────────────────────

    /// Read every input file from `dir` and derive the progression tables.
    pub fn load(dir: &Path, params: &Params) -> ModelResult<Dataset> {
        let years = params.years();
        let cohorts = (params.t1 - FIRST_COHORT_YEAR) as usize + 1;
        let counts: Option<Rescale> = if params.scale != 1.0 {
            Some(Rescale { mul: 1.0 / params.scale, add: 0.0, trunc: true })
        } else {
            None
        };

        let read_1d = |file: &str, rescale: Option<Rescale>| -> ModelResult<Vec<f64>> {
            let mut t = Table::zeros(Shape::new(&[('i', years)])?);
            read_file(&dir.join(file), &mut t, rescale)?;
            Ok(t.data().to_vec())
        };
        let read_nd = |file: &str, dims: &[(char, usize)], rescale: Option<Rescale>| -> ModelResult<Table> {
            let mut t = Table::zeros(Shape::new(dims)?);
            read_file(&dir.join(file), &mut t, rescale)?;
            Ok(t)
        };

        let mut data = Dataset {
            t0: params.t0,
            t1: params.t1,
            years,

            births_per_year: read_1d("births.txt", counts)?,
            immigrants_per_year: read_1d("immigration.txt", counts)?,
            foreign_fraction: read_1d("immigration_foreign.txt", None)?,
            high_incidence_fraction: read_1d("immigration_high_incidence.txt", None)?,
            male_birth_fraction: read_1d("births_male.txt", None)?,
            coinfection_prevalence: read_nd("coinfection.txt", &[('s', 2), ('y', years)], None)?,
            immigrant_male_fraction: read_nd("immigrant_sex.txt", &[('y', years), ('r', 3)], None)?,
            immigrant_age_raw: read_nd(
                "immigrant_ages.txt",
                &[('y', years), ('s', 2), ('r', 3), ('a', 6)],
                None,
            )?,

            initial_population: read_nd(
                "initial_population.txt",
                &[('a', AGES), ('s', 2), ('r', 2)],
                counts,
            )?,
            initial_high_incidence: read_nd(
                "initial_high_incidence.txt",
                &[('a', AGES), ('s', 2)],
                None,
            )?,
            initial_state: read_nd(
                "initial_states.txt",
                &[('a', AGES), ('s', 2), ('r', 3), ('q', 9)],
                None,
            )?,

            immigrant_state: read_nd(
                "immigrant_states.txt",
                &[('a', AGES), ('r', 3), ('y', years), ('q', 9)],
                None,
            )?,
            mortality: read_nd(
                "mortality.txt",
                &[('b', cohorts), ('s', 2), ('a', MORT_AGES)],
                None,
            )?,
            case_fatality: read_nd("case_fatality.txt", &[('a', AGES), ('d', 2), ('y', years)], None)?,
            smear_positive: {
                let mut t = Table::zeros(Shape::new(&[('a', AGES)])?);
                read_file(&dir.join("smear_positive.txt"), &mut t, None)?;
                t.data().to_vec()
            },
            observed_population: read_nd(
                "observed_population.txt",
                &[('a', AGE_CLASSES), ('s', 2), ('r', 3), ('y', years)],
                None,
            )?,

            d_recent: Table::zeros(Shape::new(&[('s', 2), ('r', 3), ('a', AGES)])?),
            d_reinf: Table::zeros(Shape::new(&[('s', 2), ('r', 3), ('a', AGES)])?),
            d_remote: Table::zeros(Shape::new(&[('s', 2), ('r', 3), ('a', REMOTE_ENTRIES)])?),
            immigrant_age_cum: Table::zeros(Shape::new(&[('y', years), ('s', 2), ('r', 3), ('a', 7)])?),
            rel_risk: [0.0; 6],
            rel_risk_years: [0.0; 6],
            state_values: [0.0; 9],
            mort_ages: Vec::new(),
            remote_ages: Vec::new(),
        };

        data.audit()?;
        data.derive(params)?;
        Ok(data)
    }

    /// A flat synthetic dataset for demos and end-to-end tests: uniform
    /// rates, a rectangular initial age pyramid, and mildly infectious
    /// entry-state tables. No files needed.
    pub fn synthetic(
        params: &Params,
        initial_foreign: u64,
        initial_native: u64,
        births_per_year: f64,
        immigrants_per_year: f64,
    ) -> ModelResult<Dataset> {
        let years = params.years();
        let cohorts = (params.t1 - FIRST_COHORT_YEAR) as usize + 1;

        let immigrant_state_row = [0.0, 0.70, 0.72, 0.80, 0.95, 0.97, 0.98, 0.99, 1.0];
        let initial_state_row = [0.0, 0.80, 0.82, 0.88, 0.97, 0.99, 0.993, 0.997, 1.0];

        let fill = |dims: &[(char, usize)], f: &dyn Fn(&[usize]) -> f64| -> ModelResult<Table> {
            let shape = Shape::new(dims)?;
            let mut t = Table::zeros(shape);
            let rank = t.shape().rank();
            let mut idx = vec![0usize; rank];
            loop {
                t.set(&idx, f(&idx));
                let mut level = rank;
                loop {
                    if level == 0 {
                        return Ok(t);
                    }
                    level -= 1;
                    idx[level] += 1;
                    if idx[level] < t.shape().dims()[level].len {
                        break;
                    }
                    idx[level] = 0;
                }
            }
        };

        // Spread an initial cohort evenly over ages 0..=79 and both sexes.
        let spread_ages = 80u64;
        let per_cell_f = initial_foreign / (spread_ages * 2);
        let per_cell_n = initial_native / (spread_ages * 2);

        let mut data = Dataset {
            t0: params.t0,
            t1: params.t1,
            years,

            births_per_year: vec![births_per_year; years],
            immigrants_per_year: vec![immigrants_per_year; years],
            foreign_fraction: vec![0.6; years],
            high_incidence_fraction: vec![0.3; years],
            male_birth_fraction: vec![0.5; years],
            coinfection_prevalence: fill(&[('s', 2), ('y', years)], &|_| 0.1)?,
            immigrant_male_fraction: fill(&[('y', years), ('r', 3)], &|_| 0.5)?,
            immigrant_age_raw: fill(&[('y', years), ('s', 2), ('r', 3), ('a', 6)], &|_| 1.0 / 6.0)?,

            initial_population: fill(&[('a', AGES), ('s', 2), ('r', 2)], &|idx| {
                if idx[0] < spread_ages as usize {
                    if idx[2] == 0 {
                        per_cell_f as f64
                    } else {
                        per_cell_n as f64
                    }
                } else {
                    0.0
                }
            })?,
            initial_high_incidence: fill(&[('a', AGES), ('s', 2)], &|_| 0.3)?,
            initial_state: fill(&[('a', AGES), ('s', 2), ('r', 3), ('q', 9)], &|idx| {
                initial_state_row[idx[3]]
            })?,

            immigrant_state: fill(&[('a', AGES), ('r', 3), ('y', years), ('q', 9)], &|idx| {
                immigrant_state_row[idx[3]]
            })?,
            // Deaths uniform over ages 0..=110: P(dead by a) = a/110.
            mortality: fill(&[('b', cohorts), ('s', 2), ('a', MORT_AGES)], &|idx| {
                (idx[2] as f64 / 110.0).min(1.0)
            })?,
            case_fatality: fill(&[('a', AGES), ('d', 2), ('y', years)], &|_| 0.3)?,
            smear_positive: vec![0.7; AGES],
            observed_population: fill(&[('a', AGE_CLASSES), ('s', 2), ('r', 3), ('y', years)], &|_| {
                1000.0
            })?,

            d_recent: Table::zeros(Shape::new(&[('s', 2), ('r', 3), ('a', AGES)])?),
            d_reinf: Table::zeros(Shape::new(&[('s', 2), ('r', 3), ('a', AGES)])?),
            d_remote: Table::zeros(Shape::new(&[('s', 2), ('r', 3), ('a', REMOTE_ENTRIES)])?),
            immigrant_age_cum: Table::zeros(Shape::new(&[('y', years), ('s', 2), ('r', 3), ('a', 7)])?),
            rel_risk: [0.0; 6],
            rel_risk_years: [0.0; 6],
            state_values: [0.0; 9],
            mort_ages: Vec::new(),
            remote_ages: Vec::new(),
        };

        data.audit()?;
        data.derive(params)?;
        Ok(data)
    }

    // ── Audits ────────────────────────────────────────────────────────────

    /// Verify every cumulative input table before anything samples from it.
    fn audit(&self) -> ModelResult<()> {
        let cohorts = self.mortality.shape().dims()[0].len;
        for b in 0..cohorts {
            for s in 0..2 {
                check_cumulative(self.mortality.row(&[b, s]), true, "mortality")?;
            }
        }
        for a in 0..AGES {
            for r in 0..3 {
                for y in 0..self.years {
                    check_cumulative(self.immigrant_state.row(&[a, r, y]), true, "immigrant states")?;
                }
                for s in 0..2 {
                    check_cumulative(self.initial_state.row(&[a, s, r]), true, "initial states")?;
                }
            }
        }
        Ok(())
    }

    // ── Derivation ────────────────────────────────────────────────────────

    /// Build every parameter-dependent table. Must re-run after any change
    /// to progression parameters (a fitting harness varies them per run).
    pub fn derive(&mut self, params: &Params) -> ModelResult<()> {
        const EPS: f64 = 1e-14;

        self.rel_risk_years = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        // Cumulative relative risk of progression by year since infection,
        // over the five-year window of recent (re)infection.
        self.rel_risk = [0.0, 0.604_594_921, 0.852_478_839, 0.931_076_179, 0.983_071_342, 1.0];

        for (i, v) in self.state_values.iter_mut().enumerate() {
            *v = (i + 1) as f64;
        }

        self.mort_ages = (0..MORT_AGES).map(|a| a as f64).collect();
        self.remote_ages = (0..MORT_AGES).map(|a| a as f64).collect();
        // Sentinel ages far enough out that a draw landing here never fires
        // within any run.
        self.remote_ages.push(3000.0);
        self.remote_ages.push(3001.0);

        let df = params.df.max(EPS);
        let coinf = params.coinfection_factor.max(EPS);

        // Anchor risks per route: males at 0–10 and 20+, females by ratio,
        // the child anchors converted from respiratory-only to all sites.
        let mut child = [[0.0f64; 2]; 3]; // [route][sex]
        let mut adult = [[0.0f64; 2]; 3];
        for route in 0..3 {
            child[route][0] = params.risk_child[route].max(EPS) / params.respiratory_fraction;
            adult[route][0] = params.risk_adult[route].max(EPS);
            child[route][1] = child[route][0] * params.sex_ratio[route][0];
            adult[route][1] = adult[route][0] * params.sex_ratio[route][1];
        }

        // Expand to single-year ages: constant to 10, linear 10→20,
        // constant from 20. Native first, then the multiplied groups.
        let mut remote_annual = Table::zeros(Shape::new(&[('s', 2), ('r', 3), ('a', AGES)])?);
        for s in 0..2 {
            for a in 0..AGES {
                let blend = |c: f64, ad: f64| -> f64 {
                    if a < 10 {
                        c
                    } else if a < 20 {
                        c + (a - 10) as f64 * ((ad - c) / 10.0)
                    } else {
                        ad
                    }
                };
                let native = [
                    blend(child[0][s], adult[0][s]),
                    blend(child[1][s], adult[1][s]),
                    blend(child[2][s], adult[2][s]),
                ];
                for group in 0..3 {
                    let factor = match group {
                        1 => 1.0,
                        0 => df,
                        _ => df * coinf,
                    };
                    self.d_recent.set(&[s, group, a], (native[0] * factor).min(1.0));
                    remote_annual.set(&[s, group, a], (native[1] * factor).min(1.0));
                    self.d_reinf.set(&[s, group, a], (native[2] * factor).min(1.0));
                }
            }
        }

        // Remote route: convert annual rates to a cumulative-by-age table
        // with the sentinel tail the sampler requires.
        for s in 0..2 {
            for group in 0..3 {
                let mut row = [0.0f64; REMOTE_ENTRIES];
                row[..AGES].copy_from_slice(remote_annual.row(&[s, group]));
                row[AGES] = row[AGES - 1];
                row[1] = row[0];
                for a in 2..MORT_AGES {
                    row[a] = row[a - 1] + (1.0 - row[a - 1]) * row[a];
                }
                if row[MORT_AGES - 1] > 1.0 {
                    return Err(ModelError::CumulativeOverflow(format!(
                        "remote progression, sex {s} group {group}"
                    )));
                }
                row[0] = 0.0;
                row[MORT_AGES] = row[MORT_AGES - 1];
                row[REMOTE_ENTRIES - 1] = 1.0;
                self.d_remote.row_mut(&[s, group]).copy_from_slice(&row);
            }
        }

        // Cumulative immigrant age classes: first entry 0, last forced to 1.
        for y in 0..self.years {
            for s in 0..2 {
                for group in 0..3 {
                    let mut cum = [0.0f64; 7];
                    for class in 1..7 {
                        cum[class] = cum[class - 1] + self.immigrant_age_raw.get(&[y, s, group, class - 1]);
                    }
                    cum[6] = 1.0;
                    cum[0] = 0.0;
                    self.immigrant_age_cum.row_mut(&[y, s, group]).copy_from_slice(&cum);
                }
            }
        }

        Ok(())
    }

    // ── Plain accessors ───────────────────────────────────────────────────

    #[inline]
    pub fn t0(&self) -> f64 {
        self.t0
    }

    #[inline]
    pub fn t1(&self) -> f64 {
        self.t1
    }

    #[inline]
    pub fn years(&self) -> usize {
        self.years
    }

    /// Year index of instant `t`, clamped into the run window.
    #[inline]
    pub fn year_index(&self, t: f64) -> usize {
        let y = t as i64 - self.t0 as i64;
        y.clamp(0, self.years as i64 - 1) as usize
    }

    /// A relative instant beyond any run horizon, for events that must
    /// never fire. The random fraction keeps such instants distinct.
    #[inline]
    pub fn far_future(&self, rng: &mut Lcg) -> f64 {
        2.0 * self.years as f64 + rng.rand()
    }

    pub fn births(&self, year: usize) -> f64 {
        self.births_per_year[year]
    }

    pub fn immigrants(&self, year: usize) -> f64 {
        self.immigrants_per_year[year]
    }

    pub fn foreign_fraction(&self, year: usize) -> f64 {
        self.foreign_fraction[year]
    }

    pub fn high_incidence_fraction(&self, year: usize) -> f64 {
        self.high_incidence_fraction[year]
    }

    pub fn male_birth_fraction(&self, year: usize) -> f64 {
        self.male_birth_fraction[year]
    }

    pub fn coinfection_prevalence(&self, sex: Sex, year: usize) -> f64 {
        self.coinfection_prevalence.get(&[sex.index(), year])
    }

    pub fn immigrant_male_fraction(&self, year: usize, group: usize) -> f64 {
        self.immigrant_male_fraction.get(&[year, group])
    }

    pub fn initial_population(&self, age: usize, sex: usize, cohort: usize) -> f64 {
        self.initial_population.get(&[age, sex, cohort])
    }

    pub fn initial_high_incidence(&self, age: usize, sex: Sex) -> f64 {
        self.initial_high_incidence.get(&[age, sex.index()])
    }

    pub fn case_fatality(&self, age: usize, pulmonary: bool, year: usize) -> f64 {
        self.case_fatality.get(&[age.min(AGES - 1), pulmonary as usize, year])
    }

    pub fn smear_positive(&self, age: usize) -> f64 {
        self.smear_positive[age.min(AGES - 1)]
    }

    pub fn observed_population(&self, class: usize, sex: usize, group: usize, year: usize) -> f64 {
        self.observed_population.get(&[class, sex, group, year])
    }

    // ── Sampling ──────────────────────────────────────────────────────────

    /// Remaining years until death for a person of `age` born in year
    /// `birth_year`, from the cohort life tables conditioned on the age
    /// already reached.
    pub fn sample_lifespan(&self, rng: &mut Lcg, sex: Sex, age: f64, now: f64) -> f64 {
        let cohorts = self.mortality.shape().dims()[0].len;
        let yb = ((now - age) as i64 - FIRST_COHORT_YEAR as i64).clamp(0, cohorts as i64 - 1);
        let row = self.mortality.row(&[yb as usize, sex.index()]);
        rand_f(rng, &self.mort_ages, row, age)
    }

    /// Years until progression to disease, or a far-future instant when the
    /// progression draw says it never happens.
    ///
    /// Recent and reinfection routes: the five-year cumulative risk,
    /// discounted by the share of the window already survived
    /// (`since_infection` years), decides WHETHER; the relative-risk table
    /// conditioned on `since_infection` decides WHEN. The remote route
    /// draws an age of onset from the cumulative lifetime table conditioned
    /// on current age.
    pub fn time_to_disease(
        &self,
        rng: &mut Lcg,
        route: Route,
        sex: Sex,
        group: usize,
        age: f64,
        since_infection: f64,
    ) -> f64 {
        match route {
            Route::Recent | Route::Reinfection => {
                let table = if route == Route::Recent { &self.d_recent } else { &self.d_reinf };
                let a = (age as usize).min(AGES - 1);
                let risk = table.get(&[sex.index(), group, a])
                    * (1.0 - interp(since_infection, &self.rel_risk_years, &self.rel_risk));
                if rng.rand() > risk {
                    self.far_future(rng)
                } else {
                    rand_f(rng, &self.rel_risk_years, &self.rel_risk, since_infection)
                }
            }
            Route::Remote => {
                let row = self.d_remote.row(&[sex.index(), group]);
                rand_f(rng, &self.remote_ages, row, age)
            }
        }
    }

    /// Entry state drawn for an immigrant: 0 uninfected, 1 immune,
    /// 2 recent, 3 remote, 4 reinfection, 5–7 disease via the recent,
    /// remote, and reinfection routes.
    pub fn immigrant_entry_state(&self, rng: &mut Lcg, age: usize, group: usize, year: usize) -> usize {
        let row = self.immigrant_state.row(&[age.min(AGES - 1), group, year]);
        rand_f(rng, &self.state_values, row, 1.0) as usize
    }

    /// Entry state drawn for a member of the initial population; same
    /// encoding as [`Dataset::immigrant_entry_state`].
    pub fn initial_entry_state(&self, rng: &mut Lcg, age: usize, sex: Sex, group: usize) -> usize {
        let row = self.initial_state.row(&[age.min(AGES - 1), sex.index(), group]);
        rand_f(rng, &self.state_values, row, 1.0) as usize
    }

    /// Age assigned to an arriving immigrant: a class drawn from the year's
    /// cumulative distribution, then a uniform age within the class. The
    /// open-ended 60+ class decays exponentially with a 10-year mean.
    pub fn immigrant_age(&self, rng: &mut Lcg, year: usize, sex: Sex, group: usize) -> f64 {
        let row = self.immigrant_age_cum.row(&[year, sex.index(), group]);
        let rn = rng.rand();
        if rn < row[1] {
            return rng.rand() * 15.0;
        }
        if rn < row[2] {
            return rng.rand() * 10.0 + 15.0;
        }
        if rn < row[3] {
            return rng.rand() * 10.0 + 25.0;
        }
        if rn < row[4] {
            return rng.rand() * 10.0 + 35.0;
        }
        if rn < row[5] {
            return rng.rand() * 15.0 + 45.0;
        }
        let age = rng.expon(0.10) + 60.0;
        if age >= 121.0 {
            120.0 + rng.rand()
        } else {
            age
        }
    }
}
