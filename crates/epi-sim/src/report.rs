//! Run reporting: periodic status lines, the mid-year census, and the
//! closing summary with notification aggregation and correction.

use std::io::Write as _;
use std::path::Path;
use std::time::Instant;

use epi_model::{age_class, AGE_CLASSES};
use epi_pop::State;

use crate::sim::{RunSummary, Simulation};
use crate::stats::fmt_years;

// ── Reporter ──────────────────────────────────────────────────────────────────

/// Drives the periodic output of a run. One per [`Simulation::run`] call.
pub struct Reporter {
    interval: f64,
    last: f64,
    first_done: bool,
    started: Instant,
    last_census_year: i64,
}

impl Reporter {
    pub fn new(interval: f64) -> Reporter {
        Reporter {
            interval,
            last: f64::NEG_INFINITY,
            first_done: false,
            started: Instant::now(),
            last_census_year: i64::MIN,
        }
    }

    #[inline]
    pub fn last_report(&self) -> f64 {
        self.last
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Print one status line (preceded, the first time, by the run
    /// preamble), update the census when mid-year, and clear the
    /// since-last-report tallies.
    pub fn report(&mut self, sim: &mut Simulation) {
        if !self.first_done {
            self.first_done = true;
            self.preamble(sim);
        }

        let t = sim.now();
        let total = sim.counts.total() as f64;
        let z = if total > 0.0 { total } else { 1.0 };

        let mut line = format!("|{t:6.1}|{total:8.0}");
        for state in State::ALL {
            line.push_str(&format!("|{:.6}", sim.counts.get(state) as f64 / z));
        }
        for state in State::ALL {
            line.push_str(&format!("|{:8}", sim.counts.get(state)));
        }
        line.push_str(&format!(
            "|{:8}|{:8}|{:5.0}",
            sim.deaths_since_report,
            sim.events_since_report,
            self.elapsed_secs()
        ));
        println!("{line}");

        eprint!("  {t:.1}\r");
        let _ = std::io::stderr().flush();

        sim.deaths_since_report = 0;
        sim.events_since_report = 0;

        self.last = t;
        self.census(sim);
    }

    fn preamble(&self, sim: &Simulation) {
        println!("Dataset:     Individual-based TB transmission run");
        println!("Sequence:    {}", sim.start_seed());
        println!("{}", sim.params.display_line());
        println!();

        print!("{}", sim.queue.profile("Initial"));
        println!();

        println!("Label t:       Time, in years and fractions thereof.");
        println!("Label N:       Total population size.");
        println!("Label U..D6:   Prevalence, then count, per compartment.");
        println!("Label Deaths:  Deaths since the last report.");
        println!("Label Events:  Events dispatched since the last report.");
        println!("Label Elapsed: Wall-clock seconds so far.");
        println!();

        let mut header = String::from("|t     |N       ");
        for state in State::ALL {
            header.push_str(&format!("|{:<8}", state.label()));
        }
        for state in State::ALL {
            header.push_str(&format!("|{:<8}", state.label()));
        }
        header.push_str("|Deaths  |Events  |Elapsed");
        println!("{header}");
    }

    /// Mid-year population census by age class, sex, and origin group,
    /// for the years whose notifications are aggregated. Taken at most
    /// once per calendar year, from the report nearest mid-year.
    fn census(&mut self, sim: &mut Simulation) {
        let t = sim.now();
        let year_cal = t as i64;
        let frac = t - year_cal as f64;

        if !(0.3..0.7).contains(&frac)
            || (year_cal as f64) < sim.params.notify_start_year
            || year_cal <= self.last_census_year
        {
            return;
        }
        self.last_census_year = year_cal;

        let y = sim.data.year_index(t);
        let ids: Vec<_> = sim.register.live_ids().collect();
        for id in ids {
            let p = sim.register.person(id);
            let cell = [age_class(p.age(t)), p.sex.index(), p.origin_group(), y];
            let v = sim.census.get(&cell) + 1.0;
            sim.census.set(&cell, v);
        }
    }

    /// The closing summary. Prints queue profile, timing and age
    /// statistics, memory use, then the notification rates and corrected
    /// counts, and returns the aggregates.
    pub fn finish(&mut self, sim: &mut Simulation) -> RunSummary {
        println!();
        print!("{}", sim.queue.profile("Final"));
        println!();

        let s = &sim.steps;
        if s.count() > 0.0 {
            println!(
                "Time steps:      Mean {}, Min {}, Max {}, SD {}, N {:.0}",
                fmt_years(s.mean()),
                fmt_years(s.min()),
                fmt_years(s.max()),
                fmt_years(s.root_variance()),
                s.count()
            );
        }

        if sim.age_n > 0.0 {
            let mean = sim.age_sum / sim.age_n;
            let sd = (sim.age_sq_sum / sim.age_n - mean * mean).max(0.0).sqrt();
            println!(
                "At death:        Mean age {mean:.1}, SD {sd:.1}, N {:.0}",
                sim.age_n
            );
        }

        println!();
        println!(
            "Memory usage:    {:.2} gigabytes",
            sim.memory_bytes() as f64 / (1024.0 * 1024.0 * 1024.0)
        );
        if let Some(usage) = memory_stats::memory_stats() {
            println!(
                "Resident set:    {:.0} MB",
                usage.physical_mem as f64 / (1024.0 * 1024.0)
            );
        }
        println!(
            "Elapsed time:    {}",
            fmt_years(self.elapsed_secs() / 60.0 / 60.0 / 24.0 / 365.25)
        );
        eprintln!();

        self.aggregate(sim)
    }

    /// Notification rates per 100 000, then counts corrected by the
    /// observed/model population ratio. Printed `|`-separated so the
    /// blocks can be pulled out of a log with grep.
    fn aggregate(&self, sim: &mut Simulation) -> RunSummary {
        let years = sim.params.years();
        let y_first = sim.data.year_index(sim.params.notify_start_year);

        let mut rates = Vec::new();
        println!("Notification rates by origin, year, sex, and age class");
        println!("M,0-14\tM,15-44\tM,45-64\tM,65+\tF,0-14\tF,15-44\tF,45-64\tF,65+");
        println!();
        for r in 0..3 {
            for y in y_first..years {
                for s in 0..2 {
                    for a in 0..AGE_CLASSES {
                        let cases = sim.notifications.get(&[a, s, r, 0, y])
                            + sim.notifications.get(&[a, s, r, 1, y]);
                        let pop = sim.census.get(&[a, s, r, y]);
                        let w = if pop > 0.0 { 100_000.0 * cases / pop } else { 0.0 };
                        print!("|{w} ");
                        rates.push(w);
                    }
                }
                println!();
            }
            println!();
        }

        // Correct the model's counts by the ratio of observed to modelled
        // population in each cell.
        for y in y_first..years {
            for r in 0..3 {
                for s in 0..2 {
                    for a in 0..AGE_CLASSES {
                        let pop = sim.census.get(&[a, s, r, y]).max(1.0);
                        let ratio = sim.data.observed_population(a, s, r, y) / pop;
                        for d in 0..2 {
                            let v = sim.notifications.get(&[a, s, r, d, y]) * ratio;
                            sim.notifications.set(&[a, s, r, d, y], v);
                        }
                    }
                }
            }
        }

        let mut corrected = Vec::new();
        println!("Corrected notifications by origin, year, sex, and age class");
        println!("M,0-14\tM,15-44\tM,45-64\tM,65+\tF,0-14\tF,15-44\tF,45-64\tF,65+");
        println!();
        for r in 0..3 {
            for y in y_first..years {
                for s in 0..2 {
                    for a in 0..AGE_CLASSES {
                        let w = sim.notifications.get(&[a, s, r, 0, y])
                            + sim.notifications.get(&[a, s, r, 1, y]);
                        print!("|{w} ");
                        corrected.push(w);
                    }
                }
                println!();
            }
            println!();
        }

        RunSummary {
            rates,
            corrected_counts: corrected,
            events: sim.events_total,
            deaths: sim.deaths_total,
            final_population: sim.counts.total(),
        }
    }
}

/// Write the corrected notification table as CSV, one row per
/// (origin group, year, sex, age class) cell of the summary.
pub fn write_notifications_csv(
    sim: &Simulation,
    summary: &RunSummary,
    path: &Path,
) -> csv::Result<()> {
    let mut w = csv::Writer::from_path(path)?;
    w.write_record(["origin", "year", "sex", "age_class", "rate_per_100k", "corrected_cases"])?;

    let years = sim.params.years();
    let y_first = sim.data.year_index(sim.params.notify_start_year);
    let mut i = 0;
    for r in 0..3 {
        for y in y_first..years {
            for s in 0..2 {
                for a in 0..AGE_CLASSES {
                    w.write_record(&[
                        r.to_string(),
                        (sim.params.t0 as usize + y).to_string(),
                        s.to_string(),
                        a.to_string(),
                        summary.rates[i].to_string(),
                        summary.corrected_counts[i].to_string(),
                    ])?;
                    i += 1;
                }
            }
        }
    }
    w.flush()?;
    Ok(())
}
