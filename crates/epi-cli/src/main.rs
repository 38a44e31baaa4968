//! `tbsim` — run the individual-based TB transmission model.
//!
//! Usage:
//!
//! ```text
//! tbsim [DATADIR] [NAME=VALUE ...]
//! ```
//!
//! DATADIR holds the Centinel input files (default: the working
//! directory). The random stream is selected by `randseq`: zero or a
//! positive integer gives a fixed, repeatable sequence; a negative value
//! derives a seed from the clock and offsets it by the magnitude, so
//! simultaneously launched jobs with `randseq=-1`, `randseq=-2`, … are
//! guaranteed distinct streams. `nextseed=1` chains runs through the
//! next-seed file instead.
//!
//! Exit codes: 0 success, 3 fatal error. Invariant violations abort with
//! a panic (run with `RUST_BACKTRACE=1` for the stack trace).

mod args;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;

use epi_core::{Lcg, NEXT_SEED_FILE};
use epi_model::{Dataset, Params};
use epi_sim::{write_notifications_csv, Simulation};

// The register is a single huge allocation and the per-run churn is tiny,
// but a fragmentation-prone system allocator still hurts the long tables.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::from(3)
        }
    }
}

fn run() -> anyhow::Result<()> {
    let argv: Vec<String> = std::env::args().skip(1).collect();

    // The first bare argument (no '=') names the data directory.
    let data_dir: PathBuf = argv
        .iter()
        .find(|a| !a.contains('='))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut params = Params::default();
    args::apply_args(&mut params, argv.iter().map(String::as_str).filter(|a| a.contains('=')));

    let mut rng = Lcg::new(0);
    if params.nextseed != 0.0 {
        let found = rng.start_next(Path::new(NEXT_SEED_FILE));
        if !found {
            println!("No next-seed file; starting from an arbitrary seed.");
        }
    } else if params.randseq >= 0.0 {
        rng.start(params.randseq as u32);
    } else {
        rng.start_arbitrary(params.randseq.abs() as u32);
    }

    let data = Dataset::load(&data_dir, &params)
        .with_context(|| format!("reading input files from {}", data_dir.display()))?;
    let chain = params.nextseed != 0.0;

    let mut sim = Simulation::new(params, data, rng)?;
    let summary = sim.run();

    write_notifications_csv(&sim, &summary, Path::new("notifications.csv"))
        .context("writing notifications.csv")?;

    if chain {
        sim.rng
            .stop_next(Path::new(NEXT_SEED_FILE))
            .context("writing the next-seed file")?;
    }

    println!(
        "Run complete: {} events, {} deaths, final population {}.",
        summary.events, summary.deaths, summary.final_population
    );
    Ok(())
}
