//! `smoke` — a complete run on synthetic data, no input files needed.
//!
//! A flat-rate population of ~50 000 people simulated over 29 years:
//! useful as a first check that the whole engine hangs together, and as a
//! template for wiring the simulator into other drivers.
//!
//! Run with:
//!   cargo run -p smoke --release

use anyhow::Result;

use epi_core::Lcg;
use epi_model::{Dataset, Params};
use epi_sim::Simulation;

fn main() -> Result<()> {
    let mut params = Params::default();
    params.capacity = 120_000.0;
    params.max_foreign = 40_000.0;
    params.scale = 1.0;
    params.tgap = 1.0;

    let data = Dataset::synthetic(&params, 10_000, 40_000, 500.0, 200.0)?;
    let mut sim = Simulation::new(params, data, Lcg::new(0))?;

    let summary = sim.run();

    println!();
    println!(
        "Smoke run done: {} events dispatched, {} deaths, final population {}.",
        summary.events, summary.deaths, summary.final_population
    );
    Ok(())
}
