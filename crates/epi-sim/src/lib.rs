//! `epi-sim` — the transition engine and driver of the `rust_epi`
//! simulator.
//!
//! | Module         | Contents                                            |
//! |----------------|-----------------------------------------------------|
//! | [`sim`]        | `Simulation` context, dispatch loop, initial setup  |
//! | [`handlers`]   | the event handlers (birth … case report)            |
//! | [`generators`] | birth and immigration pseudo-person pulses          |
//! | [`report`]     | periodic status lines, census, closing summary      |
//! | [`stats`]      | time-step statistics                                |
//!
//! A complete run:
//!
//! ```rust,ignore
//! let params = Params::default();
//! let data = Dataset::load(Path::new("data"), &params)?;
//! let mut rng = Lcg::new(0);
//! let mut sim = Simulation::new(params, data, rng)?;
//! let summary = sim.run();
//! ```

pub mod generators;
pub mod handlers;
pub mod report;
pub mod sim;
pub mod stats;

#[cfg(test)]
mod tests;

pub use report::{write_notifications_csv, Reporter};
pub use sim::{RunSummary, Simulation, EPSILON};
pub use stats::{fmt_years, StepStats};
