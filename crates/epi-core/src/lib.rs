//! `epi-core` — foundational types for the `rust_epi` simulator.
//!
//! This crate is a dependency of every other `epi-*` crate. It intentionally
//! has no `epi-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`).
//!
//! # What lives here
//!
//! | Module      | Contents                                                |
//! |-------------|---------------------------------------------------------|
//! | [`ids`]     | `PersonId`                                              |
//! | [`rng`]     | `Lcg` random stream, derived distributions, seed chaining |
//! | [`table`]   | interpolation, binary bracket, inverse-CDF sampling     |
//! | [`error`]   | `CoreError`, `CoreResult`, the `fatal` diagnostic       |
//!
//! Simulated time is plain `f64` years throughout the workspace: events are
//! dispatched in continuous time with arbitrarily fine resolution, so there
//! is no tick unit to wrap.

pub mod error;
pub mod ids;
pub mod rng;
pub mod table;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{fatal, CoreError, CoreResult};
pub use ids::PersonId;
pub use rng::{Lcg, NEXT_SEED_FILE};
pub use table::{check_cumulative, interp, locate, rand_f};
