//! `epi-model` — parameters, input data, and distributions.
//!
//! | Module     | Contents                                                  |
//! |------------|-----------------------------------------------------------|
//! | [`params`] | `Params` with defaults and the command-line name registry |
//! | [`data`]   | `Dataset`: input tables, derived tables, sampling helpers |
//! | [`dists`]  | configuration-selected lifespan/emigration/recovery models|
//! | [`error`]  | `ModelError`                                              |

pub mod data;
pub mod dists;
pub mod error;
pub mod params;

#[cfg(test)]
mod tests;

pub use data::{age_class, Dataset, Route, AGES, AGE_CLASSES};
pub use dists::{
    CohortLifespan, EmigrationModel, ExponentialEmigration, ExponentialLifespan, GompertzLifespan,
    LifespanModel, RecoveryModel, RecoverySpread, SpreadRecovery,
};
pub use error::{ModelError, ModelResult};
pub use params::{Params, PARAM_NAMES};
