//! Model-layer errors: file problems surfaced by `epi-io` plus table
//! integrity failures found while deriving the progression tables.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    Io(#[from] epi_io::IoError),

    #[error(transparent)]
    Core(#[from] epi_core::CoreError),

    #[error("E754  a cumulative table has gone beyond 1 ({0})")]
    CumulativeOverflow(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
