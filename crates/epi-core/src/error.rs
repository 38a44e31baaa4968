//! Core error type and the numbered diagnostic convention.
//!
//! Diagnostics carry three-digit codes in severity bands:
//!
//! | Band    | Meaning                                      |
//! |---------|----------------------------------------------|
//! | 300–499 | Warning — reported once, processing continues |
//! | 500–799 | Fatal, likely induced by data                 |
//! | 800–999 | Fatal, likely induced by a program defect     |
//!
//! Data-induced failures are ordinary `Result` errors so callers can attach
//! file and line context on the way out. Program-defect failures (scheduling
//! in the past, broken queue links, negative counters) panic through
//! [`fatal`]: there is no retry and no partial progress, because a simulator
//! that continues past a broken invariant produces nonsense output that
//! looks like data.

use thiserror::Error;

/// The top-level error type for `epi-core` and a common base for the other
/// crates. Sub-crates define their own enums and either convert into this or
/// wrap it as one variant.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("E621  a cumulative table is not monotonically increasing ({context}, entry {index})")]
    TableNotMonotone { context: String, index: usize },

    #[error("E622  a cumulative table is not bounded by 0 and 1 ({context})")]
    TableNotBounded { context: String },

    #[error("E510  the file cannot be opened ({0})")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for the `epi-*` crates.
pub type CoreResult<T> = Result<T, CoreError>;

/// Abort on a broken invariant, with a banded diagnostic code.
///
/// Never returns: once an invariant is broken the in-memory state cannot be
/// trusted, so the process must stop before writing further output.
#[cold]
pub fn fatal(code: u32, detail: &str) -> ! {
    panic!("E{code}  {detail}");
}
