//! `epi-schedule` — the event scheduler of the `rust_epi` simulator.
//!
//! # Crate layout
//!
//! | Module    | Contents                                              |
//! |-----------|-------------------------------------------------------|
//! | [`queue`] | `EventQueue`: schedule/cancel/renumber/next, profile  |
//! | [`sort`]  | stable merge sort over a linked index list            |
//!
//! # Operation summary
//!
//! The queue holds at most one entry per person. A dispatch loop looks like:
//!
//! ```rust
//! use epi_core::PersonId;
//! use epi_schedule::EventQueue;
//!
//! let mut q = EventQueue::new(100, 128, 20.0);
//! q.start_time(1981.0);
//! q.schedule(PersonId(1), 1983.25);
//! q.schedule(PersonId(2), 1981.5);
//! while let Some((person, te)) = q.next() {
//!     assert_eq!(q.now(), te);
//!     let _ = person; // dispatch to the handler for this person
//! }
//! ```

pub mod queue;
pub mod sort;


pub use queue::{EventQueue, Profile, DEFAULT_CYCLE_YEARS};
pub use sort::sort_list;
