//! Strongly typed, zero-cost identifier wrappers.
//!
//! `PersonId` is `Copy + Ord + Hash` so it can be used as a map key and a
//! sorted-collection element without ceremony. The inner integer is `pub` to
//! allow direct indexing into dense `Vec`s via `id.0 as usize`, but callers
//! should prefer the `.index()` helper for clarity.
//!
//! Person numbering starts at 1: index 0 is reserved as the event queue's
//! list terminator and never names a person.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID" — equivalent to the type maximum.
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }
    };
}

typed_id! {
    /// Index of a person in the population register, starting at 1.
    /// Max ~4.3 billion people.
    pub struct PersonId(u32);
}
