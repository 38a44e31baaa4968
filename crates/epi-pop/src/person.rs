//! The person record: one compact struct per simulated individual.
//!
//! # Candidate instants
//!
//! Each person remembers several speculative future instants — death,
//! emigration, disease onset, and so on — but contributes exactly ONE entry
//! to the global event queue: the one named by `pending`. When a handler
//! supersedes that entry it recomputes whichever candidates it cares about,
//! picks the new earliest, and replaces the queue entry, without ever
//! scanning the population.
//!
//! The record is deliberately small (a few cache lines) because the register
//! holds tens of millions of them.

use std::fmt;

// ── Candidate slots ───────────────────────────────────────────────────────────

/// Named slots of the candidate-instant tuple `Person::t`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[repr(usize)]
pub enum Slot {
    /// Instant this record began (birth, or birth inferred at entry).
    Birth = 0,
    /// Exit from the current state (recovery to remote infection, or the
    /// earliest terminal exit where a handler stores it).
    Exit = 1,
    /// Death.
    Death = 2,
    /// Progression to active disease.
    Disease = 3,
    /// Next onward transmission (diseased persons only).
    Transmit = 4,
    /// Next strain mutation.
    Mutate = 5,
    /// Emigration out of the study population.
    Emigrate = 6,
    /// Case notification.
    Report = 7,
}

pub const SLOT_COUNT: usize = 8;

// ── Pending tag ───────────────────────────────────────────────────────────────

/// Which event the person's single queue entry will dispatch.
///
/// `BirthPulse` and `ImmigrationPulse` belong to the two reserved
/// pseudo-persons driving the external generators.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum Pending {
    #[default]
    Vaccinate,
    Transmit,
    ToRemote,
    Disease,
    Death,
    Mutate,
    Emigrate,
    BirthPulse,
    ImmigrationPulse,
    Report,
}

// ── Compartments ──────────────────────────────────────────────────────────────

/// The 11 disease compartments.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[repr(usize)]
pub enum State {
    #[default]
    Uninfected = 0,
    Immune = 1,
    RecentInfection = 2,
    RemoteInfection = 3,
    Reinfection = 4,
    PrimaryDisease = 5,
    ReactivationDisease = 6,
    ReinfectionDisease = 7,
    PrimaryNonPulm = 8,
    ReactivationNonPulm = 9,
    ReinfectionNonPulm = 10,
}

pub const STATE_COUNT: usize = 11;

impl State {
    pub const ALL: [State; STATE_COUNT] = [
        State::Uninfected,
        State::Immune,
        State::RecentInfection,
        State::RemoteInfection,
        State::Reinfection,
        State::PrimaryDisease,
        State::ReactivationDisease,
        State::ReinfectionDisease,
        State::PrimaryNonPulm,
        State::ReactivationNonPulm,
        State::ReinfectionNonPulm,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Any of the six active-disease compartments.
    #[inline]
    pub fn is_disease(self) -> bool {
        self.index() >= State::PrimaryDisease.index()
    }

    /// The three pulmonary disease compartments (the infectious ones).
    #[inline]
    pub fn is_pulmonary_disease(self) -> bool {
        matches!(
            self,
            State::PrimaryDisease | State::ReactivationDisease | State::ReinfectionDisease
        )
    }

    /// Any infected-but-not-diseased compartment.
    #[inline]
    pub fn is_latent(self) -> bool {
        matches!(
            self,
            State::RecentInfection | State::RemoteInfection | State::Reinfection
        )
    }

    /// Short column label used in reports.
    pub fn label(self) -> &'static str {
        match self {
            State::Uninfected => "U",
            State::Immune => "V",
            State::RecentInfection => "I1",
            State::RemoteInfection => "I2",
            State::Reinfection => "I3",
            State::PrimaryDisease => "D1",
            State::ReactivationDisease => "D2",
            State::ReinfectionDisease => "D3",
            State::PrimaryNonPulm => "D4",
            State::ReactivationNonPulm => "D5",
            State::ReinfectionNonPulm => "D6",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Demographics ──────────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum Sex {
    #[default]
    Male = 0,
    Female = 1,
}

impl Sex {
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Region-of-birth cohort. The register stores the two cohorts in disjoint
/// index ranges so same-cohort selection is a range draw.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum Cohort {
    /// Born outside the study population (index range low end).
    #[default]
    Foreign = 0,
    /// Born inside the study population (index range high end).
    Native = 1,
}

impl Cohort {
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Finer origin split within the foreign cohort, carrying the co-infection
/// marker that multiplies disease-progression risk.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum Subcohort {
    #[default]
    Baseline = 0,
    HighIncidence = 1,
    Coinfected = 2,
}

impl Subcohort {
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

// ── Person ────────────────────────────────────────────────────────────────────

/// One simulated individual.
#[derive(Copy, Clone, Debug, Default)]
pub struct Person {
    /// Candidate future instants, indexed by [`Slot`].
    pub t: [f64; SLOT_COUNT],
    /// Which candidate currently sits in the event queue.
    pub pending: Pending,
    pub state: State,
    pub sex: Sex,
    pub cohort: Cohort,
    pub subcohort: Subcohort,
}

impl Person {
    #[inline]
    pub fn time(&self, slot: Slot) -> f64 {
        self.t[slot as usize]
    }

    #[inline]
    pub fn set_time(&mut self, slot: Slot, te: f64) {
        self.t[slot as usize] = te;
    }

    /// Age at instant `now`, years.
    #[inline]
    pub fn age(&self, now: f64) -> f64 {
        now - self.time(Slot::Birth)
    }

    /// Risk group used by the disease-progression tables: only the
    /// co-infected override the region-of-birth split.
    #[inline]
    pub fn risk_group(&self) -> usize {
        if self.subcohort == Subcohort::Coinfected {
            2
        } else {
            self.cohort.index()
        }
    }

    /// Origin group used by the emigration, sex, and age-class tables:
    /// any high-incidence origin (co-infected or not) forms the third group.
    #[inline]
    pub fn origin_group(&self) -> usize {
        if self.subcohort != Subcohort::Baseline {
            2
        } else {
            self.cohort.index()
        }
    }
}
