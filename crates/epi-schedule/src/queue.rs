//! `EventQueue` — hashed time bins over a modular cycle.
//!
//! # Why this exists
//!
//! The simulation keeps one pending event per live person — tens of millions
//! of entries, with hundreds of millions of schedule/cancel/dispatch
//! operations over a run. A comparison-based priority queue pays O(log n)
//! per operation; this structure pays amortized O(1) by hashing instants
//! into time bins, the "calendar queue" of real-time executives.
//!
//! # Model
//!
//! A ring of B bins covers one cycle of `qw` simulated years; an instant
//! `te` lands in bin `⌊frac((te − qt0)/qw) · B⌋`. A bin therefore mixes
//! entries due this cycle with entries due whole cycles later; the later
//! ones are simply retained when the bin is dispatched and picked up when
//! the window advances to their cycle. Each bin is a singly linked list
//! through `next[]`, unordered for O(1) insertion, and is sorted lazily by
//! a stable merge sort the first time the dispatch cursor reaches it. With
//! B chosen near the expected entry count, bins hold ~1 entry on average
//! (1.58 among occupied bins, by Poisson), so the sorts are trivial.
//!
//! Space per entry is one f64 and one u32 — no per-event allocation ever.
//!
//! # Failure semantics
//!
//! Scheduling a scheduled person, cancelling an unscheduled one, scheduling
//! in the past, renumbering onto an occupied index, or finding a broken
//! link are program defects: each aborts with a banded diagnostic. The one
//! recovered anomaly is knife-edge bin placement — an instant computed as
//! 0.999999999999 of a bin boundary on insertion and 1.0 on cancellation —
//! which the cancel path absorbs by scanning both neighbour bins.

use std::fmt;

use epi_core::{fatal, PersonId};

use crate::sort::sort_list;

/// Forward-link value meaning "this person holds no queue entry".
const UNSCHEDULED: u32 = u32::MAX;

/// Default cycle width, simulated years. Roughly matches the span over
/// which a national population's pending events spread.
pub const DEFAULT_CYCLE_YEARS: f64 = 20.0;

// ── EventQueue ────────────────────────────────────────────────────────────────

/// The scheduler: a set of (person, instant) pairs dispatched in
/// non-decreasing instant order, FIFO within a bin on exact ties.
pub struct EventQueue {
    /// Scheduled instant per person, indexed by `PersonId`; meaningful only
    /// while the person is scheduled.
    times: Vec<f64>,
    /// Forward link per person: next list member, 0 at list end,
    /// `UNSCHEDULED` when the person holds no entry. Index 0 unused.
    next: Vec<u32>,
    /// Head person of each bin's list, 0 for an empty bin.
    bins: Vec<u32>,
    /// Tail person of each bin's list; meaningful only while the bin is
    /// non-empty. Appending at the tail keeps simultaneous entries in
    /// insertion order, which the dispatch sort preserves.
    tails: Vec<u32>,

    /// Lower edge of the current cycle window.
    qt0: f64,
    /// Upper edge of the current cycle window (`qt0 + qw`).
    qt1: f64,
    /// Cycle width.
    qw: f64,

    /// Bin currently being dispatched.
    cursor: usize,
    /// Whether the cursor bin's list is known to be in instant order.
    cursor_sorted: bool,
    /// Live entries across all bins.
    count: usize,

    /// The clock: instant of the last dispatched event.
    now: f64,
    /// Dispatch stops once the earliest instant reaches this bound.
    horizon: f64,
}

impl EventQueue {
    /// A queue for persons `1..=max_person` with `bins` time bins spanning
    /// `cycle_years` per cycle.
    ///
    /// Sizing guidance: one bin per expected entry makes the average bin
    /// hold one entry; [`EventQueue::profile`] verifies the choice.
    pub fn new(max_person: u32, bins: usize, cycle_years: f64) -> Self {
        assert!(bins > 0 && cycle_years > 0.0);
        EventQueue {
            times: vec![0.0; max_person as usize + 1],
            next: vec![UNSCHEDULED; max_person as usize + 1],
            bins: vec![0; bins],
            tails: vec![0; bins],
            qt0: 0.0,
            qt1: cycle_years,
            qw: cycle_years,
            cursor: 0,
            cursor_sorted: true,
            count: 0,
            now: 0.0,
            horizon: f64::INFINITY,
        }
    }

    /// A queue with one bin per person and the default cycle width.
    pub fn sized_for(max_person: u32) -> Self {
        EventQueue::new(max_person, max_person as usize, DEFAULT_CYCLE_YEARS)
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    /// The clock — instant of the last dispatched event.
    #[inline]
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Live entries in the queue.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn is_scheduled(&self, person: PersonId) -> bool {
        self.next[person.index()] != UNSCHEDULED
    }

    /// The instant a person is scheduled at, if any.
    pub fn scheduled_time(&self, person: PersonId) -> Option<f64> {
        if self.is_scheduled(person) {
            Some(self.times[person.index()])
        } else {
            None
        }
    }

    /// Dispatch stops once the earliest pending instant reaches `t`.
    pub fn set_horizon(&mut self, t: f64) {
        self.horizon = t;
    }

    /// Bytes held by the main arrays.
    pub fn memory_bytes(&self) -> usize {
        self.times.len() * std::mem::size_of::<f64>()
            + self.next.len() * std::mem::size_of::<u32>()
            + 2 * self.bins.len() * std::mem::size_of::<u32>()
    }

    // ── Window placement ──────────────────────────────────────────────────

    /// Position the cycle window for a run whose first event is at or after
    /// `t0`, and set the clock there. Requires an empty queue.
    ///
    /// The window starts half a bin before `t0`: an independent calculation
    /// that lands the first instant at 1980.9999999999 instead of 1981 must
    /// still fall in bin 0, not wrap to the last bin of the cycle.
    pub fn start_time(&mut self, t0: f64) {
        if self.count != 0 {
            fatal(742, "attempt to position the time window while entries are pending");
        }
        self.qt0 = t0 - (self.qw / self.bins.len() as f64) / 2.0;
        self.qt1 = self.qt0 + self.qw;
        self.cursor = 0;
        self.cursor_sorted = true;
        self.now = t0;
    }

    // ── Core operations ───────────────────────────────────────────────────

    /// Add an entry for `person` at instant `te`.
    ///
    /// Fatal if the person is already scheduled or `te` is in the past.
    pub fn schedule(&mut self, person: PersonId, te: f64) {
        let n = person.index();
        if n < 1 || n >= self.next.len() {
            fatal(734, &format!("event number out of range (n={n})"));
        }
        if self.next[n] != UNSCHEDULED {
            fatal(735, &format!("event already scheduled (n={n})"));
        }
        if te < self.now {
            fatal(737, &format!("event in the past (t={}, te={te})", self.now));
        }

        self.times[n] = te;
        let h = self.bin_of(te);
        if h == self.cursor {
            self.cursor_sorted = false;
        }
        self.next[n] = 0;
        if self.bins[h] == 0 {
            self.bins[h] = person.0;
        } else {
            self.next[self.tails[h] as usize] = person.0;
        }
        self.tails[h] = person.0;
        self.count += 1;
    }

    /// Remove the entry for `person`. Fatal if none is held.
    pub fn cancel(&mut self, person: PersonId) {
        let n = person.index();
        if n < 1 || n >= self.next.len() {
            fatal(734, &format!("event number out of range (n={n})"));
        }
        if self.next[n] == UNSCHEDULED {
            fatal(736, &format!("event to cancel is not scheduled (n={n})"));
        }

        let nb = self.bins.len();
        let h = self.bin_of(self.times[n]);
        if self.unlink(person.0, h) {
            return;
        }
        // Knife-edge rounding may have filed the entry one bin away from
        // where the instant now hashes; check both neighbours.
        if self.unlink(person.0, (h + nb - 1) % nb) {
            return;
        }
        if self.unlink(person.0, (h + 1) % nb) {
            return;
        }
        fatal(818, &format!("scheduled event not found in its time bins (n={n})"));
    }

    /// Transfer the entry of `from` to the unscheduled index `to`, at the
    /// same instant. After return, `from` is free for reuse.
    pub fn renumber(&mut self, to: PersonId, from: PersonId) {
        for id in [to, from] {
            let n = id.index();
            if n < 1 || n >= self.next.len() {
                fatal(734, &format!("event number out of range (n={n})"));
            }
        }
        if to != from {
            let te = self.times[from.index()];
            self.cancel(from);
            self.schedule(to, te);
        }
    }

    /// Remove and return the earliest entry, advancing the clock to it.
    ///
    /// Returns `None` — leaving the queue untouched and the clock where it
    /// is — when the queue is empty or the earliest instant has reached the
    /// horizon. Exact ties dispatch in insertion order.
    pub fn next(&mut self) -> Option<(PersonId, f64)> {
        let nb = self.bins.len();
        while self.count > 0 {
            while self.cursor < nb {
                let head = self.bins[self.cursor];
                if head == 0 {
                    self.advance_cursor();
                    continue;
                }

                if !self.cursor_sorted {
                    let times = &self.times;
                    let sorted = sort_list(&mut self.next, head, 0, |a, b| {
                        times[a as usize] <= times[b as usize]
                    });
                    self.bins[self.cursor] = sorted;
                    // Relinking moved the tail; find it again so appends
                    // stay ordered.
                    let mut tail = sorted;
                    while self.next[tail as usize] != 0 {
                        tail = self.next[tail as usize];
                    }
                    self.tails[self.cursor] = tail;
                    self.cursor_sorted = true;
                }

                let j = self.bins[self.cursor];
                let te = self.times[j as usize];
                if te < self.qt1 {
                    // Earliest pending entry in the whole queue.
                    if te >= self.horizon {
                        return None;
                    }
                    if self.next[j as usize] == UNSCHEDULED {
                        fatal(820, &format!("event list has a broken link (n={j})"));
                    }
                    self.bins[self.cursor] = self.next[j as usize];
                    self.next[j as usize] = UNSCHEDULED;
                    self.count -= 1;
                    self.now = te;
                    return Some((PersonId(j), te));
                }

                // Head entry belongs to a later cycle; keep it and move on.
                self.advance_cursor();
            }

            // End of the ring: open the next cycle window.
            self.cursor = 0;
            self.cursor_sorted = false;
            self.qt0 += self.qw;
            self.qt1 = self.qt0 + self.qw;
        }
        None
    }

    // ── Diagnostics ───────────────────────────────────────────────────────

    /// Observed bin-occupancy histogram next to the Poisson expectation for
    /// `lambda = len()/B`. A healthy sizing shows the two agreeing; marked
    /// clustering means the cycle width or bin count needs retuning.
    pub fn profile(&self, label: &str) -> Profile {
        const CAP: usize = 1000;
        let mut hist = vec![0u64; CAP + 1];
        let mut max_n = 0;

        for &head in &self.bins {
            let mut n = 0usize;
            let mut j = head;
            while j != 0 {
                if j as usize >= self.next.len() || n > self.next.len() {
                    fatal(820, &format!("event list has a broken link (j={j})"));
                }
                j = self.next[j as usize];
                n += 1;
            }
            let n = n.min(CAP);
            hist[n] += 1;
            max_n = max_n.max(n);
        }

        Profile {
            label: if label.is_empty() { "Bin" } else { label }.to_string(),
            events: self.count,
            bins: self.bins.len(),
            histogram: hist[..=max_n].to_vec(),
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────

    /// Bin holding instant `te`: its cycle residue scaled to the ring.
    #[inline]
    fn bin_of(&self, te: f64) -> usize {
        let tr = ((te - self.qt0) / self.qw).fract();
        ((tr * self.bins.len() as f64) as usize).min(self.bins.len() - 1)
    }

    #[inline]
    fn advance_cursor(&mut self) {
        self.cursor += 1;
        self.cursor_sorted = false;
    }

    /// Remove `target` from bin `h` if present. Average occupied-bin length
    /// is 1.58, so the scan is effectively constant-time.
    fn unlink(&mut self, target: u32, h: usize) -> bool {
        let mut prev = 0u32;
        let mut j = self.bins[h];
        while j != 0 {
            if j == target {
                let succ = self.next[j as usize];
                if prev != 0 {
                    self.next[prev as usize] = succ;
                } else {
                    self.bins[h] = succ;
                }
                if succ == 0 {
                    self.tails[h] = prev;
                }
                self.next[j as usize] = UNSCHEDULED;
                if self.count == 0 {
                    fatal(819, &format!("event counter fell negative (n={target}, bin={h})"));
                }
                self.count -= 1;
                return true;
            }
            prev = j;
            j = self.next[j as usize];
        }
        false
    }
}

// ── Profile ───────────────────────────────────────────────────────────────────

/// Bin-occupancy distribution report produced by [`EventQueue::profile`].
pub struct Profile {
    pub label: String,
    pub events: usize,
    pub bins: usize,
    /// `histogram[n]` = number of bins holding exactly n entries.
    pub histogram: Vec<u64>,
}

impl Profile {
    /// Poisson expectation `B · e^{−λ} λ^n / n!` for occupancy `n`.
    pub fn expected(&self, n: usize) -> f64 {
        let lambda = self.events as f64 / self.bins as f64;
        let mut v = self.bins as f64 * (-lambda).exp();
        for k in 1..=n {
            v *= lambda / k as f64;
        }
        v
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} distribution of {} events:", self.label, self.events)?;
        writeln!(f, "   N   Observed   Expected")?;
        for (n, &obs) in self.histogram.iter().enumerate() {
            let exp = self.expected(n);
            if obs > 0 || exp > 0.5 {
                writeln!(f, "{n:4} {obs:9} {exp:10.0}")?;
            }
        }
        Ok(())
    }
}
