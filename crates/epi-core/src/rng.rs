//! The deterministic random stream and its derived distributions.
//!
//! # Determinism strategy
//!
//! All randomness in a run flows through one `Lcg` value owned by the
//! simulation, a 32-bit linear congruential generator:
//!
//!   x' = x * 19513957 + 907633385  (mod 2^32)
//!
//! The multiplier is ≡ 5 (mod 8) with haphazard-looking bits, the increment
//! is odd, and the modulus is the full 32-bit ring, so the generator walks
//! every 32-bit value exactly once before repeating. The state IS the seed:
//! `ending_seed()` after any number of draws restarts the identical sequence,
//! which is what makes chained multi-session runs reproducible.
//!
//! The sequence must not vary with machine, operating system, or compiler,
//! so the generator is implemented here rather than delegated to a library
//! algorithm. It still implements [`rand::RngCore`], so `rand`'s adaptors
//! (ranges, shuffles) can draw from the same stream when convenient.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use rand::RngCore;

const MULTIPLIER: u32 = 19_513_957;
const INCREMENT: u32 = 907_633_385;

/// Default file used to chain the random stream across runs.
pub const NEXT_SEED_FILE: &str = "nextseed.rnd";

/// Exponential draws are rejected beyond this multiple of the mean interval.
/// The generator's finite granularity near zero can otherwise produce
/// absurdly long intervals from the distribution tail.
const EXPON_LIMIT: f64 = 10.0;

// ── Lcg ───────────────────────────────────────────────────────────────────────

/// The 32-bit linear congruential random stream.
#[derive(Clone, Debug)]
pub struct Lcg {
    seed: u32,
    /// Perturbation base for [`Lcg::start_arbitrary`], advanced on each call
    /// so repeated arbitrary starts within one second still differ.
    base: u32,
}

impl Default for Lcg {
    fn default() -> Self {
        Lcg::new(0)
    }
}

impl Lcg {
    /// A stream starting from seed `k`.
    pub fn new(k: u32) -> Self {
        Lcg { seed: k, base: 1_234_567 }
    }

    /// Restart the sequence at seed `k`.
    pub fn start(&mut self, k: u32) {
        self.seed = k;
    }

    /// The current state. Feeding this back to [`Lcg::start`] continues the
    /// sequence exactly where it left off.
    #[inline]
    pub fn ending_seed(&self) -> u32 {
        self.seed
    }

    /// Advance the state and return the raw 32-bit value.
    #[inline]
    pub fn next_int(&mut self) -> u32 {
        self.seed = self.seed.wrapping_mul(MULTIPLIER).wrapping_add(INCREMENT);
        self.seed
    }

    /// Uniform value in `[0, 1)`. Only the first 32 bits of the mantissa are
    /// significant.
    #[inline]
    pub fn rand(&mut self) -> f64 {
        self.next_int() as f64 / 4_294_967_296.0
    }

    /// Seed from the wall clock so the sequence likely differs between runs.
    ///
    /// The clock's low 32 bits are bit-reversed to turn small time deltas
    /// into large seed deltas, and `offset` separates jobs launched at the
    /// same second (pass the job number). Returns the chosen seed so the run
    /// can be replayed with [`Lcg::start`].
    pub fn start_arbitrary(&mut self, offset: u32) -> u32 {
        let secs = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0) as u32;

        self.base = self.base.wrapping_mul(5).wrapping_add(1);
        self.seed = self
            .base
            .wrapping_add(offset)
            .wrapping_add(secs.reverse_bits());
        self.seed
    }

    // ── Seed chaining across runs ─────────────────────────────────────────

    /// Resume the stream from a next-seed file written by a previous run.
    ///
    /// Returns `true` when a seed was on file; otherwise an arbitrary seed
    /// is taken (clock values of consecutive runs are related, so chaining
    /// through the file is the only safe way to keep runs independent).
    pub fn start_next(&mut self, path: &Path) -> bool {
        match fs::read_to_string(path) {
            Ok(text) => match text.trim().parse::<u32>() {
                Ok(seed) => {
                    self.start(seed);
                    true
                }
                Err(_) => {
                    self.start_arbitrary(0);
                    false
                }
            },
            Err(_) => {
                self.start_arbitrary(0);
                false
            }
        }
    }

    /// Record the ending seed for the next run to pick up.
    pub fn stop_next(&self, path: &Path) -> io::Result<()> {
        let mut f = fs::File::create(path)?;
        writeln!(f, "{}", self.ending_seed())
    }

    // ── Derived distributions ─────────────────────────────────────────────

    /// Uniform value in `[a, b)`.
    #[inline]
    pub fn uniform(&mut self, a: f64, b: f64) -> f64 {
        self.rand() * (b - a) + a
    }

    /// Exponentially distributed interval with mean `1/lambda`.
    ///
    /// Draws of exactly zero are rejected (they occur with finite
    /// probability in 32-bit arithmetic and would produce an infinite
    /// interval), as are intervals beyond `10/lambda`, so the stream can
    /// never stall the clock or jump it past every other pending event.
    pub fn expon(&mut self, lambda: f64) -> f64 {
        loop {
            let r = self.rand();
            if r == 0.0 {
                continue;
            }
            let dt = -r.ln();
            if dt > EXPON_LIMIT || dt == 0.0 {
                continue;
            }
            return dt / lambda;
        }
    }

    /// Gaussian deviate with mean `mu` and standard deviation `sigma`,
    /// by the polar Box–Muller method: pick a point uniformly in the unit
    /// circle and project it.
    pub fn gauss(&mut self, mu: f64, sigma: f64) -> f64 {
        let mut v2;
        let mut w;
        loop {
            let v1 = 2.0 * self.rand() - 1.0;
            v2 = 2.0 * self.rand() - 1.0;
            w = v1 * v1 + v2 * v2;
            if w <= 1.0 && w != 0.0 {
                break;
            }
        }
        mu + sigma * v2 * (-2.0 * w.ln() / w).sqrt()
    }

    /// Lognormal deviate; `mu` and `sigma` describe the underlying normal.
    pub fn lognormal(&mut self, mu: f64, sigma: f64) -> f64 {
        (mu + sigma * self.gauss(0.0, 1.0)).exp()
    }

    /// Cauchy deviate with median `mu` and half-width `sigma`. (The Cauchy
    /// distribution has no mean and no standard deviation.)
    pub fn cauchy(&mut self, mu: f64, sigma: f64) -> f64 {
        mu + sigma * (std::f64::consts::PI * (self.rand() - 0.5)).tan()
    }
}

// ── rand compatibility ────────────────────────────────────────────────────────

impl RngCore for Lcg {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.next_int()
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        let hi = self.next_int() as u64;
        let lo = self.next_int() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let word = self.next_int().to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
