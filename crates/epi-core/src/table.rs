//! Cumulative probability tables and conditional inverse-CDF sampling.
//!
//! A distribution is supplied as a table of strictly increasing values `V`
//! matched one-to-one with cumulative probabilities `P`, with `P[0] = 0` and
//! `P[n-1] = 1`. Given a value `g` already achieved (for age-specific
//! mortality: the age already reached), [`rand_f`] draws from the
//! transformed distribution
//!
//!   F(x) = (P(x + g) − P(g)) / (1 − P(g))
//!
//! telling probabilistically how much further the variate extends. All
//! memoryless distributions are invariant under this transformation, so the
//! degenerate two-entry table `V = [0, huge], P = [0, 1]` with `g = 0`
//! reduces to a uniform stretch, and an exponential cumulative table
//! reproduces the exponential distribution.
//!
//! Tables may encode discontinuities by repeating a value with two different
//! probabilities (the pen-on-graph-paper path (0,0) → (0,¼) → (1,¼) → …);
//! zero-width brackets are treated as steps.

use crate::error::{fatal, CoreError};
use crate::rng::Lcg;

/// Linearly interpolate `y` at `x` over a strictly increasing table `xs`.
///
/// Outside the table range the nearest endpoint value is returned.
/// A zero-width bracket (repeated `x`) yields the right-hand `y`.
pub fn interp(x: f64, xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len();
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[n - 1] {
        return ys[n - 1];
    }

    let i = locate(xs, x);
    let width = xs[i + 1] - xs[i];
    let w = if width != 0.0 { (x - xs[i]) / width } else { 1.0 };
    ys[i] + w * (ys[i + 1] - ys[i])
}

/// Binary bracket: the index `i` with `table[i] <= v <= table[i+1]`.
///
/// `table` must be non-decreasing with at least two entries and
/// `table[0] <= v <= table[n-1]`. O(log n).
pub fn locate(table: &[f64], v: f64) -> usize {
    fn loc(table: &[f64], b: usize, n: usize, v: f64) -> usize {
        let m = n / 2 + n % 2;
        if m <= 1 {
            b
        } else if v < table[b + m - 1] {
            loc(table, b, m, v)
        } else {
            loc(table, b + m - 1, n - m + 1, v)
        }
    }
    loc(table, 0, table.len(), v)
}

/// Conditional inverse-CDF sample: a variate from the distribution described
/// by `(values, probs)`, truncated from below at `floor`.
///
/// # Panics
/// Fatal diagnostic if `floor` lies outside `values` or if `probs` is not
/// bounded by 0 and 1. Those indicate a malformed input table, and sampling
/// from it would silently skew the whole run.
pub fn rand_f(rng: &mut Lcg, values: &[f64], probs: &[f64], floor: f64) -> f64 {
    let n = values.len();
    if values[0] > floor || values[n - 1] < floor {
        fatal(753, &format!("sample floor outside the value table (g={floor})"));
    }
    if probs[0] != 0.0 || probs[n - 1] != 1.0 {
        fatal(753, "cumulative table is not bounded by 0 and 1");
    }

    let mut r = rng.rand();

    if floor != values[0] {
        // Only the part of the distribution above the floor is sampled.
        let p0 = interp(floor, values, probs);
        r = p0 + r * (1.0 - p0);
    }

    let i = locate(probs, r);
    let width = probs[i + 1] - probs[i];
    let w = if width != 0.0 { (r - probs[i]) / width } else { 1.0 };
    values[i] - floor + w * (values[i + 1] - values[i])
}

/// Audit a cumulative table: never decreasing, and (when `bounded`) starting
/// at 0 and ending at 1. `context` names the table in the diagnostic.
pub fn check_cumulative(p: &[f64], bounded: bool, context: &str) -> Result<(), CoreError> {
    for i in 1..p.len() {
        if p[i - 1] > p[i] {
            return Err(CoreError::TableNotMonotone {
                context: context.to_string(),
                index: i,
            });
        }
    }
    if bounded && (p[0] != 0.0 || p[p.len() - 1] != 1.0) {
        return Err(CoreError::TableNotBounded { context: context.to_string() });
    }
    Ok(())
}
