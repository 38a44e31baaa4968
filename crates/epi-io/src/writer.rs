//! Table writers.
//!
//! The plain separators (space, tab, comma, newline) stream the array as
//! numbers for downstream tools; the `|` separator emits the
//! self-describing Centinel form that [`crate::reader`] reads back. New
//! artifacts written by the simulator use the plain forms unless they are
//! meant to be re-read.

use std::io::Write;

use crate::error::IoResult;
use crate::shape::Table;

/// Field separator for [`write_table`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Separator {
    Space,
    Tab,
    Comma,
    /// Every value on its own line.
    Newline,
    /// Self-describing Centinel format.
    Bars,
}

/// One level of the storage iteration order.
#[derive(Copy, Clone, Debug)]
pub struct Axis {
    pub label: char,
    pub start: usize,
    /// Inclusive stop index.
    pub stop: usize,
    pub step: usize,
    /// End the output line when this level completes a sweep.
    pub line_break: bool,
}

impl Axis {
    /// Full sweep of a dimension, no line break.
    pub fn full(label: char, len: usize) -> Axis {
        Axis { label, start: 0, stop: len - 1, step: 1, line_break: false }
    }

    pub fn with_break(mut self) -> Axis {
        self.line_break = true;
        self
    }
}

/// Write `table` in the order given by `order` (outermost first; `None`
/// sweeps the natural dimension order with a line break per innermost run).
pub fn write_table<W: Write>(
    out: &mut W,
    table: &Table,
    order: Option<&[Axis]>,
    sep: Separator,
    title: &str,
) -> IoResult<()> {
    let natural: Vec<Axis>;
    let axes: &[Axis] = match order {
        Some(o) => o,
        None => {
            let dims = table.shape().dims();
            natural = dims
                .iter()
                .enumerate()
                .map(|(k, d)| {
                    let a = Axis::full(d.label, d.len);
                    if k + 1 == dims.len() {
                        a.with_break()
                    } else {
                        a
                    }
                })
                .collect();
            &natural
        }
    };

    match sep {
        Separator::Bars => write_bars(out, table, axes, title),
        _ => {
            let mut idx = vec![0usize; axes.len()];
            write_plain(out, table, axes, sep, 0, &mut idx)?;
            Ok(())
        }
    }
}

// ── Plain separators ──────────────────────────────────────────────────────────

fn sep_char(sep: Separator) -> char {
    match sep {
        Separator::Space => ' ',
        Separator::Tab => '\t',
        Separator::Comma => ',',
        Separator::Newline => '\n',
        Separator::Bars => unreachable!(),
    }
}

fn write_plain<W: Write>(
    out: &mut W,
    table: &Table,
    axes: &[Axis],
    sep: Separator,
    level: usize,
    idx: &mut [usize],
) -> IoResult<()> {
    let axis = &axes[level];
    let innermost = level + 1 == axes.len();
    let mut i = axis.start;
    loop {
        idx[level] = i;
        if innermost {
            let v = value_at(table, axes, idx);
            write!(out, "{v}")?;
            if i == axis.stop && axis.line_break {
                writeln!(out)?;
            } else {
                write!(out, "{}", sep_char(sep))?;
            }
        } else {
            write_plain(out, table, axes, sep, level + 1, idx)?;
        }
        if i == axis.stop {
            break;
        }
        i += axis.step;
    }
    if !innermost && axis.line_break {
        writeln!(out)?;
    }
    Ok(())
}

// ── Centinel ──────────────────────────────────────────────────────────────────

fn write_bars<W: Write>(out: &mut W, table: &Table, axes: &[Axis], title: &str) -> IoResult<()> {
    if !title.is_empty() {
        writeln!(out, "{title}")?;
        writeln!(out)?;
    }

    let inner = axes.last().expect("at least one axis");
    let outer = &axes[..axes.len() - 1];

    // Heading: outer index labels, then one column per innermost value.
    for a in outer {
        write!(out, "|{} ", a.label)?;
    }
    let mut i = inner.start;
    loop {
        write!(out, "|{}{}", inner.label, i)?;
        if i == inner.stop {
            break;
        }
        i += inner.step;
    }
    writeln!(out)?;

    let mut idx = vec![0usize; axes.len()];
    write_bar_rows(out, table, axes, 0, &mut idx)
}

fn write_bar_rows<W: Write>(
    out: &mut W,
    table: &Table,
    axes: &[Axis],
    level: usize,
    idx: &mut [usize],
) -> IoResult<()> {
    if level + 1 == axes.len() {
        // One row: the current outer indices, then the innermost sweep.
        for (k, _a) in axes[..level].iter().enumerate() {
            write!(out, "|{} ", idx[k])?;
        }
        let inner = &axes[level];
        let mut i = inner.start;
        loop {
            idx[level] = i;
            write!(out, "|{}", value_at(table, axes, idx))?;
            if i == inner.stop {
                break;
            }
            i += inner.step;
        }
        writeln!(out)?;
        return Ok(());
    }

    let axis = &axes[level];
    let mut i = axis.start;
    loop {
        idx[level] = i;
        write_bar_rows(out, table, axes, level + 1, idx)?;
        if i == axis.stop {
            break;
        }
        i += axis.step;
    }
    if axis.line_break {
        writeln!(out)?;
    }
    Ok(())
}

/// Value at the current iteration state: axes address dimensions by label,
/// so the storage order need not match the memory order.
fn value_at(table: &Table, axes: &[Axis], idx: &[usize]) -> f64 {
    let mut offset = 0;
    for (a, &i) in axes.iter().zip(idx) {
        offset += table.shape().width(a.label).expect("axis label in shape") * i;
    }
    table.data()[offset]
}
