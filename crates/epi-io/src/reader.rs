//! Centinel reader.
//!
//! Any line not beginning with `|` is a comment. The first `|`-line names
//! the columns; every later `|`-line carries data. A column name is a
//! lowercase index label, optionally followed by an integer freezing that
//! dimension for the column:
//!
//! ```text
//! Sample file (three dimensions s, r, q)
//!
//! |s |r |q0  |q1  |q2
//! |0 |0 |4.48|1.12|9.21
//! |1 |0,2|3.95|8.54|1.61
//! ```
//!
//! Here `s` and `r` vary by row while `q` is frozen per column. Index cells
//! may be single integers or comma/tilde range lists (`0,3~5,2`), in which
//! case the row's values are broadcast across every index combination —
//! `|1 |0,2|…` above stores each value at both r=0 and r=2. Lines can
//! appear in any order since each line carries its own indices; that
//! self-description is what keeps a mis-ordered file from silently
//! scrambling an array.
//!
//! A one-dimensional file may address every element explicitly with a data
//! column labelled `z`:
//!
//! ```text
//! |i   |z
//! |0   |0.25
//! |1~3 |0.50
//! ```
//!
//! Columns whose label is not in the target shape are skipped. Index values
//! beyond the dimension length are ignored with a once-only warning.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{IoError, IoResult};
use crate::rescale::Rescale;
use crate::shape::Table;

/// What a column contributes to each data line.
enum Column {
    /// Varies by row: dimension axis in the target shape.
    Index { axis: usize },
    /// Data cell with a fixed flat offset from frozen indices.
    Data { offset: usize },
    /// Label unknown to the shape; field ignored.
    Skip,
}

/// Read a Centinel file into `table`, returning the number of array
/// elements populated.
pub fn read_file(path: &Path, table: &mut Table, rescale: Option<Rescale>) -> IoResult<usize> {
    let file = File::open(path).map_err(|e| IoError::Open {
        path: path.display().to_string(),
        source: e,
    })?;
    read_centinel(BufReader::new(file), table, rescale, &path.display().to_string())
}

/// Like [`read_file`] over any buffered source; `name` labels diagnostics.
pub fn read_centinel<R: BufRead>(
    reader: R,
    table: &mut Table,
    rescale: Option<Rescale>,
    name: &str,
) -> IoResult<usize> {
    let mut columns: Option<Vec<Column>> = None;
    let mut count = 0usize;
    let mut warned_range = false;

    let mut line_no = 0u64;
    for line in reader.lines() {
        line_no += 1;
        let line = line.map_err(|e| IoError::Read {
            path: name.to_string(),
            source: e,
        })?;
        if !line.starts_with('|') {
            continue; // comment
        }

        match &columns {
            None => columns = Some(parse_header(&line, table, name, line_no)?),
            Some(cols) => {
                count += store_line(
                    &line,
                    cols,
                    table,
                    rescale,
                    name,
                    line_no,
                    &mut warned_range,
                )?;
            }
        }
    }

    if count == 0 {
        return Err(IoError::NoData { file: name.to_string() });
    }
    Ok(count)
}

// ── Header ────────────────────────────────────────────────────────────────────

fn parse_header(line: &str, table: &Table, name: &str, line_no: u64) -> IoResult<Vec<Column>> {
    let parse_err = |code: u16, message: String| IoError::Parse {
        code,
        message,
        line: line_no,
        file: name.to_string(),
    };

    let mut columns = Vec::new();
    let mut data_seen = false;

    for field in fields(line) {
        let field = field.trim();
        let mut chars = field.chars();
        let label = chars
            .next()
            .ok_or_else(|| parse_err(523, "a column heading is empty".into()))?;
        if !label.is_ascii_lowercase() {
            return Err(parse_err(
                524,
                format!("a column label is incorrect (must be 'a'-'z': {label:?})"),
            ));
        }
        let suffix = chars.as_str().trim();
        let frozen: Option<usize> = if suffix.is_empty() {
            None
        } else {
            Some(
                suffix
                    .parse()
                    .map_err(|_| parse_err(523, format!("a column heading is incorrect ({field:?})")))?,
            )
        };

        let shape = table.shape();
        let column = match (shape.axis(label), frozen) {
            // A bare `z` in a one-dimensional file is the data column.
            (None, None) if label == 'z' && shape.rank() == 1 => {
                data_seen = true;
                Column::Data { offset: 0 }
            }
            (None, _) => Column::Skip,
            (Some(axis), None) => {
                if data_seen {
                    return Err(parse_err(
                        530,
                        "index columns must all precede the data columns".into(),
                    ));
                }
                Column::Index { axis }
            }
            (Some(_), Some(i)) => {
                data_seen = true;
                let width = shape.width(label).unwrap();
                let len = shape.len_of(label).unwrap();
                if i >= len {
                    return Err(parse_err(517, format!("a column index is too large ({field:?})")));
                }
                Column::Data { offset: width * i }
            }
        };
        columns.push(column);
    }

    if !data_seen {
        return Err(parse_err(531, "the file must have at least one data column".into()));
    }
    Ok(columns)
}

// ── Data lines ────────────────────────────────────────────────────────────────

fn store_line(
    line: &str,
    columns: &[Column],
    table: &mut Table,
    rescale: Option<Rescale>,
    name: &str,
    line_no: u64,
    warned_range: &mut bool,
) -> IoResult<usize> {
    let parse_err = |code: u16, message: String| IoError::Parse {
        code,
        message,
        line: line_no,
        file: name.to_string(),
    };

    // Ranges of the row-varying dimensions, in column order.
    let mut ranges: Vec<(usize, Vec<(usize, usize)>)> = Vec::new();
    let mut count = 0usize;

    let mut fields_iter = fields(line);
    for column in columns {
        let field = fields_iter
            .next()
            .ok_or_else(|| parse_err(536, "the line ended before its last column".into()))?;
        let field = field.trim();

        match column {
            Column::Skip => {}
            Column::Index { axis } => {
                let len = table.shape().dims()[*axis].len;
                let parsed = parse_ranges(field, len, warned_range)
                    .map_err(|m| parse_err(534, m))?;
                ranges.push((*axis, parsed));
            }
            Column::Data { offset } => {
                let x: f64 = field
                    .parse()
                    .map_err(|_| parse_err(533, format!("a field contains spurious characters ({field:?})")))?;
                let x = match rescale {
                    Some(r) => r.apply(x),
                    None => x,
                };
                count += broadcast(table, x, *offset, &ranges);
            }
        }
    }

    if fields_iter.next().is_some() {
        return Err(parse_err(532, "the line has more columns than the heading".into()));
    }
    Ok(count)
}

/// Parse an index field: ranges separated by commas, each a single integer
/// or a `lo~hi` pair (either order). Values beyond `len` are dropped, the
/// first time with a warning.
fn parse_ranges(
    field: &str,
    len: usize,
    warned: &mut bool,
) -> Result<Vec<(usize, usize)>, String> {
    let mut out = Vec::new();
    if field.is_empty() {
        return Err("an index field is empty".into());
    }
    for part in field.split(',') {
        let part = part.trim();
        let (lo, hi) = match part.split_once('~') {
            None => {
                let v: usize = part
                    .parse()
                    .map_err(|_| format!("an index field is incorrect ({part:?})"))?;
                (v, v)
            }
            Some((a, b)) => {
                let a: usize = a
                    .trim()
                    .parse()
                    .map_err(|_| format!("an index field is incorrect ({part:?})"))?;
                let b: usize = b
                    .trim()
                    .parse()
                    .map_err(|_| format!("an index field is incorrect ({part:?})"))?;
                (a.min(b), a.max(b))
            }
        };

        let max = len - 1;
        if lo > max {
            if !*warned {
                eprintln!("W387  an index value is out of range and has been ignored");
                *warned = true;
            }
            continue;
        }
        let hi = if hi > max {
            if !*warned {
                eprintln!("W387  an index value is out of range and has been ignored");
                *warned = true;
            }
            max
        } else {
            hi
        };
        out.push((lo, hi));
    }
    Ok(out)
}

/// Spread one value across every index combination of the row's ranges.
/// Works like a multi-base counter, innermost dimension advancing fastest
/// so stores walk the array in memory order.
fn broadcast(table: &mut Table, x: f64, base: usize, ranges: &[(usize, Vec<(usize, usize)>)]) -> usize {
    if ranges.iter().any(|(_, r)| r.is_empty()) {
        return 0; // a dimension's ranges were entirely out of bounds
    }

    let widths: Vec<usize> = ranges
        .iter()
        .map(|(axis, _)| table.shape().width_at(*axis))
        .collect();
    let mut range_pos: Vec<usize> = vec![0; ranges.len()];
    let mut value: Vec<usize> = ranges.iter().map(|(_, r)| r[0].0).collect();
    let mut count = 0usize;

    loop {
        let mut offset = base;
        for (k, &v) in value.iter().enumerate() {
            offset += v * widths[k];
        }
        table.data_mut()[offset] = x;
        count += 1;

        // Advance, carrying from the innermost dimension outward.
        let mut level = ranges.len();
        loop {
            if level == 0 {
                return count;
            }
            level -= 1;
            let (_, segs) = &ranges[level];
            value[level] += 1;
            if value[level] <= segs[range_pos[level]].1 {
                break;
            }
            range_pos[level] += 1;
            if range_pos[level] < segs.len() {
                value[level] = segs[range_pos[level]].0;
                break;
            }
            range_pos[level] = 0;
            value[level] = segs[0].0;
            // carry continues to the next-outer level
        }
    }
}

/// Iterator over the `|`-separated fields of a line (leading `|` skipped).
fn fields(line: &str) -> impl Iterator<Item = &str> {
    line.split('|').skip(1)
}
