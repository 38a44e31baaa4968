//! Linear rescaling of values as they are read.
//!
//! Datasets ship at national scale; a laptop run wants them at a fifth of
//! that. The expression grammar matches what the data files were prepared
//! against:
//!
//! | Expression | Effect                                  |
//! |------------|-----------------------------------------|
//! | `x`        | identity                                |
//! | `x*m+b`    | multiply then add (also `x*m-b`)        |
//! | `x/m+b`    | divide then add (also `x/m-b`)          |
//! | `n/5`      | like `x/5`, then truncate to integer    |
//!
//! Either the `*m`/`/m` or the `+b`/`-b` part may be omitted.

use std::str::FromStr;

use crate::error::IoError;

/// A parsed `m·x + b` transform, optionally truncating to integer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rescale {
    pub mul: f64,
    pub add: f64,
    pub trunc: bool,
}

impl Rescale {
    pub const IDENTITY: Rescale = Rescale { mul: 1.0, add: 0.0, trunc: false };

    #[inline]
    pub fn apply(&self, x: f64) -> f64 {
        let y = x * self.mul + self.add;
        if self.trunc {
            y.trunc()
        } else {
            y
        }
    }
}

impl FromStr for Rescale {
    type Err = IoError;

    fn from_str(expr: &str) -> Result<Rescale, IoError> {
        let syntax = || IoError::RescaleSyntax { expr: expr.to_string() };

        let mut chars = expr.chars();
        let trunc = match chars.next() {
            Some('x') => false,
            Some('n') => true,
            _ => return Err(IoError::RescaleStart { expr: expr.to_string() }),
        };

        let mut rest = chars.as_str();
        let mut mul = 1.0;
        let mut add = 0.0;

        if let Some(op) = rest.chars().next() {
            if op == '*' || op == '/' {
                let tail = &rest[1..];
                let end = tail
                    .find(|c: char| c == '+' || c == '-')
                    .unwrap_or(tail.len());
                let m: f64 = tail[..end].parse().map_err(|_| syntax())?;
                if op == '/' {
                    if m == 0.0 {
                        return Err(IoError::RescaleZeroDivide { expr: expr.to_string() });
                    }
                    mul = 1.0 / m;
                } else {
                    mul = m;
                }
                rest = &tail[end..];
            }
        }

        if !rest.is_empty() {
            let op = rest.chars().next().unwrap();
            if op != '+' && op != '-' {
                return Err(syntax());
            }
            // Parse the sign together with the number.
            add = rest.parse().map_err(|_| syntax())?;
        }

        Ok(Rescale { mul, add, trunc })
    }
}
