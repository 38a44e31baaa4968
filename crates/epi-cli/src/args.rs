//! Command-line parameter binding.
//!
//! Each argument is `NAME=VALUE` with NAME a registered parameter and
//! VALUE a plain decimal literal. Several names may be chained to one
//! value — `mu0=mu1=mu2=0` clears three parameters. Unknown names and
//! malformed values get a one-line diagnostic and are skipped; the run
//! proceeds with whatever did parse.

use epi_model::Params;

/// Apply `NAME=VALUE` arguments to `params`, echoing each accepted
/// setting so the output is a complete record of the run.
pub fn apply_args<'a>(params: &mut Params, args: impl Iterator<Item = &'a str>) {
    let mut lines = 0;
    for (i, arg) in args.enumerate() {
        let position = i + 1;
        let Some(eq) = arg.rfind('=') else {
            println!("E101. Parameter {position} ({arg}) does not have the correct format (name=value).");
            continue;
        };

        let value_text = &arg[eq + 1..];
        if !is_plain_decimal(value_text) {
            println!("E102. Parameter {position} does not contain a simple numeric value (contains \"{value_text}\").");
            continue;
        }
        let value: f64 = value_text.parse().expect("validated decimal");

        for name in arg[..eq].split('=') {
            if params.set(name, value) {
                println!("Parameter:   {name}={value_text}");
                lines += 1;
            } else {
                println!("E103. Parameter {position} ({name}) is not a recognized name.");
            }
        }
    }
    if lines > 0 {
        println!();
    }
}

/// A plain decimal literal: optional leading minus, at least one digit,
/// at most one decimal point, nothing else.
fn is_plain_decimal(s: &str) -> bool {
    let mut digits = 0;
    let mut dots = 0;
    for (j, c) in s.chars().enumerate() {
        match c {
            '-' if j == 0 => {}
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return false,
        }
    }
    digits >= 1 && dots <= 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_decimals() {
        assert!(is_plain_decimal("0"));
        assert!(is_plain_decimal("-1.5"));
        assert!(is_plain_decimal(".5"));
        assert!(!is_plain_decimal(""));
        assert!(!is_plain_decimal("-"));
        assert!(!is_plain_decimal("1e5"));
        assert!(!is_plain_decimal("1.2.3"));
        assert!(!is_plain_decimal("two"));
    }

    #[test]
    fn sets_single_parameter() {
        let mut p = Params::default();
        apply_args(&mut p, ["pcc=0.3"].into_iter());
        assert_eq!(p.pcc, 0.3);
    }

    #[test]
    fn chained_names_share_one_value() {
        let mut p = Params::default();
        apply_args(&mut p, ["rd1=rd2=rd3=0.25"].into_iter());
        assert_eq!(p.recovery[0], [0.25, 0.25]);
        assert_eq!(p.recovery[1], [0.25, 0.25]);
        assert_eq!(p.recovery[2], [0.25, 0.25]);
    }

    #[test]
    fn bad_arguments_are_skipped() {
        let mut p = Params::default();
        let before = p.pcc;
        apply_args(&mut p, ["pcc", "pcc=abc", "nosuch=1", "df=3.5"].into_iter());
        assert_eq!(p.pcc, before);
        assert_eq!(p.df, 3.5);
    }

    #[test]
    fn negative_randseq_parses() {
        let mut p = Params::default();
        apply_args(&mut p, ["randseq=-6"].into_iter());
        assert_eq!(p.randseq, -6.0);
    }
}
