//! Unit tests for epi-io.

use std::io::Cursor;

use crate::reader::read_centinel;
use crate::rescale::Rescale;
use crate::shape::{Shape, Table};
use crate::writer::{write_table, Axis, Separator};

fn table(dims: &[(char, usize)]) -> Table {
    Table::zeros(Shape::new(dims).unwrap())
}

fn read(text: &str, table: &mut Table, rescale: Option<Rescale>) -> crate::IoResult<usize> {
    read_centinel(Cursor::new(text), table, rescale, "test")
}

// ── Shape and Table ───────────────────────────────────────────────────────────

mod shape {
    use super::*;

    #[test]
    fn widths_are_trailing_products() {
        let s = Shape::new(&[('i', 4), ('a', 121), ('s', 2)]).unwrap();
        assert_eq!(s.width('i'), Some(242));
        assert_eq!(s.width('a'), Some(2));
        assert_eq!(s.width('s'), Some(1));
        assert_eq!(s.total_len(), 968);
    }

    #[test]
    fn rejects_bad_labels_and_sizes() {
        assert!(Shape::new(&[('A', 2)]).is_err());
        assert!(Shape::new(&[('a', 0)]).is_err());
    }

    #[test]
    fn row_is_last_dimension_slice() {
        let mut t = table(&[('y', 3), ('s', 2), ('a', 4)]);
        t.set(&[1, 0, 2], 9.5);
        let row = t.row(&[1, 0]);
        assert_eq!(row.len(), 4);
        assert_eq!(row[2], 9.5);
    }
}

// ── Rescale ───────────────────────────────────────────────────────────────────

mod rescale {
    use super::*;

    #[test]
    fn parse_forms() {
        let r: Rescale = "x*2-2".parse().unwrap();
        assert_eq!(r.apply(3.0), 4.0);

        let r: Rescale = "x/5+1".parse().unwrap();
        assert_eq!(r.apply(10.0), 3.0);

        let r: Rescale = "x".parse().unwrap();
        assert_eq!(r, Rescale::IDENTITY);

        let r: Rescale = "n/5".parse().unwrap();
        assert_eq!(r.apply(12.0), 2.0); // truncated after division
    }

    #[test]
    fn parse_failures() {
        assert!("y*2".parse::<Rescale>().is_err());
        assert!("x/0".parse::<Rescale>().is_err());
        assert!("x*".parse::<Rescale>().is_err());
        assert!("x*2*3".parse::<Rescale>().is_err());
    }
}

// ── Reader ────────────────────────────────────────────────────────────────────

mod reader {
    use super::*;

    const TWO_DIM: &str = "\
A comment line describing the file.

|i |j0   |j1   |j2
|0 |0.11 |0.16 |0.23
|1 |0.35 |0.87 |0.99
|2 |0.39 |0.26 |0.98
";

    #[test]
    fn reads_frozen_column_format() {
        let mut t = table(&[('i', 3), ('j', 3)]);
        let n = read(TWO_DIM, &mut t, None).unwrap();
        assert_eq!(n, 9);
        assert_eq!(t.get(&[0, 0]), 0.11);
        assert_eq!(t.get(&[1, 2]), 0.99);
        assert_eq!(t.get(&[2, 1]), 0.26);
    }

    #[test]
    fn rows_may_come_in_any_order() {
        let scrambled = "\
|i |j0   |j1   |j2
|2 |0.39 |0.26 |0.98
|0 |0.11 |0.16 |0.23
|1 |0.35 |0.87 |0.99
";
        let mut a = table(&[('i', 3), ('j', 3)]);
        let mut b = table(&[('i', 3), ('j', 3)]);
        read(TWO_DIM, &mut a, None).unwrap();
        read(scrambled, &mut b, None).unwrap();
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn one_dimensional_z_format() {
        let text = "\
|i   |z
|0   |0.1
|1   |0.4
|2,4 |0.9
|3   |0.7
";
        let mut t = table(&[('i', 5)]);
        let n = read(text, &mut t, None).unwrap();
        assert_eq!(n, 5);
        assert_eq!(t.data(), &[0.1, 0.4, 0.9, 0.7, 0.9]);
    }

    #[test]
    fn range_lists_broadcast() {
        let text = "\
|i     |j0 |j1 |j2
|0,3~4 |1  |2  |3
";
        let mut t = table(&[('i', 5), ('j', 3)]);
        let n = read(text, &mut t, None).unwrap();
        assert_eq!(n, 9);
        for i in [0usize, 3, 4] {
            assert_eq!(t.row(&[i]), &[1.0, 2.0, 3.0]);
        }
        assert_eq!(t.row(&[1]), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn multiple_index_columns_broadcast_jointly() {
        let text = "\
|i   |k   |j0
|0~1 |1,3 |6.5
";
        let mut t = table(&[('i', 2), ('k', 4), ('j', 1)]);
        assert_eq!(read(text, &mut t, None).unwrap(), 4);
        for i in 0..2 {
            assert_eq!(t.get(&[i, 1, 0]), 6.5);
            assert_eq!(t.get(&[i, 3, 0]), 6.5);
            assert_eq!(t.get(&[i, 0, 0]), 0.0);
        }
    }

    #[test]
    fn descending_range_normalises() {
        let text = "\
|i   |j0
|4~2 |7
";
        let mut t = table(&[('i', 5), ('j', 1)]);
        assert_eq!(read(text, &mut t, None).unwrap(), 3);
        assert_eq!(t.get(&[2, 0]), 7.0);
        assert_eq!(t.get(&[4, 0]), 7.0);
    }

    #[test]
    fn out_of_range_indices_are_ignored() {
        let text = "\
|i    |j0
|0,99 |1.5
";
        let mut t = table(&[('i', 3), ('j', 1)]);
        assert_eq!(read(text, &mut t, None).unwrap(), 1);
        assert_eq!(t.get(&[0, 0]), 1.5);
    }

    #[test]
    fn unknown_labels_are_skipped() {
        let text = "\
|i |w    |j0
|1 |-5   |3.25
";
        let mut t = table(&[('i', 3), ('j', 1)]);
        assert_eq!(read(text, &mut t, None).unwrap(), 1);
        assert_eq!(t.get(&[1, 0]), 3.25);
    }

    #[test]
    fn rescale_applies_on_read() {
        let text = "\
|i |j0
|0 |10
|1 |25
";
        let mut t = table(&[('i', 2), ('j', 1)]);
        read(text, &mut t, Some("n/10".parse().unwrap())).unwrap();
        assert_eq!(t.get(&[0, 0]), 1.0);
        assert_eq!(t.get(&[1, 0]), 2.0); // 2.5 truncated
    }

    // ── Failure model ─────────────────────────────────────────────────────

    #[test]
    fn file_without_data_errors() {
        let mut t = table(&[('i', 2), ('j', 1)]);
        let err = read("just a comment\n", &mut t, None).unwrap_err();
        assert!(err.to_string().contains("F514"));
    }

    #[test]
    fn bad_header_label_errors_with_line() {
        let mut t = table(&[('i', 2), ('j', 1)]);
        let err = read("|i |J0\n|0 |1\n", &mut t, None).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("F524") && msg.contains("line 1"), "{msg}");
    }

    #[test]
    fn spurious_characters_error_with_line() {
        let text = "\
|i |j0
|0 |1.5x
";
        let mut t = table(&[('i', 2), ('j', 1)]);
        let err = read(text, &mut t, None).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("F533") && msg.contains("line 2"), "{msg}");
    }

    #[test]
    fn short_line_errors() {
        let text = "\
|i |j0 |j1
|0 |1.5
";
        let mut t = table(&[('i', 2), ('j', 2)]);
        assert!(read(text, &mut t, None).is_err());
    }

    #[test]
    fn index_after_data_errors() {
        let mut t = table(&[('i', 2), ('j', 2)]);
        let err = read("|j0 |i |j1\n|1 |0 |2\n", &mut t, None).unwrap_err();
        assert!(err.to_string().contains("F530"));
    }

    #[test]
    fn header_without_data_column_errors() {
        let mut t = table(&[('i', 2), ('j', 2)]);
        let err = read("|i |j\n|0 |1\n", &mut t, None).unwrap_err();
        assert!(err.to_string().contains("F531"));
    }
}

// ── Writer ────────────────────────────────────────────────────────────────────

mod writer {
    use super::*;

    fn sample() -> Table {
        let mut t = table(&[('i', 3), ('j', 5)]);
        for i in 0..3 {
            for j in 0..5 {
                t.set(&[i, j], (i * 5 + j + 1) as f64);
            }
        }
        t
    }

    #[test]
    fn space_separated_rows() {
        let mut out = Vec::new();
        write_table(&mut out, &sample(), None, Separator::Space, "").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "1 2 3 4 5\n6 7 8 9 10\n11 12 13 14 15\n");
    }

    #[test]
    fn comma_separated_rows() {
        let mut out = Vec::new();
        write_table(&mut out, &sample(), None, Separator::Comma, "").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("1,2,3,4,5\n"));
    }

    #[test]
    fn newline_separator_puts_every_value_on_a_line() {
        let mut t = table(&[('i', 2), ('j', 2)]);
        t.set(&[0, 0], 1.0);
        t.set(&[1, 1], 4.0);
        let mut out = Vec::new();
        write_table(&mut out, &t, None, Separator::Newline, "").unwrap();
        let lines: Vec<&str> = std::str::from_utf8(&out).unwrap().trim_end().lines().collect();
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn explicit_axis_order_transposes() {
        let axes = [
            Axis::full('j', 5),
            Axis::full('i', 3).with_break(),
        ];
        let mut out = Vec::new();
        write_table(&mut out, &sample(), Some(&axes), Separator::Space, "").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("1 6 11\n2 7 12\n"));
    }

    #[test]
    fn bars_round_trip() {
        let t = sample();
        let mut out = Vec::new();
        write_table(&mut out, &t, None, Separator::Bars, "Sample table").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("|i |j0|j1|j2|j3|j4"), "{text}");

        let mut back = table(&[('i', 3), ('j', 5)]);
        read(&text, &mut back, None).unwrap();
        assert_eq!(back.data(), t.data());
    }
}
