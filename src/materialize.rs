use std::str;

use tabread_core::{
    matches_any, parse_bool, parse_float, parse_int, trim_whitespace, TokenBuffer,
};

use crate::column::{Column, Factor, Mask};
use crate::error::{Error, ErrorKind, Result};
use crate::options::{ElType, ReadOptions};

/// Build one typed column per position from the scanned buffer.
///
/// Columns with a declared element type must parse under it; the rest go
/// through the inference ladder int -> float -> bool -> string. The ladder
/// promotes int to float in place (a lossless reinterpretation of the
/// already-stored prefix) but restarts the column from row zero when
/// falling to bool or string, because the NA and true/false literal sets
/// give cells different meanings under those types.
pub(crate) fn materialize(
    buf: &TokenBuffer,
    rows: usize,
    cols: usize,
    opts: &ReadOptions,
) -> Result<Vec<Column>> {
    if !opts.eltypes.is_empty() && opts.eltypes.len() != cols {
        return Err(Error::config(format!(
            "{} declared element types for {} columns",
            opts.eltypes.len(),
            cols
        )));
    }
    (0..cols)
        .map(|j| {
            let column = match opts.eltypes.get(j) {
                Some(&eltype) => declared_column(buf, rows, cols, j, eltype, opts)?,
                None => inferred_column(buf, rows, cols, j, opts)?,
            };
            Ok(match column {
                Column::Str { values, missing } if opts.make_factors => {
                    Column::Factor(Factor::from_values(values, missing))
                }
                other => other,
            })
        })
        .collect()
}

/// The cell at row `i`, column `j`: its (possibly trimmed) bytes and its
/// quoted flag.
fn cell<'a>(
    buf: &'a TokenBuffer,
    cols: usize,
    i: usize,
    j: usize,
    opts: &ReadOptions,
) -> (&'a [u8], bool) {
    let k = i * cols + j;
    let field = buf.field(k);
    let quoted = buf.was_quoted(k);
    if opts.ignore_padding && !quoted {
        (trim_whitespace(field), quoted)
    } else {
        (field, quoted)
    }
}

/// Missingness for the scalar types: empty cells and NA literals, quoted
/// or not.
fn is_na(field: &[u8], opts: &ReadOptions) -> bool {
    field.is_empty() || matches_any(field, &opts.na_strings)
}

fn value_error(field: &[u8], i: usize, j: usize, expected: ElType) -> Error {
    Error::new(ErrorKind::Value {
        row: i + 1,
        col: j + 1,
        text: String::from_utf8_lossy(field).into_owned(),
        expected,
    })
}

fn declared_column(
    buf: &TokenBuffer,
    rows: usize,
    cols: usize,
    j: usize,
    eltype: ElType,
    opts: &ReadOptions,
) -> Result<Column> {
    match eltype {
        ElType::Int => {
            let mut values = Vec::with_capacity(rows);
            let mut missing = Mask::new();
            for i in 0..rows {
                let (field, _) = cell(buf, cols, i, j, opts);
                if is_na(field, opts) {
                    values.push(0);
                    missing.push(true);
                } else {
                    match parse_int(field) {
                        Some(v) => {
                            values.push(v);
                            missing.push(false);
                        }
                        None => return Err(value_error(field, i, j, eltype)),
                    }
                }
            }
            Ok(Column::Int { values, missing })
        }
        ElType::Float => {
            let mut values = Vec::with_capacity(rows);
            let mut missing = Mask::new();
            for i in 0..rows {
                let (field, _) = cell(buf, cols, i, j, opts);
                if is_na(field, opts) {
                    values.push(0.0);
                    missing.push(true);
                } else {
                    match parse_float(field) {
                        Some(v) => {
                            values.push(v);
                            missing.push(false);
                        }
                        None => return Err(value_error(field, i, j, eltype)),
                    }
                }
            }
            Ok(Column::Float { values, missing })
        }
        ElType::Bool => {
            let mut values = Vec::with_capacity(rows);
            let mut missing = Mask::new();
            for i in 0..rows {
                let (field, _) = cell(buf, cols, i, j, opts);
                if is_na(field, opts) {
                    values.push(false);
                    missing.push(true);
                } else {
                    match parse_bool(field, &opts.true_strings, &opts.false_strings) {
                        Some(v) => {
                            values.push(v);
                            missing.push(false);
                        }
                        None => return Err(value_error(field, i, j, eltype)),
                    }
                }
            }
            Ok(Column::Bool { values, missing })
        }
        ElType::Str => string_column(buf, rows, cols, j, opts),
    }
}

fn inferred_column(
    buf: &TokenBuffer,
    rows: usize,
    cols: usize,
    j: usize,
    opts: &ReadOptions,
) -> Result<Column> {
    // Integers first. A failing cell converts the stored prefix to float
    // and retries that same cell; row iteration never restarts here.
    let mut ints: Vec<i64> = Vec::with_capacity(rows);
    let mut missing = Mask::new();
    let mut floats: Option<Vec<f64>> = None;
    let mut i = 0;
    while i < rows {
        let (field, _) = cell(buf, cols, i, j, opts);
        if is_na(field, opts) {
            ints.push(0);
            missing.push(true);
            i += 1;
            continue;
        }
        match parse_int(field) {
            Some(v) => {
                ints.push(v);
                missing.push(false);
                i += 1;
            }
            None => {
                floats = Some(ints.iter().map(|&v| v as f64).collect());
                break;
            }
        }
    }
    let mut values = match floats {
        None => return Ok(Column::Int { values: ints, missing }),
        Some(values) => values,
    };

    let mut float_ok = true;
    while i < rows {
        let (field, _) = cell(buf, cols, i, j, opts);
        if is_na(field, opts) {
            values.push(0.0);
            missing.push(true);
            i += 1;
            continue;
        }
        match parse_float(field) {
            Some(v) => {
                values.push(v);
                missing.push(false);
                i += 1;
            }
            None => {
                float_ok = false;
                break;
            }
        }
    }
    if float_ok {
        return Ok(Column::Float { values, missing });
    }

    // The float attempt failed; re-evaluate every cell as boolean, and on
    // any failure fall through to string.
    if let Some(column) = bool_column(buf, rows, cols, j, opts) {
        return Ok(column);
    }
    string_column(buf, rows, cols, j, opts)
}

fn bool_column(
    buf: &TokenBuffer,
    rows: usize,
    cols: usize,
    j: usize,
    opts: &ReadOptions,
) -> Option<Column> {
    let mut values = Vec::with_capacity(rows);
    let mut missing = Mask::new();
    for i in 0..rows {
        let (field, _) = cell(buf, cols, i, j, opts);
        if is_na(field, opts) {
            values.push(false);
            missing.push(true);
        } else {
            values.push(parse_bool(field, &opts.true_strings, &opts.false_strings)?);
            missing.push(false);
        }
    }
    Some(Column::Bool { values, missing })
}

fn string_column(
    buf: &TokenBuffer,
    rows: usize,
    cols: usize,
    j: usize,
    opts: &ReadOptions,
) -> Result<Column> {
    let mut values = Vec::with_capacity(rows);
    let mut missing = Mask::new();
    for i in 0..rows {
        let (field, quoted) = cell(buf, cols, i, j, opts);
        // An unquoted empty cell is missing; a quoted one is a present
        // empty string.
        if field.is_empty() {
            values.push(String::new());
            missing.push(!quoted);
            continue;
        }
        if matches_any(field, &opts.na_strings) {
            values.push(String::new());
            missing.push(true);
            continue;
        }
        match str::from_utf8(field) {
            Ok(s) => {
                values.push(s.to_string());
                missing.push(false);
            }
            Err(_) => {
                return Err(Error::new(ErrorKind::Utf8 { row: i + 1, col: j + 1 }));
            }
        }
    }
    Ok(Column::Str { values, missing })
}

#[cfg(test)]
mod tests {
    use tabread_core::{scan_rows, ScanConfig, ScanFlags, TokenBuffer};

    use super::materialize;
    use crate::column::Column;
    use crate::error::ErrorKind;
    use crate::options::{ElType, ReadOptions};

    fn scan(data: &str) -> (TokenBuffer, usize, usize) {
        let mut buf = TokenBuffer::new();
        let mut rdr = data.as_bytes();
        let summary = scan_rows(
            &mut rdr,
            &mut buf,
            &ScanConfig::default(),
            ScanFlags::default(),
            None,
            None,
        )
        .unwrap();
        let cols = summary.fields / summary.rows;
        (buf, summary.rows, cols)
    }

    fn columns(data: &str, opts: &ReadOptions) -> Vec<Column> {
        let (buf, rows, cols) = scan(data);
        materialize(&buf, rows, cols, opts).unwrap()
    }

    #[test]
    fn all_ints() {
        let cols = columns("1,2\n3,4\n", &ReadOptions::new());
        assert_eq!(cols[0].as_int(), Some(&[1, 3][..]));
        assert_eq!(cols[1].as_int(), Some(&[2, 4][..]));
    }

    #[test]
    fn int_promotes_to_float_in_place() {
        let cols = columns("1\n2.5\n3\n", &ReadOptions::new());
        assert_eq!(cols[0].as_float(), Some(&[1.0, 2.5, 3.0][..]));
    }

    #[test]
    fn numbers_fall_through_to_string() {
        let cols = columns("1\nx\n", &ReadOptions::new());
        let values = cols[0].as_str().unwrap();
        assert_eq!(values, &["1".to_string(), "x".to_string()]);
    }

    #[test]
    fn bool_inference() {
        let cols = columns("T\nfalse\nTRUE\n", &ReadOptions::new());
        assert_eq!(cols[0].as_bool(), Some(&[true, false, true][..]));
    }

    #[test]
    fn na_cells_are_missing_with_zero_value() {
        let cols = columns("1,x\nNA,NA\n", &ReadOptions::new());
        assert_eq!(cols[0].as_int(), Some(&[1, 0][..]));
        assert!(cols[0].is_missing(1));
        assert_eq!(cols[1].as_str().unwrap()[1], "");
        assert!(cols[1].is_missing(1));
    }

    #[test]
    fn quoted_empty_string_is_present() {
        let cols = columns("\"\"\nx\n", &ReadOptions::new());
        assert!(!cols[0].is_missing(0));
        assert_eq!(cols[0].as_str().unwrap()[0], "");
    }

    #[test]
    fn unquoted_empty_string_is_missing() {
        let cols = columns("a,\nb,c\n", &ReadOptions::new());
        assert!(cols[1].is_missing(0));
        assert!(!cols[1].is_missing(1));
    }

    #[test]
    fn padding_trimmed_outside_quotes_only() {
        let cols = columns("  7 ,\" x \"\n8,\"y\"\n", &ReadOptions::new());
        assert_eq!(cols[0].as_int(), Some(&[7, 8][..]));
        assert_eq!(cols[1].as_str().unwrap()[0], " x ");
    }

    #[test]
    fn padding_kept_when_disabled() {
        let cols = columns(" a \nb\n", ReadOptions::new().ignore_padding(false));
        assert_eq!(cols[0].as_str().unwrap()[0], " a ");
    }

    #[test]
    fn declared_type_enforced() {
        let (buf, rows, cols) = scan("1\nx\n");
        let err = materialize(&buf, rows, cols, ReadOptions::new().eltypes(&[ElType::Int]))
            .unwrap_err();
        match err.kind() {
            ErrorKind::Value { row, col, text, expected } => {
                assert_eq!((*row, *col), (2, 1));
                assert_eq!(text, "x");
                assert_eq!(*expected, ElType::Int);
            }
            wrong => panic!("expected Value error, got {:?}", wrong),
        }
    }

    #[test]
    fn declared_float_accepts_ints() {
        let cols = columns("1\n2\n", ReadOptions::new().eltypes(&[ElType::Float]));
        assert_eq!(cols[0].as_float(), Some(&[1.0, 2.0][..]));
    }

    #[test]
    fn eltypes_count_must_match() {
        let (buf, rows, cols) = scan("1,2\n");
        let err = materialize(&buf, rows, cols, ReadOptions::new().eltypes(&[ElType::Int]))
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Config(_)));
    }

    #[test]
    fn factors_wrap_string_columns() {
        let cols = columns("red\nblue\nred\n", ReadOptions::new().make_factors(true));
        let f = cols[0].as_factor().unwrap();
        assert_eq!(f.levels(), &["blue".to_string(), "red".to_string()]);
        assert_eq!(f.codes(), &[1, 0, 1]);
    }

    #[test]
    fn factors_leave_numeric_columns_alone() {
        let cols = columns("1\n2\n", ReadOptions::new().make_factors(true));
        assert!(cols[0].as_int().is_some());
    }

    #[test]
    fn true_literal_becomes_string_under_custom_sets() {
        // With `T` removed from the true set, a `T` cell forces the
        // column all the way down the ladder to string.
        let cols = columns("T\nF\n", ReadOptions::new().true_strings(&["yes"]).false_strings(&["no"]));
        assert_eq!(
            cols[0].as_str().unwrap(),
            &["T".to_string(), "F".to_string()]
        );
    }
}
