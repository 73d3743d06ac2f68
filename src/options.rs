use std::fmt;

use log::warn;
use tabread_core::Separator;

use crate::error::{Error, Result};

/// A declared column element type.
///
/// Columns without a declared type go through the inference ladder
/// instead: integer, then float, then boolean, then string.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ElType {
    /// Signed 64-bit integer.
    Int,
    /// 64-bit binary floating point.
    Float,
    /// Boolean, matched against the configured true/false literal sets.
    Bool,
    /// UTF-8 string.
    Str,
}

impl fmt::Display for ElType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ElType::Int => write!(f, "i64"),
            ElType::Float => write!(f, "f64"),
            ElType::Bool => write!(f, "bool"),
            ElType::Str => write!(f, "string"),
        }
    }
}

/// Configures how a table is read.
///
/// `ReadOptions` is a builder: construct one with [`ReadOptions::new`],
/// chain the setters, then call [`read_path`](ReadOptions::read_path) or
/// [`read_reader`](ReadOptions::read_reader).
///
/// # Example
///
/// ```no_run
/// use tabread::ReadOptions;
///
/// # fn example() -> tabread::Result<()> {
/// let table = ReadOptions::new()
///     .separator(b';')
///     .header(false)
///     .read_path("data.txt")?;
/// println!("{} x {}", table.nrows(), table.ncols());
/// # Ok(()) }
/// ```
#[derive(Clone, Debug)]
pub struct ReadOptions {
    pub(crate) header: bool,
    pub(crate) separator: Option<u8>,
    pub(crate) quotemarks: Vec<u8>,
    pub(crate) decimal: u8,
    pub(crate) na_strings: Vec<String>,
    pub(crate) true_strings: Vec<String>,
    pub(crate) false_strings: Vec<String>,
    pub(crate) make_factors: bool,
    pub(crate) nrows: i64,
    pub(crate) names: Vec<String>,
    pub(crate) eltypes: Vec<ElType>,
    pub(crate) allow_comments: bool,
    pub(crate) comment_mark: u8,
    pub(crate) ignore_padding: bool,
    pub(crate) skip_start: usize,
    pub(crate) skip_rows: Vec<usize>,
    pub(crate) skip_blanks: bool,
    pub(crate) encoding: String,
    pub(crate) allow_escapes: bool,
    // Deprecated aliases, kept separate so a conflict with the current
    // name can be reported.
    colnames: Vec<String>,
    coltypes: Vec<ElType>,
}

impl Default for ReadOptions {
    fn default() -> ReadOptions {
        ReadOptions {
            header: true,
            separator: None,
            quotemarks: vec![b'"'],
            decimal: b'.',
            na_strings: vec![String::new(), "NA".to_string()],
            true_strings: strings(&["T", "t", "TRUE", "true"]),
            false_strings: strings(&["F", "f", "FALSE", "false"]),
            make_factors: false,
            nrows: -1,
            names: vec![],
            eltypes: vec![],
            allow_comments: false,
            comment_mark: b'#',
            ignore_padding: true,
            skip_start: 0,
            skip_rows: vec![],
            skip_blanks: true,
            encoding: "utf8".to_string(),
            allow_escapes: false,
            colnames: vec![],
            coltypes: vec![],
        }
    }
}

fn strings(set: &[&str]) -> Vec<String> {
    set.iter().map(|s| s.to_string()).collect()
}

impl ReadOptions {
    /// Create options with the default configuration.
    pub fn new() -> ReadOptions {
        ReadOptions::default()
    }

    /// Whether to consume one leading row as column names.
    ///
    /// The default is `true`. When disabled, columns are named
    /// `x1`, `x2`, ... unless [`names`](ReadOptions::names) is given.
    pub fn header(&mut self, yes: bool) -> &mut ReadOptions {
        self.header = yes;
        self
    }

    /// The field separator byte.
    ///
    /// The default is `b','`, or the separator implied by the file suffix
    /// when reading from a path (`.csv` is comma, `.tsv` is tab, `.wsv`
    /// is space). Passing `b' '` activates whitespace mode: space and tab
    /// both separate fields, and runs of whitespace collapse to a single
    /// field break.
    ///
    /// # Example
    ///
    /// ```
    /// use tabread::ReadOptions;
    ///
    /// # fn example() -> tabread::Result<()> {
    /// let data = "a b\n1 2\n3  4\n";
    /// let table = ReadOptions::new()
    ///     .separator(b' ')
    ///     .read_reader(data.as_bytes(), data.len())?;
    /// assert_eq!(table.nrows(), 2);
    /// # Ok(()) }
    /// # example().unwrap();
    /// ```
    pub fn separator(&mut self, separator: u8) -> &mut ReadOptions {
        self.separator = Some(separator);
        self
    }

    /// The set of bytes that open and close quoted fields.
    ///
    /// The default is `"` alone.
    pub fn quotemarks(&mut self, marks: &[u8]) -> &mut ReadOptions {
        self.quotemarks = marks.to_vec();
        self
    }

    /// The decimal separator. Only `b'.'` is supported; any other value
    /// is a configuration error.
    pub fn decimal(&mut self, decimal: u8) -> &mut ReadOptions {
        self.decimal = decimal;
        self
    }

    /// Cell literals that mark a cell as missing.
    ///
    /// The default is the empty string and `NA`.
    ///
    /// # Example
    ///
    /// ```
    /// use tabread::ReadOptions;
    ///
    /// # fn example() -> tabread::Result<()> {
    /// let data = "a\n1\nNULL\n";
    /// let table = ReadOptions::new()
    ///     .na_strings(&["NULL"])
    ///     .read_reader(data.as_bytes(), data.len())?;
    /// assert!(table.column(0).is_missing(1));
    /// # Ok(()) }
    /// # example().unwrap();
    /// ```
    pub fn na_strings(&mut self, set: &[&str]) -> &mut ReadOptions {
        self.na_strings = strings(set);
        self
    }

    /// Cell literals parsed as boolean `true`.
    ///
    /// The default is `T`, `t`, `TRUE` and `true`.
    pub fn true_strings(&mut self, set: &[&str]) -> &mut ReadOptions {
        self.true_strings = strings(set);
        self
    }

    /// Cell literals parsed as boolean `false`.
    ///
    /// The default is `F`, `f`, `FALSE` and `false`.
    pub fn false_strings(&mut self, set: &[&str]) -> &mut ReadOptions {
        self.false_strings = strings(set);
        self
    }

    /// Dictionary-encode string columns as factors.
    ///
    /// The default is `false`.
    pub fn make_factors(&mut self, yes: bool) -> &mut ReadOptions {
        self.make_factors = yes;
        self
    }

    /// The maximum number of data rows to read, or `-1` for all rows.
    ///
    /// The default is `-1`.
    pub fn nrows(&mut self, nrows: i64) -> &mut ReadOptions {
        self.nrows = nrows;
        self
    }

    /// Explicit column names. Overrides the header row.
    pub fn names(&mut self, names: &[&str]) -> &mut ReadOptions {
        self.names = strings(names);
        self
    }

    /// Declared element types, one per column.
    ///
    /// When given, every cell must parse under its column's declared type
    /// or the read fails; the inference ladder is skipped.
    pub fn eltypes(&mut self, eltypes: &[ElType]) -> &mut ReadOptions {
        self.eltypes = eltypes.to_vec();
        self
    }

    /// Treat lines whose fields begin with the comment mark as comments.
    ///
    /// The default is `false`. A comment mark is recognized only at the
    /// start of a field: a whole-line comment vanishes without producing
    /// a row, a comment after a separator ends the row there, and a
    /// comment byte inside a field or inside quotes is a literal.
    pub fn allow_comments(&mut self, yes: bool) -> &mut ReadOptions {
        self.allow_comments = yes;
        self
    }

    /// The comment byte. The default is `b'#'`.
    pub fn comment_mark(&mut self, mark: u8) -> &mut ReadOptions {
        self.comment_mark = mark;
        self
    }

    /// Trim ASCII whitespace from unquoted cells.
    ///
    /// The default is `true`. Quoted cells are never trimmed.
    pub fn ignore_padding(&mut self, yes: bool) -> &mut ReadOptions {
        self.ignore_padding = yes;
        self
    }

    /// The number of physical lines to skip before parsing starts.
    ///
    /// The default is `0`.
    pub fn skip_start(&mut self, lines: usize) -> &mut ReadOptions {
        self.skip_start = lines;
        self
    }

    /// Row indices to skip. Unsupported: any non-empty set is a
    /// configuration error.
    pub fn skip_rows(&mut self, rows: &[usize]) -> &mut ReadOptions {
        self.skip_rows = rows.to_vec();
        self
    }

    /// Skip blank lines outside quoted regions.
    ///
    /// The default is `true`.
    pub fn skip_blanks(&mut self, yes: bool) -> &mut ReadOptions {
        self.skip_blanks = yes;
        self
    }

    /// The input encoding. Only `"utf8"` is supported; any other value is
    /// a configuration error.
    pub fn encoding(&mut self, encoding: &str) -> &mut ReadOptions {
        self.encoding = encoding.to_string();
        self
    }

    /// Honor C-style backslash escapes outside quoted regions.
    ///
    /// The default is `false`. With escapes enabled, `\n`, `\t`, `\r`,
    /// `\a`, `\b`, `\f`, `\v` and `\\` merge to their escaped byte; any
    /// other pair is an error.
    pub fn allow_escapes(&mut self, yes: bool) -> &mut ReadOptions {
        self.allow_escapes = yes;
        self
    }

    /// Deprecated alias for [`names`](ReadOptions::names).
    #[deprecated(note = "use `names` instead")]
    pub fn colnames(&mut self, names: &[&str]) -> &mut ReadOptions {
        warn!("the `colnames` option is deprecated; use `names` instead");
        self.colnames = strings(names);
        self
    }

    /// Deprecated alias for [`eltypes`](ReadOptions::eltypes).
    #[deprecated(note = "use `eltypes` instead")]
    pub fn coltypes(&mut self, eltypes: &[ElType]) -> &mut ReadOptions {
        warn!("the `coltypes` option is deprecated; use `eltypes` instead");
        self.coltypes = eltypes.to_vec();
        self
    }

    /// Check the options and fold deprecated aliases into their current
    /// names. Runs before any input byte is consumed.
    pub(crate) fn validated(&self) -> Result<ReadOptions> {
        if self.encoding != "utf8" {
            return Err(Error::config(format!(
                "unsupported encoding {:?}: only \"utf8\" is supported",
                self.encoding
            )));
        }
        if self.decimal != b'.' {
            return Err(Error::config(format!(
                "unsupported decimal separator {:?}: only '.' is supported",
                self.decimal as char
            )));
        }
        if !self.skip_rows.is_empty() {
            return Err(Error::config(
                "skipping rows by index set is not supported; \
                 `skip_rows` must be empty",
            ));
        }
        if self.nrows < -1 {
            return Err(Error::config(format!(
                "invalid row limit {}: use -1 to read all rows",
                self.nrows
            )));
        }
        if self.quotemarks.is_empty() {
            return Err(Error::config("the quote set must not be empty"));
        }
        let mut resolved = self.clone();
        if !self.colnames.is_empty() {
            if !self.names.is_empty() {
                return Err(Error::config(
                    "both `colnames` (deprecated) and `names` were given; \
                     set only `names`",
                ));
            }
            resolved.names = self.colnames.clone();
        }
        if !self.coltypes.is_empty() {
            if !self.eltypes.is_empty() {
                return Err(Error::config(
                    "both `coltypes` (deprecated) and `eltypes` were given; \
                     set only `eltypes`",
                ));
            }
            resolved.eltypes = self.coltypes.clone();
        }
        resolved.colnames.clear();
        resolved.coltypes.clear();
        Ok(resolved)
    }

    /// The separator to use for an input with no path to sniff.
    pub(crate) fn resolved_separator(&self, inferred: Option<u8>) -> Separator {
        let sep = self.separator.or(inferred).unwrap_or(b',');
        if sep == b' ' {
            Separator::Whitespace
        } else {
            Separator::Byte(sep)
        }
    }

    /// The body row limit as the scanner understands it.
    pub(crate) fn row_limit(&self) -> Option<usize> {
        if self.nrows < 0 {
            None
        } else {
            Some(self.nrows as usize)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ElType, ReadOptions};
    use crate::error::ErrorKind;

    #[test]
    fn defaults_validate() {
        assert!(ReadOptions::new().validated().is_ok());
    }

    #[test]
    fn bad_encoding_rejected() {
        let err = ReadOptions::new().encoding("latin1").validated().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Config(_)));
    }

    #[test]
    fn bad_decimal_rejected() {
        let err = ReadOptions::new().decimal(b',').validated().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Config(_)));
    }

    #[test]
    fn skip_rows_rejected() {
        let err = ReadOptions::new().skip_rows(&[3]).validated().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Config(_)));
    }

    #[test]
    #[allow(deprecated)]
    fn deprecated_alias_resolves() {
        let opts = ReadOptions::new().colnames(&["a", "b"]).validated().unwrap();
        assert_eq!(opts.names, vec!["a", "b"]);
    }

    #[test]
    #[allow(deprecated)]
    fn deprecated_alias_conflicts() {
        let err = ReadOptions::new()
            .colnames(&["a"])
            .names(&["b"])
            .validated()
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Config(_)));

        let err = ReadOptions::new()
            .coltypes(&[ElType::Int])
            .eltypes(&[ElType::Int])
            .validated()
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Config(_)));
    }
}
