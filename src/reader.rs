use std::cmp;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use log::debug;
use memchr::memchr;

use tabread_core::{
    scan_rows, trim_whitespace, ScanConfig, ScanFlags, TokenBuffer,
};

use crate::column::{identifier, unique_names};
use crate::error::{Error, ErrorKind, Result};
use crate::materialize::materialize;
use crate::options::ReadOptions;
use crate::table::Table;

/// Read a table from a file path with the default options.
///
/// The separator is inferred from the file suffix (after stripping a
/// trailing `.gz`): `.csv` is comma, `.tsv` is tab, `.wsv` is space, and
/// anything else is comma. A `.gz` suffix routes through streaming gzip
/// decompression. To customize parsing, use [`ReadOptions`].
///
/// # Example
///
/// ```no_run
/// # fn example() -> tabread::Result<()> {
/// let table = tabread::read_table("cities.csv")?;
/// for (name, column) in table.names().iter().zip(table.columns()) {
///     println!("{}: {}", name, column.eltype());
/// }
/// # Ok(()) }
/// ```
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    ReadOptions::new().read_path(path)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Compression {
    None,
    Gzip,
    Bzip2,
}

fn compression_for_path(path: &Path) -> Compression {
    match path.extension().and_then(OsStr::to_str) {
        Some("gz") => Compression::Gzip,
        Some("bz") | Some("bz2") => Compression::Bzip2,
        _ => Compression::None,
    }
}

/// The separator implied by the file suffix, after stripping any
/// compression suffix.
fn separator_for_path(path: &Path) -> u8 {
    let mut path = path.to_path_buf();
    if compression_for_path(&path) != Compression::None {
        path.set_extension("");
    }
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => b',',
        Some("tsv") => b'\t',
        Some("wsv") => b' ',
        _ => b',',
    }
}

fn buffer_capacity(nbytes: usize) -> usize {
    cmp::max(1, nbytes)
}

impl ReadOptions {
    /// Read a table from a file path.
    ///
    /// Routes by suffix: `.gz` streams through gzip decompression with an
    /// input buffer pre-sized to twice the compressed size, `.bz`/`.bz2`
    /// and URL-shaped paths are rejected, and anything else is read as a
    /// plain file with an input buffer pre-sized to the file size. The
    /// file handle is released on every exit path.
    pub fn read_path<P: AsRef<Path>>(&self, path: P) -> Result<Table> {
        let opts = self.validated()?;
        let path = path.as_ref();
        if let Some(s) = path.to_str() {
            if s.starts_with("http://") || s.starts_with("ftp://") {
                return Err(Error::config(format!(
                    "remote input {:?} is not supported; download it first",
                    s
                )));
            }
        }
        let inferred = separator_for_path(path);
        match compression_for_path(path) {
            Compression::Bzip2 => Err(Error::config(
                "bzip2-compressed input is not supported; \
                 decompress it first",
            )),
            Compression::Gzip => {
                let file = File::open(path)?;
                let nbytes = file.metadata()?.len() as usize;
                let rdr = BufReader::with_capacity(
                    buffer_capacity(nbytes.saturating_mul(2)),
                    GzDecoder::new(file),
                );
                read_impl(rdr, nbytes.saturating_mul(2), &opts, Some(inferred))
            }
            Compression::None => {
                let file = File::open(path)?;
                let nbytes = file.metadata()?.len() as usize;
                let rdr = BufReader::with_capacity(buffer_capacity(nbytes), file);
                read_impl(rdr, nbytes, &opts, Some(inferred))
            }
        }
    }

    /// Read a table from any reader.
    ///
    /// `nbytes_hint` pre-sizes the input and token buffers; it does not
    /// bound how much is read.
    pub fn read_reader<R: Read>(&self, rdr: R, nbytes_hint: usize) -> Result<Table> {
        let opts = self.validated()?;
        let rdr = BufReader::with_capacity(buffer_capacity(nbytes_hint), rdr);
        read_impl(rdr, nbytes_hint, &opts, None)
    }
}

fn read_impl<R: BufRead>(
    mut rdr: R,
    nbytes_hint: usize,
    opts: &ReadOptions,
    inferred_separator: Option<u8>,
) -> Result<Table> {
    let config = ScanConfig {
        separator: opts.resolved_separator(inferred_separator),
        quotes: opts.quotemarks.clone(),
        comment: opts.comment_mark,
    };
    let flags = ScanFlags {
        comments: opts.allow_comments,
        blanks: opts.skip_blanks,
        escapes: opts.allow_escapes,
    };

    for _ in 0..opts.skip_start {
        skip_line(&mut rdr)?;
    }

    let mut buf = TokenBuffer::with_capacity(nbytes_hint);

    // The header row and the body share one pass over the stream: the
    // header scan reads one byte past its row, which seeds the body scan.
    let mut peeked = None;
    let mut header = None;
    if opts.header {
        let summary = scan_rows(&mut rdr, &mut buf, &config, flags, Some(1), None)?;
        if summary.rows > 0 {
            let names = (0..buf.num_fields())
                .map(|k| {
                    let field = buf.field(k);
                    let field = if opts.ignore_padding && !buf.was_quoted(k) {
                        trim_whitespace(field)
                    } else {
                        field
                    };
                    String::from_utf8_lossy(field).into_owned()
                })
                .collect::<Vec<_>>();
            header = Some(names);
        }
        peeked = summary.peeked;
    }

    let summary = scan_rows(&mut rdr, &mut buf, &config, flags, opts.row_limit(), peeked)?;
    let (rows, fields) = (summary.rows, summary.fields);
    if rows == 0 || fields == 0 {
        return Err(Error::new(ErrorKind::EmptyInput));
    }

    let cols = fields / rows;
    check_row_shapes(&buf, rows, fields, cols)?;

    let names = column_names(header, opts, cols)?;
    let columns = materialize(&buf, rows, cols, opts)?;
    debug!(
        "read {} rows x {} cols ({} input bytes)",
        rows, cols, summary.bytes
    );
    Ok(Table::new(names, columns))
}

/// Consume one physical line, terminator included. EOF counts as a line
/// end.
fn skip_line<R: BufRead>(rdr: &mut R) -> Result<()> {
    loop {
        let (done, used) = {
            let available = rdr.fill_buf()?;
            if available.is_empty() {
                return Ok(());
            }
            match memchr(b'\n', available) {
                Some(i) => (true, i + 1),
                None => (false, available.len()),
            }
        };
        rdr.consume(used);
        if done {
            return Ok(());
        }
    }
}

/// Verify that every row has `cols` fields. On a mismatch, report the
/// first row deviating from the median field count.
fn check_row_shapes(
    buf: &TokenBuffer,
    rows: usize,
    fields: usize,
    cols: usize,
) -> Result<()> {
    let counts = row_field_counts(buf);
    if fields == rows * cols && counts.iter().all(|&n| n == cols) {
        return Ok(());
    }
    let mut sorted = counts.clone();
    sorted.sort_unstable();
    let median = sorted[sorted.len() / 2];
    let (row, &found) = counts
        .iter()
        .enumerate()
        .find(|&(_, &n)| n != median)
        .expect("at least one row deviates from the median");
    Err(Error::new(ErrorKind::UnequalLengths {
        row: row + 1,
        found,
        expected: median,
        rows,
        fields,
    }))
}

/// Count the fields of each row by walking `bounds` against `lines`.
fn row_field_counts(buf: &TokenBuffer) -> Vec<usize> {
    let bounds = buf.bounds();
    let lines = buf.lines();
    let mut counts = Vec::with_capacity(lines.len().saturating_sub(1));
    let mut k = 1;
    for &end in &lines[1..] {
        let mut n = 0;
        while k < bounds.len() && bounds[k] <= end {
            n += 1;
            k += 1;
        }
        counts.push(n);
    }
    counts
}

fn column_names(
    header: Option<Vec<String>>,
    opts: &ReadOptions,
    cols: usize,
) -> Result<Vec<String>> {
    if !opts.names.is_empty() {
        if opts.names.len() != cols {
            return Err(Error::config(format!(
                "{} column names for {} columns",
                opts.names.len(),
                cols
            )));
        }
        return Ok(opts.names.clone());
    }
    match header {
        Some(raw) => {
            if raw.len() != cols {
                return Err(Error::config(format!(
                    "the header has {} columns but the body has {}",
                    raw.len(),
                    cols
                )));
            }
            Ok(unique_names(raw.iter().map(|s| identifier(s)).collect()))
        }
        None => Ok((1..=cols).map(|j| format!("x{}", j)).collect()),
    }
}
