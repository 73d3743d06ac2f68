use std::error::Error as StdError;
use std::fmt;
use std::io::{self, BufRead};

use crate::buffer::TokenBuffer;

/// Returns true for the ASCII whitespace bytes `0x09..=0x0D` and `0x20`.
#[inline]
pub fn is_whitespace(b: u8) -> bool {
    (0x09..=0x0D).contains(&b) || b == 0x20
}

/// Returns true for the line terminator bytes `\n` and `\r`.
#[inline]
pub fn is_newline(b: u8) -> bool {
    b == b'\n' || b == b'\r'
}

/// The C-escape translation table: `\n`, `\t`, `\r`, `\a`, `\b`, `\f`,
/// `\v` and `\\`. Any other pair is a scan error.
#[inline]
fn merge_escape(b: u8) -> Option<u8> {
    match b {
        b'n' => Some(b'\n'),
        b't' => Some(b'\t'),
        b'r' => Some(b'\r'),
        b'a' => Some(0x07),
        b'b' => Some(0x08),
        b'f' => Some(0x0C),
        b'v' => Some(0x0B),
        b'\\' => Some(b'\\'),
        _ => None,
    }
}

/// How fields are separated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Separator {
    /// A single separator byte. The default is `b','`.
    Byte(u8),
    /// Whitespace mode: space and tab both separate fields, and runs of
    /// whitespace collapse to a single field break.
    Whitespace,
}

impl Default for Separator {
    fn default() -> Separator {
        Separator::Byte(b',')
    }
}

/// Scanner configuration: the separator, the quote set and the comment
/// byte. The four behavior flags live in [`ScanFlags`] so that the hot
/// loop can be monomorphized over them.
#[derive(Clone, Debug)]
pub struct ScanConfig {
    /// How fields are separated.
    pub separator: Separator,
    /// The set of bytes that open and close quoted fields.
    pub quotes: Vec<u8>,
    /// The byte that introduces a comment when `comments` is enabled.
    pub comment: u8,
}

impl Default for ScanConfig {
    fn default() -> ScanConfig {
        ScanConfig {
            separator: Separator::default(),
            quotes: vec![b'"'],
            comment: b'#',
        }
    }
}

/// The scanner specialization flags.
///
/// Each combination selects one of the sixteen compiled variants of the
/// scan loop (whitespace mode, the fourth axis, is implied by
/// [`Separator::Whitespace`]).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ScanFlags {
    /// Recognize comment lines and comment tails at field starts.
    pub comments: bool,
    /// Skip blank lines outside quoted regions.
    pub blanks: bool,
    /// Honor C-style backslash escapes outside quoted regions.
    pub escapes: bool,
}

/// Counts reported by a completed scan.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ScanSummary {
    /// Bytes consumed from the input stream.
    pub bytes: usize,
    /// Fields recorded, excluding the dummy entry.
    pub fields: usize,
    /// Rows recorded, excluding the dummy entry.
    pub rows: usize,
    /// The byte read past the last recorded row, if scanning stopped at a
    /// row limit. Feed it to the next scan to continue the same stream.
    pub peeked: Option<u8>,
}

/// An error that can occur while scanning.
#[derive(Debug)]
pub enum ScanError {
    /// An I/O error from the underlying stream.
    Io(io::Error),
    /// A backslash pair outside quotes that is not in the C-escape table.
    BadEscape {
        /// The byte following the backslash.
        found: u8,
    },
}

impl From<io::Error> for ScanError {
    fn from(err: io::Error) -> ScanError {
        ScanError::Io(err)
    }
}

impl StdError for ScanError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self {
            ScanError::Io(ref err) => Some(err),
            ScanError::BadEscape { .. } => None,
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ScanError::Io(ref err) => err.fmt(f),
            ScanError::BadEscape { found } => write!(
                f,
                "unrecognized escape sequence '\\{}'",
                (found as char).escape_default()
            ),
        }
    }
}

/// Scan up to `limit` rows (all rows when `None`) from `rdr` into `buf`.
///
/// `buf` is reset before any byte is consumed. `peeked` chains scans over
/// one logical pass of the stream: when a previous scan stopped at a row
/// limit it had already read one byte past its last row, returned in
/// [`ScanSummary::peeked`]; passing that byte here continues the stream
/// without loss.
///
/// The scan stops at EOF or after `limit` rows. An input that ends without
/// a trailing newline still closes its final field and row.
pub fn scan_rows<R: BufRead>(
    rdr: &mut R,
    buf: &mut TokenBuffer,
    config: &ScanConfig,
    flags: ScanFlags,
    limit: Option<usize>,
    peeked: Option<u8>,
) -> Result<ScanSummary, ScanError> {
    let white = config.separator == Separator::Whitespace;
    match (flags.comments, flags.blanks, flags.escapes, white) {
        (false, false, false, false) => scan::<R, false, false, false, false>(rdr, buf, config, limit, peeked),
        (false, false, false, true) => scan::<R, false, false, false, true>(rdr, buf, config, limit, peeked),
        (false, false, true, false) => scan::<R, false, false, true, false>(rdr, buf, config, limit, peeked),
        (false, false, true, true) => scan::<R, false, false, true, true>(rdr, buf, config, limit, peeked),
        (false, true, false, false) => scan::<R, false, true, false, false>(rdr, buf, config, limit, peeked),
        (false, true, false, true) => scan::<R, false, true, false, true>(rdr, buf, config, limit, peeked),
        (false, true, true, false) => scan::<R, false, true, true, false>(rdr, buf, config, limit, peeked),
        (false, true, true, true) => scan::<R, false, true, true, true>(rdr, buf, config, limit, peeked),
        (true, false, false, false) => scan::<R, true, false, false, false>(rdr, buf, config, limit, peeked),
        (true, false, false, true) => scan::<R, true, false, false, true>(rdr, buf, config, limit, peeked),
        (true, false, true, false) => scan::<R, true, false, true, false>(rdr, buf, config, limit, peeked),
        (true, false, true, true) => scan::<R, true, false, true, true>(rdr, buf, config, limit, peeked),
        (true, true, false, false) => scan::<R, true, true, false, false>(rdr, buf, config, limit, peeked),
        (true, true, false, true) => scan::<R, true, true, false, true>(rdr, buf, config, limit, peeked),
        (true, true, true, false) => scan::<R, true, true, true, false>(rdr, buf, config, limit, peeked),
        (true, true, true, true) => scan::<R, true, true, true, true>(rdr, buf, config, limit, peeked),
    }
}

/// Read one byte. `BufRead` keeps this cheap: nearly every call is a copy
/// out of the buffered block.
#[inline(always)]
fn next_byte<R: BufRead>(rdr: &mut R) -> io::Result<Option<u8>> {
    let buf = rdr.fill_buf()?;
    if buf.is_empty() {
        return Ok(None);
    }
    let b = buf[0];
    rdr.consume(1);
    Ok(Some(b))
}

#[inline(always)]
fn scan<
    R: BufRead,
    const COMMENTS: bool,
    const BLANKS: bool,
    const ESCAPES: bool,
    const WHITE: bool,
>(
    rdr: &mut R,
    buf: &mut TokenBuffer,
    config: &ScanConfig,
    limit: Option<usize>,
    peeked: Option<u8>,
) -> Result<ScanSummary, ScanError> {
    buf.reset();
    if limit == Some(0) {
        return Ok(ScanSummary { bytes: 0, fields: 0, rows: 0, peeked });
    }

    let sep = match config.separator {
        Separator::Byte(b) => b,
        Separator::Whitespace => b' ',
    };
    let quotes = config.quotes.as_slice();

    // The rolling two-byte window: `chr` is bound each iteration, `next`
    // is the lookahead.
    let mut next = match peeked {
        Some(b) => Some(b),
        None => next_byte(rdr)?,
    };
    let mut nread = if next.is_some() { 1 } else { 0 };

    let mut in_quotes = false;
    let mut in_escape = false;
    // No content byte has been stored for the current field yet. Comment
    // bytes are only recognized while this holds.
    let mut field_fresh = true;
    // Nothing at all has happened on the current row yet. A newline seen
    // while this holds is a blank line.
    let mut row_dirty = false;
    // Whitespace mode: suppress field breaks until the first content byte
    // of the line.
    let mut skip_white = true;
    let mut cur_quoted = false;
    let mut rows = 0usize;

    while let Some(chr) = next {
        next = next_byte(rdr)?;
        if next.is_some() {
            nread += 1;
        }

        if in_quotes {
            if in_escape {
                buf.push_byte(chr);
                in_escape = false;
            } else if chr == b'\\'
                && matches!(next, Some(nb) if nb == b'\\' || quotes.contains(&nb))
            {
                in_escape = true;
            } else if quotes.contains(&chr) {
                if next == Some(chr) {
                    // Doubled-quote escape: drop this one, take the next
                    // literally.
                    in_escape = true;
                } else {
                    in_quotes = false;
                }
            } else {
                buf.push_byte(chr);
            }
            continue;
        }

        if COMMENTS && field_fresh && chr == config.comment {
            let at_line_start = !row_dirty;
            // Consume through the end of the line.
            while let Some(b) = next {
                next = next_byte(rdr)?;
                if next.is_some() {
                    nread += 1;
                }
                if b == b'\n' {
                    break;
                }
                if b == b'\r' {
                    if next == Some(b'\n') {
                        next = next_byte(rdr)?;
                        if next.is_some() {
                            nread += 1;
                        }
                    }
                    break;
                }
            }
            if at_line_start {
                // The whole line was a comment; no row is emitted.
                continue;
            }
            // A comment after a field break ends the line right here.
            buf.close_field(cur_quoted);
            buf.close_line();
            rows += 1;
            cur_quoted = false;
            field_fresh = true;
            row_dirty = false;
            skip_white = true;
            if limit.map_or(false, |n| rows >= n) {
                return Ok(summary(buf, nread, next));
            }
            continue;
        }

        if ESCAPES && chr == b'\\' {
            if let Some(nb) = next {
                let merged = match merge_escape(nb) {
                    Some(m) => m,
                    None => return Err(ScanError::BadEscape { found: nb }),
                };
                next = next_byte(rdr)?;
                if next.is_some() {
                    nread += 1;
                }
                // The merged byte is literal content; it must not be
                // reclassified as a separator or terminator.
                buf.push_byte(merged);
                field_fresh = false;
                row_dirty = true;
                skip_white = false;
                continue;
            }
            // A trailing backslash at EOF is a literal byte.
        }

        if quotes.contains(&chr) {
            in_quotes = true;
            cur_quoted = true;
            field_fresh = false;
            row_dirty = true;
            skip_white = false;
            continue;
        }

        let is_sep = if WHITE { chr == b' ' || chr == b'\t' } else { chr == sep };
        if is_sep {
            if WHITE {
                // Collapse runs: only the last whitespace byte before
                // content closes a field, and never before the first
                // content byte of the line or at end of line.
                let next_breaks = match next {
                    Some(b) => b == b' ' || b == b'\t' || is_newline(b),
                    None => true,
                };
                if skip_white || next_breaks {
                    continue;
                }
            }
            buf.close_field(cur_quoted);
            cur_quoted = false;
            field_fresh = true;
            row_dirty = true;
            continue;
        }

        if is_newline(chr) {
            if chr == b'\r' && next == Some(b'\n') {
                next = next_byte(rdr)?;
                if next.is_some() {
                    nread += 1;
                }
            }
            if BLANKS && !row_dirty {
                continue;
            }
            buf.close_field(cur_quoted);
            buf.close_line();
            rows += 1;
            cur_quoted = false;
            field_fresh = true;
            row_dirty = false;
            skip_white = true;
            if limit.map_or(false, |n| rows >= n) {
                return Ok(summary(buf, nread, next));
            }
            continue;
        }

        buf.push_byte(chr);
        field_fresh = false;
        row_dirty = true;
        skip_white = false;
    }

    // EOF without a trailing newline: the open field and row still close.
    if row_dirty {
        buf.close_field(cur_quoted);
        buf.close_line();
    }
    Ok(summary(buf, nread, None))
}

fn summary(buf: &TokenBuffer, nread: usize, peeked: Option<u8>) -> ScanSummary {
    ScanSummary {
        bytes: nread,
        fields: buf.num_fields(),
        rows: buf.num_rows(),
        peeked,
    }
}

#[cfg(test)]
mod tests {
    use super::{scan_rows, ScanConfig, ScanFlags, Separator};
    use crate::buffer::TokenBuffer;

    fn scan_all(data: &str, config: &ScanConfig, flags: ScanFlags) -> TokenBuffer {
        let mut buf = TokenBuffer::new();
        let mut rdr = data.as_bytes();
        scan_rows(&mut rdr, &mut buf, config, flags, None, None).unwrap();
        buf
    }

    fn fields(buf: &TokenBuffer) -> Vec<String> {
        (0..buf.num_fields())
            .map(|k| String::from_utf8(buf.field(k).to_vec()).unwrap())
            .collect()
    }

    #[test]
    fn plain_rows() {
        let buf = scan_all("a,b,c\n1,2,3\n", &ScanConfig::default(), ScanFlags::default());
        assert_eq!(buf.num_rows(), 2);
        assert_eq!(fields(&buf), vec!["a", "b", "c", "1", "2", "3"]);
    }

    #[test]
    fn no_trailing_newline() {
        let buf = scan_all("a,b\n1,2", &ScanConfig::default(), ScanFlags::default());
        assert_eq!(buf.num_rows(), 2);
        assert_eq!(fields(&buf), vec!["a", "b", "1", "2"]);
    }

    #[test]
    fn crlf_is_one_terminator() {
        let buf = scan_all("a,b\r\n1,2\r\n", &ScanConfig::default(), ScanFlags::default());
        assert_eq!(buf.num_rows(), 2);
        assert_eq!(fields(&buf), vec!["a", "b", "1", "2"]);
    }

    #[test]
    fn bare_cr_is_a_terminator() {
        let buf = scan_all("a,b\r1,2\r", &ScanConfig::default(), ScanFlags::default());
        assert_eq!(buf.num_rows(), 2);
        assert_eq!(fields(&buf), vec!["a", "b", "1", "2"]);
    }

    #[test]
    fn empty_fields() {
        let buf = scan_all("a,,c\n,,\n", &ScanConfig::default(), ScanFlags::default());
        assert_eq!(buf.num_rows(), 2);
        assert_eq!(fields(&buf), vec!["a", "", "c", "", "", ""]);
    }

    #[test]
    fn quoted_separator_and_newline() {
        let buf = scan_all(
            "\"x,y\",\"a\nb\"\n",
            &ScanConfig::default(),
            ScanFlags::default(),
        );
        assert_eq!(buf.num_rows(), 1);
        assert_eq!(fields(&buf), vec!["x,y", "a\nb"]);
        assert!(buf.was_quoted(0));
        assert!(buf.was_quoted(1));
    }

    #[test]
    fn doubled_quote_escape() {
        let buf = scan_all(
            "\"he said \"\"hi\"\"\"\n",
            &ScanConfig::default(),
            ScanFlags::default(),
        );
        assert_eq!(fields(&buf), vec!["he said \"hi\""]);
    }

    #[test]
    fn backslash_quote_escape() {
        let buf = scan_all("\"a\\\"b\"\n", &ScanConfig::default(), ScanFlags::default());
        assert_eq!(fields(&buf), vec!["a\"b"]);
    }

    #[test]
    fn adjacent_escapes_inside_quotes() {
        // `\\` resolves to one backslash, after which the quote closes.
        let buf = scan_all("\"x\\\\\",y\n", &ScanConfig::default(), ScanFlags::default());
        assert_eq!(fields(&buf), vec!["x\\", "y"]);
    }

    #[test]
    fn quote_in_midfield_flags_field() {
        let buf = scan_all("a\"b,c\"d\n", &ScanConfig::default(), ScanFlags::default());
        assert_eq!(fields(&buf), vec!["ab,cd"]);
        assert!(buf.was_quoted(0));
    }

    #[test]
    fn blank_lines_skipped() {
        let flags = ScanFlags { blanks: true, ..ScanFlags::default() };
        let buf = scan_all("a,b\n\n\n1,2\n\n", &ScanConfig::default(), flags);
        assert_eq!(buf.num_rows(), 2);
        assert_eq!(fields(&buf), vec!["a", "b", "1", "2"]);
    }

    #[test]
    fn leading_blank_lines_skipped() {
        let flags = ScanFlags { blanks: true, ..ScanFlags::default() };
        let buf = scan_all("\n\r\na,b\n", &ScanConfig::default(), flags);
        assert_eq!(buf.num_rows(), 1);
        assert_eq!(fields(&buf), vec!["a", "b"]);
    }

    #[test]
    fn blank_lines_kept_when_disabled() {
        let buf = scan_all("a\n\nb\n", &ScanConfig::default(), ScanFlags::default());
        assert_eq!(buf.num_rows(), 3);
        assert_eq!(fields(&buf), vec!["a", "", "b"]);
    }

    #[test]
    fn comment_line_emits_no_row() {
        let flags = ScanFlags { comments: true, ..ScanFlags::default() };
        let buf = scan_all("# note\na,b\n# tail\n1,2\n", &ScanConfig::default(), flags);
        assert_eq!(buf.num_rows(), 2);
        assert_eq!(fields(&buf), vec!["a", "b", "1", "2"]);
    }

    #[test]
    fn comment_at_field_start_ends_line() {
        let flags = ScanFlags { comments: true, ..ScanFlags::default() };
        let buf = scan_all("1,#note\n2,3\n", &ScanConfig::default(), flags);
        assert_eq!(buf.num_rows(), 2);
        assert_eq!(fields(&buf), vec!["1", "", "2", "3"]);
    }

    #[test]
    fn comment_mid_field_is_literal() {
        let flags = ScanFlags { comments: true, ..ScanFlags::default() };
        let buf = scan_all("1,2 # note\n3,4\n", &ScanConfig::default(), flags);
        assert_eq!(buf.num_rows(), 2);
        assert_eq!(fields(&buf), vec!["1", "2 # note", "3", "4"]);
    }

    #[test]
    fn comment_inside_quotes_is_literal() {
        let flags = ScanFlags { comments: true, ..ScanFlags::default() };
        let buf = scan_all("\"#x\",y\n", &ScanConfig::default(), flags);
        assert_eq!(buf.num_rows(), 1);
        assert_eq!(fields(&buf), vec!["#x", "y"]);
    }

    #[test]
    fn trailing_comment_without_newline() {
        let flags = ScanFlags { comments: true, ..ScanFlags::default() };
        let buf = scan_all("a,b\n# done", &ScanConfig::default(), flags);
        assert_eq!(buf.num_rows(), 1);
        assert_eq!(fields(&buf), vec!["a", "b"]);
    }

    #[test]
    fn c_escapes_merge() {
        let flags = ScanFlags { escapes: true, ..ScanFlags::default() };
        let buf = scan_all("a\\tb,c\\\\d\n", &ScanConfig::default(), flags);
        assert_eq!(fields(&buf), vec!["a\tb", "c\\d"]);
    }

    #[test]
    fn escaped_newline_is_not_a_terminator() {
        let flags = ScanFlags { escapes: true, ..ScanFlags::default() };
        let buf = scan_all("a\\nb,c\n", &ScanConfig::default(), flags);
        assert_eq!(buf.num_rows(), 1);
        assert_eq!(fields(&buf), vec!["a\nb", "c"]);
    }

    #[test]
    fn bad_escape_errors() {
        let flags = ScanFlags { escapes: true, ..ScanFlags::default() };
        let mut buf = TokenBuffer::new();
        let mut rdr = &b"a\\qb\n"[..];
        let err =
            scan_rows(&mut rdr, &mut buf, &ScanConfig::default(), flags, None, None).unwrap_err();
        assert!(err.to_string().contains("\\q"), "got: {}", err);
    }

    #[test]
    fn whitespace_mode_collapses_runs() {
        let config = ScanConfig { separator: Separator::Whitespace, ..ScanConfig::default() };
        let buf = scan_all("1 2\n3  \t 4\n", &config, ScanFlags::default());
        assert_eq!(buf.num_rows(), 2);
        assert_eq!(fields(&buf), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn whitespace_mode_trims_line_edges() {
        let config = ScanConfig { separator: Separator::Whitespace, ..ScanConfig::default() };
        let buf = scan_all("  1 2  \n", &config, ScanFlags::default());
        assert_eq!(buf.num_rows(), 1);
        assert_eq!(fields(&buf), vec!["1", "2"]);
    }

    #[test]
    fn row_limit_returns_peeked_byte() {
        let mut buf = TokenBuffer::new();
        let mut rdr = &b"a,b\n1,2\n"[..];
        let head = scan_rows(
            &mut rdr,
            &mut buf,
            &ScanConfig::default(),
            ScanFlags::default(),
            Some(1),
            None,
        )
        .unwrap();
        assert_eq!(head.rows, 1);
        assert_eq!(head.peeked, Some(b'1'));
        assert_eq!(fields(&buf), vec!["a", "b"]);

        let body = scan_rows(
            &mut rdr,
            &mut buf,
            &ScanConfig::default(),
            ScanFlags::default(),
            None,
            head.peeked,
        )
        .unwrap();
        assert_eq!(body.rows, 1);
        assert_eq!(body.peeked, None);
        assert_eq!(fields(&buf), vec!["1", "2"]);
    }

    #[test]
    fn alternate_quote_set() {
        let config = ScanConfig { quotes: vec![b'\''], ..ScanConfig::default() };
        let buf = scan_all("'a,b',c\n", &config, ScanFlags::default());
        assert_eq!(fields(&buf), vec!["a,b", "c"]);
    }

    #[test]
    fn tab_separator() {
        let config = ScanConfig { separator: Separator::Byte(b'\t'), ..ScanConfig::default() };
        let buf = scan_all("a\tb\n1\t2\n", &config, ScanFlags::default());
        assert_eq!(fields(&buf), vec!["a", "b", "1", "2"]);
    }

    #[test]
    fn zero_limit_consumes_nothing() {
        let mut buf = TokenBuffer::new();
        let mut rdr = &b"a,b\n"[..];
        let summary = scan_rows(
            &mut rdr,
            &mut buf,
            &ScanConfig::default(),
            ScanFlags::default(),
            Some(0),
            None,
        )
        .unwrap();
        assert_eq!(summary.rows, 0);
        assert_eq!(rdr.len(), 4);
    }
}
