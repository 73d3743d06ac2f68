use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::result;

use tabread_core::ScanError;

use crate::options::ElType;

/// A type alias for `Result<T, tabread::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur while reading or writing a table.
///
/// Every error is fatal to the parse that raised it: there is no partial
/// table on failure, and the input handle is released on all exit paths.
#[derive(Debug)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Error(Box::new(kind))
    }

    pub(crate) fn config<S: Into<String>>(msg: S) -> Error {
        Error::new(ErrorKind::Config(msg.into()))
    }

    /// Return the specific type of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Unwrap this error into its underlying type.
    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Returns true if this is an I/O error.
    ///
    /// If this is true, the underlying `ErrorKind` is guaranteed to be
    /// `ErrorKind::Io`.
    pub fn is_io_error(&self) -> bool {
        matches!(*self.0, ErrorKind::Io(_))
    }
}

/// The specific type of an error.
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// An I/O error that occurred while reading input or writing output.
    Io(io::Error),
    /// The options were rejected before any byte of input was consumed:
    /// an unsupported encoding, a non-`.` decimal, a non-empty row skip
    /// set, an invalid declared element type, conflicting deprecated and
    /// current arguments, or an unsupported input path.
    Config(String),
    /// The input produced zero bytes, zero rows or zero fields.
    EmptyInput,
    /// A row was found whose number of fields differs from the rest of
    /// the input.
    UnequalLengths {
        /// The first row (1-based, counting data rows as scanned) whose
        /// field count deviates from the median.
        row: usize,
        /// The number of fields in that row.
        found: usize,
        /// The field count the rest of the input agrees on.
        expected: usize,
        /// Total rows scanned.
        rows: usize,
        /// Total fields scanned.
        fields: usize,
    },
    /// A cell was rejected by the column's declared element type.
    Value {
        /// The row of the offending cell (1-based, data rows).
        row: usize,
        /// The column of the offending cell (1-based).
        col: usize,
        /// The offending cell text, lossily decoded for display.
        text: String,
        /// The declared element type that rejected the cell.
        expected: ElType,
    },
    /// A backslash pair outside quotes that is not in the C-escape table.
    /// Only raised when escapes are enabled.
    Escape {
        /// The byte following the backslash.
        found: u8,
    },
    /// A string cell contained invalid UTF-8. Only the `utf8` encoding is
    /// supported.
    Utf8 {
        /// The row of the offending cell (1-based, data rows).
        row: usize,
        /// The column of the offending cell (1-based).
        col: usize,
    },
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::new(ErrorKind::Io(err))
    }
}

impl From<ScanError> for Error {
    fn from(err: ScanError) -> Error {
        match err {
            ScanError::Io(err) => Error::new(ErrorKind::Io(err)),
            ScanError::BadEscape { found } => {
                Error::new(ErrorKind::Escape { found })
            }
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        io::Error::new(io::ErrorKind::Other, err)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self.0 {
            ErrorKind::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self.0 {
            ErrorKind::Io(ref err) => err.fmt(f),
            ErrorKind::Config(ref msg) => write!(f, "invalid configuration: {}", msg),
            ErrorKind::EmptyInput => write!(f, "empty input: no rows or fields were read"),
            ErrorKind::UnequalLengths { row, found, expected, rows, fields } => write!(
                f,
                "row {} has {} columns, but {} were expected \
                 ({} fields over {} rows in total)",
                row, found, expected, fields, rows
            ),
            ErrorKind::Value { row, col, ref text, expected } => write!(
                f,
                "cell at row {}, column {} ({:?}) cannot be parsed as declared type {}",
                row, col, text, expected
            ),
            ErrorKind::Escape { found } => write!(
                f,
                "unrecognized escape sequence '\\{}'",
                (found as char).escape_default()
            ),
            ErrorKind::Utf8 { row, col } => write!(
                f,
                "cell at row {}, column {} is not valid UTF-8",
                row, col
            ),
        }
    }
}
