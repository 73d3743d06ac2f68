/*!
`tabread-core` provides the byte-level machinery behind the
[`tabread`](https://docs.rs/tabread) crate: a single-pass scanner that
tokenizes delimited text into a flat [`TokenBuffer`], and the typed field
extractors used to materialize columns from it.

The scanner reads its input exactly once, byte by byte through a two-byte
lookahead window, and records field and row boundaries as indices into one
contiguous byte buffer. No field strings are materialized; cells are byte
ranges addressed through the recorded bounds.

If you're looking for the ergonomic table-reading routines, use the
`tabread` crate instead.

# Example: counting fields and rows

```
use tabread_core::{scan_rows, ScanConfig, ScanFlags, TokenBuffer};

let data = "foo,bar,baz\na,b,c\nxxx,yyy,zzz\n";

let mut buf = TokenBuffer::new();
let mut rdr = data.as_bytes();
let summary =
    scan_rows(&mut rdr, &mut buf, &ScanConfig::default(), ScanFlags::default(), None, None)
        .unwrap();
assert_eq!(summary.rows, 3);
assert_eq!(summary.fields, 9);
assert_eq!(buf.field(4), b"b");
```
*/

#![deny(missing_docs)]

pub use crate::buffer::{Bitmap, TokenBuffer};
pub use crate::extract::{
    matches_any, parse_bool, parse_float, parse_int, trim_whitespace,
};
pub use crate::scanner::{
    is_newline, is_whitespace, scan_rows, ScanConfig, ScanError, ScanFlags,
    ScanSummary, Separator,
};

mod buffer;
mod extract;
mod scanner;
