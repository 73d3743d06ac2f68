/*!
This crate provides a streaming reader for delimited tabular text (CSV,
TSV and whitespace-separated values) that materializes a typed columnar
[`Table`].

The input is scanned exactly once at the byte level. Field and row
boundaries are recorded as flat offset arrays over one contiguous byte
buffer (no per-field strings), and each column is then materialized by
trying the element types integer, float, boolean and string in order:
integers promote to floats in place, while a fall to boolean or string
re-evaluates the column from the first row so every cell is interpreted
under the final type's missing/true/false rules. Per-cell missingness is
tracked in a bit-packed mask parallel to each column's values.

Quoted fields (with doubled-quote and backslash escapes), CRLF input,
comment lines, blank-line skipping, C-style escapes and whitespace-run
separators are all handled in the scan pass; see [`ReadOptions`] for the
full option surface. Paths ending in `.gz` stream through gzip
decompression.

# Example

```
use tabread::ReadOptions;

# fn example() -> tabread::Result<()> {
let data = "\
city,pop,area
Boston,4628910,4.5
Concord,42695,NA
";
let table = ReadOptions::new().read_reader(data.as_bytes(), data.len())?;

assert_eq!(table.names(), &["city", "pop", "area"]);
assert_eq!(table.column(1).as_int(), Some(&[4628910, 42695][..]));
assert_eq!(table.column(2).as_float(), Some(&[4.5, 0.0][..]));
assert!(table.column(2).is_missing(1));
# Ok(()) }
# example().unwrap();
```

Reading from a file path infers the separator from the suffix:

```no_run
# fn example() -> tabread::Result<()> {
let table = tabread::read_table("populations.tsv")?;
# Ok(()) }
```

Tables can be written back out as delimited text with [`write_table`], as
HTML with [`write_html`], or snapshotted through any serde serializer
(`Table` implements `serde::Serialize`).
*/

#![deny(missing_docs)]

pub use crate::column::{Cell, Column, Factor, Mask};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::html::write_html;
pub use crate::options::{ElType, ReadOptions};
pub use crate::reader::read_table;
pub use crate::table::Table;
pub use crate::writer::{write_table, WriteOptions};

mod column;
mod error;
mod html;
mod materialize;
mod options;
mod reader;
mod table;
mod writer;
