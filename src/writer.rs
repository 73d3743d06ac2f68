use std::io::{self, Write};

use memchr::memchr;

use crate::column::Cell;
use crate::error::Result;
use crate::table::Table;

/// Configures how a table is written as delimited text.
///
/// # Example
///
/// ```
/// use tabread::{ReadOptions, WriteOptions};
///
/// # fn example() -> tabread::Result<()> {
/// let data = "a,b\n1,x\n2,y\n";
/// let table = ReadOptions::new().read_reader(data.as_bytes(), data.len())?;
///
/// let mut out = vec![];
/// tabread::write_table(&table, &mut out, &WriteOptions::new())?;
/// assert_eq!(out, b"\"a\",\"b\"\n1,\"x\"\n2,\"y\"\n");
/// # Ok(()) }
/// # example().unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct WriteOptions {
    pub(crate) separator: u8,
    pub(crate) quotemark: u8,
    pub(crate) na: String,
}

impl Default for WriteOptions {
    fn default() -> WriteOptions {
        WriteOptions { separator: b',', quotemark: b'"', na: "NA".to_string() }
    }
}

impl WriteOptions {
    /// Create options with the default configuration: comma separator,
    /// `"` quote mark, missing cells written as `NA`.
    pub fn new() -> WriteOptions {
        WriteOptions::default()
    }

    /// The field separator byte. The default is `b','`.
    pub fn separator(&mut self, separator: u8) -> &mut WriteOptions {
        self.separator = separator;
        self
    }

    /// The quote byte wrapped around non-numeric fields. The default is
    /// `b'"'`.
    pub fn quotemark(&mut self, quotemark: u8) -> &mut WriteOptions {
        self.quotemark = quotemark;
        self
    }

    /// The literal written for missing cells. The default is `NA`.
    pub fn na(&mut self, na: &str) -> &mut WriteOptions {
        self.na = na.to_string();
        self
    }
}

/// Write `table` as delimited text.
///
/// Column names and string cells are quoted, with quote bytes inside them
/// doubled; numeric and boolean cells are written bare; missing cells are
/// written as the configured NA literal, unquoted. Rows end with `\n`.
pub fn write_table<W: Write>(table: &Table, wtr: W, opts: &WriteOptions) -> Result<()> {
    let mut wtr = io::BufWriter::new(wtr);
    let sep = [opts.separator];

    for (j, name) in table.names().iter().enumerate() {
        if j > 0 {
            wtr.write_all(&sep)?;
        }
        write_quoted(&mut wtr, name, opts.quotemark)?;
    }
    wtr.write_all(b"\n")?;

    for i in 0..table.nrows() {
        for (j, column) in table.columns().iter().enumerate() {
            if j > 0 {
                wtr.write_all(&sep)?;
            }
            match column.cell(i) {
                Cell::Missing => wtr.write_all(opts.na.as_bytes())?,
                Cell::Int(v) => write!(wtr, "{}", v)?,
                Cell::Float(v) => write!(wtr, "{}", v)?,
                Cell::Bool(v) => write!(wtr, "{}", v)?,
                Cell::Str(s) => write_quoted(&mut wtr, s, opts.quotemark)?,
            }
        }
        wtr.write_all(b"\n")?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write one quoted field, doubling any quote byte inside it.
fn write_quoted<W: Write>(wtr: &mut W, field: &str, quote: u8) -> io::Result<()> {
    let q = [quote];
    wtr.write_all(&q)?;
    let mut rest = field.as_bytes();
    while let Some(i) = memchr(quote, rest) {
        wtr.write_all(&rest[..i + 1])?;
        wtr.write_all(&q)?;
        rest = &rest[i + 1..];
    }
    wtr.write_all(rest)?;
    wtr.write_all(&q)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{write_table, WriteOptions};
    use crate::options::ReadOptions;

    fn written(data: &str, opts: &WriteOptions) -> String {
        let table = ReadOptions::new()
            .read_reader(data.as_bytes(), data.len())
            .unwrap();
        let mut out = vec![];
        write_table(&table, &mut out, opts).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn numeric_cells_are_bare() {
        let out = written("a,b\n1,2.5\n", &WriteOptions::new());
        assert_eq!(out, "\"a\",\"b\"\n1,2.5\n");
    }

    #[test]
    fn string_cells_are_quoted_and_escaped() {
        let out = written("a\n\"he said \"\"hi\"\"\"\nplain\n", &WriteOptions::new());
        assert_eq!(out, "\"a\"\n\"he said \"\"hi\"\"\"\n\"plain\"\n");
    }

    #[test]
    fn missing_cells_use_na_literal() {
        let out = written("a,b\n1,x\nNA,NA\n", &WriteOptions::new());
        assert_eq!(out, "\"a\",\"b\"\n1,\"x\"\nNA,NA\n");
    }

    #[test]
    fn custom_separator_and_quote() {
        let out = written("a\nx\n", WriteOptions::new().separator(b';').quotemark(b'\''));
        assert_eq!(out, "'a'\n'x'\n");
    }

    #[test]
    fn bool_cells_are_bare() {
        let out = written("a\nT\nfalse\n", &WriteOptions::new());
        assert_eq!(out, "\"a\"\ntrue\nfalse\n");
    }
}
