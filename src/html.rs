use std::io::{self, Write};

use crate::column::Cell;
use crate::error::Result;
use crate::table::Table;

/// Write `table` as an HTML `<table>`.
///
/// Cell text is HTML-escaped (`&`, `<`, `>`). At most `max_rows` data
/// rows are emitted; a truncated table gets one final row naming how many
/// rows were omitted.
///
/// # Example
///
/// ```
/// use tabread::ReadOptions;
///
/// # fn example() -> tabread::Result<()> {
/// let data = "a\n1\n2\n3\n";
/// let table = ReadOptions::new().read_reader(data.as_bytes(), data.len())?;
/// let mut out = vec![];
/// tabread::write_html(&table, &mut out, 2)?;
/// let html = String::from_utf8(out).unwrap();
/// assert!(html.contains("1 more row"));
/// # Ok(()) }
/// # example().unwrap();
/// ```
pub fn write_html<W: Write>(table: &Table, wtr: W, max_rows: usize) -> Result<()> {
    let mut wtr = io::BufWriter::new(wtr);

    writeln!(wtr, "<table>")?;
    writeln!(wtr, "<thead>")?;
    write!(wtr, "<tr>")?;
    for name in table.names() {
        write!(wtr, "<th>{}</th>", escaped(name))?;
    }
    writeln!(wtr, "</tr>")?;
    writeln!(wtr, "</thead>")?;
    writeln!(wtr, "<tbody>")?;

    let shown = table.nrows().min(max_rows);
    for i in 0..shown {
        write!(wtr, "<tr>")?;
        for column in table.columns() {
            match column.cell(i) {
                Cell::Missing => write!(wtr, "<td>NA</td>")?,
                Cell::Int(v) => write!(wtr, "<td>{}</td>", v)?,
                Cell::Float(v) => write!(wtr, "<td>{}</td>", v)?,
                Cell::Bool(v) => write!(wtr, "<td>{}</td>", v)?,
                Cell::Str(s) => write!(wtr, "<td>{}</td>", escaped(s))?,
            }
        }
        writeln!(wtr, "</tr>")?;
    }
    let omitted = table.nrows() - shown;
    if omitted > 0 {
        writeln!(
            wtr,
            "<tr><td colspan=\"{}\">&#8230; with {} more row{}</td></tr>",
            table.ncols(),
            omitted,
            if omitted == 1 { "" } else { "s" }
        )?;
    }
    writeln!(wtr, "</tbody>")?;
    writeln!(wtr, "</table>")?;
    wtr.flush()?;
    Ok(())
}

fn escaped(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}
