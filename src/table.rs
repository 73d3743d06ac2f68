use serde::Serialize;

use crate::column::Column;

/// A columnar table: one name and one typed column per position.
///
/// Tables are immutable once built. `Table` derives [`serde::Serialize`],
/// so any serde serializer can snapshot one; the framing and format are
/// the serializer's concern.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
}

impl Table {
    pub(crate) fn new(names: Vec<String>, columns: Vec<Column>) -> Table {
        debug_assert_eq!(names.len(), columns.len());
        Table { names, columns }
    }

    /// The number of rows.
    pub fn nrows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// The number of columns.
    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    /// The column names, in column order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The columns, in column order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// The column at index `j`.
    ///
    /// Panics when `j` is out of bounds.
    pub fn column(&self, j: usize) -> &Column {
        &self.columns[j]
    }

    /// The column named `name`, if any.
    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|j| &self.columns[j])
    }
}
