use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

use tabread_core::Bitmap;

use crate::options::ElType;

/// A per-cell missing mask, bit-packed, parallel to a column's values.
///
/// Missing cells keep the type's zero value in the value vector; the mask
/// is the only source of truth for missingness.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Mask(Bitmap);

impl Mask {
    /// Create a new empty mask.
    pub fn new() -> Mask {
        Mask::default()
    }

    /// Append one cell's missingness.
    pub fn push(&mut self, missing: bool) {
        self.0.push(missing);
    }

    /// Returns true if cell `i` is missing.
    pub fn get(&self, i: usize) -> bool {
        self.0.get(i)
    }

    /// The number of cells covered by this mask.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if this mask covers no cells.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The number of missing cells.
    pub fn count_missing(&self) -> usize {
        self.0.count_ones()
    }
}

impl Serialize for Mask {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for i in 0..self.0.len() {
            seq.serialize_element(&self.0.get(i))?;
        }
        seq.end()
    }
}

/// A string column stored as a dictionary: sorted unique levels plus one
/// code per cell.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Factor {
    levels: Vec<String>,
    codes: Vec<u32>,
    missing: Mask,
}

impl Factor {
    /// Dictionary-encode a string column. Missing cells are assigned code
    /// zero; the mask keeps them missing.
    pub fn from_values(values: Vec<String>, missing: Mask) -> Factor {
        let mut level_set = BTreeMap::new();
        for (i, v) in values.iter().enumerate() {
            if !missing.get(i) {
                level_set.entry(v.clone()).or_insert(0u32);
            }
        }
        for (code, v) in level_set.values_mut().enumerate() {
            *v = code as u32;
        }
        let codes = values
            .iter()
            .enumerate()
            .map(|(i, v)| if missing.get(i) { 0 } else { level_set[v] })
            .collect();
        Factor {
            levels: level_set.into_keys().collect(),
            codes,
            missing,
        }
    }

    /// The sorted unique levels.
    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    /// One code per cell, indexing into `levels`.
    pub fn codes(&self) -> &[u32] {
        &self.codes
    }

    /// The level text of cell `i`, or `None` when missing.
    pub fn level_of(&self, i: usize) -> Option<&str> {
        if self.missing.get(i) {
            None
        } else {
            Some(&self.levels[self.codes[i] as usize])
        }
    }

    /// The number of cells.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Returns true if this factor has no cells.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// One typed column: a value vector plus a parallel missing mask.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Column {
    /// Signed 64-bit integers.
    Int {
        /// The cell values; missing cells hold zero.
        values: Vec<i64>,
        /// The parallel missing mask.
        missing: Mask,
    },
    /// 64-bit floats.
    Float {
        /// The cell values; missing cells hold zero.
        values: Vec<f64>,
        /// The parallel missing mask.
        missing: Mask,
    },
    /// Booleans.
    Bool {
        /// The cell values; missing cells hold `false`.
        values: Vec<bool>,
        /// The parallel missing mask.
        missing: Mask,
    },
    /// UTF-8 strings.
    Str {
        /// The cell values; missing cells hold the empty string.
        values: Vec<String>,
        /// The parallel missing mask.
        missing: Mask,
    },
    /// A dictionary-encoded string column.
    Factor(Factor),
}

/// A borrowed view of one cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Cell<'a> {
    /// The cell is missing.
    Missing,
    /// An integer cell.
    Int(i64),
    /// A float cell.
    Float(f64),
    /// A boolean cell.
    Bool(bool),
    /// A string or factor-level cell.
    Str(&'a str),
}

impl Column {
    /// The number of cells in this column.
    pub fn len(&self) -> usize {
        match *self {
            Column::Int { ref values, .. } => values.len(),
            Column::Float { ref values, .. } => values.len(),
            Column::Bool { ref values, .. } => values.len(),
            Column::Str { ref values, .. } => values.len(),
            Column::Factor(ref f) => f.len(),
        }
    }

    /// Returns true if this column has no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element type of this column. Factors report `string`.
    pub fn eltype(&self) -> ElType {
        match *self {
            Column::Int { .. } => ElType::Int,
            Column::Float { .. } => ElType::Float,
            Column::Bool { .. } => ElType::Bool,
            Column::Str { .. } | Column::Factor(_) => ElType::Str,
        }
    }

    /// Returns true if cell `i` is missing.
    pub fn is_missing(&self, i: usize) -> bool {
        match *self {
            Column::Int { ref missing, .. } => missing.get(i),
            Column::Float { ref missing, .. } => missing.get(i),
            Column::Bool { ref missing, .. } => missing.get(i),
            Column::Str { ref missing, .. } => missing.get(i),
            Column::Factor(ref f) => f.missing.get(i),
        }
    }

    /// A view of cell `i`.
    pub fn cell(&self, i: usize) -> Cell {
        if self.is_missing(i) {
            return Cell::Missing;
        }
        match *self {
            Column::Int { ref values, .. } => Cell::Int(values[i]),
            Column::Float { ref values, .. } => Cell::Float(values[i]),
            Column::Bool { ref values, .. } => Cell::Bool(values[i]),
            Column::Str { ref values, .. } => Cell::Str(&values[i]),
            Column::Factor(ref f) => Cell::Str(f.level_of(i).unwrap()),
        }
    }

    /// The integer values, when this is an integer column.
    pub fn as_int(&self) -> Option<&[i64]> {
        match *self {
            Column::Int { ref values, .. } => Some(values),
            _ => None,
        }
    }

    /// The float values, when this is a float column.
    pub fn as_float(&self) -> Option<&[f64]> {
        match *self {
            Column::Float { ref values, .. } => Some(values),
            _ => None,
        }
    }

    /// The boolean values, when this is a boolean column.
    pub fn as_bool(&self) -> Option<&[bool]> {
        match *self {
            Column::Bool { ref values, .. } => Some(values),
            _ => None,
        }
    }

    /// The string values, when this is a plain string column.
    pub fn as_str(&self) -> Option<&[String]> {
        match *self {
            Column::Str { ref values, .. } => Some(values),
            _ => None,
        }
    }

    /// The factor, when this is a dictionary-encoded column.
    pub fn as_factor(&self) -> Option<&Factor> {
        match *self {
            Column::Factor(ref f) => Some(f),
            _ => None,
        }
    }
}

/// Sanitize a raw header cell into an identifier-shaped column name:
/// ASCII alphanumerics and underscores survive, everything else becomes an
/// underscore, and a leading digit gets an `x` prefix. An empty cell
/// becomes `x`.
pub(crate) fn identifier(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "x".to_string();
    }
    let mut name = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            name.push(c);
        } else {
            name.push('_');
        }
    }
    if name.as_bytes()[0].is_ascii_digit() {
        name.insert(0, 'x');
    }
    name
}

/// Make a name list unique by suffixing repeats with `_1`, `_2`, ...
pub(crate) fn unique_names(names: Vec<String>) -> Vec<String> {
    let mut seen = BTreeMap::new();
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        match seen.get(&name).copied() {
            None => {
                seen.insert(name.clone(), 0usize);
                out.push(name);
            }
            Some(n) => {
                let mut k = n + 1;
                let mut candidate = format!("{}_{}", name, k);
                while seen.contains_key(&candidate) {
                    k += 1;
                    candidate = format!("{}_{}", name, k);
                }
                seen.insert(name.clone(), k);
                seen.insert(candidate.clone(), 0);
                out.push(candidate);
            }
        }
    }
    out
}
