use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;

/// A single value in a result table.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(i64),
    Decimal(Decimal),
    Float(f64),
    Date(NaiveDate),
    /// An undefined value (zero denominator, zero variance, ...).
    Null,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// A decimal rounded to `dp` places, or `Null`.
    pub fn decimal(value: Option<Decimal>, dp: u32) -> Self {
        match value {
            Some(v) => Cell::Decimal(v.round_dp(dp)),
            None => Cell::Null,
        }
    }

    /// A float, or `Null` if absent or NaN.
    pub fn float(value: Option<f64>) -> Self {
        match value {
            Some(v) if !v.is_nan() => Cell::Float(v),
            _ => Cell::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Integer(v) => write!(f, "{v}"),
            Cell::Decimal(v) => write!(f, "{v}"),
            Cell::Float(v) => write!(f, "{v}"),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Cell::Null => Ok(()),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<u64> for Cell {
    fn from(value: u64) -> Self {
        Cell::Integer(value as i64)
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Cell::Integer(value as i64)
    }
}

impl From<NaiveDate> for Cell {
    fn from(value: NaiveDate) -> Self {
        Cell::Date(value)
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Null => serializer.serialize_none(),
            Cell::Integer(v) => serializer.serialize_i64(*v),
            Cell::Float(v) => serializer.serialize_f64(*v),
            other => serializer.collect_str(other),
        }
    }
}

/// A self-describing result table: a name, ordered column labels and ordered rows.
///
/// This is the only shape the report assembler understands, so every analysis
/// result converts into one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row. Rows shorter than the header are padded with `Null`,
    /// longer rows are truncated.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Null);
        self.rows.push(row);
    }

    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }

    /// Cell lookup by row index and column label.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Conversion of an analysis result into its presentation table.
pub trait IntoTable {
    fn to_table(&self) -> Table;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rows_are_padded_to_header_width() {
        let mut table = Table::new("t", ["a", "b", "c"]);
        table.push_row(vec![Cell::text("x")]);
        assert_eq!(table.rows[0], vec![Cell::text("x"), Cell::Null, Cell::Null]);
        assert_eq!(table.cell(0, "a"), Some(&Cell::text("x")));
        assert_eq!(table.cell(0, "missing"), None);
    }

    #[test]
    fn null_and_nan_render_empty() {
        assert_eq!(Cell::Null.to_string(), "");
        assert!(Cell::float(Some(f64::NAN)).is_null());
        assert_eq!(Cell::decimal(Some(dec!(1.005)), 2).to_string(), "1.00");
    }
}
