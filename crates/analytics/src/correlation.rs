use crate::error::AnalyticsError;
use core_types::{Cell, Field, IntoTable, RecordSet, Table};
use itertools::Itertools;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

/// A symmetric Pearson correlation matrix indexed by field.
///
/// Cells involving a zero-variance field are `None`, including that field's
/// diagonal. All other diagonal cells are exactly 1.0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub fields: Vec<Field>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: Field, b: Field) -> Option<f64> {
        let i = self.fields.iter().position(|f| *f == a)?;
        let j = self.fields.iter().position(|f| *f == b)?;
        self.values[i][j]
    }
}

impl IntoTable for CorrelationMatrix {
    fn to_table(&self) -> Table {
        let columns = std::iter::once(String::new())
            .chain(self.fields.iter().map(|f| f.column_name().to_string()));
        let mut table = Table::new("correlation_matrix", columns);

        for (field, row) in self.fields.iter().zip(&self.values) {
            let mut cells = vec![Cell::text(field.column_name())];
            cells.extend(row.iter().map(|v| Cell::float(*v)));
            table.push_row(cells);
        }
        table
    }
}

/// Pearson correlation over an explicit list of numeric fields.
#[derive(Debug, Clone)]
pub struct CorrelationEngine {
    fields: Vec<Field>,
}

impl Default for CorrelationEngine {
    fn default() -> Self {
        Self {
            fields: vec![Field::SalesAmount, Field::UnitsSold, Field::UnitPrice],
        }
    }
}

impl CorrelationEngine {
    pub fn new(fields: Vec<Field>) -> Result<Self, AnalyticsError> {
        if fields.is_empty() {
            return Err(AnalyticsError::InvalidMetricSpec(
                "correlation needs at least one field".to_string(),
            ));
        }
        if let Some(field) = fields.iter().find(|f| !f.is_numeric()) {
            return Err(AnalyticsError::InvalidMetricSpec(format!(
                "cannot correlate non-numeric field '{field}'"
            )));
        }
        Ok(Self { fields })
    }

    pub fn calculate(&self, records: &RecordSet) -> Result<CorrelationMatrix, AnalyticsError> {
        if records.is_empty() {
            return Err(AnalyticsError::EmptyDataset);
        }

        let columns = self
            .fields
            .iter()
            .map(|f| Column::collect(records, *f))
            .collect::<Result<Vec<_>, _>>()?;

        let n = columns.len();
        let mut values = vec![vec![None; n]; n];
        for (i, column) in columns.iter().enumerate() {
            if !column.constant {
                values[i][i] = Some(1.0);
            }
        }
        // Only the upper triangle is computed; the mirror keeps the matrix
        // exactly symmetric.
        for (i, j) in (0..n).tuple_combinations() {
            let r = pearson(&columns[i], &columns[j]).map(round3);
            values[i][j] = r;
            values[j][i] = r;
        }

        tracing::debug!(fields = n, "correlation matrix calculated");
        Ok(CorrelationMatrix {
            fields: self.fields.clone(),
            values,
        })
    }
}

/// A numeric field's centered values.
struct Column {
    centered: Vec<f64>,
    sum_sq: f64,
    /// Decided on the exact decimal values, so float rounding in the mean
    /// cannot give a constant column a tiny non-zero variance.
    constant: bool,
}

impl Column {
    fn collect(records: &RecordSet, field: Field) -> Result<Self, AnalyticsError> {
        let exact: Vec<Decimal> = records
            .iter()
            .map(|r| {
                r.numeric(field).ok_or_else(|| {
                    AnalyticsError::InvalidMetricSpec(format!("field '{field}' is not numeric"))
                })
            })
            .collect::<Result<_, _>>()?;

        let constant = exact.iter().all(|v| *v == exact[0]);
        let floats = exact
            .iter()
            .map(|v| {
                v.to_f64().ok_or_else(|| {
                    AnalyticsError::InternalError(format!("cannot convert {v} to f64"))
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;

        let mean = floats.iter().sum::<f64>() / floats.len() as f64;
        let centered: Vec<f64> = floats.iter().map(|v| v - mean).collect();
        let sum_sq = centered.iter().map(|d| d * d).sum();

        Ok(Self {
            centered,
            sum_sq,
            constant,
        })
    }
}

fn pearson(x: &Column, y: &Column) -> Option<f64> {
    if x.constant || y.constant {
        return None;
    }
    let cov: f64 = x.centered.iter().zip(&y.centered).map(|(a, b)| a * b).sum();
    let r = cov / (x.sum_sq * y.sum_sq).sqrt();
    if r.is_nan() {
        return None;
    }
    Some(r.clamp(-1.0, 1.0))
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;
    use rust_decimal_macros::dec;

    #[test]
    fn matrix_is_symmetric_with_unit_diagonal() {
        let records = RecordSet::new(vec![
            record("2024-01-01", dec!(10), 1, "N", "Toys", "C1", "R1"),
            record("2024-01-02", dec!(25), 2, "N", "Toys", "C1", "R1"),
            record("2024-01-03", dec!(27), 3, "N", "Toys", "C1", "R1"),
            record("2024-01-04", dec!(80), 4, "N", "Toys", "C1", "R1"),
        ]);
        let matrix = CorrelationEngine::default().calculate(&records).unwrap();

        for a in &matrix.fields {
            assert_eq!(matrix.get(*a, *a), Some(1.0));
            for b in &matrix.fields {
                assert_eq!(matrix.get(*a, *b), matrix.get(*b, *a));
            }
        }
        let r = matrix.get(Field::SalesAmount, Field::UnitsSold).unwrap();
        assert!(r > 0.8 && r <= 1.0, "unexpected correlation {r}");
    }

    #[test]
    fn perfectly_linear_fields_correlate_to_one() {
        let records = RecordSet::new(vec![
            record("2024-01-01", dec!(10), 1, "N", "Toys", "C1", "R1"),
            record("2024-01-02", dec!(20), 2, "N", "Toys", "C1", "R1"),
            record("2024-01-03", dec!(30), 3, "N", "Toys", "C1", "R1"),
        ]);
        let matrix = CorrelationEngine::default().calculate(&records).unwrap();
        assert_eq!(matrix.get(Field::SalesAmount, Field::UnitsSold), Some(1.0));
        // unit_price is 10 everywhere.
        assert_eq!(matrix.get(Field::UnitPrice, Field::UnitPrice), None);
        assert_eq!(matrix.get(Field::UnitPrice, Field::SalesAmount), None);
    }

    #[test]
    fn table_renders_undefined_cells_empty() {
        let records = RecordSet::new(vec![
            record("2024-01-01", dec!(10), 1, "N", "Toys", "C1", "R1"),
            record("2024-01-02", dec!(20), 2, "N", "Toys", "C1", "R1"),
        ]);
        let table = CorrelationEngine::default().calculate(&records).unwrap().to_table();
        assert_eq!(table.columns, vec!["", "sales_amount", "units_sold", "unit_price"]);
        assert!(table.cell(2, "unit_price").unwrap().is_null());
        assert_eq!(table.cell(0, "sales_amount"), Some(&Cell::Float(1.0)));
    }

    #[test]
    fn rejects_categorical_fields_and_empty_input() {
        assert!(matches!(
            CorrelationEngine::new(vec![Field::Region]),
            Err(AnalyticsError::InvalidMetricSpec(_))
        ));
        assert_eq!(
            CorrelationEngine::default().calculate(&RecordSet::default()),
            Err(AnalyticsError::EmptyDataset)
        );
    }
}
