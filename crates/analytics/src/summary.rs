use crate::error::AnalyticsError;
use core_types::{Cell, Field, IntoTable, RecordSet, Table};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

/// Distribution of one numeric field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSummary {
    pub field: Field,
    pub count: usize,
    pub mean: Decimal,
    /// Sample standard deviation; undefined for fewer than two values.
    pub std: Option<f64>,
    pub min: Decimal,
    pub q25: Decimal,
    pub median: Decimal,
    pub q75: Decimal,
    pub max: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub fields: Vec<FieldSummary>,
}

impl SummaryStatistics {
    pub fn field(&self, field: Field) -> Option<&FieldSummary> {
        self.fields.iter().find(|s| s.field == field)
    }
}

impl IntoTable for SummaryStatistics {
    /// One row per statistic, one column per field.
    fn to_table(&self) -> Table {
        let columns = std::iter::once("Statistic".to_string())
            .chain(self.fields.iter().map(|s| s.field.column_name().to_string()));
        let mut table = Table::new("summary_statistics", columns);

        let rows: [(&str, fn(&FieldSummary) -> Cell); 8] = [
            ("count", |s| Cell::from(s.count)),
            ("mean", |s| Cell::decimal(Some(s.mean), 2)),
            ("std", |s| Cell::float(s.std.map(|v| (v * 100.0).round() / 100.0))),
            ("min", |s| Cell::decimal(Some(s.min), 2)),
            ("25%", |s| Cell::decimal(Some(s.q25), 2)),
            ("50%", |s| Cell::decimal(Some(s.median), 2)),
            ("75%", |s| Cell::decimal(Some(s.q75), 2)),
            ("max", |s| Cell::decimal(Some(s.max), 2)),
        ];
        for (label, cell_of) in rows {
            let mut cells = vec![Cell::text(label)];
            cells.extend(self.fields.iter().map(cell_of));
            table.push_row(cells);
        }
        table
    }
}

/// Describes the distribution of numeric fields.
#[derive(Debug, Clone)]
pub struct SummaryCalculator {
    fields: Vec<Field>,
}

impl SummaryCalculator {
    pub fn new(fields: Vec<Field>) -> Result<Self, AnalyticsError> {
        if let Some(field) = fields.iter().find(|f| !f.is_numeric()) {
            return Err(AnalyticsError::InvalidMetricSpec(format!(
                "cannot summarise non-numeric field '{field}'"
            )));
        }
        Ok(Self { fields })
    }

    pub fn calculate(&self, records: &RecordSet) -> Result<SummaryStatistics, AnalyticsError> {
        if records.is_empty() {
            return Err(AnalyticsError::EmptyDataset);
        }

        let fields = self
            .fields
            .iter()
            .map(|field| describe(records, *field))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SummaryStatistics { fields })
    }
}

fn describe(records: &RecordSet, field: Field) -> Result<FieldSummary, AnalyticsError> {
    let mut values: Vec<Decimal> = records.iter().filter_map(|r| r.numeric(field)).collect();
    if values.is_empty() {
        return Err(AnalyticsError::EmptyDataset);
    }
    values.sort_unstable();

    let count = values.len();
    let mean = values.iter().sum::<Decimal>() / Decimal::from(count);
    let std = if count < 2 {
        None
    } else {
        let sum_sq: Decimal = values.iter().map(|v| (v - mean) * (v - mean)).sum();
        let variance = (sum_sq / Decimal::from(count - 1))
            .to_f64()
            .ok_or_else(|| AnalyticsError::InternalError("variance out of f64 range".to_string()))?;
        Some(variance.sqrt())
    };

    Ok(FieldSummary {
        field,
        count,
        mean,
        std,
        min: values[0],
        q25: quantile(&values, Decimal::new(25, 2)),
        median: quantile(&values, Decimal::new(50, 2)),
        q75: quantile(&values, Decimal::new(75, 2)),
        max: values[count - 1],
    })
}

/// Quantile of sorted, non-empty values by linear interpolation between the
/// closest ranks.
pub(crate) fn quantile(sorted: &[Decimal], q: Decimal) -> Decimal {
    let position = q * Decimal::from(sorted.len() - 1);
    let lower = position.floor();
    let fraction = position - lower;
    let lo = lower.to_usize().unwrap_or(0);
    let hi = (lo + 1).min(sorted.len() - 1);
    sorted[lo] + (sorted[hi] - sorted[lo]) * fraction
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;
    use rust_decimal_macros::dec;

    #[test]
    fn quartiles_interpolate_between_ranks() {
        let sorted = [dec!(1), dec!(2), dec!(3), dec!(4)];
        assert_eq!(quantile(&sorted, dec!(0.25)), dec!(1.75));
        assert_eq!(quantile(&sorted, dec!(0.5)), dec!(2.5));
        assert_eq!(quantile(&sorted, dec!(0.75)), dec!(3.25));
        assert_eq!(quantile(&[dec!(7)], dec!(0.75)), dec!(7));
    }

    #[test]
    fn describes_sales_and_units() {
        let records = RecordSet::new(vec![
            record("2024-01-01", dec!(2), 1, "N", "Toys", "C1", "R1"),
            record("2024-01-02", dec!(4), 1, "N", "Toys", "C1", "R1"),
            record("2024-01-03", dec!(4), 3, "N", "Toys", "C1", "R1"),
            record("2024-01-04", dec!(6), 3, "N", "Toys", "C1", "R1"),
        ]);
        let summary = SummaryCalculator::new(vec![Field::SalesAmount, Field::UnitsSold])
            .unwrap()
            .calculate(&records)
            .unwrap();

        let sales = summary.field(Field::SalesAmount).unwrap();
        assert_eq!(sales.count, 4);
        assert_eq!(sales.mean, dec!(4));
        assert_eq!(sales.min, dec!(2));
        assert_eq!(sales.median, dec!(4));
        assert_eq!(sales.max, dec!(6));
        // Sample variance (4 + 0 + 0 + 4) / 3.
        let std = sales.std.unwrap();
        assert!((std - (8.0f64 / 3.0).sqrt()).abs() < 1e-9);

        let table = summary.to_table();
        assert_eq!(table.columns, vec!["Statistic", "sales_amount", "units_sold"]);
        assert_eq!(table.len(), 8);
        assert_eq!(table.cell(0, "units_sold"), Some(&Cell::Integer(4)));
    }

    #[test]
    fn single_value_has_no_standard_deviation() {
        let records = RecordSet::new(vec![record("2024-01-01", dec!(2), 1, "N", "Toys", "C1", "R1")]);
        let summary = SummaryCalculator::new(vec![Field::SalesAmount])
            .unwrap()
            .calculate(&records)
            .unwrap();
        assert_eq!(summary.fields[0].std, None);
    }
}
