use crate::error::AnalyticsError;
use chrono::NaiveDate;
use core_types::{Cell, IntoTable, RecordSet, Table};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashSet;

/// Whole-set scalar metrics.
///
/// Values keep full decimal precision; rounding to two places only happens
/// when the report is turned into a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiReport {
    pub total_revenue: Decimal,
    pub average_transaction_value: Decimal,
    pub median_transaction_value: Decimal,
    pub total_units_sold: u64,
    pub transaction_count: usize,
    pub unique_customers: usize,
    pub average_units_per_transaction: Decimal,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
}

impl KpiReport {
    /// The KPIs as ordered (label, value) pairs, in presentation order.
    pub fn entries(&self) -> Vec<(&'static str, Cell)> {
        vec![
            ("Total Revenue", Cell::decimal(Some(self.total_revenue), 2)),
            (
                "Average Transaction Value",
                Cell::decimal(Some(self.average_transaction_value), 2),
            ),
            (
                "Median Transaction Value",
                Cell::decimal(Some(self.median_transaction_value), 2),
            ),
            ("Total Units Sold", Cell::from(self.total_units_sold)),
            ("Number of Transactions", Cell::from(self.transaction_count)),
            ("Number of Unique Customers", Cell::from(self.unique_customers)),
            (
                "Average Units per Transaction",
                Cell::decimal(Some(self.average_units_per_transaction), 2),
            ),
            (
                "Date Range",
                Cell::text(format!(
                    "{} to {}",
                    self.first_date.format("%Y-%m-%d"),
                    self.last_date.format("%Y-%m-%d")
                )),
            ),
        ]
    }
}

impl IntoTable for KpiReport {
    fn to_table(&self) -> Table {
        let mut table = Table::new("kpis", ["Metric", "Value"]);
        for (label, value) in self.entries() {
            table.push_row(vec![Cell::text(label), value]);
        }
        table
    }
}

/// A stateless calculator for the whole-set KPIs.
#[derive(Debug, Default)]
pub struct KpiCalculator;

impl KpiCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Computes every KPI in one pass plus a sort for the median.
    ///
    /// Fails with `EmptyDataset` rather than reporting zeros for an empty set.
    pub fn calculate(&self, records: &RecordSet) -> Result<KpiReport, AnalyticsError> {
        if records.is_empty() {
            return Err(AnalyticsError::EmptyDataset);
        }

        let mut total_revenue = Decimal::ZERO;
        let mut total_units: u64 = 0;
        let mut amounts = Vec::with_capacity(records.len());
        let mut customers = HashSet::new();
        let mut first_date = NaiveDate::MAX;
        let mut last_date = NaiveDate::MIN;

        for record in records {
            total_revenue += record.sales_amount();
            total_units += u64::from(record.units_sold());
            amounts.push(record.sales_amount());
            customers.insert(record.customer_id());
            first_date = first_date.min(record.date());
            last_date = last_date.max(record.date());
        }

        let count = Decimal::from(records.len());
        let report = KpiReport {
            total_revenue,
            average_transaction_value: total_revenue / count,
            median_transaction_value: median(&mut amounts)
                .ok_or_else(|| AnalyticsError::InternalError("median of empty set".to_string()))?,
            total_units_sold: total_units,
            transaction_count: records.len(),
            unique_customers: customers.len(),
            average_units_per_transaction: Decimal::from(total_units) / count,
            first_date,
            last_date,
        };

        tracing::debug!(
            total_revenue = %report.total_revenue,
            transactions = report.transaction_count,
            "KPIs calculated"
        );
        Ok(report)
    }
}

/// Median of the values; the mean of the two middle values for an even count.
pub(crate) fn median(values: &mut [Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / Decimal::TWO)
    } else {
        Some(values[mid])
    }
}
