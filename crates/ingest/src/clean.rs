use core_types::{Cell, RecordSet, Table};
use serde::Serialize;

/// What the cleaning rules removed from one input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleaningSummary {
    pub raw_rows: usize,
    pub duplicates: usize,
    /// Rows with an empty required field.
    pub missing_fields: usize,
    /// Rows with a non-positive sales amount or unit count.
    pub non_positive: usize,
    pub kept: usize,
}

impl CleaningSummary {
    pub fn dropped(&self) -> usize {
        self.duplicates + self.missing_fields + self.non_positive
    }

    pub(crate) fn log(&self, origin: &str) {
        if self.dropped() > 0 {
            tracing::warn!(
                origin,
                duplicates = self.duplicates,
                missing_fields = self.missing_fields,
                non_positive = self.non_positive,
                "dropped rows during cleaning"
            );
        }
        tracing::debug!(origin, raw = self.raw_rows, kept = self.kept, "cleaning complete");
    }
}

/// Capitalises the first letter of every word and lowercases the rest.
/// A word starts after any non-alphabetic character.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for c in value.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// The cleaned records with every derived column, ready to be written back out.
pub fn cleaned_table(records: &RecordSet) -> Table {
    let mut table = Table::new(
        "sales_data_cleaned",
        [
            "date",
            "sales_amount",
            "units_sold",
            "region",
            "product_category",
            "customer_id",
            "sales_rep",
            "unit_price",
            "year",
            "month",
            "month_num",
            "quarter",
            "week",
            "day_of_week",
        ],
    );

    for r in records {
        table.push_row(vec![
            Cell::from(r.date()),
            Cell::Decimal(r.sales_amount()),
            Cell::Integer(i64::from(r.units_sold())),
            Cell::text(r.region()),
            Cell::text(r.product_category()),
            Cell::text(r.customer_id()),
            Cell::text(r.sales_rep()),
            Cell::Decimal(r.unit_price().normalize()),
            Cell::Integer(i64::from(r.year())),
            Cell::text(r.date().format("%B").to_string()),
            Cell::Integer(i64::from(r.month_num())),
            Cell::Integer(i64::from(r.quarter())),
            Cell::Integer(i64::from(r.week())),
            Cell::text(r.date().format("%A").to_string()),
        ]);
    }
    table
}
