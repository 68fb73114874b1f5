use crate::clean::{title_case, CleaningSummary};
use crate::error::IngestError;
use chrono::{NaiveDate, NaiveDateTime};
use core_types::{Record, RecordSet};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Columns every input file must carry, in canonical order.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "date",
    "sales_amount",
    "units_sold",
    "region",
    "product_category",
    "customer_id",
    "sales_rep",
];

/// One CSV row as read, before any coercion. Extra columns are ignored.
#[derive(Debug, Deserialize)]
struct RawRow {
    date: Option<String>,
    sales_amount: Option<String>,
    units_sold: Option<String>,
    region: Option<String>,
    product_category: Option<String>,
    customer_id: Option<String>,
    sales_rep: Option<String>,
}

/// The sealed record set together with what cleaning removed.
#[derive(Debug)]
pub struct LoadOutcome {
    pub records: RecordSet,
    pub summary: CleaningSummary,
}

/// Reads sales CSV files into validated record sets.
#[derive(Debug, Default, Clone)]
pub struct Loader;

impl Loader {
    pub fn new() -> Self {
        Self
    }

    /// Loads and cleans the file at `path`.
    pub fn load(&self, path: &Path) -> Result<LoadOutcome, IngestError> {
        if !path.is_file() {
            return Err(IngestError::DataNotFound(path.to_path_buf()));
        }
        let file = File::open(path)?;
        let outcome = self.load_from_reader(file, &path.display().to_string())?;
        tracing::info!(
            path = %path.display(),
            records = outcome.records.len(),
            "loaded sales data"
        );
        Ok(outcome)
    }

    /// Loads and cleans CSV data from any reader. `origin` names the source in errors.
    pub fn load_from_reader<R: Read>(
        &self,
        reader: R,
        origin: &str,
    ) -> Result<LoadOutcome, IngestError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|column| !headers.iter().any(|h| h == **column))
            .map(|column| column.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(IngestError::Schema {
                origin: origin.to_string(),
                missing,
            });
        }

        let date_idx = headers.iter().position(|h| h == "date");
        let mut summary = CleaningSummary::default();
        let mut seen: HashSet<Vec<String>> = HashSet::new();
        let mut records = Vec::new();

        for row in csv_reader.records() {
            let row = row?;
            summary.raw_rows += 1;

            if !seen.insert(dedupe_key(&row, date_idx)) {
                summary.duplicates += 1;
                continue;
            }

            let line = row.position().map(|p| p.line()).unwrap_or_default();
            let raw: RawRow = row.deserialize(Some(&headers))?;
            match parse_row(raw, line)? {
                Parsed::Valid(record) => records.push(record),
                Parsed::MissingField => summary.missing_fields += 1,
                Parsed::NonPositive => summary.non_positive += 1,
            }
        }

        summary.kept = records.len();
        summary.log(origin);

        if records.is_empty() {
            return Err(IngestError::EmptyDataset(origin.to_string()));
        }

        Ok(LoadOutcome {
            records: RecordSet::new(records),
            summary,
        })
    }
}

enum Parsed {
    Valid(Record),
    MissingField,
    NonPositive,
}

fn parse_row(raw: RawRow, line: u64) -> Result<Parsed, IngestError> {
    let (
        Some(date),
        Some(sales_amount),
        Some(units_sold),
        Some(region),
        Some(product_category),
        Some(customer_id),
        Some(sales_rep),
    ) = (
        non_empty(raw.date),
        non_empty(raw.sales_amount),
        non_empty(raw.units_sold),
        non_empty(raw.region),
        non_empty(raw.product_category),
        non_empty(raw.customer_id),
        non_empty(raw.sales_rep),
    )
    else {
        return Ok(Parsed::MissingField);
    };

    let date = parse_date(&date).ok_or_else(|| invalid(line, "date", &date))?;
    let amount = Decimal::from_str(&sales_amount)
        .map_err(|_| invalid(line, "sales_amount", &sales_amount))?;
    let units =
        Decimal::from_str(&units_sold).map_err(|_| invalid(line, "units_sold", &units_sold))?;

    if amount <= Decimal::ZERO || units <= Decimal::ZERO {
        return Ok(Parsed::NonPositive);
    }
    if !units.fract().is_zero() {
        return Err(invalid(line, "units_sold", &units_sold));
    }
    let units = units
        .to_u32()
        .ok_or_else(|| invalid(line, "units_sold", &units_sold))?;

    let record = Record::new(
        date,
        amount,
        units,
        region.to_uppercase(),
        title_case(&product_category),
        customer_id,
        sales_rep,
    )?;
    Ok(Parsed::Valid(record))
}

/// The row's fields with the date normalised, so `2024-01-01` and
/// `2024-01-01 00:00:00` count as the same row.
fn dedupe_key(row: &csv::StringRecord, date_idx: Option<usize>) -> Vec<String> {
    row.iter()
        .enumerate()
        .map(|(i, field)| {
            let date = if Some(i) == date_idx { parse_date(field) } else { None };
            date.map_or_else(|| field.to_owned(), |d| d.to_string())
        })
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Accepts `YYYY-MM-DD` and `YYYY-MM-DD HH:MM:SS`.
fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

fn invalid(line: u64, column: &'static str, value: &str) -> IngestError {
    IngestError::InvalidField {
        line,
        column,
        value: value.to_string(),
    }
}
