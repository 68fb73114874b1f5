use crate::enums::Field;
use crate::error::CoreError;
use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// A single validated sales transaction.
///
/// Fields are private so the invariants checked in [`Record::new`] cannot be
/// broken afterwards. Derived fields (`unit_price`, calendar fields) are
/// computed from the stored values on access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    date: NaiveDate,
    sales_amount: Decimal,
    units_sold: u32,
    region: String,
    product_category: String,
    customer_id: String,
    sales_rep: String,
}

impl Record {
    /// Builds a record, rejecting non-positive sales amounts and unit counts.
    pub fn new(
        date: NaiveDate,
        sales_amount: Decimal,
        units_sold: u32,
        region: impl Into<String>,
        product_category: impl Into<String>,
        customer_id: impl Into<String>,
        sales_rep: impl Into<String>,
    ) -> Result<Self, CoreError> {
        if sales_amount <= Decimal::ZERO {
            return Err(CoreError::InvalidValue {
                field: "sales_amount",
                value: sales_amount.to_string(),
            });
        }
        if units_sold == 0 {
            return Err(CoreError::InvalidValue {
                field: "units_sold",
                value: units_sold.to_string(),
            });
        }

        Ok(Self {
            date,
            sales_amount,
            units_sold,
            region: region.into(),
            product_category: product_category.into(),
            customer_id: customer_id.into(),
            sales_rep: sales_rep.into(),
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn sales_amount(&self) -> Decimal {
        self.sales_amount
    }

    pub fn units_sold(&self) -> u32 {
        self.units_sold
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn product_category(&self) -> &str {
        &self.product_category
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn sales_rep(&self) -> &str {
        &self.sales_rep
    }

    /// `sales_amount / units_sold`.
    pub fn unit_price(&self) -> Decimal {
        self.sales_amount / Decimal::from(self.units_sold)
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month_num(&self) -> u32 {
        self.date.month()
    }

    pub fn quarter(&self) -> u32 {
        (self.date.month() - 1) / 3 + 1
    }

    /// ISO-8601 week number.
    pub fn week(&self) -> u32 {
        self.date.iso_week().week()
    }

    pub fn day_of_week(&self) -> Weekday {
        self.date.weekday()
    }

    /// Re-checks the construction invariants.
    pub fn verify(&self) -> Result<(), CoreError> {
        if self.sales_amount <= Decimal::ZERO {
            return Err(CoreError::InvalidValue {
                field: "sales_amount",
                value: self.sales_amount.to_string(),
            });
        }
        if self.units_sold == 0 {
            return Err(CoreError::InvalidValue {
                field: "units_sold",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// The numeric value of `field`, or `None` for non-numeric fields.
    pub fn numeric(&self, field: Field) -> Option<Decimal> {
        match field {
            Field::SalesAmount => Some(self.sales_amount),
            Field::UnitsSold => Some(Decimal::from(self.units_sold)),
            Field::UnitPrice => Some(self.unit_price()),
            _ => None,
        }
    }

    /// The value of `field` as an orderable, hashable key component.
    pub fn value(&self, field: Field) -> FieldValue {
        match field {
            Field::SalesAmount => FieldValue::Decimal(self.sales_amount),
            Field::UnitsSold => FieldValue::Int(i64::from(self.units_sold)),
            Field::UnitPrice => FieldValue::Decimal(self.unit_price()),
            Field::Region => FieldValue::Text(self.region.clone()),
            Field::ProductCategory => FieldValue::Text(self.product_category.clone()),
            Field::CustomerId => FieldValue::Text(self.customer_id.clone()),
            Field::SalesRep => FieldValue::Text(self.sales_rep.clone()),
            Field::Date => FieldValue::Date(self.date),
            Field::Year => FieldValue::Int(i64::from(self.year())),
            Field::Quarter => FieldValue::Int(i64::from(self.quarter())),
            Field::MonthNum => FieldValue::Int(i64::from(self.month_num())),
            Field::Week => FieldValue::Int(i64::from(self.week())),
            Field::DayOfWeek => {
                FieldValue::Weekday(self.day_of_week().num_days_from_monday() as u8)
            }
        }
    }
}

/// A field value usable as a grouping key.
///
/// Ordering is the natural order of the underlying value; weekdays are stored
/// as days from Monday so they order Monday..Sunday.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FieldValue {
    Int(i64),
    Decimal(Decimal),
    Text(String),
    Date(NaiveDate),
    Weekday(u8),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::Decimal(v) => write!(f, "{v}"),
            FieldValue::Text(v) => f.write_str(v),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::Weekday(n) => f.write_str(weekday_name(*n)),
        }
    }
}

/// Full English day name for a day offset from Monday.
pub fn weekday_name(days_from_monday: u8) -> &'static str {
    match days_from_monday {
        0 => "Monday",
        1 => "Tuesday",
        2 => "Wednesday",
        3 => "Thursday",
        4 => "Friday",
        5 => "Saturday",
        _ => "Sunday",
    }
}

/// An immutable, date-ordered collection of records for one analysis run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecordSet {
    records: Vec<Record>,
}

impl RecordSet {
    /// Takes ownership of the records and sorts them by date.
    /// The sort is stable, so records sharing a date keep their input order.
    pub fn new(mut records: Vec<Record>) -> Self {
        records.sort_by_key(|r| r.date);
        tracing::debug!(records = records.len(), "record set sealed");
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Inclusive (first, last) date, or `None` when empty.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.records.first()?.date, self.records.last()?.date))
    }

    /// Checks every record's invariants.
    pub fn verify(&self) -> Result<(), CoreError> {
        self.records.iter().try_for_each(Record::verify)
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rejects_non_positive_values() {
        let zero_sales = Record::new(date(2024, 1, 1), dec!(0), 1, "N", "Toys", "C1", "R1");
        assert!(matches!(
            zero_sales,
            Err(CoreError::InvalidValue { field: "sales_amount", .. })
        ));

        let zero_units = Record::new(date(2024, 1, 1), dec!(10), 0, "N", "Toys", "C1", "R1");
        assert!(matches!(
            zero_units,
            Err(CoreError::InvalidValue { field: "units_sold", .. })
        ));
    }

    #[test]
    fn derived_fields_follow_the_date_and_amounts() {
        let r = Record::new(date(2024, 5, 15), dec!(30), 4, "N", "Toys", "C1", "R1").unwrap();
        assert_eq!(r.unit_price(), dec!(7.5));
        assert_eq!(r.quarter(), 2);
        assert_eq!(r.month_num(), 5);
        assert_eq!(r.day_of_week(), Weekday::Wed);
        assert_eq!(r.value(Field::DayOfWeek).to_string(), "Wednesday");
        assert_eq!(r.numeric(Field::Region), None);
    }

    #[test]
    fn record_set_is_sorted_by_date_and_stable() {
        let a = Record::new(date(2024, 2, 1), dec!(1), 1, "N", "Toys", "A", "R1").unwrap();
        let b = Record::new(date(2024, 1, 1), dec!(2), 1, "N", "Toys", "B", "R1").unwrap();
        let c = Record::new(date(2024, 1, 1), dec!(3), 1, "N", "Toys", "C", "R1").unwrap();

        let set = RecordSet::new(vec![a, b, c]);
        let ids: Vec<_> = set.iter().map(|r| r.customer_id()).collect();
        assert_eq!(ids, vec!["B", "C", "A"]);
        assert_eq!(set.date_range(), Some((date(2024, 1, 1), date(2024, 2, 1))));
    }
}
