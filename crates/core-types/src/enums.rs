use serde::{Deserialize, Serialize};
use std::fmt;

/// A record attribute that metric specs, grouping keys and correlation inputs can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    // Numeric
    SalesAmount,
    UnitsSold,
    UnitPrice,
    // Categorical
    Region,
    ProductCategory,
    CustomerId,
    SalesRep,
    // Calendar
    Date,
    Year,
    Quarter,
    MonthNum,
    Week,
    DayOfWeek,
}

impl Field {
    /// Returns true if sum and mean are meaningful for this field.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Field::SalesAmount | Field::UnitsSold | Field::UnitPrice)
    }

    /// The snake_case column name used in input and output files.
    pub fn column_name(&self) -> &'static str {
        match self {
            Field::SalesAmount => "sales_amount",
            Field::UnitsSold => "units_sold",
            Field::UnitPrice => "unit_price",
            Field::Region => "region",
            Field::ProductCategory => "product_category",
            Field::CustomerId => "customer_id",
            Field::SalesRep => "sales_rep",
            Field::Date => "date",
            Field::Year => "year",
            Field::Quarter => "quarter",
            Field::MonthNum => "month_num",
            Field::Week => "week",
            Field::DayOfWeek => "day_of_week",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// The reduction applied to a field within each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reduction {
    Sum,
    Mean,
    Count,
    NUnique,
}

impl Reduction {
    pub fn requires_numeric(&self) -> bool {
        matches!(self, Reduction::Sum | Reduction::Mean)
    }
}
