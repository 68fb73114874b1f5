use crate::cancel::{cancelled, CancelToken};
use crate::error::AnalyticsError;
use core_types::{Cell, Field, FieldValue, IntoTable, Record, RecordSet, Reduction, Table};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Declares one reduced column: which field, which reduction, and its output label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSpec {
    pub field: Field,
    pub op: Reduction,
    pub label: String,
}

impl MetricSpec {
    pub fn new(field: Field, op: Reduction, label: impl Into<String>) -> Self {
        Self {
            field,
            op,
            label: label.into(),
        }
    }
}

/// A per-group column derived from two already reduced metrics.
///
/// The value is undefined when the denominator is zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioSpec {
    pub numerator: String,
    pub denominator: String,
    pub label: String,
}

/// Everything one Dimensional Aggregator instance needs to know.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationSpec {
    /// Name of the produced table.
    pub name: String,
    /// Fields forming the (possibly composite) grouping key.
    pub group_by: Vec<Field>,
    pub metrics: Vec<MetricSpec>,
    pub ratios: Vec<RatioSpec>,
    /// Label of the metric used for ranking and share-of-total.
    pub primary: String,
    /// Label of the share-of-total column.
    pub share_label: String,
}

impl AggregationSpec {
    pub fn new(name: impl Into<String>, group_by: impl IntoIterator<Item = Field>) -> Self {
        Self {
            name: name.into(),
            group_by: group_by.into_iter().collect(),
            metrics: Vec::new(),
            ratios: Vec::new(),
            primary: String::new(),
            share_label: "Share %".to_string(),
        }
    }

    pub fn metric(mut self, field: Field, op: Reduction, label: impl Into<String>) -> Self {
        self.metrics.push(MetricSpec::new(field, op, label));
        self
    }

    pub fn ratio(
        mut self,
        numerator: impl Into<String>,
        denominator: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        self.ratios.push(RatioSpec {
            numerator: numerator.into(),
            denominator: denominator.into(),
            label: label.into(),
        });
        self
    }

    pub fn primary(mut self, label: impl Into<String>) -> Self {
        self.primary = label.into();
        self
    }

    pub fn share_label(mut self, label: impl Into<String>) -> Self {
        self.share_label = label.into();
        self
    }

    fn metric_index(&self, label: &str) -> Option<usize> {
        self.metrics.iter().position(|m| m.label == label)
    }

    /// Checks the spec is internally consistent before any record is touched.
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        let invalid = |msg: String| -> Result<(), AnalyticsError> {
            Err(AnalyticsError::InvalidMetricSpec(format!("{}: {msg}", self.name)))
        };

        if self.group_by.is_empty() {
            return invalid("at least one grouping field is required".to_string());
        }
        if self.metrics.is_empty() {
            return invalid("at least one metric is required".to_string());
        }

        let mut labels = HashSet::new();
        for label in self
            .metrics
            .iter()
            .map(|m| &m.label)
            .chain(self.ratios.iter().map(|r| &r.label))
            .chain(std::iter::once(&self.share_label))
        {
            if !labels.insert(label.as_str()) {
                return invalid(format!("duplicate column label '{label}'"));
            }
        }

        for metric in &self.metrics {
            if metric.op.requires_numeric() && !metric.field.is_numeric() {
                return invalid(format!(
                    "{:?} of non-numeric field '{}' in '{}'",
                    metric.op, metric.field, metric.label
                ));
            }
        }

        if self.metric_index(&self.primary).is_none() {
            return invalid(format!("primary metric '{}' is not declared", self.primary));
        }

        for ratio in &self.ratios {
            for operand in [&ratio.numerator, &ratio.denominator] {
                if self.metric_index(operand).is_none() {
                    return invalid(format!(
                        "ratio '{}' refers to undeclared metric '{operand}'",
                        ratio.label
                    ));
                }
            }
        }

        Ok(())
    }
}

/// A reduced per-group value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Amount(Decimal),
    Count(u64),
    /// Not computable for this group (e.g. a zero denominator).
    Undefined,
}

impl MetricValue {
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            MetricValue::Amount(v) => Some(*v),
            MetricValue::Count(n) => Some(Decimal::from(*n)),
            MetricValue::Undefined => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, MetricValue::Undefined)
    }

    fn to_cell(&self) -> Cell {
        match self {
            MetricValue::Amount(v) => Cell::decimal(Some(*v), 2),
            MetricValue::Count(n) => Cell::from(*n),
            MetricValue::Undefined => Cell::Null,
        }
    }
}

/// A grouping key: one value per grouping field, compared in natural order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GroupKey(pub Vec<FieldValue>);

impl GroupKey {
    fn of(record: &Record, fields: &[Field]) -> Self {
        GroupKey(fields.iter().map(|f| record.value(*f)).collect())
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" / ")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationRow {
    pub key: GroupKey,
    /// Metric values followed by ratio values, in spec order.
    pub values: Vec<MetricValue>,
    pub share_pct: Decimal,
}

/// The ranked output of one aggregation. Rows are ordered by the primary
/// metric descending, ties broken by the natural order of the group key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationResult {
    pub name: String,
    pub group_by: Vec<Field>,
    /// Metric labels followed by ratio labels.
    pub labels: Vec<String>,
    pub primary: String,
    pub share_label: String,
    pub rows: Vec<AggregationRow>,
}

impl AggregationResult {
    /// The row of a single-field key rendered as `key`.
    pub fn row(&self, key: &str) -> Option<&AggregationRow> {
        self.rows.iter().find(|r| r.key.to_string() == key)
    }

    /// The value of `label` in `row`.
    pub fn value<'a>(&self, row: &'a AggregationRow, label: &str) -> Option<&'a MetricValue> {
        let idx = self.labels.iter().position(|l| l == label)?;
        row.values.get(idx)
    }

    /// The highest-ranked group.
    pub fn top(&self) -> Option<&AggregationRow> {
        self.rows.first()
    }

    /// Sum of all share percentages.
    pub fn share_total(&self) -> Decimal {
        self.rows.iter().map(|r| r.share_pct).sum()
    }
}

impl IntoTable for AggregationResult {
    fn to_table(&self) -> Table {
        let columns = self
            .group_by
            .iter()
            .map(|f| f.column_name().to_string())
            .chain(self.labels.iter().cloned())
            .chain(std::iter::once(self.share_label.clone()));
        let mut table = Table::new(self.name.clone(), columns);

        for row in &self.rows {
            let mut cells: Vec<Cell> =
                row.key.0.iter().map(|k| Cell::text(k.to_string())).collect();
            cells.extend(row.values.iter().map(MetricValue::to_cell));
            cells.push(Cell::decimal(Some(row.share_pct), 2));
            table.push_row(cells);
        }
        table
    }
}

/// Running state of one reduction within one group.
enum Accumulator {
    Sum(Decimal),
    Mean { sum: Decimal, n: u64 },
    Count(u64),
    Unique(HashSet<FieldValue>),
}

impl Accumulator {
    fn for_op(op: Reduction) -> Self {
        match op {
            Reduction::Sum => Accumulator::Sum(Decimal::ZERO),
            Reduction::Mean => Accumulator::Mean { sum: Decimal::ZERO, n: 0 },
            Reduction::Count => Accumulator::Count(0),
            Reduction::NUnique => Accumulator::Unique(HashSet::new()),
        }
    }

    fn push(&mut self, record: &Record, field: Field) {
        match self {
            Accumulator::Sum(sum) => *sum += record.numeric(field).unwrap_or_default(),
            Accumulator::Mean { sum, n } => {
                *sum += record.numeric(field).unwrap_or_default();
                *n += 1;
            }
            Accumulator::Count(n) => *n += 1,
            Accumulator::Unique(seen) => {
                seen.insert(record.value(field));
            }
        }
    }

    fn finish(self) -> MetricValue {
        match self {
            Accumulator::Sum(sum) => MetricValue::Amount(sum),
            Accumulator::Mean { sum, n } if n > 0 => MetricValue::Amount(sum / Decimal::from(n)),
            Accumulator::Mean { .. } => MetricValue::Undefined,
            Accumulator::Count(n) => MetricValue::Count(n),
            Accumulator::Unique(seen) => MetricValue::Count(seen.len() as u64),
        }
    }
}

/// Generic group-by reduction engine.
#[derive(Debug, Clone)]
pub struct DimensionalAggregator {
    spec: AggregationSpec,
}

impl DimensionalAggregator {
    /// Validates the spec up front so a bad declaration fails before any work.
    pub fn new(spec: AggregationSpec) -> Result<Self, AnalyticsError> {
        spec.validate()?;
        Ok(Self { spec })
    }

    pub fn spec(&self) -> &AggregationSpec {
        &self.spec
    }

    /// Partitions, reduces, ranks and computes share-of-total.
    ///
    /// `cancel` is polled between groups; a cancelled run returns
    /// `AnalyticsError::Cancelled` and no partial result.
    pub fn aggregate(
        &self,
        records: &RecordSet,
        cancel: Option<&CancelToken>,
    ) -> Result<AggregationResult, AnalyticsError> {
        if records.is_empty() {
            return Err(AnalyticsError::EmptyDataset);
        }
        let spec = &self.spec;

        // 1. Partition. BTreeMap keeps groups in natural key order.
        let mut groups: BTreeMap<GroupKey, Vec<&Record>> = BTreeMap::new();
        for record in records {
            groups
                .entry(GroupKey::of(record, &spec.group_by))
                .or_default()
                .push(record);
        }

        // 2. Reduce each group.
        let primary_idx = spec
            .metric_index(&spec.primary)
            .ok_or_else(|| AnalyticsError::InvalidMetricSpec(spec.primary.clone()))?;
        let mut rows = Vec::with_capacity(groups.len());
        for (key, members) in groups {
            if cancelled(cancel) {
                tracing::warn!(aggregation = %spec.name, "aggregation cancelled");
                return Err(AnalyticsError::Cancelled(spec.name.clone()));
            }
            rows.push(self.reduce_group(key, &members));
        }

        // 3. Share of total.
        let primary_of =
            |row: &AggregationRow| row.values[primary_idx].as_decimal().unwrap_or_default();
        let primaries: Vec<Decimal> = rows.iter().map(primary_of).collect();
        for (row, share) in rows.iter_mut().zip(share_of_total(&primaries)) {
            row.share_pct = share;
        }

        // 4. Rank: primary descending, then key ascending. The sort is stable
        // and the input is already in key order, but compare keys explicitly.
        rows.sort_by(|a, b| primary_of(b).cmp(&primary_of(a)).then_with(|| a.key.cmp(&b.key)));

        tracing::debug!(aggregation = %spec.name, groups = rows.len(), "aggregation complete");

        Ok(AggregationResult {
            name: spec.name.clone(),
            group_by: spec.group_by.clone(),
            labels: spec
                .metrics
                .iter()
                .map(|m| m.label.clone())
                .chain(spec.ratios.iter().map(|r| r.label.clone()))
                .collect(),
            primary: spec.primary.clone(),
            share_label: spec.share_label.clone(),
            rows,
        })
    }

    fn reduce_group(&self, key: GroupKey, members: &[&Record]) -> AggregationRow {
        let spec = &self.spec;
        let mut accumulators: Vec<Accumulator> =
            spec.metrics.iter().map(|m| Accumulator::for_op(m.op)).collect();

        for record in members {
            for (acc, metric) in accumulators.iter_mut().zip(&spec.metrics) {
                acc.push(record, metric.field);
            }
        }

        let mut values: Vec<MetricValue> = accumulators.into_iter().map(Accumulator::finish).collect();

        let ratios: Vec<MetricValue> = spec
            .ratios
            .iter()
            .map(|ratio| {
                let lookup =
                    |label: &str| spec.metric_index(label).and_then(|i| values[i].as_decimal());
                match (lookup(&ratio.numerator), lookup(&ratio.denominator)) {
                    (Some(n), Some(d)) if !d.is_zero() => MetricValue::Amount(n / d),
                    _ => MetricValue::Undefined,
                }
            })
            .collect();
        values.extend(ratios);

        AggregationRow {
            key,
            values,
            share_pct: Decimal::ZERO,
        }
    }
}

/// Each value as a percentage of the sum of all values, rounded to 2 places.
/// Every share is zero when the sum is zero.
pub fn share_of_total(values: &[Decimal]) -> Vec<Decimal> {
    let total: Decimal = values.iter().sum();
    values
        .iter()
        .map(|v| {
            if total.is_zero() {
                Decimal::ZERO
            } else {
                (v / total * Decimal::ONE_HUNDRED).round_dp(2)
            }
        })
        .collect()
}

/// The standard breakdowns of the sales report.
pub mod presets {
    use super::AggregationSpec;
    use core_types::{Field, Reduction};

    pub const TOTAL_SALES: &str = "Total Sales";

    /// Sales by region with market share.
    pub fn region() -> AggregationSpec {
        AggregationSpec::new("regional_analysis", [Field::Region])
            .metric(Field::SalesAmount, Reduction::Sum, TOTAL_SALES)
            .metric(Field::SalesAmount, Reduction::Mean, "Avg Transaction")
            .metric(Field::SalesAmount, Reduction::Count, "Num Transactions")
            .metric(Field::UnitsSold, Reduction::Sum, "Total Units")
            .metric(Field::CustomerId, Reduction::NUnique, "Unique Customers")
            .primary(TOTAL_SALES)
            .share_label("Market Share %")
    }

    /// Sales by product category with revenue contribution.
    pub fn category() -> AggregationSpec {
        AggregationSpec::new("category_analysis", [Field::ProductCategory])
            .metric(Field::SalesAmount, Reduction::Sum, TOTAL_SALES)
            .metric(Field::SalesAmount, Reduction::Mean, "Avg Transaction")
            .metric(Field::SalesAmount, Reduction::Count, "Num Transactions")
            .metric(Field::UnitsSold, Reduction::Sum, "Total Units")
            .metric(Field::UnitPrice, Reduction::Mean, "Avg Unit Price")
            .primary(TOTAL_SALES)
            .share_label("Revenue Contribution %")
    }

    /// Sales representative performance with sales per customer.
    pub fn sales_rep() -> AggregationSpec {
        AggregationSpec::new("rep_analysis", [Field::SalesRep])
            .metric(Field::SalesAmount, Reduction::Sum, TOTAL_SALES)
            .metric(Field::SalesAmount, Reduction::Mean, "Avg Sale")
            .metric(Field::SalesAmount, Reduction::Count, "Num Sales")
            .metric(Field::CustomerId, Reduction::NUnique, "Unique Customers")
            .ratio(TOTAL_SALES, "Unique Customers", "Sales per Customer")
            .primary(TOTAL_SALES)
            .share_label("Sales Share %")
    }

    /// The three breakdowns written by a full analysis run.
    pub fn standard() -> Vec<AggregationSpec> {
        vec![region(), category(), sales_rep()]
    }
}
