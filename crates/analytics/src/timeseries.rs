use crate::error::AnalyticsError;
use chrono::{Month, NaiveDate};
use core_types::{weekday_name, Cell, IntoTable, Record, RecordSet, Table};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A calendar period used as a time-series key.
///
/// The derived ordering is chronological: year first, then month or quarter.
/// Labels are only rendered from the key, never used to order it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PeriodKey {
    Month { year: i32, month: u32 },
    Quarter { year: i32, quarter: u32 },
}

impl PeriodKey {
    /// Display name of the month (`"January"`), if this is a monthly key.
    pub fn month_name(&self) -> Option<&'static str> {
        match self {
            PeriodKey::Month { month, .. } => {
                Month::try_from(u8::try_from(*month).ok()?).ok().map(|m| m.name())
            }
            PeriodKey::Quarter { .. } => None,
        }
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodKey::Month { year, month } => write!(f, "{year}-{month:02}"),
            PeriodKey::Quarter { year, quarter } => write!(f, "{year}-Q{quarter}"),
        }
    }
}

/// Resampling granularity for period rollups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Period {
    Month,
    Quarter,
}

impl Period {
    pub fn key_of(&self, record: &Record) -> PeriodKey {
        match self {
            Period::Month => PeriodKey::Month {
                year: record.year(),
                month: record.month_num(),
            },
            Period::Quarter => PeriodKey::Quarter {
                year: record.year(),
                quarter: record.quarter(),
            },
        }
    }

    fn table_name(&self) -> &'static str {
        match self {
            Period::Month => "monthly_performance",
            Period::Quarter => "quarterly_performance",
        }
    }
}

/// Sum, mean and count of sales within one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SalesStats {
    pub total_sales: Decimal,
    pub avg_transaction: Decimal,
    pub transactions: u64,
}

impl SalesStats {
    fn add(&mut self, amount: Decimal) {
        self.total_sales += amount;
        self.transactions += 1;
    }

    fn finish(mut self) -> Self {
        if self.transactions > 0 {
            self.avg_transaction = self.total_sales / Decimal::from(self.transactions);
        }
        self
    }

    fn cells(&self) -> [Cell; 3] {
        [
            Cell::decimal(Some(self.total_sales), 2),
            Cell::decimal(Some(self.avg_transaction), 2),
            Cell::from(self.transactions),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodRow {
    pub period: PeriodKey,
    pub stats: SalesStats,
    /// Growth of total sales over the previous row; `None` for the first row
    /// and whenever the previous total is zero.
    pub growth_pct: Option<Decimal>,
}

/// Period rollup in chronological order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodRollup {
    pub period: Period,
    pub rows: Vec<PeriodRow>,
}

impl PeriodRollup {
    pub fn growth_series(&self) -> Vec<Option<Decimal>> {
        self.rows.iter().map(|r| r.growth_pct).collect()
    }
}

impl IntoTable for PeriodRollup {
    fn to_table(&self) -> Table {
        let mut columns = vec!["Period"];
        if self.period == Period::Month {
            columns.push("Month");
        }
        columns.extend(["Total Sales", "Avg Transaction", "Num Transactions", "Growth %"]);

        let mut table = Table::new(self.period.table_name(), columns);
        for row in &self.rows {
            let mut cells = vec![Cell::text(row.period.to_string())];
            if let Some(name) = row.period.month_name() {
                cells.push(Cell::text(name));
            }
            cells.extend(row.stats.cells());
            cells.push(Cell::decimal(row.growth_pct, 2));
            table.push_row(cells);
        }
        table
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayRow {
    /// Days from Monday (0 = Monday, 6 = Sunday).
    pub day: u8,
    pub stats: SalesStats,
}

impl WeekdayRow {
    pub fn day_name(&self) -> &'static str {
        weekday_name(self.day)
    }
}

/// Sales by day of week, Monday first; days with no sales are absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyPattern {
    pub rows: Vec<WeekdayRow>,
}

impl IntoTable for WeeklyPattern {
    fn to_table(&self) -> Table {
        let mut table = Table::new(
            "weekly_pattern",
            ["Day", "Total Sales", "Avg Transaction", "Num Transactions"],
        );
        for row in &self.rows {
            let mut cells = vec![Cell::text(row.day_name())];
            cells.extend(row.stats.cells());
            table.push_row(cells);
        }
        table
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRow {
    pub date: NaiveDate,
    pub sales: Decimal,
    /// `None` only when the window is zero.
    pub moving_average: Option<Decimal>,
}

/// Daily sales with a trailing moving average, one row per distinct date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySeries {
    pub window: usize,
    pub rows: Vec<DailyRow>,
}

impl IntoTable for DailySeries {
    fn to_table(&self) -> Table {
        let ma_label = format!("MA {}", self.window);
        let mut table = Table::new(
            "daily_moving_average",
            ["Date".to_string(), "Total Sales".to_string(), ma_label],
        );
        for row in &self.rows {
            table.push_row(vec![
                Cell::from(row.date),
                Cell::decimal(Some(row.sales), 2),
                Cell::decimal(row.moving_average, 2),
            ]);
        }
        table
    }
}

/// Chronological resampling, growth rates and moving averages.
#[derive(Debug, Clone)]
pub struct TimeSeriesAnalyzer {
    window: usize,
}

impl Default for TimeSeriesAnalyzer {
    fn default() -> Self {
        Self { window: 7 }
    }
}

impl TimeSeriesAnalyzer {
    /// `window` is the trailing moving-average window in days.
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    /// Sales by calendar month in chronological order, with month-over-month growth.
    pub fn monthly(&self, records: &RecordSet) -> Result<PeriodRollup, AnalyticsError> {
        self.rollup(records, Period::Month)
    }

    pub fn quarterly(&self, records: &RecordSet) -> Result<PeriodRollup, AnalyticsError> {
        self.rollup(records, Period::Quarter)
    }

    pub fn rollup(
        &self,
        records: &RecordSet,
        period: Period,
    ) -> Result<PeriodRollup, AnalyticsError> {
        if records.is_empty() {
            return Err(AnalyticsError::EmptyDataset);
        }

        let mut buckets: BTreeMap<PeriodKey, SalesStats> = BTreeMap::new();
        for record in records {
            buckets
                .entry(period.key_of(record))
                .or_default()
                .add(record.sales_amount());
        }

        let mut rows: Vec<PeriodRow> = Vec::with_capacity(buckets.len());
        let mut previous: Option<Decimal> = None;
        for (key, stats) in buckets {
            let stats = stats.finish();
            rows.push(PeriodRow {
                period: key,
                stats,
                growth_pct: previous.and_then(|prev| growth_rate(prev, stats.total_sales)),
            });
            previous = Some(stats.total_sales);
        }

        tracing::debug!(?period, periods = rows.len(), "period rollup complete");
        Ok(PeriodRollup { period, rows })
    }

    /// Sales by weekday, Monday..Sunday, omitting days that never occur.
    pub fn weekly(&self, records: &RecordSet) -> Result<WeeklyPattern, AnalyticsError> {
        if records.is_empty() {
            return Err(AnalyticsError::EmptyDataset);
        }

        let mut days: BTreeMap<u8, SalesStats> = BTreeMap::new();
        for record in records {
            let day = record.day_of_week().num_days_from_monday() as u8;
            days.entry(day).or_default().add(record.sales_amount());
        }

        Ok(WeeklyPattern {
            rows: days
                .into_iter()
                .map(|(day, stats)| WeekdayRow {
                    day,
                    stats: stats.finish(),
                })
                .collect(),
        })
    }

    /// Daily sales totals with a trailing moving average.
    ///
    /// Days before the window fills average over the days available so far.
    pub fn daily_moving_average(&self, records: &RecordSet) -> Result<DailySeries, AnalyticsError> {
        if records.is_empty() {
            return Err(AnalyticsError::EmptyDataset);
        }

        let mut daily: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
        for record in records {
            *daily.entry(record.date()).or_default() += record.sales_amount();
        }
        let (dates, sales): (Vec<NaiveDate>, Vec<Decimal>) = daily.into_iter().unzip();
        let averages = trailing_mean(&sales, self.window);

        Ok(DailySeries {
            window: self.window,
            rows: dates
                .into_iter()
                .zip(sales)
                .zip(averages)
                .map(|((date, sales), moving_average)| DailyRow {
                    date,
                    sales,
                    moving_average,
                })
                .collect(),
        })
    }
}

/// Percentage change from `previous` to `current`, rounded to 2 places.
/// Undefined when `previous` is zero.
pub fn growth_rate(previous: Decimal, current: Decimal) -> Option<Decimal> {
    if previous.is_zero() {
        return None;
    }
    Some(((current - previous) / previous * Decimal::ONE_HUNDRED).round_dp(2))
}

/// Trailing mean with a minimum of one period. A zero window yields all `None`.
pub fn trailing_mean(values: &[Decimal], window: usize) -> Vec<Option<Decimal>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    let mut out = Vec::with_capacity(values.len());
    let mut running = Decimal::ZERO;
    for (i, value) in values.iter().enumerate() {
        running += value;
        if i >= window {
            running -= values[i - window];
        }
        let len = (i + 1).min(window);
        out.push(Some(running / Decimal::from(len)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;
    use rust_decimal_macros::dec;

    fn sale(date: &str, amount: Decimal) -> Record {
        record(date, amount, 1, "N", "Toys", "C1", "R1")
    }

    #[test]
    fn monthly_growth_follows_calendar_order() {
        // April sorts before January and February alphabetically.
        let records = RecordSet::new(vec![
            sale("2024-04-10", dec!(90)),
            sale("2024-01-05", dec!(60)),
            sale("2024-01-20", dec!(40)),
            sale("2024-02-14", dec!(150)),
        ]);
        let monthly = TimeSeriesAnalyzer::default().monthly(&records).unwrap();

        let labels: Vec<String> = monthly.rows.iter().map(|r| r.period.to_string()).collect();
        assert_eq!(labels, vec!["2024-01", "2024-02", "2024-04"]);
        assert_eq!(monthly.growth_series(), vec![None, Some(dec!(50)), Some(dec!(-40))]);
        assert_eq!(monthly.rows[0].stats.transactions, 2);
        assert_eq!(monthly.rows[0].stats.avg_transaction, dec!(50));
    }

    #[test]
    fn months_of_different_years_do_not_merge() {
        let records = RecordSet::new(vec![
            sale("2023-12-31", dec!(10)),
            sale("2024-12-01", dec!(20)),
            sale("2024-01-01", dec!(30)),
        ]);
        let monthly = TimeSeriesAnalyzer::default().monthly(&records).unwrap();
        let labels: Vec<String> = monthly.rows.iter().map(|r| r.period.to_string()).collect();
        assert_eq!(labels, vec!["2023-12", "2024-01", "2024-12"]);
        assert_eq!(monthly.rows[0].period.month_name(), Some("December"));
    }

    #[test]
    fn quarterly_rollup_orders_by_year_then_quarter() {
        let records = RecordSet::new(vec![
            sale("2024-05-01", dec!(10)),
            sale("2023-11-01", dec!(20)),
            sale("2024-02-01", dec!(40)),
        ]);
        let quarterly = TimeSeriesAnalyzer::default().quarterly(&records).unwrap();
        let labels: Vec<String> = quarterly.rows.iter().map(|r| r.period.to_string()).collect();
        assert_eq!(labels, vec!["2023-Q4", "2024-Q1", "2024-Q2"]);
        assert_eq!(quarterly.growth_series(), vec![None, Some(dec!(100)), Some(dec!(-75))]);
    }

    #[test]
    fn growth_is_undefined_after_zero() {
        assert_eq!(growth_rate(Decimal::ZERO, dec!(10)), None);
        assert_eq!(growth_rate(dec!(3), dec!(4)), Some(dec!(33.33)));
    }

    #[test]
    fn weekly_pattern_uses_canonical_order_and_omits_missing_days() {
        // 2024-01-07 is a Sunday, 2024-01-03 a Wednesday, 2024-01-01 a Monday.
        let records = RecordSet::new(vec![
            sale("2024-01-07", dec!(7)),
            sale("2024-01-03", dec!(3)),
            sale("2024-01-10", dec!(5)),
            sale("2024-01-01", dec!(1)),
        ]);
        let weekly = TimeSeriesAnalyzer::default().weekly(&records).unwrap();
        let names: Vec<&str> = weekly.rows.iter().map(WeekdayRow::day_name).collect();
        assert_eq!(names, vec!["Monday", "Wednesday", "Sunday"]);
        assert_eq!(weekly.rows[1].stats.total_sales, dec!(8));
        assert_eq!(weekly.rows[1].stats.avg_transaction, dec!(4));
    }

    #[test]
    fn weekly_pattern_ignores_which_day_comes_first() {
        // Sunday is chronologically first, then Tuesday, then Friday.
        let records = RecordSet::new(vec![
            sale("2024-01-07", dec!(7)),
            sale("2024-01-09", dec!(2)),
            sale("2024-01-12", dec!(5)),
        ]);
        let weekly = TimeSeriesAnalyzer::default().weekly(&records).unwrap();
        let names: Vec<&str> = weekly.rows.iter().map(WeekdayRow::day_name).collect();
        assert_eq!(names, vec!["Tuesday", "Friday", "Sunday"]);
        assert_eq!(weekly.rows[2].stats.total_sales, dec!(7));
    }

    #[test]
    fn moving_average_uses_available_days_before_window_fills() {
        let records = RecordSet::new(vec![
            sale("2024-01-01", dec!(4)),
            sale("2024-01-01", dec!(6)),
            sale("2024-01-02", dec!(20)),
            sale("2024-01-03", dec!(30)),
        ]);
        let daily = TimeSeriesAnalyzer::new(7).daily_moving_average(&records).unwrap();
        assert_eq!(daily.rows.len(), 3);
        assert_eq!(daily.rows[0].sales, dec!(10));
        let averages: Vec<Option<Decimal>> = daily.rows.iter().map(|r| r.moving_average).collect();
        assert_eq!(averages, vec![Some(dec!(10)), Some(dec!(15)), Some(dec!(20))]);
    }

    #[test]
    fn trailing_mean_slides_once_window_is_full() {
        let values = [dec!(1), dec!(2), dec!(3), dec!(4)];
        assert_eq!(
            trailing_mean(&values, 2),
            vec![Some(dec!(1)), Some(dec!(1.5)), Some(dec!(2.5)), Some(dec!(3.5))]
        );
        assert_eq!(trailing_mean(&values, 0), vec![None; 4]);
    }

    #[test]
    fn empty_record_set_is_an_error() {
        let analyzer = TimeSeriesAnalyzer::default();
        let empty = RecordSet::default();
        assert_eq!(analyzer.monthly(&empty), Err(AnalyticsError::EmptyDataset));
        assert_eq!(analyzer.weekly(&empty), Err(AnalyticsError::EmptyDataset));
        assert_eq!(
            analyzer.daily_moving_average(&empty),
            Err(AnalyticsError::EmptyDataset)
        );
    }

    #[test]
    fn monthly_table_has_null_first_growth() {
        let records = RecordSet::new(vec![sale("2024-01-01", dec!(10)), sale("2024-02-01", dec!(5))]);
        let table = TimeSeriesAnalyzer::default().monthly(&records).unwrap().to_table();
        assert_eq!(
            table.columns,
            vec!["Period", "Month", "Total Sales", "Avg Transaction", "Num Transactions", "Growth %"]
        );
        assert!(table.cell(0, "Growth %").unwrap().is_null());
        assert_eq!(table.cell(1, "Growth %"), Some(&Cell::Decimal(dec!(-50))));
        assert_eq!(table.cell(1, "Month"), Some(&Cell::text("February")));
    }
}
