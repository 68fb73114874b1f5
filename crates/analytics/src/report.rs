use crate::aggregate::AggregationResult;
use crate::correlation::CorrelationMatrix;
use crate::kpi::KpiReport;
use crate::summary::SummaryStatistics;
use crate::timeseries::{DailySeries, PeriodRollup, WeeklyPattern};
use chrono::{DateTime, Utc};
use core_types::{IntoTable, Table};
use serde::Serialize;
use uuid::Uuid;

/// Every result of one analysis run.
///
/// This struct is the final output of the `AnalyticsEngine`. It is a
/// read-only snapshot: the report assembler turns it into tables and then it
/// is dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub record_count: usize,

    // I. Whole-set metrics
    pub kpis: KpiReport,

    // II. Dimensional breakdowns, in the order they were declared
    pub aggregations: Vec<AggregationResult>,

    // III. Time series
    pub monthly: PeriodRollup,
    pub quarterly: PeriodRollup,
    pub weekly: WeeklyPattern,
    pub daily: DailySeries,

    // IV. Distribution
    pub correlation: CorrelationMatrix,
    pub summary: SummaryStatistics,
}

impl AnalysisReport {
    /// The aggregation result with the given table name.
    pub fn aggregation(&self, name: &str) -> Option<&AggregationResult> {
        self.aggregations.iter().find(|a| a.name == name)
    }

    /// Every result as a named table, in artifact order.
    pub fn tables(&self) -> Vec<Table> {
        let mut tables = vec![self.kpis.to_table()];
        tables.extend(self.aggregations.iter().map(IntoTable::to_table));
        tables.push(self.monthly.to_table());
        tables.push(self.quarterly.to_table());
        tables.push(self.weekly.to_table());
        tables.push(self.daily.to_table());
        tables.push(self.correlation.to_table());
        tables.push(self.summary.to_table());
        tables
    }
}
