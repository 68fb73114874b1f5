use crate::aggregate::{presets, AggregationSpec, DimensionalAggregator};
use crate::cancel::{cancelled, CancelToken};
use crate::correlation::CorrelationEngine;
use crate::error::AnalyticsError;
use crate::kpi::KpiCalculator;
use crate::report::AnalysisReport;
use crate::summary::SummaryCalculator;
use crate::timeseries::TimeSeriesAnalyzer;
use chrono::Utc;
use configuration::AnalysisSettings;
use core_types::RecordSet;
use rayon::prelude::*;
use uuid::Uuid;

/// A stateless calculator that runs every analysis over one record set.
///
/// The analyzers only read the record set, so they run in parallel on the
/// rayon pool with no synchronization beyond the shared borrow.
#[derive(Debug)]
pub struct AnalyticsEngine {
    kpis: KpiCalculator,
    aggregators: Vec<DimensionalAggregator>,
    time_series: TimeSeriesAnalyzer,
    correlation: CorrelationEngine,
    summary: SummaryCalculator,
}

impl AnalyticsEngine {
    /// Builds an engine with the standard region, category and sales-rep breakdowns.
    pub fn new(settings: &AnalysisSettings) -> Result<Self, AnalyticsError> {
        Self::with_aggregations(settings, presets::standard())
    }

    /// Builds an engine with a custom set of breakdowns.
    pub fn with_aggregations(
        settings: &AnalysisSettings,
        specs: Vec<AggregationSpec>,
    ) -> Result<Self, AnalyticsError> {
        Ok(Self {
            kpis: KpiCalculator::new(),
            aggregators: specs
                .into_iter()
                .map(DimensionalAggregator::new)
                .collect::<Result<_, _>>()?,
            time_series: TimeSeriesAnalyzer::new(settings.moving_average_window),
            correlation: CorrelationEngine::new(settings.correlation_fields.clone())?,
            summary: SummaryCalculator::new(settings.summary_fields.clone())?,
        })
    }

    /// The validation step run before any analyzer: the set must be non-empty
    /// and every record must still satisfy its invariants.
    pub fn validate(&self, records: &RecordSet) -> Result<(), AnalyticsError> {
        if records.is_empty() {
            return Err(AnalyticsError::EmptyDataset);
        }
        records.verify()?;
        Ok(())
    }

    /// The main entry point for calculating every result.
    ///
    /// # Arguments
    ///
    /// * `records` - The sealed record set for this run.
    /// * `cancel` - Optional token; when cancelled, no report is returned.
    ///
    /// # Returns
    ///
    /// A `Result` containing the complete `AnalysisReport` or an `AnalyticsError`.
    pub fn calculate(
        &self,
        records: &RecordSet,
        cancel: Option<&CancelToken>,
    ) -> Result<AnalysisReport, AnalyticsError> {
        self.validate(records)?;

        let run_id = Uuid::new_v4();
        tracing::info!(%run_id, records = records.len(), "starting analysis");

        let ((kpis, aggregations), ((monthly, quarterly), (weekly, daily), (correlation, summary))) =
            rayon::join(
                || {
                    rayon::join(
                        || self.kpis.calculate(records),
                        || {
                            self.aggregators
                                .par_iter()
                                .map(|a| a.aggregate(records, cancel))
                                .collect::<Result<Vec<_>, _>>()
                        },
                    )
                },
                || {
                    let periods = rayon::join(
                        || self.time_series.monthly(records),
                        || self.time_series.quarterly(records),
                    );
                    let (days, distribution) = rayon::join(
                        || {
                            rayon::join(
                                || self.time_series.weekly(records),
                                || self.time_series.daily_moving_average(records),
                            )
                        },
                        || {
                            rayon::join(
                                || self.correlation.calculate(records),
                                || self.summary.calculate(records),
                            )
                        },
                    );
                    (periods, days, distribution)
                },
            );

        if cancelled(cancel) {
            tracing::warn!(%run_id, "analysis cancelled; discarding results");
            return Err(AnalyticsError::Cancelled("analysis".to_string()));
        }

        let report = AnalysisReport {
            run_id,
            generated_at: Utc::now(),
            record_count: records.len(),
            kpis: kpis?,
            aggregations: aggregations?,
            monthly: monthly?,
            quarterly: quarterly?,
            weekly: weekly?,
            daily: daily?,
            correlation: correlation?,
            summary: summary?,
        };

        tracing::info!(
            %run_id,
            aggregations = report.aggregations.len(),
            months = report.monthly.rows.len(),
            "analysis complete"
        );
        Ok(report)
    }
}
