//! # Sales Analytics Engine
//!
//! This crate turns a sealed `RecordSet` of sales transactions into KPIs,
//! ranked dimensional breakdowns, chronological time series, a correlation
//! matrix and summary statistics.
//!
//! ## Architectural Principles
//!
//! - **Pure Logic:** No I/O happens here. Loading belongs to `ingest` and
//!   writing to `report`; this crate only reads a `RecordSet` and returns values.
//! - **Stateless Calculation:** Every analyzer takes the record set by shared
//!   reference and produces a fresh result, so the `AnalyticsEngine` can run
//!   them in parallel.
//! - **Exact Money:** Sums and means of money are `Decimal`. Rounding happens
//!   only when a result is converted into a `Table`.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: runs every analysis and returns an `AnalysisReport`.
//! - `DimensionalAggregator` / `AggregationSpec`: the generic group-by engine.
//! - `KpiCalculator`, `TimeSeriesAnalyzer`, `CorrelationEngine`, `SummaryCalculator`.
//! - `AnalyticsError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod aggregate;
pub mod cancel;
pub mod correlation;
pub mod engine;
pub mod error;
pub mod kpi;
pub mod report;
pub mod summary;
pub mod timeseries;

// Re-export the key components to create a clean, public-facing API.
pub use aggregate::{
    presets, AggregationResult, AggregationRow, AggregationSpec, DimensionalAggregator, GroupKey,
    MetricSpec, MetricValue, RatioSpec,
};
pub use cancel::CancelToken;
pub use correlation::{CorrelationEngine, CorrelationMatrix};
pub use engine::AnalyticsEngine;
pub use error::AnalyticsError;
pub use kpi::{KpiCalculator, KpiReport};
pub use report::AnalysisReport;
pub use summary::{FieldSummary, SummaryCalculator, SummaryStatistics};
pub use timeseries::{
    DailySeries, Period, PeriodKey, PeriodRollup, TimeSeriesAnalyzer, WeeklyPattern,
};
