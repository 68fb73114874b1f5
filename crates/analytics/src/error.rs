use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Not enough data to perform calculation: the record set is empty")]
    EmptyDataset,

    #[error("Invalid metric specification: {0}")]
    InvalidMetricSpec(String),

    #[error("Analysis '{0}' was cancelled before it completed")]
    Cancelled(String),

    #[error("Invalid record reached the analysis engine: {0}")]
    InvalidValue(#[from] CoreError),

    #[error("An unexpected error occurred during analytics calculation: {0}")]
    InternalError(String),
}
