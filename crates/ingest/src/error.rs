use core_types::CoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Sales data not found at {}", .0.display())]
    DataNotFound(PathBuf),

    #[error("Missing required columns in {origin}: {}", .missing.join(", "))]
    Schema { origin: String, missing: Vec<String> },

    #[error("Invalid value '{value}' for column '{column}' on line {line}")]
    InvalidField {
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("No valid records left in {0} after cleaning")]
    EmptyDataset(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl IngestError {
    /// True for failures caused by the shape or content of the input file.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            IngestError::Schema { .. }
                | IngestError::InvalidField { .. }
                | IngestError::EmptyDataset(_)
        )
    }
}
