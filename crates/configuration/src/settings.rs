use core_types::Field;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section has defaults, so an absent config file still yields a usable
/// configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub analysis: AnalysisSettings,
    #[serde(default)]
    pub report: ReportSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Input and output locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Paths {
    /// The cleaned (or raw) sales CSV to analyse.
    pub input: PathBuf,
    /// Directory that receives one delimited file per result table.
    pub output_dir: PathBuf,
}

/// Parameters for the analysis engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Trailing window, in days, for the daily moving average. 0 disables it.
    pub moving_average_window: usize,
    /// Numeric fields that enter the correlation matrix, in matrix order.
    pub correlation_fields: Vec<Field>,
    /// Numeric fields described in the summary statistics table.
    pub summary_fields: Vec<Field>,
}

/// Parameters for the report assembler.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportSettings {
    pub delimiter: Delimiter,
    /// Also render every table to stdout.
    pub print_tables: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
}

/// Field separator for the written tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    #[default]
    Comma,
    Tab,
    Semicolon,
    Pipe,
}

impl Delimiter {
    pub fn as_byte(&self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Tab => b'\t',
            Delimiter::Semicolon => b';',
            Delimiter::Pipe => b'|',
        }
    }

    /// File extension that matches the separator.
    pub fn extension(&self) -> &'static str {
        match self {
            Delimiter::Tab => "tsv",
            _ => "csv",
        }
    }
}

// --- Default Implementations ---

impl Default for Paths {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/processed/sales_data_cleaned.csv"),
            output_dir: PathBuf::from("output/tables"),
        }
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            moving_average_window: 7,
            correlation_fields: vec![Field::SalesAmount, Field::UnitsSold, Field::UnitPrice],
            summary_fields: vec![Field::SalesAmount, Field::UnitsSold],
        }
    }
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            delimiter: Delimiter::Comma,
            print_tables: false,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}
