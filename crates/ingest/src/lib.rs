//! Loading and cleaning of sales transaction files.
//!
//! The loader checks the schema, applies the cleaning rules (deduplication,
//! required-field and positivity filters, text standardisation) and seals the
//! surviving rows into a `RecordSet`.

pub mod clean;
pub mod error;
pub mod loader;

pub use clean::{cleaned_table, title_case, CleaningSummary};
pub use error::IngestError;
pub use loader::{LoadOutcome, Loader, REQUIRED_COLUMNS};
