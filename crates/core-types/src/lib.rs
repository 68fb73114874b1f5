pub mod enums;
pub mod error;
pub mod record;
pub mod table;

// Re-export the core types to provide a clean public API.
pub use enums::{Field, Reduction};
pub use error::CoreError;
pub use record::{weekday_name, FieldValue, Record, RecordSet};
pub use table::{Cell, IntoTable, Table};
