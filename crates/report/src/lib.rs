//! Writes analysis tables to disk and renders them for the console.
//!
//! Every table becomes `<output_dir>/<name>.<ext>`, where the extension
//! follows the configured delimiter. A `manifest.json` listing the run id and
//! every artifact is written after the tables.

pub mod console;
pub mod error;
pub mod writer;

pub use console::render;
pub use error::ReportError;
pub use writer::{Artifact, Manifest, ReportAssembler, MANIFEST_FILE};
