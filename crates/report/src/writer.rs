use crate::error::ReportError;
use chrono::{DateTime, Utc};
use configuration::Delimiter;
use core_types::Table;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const MANIFEST_FILE: &str = "manifest.json";

/// One written table, as listed in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub name: String,
    pub file: String,
    pub rows: usize,
}

/// Describes a complete run. Written last, so its presence means every table landed.
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub record_count: usize,
    pub artifacts: Vec<Artifact>,
}

/// Writes named tables as delimited files under one output directory.
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    output_dir: PathBuf,
    delimiter: Delimiter,
}

impl ReportAssembler {
    pub fn new(output_dir: impl Into<PathBuf>, delimiter: Delimiter) -> Self {
        Self {
            output_dir: output_dir.into(),
            delimiter,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// The path a table with this name is written to.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.output_dir
            .join(format!("{name}.{}", self.delimiter.extension()))
    }

    /// Writes one table, replacing any previous file of the same name.
    pub fn write_table(&self, table: &Table) -> Result<Artifact, ReportError> {
        self.write_table_to(table, &self.path_for(&table.name))
    }

    /// Writes one table to an explicit path instead of the derived file name.
    pub fn write_table_to(&self, table: &Table, path: &Path) -> Result<Artifact, ReportError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(ReportError::io(parent))?;
        }
        write_delimited(table, path, self.delimiter.as_byte())?;

        tracing::debug!(
            table = %table.name,
            rows = table.len(),
            path = %path.display(),
            "table written"
        );
        Ok(Artifact {
            name: table.name.clone(),
            file: file_name(path),
            rows: table.len(),
        })
    }

    /// Writes every table in order, stopping at the first failure.
    pub fn write_all(&self, tables: &[Table]) -> Result<Vec<Artifact>, ReportError> {
        let artifacts = tables
            .iter()
            .map(|t| self.write_table(t))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::info!(
            tables = artifacts.len(),
            dir = %self.output_dir.display(),
            "report tables written"
        );
        Ok(artifacts)
    }

    /// Writes `manifest.json` describing the run.
    pub fn write_manifest(&self, manifest: &Manifest) -> Result<PathBuf, ReportError> {
        fs::create_dir_all(&self.output_dir).map_err(ReportError::io(&self.output_dir))?;
        let path = self.output_dir.join(MANIFEST_FILE);
        let file = File::create(&path).map_err(ReportError::io(&path))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, manifest)?;
        writer.flush().map_err(ReportError::io(&path))?;
        Ok(path)
    }
}

fn write_delimited(table: &Table, path: &Path, delimiter: u8) -> Result<(), ReportError> {
    let file = File::create(path).map_err(ReportError::io(path))?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(BufWriter::new(file));

    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(ToString::to_string))?;
    }
    writer.flush().map_err(ReportError::io(path))?;
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
