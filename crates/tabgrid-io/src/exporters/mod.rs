//! Table-set exporters.
//!
//! [`sienna`] writes the PowerSystems table data set: one CSV per entity
//! kind plus the time-series files and their pointer index from
//! [`time_series`].

pub mod sienna;
pub mod time_series;


pub use sienna::SiennaExporter;
pub use time_series::{
    build_timeseries_pointers, create_timeseries_pointers, export_time_series_csv,
    TimeSeriesPointer,
};

use std::fmt;
use std::path::{Path, PathBuf};

/// What happened to one output table.
#[derive(Debug, Clone, PartialEq)]
pub enum TableOutcome {
    Written { path: PathBuf, rows: usize },
    /// Intentionally omitted; the run continued.
    Skipped { reason: String },
}

/// Summary of an export run, in the order tables were produced.
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    pub tables: Vec<(String, TableOutcome)>,
}

impl ExportReport {
    pub fn record(&mut self, table: &str, outcome: TableOutcome) {
        self.tables.push((table.to_string(), outcome));
    }

    pub fn record_written(&mut self, table: &str, path: PathBuf, rows: usize) {
        self.record(table, TableOutcome::Written { path, rows });
    }

    pub fn outcome(&self, table: &str) -> Option<&TableOutcome> {
        self.tables
            .iter()
            .find(|(name, _)| name == table)
            .map(|(_, outcome)| outcome)
    }

    pub fn written_files(&self) -> impl Iterator<Item = &Path> {
        self.tables.iter().filter_map(|(_, outcome)| match outcome {
            TableOutcome::Written { path, .. } => Some(path.as_path()),
            TableOutcome::Skipped { .. } => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tables.iter().filter_map(|(name, outcome)| match outcome {
            TableOutcome::Skipped { reason } => Some((name.as_str(), reason.as_str())),
            TableOutcome::Written { .. } => None,
        })
    }
}

impl fmt::Display for ExportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, outcome) in &self.tables {
            match outcome {
                TableOutcome::Written { path, rows } => {
                    writeln!(f, "  {name:<28} {rows:>6} rows  {}", path.display())?
                }
                TableOutcome::Skipped { reason } => {
                    writeln!(f, "  {name:<28} skipped: {reason}")?
                }
            }
        }
        Ok(())
    }
}
