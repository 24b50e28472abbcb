//! # tabgrid-io: Table Data Export for Grid Models
//!
//! Turns a [`tabgrid_core::System`] into the CSV table set read by
//! PowerSystems' tabular parser, plus the time-series data files and the
//! `timeseries_pointers.json` index that points at them.
//!
//! ## Design Philosophy
//!
//! **Records, not objects**: every component is extracted into a flat
//! [`tabgrid_core::Record`] and reshaped by small pure stages
//! ([`pipeline`]). Each table is one composition of stages followed by a
//! schema-driven CSV write ([`writer`]).
//!
//! **Configuration up front**: [`SiennaExporter::new`] validates the
//! scenario before any file is touched. Data problems found later stop the
//! run and leave already written tables in place.
//!
//! **Skip, don't fail**: tables that cannot be produced for a structural
//! reason (no storage, no single reserve map) are logged and reported as
//! [`TableOutcome::Skipped`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use tabgrid_core::System;
//! use tabgrid_io::{load_scenario, SiennaExporter};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let system = System::from_json_file("system.json")?;
//!     let scenario = load_scenario(Path::new("scenario.toml"))?;
//!     let report = SiennaExporter::new(&scenario, &system)?.run()?;
//!     print!("{report}");
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - scenario files (TOML, YAML, JSON) and Sienna defaults
//! - [`pipeline`] - record stages: rename, unit conversion, flatten, unnest, defaults
//! - [`operation_cost`] - nested cost curves to `heat_rate_*` / `*_point_*` columns
//! - [`writer`] - schema-driven CSV and pretty JSON output
//! - [`exporters`] - the Sienna table exporter and time-series files
//! - [`error`] - [`ExportError`] and [`ExportResult`]

pub mod config;
pub mod error;
pub mod exporters;
pub mod operation_cost;
pub mod pipeline;
pub mod writer;

pub use config::{
    load_scenario, load_table_descriptor, InputConfig, OutputConfig, Scenario, SiennaConfig,
    SiennaDefaults, SolveYears, TableSchemas,
};
pub use error::{ExportError, ExportResult};
pub use exporters::{ExportReport, SiennaExporter, TableOutcome, TimeSeriesPointer};
pub use pipeline::{get_export_records, Pipeline, PropertyMap, UnitMap};
