//! Time-series data files and the pointer index that describes them.

use crate::error::{ExportError, ExportResult};
use crate::writer::write_json_pretty;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tabgrid_core::{format_float, Category, Component, ComponentKind, SingleTimeSeries, System};
use tracing::{debug, info};

pub const POINTERS_FILE: &str = "timeseries_pointers.json";
pub const DATA_FOLDER: &str = "Data";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One entry of `timeseries_pointers.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesPointer {
    pub category: String,
    pub component_name: String,
    pub data_file: String,
    pub normalization_factor: &'static str,
    /// Seconds between values
    pub resolution: i64,
    pub name: String,
    pub scaling_factor_multiplier_module: &'static str,
    pub scaling_factor_multiplier: &'static str,
}

/// Path of the data file holding `variable` for every component of `kind`.
pub fn data_file_path(
    output_folder: &Path,
    kind: ComponentKind,
    variable: &str,
    scenario_name: &str,
    reference_year: i32,
) -> PathBuf {
    output_folder
        .join(DATA_FOLDER)
        .join(format!("{kind}_{variable}_{scenario_name}_{reference_year}.csv"))
}

/// Components carrying at least one series, in store order.
fn components_with_series(system: &System) -> Vec<&Component> {
    let has_series = |c: &Component| system.has_time_series(c);
    system
        .get_components(Category::Any, Some(&has_series))
        .collect()
}

/// One pointer per (component, series) pair, components in store order and
/// series in attachment order.
pub fn build_timeseries_pointers(
    system: &System,
    output_folder: &Path,
    scenario_name: &str,
    reference_year: i32,
) -> Vec<TimeSeriesPointer> {
    let mut pointers = Vec::new();
    for component in components_with_series(system) {
        for metadata in system.list_time_series_metadata(component) {
            let data_file = data_file_path(
                output_folder,
                component.kind(),
                &metadata.variable_name,
                scenario_name,
                reference_year,
            );
            pointers.push(TimeSeriesPointer {
                category: component.kind().to_string(),
                component_name: component.name().to_string(),
                data_file: data_file.display().to_string(),
                normalization_factor: "MAX",
                resolution: metadata.resolution_seconds(),
                name: metadata.variable_name,
                scaling_factor_multiplier_module: "PowerSystems",
                scaling_factor_multiplier: "get_max_active_power",
            });
        }
    }
    pointers
}

/// Write `timeseries_pointers.json` into `output_folder` and return its path.
pub fn create_timeseries_pointers(
    system: &System,
    output_folder: &Path,
    scenario_name: &str,
    reference_year: i32,
) -> ExportResult<PathBuf> {
    info!("Exporting time series pointers.");
    let pointers = build_timeseries_pointers(system, output_folder, scenario_name, reference_year);
    let path = output_folder.join(POINTERS_FILE);
    write_json_pretty(&pointers, &path)?;
    info!(pointers = pointers.len(), "File {} created.", path.display());
    Ok(path)
}

/// Write one CSV per (kind, variable) under `<output_folder>/Data`.
///
/// Each file has a `DateTime` column followed by one column per component,
/// in store order. Timestamps come from the first series in the file.
///
/// # Errors
///
/// [`ExportError::DataIntegrity`] when series sharing a file differ in length.
pub fn export_time_series_csv(
    system: &System,
    output_folder: &Path,
    scenario_name: &str,
    reference_year: i32,
) -> ExportResult<Vec<(PathBuf, usize)>> {
    let mut groups: BTreeMap<(ComponentKind, String), Vec<(&str, &SingleTimeSeries)>> =
        BTreeMap::new();
    for component in components_with_series(system) {
        for metadata in system.list_time_series_metadata(component) {
            if let Some(series) = system.get_time_series(component, &metadata.variable_name) {
                groups
                    .entry((component.kind(), metadata.variable_name))
                    .or_default()
                    .push((component.name(), series));
            }
        }
    }
    if groups.is_empty() {
        debug!("no time series attached, skipping data files");
        return Ok(Vec::new());
    }

    fs::create_dir_all(output_folder.join(DATA_FOLDER))?;
    let mut written = Vec::with_capacity(groups.len());
    for ((kind, variable), columns) in &groups {
        let path = data_file_path(output_folder, *kind, variable, scenario_name, reference_year);
        let rows = write_series_csv(&path, columns)?;
        debug!(path = %path.display(), columns = columns.len(), "wrote time series file");
        written.push((path, rows));
    }
    info!(files = written.len(), "Saving time series data.");
    Ok(written)
}

fn write_series_csv(path: &Path, columns: &[(&str, &SingleTimeSeries)]) -> ExportResult<usize> {
    let Some((first_name, first)) = columns.first() else {
        return Ok(0);
    };
    let length = first.data.len();
    for (name, series) in &columns[1..] {
        let mismatch = if series.data.len() != length {
            Some(format!("has {} values, {first_name} has {length}", series.data.len()))
        } else if series.initial_time != first.initial_time {
            Some(format!(
                "starts at {}, {first_name} starts at {}",
                series.initial_time, first.initial_time
            ))
        } else if series.resolution != first.resolution {
            Some(format!(
                "has resolution {}s, {first_name} has {}s",
                series.resolution, first.resolution
            ))
        } else {
            None
        };
        if let Some(detail) = mismatch {
            return Err(ExportError::DataIntegrity(format!(
                "time series '{}' of {name} {detail}",
                series.variable_name
            )));
        }
    }

    let file = fs::File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(io::BufWriter::new(file));
    let mut header = vec!["DateTime"];
    header.extend(columns.iter().map(|(name, _)| *name));
    wtr.write_record(&header)?;

    for i in 0..length {
        let timestamp = first.timestamp(i).ok_or_else(|| {
            ExportError::DataIntegrity(format!(
                "time series '{}' of {first_name}: timestamp {i} is out of range",
                first.variable_name
            ))
        })?;
        let mut row = Vec::with_capacity(columns.len() + 1);
        row.push(timestamp.format(TIMESTAMP_FORMAT).to_string());
        row.extend(columns.iter().map(|(_, series)| format_float(series.data[i])));
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(length)
}
