//! Scenario configuration.
//!
//! A scenario names the run, the output folder, the model the data came
//! from (`input_config`) and the table format to produce (`output_config`).
//! Both configs are tagged by `model`:
//!
//! ```toml
//! name = "base"
//! output_folder = "out"
//!
//! [input_config]
//! model = "reeds"
//! solve_year = 2030
//! weather_year = 2012
//!
//! [output_config]
//! model = "sienna"
//!
//! [output_config.defaults.sienna_property_map]
//! prime_mover_type = "unit_type"
//! ```
//!
//! Scenario files load from TOML, YAML or JSON, chosen by extension.

use crate::error::{ExportError, ExportResult};
use crate::pipeline::{PropertyMap, UnitMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Entity kind to ordered list of output columns.
pub type TableSchemas = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub output_folder: PathBuf,
    #[serde(default)]
    pub input_config: Option<InputConfig>,
    #[serde(default)]
    pub output_config: Option<OutputConfig>,
}

/// One year or a list of years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SolveYears {
    Single(i32),
    Many(Vec<i32>),
}

impl SolveYears {
    /// The single requested year. A list is only accepted with one entry.
    pub fn single(&self) -> ExportResult<i32> {
        match self {
            SolveYears::Single(year) => Ok(*year),
            SolveYears::Many(years) => match years.as_slice() {
                [year] => Ok(*year),
                _ => Err(ExportError::Configuration(format!(
                    "Multiple solve years are not supported: {years:?}"
                ))),
            },
        }
    }
}

/// Model the system was read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "lowercase")]
pub enum InputConfig {
    Reeds {
        #[serde(default)]
        solve_year: Option<SolveYears>,
        #[serde(default)]
        weather_year: Option<i32>,
    },
    Plexos {
        #[serde(default)]
        model_year: Option<i32>,
    },
    Sienna {
        #[serde(default)]
        solve_year: Option<i32>,
        #[serde(default)]
        weather_year: Option<i32>,
    },
}

impl InputConfig {
    pub fn model_name(&self) -> &'static str {
        match self {
            InputConfig::Reeds { .. } => "reeds",
            InputConfig::Plexos { .. } => "plexos",
            InputConfig::Sienna { .. } => "sienna",
        }
    }

    /// Solve year requested by the input model, if any.
    pub fn solve_year(&self) -> ExportResult<Option<i32>> {
        match self {
            InputConfig::Reeds { solve_year, .. } => {
                solve_year.as_ref().map(SolveYears::single).transpose()
            }
            InputConfig::Plexos { model_year } => Ok(*model_year),
            InputConfig::Sienna { solve_year, .. } => Ok(*solve_year),
        }
    }

    pub fn weather_year(&self) -> Option<i32> {
        match self {
            InputConfig::Reeds { weather_year, .. } | InputConfig::Sienna { weather_year, .. } => {
                *weather_year
            }
            InputConfig::Plexos { .. } => None,
        }
    }
}

/// Table format to produce.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "lowercase")]
pub enum OutputConfig {
    Sienna(SiennaConfig),
    Plexos(PlexosConfig),
}

impl OutputConfig {
    pub fn model_name(&self) -> &'static str {
        match self {
            OutputConfig::Sienna(_) => "sienna",
            OutputConfig::Plexos(_) => "plexos",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlexosConfig {
    #[serde(default)]
    pub model_year: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiennaConfig {
    #[serde(default)]
    pub solve_year: Option<i32>,
    #[serde(default)]
    pub weather_year: Option<i32>,
    #[serde(default)]
    pub defaults: SiennaDefaults,
}

impl SiennaConfig {
    /// Year stamped into data file names: the solve year, else the weather year.
    pub fn reference_year(&self) -> Option<i32> {
        self.solve_year.or(self.weather_year)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiennaDefaults {
    #[serde(default = "default_property_map")]
    pub sienna_property_map: PropertyMap,
    #[serde(default = "default_unit_map")]
    pub sienna_unit_map: UnitMap,
    #[serde(default = "default_table_data")]
    pub table_data: TableSchemas,
    /// Local table descriptor whose field lists replace `table_data` entries.
    #[serde(default)]
    pub table_descriptor: Option<PathBuf>,
}

impl Default for SiennaDefaults {
    fn default() -> Self {
        Self {
            sienna_property_map: default_property_map(),
            sienna_unit_map: default_unit_map(),
            table_data: default_table_data(),
            table_descriptor: None,
        }
    }
}

impl SiennaDefaults {
    /// `table_data` with any descriptor tables layered on top.
    pub fn table_schemas(&self) -> ExportResult<TableSchemas> {
        let mut schemas = self.table_data.clone();
        if let Some(path) = &self.table_descriptor {
            let descriptor = load_table_descriptor(path)?;
            debug!(path = %path.display(), tables = descriptor.len(), "loaded table descriptor");
            schemas.extend(descriptor);
        }
        Ok(schemas)
    }
}

fn pairs(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn default_property_map() -> PropertyMap {
    pairs(&[
        ("base_power", "base_mva"),
        ("prime_mover_type", "unit_type"),
        ("time_frame", "timeframe"),
    ])
}

fn default_unit_map() -> UnitMap {
    pairs(&[
        ("active_power", "MW"),
        ("active_power_limits_max", "MW"),
        ("active_power_limits_min", "MW"),
        ("base_voltage", "kV"),
        ("max_active_power", "MW"),
        ("max_reactive_power", "Mvar"),
        ("max_storage_capacity", "MWh"),
        ("min_storage_capacity", "MWh"),
        ("reactive_power", "Mvar"),
        ("storage_capacity", "MWh"),
    ])
}

/// Generator columns written when no schema is configured.
pub const DEFAULT_GENERATOR_FIELDS: &[&str] = &[
    "name",
    "available",
    "bus_id",
    "fuel",
    "fuel_price",
    "active_power",
    "reactive_power",
    "active_power_limits_max",
    "active_power_limits_min",
    "min_down_time",
    "min_up_time",
    "ramp_limits_up",
    "ramp_limits_down",
    "startup_cost",
    "variable_cost",
    "heat_rate_a0",
    "heat_rate_a1",
    "heat_rate_a2",
    "heat_rate_avg_0",
    "heat_rate_incr_1",
    "heat_rate_incr_2",
    "heat_rate_incr_3",
    "heat_rate_incr_4",
    "heat_rate_incr_5",
    "output_point_0",
    "output_point_1",
    "output_point_2",
    "output_point_3",
    "output_point_4",
    "output_point_5",
    "cost_point_0",
    "cost_point_1",
    "cost_point_2",
    "cost_point_3",
    "cost_point_4",
    "cost_point_5",
    "base_mva",
    "unit_type",
    "power_factor",
];

fn default_table_data() -> TableSchemas {
    let mut tables = TableSchemas::new();
    tables.insert(
        "generator".to_string(),
        DEFAULT_GENERATOR_FIELDS.iter().map(|f| f.to_string()).collect(),
    );
    tables
}

#[derive(Debug, Deserialize)]
struct DescriptorField {
    name: String,
}

/// Read a descriptor mapping table names to `[{"name": ...}, ...]` field
/// entries. Other keys on each entry are ignored.
pub fn load_table_descriptor(path: &Path) -> ExportResult<TableSchemas> {
    let data = fs::read_to_string(path)?;
    let raw: BTreeMap<String, Vec<DescriptorField>> = serde_json::from_str(&data)?;
    Ok(raw
        .into_iter()
        .map(|(table, fields)| (table, fields.into_iter().map(|f| f.name).collect()))
        .collect())
}

/// Load a scenario from TOML, YAML or JSON, chosen by file extension.
pub fn load_scenario(path: &Path) -> ExportResult<Scenario> {
    let data = fs::read_to_string(path)?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => Ok(toml::from_str(&data)?),
        Some("json") => Ok(serde_json::from_str(&data)?),
        Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&data)?),
        other => Err(ExportError::Configuration(format!(
            "unsupported scenario file extension {:?} for {}",
            other.unwrap_or(""),
            path.display()
        ))),
    }
}

impl Scenario {
    /// Sienna output settings with years carried over from the input model.
    ///
    /// # Errors
    ///
    /// [`ExportError::Configuration`] when the output config is missing or
    /// not Sienna, or when the input asks for more than one solve year.
    pub fn sienna_output(&self) -> ExportResult<SiennaConfig> {
        let output = match &self.output_config {
            Some(OutputConfig::Sienna(config)) => config,
            Some(other) => {
                return Err(ExportError::Configuration(format!(
                    "Output config is of type {}. It should be type of sienna.",
                    other.model_name()
                )))
            }
            None => {
                return Err(ExportError::Configuration(
                    "scenario has no output_config".into(),
                ))
            }
        };

        let mut resolved = output.clone();
        if let Some(input) = &self.input_config {
            let input_solve_year = input.solve_year()?;
            resolved.solve_year = resolved.solve_year.or(input_solve_year);
            resolved.weather_year = resolved.weather_year.or(input.weather_year());
        }
        Ok(resolved)
    }
}
