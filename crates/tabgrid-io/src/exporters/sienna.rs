//! PowerSystems table data exporter.
//!
//! Writes the CSV set read by PowerSystems' tabular parser:
//!
//! | File | Placeholder |
//! |------|-------------|
//! | `bus.csv` | `NA` |
//! | `load.csv` | `0.0` |
//! | `branch.csv` | `NA` |
//! | `dc_branch.csv` | `NA` |
//! | `gen.csv` | `NA` |
//! | `reserves.csv` | `NA` |
//! | `storage.csv` | `NA` |
//!
//! followed by the time-series data files and `timeseries_pointers.json`.
//! Tables are produced strictly in that order. A failure stops the run and
//! leaves already written files in place.

use super::time_series::{create_timeseries_pointers, export_time_series_csv};
use super::{ExportReport, TableOutcome};
use crate::config::{Scenario, TableSchemas};
use crate::error::{ExportError, ExportResult};
use crate::operation_cost::apply_operation_table_data;
use crate::pipeline::{
    apply_default_value, apply_derived_field, apply_flatten_key, apply_property_map,
    apply_unit_deconstruction, apply_unnest_key, compose_map, get_export_records, Pipeline,
    PropertyMap, UnitMap,
};
use crate::writer::write_table;
use std::fs;
use std::path::{Path, PathBuf};
use tabgrid_core::{
    Category, Component, ComponentKind, DeviceSet, Record, RecordBuilder, ReserveDirection,
    ReserveMap, ResolveReference, System, Value,
};
use tracing::{info, warn};

pub const BUS_FIELDS: &[&str] = &["bus_id", "name", "area", "zone", "base_voltage", "bus_type"];

// `max_reeactive_power` is the column name the reader expects.
pub const LOAD_FIELDS: &[&str] = &[
    "bus_id",
    "name",
    "available",
    "active_power",
    "reactive_power",
    "max_active_power",
    "max_reeactive_power",
];

pub const BRANCH_FIELDS: &[&str] = &[
    "name",
    "connection_points_from",
    "connection_points_to",
    "r",
    "x",
    "primary_shunt",
    "rate",
    "rating_up",
    "rating_down",
    "tap",
    "is_transformer",
    "ext",
];

pub const DC_BRANCH_FIELDS: &[&str] = &[
    "name",
    "connection_points_from",
    "connection_points_to",
    "rate",
    "loss",
];

pub const RESERVE_FIELDS: &[&str] = &[
    "name",
    "requirement",
    "timeframe",
    "eligible_region",
    "direction",
    "contributing_devices",
    "eligible_device_categories",
    "eligible_device_subcategories",
];

pub const STORAGE_FIELDS: &[&str] = &[
    "name",
    "position",
    "available",
    "generator_name",
    "bus_id",
    "active_power",
    "rating",
    "input_efficiency",
    "output_efficiency",
    "storage_capacity",
    "min_storage_capacity",
    "max_storage_capacity",
    "input_active_power_limit_min",
    "output_active_power_limit_max",
    "output_active_power_limit_min",
    "unit_type",
];

const ELIGIBLE_DEVICE_CATEGORIES: &str = "(Generator,Storage)";

/// Render device names the way a literal tuple prints: `(a, b)`, `(a,)`, `()`.
pub fn tuple_literal(devices: &DeviceSet) -> String {
    let names: Vec<&str> = devices.iter().collect();
    match names.as_slice() {
        [single] => format!("({single},)"),
        _ => format!("({})", names.join(", ")),
    }
}

fn records_of(system: &System, category: Category) -> Vec<Record> {
    system
        .get_components(category, None)
        .map(Component::to_record)
        .collect()
}

fn branch_ends_unnest<'s>(
    system: &'s System,
) -> impl Fn(&Record) -> ExportResult<Record> + 's {
    move |r| {
        apply_unnest_key(
            r,
            &[
                ("connection_points_from", "number"),
                ("connection_points_to", "number"),
            ],
            system,
        )
    }
}

/// Exporter for one scenario over a read-only system.
#[derive(Debug)]
pub struct SiennaExporter<'a> {
    scenario: &'a Scenario,
    system: &'a System,
    property_map: PropertyMap,
    unit_map: UnitMap,
    schemas: TableSchemas,
    year: i32,
    output_folder: PathBuf,
}

impl<'a> SiennaExporter<'a> {
    /// Validate the scenario and capture everything the run needs.
    ///
    /// # Errors
    ///
    /// [`ExportError::Configuration`] when the output config is missing or
    /// not Sienna, when more than one solve year is requested, when no
    /// reference year can be determined, or when the generator schema is
    /// missing.
    pub fn new(scenario: &'a Scenario, system: &'a System) -> ExportResult<Self> {
        let config = scenario.sienna_output()?;
        let year = config.reference_year().ok_or_else(|| {
            ExportError::Configuration(
                "no reference year: set solve_year or weather_year".to_string(),
            )
        })?;
        let schemas = config.defaults.table_schemas()?;
        if !schemas.contains_key("generator") {
            return Err(ExportError::Configuration(
                "table_data has no 'generator' schema".to_string(),
            ));
        }
        Ok(Self {
            scenario,
            system,
            property_map: config.defaults.sienna_property_map.clone(),
            unit_map: config.defaults.sienna_unit_map.clone(),
            schemas,
            year,
            output_folder: scenario.output_folder.clone(),
        })
    }

    /// Write into `folder` instead of the scenario's output folder.
    pub fn with_output_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.output_folder = folder.into();
        self
    }

    pub fn output_folder(&self) -> &Path {
        &self.output_folder
    }

    pub fn reference_year(&self) -> i32 {
        self.year
    }

    /// Run every table export in order.
    pub fn run(&self) -> ExportResult<ExportReport> {
        info!("Starting SiennaExporter");
        fs::create_dir_all(&self.output_folder)?;

        let mut report = ExportReport::default();
        let tables: [(&str, fn(&Self) -> ExportResult<TableOutcome>); 7] = [
            ("bus.csv", Self::process_bus_data),
            ("load.csv", Self::process_load_data),
            ("branch.csv", Self::process_branch_data),
            ("dc_branch.csv", Self::process_dc_branch_data),
            ("gen.csv", Self::process_gen_data),
            ("reserves.csv", Self::process_reserves_data),
            ("storage.csv", Self::process_storage_data),
        ];
        for (name, process) in tables {
            report.record(name, process(self)?);
        }

        for (path, rows) in export_time_series_csv(
            self.system,
            &self.output_folder,
            &self.scenario.name,
            self.year,
        )? {
            let table = path
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default();
            report.record_written(&table, path, rows);
        }

        let pointers = create_timeseries_pointers(
            self.system,
            &self.output_folder,
            &self.scenario.name,
            self.year,
        )?;
        let count: usize = self
            .system
            .get_components(Category::Any, None)
            .map(|c| self.system.list_time_series_metadata(c).len())
            .sum();
        report.record_written("timeseries_pointers.json", pointers, count);

        info!("SiennaExporter finished");
        Ok(report)
    }

    fn write(
        &self,
        fname: &str,
        records: &[Record],
        fields: &[impl AsRef<str>],
        placeholder: &str,
    ) -> ExportResult<TableOutcome> {
        let path = self.output_folder.join(fname);
        write_table(records, &path, fields, placeholder)?;
        info!("File {fname} created.");
        Ok(TableOutcome::Written {
            path,
            rows: records.len(),
        })
    }

    pub fn process_bus_data(&self) -> ExportResult<TableOutcome> {
        let property_map = compose_map(
            &self.property_map,
            &[("number", "bus_id"), ("load_zone", "zone")],
        );
        let pipeline = Pipeline::new()
            .then(|r| Ok(apply_property_map(r, &property_map)))
            .then(|r| apply_unit_deconstruction(r, &self.unit_map))
            .then(|r| apply_unnest_key(r, &[("zone", "name"), ("area", "name")], self.system));
        let records = get_export_records(&records_of(self.system, Category::Bus), &pipeline)?;
        self.write("bus.csv", &records, BUS_FIELDS, "NA")
    }

    pub fn process_load_data(&self) -> ExportResult<TableOutcome> {
        let property_map = compose_map(&self.property_map, &[("bus", "bus_id")]);
        let pipeline = Pipeline::new()
            .then(|r| Ok(apply_property_map(r, &property_map)))
            .then(|r| apply_unit_deconstruction(r, &self.unit_map))
            .then(|r| apply_unnest_key(r, &[("bus_id", "number")], self.system));
        let records = get_export_records(&records_of(self.system, Category::Load), &pipeline)?;
        self.write("load.csv", &records, LOAD_FIELDS, "0.0")
    }

    pub fn process_branch_data(&self) -> ExportResult<TableOutcome> {
        let property_map = compose_map(
            &self.property_map,
            &[
                ("from_bus", "connection_points_from"),
                ("to_bus", "connection_points_to"),
                ("class_type", "branch_type"),
                ("rating", "rate"),
                ("b", "primary_shunt"),
            ],
        );
        let tap_default = RecordBuilder::new().field("tap", 1.0).build();
        let pipeline = Pipeline::new()
            .then(|r| Ok(apply_property_map(r, &property_map)))
            .then(|r| apply_unit_deconstruction(r, &self.unit_map))
            .then(branch_ends_unnest(self.system))
            .then(|r| {
                Ok(apply_derived_field(r, "is_transformer", |record| {
                    let branch_type = record.get("branch_type").and_then(Value::as_str);
                    Value::Bool(branch_type == Some(ComponentKind::Transformer2W.as_str()))
                }))
            })
            .then(|r| Ok(apply_default_value(r, &tap_default)));
        let records =
            get_export_records(&records_of(self.system, Category::AcBranch), &pipeline)?;
        self.write("branch.csv", &records, BRANCH_FIELDS, "NA")
    }

    pub fn process_dc_branch_data(&self) -> ExportResult<TableOutcome> {
        let property_map = compose_map(
            &self.property_map,
            &[
                ("from_bus", "connection_points_from"),
                ("to_bus", "connection_points_to"),
                ("class_type", "branch_type"),
                ("rating_up", "rate"),
            ],
        );
        let pipeline = Pipeline::new()
            .then(|r| Ok(apply_property_map(r, &property_map)))
            .then(|r| apply_unit_deconstruction(r, &self.unit_map))
            .then(branch_ends_unnest(self.system));
        let records =
            get_export_records(&records_of(self.system, Category::DcBranch), &pipeline)?;
        self.write("dc_branch.csv", &records, DC_BRANCH_FIELDS, "NA")
    }

    /// Generator rows are written in descending name order.
    pub fn process_gen_data(&self) -> ExportResult<TableOutcome> {
        let fields = self.schemas.get("generator").ok_or_else(|| {
            ExportError::Configuration("table_data has no 'generator' schema".to_string())
        })?;
        let property_map = compose_map(
            &self.property_map,
            &[("bus", "bus_id"), ("prime_mover_type", "unit_type")],
        );
        let defaults = RecordBuilder::new()
            .field("fuel_price", 0.0)
            .field("power_factor", 1.0)
            .field("startup_cost", 0.0)
            .build();
        let pipeline = Pipeline::new()
            .then(apply_operation_table_data)
            .then(|r| Ok(apply_flatten_key(r, &["active_power_limits"])))
            .then(|r| Ok(apply_property_map(r, &property_map)))
            .then(|r| apply_unit_deconstruction(r, &self.unit_map))
            .then(|r| apply_unnest_key(r, &[("bus_id", "number")], self.system))
            .then(|r| Ok(apply_default_value(r, &defaults)));
        let mut records =
            get_export_records(&records_of(self.system, Category::Generator), &pipeline)?;
        records.sort_by(|a, b| {
            let name = |r: &Record| r.get("name").and_then(Value::as_str).map(str::to_owned);
            name(b).cmp(&name(a))
        });
        self.write("gen.csv", &records, fields, "NA")
    }

    /// Reserves present in the system's only reserve map.
    pub fn process_reserves_data(&self) -> ExportResult<TableOutcome> {
        let reserve_maps: Vec<&ReserveMap> = self
            .system
            .get_components(Category::ReserveMap, None)
            .filter_map(Component::as_reserve_map)
            .collect();
        let reserve_map = match reserve_maps.as_slice() {
            [] => {
                let reason = "Reserve map class not found on the system. \
                              Skipping reserve contributing devices file.";
                warn!("{reason}");
                return Ok(TableOutcome::Skipped {
                    reason: reason.to_string(),
                });
            }
            [only] => *only,
            many => {
                let reason = format!(
                    "We do not support multiple reserve maps per system (found {})",
                    many.len()
                );
                warn!("{reason}");
                return Ok(TableOutcome::Skipped { reason });
            }
        };

        let mut rows = Vec::new();
        for component in self.system.get_components(Category::Reserve, None) {
            let Some(devices) = reserve_map.mapping.get(component.name()) else {
                continue;
            };
            let mut record = component.to_record();
            let direction: ReserveDirection = record
                .get("direction")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .parse()
                .map_err(ExportError::DataIntegrity)?;
            record.insert("direction".into(), Value::from(direction.symbol()));
            record.insert(
                "eligible_device_categories".into(),
                Value::from(ELIGIBLE_DEVICE_CATEGORIES),
            );
            record.insert(
                "contributing_devices".into(),
                Value::from(tuple_literal(devices)),
            );
            rows.push(record);
        }

        let property_map = compose_map(
            &self.property_map,
            &[("region", "eligible_region"), ("max_requirement", "requirement")],
        );
        let pipeline = Pipeline::new()
            .then(|r| Ok(apply_property_map(r, &property_map)))
            .then(|r| apply_unit_deconstruction(r, &self.unit_map))
            .then(|r| apply_unnest_key(r, &[("eligible_region", "name")], self.system));
        let records = get_export_records(&rows, &pipeline)?;
        self.write("reserves.csv", &records, RESERVE_FIELDS, "NA")
    }

    /// Two rows per storage device, `<name>_head` and `<name>_tail`.
    pub fn process_storage_data(&self) -> ExportResult<TableOutcome> {
        let pipeline = Pipeline::new()
            .then(|r| Ok(apply_property_map(r, &self.property_map)))
            .then(|r| Ok(apply_flatten_key(r, &["active_power_limits"])))
            .then(|r| apply_unit_deconstruction(r, &self.unit_map));
        let storage = get_export_records(&records_of(self.system, Category::Storage), &pipeline)?;

        if storage.is_empty() {
            let reason = "No storage devices found";
            warn!("{reason}");
            return Ok(TableOutcome::Skipped {
                reason: reason.to_string(),
            });
        }

        let mut rows = Vec::with_capacity(storage.len() * 2);
        for record in storage {
            let row = self.storage_row(record)?;
            let name = row
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            for position in ["head", "tail"] {
                let mut copy = row.clone();
                copy.insert("name".into(), Value::from(format!("{name}_{position}")));
                copy.insert("position".into(), Value::from(position));
                rows.push(copy);
            }
        }
        self.write("storage.csv", &rows, STORAGE_FIELDS, "NA")
    }

    fn storage_row(&self, mut record: Record) -> ExportResult<Record> {
        let name = record.get("name").cloned().unwrap_or_default();
        record.insert("generator_name".into(), name);

        let limit_max = record
            .get("active_power_limits_max")
            .cloned()
            .unwrap_or_default();
        record.insert("input_active_power_limit_max".into(), limit_max.clone());
        record.insert("output_active_power_limit_max".into(), limit_max);
        record.insert("input_active_power_limit_min".into(), Value::Float(0.0));
        record.insert("output_active_power_limit_min".into(), Value::Float(0.0));

        let bus_id = match record.get("bus") {
            Some(Value::Ref(bus)) => self
                .system
                .resolve_attribute(bus, "number")?
                .unwrap_or_default(),
            _ => Value::Null,
        };
        record.insert("bus_id".into(), bus_id);
        Ok(record)
    }
}
