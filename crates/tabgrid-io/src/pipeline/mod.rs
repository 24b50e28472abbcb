//! Record transformation pipeline.
//!
//! Each stage takes a record by reference and returns a new one; nothing is
//! mutated in place. A [`Pipeline`] chains stages in the order they were
//! added, and [`get_export_records`] maps a whole batch through it.
//!
//! ```
//! use tabgrid_core::{Record, RecordBuilder, Value};
//! use tabgrid_io::pipeline::{apply_default_value, apply_property_map, Pipeline, PropertyMap};
//!
//! let renames = PropertyMap::from([("number".to_string(), "bus_id".to_string())]);
//! let defaults: Record = RecordBuilder::new().field("tap", 1.0).build();
//! let pipeline = Pipeline::new()
//!     .then(move |r| Ok(apply_property_map(r, &renames)))
//!     .then(move |r| Ok(apply_default_value(r, &defaults)));
//!
//! let record = RecordBuilder::new().field("number", 3).build();
//! let out = pipeline.run(&record).unwrap();
//! assert_eq!(out.get("bus_id"), Some(&Value::Int(3)));
//! assert_eq!(out.get("tap"), Some(&Value::Float(1.0)));
//! ```

mod stages;

pub use stages::{
    apply_default_value, apply_derived_field, apply_flatten_key, apply_property_map,
    apply_unit_deconstruction, apply_unnest_key,
};

use crate::error::ExportResult;
use std::collections::BTreeMap;
use tabgrid_core::Record;
use tracing::debug;

/// Source field name to target field name.
pub type PropertyMap = BTreeMap<String, String>;

/// Field name to unit symbol.
pub type UnitMap = BTreeMap<String, String>;

/// One transformation step.
pub type StageFn<'a> = Box<dyn Fn(&Record) -> ExportResult<Record> + 'a>;

/// Ordered chain of stages.
#[derive(Default)]
pub struct Pipeline<'a> {
    stages: Vec<StageFn<'a>>,
}

impl<'a> Pipeline<'a> {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a stage; it sees the output of every stage added before it.
    pub fn then(mut self, stage: impl Fn(&Record) -> ExportResult<Record> + 'a) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn run(&self, record: &Record) -> ExportResult<Record> {
        let mut current = record.clone();
        for stage in &self.stages {
            current = stage(&current)?;
        }
        Ok(current)
    }
}

/// Run every record through `pipeline`, stopping at the first failure.
pub fn get_export_records(records: &[Record], pipeline: &Pipeline<'_>) -> ExportResult<Vec<Record>> {
    debug!(
        records = records.len(),
        stages = pipeline.len(),
        "running export pipeline"
    );
    records.iter().map(|record| pipeline.run(record)).collect()
}

/// Layer `overrides` on top of `global`; overrides win on key collision.
pub fn compose_map(
    global: &BTreeMap<String, String>,
    overrides: &[(&str, &str)],
) -> BTreeMap<String, String> {
    let mut composed = global.clone();
    for (key, value) in overrides {
        composed.insert((*key).to_string(), (*value).to_string());
    }
    composed
}
