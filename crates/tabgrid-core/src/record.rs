//! Flat, loosely-typed records extracted from typed components.
//!
//! A [`Record`] is an ordered mapping from field name to [`Value`]. Values may
//! still be unit-tagged ([`Value::Quantity`]), reference other components
//! ([`Value::Ref`]) or nest further records ([`Value::Map`]); the export
//! pipeline reduces them to scalars before a row is written.

use crate::units::Quantity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Ordered field mapping. Key order is deterministic.
pub type Record = BTreeMap<String, Value>;

/// Handle to another component, written as `"<Kind>.<name>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentRef(String);

impl ComponentRef {
    pub fn new(kind: &str, name: &str) -> Self {
        ComponentRef(format!("{kind}.{name}"))
    }

    /// Wrap an existing label without checking it.
    pub fn from_label(label: impl Into<String>) -> Self {
        ComponentRef(label.into())
    }

    pub fn label(&self) -> &str {
        &self.0
    }

    /// `(kind, name)` split at the first dot.
    pub fn parts(&self) -> Option<(&str, &str)> {
        self.0.split_once('.')
    }
}

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Quantity(Quantity),
    Ref(ComponentRef),
    Map(Record),
    List(Vec<Value>),
}

impl Value {
    /// Plain scalars are the only values a table cell can hold.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_)
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view. Quantities yield their magnitude in their own unit.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Quantity(q) => Some(q.magnitude),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Record> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Quantity(_) => "quantity",
            Value::Ref(_) => "reference",
            Value::Map(_) => "map",
            Value::List(_) => "list",
        }
    }

    /// Text for a table cell, or `None` when the value is not a scalar.
    /// Null renders as an empty string; callers substitute placeholders.
    pub fn to_cell(&self) -> Option<String> {
        match self {
            Value::Null => Some(String::new()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(format_float(*f)),
            Value::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

/// Integral floats keep a trailing `.0` so numeric columns stay float-typed.
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Walk nested maps along `path`.
pub fn get_path<'a>(record: &'a Record, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let value = record.get(*first)?;
    if rest.is_empty() {
        Some(value)
    } else {
        get_path(value.as_map()?, rest)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<Quantity> for Value {
    fn from(v: Quantity) -> Self {
        Value::Quantity(v)
    }
}

impl From<ComponentRef> for Value {
    fn from(v: ComponentRef) -> Self {
        Value::Ref(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Map(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

/// Builder that skips absent optional fields, the way a component dump
/// excludes `None`.
#[derive(Debug, Default)]
pub struct RecordBuilder {
    record: Record,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.record.insert(key.to_string(), value.into());
        self
    }

    pub fn opt<T: Into<Value>>(mut self, key: &str, value: Option<T>) -> Self {
        if let Some(value) = value {
            self.record.insert(key.to_string(), value.into());
        }
        self
    }

    pub fn build(self) -> Record {
        self.record
    }
}
