//! Component store.
//!
//! [`System`] owns every component of a grid model plus the time series
//! attached to them. Exporters only ever borrow it immutably; mutation
//! happens while the model is being assembled or loaded.
//!
//! ```
//! use tabgrid_core::{Area, Category, Component, System};
//!
//! let mut system = System::new("demo");
//! system
//!     .add_component(Component::Area(Area { name: "north".into(), peak_active_power: None }))
//!     .unwrap();
//! assert_eq!(system.get_components(Category::Area, None).count(), 1);
//! assert!(system.get_component_by_label("Area.north").is_some());
//! ```

use crate::error::{CoreError, CoreResult};
use crate::model::{Category, Component, ComponentKind};
use crate::record::{ComponentRef, Value};
use crate::time_series::{SingleTimeSeries, TimeSeriesMetadata};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

/// Resolution of component references to attribute values.
///
/// The unnesting stage only needs this much of the store, which keeps it
/// testable against small fixtures.
pub trait ResolveReference {
    /// Attribute `attribute` of the component behind `reference`.
    ///
    /// `Ok(None)` means the component exists but does not carry the
    /// attribute; an unknown label is an error.
    fn resolve_attribute(&self, reference: &ComponentRef, attribute: &str)
        -> CoreResult<Option<Value>>;
}

/// Predicate used to narrow a component query.
pub type ComponentFilter<'f> = &'f dyn Fn(&Component) -> bool;

#[derive(Debug, Default)]
pub struct System {
    pub name: String,
    components: Vec<Component>,
    index: HashMap<String, usize>,
    time_series: HashMap<String, Vec<SingleTimeSeries>>,
}

/// On-disk layout of a system file.
#[derive(Debug, Deserialize)]
struct SystemFile {
    #[serde(default)]
    name: String,
    #[serde(default)]
    components: Vec<Component>,
    #[serde(default)]
    time_series: Vec<TimeSeriesEntry>,
}

#[derive(Debug, Deserialize)]
struct TimeSeriesEntry {
    owner: ComponentRef,
    #[serde(flatten)]
    series: SingleTimeSeries,
}

impl System {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)?;
        Self::from_json_str(&data)
            .map_err(|err| CoreError::Parse(format!("{}: {err}", path.display())))
    }

    pub fn from_json_str(data: &str) -> CoreResult<Self> {
        let file: SystemFile = serde_json::from_str(data)?;
        let mut system = System::new(file.name);
        for component in file.components {
            system.add_component(component)?;
        }
        for entry in file.time_series {
            system.add_time_series(&entry.owner, entry.series)?;
        }
        Ok(system)
    }

    /// Register a component. Labels must be unique.
    pub fn add_component(&mut self, component: Component) -> CoreResult<()> {
        let label = component.label();
        if self.index.contains_key(&label) {
            return Err(CoreError::DuplicateComponent(label));
        }
        self.index.insert(label, self.components.len());
        self.components.push(component);
        Ok(())
    }

    /// Attach a time series to an already registered component.
    pub fn add_time_series(
        &mut self,
        owner: &ComponentRef,
        series: SingleTimeSeries,
    ) -> CoreResult<()> {
        if !self.index.contains_key(owner.label()) {
            return Err(CoreError::UnresolvedReference(owner.label().to_string()));
        }
        if series.resolution <= 0 {
            return Err(CoreError::Validation(format!(
                "time series '{}' of {} has non-positive resolution {}",
                series.variable_name, owner, series.resolution
            )));
        }
        let entries = self.time_series.entry(owner.label().to_string()).or_default();
        if entries.iter().any(|s| s.variable_name == series.variable_name) {
            return Err(CoreError::Validation(format!(
                "time series '{}' already attached to {}",
                series.variable_name, owner
            )));
        }
        entries.push(series);
        Ok(())
    }

    /// Components of `category` in insertion order, optionally filtered.
    pub fn get_components<'a, 'f>(
        &'a self,
        category: Category,
        filter: Option<ComponentFilter<'f>>,
    ) -> impl Iterator<Item = &'a Component> + 'f
    where
        'a: 'f,
    {
        self.components
            .iter()
            .filter(move |c| c.is_a(category))
            .filter(move |c| filter.map_or(true, |f| f(*c)))
    }

    pub fn get_component_by_label(&self, label: &str) -> Option<&Component> {
        self.index.get(label).map(|&i| &self.components[i])
    }

    pub fn get_component(&self, reference: &ComponentRef) -> CoreResult<&Component> {
        self.get_component_by_label(reference.label())
            .ok_or_else(|| CoreError::UnresolvedReference(reference.label().to_string()))
    }

    pub fn has_time_series(&self, component: &Component) -> bool {
        self.time_series
            .get(&component.label())
            .is_some_and(|series| !series.is_empty())
    }

    /// Metadata of every series attached to `component`, in attachment order.
    pub fn list_time_series_metadata(&self, component: &Component) -> Vec<TimeSeriesMetadata> {
        self.time_series
            .get(&component.label())
            .map(|series| series.iter().map(SingleTimeSeries::metadata).collect())
            .unwrap_or_default()
    }

    pub fn get_time_series(
        &self,
        component: &Component,
        variable_name: &str,
    ) -> Option<&SingleTimeSeries> {
        self.time_series
            .get(&component.label())
            .and_then(|series| series.iter().find(|s| s.variable_name == variable_name))
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Count of components per concrete kind.
    pub fn stats(&self) -> SystemStats {
        let mut stats = SystemStats::default();
        for component in &self.components {
            *stats.per_kind.entry(component.kind()).or_default() += 1;
        }
        stats.num_time_series = self.time_series.values().map(Vec::len).sum();
        stats
    }
}

impl ResolveReference for System {
    fn resolve_attribute(
        &self,
        reference: &ComponentRef,
        attribute: &str,
    ) -> CoreResult<Option<Value>> {
        let component = self.get_component(reference)?;
        Ok(component.to_record().remove(attribute))
    }
}

/// Statistics about a system's contents
#[derive(Debug, Clone, Default)]
pub struct SystemStats {
    pub per_kind: BTreeMap<ComponentKind, usize>,
    pub num_time_series: usize,
}

impl SystemStats {
    pub fn total(&self) -> usize {
        self.per_kind.values().sum()
    }
}

impl std::fmt::Display for SystemStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} components", self.total())?;
        for (kind, count) in &self.per_kind {
            write!(f, ", {count} {kind}")?;
        }
        write!(f, ", {} time series", self.num_time_series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Area, Bus, PowerLoad};
    use chrono::NaiveDate;

    fn bus(name: &str, number: i64) -> Component {
        Component::ACBus(Bus {
            name: name.into(),
            number,
            base_voltage: None,
            bus_type: None,
            magnitude: None,
            angle: None,
            area: Some(ComponentRef::new("Area", "north")),
            load_zone: None,
        })
    }

    fn sample() -> System {
        let mut system = System::new("test");
        system
            .add_component(Component::Area(Area {
                name: "north".into(),
                peak_active_power: None,
            }))
            .unwrap();
        system.add_component(bus("bus_1", 1)).unwrap();
        system.add_component(bus("bus_2", 2)).unwrap();
        system
            .add_component(Component::PowerLoad(PowerLoad {
                name: "load_1".into(),
                bus: ComponentRef::new("ACBus", "bus_2"),
                available: true,
                active_power: None,
                reactive_power: None,
                max_active_power: None,
                max_reactive_power: None,
                base_power: None,
            }))
            .unwrap();
        system
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let mut system = sample();
        let err = system.add_component(bus("bus_1", 9)).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateComponent(l) if l == "ACBus.bus_1"));
    }

    #[test]
    fn test_get_components_in_insertion_order() {
        let system = sample();
        let names: Vec<&str> = system
            .get_components(Category::Bus, None)
            .map(Component::name)
            .collect();
        assert_eq!(names, vec!["bus_1", "bus_2"]);

        let only_two = |c: &Component| c.name() == "bus_2";
        assert_eq!(system.get_components(Category::Bus, Some(&only_two)).count(), 1);
    }

    #[test]
    fn test_resolve_attribute() {
        let system = sample();
        let number = system
            .resolve_attribute(&ComponentRef::new("ACBus", "bus_2"), "number")
            .unwrap();
        assert_eq!(number, Some(Value::Int(2)));

        let missing = system
            .resolve_attribute(&ComponentRef::new("ACBus", "bus_2"), "nonexistent")
            .unwrap();
        assert!(missing.is_none());

        let err = system
            .resolve_attribute(&ComponentRef::new("ACBus", "ghost"), "number")
            .unwrap_err();
        assert!(matches!(err, CoreError::UnresolvedReference(_)));
    }

    #[test]
    fn test_time_series_attachment() {
        let mut system = sample();
        let start = NaiveDate::from_ymd_opt(2030, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        let owner = ComponentRef::new("PowerLoad", "load_1");
        system
            .add_time_series(
                &owner,
                SingleTimeSeries::new("max_active_power", start, 3600, vec![1.0; 24]),
            )
            .unwrap();

        let load = system.get_component(&owner).unwrap();
        assert!(system.has_time_series(load));
        let meta = system.list_time_series_metadata(load);
        assert_eq!(meta.len(), 1);
        assert_eq!(meta[0].length, 24);

        let dup = system.add_time_series(
            &owner,
            SingleTimeSeries::new("max_active_power", start, 3600, vec![]),
        );
        assert!(dup.is_err());

        for resolution in [0, -3600] {
            let stalled = system.add_time_series(
                &owner,
                SingleTimeSeries::new("reactive_power", start, resolution, vec![1.0, 2.0]),
            );
            assert!(matches!(stalled, Err(CoreError::Validation(_))));
        }
        let load = system.get_component(&owner).unwrap();
        assert_eq!(system.list_time_series_metadata(load).len(), 1);

        let orphan = system.add_time_series(
            &ComponentRef::new("PowerLoad", "nobody"),
            SingleTimeSeries::new("max_active_power", start, 3600, vec![]),
        );
        assert!(matches!(orphan, Err(CoreError::UnresolvedReference(_))));
    }

    #[test]
    fn test_from_json_str() {
        let json = r#"{
            "name": "tiny",
            "components": [
                {"class_type": "Area", "name": "north"},
                {"class_type": "ACBus", "name": "b1", "number": 1, "area": "Area.north"}
            ],
            "time_series": [
                {"owner": "ACBus.b1", "variable_name": "voltage",
                 "initial_time": "2030-01-01T00:00:00", "resolution": 3600, "data": [1.0]}
            ]
        }"#;
        let system = System::from_json_str(json).unwrap();
        assert_eq!(system.name, "tiny");
        assert_eq!(system.len(), 2);
        let stats = system.stats();
        assert_eq!(stats.num_time_series, 1);
        assert_eq!(stats.to_string(), "2 components, 1 ACBus, 1 Area, 1 time series");
    }

    #[test]
    fn test_from_json_str_rejects_zero_resolution() {
        let json = r#"{
            "components": [{"class_type": "Area", "name": "north"}],
            "time_series": [
                {"owner": "Area.north", "variable_name": "peak",
                 "initial_time": "2030-01-01T00:00:00", "resolution": 0, "data": [1.0, 2.0]}
            ]
        }"#;
        let err = System::from_json_str(json).unwrap_err();
        assert!(matches!(&err, CoreError::Validation(msg) if msg.contains("non-positive")));
    }

    #[test]
    fn test_from_json_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("system.json");
        fs::write(&good, r#"{"components": [{"class_type": "Area", "name": "a"}]}"#).unwrap();
        assert_eq!(System::from_json_file(&good).unwrap().len(), 1);

        let bad = dir.path().join("broken.json");
        fs::write(&bad, r#"{"components": [{"class_type": "Nope"}]}"#).unwrap();
        let err = System::from_json_file(&bad).unwrap_err();
        assert!(matches!(&err, CoreError::Parse(msg) if msg.contains("broken.json")));

        let dup = dir.path().join("dup.json");
        fs::write(
            &dup,
            r#"{"components": [{"class_type": "Area", "name": "a"}, {"class_type": "Area", "name": "a"}]}"#,
        )
        .unwrap();
        assert!(System::from_json_file(&dup).is_err());
    }
}
