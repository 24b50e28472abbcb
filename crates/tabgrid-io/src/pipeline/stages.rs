//! Stage functions. All of them are pure.

use super::{PropertyMap, UnitMap};
use crate::error::ExportResult;
use tabgrid_core::{Record, ResolveReference, Value};

/// Rename keys per `map`. Unmapped keys pass through unchanged.
///
/// When two source keys land on the same target, the one that comes later
/// in record order wins.
pub fn apply_property_map(record: &Record, map: &PropertyMap) -> Record {
    let mut renamed = Record::new();
    for (key, value) in record {
        let target = map.get(key).unwrap_or(key);
        renamed.insert(target.clone(), value.clone());
    }
    renamed
}

/// Replace every top-level quantity with its bare magnitude.
///
/// Fields listed in `unit_map` are converted to that unit first; all others
/// keep the magnitude in the unit they carry.
pub fn apply_unit_deconstruction(record: &Record, unit_map: &UnitMap) -> ExportResult<Record> {
    let mut stripped = Record::new();
    for (key, value) in record {
        let value = match value {
            Value::Quantity(quantity) => {
                let magnitude = match unit_map.get(key) {
                    Some(symbol) => quantity.to_symbol(symbol)?.magnitude,
                    None => quantity.magnitude,
                };
                Value::Float(magnitude)
            }
            other => other.clone(),
        };
        stripped.insert(key.clone(), value);
    }
    Ok(stripped)
}

/// Lift the fields of each nested map in `keys` into the parent as
/// `<outer>_<inner>`, dropping the outer key.
pub fn apply_flatten_key(record: &Record, keys: &[&str]) -> Record {
    let mut flat = record.clone();
    for outer in keys {
        if !matches!(flat.get(*outer), Some(Value::Map(_))) {
            continue;
        }
        if let Some(Value::Map(inner)) = flat.remove(*outer) {
            for (inner_key, value) in inner {
                flat.insert(format!("{outer}_{inner_key}"), value);
            }
        }
    }
    flat
}

/// Replace each `field` holding a component reference with `attribute` of
/// the referenced component.
///
/// Embedded maps are read directly. A referenced component that lacks the
/// attribute leaves the field absent so the table placeholder applies; a
/// reference the store cannot resolve is an error.
pub fn apply_unnest_key<R>(
    record: &Record,
    key_map: &[(&str, &str)],
    resolver: &R,
) -> ExportResult<Record>
where
    R: ResolveReference + ?Sized,
{
    let mut unnested = record.clone();
    for (field, attribute) in key_map {
        let resolved = match record.get(*field) {
            Some(Value::Ref(reference)) => resolver.resolve_attribute(reference, attribute)?,
            Some(Value::Map(inner)) => inner.get(*attribute).cloned(),
            _ => continue,
        };
        match resolved {
            Some(value) => unnested.insert((*field).to_string(), value),
            None => unnested.remove(*field),
        };
    }
    Ok(unnested)
}

/// Fill fields from `defaults` that are absent or null.
pub fn apply_default_value(record: &Record, defaults: &Record) -> Record {
    let mut filled = record.clone();
    for (key, default) in defaults {
        let slot = filled.entry(key.clone()).or_default();
        if slot.is_null() {
            *slot = default.clone();
        }
    }
    filled
}

/// Set `key` to a value computed from the whole record.
pub fn apply_derived_field(record: &Record, key: &str, derive: impl Fn(&Record) -> Value) -> Record {
    let mut derived = record.clone();
    derived.insert(key.to_string(), derive(record));
    derived
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportError;
    use tabgrid_core::{ComponentRef, CoreError, CoreResult, Quantity, RecordBuilder, Unit};

    struct Buses;

    impl ResolveReference for Buses {
        fn resolve_attribute(
            &self,
            reference: &ComponentRef,
            attribute: &str,
        ) -> CoreResult<Option<Value>> {
            match (reference.label(), attribute) {
                ("ACBus.bus_1", "number") => Ok(Some(Value::Int(101))),
                ("ACBus.bus_1", _) => Ok(None),
                (label, _) => Err(CoreError::UnresolvedReference(label.to_string())),
            }
        }
    }

    fn map(pairs: &[(&str, &str)]) -> PropertyMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_property_map_renames_and_passes_through() {
        let record = RecordBuilder::new()
            .field("name", "gen_1")
            .field("prime_mover_type", "CT")
            .build();
        let out = apply_property_map(&record, &map(&[("prime_mover_type", "unit_type")]));
        assert_eq!(out.get("unit_type"), Some(&Value::from("CT")));
        assert_eq!(out.get("name"), Some(&Value::from("gen_1")));
        assert!(!out.contains_key("prime_mover_type"));
    }

    #[test]
    fn test_property_map_is_idempotent() {
        let renames = map(&[
            ("number", "bus_id"),
            ("load_zone", "zone"),
            ("base_power", "base_mva"),
        ]);
        let record = RecordBuilder::new()
            .field("name", "bus_1")
            .field("number", 1)
            .field("load_zone", "z1")
            .field("base_power", 100.0)
            .build();
        let once = apply_property_map(&record, &renames);
        let twice = apply_property_map(&once, &renames);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_property_map_collision_later_key_wins() {
        // "bus" sorts before "bus_id", so the existing bus_id value survives
        let record = RecordBuilder::new()
            .field("bus", "from_ref")
            .field("bus_id", "existing")
            .build();
        let out = apply_property_map(&record, &map(&[("bus", "bus_id")]));
        assert_eq!(out.len(), 1);
        assert_eq!(out.get("bus_id"), Some(&Value::from("existing")));
    }

    #[test]
    fn test_unit_deconstruction_converts_mapped_fields() {
        let record = RecordBuilder::new()
            .field("active_power", Quantity::new(1.5, Unit::Gigawatt))
            .field("rating", Quantity::new(250.0, Unit::MegavoltAmpere))
            .field("name", "gen_1")
            .build();
        let units = map(&[("active_power", "MW")]);
        let out = apply_unit_deconstruction(&record, &units).unwrap();
        assert_eq!(out.get("active_power"), Some(&Value::Float(1500.0)));
        assert_eq!(out.get("rating"), Some(&Value::Float(250.0)));
        assert_eq!(out.get("name"), Some(&Value::from("gen_1")));
    }

    #[test]
    fn test_unit_deconstruction_reproduces_magnitude() {
        for (magnitude, unit, target) in [
            (42.125, Unit::Megawatt, "kW"),
            (0.75, Unit::Kilovolt, "V"),
            (12.0, Unit::MegawattHour, "GWh"),
        ] {
            let record = RecordBuilder::new()
                .field("value", Quantity::new(magnitude, unit))
                .build();
            let out = apply_unit_deconstruction(&record, &map(&[("value", target)])).unwrap();
            let stripped = out.get("value").and_then(Value::as_f64).unwrap();
            let target_unit: Unit = target.parse().unwrap();
            let back = Quantity::new(stripped, target_unit).to(unit).unwrap();
            assert!((back.magnitude - magnitude).abs() < 1e-9);
        }
    }

    #[test]
    fn test_unit_deconstruction_rejects_bad_targets() {
        let record = RecordBuilder::new()
            .field("active_power", Quantity::new(10.0, Unit::Megawatt))
            .build();
        let err = apply_unit_deconstruction(&record, &map(&[("active_power", "kV")])).unwrap_err();
        assert!(matches!(err, ExportError::Core(CoreError::UnitConversion { .. })));
        let err =
            apply_unit_deconstruction(&record, &map(&[("active_power", "furlong")])).unwrap_err();
        assert!(matches!(err, ExportError::Core(CoreError::UnknownUnit(_))));
    }

    #[test]
    fn test_flatten_key() {
        let limits = RecordBuilder::new().field("min", 0.0).field("max", 90.0).build();
        let record = RecordBuilder::new()
            .field("active_power_limits", limits)
            .field("fuel", "NG")
            .build();
        let out = apply_flatten_key(&record, &["active_power_limits", "fuel", "missing"]);
        assert_eq!(out.get("active_power_limits_min"), Some(&Value::Float(0.0)));
        assert_eq!(out.get("active_power_limits_max"), Some(&Value::Float(90.0)));
        assert!(!out.contains_key("active_power_limits"));
        assert_eq!(out.get("fuel"), Some(&Value::from("NG")));
    }

    #[test]
    fn test_unnest_key_resolves_references() {
        let record = RecordBuilder::new()
            .field("bus_id", ComponentRef::new("ACBus", "bus_1"))
            .field("area", RecordBuilder::new().field("name", "north").build())
            .field("zone", ComponentRef::new("ACBus", "bus_1"))
            .build();
        let out = apply_unnest_key(
            &record,
            &[("bus_id", "number"), ("area", "name"), ("zone", "name"), ("absent", "x")],
            &Buses,
        )
        .unwrap();
        assert_eq!(out.get("bus_id"), Some(&Value::Int(101)));
        assert_eq!(out.get("area"), Some(&Value::from("north")));
        assert!(!out.contains_key("zone"));
        assert!(!out.contains_key("absent"));
    }

    #[test]
    fn test_unnest_key_unknown_reference_fails() {
        let record = RecordBuilder::new()
            .field("bus_id", ComponentRef::new("ACBus", "ghost"))
            .build();
        let err = apply_unnest_key(&record, &[("bus_id", "number")], &Buses).unwrap_err();
        assert!(matches!(
            err,
            ExportError::Core(CoreError::UnresolvedReference(label)) if label == "ACBus.ghost"
        ));
    }

    #[test]
    fn test_default_value_never_overwrites() {
        let record = RecordBuilder::new()
            .field("fuel_price", 3.0)
            .field("power_factor", Value::Null)
            .build();
        let defaults = RecordBuilder::new()
            .field("fuel_price", 0.0)
            .field("power_factor", 1.0)
            .field("startup_cost", 0.0)
            .build();
        let out = apply_default_value(&record, &defaults);
        assert_eq!(out.get("fuel_price"), Some(&Value::Float(3.0)));
        assert_eq!(out.get("power_factor"), Some(&Value::Float(1.0)));
        assert_eq!(out.get("startup_cost"), Some(&Value::Float(0.0)));
    }

    #[test]
    fn test_derived_field() {
        let record = RecordBuilder::new().field("branch_type", "Transformer2W").build();
        let out = apply_derived_field(&record, "is_transformer", |r| {
            Value::Bool(r.get("branch_type").and_then(Value::as_str) == Some("Transformer2W"))
        });
        assert_eq!(out.get("is_transformer"), Some(&Value::Bool(true)));
    }
}
