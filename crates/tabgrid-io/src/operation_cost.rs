//! Translation of nested operation-cost data into flat generator columns.
//!
//! Generator records carry an `operation_cost` map extracted from the typed
//! cost model:
//!
//! ```text
//! operation_cost
//! ├── variable_type        "CostCurve" | "FuelCurve"
//! └── variable
//!     ├── vom_cost.function_data.proportional_term
//!     ├── fuel_cost
//!     └── value_curve.function_data
//!         ├── constant_term / proportional_term / quadratic_term
//!         └── points        [[x, y], ...]
//! ```
//!
//! [`apply_operation_table_data`] writes the matching `variable_cost`,
//! `fuel_price`, `heat_rate_*`, `output_point_*` and `cost_point_*` columns.

use crate::error::{ExportError, ExportResult};
use std::str::FromStr;
use tabgrid_core::{get_path, Record, Value};

/// Multiplier applied to fuel cost; the table reader divides prices by 1000.
pub const FUEL_PRICE_SCALE: f64 = 1000.0;

/// Discriminator of a piecewise variable-cost curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableCurveKind {
    /// y values are costs
    CostCurve,
    /// y values are heat rates. The first point is an average, later ones incremental.
    FuelCurve,
}

impl FromStr for VariableCurveKind {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CostCurve" => Ok(VariableCurveKind::CostCurve),
            "FuelCurve" => Ok(VariableCurveKind::FuelCurve),
            other => Err(ExportError::UnsupportedVariant(format!(
                "Type {other} variable curve not supported"
            ))),
        }
    }
}

fn number(value: &Value, field: &str) -> ExportResult<f64> {
    value.as_f64().ok_or_else(|| {
        ExportError::DataIntegrity(format!(
            "{field} must be numeric, found {}",
            value.type_name()
        ))
    })
}

/// Read one breakpoint given as `[x, y]` or `{x, y}`.
fn point(value: &Value, index: usize) -> ExportResult<(f64, f64)> {
    let malformed = || ExportError::DataIntegrity(format!("malformed curve point {index}"));
    match value {
        Value::List(pair) => match pair.as_slice() {
            [x, y] => Ok((
                x.as_f64().ok_or_else(malformed)?,
                y.as_f64().ok_or_else(malformed)?,
            )),
            _ => Err(malformed()),
        },
        Value::Map(coords) => {
            let x = coords.get("x").and_then(Value::as_f64).ok_or_else(malformed)?;
            let y = coords.get("y").and_then(Value::as_f64).ok_or_else(malformed)?;
            Ok((x, y))
        }
        _ => Err(malformed()),
    }
}

/// Flatten the operation cost of a generator record into table columns.
///
/// Records without an `operation_cost`, or whose cost has no `variable`
/// part, are returned unchanged.
pub fn apply_operation_table_data(record: &Record) -> ExportResult<Record> {
    let Some(operation_cost) = record.get("operation_cost").and_then(Value::as_map) else {
        return Ok(record.clone());
    };
    let Some(variable) = operation_cost.get("variable").and_then(Value::as_map) else {
        return Ok(record.clone());
    };
    if variable.is_empty() {
        return Ok(record.clone());
    }

    let mut out = record.clone();

    if let Some(term) = get_path(variable, &["vom_cost", "function_data", "proportional_term"]) {
        out.insert("variable_cost".into(), Value::Float(number(term, "vom_cost")?));
    }

    if let Some(fuel_cost) = variable.get("fuel_cost") {
        if fuel_cost.is_null() {
            return Err(ExportError::DataIntegrity(format!(
                "fuel_cost is null for {}",
                record.get("name").and_then(Value::as_str).unwrap_or("<unnamed>")
            )));
        }
        let price = number(fuel_cost, "fuel_cost")? * FUEL_PRICE_SCALE;
        out.insert("fuel_price".into(), Value::Float(price));
    }

    let Some(function_data) =
        get_path(variable, &["value_curve", "function_data"]).and_then(Value::as_map)
    else {
        return Ok(out);
    };

    for (term, column) in [
        ("constant_term", "heat_rate_a0"),
        ("proportional_term", "heat_rate_a1"),
        ("quadratic_term", "heat_rate_a2"),
    ] {
        if let Some(value) = function_data.get(term) {
            out.insert(column.into(), Value::Float(number(value, term)?));
        }
    }

    if let Some(points) = function_data.get("points") {
        let kind: VariableCurveKind = operation_cost
            .get("variable_type")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ExportError::UnsupportedVariant("variable curve without variable_type".into())
            })?
            .parse()?;
        let points = points
            .as_list()
            .ok_or_else(|| ExportError::DataIntegrity("curve points must be a list".into()))?;
        write_curve_points(&mut out, kind, points)?;
    }

    Ok(out)
}

fn write_curve_points(
    out: &mut Record,
    kind: VariableCurveKind,
    points: &[Value],
) -> ExportResult<()> {
    for (i, raw) in points.iter().enumerate() {
        let (x, y) = point(raw, i)?;
        out.insert(format!("output_point_{i}"), Value::Float(x));
        let y_column = match kind {
            VariableCurveKind::CostCurve => format!("cost_point_{i}"),
            VariableCurveKind::FuelCurve if i == 0 => "heat_rate_avg_0".to_string(),
            VariableCurveKind::FuelCurve => format!("heat_rate_incr_{i}"),
        };
        out.insert(y_column, Value::Float(y));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabgrid_core::{
        Component, ComponentRef, FunctionData, Generator, OperationCost, ProductionVariableCost,
        Quantity, RecordBuilder, Unit, ValueCurve, XyCoords,
    };

    fn curve_points() -> Value {
        Value::List(vec![
            Value::List(vec![Value::Int(0), Value::Int(0)]),
            Value::List(vec![Value::Int(50), Value::Int(1000)]),
            Value::List(vec![Value::Int(100), Value::Int(2500)]),
        ])
    }

    fn with_cost(variable_type: &str, variable: Record) -> Record {
        let cost = RecordBuilder::new()
            .field("variable", variable)
            .field("variable_type", variable_type)
            .build();
        RecordBuilder::new()
            .field("name", "gen_1")
            .field("operation_cost", cost)
            .build()
    }

    fn piecewise(variable_type: &str) -> Record {
        let function_data = RecordBuilder::new().field("points", curve_points()).build();
        let variable = RecordBuilder::new()
            .field(
                "value_curve",
                RecordBuilder::new().field("function_data", function_data).build(),
            )
            .build();
        with_cost(variable_type, variable)
    }

    fn float(record: &Record, key: &str) -> f64 {
        record.get(key).and_then(Value::as_f64).unwrap()
    }

    #[test]
    fn test_cost_curve_points() {
        let out = apply_operation_table_data(&piecewise("CostCurve")).unwrap();
        for (i, (x, y)) in [(0.0, 0.0), (50.0, 1000.0), (100.0, 2500.0)].iter().enumerate() {
            assert_eq!(float(&out, &format!("output_point_{i}")), *x);
            assert_eq!(float(&out, &format!("cost_point_{i}")), *y);
        }
        assert!(!out.contains_key("heat_rate_avg_0"));
    }

    #[test]
    fn test_fuel_curve_points() {
        let out = apply_operation_table_data(&piecewise("FuelCurve")).unwrap();
        assert_eq!(float(&out, "output_point_0"), 0.0);
        assert_eq!(float(&out, "heat_rate_avg_0"), 0.0);
        assert_eq!(float(&out, "output_point_1"), 50.0);
        assert_eq!(float(&out, "heat_rate_incr_1"), 1000.0);
        assert_eq!(float(&out, "output_point_2"), 100.0);
        assert_eq!(float(&out, "heat_rate_incr_2"), 2500.0);
        assert!(!out.contains_key("cost_point_0"));
        assert!(!out.contains_key("heat_rate_incr_0"));
    }

    #[test]
    fn test_unknown_curve_kind_is_unsupported() {
        let err = apply_operation_table_data(&piecewise("AverageRateCurve")).unwrap_err();
        assert!(matches!(err, ExportError::UnsupportedVariant(_)));
    }

    #[test]
    fn test_fuel_price_scaled() {
        let variable = RecordBuilder::new()
            .field("fuel_cost", 0.05)
            .field(
                "vom_cost",
                RecordBuilder::new()
                    .field(
                        "function_data",
                        RecordBuilder::new().field("proportional_term", 10).build(),
                    )
                    .build(),
            )
            .build();
        let out = apply_operation_table_data(&with_cost("CostCurve", variable)).unwrap();
        assert_eq!(out.get("fuel_price"), Some(&Value::Float(50.0)));
        assert_eq!(out.get("variable_cost"), Some(&Value::Float(10.0)));
    }

    #[test]
    fn test_null_fuel_cost_is_rejected() {
        let variable = RecordBuilder::new().field("fuel_cost", Value::Null).build();
        let err = apply_operation_table_data(&with_cost("FuelCurve", variable)).unwrap_err();
        assert!(matches!(err, ExportError::DataIntegrity(msg) if msg.contains("gen_1")));
    }

    #[test]
    fn test_missing_cost_passes_through() {
        let record = RecordBuilder::new().field("name", "gen_1").build();
        assert_eq!(apply_operation_table_data(&record).unwrap(), record);

        let empty = RecordBuilder::new()
            .field("name", "gen_1")
            .field("operation_cost", Record::new())
            .build();
        assert_eq!(apply_operation_table_data(&empty).unwrap(), empty);
    }

    #[test]
    fn test_malformed_point_is_data_error() {
        let function_data = RecordBuilder::new()
            .field("points", Value::List(vec![Value::List(vec![Value::Int(1)])]))
            .build();
        let variable = RecordBuilder::new()
            .field(
                "value_curve",
                RecordBuilder::new().field("function_data", function_data).build(),
            )
            .build();
        let err = apply_operation_table_data(&with_cost("CostCurve", variable)).unwrap_err();
        assert!(matches!(err, ExportError::DataIntegrity(_)));
    }

    #[test]
    fn test_typed_quadratic_cost_to_heat_rates() {
        let component = Component::ThermalStandard(Generator {
            name: "ct_1".into(),
            bus: ComponentRef::new("ACBus", "bus_1"),
            available: true,
            active_power: Some(Quantity::new(50.0, Unit::Megawatt)),
            reactive_power: None,
            rating: None,
            active_power_limits: None,
            reactive_power_limits: None,
            min_up_time: None,
            min_down_time: None,
            prime_mover_type: Some("CT".into()),
            fuel: Some("NG".into()),
            base_power: None,
            power_factor: None,
            operation_cost: Some(OperationCost {
                variable: Some(ProductionVariableCost::FuelCurve {
                    value_curve: ValueCurve {
                        function_data: FunctionData::Quadratic {
                            quadratic_term: 0.5,
                            proportional_term: 20.0,
                            constant_term: 100.0,
                        },
                    },
                    vom_cost: None,
                    fuel_cost: Some(2.5),
                }),
                ..OperationCost::default()
            }),
        });
        let out = apply_operation_table_data(&component.to_record()).unwrap();
        assert_eq!(float(&out, "heat_rate_a0"), 100.0);
        assert_eq!(float(&out, "heat_rate_a1"), 20.0);
        assert_eq!(float(&out, "heat_rate_a2"), 0.5);
        assert_eq!(float(&out, "fuel_price"), 2500.0);
        assert!(!out.contains_key("variable_cost"));
    }

    #[test]
    fn test_typed_piecewise_points_accepted() {
        let component = Component::ThermalStandard(Generator {
            name: "st_1".into(),
            bus: ComponentRef::new("ACBus", "bus_1"),
            available: true,
            active_power: None,
            reactive_power: None,
            rating: None,
            active_power_limits: None,
            reactive_power_limits: None,
            min_up_time: None,
            min_down_time: None,
            prime_mover_type: None,
            fuel: None,
            base_power: None,
            power_factor: None,
            operation_cost: Some(OperationCost {
                variable: Some(ProductionVariableCost::CostCurve {
                    value_curve: ValueCurve {
                        function_data: FunctionData::PiecewiseLinear {
                            points: vec![
                                XyCoords { x: 10.0, y: 200.0 },
                                XyCoords { x: 40.0, y: 900.0 },
                            ],
                        },
                    },
                    vom_cost: None,
                }),
                ..OperationCost::default()
            }),
        });
        let out = apply_operation_table_data(&component.to_record()).unwrap();
        assert_eq!(float(&out, "output_point_1"), 40.0);
        assert_eq!(float(&out, "cost_point_1"), 900.0);
        assert!(!out.contains_key("fuel_price"));
    }
}
