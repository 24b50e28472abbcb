//! Unit-tagged magnitudes for physical component fields.
//!
//! Component fields such as ratings, voltages and energy capacities carry
//! their unit alongside the number. The exporter strips the unit before
//! writing a table, optionally converting to a target unit first.
//!
//! # Design Philosophy
//!
//! Every [`Unit`] belongs to exactly one [`Dimension`] and knows its scale
//! relative to the dimension's canonical unit. Conversions are only defined
//! inside a dimension, so turning megawatts into kilovolts is an error rather
//! than a silently wrong number.
//!
//! # Usage
//!
//! ```
//! use tabgrid_core::units::{Quantity, Unit};
//!
//! let rating = Quantity::new(250.0, Unit::Megawatt);
//! let in_kw = rating.to(Unit::Kilowatt).unwrap();
//! assert_eq!(in_kw.magnitude, 250_000.0);
//!
//! // Different dimensions do not convert
//! assert!(rating.to(Unit::Kilovolt).is_err());
//!
//! // Units parse from their symbols
//! let unit: Unit = "MWh".parse().unwrap();
//! assert_eq!(unit, Unit::MegawattHour);
//! ```

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Physical dimension of a unit. Conversions never cross dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    ActivePower,
    ReactivePower,
    ApparentPower,
    Energy,
    Voltage,
    Current,
    Angle,
    Time,
    Dimensionless,
    EnergyPrice,
    FuelPrice,
    HeatRate,
}

macro_rules! define_units {
    ($( $variant:ident => ($symbol:literal, $dimension:ident, $scale:expr) ),+ $(,)?) => {
        /// Supported units, each tied to a [`Dimension`] and a scale relative
        /// to that dimension's canonical unit.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum Unit {
            $( $variant, )+
        }

        impl Unit {
            /// All supported units.
            pub const ALL: &'static [Unit] = &[$( Unit::$variant, )+];

            /// Symbol used in configuration files and serialized quantities.
            pub fn symbol(self) -> &'static str {
                match self {
                    $( Unit::$variant => $symbol, )+
                }
            }

            /// Dimension this unit measures.
            pub fn dimension(self) -> Dimension {
                match self {
                    $( Unit::$variant => Dimension::$dimension, )+
                }
            }

            /// Multiplier taking a magnitude in this unit to the canonical unit.
            fn scale(self) -> f64 {
                match self {
                    $( Unit::$variant => $scale, )+
                }
            }
        }

        impl FromStr for Unit {
            type Err = CoreError;

            fn from_str(s: &str) -> CoreResult<Self> {
                match s.trim() {
                    $( $symbol => Ok(Unit::$variant), )+
                    other => Err(CoreError::UnknownUnit(other.to_string())),
                }
            }
        }
    };
}

define_units! {
    Watt => ("W", ActivePower, 1e-6),
    Kilowatt => ("kW", ActivePower, 1e-3),
    Megawatt => ("MW", ActivePower, 1.0),
    Gigawatt => ("GW", ActivePower, 1e3),
    Var => ("var", ReactivePower, 1e-6),
    Kilovar => ("kvar", ReactivePower, 1e-3),
    Megavar => ("Mvar", ReactivePower, 1.0),
    VoltAmpere => ("VA", ApparentPower, 1e-6),
    KilovoltAmpere => ("kVA", ApparentPower, 1e-3),
    MegavoltAmpere => ("MVA", ApparentPower, 1.0),
    WattHour => ("Wh", Energy, 1e-6),
    KilowattHour => ("kWh", Energy, 1e-3),
    MegawattHour => ("MWh", Energy, 1.0),
    GigawattHour => ("GWh", Energy, 1e3),
    Volt => ("V", Voltage, 1e-3),
    Kilovolt => ("kV", Voltage, 1.0),
    Ampere => ("A", Current, 1e-3),
    Kiloampere => ("kA", Current, 1.0),
    Radian => ("rad", Angle, 1.0),
    Degree => ("deg", Angle, std::f64::consts::PI / 180.0),
    Second => ("s", Time, 1.0 / 3600.0),
    Minute => ("min", Time, 1.0 / 60.0),
    Hour => ("h", Time, 1.0),
    PerUnit => ("pu", Dimensionless, 1.0),
    Percent => ("%", Dimensionless, 0.01),
    UsdPerMegawattHour => ("$/MWh", EnergyPrice, 1.0),
    UsdPerKilowattHour => ("$/kWh", EnergyPrice, 1e3),
    UsdPerMmbtu => ("$/MMBtu", FuelPrice, 1.0),
    MmbtuPerMegawattHour => ("MMBtu/MWh", HeatRate, 1.0),
    BtuPerKilowattHour => ("Btu/kWh", HeatRate, 1e-3),
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl TryFrom<String> for Unit {
    type Error = CoreError;

    fn try_from(value: String) -> CoreResult<Self> {
        value.parse()
    }
}

impl From<Unit> for String {
    fn from(unit: Unit) -> Self {
        unit.symbol().to_string()
    }
}

/// A magnitude tagged with its unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    #[serde(rename = "value")]
    pub magnitude: f64,
    pub unit: Unit,
}

impl Quantity {
    #[inline]
    pub const fn new(magnitude: f64, unit: Unit) -> Self {
        Self { magnitude, unit }
    }

    /// Convert to `target`, failing when the dimensions differ.
    pub fn to(self, target: Unit) -> CoreResult<Quantity> {
        if self.unit == target {
            return Ok(self);
        }
        if self.unit.dimension() != target.dimension() {
            return Err(CoreError::UnitConversion {
                from: self.unit.symbol().to_string(),
                to: target.symbol().to_string(),
            });
        }
        let magnitude = self.magnitude * self.unit.scale() / target.scale();
        Ok(Quantity::new(magnitude, target))
    }

    /// Convert to the unit named by `symbol`.
    pub fn to_symbol(self, symbol: &str) -> CoreResult<Quantity> {
        self.to(symbol.parse()?)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4} {}", self.magnitude, self.unit)
    }
}
