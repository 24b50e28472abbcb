//! # tabgrid-core: Grid Component Model
//!
//! Typed grid components, unit-tagged quantities and the read-only store the
//! exporters in `tabgrid-io` work against.
//!
//! ## Design Philosophy
//!
//! Components are **typed structs** grouped in the [`Component`] enum and
//! tagged by `class_type` on disk. Exporters never read struct fields
//! directly; they extract [`Record`]s and push them through a pipeline of
//! record transformations. Records keep three kinds of non-scalar value:
//! - [`Value::Quantity`]: a magnitude with its [`Unit`]
//! - [`Value::Ref`]: a [`ComponentRef`] to another component in the store
//! - [`Value::Map`]: a nested record (limits, operation cost)
//!
//! ## Quick Start
//!
//! ```rust
//! use tabgrid_core::*;
//!
//! let mut system = System::new("example");
//! system.add_component(Component::ACBus(Bus {
//!     name: "bus_1".to_string(),
//!     number: 1,
//!     base_voltage: Some(Quantity::new(230.0, Unit::Kilovolt)),
//!     bus_type: Some(BusType::Ref),
//!     magnitude: None,
//!     angle: None,
//!     area: None,
//!     load_zone: None,
//! }))?;
//!
//! let bus = system.get_component_by_label("ACBus.bus_1").unwrap();
//! let record = bus.to_record();
//! assert_eq!(record.get("number"), Some(&Value::Int(1)));
//! # Ok::<(), CoreError>(())
//! ```
//!
//! ## Modules
//!
//! - [`model`] - Component structs, kinds and categories
//! - [`record`] - Flat records and values
//! - [`system`] - The component store
//! - [`time_series`] - Series attached to components
//! - [`units`] - Units and quantities

pub mod error;
pub mod model;
pub mod record;
pub mod system;
pub mod time_series;
pub mod units;

pub use error::{CoreError, CoreResult};
pub use model::{
    AcBranch, Area, Bus, BusType, Category, Component, ComponentKind, DcBranch, DeviceSet,
    FunctionData, Generator, LoadZone, MinMax, OperationCost, PowerLoad, ProductionVariableCost,
    Reserve, ReserveDirection, ReserveMap, Storage, ToRecord, ValueCurve, XyCoords,
};
pub use record::{format_float, get_path, ComponentRef, Record, RecordBuilder, Value};
pub use system::{ComponentFilter, ResolveReference, System, SystemStats};
pub use time_series::{SingleTimeSeries, TimeSeriesMetadata};
pub use units::{Dimension, Quantity, Unit};
