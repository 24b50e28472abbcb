//! Typed grid components and their record extraction.
//!
//! Components deserialize from a system file with a `class_type` tag and
//! extract to flat [`Record`]s through [`Component::to_record`]. Extraction
//! omits absent optional fields and always writes `name` and `class_type`.

use crate::record::{ComponentRef, Record, RecordBuilder, Value};
use crate::units::Quantity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

fn default_true() -> bool {
    true
}

/// Extraction of a component's fields into a flat record.
pub trait ToRecord {
    fn to_record(&self) -> Record;
}

// =============================================================================
// Topology
// =============================================================================

/// Bus classification used by the power-flow setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BusType {
    Pq,
    Pv,
    Ref,
    Slack,
    Isolated,
}

impl BusType {
    pub fn as_str(self) -> &'static str {
        match self {
            BusType::Pq => "PQ",
            BusType::Pv => "PV",
            BusType::Ref => "REF",
            BusType::Slack => "SLACK",
            BusType::Isolated => "ISOLATED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bus {
    pub name: String,
    /// Unique bus number used as the foreign key in every table
    pub number: i64,
    pub base_voltage: Option<Quantity>,
    pub bus_type: Option<BusType>,
    pub magnitude: Option<f64>,
    pub angle: Option<Quantity>,
    pub area: Option<ComponentRef>,
    pub load_zone: Option<ComponentRef>,
}

impl ToRecord for Bus {
    fn to_record(&self) -> Record {
        RecordBuilder::new()
            .field("name", self.name.as_str())
            .field("number", self.number)
            .opt("base_voltage", self.base_voltage)
            .opt("bus_type", self.bus_type.map(BusType::as_str))
            .opt("magnitude", self.magnitude)
            .opt("angle", self.angle)
            .opt("area", self.area.clone())
            .opt("load_zone", self.load_zone.clone())
            .build()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Area {
    pub name: String,
    pub peak_active_power: Option<Quantity>,
}

impl ToRecord for Area {
    fn to_record(&self) -> Record {
        RecordBuilder::new()
            .field("name", self.name.as_str())
            .opt("peak_active_power", self.peak_active_power)
            .build()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadZone {
    pub name: String,
    pub peak_active_power: Option<Quantity>,
}

impl ToRecord for LoadZone {
    fn to_record(&self) -> Record {
        RecordBuilder::new()
            .field("name", self.name.as_str())
            .opt("peak_active_power", self.peak_active_power)
            .build()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerLoad {
    pub name: String,
    pub bus: ComponentRef,
    #[serde(default = "default_true")]
    pub available: bool,
    pub active_power: Option<Quantity>,
    pub reactive_power: Option<Quantity>,
    pub max_active_power: Option<Quantity>,
    pub max_reactive_power: Option<Quantity>,
    pub base_power: Option<Quantity>,
}

impl ToRecord for PowerLoad {
    fn to_record(&self) -> Record {
        RecordBuilder::new()
            .field("name", self.name.as_str())
            .field("bus", self.bus.clone())
            .field("available", self.available)
            .opt("active_power", self.active_power)
            .opt("reactive_power", self.reactive_power)
            .opt("max_active_power", self.max_active_power)
            .opt("max_reactive_power", self.max_reactive_power)
            .opt("base_power", self.base_power)
            .build()
    }
}

/// AC line or transformer between two buses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcBranch {
    pub name: String,
    pub from_bus: ComponentRef,
    pub to_bus: ComponentRef,
    #[serde(default = "default_true")]
    pub available: bool,
    /// Series resistance (per-unit)
    pub r: Option<f64>,
    /// Series reactance (per-unit)
    pub x: Option<f64>,
    /// Shunt susceptance (per-unit)
    pub b: Option<f64>,
    pub rating: Option<Quantity>,
    pub rating_up: Option<Quantity>,
    pub rating_down: Option<Quantity>,
    /// Off-nominal tap ratio, transformers only
    pub tap: Option<f64>,
}

impl ToRecord for AcBranch {
    fn to_record(&self) -> Record {
        RecordBuilder::new()
            .field("name", self.name.as_str())
            .field("from_bus", self.from_bus.clone())
            .field("to_bus", self.to_bus.clone())
            .field("available", self.available)
            .opt("r", self.r)
            .opt("x", self.x)
            .opt("b", self.b)
            .opt("rating", self.rating)
            .opt("rating_up", self.rating_up)
            .opt("rating_down", self.rating_down)
            .opt("tap", self.tap)
            .build()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcBranch {
    pub name: String,
    pub from_bus: ComponentRef,
    pub to_bus: ComponentRef,
    #[serde(default = "default_true")]
    pub available: bool,
    pub rating_up: Option<Quantity>,
    pub rating_down: Option<Quantity>,
    pub loss: Option<f64>,
}

impl ToRecord for DcBranch {
    fn to_record(&self) -> Record {
        RecordBuilder::new()
            .field("name", self.name.as_str())
            .field("from_bus", self.from_bus.clone())
            .field("to_bus", self.to_bus.clone())
            .field("available", self.available)
            .opt("rating_up", self.rating_up)
            .opt("rating_down", self.rating_down)
            .opt("loss", self.loss)
            .build()
    }
}

// =============================================================================
// Operation cost
// =============================================================================

/// One `(x, y)` breakpoint of a piecewise curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XyCoords {
    pub x: f64,
    pub y: f64,
}

/// Shape of a cost or fuel function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FunctionData {
    Linear {
        proportional_term: f64,
        #[serde(default)]
        constant_term: Option<f64>,
    },
    Quadratic {
        quadratic_term: f64,
        proportional_term: f64,
        constant_term: f64,
    },
    PiecewiseLinear {
        points: Vec<XyCoords>,
    },
}

impl ToRecord for FunctionData {
    fn to_record(&self) -> Record {
        match self {
            FunctionData::Linear {
                proportional_term,
                constant_term,
            } => RecordBuilder::new()
                .field("proportional_term", *proportional_term)
                .opt("constant_term", *constant_term)
                .build(),
            FunctionData::Quadratic {
                quadratic_term,
                proportional_term,
                constant_term,
            } => RecordBuilder::new()
                .field("quadratic_term", *quadratic_term)
                .field("proportional_term", *proportional_term)
                .field("constant_term", *constant_term)
                .build(),
            FunctionData::PiecewiseLinear { points } => {
                let points: Vec<Value> = points
                    .iter()
                    .map(|p| Value::List(vec![Value::Float(p.x), Value::Float(p.y)]))
                    .collect();
                RecordBuilder::new().field("points", points).build()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCurve {
    pub function_data: FunctionData,
}

impl ToRecord for ValueCurve {
    fn to_record(&self) -> Record {
        RecordBuilder::new()
            .field("function_data", self.function_data.to_record())
            .build()
    }
}

/// Variable production cost, tagged by curve kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variable_type")]
pub enum ProductionVariableCost {
    /// Curve expressed directly in currency per hour
    CostCurve {
        value_curve: ValueCurve,
        #[serde(default)]
        vom_cost: Option<ValueCurve>,
    },
    /// Curve expressed in fuel per hour, priced by `fuel_cost`
    FuelCurve {
        value_curve: ValueCurve,
        #[serde(default)]
        vom_cost: Option<ValueCurve>,
        #[serde(default)]
        fuel_cost: Option<f64>,
    },
}

impl ProductionVariableCost {
    pub fn variable_type(&self) -> &'static str {
        match self {
            ProductionVariableCost::CostCurve { .. } => "CostCurve",
            ProductionVariableCost::FuelCurve { .. } => "FuelCurve",
        }
    }
}

impl ToRecord for ProductionVariableCost {
    fn to_record(&self) -> Record {
        match self {
            ProductionVariableCost::CostCurve {
                value_curve,
                vom_cost,
            } => RecordBuilder::new()
                .field("value_curve", value_curve.to_record())
                .opt("vom_cost", vom_cost.as_ref().map(ToRecord::to_record))
                .build(),
            ProductionVariableCost::FuelCurve {
                value_curve,
                vom_cost,
                fuel_cost,
            } => RecordBuilder::new()
                .field("value_curve", value_curve.to_record())
                .opt("vom_cost", vom_cost.as_ref().map(ToRecord::to_record))
                .opt("fuel_cost", *fuel_cost)
                .build(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationCost {
    pub variable: Option<ProductionVariableCost>,
    pub fixed: Option<f64>,
    pub start_up: Option<f64>,
    pub shut_down: Option<f64>,
}

impl ToRecord for OperationCost {
    fn to_record(&self) -> Record {
        RecordBuilder::new()
            .opt("variable", self.variable.as_ref().map(ToRecord::to_record))
            .opt(
                "variable_type",
                self.variable.as_ref().map(ProductionVariableCost::variable_type),
            )
            .opt("fixed", self.fixed)
            .opt("start_up", self.start_up)
            .opt("shut_down", self.shut_down)
            .build()
    }
}

// =============================================================================
// Devices
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMax {
    pub min: Quantity,
    pub max: Quantity,
}

impl ToRecord for MinMax {
    fn to_record(&self) -> Record {
        RecordBuilder::new()
            .field("min", self.min)
            .field("max", self.max)
            .build()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generator {
    pub name: String,
    pub bus: ComponentRef,
    #[serde(default = "default_true")]
    pub available: bool,
    pub active_power: Option<Quantity>,
    pub reactive_power: Option<Quantity>,
    pub rating: Option<Quantity>,
    pub active_power_limits: Option<MinMax>,
    pub reactive_power_limits: Option<MinMax>,
    pub min_up_time: Option<f64>,
    pub min_down_time: Option<f64>,
    pub prime_mover_type: Option<String>,
    pub fuel: Option<String>,
    pub base_power: Option<Quantity>,
    pub power_factor: Option<f64>,
    pub operation_cost: Option<OperationCost>,
}

impl ToRecord for Generator {
    fn to_record(&self) -> Record {
        RecordBuilder::new()
            .field("name", self.name.as_str())
            .field("bus", self.bus.clone())
            .field("available", self.available)
            .opt("active_power", self.active_power)
            .opt("reactive_power", self.reactive_power)
            .opt("rating", self.rating)
            .opt("active_power_limits", self.active_power_limits.map(|l| l.to_record()))
            .opt(
                "reactive_power_limits",
                self.reactive_power_limits.map(|l| l.to_record()),
            )
            .opt("min_up_time", self.min_up_time)
            .opt("min_down_time", self.min_down_time)
            .opt("prime_mover_type", self.prime_mover_type.clone())
            .opt("fuel", self.fuel.clone())
            .opt("base_power", self.base_power)
            .opt("power_factor", self.power_factor)
            .opt(
                "operation_cost",
                self.operation_cost.as_ref().map(ToRecord::to_record),
            )
            .build()
    }
}

/// Battery or pumped-hydro storage unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Storage {
    pub name: String,
    pub bus: Option<ComponentRef>,
    #[serde(default = "default_true")]
    pub available: bool,
    pub active_power: Option<Quantity>,
    pub reactive_power: Option<Quantity>,
    pub rating: Option<Quantity>,
    pub active_power_limits: Option<MinMax>,
    pub storage_capacity: Option<Quantity>,
    pub min_storage_capacity: Option<Quantity>,
    pub max_storage_capacity: Option<Quantity>,
    pub initial_energy: Option<Quantity>,
    pub input_efficiency: Option<f64>,
    pub output_efficiency: Option<f64>,
    pub prime_mover_type: Option<String>,
    pub base_power: Option<Quantity>,
    pub operation_cost: Option<OperationCost>,
}

impl ToRecord for Storage {
    fn to_record(&self) -> Record {
        RecordBuilder::new()
            .field("name", self.name.as_str())
            .opt("bus", self.bus.clone())
            .field("available", self.available)
            .opt("active_power", self.active_power)
            .opt("reactive_power", self.reactive_power)
            .opt("rating", self.rating)
            .opt("active_power_limits", self.active_power_limits.map(|l| l.to_record()))
            .opt("storage_capacity", self.storage_capacity)
            .opt("min_storage_capacity", self.min_storage_capacity)
            .opt("max_storage_capacity", self.max_storage_capacity)
            .opt("initial_energy", self.initial_energy)
            .opt("input_efficiency", self.input_efficiency)
            .opt("output_efficiency", self.output_efficiency)
            .opt("prime_mover_type", self.prime_mover_type.clone())
            .opt("base_power", self.base_power)
            .opt(
                "operation_cost",
                self.operation_cost.as_ref().map(ToRecord::to_record),
            )
            .build()
    }
}

// =============================================================================
// Reserves
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReserveDirection {
    #[serde(alias = "UP")]
    Up,
    #[serde(alias = "DOWN")]
    Down,
}

impl ReserveDirection {
    /// Symbolic name written to tables.
    pub fn symbol(self) -> &'static str {
        match self {
            ReserveDirection::Up => "UP",
            ReserveDirection::Down => "DOWN",
        }
    }

    /// Value stored in component records.
    pub fn as_str(self) -> &'static str {
        match self {
            ReserveDirection::Up => "Up",
            ReserveDirection::Down => "Down",
        }
    }
}

impl FromStr for ReserveDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Up" | "UP" | "up" => Ok(ReserveDirection::Up),
            "Down" | "DOWN" | "down" => Ok(ReserveDirection::Down),
            other => Err(format!("unknown reserve direction '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reserve {
    pub name: String,
    pub region: Option<ComponentRef>,
    pub direction: ReserveDirection,
    pub reserve_type: Option<String>,
    /// Deployment time frame in minutes
    pub time_frame: Option<f64>,
    pub max_requirement: Option<f64>,
    pub duration: Option<f64>,
    pub vors: Option<f64>,
    pub load_risk: Option<f64>,
}

impl ToRecord for Reserve {
    fn to_record(&self) -> Record {
        RecordBuilder::new()
            .field("name", self.name.as_str())
            .opt("region", self.region.clone())
            .field("direction", self.direction.as_str())
            .opt("reserve_type", self.reserve_type.clone())
            .opt("time_frame", self.time_frame)
            .opt("max_requirement", self.max_requirement)
            .opt("duration", self.duration)
            .opt("vors", self.vors)
            .opt("load_risk", self.load_risk)
            .build()
    }
}

/// Insertion-ordered set of device names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct DeviceSet(Vec<String>);

impl DeviceSet {
    pub fn insert(&mut self, device: impl Into<String>) -> bool {
        let device = device.into();
        if self.0.contains(&device) {
            return false;
        }
        self.0.push(device);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for DeviceSet {
    fn from(devices: Vec<String>) -> Self {
        let mut set = DeviceSet::default();
        for device in devices {
            set.insert(device);
        }
        set
    }
}

impl From<DeviceSet> for Vec<String> {
    fn from(set: DeviceSet) -> Self {
        set.0
    }
}

/// Which devices may contribute to each reserve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveMap {
    pub name: String,
    #[serde(default)]
    pub mapping: BTreeMap<String, DeviceSet>,
}

impl ToRecord for ReserveMap {
    fn to_record(&self) -> Record {
        let mapping: Record = self
            .mapping
            .iter()
            .map(|(reserve, devices)| {
                let devices: Vec<Value> = devices.iter().map(Value::from).collect();
                (reserve.clone(), Value::List(devices))
            })
            .collect();
        RecordBuilder::new()
            .field("name", self.name.as_str())
            .field("mapping", mapping)
            .build()
    }
}

// =============================================================================
// Component enum
// =============================================================================

/// Concrete component class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentKind {
    ACBus,
    Area,
    LoadZone,
    PowerLoad,
    Line,
    MonitoredLine,
    Transformer2W,
    TModelHVDCLine,
    ThermalStandard,
    RenewableDispatch,
    RenewableNonDispatch,
    HydroDispatch,
    EnergyReservoirStorage,
    HydroPumpedStorage,
    VariableReserve,
    ReserveMap,
}

impl ComponentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ComponentKind::ACBus => "ACBus",
            ComponentKind::Area => "Area",
            ComponentKind::LoadZone => "LoadZone",
            ComponentKind::PowerLoad => "PowerLoad",
            ComponentKind::Line => "Line",
            ComponentKind::MonitoredLine => "MonitoredLine",
            ComponentKind::Transformer2W => "Transformer2W",
            ComponentKind::TModelHVDCLine => "TModelHVDCLine",
            ComponentKind::ThermalStandard => "ThermalStandard",
            ComponentKind::RenewableDispatch => "RenewableDispatch",
            ComponentKind::RenewableNonDispatch => "RenewableNonDispatch",
            ComponentKind::HydroDispatch => "HydroDispatch",
            ComponentKind::EnergyReservoirStorage => "EnergyReservoirStorage",
            ComponentKind::HydroPumpedStorage => "HydroPumpedStorage",
            ComponentKind::VariableReserve => "VariableReserve",
            ComponentKind::ReserveMap => "ReserveMap",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Abstract component family used for queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Bus,
    Area,
    LoadZone,
    Load,
    AcBranch,
    DcBranch,
    /// All production devices, storage included
    Generator,
    Storage,
    Reserve,
    ReserveMap,
    Any,
}

impl Category {
    /// Whether `kind` belongs to this family.
    pub fn contains(self, kind: ComponentKind) -> bool {
        use ComponentKind as K;
        match self {
            Category::Bus => kind == K::ACBus,
            Category::Area => kind == K::Area,
            Category::LoadZone => kind == K::LoadZone,
            Category::Load => kind == K::PowerLoad,
            Category::AcBranch => {
                matches!(kind, K::Line | K::MonitoredLine | K::Transformer2W)
            }
            Category::DcBranch => kind == K::TModelHVDCLine,
            Category::Generator => matches!(
                kind,
                K::ThermalStandard
                    | K::RenewableDispatch
                    | K::RenewableNonDispatch
                    | K::HydroDispatch
                    | K::EnergyReservoirStorage
                    | K::HydroPumpedStorage
            ),
            Category::Storage => {
                matches!(kind, K::EnergyReservoirStorage | K::HydroPumpedStorage)
            }
            Category::Reserve => kind == K::VariableReserve,
            Category::ReserveMap => kind == K::ReserveMap,
            Category::Any => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "class_type")]
pub enum Component {
    ACBus(Bus),
    Area(Area),
    LoadZone(LoadZone),
    PowerLoad(PowerLoad),
    Line(AcBranch),
    MonitoredLine(AcBranch),
    Transformer2W(AcBranch),
    TModelHVDCLine(DcBranch),
    ThermalStandard(Generator),
    RenewableDispatch(Generator),
    RenewableNonDispatch(Generator),
    HydroDispatch(Generator),
    EnergyReservoirStorage(Storage),
    HydroPumpedStorage(Storage),
    VariableReserve(Reserve),
    ReserveMap(ReserveMap),
}

/// Run `$body` with `$inner` bound to the payload of any variant.
macro_rules! with_inner {
    ($component:expr, $inner:ident => $body:expr) => {
        match $component {
            Component::ACBus($inner) => $body,
            Component::Area($inner) => $body,
            Component::LoadZone($inner) => $body,
            Component::PowerLoad($inner) => $body,
            Component::Line($inner) => $body,
            Component::MonitoredLine($inner) => $body,
            Component::Transformer2W($inner) => $body,
            Component::TModelHVDCLine($inner) => $body,
            Component::ThermalStandard($inner) => $body,
            Component::RenewableDispatch($inner) => $body,
            Component::RenewableNonDispatch($inner) => $body,
            Component::HydroDispatch($inner) => $body,
            Component::EnergyReservoirStorage($inner) => $body,
            Component::HydroPumpedStorage($inner) => $body,
            Component::VariableReserve($inner) => $body,
            Component::ReserveMap($inner) => $body,
        }
    };
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::ACBus(_) => ComponentKind::ACBus,
            Component::Area(_) => ComponentKind::Area,
            Component::LoadZone(_) => ComponentKind::LoadZone,
            Component::PowerLoad(_) => ComponentKind::PowerLoad,
            Component::Line(_) => ComponentKind::Line,
            Component::MonitoredLine(_) => ComponentKind::MonitoredLine,
            Component::Transformer2W(_) => ComponentKind::Transformer2W,
            Component::TModelHVDCLine(_) => ComponentKind::TModelHVDCLine,
            Component::ThermalStandard(_) => ComponentKind::ThermalStandard,
            Component::RenewableDispatch(_) => ComponentKind::RenewableDispatch,
            Component::RenewableNonDispatch(_) => ComponentKind::RenewableNonDispatch,
            Component::HydroDispatch(_) => ComponentKind::HydroDispatch,
            Component::EnergyReservoirStorage(_) => ComponentKind::EnergyReservoirStorage,
            Component::HydroPumpedStorage(_) => ComponentKind::HydroPumpedStorage,
            Component::VariableReserve(_) => ComponentKind::VariableReserve,
            Component::ReserveMap(_) => ComponentKind::ReserveMap,
        }
    }

    pub fn name(&self) -> &str {
        with_inner!(self, inner => inner.name.as_str())
    }

    /// Store label, `"<Kind>.<name>"`.
    pub fn label(&self) -> String {
        format!("{}.{}", self.kind(), self.name())
    }

    pub fn reference(&self) -> ComponentRef {
        ComponentRef::new(self.kind().as_str(), self.name())
    }

    pub fn is_a(&self, category: Category) -> bool {
        category.contains(self.kind())
    }

    /// Flat record of this component, tagged with its `class_type`.
    pub fn to_record(&self) -> Record {
        let mut record = with_inner!(self, inner => inner.to_record());
        record.insert("class_type".to_string(), Value::from(self.kind().as_str()));
        record
    }
}

impl Component {
    pub fn as_reserve_map(&self) -> Option<&ReserveMap> {
        match self {
            Component::ReserveMap(map) => Some(map),
            _ => None,
        }
    }
}
