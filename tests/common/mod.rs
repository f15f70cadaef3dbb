//! Shared test utilities

use std::sync::{Arc, Mutex};

use fieldgate::space::memory::InMemorySpace;
use fieldgate::{
    AddressSpace, Callable, CapabilityRegistry, DataKind, DataVariant, Device, Element,
    ElementPayload, Historizer, MetaInfo, ModelError, ModelResult, NodeBuilder, NodeIdentifier,
    ParameterSpec, ParameterTypes, Parameters, Readable, Writable,
};

/// Namespace used by all test fixtures
pub const NS: u16 = 2;

/// A fully wired gateway over an in-memory space and history store
pub struct Gateway {
    pub space: Arc<InMemorySpace>,
    pub registry: Arc<CapabilityRegistry>,
    pub historizer: Arc<Historizer>,
    pub builder: NodeBuilder,
}

/// Set up a gateway with in-memory space, registry and history store
#[must_use]
pub fn setup_gateway() -> Gateway {
    let space = Arc::new(InMemorySpace::new());
    let registry = Arc::new(CapabilityRegistry::new());
    let historizer = Arc::new(Historizer::in_memory().expect("failed to init history store"));
    let builder = NodeBuilder::new(
        Arc::clone(&space) as Arc<dyn AddressSpace>,
        Arc::clone(&registry),
        NS,
    )
    .with_historizer(Arc::clone(&historizer));
    Gateway {
        space,
        registry,
        historizer,
        builder,
    }
}

/// Node identifier in the fixture namespace
#[must_use]
pub fn nid(id: &str) -> NodeIdentifier {
    NodeIdentifier::text(NS, id)
}

/// Readable metric backed by a mutable cell
pub struct Gauge {
    kind: DataKind,
    value: Mutex<DataVariant>,
}

impl Gauge {
    #[must_use]
    pub fn new(value: DataVariant) -> Self {
        Self {
            kind: value.kind(),
            value: Mutex::new(value),
        }
    }

    pub fn set(&self, value: DataVariant) {
        *self.value.lock().unwrap() = value;
    }
}

impl Readable for Gauge {
    fn data_kind(&self) -> DataKind {
        self.kind
    }

    fn read(&self) -> ModelResult<DataVariant> {
        Ok(self.value.lock().unwrap().clone())
    }
}

/// Writable setting storing the last written value
pub struct Setting {
    kind: DataKind,
    value: Mutex<DataVariant>,
}

impl Setting {
    #[must_use]
    pub fn new(value: DataVariant) -> Self {
        Self {
            kind: value.kind(),
            value: Mutex::new(value),
        }
    }
}

impl Writable for Setting {
    fn data_kind(&self) -> DataKind {
        self.kind
    }

    fn read(&self) -> ModelResult<DataVariant> {
        Ok(self.value.lock().unwrap().clone())
    }

    fn write(&self, value: DataVariant) -> ModelResult<()> {
        *self.value.lock().unwrap() = value;
        Ok(())
    }
}

/// Callable doubling its mandatory integer argument
pub struct Doubler;

impl Callable for Doubler {
    fn parameter_types(&self) -> ParameterTypes {
        vec![ParameterSpec {
            kind: DataKind::Integer,
            mandatory: true,
        }]
    }

    fn result_kind(&self) -> Option<DataKind> {
        Some(DataKind::Integer)
    }

    fn execute(&self, _params: Parameters) -> ModelResult<()> {
        Ok(())
    }

    fn call(&self, params: Parameters) -> ModelResult<DataVariant> {
        match params.get(0) {
            Some(DataVariant::Integer(v)) => Ok(DataVariant::Integer(v * 2)),
            _ => Err(ModelError::new("missing integer argument")),
        }
    }
}

/// A boiler device with a sensor group, a writable setpoint and a callable
#[must_use]
pub fn boiler_device(temperature: &Arc<Gauge>) -> Device {
    Device::new(
        MetaInfo::new("boiler-01", "Boiler", "Primary boiler"),
        vec![
            Element::new(
                MetaInfo::new("boiler-01-sensors", "Sensors", "Sensor group"),
                ElementPayload::Group(vec![Element::new(
                    MetaInfo::new("boiler-01-temp", "Temperature", "Current temperature"),
                    ElementPayload::Readable(Arc::clone(temperature) as Arc<dyn Readable>),
                )]),
            ),
            Element::new(
                MetaInfo::new("boiler-01-setpoint", "Setpoint", "Target temperature"),
                ElementPayload::Writable(Arc::new(Setting::new(DataVariant::Integer(0)))),
            ),
            Element::new(
                MetaInfo::new("boiler-01-double", "Double", "Doubles an integer"),
                ElementPayload::Callable(Arc::new(Doubler)),
            ),
        ],
    )
}
