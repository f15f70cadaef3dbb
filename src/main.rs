use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use fieldgate::model::{ModelResult, Parameters};
use fieldgate::space::memory::InMemorySpace;
use fieldgate::{
    Adapter, AddressSpace, Callable, CapabilityRegistry, Config, DataKind, DataVariant, Device,
    DeviceEvent, Element, ElementPayload, Historizer, MetaInfo, NodeBuilder, ParameterSpec,
    ParameterTypes, Readable, Writable, channel_source,
};

/// Fieldgate - device information-model gateway
#[derive(Parser)]
#[command(name = "fieldgate", version, about)]
struct Cli {
    /// Configuration file (TOML or JSON)
    #[arg(short, long, env = "FIELDGATE_CONFIG")]
    config: Option<PathBuf>,

    /// History database file (overrides the config; default in data dir)
    #[arg(long, env = "FIELDGATE_DB")]
    database: Option<PathBuf>,

    /// Register a simulated demo device at startup
    #[arg(long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(database) = cli.database {
        config.history.database_path = Some(database);
    } else if config.history.enabled && config.history.database_path.is_none() {
        config.history.database_path = default_database_path();
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_filter.clone())),
        )
        .init();

    let space: Arc<dyn AddressSpace> = Arc::new(InMemorySpace::new());
    let registry = Arc::new(CapabilityRegistry::new());
    let mut builder = NodeBuilder::new(Arc::clone(&space), Arc::clone(&registry), config.namespace);
    if config.history.enabled {
        let historizer =
            Arc::new(Historizer::open(&config.history).context("opening history store")?);
        builder = builder.with_historizer(historizer);
    }

    let adapter = Adapter::new(builder);
    let (events, source) = channel_source(32);
    if cli.demo {
        events.send(DeviceEvent::Registered(demo_device())).await?;
    }

    let runner = tokio::spawn(async move { adapter.run(source).await });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    drop(events);
    runner.await?;
    Ok(())
}

fn default_database_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "fieldgate", "fieldgate").map(|dirs| {
        let data = dirs.data_dir().to_path_buf();
        let _ = std::fs::create_dir_all(&data);
        data.join("history.db")
    })
}

/// Monotonic counter standing in for a real sensor
struct DemoCounter {
    state: std::sync::Mutex<i64>,
}

impl Readable for DemoCounter {
    fn data_kind(&self) -> DataKind {
        DataKind::Integer
    }

    fn read(&self) -> ModelResult<DataVariant> {
        let mut state = self.state.lock().unwrap();
        *state += 1;
        Ok(DataVariant::Integer(*state))
    }
}

struct DemoSetpoint {
    state: std::sync::Mutex<f64>,
}

impl Writable for DemoSetpoint {
    fn data_kind(&self) -> DataKind {
        DataKind::Double
    }

    fn read(&self) -> ModelResult<DataVariant> {
        Ok(DataVariant::Double(*self.state.lock().unwrap()))
    }

    fn write(&self, value: DataVariant) -> ModelResult<()> {
        if let DataVariant::Double(v) = value {
            *self.state.lock().unwrap() = v;
        }
        Ok(())
    }
}

struct DemoScale;

impl Callable for DemoScale {
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
            Some(DataVariant::Integer(v)) => Ok(DataVariant::Integer(v * 10)),
            _ => Ok(DataVariant::Integer(0)),
        }
    }
}

fn demo_device() -> Device {
    Device::new(
        MetaInfo::new("demo-plant", "Demo Plant", "Simulated demonstration device"),
        vec![
            Element::new(
                MetaInfo::new("demo-plant-cycles", "Cycles", "Completed work cycles"),
                ElementPayload::Readable(Arc::new(DemoCounter {
                    state: std::sync::Mutex::new(0),
                })),
            ),
            Element::new(
                MetaInfo::new("demo-plant-setpoint", "Setpoint", "Target output level"),
                ElementPayload::Writable(Arc::new(DemoSetpoint {
                    state: std::sync::Mutex::new(50.0),
                })),
            ),
            Element::new(
                MetaInfo::new("demo-plant-scale", "Scale", "Scales an integer by ten"),
                ElementPayload::Callable(Arc::new(DemoScale)),
            ),
        ],
    )
}
