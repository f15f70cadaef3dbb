//! Fieldgate - Device information-model gateway
//!
//! This library projects an abstract, polymorphic information model
//! (devices composed of groups, readable/observable/writable metrics and
//! callable functions) onto a live, browsable protocol address space, and
//! optionally persists a time series of each value for historical
//! retrieval.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              Information Model (devices)             │
//! │   Groups  │  Metrics  │  Settings  │  Functions     │
//! └────────────────────┬────────────────────────────────┘
//!                      │ DeviceEvent
//! ┌────────────────────▼────────────────────────────────┐
//! │                   Fieldgate                          │
//! │  Adapter │ NodeBuilder │ CapabilityRegistry │        │
//! │          │             │ Historizer (SQLite)│        │
//! └────────────────────┬────────────────────────────────┘
//!                      │ AddressSpace seam
//! ┌────────────────────▼────────────────────────────────┐
//! │            Protocol Runtime (external)               │
//! │   Sessions │ Subscriptions │ Wire encoding          │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod adapter;
pub mod builder;
pub mod config;
pub mod error;
pub mod history;
pub mod model;
pub mod registry;
pub mod space;
pub mod variant;

pub use adapter::{Adapter, ChannelEventSource, DeviceEvent, DeviceEventSource, channel_source};
pub use builder::NodeBuilder;
pub use config::{Config, HistoryConfig};
pub use error::{Error, Result};
pub use history::{
    AtTimeValue, ContinuationToken, DataLocation, Historizer, HistoryValue, QualityBits,
    RawReadRequest, RawReadResponse,
};
pub use model::{
    Callable, Device, Element, ElementPayload, MetaInfo, ModelError, ModelResult, Observable,
    ParameterSpec, ParameterTypes, Parameters, Readable, Writable,
};
pub use registry::{Capability, CapabilityRegistry};
pub use space::{AddressSpace, NodeIdentifier, TypeDescriptor, WireValue};
pub use variant::{DataKind, DataVariant};
