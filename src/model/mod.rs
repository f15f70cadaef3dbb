//! Consumed information-model surface
//!
//! Devices are trees of [`Element`]s. Each element carries stable identity
//! metadata ([`MetaInfo`]) and exactly one payload: a group of child
//! elements, or a shared handle to an object implementing one of the four
//! capability traits. The gateway only ever talks to model objects through
//! these traits; how a device produces its values is its own business.

mod params;

use std::sync::Arc;

use thiserror::Error;

pub use params::{ParameterSpec, ParameterTypes, Parameters};

use crate::variant::{DataKind, DataVariant};

/// Failure raised by an information-model callback
///
/// Opaque to the gateway: any model failure during dispatch is treated as
/// unexpected and triggers self-healing removal of the registration.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ModelError(pub String);

impl ModelError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Result type for information-model callbacks
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Stable identity of an information-model element
///
/// `id` is caller-stable and is used to derive the element's protocol node
/// identifier deterministically; re-registering the same id is detected
/// rather than silently duplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl MetaInfo {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
        }
    }
}

/// A metric whose value can be read on demand
pub trait Readable: Send + Sync {
    /// Declared kind of the metric's value
    fn data_kind(&self) -> DataKind;

    /// Read the current value
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] if the underlying device cannot produce a value
    fn read(&self) -> ModelResult<DataVariant>;
}

/// A metric whose value changes are observable
///
/// Same read surface as [`Readable`]; the distinction matters to consumers
/// that subscribe to change notifications rather than poll.
pub trait Observable: Send + Sync {
    fn data_kind(&self) -> DataKind;

    /// Read the most recently observed value
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] if no value is available
    fn read(&self) -> ModelResult<DataVariant>;
}

/// A metric that accepts writes, and unless write-only, reads
pub trait Writable: Send + Sync {
    fn data_kind(&self) -> DataKind;

    /// Whether reads are unsupported on this metric
    fn is_write_only(&self) -> bool {
        false
    }

    /// Read the current value; only called when not write-only
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] if the underlying device cannot produce a value
    fn read(&self) -> ModelResult<DataVariant>;

    /// Write a new value
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] if the underlying device rejects the value
    fn write(&self, value: DataVariant) -> ModelResult<()>;
}

/// A device function that can be invoked with positional arguments
pub trait Callable: Send + Sync {
    /// Declared argument list: kind and mandatory flag per position
    fn parameter_types(&self) -> ParameterTypes;

    /// Declared kind of the result, or `None` for fire-and-forget functions
    fn result_kind(&self) -> Option<DataKind>;

    /// Invoke without expecting a result
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] if the function fails
    fn execute(&self, params: Parameters) -> ModelResult<()>;

    /// Invoke and produce a result of [`Callable::result_kind`]
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] if the function fails
    fn call(&self, params: Parameters) -> ModelResult<DataVariant>;
}

/// Payload of an information-model element: exactly one capability
#[derive(Clone)]
pub enum ElementPayload {
    Group(Vec<Element>),
    Readable(Arc<dyn Readable>),
    Observable(Arc<dyn Observable>),
    Writable(Arc<dyn Writable>),
    Callable(Arc<dyn Callable>),
}

impl ElementPayload {
    #[must_use]
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::Group(_) => "group",
            Self::Readable(_) => "readable",
            Self::Observable(_) => "observable",
            Self::Writable(_) => "writable",
            Self::Callable(_) => "callable",
        }
    }
}

impl std::fmt::Debug for ElementPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Group(children) => f.debug_tuple("Group").field(&children.len()).finish(),
            other => f.write_str(other.describe()),
        }
    }
}

/// One node of a device's information-model tree
#[derive(Debug, Clone)]
pub struct Element {
    pub meta: MetaInfo,
    pub payload: ElementPayload,
}

impl Element {
    #[must_use]
    pub fn new(meta: MetaInfo, payload: ElementPayload) -> Self {
        Self { meta, payload }
    }
}

/// A registrable device: identity plus its top-level elements
#[derive(Debug, Clone)]
pub struct Device {
    pub meta: MetaInfo,
    pub elements: Vec<Element>,
}

impl Device {
    #[must_use]
    pub fn new(meta: MetaInfo, elements: Vec<Element>) -> Self {
        Self { meta, elements }
    }
}
