//! Concurrent capability registry
//!
//! Maps protocol node identifiers to the typed behavior behind them. The
//! protocol runtime dispatches every client read/write/call through this
//! map from its own worker threads; the sharded map keeps unrelated
//! identifiers from contending with each other.
//!
//! Dispatch never holds a map shard across a model callback: the capability
//! handle is cloned out first, so a slow or reentrant device cannot stall
//! unrelated traffic.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{error, trace, warn};

use crate::model::{Callable, ModelError, Observable, Parameters, Readable, Writable};
use crate::space::NodeIdentifier;
use crate::variant::{DataKind, DataVariant};
use crate::{Error, Result};

type ModelResultVariant = std::result::Result<DataVariant, ModelError>;

/// Typed behavior registered under a node identifier
///
/// Absence of a capability is expressed by absence from the registry; there
/// is deliberately no empty arm.
#[derive(Clone)]
pub enum Capability {
    Readable(Arc<dyn Readable>),
    Observable(Arc<dyn Observable>),
    Writable(Arc<dyn Writable>),
    Callable(Arc<dyn Callable>),
}

impl Capability {
    #[must_use]
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::Readable(_) => "readable",
            Self::Observable(_) => "observable",
            Self::Writable(_) => "writable",
            Self::Callable(_) => "callable",
        }
    }
}

impl std::fmt::Debug for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.describe())
    }
}

/// Concurrent map from node identifiers to dispatchable capabilities
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    entries: DashMap<NodeIdentifier, Capability>,
}

impl CapabilityRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Number of registered capabilities
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a capability is registered under `id`
    #[must_use]
    pub fn contains(&self, id: &NodeIdentifier) -> bool {
        self.entries.contains_key(id)
    }

    /// Register a capability under `id`
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyRegistered`] if `id` is taken; the existing
    /// registration is never overwritten.
    pub fn add(&self, id: NodeIdentifier, capability: Capability) -> Result<()> {
        match self.entries.entry(id) {
            Entry::Occupied(entry) => {
                error!(node = %entry.key(), "node was already registered earlier");
                Err(Error::AlreadyRegistered(entry.key().clone()))
            }
            Entry::Vacant(entry) => {
                trace!(node = %entry.key(), kind = capability.describe(), "registering capability");
                entry.insert(capability);
                Ok(())
            }
        }
    }

    /// Remove the registration under `id`; idempotent
    pub fn remove(&self, id: &NodeIdentifier) {
        if self.entries.remove(id).is_none() {
            warn!(node = %id, "no capability registered; nothing to remove");
        } else {
            trace!(node = %id, "capability removed");
        }
    }

    fn find(&self, id: &NodeIdentifier) -> Result<Capability> {
        // clone the handle out so no shard lock is held across model calls
        self.entries
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::NotFound(id.clone()))
    }

    /// Unexpected model failure: the node can no longer be dispatched
    fn self_heal(&self, id: &NodeIdentifier, err: &ModelError) -> Error {
        error!(node = %id, error = %err, "capability callback failed; removing registration");
        self.entries.remove(id);
        Error::Internal(err.to_string())
    }

    fn checked(
        &self,
        id: &NodeIdentifier,
        expected: DataKind,
        produced: ModelResultVariant,
    ) -> Result<DataVariant> {
        let value = produced.map_err(|err| self.self_heal(id, &err))?;
        if value.kind() == expected {
            Ok(value)
        } else {
            error!(
                node = %id,
                expected = %expected,
                actual = %value.kind(),
                "read produced a value of the wrong kind"
            );
            Err(Error::TypeMismatch {
                expected,
                actual: value.kind(),
            })
        }
    }

    /// Read the current value of the capability under `id`
    ///
    /// A write-only writable yields the kind's fixed placeholder with a
    /// warning instead of failing, since such nodes still satisfy runtime
    /// read preconditions.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for an absent id, [`Error::NotReadable`] for a
    /// callable, [`Error::TypeMismatch`] when the produced kind differs from
    /// the declared kind and [`Error::Internal`] (after self-healing
    /// removal) on any other model failure.
    pub fn read(&self, id: &NodeIdentifier) -> Result<DataVariant> {
        trace!(node = %id, "read dispatch");
        match self.find(id)? {
            Capability::Readable(metric) => self.checked(id, metric.data_kind(), metric.read()),
            Capability::Observable(metric) => self.checked(id, metric.data_kind(), metric.read()),
            Capability::Writable(metric) => {
                if metric.is_write_only() {
                    warn!(node = %id, "node does not support read; returning placeholder");
                    Ok(DataVariant::placeholder(metric.data_kind()))
                } else {
                    self.checked(id, metric.data_kind(), metric.read())
                }
            }
            Capability::Callable(_) => Err(Error::NotReadable(id.clone())),
        }
    }

    /// Write a value to the writable capability under `id`
    ///
    /// The value's kind is validated against the declared kind before the
    /// writer is invoked; on mismatch the writer never runs.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`], [`Error::NotWritable`], [`Error::TypeMismatch`]
    /// or [`Error::Internal`] (after self-healing removal).
    pub fn write(&self, id: &NodeIdentifier, value: DataVariant) -> Result<()> {
        trace!(node = %id, "write dispatch");
        let Capability::Writable(metric) = self.find(id)? else {
            return Err(Error::NotWritable(id.clone()));
        };
        let expected = metric.data_kind();
        if value.kind() != expected {
            error!(
                node = %id,
                expected = %expected,
                actual = %value.kind(),
                "write value has the wrong kind"
            );
            return Err(Error::TypeMismatch {
                expected,
                actual: value.kind(),
            });
        }
        metric.write(value).map_err(|err| self.self_heal(id, &err))
    }

    /// Invoke the callable capability under `id`
    ///
    /// Inputs are bound positionally against the declared parameter list.
    /// With `want_output` the value-returning form runs and its result kind
    /// is validated against the declared result kind; otherwise the
    /// fire-and-forget form runs and `None` is returned.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`], [`Error::NotCallable`], the argument errors of
    /// [`Parameters::bind`], [`Error::TypeMismatch`] on a result-kind
    /// mismatch and [`Error::Internal`] (after self-healing removal).
    pub fn call(
        &self,
        id: &NodeIdentifier,
        inputs: Vec<DataVariant>,
        want_output: bool,
    ) -> Result<Option<DataVariant>> {
        trace!(node = %id, args = inputs.len(), want_output, "call dispatch");
        let Capability::Callable(callable) = self.find(id)? else {
            return Err(Error::NotCallable(id.clone()));
        };
        let specs = callable.parameter_types();
        let params = Parameters::bind(&specs, inputs)?;

        if !want_output {
            callable
                .execute(params)
                .map_err(|err| self.self_heal(id, &err))?;
            return Ok(None);
        }

        let Some(expected) = callable.result_kind() else {
            return Err(Error::InvalidArgument(format!(
                "callable {id} declares no result"
            )));
        };
        let result = callable
            .call(params)
            .map_err(|err| self.self_heal(id, &err))?;
        if result.kind() != expected {
            error!(
                node = %id,
                expected = %expected,
                actual = %result.kind(),
                "call produced a result of the wrong kind"
            );
            return Err(Error::TypeMismatch {
                expected,
                actual: result.kind(),
            });
        }
        Ok(Some(result))
    }
}
