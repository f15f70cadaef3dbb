//! Node builder
//!
//! Walks a device's information-model tree and projects it onto the
//! address space: object nodes for the device root and its groups, variable
//! nodes for metrics, method nodes for callables. Every leaf's capability
//! is registered before its node is created, so no client can address a
//! node whose behavior is not yet in place; deletion unregisters before the
//! nodes disappear for the same reason.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::history::Historizer;
use crate::model::{Callable, Device, Element, ElementPayload, MetaInfo, ModelResult, Observable,
    Readable, Writable};
use crate::registry::{Capability, CapabilityRegistry};
use crate::space::{AddressSpace, ArgumentSpec, MethodNode, NodeClass, NodeIdentifier, ObjectNode,
    ReferenceKind, TypeDescriptor, VariableNode, WireValue};
use crate::variant::{DataKind, DataVariant};
use crate::{Error, Result};

/// Projects information-model trees onto the address space
pub struct NodeBuilder {
    space: Arc<dyn AddressSpace>,
    registry: Arc<CapabilityRegistry>,
    historizer: Option<Arc<Historizer>>,
    namespace: u16,
}

impl NodeBuilder {
    #[must_use]
    pub fn new(
        space: Arc<dyn AddressSpace>,
        registry: Arc<CapabilityRegistry>,
        namespace: u16,
    ) -> Self {
        Self {
            space,
            registry,
            historizer: None,
            namespace,
        }
    }

    /// Arm historization for every metric node this builder creates
    #[must_use]
    pub fn with_historizer(mut self, historizer: Arc<Historizer>) -> Self {
        self.historizer = Some(historizer);
        self
    }

    /// Deterministic node identifier for an element's stable id
    #[must_use]
    pub fn node_id(&self, meta: &MetaInfo) -> NodeIdentifier {
        NodeIdentifier::text(self.namespace, meta.id.as_str())
    }

    /// Create the device's root node and recursively build its tree
    ///
    /// Element failures are isolated: each is logged with the element's id
    /// and name and does not abort its siblings. If any element failed the
    /// aggregate [`Error::Partial`] is returned, but the successfully built
    /// part of the tree remains usable.
    ///
    /// # Errors
    ///
    /// Fails outright only when the device root node itself cannot be
    /// created; otherwise [`Error::Partial`] reports the failed count.
    pub fn add_device_node(&self, device: &Device) -> Result<()> {
        info!(device = %device.meta.id, name = %device.meta.name, "adding device node");
        let root = self.add_object(&device.meta, None)?;

        let mut failed = 0usize;
        for element in &device.elements {
            self.add_element(element, &root, &mut failed);
        }
        if failed > 0 {
            Err(Error::Partial { failed })
        } else {
            Ok(())
        }
    }

    /// Tear down a device's subtree: registrations first, then the nodes
    ///
    /// Teardown is best-effort; a branch that cannot be browsed is logged
    /// and skipped rather than aborting the rest of the cleanup.
    ///
    /// # Errors
    ///
    /// Returns an error if the device root node cannot be deleted
    pub fn delete_device_node(&self, device_id: &str) -> Result<()> {
        let root = NodeIdentifier::text(self.namespace, device_id);
        info!(node = %root, "removing device node");
        self.remove_registrations(&root);
        self.space.delete_node(&root, true)
    }

    fn remove_registrations(&self, id: &NodeIdentifier) {
        match self.space.browse(id) {
            Ok(references) => {
                for reference in references {
                    if reference.class == NodeClass::Object {
                        self.remove_registrations(&reference.id);
                    } else {
                        self.registry.remove(&reference.id);
                    }
                }
            }
            Err(e) => {
                warn!(node = %id, error = %e, "could not browse branch; skipping its registrations");
            }
        }
    }

    fn add_object(
        &self,
        meta: &MetaInfo,
        parent: Option<&NodeIdentifier>,
    ) -> Result<NodeIdentifier> {
        let id = self.node_id(meta);
        debug!(node = %id, name = %meta.name, "creating object node");
        let (parent, reference) = match parent {
            Some(parent) => (parent.clone(), ReferenceKind::HasComponent),
            None => (self.space.objects_root(), ReferenceKind::Organizes),
        };
        self.space.add_object_node(ObjectNode {
            id: id.clone(),
            parent,
            reference,
            name: meta.name.clone(),
            description: meta.description.clone(),
        })?;
        Ok(id)
    }

    fn add_element(&self, element: &Element, parent: &NodeIdentifier, failed: &mut usize) {
        debug!(
            element = %element.meta.id,
            kind = element.payload.describe(),
            parent = %parent,
            "adding element node"
        );
        let result = match &element.payload {
            ElementPayload::Group(children) => {
                self.add_group(&element.meta, children, parent, failed)
            }
            ElementPayload::Readable(metric) => self.add_readable(&element.meta, metric, parent),
            ElementPayload::Observable(metric) => {
                self.add_observable(&element.meta, metric, parent)
            }
            ElementPayload::Writable(metric) => self.add_writable(&element.meta, metric, parent),
            ElementPayload::Callable(callable) => {
                self.add_callable(&element.meta, callable, parent)
            }
        };
        if let Err(e) = result {
            *failed += 1;
            error!(
                element = %element.meta.id,
                name = %element.meta.name,
                error = %e,
                "failed to build element node"
            );
        }
    }

    fn add_group(
        &self,
        meta: &MetaInfo,
        children: &[Element],
        parent: &NodeIdentifier,
        failed: &mut usize,
    ) -> Result<()> {
        let id = self.add_object(meta, Some(parent))?;
        debug!(group = %meta.id, children = children.len(), "descending into group");
        for child in children {
            self.add_element(child, &id, failed);
        }
        Ok(())
    }

    fn add_readable(
        &self,
        meta: &MetaInfo,
        metric: &Arc<dyn Readable>,
        parent: &NodeIdentifier,
    ) -> Result<()> {
        let kind = metric.data_kind();
        let initial = initial_value(meta, kind, metric.read());
        self.add_value_node(
            meta,
            parent,
            kind,
            initial,
            Capability::Readable(Arc::clone(metric)),
            false,
        )
    }

    fn add_observable(
        &self,
        meta: &MetaInfo,
        metric: &Arc<dyn Observable>,
        parent: &NodeIdentifier,
    ) -> Result<()> {
        let kind = metric.data_kind();
        let initial = initial_value(meta, kind, metric.read());
        self.add_value_node(
            meta,
            parent,
            kind,
            initial,
            Capability::Observable(Arc::clone(metric)),
            false,
        )
    }

    fn add_writable(
        &self,
        meta: &MetaInfo,
        metric: &Arc<dyn Writable>,
        parent: &NodeIdentifier,
    ) -> Result<()> {
        let kind = metric.data_kind();
        // write-only nodes still need a present value; the placeholder is
        // never surfaced through a read
        let initial = if metric.is_write_only() {
            DataVariant::placeholder(kind)
        } else {
            initial_value(meta, kind, metric.read())
        };
        self.add_value_node(
            meta,
            parent,
            kind,
            initial,
            Capability::Writable(Arc::clone(metric)),
            true,
        )
    }

    fn add_value_node(
        &self,
        meta: &MetaInfo,
        parent: &NodeIdentifier,
        kind: DataKind,
        initial: DataVariant,
        capability: Capability,
        writable: bool,
    ) -> Result<()> {
        let id = self.node_id(meta);
        // dispatch behavior must exist before the node becomes reachable
        self.registry.add(id.clone(), capability)?;

        let node = VariableNode {
            id: id.clone(),
            parent: parent.clone(),
            reference: ReferenceKind::HasComponent,
            name: meta.name.clone(),
            description: meta.description.clone(),
            value_type: TypeDescriptor::from_kind(kind),
            initial: WireValue::from(initial),
            readable: true,
            writable,
            historizing: self.historizer.is_some(),
        };
        if let Err(e) = self.space.add_variable_node(node) {
            self.registry.remove(&id);
            return Err(e);
        }

        if let Some(historizer) = &self.historizer
            && let Err(e) = historizer.register_node(self.space.as_ref(), &id, kind)
        {
            warn!(node = %id, error = %e, "historization could not be armed");
        }
        Ok(())
    }

    fn add_callable(
        &self,
        meta: &MetaInfo,
        callable: &Arc<dyn Callable>,
        parent: &NodeIdentifier,
    ) -> Result<()> {
        let id = self.node_id(meta);
        let inputs = callable
            .parameter_types()
            .iter()
            .map(|spec| ArgumentSpec {
                name: spec.kind.to_string(),
                value_type: TypeDescriptor::from_kind(spec.kind),
                description: if spec.mandatory {
                    format!("Mandatory {}", spec.kind)
                } else {
                    spec.kind.to_string()
                },
            })
            .collect();
        let output = callable.result_kind().map(|kind| ArgumentSpec {
            name: kind.to_string(),
            value_type: TypeDescriptor::from_kind(kind),
            description: kind.to_string(),
        });

        self.registry
            .add(id.clone(), Capability::Callable(Arc::clone(callable)))?;
        let node = MethodNode {
            id: id.clone(),
            parent: parent.clone(),
            reference: ReferenceKind::HasComponent,
            name: meta.name.clone(),
            description: meta.description.clone(),
            inputs,
            output,
        };
        if let Err(e) = self.space.add_method_node(node) {
            self.registry.remove(&id);
            return Err(e);
        }
        Ok(())
    }
}

fn initial_value(
    meta: &MetaInfo,
    kind: DataKind,
    read: ModelResult<DataVariant>,
) -> DataVariant {
    match read {
        Ok(value) if value.kind() == kind => value,
        Ok(value) => {
            warn!(
                element = %meta.id,
                expected = %kind,
                actual = %value.kind(),
                "initial value has the wrong kind; using placeholder"
            );
            DataVariant::placeholder(kind)
        }
        Err(e) => {
            warn!(element = %meta.id, error = %e, "initial read failed; using placeholder");
            DataVariant::placeholder(kind)
        }
    }
}
