//! In-process address space
//!
//! A minimal [`AddressSpace`] implementation backing the bundled binary and
//! the test suite: a node table with parent/child references, recursive
//! deletion and a monitored flag per variable. It deliberately implements
//! none of a protocol stack's session, subscription or encoding machinery.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::trace;

use super::{
    AddressSpace, MethodNode, MonitorRequest, NodeClass, NodeIdentifier, NodeReference,
    ObjectNode, VariableNode, WireValue,
};
use crate::{Error, Result};

#[derive(Debug)]
struct NodeEntry {
    class: NodeClass,
    parent: Option<NodeIdentifier>,
    children: Vec<NodeIdentifier>,
    name: String,
    value: Option<WireValue>,
    monitored: Option<MonitorRequest>,
}

/// In-memory address space rooted at a fixed objects folder
#[derive(Debug)]
pub struct InMemorySpace {
    nodes: RwLock<HashMap<NodeIdentifier, NodeEntry>>,
    root: NodeIdentifier,
}

impl Default for InMemorySpace {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySpace {
    #[must_use]
    pub fn new() -> Self {
        let root = NodeIdentifier::numeric(0, 85);
        let mut nodes = HashMap::new();
        nodes.insert(
            root.clone(),
            NodeEntry {
                class: NodeClass::Object,
                parent: None,
                children: Vec::new(),
                name: "Objects".into(),
                value: None,
                monitored: None,
            },
        );
        Self {
            nodes: RwLock::new(nodes),
            root,
        }
    }

    /// Total node count, including the root folder
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.read().unwrap().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a node exists
    #[must_use]
    pub fn contains(&self, id: &NodeIdentifier) -> bool {
        self.nodes.read().unwrap().contains_key(id)
    }

    /// Current value of a variable node, if any
    #[must_use]
    pub fn value(&self, id: &NodeIdentifier) -> Option<WireValue> {
        self.nodes.read().unwrap().get(id).and_then(|n| n.value.clone())
    }

    /// Display name of a node
    #[must_use]
    pub fn display_name(&self, id: &NodeIdentifier) -> Option<String> {
        self.nodes.read().unwrap().get(id).map(|n| n.name.clone())
    }

    /// Monitoring armed on a variable node, if any
    #[must_use]
    pub fn monitor(&self, id: &NodeIdentifier) -> Option<MonitorRequest> {
        self.nodes.read().unwrap().get(id).and_then(|n| n.monitored)
    }

    fn insert(
        &self,
        id: NodeIdentifier,
        parent: NodeIdentifier,
        class: NodeClass,
        name: String,
        value: Option<WireValue>,
    ) -> Result<()> {
        let mut nodes = self.nodes.write().unwrap();
        if nodes.contains_key(&id) {
            return Err(Error::AlreadyRegistered(id));
        }
        let Some(parent_entry) = nodes.get_mut(&parent) else {
            return Err(Error::NotFound(parent));
        };
        parent_entry.children.push(id.clone());
        trace!(node = %id, parent = %parent, "node created");
        nodes.insert(
            id,
            NodeEntry {
                class,
                parent: Some(parent),
                children: Vec::new(),
                name,
                value,
                monitored: None,
            },
        );
        Ok(())
    }

    fn remove_subtree(nodes: &mut HashMap<NodeIdentifier, NodeEntry>, id: &NodeIdentifier) {
        if let Some(entry) = nodes.remove(id) {
            for child in entry.children {
                Self::remove_subtree(nodes, &child);
            }
        }
    }
}

impl AddressSpace for InMemorySpace {
    fn objects_root(&self) -> NodeIdentifier {
        self.root.clone()
    }

    fn add_object_node(&self, node: ObjectNode) -> Result<()> {
        self.insert(node.id, node.parent, NodeClass::Object, node.name, None)
    }

    fn add_variable_node(&self, node: VariableNode) -> Result<()> {
        self.insert(
            node.id,
            node.parent,
            NodeClass::Variable,
            node.name,
            Some(node.initial),
        )
    }

    fn add_method_node(&self, node: MethodNode) -> Result<()> {
        self.insert(node.id, node.parent, NodeClass::Method, node.name, None)
    }

    fn browse(&self, id: &NodeIdentifier) -> Result<Vec<NodeReference>> {
        let nodes = self.nodes.read().unwrap();
        let entry = nodes.get(id).ok_or_else(|| Error::NotFound(id.clone()))?;
        Ok(entry
            .children
            .iter()
            .filter_map(|child| {
                nodes.get(child).map(|c| NodeReference {
                    id: child.clone(),
                    class: c.class,
                })
            })
            .collect())
    }

    fn delete_node(&self, id: &NodeIdentifier, recursive: bool) -> Result<()> {
        let mut nodes = self.nodes.write().unwrap();
        let entry = nodes.get(id).ok_or_else(|| Error::NotFound(id.clone()))?;
        if !recursive && !entry.children.is_empty() {
            return Err(Error::Internal(format!(
                "node {id} has children; non-recursive delete refused"
            )));
        }
        let parent = entry.parent.clone();
        if let Some(parent) = parent
            && let Some(parent_entry) = nodes.get_mut(&parent)
        {
            parent_entry.children.retain(|c| c != id);
        }
        Self::remove_subtree(&mut nodes, id);
        trace!(node = %id, "node deleted");
        Ok(())
    }

    fn monitor_value(&self, id: &NodeIdentifier, request: MonitorRequest) -> Result<()> {
        let mut nodes = self.nodes.write().unwrap();
        let entry = nodes.get_mut(id).ok_or_else(|| Error::NotFound(id.clone()))?;
        if entry.class != NodeClass::Variable {
            return Err(Error::Internal(format!(
                "node {id} is not a variable; cannot monitor"
            )));
        }
        entry.monitored = Some(request);
        Ok(())
    }
}
