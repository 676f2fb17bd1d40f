//! Graph Nodes
//!
//! This module defines the nodes owned by a [`Model`](super::Model) and the
//! input ports that connect a node to its parents.
//!
//! Nodes never hold references to each other. Every link, in either
//! direction, is a [`NodeId`] resolved through the owning model.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;

use crate::error::Result;
use crate::serialization::ModelSerializationContext;

/// Unique identifier for a node within a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Parent and dependent lists are almost always short.
pub type NodeList = SmallVec<[NodeId; 4]>;

/// Opaque per-node properties. The graph core stores and persists them but
/// never interprets them.
pub type Attributes = serde_json::Map<String, Value>;

/// A named connection point through which a node reads its parents' output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputPort {
    name: String,
    #[serde(default)]
    parents: NodeList,
}

impl InputPort {
    /// Create a port fed by the given parents, in order.
    pub fn new(name: impl Into<String>, parents: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            name: name.into(),
            parents: parents.into_iter().collect(),
        }
    }

    /// The port's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The nodes feeding this port, in declaration order.
    pub fn parents(&self) -> &[NodeId] {
        &self.parents
    }
}

/// A unit of computation in the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Unique identifier for this node.
    id: NodeId,

    /// Name of the node's type, e.g. `"BinaryOperation"`.
    kind: String,

    /// Ports feeding this node, in declaration order.
    input_ports: Vec<InputPort>,

    /// Nodes that read this node's output, in the order they were linked.
    dependents: NodeList,

    attributes: Attributes,
}

impl Node {
    pub(crate) fn new(
        id: NodeId,
        kind: String,
        input_ports: Vec<InputPort>,
        attributes: Attributes,
    ) -> Self {
        Self {
            id,
            kind,
            input_ports,
            dependents: NodeList::new(),
            attributes,
        }
    }

    /// Get the node's ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Get the node's kind.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Input ports in declaration order.
    pub fn input_ports(&self) -> &[InputPort] {
        &self.input_ports
    }

    /// Get all dependents.
    pub fn dependents(&self) -> &[NodeId] {
        &self.dependents
    }

    /// Opaque properties stored with the node.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Look up a single attribute.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Every parent across every input port, in port order.
    ///
    /// A parent feeding several ports is yielded once per port.
    pub fn parents(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.input_ports
            .iter()
            .flat_map(|port| port.parents().iter().copied())
    }

    /// Parents with repeats removed, first occurrence wins.
    pub(crate) fn distinct_parents(&self) -> NodeList {
        let mut parents = NodeList::new();
        for parent in self.parents() {
            if !parents.contains(&parent) {
                parents.push(parent);
            }
        }
        parents
    }

    /// True if no node consumes this node's output.
    pub fn is_sink(&self) -> bool {
        self.dependents.is_empty()
    }

    /// True if no port has a parent.
    pub fn is_source(&self) -> bool {
        self.parents().next().is_none()
    }

    pub(crate) fn add_dependent(&mut self, node_id: NodeId) {
        if !self.dependents.contains(&node_id) {
            self.dependents.push(node_id);
        }
    }

    /// Rewrite the persisted parent ids of every port into live ids.
    ///
    /// Called once per node after every node of a model description has been
    /// registered in `context`. Returns the distinct resolved parents.
    ///
    /// A node cannot reach its parents inside the model's arena, so adding
    /// this node to each parent's dependent list is done by the caller,
    /// `Model::link_nodes`, with the returned ids.
    pub fn register_dependencies(
        &mut self,
        context: &ModelSerializationContext,
    ) -> Result<NodeList> {
        let persisted_id = context.persisted_id(self.id).unwrap_or(self.id);
        for port in &mut self.input_ports {
            for parent in port.parents.iter_mut() {
                let persisted = *parent;
                *parent = context.resolve(persisted_id, persisted)?;
            }
        }
        Ok(self.distinct_parents())
    }
}

/// Describes a node to be added to a model.
#[derive(Debug, Clone)]
pub struct NodeBuilder {
    pub(crate) kind: String,
    pub(crate) input_ports: Vec<InputPort>,
    pub(crate) attributes: Attributes,
}

impl NodeBuilder {
    /// Start describing a node of the given kind, with no ports.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            input_ports: Vec::new(),
            attributes: Attributes::new(),
        }
    }

    /// Append an input port fed by `parents`.
    pub fn input(
        mut self,
        name: impl Into<String>,
        parents: impl IntoIterator<Item = NodeId>,
    ) -> Self {
        self.input_ports.push(InputPort::new(name, parents));
        self
    }

    /// Set an attribute, replacing any previous value.
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}
