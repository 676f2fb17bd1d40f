//! Model
//!
//! The model owns every node of one graph, indexed by id. Nodes are kept in
//! insertion order; that order is what full-graph traversal seeds from, so
//! traversal is reproducible across runs.
//!
//! # Restoring
//!
//! [`Model::restore`] rebuilds a model from a [`ModelDescription`] in two
//! explicit phases:
//!
//! 1. Register: every described node, taken in ascending persisted-id
//!    order, gets a fresh live id, the `persisted -> live` mapping is
//!    recorded in the active [`ModelSerializationContext`], and the node is
//!    staged with its ports still holding persisted ids.
//! 2. Link: every staged node rewrites its ports through the mapping and is
//!    added to the dependent list of each parent.
//!
//! The rebuilt graph is then checked for cycles. The model is only returned
//! once every step has succeeded, so a failed restore leaves nothing behind.

use std::collections::{HashMap, VecDeque};

use indexmap::IndexMap;
use tracing::{debug, trace};

use super::iterator::NodeIterator;
use super::node::{Node, NodeBuilder, NodeId};
use crate::error::{ModelError, Result};
use crate::serialization::{
    Format, ModelDescription, ModelScope, ModelSerializationContext, NodeDescription,
    SerializationContext,
};

/// A computational graph.
#[derive(Debug, Clone, Default)]
pub struct Model {
    /// All nodes in the graph, indexed by ID, in insertion order.
    nodes: IndexMap<NodeId, Node>,

    /// Next id to hand out.
    next_id: u64,
}

impl Model {
    /// Create a new empty model.
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> NodeId {
        let id = NodeId::from(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add a node to the graph.
    ///
    /// Every parent named by the builder's ports must already be part of the
    /// model, so a model built this way is acyclic by construction.
    pub fn add_node(&mut self, builder: NodeBuilder) -> Result<NodeId> {
        let NodeBuilder {
            kind,
            input_ports,
            attributes,
        } = builder;

        if let Some(missing) = input_ports
            .iter()
            .flat_map(|port| port.parents().iter())
            .find(|parent| !self.nodes.contains_key(*parent))
        {
            return Err(ModelError::UnknownNode(*missing));
        }

        let id = self.allocate_id();
        let node = Node::new(id, kind, input_ports, attributes);
        for parent in node.distinct_parents() {
            if let Some(parent_node) = self.nodes.get_mut(&parent) {
                parent_node.add_dependent(id);
            }
        }

        debug!(%id, kind = node.kind(), "added node");
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Get a reference to a node.
    pub fn get_node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// True if `node_id` names a node of this model.
    pub fn contains(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    /// Get the total number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// True if the model has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in insertion order. Use [`node_iterator`](Self::node_iterator)
    /// for dependency order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Node at position `index` in insertion order.
    pub(crate) fn node_at(&self, index: usize) -> Option<&Node> {
        self.nodes.get_index(index).map(|(_, node)| node)
    }

    /// Nodes whose output nobody reads, in insertion order.
    pub fn sinks(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(|node| node.is_sink())
    }

    /// Flattened parents of a node, or `None` if the node is unknown.
    pub fn parents_of(&self, node_id: NodeId) -> Option<Vec<&Node>> {
        let node = self.nodes.get(&node_id)?;
        Some(
            node.distinct_parents()
                .iter()
                .filter_map(|parent| self.nodes.get(parent))
                .collect(),
        )
    }

    /// Traverse the model in dependency order.
    ///
    /// With an empty `outputs` slice every node of the model is produced.
    /// Otherwise only `outputs` and their ancestors are.
    pub fn node_iterator(&self, outputs: &[NodeId]) -> Result<NodeIterator<'_>> {
        if let Some(missing) = outputs.iter().find(|id| !self.nodes.contains_key(*id)) {
            return Err(ModelError::UnknownNode(*missing));
        }
        Ok(NodeIterator::new(self, outputs))
    }

    /// Ids of the nodes needed to compute `outputs`, in dependency order.
    pub fn active_nodes(&self, outputs: &[NodeId]) -> Result<Vec<NodeId>> {
        Ok(self.node_iterator(outputs)?.map(Node::id).collect())
    }

    /// Describe the model for persistence.
    ///
    /// Nodes are listed in full-graph traversal order.
    pub fn describe(&self) -> ModelDescription {
        let nodes = NodeIterator::new(self, &[])
            .map(NodeDescription::from)
            .collect();
        ModelDescription { nodes }
    }

    /// Encode the model in the given format.
    pub fn save(&self, format: Format) -> Result<Vec<u8>> {
        self.describe().encode(format)
    }

    /// Decode and restore a model saved with [`save`](Self::save).
    pub fn load(bytes: &[u8], format: Format) -> Result<Self> {
        Self::restore(&ModelDescription::decode(bytes, format)?)
    }

    /// Rebuild a model from its description.
    pub fn restore(description: &ModelDescription) -> Result<Self> {
        let mut context = SerializationContext::new();
        Self::restore_in(description, &mut context)
    }

    /// Rebuild a model inside an existing serialization context.
    ///
    /// A fresh id-remapping frame is pushed for the duration of the call, so
    /// restorations nested inside another one stay isolated from it.
    pub fn restore_in(
        description: &ModelDescription,
        context: &mut SerializationContext,
    ) -> Result<Self> {
        debug!(nodes = description.len(), "restoring model");

        let mut scope = context.push_model_scope();
        let mut model = Model::new();
        model.register_nodes(description, &mut scope)?;
        model.link_nodes(scope.frame())?;
        model.check_acyclic()?;

        debug!(nodes = model.node_count(), "restored model");
        Ok(model)
    }

    /// Phase one of a restore: stage every node under a fresh id.
    ///
    /// Nodes are staged in ascending persisted-id order. Every model stores
    /// its nodes in ascending id order, so this reproduces the storage order,
    /// and with it the dependent lists and full-graph order, of the model the
    /// description was taken from.
    fn register_nodes(
        &mut self,
        description: &ModelDescription,
        scope: &mut ModelScope<'_>,
    ) -> Result<()> {
        let mut staged: Vec<&NodeDescription> = description.nodes.iter().collect();
        staged.sort_by_key(|described| described.id);

        for described in staged {
            if let Some(registry) = scope.registry() {
                if !registry.contains(&described.kind) {
                    return Err(ModelError::UnknownNodeKind(described.kind.clone()));
                }
            }

            let id = self.allocate_id();
            scope.register(described.id, id)?;
            trace!(persisted = %described.id, live = %id, "registered node");

            let node = Node::new(
                id,
                described.kind.clone(),
                described.inputs.clone(),
                described.attributes.clone(),
            );
            self.nodes.insert(id, node);
        }
        Ok(())
    }

    /// Phase two of a restore: resolve persisted parent ids into links and
    /// add each node to its parents' dependent lists.
    fn link_nodes(&mut self, frame: &ModelSerializationContext) -> Result<()> {
        for index in 0..self.nodes.len() {
            let Some((&id, node)) = self.nodes.get_index_mut(index) else {
                continue;
            };
            let parents = node.register_dependencies(frame)?;

            for parent in parents {
                self.nodes
                    .get_mut(&parent)
                    .ok_or(ModelError::UnknownNode(parent))?
                    .add_dependent(id);
            }
        }
        Ok(())
    }

    /// Verify that parent links form a DAG.
    ///
    /// Kahn's algorithm: if some nodes never reach in-degree zero, they sit
    /// on or behind a cycle.
    fn check_acyclic(&self) -> Result<()> {
        let mut in_degree: HashMap<NodeId, usize> = HashMap::with_capacity(self.nodes.len());
        let mut queue = VecDeque::new();

        for (&node_id, node) in &self.nodes {
            let degree = node.distinct_parents().len();
            in_degree.insert(node_id, degree);
            if degree == 0 {
                queue.push_back(node_id);
            }
        }

        let mut ordered = 0;
        while let Some(node_id) = queue.pop_front() {
            ordered += 1;

            if let Some(node) = self.nodes.get(&node_id) {
                for dependent_id in node.dependents() {
                    if let Some(degree) = in_degree.get_mut(dependent_id) {
                        *degree = degree.saturating_sub(1);
                        if *degree == 0 {
                            queue.push_back(*dependent_id);
                        }
                    }
                }
            }
        }

        if ordered < self.nodes.len() {
            return Err(ModelError::CyclicGraph {
                remaining: self.nodes.len() - ordered,
            });
        }
        Ok(())
    }
}
