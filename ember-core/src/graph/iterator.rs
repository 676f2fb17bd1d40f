//! Dependency-Ordered Traversal
//!
//! [`NodeIterator`] walks a [`Model`] lazily and never produces a node before
//! every parent of every one of its input ports.
//!
//! # Algorithm
//!
//! The iterator keeps an explicit LIFO work stack and a visited set:
//!
//! 1. Peek the top of the stack. If it was already visited, pop it. The same
//!    node may be pushed several times; duplicates are dropped here.
//! 2. If all of its parents have been visited, pop it, mark it visited and
//!    produce it. In full-graph mode its dependents are pushed as well, which
//!    is what pulls in nodes that are not ancestors of the seed.
//! 3. Otherwise push its unvisited parents and go back to 1.
//!
//! Parents and dependents are pushed in reverse declaration order, so the
//! earliest-declared one is handled first and the produced order stays close
//! to the order the graph was built in.
//!
//! In full-graph mode the stack is seeded with the sink reached by following
//! first dependents from the first node in storage order. When the stack
//! drains, the next unvisited node in storage order seeds it again, so models
//! made of several disconnected pieces are still produced in full.
//!
//! The graph must be acyclic. Models built with
//! [`Model::add_node`](super::Model::add_node) or restored with
//! [`Model::restore`](super::Model::restore) always are.

use std::collections::HashSet;
use std::iter::FusedIterator;

use tracing::trace;

use super::model::Model;
use super::node::{Node, NodeId};

/// Lazy, single-pass traversal of a model in dependency order.
///
/// Created by [`Model::node_iterator`]. The iterator borrows the model, so
/// the model cannot change while a traversal is in progress.
pub struct NodeIterator<'a> {
    model: &'a Model,

    /// Work list. May hold several copies of the same node.
    stack: Vec<NodeId>,

    /// Nodes already produced.
    visited: HashSet<NodeId>,

    /// Whether dependents are expanded and the whole model is covered.
    visit_full_model: bool,

    /// Storage position from which the next reseed scans.
    cursor: usize,
}

impl<'a> NodeIterator<'a> {
    pub(crate) fn new(model: &'a Model, outputs: &[NodeId]) -> Self {
        let mut iter = Self {
            model,
            stack: Vec::new(),
            visited: HashSet::with_capacity(model.node_count()),
            visit_full_model: false,
            cursor: 0,
        };

        if model.is_empty() {
            return iter;
        }

        // Start with output nodes in the stack
        iter.stack.extend_from_slice(outputs);

        if iter.stack.is_empty() {
            iter.visit_full_model = true;
            iter.reseed();
        }

        iter
    }

    /// True if this iterator covers the whole model.
    pub fn is_full_graph(&self) -> bool {
        self.visit_full_model
    }

    /// Push a sink reached from the first unvisited node in storage order.
    ///
    /// Returns `false` once every node has been visited.
    fn reseed(&mut self) -> bool {
        let model = self.model;
        while let Some(node) = model.node_at(self.cursor) {
            if self.visited.contains(&node.id()) {
                self.cursor += 1;
                continue;
            }

            let sink = Self::follow_to_sink(model, node);
            trace!(start = %node.id(), %sink, "seeded full-graph traversal");
            self.stack.push(sink);
            return true;
        }
        false
    }

    /// Follow first dependents until reaching a node nobody depends on.
    fn follow_to_sink<'m>(model: &'m Model, mut node: &'m Node) -> NodeId {
        while let Some(next) = node
            .dependents()
            .first()
            .and_then(|id| model.get_node(*id))
        {
            node = next;
        }
        node.id()
    }

    fn can_visit(&self, node: &Node) -> bool {
        node.parents().all(|parent| self.visited.contains(&parent))
    }

    fn advance(&mut self) -> Option<&'a Node> {
        let model = self.model;
        loop {
            let Some(&top) = self.stack.last() else {
                if self.visit_full_model && self.reseed() {
                    continue;
                }
                return None;
            };

            if self.visited.contains(&top) {
                self.stack.pop();
                continue;
            }

            let Some(node) = model.get_node(top) else {
                self.stack.pop();
                continue;
            };

            if self.can_visit(node) {
                self.stack.pop();
                self.visited.insert(top);

                // The only difference between the two modes.
                if self.visit_full_model {
                    self.stack.extend(node.dependents().iter().rev().copied());
                }
                return Some(node);
            }

            for port in node.input_ports().iter().rev() {
                for parent in port.parents().iter().rev() {
                    if !self.visited.contains(parent) {
                        self.stack.push(*parent);
                    }
                }
            }
        }
    }
}

impl<'a> Iterator for NodeIterator<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        self.advance()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.model.node_count() - self.visited.len();
        if self.visit_full_model {
            (remaining, Some(remaining))
        } else {
            (0, Some(remaining))
        }
    }
}

impl FusedIterator for NodeIterator<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeBuilder;

    fn diamond() -> (Model, [NodeId; 4]) {
        let mut model = Model::new();
        let a = model.add_node(NodeBuilder::new("Input")).unwrap();
        let b = model.add_node(NodeBuilder::new("Scale").input("input", [a])).unwrap();
        let c = model.add_node(NodeBuilder::new("Offset").input("input", [a])).unwrap();
        let d = model
            .add_node(NodeBuilder::new("Sum").input("lhs", [b]).input("rhs", [c]))
            .unwrap();
        (model, [a, b, c, d])
    }

    fn ids(iter: NodeIterator<'_>) -> Vec<NodeId> {
        iter.map(Node::id).collect()
    }

    #[test]
    fn empty_model_produces_nothing() {
        let model = Model::new();
        let mut iter = model.node_iterator(&[]).unwrap();
        assert!(iter.next().is_none());
        assert!(iter.next().is_none());
    }

    #[test]
    fn full_graph_diamond_order() {
        let (model, [a, b, c, d]) = diamond();
        let iter = model.node_iterator(&[]).unwrap();
        assert!(iter.is_full_graph());
        assert_eq!(ids(iter), vec![a, b, c, d]);
    }

    #[test]
    fn active_subgraph_excludes_non_ancestors() {
        let (model, [a, b, _, _]) = diamond();
        let iter = model.node_iterator(&[b]).unwrap();
        assert!(!iter.is_full_graph());
        assert_eq!(ids(iter), vec![a, b]);
    }

    #[test]
    fn active_subgraph_of_sink_is_everything() {
        let (model, [a, b, c, d]) = diamond();
        assert_eq!(ids(model.node_iterator(&[d]).unwrap()), vec![a, b, c, d]);
    }

    #[test]
    fn full_graph_reaches_nodes_off_the_seed_chain() {
        // input -> scale -> sum -> threshold, plus input -> logger
        let mut model = Model::new();
        let input = model.add_node(NodeBuilder::new("Input")).unwrap();
        let scale = model.add_node(NodeBuilder::new("Scale").input("input", [input])).unwrap();
        let offset = model.add_node(NodeBuilder::new("Offset").input("input", [input])).unwrap();
        let sum = model
            .add_node(NodeBuilder::new("Sum").input("in", [scale, offset]))
            .unwrap();
        let threshold = model.add_node(NodeBuilder::new("Threshold").input("input", [sum])).unwrap();
        let logger = model.add_node(NodeBuilder::new("Logger").input("input", [input])).unwrap();

        assert_eq!(
            ids(model.node_iterator(&[]).unwrap()),
            vec![input, scale, offset, sum, threshold, logger]
        );
    }

    #[test]
    fn full_graph_covers_disconnected_components() {
        let mut model = Model::new();
        let a = model.add_node(NodeBuilder::new("Input")).unwrap();
        let b = model.add_node(NodeBuilder::new("Scale").input("input", [a])).unwrap();
        let c = model.add_node(NodeBuilder::new("Input")).unwrap();
        let d = model.add_node(NodeBuilder::new("Offset").input("input", [c])).unwrap();
        let e = model.add_node(NodeBuilder::new("Constant")).unwrap();

        assert_eq!(ids(model.node_iterator(&[]).unwrap()), vec![a, b, c, d, e]);
    }

    #[test]
    fn duplicate_outputs_are_produced_once() {
        let (model, [a, b, c, _]) = diamond();
        // The last requested output sits on top of the stack.
        assert_eq!(ids(model.node_iterator(&[c, b, c]).unwrap()), vec![a, c, b]);
    }

    #[test]
    fn shared_parent_across_ports_is_produced_once() {
        let mut model = Model::new();
        let x = model.add_node(NodeBuilder::new("Input")).unwrap();
        let square = model
            .add_node(NodeBuilder::new("Multiply").input("lhs", [x]).input("rhs", [x]))
            .unwrap();

        assert_eq!(model.get_node(x).unwrap().dependents(), &[square]);
        assert_eq!(ids(model.node_iterator(&[]).unwrap()), vec![x, square]);
    }

    #[test]
    fn iterator_is_fused_and_sized() {
        let (model, _) = diamond();
        let mut iter = model.node_iterator(&[]).unwrap();
        assert_eq!(iter.size_hint(), (4, Some(4)));
        assert_eq!(iter.by_ref().count(), 4);
        assert!(iter.next().is_none());
        assert_eq!(iter.size_hint(), (0, Some(0)));
    }
}
