//! Computational Graph
//!
//! This module implements the model: a directed acyclic graph whose nodes
//! are units of computation and whose edges are data dependencies declared
//! through input ports.
//!
//! # Overview
//!
//! - Nodes are owned by the [`Model`] and indexed by [`NodeId`]
//! - A node lists its parents per input port; each parent lists the node
//!   among its dependents
//! - [`NodeIterator`] produces nodes so that parents always come first
//!
//! # Design Decisions
//!
//! 1. Nodes live in an id-indexed arena rather than pointing at each other:
//!    - links can never dangle
//!    - the persisted form already refers to nodes by id
//!
//! 2. The arena is insertion ordered, which makes full-graph traversal and
//!    therefore the persisted node order reproducible.
//!
//! 3. Both forward (parents) and reverse (dependents) links are stored so
//!    traversal can move in either direction.

mod iterator;
mod model;
mod node;

pub use iterator::NodeIterator;
pub use model::Model;
pub use node::{Attributes, InputPort, Node, NodeBuilder, NodeId, NodeList};
