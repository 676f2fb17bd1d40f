//! Ember Core
//!
//! This crate provides the computational graph at the heart of the Ember
//! embedded machine-learning runtime. It implements:
//!
//! - An id-indexed model that owns every node of a graph
//! - Dependency-ordered traversal of the whole model or of the subgraph
//!   needed for a set of outputs
//! - Persistence of a model as a flat, id-linked description, and its
//!   two-phase reconstruction
//!
//! Node kernels and graph execution live outside this crate; here a node is
//! a kind name, a set of input ports and an opaque attribute map.
//!
//! # Architecture
//!
//! - `graph`: nodes, ports, the model and its traversal
//! - `serialization`: model descriptions, encodings and the id-remapping
//!   context used while restoring
//! - `error`: the crate-wide error type
//!
//! # Example
//!
//! ```rust
//! use ember_core::graph::{Model, NodeBuilder};
//! use ember_core::serialization::Format;
//!
//! let mut model = Model::new();
//! let x = model.add_node(NodeBuilder::new("Input")).unwrap();
//! let scaled = model
//!     .add_node(NodeBuilder::new("Scale").input("input", [x]).attribute("factor", 2.0))
//!     .unwrap();
//!
//! // Parents always come first
//! let order: Vec<_> = model.node_iterator(&[]).unwrap().map(|n| n.id()).collect();
//! assert_eq!(order, vec![x, scaled]);
//!
//! // Round trip through JSON
//! let bytes = model.save(Format::Json).unwrap();
//! let restored = ember_core::graph::Model::load(&bytes, Format::Json).unwrap();
//! assert_eq!(restored.node_count(), 2);
//! ```

pub mod error;
pub mod graph;
pub mod serialization;

pub use error::{ModelError, Result};
pub use graph::{Model, Node, NodeBuilder, NodeId, NodeIterator};
