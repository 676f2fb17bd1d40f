//! Error Types
//!
//! Every fallible operation in this crate returns [`Result`]. Looking a node
//! up by id is *not* fallible: a missing id is reported as `None`.

use thiserror::Error;

use crate::graph::NodeId;

/// Errors produced while building, restoring or encoding a model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// An id handed to the model does not name one of its nodes.
    #[error("node {0} is not part of the model")]
    UnknownNode(NodeId),

    /// The same persisted id was registered twice while restoring a model.
    #[error("node {0} appears more than once in the model description")]
    DuplicateNode(NodeId),

    /// A persisted parent id does not resolve to any node of the description.
    #[error("node {node} references parent {parent}, which was never registered")]
    DanglingReference {
        /// Persisted id of the node holding the reference.
        node: NodeId,
        /// The unresolved parent id.
        parent: NodeId,
    },

    /// The restored links do not form a DAG.
    #[error("model description contains a dependency cycle ({remaining} nodes unordered)")]
    CyclicGraph {
        /// Number of nodes that could not be placed in dependency order.
        remaining: usize,
    },

    /// A described node has a kind the active registry does not know.
    #[error("unknown node kind `{0}`")]
    UnknownNodeKind(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("MessagePack encode error: {0}")]
    MessagePackEncode(#[from] rmp_serde::encode::Error),

    #[error("MessagePack decode error: {0}")]
    MessagePackDecode(#[from] rmp_serde::decode::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ModelError>;
