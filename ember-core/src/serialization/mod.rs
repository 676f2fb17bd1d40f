//! Model Persistence
//!
//! A model is persisted as a [`ModelDescription`]: a flat list of node
//! descriptions in dependency order, with every cross-node link stored as a
//! node id. serde provides the object model; JSON (`serde_json`) and
//! MessagePack (`rmp-serde`) provide the bytes.
//!
//! Restoring a description goes through a [`SerializationContext`], which
//! keeps one [`ModelSerializationContext`] frame per model being restored.

mod context;
mod description;
mod registry;

pub use context::{ModelScope, ModelSerializationContext, SerializationContext};
pub use description::{Format, ModelDescription, NodeDescription};
pub use registry::NodeKindRegistry;
