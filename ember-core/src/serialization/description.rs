//! Persisted Model Description
//!
//! The structural form a model is saved in. A description has exactly one
//! field, `nodes`, listing every node in the full-graph dependency order the
//! model produced at save time. Nodes refer to their parents only by the id
//! they had when the description was written.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::graph::{Attributes, InputPort, Node, NodeId};

/// One persisted node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescription {
    /// Id of the node when it was saved.
    pub id: NodeId,
    /// Node type name
    pub kind: String,
    /// Input ports, with parents given as persisted ids
    #[serde(default)]
    pub inputs: Vec<InputPort>,
    #[serde(default)]
    pub attributes: Attributes,
}

impl From<&Node> for NodeDescription {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id(),
            kind: node.kind().to_string(),
            inputs: node.input_ports().to_vec(),
            attributes: node.attributes().clone(),
        }
    }
}

/// Complete persisted model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDescription {
    /// Nodes in dependency order
    pub nodes: Vec<NodeDescription>,
}

impl ModelDescription {
    /// Parse a description from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode a MessagePack description.
    pub fn from_msgpack(bytes: &[u8]) -> Result<Self> {
        Ok(rmp_serde::from_slice(bytes)?)
    }

    /// Encode as MessagePack. Structs are written as maps so that optional
    /// fields may be omitted by other writers.
    pub fn to_msgpack(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    pub fn encode(&self, format: Format) -> Result<Vec<u8>> {
        match format {
            Format::Json => Ok(self.to_json()?.into_bytes()),
            Format::MessagePack => self.to_msgpack(),
        }
    }

    pub fn decode(bytes: &[u8], format: Format) -> Result<Self> {
        match format {
            Format::Json => Ok(serde_json::from_slice(bytes)?),
            Format::MessagePack => Self::from_msgpack(bytes),
        }
    }

    /// Get the number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Physical encoding of a [`ModelDescription`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Json,
    #[serde(rename = "msgpack")]
    MessagePack,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => f.write_str("json"),
            Format::MessagePack => f.write_str("msgpack"),
        }
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "msgpack" | "messagepack" => Ok(Format::MessagePack),
            other => Err(format!("unknown model format `{other}`")),
        }
    }
}
