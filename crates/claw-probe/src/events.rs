//! Telemetry pushes from the monitored fleet.

use serde::{Deserialize, Serialize};

use crate::error::ProbeError;
use crate::types::{ActorId, NodeId, NodeInfo, RamUsage, WorkLoad};

/// An asynchronous telemetry push, independent of any shell query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProbeEvent {
    /// A node announced itself.
    NodeInfo(NodeInfo),
    /// New load sample.
    WorkLoad(WorkLoad),
    /// New memory sample.
    RamUsage(RamUsage),
    /// A direct connection between two nodes came up.
    NewRoute {
        /// Node that reported the route.
        from: NodeId,
        /// Node it is connected to.
        to: NodeId,
    },
    /// An actor was spawned on a node.
    ActorSpawned {
        /// Hosting node.
        node: NodeId,
        /// Actor ID on that node.
        actor: ActorId,
        /// Human-readable actor name.
        name: String,
    },
    /// An actor on a node terminated.
    ActorExited {
        /// Hosting node.
        node: NodeId,
        /// Actor ID on that node.
        actor: ActorId,
    },
}

impl ProbeEvent {
    /// Node the event is about.
    #[must_use]
    pub fn node_id(&self) -> NodeId {
        match self {
            Self::NodeInfo(ni) => ni.node_id,
            Self::WorkLoad(wl) => wl.node_id,
            Self::RamUsage(ru) => ru.node_id,
            Self::NewRoute { from, .. } => *from,
            Self::ActorSpawned { node, .. } | Self::ActorExited { node, .. } => *node,
        }
    }

    /// Short event kind, for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NodeInfo(_) => "node_info",
            Self::WorkLoad(_) => "work_load",
            Self::RamUsage(_) => "ram_usage",
            Self::NewRoute { .. } => "new_route",
            Self::ActorSpawned { .. } => "actor_spawned",
            Self::ActorExited { .. } => "actor_exited",
        }
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ProbeError> {
        serde_json::to_string(self).map_err(|e| ProbeError::Encoding(e.to_string()))
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> Result<Self, ProbeError> {
        serde_json::from_str(json).map_err(|e| ProbeError::Decoding(e.to_string()))
    }

    /// Decode a JSON-lines stream of events.
    ///
    /// Blank lines and lines starting with `#` are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first line that fails to decode.
    pub fn from_json_lines(input: &str) -> Result<Vec<Self>, ProbeError> {
        input
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
            .map(|(lineno, line)| {
                serde_json::from_str(line)
                    .map_err(|e| ProbeError::Decoding(format!("line {lineno}: {e}")))
            })
            .collect()
    }
}
