//! Request/reply catalog between the shell and the registry.
//!
//! Every [`Request`] has a fixed set of acceptable [`Reply`] shapes: exactly
//! one success shape and zero or more named failures. Callers match on the
//! reply and treat anything else as a protocol error.

use std::collections::BTreeSet;

use claw_probe::{ActorId, ActorRef, NodeData, NodeId, NodeInfo, RamUsage, WorkLoad};
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Requests sent from the shell to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Handshake naming the shell's transport peer.
    Init {
        /// Peer address, `host:port`.
        peer: String,
    },
    /// Snapshot of all known nodes.
    ListNodes,
    /// Whether a node is known.
    HasNode {
        /// Node to check.
        node: NodeId,
    },
    /// Static info of a node.
    GetNodeInfo {
        /// Node to query.
        node: NodeId,
    },
    /// Latest load sample of a node.
    GetWorkLoad {
        /// Node to query.
        node: NodeId,
    },
    /// Latest memory sample of a node.
    GetRamUsage {
        /// Node to query.
        node: NodeId,
    },
    /// Direct routes of a node.
    GetRoutes {
        /// Node to query.
        node: NodeId,
    },
    /// Nodes running on a host.
    NodesOnHost {
        /// Exact host name.
        hostname: String,
    },
    /// Resolve an actor ID to a live handle.
    GetActorHandle {
        /// Hosting node.
        node: NodeId,
        /// Actor on that node.
        actor: ActorId,
    },
    /// Textual listing of the actors on a node.
    ListActorsOnNode {
        /// Node to query.
        node: NodeId,
    },
    /// Navigate to a node.
    ChangeNode {
        /// Target node.
        node: NodeId,
    },
    /// Current node.
    WhereAmI,
    /// Everything known about the current node.
    CurrentNodeData,
    /// Return to global mode.
    LeaveNode,
    /// Step back in the visited history.
    Back,
}

impl Request {
    /// Short request name, for logging and error messages.
    #[must_use]
    pub const fn request_type(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::ListNodes => "list_nodes",
            Self::HasNode { .. } => "has_node",
            Self::GetNodeInfo { .. } => "get_node_info",
            Self::GetWorkLoad { .. } => "get_work_load",
            Self::GetRamUsage { .. } => "get_ram_usage",
            Self::GetRoutes { .. } => "get_routes",
            Self::NodesOnHost { .. } => "nodes_on_host",
            Self::GetActorHandle { .. } => "get_actor_handle",
            Self::ListActorsOnNode { .. } => "list_actors_on_node",
            Self::ChangeNode { .. } => "change_node",
            Self::WhereAmI => "where_am_i",
            Self::CurrentNodeData => "current_node_data",
            Self::LeaveNode => "leave_node",
            Self::Back => "back",
        }
    }

    /// Whether `reply` is one of the shapes this request may produce.
    #[must_use]
    pub const fn accepts(&self, reply: &Reply) -> bool {
        matches!(
            (self, reply),
            (Self::Init { .. }, Reply::InitDone)
                | (Self::ListNodes, Reply::Nodes { .. })
                | (Self::HasNode { .. }, Reply::HasNode { .. })
                | (
                    Self::GetNodeInfo { .. },
                    Reply::NodeInfo { .. } | Reply::NoNodeInfo
                )
                | (
                    Self::GetWorkLoad { .. },
                    Reply::WorkLoad { .. } | Reply::NoWorkLoad
                )
                | (
                    Self::GetRamUsage { .. },
                    Reply::RamUsage { .. } | Reply::NoRamUsage
                )
                | (Self::GetRoutes { .. }, Reply::Routes { .. })
                | (Self::NodesOnHost { .. }, Reply::NodesOnHost { .. })
                | (
                    Self::GetActorHandle { .. },
                    Reply::ActorHandle { .. } | Reply::InvalidActor
                )
                | (Self::ListActorsOnNode { .. }, Reply::Actors { .. })
                | (
                    Self::ChangeNode { .. },
                    Reply::NodeChanged { .. } | Reply::ChangeFailed { .. }
                )
                | (
                    Self::WhereAmI,
                    Reply::Location { .. } | Reply::WhereAmIFailed { .. }
                )
                | (
                    Self::CurrentNodeData,
                    Reply::CurrentNode { .. } | Reply::CurrentNodeFailed { .. }
                )
                | (Self::LeaveNode, Reply::LeftNode)
                | (Self::Back, Reply::BackLeave | Reply::BackContinue { .. })
        )
    }
}

/// Replies sent from the registry to the shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reply {
    /// Handshake accepted.
    InitDone,
    /// All known nodes in ascending ID order.
    Nodes {
        /// Node entries.
        nodes: Vec<NodeData>,
    },
    /// Answer to [`Request::HasNode`].
    HasNode {
        /// Whether the node is known.
        known: bool,
    },
    /// Static info of a node.
    NodeInfo {
        /// The info.
        info: NodeInfo,
    },
    /// The node is unknown.
    NoNodeInfo,
    /// Latest load sample.
    WorkLoad {
        /// The sample.
        work_load: WorkLoad,
    },
    /// No load sample is available.
    NoWorkLoad,
    /// Latest memory sample.
    RamUsage {
        /// The sample.
        ram_usage: RamUsage,
    },
    /// No memory sample is available.
    NoRamUsage,
    /// Direct routes of a node.
    Routes {
        /// Connected nodes.
        routes: BTreeSet<NodeId>,
    },
    /// Nodes running on a host.
    NodesOnHost {
        /// Matching nodes, ascending.
        nodes: Vec<NodeId>,
    },
    /// Resolved actor handle.
    ActorHandle {
        /// The handle.
        actor: ActorRef,
    },
    /// The actor is unknown.
    InvalidActor,
    /// Actor listing, one `<id> <name>` line per actor.
    Actors {
        /// The listing.
        listing: String,
    },
    /// Navigation succeeded.
    NodeChanged {
        /// New current node.
        node: NodeId,
    },
    /// Navigation failed.
    ChangeFailed {
        /// Why.
        error: RegistryError,
    },
    /// Current node.
    Location {
        /// The node.
        node: NodeId,
    },
    /// No current node.
    WhereAmIFailed {
        /// Why.
        error: RegistryError,
    },
    /// Everything known about the current node.
    CurrentNode {
        /// The entry.
        data: NodeData,
    },
    /// No current node data.
    CurrentNodeFailed {
        /// Why.
        error: RegistryError,
    },
    /// History cleared.
    LeftNode,
    /// History exhausted; return to global mode.
    BackLeave,
    /// Stepped back to a previous node.
    BackContinue {
        /// New current node.
        node: NodeId,
    },
}
