//! Blocking query client for the node registry.
//!
//! Each call sends one request and blocks until its reply arrives. Replies
//! are matched against the shapes the request allows; anything else is a
//! [`ShellError::Protocol`] error rather than a hang or a panic.

use std::collections::BTreeSet;

use claw_probe::{ActorId, ActorRef, NodeData, NodeId, NodeInfo, ProbeEvent, RamUsage, WorkLoad};
use claw_registry::{Back, RegistryHandle, Reply, Request};
use tracing::{debug, trace};

use crate::error::ShellError;

/// Something that carries requests to the registry.
pub trait Transport {
    /// Send a request and block until the reply arrives.
    fn call(&mut self, request: Request) -> Result<Reply, ShellError>;

    /// Forward a telemetry push.
    fn push(&mut self, event: ProbeEvent) -> Result<(), ShellError>;

    /// Tell the registry's peer that the shell is going away.
    fn shutdown(&mut self) -> Result<(), ShellError>;
}

/// Transport to a [`claw_registry::RegistryService`] running on a tokio
/// runtime. Must be used from a thread outside that runtime.
#[derive(Debug, Clone)]
pub struct RegistryTransport {
    handle: RegistryHandle,
}

impl RegistryTransport {
    /// Wrap a registry handle.
    #[must_use]
    pub const fn new(handle: RegistryHandle) -> Self {
        Self { handle }
    }
}

impl Transport for RegistryTransport {
    fn call(&mut self, request: Request) -> Result<Reply, ShellError> {
        Ok(self.handle.blocking_request(request)?)
    }

    fn push(&mut self, event: ProbeEvent) -> Result<(), ShellError> {
        Ok(self.handle.blocking_push(event)?)
    }

    fn shutdown(&mut self) -> Result<(), ShellError> {
        Ok(self.handle.blocking_shutdown()?)
    }
}

/// Typed, blocking view of the registry.
pub struct QueryClient {
    transport: Box<dyn Transport>,
    peer: String,
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("peer", &self.peer)
            .finish_non_exhaustive()
    }
}

impl QueryClient {
    /// Hand-shake with the registry on behalf of `peer`.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be reached or answers the
    /// handshake with anything but `InitDone`.
    pub fn connect(transport: Box<dyn Transport>, peer: &str) -> Result<Self, ShellError> {
        let mut client = Self {
            transport,
            peer: peer.to_string(),
        };

        debug!(peer, "initiating handshake");
        match client.send_request(Request::Init {
            peer: peer.to_string(),
        })? {
            Reply::InitDone => {
                debug!(peer, "handshake complete");
                Ok(client)
            }
            other => Err(unexpected("init", &other)),
        }
    }

    /// Peer named in the handshake.
    #[must_use]
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Send a request and check the reply shape.
    fn send_request(&mut self, request: Request) -> Result<Reply, ShellError> {
        let request_type = request.request_type();
        trace!(request_type, "sending request");
        let reply = self.transport.call(request.clone())?;
        if !request.accepts(&reply) {
            return Err(unexpected(request_type, &reply));
        }
        trace!(request_type, "received reply");
        Ok(reply)
    }

    /// Forward a telemetry push to the registry.
    pub fn push(&mut self, event: ProbeEvent) -> Result<(), ShellError> {
        self.transport.push(event)
    }

    /// Tell the registry the shell is going away.
    pub fn shutdown(&mut self) -> Result<(), ShellError> {
        self.transport.shutdown()
    }

    // ========================================================================
    // Node Queries
    // ========================================================================

    /// All known nodes in ascending ID order.
    pub fn list_nodes(&mut self) -> Result<Vec<NodeData>, ShellError> {
        match self.send_request(Request::ListNodes)? {
            Reply::Nodes { nodes } => Ok(nodes),
            other => Err(unexpected("list_nodes", &other)),
        }
    }

    /// Whether a node is known.
    pub fn has_node(&mut self, node: NodeId) -> Result<bool, ShellError> {
        match self.send_request(Request::HasNode { node })? {
            Reply::HasNode { known } => Ok(known),
            other => Err(unexpected("has_node", &other)),
        }
    }

    /// Static info of a node, `None` if unknown.
    pub fn node_info(&mut self, node: NodeId) -> Result<Option<NodeInfo>, ShellError> {
        match self.send_request(Request::GetNodeInfo { node })? {
            Reply::NodeInfo { info } => Ok(Some(info)),
            Reply::NoNodeInfo => Ok(None),
            other => Err(unexpected("get_node_info", &other)),
        }
    }

    /// Latest load sample, `None` if none was reported.
    pub fn work_load(&mut self, node: NodeId) -> Result<Option<WorkLoad>, ShellError> {
        match self.send_request(Request::GetWorkLoad { node })? {
            Reply::WorkLoad { work_load } => Ok(Some(work_load)),
            Reply::NoWorkLoad => Ok(None),
            other => Err(unexpected("get_work_load", &other)),
        }
    }

    /// Latest memory sample, `None` if none was reported.
    pub fn ram_usage(&mut self, node: NodeId) -> Result<Option<RamUsage>, ShellError> {
        match self.send_request(Request::GetRamUsage { node })? {
            Reply::RamUsage { ram_usage } => Ok(Some(ram_usage)),
            Reply::NoRamUsage => Ok(None),
            other => Err(unexpected("get_ram_usage", &other)),
        }
    }

    /// Direct routes of a node.
    pub fn routes(&mut self, node: NodeId) -> Result<BTreeSet<NodeId>, ShellError> {
        match self.send_request(Request::GetRoutes { node })? {
            Reply::Routes { routes } => Ok(routes),
            other => Err(unexpected("get_routes", &other)),
        }
    }

    /// Nodes running on `hostname`.
    pub fn nodes_on_host(&mut self, hostname: &str) -> Result<Vec<NodeId>, ShellError> {
        let request = Request::NodesOnHost {
            hostname: hostname.to_string(),
        };
        match self.send_request(request)? {
            Reply::NodesOnHost { nodes } => Ok(nodes),
            other => Err(unexpected("nodes_on_host", &other)),
        }
    }

    /// Handle of a live actor, `None` if unknown.
    pub fn actor_handle(
        &mut self,
        node: NodeId,
        actor: ActorId,
    ) -> Result<Option<ActorRef>, ShellError> {
        match self.send_request(Request::GetActorHandle { node, actor })? {
            Reply::ActorHandle { actor } => Ok(Some(actor)),
            Reply::InvalidActor => Ok(None),
            other => Err(unexpected("get_actor_handle", &other)),
        }
    }

    /// One `<id> <name>` line per known actor on a node.
    pub fn list_actors(&mut self, node: NodeId) -> Result<String, ShellError> {
        match self.send_request(Request::ListActorsOnNode { node })? {
            Reply::Actors { listing } => Ok(listing),
            other => Err(unexpected("list_actors_on_node", &other)),
        }
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Make `node` the current node.
    pub fn change_node(&mut self, node: NodeId) -> Result<NodeId, ShellError> {
        match self.send_request(Request::ChangeNode { node })? {
            Reply::NodeChanged { node } => Ok(node),
            Reply::ChangeFailed { error } => Err(error.into()),
            other => Err(unexpected("change_node", &other)),
        }
    }

    /// The current node.
    pub fn where_am_i(&mut self) -> Result<NodeId, ShellError> {
        match self.send_request(Request::WhereAmI)? {
            Reply::Location { node } => Ok(node),
            Reply::WhereAmIFailed { error } => Err(error.into()),
            other => Err(unexpected("where_am_i", &other)),
        }
    }

    /// Everything known about the current node.
    pub fn current_node_data(&mut self) -> Result<NodeData, ShellError> {
        match self.send_request(Request::CurrentNodeData)? {
            Reply::CurrentNode { data } => Ok(data),
            Reply::CurrentNodeFailed { error } => Err(error.into()),
            other => Err(unexpected("current_node_data", &other)),
        }
    }

    /// Clear the navigation history.
    pub fn leave_node(&mut self) -> Result<(), ShellError> {
        match self.send_request(Request::LeaveNode)? {
            Reply::LeftNode => Ok(()),
            other => Err(unexpected("leave_node", &other)),
        }
    }

    /// Step back in the navigation history.
    pub fn back(&mut self) -> Result<Back, ShellError> {
        match self.send_request(Request::Back)? {
            Reply::BackLeave => Ok(Back::Leave),
            Reply::BackContinue { node } => Ok(Back::Continue(node)),
            other => Err(unexpected("back", &other)),
        }
    }
}

fn unexpected(request_type: &str, reply: &Reply) -> ShellError {
    ShellError::Protocol(format!("unexpected reply to {request_type}: {reply:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::LocalTransport;
    use claw_probe::HostId;

    fn node(pid: u32) -> NodeId {
        NodeId::new(pid, HostId::from_bytes([0xaf; 20]))
    }

    /// Transport that answers every request with the same reply.
    struct FixedReply(Reply);

    impl Transport for FixedReply {
        fn call(&mut self, _request: Request) -> Result<Reply, ShellError> {
            Ok(self.0.clone())
        }

        fn push(&mut self, _event: ProbeEvent) -> Result<(), ShellError> {
            Ok(())
        }

        fn shutdown(&mut self) -> Result<(), ShellError> {
            Ok(())
        }
    }

    fn local_client() -> QueryClient {
        QueryClient::connect(Box::new(LocalTransport::new()), "localhost:4242").expect("handshake")
    }

    #[test]
    fn handshake_rejects_wrong_reply() {
        let err = QueryClient::connect(Box::new(FixedReply(Reply::LeftNode)), "h:1")
            .expect_err("should fail");
        assert!(matches!(err, ShellError::Protocol(_)));
    }

    #[test]
    fn unexpected_reply_is_protocol_error() {
        let mut client =
            QueryClient::connect(Box::new(FixedReply(Reply::InitDone)), "h:1").expect("handshake");
        let err = client.list_nodes().expect_err("should fail");
        assert!(err.to_string().starts_with("protocol error: unexpected reply to list_nodes"));
        assert!(matches!(client.back(), Err(ShellError::Protocol(_))));
    }

    #[test]
    fn navigation_failures_map_to_shell_errors() {
        let mut client = local_client();
        assert!(matches!(
            client.change_node(node(1)),
            Err(ShellError::EmptyRegistry)
        ));
        assert_eq!(
            client.where_am_i().expect_err("global").to_string(),
            "in global mode"
        );
        assert_eq!(
            client.current_node_data().expect_err("global").to_string(),
            "not found"
        );
    }

    #[test]
    fn queries_after_push() {
        let mut client = local_client();
        client
            .push(ProbeEvent::NodeInfo(NodeInfo::new(node(7), "Platon", "Linux")))
            .expect("push");

        assert!(client.has_node(node(7)).expect("reply"));
        assert_eq!(client.nodes_on_host("Platon").expect("reply"), vec![node(7)]);
        assert!(client.work_load(node(7)).expect("reply").is_none());
        assert!(client.node_info(node(8)).expect("reply").is_none());
        assert_eq!(client.change_node(node(7)).expect("known"), node(7));
        assert_eq!(client.back().expect("reply"), Back::Leave);
    }

    #[test]
    fn shutdown_is_forwarded() {
        let mut client = local_client();
        client.shutdown().expect("shutdown");
        assert_eq!(client.peer(), "localhost:4242");
    }
}
