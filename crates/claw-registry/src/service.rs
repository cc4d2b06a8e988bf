//! The registry as a tokio task.
//!
//! [`RegistryService`] owns the [`NodeRegistry`] and drains a single inbox
//! carrying both shell requests and telemetry pushes, so every mutation is
//! applied in arrival order without locking.

use claw_probe::ProbeEvent;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::RegistryError;
use crate::protocol::{Reply, Request};
use crate::state::{Back, NodeRegistry};

/// Default capacity of the registry inbox.
pub const DEFAULT_INBOX_CAPACITY: usize = 256;

/// Everything the registry task can receive.
#[derive(Debug)]
pub enum Inbound {
    /// A shell request and the slot for its reply.
    Query {
        /// The request.
        request: Request,
        /// Where to send the reply.
        reply: oneshot::Sender<Reply>,
    },
    /// A telemetry push from the fleet.
    Probe(ProbeEvent),
    /// The shell is going away; stop the task.
    Shutdown,
}

/// Single owner of registry state.
#[derive(Debug)]
pub struct RegistryService {
    state: NodeRegistry,
    peer: Option<String>,
    inbox: mpsc::Receiver<Inbound>,
}

impl RegistryService {
    /// Create a service and the handle used to talk to it.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, RegistryHandle) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let service = Self {
            state: NodeRegistry::new(),
            peer: None,
            inbox: rx,
        };
        (service, RegistryHandle { tx })
    }

    /// Run the service on the given runtime.
    pub fn spawn(self, runtime: &Handle) -> JoinHandle<()> {
        runtime.spawn(self.run())
    }

    /// Drain the inbox until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        debug!("registry started");
        while let Some(msg) = self.inbox.recv().await {
            if !self.process(msg) {
                break;
            }
        }
        info!(nodes = self.state.node_count(), "registry stopped");
    }

    /// Apply one inbound message. Returns `false` when the task should stop.
    fn process(&mut self, msg: Inbound) -> bool {
        match msg {
            Inbound::Query { request, reply } => {
                let request_type = request.request_type();
                let response = self.handle(request);
                if reply.send(response).is_err() {
                    warn!(request_type, "requester went away before the reply");
                }
                true
            }
            Inbound::Probe(event) => {
                self.ingest(event);
                true
            }
            Inbound::Shutdown => {
                info!(peer = ?self.peer, "shutdown requested");
                false
            }
        }
    }

    /// Answer a shell request.
    pub fn handle(&mut self, request: Request) -> Reply {
        match request {
            Request::Init { peer } => {
                info!(peer = %peer, "shell connected");
                self.peer = Some(peer);
                Reply::InitDone
            }
            Request::ListNodes => Reply::Nodes {
                nodes: self.state.list_nodes(),
            },
            Request::HasNode { node } => Reply::HasNode {
                known: self.state.has_node(node),
            },
            Request::GetNodeInfo { node } => match self.state.node_info(node) {
                Some(info) => Reply::NodeInfo { info: info.clone() },
                None => Reply::NoNodeInfo,
            },
            Request::GetWorkLoad { node } => match self.state.work_load(node) {
                Some(work_load) => Reply::WorkLoad { work_load },
                None => Reply::NoWorkLoad,
            },
            Request::GetRamUsage { node } => match self.state.ram_usage(node) {
                Some(ram_usage) => Reply::RamUsage { ram_usage },
                None => Reply::NoRamUsage,
            },
            Request::GetRoutes { node } => Reply::Routes {
                routes: self.state.routes(node),
            },
            Request::NodesOnHost { hostname } => Reply::NodesOnHost {
                nodes: self.state.nodes_on_host(&hostname),
            },
            Request::GetActorHandle { node, actor } => match self.state.actor(node, actor) {
                Some(actor) => Reply::ActorHandle { actor },
                None => Reply::InvalidActor,
            },
            Request::ListActorsOnNode { node } => Reply::Actors {
                listing: self.state.list_actors(node),
            },
            Request::ChangeNode { node } => match self.state.change_node(node) {
                Ok(node) => {
                    debug!(node = %node, depth = self.state.visited().len(), "changed node");
                    Reply::NodeChanged { node }
                }
                Err(error) => Reply::ChangeFailed { error },
            },
            Request::WhereAmI => match self.state.where_am_i() {
                Ok(node) => Reply::Location { node },
                Err(error) => Reply::WhereAmIFailed { error },
            },
            Request::CurrentNodeData => match self.state.current_node_data() {
                Ok(data) => Reply::CurrentNode { data: data.clone() },
                Err(error) => Reply::CurrentNodeFailed { error },
            },
            Request::LeaveNode => {
                self.state.leave_node();
                Reply::LeftNode
            }
            Request::Back => match self.state.back() {
                Back::Leave => Reply::BackLeave,
                Back::Continue(node) => Reply::BackContinue { node },
            },
        }
    }

    /// Apply a telemetry push.
    pub fn ingest(&mut self, event: ProbeEvent) {
        let kind = event.kind();
        let node = event.node_id();
        let is_node_info = matches!(event, ProbeEvent::NodeInfo(_));
        if self.state.apply(event) {
            debug!(kind, node = %node, "applied telemetry");
        } else if is_node_info {
            debug!(node = %node, "dropped duplicate node info");
        } else {
            debug!(kind, node = %node, "dropped telemetry for unknown node");
        }
    }

    /// Read-only view of the state.
    #[must_use]
    pub const fn state(&self) -> &NodeRegistry {
        &self.state
    }
}

/// Cloneable handle to a running [`RegistryService`].
#[derive(Debug, Clone)]
pub struct RegistryHandle {
    tx: mpsc::Sender<Inbound>,
}

impl RegistryHandle {
    /// Send a request and wait for its reply.
    pub async fn request(&self, request: Request) -> Result<Reply, RegistryError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Inbound::Query { request, reply })
            .await
            .map_err(|_| RegistryError::Closed)?;
        rx.await.map_err(|_| RegistryError::Closed)
    }

    /// Send a request and block the current thread until its reply arrives.
    ///
    /// Must not be called from within an async context.
    pub fn blocking_request(&self, request: Request) -> Result<Reply, RegistryError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .blocking_send(Inbound::Query { request, reply })
            .map_err(|_| RegistryError::Closed)?;
        rx.blocking_recv().map_err(|_| RegistryError::Closed)
    }

    /// Push telemetry.
    pub async fn push(&self, event: ProbeEvent) -> Result<(), RegistryError> {
        self.tx
            .send(Inbound::Probe(event))
            .await
            .map_err(|_| RegistryError::Closed)
    }

    /// Push telemetry from a synchronous context.
    pub fn blocking_push(&self, event: ProbeEvent) -> Result<(), RegistryError> {
        self.tx
            .blocking_send(Inbound::Probe(event))
            .map_err(|_| RegistryError::Closed)
    }

    /// Ask the service to stop.
    pub async fn shutdown(&self) -> Result<(), RegistryError> {
        self.tx
            .send(Inbound::Shutdown)
            .await
            .map_err(|_| RegistryError::Closed)
    }

    /// Ask the service to stop from a synchronous context.
    pub fn blocking_shutdown(&self) -> Result<(), RegistryError> {
        self.tx
            .blocking_send(Inbound::Shutdown)
            .map_err(|_| RegistryError::Closed)
    }

    /// Whether the service has stopped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
