//! Core telemetry types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProbeError;

/// Length of a host fingerprint in bytes.
pub const HOST_ID_LEN: usize = 20;

/// Fingerprint of the host a monitored process runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HostId([u8; HOST_ID_LEN]);

impl HostId {
    /// The all-zero fingerprint, used by [`NodeId::INVALID`].
    pub const ZERO: Self = Self([0; HOST_ID_LEN]);

    /// Create a fingerprint from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; HOST_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse a fingerprint from 40 hex characters.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly 40 hex characters.
    pub fn parse(s: &str) -> Result<Self, ProbeError> {
        let mut bytes = [0u8; HOST_ID_LEN];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| ProbeError::InvalidHostId(format!("{s}: {e}")))?;
        Ok(Self(bytes))
    }

    /// Get the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; HOST_ID_LEN] {
        &self.0
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl TryFrom<String> for HostId {
    type Error = ProbeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HostId> for String {
    fn from(value: HostId) -> Self {
        value.to_string()
    }
}

/// Unique identifier of a monitored process: process ID plus host fingerprint.
///
/// The text form is `<pid>@<host>`, e.g. `42@afafafafafafafafafafafafafafafafafafafaf`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    process_id: u32,
    host: HostId,
}

impl NodeId {
    /// The reserved "no node" value.
    pub const INVALID: Self = Self {
        process_id: 0,
        host: HostId::ZERO,
    };

    /// Create a node ID.
    #[must_use]
    pub const fn new(process_id: u32, host: HostId) -> Self {
        Self { process_id, host }
    }

    /// Parse a node ID from its `<pid>@<host>` text form.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid node ID.
    pub fn parse(s: &str) -> Result<Self, ProbeError> {
        let (pid, host) = s
            .trim()
            .split_once('@')
            .ok_or_else(|| ProbeError::InvalidNodeId(format!("{s}: missing '@'")))?;
        let process_id = pid
            .parse::<u32>()
            .map_err(|e| ProbeError::InvalidNodeId(format!("{s}: process id: {e}")))?;
        let host = HostId::parse(host)?;
        Ok(Self { process_id, host })
    }

    /// Process ID on the host.
    #[must_use]
    pub const fn process_id(&self) -> u32 {
        self.process_id
    }

    /// Host fingerprint.
    #[must_use]
    pub const fn host(&self) -> HostId {
        self.host
    }

    /// Whether this is anything other than [`NodeId::INVALID`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}@{}", self.process_id, self.host)
        } else {
            f.write_str("invalid-node")
        }
    }
}

impl FromStr for NodeId {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// One CPU package of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuInfo {
    /// Number of cores.
    pub core_count: u32,
    /// Clock rate of each core in MHz.
    pub mhz_per_core: u32,
}

/// Address family of an interface address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Hardware (MAC) address.
    Ethernet,
    /// IPv4 address.
    Ipv4,
    /// IPv6 address.
    Ipv6,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ethernet => f.write_str("ethernet"),
            Self::Ipv4 => f.write_str("ipv4"),
            Self::Ipv6 => f.write_str("ipv6"),
        }
    }
}

/// Interface name → protocol → addresses, in announcement order.
pub type Interfaces = BTreeMap<String, BTreeMap<Protocol, Vec<String>>>;

/// Static description of a node, delivered once when it is first seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Node this info describes.
    pub node_id: NodeId,
    /// CPU packages.
    pub cpu: Vec<CpuInfo>,
    /// Host name.
    pub hostname: String,
    /// Operating system.
    pub os: String,
    /// Network interfaces.
    #[serde(default)]
    pub interfaces: Interfaces,
}

impl NodeInfo {
    /// Create node info without CPUs or interfaces.
    #[must_use]
    pub fn new(node_id: NodeId, hostname: impl Into<String>, os: impl Into<String>) -> Self {
        Self {
            node_id,
            cpu: Vec::new(),
            hostname: hostname.into(),
            os: os.into(),
            interfaces: Interfaces::new(),
        }
    }

    /// Add a CPU package.
    #[must_use]
    pub fn with_cpu(mut self, core_count: u32, mhz_per_core: u32) -> Self {
        self.cpu.push(CpuInfo {
            core_count,
            mhz_per_core,
        });
        self
    }

    /// Add an address to an interface.
    #[must_use]
    pub fn with_address(
        mut self,
        interface: impl Into<String>,
        protocol: Protocol,
        address: impl Into<String>,
    ) -> Self {
        self.interfaces
            .entry(interface.into())
            .or_default()
            .entry(protocol)
            .or_default()
            .push(address.into());
        self
    }

    /// Total number of cores across all packages.
    #[must_use]
    pub fn total_cores(&self) -> u32 {
        self.cpu.iter().map(|c| c.core_count).sum()
    }
}

/// Load sample of a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkLoad {
    /// Node this sample belongs to.
    pub node_id: NodeId,
    /// Number of running processes.
    pub num_processes: u32,
    /// Number of running actors.
    pub num_actors: u32,
    /// CPU load in percent, 0 to 100.
    pub cpu_load_percent: f64,
}

/// Memory sample of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RamUsage {
    /// Node this sample belongs to.
    pub node_id: NodeId,
    /// Bytes in use.
    pub bytes_in_use: u64,
    /// Bytes available in total.
    pub bytes_available: u64,
}

impl RamUsage {
    /// Share of memory in use, in percent.
    ///
    /// Returns `None` when nothing is available, since the ratio is undefined.
    #[must_use]
    pub fn used_percent(&self) -> Option<f64> {
        if self.bytes_available == 0 {
            return None;
        }
        Some(self.bytes_in_use as f64 * 100.0 / self.bytes_available as f64)
    }
}

/// Everything the registry knows about one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    /// Static node description.
    pub node_info: NodeInfo,
    /// Latest load sample, if any arrived yet.
    pub work_load: Option<WorkLoad>,
    /// Latest memory sample, if any arrived yet.
    pub ram_usage: Option<RamUsage>,
}

impl NodeData {
    /// Create an entry with no telemetry yet.
    #[must_use]
    pub const fn new(node_info: NodeInfo) -> Self {
        Self {
            node_info,
            work_load: None,
            ram_usage: None,
        }
    }

    /// ID of the node.
    #[must_use]
    pub const fn node_id(&self) -> NodeId {
        self.node_info.node_id
    }
}

/// Identifier of an actor, unique per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(u32);

impl ActorId {
    /// Create an actor ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the numeric value.
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ActorId {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>()
            .map(Self)
            .map_err(|e| ProbeError::InvalidActorId(format!("{s}: {e}")))
    }
}

/// Address of a live actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorRef {
    /// Node the actor lives on.
    pub node: NodeId,
    /// Actor ID on that node.
    pub actor: ActorId,
}

impl fmt::Display for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.actor, self.node)
    }
}
