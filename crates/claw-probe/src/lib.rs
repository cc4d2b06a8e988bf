//! # claw-probe
//!
//! Telemetry data model shared by the node registry and the inspection shell.
//!
//! Monitored processes announce themselves with a [`NodeInfo`] and keep
//! pushing [`WorkLoad`] and [`RamUsage`] samples. All of it travels as
//! [`ProbeEvent`]s, which the registry folds into one [`NodeData`] per node.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod events;
pub mod types;

pub use error::ProbeError;
pub use events::ProbeEvent;
pub use types::{
    ActorId, ActorRef, CpuInfo, HostId, Interfaces, NodeData, NodeId, NodeInfo, Protocol,
    RamUsage, WorkLoad,
};
