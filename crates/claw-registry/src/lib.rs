//! # claw-registry
//!
//! The node registry: single owner of fleet telemetry and of the shell's
//! navigation history.
//!
//! # Architecture
//!
//! [`NodeRegistry`] is the plain state machine. [`RegistryService`] wraps it
//! in a tokio task that drains one inbox, so shell queries and telemetry
//! pushes are applied strictly one at a time in arrival order. Nothing else
//! ever touches the state; callers go through a [`RegistryHandle`].
//!
//! ```text
//! ┌───────────┐  Request / Reply   ┌──────────────────┐  ProbeEvent  ┌───────┐
//! │  clawsh   │◄──────────────────►│ RegistryService  │◄─────────────│ fleet │
//! └───────────┘   (one at a time)  └──────────────────┘              └───────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod protocol;
pub mod service;
pub mod state;

pub use error::RegistryError;
pub use protocol::{Reply, Request};
pub use service::{Inbound, RegistryHandle, RegistryService, DEFAULT_INBOX_CAPACITY};
pub use state::{Back, NodeRegistry};
