//! Error types for the node registry.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures reported by the registry.
///
/// Navigation failures travel back to the shell inside a [`crate::Reply`],
/// so this type is serializable.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegistryError {
    /// Navigation was attempted before any node was announced.
    #[error("no nodes known")]
    EmptyRegistry,

    /// The requested node was never announced.
    #[error("unknown node")]
    UnknownNode,

    /// A node-scoped query was made while no node is selected.
    #[error("in global mode")]
    GlobalMode,

    /// The current node has no entry in the registry.
    #[error("not found")]
    NotFound,

    /// The registry task has stopped and no longer accepts requests.
    #[error("registry is no longer running")]
    Closed,
}
