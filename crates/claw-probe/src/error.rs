//! Error types for the claw-probe crate.

use thiserror::Error;

/// Errors that can occur while parsing or decoding probe data.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// A node ID did not have the `<pid>@<host>` shape.
    #[error("invalid node ID: {0}")]
    InvalidNodeId(String),

    /// A host fingerprint was not 40 hex characters.
    #[error("invalid host fingerprint: {0}")]
    InvalidHostId(String),

    /// An actor ID was not an unsigned integer.
    #[error("invalid actor ID: {0}")]
    InvalidActorId(String),

    /// Failed to encode a probe event.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Failed to decode a probe event.
    #[error("decoding error: {0}")]
    Decoding(String),
}
