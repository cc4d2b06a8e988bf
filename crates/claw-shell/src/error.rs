//! Shell error types.

use claw_registry::RegistryError;
use thiserror::Error;

/// Errors raised while running shell commands.
///
/// Command failures never end the session: the dispatcher records the
/// message as the last error and keeps reading input.
#[derive(Debug, Error)]
pub enum ShellError {
    /// Wrong arity or unparsable argument.
    #[error("{0}")]
    InvalidArgument(String),

    /// The current mode has no command with this name.
    #[error("unknown command")]
    UnknownCommand,

    /// The registry does not know the requested node.
    #[error("unknown node")]
    UnknownNode,

    /// Navigation attempted before any node was announced.
    #[error("no nodes known")]
    EmptyRegistry,

    /// A known node has not reported this kind of telemetry yet.
    #[error("no {0} available for node")]
    NoTelemetry(&'static str),

    /// Several nodes run on the host and no process ID was given.
    #[error("ambiguous host: {0}")]
    AmbiguousHost(String),

    /// The host spec matches no known node.
    #[error("no node known on host: {0}")]
    UnresolvedHost(String),

    /// The registry answered with a reply the request does not allow.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Placeholder command.
    #[error("{0}: not implemented")]
    NotImplemented(&'static str),

    /// Any other navigation failure reported by the registry.
    #[error(transparent)]
    Navigation(RegistryError),

    /// The registry can no longer be reached.
    #[error("transport error: {0}")]
    Transport(String),

    /// Invalid startup configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Output could not be rendered.
    #[error("format error: {0}")]
    Format(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ShellError {
    /// Build an [`ShellError::InvalidArgument`] prefixed with the command name.
    pub fn invalid(command: &str, msg: impl std::fmt::Display) -> Self {
        Self::InvalidArgument(format!("{command}: {msg}"))
    }
}

impl From<RegistryError> for ShellError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::EmptyRegistry => Self::EmptyRegistry,
            RegistryError::UnknownNode => Self::UnknownNode,
            RegistryError::Closed => Self::Transport(err.to_string()),
            RegistryError::GlobalMode | RegistryError::NotFound => Self::Navigation(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_failures_keep_their_message() {
        assert_eq!(
            ShellError::from(RegistryError::EmptyRegistry).to_string(),
            "no nodes known"
        );
        assert_eq!(
            ShellError::from(RegistryError::UnknownNode).to_string(),
            "unknown node"
        );
        assert_eq!(
            ShellError::from(RegistryError::GlobalMode).to_string(),
            "in global mode"
        );
        assert_eq!(
            ShellError::from(RegistryError::NotFound).to_string(),
            "not found"
        );
    }

    #[test]
    fn closed_registry_is_a_transport_error() {
        let err = ShellError::from(RegistryError::Closed);
        assert!(matches!(err, ShellError::Transport(_)));
    }

    #[test]
    fn invalid_argument_names_the_command() {
        let err = ShellError::invalid("sleep", "expected milliseconds");
        assert_eq!(err.to_string(), "sleep: expected milliseconds");
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        assert!(matches!(ShellError::from(io_err), ShellError::Io(_)));
    }
}
