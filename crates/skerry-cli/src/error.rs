//! CLI error types.

use std::fmt;

use skerry_client::ClientError;
use skerry_core::SkerryError;

/// Errors surfaced by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// The CLI configuration is unusable (bad endpoint, bad flags).
    Config(String),
    /// An argument failed validation before any request was sent.
    InvalidArgument(String),
    /// The management endpoint rejected or failed an operation.
    Remote(String),
    /// A referenced resource does not exist.
    NotFound(String),
    /// A local file could not be read or written.
    File(String),
    /// Output could not be rendered.
    Format(String),
    /// A multi-step update finished with failed steps.
    Incomplete {
        /// Number of steps that failed.
        failures: usize,
    },
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::Remote(msg) => write!(f, "remote error: {msg}"),
            Self::NotFound(what) => write!(f, "not found: {what}"),
            Self::File(msg) => write!(f, "file error: {msg}"),
            Self::Format(msg) => write!(f, "format error: {msg}"),
            Self::Incomplete { failures } => write!(
                f,
                "not all update operations completed successfully ({failures} failed)"
            ),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<SkerryError> for CliError {
    fn from(e: SkerryError) -> Self {
        match e {
            SkerryError::UnrecognizedScript { .. } | SkerryError::UnknownKey { .. } => {
                Self::InvalidArgument(e.to_string())
            }
            SkerryError::Remote { message } => Self::Remote(message),
        }
    }
}

impl From<ClientError> for CliError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::InvalidQuery(_) => Self::InvalidArgument(e.to_string()),
            _ => Self::Remote(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::Format(e.to_string())
    }
}
