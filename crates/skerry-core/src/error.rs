//! Error types for skerry-core.

use thiserror::Error;

/// Errors that can occur in Skerry core operations.
#[derive(Debug, Error)]
pub enum SkerryError {
    /// A script name that fits none of the recognized patterns.
    #[error("unrecognized script name: {name}")]
    UnrecognizedScript {
        /// The name as given.
        name: String,
    },

    /// A settings key outside the supported set.
    #[error("unknown settings key: {key}")]
    UnknownKey {
        /// The key as given.
        key: String,
    },

    /// A remote operation against the management API failed.
    #[error("remote operation failed: {message}")]
    Remote {
        /// Failure description as reported by the client layer.
        message: String,
    },
}
