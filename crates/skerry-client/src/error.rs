//! Error types for skerry-client.

use skerry_core::SkerryError;
use thiserror::Error;

/// Errors produced by the client layer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The management API answered with a non-success status.
    #[error("api error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Body or status text of the response.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// A query option was rejected before the request was sent.
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

impl From<ClientError> for SkerryError {
    fn from(error: ClientError) -> Self {
        Self::Remote {
            message: error.to_string(),
        }
    }
}
