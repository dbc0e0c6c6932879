//! # skerry-client
//!
//! Transport layer and typed management client for Skerry services.
//!
//! This crate provides:
//!
//! - [`Request`] / [`Response`] — the wire-agnostic request model
//! - [`Transport`] — the single remote capability everything runs on
//! - [`HttpTransport`] — `reqwest`-backed transport for real endpoints
//! - [`MemoryTransport`] — in-memory transport for tests
//! - [`ServiceClient`] — typed endpoints for one service's resources
//!
//! [`ServiceClient`] implements [`skerry_core::settings::SettingsOps`], so
//! the settings accessors in `skerry-core` work against any transport.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod http;
pub mod request;
pub mod service;
pub mod transport;

pub use error::ClientError;
pub use http::{DEFAULT_REQUEST_TIMEOUT, HttpTransport};
pub use request::{Method, Payload, Request, Response};
pub use service::{PageQuery, ServiceClient};
pub use transport::{MemoryTransport, Transport};
