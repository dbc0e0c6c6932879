//! # skerry-cli
//!
//! Skerry command-line interface.
//!
//! Provides commands for:
//! - Service inspection, redeploys, keys and logs
//! - Settings management across the configuration documents
//! - Table schema and permission updates
//! - Server script listing, download, upload and deletion
//!
//! # Architecture
//!
//! The CLI talks to the Skerry management endpoint over HTTP using the
//! typed paths in `skerry-client`. Every command runs against the
//! [`skerry_client::Transport`] trait, so tests drive the same code
//! through an in-memory transport.
//!
//! ```text
//! ┌────────────┐     Management API     ┌──────────────────┐
//! │ skerry-cli │◄──────────────────────►│  Skerry backend  │
//! └────────────┘        (HTTP)          └──────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{Cli, Commands, ConfigCommands, Format, ScriptCommands, ServiceCommands, TableCommands};
pub use error::CliError;
pub use output::OutputFormat;
