//! # skerry-core
//!
//! Core primitives for managing Skerry app-backend services.
//!
//! This crate provides:
//!
//! - [`ScriptName`] — Typed routing for server-side script names
//! - [`SettingKey`] — Closed settings catalog with read-modify-write access
//! - [`Collector`] — Concurrent fan-out over named remote reads
//! - [`Plan`] — Ordered update steps with continue-on-error execution
//!
//! The crate performs no I/O of its own: remote access arrives through the
//! [`settings::SettingsOps`] trait and through the futures handed to
//! [`Collector`] and [`Plan`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod collect;
pub mod error;
pub mod plan;
pub mod route;
pub mod settings;

pub use collect::{Collected, Collector, DEFAULT_ACTION_TIMEOUT};
pub use error::SkerryError;
pub use plan::{Plan, PlanOutcome, PlanStep, SilentReporter, StepReporter};
pub use route::{SHARED_FEEDBACK, ScriptKind, ScriptName, TableOperation};
pub use settings::{SettingKey, SettingsDoc, SettingsOps};
