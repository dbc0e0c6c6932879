//! CLI command implementations.
//!
//! Each submodule implements one command group:
//! - [`service`] - service listing, details, redeploy, keys, logs
//! - [`config`] - settings reads and writes through the catalog
//! - [`table`] - table management and data browsing
//! - [`script`] - server script management

pub mod config;
pub mod script;
pub mod service;
pub mod table;

pub use config::ConfigCommand;
pub use script::ScriptCommand;
pub use service::ServiceCommand;
pub use table::TableCommand;

use serde_json::Value;

/// String field of a JSON object, empty when absent.
pub(crate) fn text_field(value: &Value, field: &str) -> String {
    value
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// String field of a JSON object, `None` when absent.
pub(crate) fn optional_text(value: &Value, field: &str) -> Option<String> {
    value.get(field).and_then(Value::as_str).map(str::to_string)
}

/// Unsigned field of a JSON object, `None` when absent or not a number.
pub(crate) fn optional_u64(value: &Value, field: &str) -> Option<u64> {
    value.get(field).and_then(Value::as_u64)
}
