//! Service management command implementation.
//!
//! Covers listing, the merged detail view, redeploys, key
//! regeneration and log browsing.

use std::io::Write;

use serde_json::Value;

use skerry_client::{PageQuery, ServiceClient, Transport};

use crate::cli::{KeyKind, LogsArgs, ServiceCommands};
use crate::commands::{optional_text, text_field};
use crate::error::CliError;
use crate::output::{LogPage, Message, OutputFormat, ServiceDetail, ServiceInfo, ServiceList};

/// Service command executor.
pub struct ServiceCommand<T> {
    transport: T,
}

impl<T> ServiceCommand<T>
where
    T: Transport + Clone + Send + Sync + 'static,
{
    /// Create a new service command.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Execute a service subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation fails.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &ServiceCommands,
    ) -> Result<(), CliError> {
        match command {
            ServiceCommands::List => {
                let services = ServiceClient::list_services(&self.transport).await?;
                format.write(writer, &service_list(&services))?;
            }
            ServiceCommands::Show { service } => {
                let client = ServiceClient::new(self.transport.clone(), service.as_str());
                let details = client.service_details().await?;
                let tables = client.list_tables().await?;
                format.write(writer, &service_detail(&details, &tables))?;
            }
            ServiceCommands::Redeploy { service } => {
                let client = ServiceClient::new(self.transport.clone(), service.as_str());
                client.redeploy().await?;
                let msg = Message::success(format!("Service {service} was redeployed"));
                format.write(writer, &msg)?;
            }
            ServiceCommands::RegenerateKey { service, kind } => {
                let client = ServiceClient::new(self.transport.clone(), service.as_str());
                let descriptor = client.regenerate_key(kind.as_str()).await?;
                format.write(writer, &key_message(*kind, &descriptor))?;
            }
            ServiceCommands::Logs(args) => {
                let client = ServiceClient::new(self.transport.clone(), args.service.as_str());
                let page = client.logs(&log_query(args)).await?;
                let entries = log_entries(&page);
                format.write(writer, &LogPage { entries })?;
            }
        }
        Ok(())
    }
}

/// Service rows out of the raw listing.
fn service_list(services: &Value) -> ServiceList {
    let services = services
        .as_array()
        .into_iter()
        .flatten()
        .map(|service| ServiceInfo {
            name: text_field(service, "name"),
            state: text_field(service, "state"),
            url: text_field(service, "applicationUrl"),
        })
        .collect();
    ServiceList { services }
}

/// Merged detail view out of the descriptor and the table listing.
fn service_detail(details: &Value, tables: &Value) -> ServiceDetail {
    let tables = tables
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|table| table.get("name").and_then(Value::as_str))
        .map(str::to_string)
        .collect();
    ServiceDetail {
        name: text_field(details, "name"),
        state: text_field(details, "state"),
        url: optional_text(details, "applicationUrl"),
        application_key: optional_text(details, "applicationKey"),
        master_key: optional_text(details, "masterKey"),
        region: optional_text(details, "region"),
        tables,
    }
}

/// Confirmation for a regenerated key, quoting the new key when the
/// endpoint returned it.
fn key_message(kind: KeyKind, descriptor: &Value) -> Message {
    let field = format!("{}Key", kind.as_str());
    match descriptor.get(&field).and_then(Value::as_str) {
        Some(key) => Message::success(format!("New {} key is {key}", kind.as_str())),
        None => Message::success("Key was regenerated"),
    }
}

/// Page query out of the logs flags. `--query` wins over everything,
/// `--type` becomes a `Type eq '<T>'` filter.
fn log_query(args: &LogsArgs) -> PageQuery {
    let mut query = PageQuery::default();
    if let Some(raw) = &args.query {
        return query.raw(raw.as_str());
    }
    if let Some(top) = args.top {
        query = query.top(top);
    }
    if let Some(skip) = args.skip {
        query = query.skip(skip);
    }
    if let Some(log_type) = &args.log_type {
        query = query.filter(format!("Type eq '{log_type}'"));
    }
    query
}

/// Entries out of a log page, tolerating both the enveloped and the
/// bare-array response shapes.
fn log_entries(page: &Value) -> Vec<Value> {
    if let Some(results) = page.get("results").and_then(Value::as_array) {
        return results.clone();
    }
    page.as_array().cloned().unwrap_or_default()
}
