//! Settings command implementation.
//!
//! `list` fans out one read per settings document and merges the
//! results into a single report over every key. `get` and `set` go
//! through the catalog's read-modify-write accessors.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde_json::Value;

use skerry_client::{ServiceClient, Transport};
use skerry_core::settings;
use skerry_core::{Collected, Collector, SettingKey, SettingsDoc, SkerryError};

use crate::cli::ConfigCommands;
use crate::error::CliError;
use crate::output::{ConfigEntry, ConfigReport, Message, OutputFormat, render_value};

/// Config command executor.
pub struct ConfigCommand<T> {
    transport: T,
}

impl<T> ConfigCommand<T>
where
    T: Transport + Clone + Send + Sync + 'static,
{
    /// Create a new config command.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Execute a config subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation fails.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &ConfigCommands,
    ) -> Result<(), CliError> {
        match command {
            ConfigCommands::List { service } => self.list(writer, format, service).await,
            ConfigCommands::Get { service, key, file } => {
                self.get(writer, format, service, key, file.as_deref()).await
            }
            ConfigCommands::Set {
                service,
                key,
                value,
                file,
            } => {
                self.set(writer, format, service, key, value.as_deref(), file.as_deref())
                    .await
            }
        }
    }

    /// A failed document read leaves its keys marked unavailable instead
    /// of failing the whole report.
    async fn list<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        service: &str,
    ) -> Result<(), CliError> {
        let client = ServiceClient::new(self.transport.clone(), service);
        let mut collector = Collector::new();
        for doc in SettingsDoc::ALL {
            let client = client.clone();
            collector = collector.action(doc.as_str(), async move {
                client.read_settings(doc).await.map_err(SkerryError::from)
            });
        }
        let collected = collector.run().await;
        format.write(writer, &merged_report(&collected))?;
        Ok(())
    }

    async fn get<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        service: &str,
        key: &str,
        file: Option<&Path>,
    ) -> Result<(), CliError> {
        let key: SettingKey = key.parse()?;
        let client = ServiceClient::new(self.transport.clone(), service);
        let value = settings::get(&client, key).await?;

        match (value, file) {
            (Some(value), Some(path)) => {
                fs::write(path, render_value(&value)).map_err(|e| {
                    CliError::File(format!("unable to save {}: {e}", path.display()))
                })?;
                let msg = Message::success(format!("Value saved to {}", path.display()));
                format.write(writer, &msg)?;
            }
            (value, _) => {
                let entry = ConfigEntry {
                    key: key.to_string(),
                    value,
                    available: true,
                };
                format.write(writer, &ConfigReport { entries: vec![entry] })?;
            }
        }
        Ok(())
    }

    async fn set<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        service: &str,
        key: &str,
        value: Option<&str>,
        file: Option<&Path>,
    ) -> Result<(), CliError> {
        let key: SettingKey = match key.parse() {
            Ok(key) => key,
            Err(error) => {
                writeln!(writer, "Supported keys:")?;
                for supported in SettingKey::ALL {
                    writeln!(writer, "  {supported}")?;
                }
                return Err(error.into());
            }
        };

        let raw = match (value, file) {
            (Some(value), _) => value.to_string(),
            (None, Some(path)) => {
                let contents = fs::read_to_string(path).map_err(|e| {
                    CliError::File(format!("unable to read {}: {e}", path.display()))
                })?;
                if !format.is_json() {
                    writeln!(writer, "Value was read from {}", path.display())?;
                }
                contents.trim_end().to_string()
            }
            (None, None) => {
                return Err(CliError::InvalidArgument(
                    "either a value or --file must be given".to_string(),
                ));
            }
        };

        let value = coerce(key, &raw)?;
        let client = ServiceClient::new(self.transport.clone(), service);
        settings::set(&client, key, value).await?;
        format.write(writer, &Message::success(format!("Updated setting {key}")))?;
        Ok(())
    }
}

/// Report over every settings key against the fetched documents.
fn merged_report(collected: &Collected) -> ConfigReport {
    let entries = SettingKey::ALL
        .iter()
        .map(|key| match collected.get(key.doc().as_str()) {
            Some(doc) => ConfigEntry {
                key: key.to_string(),
                value: key.value_in(doc).cloned(),
                available: true,
            },
            None => ConfigEntry {
                key: key.to_string(),
                value: None,
                available: false,
            },
        })
        .collect();
    ConfigReport { entries }
}

/// CLI values travel as strings, except the boolean schema toggle.
fn coerce(key: SettingKey, raw: &str) -> Result<Value, CliError> {
    if key == SettingKey::DynamicSchemaEnabled {
        return match raw {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(CliError::InvalidArgument(
                "the value must be either true or false".to_string(),
            )),
        };
    }
    Ok(Value::String(raw.to_string()))
}
