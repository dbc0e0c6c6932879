//! Server script command implementation.
//!
//! One routable name space covers all three script kinds. Listing fans
//! out over the kinds and tolerates a failed group; download and upload
//! default to a `<kind>/<name>.js` path next to the working directory.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use serde_json::Value;
use tracing::debug;

use skerry_client::{ServiceClient, Transport};
use skerry_core::{Collected, Collector, ScriptName, SkerryError};

use crate::cli::ScriptCommands;
use crate::commands::{optional_text, optional_u64, text_field};
use crate::error::CliError;
use crate::output::{JobRow, Message, OutputFormat, ScriptGroups, ScriptRow};

/// Script command executor.
pub struct ScriptCommand<T> {
    transport: T,
}

impl<T> ScriptCommand<T>
where
    T: Transport + Clone + Send + Sync + 'static,
{
    /// Create a new script command.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Execute a script subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation fails.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &ScriptCommands,
    ) -> Result<(), CliError> {
        match command {
            ScriptCommands::List { service } => {
                let client = ServiceClient::new(self.transport.clone(), service.as_str());
                let collected = collect_groups(&client).await;
                format.write(writer, &script_groups(&collected))?;
            }
            ScriptCommands::Download {
                service,
                script,
                file,
                stdout,
                force,
            } => {
                let name = parse_script_name(writer, script)?;
                debug!(script = %name, "downloading script");
                let client = ServiceClient::new(self.transport.clone(), service.as_str());
                let body = client.read_script(&name).await?;

                if *stdout {
                    write!(writer, "{body}")?;
                    return Ok(());
                }

                let path = file.clone().unwrap_or_else(|| default_path(&name));
                if path.exists() && !*force {
                    return Err(CliError::File(format!(
                        "{} already exists, pass --force to overwrite",
                        path.display()
                    )));
                }
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        fs::create_dir_all(parent).map_err(|e| {
                            CliError::File(format!("unable to create {}: {e}", parent.display()))
                        })?;
                    }
                }
                fs::write(&path, &body).map_err(|e| {
                    CliError::File(format!("unable to save {}: {e}", path.display()))
                })?;
                let msg = Message::success(format!("Saved script to {}", path.display()));
                format.write(writer, &msg)?;
            }
            ScriptCommands::Upload {
                service,
                script,
                file,
            } => {
                let name = parse_script_name(writer, script)?;
                let path = file.clone().unwrap_or_else(|| default_path(&name));
                let source = fs::read_to_string(&path).map_err(|e| {
                    CliError::File(format!("unable to read {}: {e}", path.display()))
                })?;
                debug!(script = %name, bytes = source.len(), "uploading script");
                let client = ServiceClient::new(self.transport.clone(), service.as_str());
                client.write_script(&name, source).await?;
                format.write(writer, &Message::success(format!("Uploaded script {name}")))?;
            }
            ScriptCommands::Delete { service, script } => {
                let name = parse_script_name(writer, script)?;
                let client = ServiceClient::new(self.transport.clone(), service.as_str());
                client.delete_script(&name).await?;
                format.write(writer, &Message::success(format!("Deleted script {name}")))?;
            }
        }
        Ok(())
    }
}

/// Parses a routable name, printing the accepted shapes on failure.
fn parse_script_name<W: Write>(writer: &mut W, script: &str) -> Result<ScriptName, CliError> {
    match script.parse::<ScriptName>() {
        Ok(name) => Ok(name),
        Err(error) => {
            writeln!(
                writer,
                "For a table script, use table/<table>.<operation> with operation insert, read, update or delete"
            )?;
            writeln!(writer, "For a scheduler script, use scheduler/<job>")?;
            writeln!(writer, "For the shared feedback script, use shared/apnsFeedback")?;
            Err(error.into())
        }
    }
}

/// Default on-disk location of a script, one directory per kind.
fn default_path(name: &ScriptName) -> PathBuf {
    match name {
        ScriptName::Table { table, operation } => {
            PathBuf::from("table").join(format!("{table}.{operation}.js"))
        }
        ScriptName::Scheduler { job } => PathBuf::from("scheduler").join(format!("{job}.js")),
        ScriptName::Shared { name } => PathBuf::from("shared").join(format!("{name}.js")),
    }
}

/// Three-way fan-out over the script kinds.
async fn collect_groups<T>(client: &ServiceClient<T>) -> Collected
where
    T: Transport + Clone + Send + Sync + 'static,
{
    let mut collector = Collector::new();
    {
        let client = client.clone();
        collector = collector.action("table", async move {
            client
                .all_table_scripts()
                .await
                .map(Value::Array)
                .map_err(SkerryError::from)
        });
    }
    {
        let client = client.clone();
        collector = collector.action("shared", async move {
            client.shared_scripts().await.map_err(SkerryError::from)
        });
    }
    {
        let client = client.clone();
        collector = collector.action("scheduler", async move {
            client.scheduler_jobs().await.map_err(SkerryError::from)
        });
    }
    collector.run().await
}

/// Listing groups out of the fan-out, a failed group staying `None`.
fn script_groups(collected: &Collected) -> ScriptGroups {
    ScriptGroups {
        table: collected.get("table").map(table_rows),
        shared: collected.get("shared").map(shared_rows),
        scheduler: collected.get("scheduler").map(job_rows),
    }
}

fn table_rows(scripts: &Value) -> Vec<ScriptRow> {
    scripts
        .as_array()
        .into_iter()
        .flatten()
        .map(|script| ScriptRow {
            name: format!(
                "table/{}.{}",
                text_field(script, "table"),
                text_field(script, "name")
            ),
            size_bytes: optional_u64(script, "sizeBytes"),
        })
        .collect()
}

fn shared_rows(scripts: &Value) -> Vec<ScriptRow> {
    scripts
        .as_array()
        .into_iter()
        .flatten()
        .map(|script| ScriptRow {
            name: format!("shared/{}", text_field(script, "name")),
            size_bytes: optional_u64(script, "sizeBytes"),
        })
        .collect()
}

fn job_rows(jobs: &Value) -> Vec<JobRow> {
    jobs.as_array()
        .into_iter()
        .flatten()
        .map(|job| {
            let interval = match (
                optional_u64(job, "intervalPeriod"),
                optional_text(job, "intervalUnit"),
            ) {
                (Some(period), Some(unit)) => format!("{period} {unit}"),
                _ => "on demand".to_string(),
            };
            JobRow {
                name: format!("scheduler/{}", text_field(job, "name")),
                status: text_field(job, "status"),
                interval,
                last_run: optional_text(job, "lastRun").unwrap_or_else(|| "-".to_string()),
                next_run: optional_text(job, "nextRun").unwrap_or_else(|| "-".to_string()),
            }
        })
        .collect()
}
