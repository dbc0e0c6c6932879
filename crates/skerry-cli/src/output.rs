//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use serde::Serialize;
use serde_json::Value;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Get the current format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Service row for listing.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    /// Service name.
    pub name: String,
    /// Service state as reported by the endpoint.
    pub state: String,
    /// Application URL.
    pub url: String,
}

/// List of services for display.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceList {
    /// Services owned by the account.
    pub services: Vec<ServiceInfo>,
}

impl TableDisplay for ServiceList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.services.is_empty() {
            writeln!(writer, "No services created yet")?;
            return Ok(());
        }

        // Header
        writeln!(
            writer,
            "{:<24}  {:<10}  {:<44}",
            "NAME", "STATE", "URL"
        )?;
        writeln!(writer, "{}", "─".repeat(82))?;

        // Rows
        for service in &self.services {
            writeln!(
                writer,
                "{:<24}  {:<10}  {:<44}",
                truncate(&service.name, 24),
                service.state,
                truncate(&service.url, 44)
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "Total: {} service(s)", self.services.len())?;
        Ok(())
    }
}

/// Detailed service information.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceDetail {
    /// Service name.
    pub name: String,
    /// Service state.
    pub state: String,
    /// Application URL.
    pub url: Option<String>,
    /// Application key.
    pub application_key: Option<String>,
    /// Master key.
    pub master_key: Option<String>,
    /// Hosting region.
    pub region: Option<String>,
    /// Names of the service's tables.
    pub tables: Vec<String>,
}

impl TableDisplay for ServiceDetail {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Service: {}", self.name)?;
        writeln!(writer, "══════════════════════════════════════════════════")?;
        writeln!(writer)?;
        writeln!(writer, "General")?;
        writeln!(writer, "  State:            {}", self.state)?;
        if let Some(ref url) = self.url {
            writeln!(writer, "  URL:              {url}")?;
        }
        if let Some(ref region) = self.region {
            writeln!(writer, "  Region:           {region}")?;
        }
        if let Some(ref key) = self.application_key {
            writeln!(writer, "  Application Key:  {key}")?;
        }
        if let Some(ref key) = self.master_key {
            writeln!(writer, "  Master Key:       {key}")?;
        }
        writeln!(writer)?;

        if self.tables.is_empty() {
            writeln!(writer, "Tables: None")?;
        } else {
            writeln!(writer, "Tables: {}", self.tables.join(", "))?;
        }

        Ok(())
    }
}

/// Page of log entries.
#[derive(Debug, Clone, Serialize)]
pub struct LogPage {
    /// Raw log entries as returned by the endpoint.
    pub entries: Vec<Value>,
}

impl TableDisplay for LogPage {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.entries.is_empty() {
            writeln!(writer, "There are no matching log entries")?;
            return Ok(());
        }

        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(writer)?;
            }
            match entry.as_object() {
                Some(fields) => {
                    for (key, value) in fields {
                        writeln!(writer, "{key}: {}", render_value(value))?;
                    }
                }
                None => writeln!(writer, "{entry}")?,
            }
        }

        Ok(())
    }
}

/// One settings key in the merged configuration report.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigEntry {
    /// Settings key name.
    pub key: String,
    /// Current value, absent when not configured.
    pub value: Option<Value>,
    /// Whether the key's document could be read at all.
    pub available: bool,
}

/// Merged configuration report over all settings keys.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigReport {
    /// One entry per settings key.
    pub entries: Vec<ConfigEntry>,
}

impl TableDisplay for ConfigReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{:<34}  {}", "KEY", "VALUE")?;
        writeln!(writer, "{}", "─".repeat(70))?;

        for entry in &self.entries {
            let rendered = match (&entry.value, entry.available) {
                (Some(value), _) => render_value(value),
                (None, true) => "Not configured".to_string(),
                (None, false) => "Unable to obtain the value of this setting".to_string(),
            };
            writeln!(writer, "{:<34}  {rendered}", entry.key)?;
        }

        Ok(())
    }
}

/// Table row for listing.
#[derive(Debug, Clone, Serialize)]
pub struct TableInfo {
    /// Table name.
    pub name: String,
    /// Number of indexes.
    pub indexes: Option<u64>,
    /// Number of records.
    pub rows: Option<u64>,
    /// Storage size in bytes.
    pub bytes: Option<u64>,
}

/// List of tables for display.
#[derive(Debug, Clone, Serialize)]
pub struct TableList {
    /// Tables in the service.
    pub tables: Vec<TableInfo>,
}

impl TableDisplay for TableList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.tables.is_empty() {
            writeln!(writer, "No tables created yet")?;
            return Ok(());
        }

        // Header
        writeln!(
            writer,
            "{:<24}  {:>8}  {:>8}  {:>12}",
            "NAME", "INDEXES", "ROWS", "BYTES"
        )?;
        writeln!(writer, "{}", "─".repeat(58))?;

        // Rows
        for table in &self.tables {
            writeln!(
                writer,
                "{:<24}  {:>8}  {:>8}  {:>12}",
                truncate(&table.name, 24),
                count_cell(table.indexes),
                count_cell(table.rows),
                count_cell(table.bytes)
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "Total: {} table(s)", self.tables.len())?;
        Ok(())
    }
}

/// One operation slot in the detailed table view.
#[derive(Debug, Clone, Serialize)]
pub struct OperationRow {
    /// Operation name.
    pub operation: String,
    /// Script cell (size, `Not defined`, or `N/A`).
    pub script: String,
    /// Permission cell (role, `default`, or `N/A`).
    pub permission: String,
}

/// One column in the detailed table view.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnRow {
    /// Column name.
    pub name: String,
    /// Column type.
    pub kind: String,
    /// Whether the column is indexed.
    pub indexed: bool,
}

/// Detailed table information, tolerant of partially failed reads.
#[derive(Debug, Clone, Serialize)]
pub struct TableDetail {
    /// Table name.
    pub name: String,
    /// Number of records, absent when metrics were unavailable.
    pub rows: Option<u64>,
    /// Storage size in bytes, absent when metrics were unavailable.
    pub bytes: Option<u64>,
    /// One row per table operation.
    pub operations: Vec<OperationRow>,
    /// Columns, absent when the column read failed.
    pub columns: Option<Vec<ColumnRow>>,
}

impl TableDisplay for TableDetail {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Table: {}", self.name)?;
        writeln!(writer, "══════════════════════════════════════════════════")?;
        if let Some(rows) = self.rows {
            writeln!(writer, "  Rows:   {rows}")?;
        }
        if let Some(bytes) = self.bytes {
            writeln!(writer, "  Bytes:  {bytes}")?;
        }
        writeln!(writer)?;

        writeln!(
            writer,
            "{:<10}  {:<14}  {:<12}",
            "OPERATION", "SCRIPT", "PERMISSION"
        )?;
        writeln!(writer, "{}", "─".repeat(40))?;
        for row in &self.operations {
            writeln!(
                writer,
                "{:<10}  {:<14}  {:<12}",
                row.operation, row.script, row.permission
            )?;
        }
        writeln!(writer)?;

        match &self.columns {
            None => {
                writeln!(writer, "Unable to obtain table columns")?;
            }
            Some(columns) => {
                writeln!(writer, "{:<24}  {:<12}  {:<7}", "COLUMN", "TYPE", "INDEXED")?;
                writeln!(writer, "{}", "─".repeat(47))?;
                for column in columns {
                    let indexed = if column.indexed { "Yes" } else { "" };
                    writeln!(
                        writer,
                        "{:<24}  {:<12}  {:<7}",
                        truncate(&column.name, 24),
                        column.kind,
                        indexed
                    )?;
                }
            }
        }

        Ok(())
    }
}

/// Page of table records.
#[derive(Debug, Clone, Serialize)]
pub struct DataPage {
    /// Raw records as returned by the endpoint.
    pub records: Vec<Value>,
}

impl DataPage {
    /// Column names in first-seen order across all records.
    fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for record in &self.records {
            if let Some(fields) = record.as_object() {
                for key in fields.keys() {
                    if !columns.iter().any(|c| c == key) {
                        columns.push(key.clone());
                    }
                }
            }
        }
        columns
    }
}

impl TableDisplay for DataPage {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.records.is_empty() {
            writeln!(writer, "No matching records found")?;
            return Ok(());
        }

        let columns = self.columns();
        if columns.is_empty() {
            // Records that are not JSON objects, print them raw.
            for record in &self.records {
                writeln!(writer, "{record}")?;
            }
            return Ok(());
        }

        // Column widths sized to the widest cell.
        let mut widths: Vec<usize> = columns.iter().map(String::len).collect();
        let rows: Vec<Vec<String>> = self
            .records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(i, column)| {
                        let cell = match record.get(column) {
                            None | Some(Value::Null) => String::new(),
                            Some(value) => render_value(value),
                        };
                        widths[i] = widths[i].max(cell.len());
                        cell
                    })
                    .collect()
            })
            .collect();

        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                write!(writer, "  ")?;
            }
            write!(writer, "{:<width$}", column.to_uppercase(), width = widths[i])?;
        }
        writeln!(writer)?;
        writeln!(writer, "{}", "─".repeat(widths.iter().sum::<usize>() + 2 * (columns.len().saturating_sub(1))))?;

        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    write!(writer, "  ")?;
                }
                write!(writer, "{cell:<width$}", width = widths[i])?;
            }
            writeln!(writer)?;
        }

        writeln!(writer)?;
        writeln!(writer, "Total: {} record(s)", self.records.len())?;
        Ok(())
    }
}

/// One script in a listing group.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptRow {
    /// Routable script name (`table/orders.insert`, `shared/apnsFeedback`).
    pub name: String,
    /// Script size in bytes, when reported.
    pub size_bytes: Option<u64>,
}

/// One scheduler job in the script listing.
#[derive(Debug, Clone, Serialize)]
pub struct JobRow {
    /// Routable job name (`scheduler/backup`).
    pub name: String,
    /// Job status.
    pub status: String,
    /// Run interval, or `on demand`.
    pub interval: String,
    /// Last run timestamp, `-` when never run.
    pub last_run: String,
    /// Next scheduled run, `-` when not scheduled.
    pub next_run: String,
}

/// Script listing grouped by kind, tolerant of failed groups.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptGroups {
    /// Table scripts, absent when the group read failed.
    pub table: Option<Vec<ScriptRow>>,
    /// Shared scripts, absent when the group read failed.
    pub shared: Option<Vec<ScriptRow>>,
    /// Scheduler jobs, absent when the group read failed.
    pub scheduler: Option<Vec<JobRow>>,
}

impl ScriptGroups {
    fn write_script_group<W: Write>(
        writer: &mut W,
        heading: &str,
        group: Option<&Vec<ScriptRow>>,
        empty_hint: &str,
    ) -> Result<(), CliError> {
        writeln!(writer, "{heading}")?;
        match group {
            None => writeln!(writer, "  Unable to get {} scripts", heading.to_lowercase())?,
            Some(scripts) if scripts.is_empty() => writeln!(writer, "  {empty_hint}")?,
            Some(scripts) => {
                for script in scripts {
                    let size = script
                        .size_bytes
                        .map_or_else(|| "-".to_string(), |b| format!("{b} bytes"));
                    writeln!(writer, "  {:<40}  {size:>12}", script.name)?;
                }
            }
        }
        Ok(())
    }
}

impl TableDisplay for ScriptGroups {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        Self::write_script_group(
            writer,
            "Table",
            self.table.as_ref(),
            "There are no table scripts",
        )?;
        writeln!(writer)?;
        Self::write_script_group(
            writer,
            "Shared",
            self.shared.as_ref(),
            "There are no shared scripts",
        )?;
        writeln!(writer)?;

        writeln!(writer, "Scheduler")?;
        match &self.scheduler {
            None => writeln!(writer, "  Unable to get scheduler scripts")?,
            Some(jobs) if jobs.is_empty() => writeln!(writer, "  There are no scheduler scripts")?,
            Some(jobs) => {
                writeln!(
                    writer,
                    "  {:<28}  {:<10}  {:<14}  {:<22}  {:<22}",
                    "NAME", "STATUS", "INTERVAL", "LAST RUN", "NEXT RUN"
                )?;
                for job in jobs {
                    writeln!(
                        writer,
                        "  {:<28}  {:<10}  {:<14}  {:<22}  {:<22}",
                        truncate(&job.name, 28),
                        job.status,
                        job.interval,
                        job.last_run,
                        job.next_run
                    )?;
                }
            }
        }

        Ok(())
    }
}

/// Aggregate outcome of a multi-step update plan.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    /// Steps attempted.
    pub steps: usize,
    /// Steps that failed.
    pub failures: usize,
}

impl TableDisplay for PlanReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Steps:    {}", self.steps)?;
        writeln!(writer, "Failures: {}", self.failures)?;
        Ok(())
    }
}

/// Simple message output.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Message text.
    pub message: String,
    /// Whether this is a success message.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub success: bool,
}

impl Message {
    /// Create a success message.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }

    /// Create an informational message.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: false,
        }
    }
}

impl TableDisplay for Message {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.success {
            writeln!(writer, "✓ {}", self.message)?;
        } else {
            writeln!(writer, "{}", self.message)?;
        }
        Ok(())
    }
}

/// Render a JSON value for a table cell: strings unquoted, rest compact.
pub(crate) fn render_value(value: &Value) -> String {
    match value.as_str() {
        Some(text) => text.to_string(),
        None => value.to_string(),
    }
}

/// Render an optional count, `-` when absent.
fn count_cell(count: Option<u64>) -> String {
    count.map_or_else(|| "-".to_string(), |c| c.to_string())
}

/// Truncate a string to a maximum length.
fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        format!("{}...", &s[..max_len - 3])
    } else {
        s[..max_len].to_string()
    }
}
