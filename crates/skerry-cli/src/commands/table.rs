//! Table management command implementation.
//!
//! `show` fans out over the table's descriptor, permissions, columns
//! and scripts and merges what came back. `update` turns the requested
//! changes into an ordered plan that keeps going past failed steps.

use std::io::Write;

use serde_json::Value;
use tracing::debug;

use skerry_client::{PageQuery, ServiceClient, Transport};
use skerry_core::{
    Collector, Plan, PlanOutcome, PlanStep, SilentReporter, SkerryError, StepReporter,
    TableOperation,
};

use crate::cli::{Role, TableCommands, TableDataArgs, TableUpdateArgs};
use crate::commands::text_field;
use crate::error::CliError;
use crate::output::{
    ColumnRow, DataPage, Message, OperationRow, OutputFormat, PlanReport, TableDetail, TableInfo,
    TableList,
};

/// Table command executor.
pub struct TableCommand<T> {
    transport: T,
}

impl<T> TableCommand<T>
where
    T: Transport + Clone + Send + Sync + 'static,
{
    /// Create a new table command.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Execute a table subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation fails.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &TableCommands,
    ) -> Result<(), CliError> {
        match command {
            TableCommands::List { service } => {
                let client = ServiceClient::new(self.transport.clone(), service.as_str());
                let tables = client.list_tables().await?;
                format.write(writer, &table_list(&tables))?;
            }
            TableCommands::Show { service, table } => {
                self.show(writer, format, service, table).await?;
            }
            TableCommands::Create(args) => {
                let client = ServiceClient::new(self.transport.clone(), args.service.as_str());
                let permissions = [
                    (TableOperation::Insert, args.insert.as_str()),
                    (TableOperation::Read, args.read.as_str()),
                    (TableOperation::Update, args.update.as_str()),
                    (TableOperation::Delete, args.delete.as_str()),
                ];
                client.create_table(&args.table, &permissions).await?;
                let msg = Message::success(format!("Created table {}", args.table));
                format.write(writer, &msg)?;
            }
            TableCommands::Update(args) => {
                self.update(writer, format, args).await?;
            }
            TableCommands::Delete { service, table } => {
                let client = ServiceClient::new(self.transport.clone(), service.as_str());
                client.delete_table(table).await?;
                format.write(writer, &Message::success(format!("Deleted table {table}")))?;
            }
            TableCommands::Data(args) => {
                let client = ServiceClient::new(self.transport.clone(), args.service.as_str());
                let page = client.table_data(&args.table, &data_query(args)).await?;
                let records = page_records(&page);
                format.write(writer, &DataPage { records })?;
            }
        }
        Ok(())
    }

    /// The descriptor read is required; the other pieces degrade to
    /// `N/A` cells or a missing column section.
    async fn show<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        service: &str,
        table: &str,
    ) -> Result<(), CliError> {
        let client = ServiceClient::new(self.transport.clone(), service);
        let mut collector = Collector::new();
        for piece in ["table", "permissions", "columns", "scripts"] {
            collector = collector.action(piece, fetch_piece(client.clone(), table.to_string(), piece));
        }
        let collected = collector.run().await;

        let Some(details) = collected.get("table") else {
            return Err(CliError::NotFound(format!(
                "table {table} in service {service}"
            )));
        };

        let detail = table_detail(
            table,
            details,
            collected.get("permissions"),
            collected.get("columns"),
            collected.get("scripts"),
        );
        format.write(writer, &detail)?;
        Ok(())
    }

    async fn update<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &TableUpdateArgs,
    ) -> Result<(), CliError> {
        let client = ServiceClient::new(self.transport.clone(), args.service.as_str());
        let plan = build_plan(&client, args);

        if plan.is_empty() {
            let msg = Message::info(
                "No updates performed. Check the list of available updates with --help.",
            );
            format.write(writer, &msg)?;
            return Ok(());
        }

        debug!(table = %args.table, steps = plan.len(), "executing update plan");
        let outcome = if format.is_json() {
            plan.execute(&mut SilentReporter).await
        } else {
            let mut reporter = ConsoleReporter { writer: &mut *writer };
            plan.execute(&mut reporter).await
        };

        let (steps, failures) = match outcome {
            PlanOutcome::Empty => (0, 0),
            PlanOutcome::Completed { steps } => (steps, 0),
            PlanOutcome::Incomplete { steps, failures } => (steps, failures),
        };

        if format.is_json() {
            format.write(writer, &PlanReport { steps, failures })?;
        }
        if failures > 0 {
            return Err(CliError::Incomplete { failures });
        }
        Ok(())
    }
}

/// Reporter that prints step labels as they happen.
struct ConsoleReporter<'a, W: Write> {
    writer: &'a mut W,
}

impl<W: Write> StepReporter for ConsoleReporter<'_, W> {
    fn on_progress(&mut self, label: &str) {
        let _ = writeln!(self.writer, "{label}...");
    }

    fn on_success(&mut self, label: &str) {
        let _ = writeln!(self.writer, "{label}");
    }

    fn on_failure(&mut self, label: &str) {
        let _ = writeln!(self.writer, "{label}");
    }
}

/// One detail piece, named for the merge.
async fn fetch_piece<T>(
    client: ServiceClient<T>,
    table: String,
    piece: &'static str,
) -> Result<Value, SkerryError>
where
    T: Transport + Clone + Send + Sync + 'static,
{
    let result = match piece {
        "table" => client.table_details(&table).await,
        "permissions" => client.table_permissions(&table).await,
        "columns" => client.table_columns(&table).await,
        _ => client.table_scripts(&table).await,
    };
    result.map_err(SkerryError::from)
}

/// Plan over the requested changes: permissions first, then index
/// deletions, index additions, column deletions.
fn build_plan<T>(client: &ServiceClient<T>, args: &TableUpdateArgs) -> Plan
where
    T: Transport + Clone + Send + Sync + 'static,
{
    let mut plan = Plan::new();

    let roles: Vec<(TableOperation, Role)> = [
        (TableOperation::Insert, args.insert),
        (TableOperation::Read, args.read),
        (TableOperation::Update, args.update),
        (TableOperation::Delete, args.delete),
    ]
    .into_iter()
    .filter_map(|(operation, role)| role.map(|role| (operation, role)))
    .collect();

    if !roles.is_empty() {
        let client = client.clone();
        let table = args.table.clone();
        plan.push(PlanStep::new(
            "Updating permissions",
            "Updated permissions",
            "Failed to update permissions",
            async move {
                let permissions: Vec<(TableOperation, &str)> = roles
                    .iter()
                    .map(|(operation, role)| (*operation, role.as_str()))
                    .collect();
                client
                    .set_table_permissions(&table, &permissions)
                    .await
                    .map_err(SkerryError::from)
            },
        ));
    }

    for column in &args.delete_index {
        let client = client.clone();
        let table = args.table.clone();
        let column = column.clone();
        plan.push(PlanStep::new(
            format!("Deleting index from column {column}"),
            format!("Deleted index from column {column}"),
            format!("Failed to delete index from column {column}"),
            async move {
                client
                    .delete_index(&table, &column)
                    .await
                    .map_err(SkerryError::from)
            },
        ));
    }

    for column in &args.add_index {
        let client = client.clone();
        let table = args.table.clone();
        let column = column.clone();
        plan.push(PlanStep::new(
            format!("Adding index to column {column}"),
            format!("Added index to column {column}"),
            format!("Failed to add index to column {column}"),
            async move {
                client
                    .create_index(&table, &column)
                    .await
                    .map_err(SkerryError::from)
            },
        ));
    }

    for column in &args.delete_column {
        let client = client.clone();
        let table = args.table.clone();
        let column = column.clone();
        plan.push(PlanStep::new(
            format!("Deleting column {column}"),
            format!("Deleted column {column}"),
            format!("Failed to delete column {column}"),
            async move {
                client
                    .delete_column(&table, &column)
                    .await
                    .map_err(SkerryError::from)
            },
        ));
    }

    plan
}

/// Table rows out of the raw listing, metrics tolerated absent.
fn table_list(tables: &Value) -> TableList {
    let tables = tables
        .as_array()
        .into_iter()
        .flatten()
        .map(|table| {
            let metrics = table.get("metrics");
            TableInfo {
                name: text_field(table, "name"),
                indexes: metrics.and_then(|m| m.get("indexCount")).and_then(Value::as_u64),
                rows: metrics.and_then(|m| m.get("recordCount")).and_then(Value::as_u64),
                bytes: metrics.and_then(|m| m.get("sizeBytes")).and_then(Value::as_u64),
            }
        })
        .collect();
    TableList { tables }
}

/// Merged detail view out of whatever pieces came back.
fn table_detail(
    name: &str,
    details: &Value,
    permissions: Option<&Value>,
    columns: Option<&Value>,
    scripts: Option<&Value>,
) -> TableDetail {
    let metrics = details.get("metrics");
    let rows = metrics.and_then(|m| m.get("recordCount")).and_then(Value::as_u64);
    let bytes = metrics.and_then(|m| m.get("sizeBytes")).and_then(Value::as_u64);

    let operations = TableOperation::ALL
        .iter()
        .map(|operation| OperationRow {
            operation: operation.as_str().to_string(),
            script: script_cell(scripts, *operation),
            permission: permission_cell(permissions, *operation),
        })
        .collect();

    let columns = columns.map(|columns| {
        columns
            .as_array()
            .into_iter()
            .flatten()
            .map(|column| ColumnRow {
                name: text_field(column, "name"),
                kind: text_field(column, "type"),
                indexed: column
                    .get("indexed")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            })
            .collect()
    });

    TableDetail {
        name: name.to_string(),
        rows,
        bytes,
        operations,
        columns,
    }
}

fn script_cell(scripts: Option<&Value>, operation: TableOperation) -> String {
    let Some(scripts) = scripts else {
        return "N/A".to_string();
    };
    let entry = scripts
        .as_array()
        .into_iter()
        .flatten()
        .find(|script| script.get("name").and_then(Value::as_str) == Some(operation.as_str()));
    match entry {
        Some(script) => {
            let bytes = script.get("sizeBytes").and_then(Value::as_u64).unwrap_or(0);
            format!("{bytes} bytes")
        }
        None => "Not defined".to_string(),
    }
}

fn permission_cell(permissions: Option<&Value>, operation: TableOperation) -> String {
    match permissions {
        None => "N/A".to_string(),
        Some(doc) => doc
            .get(operation.as_str())
            .and_then(Value::as_str)
            .unwrap_or("default")
            .to_string(),
    }
}

/// Page query out of the data flags. `--query` wins over everything.
fn data_query(args: &TableDataArgs) -> PageQuery {
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
    query
}

/// Records out of a data page, enveloped or bare.
fn page_records(page: &Value) -> Vec<Value> {
    if let Some(results) = page.get("results").and_then(Value::as_array) {
        return results.clone();
    }
    page.as_array().cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Format, TableCreateArgs};
    use serde_json::json;
    use skerry_client::{MemoryTransport, Method};

    fn command(transport: &MemoryTransport) -> TableCommand<MemoryTransport> {
        TableCommand::new(transport.clone())
    }

    fn update_args() -> TableUpdateArgs {
        TableUpdateArgs {
            service: "todo".into(),
            table: "items".into(),
            insert: None,
            read: None,
            update: None,
            delete: None,
            delete_column: vec![],
            add_index: vec![],
            delete_index: vec![],
        }
    }

    #[tokio::test]
    async fn list_renders_metrics() {
        let transport = MemoryTransport::new();
        transport
            .put_json(
                "services/todo/tables",
                json!([
                    {"name": "items", "metrics": {"indexCount": 2, "recordCount": 130, "sizeBytes": 4096}},
                    {"name": "users"},
                ]),
            )
            .await;

        let format = OutputFormat::new(Format::Table);
        let mut buf = Vec::new();
        command(&transport)
            .execute(
                &mut buf,
                &format,
                &TableCommands::List {
                    service: "todo".into(),
                },
            )
            .await
            .expect("should execute");

        let output = String::from_utf8(buf).expect("valid utf8");
        assert!(output.contains("items"));
        assert!(output.contains("130"));
        assert!(output.contains("4096"));
        assert!(output.contains("Total: 2 table(s)"));
    }

    #[tokio::test]
    async fn show_merges_all_pieces() {
        let transport = MemoryTransport::new();
        transport
            .put_json(
                "services/todo/tables/items",
                json!({"name": "items", "metrics": {"recordCount": 130, "sizeBytes": 4096}}),
            )
            .await;
        transport
            .put_json(
                "services/todo/tables/items/permissions",
                json!({"insert": "user", "read": "public"}),
            )
            .await;
        transport
            .put_json(
                "services/todo/tables/items/columns",
                json!([
                    {"name": "id", "type": "string", "indexed": true},
                    {"name": "text", "type": "string", "indexed": false},
                ]),
            )
            .await;
        transport
            .put_json(
                "services/todo/tables/items/scripts",
                json!([{"name": "insert", "sizeBytes": 178}]),
            )
            .await;

        let format = OutputFormat::new(Format::Table);
        let mut buf = Vec::new();
        command(&transport)
            .execute(
                &mut buf,
                &format,
                &TableCommands::Show {
                    service: "todo".into(),
                    table: "items".into(),
                },
            )
            .await
            .expect("should execute");

        let output = String::from_utf8(buf).expect("valid utf8");
        assert!(output.contains("Table: items"));
        assert!(output.contains("Rows:   130"));
        assert!(output.contains("178 bytes"));
        assert!(output.contains("Not defined"));
        assert!(output.contains("user"));
        assert!(output.contains("default"));
        assert!(output.contains("Yes"));
    }

    #[tokio::test]
    async fn show_tolerates_failed_pieces() {
        let transport = MemoryTransport::new();
        transport
            .put_json("services/todo/tables/items", json!({"name": "items"}))
            .await;
        transport
            .fail_path("services/todo/tables/items/columns", 500, "boom")
            .await;
        transport
            .fail_path("services/todo/tables/items/permissions", 500, "boom")
            .await;
        transport
            .put_json("services/todo/tables/items/scripts", json!([]))
            .await;

        let format = OutputFormat::new(Format::Table);
        let mut buf = Vec::new();
        command(&transport)
            .execute(
                &mut buf,
                &format,
                &TableCommands::Show {
                    service: "todo".into(),
                    table: "items".into(),
                },
            )
            .await
            .expect("should execute");

        let output = String::from_utf8(buf).expect("valid utf8");
        assert!(output.contains("Unable to obtain table columns"));
        assert!(output.contains("N/A"));
        assert!(output.contains("Not defined"));
    }

    #[tokio::test]
    async fn show_missing_table_is_not_found() {
        let transport = MemoryTransport::new();

        let format = OutputFormat::new(Format::Table);
        let mut buf = Vec::new();
        let result = command(&transport)
            .execute(
                &mut buf,
                &format,
                &TableCommands::Show {
                    service: "todo".into(),
                    table: "ghost".into(),
                },
            )
            .await;

        let error = result.expect_err("missing table should fail");
        assert!(matches!(error, CliError::NotFound(_)));
        assert!(error.to_string().contains("ghost"));
    }

    #[tokio::test]
    async fn create_posts_a_flat_body() {
        let transport = MemoryTransport::new();

        let format = OutputFormat::new(Format::Table);
        let mut buf = Vec::new();
        let args = TableCreateArgs {
            service: "todo".into(),
            table: "items".into(),
            insert: Role::Application,
            read: Role::Public,
            update: Role::Application,
            delete: Role::Admin,
        };
        command(&transport)
            .execute(&mut buf, &format, &TableCommands::Create(args))
            .await
            .expect("should execute");

        let posts = transport
            .requests_for(Method::Post, "services/todo/tables")
            .await;
        assert_eq!(posts.len(), 1);
        assert_eq!(
            posts[0].payload().as_json(),
            Some(&json!({
                "name": "items",
                "insert": "application",
                "read": "public",
                "update": "application",
                "delete": "admin",
            }))
        );

        let output = String::from_utf8(buf).expect("valid utf8");
        assert!(output.contains("✓ Created table items"));
    }

    #[tokio::test]
    async fn update_runs_steps_in_order() {
        let transport = MemoryTransport::new();
        // Existing docs so the deletions find something to remove.
        transport
            .put_json("services/todo/tables/items/indexes/price", json!({}))
            .await;
        transport
            .put_json("services/todo/tables/items/columns/legacy", json!({}))
            .await;

        let format = OutputFormat::new(Format::Table);
        let mut buf = Vec::new();
        let args = TableUpdateArgs {
            insert: Some(Role::User),
            delete_column: vec!["legacy".into()],
            add_index: vec!["qty".into()],
            delete_index: vec!["price".into()],
            ..update_args()
        };
        command(&transport)
            .execute(&mut buf, &format, &TableCommands::Update(args))
            .await
            .expect("should execute");

        let output = String::from_utf8(buf).expect("valid utf8");
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "Updating permissions...");
        assert_eq!(lines[1], "Updated permissions");
        assert_eq!(lines[2], "Deleting index from column price...");
        assert_eq!(lines[3], "Deleted index from column price");
        assert_eq!(lines[4], "Adding index to column qty...");
        assert_eq!(lines[5], "Added index to column qty");
        assert_eq!(lines[6], "Deleting column legacy...");
        assert_eq!(lines[7], "Deleted column legacy");

        let trace: Vec<(Method, String)> = transport
            .requests()
            .await
            .iter()
            .map(|request| (request.method(), request.path()))
            .collect();
        assert_eq!(
            trace,
            vec![
                (Method::Put, "services/todo/tables/items/permissions".to_string()),
                (Method::Delete, "services/todo/tables/items/indexes/price".to_string()),
                (Method::Put, "services/todo/tables/items/indexes/qty".to_string()),
                (Method::Delete, "services/todo/tables/items/columns/legacy".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn update_keeps_going_past_failures() {
        let transport = MemoryTransport::new();
        // The index deletion will 404; the later column deletion succeeds.
        transport
            .put_json("services/todo/tables/items/columns/legacy", json!({}))
            .await;

        let format = OutputFormat::new(Format::Table);
        let mut buf = Vec::new();
        let args = TableUpdateArgs {
            delete_index: vec!["ghost".into()],
            delete_column: vec!["legacy".into()],
            ..update_args()
        };
        let result = command(&transport)
            .execute(&mut buf, &format, &TableCommands::Update(args))
            .await;

        let error = result.expect_err("partial failure should fail");
        assert!(matches!(error, CliError::Incomplete { failures: 1 }));
        assert_eq!(
            error.to_string(),
            "not all update operations completed successfully (1 failed)"
        );

        let output = String::from_utf8(buf).expect("valid utf8");
        assert!(output.contains("Failed to delete index from column ghost"));
        assert!(output.contains("Deleted column legacy"));

        let deletes = transport
            .requests_for(Method::Delete, "services/todo/tables/items/columns/legacy")
            .await;
        assert_eq!(deletes.len(), 1);
    }

    #[tokio::test]
    async fn update_with_no_changes_is_a_no_op() {
        let transport = MemoryTransport::new();

        let format = OutputFormat::new(Format::Table);
        let mut buf = Vec::new();
        command(&transport)
            .execute(&mut buf, &format, &TableCommands::Update(update_args()))
            .await
            .expect("should execute");

        let output = String::from_utf8(buf).expect("valid utf8");
        assert!(output.contains("No updates performed"));
        assert!(transport.requests().await.is_empty());
    }

    #[tokio::test]
    async fn update_json_mode_reports_the_outcome() {
        let transport = MemoryTransport::new();

        let format = OutputFormat::new(Format::Json);
        let mut buf = Vec::new();
        let args = TableUpdateArgs {
            add_index: vec!["qty".into()],
            ..update_args()
        };
        command(&transport)
            .execute(&mut buf, &format, &TableCommands::Update(args))
            .await
            .expect("should execute");

        let output = String::from_utf8(buf).expect("valid utf8");
        let parsed: Value = serde_json::from_str(&output).expect("valid json");
        assert_eq!(parsed, json!({"steps": 1, "failures": 0}));
    }

    #[tokio::test]
    async fn delete_confirms() {
        let transport = MemoryTransport::new();
        transport
            .put_json("services/todo/tables/items", json!({"name": "items"}))
            .await;

        let format = OutputFormat::new(Format::Table);
        let mut buf = Vec::new();
        command(&transport)
            .execute(
                &mut buf,
                &format,
                &TableCommands::Delete {
                    service: "todo".into(),
                    table: "items".into(),
                },
            )
            .await
            .expect("should execute");

        let output = String::from_utf8(buf).expect("valid utf8");
        assert!(output.contains("✓ Deleted table items"));
    }

    #[tokio::test]
    async fn data_sends_paging_and_renders_records() {
        let transport = MemoryTransport::new();
        transport
            .put_json(
                "services/todo/tables/items/data",
                json!([
                    {"id": "1", "text": "milk"},
                    {"id": "2", "text": "bread"},
                ]),
            )
            .await;

        let format = OutputFormat::new(Format::Table);
        let mut buf = Vec::new();
        let args = TableDataArgs {
            service: "todo".into(),
            table: "items".into(),
            top: Some(5),
            skip: Some(10),
            query: None,
        };
        command(&transport)
            .execute(&mut buf, &format, &TableCommands::Data(args))
            .await
            .expect("should execute");

        let requests = transport.requests().await;
        let expected = [
            ("$top".to_string(), "5".to_string()),
            ("$skip".to_string(), "10".to_string()),
        ];
        assert_eq!(requests[0].query_pairs(), expected.as_slice());

        let output = String::from_utf8(buf).expect("valid utf8");
        assert!(output.contains("milk"));
        assert!(output.contains("Total: 2 record(s)"));
    }

    #[tokio::test]
    async fn data_raw_query_wins() {
        let transport = MemoryTransport::new();
        transport
            .put_json("services/todo/tables/items/data", json!([]))
            .await;

        let format = OutputFormat::new(Format::Table);
        let mut buf = Vec::new();
        let args = TableDataArgs {
            service: "todo".into(),
            table: "items".into(),
            top: Some(5),
            skip: None,
            query: Some("$filter=done eq false".into()),
        };
        command(&transport)
            .execute(&mut buf, &format, &TableCommands::Data(args))
            .await
            .expect("should execute");

        let requests = transport.requests().await;
        assert_eq!(
            requests[0].query_pairs(),
            &[("$filter".to_string(), "done eq false".to_string())]
        );

        let output = String::from_utf8(buf).expect("valid utf8");
        assert!(output.contains("No matching records found"));
    }
}
