//! Typed access to one service's management API.

use serde_json::{Map, Value, json};
use tokio::task::JoinSet;
use tracing::warn;

use skerry_core::SkerryError;
use skerry_core::route::{SHARED_FEEDBACK, ScriptName, TableOperation};
use skerry_core::settings::{SettingsDoc, SettingsOps};

use crate::error::ClientError;
use crate::request::{Method, Payload, Request, Response};
use crate::transport::Transport;

/// Paging options for log and row queries.
///
/// When `raw` is set it is sent verbatim and the other fields are ignored,
/// mirroring how operators paste prebuilt query strings.
#[derive(Debug, Clone, Default)]
pub struct PageQuery {
    /// Maximum number of entries to return. Defaults to 10.
    pub top: Option<u32>,
    /// Number of entries to skip.
    pub skip: Option<u32>,
    /// Server-side filter expression.
    pub filter: Option<String>,
    /// Raw query string of `key=value` pairs joined with `&`.
    pub raw: Option<String>,
}

impl PageQuery {
    /// Limits the result to `top` entries.
    #[must_use]
    pub fn top(mut self, top: u32) -> Self {
        self.top = Some(top);
        self
    }

    /// Skips the first `skip` entries.
    #[must_use]
    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Filters entries with a server-side expression.
    #[must_use]
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Sends `raw` verbatim instead of the paged options.
    #[must_use]
    pub fn raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }

    fn apply(&self, mut request: Request) -> Result<Request, ClientError> {
        if let Some(raw) = &self.raw {
            for pair in raw.split('&') {
                let parts: Vec<&str> = pair.split('=').collect();
                if parts.len() != 2 {
                    return Err(ClientError::InvalidQuery(format!(
                        "expected key=value, got {pair}"
                    )));
                }
                request = request.query(parts[0], parts[1]);
            }
            return Ok(request);
        }
        request = request.query("$top", self.top.unwrap_or(10).to_string());
        if let Some(skip) = self.skip {
            request = request.query("$skip", skip.to_string());
        }
        if let Some(filter) = &self.filter {
            request = request.query("$filter", filter);
        }
        Ok(request)
    }
}

/// Client for the management resources of a single service.
///
/// Every method maps to one request against the transport; the aggregate
/// helpers ([`Self::all_table_scripts`]) fan out over the per-table
/// endpoints. The client is cheap to clone.
#[derive(Clone)]
pub struct ServiceClient<T> {
    transport: T,
    service: String,
}

impl<T: Transport> ServiceClient<T> {
    /// Creates a client for `service` over `transport`.
    pub fn new(transport: T, service: impl Into<String>) -> Self {
        Self {
            transport,
            service: service.into(),
        }
    }

    /// Name of the service this client addresses.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Lists every service visible at the endpoint. Root-scoped: not tied
    /// to one service, so it takes the transport directly.
    pub async fn list_services(transport: &T) -> Result<Value, ClientError> {
        let response = transport
            .invoke(Request::new(Method::Get).segment("services"))
            .await?;
        json_payload(response)
    }

    fn base(&self, method: Method) -> Request {
        Request::new(method)
            .segment("services")
            .segment(&self.service)
    }

    async fn invoke_json(&self, request: Request) -> Result<Value, ClientError> {
        let response = self.transport.invoke(request).await?;
        json_payload(response)
    }

    async fn invoke_text(&self, request: Request) -> Result<String, ClientError> {
        let response = self.transport.invoke(request).await?;
        match response.payload {
            Payload::Text(text) => Ok(text),
            Payload::Json(value) => Ok(value.to_string()),
            Payload::Empty => Ok(String::new()),
        }
    }

    async fn invoke_unit(&self, request: Request) -> Result<(), ClientError> {
        self.transport.invoke(request).await?;
        Ok(())
    }

    /// Reads the service descriptor: name, state, application URL and keys.
    pub async fn service_details(&self) -> Result<Value, ClientError> {
        self.invoke_json(self.base(Method::Get)).await
    }

    /// Redeploys the service runtime.
    pub async fn redeploy(&self) -> Result<(), ClientError> {
        self.invoke_unit(self.base(Method::Post).segment("redeploy"))
            .await
    }

    /// Rotates the `kind` key (`application` or `master`) and returns the
    /// descriptor carrying the new key material.
    pub async fn regenerate_key(&self, kind: &str) -> Result<Value, ClientError> {
        self.invoke_json(
            self.base(Method::Post)
                .segment("regenerateKey")
                .query("type", kind),
        )
        .await
    }

    /// Fetches log entries selected by `query`.
    pub async fn logs(&self, query: &PageQuery) -> Result<Value, ClientError> {
        let request = query.apply(self.base(Method::Get).segment("logs"))?;
        self.invoke_json(request).await
    }

    fn settings_request(&self, doc: SettingsDoc, method: Method) -> Request {
        let request = self.base(method);
        match doc {
            SettingsDoc::Service => request.segment("settings"),
            SettingsDoc::Live => request.segment("livesettings"),
            SettingsDoc::Auth => request.segment("authsettings"),
            SettingsDoc::Apns => request.segments(["apns", "settings"]),
            SettingsDoc::Log => request.segment("logsettings"),
        }
    }

    /// Reads one settings document as stored.
    pub async fn read_settings(&self, doc: SettingsDoc) -> Result<Value, ClientError> {
        self.invoke_json(self.settings_request(doc, Method::Get))
            .await
    }

    /// Writes one settings document wholesale. The verb differs per
    /// document; callers pass the full intended contents either way.
    pub async fn write_settings(&self, doc: SettingsDoc, body: Value) -> Result<(), ClientError> {
        let method = match doc {
            SettingsDoc::Service => Method::Patch,
            SettingsDoc::Apns => Method::Post,
            SettingsDoc::Live | SettingsDoc::Auth | SettingsDoc::Log => Method::Put,
        };
        self.invoke_unit(self.settings_request(doc, method).json(body))
            .await
    }

    /// Lists table descriptors, including row and index metrics.
    pub async fn list_tables(&self) -> Result<Value, ClientError> {
        self.invoke_json(self.base(Method::Get).segment("tables"))
            .await
    }

    /// Creates `table` with per-operation permissions in one call.
    pub async fn create_table(
        &self,
        table: &str,
        permissions: &[(TableOperation, &str)],
    ) -> Result<(), ClientError> {
        let mut body = Map::new();
        body.insert("name".to_string(), Value::String(table.to_string()));
        for (operation, role) in permissions {
            body.insert(
                operation.as_str().to_string(),
                Value::String((*role).to_string()),
            );
        }
        self.invoke_unit(
            self.base(Method::Post)
                .segment("tables")
                .json(Value::Object(body)),
        )
        .await
    }

    /// Reads the descriptor of `table`.
    pub async fn table_details(&self, table: &str) -> Result<Value, ClientError> {
        self.invoke_json(self.base(Method::Get).segments(["tables", table]))
            .await
    }

    /// Drops `table` and everything in it.
    pub async fn delete_table(&self, table: &str) -> Result<(), ClientError> {
        self.invoke_unit(self.base(Method::Delete).segments(["tables", table]))
            .await
    }

    /// Reads the per-operation permissions of `table`.
    pub async fn table_permissions(&self, table: &str) -> Result<Value, ClientError> {
        self.invoke_json(
            self.base(Method::Get)
                .segments(["tables", table, "permissions"]),
        )
        .await
    }

    /// Replaces the per-operation permissions of `table`.
    pub async fn set_table_permissions(
        &self,
        table: &str,
        permissions: &[(TableOperation, &str)],
    ) -> Result<(), ClientError> {
        let mut body = Map::new();
        for (operation, role) in permissions {
            body.insert(
                operation.as_str().to_string(),
                Value::String((*role).to_string()),
            );
        }
        self.invoke_unit(
            self.base(Method::Put)
                .segments(["tables", table, "permissions"])
                .json(Value::Object(body)),
        )
        .await
    }

    /// Lists the columns of `table` with type and index information.
    pub async fn table_columns(&self, table: &str) -> Result<Value, ClientError> {
        self.invoke_json(
            self.base(Method::Get)
                .segments(["tables", table, "columns"]),
        )
        .await
    }

    /// Drops `column` from `table`.
    pub async fn delete_column(&self, table: &str, column: &str) -> Result<(), ClientError> {
        self.invoke_unit(
            self.base(Method::Delete)
                .segments(["tables", table, "columns", column]),
        )
        .await
    }

    /// Adds an index on `column`.
    pub async fn create_index(&self, table: &str, column: &str) -> Result<(), ClientError> {
        self.invoke_unit(
            self.base(Method::Put)
                .segments(["tables", table, "indexes", column]),
        )
        .await
    }

    /// Drops the index on `column`.
    pub async fn delete_index(&self, table: &str, column: &str) -> Result<(), ClientError> {
        self.invoke_unit(
            self.base(Method::Delete)
                .segments(["tables", table, "indexes", column]),
        )
        .await
    }

    /// Reads rows from `table` selected by `query`.
    pub async fn table_data(&self, table: &str, query: &PageQuery) -> Result<Value, ClientError> {
        let request = query.apply(self.base(Method::Get).segments(["tables", table, "data"]))?;
        self.invoke_json(request).await
    }

    /// Lists the script slots defined on `table`.
    pub async fn table_scripts(&self, table: &str) -> Result<Value, ClientError> {
        self.invoke_json(
            self.base(Method::Get)
                .segments(["tables", table, "scripts"]),
        )
        .await
    }

    /// Lists scheduler jobs with status and timing information.
    pub async fn scheduler_jobs(&self) -> Result<Value, ClientError> {
        self.invoke_json(self.base(Method::Get).segments(["scheduler", "jobs"]))
            .await
    }

    fn script_request(&self, name: &ScriptName, method: Method) -> Request {
        let request = self.base(method);
        match name {
            ScriptName::Table { table, operation } => request.segments([
                "tables",
                table.as_str(),
                "scripts",
                operation.as_str(),
                "code",
            ]),
            ScriptName::Scheduler { job } => {
                request.segments(["scheduler", "jobs", job.as_str(), "script"])
            }
            ScriptName::Shared { .. } => request.segments(["apns", "scripts", "feedback"]),
        }
    }

    /// Downloads the body of the script at `name`.
    pub async fn read_script(&self, name: &ScriptName) -> Result<String, ClientError> {
        self.invoke_text(self.script_request(name, Method::Get))
            .await
    }

    /// Uploads `source` as the body of the script at `name`.
    pub async fn write_script(
        &self,
        name: &ScriptName,
        source: impl Into<String>,
    ) -> Result<(), ClientError> {
        self.invoke_unit(self.script_request(name, Method::Put).text(source))
            .await
    }

    /// Removes the script at `name`.
    ///
    /// Table deletions clear the operation slot. Scheduler deletions remove
    /// the whole job, since the job exists only to run its script. Shared
    /// deletions remove the feedback script.
    pub async fn delete_script(&self, name: &ScriptName) -> Result<(), ClientError> {
        let request = match name {
            ScriptName::Table { table, operation } => self.base(Method::Delete).segments([
                "tables",
                table.as_str(),
                "scripts",
                operation.as_str(),
            ]),
            ScriptName::Scheduler { job } => self
                .base(Method::Delete)
                .segments(["scheduler", "jobs", job.as_str()]),
            ScriptName::Shared { .. } => self
                .base(Method::Delete)
                .segments(["apns", "scripts", "feedback"]),
        };
        self.invoke_unit(request).await
    }

    /// Lists the shared feedback script as a one-element listing, or an
    /// empty listing when the script does not exist.
    pub async fn shared_scripts(&self) -> Result<Value, ClientError> {
        match self
            .read_script(&ScriptName::Shared {
                name: SHARED_FEEDBACK.to_string(),
            })
            .await
        {
            Ok(script) => Ok(json!([{
                "name": SHARED_FEEDBACK,
                "sizeBytes": script.len(),
            }])),
            Err(ClientError::Api { status: 404, .. }) => Ok(json!([])),
            Err(error) => Err(error),
        }
    }
}

impl<T> ServiceClient<T>
where
    T: Transport + Clone + Send + Sync + 'static,
{
    /// Gathers the script listings of every table concurrently, tagging
    /// each entry with its table name.
    ///
    /// Per-table failures are logged as they land; once every fetch has
    /// settled, the first failure observed fails the whole call.
    pub async fn all_table_scripts(&self) -> Result<Vec<Value>, ClientError> {
        let tables = self.list_tables().await?;
        let names: Vec<String> = tables
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|table| table.get("name").and_then(Value::as_str))
            .map(str::to_string)
            .collect();

        let mut fetches = JoinSet::new();
        for name in names {
            let client = self.clone();
            fetches.spawn(async move {
                let scripts = client.table_scripts(&name).await;
                (name, scripts)
            });
        }

        let mut entries = Vec::new();
        let mut first_error = None;
        while let Some(joined) = fetches.join_next().await {
            match joined {
                Ok((table, Ok(scripts))) => {
                    for mut script in scripts.as_array().cloned().unwrap_or_default() {
                        if let Some(object) = script.as_object_mut() {
                            object.insert("table".to_string(), Value::String(table.clone()));
                        }
                        entries.push(script);
                    }
                }
                Ok((table, Err(error))) => {
                    warn!(table = %table, error = %error, "table script listing failed");
                    first_error.get_or_insert(error);
                }
                Err(join_error) => {
                    warn!(error = %join_error, "table script fetch panicked");
                    first_error.get_or_insert(ClientError::Transport(join_error.to_string()));
                }
            }
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(entries),
        }
    }
}

impl<T: Transport> SettingsOps for ServiceClient<T> {
    async fn read_doc(&self, doc: SettingsDoc) -> Result<Value, SkerryError> {
        self.read_settings(doc).await.map_err(SkerryError::from)
    }

    async fn write_doc(&self, doc: SettingsDoc, body: Value) -> Result<(), SkerryError> {
        self.write_settings(doc, body)
            .await
            .map_err(SkerryError::from)
    }
}

fn json_payload(response: Response) -> Result<Value, ClientError> {
    match response.payload {
        Payload::Json(value) => Ok(value),
        Payload::Empty => Ok(Value::Null),
        Payload::Text(_) => Err(ClientError::Decode(
            "expected a json body, got text".to_string(),
        )),
    }
}
