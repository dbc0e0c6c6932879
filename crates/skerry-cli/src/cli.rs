//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Skerry CLI - hosted app-backend management.
#[derive(Parser, Debug, Clone)]
#[command(name = "skerry")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Management endpoint to connect to.
    #[arg(short, long, env = "SKERRY_ENDPOINT", default_value = "http://localhost:8440")]
    pub endpoint: String,

    /// Bearer token for the management endpoint.
    #[arg(long, env = "SKERRY_TOKEN")]
    pub token: Option<String>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[derive(Default)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Service management commands.
    Service {
        /// Service subcommand to execute.
        #[command(subcommand)]
        command: ServiceCommands,
    },

    /// Service configuration commands.
    Config {
        /// Config subcommand to execute.
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Table management commands.
    Table {
        /// Table subcommand to execute.
        #[command(subcommand)]
        command: TableCommands,
    },

    /// Server script management commands.
    Script {
        /// Script subcommand to execute.
        #[command(subcommand)]
        command: ScriptCommands,
    },
}

/// Service subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ServiceCommands {
    /// List all services.
    List,

    /// Show detailed information about a service.
    Show {
        /// Service name to inspect.
        service: String,
    },

    /// Redeploy a service.
    Redeploy {
        /// Service name to redeploy.
        service: String,
    },

    /// Regenerate the application or master key.
    RegenerateKey {
        /// Service whose key to regenerate.
        service: String,

        /// Which key to regenerate.
        #[arg(value_enum)]
        kind: KeyKind,
    },

    /// Browse the service log.
    Logs(LogsArgs),
}

/// Which service key to regenerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeyKind {
    /// The key handed to client applications.
    Application,
    /// The administrative master key.
    Master,
}

impl KeyKind {
    /// Key kind as the management endpoint expects it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Master => "master",
        }
    }
}

/// Arguments for the logs command.
#[derive(Parser, Debug, Clone)]
pub struct LogsArgs {
    /// Service whose log to read.
    #[arg(required = true)]
    pub service: String,

    /// Number of entries to fetch.
    #[arg(long, value_name = "N")]
    pub top: Option<u32>,

    /// Number of entries to skip.
    #[arg(long, value_name = "N")]
    pub skip: Option<u32>,

    /// Only entries of this type (error, warning, information).
    #[arg(long = "type", value_name = "TYPE")]
    pub log_type: Option<String>,

    /// Raw query pairs (`key=value` joined with `&`), overrides the other flags.
    #[arg(long, value_name = "QUERY")]
    pub query: Option<String>,
}

/// Config subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Show every settings key with its current value.
    List {
        /// Service to inspect.
        service: String,
    },

    /// Read a single settings key.
    Get {
        /// Service to inspect.
        service: String,

        /// Settings key to read.
        key: String,

        /// Save the value to a file instead of printing it.
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
    },

    /// Update a single settings key.
    Set {
        /// Service to configure.
        service: String,

        /// Settings key to update.
        key: String,

        /// New value for the key.
        value: Option<String>,

        /// Read the value from a file instead.
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
    },
}

/// Table subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum TableCommands {
    /// List all tables in a service.
    List {
        /// Service to inspect.
        service: String,
    },

    /// Show detailed information about a table.
    Show {
        /// Service that owns the table.
        service: String,

        /// Table name to inspect.
        table: String,
    },

    /// Create a new table.
    Create(TableCreateArgs),

    /// Update table permissions, indexes and columns.
    ///
    /// Each requested change becomes one step of an update plan;
    /// steps that fail are reported without aborting the rest.
    Update(TableUpdateArgs),

    /// Delete a table.
    Delete {
        /// Service that owns the table.
        service: String,

        /// Table name to delete.
        table: String,
    },

    /// Browse table records.
    Data(TableDataArgs),
}

/// Authorization role for a table operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Role {
    /// Authenticated users.
    User,
    /// Everyone, no authentication required.
    Public,
    /// Holders of the application key.
    Application,
    /// Holders of the master key.
    Admin,
}

impl Role {
    /// Role name as the management endpoint expects it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Public => "public",
            Self::Application => "application",
            Self::Admin => "admin",
        }
    }
}

/// Arguments for creating a table.
#[derive(Parser, Debug, Clone)]
pub struct TableCreateArgs {
    /// Service that owns the table.
    #[arg(required = true)]
    pub service: String,

    /// Name of the new table.
    #[arg(required = true)]
    pub table: String,

    /// Role allowed to insert records.
    #[arg(long, value_enum, value_name = "ROLE", default_value_t = Role::Application)]
    pub insert: Role,

    /// Role allowed to read records.
    #[arg(long, value_enum, value_name = "ROLE", default_value_t = Role::Application)]
    pub read: Role,

    /// Role allowed to update records.
    #[arg(long, value_enum, value_name = "ROLE", default_value_t = Role::Application)]
    pub update: Role,

    /// Role allowed to delete records.
    #[arg(long, value_enum, value_name = "ROLE", default_value_t = Role::Application)]
    pub delete: Role,
}

/// Arguments for updating a table.
#[derive(Parser, Debug, Clone)]
pub struct TableUpdateArgs {
    /// Service that owns the table.
    #[arg(required = true)]
    pub service: String,

    /// Table name to update.
    #[arg(required = true)]
    pub table: String,

    /// New role allowed to insert records.
    #[arg(long, value_enum, value_name = "ROLE")]
    pub insert: Option<Role>,

    /// New role allowed to read records.
    #[arg(long, value_enum, value_name = "ROLE")]
    pub read: Option<Role>,

    /// New role allowed to update records.
    #[arg(long, value_enum, value_name = "ROLE")]
    pub update: Option<Role>,

    /// New role allowed to delete records.
    #[arg(long, value_enum, value_name = "ROLE")]
    pub delete: Option<Role>,

    /// Columns to drop (comma-separated or repeated).
    #[arg(long = "delete-column", value_name = "COLUMN", value_delimiter = ',')]
    pub delete_column: Vec<String>,

    /// Columns to index (comma-separated or repeated).
    #[arg(long = "add-index", value_name = "COLUMN", value_delimiter = ',')]
    pub add_index: Vec<String>,

    /// Columns whose index to drop (comma-separated or repeated).
    #[arg(long = "delete-index", value_name = "COLUMN", value_delimiter = ',')]
    pub delete_index: Vec<String>,
}

/// Arguments for browsing table records.
#[derive(Parser, Debug, Clone)]
pub struct TableDataArgs {
    /// Service that owns the table.
    #[arg(required = true)]
    pub service: String,

    /// Table whose records to browse.
    #[arg(required = true)]
    pub table: String,

    /// Number of records to fetch.
    #[arg(long, value_name = "N")]
    pub top: Option<u32>,

    /// Number of records to skip.
    #[arg(long, value_name = "N")]
    pub skip: Option<u32>,

    /// Raw query pairs (`key=value` joined with `&`), overrides the other flags.
    #[arg(long, value_name = "QUERY")]
    pub query: Option<String>,
}

/// Script subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ScriptCommands {
    /// List all scripts of a service, grouped by kind.
    List {
        /// Service to inspect.
        service: String,
    },

    /// Download a script.
    Download {
        /// Service that owns the script.
        service: String,

        /// Routable script name (for example `table/items.insert`).
        script: String,

        /// Destination path, defaults to `./<kind>/<name>.js`.
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,

        /// Print the script body instead of saving it.
        #[arg(long)]
        stdout: bool,

        /// Overwrite the destination file if it exists.
        #[arg(long)]
        force: bool,
    },

    /// Upload a script.
    Upload {
        /// Service that owns the script.
        service: String,

        /// Routable script name (for example `scheduler/backup`).
        script: String,

        /// Source path, defaults to `./<kind>/<name>.js`.
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
    },

    /// Delete a script.
    ///
    /// Deleting a scheduler script removes the whole job.
    Delete {
        /// Service that owns the script.
        service: String,

        /// Routable script name.
        script: String,
    },
}
