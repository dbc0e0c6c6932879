//! Script-name routing.
//!
//! Server-side scripts are addressed by slash/dot names such as
//! `table/orders.insert`, `scheduler/cleanup`, or `shared/apnsFeedback`.
//! [`ScriptName::parse`] maps a name to its typed form without performing
//! any I/O; names that fit no pattern are rejected.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::SkerryError;

/// The only script name recognized under the `shared/` prefix.
pub const SHARED_FEEDBACK: &str = "apnsFeedback";

static TABLE_SCRIPT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^table/([^.]+)\.(insert|read|update|delete)(?:\.js)?$")
        .unwrap_or_else(|_| unreachable!())
});

static SCHEDULER_SCRIPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^scheduler/([^.]+)(?:\.js)?$").unwrap_or_else(|_| unreachable!()));

static SHARED_SCRIPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^shared/apnsFeedback(?:\.js)?$").unwrap_or_else(|_| unreachable!()));

/// Operation slot of a table script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableOperation {
    /// Runs when records are inserted.
    Insert,
    /// Runs when records are read.
    Read,
    /// Runs when records are updated.
    Update,
    /// Runs when records are deleted.
    Delete,
}

impl TableOperation {
    /// All operations in canonical order.
    pub const ALL: [Self; 4] = [Self::Insert, Self::Read, Self::Update, Self::Delete];

    /// Lowercase wire name of the operation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl FromStr for TableOperation {
    type Err = SkerryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "insert" => Ok(Self::Insert),
            "read" => Ok(Self::Read),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(SkerryError::UnrecognizedScript {
                name: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for TableOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broad grouping of script locations, used to organize listings and
/// default download paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptKind {
    /// Scripts attached to a table operation.
    Table,
    /// Scripts attached to a scheduled job.
    Scheduler,
    /// Platform-owned shared scripts.
    Shared,
}

impl ScriptKind {
    /// Lowercase name of the kind, matching the name prefix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Scheduler => "scheduler",
            Self::Shared => "shared",
        }
    }
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed server-side script name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptName {
    /// A table script: `table/<table>.<operation>`.
    Table {
        /// Table the script is attached to.
        table: String,
        /// Operation slot the script occupies.
        operation: TableOperation,
    },
    /// A scheduled-job script: `scheduler/<job>`.
    Scheduler {
        /// Name of the job.
        job: String,
    },
    /// A shared platform script. The only one is [`SHARED_FEEDBACK`].
    Shared {
        /// Script name, always [`SHARED_FEEDBACK`].
        name: String,
    },
}

impl ScriptName {
    /// Parses a script name such as `table/orders.read` or
    /// `scheduler/cleanup.js`.
    ///
    /// A trailing `.js` extension is accepted and stripped. Recognition is
    /// case-sensitive and anchored; a name that fits no pattern yields
    /// [`SkerryError::UnrecognizedScript`]. The only name recognized under
    /// `shared/` is [`SHARED_FEEDBACK`].
    pub fn parse(name: &str) -> Result<Self, SkerryError> {
        if let Some(caps) = TABLE_SCRIPT_RE.captures(name) {
            if let (Some(table), Some(operation)) = (caps.get(1), caps.get(2)) {
                return Ok(Self::Table {
                    table: table.as_str().to_string(),
                    operation: operation.as_str().parse()?,
                });
            }
        }
        if let Some(caps) = SCHEDULER_SCRIPT_RE.captures(name) {
            if let Some(job) = caps.get(1) {
                return Ok(Self::Scheduler {
                    job: job.as_str().to_string(),
                });
            }
        }
        if SHARED_SCRIPT_RE.is_match(name) {
            return Ok(Self::Shared {
                name: SHARED_FEEDBACK.to_string(),
            });
        }
        Err(SkerryError::UnrecognizedScript {
            name: name.to_string(),
        })
    }

    /// The broad kind of the script.
    #[must_use]
    pub const fn kind(&self) -> ScriptKind {
        match self {
            Self::Table { .. } => ScriptKind::Table,
            Self::Scheduler { .. } => ScriptKind::Scheduler,
            Self::Shared { .. } => ScriptKind::Shared,
        }
    }
}

impl FromStr for ScriptName {
    type Err = SkerryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ScriptName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table { table, operation } => write!(f, "table/{table}.{operation}"),
            Self::Scheduler { job } => write!(f, "scheduler/{job}"),
            Self::Shared { name } => write!(f, "shared/{name}"),
        }
    }
}
