//! Concurrent fan-out over named remote reads.
//!
//! A [`Collector`] starts every registered action at the same time and
//! returns one [`Collected`] merge input after the last action has
//! completed, failed, timed out, or panicked. Failures are counted and
//! logged, never raised, and never interrupt the other actions.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use futures::future::BoxFuture;
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::warn;

use crate::error::SkerryError;

/// Default per-action deadline.
pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Builder for a named fan-out pass.
pub struct Collector {
    actions: BTreeMap<String, BoxFuture<'static, Result<Value, SkerryError>>>,
    timeout: Duration,
}

impl Collector {
    /// Creates an empty pass with the default per-action timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            actions: BTreeMap::new(),
            timeout: DEFAULT_ACTION_TIMEOUT,
        }
    }

    /// Registers `action` under `name`.
    ///
    /// Registering the same name again replaces the earlier action before
    /// the run starts; the result map holds exactly one slot per name.
    #[must_use]
    pub fn action<F>(mut self, name: impl Into<String>, action: F) -> Self
    where
        F: Future<Output = Result<Value, SkerryError>> + Send + 'static,
    {
        self.actions.insert(name.into(), Box::pin(action));
        self
    }

    /// Overrides the per-action timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Runs every action to completion and returns the merged view.
    ///
    /// All actions are spawned before the first result is taken, so they
    /// run concurrently. Each completion is counted exactly once; the call
    /// returns only after the last one, leaving no task behind.
    pub async fn run(self) -> Collected {
        let expected = self.actions.len();
        let timeout = self.timeout;
        let mut set = JoinSet::new();
        for (name, action) in self.actions {
            set.spawn(async move {
                let outcome = tokio::time::timeout(timeout, action).await;
                (name, outcome)
            });
        }

        let mut results = BTreeMap::new();
        let mut failed = 0_usize;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((name, Ok(Ok(value)))) => {
                    results.insert(name, value);
                }
                Ok((name, Ok(Err(error)))) => {
                    failed += 1;
                    warn!(action = %name, error = %error, "collect action failed");
                }
                Ok((name, Err(_elapsed))) => {
                    failed += 1;
                    warn!(action = %name, ?timeout, "collect action timed out");
                }
                Err(join_error) => {
                    failed += 1;
                    warn!(error = %join_error, "collect action panicked");
                }
            }
        }

        Collected {
            results,
            failed,
            expected,
        }
    }
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a fan-out pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Collected {
    /// Successful results keyed by action name. Failed actions have no
    /// entry here.
    pub results: BTreeMap<String, Value>,
    /// Number of actions that failed, timed out, or panicked.
    pub failed: usize,
    /// Number of actions registered for the pass.
    pub expected: usize,
}

impl Collected {
    /// True when every action produced a result.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed == 0 && self.results.len() == self.expected
    }

    /// Successful result for `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.results.get(name)
    }
}
