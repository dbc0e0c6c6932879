//! Ordered update plans with continue-on-error execution.
//!
//! A [`Plan`] is a list of labelled steps built up front and then executed
//! strictly in order. A failed step is counted and reported, never fatal:
//! the remaining steps still run, and the caller receives one aggregate
//! [`PlanOutcome`] at the end.

use std::future::Future;

use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::error::SkerryError;

/// Observer for step-by-step plan progress.
pub trait StepReporter {
    /// Called immediately before a step starts.
    fn on_progress(&mut self, label: &str);
    /// Called after a step completes successfully.
    fn on_success(&mut self, label: &str);
    /// Called after a step fails.
    fn on_failure(&mut self, label: &str);
}

/// Reporter that discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl StepReporter for SilentReporter {
    fn on_progress(&mut self, _label: &str) {}
    fn on_success(&mut self, _label: &str) {}
    fn on_failure(&mut self, _label: &str) {}
}

/// One labelled step of a [`Plan`].
pub struct PlanStep {
    progress: String,
    success: String,
    failure: String,
    action: BoxFuture<'static, Result<(), SkerryError>>,
}

impl PlanStep {
    /// Creates a step from its three labels and the action to run.
    ///
    /// The labels are announced through the [`StepReporter`]: `progress`
    /// before the action starts, then `success` or `failure` depending on
    /// how it ends.
    pub fn new(
        progress: impl Into<String>,
        success: impl Into<String>,
        failure: impl Into<String>,
        action: impl Future<Output = Result<(), SkerryError>> + Send + 'static,
    ) -> Self {
        Self {
            progress: progress.into(),
            success: success.into(),
            failure: failure.into(),
            action: Box::pin(action),
        }
    }
}

/// An ordered list of update steps.
#[derive(Default)]
pub struct Plan {
    steps: Vec<PlanStep>,
}

impl Plan {
    /// Creates an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Appends a step to the end of the plan.
    pub fn push(&mut self, step: PlanStep) {
        self.steps.push(step);
    }

    /// Number of steps currently planned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True when the plan holds no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Runs every step strictly in order, continuing past failures.
    ///
    /// Each step starts only after the previous one has fully completed.
    /// The step action runs as its own task, so a panic inside it is
    /// contained: it counts as a failure and execution advances to the
    /// next step. An empty plan yields [`PlanOutcome::Empty`] without
    /// reporting anything.
    pub async fn execute(self, reporter: &mut impl StepReporter) -> PlanOutcome {
        if self.steps.is_empty() {
            return PlanOutcome::Empty;
        }

        let steps = self.steps.len();
        let mut failures = 0_usize;
        for (index, step) in self.steps.into_iter().enumerate() {
            reporter.on_progress(&step.progress);
            debug!(step = index, label = %step.progress, "plan step started");
            match tokio::spawn(step.action).await {
                Ok(Ok(())) => reporter.on_success(&step.success),
                Ok(Err(error)) => {
                    failures += 1;
                    warn!(step = index, error = %error, "plan step failed");
                    reporter.on_failure(&step.failure);
                }
                Err(join_error) => {
                    failures += 1;
                    warn!(step = index, error = %join_error, "plan step panicked");
                    reporter.on_failure(&step.failure);
                }
            }
        }

        if failures == 0 {
            PlanOutcome::Completed { steps }
        } else {
            PlanOutcome::Incomplete { steps, failures }
        }
    }
}

/// Aggregate result of executing a [`Plan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanOutcome {
    /// The plan held no steps; nothing was attempted.
    Empty,
    /// Every step completed successfully.
    Completed {
        /// Steps executed.
        steps: usize,
    },
    /// At least one step failed; the remaining steps still ran.
    Incomplete {
        /// Steps executed.
        steps: usize,
        /// Steps that failed.
        failures: usize,
    },
}

impl PlanOutcome {
    /// True unless at least one step failed.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        !matches!(self, Self::Incomplete { .. })
    }
}
