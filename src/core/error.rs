//! Error types for scheduler operations and individual task outcomes.

use std::time::Duration;

use thiserror::Error;

use crate::core::TaskStatus;
use crate::util::serde::TaskId;

/// Errors produced by scheduler components.
///
/// These are returned from API calls on the scheduler and registry. Failures of
/// individual task bodies are never surfaced through this type; they are
/// recorded as [`TaskError`] on the task itself.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// No task with this identifier was registered.
    #[error("unknown task: {0}")]
    UnknownTask(TaskId),
    /// A string could not be parsed as a task identifier.
    #[error("invalid task id: {0}")]
    InvalidTaskId(String),
    /// A dependency references a task that has not been registered.
    #[error("dependency on unregistered task: {0}")]
    UnknownDependency(TaskId),
    /// A status change would move a task backwards or out of a terminal state.
    #[error("invalid status transition for {task}: {from} -> {to}")]
    InvalidTransition {
        /// Task whose status was being changed.
        task: TaskId,
        /// Current status.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },
    /// `execute_tasks` was called while another execution is in progress.
    #[error("scheduler is already executing")]
    AlreadyRunning,
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Scheduler fault unrelated to any single task.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Why a task ended in the `failed` status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// The operation did not finish within its deadline.
    #[error("timed out after {}ms", .after.as_millis())]
    Timeout {
        /// The deadline that elapsed.
        after: Duration,
    },
    /// The operation returned an error.
    #[error("failed: {0}")]
    Failed(String),
    /// The operation panicked while running.
    #[error("panicked: {0}")]
    Panicked(String),
    /// The run that admitted the task was dropped before the outcome came back.
    #[error("cancelled: execution was dropped before the task finished")]
    Cancelled,
}

impl TaskError {
    /// Wrap an operation error, keeping its full context chain.
    pub fn from_failure(err: &anyhow::Error) -> Self {
        Self::Failed(format!("{err:#}"))
    }

    /// Whether this failure was caused by the deadline elapsing.
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Application-facing result using anyhow for higher-level contexts.
///
/// Task operations return this type.
pub type AppResult<T> = Result<T, anyhow::Error>;
