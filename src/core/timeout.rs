//! Deadline enforcement for a single task operation.

use std::future::Future;
use std::time::Duration;

use super::{AppResult, TaskError};

/// Races an operation against a timer.
///
/// If the timer elapses first the guarded call fails with
/// [`TaskError::Timeout`] and the operation future is dropped, so it stops at
/// its next await point. Work the operation handed off elsewhere (spawned
/// tasks, threads) keeps running. If the operation finishes first its
/// outcome is returned unchanged, with errors mapped to [`TaskError::Failed`].
///
/// A zero or absent limit means the operation runs unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeoutGuard {
    limit: Option<Duration>,
}

impl TimeoutGuard {
    /// Create a guard. `Some(Duration::ZERO)` is treated as unbounded.
    pub fn new(limit: Option<Duration>) -> Self {
        Self {
            limit: limit.filter(|d| !d.is_zero()),
        }
    }

    /// A guard that never times out.
    pub const fn unbounded() -> Self {
        Self { limit: None }
    }

    /// The effective deadline, if any.
    pub const fn limit(&self) -> Option<Duration> {
        self.limit
    }

    /// Drive `operation` to completion or until the deadline elapses.
    pub async fn run<T, F>(&self, operation: F) -> Result<T, TaskError>
    where
        F: Future<Output = AppResult<T>>,
    {
        let Some(limit) = self.limit else {
            return operation.await.map_err(|e| TaskError::from_failure(&e));
        };

        match tokio::time::timeout(limit, operation).await {
            Ok(outcome) => outcome.map_err(|e| TaskError::from_failure(&e)),
            Err(_elapsed) => Err(TaskError::Timeout { after: limit }),
        }
    }
}
