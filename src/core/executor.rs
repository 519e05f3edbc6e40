//! Task operation and spawning traits.

use std::future::Future;

use async_trait::async_trait;

use super::AppResult;

/// A zero-argument asynchronous unit of work.
///
/// The scheduler calls [`run`](TaskOperation::run) exactly once per task.
/// Any `Fn() -> impl Future<Output = AppResult<T>>` closure implements this
/// trait, so most callers never implement it by hand.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use prometheus_task_scheduler::core::{AppResult, TaskOperation};
///
/// struct FetchModel {
///     name: String,
/// }
///
/// #[async_trait]
/// impl TaskOperation<usize> for FetchModel {
///     async fn run(&self) -> AppResult<usize> {
///         Ok(self.name.len())
///     }
/// }
/// ```
#[async_trait]
pub trait TaskOperation<T>: Send + Sync + 'static {
    /// Run the operation to completion.
    ///
    /// Returning `Err` marks the task failed; the error is recorded, never
    /// propagated to the caller of `execute_tasks`.
    async fn run(&self) -> AppResult<T>;
}

#[async_trait]
impl<T, F, Fut> TaskOperation<T> for F
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<T>> + Send + 'static,
{
    async fn run(&self) -> AppResult<T> {
        (self)().await
    }
}

/// Abstraction for spawning task execution on a runtime.
pub trait Spawn {
    /// Spawn a future that runs to completion in the background.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}
