//! Dependency-gated, priority-ordered admission under a concurrency cap.
//!
//! Each pass computes the eligible set (pending tasks whose dependencies are
//! all terminal), orders it by descending priority with submission order as
//! the tie-break, and admits tasks while fewer than `max_concurrency` are
//! running. Admitted tasks run through a [`TimeoutGuard`]; their outcomes are
//! written back to the registry as `completed` or `failed`. A failing task
//! never aborts the run and still unblocks its dependents.
//!
//! Two admission modes are supported, see [`AdmissionMode`]:
//!
//! - `Concurrent` spawns up to the cap through the [`Spawn`] seam and collects
//!   completions on a channel, re-evaluating eligibility after each one.
//! - `Sequential` awaits every admitted task before looking at the next
//!   candidate and sleeps the poll interval between passes, so at most one
//!   task is ever running.

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::builders::TaskSpec;
use crate::config::{AdmissionMode, SchedulerConfig};
use crate::core::{
    build_audit_event, AuditAction, AuditSink, SchedulerError, Spawn, StatusReporter, TaskError,
    TaskOperation, TaskRegistry, TaskStatus, TimeoutGuard,
};
use crate::runtime::TokioSpawner;
use crate::util::serde::{Priority, TaskId};

/// Outcome counters for one [`Scheduler::execute_tasks`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Tasks that completed during this call.
    pub completed: usize,
    /// Tasks that failed (error, timeout or panic) during this call.
    pub failed: usize,
    /// Highest number of simultaneously running tasks.
    pub max_observed_running: usize,
    /// Time spent inside the call.
    pub elapsed: Duration,
}

/// An admitted task whose outcome has not reached the scheduler loop yet.
///
/// If it is dropped unsettled (the `execute_tasks` future was cancelled, or
/// the completion channel is gone) it writes the outcome it carries straight
/// to the registry, or [`TaskError::Cancelled`] when the operation never
/// finished. No task is left `running` after its run goes away.
struct InFlight<T> {
    id: TaskId,
    registry: Arc<RwLock<TaskRegistry<T>>>,
    outcome: Option<Result<T, TaskError>>,
    settled: bool,
}

impl<T> InFlight<T> {
    const fn new(id: TaskId, registry: Arc<RwLock<TaskRegistry<T>>>) -> Self {
        Self {
            id,
            registry,
            outcome: None,
            settled: false,
        }
    }

    /// Hand the outcome to the scheduler loop, which records it.
    fn settle(mut self) -> (TaskId, Result<T, TaskError>) {
        self.settled = true;
        let outcome = self.outcome.take().unwrap_or(Err(TaskError::Cancelled));
        (self.id, outcome)
    }
}

impl<T> Drop for InFlight<T> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let outcome = self.outcome.take().unwrap_or(Err(TaskError::Cancelled));
        let failure = outcome.as_ref().err().map(ToString::to_string);
        match self.registry.write().finish(self.id, outcome) {
            Ok(status) => warn!(
                task = %self.id,
                %status,
                error = failure.as_deref().unwrap_or(""),
                "outcome recorded after execution was dropped"
            ),
            Err(err) => error!(task = %self.id, error = %err, "orphaned task not recorded"),
        }
    }
}

/// Clears the single-flight flag even if `execute_tasks` is dropped mid-run.
struct ExecutionGuard<'a>(&'a AtomicBool);

impl Drop for ExecutionGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Scheduler over a batch of asynchronous tasks.
///
/// # Example
///
/// ```rust,ignore
/// use prometheus_task_scheduler::config::SchedulerConfig;
/// use prometheus_task_scheduler::core::Scheduler;
///
/// let scheduler = Scheduler::<u32>::new(SchedulerConfig::default())?;
/// let fetch = scheduler.add_task(|| async { anyhow::Ok(1_u32) }, 5, [], None)?;
/// let parse = scheduler.add_task(|| async { anyhow::Ok(2_u32) }, 1, [fetch], None)?;
///
/// let monitor = scheduler.reporter();
/// tokio::spawn(async move { println!("{:?}", monitor.snapshot()) });
///
/// let summary = scheduler.execute_tasks().await?;
/// assert_eq!(summary.completed, 2);
/// ```
pub struct Scheduler<T, S = TokioSpawner> {
    config: SchedulerConfig,
    registry: Arc<RwLock<TaskRegistry<T>>>,
    spawner: S,
    audit: Option<Arc<Mutex<Box<dyn AuditSink>>>>,
    executing: AtomicBool,
}

impl<T> Scheduler<T, TokioSpawner>
where
    T: Send + Sync + 'static,
{
    /// Create a scheduler that spawns tasks on the ambient tokio runtime.
    pub fn new(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        Self::with_spawner(config, TokioSpawner::ambient())
    }
}

impl<T, S> Scheduler<T, S>
where
    T: Send + Sync + 'static,
{
    /// Create a scheduler with a custom spawner.
    pub fn with_spawner(config: SchedulerConfig, spawner: S) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;
        Ok(Self {
            config,
            registry: Arc::new(RwLock::new(TaskRegistry::new())),
            spawner,
            audit: None,
            executing: AtomicBool::new(false),
        })
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(Arc::new(Mutex::new(audit)));
        self
    }

    /// Active configuration.
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Register a task and return its id (`task1`, `task2`, ...).
    ///
    /// Dependencies must name already-registered tasks. A `None` or zero
    /// timeout falls back to the configured default, if any.
    pub fn add_task<O, P, I>(
        &self,
        operation: O,
        priority: P,
        dependencies: I,
        timeout: Option<Duration>,
    ) -> Result<TaskId, SchedulerError>
    where
        O: TaskOperation<T>,
        P: Into<Priority>,
        I: IntoIterator<Item = TaskId>,
    {
        self.register(Arc::new(operation), priority.into(), dependencies, timeout)
    }

    /// Register a task described by a [`TaskSpec`].
    pub fn submit(&self, spec: TaskSpec<T>) -> Result<TaskId, SchedulerError> {
        let (operation, priority, dependencies, timeout) = spec.into_parts();
        self.register(operation, priority, dependencies, timeout)
    }

    fn register<I>(
        &self,
        operation: Arc<dyn TaskOperation<T>>,
        priority: Priority,
        dependencies: I,
        timeout: Option<Duration>,
    ) -> Result<TaskId, SchedulerError>
    where
        I: IntoIterator<Item = TaskId>,
    {
        let timeout = timeout
            .filter(|d| !d.is_zero())
            .or_else(|| self.config.default_timeout());
        let (id, running) = {
            let mut registry = self.registry.write();
            let id = registry.register(operation, priority, dependencies, timeout)?;
            (id, registry.running_count())
        };
        self.record_audit(id, AuditAction::Register, running, None);
        Ok(id)
    }

    /// Snapshot of every task's status.
    pub fn get_status(&self) -> BTreeMap<TaskId, TaskStatus> {
        self.registry.read().snapshot()
    }

    /// Read-only handle for monitoring from other tasks.
    pub fn reporter(&self) -> StatusReporter<T> {
        StatusReporter::new(Arc::clone(&self.registry))
    }

    /// Take the result of a completed task.
    pub fn take_result(&self, id: TaskId) -> Option<T> {
        self.registry.write().take_result(id)
    }

    /// Failure reason of a failed task.
    pub fn failure(&self, id: TaskId) -> Option<TaskError> {
        self.registry
            .read()
            .get(id)
            .ok()
            .and_then(|r| r.failure().cloned())
    }

    /// Number of registered tasks.
    pub fn task_count(&self) -> usize {
        self.registry.read().len()
    }

    fn record_audit(&self, id: TaskId, action: AuditAction, running: usize, detail: Option<String>) {
        if let Some(audit) = &self.audit {
            audit
                .lock()
                .record(build_audit_event(id, action, running, detail));
        }
    }

    fn admit(
        &self,
        id: TaskId,
        summary: &mut RunSummary,
    ) -> Result<(Arc<dyn TaskOperation<T>>, TimeoutGuard, InFlight<T>), SchedulerError> {
        let (operation, guard, priority, running) = {
            let mut registry = self.registry.write();
            registry.set_status(id, TaskStatus::Running)?;
            let record = registry.get(id)?;
            (
                record.operation(),
                TimeoutGuard::new(record.timeout()),
                record.priority(),
                registry.running_count(),
            )
        };

        summary.max_observed_running = summary.max_observed_running.max(running);
        info!(task = %id, %priority, running, "task admitted");
        self.record_audit(id, AuditAction::Admit, running, None);
        Ok((operation, guard, InFlight::new(id, Arc::clone(&self.registry))))
    }

    fn complete(
        &self,
        id: TaskId,
        outcome: Result<T, TaskError>,
        summary: &mut RunSummary,
    ) -> Result<(), SchedulerError> {
        let failure = outcome.as_ref().err().cloned();
        let running = {
            let mut registry = self.registry.write();
            registry.finish(id, outcome)?;
            registry.running_count()
        };

        match failure {
            None => {
                summary.completed += 1;
                info!(task = %id, running, "task completed");
                self.record_audit(id, AuditAction::Complete, running, None);
            }
            Some(err) => {
                summary.failed += 1;
                warn!(task = %id, running, error = %err, "task failed");
                let action = if err.is_timeout() {
                    AuditAction::Timeout
                } else {
                    AuditAction::Fail
                };
                self.record_audit(id, action, running, Some(err.to_string()));
            }
        }
        Ok(())
    }

    fn stalled(&self) -> SchedulerError {
        let pending = self.registry.read().pending_count();
        error!(pending, "no eligible or running task while tasks are pending");
        SchedulerError::Internal(format!("scheduler stalled with {pending} pending task(s)"))
    }
}

impl<T, S> Scheduler<T, S>
where
    T: Send + Sync + 'static,
    S: Spawn,
{
    /// Run every pending task to a terminal status.
    ///
    /// Per-task failures and timeouts are recorded on the task and never
    /// returned here. An `Err` means the scheduler itself is broken, or that
    /// another `execute_tasks` call is already in progress. Tasks registered
    /// while this call runs are picked up before it returns.
    ///
    /// Dropping the returned future leaves no task stranded in `running`.
    /// Tasks already spawned in concurrent mode finish in the background and
    /// record their own outcome. A task interrupted in sequential mode fails
    /// with [`TaskError::Cancelled`]. A later call waits for the stragglers
    /// and then runs whatever is still pending.
    pub async fn execute_tasks(&self) -> Result<RunSummary, SchedulerError> {
        if self
            .executing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SchedulerError::AlreadyRunning);
        }
        let _guard = ExecutionGuard(&self.executing);

        let started = Instant::now();
        let mut summary = RunSummary::default();
        let pending = self.registry.read().pending_count();
        info!(
            mode = ?self.config.admission,
            max_concurrency = self.config.max_concurrency,
            pending,
            "executing tasks"
        );

        match self.config.admission {
            AdmissionMode::Concurrent => self.run_concurrent(&mut summary).await?,
            AdmissionMode::Sequential => self.run_sequential(&mut summary).await?,
        }

        summary.elapsed = started.elapsed();
        info!(
            completed = summary.completed,
            failed = summary.failed,
            max_running = summary.max_observed_running,
            elapsed_ms = u64::try_from(summary.elapsed.as_millis()).unwrap_or(u64::MAX),
            "all tasks terminal"
        );
        Ok(summary)
    }

    async fn run_concurrent(&self, summary: &mut RunSummary) -> Result<(), SchedulerError> {
        let cap = self.config.max_concurrency;
        let (tx, mut rx) = mpsc::unbounded_channel::<InFlight<T>>();
        let mut in_flight = 0_usize;

        loop {
            let candidates = self.registry.read().eligible();
            debug!(eligible = candidates.len(), in_flight, "admission pass");

            for id in candidates {
                if self.registry.read().running_count() >= cap {
                    break;
                }
                let (operation, guard, mut flight) = self.admit(id, summary)?;
                in_flight += 1;

                let tx = tx.clone();
                self.spawner.spawn(async move {
                    flight.outcome = Some(run_operation(operation, guard).await);
                    // A closed channel hands `flight` back; dropping it records the outcome.
                    let _ = tx.send(flight);
                });
            }

            if in_flight == 0 {
                let (pending, running) = {
                    let registry = self.registry.read();
                    (registry.pending_count(), registry.running_count())
                };
                if pending == 0 && running == 0 {
                    return Ok(());
                }
                if running == 0 {
                    return Err(self.stalled());
                }
                // Tasks admitted by a cancelled run are still finishing.
                debug!(running, pending, "waiting on tasks from a dropped run");
                tokio::time::sleep(self.config.poll_interval()).await;
                continue;
            }

            let Some(done) = rx.recv().await else {
                return Err(SchedulerError::Internal(
                    "completion channel closed".to_string(),
                ));
            };
            in_flight -= 1;
            let (id, outcome) = done.settle();
            self.complete(id, outcome, summary)?;

            while let Ok(done) = rx.try_recv() {
                in_flight -= 1;
                let (id, outcome) = done.settle();
                self.complete(id, outcome, summary)?;
            }
        }
    }

    async fn run_sequential(&self, summary: &mut RunSummary) -> Result<(), SchedulerError> {
        let cap = self.config.max_concurrency;
        let poll = self.config.poll_interval();
        let mut pass = 0_u64;

        while self.registry.read().pending_count() > 0 {
            pass += 1;
            let candidates = self.registry.read().eligible();
            debug!(pass, eligible = candidates.len(), "sequential admission pass");
            if candidates.is_empty() && self.registry.read().running_count() == 0 {
                return Err(self.stalled());
            }

            for id in candidates {
                if self.registry.read().running_count() >= cap {
                    break;
                }
                let (operation, guard, mut flight) = self.admit(id, summary)?;
                flight.outcome = Some(run_operation(operation, guard).await);
                let (id, outcome) = flight.settle();
                self.complete(id, outcome, summary)?;
            }

            tokio::time::sleep(poll).await;
        }
        Ok(())
    }
}

/// Run one operation under its deadline, turning a panic into a task failure.
async fn run_operation<T>(
    operation: Arc<dyn TaskOperation<T>>,
    guard: TimeoutGuard,
) -> Result<T, TaskError>
where
    T: Send + 'static,
{
    let guarded = guard.run(async move { operation.run().await });
    match AssertUnwindSafe(guarded).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(panic) => Err(TaskError::Panicked(panic_message(panic.as_ref()))),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
