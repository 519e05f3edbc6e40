//! Builder to construct a scheduler from configuration.

use std::time::Duration;

use crate::config::{AdmissionMode, SchedulerConfig};
use crate::core::{AuditSink, Scheduler, SchedulerError};
use crate::runtime::TokioSpawner;

/// Builder for [`Scheduler`].
///
/// Starts from [`SchedulerConfig::default`]; individual settings override it
/// and the result is validated by [`build`](Self::build).
pub struct SchedulerBuilder<S = TokioSpawner> {
    config: SchedulerConfig,
    spawner: S,
    audit: Option<Box<dyn AuditSink>>,
}

impl Default for SchedulerBuilder<TokioSpawner> {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerBuilder<TokioSpawner> {
    /// Builder using default configuration and the ambient tokio runtime.
    pub fn new() -> Self {
        Self {
            config: SchedulerConfig::default(),
            spawner: TokioSpawner::ambient(),
            audit: None,
        }
    }
}

impl<S> SchedulerBuilder<S> {
    /// Replace the whole configuration.
    #[must_use]
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Maximum number of tasks running at once.
    #[must_use]
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.config.max_concurrency = max_concurrency;
        self
    }

    /// Admission strategy.
    #[must_use]
    pub fn with_admission(mut self, admission: AdmissionMode) -> Self {
        self.config.admission = admission;
        self
    }

    /// Delay between sequential admission passes.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Deadline for tasks registered without one.
    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.config.default_timeout_ms =
            Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Record lifecycle events into `sink`.
    #[must_use]
    pub fn with_audit(mut self, sink: impl AuditSink + 'static) -> Self {
        self.audit = Some(Box::new(sink));
        self
    }

    /// Use a different spawner for concurrent admission.
    pub fn with_spawner<S2>(self, spawner: S2) -> SchedulerBuilder<S2> {
        SchedulerBuilder {
            config: self.config,
            spawner,
            audit: self.audit,
        }
    }

    /// Configuration accumulated so far.
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Validate the configuration and build the scheduler.
    pub fn build<T>(self) -> Result<Scheduler<T, S>, SchedulerError>
    where
        T: Send + Sync + 'static,
    {
        let scheduler = Scheduler::with_spawner(self.config, self.spawner)?;
        Ok(match self.audit {
            Some(audit) => scheduler.with_audit(audit),
            None => scheduler,
        })
    }
}
