//! Scheduler configuration structures.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable overriding [`SchedulerConfig::max_concurrency`].
pub const ENV_MAX_CONCURRENCY: &str = "SCHEDULER_MAX_CONCURRENCY";
/// Environment variable overriding [`SchedulerConfig::poll_interval_ms`].
pub const ENV_POLL_INTERVAL_MS: &str = "SCHEDULER_POLL_INTERVAL_MS";
/// Environment variable overriding [`SchedulerConfig::admission`].
pub const ENV_ADMISSION: &str = "SCHEDULER_ADMISSION";
/// Environment variable overriding [`SchedulerConfig::default_timeout_ms`].
pub const ENV_DEFAULT_TIMEOUT_MS: &str = "SCHEDULER_DEFAULT_TIMEOUT_MS";

/// Default delay between eligibility passes in sequential mode.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// How admitted tasks are driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionMode {
    /// Run up to `max_concurrency` tasks at once and re-evaluate eligibility
    /// as soon as any of them finishes.
    #[default]
    Concurrent,
    /// Await each admitted task before considering the next candidate and
    /// sleep `poll_interval_ms` between passes. At most one task runs at a
    /// time regardless of `max_concurrency`.
    Sequential,
}

impl FromStr for AdmissionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "concurrent" => Ok(Self::Concurrent),
            "sequential" => Ok(Self::Sequential),
            other => Err(format!("unknown admission mode `{other}`")),
        }
    }
}

/// Root scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Maximum number of tasks running at once.
    pub max_concurrency: usize,
    /// Delay between eligibility passes in sequential mode (milliseconds).
    pub poll_interval_ms: u64,
    /// Admission strategy.
    pub admission: AdmissionMode,
    /// Deadline applied to tasks registered without one (milliseconds).
    pub default_timeout_ms: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: num_cpus::get().max(1),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            admission: AdmissionMode::default(),
            default_timeout_ms: None,
        }
    }
}

impl SchedulerConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrency == 0 {
            return Err("max_concurrency must be greater than 0".into());
        }
        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse scheduler configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from defaults overridden by `SCHEDULER_*`
    /// environment variables. A `.env` file is loaded first when present.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();

        let mut cfg = Self::default();
        if let Some(v) = env_parse::<usize>(ENV_MAX_CONCURRENCY)? {
            cfg.max_concurrency = v;
        }
        if let Some(v) = env_parse::<u64>(ENV_POLL_INTERVAL_MS)? {
            cfg.poll_interval_ms = v;
        }
        if let Some(v) = env_parse::<AdmissionMode>(ENV_ADMISSION)? {
            cfg.admission = v;
        }
        if let Some(v) = env_parse::<u64>(ENV_DEFAULT_TIMEOUT_MS)? {
            cfg.default_timeout_ms = Some(v);
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Polling interval as a [`Duration`].
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Default task deadline; zero means unbounded.
    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

fn env_parse<V>(key: &str) -> Result<Option<V>, String>
where
    V: FromStr,
    V::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| format!("{key}: {e}")),
        Err(_) => Ok(None),
    }
}
