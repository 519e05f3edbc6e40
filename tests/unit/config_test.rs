//! Tests for configuration validation

use prometheus_task_scheduler::config::{AdmissionMode, SchedulerConfig};
use std::time::Duration;

#[test]
fn test_scheduler_config_defaults() {
    let config = SchedulerConfig::default();
    assert!(config.max_concurrency >= 1);
    assert_eq!(config.poll_interval_ms, 100);
    assert_eq!(config.admission, AdmissionMode::Concurrent);
    assert_eq!(config.default_timeout(), None);
    assert!(config.validate().is_ok());
}

#[test]
fn test_scheduler_config_invalid_concurrency() {
    let invalid = SchedulerConfig {
        max_concurrency: 0,
        ..SchedulerConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_scheduler_config_invalid_poll_interval() {
    let invalid = SchedulerConfig {
        poll_interval_ms: 0,
        ..SchedulerConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_zero_default_timeout_is_unbounded() {
    let config = SchedulerConfig {
        default_timeout_ms: Some(0),
        ..SchedulerConfig::default()
    };
    assert_eq!(config.default_timeout(), None);

    let config = SchedulerConfig {
        default_timeout_ms: Some(1500),
        ..SchedulerConfig::default()
    };
    assert_eq!(config.default_timeout(), Some(Duration::from_millis(1500)));
}

#[test]
fn test_config_from_json() {
    let config = SchedulerConfig::from_json_str(
        r#"{"max_concurrency": 4, "admission": "sequential", "default_timeout_ms": 2000}"#,
    )
    .unwrap();
    assert_eq!(config.max_concurrency, 4);
    assert_eq!(config.admission, AdmissionMode::Sequential);
    assert_eq!(config.poll_interval(), Duration::from_millis(100));
    assert_eq!(config.default_timeout(), Some(Duration::from_secs(2)));
}

#[test]
fn test_config_from_json_rejects_invalid() {
    assert!(SchedulerConfig::from_json_str(r#"{"max_concurrency": 0}"#).is_err());
    assert!(SchedulerConfig::from_json_str("not json").is_err());
    assert!(SchedulerConfig::from_json_str(r#"{"admission": "parallel"}"#).is_err());
}

#[test]
fn test_admission_mode_from_str() {
    assert_eq!(
        "Sequential".parse::<AdmissionMode>().unwrap(),
        AdmissionMode::Sequential
    );
    assert_eq!(
        " concurrent ".parse::<AdmissionMode>().unwrap(),
        AdmissionMode::Concurrent
    );
    assert!("eager".parse::<AdmissionMode>().is_err());
}

#[test]
fn test_config_from_env() {
    use prometheus_task_scheduler::config::scheduler::{
        ENV_ADMISSION, ENV_DEFAULT_TIMEOUT_MS, ENV_MAX_CONCURRENCY, ENV_POLL_INTERVAL_MS,
    };

    // Every case lives in one test since they share the process environment.
    let keys = [
        ENV_MAX_CONCURRENCY,
        ENV_POLL_INTERVAL_MS,
        ENV_ADMISSION,
        ENV_DEFAULT_TIMEOUT_MS,
    ];
    let clear = || {
        for key in keys {
            std::env::remove_var(key);
        }
    };
    clear();

    // Overrides.
    std::env::set_var(ENV_MAX_CONCURRENCY, "6");
    std::env::set_var(ENV_POLL_INTERVAL_MS, "25");
    std::env::set_var(ENV_ADMISSION, "sequential");
    std::env::set_var(ENV_DEFAULT_TIMEOUT_MS, "750");
    let config = SchedulerConfig::from_env().unwrap();
    assert_eq!(config.max_concurrency, 6);
    assert_eq!(config.poll_interval(), Duration::from_millis(25));
    assert_eq!(config.admission, AdmissionMode::Sequential);
    assert_eq!(config.default_timeout(), Some(Duration::from_millis(750)));

    // Blank values fall back to the defaults.
    clear();
    std::env::set_var(ENV_POLL_INTERVAL_MS, "   ");
    std::env::set_var(ENV_ADMISSION, "");
    let config = SchedulerConfig::from_env().unwrap();
    let defaults = SchedulerConfig::default();
    assert_eq!(config.poll_interval_ms, defaults.poll_interval_ms);
    assert_eq!(config.admission, defaults.admission);
    assert_eq!(config.default_timeout_ms, None);

    // Unparsable and invalid values are rejected.
    clear();
    std::env::set_var(ENV_ADMISSION, "bogus");
    let err = SchedulerConfig::from_env().unwrap_err();
    assert!(err.contains(ENV_ADMISSION), "{err}");

    clear();
    std::env::set_var(ENV_MAX_CONCURRENCY, "many");
    assert!(SchedulerConfig::from_env().is_err());

    clear();
    std::env::set_var(ENV_MAX_CONCURRENCY, "0");
    assert!(SchedulerConfig::from_env().is_err());

    clear();
}
