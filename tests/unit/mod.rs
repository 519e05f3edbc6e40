//! Unit tests for individual components

mod audit_test;
mod config_test;
mod util_test;
mod builders_test;
mod runtime_test;
