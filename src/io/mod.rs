//! Process-level input/output conventions.
//!
//! This module provides:
//! - Exit codes scripts can rely on

pub mod exit_code;

pub use exit_code::ExitCode;
