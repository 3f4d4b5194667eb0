//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, limits, scoring policy)
//! - The library-level [`EvaluatorConfig`]
//! - CLI option types and parsing

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{Command, EvaluatorConfig, LogFormat, LogLevel, Opt, ResolverChoice};
