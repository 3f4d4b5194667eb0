//! Error handling.
//!
//! This module provides the error taxonomy of the evaluator:
//! - **Fatal**: [`EvaluationError`] (invalid domain, NXDOMAIN) aborts the report
//! - **Contained**: [`ResolutionError`], [`ParseError`] and [`TransportError`] are
//!   mapped onto a single mechanism's status and message
//! - **Setup**: [`InitializationError`] for logger, resolver and HTTP client setup

mod types;

// Re-export public API
pub use types::{EvaluationError, InitializationError, ParseError, ResolutionError, TransportError};
