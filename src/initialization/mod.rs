//! Application initialization and resource setup.
//!
//! This module provides functions to initialize the shared resources:
//! - Logger
//! - DNS resolver
//! - HTTP client for MTA-STS policy fetches
//! - A ready-to-use [`Evaluator`] combining them

mod client;
mod logger;
mod resolver;

use crate::config::{EvaluatorConfig, ResolverChoice};
use crate::dns::HickoryResolver;
use crate::error_handling::InitializationError;
use crate::evaluate::HttpPolicyFetcher;
use crate::pipeline::Evaluator;

// Re-export public API
pub use client::init_client;
pub use logger::init_logger_with;
pub use resolver::init_resolver;

/// Evaluator talking to real DNS and HTTPS.
pub type LiveEvaluator = Evaluator<HickoryResolver, HttpPolicyFetcher>;

/// Builds a [`LiveEvaluator`].
///
/// # Errors
///
/// Returns `InitializationError` if the resolver or the HTTP client cannot be built.
pub fn init_evaluator(
    choice: ResolverChoice,
    config: EvaluatorConfig,
) -> Result<LiveEvaluator, InitializationError> {
    let resolver = init_resolver(choice, &config)?;
    let client = init_client(&config)?;
    Ok(Evaluator::new(resolver, HttpPolicyFetcher::new(client), config))
}
