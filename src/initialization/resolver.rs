//! DNS resolver initialization.

use std::sync::Arc;

use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use log::debug;

use crate::config::{EvaluatorConfig, ResolverChoice};
use crate::dns::HickoryResolver;
use crate::error_handling::InitializationError;

/// Builds the production resolver for the chosen upstream.
///
/// hickory's own retries and cache are disabled: the resolver adapter owns the
/// retry policy, and every evaluation must see current DNS content.
///
/// # Errors
///
/// Returns `InitializationError::DnsResolverError` if the system resolver
/// configuration cannot be read.
pub fn init_resolver(
    choice: ResolverChoice,
    config: &EvaluatorConfig,
) -> Result<HickoryResolver, InitializationError> {
    let (resolver_config, mut opts) = match choice {
        ResolverChoice::System => hickory_resolver::system_conf::read_system_conf()
            .map_err(|e| InitializationError::DnsResolverError(e.to_string()))?,
        ResolverChoice::Google => (ResolverConfig::google(), ResolverOpts::default()),
        ResolverChoice::Cloudflare => (ResolverConfig::cloudflare(), ResolverOpts::default()),
        ResolverChoice::Quad9 => (ResolverConfig::quad9(), ResolverOpts::default()),
    };

    opts.timeout = config.query_timeout;
    opts.attempts = 1;
    opts.cache_size = 0;
    // Never append search domains
    opts.ndots = 0;

    debug!("Using {choice:?} resolvers");
    Ok(HickoryResolver::new(Arc::new(TokioAsyncResolver::tokio(
        resolver_config,
        opts,
    ))))
}
