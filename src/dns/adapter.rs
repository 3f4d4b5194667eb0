//! Resolver adapter: bounded timeout and single retry around a [`DnsResolver`].

use std::time::Duration;

use futures::future::join_all;
use log::{debug, warn};
use tokio_retry::strategy::FixedInterval;
use tokio_retry::RetryIf;

use super::resolver::DnsResolver;
use super::types::{RawRecordSet, RecordType};
use crate::config::{EvaluatorConfig, DNS_MAX_RETRIES};
use crate::error_handling::ResolutionError;

/// Applies the query timeout and retry policy to every lookup.
///
/// Each query gets `query_timeout`; a transient failure (timeout, SERVFAIL,
/// transport error) is retried at most once after `retry_delay`. NXDOMAIN is
/// never retried. The adapter does not cache answers.
#[derive(Clone)]
pub struct ResolverAdapter<R> {
    resolver: R,
    query_timeout: Duration,
    retry_delay: Duration,
}

impl<R: DnsResolver> ResolverAdapter<R> {
    /// Creates an adapter using the timeouts from `config`.
    pub fn new(resolver: R, config: &EvaluatorConfig) -> Self {
        Self {
            resolver,
            query_timeout: config.query_timeout,
            retry_delay: config.retry_delay,
        }
    }

    /// Resolves one record type for a name.
    ///
    /// # Errors
    ///
    /// Returns the last `ResolutionError` once the retry budget is spent.
    pub async fn resolve(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> Result<RawRecordSet, ResolutionError> {
        let values = self.query(name, record_type).await?;
        Ok(RawRecordSet::single(record_type, values))
    }

    /// Resolves one record type and returns the values directly.
    pub async fn query(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<String>, ResolutionError> {
        let strategy = FixedInterval::new(self.retry_delay).take(DNS_MAX_RETRIES);
        RetryIf::spawn(
            strategy,
            move || self.attempt(name, record_type),
            move |e: &ResolutionError| {
                let retry = e.is_transient();
                if retry {
                    warn!("{record_type} lookup for {name} failed: {e}");
                }
                retry
            },
        )
        .await
    }

    /// Resolves several record types of one name concurrently.
    ///
    /// Returns the merged answers of every type that resolved. If every query
    /// failed, the first error (in `record_types` order) is returned instead.
    pub async fn resolve_many(
        &self,
        name: &str,
        record_types: &[RecordType],
    ) -> Result<RawRecordSet, ResolutionError> {
        let results = join_all(record_types.iter().map(|rt| self.resolve(name, *rt))).await;

        let mut merged = RawRecordSet::new();
        let mut first_error = None;
        let mut any_ok = false;
        for result in results {
            match result {
                Ok(set) => {
                    any_ok = true;
                    merged.merge(set);
                }
                Err(e) => {
                    debug!("Partial failure resolving {name}: {e}");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) if !any_ok => Err(e),
            _ => Ok(merged),
        }
    }

    async fn attempt(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<String>, ResolutionError> {
        match tokio::time::timeout(self.query_timeout, self.resolver.query(name, record_type)).await
        {
            Ok(result) => result,
            Err(_) => Err(ResolutionError::Timeout {
                name: name.to_string(),
            }),
        }
    }
}
