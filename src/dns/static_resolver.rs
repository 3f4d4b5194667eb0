//! In-memory DNS zone.
//!
//! `StaticResolver` answers from a fixed set of records. It backs the test suites
//! and offline evaluations of known fixtures. Names follow real DNS existence
//! rules: a name with no data of its own still exists (NODATA) when something is
//! published below it, otherwise it is NXDOMAIN.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::resolver::DnsResolver;
use super::types::RecordType;
use crate::error_handling::ResolutionError;

#[derive(Debug, Clone, Default)]
struct Zone {
    records: HashMap<(String, RecordType), Vec<String>>,
    existing: HashSet<String>,
    nxdomain: HashSet<String>,
    servfail: HashSet<String>,
    delays: HashMap<String, Duration>,
    transient_failures: HashMap<String, Arc<AtomicUsize>>,
}

impl Zone {
    fn exists(&self, name: &str) -> bool {
        if self.existing.contains(name) {
            return true;
        }
        let suffix = format!(".{name}");
        self.records
            .keys()
            .any(|(owner, _)| owner == name || owner.ends_with(&suffix))
            || self.existing.iter().any(|owner| owner.ends_with(&suffix))
    }
}

/// Resolver answering from an in-memory zone.
///
/// Built with chained `with_*` calls; clones share the zone.
///
/// # Examples
///
/// ```
/// use mail_posture::dns::{DnsResolver, RecordType, StaticResolver};
///
/// # #[tokio::main]
/// # async fn main() {
/// let resolver = StaticResolver::new()
///     .with_txt("example.com", ["v=spf1 -all"])
///     .with_mx("example.com", 10, "mx1.example.com");
///
/// let txt = resolver.query("example.com", RecordType::Txt).await.unwrap();
/// assert_eq!(txt, vec!["v=spf1 -all"]);
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    zone: Arc<Zone>,
}

fn normalize(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn zone_mut(&mut self) -> &mut Zone {
        Arc::make_mut(&mut self.zone)
    }

    /// Adds records of any type.
    pub fn with_records<I, S>(mut self, name: &str, record_type: RecordType, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.zone_mut()
            .records
            .entry((normalize(name), record_type))
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// Adds TXT records.
    pub fn with_txt<I, S>(self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_records(name, RecordType::Txt, values)
    }

    /// Adds one MX record.
    pub fn with_mx(self, name: &str, preference: u16, exchange: &str) -> Self {
        self.with_records(name, RecordType::Mx, [format!("{preference} {exchange}.")])
    }

    /// Adds one A record.
    pub fn with_a(self, name: &str, address: &str) -> Self {
        self.with_records(name, RecordType::A, [address])
    }

    /// Adds one CNAME record.
    pub fn with_cname(self, name: &str, target: &str) -> Self {
        self.with_records(name, RecordType::Cname, [format!("{target}.")])
    }

    /// Marks a name as existing without publishing any data (e.g. a parked apex).
    pub fn with_existing(mut self, name: &str) -> Self {
        self.zone_mut().existing.insert(normalize(name));
        self
    }

    /// Forces NXDOMAIN for a name regardless of its records.
    pub fn with_nxdomain(mut self, name: &str) -> Self {
        self.zone_mut().nxdomain.insert(normalize(name));
        self
    }

    /// Answers SERVFAIL for every query of a name.
    pub fn with_servfail(mut self, name: &str) -> Self {
        self.zone_mut().servfail.insert(normalize(name));
        self
    }

    /// Answers SERVFAIL for the first `count` queries of a name, then normally.
    pub fn with_transient_failures(mut self, name: &str, count: usize) -> Self {
        self.zone_mut()
            .transient_failures
            .insert(normalize(name), Arc::new(AtomicUsize::new(count)));
        self
    }

    /// Delays every answer for a name.
    pub fn with_delay(mut self, name: &str, delay: Duration) -> Self {
        self.zone_mut().delays.insert(normalize(name), delay);
        self
    }
}

impl DnsResolver for StaticResolver {
    async fn query(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<String>, ResolutionError> {
        let owner = normalize(name);
        let zone = &self.zone;

        if let Some(delay) = zone.delays.get(&owner) {
            tokio::time::sleep(*delay).await;
        }

        if zone.nxdomain.contains(&owner) {
            return Err(ResolutionError::NxDomain { name: owner });
        }
        if zone.servfail.contains(&owner) {
            return Err(ResolutionError::ServFail { name: owner });
        }
        if let Some(remaining) = zone.transient_failures.get(&owner) {
            let failed = remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failed {
                return Err(ResolutionError::ServFail { name: owner });
            }
        }

        if let Some(values) = zone.records.get(&(owner.clone(), record_type)) {
            return Ok(values.clone());
        }
        if zone.exists(&owner) {
            Ok(Vec::new())
        } else {
            Err(ResolutionError::NxDomain { name: owner })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_resolver_txt() {
        let resolver = StaticResolver::new().with_txt("Example.com.", ["v=spf1 -all"]);
        let result = resolver.query("example.com", RecordType::Txt).await.unwrap();
        assert_eq!(result, vec!["v=spf1 -all"]);
    }

    #[tokio::test]
    async fn test_static_resolver_nodata_vs_nxdomain() {
        let resolver = StaticResolver::new().with_txt("google._domainkey.example.com", ["p=abc"]);

        // Owner exists with another type
        let mx = resolver
            .query("google._domainkey.example.com", RecordType::Mx)
            .await;
        assert_eq!(mx, Ok(Vec::new()));

        // Empty non-terminal
        let ent = resolver
            .query("_domainkey.example.com", RecordType::Txt)
            .await;
        assert_eq!(ent, Ok(Vec::new()));

        // Nothing published
        let missing = resolver.query("other.example.com", RecordType::Txt).await;
        assert!(matches!(missing, Err(ResolutionError::NxDomain { .. })));
    }

    #[tokio::test]
    async fn test_static_resolver_existing_name_without_records() {
        let resolver = StaticResolver::new().with_existing("parked.example");
        assert_eq!(
            resolver.query("parked.example", RecordType::Txt).await,
            Ok(Vec::new())
        );
    }

    #[tokio::test]
    async fn test_static_resolver_transient_failures_recover() {
        let resolver = StaticResolver::new()
            .with_txt("flaky.example", ["v=spf1 -all"])
            .with_transient_failures("flaky.example", 1);
        assert!(matches!(
            resolver.query("flaky.example", RecordType::Txt).await,
            Err(ResolutionError::ServFail { .. })
        ));
        assert_eq!(
            resolver.query("flaky.example", RecordType::Txt).await,
            Ok(vec!["v=spf1 -all".to_string()])
        );
    }

    #[tokio::test]
    async fn test_static_resolver_clones_share_failure_budget() {
        let resolver = StaticResolver::new()
            .with_existing("flaky.example")
            .with_transient_failures("flaky.example", 1);
        let clone = resolver.clone();
        assert!(clone.query("flaky.example", RecordType::Txt).await.is_err());
        assert!(resolver.query("flaky.example", RecordType::Txt).await.is_ok());
    }

    #[tokio::test]
    async fn test_static_resolver_mx_format() {
        let resolver = StaticResolver::new().with_mx("example.com", 10, "mx1.example.com");
        let mx = resolver.query("example.com", RecordType::Mx).await.unwrap();
        assert_eq!(mx, vec!["10 mx1.example.com."]);
    }
}
