//! MX evaluation.

use std::collections::BTreeSet;

use futures::future::join_all;
use log::debug;

use super::lookup_unknown;
use crate::dns::{DnsResolver, RecordType, ResolverAdapter};
use crate::domain::Domain;
use crate::error_handling::{EvaluationError, ResolutionError};
use crate::parse::{parse_mx, sort_mx};
use crate::report::{MechanismResult, MxEntry};

/// Everything the MX assessment needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MxFindings {
    pub entries: Vec<MxEntry>,
    /// The domain has A/AAAA records (implicit MX when `entries` is empty).
    pub has_address: bool,
    /// Exchanges that are CNAME aliases.
    pub cname_exchanges: Vec<String>,
    /// Answers that could not be parsed.
    pub malformed: Vec<String>,
}

pub fn assess_mx(findings: MxFindings) -> MechanismResult {
    let MxFindings {
        mut entries,
        has_address,
        cname_exchanges,
        malformed,
    } = findings;
    sort_mx(&mut entries);

    let mut notes: Vec<String> = malformed
        .iter()
        .map(|m| format!("ignored malformed MX record '{m}'"))
        .collect();
    notes.extend(
        cname_exchanges
            .iter()
            .map(|h| format!("MX host {h} is a CNAME alias (RFC 2181 section 10.3)")),
    );

    let null_mx = entries.iter().any(|e| e.exchange == ".");
    let hosts: BTreeSet<&str> = entries.iter().map(|e| e.exchange.as_str()).collect();
    let priorities: BTreeSet<u16> = entries.iter().map(|e| e.priority).collect();

    let result = if null_mx {
        MechanismResult::fail("Domain does not accept mail (null MX record)")
    } else if entries.is_empty() && has_address {
        MechanismResult::warning(
            "No MX records; mail falls back to the domain's A/AAAA address (implicit MX)",
        )
    } else if entries.is_empty() {
        MechanismResult::fail("No MX records found")
    } else if hosts.len() == 1 {
        MechanismResult::warning(format!(
            "Single MX host {} is a single point of failure",
            entries[0].exchange
        ))
    } else if priorities.len() == 1 {
        MechanismResult::warning(format!(
            "{} MX records all share priority {}; no backup tier",
            entries.len(),
            entries[0].priority
        ))
    } else {
        MechanismResult::pass(format!("{} MX records found", entries.len()))
    };

    result.with_records(entries).with_warnings(notes)
}

/// Looks up MX records, the A/AAAA fallback, and CNAME aliases of exchanges.
///
/// # Errors
///
/// Returns `EvaluationError::NxDomain` if the domain does not exist.
pub async fn check_mx<R: DnsResolver>(
    dns: &ResolverAdapter<R>,
    domain: &Domain,
) -> Result<MechanismResult, EvaluationError> {
    let nxdomain = || EvaluationError::NxDomain {
        domain: domain.to_string(),
    };

    let answers = match dns.query(domain.as_str(), RecordType::Mx).await {
        Ok(answers) => answers,
        Err(ResolutionError::NxDomain { .. }) => return Err(nxdomain()),
        Err(e) => {
            return Ok(lookup_unknown("MX", &e).with_records(Vec::new()))
        }
    };

    let mut findings = MxFindings::default();
    for raw in answers {
        match parse_mx(&raw) {
            Ok(entry) => findings.entries.push(entry),
            Err(e) => {
                debug!("Skipping MX answer for {domain}: {e}");
                findings.malformed.push(raw);
            }
        }
    }

    if findings.entries.is_empty() {
        match dns
            .resolve_many(domain.as_str(), &[RecordType::A, RecordType::Aaaa])
            .await
        {
            Ok(set) => findings.has_address = !set.is_empty(),
            Err(ResolutionError::NxDomain { .. }) => return Err(nxdomain()),
            Err(e) => {
                return Ok(MechanismResult::unknown(format!(
                    "No MX records and address fallback lookup failed: {e}"
                ))
                .with_records(Vec::new()))
            }
        }
    } else {
        let hosts: Vec<&str> = findings
            .entries
            .iter()
            .map(|e| e.exchange.as_str())
            .filter(|h| *h != ".")
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let aliases = join_all(hosts.iter().map(|h| dns.query(h, RecordType::Cname))).await;
        findings.cname_exchanges = hosts
            .iter()
            .zip(aliases)
            .filter(|(_, answer)| answer.as_ref().is_ok_and(|targets| !targets.is_empty()))
            .map(|(host, _)| host.to_string())
            .collect();
    }

    Ok(assess_mx(findings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvaluatorConfig;
    use crate::report::Status;
    use crate::dns::StaticResolver;
    use std::time::Duration;

    async fn run(resolver: StaticResolver) -> Result<MechanismResult, EvaluationError> {
        let config = EvaluatorConfig {
            query_timeout: Duration::from_millis(100),
            retry_delay: Duration::from_millis(1),
            ..Default::default()
        };
        let dns = ResolverAdapter::new(resolver, &config);
        check_mx(&dns, &Domain::parse("example.com").unwrap()).await
    }

    fn entry(priority: u16, exchange: &str) -> MxEntry {
        MxEntry {
            priority,
            exchange: exchange.to_string(),
        }
    }

    #[tokio::test]
    async fn test_two_tiers_pass_sorted() {
        let resolver = StaticResolver::new()
            .with_mx("example.com", 20, "mx2.example.com")
            .with_mx("example.com", 10, "mx1.example.com");
        let result = run(resolver).await.unwrap();
        assert_eq!(result.status, Status::Pass);
        assert_eq!(
            result.records,
            Some(vec![entry(10, "mx1.example.com"), entry(20, "mx2.example.com")])
        );
    }

    #[tokio::test]
    async fn test_single_host_is_warning() {
        let resolver = StaticResolver::new().with_mx("example.com", 10, "mx.example.com");
        let result = run(resolver).await.unwrap();
        assert_eq!(result.status, Status::Warning);
        assert!(result.message.contains("single point of failure"));
    }

    #[tokio::test]
    async fn test_equal_priorities_are_warning() {
        let resolver = StaticResolver::new()
            .with_mx("example.com", 10, "a.example.com")
            .with_mx("example.com", 10, "b.example.com");
        let result = run(resolver).await.unwrap();
        assert_eq!(result.status, Status::Warning);
        assert!(result.message.contains("no backup tier"));
    }

    #[tokio::test]
    async fn test_no_mx_no_address_fails_with_empty_records() {
        let resolver = StaticResolver::new().with_existing("example.com");
        let result = run(resolver).await.unwrap();
        assert_eq!(result.status, Status::Fail);
        assert_eq!(result.records, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_implicit_mx_is_warning() {
        let resolver = StaticResolver::new().with_a("example.com", "192.0.2.10");
        let result = run(resolver).await.unwrap();
        assert_eq!(result.status, Status::Warning);
        assert!(result.message.contains("implicit MX"));
    }

    #[tokio::test]
    async fn test_null_mx_fails() {
        let resolver = StaticResolver::new().with_records("example.com", RecordType::Mx, ["0 ."]);
        let result = run(resolver).await.unwrap();
        assert_eq!(result.status, Status::Fail);
        assert!(result.message.contains("null MX"));
    }

    #[tokio::test]
    async fn test_nxdomain_is_fatal() {
        let resolver = StaticResolver::new().with_nxdomain("example.com");
        assert!(matches!(
            run(resolver).await,
            Err(EvaluationError::NxDomain { .. })
        ));
    }

    #[tokio::test]
    async fn test_lookup_failure_is_unknown_with_records() {
        let resolver = StaticResolver::new().with_servfail("example.com");
        let result = run(resolver).await.unwrap();
        assert_eq!(result.status, Status::Unknown);
        assert_eq!(result.records, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_cname_exchange_is_noted() {
        let resolver = StaticResolver::new()
            .with_mx("example.com", 10, "mx1.example.com")
            .with_mx("example.com", 20, "mx2.example.com")
            .with_cname("mx2.example.com", "mail.provider.example");
        let result = run(resolver).await.unwrap();
        assert_eq!(result.status, Status::Pass);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("mx2.example.com"));
    }

    #[test]
    fn test_sort_ties_by_name() {
        let result = assess_mx(MxFindings {
            entries: vec![entry(10, "b.example.com"), entry(5, "c.example.com"), entry(10, "a.example.com")],
            ..Default::default()
        });
        let names: Vec<_> = result
            .records
            .unwrap()
            .into_iter()
            .map(|e| e.exchange)
            .collect();
        assert_eq!(names, ["c.example.com", "a.example.com", "b.example.com"]);
    }
}
