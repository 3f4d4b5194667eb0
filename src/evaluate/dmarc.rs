//! DMARC evaluation.

use super::{has_version_prefix, lookup_unknown, select_records};
use crate::dns::{DnsResolver, RecordType, ResolverAdapter};
use crate::domain::Domain;
use crate::error_handling::ResolutionError;
use crate::parse::{parse_dmarc, Alignment, DmarcPolicy};
use crate::report::MechanismResult;

/// Maps a parsed DMARC record to a result.
///
/// `p=none` is a warning; `quarantine` and `reject` pass. Weaker settings are
/// listed in `warnings` without changing the status.
pub fn assess_dmarc(policy: &DmarcPolicy) -> MechanismResult {
    let mut warnings = Vec::new();
    if policy.adkim == Alignment::Relaxed {
        warnings.push("relaxed DKIM alignment (adkim=r)".to_string());
    }
    if policy.aspf == Alignment::Relaxed {
        warnings.push("relaxed SPF alignment (aspf=r)".to_string());
    }
    if policy.percentage < 100 {
        warnings.push(format!(
            "policy applies to only {}% of failing mail (pct={})",
            policy.percentage, policy.percentage
        ));
    }
    if policy.rua.is_empty() {
        warnings.push("no aggregate report address (rua)".to_string());
    }
    let sp = policy.effective_subdomain_policy();
    if sp < policy.policy {
        warnings.push(format!(
            "subdomain policy '{sp}' is weaker than '{}'",
            policy.policy
        ));
    }

    let result = if policy.is_enforcing() {
        MechanismResult::pass(format!("DMARC policy is '{}'", policy.policy))
    } else {
        MechanismResult::warning("DMARC policy is 'none': failing mail is only monitored, not blocked")
    };
    result
        .with_policy(policy.policy.to_string())
        .with_record(&policy.raw)
        .with_warnings(warnings)
}

/// Looks up `_dmarc.<domain>` and evaluates it.
pub async fn check_dmarc<R: DnsResolver>(
    dns: &ResolverAdapter<R>,
    domain: &Domain,
) -> MechanismResult {
    let name = domain.subdomain("_dmarc");
    let txt = match dns.query(&name, RecordType::Txt).await {
        Ok(txt) => txt,
        Err(ResolutionError::NxDomain { .. }) => Vec::new(),
        Err(e) => return lookup_unknown("DMARC", &e),
    };

    let records = select_records(&txt, |t| has_version_prefix(t, "DMARC1"));
    let raw = match records.as_slice() {
        [] => return MechanismResult::fail("No DMARC record found"),
        [raw] => *raw,
        many => {
            return MechanismResult::fail(format!(
                "Multiple DMARC records found ({}); receivers ignore DMARC in this case",
                many.len()
            ))
        }
    };

    match parse_dmarc(raw) {
        Ok(policy) => assess_dmarc(&policy),
        Err(e) => MechanismResult::fail(format!("Invalid DMARC record: {e}")).with_record(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvaluatorConfig;
    use crate::dns::StaticResolver;
    use crate::report::Status;
    use std::time::Duration;

    async fn run(resolver: StaticResolver) -> MechanismResult {
        let config = EvaluatorConfig {
            query_timeout: Duration::from_millis(100),
            retry_delay: Duration::from_millis(1),
            ..Default::default()
        };
        let dns = ResolverAdapter::new(resolver, &config);
        check_dmarc(&dns, &Domain::parse("example.com").unwrap()).await
    }

    #[tokio::test]
    async fn test_reject_passes() {
        let resolver = StaticResolver::new().with_txt(
            "_dmarc.example.com",
            ["v=DMARC1; p=reject; rua=mailto:dmarc@example.com; adkim=s; aspf=s"],
        );
        let result = run(resolver).await;
        assert_eq!(result.status, Status::Pass);
        assert_eq!(result.policy.as_deref(), Some("reject"));
        assert!(result.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_none_is_warning() {
        let resolver = StaticResolver::new().with_txt("_dmarc.example.com", ["v=DMARC1; p=none"]);
        let result = run(resolver).await;
        assert_eq!(result.status, Status::Warning);
        assert_eq!(result.policy.as_deref(), Some("none"));
    }

    #[tokio::test]
    async fn test_absent_fails() {
        let resolver = StaticResolver::new().with_txt("example.com", ["v=spf1 -all"]);
        let result = run(resolver).await;
        assert_eq!(result.status, Status::Fail);
        assert_eq!(result.policy, None);
    }

    #[tokio::test]
    async fn test_apex_record_is_not_used() {
        let resolver = StaticResolver::new().with_txt("example.com", ["v=DMARC1; p=reject"]);
        let result = run(resolver).await;
        assert_eq!(result.status, Status::Fail);
    }

    #[tokio::test]
    async fn test_multiple_records_fail() {
        let resolver = StaticResolver::new().with_txt(
            "_dmarc.example.com",
            ["v=DMARC1; p=reject", "v=DMARC1; p=none"],
        );
        assert_eq!(run(resolver).await.status, Status::Fail);
    }

    #[tokio::test]
    async fn test_parse_error_fails_with_reason() {
        let resolver =
            StaticResolver::new().with_txt("_dmarc.example.com", ["v=DMARC1; rua=mailto:a@example.com"]);
        let result = run(resolver).await;
        assert_eq!(result.status, Status::Fail);
        assert!(result.message.contains("p="));
    }

    #[tokio::test]
    async fn test_transient_failure_is_unknown() {
        let resolver = StaticResolver::new().with_servfail("_dmarc.example.com");
        assert_eq!(run(resolver).await.status, Status::Unknown);
    }

    #[test]
    fn test_weaker_settings_are_listed() {
        let policy = parse_dmarc("v=DMARC1; p=reject; sp=none; pct=25").unwrap();
        let result = assess_dmarc(&policy);
        assert_eq!(result.status, Status::Pass);
        let joined = result.warnings.join(" | ");
        assert!(joined.contains("adkim=r"));
        assert!(joined.contains("aspf=r"));
        assert!(joined.contains("pct=25"));
        assert!(joined.contains("rua"));
        assert!(joined.contains("subdomain policy 'none'"));
    }
}
