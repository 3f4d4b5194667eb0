//! MTA-STS evaluation.

use log::{debug, warn};

use super::{has_version_prefix, select_records, PolicyFetcher};
use crate::config::MTA_STS_POLICY_PATH;
use crate::dns::{DnsResolver, RecordType, ResolverAdapter};
use crate::domain::Domain;
use crate::error_handling::ResolutionError;
use crate::parse::{parse_mta_sts_policy, parse_mta_sts_record, MtaStsMode, MtaStsPolicy};
use crate::report::MechanismResult;

/// RFC 8461 section 3.2 suggests weeks; shorter lifetimes give little protection.
const SHORT_MAX_AGE: u64 = 86_400;

/// Location of the policy file for a domain.
pub fn policy_url(domain: &Domain) -> String {
    format!("https://mta-sts.{domain}{MTA_STS_POLICY_PATH}")
}

/// Maps a fetched policy to a result.
pub fn assess_mta_sts(policy: &MtaStsPolicy) -> MechanismResult {
    let result = match policy.mode {
        MtaStsMode::Enforce => MechanismResult::pass(format!(
            "MTA-STS policy enforced for {} MX pattern(s)",
            policy.mx.len()
        )),
        MtaStsMode::Testing => MechanismResult::warning(
            "MTA-STS is in testing mode; TLS failures are reported but not enforced",
        ),
        MtaStsMode::None => MechanismResult::warning("MTA-STS policy mode is none (disabled)"),
    };
    let result = if policy.max_age < SHORT_MAX_AGE && policy.mode != MtaStsMode::None {
        result.with_warnings([format!(
            "max_age of {}s is shorter than one day",
            policy.max_age
        )])
    } else {
        result
    };
    result.with_mode(policy.mode.to_string())
}

/// Looks up `_mta-sts.<domain>` and, when present, fetches and checks the policy.
///
/// `None` when the domain publishes no MTA-STS record; no fetch is attempted then.
pub async fn check_mta_sts<R: DnsResolver, F: PolicyFetcher>(
    dns: &ResolverAdapter<R>,
    fetcher: &F,
    domain: &Domain,
) -> Option<MechanismResult> {
    let name = domain.subdomain("_mta-sts");
    let txt = match dns.query(&name, RecordType::Txt).await {
        Ok(txt) => txt,
        Err(ResolutionError::NxDomain { .. }) => return None,
        Err(e) => {
            warn!("MTA-STS lookup for {domain} failed, omitting MTA-STS: {e}");
            return None;
        }
    };

    let records = select_records(&txt, |t| has_version_prefix(t, "STSv1"));
    let raw = match records.as_slice() {
        [] => return None,
        [raw] => *raw,
        many => {
            return Some(MechanismResult::fail(format!(
                "Multiple MTA-STS records found ({})",
                many.len()
            )))
        }
    };

    if let Err(e) = parse_mta_sts_record(raw) {
        return Some(MechanismResult::fail(format!("Invalid MTA-STS record: {e}")).with_record(raw));
    }

    let url = policy_url(domain);
    debug!("Fetching MTA-STS policy for {domain}");
    let body = match fetcher.fetch(&url).await {
        Ok(body) => body,
        Err(e) => {
            return Some(
                MechanismResult::fail(format!("MTA-STS policy could not be fetched: {e}"))
                    .with_record(raw),
            )
        }
    };

    Some(match parse_mta_sts_policy(&body) {
        Ok(policy) => assess_mta_sts(&policy).with_record(raw),
        Err(e) => MechanismResult::fail(format!("Invalid MTA-STS policy: {e}")).with_record(raw),
    })
}
