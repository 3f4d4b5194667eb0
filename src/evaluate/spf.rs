//! SPF evaluation.

use std::collections::{HashSet, VecDeque};

use log::debug;

use super::{lookup_unknown, select_records};
use crate::config::{EvaluatorConfig, MAX_SPF_RECURSION_DEPTH};
use crate::dns::{DnsResolver, RecordType, ResolverAdapter};
use crate::domain::Domain;
use crate::error_handling::{EvaluationError, ResolutionError};
use crate::parse::{is_spf_record, parse_spf, Qualifier, SpfPolicy};
use crate::report::MechanismResult;

/// DNS lookups an SPF evaluation would perform, including nested includes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupCount {
    pub total: usize,
    /// Problems met while following includes; informational only.
    pub notes: Vec<String>,
}

/// Maps a parsed SPF record and its lookup count to a result.
pub fn assess_spf(policy: &SpfPolicy, lookups: &LookupCount, max_lookups: usize) -> MechanismResult {
    let mut reasons = Vec::new();
    if lookups.total > max_lookups {
        reasons.push(format!(
            "exceeds {max_lookups} DNS lookup limit ({} lookups)",
            lookups.total
        ));
    }
    if policy.is_permissive() {
        let symbol = policy.all_qualifier().map_or('+', |q| q.symbol());
        reasons.push(format!("is overly permissive ({symbol}all)"));
    }
    reasons.extend(policy.warnings.iter().cloned());

    let result = if reasons.is_empty() {
        match policy.all_qualifier() {
            Some(Qualifier::SoftFail) => {
                MechanismResult::pass("SPF record found (soft fail ~all for unlisted senders)")
            }
            _ => MechanismResult::pass("SPF record found"),
        }
    } else {
        MechanismResult::warning(format!("SPF record {}", reasons.join("; ")))
            .with_warnings(&reasons)
    };

    result
        .with_record(&policy.raw)
        .with_warnings(&lookups.notes)
}

/// Looks up and evaluates the apex SPF record.
///
/// # Errors
///
/// Returns `EvaluationError::NxDomain` if the domain does not exist.
pub async fn check_spf<R: DnsResolver>(
    dns: &ResolverAdapter<R>,
    domain: &Domain,
    config: &EvaluatorConfig,
) -> Result<MechanismResult, EvaluationError> {
    let txt = match dns.query(domain.as_str(), RecordType::Txt).await {
        Ok(txt) => txt,
        Err(ResolutionError::NxDomain { .. }) => {
            return Err(EvaluationError::NxDomain {
                domain: domain.to_string(),
            })
        }
        Err(e) => return Ok(lookup_unknown("SPF", &e)),
    };

    let records = select_records(&txt, is_spf_record);
    let raw = match records.as_slice() {
        [] => return Ok(MechanismResult::fail("No SPF record found")),
        [raw] => *raw,
        many => {
            return Ok(MechanismResult::fail(format!(
                "Multiple SPF records found ({}); receivers treat this as a permanent error",
                many.len()
            )))
        }
    };

    let policy = match parse_spf(raw) {
        Ok(policy) => policy,
        Err(e) => {
            return Ok(MechanismResult::fail(format!("Invalid SPF record: {e}")).with_record(raw))
        }
    };

    let lookups = count_lookups(dns, domain, &policy, config.max_spf_lookups).await;
    debug!("SPF for {domain} needs {} DNS lookups", lookups.total);
    Ok(assess_spf(&policy, &lookups, config.max_spf_lookups))
}

/// Follows `include:` and `redirect=` breadth first, summing lookup terms.
///
/// Expansion stops once the count exceeds the limit; each domain is expanded once.
pub async fn count_lookups<R: DnsResolver>(
    dns: &ResolverAdapter<R>,
    domain: &Domain,
    policy: &SpfPolicy,
    max_lookups: usize,
) -> LookupCount {
    let mut count = LookupCount {
        total: policy.dns_lookup_terms(),
        notes: Vec::new(),
    };
    let mut visited: HashSet<String> = HashSet::from([domain.to_string()]);
    let mut queue: VecDeque<(String, usize)> = policy
        .referenced_domains()
        .into_iter()
        .map(|d| (d.to_string(), 1))
        .collect();

    while let Some((target, depth)) = queue.pop_front() {
        if count.total > max_lookups {
            break;
        }
        if depth > MAX_SPF_RECURSION_DEPTH {
            count
                .notes
                .push(format!("include chain deeper than {MAX_SPF_RECURSION_DEPTH} levels"));
            break;
        }
        if !visited.insert(target.clone()) {
            count
                .notes
                .push(format!("{target} is included more than once"));
            continue;
        }
        if target.contains('%') {
            debug!("Skipping SPF macro target {target}");
            continue;
        }

        let nested = match dns.query(&target, RecordType::Txt).await {
            Ok(txt) => txt,
            Err(e) => {
                count.notes.push(format!("lookup of included {target} failed: {e}"));
                continue;
            }
        };
        let records = select_records(&nested, is_spf_record);
        let raw = match records.as_slice() {
            [raw] => *raw,
            [] => {
                count.notes.push(format!("included {target} has no SPF record"));
                continue;
            }
            _ => {
                count
                    .notes
                    .push(format!("included {target} has multiple SPF records"));
                continue;
            }
        };
        match parse_spf(raw) {
            Ok(child) => {
                count.total += child.dns_lookup_terms();
                queue.extend(
                    child
                        .referenced_domains()
                        .into_iter()
                        .map(|d| (d.to_string(), depth + 1)),
                );
            }
            Err(e) => count
                .notes
                .push(format!("included {target} has an invalid SPF record: {e}")),
        }
    }
    count
}
