//! DKIM evaluation by probing common selectors.
//!
//! Selectors are chosen by each sender and cannot be listed from DNS, so a
//! domain whose selector is not in the probe list is reported as `unknown`
//! rather than `fail`. The one exception is a domain with no `_domainkey`
//! node at all: NXDOMAIN there means nothing exists below it (RFC 8020).

use futures::future::join_all;
use log::debug;

use crate::config::EvaluatorConfig;
use crate::dns::{DnsResolver, RecordType, ResolverAdapter};
use crate::domain::Domain;
use crate::error_handling::ResolutionError;
use crate::parse::{parse_dkim_key, DkimKeyRecord};
use crate::report::MechanismResult;

/// Outcome of looking up one selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorProbe {
    /// Nothing published for the selector.
    Missing { selector: String },
    Found {
        selector: String,
        key: DkimKeyRecord,
        /// CNAME target when the selector is delegated to a provider.
        delegated_to: Option<String>,
    },
    Invalid { selector: String, reason: String },
    Failed { selector: String, error: ResolutionError },
}

/// Picks the first usable selector, in probe order.
pub fn assess_dkim(
    probes: &[SelectorProbe],
    domainkey_absent: bool,
    selectors: &[String],
) -> MechanismResult {
    let valid = probes.iter().find_map(|p| match p {
        SelectorProbe::Found {
            selector,
            key,
            delegated_to,
        } if !key.is_revoked() => Some((selector, key, delegated_to)),
        _ => None,
    });
    if let Some((selector, key, delegated_to)) = valid {
        let mut notes = Vec::new();
        if key.testing {
            notes.push(format!("selector '{selector}' is in testing mode (t=y)"));
        }
        if let Some(target) = delegated_to {
            notes.push(format!("selector '{selector}' is delegated via CNAME to {target}"));
        }
        return MechanismResult::pass(format!(
            "DKIM {} key found for selector '{selector}'",
            key.key_type.to_uppercase()
        ))
        .with_selector(selector)
        .with_warnings(notes);
    }

    let broken = probes.iter().find_map(|p| match p {
        SelectorProbe::Found { selector, .. } => Some((selector, "its key is revoked (empty p=)".to_string())),
        SelectorProbe::Invalid { selector, reason } => Some((selector, format!("it is invalid: {reason}"))),
        _ => None,
    });
    if let Some((selector, problem)) = broken {
        return MechanismResult::warning(format!(
            "DKIM record found for selector '{selector}' but {problem}"
        ))
        .with_selector(selector);
    }

    if domainkey_absent {
        return MechanismResult::fail("No DKIM records published (no _domainkey subdomain)");
    }

    let failures: Vec<String> = probes
        .iter()
        .filter_map(|p| match p {
            SelectorProbe::Failed { selector, error } => Some(format!("selector '{selector}': {error}")),
            _ => None,
        })
        .collect();
    MechanismResult::unknown(format!(
        "No DKIM key found for common selectors ({}); selectors are sender-specific and cannot be enumerated, so DKIM could not be verified",
        selectors.join(", ")
    ))
    .with_warnings(failures)
}

/// Probes every configured selector concurrently.
pub async fn check_dkim<R: DnsResolver>(
    dns: &ResolverAdapter<R>,
    domain: &Domain,
    config: &EvaluatorConfig,
) -> MechanismResult {
    let node = domain.subdomain("_domainkey");
    let probes = join_all(
        config
            .dkim_selectors
            .iter()
            .map(|selector| probe_selector(dns, domain, selector)),
    );
    let (node_answer, probes) = tokio::join!(dns.query(&node, RecordType::Txt), probes);

    let domainkey_absent = matches!(node_answer, Err(ResolutionError::NxDomain { .. }));
    if domainkey_absent {
        debug!("{node} does not exist");
    }
    assess_dkim(&probes, domainkey_absent, &config.dkim_selectors)
}

async fn probe_selector<R: DnsResolver>(
    dns: &ResolverAdapter<R>,
    domain: &Domain,
    selector: &str,
) -> SelectorProbe {
    let name = domain.subdomain(&format!("{selector}._domainkey"));
    let selector = selector.to_string();

    let txt = match dns.query(&name, RecordType::Txt).await {
        Ok(txt) => txt,
        Err(ResolutionError::NxDomain { .. }) => return SelectorProbe::Missing { selector },
        Err(error) => return SelectorProbe::Failed { selector, error },
    };
    let Some(raw) = txt.iter().map(|t| t.trim()).find(|t| looks_like_key(t)) else {
        return SelectorProbe::Missing { selector };
    };

    match parse_dkim_key(raw) {
        Ok(key) => {
            let delegated_to = match dns.query(&name, RecordType::Cname).await {
                Ok(targets) => targets
                    .into_iter()
                    .next()
                    .map(|t| t.trim_end_matches('.').to_string()),
                Err(_) => None,
            };
            SelectorProbe::Found {
                selector,
                key,
                delegated_to,
            }
        }
        Err(e) => SelectorProbe::Invalid {
            selector,
            reason: e.reason,
        },
    }
}

fn looks_like_key(txt: &str) -> bool {
    let lower = txt.to_ascii_lowercase();
    lower.starts_with("v=dkim1") || lower.split(';').any(|tag| tag.trim().starts_with("p="))
}
