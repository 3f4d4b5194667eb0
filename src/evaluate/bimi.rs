//! BIMI evaluation.

use log::warn;

use super::{has_version_prefix, select_records};
use crate::dns::{DnsResolver, RecordType, ResolverAdapter};
use crate::domain::Domain;
use crate::error_handling::ResolutionError;
use crate::parse::{parse_bimi, BimiPolicy, Disposition};
use crate::report::{MechanismResult, Status};
use crate::utils::sanitize_and_truncate;

const PREREQUISITE: &str = "BIMI requires a DMARC policy of quarantine or reject";

/// Maps a parsed BIMI record to a result, before the DMARC prerequisite.
pub fn assess_bimi(policy: &BimiPolicy, raw: &str) -> MechanismResult {
    if policy.is_declination() {
        return MechanismResult::warning("BIMI declination record published (no logo)").with_record(raw);
    }

    let result = if !policy.warnings.is_empty() {
        MechanismResult::warning(format!("BIMI record has a problem: {}", policy.warnings.join("; ")))
    } else if policy.logo_url.is_none() {
        MechanismResult::warning("BIMI record has no logo URL (l=)")
    } else {
        let mut result = MechanismResult::pass("BIMI record found");
        if policy.authority_url.is_none() {
            result = result.with_warnings([
                "no Verified Mark Certificate (a=); most mailbox providers require one to show the logo",
            ]);
        }
        result
    };

    let result = result.with_record(raw).with_warnings(&policy.warnings);
    match &policy.logo_url {
        Some(url) => result.with_logo_url(url),
        None => result,
    }
}

/// Looks up `<selector>._bimi.<domain>`. `None` when no BIMI record exists.
pub async fn check_bimi<R: DnsResolver>(
    dns: &ResolverAdapter<R>,
    domain: &Domain,
    selector: &str,
) -> Option<MechanismResult> {
    let name = domain.subdomain(&format!("{selector}._bimi"));
    let txt = match dns.query(&name, RecordType::Txt).await {
        Ok(txt) => txt,
        Err(ResolutionError::NxDomain { .. }) => return None,
        Err(e) => {
            warn!("BIMI lookup for {domain} failed, omitting BIMI: {e}");
            return None;
        }
    };

    let records = select_records(&txt, |t| has_version_prefix(t, "BIMI1"));
    let raw = match records.as_slice() {
        [] => return None,
        [raw] => *raw,
        many => {
            return Some(MechanismResult::fail(format!(
                "Multiple BIMI records found ({})",
                many.len()
            )))
        }
    };

    Some(match parse_bimi(raw) {
        Ok(policy) => assess_bimi(&policy, raw),
        Err(e) => MechanismResult::fail(format!("Invalid BIMI record: {e}")).with_record(raw),
    })
}

/// Caps BIMI at `warning` unless DMARC is enforcing (quarantine or reject).
pub fn apply_bimi_prerequisite(bimi: &mut MechanismResult, dmarc: Option<&MechanismResult>) {
    let enforcing = dmarc.is_some_and(|d| {
        d.status == Status::Pass
            && d.policy
                .as_deref()
                .and_then(|p| p.parse::<Disposition>().ok())
                .is_some_and(Disposition::is_enforcing)
    });
    if enforcing {
        return;
    }

    match bimi.status {
        Status::Pass => {
            bimi.status = Status::Warning;
            bimi.message = format!("BIMI record is valid but {PREREQUISITE}; current DMARC policy is too weak");
            bimi.warnings.push(PREREQUISITE.to_string());
        }
        Status::Warning => {
            bimi.message = sanitize_and_truncate(&format!(
                "{}; {PREREQUISITE} and the current DMARC policy is too weak",
                bimi.message
            ));
            bimi.warnings.push(PREREQUISITE.to_string());
        }
        Status::Fail | Status::Unknown => {}
    }
}
