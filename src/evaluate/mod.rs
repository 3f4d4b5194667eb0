//! Policy evaluators.
//!
//! Each mechanism has a pure `assess_*` function mapping parsed input to a
//! [`MechanismResult`](crate::report::MechanismResult) and an async `check_*`
//! that performs its own lookups. Only the apex SPF and MX probes can return
//! a fatal [`EvaluationError`](crate::error_handling::EvaluationError).

mod bimi;
mod dkim;
mod dmarc;
mod fetch;
mod mta_sts;
mod mx;
mod spf;

pub use bimi::{apply_bimi_prerequisite, assess_bimi, check_bimi};
pub use dkim::{assess_dkim, check_dkim, SelectorProbe};
pub use dmarc::{assess_dmarc, check_dmarc};
pub use fetch::{HttpPolicyFetcher, PolicyFetcher, StaticPolicyFetcher};
pub use mta_sts::{assess_mta_sts, check_mta_sts, policy_url};
pub use mx::{assess_mx, check_mx, MxFindings};
pub use spf::{assess_spf, check_spf, count_lookups, LookupCount};

use crate::error_handling::ResolutionError;
use crate::report::MechanismResult;

/// `unknown` result for a lookup that got no usable answer.
pub(crate) fn lookup_unknown(label: &str, error: &ResolutionError) -> MechanismResult {
    if error.is_timeout() {
        MechanismResult::unknown(format!("{label} lookup timed out"))
    } else {
        MechanismResult::unknown(format!("{label} lookup failed: {error}"))
    }
}

/// TXT strings accepted by `keep`, in answer order.
pub(crate) fn select_records<'a>(txt: &'a [String], keep: impl Fn(&str) -> bool) -> Vec<&'a str> {
    txt.iter()
        .map(|t| t.trim())
        .filter(|t| keep(t))
        .collect()
}

/// Case-insensitive check for a `v=<version>` record prefix.
pub(crate) fn has_version_prefix(txt: &str, version: &str) -> bool {
    let prefix = format!("v={version}");
    txt.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(&prefix))
        && txt[prefix.len()..]
            .chars()
            .next()
            .map_or(true, |c| c == ';' || c.is_whitespace())
}
