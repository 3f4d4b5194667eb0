//! Scoring aggregator.
//!
//! A pass earns a mechanism's full weight, a warning half of it, and fail or
//! unknown nothing. SPF, DKIM, DMARC and MX sum to 90; BIMI and MTA-STS are
//! bonus weights that can only add. The result is capped at 100.

use crate::config::{
    BIMI_BONUS, DKIM_WEIGHT, DMARC_WEIGHT, EXCELLENT_THRESHOLD, FAIR_THRESHOLD, GOOD_THRESHOLD,
    INSURANCE_READY_SCORE, MAX_SCORE, MTA_STS_BONUS, MX_WEIGHT, PROCEED_SCORE, SPF_WEIGHT,
};
use crate::report::{ComplianceLevel, MechanismKind, Status};

/// Full weight of a mechanism.
pub fn weight(kind: MechanismKind) -> u32 {
    match kind {
        MechanismKind::Spf => SPF_WEIGHT,
        MechanismKind::Dkim => DKIM_WEIGHT,
        MechanismKind::Dmarc => DMARC_WEIGHT,
        MechanismKind::Mx => MX_WEIGHT,
        MechanismKind::Bimi => BIMI_BONUS,
        MechanismKind::MtaSts => MTA_STS_BONUS,
    }
}

/// Points a single mechanism contributes.
pub fn contribution(kind: MechanismKind, status: Status) -> u32 {
    match status {
        Status::Pass => weight(kind),
        Status::Warning => weight(kind) / 2,
        Status::Fail | Status::Unknown => 0,
    }
}

/// Overall score (0-100) of a set of mechanism statuses.
pub fn overall_score<I>(statuses: I) -> u32
where
    I: IntoIterator<Item = (MechanismKind, Status)>,
{
    let sum: u32 = statuses
        .into_iter()
        .map(|(kind, status)| contribution(kind, status))
        .sum();
    sum.min(MAX_SCORE)
}

pub fn compliance_level(score: u32) -> ComplianceLevel {
    if score >= EXCELLENT_THRESHOLD {
        ComplianceLevel::Excellent
    } else if score >= GOOD_THRESHOLD {
        ComplianceLevel::Good
    } else if score >= FAIR_THRESHOLD {
        ComplianceLevel::Fair
    } else {
        ComplianceLevel::Poor
    }
}

/// Score at or above [`INSURANCE_READY_SCORE`].
pub fn is_insurance_ready(score: u32) -> bool {
    score >= INSURANCE_READY_SCORE
}

/// Score at or above [`PROCEED_SCORE`].
pub fn is_proceed(score: u32) -> bool {
    score >= PROCEED_SCORE
}
