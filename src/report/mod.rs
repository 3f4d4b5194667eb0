//! Report data model and builder.
//!
//! [`SecurityReport`] is the JSON contract callers consume. The four mandatory
//! mechanisms are always present; `bimi` and `mtasts` appear only when the
//! domain publishes the corresponding record.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::domain::Domain;
use crate::scoring;
use crate::utils::sanitize_and_truncate;

/// Outcome of one mechanism check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Status {
    Pass,
    Fail,
    Warning,
    /// Could not be determined (timeout, resolver failure, unknowable).
    Unknown,
}

/// The six evaluated mechanisms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter)]
pub enum MechanismKind {
    #[strum(serialize = "SPF")]
    Spf,
    #[strum(serialize = "DKIM")]
    Dkim,
    #[strum(serialize = "DMARC")]
    Dmarc,
    #[strum(serialize = "MX")]
    Mx,
    #[strum(serialize = "BIMI")]
    Bimi,
    #[strum(serialize = "MTA-STS")]
    MtaSts,
}

impl MechanismKind {
    /// SPF, DKIM, DMARC and MX are always reported.
    pub fn is_mandatory(&self) -> bool {
        !matches!(self, MechanismKind::Bimi | MechanismKind::MtaSts)
    }
}

/// One MX record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MxEntry {
    pub priority: u16,
    pub exchange: String,
}

/// Uniform result shape shared by all mechanisms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MechanismResult {
    pub status: Status,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<MxEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl MechanismResult {
    /// Creates a result; the message is sanitized and truncated.
    pub fn new(status: Status, message: impl AsRef<str>) -> Self {
        MechanismResult {
            status,
            message: sanitize_and_truncate(message.as_ref()),
            record: None,
            selector: None,
            policy: None,
            records: None,
            logo_url: None,
            mode: None,
            warnings: Vec::new(),
        }
    }

    pub fn pass(message: impl AsRef<str>) -> Self {
        Self::new(Status::Pass, message)
    }

    pub fn fail(message: impl AsRef<str>) -> Self {
        Self::new(Status::Fail, message)
    }

    pub fn warning(message: impl AsRef<str>) -> Self {
        Self::new(Status::Warning, message)
    }

    pub fn unknown(message: impl AsRef<str>) -> Self {
        Self::new(Status::Unknown, message)
    }

    pub fn with_record(mut self, record: impl Into<String>) -> Self {
        self.record = Some(record.into());
        self
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn with_policy(mut self, policy: impl Into<String>) -> Self {
        self.policy = Some(policy.into());
        self
    }

    pub fn with_records(mut self, records: Vec<MxEntry>) -> Self {
        self.records = Some(records);
        self
    }

    pub fn with_logo_url(mut self, logo_url: impl Into<String>) -> Self {
        self.logo_url = Some(logo_url.into());
        self
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn with_warnings<I, S>(mut self, warnings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.warnings
            .extend(warnings.into_iter().map(|w| sanitize_and_truncate(w.as_ref())));
        self
    }
}

/// Score band derived from `overallScore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ComplianceLevel {
    Excellent,
    Good,
    Fair,
    Poor,
}

/// Final evaluation report. Built once by [`build_report`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityReport {
    pub domain: String,
    #[serde(with = "timestamp_format")]
    pub timestamp: DateTime<Utc>,
    pub overall_score: u32,
    pub compliance_level: ComplianceLevel,
    pub spf: MechanismResult,
    pub dkim: MechanismResult,
    pub dmarc: MechanismResult,
    pub mx: MechanismResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bimi: Option<MechanismResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtasts: Option<MechanismResult>,
}

impl SecurityReport {
    /// Statuses of every reported mechanism.
    pub fn statuses(&self) -> Vec<(MechanismKind, Status)> {
        let mut statuses = vec![
            (MechanismKind::Spf, self.spf.status),
            (MechanismKind::Dkim, self.dkim.status),
            (MechanismKind::Dmarc, self.dmarc.status),
            (MechanismKind::Mx, self.mx.status),
        ];
        if let Some(bimi) = &self.bimi {
            statuses.push((MechanismKind::Bimi, bimi.status));
        }
        if let Some(mtasts) = &self.mtasts {
            statuses.push((MechanismKind::MtaSts, mtasts.status));
        }
        statuses
    }

    /// Whether the score meets the insurance-readiness threshold.
    pub fn is_insurance_ready(&self) -> bool {
        scoring::is_insurance_ready(self.overall_score)
    }
}

/// Single-assignment result slots, one per mechanism.
///
/// The first value posted for a mechanism wins; later posts are ignored.
/// Posting `None` records that an optional mechanism has nothing to report.
#[derive(Debug, Default)]
pub struct Outcomes {
    slots: HashMap<MechanismKind, Option<MechanismResult>>,
}

impl Outcomes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a result unless the slot is already filled. Returns whether it was stored.
    pub fn post(&mut self, kind: MechanismKind, result: Option<MechanismResult>) -> bool {
        if self.slots.contains_key(&kind) {
            debug!("Discarding late {kind} result");
            return false;
        }
        self.slots.insert(kind, result);
        true
    }

    pub fn is_filled(&self, kind: MechanismKind) -> bool {
        self.slots.contains_key(&kind)
    }

    pub fn get(&self, kind: MechanismKind) -> Option<&MechanismResult> {
        self.slots.get(&kind).and_then(Option::as_ref)
    }

    /// Mutable access for post-join adjustments (the BIMI prerequisite cap).
    pub fn get_mut(&mut self, kind: MechanismKind) -> Option<&mut MechanismResult> {
        self.slots.get_mut(&kind).and_then(Option::as_mut)
    }

    fn take(&mut self, kind: MechanismKind) -> Option<MechanismResult> {
        self.slots.remove(&kind).flatten()
    }
}

/// Assembles the report and computes its score.
///
/// A mandatory mechanism with an empty slot becomes `unknown`.
pub fn build_report(
    domain: &Domain,
    mut outcomes: Outcomes,
    timestamp: DateTime<Utc>,
) -> SecurityReport {
    let mut mandatory = |kind: MechanismKind| {
        outcomes.take(kind).unwrap_or_else(|| {
            let result = MechanismResult::unknown(format!("{kind} check did not complete"));
            if kind == MechanismKind::Mx {
                result.with_records(Vec::new())
            } else {
                result
            }
        })
    };
    let spf = mandatory(MechanismKind::Spf);
    let dkim = mandatory(MechanismKind::Dkim);
    let dmarc = mandatory(MechanismKind::Dmarc);
    let mx = mandatory(MechanismKind::Mx);
    let bimi = outcomes.take(MechanismKind::Bimi);
    let mtasts = outcomes.take(MechanismKind::MtaSts);

    let mut report = SecurityReport {
        domain: domain.to_string(),
        timestamp,
        overall_score: 0,
        compliance_level: ComplianceLevel::Poor,
        spf,
        dkim,
        dmarc,
        mx,
        bimi,
        mtasts,
    };
    report.overall_score = scoring::overall_score(report.statuses());
    report.compliance_level = scoring::compliance_level(report.overall_score);
    report
}

/// UTC RFC 3339 timestamps with millisecond precision and a `Z` suffix.
mod timestamp_format {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Formats a timestamp the way reports serialize it.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
