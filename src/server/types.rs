//! Server data structures.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::pipeline::Evaluator;
use crate::report::{ComplianceLevel, MechanismResult, SecurityReport, Status};
use crate::scoring;

/// Shared state for the handlers.
pub struct AppState<R, F> {
    pub evaluator: Arc<Evaluator<R, F>>,
}

// Derived Clone would require R: Clone and F: Clone on the Arc
impl<R, F> Clone for AppState<R, F> {
    fn clone(&self) -> Self {
        Self {
            evaluator: Arc::clone(&self.evaluator),
        }
    }
}

/// Body of `POST /api/test-domain`.
#[derive(Debug, Default, Deserialize)]
pub struct TestDomainRequest {
    #[serde(default)]
    pub domain: Option<String>,
}

impl TestDomainRequest {
    /// The requested domain, if present and not blank.
    pub fn domain(&self) -> Option<&str> {
        self.domain
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}

/// JSON error body.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Pass/fail view of one mandatory authentication mechanism.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckSummary {
    pub passed: bool,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
}

impl From<&MechanismResult> for CheckSummary {
    fn from(result: &MechanismResult) -> Self {
        Self {
            passed: result.status == Status::Pass,
            details: result.message.clone(),
            policy: result.policy.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComplianceChecks {
    pub spf: CheckSummary,
    pub dkim: CheckSummary,
    pub dmarc: CheckSummary,
}

/// Body of `GET /api/compliance-report/{domain}`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    pub domain: String,
    pub tested_at: String,
    pub overall_score: u32,
    pub compliance_level: ComplianceLevel,
    pub checks: ComplianceChecks,
    pub cyber_insurance_ready: bool,
}

impl From<&SecurityReport> for ComplianceReport {
    fn from(report: &SecurityReport) -> Self {
        Self {
            domain: report.domain.clone(),
            tested_at: crate::report::format_timestamp(&report.timestamp),
            overall_score: report.overall_score,
            compliance_level: report.compliance_level,
            checks: ComplianceChecks {
                spf: CheckSummary::from(&report.spf),
                dkim: CheckSummary::from(&report.dkim),
                dmarc: CheckSummary::from(&report.dmarc),
            },
            cyber_insurance_ready: scoring::is_insurance_ready(report.overall_score),
        }
    }
}

/// Body of `POST /api/onboard-customer`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
}

impl OnboardRequest {
    /// The customer's domain, if present and not blank.
    pub fn domain(&self) -> Option<&str> {
        self.domain
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}

/// Mandatory mechanisms that did not pass.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OnboardIssues {
    pub spf: bool,
    pub dkim: bool,
    pub dmarc: bool,
}

/// Body returned by `POST /api/onboard-customer`.
///
/// Below the proceed score it carries `warning`, `issues` and
/// `recommendation`; otherwise `message` and `score`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OnboardResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues: Option<OnboardIssues>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
}

impl From<&SecurityReport> for OnboardResponse {
    fn from(report: &SecurityReport) -> Self {
        if scoring::is_proceed(report.overall_score) {
            return Self {
                success: true,
                warning: None,
                issues: None,
                recommendation: None,
                message: Some("Email security looks good!".into()),
                score: Some(report.overall_score),
            };
        }
        Self {
            success: true,
            warning: Some("Email security needs attention".into()),
            issues: Some(OnboardIssues {
                spf: report.spf.status != Status::Pass,
                dkim: report.dkim.status != Status::Pass,
                dmarc: report.dmarc.status != Status::Pass,
            }),
            recommendation: Some("We recommend fixing email security before proceeding".into()),
            message: None,
            score: None,
        }
    }
}
