//! HTTP handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::{debug, info, warn};

use super::types::{
    AppState, ComplianceReport, ErrorResponse, OnboardRequest, OnboardResponse, TestDomainRequest,
};
use crate::dns::DnsResolver;
use crate::error_handling::EvaluationError;
use crate::evaluate::PolicyFetcher;

const DOMAIN_REQUIRED: &str = "Domain is required";

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

fn evaluation_error_response(e: &EvaluationError) -> Response {
    let status = StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::BAD_REQUEST);
    error_response(status, e.to_string())
}

/// `POST /api/test-domain`: full security report for `{"domain": ...}`.
pub async fn test_domain_handler<R: DnsResolver, F: PolicyFetcher>(
    State(state): State<AppState<R, F>>,
    payload: Result<Json<TestDomainRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("Rejected request body: {rejection}");
            return error_response(StatusCode::BAD_REQUEST, DOMAIN_REQUIRED);
        }
    };
    let Some(domain) = request.domain() else {
        return error_response(StatusCode::BAD_REQUEST, DOMAIN_REQUIRED);
    };

    match state.evaluator.evaluate(domain).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            warn!("Evaluation of {domain} failed: {e}");
            evaluation_error_response(&e)
        }
    }
}

/// `POST /api/onboard-customer`: proceed or warn for a new customer's domain.
pub async fn onboard_customer_handler<R: DnsResolver, F: PolicyFetcher>(
    State(state): State<AppState<R, F>>,
    payload: Result<Json<OnboardRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("Rejected onboarding body: {rejection}");
            return error_response(StatusCode::BAD_REQUEST, DOMAIN_REQUIRED);
        }
    };
    let Some(domain) = request.domain() else {
        return error_response(StatusCode::BAD_REQUEST, DOMAIN_REQUIRED);
    };

    match state.evaluator.evaluate(domain).await {
        Ok(report) => {
            info!(
                "Onboarding {} ({}) scored {}",
                request.company_name.as_deref().unwrap_or("unnamed company"),
                domain,
                report.overall_score
            );
            (StatusCode::OK, Json(OnboardResponse::from(&report))).into_response()
        }
        Err(e) => {
            warn!("Evaluation of {domain} failed: {e}");
            evaluation_error_response(&e)
        }
    }
}

/// `GET /api/compliance-report/{domain}`: pass/fail summary for the mandatory checks.
pub async fn compliance_report_handler<R: DnsResolver, F: PolicyFetcher>(
    State(state): State<AppState<R, F>>,
    Path(domain): Path<String>,
) -> Response {
    match state.evaluator.evaluate(&domain).await {
        Ok(report) => (StatusCode::OK, Json(ComplianceReport::from(&report))).into_response(),
        Err(e) => {
            warn!("Evaluation of {domain} failed: {e}");
            evaluation_error_response(&e)
        }
    }
}

/// `GET /health`
pub async fn health_handler() -> &'static str {
    "ok"
}
