//! HTTP endpoint.
//!
//! Provides:
//! - `POST /api/test-domain` - full security report as JSON
//! - `POST /api/onboard-customer` - proceed or warn for a new customer's domain
//! - `GET /api/compliance-report/{domain}` - pass/fail summary of SPF, DKIM and DMARC
//! - `GET /health` - liveness probe

mod handlers;
mod types;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::Context;
use axum::routing::{get, post};
use axum::Router;
use log::info;
use tokio::net::TcpListener;

use crate::dns::DnsResolver;
use crate::evaluate::PolicyFetcher;
use crate::pipeline::Evaluator;

use handlers::{
    compliance_report_handler, health_handler, onboard_customer_handler, test_domain_handler,
};
pub use types::{
    AppState, CheckSummary, ComplianceChecks, ComplianceReport, ErrorResponse, OnboardIssues,
    OnboardRequest, OnboardResponse, TestDomainRequest,
};

/// Builds the router around `evaluator`.
pub fn router<R: DnsResolver, F: PolicyFetcher>(evaluator: Evaluator<R, F>) -> Router {
    let state = AppState {
        evaluator: Arc::new(evaluator),
    };
    Router::new()
        .route("/api/test-domain", post(test_domain_handler::<R, F>))
        .route(
            "/api/onboard-customer",
            post(onboard_customer_handler::<R, F>),
        )
        .route(
            "/api/compliance-report/:domain",
            get(compliance_report_handler::<R, F>),
        )
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Serves on an already bound listener until the server fails.
///
/// # Errors
///
/// Returns an error if the server stops with an I/O error.
pub async fn serve_listener<R: DnsResolver, F: PolicyFetcher>(
    listener: TcpListener,
    evaluator: Evaluator<R, F>,
) -> anyhow::Result<()> {
    axum::serve(listener, router(evaluator))
        .await
        .context("Server error")
}

/// Binds `bind:port` and serves.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve<R: DnsResolver, F: PolicyFetcher>(
    bind: IpAddr,
    port: u16,
    evaluator: Evaluator<R, F>,
) -> anyhow::Result<()> {
    let addr = SocketAddr::new(bind, port);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind server to {addr}"))?;

    info!("Server listening on http://{addr}/");
    info!("  - Report: POST http://{addr}/api/test-domain");
    info!("  - Onboarding: POST http://{addr}/api/onboard-customer");
    info!("  - Health: http://{addr}/health");

    serve_listener(listener, evaluator).await
}
