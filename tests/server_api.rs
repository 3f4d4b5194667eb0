//! Tests for the HTTP endpoint, served on an ephemeral port.

use std::net::SocketAddr;

use mail_posture::server::{serve_listener, ComplianceReport, ErrorResponse, OnboardResponse};
use mail_posture::{SecurityReport, Status};
use tokio::net::TcpListener;

#[path = "helpers.rs"]
mod helpers;

use helpers::fixture_evaluator;

async fn spawn_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve_listener(listener, fixture_evaluator()));
    addr
}

async fn post_json(addr: SocketAddr, body: &str) -> (u16, String) {
    post_to(addr, "/api/test-domain", body).await
}

async fn post_to(addr: SocketAddr, path: &str, body: &str) -> (u16, String) {
    let response = reqwest::Client::new()
        .post(format!("http://{addr}{path}"))
        .header("content-type", "application/json")
        .body(body.to_string())
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.text().await.unwrap())
}

#[tokio::test]
async fn test_report_for_known_domain() {
    let addr = spawn_server().await;
    let (status, body) = post_json(addr, r#"{"domain": "good-example.com"}"#).await;

    assert_eq!(status, 200);
    let report: SecurityReport = serde_json::from_str(&body).unwrap();
    assert_eq!(report.domain, "good-example.com");
    assert_eq!(report.spf.status, Status::Pass);
    assert!(report.overall_score >= 90);
}

#[tokio::test]
async fn test_missing_domain_is_bad_request() {
    let addr = spawn_server().await;
    for body in [r#"{}"#, r#"{"domain": ""}"#, r#"{"domain": "  "}"#, "not json"] {
        let (status, text) = post_json(addr, body).await;
        assert_eq!(status, 400, "body {body}");
        let error: ErrorResponse = serde_json::from_str(&text).unwrap();
        assert_eq!(error.error, "Domain is required");
    }
}

#[tokio::test]
async fn test_invalid_domain_is_bad_request() {
    let addr = spawn_server().await;
    let (status, text) = post_json(addr, r#"{"domain": "not a domain"}"#).await;

    assert_eq!(status, 400);
    let error: ErrorResponse = serde_json::from_str(&text).unwrap();
    assert!(error.error.starts_with("Invalid domain"));
    // The report schema is never partially emitted
    assert!(!text.contains("overallScore"));
}

#[tokio::test]
async fn test_unknown_domain_is_not_found() {
    let addr = spawn_server().await;
    let (status, text) = post_json(addr, r#"{"domain": "missing.example"}"#).await;

    assert_eq!(status, 404);
    let error: ErrorResponse = serde_json::from_str(&text).unwrap();
    assert!(error.error.contains("NXDOMAIN"));
}

#[tokio::test]
async fn test_compliance_report() {
    let addr = spawn_server().await;
    let response = reqwest::get(format!("http://{addr}/api/compliance-report/bare-example.com"))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let report: ComplianceReport = serde_json::from_str(&response.text().await.unwrap()).unwrap();
    assert_eq!(report.overall_score, 0);
    assert!(!report.checks.spf.passed);
    assert!(!report.checks.dmarc.passed);
    assert!(!report.cyber_insurance_ready);
}

#[tokio::test]
async fn test_onboarding_good_domain_proceeds() {
    let addr = spawn_server().await;
    let (status, body) = post_to(
        addr,
        "/api/onboard-customer",
        r#"{"email": "it@good-example.com", "companyName": "Good Co", "domain": "good-example.com"}"#,
    )
    .await;

    assert_eq!(status, 200);
    let response: OnboardResponse = serde_json::from_str(&body).unwrap();
    assert!(response.success);
    assert_eq!(response.message.as_deref(), Some("Email security looks good!"));
    assert!(response.score.unwrap() >= 90);
    assert!(response.warning.is_none());
    assert!(!body.contains("issues"));
}

#[tokio::test]
async fn test_onboarding_weak_domain_warns() {
    let addr = spawn_server().await;
    let (status, body) = post_to(
        addr,
        "/api/onboard-customer",
        r#"{"email": "it@bare-example.com", "companyName": "Bare Co", "domain": "bare-example.com"}"#,
    )
    .await;

    assert_eq!(status, 200);
    let response: OnboardResponse = serde_json::from_str(&body).unwrap();
    assert!(response.success);
    assert_eq!(response.warning.as_deref(), Some("Email security needs attention"));
    let issues = response.issues.unwrap();
    assert!(issues.spf && issues.dkim && issues.dmarc);
    assert_eq!(
        response.recommendation.as_deref(),
        Some("We recommend fixing email security before proceeding")
    );
    assert!(response.score.is_none());
}

#[tokio::test]
async fn test_onboarding_without_domain_is_bad_request() {
    let addr = spawn_server().await;
    let (status, text) = post_to(addr, "/api/onboard-customer", r#"{"companyName": "Acme"}"#).await;
    assert_eq!(status, 400);
    let error: ErrorResponse = serde_json::from_str(&text).unwrap();
    assert_eq!(error.error, "Domain is required");
}

#[tokio::test]
async fn test_health() {
    let addr = spawn_server().await;
    let response = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().await.unwrap(), "ok");
}
