//! HTTP client initialization.

use std::sync::Arc;

use reqwest::ClientBuilder;

use crate::config::EvaluatorConfig;

/// Initializes the HTTP client used for MTA-STS policy fetches.
///
/// Redirects are disabled (RFC 8461 section 3.3 forbids following them),
/// and the request timeout and User-Agent come from `config`.
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_client(config: &EvaluatorConfig) -> Result<Arc<reqwest::Client>, reqwest::Error> {
    let client = ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(config.https_timeout)
        .user_agent(config.user_agent.clone())
        .build()?;
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{matchers::*, responders::*, Expectation, Server};

    #[tokio::test]
    async fn test_client_sends_user_agent_and_does_not_follow_redirects() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/.well-known/mta-sts.txt"),
                request::headers(contains(("user-agent", "posture-test/1.0"))),
            ])
            .respond_with(status_code(302).insert_header("Location", "/elsewhere")),
        );

        let config = EvaluatorConfig {
            user_agent: "posture-test/1.0".to_string(),
            ..Default::default()
        };
        let client = init_client(&config).unwrap();
        let response = client
            .get(server.url("/.well-known/mta-sts.txt").to_string())
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 302);
    }
}
