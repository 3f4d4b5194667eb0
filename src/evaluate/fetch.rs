//! MTA-STS policy retrieval.
//!
//! [`PolicyFetcher`] is the HTTPS seam of the evaluator. [`HttpPolicyFetcher`]
//! talks to the network with a `reqwest` client that must not follow
//! redirects; [`StaticPolicyFetcher`] serves canned bodies for tests.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use log::debug;
use reqwest::StatusCode;

use crate::config::MAX_MTA_STS_POLICY_SIZE;
use crate::error_handling::TransportError;

/// Fetches a policy document by URL.
pub trait PolicyFetcher: Clone + Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, TransportError>> + Send;
}

/// Fetcher backed by a shared `reqwest::Client`.
///
/// The client is expected to have redirects disabled and a request timeout
/// (see [`init_client`](crate::initialization::init_client)); any 3xx answer
/// is reported as [`TransportError::Redirect`].
#[derive(Clone)]
pub struct HttpPolicyFetcher {
    client: Arc<reqwest::Client>,
    max_size: usize,
}

impl HttpPolicyFetcher {
    pub fn new(client: Arc<reqwest::Client>) -> Self {
        Self {
            client,
            max_size: MAX_MTA_STS_POLICY_SIZE,
        }
    }

    /// Overrides the body size limit.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }
}

impl PolicyFetcher for HttpPolicyFetcher {
    async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        debug!("Fetching policy {url}");
        let mut response = self.client.get(url).send().await?;

        let status = response.status();
        if status.is_redirection() {
            return Err(TransportError::Redirect);
        }
        if status != StatusCode::OK {
            return Err(TransportError::Status {
                code: status.as_u16(),
            });
        }
        let limit = self.max_size;
        if response
            .content_length()
            .is_some_and(|len| len > limit as u64)
        {
            return Err(TransportError::TooLarge { limit });
        }

        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > limit {
                return Err(TransportError::TooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }

        String::from_utf8(body).map_err(|_| TransportError::Request {
            reason: "policy is not valid UTF-8".to_string(),
        })
    }
}

/// Fetcher answering from a fixed URL map. Unknown URLs fail to connect.
#[derive(Debug, Clone, Default)]
pub struct StaticPolicyFetcher {
    responses: Arc<HashMap<String, Result<String, TransportError>>>,
}

impl StaticPolicyFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `body` at `url`.
    pub fn with_policy(mut self, url: &str, body: &str) -> Self {
        Arc::make_mut(&mut self.responses).insert(url.to_string(), Ok(body.to_string()));
        self
    }

    /// Fails requests for `url` with `error`.
    pub fn with_error(mut self, url: &str, error: TransportError) -> Self {
        Arc::make_mut(&mut self.responses).insert(url.to_string(), Err(error));
        self
    }
}

impl PolicyFetcher for StaticPolicyFetcher {
    async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        self.responses
            .get(url)
            .cloned()
            .unwrap_or_else(|| {
                Err(TransportError::Request {
                    reason: "could not connect to policy host".to_string(),
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{matchers::*, responders::*, Expectation, Server};
    use std::time::Duration;

    const POLICY: &str = "version: STSv1\nmode: enforce\nmx: mx1.example.com\nmax_age: 604800\n";

    fn fetcher() -> HttpPolicyFetcher {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        HttpPolicyFetcher::new(Arc::new(client))
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/.well-known/mta-sts.txt"))
                .respond_with(status_code(200).body(POLICY)),
        );
        let url = server.url("/.well-known/mta-sts.txt").to_string();
        assert_eq!(fetcher().fetch(&url).await, Ok(POLICY.to_string()));
    }

    #[tokio::test]
    async fn test_fetch_rejects_non_200() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/.well-known/mta-sts.txt"))
                .respond_with(status_code(404)),
        );
        let url = server.url("/.well-known/mta-sts.txt").to_string();
        assert_eq!(
            fetcher().fetch(&url).await,
            Err(TransportError::Status { code: 404 })
        );
    }

    #[tokio::test]
    async fn test_fetch_does_not_follow_redirects() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/.well-known/mta-sts.txt"))
                .respond_with(
                    status_code(301).insert_header("Location", "https://elsewhere.example/policy"),
                ),
        );
        let url = server.url("/.well-known/mta-sts.txt").to_string();
        assert_eq!(fetcher().fetch(&url).await, Err(TransportError::Redirect));
    }

    #[tokio::test]
    async fn test_fetch_enforces_size_limit() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/.well-known/mta-sts.txt"))
                .respond_with(status_code(200).body("x".repeat(2048))),
        );
        let url = server.url("/.well-known/mta-sts.txt").to_string();
        let result = fetcher().with_max_size(1024).fetch(&url).await;
        assert_eq!(result, Err(TransportError::TooLarge { limit: 1024 }));
    }

    #[tokio::test]
    async fn test_fetch_connection_failure() {
        // Port 9 (discard) on localhost is not expected to accept connections
        let result = fetcher().fetch("http://127.0.0.1:9/.well-known/mta-sts.txt").await;
        assert!(matches!(result, Err(TransportError::Request { .. })));
    }

    #[tokio::test]
    async fn test_static_fetcher() {
        let fetcher = StaticPolicyFetcher::new()
            .with_policy("https://mta-sts.example.com/.well-known/mta-sts.txt", POLICY)
            .with_error(
                "https://mta-sts.broken.example/.well-known/mta-sts.txt",
                TransportError::Status { code: 500 },
            );
        assert!(fetcher
            .fetch("https://mta-sts.example.com/.well-known/mta-sts.txt")
            .await
            .is_ok());
        assert_eq!(
            fetcher
                .fetch("https://mta-sts.broken.example/.well-known/mta-sts.txt")
                .await,
            Err(TransportError::Status { code: 500 })
        );
        assert!(fetcher.fetch("https://unknown.example/").await.is_err());
    }
}
