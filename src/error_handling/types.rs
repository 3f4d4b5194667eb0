//! Error type definitions.
//!
//! This module defines the error taxonomy used throughout the evaluator. Only
//! [`EvaluationError`] ever aborts a whole evaluation; every other error is
//! contained to one mechanism and surfaces as that mechanism's message.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// Error initializing the DNS resolver (e.g. unreadable system configuration).
    #[error("DNS resolver initialization error: {0}")]
    DnsResolverError(String),
}

/// Fatal errors: no report is produced when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    /// The input was rejected before any network call.
    #[error("Invalid domain '{input}': {reason}")]
    InvalidDomain { input: String, reason: String },

    /// The domain does not exist in the DNS.
    #[error("Domain {domain} does not exist (NXDOMAIN)")]
    NxDomain { domain: String },
}

impl EvaluationError {
    /// Creates an `InvalidDomain` error.
    pub fn invalid(input: &str, reason: impl Into<String>) -> Self {
        EvaluationError::InvalidDomain {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    /// HTTP status code the transport layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            EvaluationError::InvalidDomain { .. } => 400,
            EvaluationError::NxDomain { .. } => 404,
        }
    }
}

/// Failure of a single DNS query.
///
/// "No records of this type" is not an error; resolvers return `Ok` with an
/// empty list for that case.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// The queried name does not exist.
    #[error("{name} does not exist (NXDOMAIN)")]
    NxDomain { name: String },

    /// No answer within the configured per-query timeout.
    #[error("DNS query for {name} timed out")]
    Timeout { name: String },

    /// The upstream server answered SERVFAIL.
    #[error("DNS server failure (SERVFAIL) for {name}")]
    ServFail { name: String },

    /// Network or protocol failure talking to the resolver.
    #[error("DNS transport failure for {name}: {reason}")]
    Transport { name: String, reason: String },
}

impl ResolutionError {
    /// True for failures worth a single retry (timeout, SERVFAIL, transport).
    pub fn is_transient(&self) -> bool {
        !matches!(self, ResolutionError::NxDomain { .. })
    }

    /// True if the failure was a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ResolutionError::Timeout { .. })
    }
}

/// A DNS record or policy file could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct ParseError {
    pub reason: String,
}

impl ParseError {
    pub fn new(reason: impl Into<String>) -> Self {
        ParseError {
            reason: reason.into(),
        }
    }
}

/// Failure fetching a policy file over HTTPS (MTA-STS).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection, TLS or timeout failure.
    #[error("policy fetch failed: {reason}")]
    Request { reason: String },

    /// The server answered with a non-200 status.
    #[error("policy server returned HTTP {code}")]
    Status { code: u16 },

    /// The server attempted a redirect, which policy hosts must not do.
    #[error("policy server attempted a redirect")]
    Redirect,

    /// The body exceeds the policy size limit.
    #[error("policy file exceeds {limit} bytes")]
    TooLarge { limit: usize },
}

impl From<ReqwestError> for TransportError {
    fn from(e: ReqwestError) -> Self {
        if e.is_timeout() {
            TransportError::Request {
                reason: "request timed out".to_string(),
            }
        } else if e.is_connect() {
            TransportError::Request {
                reason: "could not connect to policy host".to_string(),
            }
        } else if let Some(status) = e.status() {
            TransportError::Status {
                code: status.as_u16(),
            }
        } else {
            TransportError::Request {
                reason: "request error".to_string(),
            }
        }
    }
}
