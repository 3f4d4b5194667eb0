//! mail_posture library: email security posture evaluation
//!
//! This library checks the DNS-published email security controls of a domain
//! (SPF, DKIM, DMARC, MX, and optionally BIMI and MTA-STS), scores them, and
//! produces a timestamped [`SecurityReport`] with a compliance tier.
//!
//! # Example
//!
//! ```no_run
//! use mail_posture::initialization::init_evaluator;
//! use mail_posture::{EvaluatorConfig, ResolverChoice};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let evaluator = init_evaluator(ResolverChoice::Google, EvaluatorConfig::default())?;
//! let report = evaluator.evaluate("example.com").await?;
//! println!("{}: {}/100 ({})", report.domain, report.overall_score, report.compliance_level);
//! # Ok(())
//! # }
//! ```
//!
//! # Offline evaluation
//!
//! [`StaticResolver`] and [`StaticPolicyFetcher`] stand in for DNS and HTTPS,
//! which makes every evaluation reproducible:
//!
//! ```
//! use mail_posture::{Evaluator, EvaluatorConfig, StaticPolicyFetcher, StaticResolver, Status};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let dns = StaticResolver::new()
//!     .with_txt("example.com", ["v=spf1 -all"])
//!     .with_mx("example.com", 10, "mx.example.com");
//! let evaluator = Evaluator::new(dns, StaticPolicyFetcher::new(), EvaluatorConfig::default());
//! let report = evaluator.evaluate("example.com").await.unwrap();
//! assert_eq!(report.spf.status, Status::Pass);
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod bulk;
pub mod config;
pub mod dns;
pub mod domain;
pub mod error_handling;
pub mod evaluate;
pub mod initialization;
pub mod output;
pub mod parse;
pub mod pipeline;
pub mod report;
pub mod scoring;
pub mod server;
mod utils;

// Re-export public API
pub use config::{EvaluatorConfig, LogFormat, LogLevel, ResolverChoice};
pub use dns::{DnsResolver, HickoryResolver, StaticResolver};
pub use domain::Domain;
pub use error_handling::{EvaluationError, ParseError, ResolutionError, TransportError};
pub use evaluate::{HttpPolicyFetcher, PolicyFetcher, StaticPolicyFetcher};
pub use pipeline::Evaluator;
pub use report::{ComplianceLevel, MechanismKind, MechanismResult, MxEntry, SecurityReport, Status};
