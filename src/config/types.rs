//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::constants::{
    DEFAULT_BIMI_SELECTOR, DEFAULT_BULK_CONCURRENCY, DEFAULT_DKIM_SELECTORS, DEFAULT_SERVER_PORT,
    DEFAULT_USER_AGENT, DNS_MAX_RETRIES, DNS_QUERY_TIMEOUT, DNS_RETRY_DELAY, GLOBAL_TIMEOUT,
    HTTPS_TIMEOUT, MAX_SPF_DNS_LOOKUPS, MECHANISM_TIMEOUT, TIMEOUT_MARGIN,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Upstream recursive resolvers used for DNS queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ResolverChoice {
    /// Nameservers from the operating system configuration (`/etc/resolv.conf`)
    System,
    /// Google Public DNS (8.8.8.8, 8.8.4.4)
    Google,
    /// Cloudflare (1.1.1.1, 1.0.0.1)
    Cloudflare,
    /// Quad9 (9.9.9.9)
    Quad9,
}

/// Evaluator configuration (no CLI dependencies).
///
/// # Examples
///
/// ```
/// use mail_posture::EvaluatorConfig;
/// use std::time::Duration;
///
/// let config = EvaluatorConfig {
///     global_timeout: Duration::from_secs(10),
///     ..Default::default()
/// };
/// assert_eq!(config.max_spf_lookups, 10);
/// ```
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    /// Timeout of a single DNS query
    pub query_timeout: Duration,

    /// Delay before the single retry of a transient DNS failure
    pub retry_delay: Duration,

    /// Timeout covering all work of one mechanism
    pub mechanism_timeout: Duration,

    /// Ceiling for the whole evaluation
    pub global_timeout: Duration,

    /// Timeout of the MTA-STS policy fetch
    pub https_timeout: Duration,

    /// DKIM selectors probed, in priority order
    pub dkim_selectors: Vec<String>,

    /// BIMI selector
    pub bimi_selector: String,

    /// SPF DNS lookup limit
    pub max_spf_lookups: usize,

    /// HTTP User-Agent header value for policy fetches
    pub user_agent: String,
}

impl EvaluatorConfig {
    /// Returns a copy with every timeout scaled to `per_query`.
    ///
    /// The mechanism timeout is the query's full retry budget (every attempt
    /// plus the delays between them) and [`TIMEOUT_MARGIN`]. The global ceiling
    /// is three query timeouts, never less than the mechanism timeout.
    pub fn with_query_timeout(mut self, per_query: Duration) -> Self {
        self.query_timeout = per_query;
        self.mechanism_timeout = self.retry_budget() + TIMEOUT_MARGIN;
        self.global_timeout = (per_query * 3).max(self.mechanism_timeout);
        self
    }

    /// Worst-case time for one query including its retries.
    pub fn retry_budget(&self) -> Duration {
        let retries = DNS_MAX_RETRIES as u32;
        self.query_timeout * (retries + 1) + self.retry_delay * retries
    }
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            query_timeout: DNS_QUERY_TIMEOUT,
            retry_delay: DNS_RETRY_DELAY,
            mechanism_timeout: MECHANISM_TIMEOUT,
            global_timeout: GLOBAL_TIMEOUT,
            https_timeout: HTTPS_TIMEOUT,
            dkim_selectors: DEFAULT_DKIM_SELECTORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            bimi_selector: DEFAULT_BIMI_SELECTOR.to_string(),
            max_spf_lookups: MAX_SPF_DNS_LOOKUPS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Command-line options.
#[derive(Debug, Parser)]
#[command(
    name = "mail_posture",
    version,
    about = "Email security posture checks (SPF, DKIM, DMARC, MX, BIMI, MTA-STS)"
)]
pub struct Opt {
    /// Log level
    #[arg(long, value_enum, default_value = "info", env = "MAIL_POSTURE_LOG_LEVEL", global = true)]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value = "plain", env = "MAIL_POSTURE_LOG_FORMAT", global = true)]
    pub log_format: LogFormat,

    /// Upstream resolvers
    #[arg(long, value_enum, default_value = "system", env = "MAIL_POSTURE_RESOLVER", global = true)]
    pub resolver: ResolverChoice,

    /// Per-query DNS timeout in seconds (mechanism and global ceilings scale with it)
    #[arg(long, env = "MAIL_POSTURE_TIMEOUT_SECS", global = true)]
    pub timeout_secs: Option<u64>,

    /// Extra DKIM selectors to probe before the built-in list (comma separated)
    #[arg(long, value_delimiter = ',', env = "MAIL_POSTURE_DKIM_SELECTORS", global = true)]
    pub dkim_selector: Vec<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Opt {
    /// Builds the evaluator configuration from CLI options.
    pub fn evaluator_config(&self) -> EvaluatorConfig {
        let mut config = EvaluatorConfig::default();
        if let Some(secs) = self.timeout_secs {
            config = config.with_query_timeout(Duration::from_secs(secs.max(1)));
        }
        if !self.dkim_selector.is_empty() {
            let mut selectors: Vec<String> = self
                .dkim_selector
                .iter()
                .map(|s| s.trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
            for default in config.dkim_selectors.drain(..) {
                if !selectors.contains(&default) {
                    selectors.push(default);
                }
            }
            config.dkim_selectors = selectors;
        }
        config
    }
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check a single domain and print the report
    Check {
        /// Domain to check (e.g. example.com)
        domain: String,

        /// Print the raw JSON report instead of the formatted view
        #[arg(long)]
        json: bool,
    },

    /// Check every domain listed in a file and write a CSV report
    Bulk {
        /// File with one domain per line (`#` starts a comment)
        file: PathBuf,

        /// CSV output path
        #[arg(long, short, default_value = "email_security_report.csv")]
        output: PathBuf,

        /// Number of domains evaluated concurrently
        #[arg(long, default_value_t = DEFAULT_BULK_CONCURRENCY)]
        concurrency: usize,
    },

    /// Serve `POST /api/test-domain` over HTTP
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1", env = "MAIL_POSTURE_BIND")]
        bind: IpAddr,

        /// Port to listen on
        #[arg(long, default_value_t = DEFAULT_SERVER_PORT, env = "MAIL_POSTURE_PORT")]
        port: u16,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Warn),
            log::LevelFilter::Warn
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Info),
            log::LevelFilter::Info
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_evaluator_config_default() {
        let config = EvaluatorConfig::default();
        assert_eq!(config.query_timeout, Duration::from_secs(5));
        assert_eq!(config.mechanism_timeout, Duration::from_millis(10_500));
        assert_eq!(config.global_timeout, Duration::from_secs(15));
        assert_eq!(config.max_spf_lookups, 10);
        assert_eq!(config.bimi_selector, "default");
        assert_eq!(config.dkim_selectors[0], "default");
        assert!(config.dkim_selectors.contains(&"google".to_string()));
    }

    #[test]
    fn test_with_query_timeout_scales_ceilings() {
        let config = EvaluatorConfig::default().with_query_timeout(Duration::from_secs(2));
        assert_eq!(config.query_timeout, Duration::from_secs(2));
        assert_eq!(config.mechanism_timeout, Duration::from_millis(4_500));
        assert_eq!(config.global_timeout, Duration::from_secs(6));
    }

    #[test]
    fn test_retry_fits_inside_mechanism_timeout() {
        let default = EvaluatorConfig::default();
        assert!(default.retry_budget() < default.mechanism_timeout);
        assert_eq!(
            default.clone().with_query_timeout(DNS_QUERY_TIMEOUT).mechanism_timeout,
            default.mechanism_timeout
        );

        let fast = EvaluatorConfig::default().with_query_timeout(Duration::from_millis(100));
        assert_eq!(fast.retry_budget(), Duration::from_millis(400));
        assert!(fast.retry_budget() < fast.mechanism_timeout);
        assert!(fast.mechanism_timeout <= fast.global_timeout);
    }

    #[test]
    fn test_parse_check_command() {
        let opt = Opt::try_parse_from(["mail_posture", "check", "example.com", "--json"])
            .expect("check should parse");
        match opt.command {
            Command::Check { domain, json } => {
                assert_eq!(domain, "example.com");
                assert!(json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_bulk_defaults() {
        let opt = Opt::try_parse_from(["mail_posture", "bulk", "domains.txt"])
            .expect("bulk should parse");
        match opt.command {
            Command::Bulk {
                file,
                output,
                concurrency,
            } => {
                assert_eq!(file, PathBuf::from("domains.txt"));
                assert_eq!(output, PathBuf::from("email_security_report.csv"));
                assert_eq!(concurrency, DEFAULT_BULK_CONCURRENCY);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_custom_selectors_come_first_without_duplicates() {
        let opt = Opt::try_parse_from([
            "mail_posture",
            "--dkim-selector",
            "Mandrill,google",
            "check",
            "example.com",
        ])
        .expect("options should parse");
        let config = opt.evaluator_config();
        assert_eq!(config.dkim_selectors[0], "mandrill");
        assert_eq!(config.dkim_selectors[1], "google");
        assert_eq!(
            config
                .dkim_selectors
                .iter()
                .filter(|s| s.as_str() == "google")
                .count(),
            1
        );
    }

    #[test]
    fn test_timeout_flag_sets_all_ceilings() {
        let opt = Opt::try_parse_from(["mail_posture", "--timeout-secs", "3", "check", "a.com"])
            .expect("options should parse");
        let config = opt.evaluator_config();
        assert_eq!(config.query_timeout, Duration::from_secs(3));
        assert_eq!(config.global_timeout, Duration::from_secs(9));
    }
}
