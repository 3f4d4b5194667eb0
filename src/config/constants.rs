//! Configuration constants.
//!
//! This module defines the default timeouts, limits and scoring policy used
//! throughout the evaluator. Scoring weights and tier cut points are part of the
//! report contract: callers persist and compare scores over time, so changing
//! them changes what historical scores mean.

use std::time::Duration;

// Network operation timeouts
/// Per-query DNS timeout.
/// Most answers arrive in well under a second; 5s tolerates slow authoritative servers.
pub const DNS_QUERY_TIMEOUT: Duration = Duration::from_secs(5);
/// Delay before the single retry of a transient DNS failure.
pub const DNS_RETRY_DELAY: Duration = Duration::from_millis(200);
/// Maximum number of retries for a transient DNS failure (timeout, SERVFAIL).
pub const DNS_MAX_RETRIES: usize = 1;
/// Slack added on top of a query's full retry budget.
pub const TIMEOUT_MARGIN: Duration = Duration::from_millis(300);
/// Per-mechanism timeout covering all lookups and fetches of one mechanism.
/// Two query attempts plus the retry delay and [`TIMEOUT_MARGIN`].
pub const MECHANISM_TIMEOUT: Duration = Duration::from_millis(10_500);
/// Global ceiling for one evaluation. Mechanisms still running are reported as unknown.
pub const GLOBAL_TIMEOUT: Duration = Duration::from_secs(15);
/// Timeout for the MTA-STS policy HTTPS fetch.
pub const HTTPS_TIMEOUT: Duration = Duration::from_secs(8);

// Mechanism-specific limits
/// RFC 7208 section 4.6.4: at most 10 DNS-querying terms per SPF evaluation.
pub const MAX_SPF_DNS_LOOKUPS: usize = 10;
/// Maximum include/redirect nesting followed when counting SPF lookups.
pub const MAX_SPF_RECURSION_DEPTH: usize = 10;
/// RFC 8461 section 3.3: policy bodies are small; anything larger is rejected.
pub const MAX_MTA_STS_POLICY_SIZE: usize = 64 * 1024;
/// RFC 8461 section 3.2: `max_age` upper bound (one year, in seconds).
pub const MAX_MTA_STS_MAX_AGE: u64 = 31_557_600;
/// Well-known path of the MTA-STS policy file.
pub const MTA_STS_POLICY_PATH: &str = "/.well-known/mta-sts.txt";

/// Common DKIM selectors probed when the sender's selector is not known.
pub const DEFAULT_DKIM_SELECTORS: &[&str] = &[
    "default",
    "google",
    "selector1",
    "selector2",
    "k1",
    "s1",
    "s2",
    "dkim",
    "mail",
];
/// Default BIMI selector (`default._bimi.<domain>`).
pub const DEFAULT_BIMI_SELECTOR: &str = "default";

/// Maximum length of a mechanism message in characters.
pub const MAX_MESSAGE_LENGTH: usize = 500;

/// User-Agent sent with MTA-STS policy fetches.
pub const DEFAULT_USER_AGENT: &str = concat!("mail_posture/", env!("CARGO_PKG_VERSION"));

// Scoring weights (pass = full, warning = half, fail/unknown = 0)
/// Weight of the SPF mechanism.
pub const SPF_WEIGHT: u32 = 24;
/// Weight of the DKIM mechanism.
pub const DKIM_WEIGHT: u32 = 20;
/// Weight of the DMARC mechanism.
pub const DMARC_WEIGHT: u32 = 26;
/// Weight of the MX mechanism.
pub const MX_WEIGHT: u32 = 20;
/// Bonus weight of BIMI (only ever adds to the score).
pub const BIMI_BONUS: u32 = 4;
/// Bonus weight of MTA-STS (only ever adds to the score).
pub const MTA_STS_BONUS: u32 = 6;
/// Highest possible score.
pub const MAX_SCORE: u32 = 100;

// Compliance tiers (inclusive lower bounds)
/// Lowest score of the `excellent` tier.
pub const EXCELLENT_THRESHOLD: u32 = 90;
/// Lowest score of the `good` tier.
pub const GOOD_THRESHOLD: u32 = 70;
/// Lowest score of the `fair` tier.
pub const FAIR_THRESHOLD: u32 = 50;
/// Score at or above which callers treat a domain as cyber-insurance ready.
pub const INSURANCE_READY_SCORE: u32 = 80;
/// Score at or above which onboarding flows proceed without a warning.
pub const PROCEED_SCORE: u32 = 70;

// Bulk checking
/// Default number of domains evaluated concurrently by `bulk`.
pub const DEFAULT_BULK_CONCURRENCY: usize = 4;

// HTTP endpoint
/// Default listen port of `serve`.
pub const DEFAULT_SERVER_PORT: u16 = 3000;
