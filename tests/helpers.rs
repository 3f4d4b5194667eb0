// Shared fixtures for integration tests.
//
// Every zone is served by `StaticResolver`, so no test touches the network.

use std::time::Duration;

use mail_posture::{Evaluator, EvaluatorConfig, StaticPolicyFetcher, StaticResolver};

pub type TestEvaluator = Evaluator<StaticResolver, StaticPolicyFetcher>;

#[allow(dead_code)] // Only used by some test files
pub const DKIM_KEY: &str = "MIGfMA0GCSqGSIb3DQEBAQUAA4GNADCBiQKBgQDwIRP/UC3SBsEmGqZ9ZJW3/DkMoGeLnQg1fWn7/zYtIxN2SnFCjxOCKG9v3b4jYfcTNh5ijSsq631uBItLa7od+v/RtdC2UzJ1lWT947qR+Rcac2gbto/NMqJ0fzfVjH4OuKhitdY9tf6mcwGjaNBcWToIMmPSPDdQPNUYckcQ2QIDAQAB";

const GOOD_POLICY: &str = "version: STSv1\nmode: enforce\nmx: mx1.good-example.com\nmx: mx2.good-example.com\nmax_age: 604800\n";

/// Timeouts small enough to keep timeout scenarios fast.
pub fn fast_config() -> EvaluatorConfig {
    EvaluatorConfig {
        retry_delay: Duration::from_millis(1),
        ..EvaluatorConfig::default().with_query_timeout(Duration::from_millis(100))
    }
}

/// A well configured domain with every mechanism published.
pub fn good_example(resolver: StaticResolver) -> StaticResolver {
    resolver
        .with_txt(
            "good-example.com",
            ["v=spf1 ip4:192.0.2.0/24 -all", "google-site-verification=abc123"],
        )
        .with_txt(
            "_dmarc.good-example.com",
            ["v=DMARC1; p=reject; rua=mailto:dmarc@good-example.com; adkim=s; aspf=s"],
        )
        .with_txt(
            "google._domainkey.good-example.com",
            [format!("v=DKIM1; k=rsa; p={DKIM_KEY}")],
        )
        .with_mx("good-example.com", 10, "mx1.good-example.com")
        .with_mx("good-example.com", 20, "mx2.good-example.com")
        .with_a("mx1.good-example.com", "192.0.2.10")
        .with_a("mx2.good-example.com", "192.0.2.20")
        .with_txt(
            "default._bimi.good-example.com",
            ["v=BIMI1; l=https://good-example.com/logo.svg; a=https://good-example.com/vmc.pem"],
        )
        .with_txt("_mta-sts.good-example.com", ["v=STSv1; id=20240101"])
}

/// A domain that exists but publishes nothing.
pub fn bare_example(resolver: StaticResolver) -> StaticResolver {
    resolver.with_existing("bare-example.com")
}

/// A domain whose apex never answers in time.
pub fn timeout_example(resolver: StaticResolver) -> StaticResolver {
    resolver
        .with_txt("timeout-example.com", ["v=spf1 -all"])
        .with_mx("timeout-example.com", 10, "mx.timeout-example.com")
        .with_txt("_dmarc.timeout-example.com", ["v=DMARC1; p=reject"])
        .with_delay("timeout-example.com", Duration::from_secs(30))
}

/// All fixture zones in one resolver.
pub fn fixture_resolver() -> StaticResolver {
    timeout_example(bare_example(good_example(StaticResolver::new())))
}

pub fn fixture_fetcher() -> StaticPolicyFetcher {
    StaticPolicyFetcher::new().with_policy(
        "https://mta-sts.good-example.com/.well-known/mta-sts.txt",
        GOOD_POLICY,
    )
}

pub fn fixture_evaluator() -> TestEvaluator {
    Evaluator::new(fixture_resolver(), fixture_fetcher(), fast_config())
}
