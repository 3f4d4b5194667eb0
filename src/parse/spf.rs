//! SPF record parsing (RFC 7208).

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::error_handling::ParseError;

/// Directive qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualifier {
    /// `+` (default)
    Pass,
    /// `-`
    Fail,
    /// `~`
    SoftFail,
    /// `?`
    Neutral,
}

impl Qualifier {
    /// Prefix character used in records.
    pub fn symbol(&self) -> char {
        match self {
            Qualifier::Pass => '+',
            Qualifier::Fail => '-',
            Qualifier::SoftFail => '~',
            Qualifier::Neutral => '?',
        }
    }
}

/// SPF mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mechanism {
    All,
    Include { domain: String },
    A { domain: Option<String> },
    Mx { domain: Option<String> },
    Ptr { domain: Option<String> },
    Ip4 { addr: Ipv4Addr, prefix: u8 },
    Ip6 { addr: Ipv6Addr, prefix: u8 },
    Exists { domain: String },
}

impl Mechanism {
    /// True for mechanisms that cost a DNS lookup during evaluation.
    pub fn requires_lookup(&self) -> bool {
        matches!(
            self,
            Mechanism::Include { .. }
                | Mechanism::A { .. }
                | Mechanism::Mx { .. }
                | Mechanism::Ptr { .. }
                | Mechanism::Exists { .. }
        )
    }
}

/// Qualifier plus mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub qualifier: Qualifier,
    pub mechanism: Mechanism,
}

/// Parsed SPF record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpfPolicy {
    pub directives: Vec<Directive>,
    pub redirect: Option<String>,
    pub explanation: Option<String>,
    pub raw: String,
    /// Non-fatal findings (unknown mechanisms, missing `all`).
    pub warnings: Vec<String>,
}

impl SpfPolicy {
    /// Qualifier of the first `all` mechanism, if any.
    pub fn all_qualifier(&self) -> Option<Qualifier> {
        self.directives
            .iter()
            .find(|d| d.mechanism == Mechanism::All)
            .map(|d| d.qualifier)
    }

    /// True if the record ends in `+all` or `?all`.
    pub fn is_permissive(&self) -> bool {
        matches!(
            self.all_qualifier(),
            Some(Qualifier::Pass) | Some(Qualifier::Neutral)
        )
    }

    /// The `redirect=` target, ignored by receivers when an `all` mechanism exists.
    pub fn effective_redirect(&self) -> Option<&str> {
        match self.all_qualifier() {
            Some(_) => None,
            None => self.redirect.as_deref(),
        }
    }

    /// Number of terms in this record that cost a DNS lookup.
    pub fn dns_lookup_terms(&self) -> usize {
        let mechanisms = self
            .directives
            .iter()
            .filter(|d| d.mechanism.requires_lookup())
            .count();
        mechanisms + usize::from(self.effective_redirect().is_some())
    }

    /// Domains whose SPF records are pulled in by `include:` and `redirect=`.
    pub fn referenced_domains(&self) -> Vec<&str> {
        let mut domains: Vec<&str> = self
            .directives
            .iter()
            .filter_map(|d| match &d.mechanism {
                Mechanism::Include { domain } => Some(domain.as_str()),
                _ => None,
            })
            .collect();
        if let Some(redirect) = self.effective_redirect() {
            domains.push(redirect);
        }
        domains
    }
}

/// True if a TXT string is an SPF record (`v=spf1` followed by a space or end).
pub(crate) fn is_spf_record(txt: &str) -> bool {
    let txt = txt.trim();
    match (txt.get(..6), txt.get(6..)) {
        (Some(version), Some(rest)) => {
            version.eq_ignore_ascii_case("v=spf1") && rest.chars().next().map_or(true, |c| c == ' ')
        }
        _ => false,
    }
}

/// Parses an SPF TXT record.
///
/// # Errors
///
/// Returns `ParseError` if the record does not start with `v=spf1`, contains a
/// malformed `ip4`/`ip6`/`include`/`exists` term or duplicates a modifier.
/// Unknown mechanisms and a missing `all` are reported as warnings instead.
pub fn parse_spf(raw: &str) -> Result<SpfPolicy, ParseError> {
    let txt = raw.trim();
    if !is_spf_record(txt) {
        return Err(ParseError::new("record must start with v=spf1"));
    }

    let mut directives = Vec::new();
    let mut redirect = None;
    let mut explanation = None;
    let mut warnings = Vec::new();

    for term in txt[6..].split_whitespace() {
        let lower = term.to_ascii_lowercase();

        if let Some(target) = lower.strip_prefix("redirect=") {
            if redirect.is_some() {
                return Err(ParseError::new("duplicate redirect modifier"));
            }
            redirect = Some(require_domain(target, "redirect")?);
            continue;
        }
        if let Some(target) = lower.strip_prefix("exp=") {
            if explanation.is_some() {
                return Err(ParseError::new("duplicate exp modifier"));
            }
            explanation = Some(require_domain(target, "exp")?);
            continue;
        }
        // Unknown modifiers are ignored (RFC 7208 section 6)
        if is_modifier(&lower) {
            continue;
        }

        let (qualifier, body) = split_qualifier(&lower);
        match parse_mechanism(body)? {
            Some(mechanism) => directives.push(Directive {
                qualifier,
                mechanism,
            }),
            None => warnings.push(format!("unknown mechanism '{term}'")),
        }
    }

    let mut policy = SpfPolicy {
        directives,
        redirect,
        explanation,
        raw: txt.to_string(),
        warnings,
    };
    if policy.all_qualifier().is_none() && policy.redirect.is_none() {
        policy
            .warnings
            .push("no 'all' mechanism; unmatched senders default to neutral".to_string());
    }
    Ok(policy)
}

fn is_modifier(term: &str) -> bool {
    match term.split_once('=') {
        Some((name, _)) => {
            !name.is_empty()
                && !name.contains(':')
                && !name.contains('/')
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        }
        None => false,
    }
}

fn split_qualifier(term: &str) -> (Qualifier, &str) {
    match term.chars().next() {
        Some('+') => (Qualifier::Pass, &term[1..]),
        Some('-') => (Qualifier::Fail, &term[1..]),
        Some('~') => (Qualifier::SoftFail, &term[1..]),
        Some('?') => (Qualifier::Neutral, &term[1..]),
        _ => (Qualifier::Pass, term),
    }
}

fn require_domain(target: &str, what: &str) -> Result<String, ParseError> {
    let target = target.trim_end_matches('.');
    if target.is_empty() {
        return Err(ParseError::new(format!("{what} requires a domain")));
    }
    Ok(target.to_string())
}

/// Parses one mechanism; `Ok(None)` for an unknown mechanism name.
fn parse_mechanism(body: &str) -> Result<Option<Mechanism>, ParseError> {
    let (name, arg) = match body.find([':', '/']) {
        Some(idx) => (&body[..idx], &body[idx..]),
        None => (body, ""),
    };

    let mechanism = match name {
        "all" => {
            if !arg.is_empty() {
                return Err(ParseError::new("'all' takes no arguments"));
            }
            Mechanism::All
        }
        "include" => Mechanism::Include {
            domain: require_domain(domain_argument(arg, "include")?, "include")?,
        },
        "exists" => Mechanism::Exists {
            domain: require_domain(domain_argument(arg, "exists")?, "exists")?,
        },
        "a" => Mechanism::A {
            domain: optional_domain_with_cidr(arg, "a")?,
        },
        "mx" => Mechanism::Mx {
            domain: optional_domain_with_cidr(arg, "mx")?,
        },
        "ptr" => Mechanism::Ptr {
            domain: match arg.strip_prefix(':') {
                Some(d) => Some(require_domain(d, "ptr")?),
                None if arg.is_empty() => None,
                None => return Err(ParseError::new(format!("malformed ptr term 'ptr{arg}'"))),
            },
        },
        "ip4" => {
            let (addr, prefix) = split_cidr(domain_argument(arg, "ip4")?, 32, "ip4")?;
            let addr = addr
                .parse::<Ipv4Addr>()
                .map_err(|_| ParseError::new(format!("invalid ip4 address '{addr}'")))?;
            Mechanism::Ip4 { addr, prefix }
        }
        "ip6" => {
            let (addr, prefix) = split_cidr(domain_argument(arg, "ip6")?, 128, "ip6")?;
            let addr = addr
                .parse::<Ipv6Addr>()
                .map_err(|_| ParseError::new(format!("invalid ip6 address '{addr}'")))?;
            Mechanism::Ip6 { addr, prefix }
        }
        _ => return Ok(None),
    };
    Ok(Some(mechanism))
}

/// Strips the `:` introducing a mandatory argument.
fn domain_argument<'a>(arg: &'a str, what: &str) -> Result<&'a str, ParseError> {
    arg.strip_prefix(':')
        .ok_or_else(|| ParseError::new(format!("{what} requires an argument")))
}

/// `a`/`mx` accept `[:domain][/cidr4][//cidr6]`.
fn optional_domain_with_cidr(arg: &str, what: &str) -> Result<Option<String>, ParseError> {
    let (domain_part, cidr_part) = match arg.find('/') {
        Some(idx) => (&arg[..idx], &arg[idx..]),
        None => (arg, ""),
    };

    if !cidr_part.is_empty() {
        let (v4, v6) = match cidr_part.strip_prefix("//") {
            Some(v6) => (None, Some(v6)),
            None => {
                let rest = &cidr_part[1..];
                match rest.split_once("//") {
                    Some((v4, v6)) => (Some(v4), Some(v6)),
                    None => (Some(rest), None),
                }
            }
        };
        if let Some(v4) = v4 {
            parse_prefix(v4, 32, what)?;
        }
        if let Some(v6) = v6 {
            parse_prefix(v6, 128, what)?;
        }
    }

    match domain_part.strip_prefix(':') {
        Some(d) => Ok(Some(require_domain(d, what)?)),
        None if domain_part.is_empty() => Ok(None),
        None => Err(ParseError::new(format!("malformed {what} term"))),
    }
}

fn split_cidr<'a>(arg: &'a str, max: u8, what: &str) -> Result<(&'a str, u8), ParseError> {
    match arg.split_once('/') {
        Some((addr, prefix)) => Ok((addr, parse_prefix(prefix, max, what)?)),
        None => Ok((arg, max)),
    }
}

fn parse_prefix(prefix: &str, max: u8, what: &str) -> Result<u8, ParseError> {
    match prefix.parse::<u8>() {
        Ok(p) if p <= max => Ok(p),
        _ => Err(ParseError::new(format!(
            "invalid {what} prefix length '/{prefix}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_fail_all() {
        let policy = parse_spf("v=spf1 -all").unwrap();
        assert_eq!(policy.all_qualifier(), Some(Qualifier::Fail));
        assert!(!policy.is_permissive());
        assert!(policy.warnings.is_empty());
        assert_eq!(policy.dns_lookup_terms(), 0);
    }

    #[test]
    fn test_parse_typical_record() {
        let policy = parse_spf(
            "v=spf1 ip4:192.0.2.0/24 ip6:2001:db8::/32 include:_spf.google.com mx a:mail.example.com/28 ~all",
        )
        .unwrap();
        assert_eq!(policy.directives.len(), 6);
        assert_eq!(
            policy.directives[0].mechanism,
            Mechanism::Ip4 {
                addr: Ipv4Addr::new(192, 0, 2, 0),
                prefix: 24
            }
        );
        assert_eq!(policy.all_qualifier(), Some(Qualifier::SoftFail));
        assert_eq!(policy.dns_lookup_terms(), 3);
        assert_eq!(policy.referenced_domains(), vec!["_spf.google.com"]);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let policy = parse_spf("V=SPF1 INCLUDE:Example.NET -ALL").unwrap();
        assert_eq!(
            policy.directives[0].mechanism,
            Mechanism::Include {
                domain: "example.net".into()
            }
        );
        assert_eq!(policy.all_qualifier(), Some(Qualifier::Fail));
    }

    #[test]
    fn test_parse_rejects_wrong_version() {
        assert!(parse_spf("v=spf2 -all").is_err());
        assert!(parse_spf("v=spf10 -all").is_err());
        assert!(parse_spf("spf1 -all").is_err());
    }

    #[test]
    fn test_parse_rejects_malformed_terms() {
        assert!(parse_spf("v=spf1 ip4:999.1.1.1 -all").is_err());
        assert!(parse_spf("v=spf1 ip4:192.0.2.1/33 -all").is_err());
        assert!(parse_spf("v=spf1 ip6:zz::1 -all").is_err());
        assert!(parse_spf("v=spf1 include: -all").is_err());
        assert!(parse_spf("v=spf1 include -all").is_err());
        assert!(parse_spf("v=spf1 redirect=a.example redirect=b.example").is_err());
    }

    #[test]
    fn test_unknown_mechanism_is_warning() {
        let policy = parse_spf("v=spf1 ip5:192.0.2.1 -all").unwrap();
        assert_eq!(policy.warnings, vec!["unknown mechanism 'ip5:192.0.2.1'"]);
        assert_eq!(policy.all_qualifier(), Some(Qualifier::Fail));
    }

    #[test]
    fn test_missing_all_is_warning() {
        let policy = parse_spf("v=spf1 mx").unwrap();
        assert_eq!(policy.all_qualifier(), None);
        assert_eq!(policy.warnings.len(), 1);
        assert!(policy.warnings[0].contains("no 'all'"));
    }

    #[test]
    fn test_redirect_counts_only_without_all() {
        let policy = parse_spf("v=spf1 redirect=_spf.example.net").unwrap();
        assert!(policy.warnings.is_empty());
        assert_eq!(policy.dns_lookup_terms(), 1);
        assert_eq!(policy.referenced_domains(), vec!["_spf.example.net"]);

        let policy = parse_spf("v=spf1 -all redirect=_spf.example.net").unwrap();
        assert_eq!(policy.dns_lookup_terms(), 0);
        assert!(policy.referenced_domains().is_empty());
    }

    #[test]
    fn test_permissive_qualifiers() {
        assert!(parse_spf("v=spf1 +all").unwrap().is_permissive());
        assert!(parse_spf("v=spf1 all").unwrap().is_permissive());
        assert!(parse_spf("v=spf1 ?all").unwrap().is_permissive());
        assert!(!parse_spf("v=spf1 ~all").unwrap().is_permissive());
    }

    #[test]
    fn test_unknown_modifier_is_ignored() {
        let policy = parse_spf("v=spf1 custom=value -all").unwrap();
        assert!(policy.warnings.is_empty());
        assert_eq!(policy.directives.len(), 1);
    }

    #[test]
    fn test_a_and_mx_dual_cidr() {
        let policy = parse_spf("v=spf1 a/24//64 mx:example.com//64 -all").unwrap();
        assert_eq!(policy.directives[0].mechanism, Mechanism::A { domain: None });
        assert_eq!(
            policy.directives[1].mechanism,
            Mechanism::Mx {
                domain: Some("example.com".into())
            }
        );
        assert!(parse_spf("v=spf1 a/40 -all").is_err());
    }

    #[test]
    fn test_is_spf_record() {
        assert!(is_spf_record("v=spf1"));
        assert!(is_spf_record("  v=spf1 -all"));
        assert!(!is_spf_record("v=spf1x"));
        assert!(!is_spf_record("google-site-verification=abc"));
    }
}
