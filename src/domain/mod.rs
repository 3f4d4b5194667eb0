//! Domain validation and normalization.
//!
//! A [`Domain`] is created once from user input and is immutable afterwards.
//! Validation happens before any network call, so a rejected domain never
//! costs a DNS query.
//!
//! Normalization:
//! - surrounding whitespace is trimmed and one trailing dot removed
//! - labels are lowercased and internationalized labels converted to punycode

use std::fmt;

use crate::error_handling::EvaluationError;

/// Maximum length of a domain name in presentation format (RFC 1035).
const MAX_DOMAIN_LENGTH: usize = 253;
/// Maximum length of a single label (RFC 1035).
const MAX_LABEL_LENGTH: usize = 63;

/// A validated, normalized hostname.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Domain(String);

impl Domain {
    /// Validates and normalizes user input into a `Domain`.
    ///
    /// # Errors
    ///
    /// Returns `EvaluationError::InvalidDomain` if the input is empty, contains
    /// whitespace, is an IP address or URL, or violates DNS length and label rules.
    pub fn parse(input: &str) -> Result<Self, EvaluationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(EvaluationError::invalid(input, "domain is empty"));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(EvaluationError::invalid(input, "domain contains whitespace"));
        }
        if trimmed.contains(['@', '/', ':']) {
            return Err(EvaluationError::invalid(
                input,
                "expected a bare domain name, not a URL or e-mail address",
            ));
        }
        // url::Host would percent-decode this into a different name
        if trimmed.contains('%') {
            return Err(EvaluationError::invalid(input, "domain contains '%'"));
        }

        let without_dot = trimmed.strip_suffix('.').unwrap_or(trimmed);

        // url::Host handles IDNA (punycode) conversion and lowercasing
        let ascii = match url::Host::parse(without_dot) {
            Ok(url::Host::Domain(d)) => d,
            Ok(url::Host::Ipv4(_)) | Ok(url::Host::Ipv6(_)) => {
                return Err(EvaluationError::invalid(
                    input,
                    "IP addresses are not domains",
                ));
            }
            Err(e) => {
                return Err(EvaluationError::invalid(input, format!("invalid host: {e}")));
            }
        };

        validate_ascii_domain(&ascii).map_err(|reason| EvaluationError::invalid(input, reason))?;
        Ok(Domain(ascii))
    }

    /// Returns the normalized domain name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds an owner name below this domain, e.g. `_dmarc.example.com`.
    pub fn subdomain(&self, prefix: &str) -> String {
        format!("{}.{}", prefix, self.0)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Checks length and label rules on an already lowercased ASCII name.
fn validate_ascii_domain(name: &str) -> Result<(), String> {
    if name.len() > MAX_DOMAIN_LENGTH {
        return Err(format!(
            "domain is longer than {MAX_DOMAIN_LENGTH} characters"
        ));
    }

    let labels: Vec<&str> = name.split('.').collect();
    if labels.len() < 2 {
        return Err("domain must contain at least two labels".to_string());
    }

    for label in &labels {
        if label.is_empty() {
            return Err("domain contains an empty label".to_string());
        }
        if label.len() > MAX_LABEL_LENGTH {
            return Err(format!(
                "label '{label}' is longer than {MAX_LABEL_LENGTH} characters"
            ));
        }
        if !label
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        {
            return Err(format!("label '{label}' contains invalid characters"));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(format!("label '{label}' starts or ends with a hyphen"));
        }
    }

    if let Some(tld) = labels.last() {
        if tld.bytes().all(|b| b.is_ascii_digit()) {
            return Err("top-level domain cannot be numeric".to_string());
        }
    }

    Ok(())
}
