//! DMARC record parsing (RFC 7489).

use strum_macros::{Display, EnumString};

use super::parse_tags;
use crate::error_handling::ParseError;

/// Requested handling of failing mail, ordered weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Disposition {
    None,
    Quarantine,
    Reject,
}

impl Disposition {
    /// True for `quarantine` and `reject`.
    pub fn is_enforcing(self) -> bool {
        self >= Disposition::Quarantine
    }
}

/// Identifier alignment mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Relaxed,
    Strict,
}

impl Alignment {
    fn parse(tag: &str, value: &str) -> Result<Self, ParseError> {
        match value.to_ascii_lowercase().as_str() {
            "r" => Ok(Alignment::Relaxed),
            "s" => Ok(Alignment::Strict),
            _ => Err(ParseError::new(format!("invalid {tag} value '{value}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmarcPolicy {
    pub policy: Disposition,
    /// `sp=`; subdomains inherit `policy` when absent.
    pub subdomain_policy: Option<Disposition>,
    pub percentage: u8,
    pub rua: Vec<String>,
    pub ruf: Vec<String>,
    pub adkim: Alignment,
    pub aspf: Alignment,
    pub failure_options: Option<String>,
    pub report_interval: Option<String>,
    pub raw: String,
}

impl DmarcPolicy {
    /// Policy applied to subdomains.
    pub fn effective_subdomain_policy(&self) -> Disposition {
        self.subdomain_policy.unwrap_or(self.policy)
    }

    /// True when failing mail is quarantined or rejected.
    pub fn is_enforcing(&self) -> bool {
        self.policy.is_enforcing()
    }
}

/// Parses a DMARC TXT record.
///
/// # Errors
///
/// Returns `ParseError` if the first tag is not `v=DMARC1`, `p=` is missing,
/// or a known tag carries an invalid value.
pub fn parse_dmarc(raw: &str) -> Result<DmarcPolicy, ParseError> {
    let tags = parse_tags(raw)?;
    tags.require_version("DMARC1")?;

    let policy = match tags.get("p") {
        Some(p) => parse_disposition("p", p)?,
        None => return Err(ParseError::new("missing required p= tag")),
    };
    let subdomain_policy = tags
        .get("sp")
        .map(|sp| parse_disposition("sp", sp))
        .transpose()?;

    let percentage = match tags.get("pct") {
        Some(pct) => match pct.parse::<u8>() {
            Ok(n) if n <= 100 => n,
            _ => return Err(ParseError::new(format!("invalid pct value '{pct}'"))),
        },
        None => 100,
    };

    let adkim = tags
        .get("adkim")
        .map(|v| Alignment::parse("adkim", v))
        .transpose()?
        .unwrap_or_default();
    let aspf = tags
        .get("aspf")
        .map(|v| Alignment::parse("aspf", v))
        .transpose()?
        .unwrap_or_default();

    Ok(DmarcPolicy {
        policy,
        subdomain_policy,
        percentage,
        rua: split_uris(tags.get("rua")),
        ruf: split_uris(tags.get("ruf")),
        adkim,
        aspf,
        failure_options: tags.get("fo").map(str::to_string),
        report_interval: tags.get("ri").map(str::to_string),
        raw: raw.trim().to_string(),
    })
}

fn parse_disposition(tag: &str, value: &str) -> Result<Disposition, ParseError> {
    value
        .parse::<Disposition>()
        .map_err(|_| ParseError::new(format!("invalid {tag} value '{value}'")))
}

fn split_uris(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|uri| !uri.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
