//! BIMI assertion record parsing.

use url::Url;

use super::parse_tags;
use crate::error_handling::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BimiPolicy {
    /// `l=` as published. Only the first entry of a comma separated list is kept.
    pub logo_url: Option<String>,
    /// `a=` (Verified Mark Certificate location).
    pub authority_url: Option<String>,
    pub warnings: Vec<String>,
}

impl BimiPolicy {
    /// Empty `l=` and no `a=`: the domain declines to publish a logo.
    pub fn is_declination(&self) -> bool {
        self.logo_url.is_none() && self.authority_url.is_none()
    }
}

/// Parses a BIMI TXT record.
///
/// # Errors
///
/// Returns `ParseError` for a malformed tag list or a first tag other than
/// `v=BIMI1`. A malformed logo or authority URL only adds a warning.
pub fn parse_bimi(raw: &str) -> Result<BimiPolicy, ParseError> {
    let tags = parse_tags(raw)?;
    tags.require_version("BIMI1")?;

    let mut warnings = Vec::new();

    let logo_url = non_empty(tags.get("l")).map(|list| {
        let first = list.split(',').next().unwrap_or(list).trim().to_string();
        if let Some(problem) = url_problem(&first, true) {
            warnings.push(format!("logo URL {problem}"));
        }
        first
    });

    let authority_url = non_empty(tags.get("a")).map(|a| {
        if let Some(problem) = url_problem(a, false) {
            warnings.push(format!("authority URL {problem}"));
        }
        a.to_string()
    });

    Ok(BimiPolicy {
        logo_url,
        authority_url,
        warnings,
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Describes what is wrong with a BIMI URL, if anything.
fn url_problem(raw: &str, require_svg: bool) -> Option<String> {
    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(_) => return Some(format!("'{raw}' is not a valid URL")),
    };
    if url.scheme() != "https" {
        return Some(format!("'{raw}' must use https"));
    }
    if require_svg && !url.path().to_ascii_lowercase().ends_with(".svg") {
        return Some(format!("'{raw}' does not point to an SVG file"));
    }
    None
}
