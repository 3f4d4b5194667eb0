//! Record parsers.
//!
//! Pure functions turning raw DNS text (and the MTA-STS policy file) into
//! structured policies. Parsers never touch the network; a parse failure is a
//! [`ParseError`] carrying a human readable reason, while recoverable oddities
//! (unknown SPF mechanisms, malformed BIMI logo URLs) are returned as warnings
//! on the parsed value.

mod bimi;
mod dkim;
mod dmarc;
mod mta_sts;
mod mx;
mod spf;

pub use bimi::{parse_bimi, BimiPolicy};
pub use dkim::{parse_dkim_key, DkimKeyRecord};
pub use dmarc::{parse_dmarc, Alignment, Disposition, DmarcPolicy};
pub use mta_sts::{parse_mta_sts_policy, parse_mta_sts_record, MtaStsMode, MtaStsPolicy, MtaStsRecord};
pub use mx::{parse_mx, sort_mx};
pub use spf::{parse_spf, Directive, Mechanism, Qualifier, SpfPolicy};
pub(crate) use spf::is_spf_record;

use crate::error_handling::ParseError;

/// Parses a `k=v; k=v` tag list. See [`TagList::parse`].
pub fn parse_tags(input: &str) -> Result<TagList, ParseError> {
    TagList::parse(input)
}

/// Ordered `name=value` tags of a `k=v; k=v` record (DMARC, DKIM, BIMI, MTA-STS).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagList {
    tags: Vec<(String, String)>,
}

impl TagList {
    /// Parses a tag list. Tag names are lowercased; values are trimmed.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` for a tag without `=`, an empty tag name, or a
    /// duplicated tag.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let mut tags: Vec<(String, String)> = Vec::new();
        for part in input.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (name, value) = part
                .split_once('=')
                .ok_or_else(|| ParseError::new(format!("malformed tag '{part}'")))?;
            let name = name.trim().to_ascii_lowercase();
            if name.is_empty() {
                return Err(ParseError::new(format!("malformed tag '{part}'")));
            }
            if tags.iter().any(|(n, _)| *n == name) {
                return Err(ParseError::new(format!("duplicate '{name}' tag")));
            }
            tags.push((name, value.trim().to_string()));
        }
        Ok(TagList { tags })
    }

    /// Value of a tag, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// First tag of the record.
    pub fn first(&self) -> Option<(&str, &str)> {
        self.tags.first().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Checks that the first tag is `v=<expected>`.
    pub fn require_version(&self, expected: &str) -> Result<(), ParseError> {
        match self.first() {
            Some(("v", value)) if value.eq_ignore_ascii_case(expected) => Ok(()),
            Some(("v", value)) => Err(ParseError::new(format!(
                "unsupported version '{value}' (expected {expected})"
            ))),
            _ => Err(ParseError::new(format!("record must start with v={expected}"))),
        }
    }
}
