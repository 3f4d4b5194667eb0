//! MTA-STS TXT record and policy file parsing (RFC 8461).

use strum_macros::{Display, EnumString};

use super::parse_tags;
use crate::config::MAX_MTA_STS_MAX_AGE;
use crate::error_handling::ParseError;

/// `_mta-sts.<domain>` TXT record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MtaStsRecord {
    pub id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum MtaStsMode {
    Enforce,
    Testing,
    None,
}

/// Policy file served at `https://mta-sts.<domain>/.well-known/mta-sts.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MtaStsPolicy {
    pub mode: MtaStsMode,
    pub mx: Vec<String>,
    pub max_age: u64,
}

/// Parses the `_mta-sts` TXT record.
///
/// # Errors
///
/// Returns `ParseError` unless the record is `v=STSv1` followed by an `id`
/// of 1 to 32 alphanumeric characters.
pub fn parse_mta_sts_record(raw: &str) -> Result<MtaStsRecord, ParseError> {
    let tags = parse_tags(raw)?;
    tags.require_version("STSv1")?;

    let id = tags
        .get("id")
        .ok_or_else(|| ParseError::new("missing required id= tag"))?;
    if id.is_empty() || id.len() > 32 || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ParseError::new(format!(
            "id '{id}' must be 1-32 alphanumeric characters"
        )));
    }
    Ok(MtaStsRecord { id: id.to_string() })
}

/// Parses a policy file of `key: value` lines (LF or CRLF).
///
/// # Errors
///
/// Returns `ParseError` for a missing or wrong `version`, a missing or unknown
/// `mode`, no `mx` lines outside `mode: none`, or a `max_age` that is not an
/// integer in `0..=31557600`. Unknown keys are ignored.
pub fn parse_mta_sts_policy(text: &str) -> Result<MtaStsPolicy, ParseError> {
    let mut version = None;
    let mut mode = None;
    let mut max_age = None;
    let mut mx = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| ParseError::new(format!("malformed policy line '{line}'")))?;
        let key = key.trim();
        let value = value.trim();

        match key {
            "version" => set_once(&mut version, key, value.to_string())?,
            "mode" => {
                let parsed = value
                    .parse::<MtaStsMode>()
                    .map_err(|_| ParseError::new(format!("invalid mode '{value}'")))?;
                set_once(&mut mode, key, parsed)?;
            }
            "max_age" => {
                let parsed = value
                    .parse::<u64>()
                    .ok()
                    .filter(|age| *age <= MAX_MTA_STS_MAX_AGE)
                    .ok_or_else(|| ParseError::new(format!("invalid max_age '{value}'")))?;
                set_once(&mut max_age, key, parsed)?;
            }
            "mx" => mx.push(value.to_ascii_lowercase()),
            _ => {}
        }
    }

    match version.as_deref() {
        Some("STSv1") => {}
        Some(other) => return Err(ParseError::new(format!("unsupported version '{other}'"))),
        None => return Err(ParseError::new("missing version")),
    }
    let mode = mode.ok_or_else(|| ParseError::new("missing mode"))?;
    let max_age = max_age.ok_or_else(|| ParseError::new("missing max_age"))?;
    if mx.is_empty() && mode != MtaStsMode::None {
        return Err(ParseError::new("policy lists no mx hosts"));
    }

    Ok(MtaStsPolicy { mode, mx, max_age })
}

fn set_once<T>(slot: &mut Option<T>, key: &str, value: T) -> Result<(), ParseError> {
    if slot.is_some() {
        return Err(ParseError::new(format!("duplicate '{key}' line")));
    }
    *slot = Some(value);
    Ok(())
}
