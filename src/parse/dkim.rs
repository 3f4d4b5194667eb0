//! DKIM public key record parsing (RFC 6376 section 3.6.1).

use super::parse_tags;
use crate::error_handling::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DkimKeyRecord {
    pub key_type: String,
    /// Base64 key data with whitespace removed; empty when revoked.
    pub public_key: String,
    /// `t=y`: the domain is testing DKIM.
    pub testing: bool,
}

impl DkimKeyRecord {
    pub fn is_revoked(&self) -> bool {
        self.public_key.is_empty()
    }
}

/// Parses a DKIM key TXT record.
///
/// # Errors
///
/// Returns `ParseError` for a malformed tag list, a `v=` other than `DKIM1`
/// (or not first), a missing `p=`, an unsupported key type, or key data that
/// is not base64.
pub fn parse_dkim_key(raw: &str) -> Result<DkimKeyRecord, ParseError> {
    let tags = parse_tags(raw)?;
    if tags.get("v").is_some() {
        tags.require_version("DKIM1")?;
    }

    let public_key: String = tags
        .get("p")
        .ok_or_else(|| ParseError::new("missing required p= tag"))?
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if !public_key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
    {
        return Err(ParseError::new("public key is not valid base64"));
    }

    let key_type = tags.get("k").unwrap_or("rsa").to_ascii_lowercase();
    if key_type != "rsa" && key_type != "ed25519" {
        return Err(ParseError::new(format!("unsupported key type '{key_type}'")));
    }

    let testing = tags
        .get("t")
        .map(|flags| flags.split(':').any(|f| f.trim().eq_ignore_ascii_case("y")))
        .unwrap_or(false);

    Ok(DkimKeyRecord {
        key_type,
        public_key,
        testing,
    })
}
