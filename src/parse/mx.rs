//! MX answer parsing.

use crate::error_handling::ParseError;
use crate::report::MxEntry;

/// Parses a rendered MX answer (`"<preference> <exchange>"`).
///
/// # Errors
///
/// Returns `ParseError` if the preference is not a `u16` or the exchange is
/// missing.
pub fn parse_mx(raw: &str) -> Result<MxEntry, ParseError> {
    let mut parts = raw.split_whitespace();
    let priority = parts
        .next()
        .and_then(|p| p.parse::<u16>().ok())
        .ok_or_else(|| ParseError::new(format!("invalid MX preference in '{raw}'")))?;
    let exchange = parts
        .next()
        .ok_or_else(|| ParseError::new(format!("missing MX exchange in '{raw}'")))?;
    if parts.next().is_some() {
        return Err(ParseError::new(format!("malformed MX record '{raw}'")));
    }

    // The root name "." (null MX) keeps its dot so it stays distinguishable
    let exchange = if exchange == "." {
        exchange.to_string()
    } else {
        exchange.trim_end_matches('.').to_ascii_lowercase()
    };

    Ok(MxEntry { priority, exchange })
}

/// Orders entries by priority, then exchange name.
pub fn sort_mx(entries: &mut [MxEntry]) {
    entries.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.exchange.cmp(&b.exchange))
    });
}
