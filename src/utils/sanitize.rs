//! Message sanitization.
//!
//! Mechanism messages end up in JSON reports, CSV cells and terminal output.
//! They are kept to a single line of printable text and bounded in length.

use crate::config::MAX_MESSAGE_LENGTH;

/// Removes control characters and folds line breaks and tabs into spaces.
///
/// Non-ASCII text is preserved.
pub fn sanitize_message(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    for c in message.chars() {
        match c {
            '\n' | '\r' | '\t' => {
                if !out.ends_with(' ') {
                    out.push(' ');
                }
            }
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out.trim().to_string()
}

/// Sanitizes a message and truncates it to `MAX_MESSAGE_LENGTH` characters.
///
/// Truncation happens on a character boundary and ends in `...`.
pub fn sanitize_and_truncate(message: &str) -> String {
    truncate_chars(&sanitize_message(message), MAX_MESSAGE_LENGTH)
}

fn truncate_chars(message: &str, max_chars: usize) -> String {
    if message.chars().count() <= max_chars {
        return message.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut truncated: String = message.chars().take(keep).collect();
    truncated.push_str("...");
    truncated
}
