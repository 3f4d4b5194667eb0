//! Shared helpers.

mod sanitize;

pub use sanitize::sanitize_and_truncate;
