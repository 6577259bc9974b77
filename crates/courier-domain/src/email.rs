//! Email address syntax check.

use std::sync::LazyLock;

use regex::Regex;

/// Pattern every recipient address must match before a send is attempted.
pub const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("EMAIL_PATTERN is a valid regex"));

/// Returns `true` if `email` is a syntactically valid address.
///
/// The check is purely lexical: `local@domain.tld` with a TLD of at least two letters.
/// Surrounding whitespace is not trimmed; callers trim first when reading user input.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Local part of an address (text before the first `@`), used as a display-name fallback.
pub fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}
