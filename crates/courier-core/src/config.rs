//! Environment-variable lookups used by service configs.
//!
//! Empty values count as unset, so `FOO=` in a `.env` file behaves like a missing key.

use anyhow::{Context, anyhow};

/// Load a `.env` file from the working directory if one exists.
///
/// Variables already present in the process environment win over the file.
pub fn load_dotenv() {
    match dotenv::dotenv() {
        Ok(path) => ::tracing::debug!(path = %path.display(), "loaded .env file"),
        Err(_) => ::tracing::debug!("no .env file, using process environment"),
    }
}

/// Read a required variable. Fails when the key is missing or empty.
pub fn required(key: &str) -> anyhow::Result<String> {
    required_from(key, env_lookup)
}

/// Read an optional variable.
pub fn optional(key: &str) -> Option<String> {
    optional_from(key, env_lookup)
}

/// Read a variable, falling back to `default` when missing or empty.
pub fn or_default(key: &str, default: &str) -> String {
    optional(key).unwrap_or_else(|| default.to_owned())
}

/// Read a variable and parse it, falling back to `default` when missing.
pub fn parsed_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

pub(crate) fn optional_from(key: &str, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}

pub(crate) fn required_from(
    key: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<String> {
    optional_from(key, lookup).ok_or_else(|| anyhow!("{key} must be set"))
}
