//! Bulk-send recipients and template personalization.

use serde::{Deserialize, Serialize};

/// Maximum number of recipients accepted in one bulk batch (and kept from one CSV).
pub const MAX_BULK_RECIPIENTS: usize = 100;

/// Placeholders replaced by the recipient's name.
pub const NAME_PLACEHOLDERS: [&str; 2] = ["{{name}}", "{{Name}}"];

/// One addressee of a bulk send. `name` may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub email: String,
    #[serde(default)]
    pub name: String,
}

impl Recipient {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
        }
    }
}

/// Substitute every name placeholder in `template` with `name`.
///
/// An empty `name` leaves the template untouched, placeholders included.
pub fn personalize(template: &str, name: &str) -> String {
    if name.is_empty() {
        return template.to_owned();
    }
    NAME_PLACEHOLDERS
        .iter()
        .fold(template.to_owned(), |acc, placeholder| {
            acc.replace(placeholder, name)
        })
}
