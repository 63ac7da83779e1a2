//! Header metadata carried by every configuration document.

use serde::{Deserialize, Serialize};

/// Identity and lifecycle fields of a document.
///
/// `extends` names a parent document; the loader deep-merges the parent
/// under the child before the kind-specific parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DocumentMeta {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Disabled documents are parsed but never activated.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub extends: Option<String>,
}

impl DocumentMeta {
    /// Ids are lowercase slugs (`[a-z0-9_-]`, starting with a letter or
    /// digit) so they can be referenced from `extends` and from logs.
    pub fn check_id(&self) -> std::result::Result<(), String> {
        let id = self.id.as_str();
        let Some(first) = id.chars().next() else {
            return Err("metadata.id must not be empty".to_string());
        };
        if !first.is_ascii_alphanumeric() {
            return Err(format!("metadata.id '{}' must start with a letter or digit", id));
        }
        if let Some(bad) = id
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '_'))
        {
            return Err(format!("metadata.id '{}' contains invalid character '{}'", id, bad));
        }
        if self.extends.as_deref() == Some(id) {
            return Err(format!("document '{}' cannot extend itself", id));
        }
        Ok(())
    }
}

fn enabled_by_default() -> bool {
    true
}
