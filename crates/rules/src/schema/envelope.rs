//! First-pass header of a configuration document.

use serde::{Deserialize, Serialize};

use super::{DocumentMeta, RuleKind};

/// The only document format version this crate reads.
pub const API_VERSION: &str = "v1";

/// Header fields only; everything else stays raw YAML until `extends`
/// has been resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleEnvelope {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: DocumentMeta,
    #[serde(flatten)]
    pub rest: serde_yaml::Value,
}

impl RuleEnvelope {
    pub fn rule_kind(&self) -> std::result::Result<RuleKind, String> {
        self.kind.parse()
    }

    /// Version, id and kind checks run before a document is accepted
    /// into the inheritance graph.
    pub fn check(&self) -> std::result::Result<RuleKind, String> {
        if self.api_version != API_VERSION {
            return Err(format!(
                "unsupported apiVersion '{}' (expected '{}')",
                self.api_version, API_VERSION
            ));
        }
        self.metadata.check_id()?;
        self.rule_kind()
    }
}
