//! Typed document dispatch.

use crate::explainer_config::ExplainerConfigRule;
use crate::importance_config::ImportanceConfigRule;

use super::{DocumentMeta, RuleKind};

/// A fully deserialized configuration document of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleDocument {
    Explainer(ExplainerConfigRule),
    Importance(ImportanceConfigRule),
}

impl RuleDocument {
    /// Second pass: deserialize a (possibly merged) YAML value into the
    /// concrete type named by `kind`.
    pub fn from_value(kind: RuleKind, value: serde_yaml::Value) -> Result<Self, serde_yaml::Error> {
        Ok(match kind {
            RuleKind::ExplainerConfig => RuleDocument::Explainer(serde_yaml::from_value(value)?),
            RuleKind::ImportanceConfig => RuleDocument::Importance(serde_yaml::from_value(value)?),
        })
    }

    pub fn metadata(&self) -> &DocumentMeta {
        match self {
            RuleDocument::Explainer(rule) => &rule.metadata,
            RuleDocument::Importance(rule) => &rule.metadata,
        }
    }

    pub fn kind(&self) -> RuleKind {
        match self {
            RuleDocument::Explainer(_) => RuleKind::ExplainerConfig,
            RuleDocument::Importance(_) => RuleKind::ImportanceConfig,
        }
    }
}
