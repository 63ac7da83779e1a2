//! [`ConfigLoader`]: filesystem-backed loading of configuration documents.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::explainer_config::CompiledExplainerConfig;
use crate::importance_config::CompiledImportanceConfig;
use crate::schema::{RuleDocument, RuleEnvelope, RuleKind};

use super::error::{LoadResult, LoadStatus, Result, RuleError};
use super::extends::resolve_extends;

/// The active, validated configuration for one process.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigSet {
    pub explainer: CompiledExplainerConfig,
    pub importance: CompiledImportanceConfig,
    /// Id of the document the explainer config came from (None = built-in defaults).
    pub explainer_source: Option<String>,
    pub importance_source: Option<String>,
}

impl ConfigSet {
    /// Load the active configuration from `dir`, logging files that failed
    /// to parse. Shorthand for [`ConfigLoader::load`].
    pub fn load_dir(dir: impl Into<PathBuf>) -> Result<Self> {
        let (set, results) = ConfigLoader::new(dir).load()?;
        let failed = results.iter().filter(|r| r.is_failed()).count();
        info!(
            files = results.len(),
            failed,
            explainer = set.explainer_source.as_deref().unwrap_or("defaults"),
            importance = set.importance_source.as_deref().unwrap_or("defaults"),
            "configuration loaded"
        );
        Ok(set)
    }
}

/// Scans a directory (recursively) for `*.yml` / `*.yaml` documents.
pub struct ConfigLoader {
    rules_dir: PathBuf,
}

struct RawDocument {
    kind: RuleKind,
    value: serde_yaml::Value,
}

impl ConfigLoader {
    pub fn new(rules_dir: impl Into<PathBuf>) -> Self {
        Self {
            rules_dir: rules_dir.into(),
        }
    }

    /// Load every document, resolve inheritance and compile the first enabled
    /// document of each kind (by id). Kinds with no document use defaults.
    ///
    /// Unparseable files are reported in the returned [`LoadResult`]s and
    /// skipped; a selected document that fails validation is an error.
    pub fn load(&self) -> Result<(ConfigSet, Vec<LoadResult>)> {
        let mut results = Vec::new();
        let mut raw: HashMap<String, RawDocument> = HashMap::new();

        if self.rules_dir.is_dir() {
            self.scan_dir(&self.rules_dir, &mut raw, &mut results)?;
        } else {
            warn!(path = %self.rules_dir.display(), "rules directory not found, using built-in defaults");
        }

        let values: HashMap<String, serde_yaml::Value> = raw
            .iter()
            .map(|(id, doc)| (id.clone(), doc.value.clone()))
            .collect();
        let mut merged = resolve_extends(&values)?;

        let mut ids: Vec<&String> = raw.keys().collect();
        ids.sort();

        let mut set = ConfigSet::default();
        for id in ids {
            let kind = raw[id].kind;
            let already_chosen = match kind {
                RuleKind::ExplainerConfig => set.explainer_source.is_some(),
                RuleKind::ImportanceConfig => set.importance_source.is_some(),
            };
            if already_chosen {
                continue;
            }
            let Some(value) = merged.remove(id) else {
                continue;
            };
            let doc = RuleDocument::from_value(kind, value)?;
            if !doc.metadata().enabled {
                debug!(rule_id = %id, "skipping disabled document");
                continue;
            }
            match doc {
                RuleDocument::Explainer(rule) => {
                    set.explainer = rule.compile()?;
                    set.explainer_source = Some(id.clone());
                }
                RuleDocument::Importance(rule) => {
                    set.importance = rule.compile()?;
                    set.importance_source = Some(id.clone());
                }
            }
            info!(rule_id = %id, kind = %kind, "activated configuration document");
        }

        Ok((set, results))
    }

    /// Parse a single file and return its fully typed document (no
    /// inheritance resolution).
    pub fn load_file(&self, path: &Path) -> Result<RuleDocument> {
        let contents = fs::read_to_string(path)?;
        let (kind, value) = parse_envelope(&contents)?;
        Ok(RuleDocument::from_value(kind, value)?)
    }

    fn scan_dir(
        &self,
        dir: &Path,
        raw: &mut HashMap<String, RawDocument>,
        results: &mut Vec<LoadResult>,
    ) -> Result<()> {
        let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;
        entries.sort();

        for path in entries {
            let hidden = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with('.'))
                .unwrap_or(false);
            if hidden {
                if path.is_file() {
                    results.push(skipped(path, "dotfile"));
                }
                continue;
            }

            if path.is_dir() {
                self.scan_dir(&path, raw, results)?;
                continue;
            }

            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e == "yml" || e == "yaml")
                .unwrap_or(false);
            if !is_yaml {
                results.push(skipped(path, "not a YAML file"));
                continue;
            }

            let parsed = fs::read_to_string(&path)
                .map_err(RuleError::from)
                .and_then(|contents| parse_envelope(&contents));
            match parsed {
                Ok((kind, value)) => {
                    let rule_id = value
                        .get("metadata")
                        .and_then(|m| m.get("id"))
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string();
                    if raw.contains_key(&rule_id) {
                        return Err(RuleError::Validation(format!(
                            "duplicate document id '{}' in {}",
                            rule_id,
                            path.display()
                        )));
                    }
                    debug!(rule_id = %rule_id, kind = %kind, path = %path.display(), "loaded document");
                    raw.insert(rule_id.clone(), RawDocument { kind, value });
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Loaded { rule_id },
                    });
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load configuration file");
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Failed {
                            error: e.to_string(),
                        },
                    });
                }
            }
        }
        Ok(())
    }
}

/// First pass: read the envelope to learn the kind and check the header.
fn parse_envelope(contents: &str) -> Result<(RuleKind, serde_yaml::Value)> {
    let envelope: RuleEnvelope = serde_yaml::from_str(contents)?;
    let kind = envelope.check().map_err(RuleError::Validation)?;
    let value: serde_yaml::Value = serde_yaml::from_str(contents)?;
    Ok((kind, value))
}

fn skipped(path: PathBuf, reason: &str) -> LoadResult {
    LoadResult {
        path,
        status: LoadStatus::Skipped {
            reason: reason.to_string(),
        },
    }
}
