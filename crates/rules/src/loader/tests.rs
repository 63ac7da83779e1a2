//! Tests for the config loader module.

use std::collections::HashMap;
use std::fs;

use tempfile::TempDir;

use super::*;
use crate::schema::RuleDocument;

const BASE_EXPLAINER: &str = r#"
apiVersion: v1
kind: ExplainerConfig
metadata:
  id: explainer-base
  name: Base explainer
spec:
  max_counterfactuals: 4
  decision_threshold: 0.5
"#;

const CHILD_EXPLAINER: &str = r#"
apiVersion: v1
kind: ExplainerConfig
metadata:
  id: explainer-child
  name: Child explainer
  extends: explainer-base
spec:
  max_counterfactuals: 2
"#;

const IMPORTANCE: &str = r#"
apiVersion: v1
kind: ImportanceConfig
metadata:
  id: importance-default
  name: Importance
spec:
  max_display_features: 7
"#;

fn temp_dir_with(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("create tempdir");
    for (name, contents) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }
    dir
}

#[test]
fn missing_directory_yields_defaults() {
    let loader = ConfigLoader::new("/nonexistent/factorlens/rules");
    let (set, results) = loader.load().unwrap();
    assert!(results.is_empty());
    assert_eq!(set, ConfigSet::default());
}

#[test]
fn loads_one_document_per_kind() {
    let dir = temp_dir_with(&[("explainer.yml", BASE_EXPLAINER), ("importance.yaml", IMPORTANCE)]);
    let (set, _) = ConfigLoader::new(dir.path()).load().unwrap();
    assert_eq!(set.explainer.max_counterfactuals, 4);
    assert_eq!(set.importance.max_display_features, 7);
    assert_eq!(set.explainer_source.as_deref(), Some("explainer-base"));
    assert_eq!(set.importance_source.as_deref(), Some("importance-default"));
}

#[test]
fn load_dir_returns_the_active_set() {
    let dir = temp_dir_with(&[("importance.yml", IMPORTANCE), ("broken.yml", "kind: [")]);
    let set = ConfigSet::load_dir(dir.path()).unwrap();
    assert_eq!(set.importance.max_display_features, 7);
    assert_eq!(set.explainer_source, None);
}

#[test]
fn first_enabled_document_by_id_wins() {
    let dir = temp_dir_with(&[("a.yml", CHILD_EXPLAINER), ("b.yml", BASE_EXPLAINER)]);
    let (set, _) = ConfigLoader::new(dir.path()).load().unwrap();
    // "explainer-base" sorts before "explainer-child".
    assert_eq!(set.explainer_source.as_deref(), Some("explainer-base"));
}

#[test]
fn child_inherits_parent_fields() {
    let disabled_base = BASE_EXPLAINER.replace("  name: Base explainer", "  name: Base explainer\n  enabled: false");
    let child = CHILD_EXPLAINER.replace("  extends: explainer-base", "  extends: explainer-base\n  enabled: true");
    let dir = temp_dir_with(&[("base.yml", disabled_base.as_str()), ("child.yml", child.as_str())]);
    let (set, _) = ConfigLoader::new(dir.path()).load().unwrap();
    assert_eq!(set.explainer_source.as_deref(), Some("explainer-child"));
    assert_eq!(set.explainer.max_counterfactuals, 2);
    assert_eq!(set.explainer.decision_threshold, 0.5);
}

#[test]
fn skips_dotfiles_and_non_yaml_and_reports_broken_files() {
    let dir = temp_dir_with(&[
        (".hidden.yml", BASE_EXPLAINER),
        ("notes.txt", "hello"),
        ("broken.yml", "apiVersion: [unclosed"),
        ("nested/importance.yml", IMPORTANCE),
    ]);
    let (set, results) = ConfigLoader::new(dir.path()).load().unwrap();
    assert_eq!(set.importance.max_display_features, 7);

    let skipped = results
        .iter()
        .filter(|r| matches!(r.status, LoadStatus::Skipped { .. }))
        .count();
    let failed = results
        .iter()
        .filter(|r| matches!(r.status, LoadStatus::Failed { .. }))
        .count();
    assert_eq!(skipped, 2);
    assert_eq!(failed, 1);
}

#[test]
fn invalid_selected_document_is_an_error() {
    let bad = BASE_EXPLAINER.replace("decision_threshold: 0.5", "similarity_threshold: 2.0");
    let dir = temp_dir_with(&[("bad.yml", bad.as_str())]);
    let err = ConfigLoader::new(dir.path()).load().unwrap_err();
    assert!(matches!(err, RuleError::Validation(_)));
}

#[test]
fn duplicate_ids_are_rejected() {
    let dir = temp_dir_with(&[("one.yml", BASE_EXPLAINER), ("two.yml", BASE_EXPLAINER)]);
    assert!(ConfigLoader::new(dir.path()).load().is_err());
}

#[test]
fn load_file_returns_typed_document() {
    let dir = temp_dir_with(&[("importance.yml", IMPORTANCE)]);
    let loader = ConfigLoader::new(dir.path());
    let doc = loader.load_file(&dir.path().join("importance.yml")).unwrap();
    assert!(matches!(doc, RuleDocument::Importance(_)));
    assert_eq!(doc.metadata().id, "importance-default");
}

// ── extends ─────────────────────────────────────────────────────────

fn yaml(s: &str) -> serde_yaml::Value {
    serde_yaml::from_str(s).unwrap()
}

#[test]
fn deep_merge_child_wins_and_maps_merge() {
    let parent = yaml("a: 1\nnested:\n  x: 1\n  y: 2\nlist: [1, 2]\n");
    let child = yaml("a: 9\nnested:\n  y: 5\nlist: [3]\n");
    let merged = deep_merge(&parent, &child);
    assert_eq!(merged, yaml("a: 9\nnested:\n  x: 1\n  y: 5\nlist: [3]\n"));
}

#[test]
fn circular_extends_is_rejected() {
    let mut raw = HashMap::new();
    raw.insert("a".to_string(), yaml("metadata:\n  extends: b\n"));
    raw.insert("b".to_string(), yaml("metadata:\n  extends: a\n"));
    assert!(resolve_extends(&raw).is_err());
}

#[test]
fn missing_parent_is_rejected() {
    let mut raw = HashMap::new();
    raw.insert("a".to_string(), yaml("metadata:\n  extends: ghost\n"));
    let err = resolve_extends(&raw).unwrap_err();
    assert!(err.to_string().contains("ghost"));
}
