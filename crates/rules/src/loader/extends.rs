//! `extends` inheritance: a child document is deep-merged over its parent.

use std::collections::{HashMap, HashSet};

use serde_yaml::Value;

use super::error::{Result, RuleError};

/// Parents deeper than this are treated as a configuration error.
const MAX_EXTENDS_DEPTH: usize = 5;

/// Merge `child` over `parent`: mappings merge key by key, anything else
/// (scalars, sequences) is replaced by the child's value.
pub fn deep_merge(parent: &Value, child: &Value) -> Value {
    let (Value::Mapping(base), Value::Mapping(overlay)) = (parent, child) else {
        return child.clone();
    };
    let mut merged = base.clone();
    for (key, value) in overlay {
        let next = match base.get(key) {
            Some(inherited) => deep_merge(inherited, value),
            None => value.clone(),
        };
        merged.insert(key.clone(), next);
    }
    Value::Mapping(merged)
}

/// Resolve every document's `metadata.extends` chain. Returns the merged
/// documents keyed by the same ids.
pub fn resolve_extends(raw: &HashMap<String, Value>) -> Result<HashMap<String, Value>> {
    let mut resolver = Resolver {
        raw,
        done: HashMap::with_capacity(raw.len()),
        visiting: HashSet::new(),
    };
    for id in raw.keys() {
        resolver.resolve(id, 0)?;
    }
    Ok(resolver.done)
}

struct Resolver<'a> {
    raw: &'a HashMap<String, Value>,
    done: HashMap<String, Value>,
    visiting: HashSet<String>,
}

impl Resolver<'_> {
    fn resolve(&mut self, id: &str, depth: usize) -> Result<Value> {
        if let Some(value) = self.done.get(id) {
            return Ok(value.clone());
        }
        if depth > MAX_EXTENDS_DEPTH {
            return Err(RuleError::Validation(format!(
                "extends chain of '{}' is deeper than {}",
                id, MAX_EXTENDS_DEPTH
            )));
        }
        if !self.visiting.insert(id.to_string()) {
            return Err(RuleError::Validation(format!(
                "circular extends chain through '{}'",
                id
            )));
        }

        let own = self.raw.get(id).ok_or_else(|| {
            RuleError::Validation(format!("extends target '{}' does not exist", id))
        })?;
        let merged = match parent_of(own) {
            Some(parent) => {
                let inherited = self.resolve(&parent, depth + 1)?;
                deep_merge(&inherited, own)
            }
            None => own.clone(),
        };

        self.visiting.remove(id);
        self.done.insert(id.to_string(), merged.clone());
        Ok(merged)
    }
}

fn parent_of(doc: &Value) -> Option<String> {
    doc.get("metadata")?
        .get("extends")?
        .as_str()
        .map(str::to_string)
}
