//! Filesystem loader for configuration documents.
//!
//! Scans the rules directory for YAML files, resolves `extends` chains and
//! compiles the active document of each kind into a [`ConfigSet`].

mod core;
mod error;
mod extends;

#[cfg(test)]
mod tests;

pub use self::core::{ConfigLoader, ConfigSet};
pub use self::error::{LoadResult, LoadStatus, Result, RuleError};
pub use self::extends::{deep_merge, resolve_extends};
