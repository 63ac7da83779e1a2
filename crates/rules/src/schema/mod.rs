//! Document model for `data/rules/*.yml`.
//!
//! Every file is an envelope (`apiVersion`, `kind`, `metadata`) plus a
//! kind-specific `spec`. The loader reads the envelope first, resolves
//! `extends`, then parses the merged value into a [`RuleDocument`].

mod document;
mod envelope;
mod kind;
mod metadata;

pub use document::*;
pub use envelope::*;
pub use kind::*;
pub use metadata::*;
