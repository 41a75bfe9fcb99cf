//! Model and field naming conventions.
//!
//! All knowledge about how auth-framework names map onto store names lives
//! here: the model → collection table and the `<relation>Id` suffix rule.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::PayloadAuthConfig;

const RELATION_SUFFIX: &str = "Id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNaming {
    collections: BTreeMap<String, String>,
    suffix_exceptions: BTreeSet<String>,
}

impl FieldNaming {
    #[must_use]
    pub fn new(collections: BTreeMap<String, String>, suffix_exceptions: BTreeSet<String>) -> Self {
        Self {
            collections,
            suffix_exceptions,
        }
    }

    #[must_use]
    pub fn from_config(cfg: &PayloadAuthConfig) -> Self {
        Self::new(
            cfg.collections.clone(),
            cfg.relation_suffix_exceptions.iter().cloned().collect(),
        )
    }

    /// Collection slug for a model; unknown models map to themselves.
    #[must_use]
    pub fn collection_for<'a>(&'a self, model: &'a str) -> &'a str {
        self.collections.get(model).map_or(model, String::as_str)
    }

    /// Whether `field` names a relationship foreign key (`userId`, `sessionId`, ...).
    #[must_use]
    pub fn is_relation_field(&self, field: &str) -> bool {
        field.len() > RELATION_SUFFIX.len()
            && field.ends_with(RELATION_SUFFIX)
            && !self.suffix_exceptions.contains(field)
    }

    /// Store-side name of a field: relationship keys lose their `Id` suffix.
    #[must_use]
    pub fn store_field<'a>(&self, field: &'a str) -> &'a str {
        if self.is_relation_field(field) {
            &field[..field.len() - RELATION_SUFFIX.len()]
        } else {
            field
        }
    }

    /// Auth-side key for a populated relationship attribute (`user` → `userId`).
    #[must_use]
    pub fn relation_key(attribute: &str) -> String {
        format!("{attribute}{RELATION_SUFFIX}")
    }
}

impl Default for FieldNaming {
    fn default() -> Self {
        Self::from_config(&PayloadAuthConfig::default())
    }
}
