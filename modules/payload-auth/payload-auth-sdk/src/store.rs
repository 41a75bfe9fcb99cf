//! Document store contract consumed by the adapter.
//!
//! The shapes here follow Payload's local API: collections of JSON documents,
//! `where` filters made of `{ field: { operator: value } }` maps combined under
//! `and` / `or`, page-based pagination and relationship population by depth.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Serialize, Serializer};

use crate::error::StoreResult;

/// A raw document as stored in (and returned by) the document store.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Primary key of a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocId {
    Number(i64),
    Text(String),
}

impl DocId {
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Number(n) => serde_json::Value::from(*n),
            Self::Text(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// Reads an ID out of a stored `id` value. Returns `None` for values that
    /// cannot be a primary key.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_i64().map(Self::Number),
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    /// Loose comparison against a stored value: `3` and `"3"` are the same key.
    #[must_use]
    pub fn matches(&self, value: &serde_json::Value) -> bool {
        match (self, value) {
            (Self::Number(n), serde_json::Value::Number(m)) => m.as_i64() == Some(*n),
            (_, serde_json::Value::String(s)) => self.to_string() == *s,
            (Self::Text(s), serde_json::Value::Number(m)) => m.to_string() == *s,
            _ => false,
        }
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Filter operators of the document store's query language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperator {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
    In,
    Contains,
    Like,
}

impl StoreOperator {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::GreaterThan => "greater_than",
            Self::GreaterThanEqual => "greater_than_equal",
            Self::LessThan => "less_than",
            Self::LessThanEqual => "less_than_equal",
            Self::In => "in",
            Self::Contains => "contains",
            Self::Like => "like",
        }
    }
}

impl fmt::Display for StoreOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{ operator: value }` part of a field filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub op: StoreOperator,
    pub value: serde_json::Value,
}

impl Condition {
    #[must_use]
    pub fn new(op: StoreOperator, value: impl Into<serde_json::Value>) -> Self {
        Self {
            op,
            value: value.into(),
        }
    }
}

/// A translated filter, ready for the document store.
///
/// Serializes to the store's JSON filter shape:
/// - `All` → `{}`
/// - `Field` → `{ "<field>": { "<op>": <value> } }`
/// - `Groups` → `{ "and": [...], "or": [...] }` with empty groups omitted
#[derive(Debug, Clone, PartialEq, Default)]
pub enum StoreWhere {
    #[default]
    All,
    Field {
        field: String,
        condition: Condition,
    },
    Groups {
        and: Vec<StoreWhere>,
        or: Vec<StoreWhere>,
    },
}

impl StoreWhere {
    #[must_use]
    pub fn field(field: impl Into<String>, condition: Condition) -> Self {
        Self::Field {
            field: field.into(),
            condition,
        }
    }

    #[must_use]
    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let mut out = serde_json::Map::new();
        match self {
            Self::All => {}
            Self::Field { field, condition } => {
                let mut cond = serde_json::Map::new();
                cond.insert(condition.op.as_str().to_owned(), condition.value.clone());
                out.insert(field.clone(), serde_json::Value::Object(cond));
            }
            Self::Groups { and, or } => {
                if !and.is_empty() {
                    out.insert(
                        "and".to_owned(),
                        serde_json::Value::Array(and.iter().map(Self::to_json).collect()),
                    );
                }
                if !or.is_empty() {
                    out.insert(
                        "or".to_owned(),
                        serde_json::Value::Array(or.iter().map(Self::to_json).collect()),
                    );
                }
            }
        }
        serde_json::Value::Object(out)
    }
}

impl Serialize for StoreWhere {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Parameters of a filtered `find`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FindQuery {
    pub filter: StoreWhere,
    /// `None` returns every matching document.
    pub limit: Option<u32>,
    /// 1-based page number; only meaningful together with `limit`.
    pub page: Option<u32>,
    /// Field name, prefixed with `-` for descending order.
    pub sort: Option<String>,
    /// Relationship population depth.
    pub depth: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FindResult {
    pub docs: Vec<Document>,
    pub total_docs: u64,
}

/// Target of an update or delete: a single document or every match of a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    Id(DocId),
    Where(StoreWhere),
}

/// The document store operations the adapter relies on.
///
/// Point operations (`find_by_id`, and `update` / `delete` with
/// [`Selector::Id`]) must fail with [`crate::StoreError::NotFound`] when the
/// document does not exist. Filtered operations return an empty result instead.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(&self, collection: &str, query: FindQuery) -> StoreResult<FindResult>;

    async fn find_by_id(&self, collection: &str, id: &DocId, depth: u32) -> StoreResult<Document>;

    async fn create(&self, collection: &str, data: Document, depth: u32) -> StoreResult<Document>;

    async fn update(
        &self,
        collection: &str,
        selector: Selector,
        data: Document,
        depth: u32,
    ) -> StoreResult<Vec<Document>>;

    async fn delete(&self, collection: &str, selector: Selector) -> StoreResult<Vec<Document>>;

    async fn count(&self, collection: &str, filter: StoreWhere) -> StoreResult<u64>;
}

/// Deferred source of a store handle, e.g. a host that boots its Payload
/// instance lazily. Memoization, if any, is the resolver's business.
#[async_trait]
pub trait StoreResolver: Send + Sync {
    async fn resolve(&self) -> StoreResult<Arc<dyn DocumentStore>>;
}

/// How the adapter obtains its store handle.
#[derive(Clone)]
pub enum StoreSource {
    Ready(Arc<dyn DocumentStore>),
    Deferred(Arc<dyn StoreResolver>),
}

impl StoreSource {
    /// Returns the live store handle. Deferred sources are resolved on every call.
    ///
    /// # Errors
    ///
    /// Propagates the resolver's error.
    pub async fn resolve(&self) -> StoreResult<Arc<dyn DocumentStore>> {
        match self {
            Self::Ready(store) => Ok(Arc::clone(store)),
            Self::Deferred(resolver) => resolver.resolve().await,
        }
    }
}

impl fmt::Debug for StoreSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(_) => f.write_str("StoreSource::Ready"),
            Self::Deferred(_) => f.write_str("StoreSource::Deferred"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_store_where_shapes() {
        assert_eq!(StoreWhere::All.to_json(), json!({}));

        let flat = StoreWhere::field("email", Condition::new(StoreOperator::Equals, "a@b.c"));
        assert_eq!(flat.to_json(), json!({ "email": { "equals": "a@b.c" } }));

        let groups = StoreWhere::Groups {
            and: vec![flat.clone()],
            or: vec![],
        };
        assert_eq!(
            groups.to_json(),
            json!({ "and": [{ "email": { "equals": "a@b.c" } }] })
        );
        assert_eq!(serde_json::to_value(&groups).unwrap(), groups.to_json());
    }

    #[test]
    fn test_doc_id_matches_loosely() {
        assert!(DocId::Number(3).matches(&json!(3)));
        assert!(DocId::Number(3).matches(&json!("3")));
        assert!(DocId::Text("3".to_owned()).matches(&json!(3)));
        assert!(!DocId::Text("abc".to_owned()).matches(&json!(null)));
    }

    #[test]
    fn test_doc_id_from_json() {
        assert_eq!(DocId::from_json(&json!(7)), Some(DocId::Number(7)));
        assert_eq!(
            DocId::from_json(&json!("7")),
            Some(DocId::Text("7".to_owned()))
        );
        assert_eq!(DocId::from_json(&json!({ "id": 7 })), None);
    }
}
