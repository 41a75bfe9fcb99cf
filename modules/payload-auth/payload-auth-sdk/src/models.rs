//! Public models for the `payload-auth` adapter.
//!
//! These mirror the shapes the auth framework hands to a database adapter:
//! records of loosely typed values, ordered where-clauses and per-operation
//! argument bundles.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::DocId;

/// A record as seen by the auth framework: field name to value.
pub type Record = BTreeMap<String, FieldValue>;

/// Requested relation expansions, keyed by relation (model) name.
pub type Join = BTreeMap<String, JoinOptions>;

/// A single value inside a [`Record`] or a [`WhereClause`].
///
/// Dates are a distinct variant: the adapter produces them when reading
/// ISO-8601 strings back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    DateTime(DateTime<Utc>),
    List(Vec<FieldValue>),
    Map(Record),
}

impl FieldValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Converts into the JSON representation handed to the store.
    ///
    /// Dates are rendered as RFC 3339 strings.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as J;

        match self {
            Self::Null => J::Null,
            Self::Bool(b) => J::Bool(*b),
            Self::Number(n) => J::Number(n.clone()),
            Self::String(s) => J::String(s.clone()),
            Self::DateTime(dt) => J::String(dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
            Self::List(items) => J::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(map) => J::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Structural conversion from JSON. Strings stay strings; date coercion
    /// is the adapter's job, not this conversion's.
    #[must_use]
    pub fn from_json(value: serde_json::Value) -> Self {
        use serde_json::Value as J;

        match value {
            J::Null => Self::Null,
            J::Bool(b) => Self::Bool(b),
            J::Number(n) => Self::Number(n),
            J::String(s) => Self::String(s),
            J::Array(items) => Self::List(items.into_iter().map(Self::from_json).collect()),
            J::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(value: Vec<FieldValue>) -> Self {
        Self::List(value)
    }
}

/// Primary key representation used by the underlying document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdType {
    /// Auto-incrementing numeric IDs (e.g. Postgres serial).
    Number,
    /// Textual IDs (e.g. `MongoDB` object ids, UUIDs).
    #[default]
    Text,
}

impl IdType {
    /// Converts an ID received from the auth framework into the store's form.
    ///
    /// In numeric mode a string that does not parse as an integer is kept as
    /// text rather than rejected.
    #[must_use]
    pub fn coerce(self, raw: &str) -> DocId {
        match self {
            Self::Number => raw
                .trim()
                .parse::<i64>()
                .map_or_else(|_| DocId::Text(raw.to_owned()), DocId::Number),
            Self::Text => DocId::Text(raw.to_owned()),
        }
    }
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number => write!(f, "number"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// Comparison operators understood by the auth framework.
///
/// Unknown operator names deserialize to [`Operator::Eq`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum Operator {
    #[default]
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Contains,
    StartsWith,
    EndsWith,
}

impl Operator {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "ne" => Self::Ne,
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "in" => Self::In,
            "contains" => Self::Contains,
            "starts_with" => Self::StartsWith,
            "ends_with" => Self::EndsWith,
            _ => Self::Eq,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::In => "in",
            Self::Contains => "contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
        }
    }
}

impl From<String> for Operator {
    fn from(value: String) -> Self {
        Self::from_name(&value)
    }
}

impl From<Operator> for &'static str {
    fn from(value: Operator) -> Self {
        value.as_str()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a clause joins the rest of the predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Connector {
    #[default]
    #[serde(alias = "and")]
    And,
    #[serde(alias = "or")]
    Or,
}

/// One clause of an auth-framework predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereClause {
    pub field: String,
    #[serde(default)]
    pub operator: Operator,
    pub value: FieldValue,
    #[serde(default)]
    pub connector: Connector,
}

impl WhereClause {
    #[must_use]
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<FieldValue>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
            connector: Connector::And,
        }
    }

    /// Equality clause, the most common shape.
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, Operator::Eq, value)
    }

    /// Marks this clause as part of the OR group.
    #[must_use]
    pub fn or(mut self) -> Self {
        self.connector = Connector::Or;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortBy {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortBy {
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Options for a single requested relation expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JoinOptions {
    /// Upper bound on rows attached for to-many relations.
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CreateArgs {
    pub model: String,
    pub data: Record,
}

impl CreateArgs {
    #[must_use]
    pub fn new(model: impl Into<String>, data: Record) -> Self {
        Self {
            model: model.into(),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindOneArgs {
    pub model: String,
    #[serde(default, rename = "where")]
    pub where_clause: Vec<WhereClause>,
    #[serde(default)]
    pub join: Option<Join>,
}

impl FindOneArgs {
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_where(mut self, where_clause: Vec<WhereClause>) -> Self {
        self.where_clause = where_clause;
        self
    }

    #[must_use]
    pub fn with_join(mut self, join: Join) -> Self {
        self.join = Some(join);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindManyArgs {
    pub model: String,
    #[serde(default, rename = "where")]
    pub where_clause: Vec<WhereClause>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
    #[serde(default)]
    pub sort_by: Option<SortBy>,
    #[serde(default)]
    pub join: Option<Join>,
}

impl FindManyArgs {
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_where(mut self, where_clause: Vec<WhereClause>) -> Self {
        self.where_clause = where_clause;
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn with_sort(mut self, sort_by: SortBy) -> Self {
        self.sort_by = Some(sort_by);
        self
    }

    #[must_use]
    pub fn with_join(mut self, join: Join) -> Self {
        self.join = Some(join);
        self
    }
}

/// Arguments for `update` and `update_many`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UpdateArgs {
    pub model: String,
    #[serde(default, rename = "where")]
    pub where_clause: Vec<WhereClause>,
    pub update: Record,
}

impl UpdateArgs {
    #[must_use]
    pub fn new(model: impl Into<String>, where_clause: Vec<WhereClause>, update: Record) -> Self {
        Self {
            model: model.into(),
            where_clause,
            update,
        }
    }
}

/// Arguments for `delete`, `delete_many` and `count`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterArgs {
    pub model: String,
    #[serde(default, rename = "where")]
    pub where_clause: Vec<WhereClause>,
}

impl FilterArgs {
    #[must_use]
    pub fn new(model: impl Into<String>, where_clause: Vec<WhereClause>) -> Self {
        Self {
            model: model.into(),
            where_clause,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operator_names_round_trip() {
        for op in [
            Operator::Eq,
            Operator::Ne,
            Operator::Gt,
            Operator::Gte,
            Operator::Lt,
            Operator::Lte,
            Operator::In,
            Operator::Contains,
            Operator::StartsWith,
            Operator::EndsWith,
        ] {
            assert_eq!(Operator::from_name(op.as_str()), op);
        }
    }

    #[test]
    fn test_unknown_operator_defaults_to_eq() {
        assert_eq!(Operator::from_name("between"), Operator::Eq);
        let clause: WhereClause =
            serde_json::from_value(json!({ "field": "email", "operator": "regex", "value": "x" }))
                .unwrap();
        assert_eq!(clause.operator, Operator::Eq);
    }

    #[test]
    fn test_where_clause_defaults() {
        let clause: WhereClause =
            serde_json::from_value(json!({ "field": "email", "value": "a@b.c" })).unwrap();
        assert_eq!(clause.operator, Operator::Eq);
        assert_eq!(clause.connector, Connector::And);

        let clause: WhereClause = serde_json::from_value(
            json!({ "field": "email", "value": "a@b.c", "connector": "OR" }),
        )
        .unwrap();
        assert_eq!(clause.connector, Connector::Or);
    }

    #[test]
    fn test_id_type_coerce() {
        assert_eq!(IdType::Number.coerce("42"), DocId::Number(42));
        assert_eq!(IdType::Number.coerce("abc"), DocId::Text("abc".to_owned()));
        assert_eq!(IdType::Text.coerce("42"), DocId::Text("42".to_owned()));
    }

    #[test]
    fn test_field_value_to_json() {
        let dt = DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            FieldValue::DateTime(dt).to_json(),
            json!("2024-01-15T10:30:00.000Z")
        );
        assert_eq!(
            FieldValue::List(vec![FieldValue::from(1), FieldValue::from("a")]).to_json(),
            json!([1, "a"])
        );
    }

    #[test]
    fn test_field_value_from_json_keeps_strings() {
        let v = FieldValue::from_json(json!("2024-01-15T10:30:00Z"));
        assert_eq!(v, FieldValue::String("2024-01-15T10:30:00Z".to_owned()));
    }

    #[test]
    fn test_find_many_args_deserialize() {
        let args: FindManyArgs = serde_json::from_value(json!({
            "model": "session",
            "where": [{ "field": "userId", "value": "1" }],
            "limit": 10,
            "offset": 20,
            "sortBy": { "field": "createdAt", "direction": "desc" }
        }))
        .unwrap();
        assert_eq!(args.where_clause.len(), 1);
        assert_eq!(args.sort_by, Some(SortBy::desc("createdAt")));
    }
}
