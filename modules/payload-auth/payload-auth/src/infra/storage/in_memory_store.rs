//! In-memory document store.
//!
//! Evaluates the same filter shapes a Payload deployment does, which makes it
//! usable as a test double and for embedded setups without a database.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use payload_auth_sdk::{
    Condition, DocId, Document, DocumentStore, FindQuery, FindResult, IdType, Selector,
    StoreError, StoreOperator, StoreResult, StoreWhere,
};
use regex::RegexBuilder;
use serde_json::Value;
use tracing::debug;

use crate::domain::schema::CollectionConfig;

#[derive(Default)]
struct State {
    collections: HashMap<String, Vec<Document>>,
    next_id: i64,
}

/// Document store kept entirely in process memory.
///
/// Collections spring into existence on first write. Relationship fields are
/// taken from the collection definitions passed to [`Self::new`]; only those
/// fields are populated when a read asks for `depth > 0`.
pub struct InMemoryDocumentStore {
    id_type: IdType,
    /// slug → field → target slug
    relations: HashMap<String, HashMap<String, String>>,
    timestamped: HashSet<String>,
    state: Mutex<State>,
}

impl InMemoryDocumentStore {
    #[must_use]
    pub fn new(id_type: IdType, collections: &[CollectionConfig]) -> Self {
        let relations = collections
            .iter()
            .map(|c| {
                let fields = c
                    .fields
                    .iter()
                    .filter_map(|f| {
                        f.relation_target()
                            .map(|target| (f.name.clone(), target.to_owned()))
                    })
                    .collect();
                (c.slug.clone(), fields)
            })
            .collect();
        let timestamped = collections
            .iter()
            .filter(|c| c.timestamps)
            .map(|c| c.slug.clone())
            .collect();

        Self {
            id_type,
            relations,
            timestamped,
            state: Mutex::new(State {
                collections: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Number of documents currently held in `collection`.
    #[must_use]
    pub fn len(&self, collection: &str) -> usize {
        self.state
            .lock()
            .collections
            .get(collection)
            .map_or(0, Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn next_id(&self, state: &mut State) -> Value {
        match self.id_type {
            IdType::Number => {
                let id = state.next_id;
                state.next_id += 1;
                Value::from(id)
            }
            IdType::Text => Value::String(uuid::Uuid::new_v4().to_string()),
        }
    }

    fn stamp(&self, collection: &str, doc: &mut Document, created: bool) {
        if !self.timestamped.contains(collection) {
            return;
        }
        let now = Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
        if created {
            doc.entry("createdAt").or_insert_with(|| now.clone());
        }
        doc.insert("updatedAt".to_owned(), now);
    }

    /// Replaces relationship IDs with the referenced documents, `depth` levels deep.
    fn populate(&self, state: &State, collection: &str, doc: &Document, depth: u32) -> Document {
        let mut out = doc.clone();
        if depth == 0 {
            return out;
        }
        let Some(fields) = self.relations.get(collection) else {
            return out;
        };
        for (field, target) in fields {
            let Some(value) = out.get_mut(field) else {
                continue;
            };
            *value = match value.take() {
                Value::Array(items) => Value::Array(
                    items
                        .into_iter()
                        .map(|item| self.populate_one(state, target, item, depth))
                        .collect(),
                ),
                other => self.populate_one(state, target, other, depth),
            };
        }
        out
    }

    fn populate_one(&self, state: &State, target: &str, value: Value, depth: u32) -> Value {
        let Some(id) = DocId::from_json(&value) else {
            return value;
        };
        find_doc(state, target, &id).map_or(value, |doc| {
            Value::Object(self.populate(state, target, doc, depth - 1))
        })
    }
}

fn find_doc<'a>(state: &'a State, collection: &str, id: &DocId) -> Option<&'a Document> {
    state
        .collections
        .get(collection)?
        .iter()
        .find(|doc| doc.get("id").is_some_and(|v| id.matches(v)))
}

fn merge(doc: &mut Document, data: &Document) {
    for (key, value) in data {
        if key != "id" {
            doc.insert(key.clone(), value.clone());
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find(&self, collection: &str, query: FindQuery) -> StoreResult<FindResult> {
        let state = self.state.lock();
        let mut docs: Vec<&Document> = state
            .collections
            .get(collection)
            .map_or_else(Vec::new, |docs| {
                docs.iter().filter(|d| matches(d, &query.filter)).collect()
            });

        if let Some(sort) = &query.sort {
            let (field, descending) = match sort.strip_prefix('-') {
                Some(field) => (field, true),
                None => (sort.as_str(), false),
            };
            docs.sort_by(|a, b| {
                let ord = compare(
                    a.get(field).unwrap_or(&Value::Null),
                    b.get(field).unwrap_or(&Value::Null),
                )
                .unwrap_or(Ordering::Equal);
                if descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }

        let total_docs = u64::try_from(docs.len()).unwrap_or(u64::MAX);
        let window: Box<dyn Iterator<Item = &Document>> = match query.limit {
            Some(limit) => {
                let limit = usize::try_from(limit).unwrap_or(usize::MAX);
                let page = usize::try_from(query.page.unwrap_or(1).max(1)).unwrap_or(1);
                Box::new(
                    docs.into_iter()
                        .skip((page - 1).saturating_mul(limit))
                        .take(limit),
                )
            }
            None => Box::new(docs.into_iter()),
        };

        Ok(FindResult {
            docs: window
                .map(|doc| self.populate(&state, collection, doc, query.depth))
                .collect(),
            total_docs,
        })
    }

    async fn find_by_id(&self, collection: &str, id: &DocId, depth: u32) -> StoreResult<Document> {
        let state = self.state.lock();
        find_doc(&state, collection, id)
            .map(|doc| self.populate(&state, collection, doc, depth))
            .ok_or_else(|| StoreError::not_found(collection, id))
    }

    async fn create(&self, collection: &str, data: Document, depth: u32) -> StoreResult<Document> {
        let mut state = self.state.lock();
        let mut doc = data;
        if doc.get("id").is_none_or(Value::is_null) {
            let id = self.next_id(&mut state);
            doc.insert("id".to_owned(), id);
        } else if let Some(id) = doc.get("id").and_then(DocId::from_json) {
            if find_doc(&state, collection, &id).is_some() {
                return Err(StoreError::validation(
                    collection,
                    format!("document with id '{id}' already exists"),
                ));
            }
        }
        self.stamp(collection, &mut doc, true);
        debug!(collection, id = ?doc.get("id"), "document created");

        state
            .collections
            .entry(collection.to_owned())
            .or_default()
            .push(doc.clone());
        Ok(self.populate(&state, collection, &doc, depth))
    }

    async fn update(
        &self,
        collection: &str,
        selector: Selector,
        data: Document,
        depth: u32,
    ) -> StoreResult<Vec<Document>> {
        let mut state = self.state.lock();
        let mut touched = Vec::new();
        if let Some(docs) = state.collections.get_mut(collection) {
            for doc in docs {
                let hit = match &selector {
                    Selector::Id(id) => doc.get("id").is_some_and(|v| id.matches(v)),
                    Selector::Where(filter) => matches(doc, filter),
                };
                if hit {
                    merge(doc, &data);
                    self.stamp(collection, doc, false);
                    touched.push(doc.clone());
                }
            }
        }

        if touched.is_empty()
            && let Selector::Id(id) = &selector
        {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(touched
            .iter()
            .map(|doc| self.populate(&state, collection, doc, depth))
            .collect())
    }

    async fn delete(&self, collection: &str, selector: Selector) -> StoreResult<Vec<Document>> {
        let mut state = self.state.lock();
        let mut removed = Vec::new();
        if let Some(docs) = state.collections.get_mut(collection) {
            let (gone, kept): (Vec<Document>, Vec<Document>) =
                docs.drain(..).partition(|doc| match &selector {
                    Selector::Id(id) => doc.get("id").is_some_and(|v| id.matches(v)),
                    Selector::Where(filter) => matches(doc, filter),
                });
            *docs = kept;
            removed = gone;
        }

        if removed.is_empty()
            && let Selector::Id(id) = &selector
        {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(removed)
    }

    async fn count(&self, collection: &str, filter: StoreWhere) -> StoreResult<u64> {
        let state = self.state.lock();
        let n = state
            .collections
            .get(collection)
            .map_or(0, |docs| docs.iter().filter(|d| matches(d, &filter)).count());
        Ok(u64::try_from(n).unwrap_or(u64::MAX))
    }
}

fn matches(doc: &Document, filter: &StoreWhere) -> bool {
    match filter {
        StoreWhere::All => true,
        StoreWhere::Field { field, condition } => {
            evaluate(doc.get(field).unwrap_or(&Value::Null), condition)
        }
        StoreWhere::Groups { and, or } => {
            and.iter().all(|f| matches(doc, f)) && (or.is_empty() || or.iter().any(|f| matches(doc, f)))
        }
    }
}

fn evaluate(stored: &Value, condition: &Condition) -> bool {
    let expected = &condition.value;
    match condition.op {
        StoreOperator::Equals => loose_eq(stored, expected),
        StoreOperator::NotEquals => !loose_eq(stored, expected),
        StoreOperator::GreaterThan => compare(stored, expected) == Some(Ordering::Greater),
        StoreOperator::GreaterThanEqual => {
            matches!(compare(stored, expected), Some(Ordering::Greater | Ordering::Equal))
        }
        StoreOperator::LessThan => compare(stored, expected) == Some(Ordering::Less),
        StoreOperator::LessThanEqual => {
            matches!(compare(stored, expected), Some(Ordering::Less | Ordering::Equal))
        }
        StoreOperator::In => match expected {
            Value::Array(options) => options.iter().any(|o| loose_eq(stored, o)),
            single => loose_eq(stored, single),
        },
        StoreOperator::Contains => match (stored, expected) {
            (Value::String(s), Value::String(needle)) => {
                s.to_lowercase().contains(&needle.to_lowercase())
            }
            (Value::Array(items), needle) => items.iter().any(|i| loose_eq(i, needle)),
            _ => false,
        },
        StoreOperator::Like => match (stored, expected) {
            (Value::String(s), Value::String(pattern)) => like(s, pattern),
            _ => false,
        },
    }
}

/// `3` equals `"3"`; everything else compares structurally.
fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => compare(a, b) == Some(Ordering::Equal),
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            n.to_string() == *s
        }
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::String(y)) => x.as_f64()?.partial_cmp(&y.parse::<f64>().ok()?),
        (Value::String(x), Value::Number(y)) => x.parse::<f64>().ok()?.partial_cmp(&y.as_f64()?),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Null, _) => Some(Ordering::Less),
        (_, Value::Null) => Some(Ordering::Greater),
        _ => None,
    }
}

/// Case-insensitive SQL-style `like` where `%` matches any run of characters.
fn like(value: &str, pattern: &str) -> bool {
    let body = pattern
        .split('%')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    RegexBuilder::new(&format!("^{body}$"))
        .case_insensitive(true)
        .build()
        .is_ok_and(|re| re.is_match(value))
}
