#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

//! Common test utilities for payload-auth integration tests

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use payload_auth::config::PayloadAuthConfig;
use payload_auth::domain::naming::FieldNaming;
use payload_auth::domain::schema::{AuthSchema, generate_collections};
use payload_auth::infra::InMemoryDocumentStore;
use payload_auth::PayloadAdapter;
use payload_auth_sdk::{
    DocId, Document, DocumentStore, FieldValue, FindQuery, FindResult, IdType, Record, Selector,
    StoreError, StoreResolver, StoreResult, StoreWhere,
};

/// A store call as seen by the document store.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Find { collection: String, query: FindQuery },
    FindById { collection: String, id: DocId },
    Create { collection: String, data: Document },
    Update { collection: String, selector: Selector },
    Delete { collection: String, selector: Selector },
    Count { collection: String, filter: StoreWhere },
}

/// Wraps the in-memory store and records every call.
pub struct RecordingStore {
    inner: InMemoryDocumentStore,
    calls: Mutex<Vec<Call>>,
}

impl RecordingStore {
    pub fn new(id_type: IdType) -> Self {
        let collections = generate_collections(&AuthSchema::core(), &FieldNaming::default()).unwrap();
        Self {
            inner: InMemoryDocumentStore::new(id_type, &collections),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn last_call(&self) -> Call {
        self.calls.lock().last().cloned().expect("no store calls recorded")
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn find(&self, collection: &str, query: FindQuery) -> StoreResult<FindResult> {
        self.record(Call::Find {
            collection: collection.to_owned(),
            query: query.clone(),
        });
        self.inner.find(collection, query).await
    }

    async fn find_by_id(&self, collection: &str, id: &DocId, depth: u32) -> StoreResult<Document> {
        self.record(Call::FindById {
            collection: collection.to_owned(),
            id: id.clone(),
        });
        self.inner.find_by_id(collection, id, depth).await
    }

    async fn create(&self, collection: &str, data: Document, depth: u32) -> StoreResult<Document> {
        self.record(Call::Create {
            collection: collection.to_owned(),
            data: data.clone(),
        });
        self.inner.create(collection, data, depth).await
    }

    async fn update(
        &self,
        collection: &str,
        selector: Selector,
        data: Document,
        depth: u32,
    ) -> StoreResult<Vec<Document>> {
        self.record(Call::Update {
            collection: collection.to_owned(),
            selector: selector.clone(),
        });
        self.inner.update(collection, selector, data, depth).await
    }

    async fn delete(&self, collection: &str, selector: Selector) -> StoreResult<Vec<Document>> {
        self.record(Call::Delete {
            collection: collection.to_owned(),
            selector: selector.clone(),
        });
        self.inner.delete(collection, selector).await
    }

    async fn count(&self, collection: &str, filter: StoreWhere) -> StoreResult<u64> {
        self.record(Call::Count {
            collection: collection.to_owned(),
            filter: filter.clone(),
        });
        self.inner.count(collection, filter).await
    }
}

/// Store whose every operation fails.
pub struct FailingStore;

#[async_trait]
impl DocumentStore for FailingStore {
    async fn find(&self, _: &str, _: FindQuery) -> StoreResult<FindResult> {
        Err(StoreError::Unavailable("database offline".to_owned()))
    }

    async fn find_by_id(&self, _: &str, _: &DocId, _: u32) -> StoreResult<Document> {
        Err(StoreError::Unavailable("database offline".to_owned()))
    }

    async fn create(&self, collection: &str, _: Document, _: u32) -> StoreResult<Document> {
        Err(StoreError::validation(collection, "email must be unique"))
    }

    async fn update(&self, _: &str, _: Selector, _: Document, _: u32) -> StoreResult<Vec<Document>> {
        Err(StoreError::Other(anyhow::anyhow!("write conflict")))
    }

    async fn delete(&self, _: &str, _: Selector) -> StoreResult<Vec<Document>> {
        Err(StoreError::Unavailable("database offline".to_owned()))
    }

    async fn count(&self, _: &str, _: StoreWhere) -> StoreResult<u64> {
        Err(StoreError::Unavailable("database offline".to_owned()))
    }
}

/// Deferred source that counts how often the adapter asks for the store.
pub struct CountingResolver {
    pub store: Arc<dyn DocumentStore>,
    pub resolved: AtomicUsize,
}

impl CountingResolver {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            resolved: AtomicUsize::new(0),
        }
    }

    pub fn count(&self) -> usize {
        self.resolved.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoreResolver for CountingResolver {
    async fn resolve(&self) -> StoreResult<Arc<dyn DocumentStore>> {
        self.resolved.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&self.store))
    }
}

pub fn config(id_type: IdType) -> PayloadAuthConfig {
    PayloadAuthConfig::default().with_id_type(id_type)
}

pub fn create_adapter(id_type: IdType) -> (PayloadAdapter, Arc<RecordingStore>) {
    let store = Arc::new(RecordingStore::new(id_type));
    let adapter = PayloadAdapter::with_store(store.clone(), config(id_type));
    (adapter, store)
}

pub fn record(pairs: &[(&str, FieldValue)]) -> Record {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.clone()))
        .collect()
}

pub fn id_of(record: &Record) -> String {
    record.get("id").and_then(FieldValue::as_str).unwrap().to_owned()
}
