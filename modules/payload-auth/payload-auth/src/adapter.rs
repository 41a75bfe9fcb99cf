//! The auth adapter: auth-framework operations on top of a document store.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use payload_auth_sdk::{
    AdapterError, AuthAdapterApi, CreateArgs, DocId, Document, DocumentStore, FilterArgs,
    FindManyArgs, FindOneArgs, FindQuery, Record, Selector, SortBy, SortDirection, StoreError,
    StoreSource, StoreWhere, UpdateArgs,
};
use tracing::{debug, instrument, warn};

use crate::config::PayloadAuthConfig;
use crate::domain::joins::JoinResolver;
use crate::domain::naming::FieldNaming;
use crate::domain::transform::{transform_input, transform_output};
use crate::domain::where_clause::{convert_where, extract_single_id};

/// Implements [`AuthAdapterApi`] by translating every call into document
/// store operations.
///
/// The adapter holds no per-call state. A deferred [`StoreSource`] is resolved
/// again on every operation.
#[derive(Clone)]
pub struct PayloadAdapter {
    source: StoreSource,
    naming: Arc<FieldNaming>,
    config: Arc<PayloadAuthConfig>,
}

impl fmt::Debug for PayloadAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadAdapter")
            .field("source", &self.source)
            .field("naming", &self.naming)
            .field("config", &self.config)
            .finish()
    }
}

impl PayloadAdapter {
    #[must_use]
    pub fn new(source: StoreSource, config: PayloadAuthConfig) -> Self {
        Self {
            source,
            naming: Arc::new(FieldNaming::from_config(&config)),
            config: Arc::new(config),
        }
    }

    #[must_use]
    pub fn with_store(store: Arc<dyn DocumentStore>, config: PayloadAuthConfig) -> Self {
        Self::new(StoreSource::Ready(store), config)
    }

    #[must_use]
    pub fn config(&self) -> &PayloadAuthConfig {
        &self.config
    }

    #[must_use]
    pub fn naming(&self) -> &FieldNaming {
        &self.naming
    }

    /// Runs `f` against this adapter.
    ///
    /// There is no atomicity: each operation inside `f` commits on its own and
    /// nothing is rolled back when `f` fails.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns.
    pub async fn transaction<T, E, F, Fut>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(Self) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        f(self.clone()).await
    }

    async fn store(&self) -> Result<Arc<dyn DocumentStore>, AdapterError> {
        self.source
            .resolve()
            .await
            .map_err(|e| self.store_failure("resolve", "-", e))
    }

    fn store_failure(&self, op: &'static str, collection: &str, e: StoreError) -> AdapterError {
        if self.config.enable_debug_logs {
            debug!(op, collection, error = %e, "store operation failed");
        }
        AdapterError::Store(e)
    }

    fn log_query(&self, op: &'static str, collection: &str, filter: &StoreWhere) {
        if self.config.enable_debug_logs {
            debug!(op, collection, filter = %filter.to_json(), "translated query");
        }
    }

    fn doc_id(&self, id: &str) -> DocId {
        self.config.id_type.coerce(id)
    }

    fn selector(&self, filter: StoreWhere) -> Selector {
        match extract_single_id(&filter) {
            Some(id) => Selector::Id(self.doc_id(&id)),
            None => Selector::Where(filter),
        }
    }

    fn sort_key(&self, sort_by: &SortBy) -> String {
        let field = self.naming.store_field(&sort_by.field);
        match sort_by.direction {
            SortDirection::Asc => field.to_owned(),
            SortDirection::Desc => format!("-{field}"),
        }
    }

    fn join_resolver<'a>(&'a self, store: &'a dyn DocumentStore) -> JoinResolver<'a> {
        JoinResolver {
            store,
            naming: &self.naming,
            id_type: self.config.id_type,
            depth: self.config.default_depth,
        }
    }
}

/// Store page for an offset; the store paginates by whole pages only.
fn page_for(limit: Option<u32>, offset: Option<u32>) -> Option<u32> {
    limit
        .filter(|l| *l > 0)
        .map(|l| offset.unwrap_or(0).div_euclid(l) + 1)
}

/// Whether `offset` cannot be expressed as a whole store page.
fn offset_misaligned(limit: Option<u32>, offset: Option<u32>) -> bool {
    match (limit.filter(|l| *l > 0), offset) {
        (Some(l), Some(o)) => o.rem_euclid(l) != 0,
        (None, Some(o)) => o > 0,
        (_, None) => false,
    }
}

fn affected(docs: &[Document]) -> u64 {
    u64::try_from(docs.len()).unwrap_or(u64::MAX)
}

#[async_trait]
impl AuthAdapterApi for PayloadAdapter {
    #[instrument(skip_all, fields(model = %args.model))]
    async fn create(&self, args: CreateArgs) -> Result<Record, AdapterError> {
        let store = self.store().await?;
        let collection = self.naming.collection_for(&args.model);
        let data = transform_input(&args.data, &self.naming, self.config.id_type);

        let doc = store
            .create(collection, data, self.config.default_depth)
            .await
            .map_err(|e| self.store_failure("create", collection, e))?;
        Ok(transform_output(doc))
    }

    #[instrument(skip_all, fields(model = %args.model))]
    async fn find_one(&self, args: FindOneArgs) -> Result<Option<Record>, AdapterError> {
        let store = self.store().await?;
        let collection = self.naming.collection_for(&args.model);
        let filter = convert_where(&args.where_clause, &self.naming);
        self.log_query("find_one", collection, &filter);
        let depth = self.config.default_depth;

        let doc = if let Some(id) = extract_single_id(&filter) {
            match store.find_by_id(collection, &self.doc_id(&id), depth).await {
                Ok(doc) => Some(doc),
                Err(e) if e.is_not_found() => None,
                Err(e) => return Err(self.store_failure("find_one", collection, e)),
            }
        } else {
            let query = FindQuery {
                filter,
                limit: Some(1),
                page: None,
                sort: None,
                depth,
            };
            store
                .find(collection, query)
                .await
                .map_err(|e| self.store_failure("find_one", collection, e))?
                .docs
                .into_iter()
                .next()
        };

        let Some(doc) = doc else {
            return Ok(None);
        };
        let mut record = transform_output(doc);
        if let Some(join) = &args.join {
            self.join_resolver(store.as_ref())
                .resolve(&args.model, &mut record, join)
                .await;
        }
        Ok(Some(record))
    }

    #[instrument(skip_all, fields(model = %args.model))]
    async fn find_many(&self, args: FindManyArgs) -> Result<Vec<Record>, AdapterError> {
        let store = self.store().await?;
        let collection = self.naming.collection_for(&args.model);
        let filter = convert_where(&args.where_clause, &self.naming);
        self.log_query("find_many", collection, &filter);

        if offset_misaligned(args.limit, args.offset) {
            warn!(
                collection,
                limit = ?args.limit,
                offset = ?args.offset,
                "offset is not a multiple of limit, rounding down to a page boundary"
            );
        }

        let query = FindQuery {
            filter,
            limit: args.limit.filter(|l| *l > 0),
            page: page_for(args.limit, args.offset),
            sort: args.sort_by.as_ref().map(|s| self.sort_key(s)),
            depth: self.config.default_depth,
        };
        let result = store
            .find(collection, query)
            .await
            .map_err(|e| self.store_failure("find_many", collection, e))?;

        let mut records: Vec<Record> = result.docs.into_iter().map(transform_output).collect();
        if let Some(join) = &args.join {
            let resolver = self.join_resolver(store.as_ref());
            join_all(
                records
                    .iter_mut()
                    .map(|record| resolver.resolve(&args.model, record, join)),
            )
            .await;
        }
        Ok(records)
    }

    #[instrument(skip_all, fields(model = %args.model))]
    async fn update(&self, args: UpdateArgs) -> Result<Option<Record>, AdapterError> {
        let store = self.store().await?;
        let collection = self.naming.collection_for(&args.model);
        let filter = convert_where(&args.where_clause, &self.naming);
        self.log_query("update", collection, &filter);
        let data = transform_input(&args.update, &self.naming, self.config.id_type);

        let docs = match store
            .update(collection, self.selector(filter), data, self.config.default_depth)
            .await
        {
            Ok(docs) => docs,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(self.store_failure("update", collection, e)),
        };
        Ok(docs.into_iter().next().map(transform_output))
    }

    #[instrument(skip_all, fields(model = %args.model))]
    async fn update_many(&self, args: UpdateArgs) -> Result<u64, AdapterError> {
        let store = self.store().await?;
        let collection = self.naming.collection_for(&args.model);
        let filter = convert_where(&args.where_clause, &self.naming);
        self.log_query("update_many", collection, &filter);
        let data = transform_input(&args.update, &self.naming, self.config.id_type);

        let docs = store
            .update(collection, Selector::Where(filter), data, self.config.default_depth)
            .await
            .map_err(|e| self.store_failure("update_many", collection, e))?;
        Ok(affected(&docs))
    }

    #[instrument(skip_all, fields(model = %args.model))]
    async fn delete(&self, args: FilterArgs) -> Result<(), AdapterError> {
        let store = self.store().await?;
        let collection = self.naming.collection_for(&args.model);
        let filter = convert_where(&args.where_clause, &self.naming);
        self.log_query("delete", collection, &filter);

        match store.delete(collection, self.selector(filter)).await {
            Err(e) if !e.is_not_found() => Err(self.store_failure("delete", collection, e)),
            _ => Ok(()),
        }
    }

    #[instrument(skip_all, fields(model = %args.model))]
    async fn delete_many(&self, args: FilterArgs) -> Result<u64, AdapterError> {
        let store = self.store().await?;
        let collection = self.naming.collection_for(&args.model);
        let filter = convert_where(&args.where_clause, &self.naming);
        self.log_query("delete_many", collection, &filter);

        let docs = store
            .delete(collection, Selector::Where(filter))
            .await
            .map_err(|e| self.store_failure("delete_many", collection, e))?;
        Ok(affected(&docs))
    }

    #[instrument(skip_all, fields(model = %args.model))]
    async fn count(&self, args: FilterArgs) -> Result<u64, AdapterError> {
        let store = self.store().await?;
        let collection = self.naming.collection_for(&args.model);
        let filter = convert_where(&args.where_clause, &self.naming);
        self.log_query("count", collection, &filter);

        store
            .count(collection, filter)
            .await
            .map_err(|e| self.store_failure("count", collection, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_for_offset() {
        assert_eq!(page_for(Some(10), Some(20)), Some(3));
        assert_eq!(page_for(Some(10), None), Some(1));
        assert_eq!(page_for(Some(10), Some(5)), Some(1));
        assert_eq!(page_for(None, Some(20)), None);
        assert_eq!(page_for(Some(0), Some(20)), None);
    }

    #[test]
    fn test_offset_misaligned() {
        assert!(!offset_misaligned(Some(10), Some(20)));
        assert!(!offset_misaligned(Some(10), None));
        assert!(!offset_misaligned(None, Some(0)));
        assert!(offset_misaligned(Some(10), Some(5)));
        assert!(offset_misaligned(None, Some(20)));
        assert!(offset_misaligned(Some(0), Some(3)));
    }

    #[test]
    fn test_sort_key_maps_fields() {
        let adapter = PayloadAdapter::new(
            StoreSource::Ready(Arc::new(crate::infra::InMemoryDocumentStore::new(
                payload_auth_sdk::IdType::Text,
                &[],
            ))),
            PayloadAuthConfig::default(),
        );
        assert_eq!(adapter.sort_key(&SortBy::desc("createdAt")), "-createdAt");
        assert_eq!(adapter.sort_key(&SortBy::asc("userId")), "user");
    }
}
