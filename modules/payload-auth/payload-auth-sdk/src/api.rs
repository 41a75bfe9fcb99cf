//! `AuthAdapterApi` trait definition.
//!
//! This is the database-adapter contract the auth framework drives. Every
//! method addresses an abstract model (`user`, `session`, ...) and receives
//! predicates as ordered [`crate::WhereClause`] lists.

use async_trait::async_trait;

use crate::error::AdapterError;
use crate::models::{CreateArgs, FilterArgs, FindManyArgs, FindOneArgs, Record, UpdateArgs};

#[async_trait]
pub trait AuthAdapterApi: Send + Sync {
    /// Inserts a record and returns it as stored.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::Store` if the store rejects the write.
    async fn create(&self, args: CreateArgs) -> Result<Record, AdapterError>;

    /// Returns the first record matching the predicate, if any.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::Store` on store failures other than "not found".
    async fn find_one(&self, args: FindOneArgs) -> Result<Option<Record>, AdapterError>;

    /// Returns every record matching the predicate, honoring limit, offset and sort.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::Store` on store failures.
    async fn find_many(&self, args: FindManyArgs) -> Result<Vec<Record>, AdapterError>;

    /// Updates the matching record and returns it, or `None` when nothing matched.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::Store` on store failures other than "not found".
    async fn update(&self, args: UpdateArgs) -> Result<Option<Record>, AdapterError>;

    /// Updates every matching record and returns how many were touched.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::Store` on store failures.
    async fn update_many(&self, args: UpdateArgs) -> Result<u64, AdapterError>;

    /// Deletes the matching record. Deleting a missing record is not an error.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::Store` on store failures other than "not found".
    async fn delete(&self, args: FilterArgs) -> Result<(), AdapterError>;

    /// Deletes every matching record and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::Store` on store failures.
    async fn delete_many(&self, args: FilterArgs) -> Result<u64, AdapterError>;

    /// Counts matching records.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::Store` on store failures.
    async fn count(&self, args: FilterArgs) -> Result<u64, AdapterError>;
}
