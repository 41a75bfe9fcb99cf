//! Payload Auth SDK
//!
//! This crate provides the public contracts of the `payload-auth` adapter:
//! - `AuthAdapterApi` trait the auth framework calls into
//! - `DocumentStore` trait the adapter drives (implemented over a Payload instance)
//! - `WhereClause`, `FieldValue` and the argument structs of every adapter operation
//! - `AdapterError` and `StoreError` for error handling
//!
//! ## Usage
//!
//! ```ignore
//! use payload_auth_sdk::{AuthAdapterApi, FindOneArgs, WhereClause};
//!
//! let session = adapter
//!     .find_one(FindOneArgs::new("session").with_where(vec![WhereClause::eq("token", token)]))
//!     .await?;
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod api;
pub mod error;
pub mod models;
pub mod store;

pub use api::AuthAdapterApi;
pub use error::{AdapterError, StoreError, StoreResult};
pub use models::{
    Connector, CreateArgs, FieldValue, FilterArgs, FindManyArgs, FindOneArgs, IdType, Join,
    JoinOptions, Operator, Record, SortBy, SortDirection, UpdateArgs, WhereClause,
};
pub use store::{
    Condition, DocId, Document, DocumentStore, FindQuery, FindResult, Selector, StoreOperator,
    StoreResolver, StoreSource, StoreWhere,
};
