//! Payload Auth
//!
//! Better Auth database adapter over a Payload-style document store. The
//! public contract lives in `payload-auth-sdk` and is re-exported here.
//!
//! - [`PayloadAdapter`] implements [`AuthAdapterApi`] on top of any
//!   [`DocumentStore`]
//! - [`domain::schema`] turns the auth schema into collection definitions
//! - [`AuthInstanceSlot`] holds a lazily built auth instance
//! - [`infra::InMemoryDocumentStore`] is a process-local store

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub use payload_auth_sdk::{
    AdapterError, AuthAdapterApi, DocumentStore, IdType, StoreError, StoreResolver, StoreSource,
};

pub mod adapter;
pub use adapter::PayloadAdapter;

pub mod instance;
pub use instance::AuthInstanceSlot;

pub mod config;
pub use config::{ConfigError, PayloadAuthConfig};

pub mod domain;
pub mod infra;
