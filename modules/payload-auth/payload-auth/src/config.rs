//! Configuration for the payload-auth adapter.
//!
//! Values are layered with `figment`: built-in defaults, then an optional YAML
//! file, then `PAYLOAD_AUTH_*` environment variables (`__` separates nested keys,
//! e.g. `PAYLOAD_AUTH_COLLECTIONS__USER=members`).

use std::collections::BTreeMap;
use std::path::Path;

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use payload_auth_sdk::IdType;
use serde::{Deserialize, Serialize};

pub const ENV_PREFIX: &str = "PAYLOAD_AUTH_";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("config file '{0}' does not exist")]
    FileNotFound(String),
    #[error("invalid payload-auth config: {0}")]
    Invalid(#[source] Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self::Invalid(Box::new(e))
    }
}

/// Adapter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PayloadAuthConfig {
    /// Primary key type of the underlying database.
    pub id_type: IdType,

    /// Model name to collection slug. Entries here are merged over the
    /// built-in table; models absent from the table use their own name.
    pub collections: BTreeMap<String, String>,

    /// Fields ending in `Id` that are plain attributes, not relationships.
    /// Default: `["accountId", "providerId"]`
    pub relation_suffix_exceptions: Vec<String>,

    /// Relationship population depth requested from the store on reads.
    pub default_depth: u32,

    /// Log translated queries and store failures at debug level.
    pub enable_debug_logs: bool,
}

impl Default for PayloadAuthConfig {
    fn default() -> Self {
        Self {
            id_type: IdType::Text,
            collections: default_collections(),
            relation_suffix_exceptions: vec!["accountId".to_owned(), "providerId".to_owned()],
            default_depth: 1,
            enable_debug_logs: false,
        }
    }
}

fn default_collections() -> BTreeMap<String, String> {
    [
        ("user", "users"),
        ("session", "sessions"),
        ("account", "accounts"),
        ("verification", "verifications"),
    ]
    .into_iter()
    .map(|(model, slug)| (model.to_owned(), slug.to_owned()))
    .collect()
}

impl PayloadAuthConfig {
    /// Loads the config from defaults, an optional YAML file and the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::FileNotFound` if `path` is given but missing, and
    /// `ConfigError::Invalid` if any layer fails to deserialize.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.display().to_string()));
            }
            figment = figment.merge(Yaml::file(path));
        }
        Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extracts the config from a caller-assembled figment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the figment does not deserialize.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        Ok(figment.extract()?)
    }

    #[must_use]
    pub fn with_id_type(mut self, id_type: IdType) -> Self {
        self.id_type = id_type;
        self
    }

    #[must_use]
    pub fn with_collection(mut self, model: impl Into<String>, slug: impl Into<String>) -> Self {
        self.collections.insert(model.into(), slug.into());
        self
    }

    #[must_use]
    pub fn with_debug_logs(mut self, enabled: bool) -> Self {
        self.enable_debug_logs = enabled;
        self
    }
}
