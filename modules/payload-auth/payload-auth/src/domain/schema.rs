//! Collection generation from the auth framework's schema.
//!
//! The auth framework describes its tables as models with typed fields and
//! foreign-key references. This module reflects that into collection
//! definitions for the document store, following the same naming rules the
//! adapter applies at runtime (so a `userId` reference becomes a `user`
//! relationship on the `users` collection).

use serde::{Deserialize, Serialize};

use super::error::SchemaError;
use super::naming::FieldNaming;

const TIMESTAMP_FIELDS: [&str; 2] = ["createdAt", "updatedAt"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthFieldKind {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "string[]")]
    StringArray,
    #[serde(rename = "number[]")]
    NumberArray,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldReference {
    pub model: String,
    #[serde(default = "default_reference_field")]
    pub field: String,
}

fn default_reference_field() -> String {
    "id".to_owned()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthField {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AuthFieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub references: Option<FieldReference>,
}

impl AuthField {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: AuthFieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            unique: false,
            references: None,
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub fn references(mut self, model: impl Into<String>) -> Self {
        self.references = Some(FieldReference {
            model: model.into(),
            field: default_reference_field(),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthModel {
    pub name: String,
    pub fields: Vec<AuthField>,
}

impl AuthModel {
    #[must_use]
    pub fn new(name: impl Into<String>, fields: Vec<AuthField>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

/// The auth framework's table definitions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuthSchema {
    pub models: Vec<AuthModel>,
}

impl AuthSchema {
    /// Core tables every auth deployment has: user, session, account, verification.
    #[must_use]
    pub fn core() -> Self {
        use AuthFieldKind as K;

        let timestamps = || {
            vec![
                AuthField::new("createdAt", K::Date).required(),
                AuthField::new("updatedAt", K::Date).required(),
            ]
        };

        let mut user = vec![
            AuthField::new("name", K::String).required(),
            AuthField::new("email", K::String).required().unique(),
            AuthField::new("emailVerified", K::Boolean).required(),
            AuthField::new("image", K::String),
        ];
        user.extend(timestamps());

        let mut session = vec![
            AuthField::new("expiresAt", K::Date).required(),
            AuthField::new("token", K::String).required().unique(),
            AuthField::new("ipAddress", K::String),
            AuthField::new("userAgent", K::String),
            AuthField::new("userId", K::String).required().references("user"),
        ];
        session.extend(timestamps());

        let mut account = vec![
            AuthField::new("accountId", K::String).required(),
            AuthField::new("providerId", K::String).required(),
            AuthField::new("userId", K::String).required().references("user"),
            AuthField::new("accessToken", K::String),
            AuthField::new("refreshToken", K::String),
            AuthField::new("idToken", K::String),
            AuthField::new("accessTokenExpiresAt", K::Date),
            AuthField::new("refreshTokenExpiresAt", K::Date),
            AuthField::new("scope", K::String),
            AuthField::new("password", K::String),
        ];
        account.extend(timestamps());

        let mut verification = vec![
            AuthField::new("identifier", K::String).required(),
            AuthField::new("value", K::String).required(),
            AuthField::new("expiresAt", K::Date).required(),
        ];
        verification.extend(timestamps());

        Self {
            models: vec![
                AuthModel::new("user", user),
                AuthModel::new("session", session),
                AuthModel::new("account", account),
                AuthModel::new("verification", verification),
            ],
        }
    }

    #[must_use]
    pub fn model(&self, name: &str) -> Option<&AuthModel> {
        self.models.iter().find(|m| m.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CollectionFieldKind {
    Text,
    Email,
    Number,
    Checkbox,
    Date,
    Relationship {
        #[serde(rename = "relationTo")]
        relation_to: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionField {
    pub name: String,
    #[serde(flatten)]
    pub kind: CollectionFieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub has_many: bool,
    #[serde(default)]
    pub index: bool,
}

impl CollectionField {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: CollectionFieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            unique: false,
            has_many: false,
            index: false,
        }
    }

    #[must_use]
    pub fn relation_target(&self) -> Option<&str> {
        match &self.kind {
            CollectionFieldKind::Relationship { relation_to } => Some(relation_to),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub slug: String,
    pub fields: Vec<CollectionField>,
    #[serde(default)]
    pub timestamps: bool,
}

impl CollectionConfig {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&CollectionField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Builds one collection per auth model.
///
/// # Errors
///
/// Returns `SchemaError::UnknownReference` if a field references a model that
/// is not part of `schema`.
pub fn generate_collections(
    schema: &AuthSchema,
    naming: &FieldNaming,
) -> Result<Vec<CollectionConfig>, SchemaError> {
    schema
        .models
        .iter()
        .map(|model| generate_collection(schema, model, naming))
        .collect()
}

fn generate_collection(
    schema: &AuthSchema,
    model: &AuthModel,
    naming: &FieldNaming,
) -> Result<CollectionConfig, SchemaError> {
    let mut timestamps = false;
    let mut fields = Vec::with_capacity(model.fields.len());

    for field in &model.fields {
        if TIMESTAMP_FIELDS.contains(&field.name.as_str()) {
            timestamps = true;
            continue;
        }
        fields.push(generate_field(schema, model, field, naming)?);
    }

    Ok(CollectionConfig {
        slug: naming.collection_for(&model.name).to_owned(),
        fields,
        timestamps,
    })
}

fn generate_field(
    schema: &AuthSchema,
    model: &AuthModel,
    field: &AuthField,
    naming: &FieldNaming,
) -> Result<CollectionField, SchemaError> {
    if let Some(reference) = &field.references {
        if schema.model(&reference.model).is_none() {
            return Err(SchemaError::UnknownReference {
                model: model.name.clone(),
                field: field.name.clone(),
                target: reference.model.clone(),
            });
        }
        let mut out = CollectionField::new(
            naming.store_field(&field.name),
            CollectionFieldKind::Relationship {
                relation_to: naming.collection_for(&reference.model).to_owned(),
            },
        );
        out.required = field.required;
        out.index = true;
        return Ok(out);
    }

    let (kind, has_many) = match field.kind {
        AuthFieldKind::String if field.name == "email" => (CollectionFieldKind::Email, false),
        AuthFieldKind::String => (CollectionFieldKind::Text, false),
        AuthFieldKind::StringArray => (CollectionFieldKind::Text, true),
        AuthFieldKind::Number => (CollectionFieldKind::Number, false),
        AuthFieldKind::NumberArray => (CollectionFieldKind::Number, true),
        AuthFieldKind::Boolean => (CollectionFieldKind::Checkbox, false),
        AuthFieldKind::Date => (CollectionFieldKind::Date, false),
    };

    let mut out = CollectionField::new(field.name.clone(), kind);
    out.required = field.required;
    out.unique = field.unique;
    out.index = field.unique;
    out.has_many = has_many;
    Ok(out)
}

/// Merges generated collections into caller-supplied ones.
///
/// Existing collections and fields win; generated fields missing from an
/// existing collection are appended, and generated collections with no
/// existing counterpart are added at the end.
#[must_use]
pub fn merge_collections(
    existing: Vec<CollectionConfig>,
    generated: Vec<CollectionConfig>,
) -> Vec<CollectionConfig> {
    let mut merged = existing;
    for collection in generated {
        if let Some(target) = merged.iter_mut().find(|c| c.slug == collection.slug) {
            target.timestamps |= collection.timestamps;
            for field in collection.fields {
                if target.field(&field.name).is_none() {
                    target.fields.push(field);
                }
            }
        } else {
            merged.push(collection);
        }
    }
    merged
}
