//! Domain error types for collection generation.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A field references a model that the schema does not define.
    #[error("field '{model}.{field}' references unknown model '{target}'")]
    UnknownReference {
        model: String,
        field: String,
        target: String,
    },
}
