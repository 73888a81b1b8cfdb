//! Error types for widget operations.

use thiserror::Error;

/// Result type for widget operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while declaring schemas or editing records.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The schema does not declare the requested collection.
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    /// The collection does not declare the requested field.
    #[error("Unknown field '{field}' in collection '{collection}'")]
    UnknownField {
        /// Collection key.
        collection: String,
        /// Offending field key.
        field: String,
    },

    /// A value does not match the shape its descriptor declares.
    #[error("Field '{field}' expects {expected}")]
    TypeMismatch {
        /// Field key.
        field: String,
        /// Human-readable description of the expected shape.
        expected: &'static str,
    },

    /// A choice value outside the declared options.
    #[error("Field '{field}' has no option '{value}'")]
    InvalidChoice {
        /// Field key.
        field: String,
        /// Rejected value.
        value: String,
    },

    /// A required text field lost its base-language value.
    #[error("Field '{0}' requires a non-empty base-language value")]
    EmptyBaseText(String),

    /// A required field is absent from seed data.
    #[error("Missing required field '{field}' on item '{item}'")]
    MissingField {
        /// Field key.
        field: String,
        /// Item identifier.
        item: String,
    },

    /// Two items in one collection share an id.
    #[error("Duplicate item id '{0}'")]
    DuplicateId(String),

    /// The widget was mounted read-only.
    #[error("Widget '{0}' is read-only")]
    ReadOnly(String),

    /// The schema declaration is inconsistent.
    #[error("Invalid schema '{slug}': {reason}")]
    InvalidSchema {
        /// Framework slug.
        slug: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The requested framework is not in the catalog.
    #[error("Unknown framework: {0}")]
    UnknownFramework(String),

    /// Fixture or record serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Fixture file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
