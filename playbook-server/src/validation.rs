//! Input validation for untrusted data.
//!
//! Path segments and request bodies are checked here before they reach the
//! widget store.

use serde_json::Value;
use thiserror::Error;

/// Maximum length for widget ids, collection keys and item ids.
pub const MAX_ID_LEN: usize = 64;
/// Maximum number of fields in one patch.
pub const MAX_PATCH_FIELDS: usize = 64;
/// Maximum length of any string inside a patch.
pub const MAX_TEXT_LEN: usize = 65_536;

/// Validation error types.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Identifier exceeds maximum length.
    #[error("{0} too long (max {MAX_ID_LEN} chars)")]
    IdTooLong(&'static str),
    /// Identifier is empty or contains invalid characters.
    #[error("{0} contains invalid characters")]
    IdInvalidChars(&'static str),
    /// Patch body is not a JSON object.
    #[error("patch must be a JSON object")]
    PatchNotObject,
    /// Patch has too many fields.
    #[error("too many fields in patch (max {MAX_PATCH_FIELDS})")]
    TooManyFields,
    /// Patch contains an oversized string.
    #[error("text value too long (max {MAX_TEXT_LEN} bytes)")]
    TextTooLong,
}

impl ValidationError {
    /// Short label used for metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::IdTooLong(what) | Self::IdInvalidChars(what) => what,
            Self::PatchNotObject | Self::TooManyFields | Self::TextTooLong => "patch",
        }
    }
}

fn is_valid_id_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

/// Validate an identifier path segment.
///
/// Valid identifiers are 1-64 characters of alphanumerics, hyphens and
/// underscores.
///
/// # Errors
///
/// Returns [`ValidationError::IdTooLong`] or
/// [`ValidationError::IdInvalidChars`], naming `what` in the message.
pub fn validate_id(what: &'static str, id: &str) -> Result<(), ValidationError> {
    if id.len() > MAX_ID_LEN {
        return Err(ValidationError::IdTooLong(what));
    }
    if id.is_empty() || !id.chars().all(is_valid_id_char) {
        return Err(ValidationError::IdInvalidChars(what));
    }
    Ok(())
}

/// Validate the shape and size of a patch body.
///
/// # Errors
///
/// Returns a [`ValidationError`] for a non-object body, too many fields or
/// an oversized string anywhere inside it.
pub fn validate_patch(body: &Value) -> Result<(), ValidationError> {
    let object = body.as_object().ok_or(ValidationError::PatchNotObject)?;
    if object.len() > MAX_PATCH_FIELDS {
        return Err(ValidationError::TooManyFields);
    }
    if object.values().any(too_long) {
        return Err(ValidationError::TextTooLong);
    }
    Ok(())
}

fn too_long(value: &Value) -> bool {
    match value {
        Value::String(s) => s.len() > MAX_TEXT_LEN,
        Value::Array(items) => items.iter().any(too_long),
        Value::Object(map) => map.values().any(too_long),
        _ => false,
    }
}
