//! Typed field values and their JSON codec.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::Value;

use crate::item::ItemId;
use crate::lang::{LocalizedList, LocalizedText};
use crate::schema::{CollectionSchema, FieldDescriptor, FieldKind};
use crate::{CoreError, CoreResult};

/// Date format used in fixtures, CSV and the HTTP API.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Text with optional English override.
    Text(LocalizedText),
    /// Number.
    Number(f64),
    /// Stored value of a choice option.
    Choice(String),
    /// Calendar date.
    Date(NaiveDate),
    /// List of strings with optional English list.
    List(LocalizedList),
    /// Optional reference to another item.
    Ref(Option<ItemId>),
    /// References to other items.
    RefList(Vec<ItemId>),
}

/// Partial item: field key → new value. Applied as a shallow merge.
pub type Patch = BTreeMap<String, FieldValue>;

impl FieldValue {
    /// Decode a JSON value through its descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TypeMismatch`] if the JSON does not have the
    /// shape the descriptor declares, or any error from
    /// [`FieldDescriptor::check`].
    pub fn from_json(field: &FieldDescriptor, json: &Value) -> CoreResult<Self> {
        let mismatch = || CoreError::TypeMismatch {
            field: field.key.clone(),
            expected: field.kind.expected(),
        };

        let value = match &field.kind {
            FieldKind::Text => {
                Self::Text(serde_json::from_value(json.clone()).map_err(|_| mismatch())?)
            }
            FieldKind::Number { .. } => Self::Number(json.as_f64().ok_or_else(mismatch)?),
            FieldKind::Choice { .. } => Self::Choice(json.as_str().ok_or_else(mismatch)?.to_string()),
            FieldKind::Date => {
                let raw = json.as_str().ok_or_else(mismatch)?;
                Self::Date(NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| mismatch())?)
            }
            FieldKind::List => {
                Self::List(serde_json::from_value(json.clone()).map_err(|_| mismatch())?)
            }
            FieldKind::Ref { .. } => match json {
                Value::Null => Self::Ref(None),
                Value::String(id) if id.is_empty() => Self::Ref(None),
                Value::String(id) => Self::Ref(Some(ItemId::from(id.as_str()))),
                _ => return Err(mismatch()),
            },
            FieldKind::RefList { .. } => {
                let ids = json.as_array().ok_or_else(mismatch)?;
                Self::RefList(
                    ids.iter()
                        .map(|id| id.as_str().map(ItemId::from).ok_or_else(mismatch))
                        .collect::<CoreResult<_>>()?,
                )
            }
        };

        field.check(&value)?;
        Ok(value)
    }

    /// Encode as JSON.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(text) => serde_json::to_value(text).unwrap_or(Value::Null),
            Self::Number(n) => serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number),
            Self::Choice(choice) => Value::String(choice.clone()),
            Self::Date(date) => Value::String(date.format(DATE_FORMAT).to_string()),
            Self::List(list) => serde_json::to_value(list).unwrap_or(Value::Null),
            Self::Ref(target) => target
                .as_ref()
                .map_or(Value::Null, |id| Value::String(id.to_string())),
            Self::RefList(ids) => Value::Array(
                ids.iter()
                    .map(|id| Value::String(id.to_string()))
                    .collect(),
            ),
        }
    }

    /// Text value, if this is one.
    #[must_use]
    pub fn as_text(&self) -> Option<&LocalizedText> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Number value, if this is one.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Choice value, if this is one.
    #[must_use]
    pub fn as_choice(&self) -> Option<&str> {
        match self {
            Self::Choice(choice) => Some(choice),
            _ => None,
        }
    }

    /// Date value, if this is one.
    #[must_use]
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(date) => Some(*date),
            _ => None,
        }
    }

    /// List value, if this is one.
    #[must_use]
    pub fn as_list(&self) -> Option<&LocalizedList> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<LocalizedText> for FieldValue {
    fn from(text: LocalizedText) -> Self {
        Self::Text(text)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

/// Decode a JSON object into a patch for `collection`.
///
/// An `id` key is ignored: ids are assigned by the widget, never edited.
///
/// # Errors
///
/// Returns [`CoreError::TypeMismatch`] if `json` is not an object,
/// [`CoreError::UnknownField`] for undeclared keys, or any decoding error.
pub fn decode_patch(collection: &CollectionSchema, json: &Value) -> CoreResult<Patch> {
    let object = json.as_object().ok_or_else(|| CoreError::TypeMismatch {
        field: collection.key.clone(),
        expected: "an object of field values",
    })?;

    let mut patch = Patch::new();
    for (key, raw) in object {
        if key == "id" {
            continue;
        }
        let field = collection.require_field(key)?;
        patch.insert(key.clone(), FieldValue::from_json(field, raw)?);
    }
    Ok(patch)
}

/// Check a programmatically built patch against `collection`.
///
/// # Errors
///
/// Returns the first [`CoreError`] found among the patch entries.
pub fn check_patch(collection: &CollectionSchema, patch: &Patch) -> CoreResult<()> {
    for (key, value) in patch {
        collection.require_field(key)?.check(value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::label;
    use crate::schema::ChoiceOption;

    fn factors() -> CollectionSchema {
        CollectionSchema::new("factors", label("因素", "Factors"), "factor")
            .with_field(FieldDescriptor::text("title", label("标题", "Title")).localized().required())
            .with_field(FieldDescriptor::score("impact", label("影响", "Impact"), 1.0, 5.0))
            .with_field(FieldDescriptor::choice(
                "direction",
                label("方向", "Direction"),
                vec![
                    ChoiceOption::new("opportunity", label("机会", "Opportunity")),
                    ChoiceOption::new("threat", label("威胁", "Threat")),
                ],
            ))
            .with_field(FieldDescriptor::date("due", label("截止", "Due")))
    }

    #[test]
    fn test_decode_patch_typed() {
        let patch = decode_patch(
            &factors(),
            &serde_json::json!({
                "id": "ignored",
                "title": {"zh": "人口老龄化", "en": "Ageing population"},
                "impact": 4,
                "due": "2024-03-01"
            }),
        )
        .expect("decode");

        assert_eq!(patch.len(), 3);
        assert_eq!(patch["impact"], FieldValue::Number(4.0));
        assert_eq!(
            patch["due"],
            FieldValue::Date(NaiveDate::from_ymd_opt(2024, 3, 1).expect("date"))
        );
    }

    #[test]
    fn test_decode_patch_rejects_misspelled_key() {
        let err = decode_patch(&factors(), &serde_json::json!({ "titel": "x" }))
            .expect_err("unknown key");
        assert!(matches!(err, CoreError::UnknownField { .. }));
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        let err = decode_patch(&factors(), &serde_json::json!({ "impact": "high" }))
            .expect_err("mismatch");
        assert!(matches!(err, CoreError::TypeMismatch { .. }));

        let err = decode_patch(&factors(), &serde_json::json!({ "title": "" }))
            .expect_err("empty base");
        assert!(matches!(err, CoreError::EmptyBaseText(_)));
    }

    #[test]
    fn test_scores_are_not_clamped() {
        let patch = decode_patch(&factors(), &serde_json::json!({ "impact": 9 })).expect("decode");
        assert_eq!(patch["impact"].as_number(), Some(9.0));
    }
}
