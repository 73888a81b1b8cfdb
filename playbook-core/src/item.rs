//! Items - the records inside a widget collection.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lang::Lang;
use crate::schema::{CollectionSchema, FieldKind};
use crate::value::{FieldValue, Patch};
use crate::{CoreError, CoreResult};

/// Stable identifier of an item within its collection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Generate a fresh id: `{prefix}-{millis as hex}-{random suffix}`.
    ///
    /// `taken` is consulted so that a collision with a live id is retried.
    #[must_use]
    pub fn generate(prefix: &str, taken: impl Fn(&str) -> bool) -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        loop {
            let suffix = Uuid::new_v4().simple().to_string();
            let candidate = format!("{prefix}-{millis:x}-{}", &suffix[..8]);
            if !taken(&candidate) {
                return Self(candidate);
            }
        }
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One record inside a collection: an id and a value per declared field.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    id: ItemId,
    values: BTreeMap<String, FieldValue>,
}

impl Item {
    /// Build an item from the collection's default template, overridden by
    /// `seed`.
    #[must_use]
    pub fn from_template(id: ItemId, schema: &CollectionSchema, seed: &Patch) -> Self {
        let values = schema
            .fields
            .iter()
            .map(|field| {
                let value = seed
                    .get(&field.key)
                    .cloned()
                    .unwrap_or_else(|| field.default_value());
                (field.key.clone(), value)
            })
            .collect();
        Self { id, values }
    }

    /// Decode an item object. Missing optional fields take their template
    /// default; a missing required text is an error.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TypeMismatch`] when the object or its `id` is
    /// malformed, [`CoreError::MissingField`] for absent required text, and
    /// any field decoding error.
    pub fn from_json(schema: &CollectionSchema, json: &serde_json::Value) -> CoreResult<Self> {
        let object = json.as_object().ok_or_else(|| CoreError::TypeMismatch {
            field: schema.key.clone(),
            expected: "an item object",
        })?;
        let id = object
            .get("id")
            .and_then(serde_json::Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| CoreError::TypeMismatch {
                field: "id".to_string(),
                expected: "a non-empty string id",
            })?;

        let mut values = BTreeMap::new();
        for field in &schema.fields {
            let value = match object.get(&field.key) {
                Some(raw) => FieldValue::from_json(field, raw)?,
                None if field.required && field.kind == FieldKind::Text => {
                    return Err(CoreError::MissingField {
                        field: field.key.clone(),
                        item: id.to_string(),
                    });
                }
                None => field.default_value(),
            };
            values.insert(field.key.clone(), value);
        }
        for key in object.keys() {
            if key != "id" && schema.field(key).is_none() {
                return Err(CoreError::UnknownField {
                    collection: schema.key.clone(),
                    field: key.clone(),
                });
            }
        }

        Ok(Self {
            id: ItemId::from(id),
            values,
        })
    }

    /// Encode as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        object.insert("id".to_string(), serde_json::Value::String(self.id.to_string()));
        for (key, value) in &self.values {
            object.insert(key.clone(), value.to_json());
        }
        serde_json::Value::Object(object)
    }

    /// Shallow merge: a new item with `patch` applied over this one.
    #[must_use]
    pub fn merged(&self, patch: &Patch) -> Self {
        let mut next = self.clone();
        for (key, value) in patch {
            next.values.insert(key.clone(), value.clone());
        }
        next
    }

    /// Item identifier.
    #[must_use]
    pub fn id(&self) -> &ItemId {
        &self.id
    }

    /// Raw value of a field.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    /// Effective text of a field for `lang`.
    #[must_use]
    pub fn text(&self, key: &str, lang: Lang) -> Option<&str> {
        self.value(key)?.as_text().map(|t| t.resolve(lang))
    }

    /// Number value of a field.
    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        self.value(key)?.as_number()
    }

    /// Choice value of a field.
    #[must_use]
    pub fn choice(&self, key: &str) -> Option<&str> {
        self.value(key)?.as_choice()
    }

    /// Date value of a field.
    #[must_use]
    pub fn date(&self, key: &str) -> Option<NaiveDate> {
        self.value(key)?.as_date()
    }

    /// Effective list entries of a field for `lang` (empty if absent).
    #[must_use]
    pub fn list(&self, key: &str, lang: Lang) -> &[String] {
        self.value(key)
            .and_then(FieldValue::as_list)
            .map_or(&[][..], |l| l.resolve(lang))
    }

    /// Target of a single-reference field.
    #[must_use]
    pub fn reference(&self, key: &str) -> Option<&ItemId> {
        match self.value(key)? {
            FieldValue::Ref(target) => target.as_ref(),
            _ => None,
        }
    }

    /// Targets of a reference-list field (empty if absent).
    #[must_use]
    pub fn references(&self, key: &str) -> &[ItemId] {
        match self.value(key) {
            Some(FieldValue::RefList(ids)) => ids,
            _ => &[],
        }
    }

    /// Copy of this item with `id` removed from the reference list `key`.
    /// Returns `None` when the list does not contain it.
    pub(crate) fn without_reference(&self, key: &str, id: &ItemId) -> Option<Self> {
        let ids = self.references(key);
        if !ids.contains(id) {
            return None;
        }
        let kept = ids.iter().filter(|r| *r != id).cloned().collect();
        let mut next = self.clone();
        next.values.insert(key.to_string(), FieldValue::RefList(kept));
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::label;
    use crate::schema::FieldDescriptor;

    fn tasks() -> CollectionSchema {
        CollectionSchema::new("tasks", label("任务", "Tasks"), "task")
            .with_field(FieldDescriptor::text("name", label("名称", "Name")).localized().required())
            .with_field(FieldDescriptor::percent("progress", label("进度", "Progress")))
            .with_field(FieldDescriptor::references("dependencies", label("依赖", "Dependencies"), "tasks"))
    }

    #[test]
    fn test_generated_ids_carry_prefix() {
        let id = ItemId::generate("task", |_| false);
        assert!(id.as_str().starts_with("task-"));
    }

    #[test]
    fn test_generate_retries_on_collision() {
        let first = ItemId::generate("task", |_| false);
        let second = ItemId::generate("task", |candidate| candidate == first.as_str());
        assert_ne!(first, second);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let item = Item::from_json(
            &tasks(),
            &serde_json::json!({ "id": "t1", "name": "设计" }),
        )
        .expect("item");
        assert_eq!(item.number("progress"), Some(0.0));
        assert!(item.references("dependencies").is_empty());
    }

    #[test]
    fn test_from_json_requires_base_text() {
        let err = Item::from_json(&tasks(), &serde_json::json!({ "id": "t1" }))
            .expect_err("missing name");
        assert!(matches!(err, CoreError::MissingField { .. }));
    }

    #[test]
    fn test_merge_is_shallow() {
        let item = Item::from_json(
            &tasks(),
            &serde_json::json!({ "id": "t1", "name": "设计", "progress": 20 }),
        )
        .expect("item");
        let mut patch = Patch::new();
        patch.insert("progress".into(), FieldValue::Number(60.0));

        let next = item.merged(&patch);
        assert_eq!(next.number("progress"), Some(60.0));
        assert_eq!(next.text("name", Lang::Zh), Some("设计"));
        assert_eq!(item.number("progress"), Some(20.0));
    }
}
