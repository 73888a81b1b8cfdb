//! Widget records and the pure mutation layer.
//!
//! A [`WidgetRecord`] is immutable: every edit produces a new record. Item
//! storage is `Arc`-shared, so an edit allocates a new item list for the
//! touched collection while every untouched item (and every untouched
//! collection) is the same allocation as before.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::item::{Item, ItemId};
use crate::schema::{FieldKind, WidgetSchema};
use crate::value::{check_patch, Patch};
use crate::{CoreError, CoreResult};

/// An ordered, shared list of items.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    items: Arc<Vec<Arc<Item>>>,
}

impl Collection {
    fn from_items(items: Vec<Arc<Item>>) -> Self {
        Self {
            items: Arc::new(items),
        }
    }

    /// Items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[Arc<Item>] {
        &self.items
    }

    /// Iterate items in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().map(AsRef::as_ref)
    }

    /// Find an item by id.
    #[must_use]
    pub fn get(&self, id: &ItemId) -> Option<&Arc<Item>> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Whether an item with `id` exists.
    #[must_use]
    pub fn contains(&self, id: &ItemId) -> bool {
        self.get(id).is_some()
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether both handles point at the same item list.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }
}

/// Result of a pure edit.
#[derive(Debug, Clone)]
pub enum Edit {
    /// The edit produced a new record.
    Applied(WidgetRecord),
    /// The target item does not exist; nothing changed.
    Unchanged,
}

impl Edit {
    /// The new record, if the edit applied.
    #[must_use]
    pub fn applied(self) -> Option<WidgetRecord> {
        match self {
            Self::Applied(record) => Some(record),
            Self::Unchanged => None,
        }
    }
}

/// The root record of a widget: every collection plus the derived aggregate.
#[derive(Debug, Clone)]
pub struct WidgetRecord {
    schema: Arc<WidgetSchema>,
    collections: BTreeMap<String, Collection>,
    aggregate: Option<f64>,
}

impl WidgetRecord {
    /// Create an empty record.
    #[must_use]
    pub fn new(schema: Arc<WidgetSchema>) -> Self {
        let collections = schema
            .collections
            .iter()
            .map(|c| (c.key.clone(), Collection::default()))
            .collect();
        Self {
            schema,
            collections,
            aggregate: None,
        }
        .with_aggregate()
    }

    /// Decode a record from its JSON form: an object mapping collection keys
    /// to arrays of item objects. Missing collections start empty; the
    /// aggregate key, if present, is ignored and recomputed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownCollection`] for undeclared keys,
    /// [`CoreError::DuplicateId`] when a collection repeats an id, and any
    /// item decoding error.
    pub fn from_json(schema: Arc<WidgetSchema>, json: &serde_json::Value) -> CoreResult<Self> {
        let object = json.as_object().ok_or_else(|| CoreError::TypeMismatch {
            field: schema.slug.clone(),
            expected: "an object of collections",
        })?;
        let aggregate_key = schema.aggregate.as_ref().map(|a| a.key.as_str());

        for key in object.keys() {
            if Some(key.as_str()) != aggregate_key && schema.collection(key).is_err() {
                return Err(CoreError::UnknownCollection(key.clone()));
            }
        }

        let mut collections = BTreeMap::new();
        for collection_schema in &schema.collections {
            let mut items = Vec::new();
            let mut seen = BTreeSet::new();
            if let Some(raw) = object.get(&collection_schema.key) {
                let raw_items = raw.as_array().ok_or_else(|| CoreError::TypeMismatch {
                    field: collection_schema.key.clone(),
                    expected: "an array of items",
                })?;
                for raw_item in raw_items {
                    let item = Item::from_json(collection_schema, raw_item)?;
                    if !seen.insert(item.id().clone()) {
                        return Err(CoreError::DuplicateId(item.id().to_string()));
                    }
                    items.push(Arc::new(item));
                }
            }
            collections.insert(collection_schema.key.clone(), Collection::from_items(items));
        }

        Ok(Self {
            schema,
            collections,
            aggregate: None,
        }
        .with_aggregate())
    }

    /// Encode as JSON, including the aggregate under its key.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        for (key, collection) in &self.collections {
            object.insert(
                key.clone(),
                serde_json::Value::Array(collection.iter().map(Item::to_json).collect()),
            );
        }
        if let Some(spec) = &self.schema.aggregate {
            let value = self
                .aggregate
                .and_then(serde_json::Number::from_f64)
                .map_or(serde_json::Value::Null, serde_json::Value::Number);
            object.insert(spec.key.clone(), value);
        }
        serde_json::Value::Object(object)
    }

    /// The schema this record follows.
    #[must_use]
    pub fn schema(&self) -> &Arc<WidgetSchema> {
        &self.schema
    }

    /// A collection by key.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownCollection`] if the schema does not declare it.
    pub fn collection(&self, key: &str) -> CoreResult<&Collection> {
        self.collections
            .get(key)
            .ok_or_else(|| CoreError::UnknownCollection(key.to_string()))
    }

    /// Look up an item in any collection.
    #[must_use]
    pub fn find(&self, collection: &str, id: &ItemId) -> Option<&Item> {
        self.collections
            .get(collection)?
            .get(id)
            .map(AsRef::as_ref)
    }

    /// The derived aggregate (mean rounded to one decimal); `None` when the
    /// schema declares none or its source collection is empty.
    #[must_use]
    pub fn aggregate(&self) -> Option<f64> {
        self.aggregate
    }

    /// Total number of items across collections.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.collections.values().map(Collection::len).sum()
    }

    /// Shallow-merge `patch` into the item `id` of `collection`.
    ///
    /// An unknown `id` yields [`Edit::Unchanged`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownCollection`] or a patch validation error.
    pub fn updated(&self, collection: &str, id: &ItemId, patch: &Patch) -> CoreResult<Edit> {
        let collection_schema = self.schema.collection(collection)?;
        check_patch(collection_schema, patch)?;

        let current = self.collection(collection)?;
        let Some(position) = current.items().iter().position(|item| item.id() == id) else {
            return Ok(Edit::Unchanged);
        };

        let mut items = current.items().to_vec();
        items[position] = Arc::new(items[position].merged(patch));

        let mut next = self.clone();
        next.collections
            .insert(collection.to_string(), Collection::from_items(items));
        Ok(Edit::Applied(next.with_aggregate()))
    }

    /// Append a new item built from the collection template overridden by
    /// `seed`. Returns the new record and the generated id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownCollection`] or a seed validation error.
    pub fn added(&self, collection: &str, seed: &Patch) -> CoreResult<(Self, ItemId)> {
        let collection_schema = self.schema.collection(collection)?;
        check_patch(collection_schema, seed)?;

        let current = self.collection(collection)?;
        let id = ItemId::generate(&collection_schema.id_prefix, |candidate| {
            current.contains(&ItemId::from(candidate))
        });
        let item = Item::from_template(id.clone(), collection_schema, seed);

        let mut items = current.items().to_vec();
        items.push(Arc::new(item));

        let mut next = self.clone();
        next.collections
            .insert(collection.to_string(), Collection::from_items(items));
        Ok((next.with_aggregate(), id))
    }

    /// Remove the item `id` from `collection`, cascading the cleanup:
    ///
    /// - items whose single reference points at a removed item are removed
    ///   too, recursively;
    /// - removed ids are stripped from every reference list.
    ///
    /// An unknown `id` yields [`Edit::Unchanged`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownCollection`] if `collection` is undeclared.
    pub fn removed(&self, collection: &str, id: &ItemId) -> CoreResult<Edit> {
        self.schema.collection(collection)?;
        if !self.collection(collection)?.contains(id) {
            return Ok(Edit::Unchanged);
        }

        let doomed = self.cascade_from(collection, id);
        let cascaded = doomed.values().map(BTreeSet::len).sum::<usize>() - 1;
        if cascaded > 0 {
            tracing::debug!("Removing {collection}/{id} cascades to {cascaded} dependent items");
        }

        let mut next = self.clone();
        for collection_schema in &self.schema.collections {
            let key = &collection_schema.key;
            let Some(current) = self.collections.get(key) else {
                continue;
            };
            let removed_here = doomed.get(key);
            let strip: Vec<(&str, &BTreeSet<ItemId>)> = collection_schema
                .fields
                .iter()
                .filter_map(|f| match &f.kind {
                    FieldKind::RefList { target } => {
                        doomed.get(target).map(|ids| (f.key.as_str(), ids))
                    }
                    _ => None,
                })
                .collect();

            if removed_here.is_none() && strip.is_empty() {
                continue;
            }

            let mut changed = false;
            let mut items = Vec::with_capacity(current.len());
            for item in current.items() {
                if removed_here.is_some_and(|ids| ids.contains(item.id())) {
                    changed = true;
                    continue;
                }
                let mut kept = Arc::clone(item);
                for (field, ids) in &strip {
                    for removed in *ids {
                        if let Some(stripped) = kept.without_reference(field, removed) {
                            kept = Arc::new(stripped);
                            changed = true;
                        }
                    }
                }
                items.push(kept);
            }

            if changed {
                next.collections
                    .insert(key.clone(), Collection::from_items(items));
            }
        }

        Ok(Edit::Applied(next.with_aggregate()))
    }

    /// Every item that disappears when `collection/id` is removed, grouped
    /// by collection, including the root itself.
    fn cascade_from(&self, collection: &str, id: &ItemId) -> BTreeMap<String, BTreeSet<ItemId>> {
        let mut doomed: BTreeMap<String, BTreeSet<ItemId>> = BTreeMap::new();
        doomed
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone());
        let mut pending = vec![(collection.to_string(), id.clone())];

        while let Some((target, removed)) = pending.pop() {
            for (owner, field) in self.schema.references_to(&target) {
                if !matches!(field.kind, FieldKind::Ref { .. }) {
                    continue;
                }
                let Some(items) = self.collections.get(&owner.key) else {
                    continue;
                };
                for item in items.iter() {
                    if item.reference(&field.key) == Some(&removed)
                        && doomed
                            .entry(owner.key.clone())
                            .or_default()
                            .insert(item.id().clone())
                    {
                        pending.push((owner.key.clone(), item.id().clone()));
                    }
                }
            }
        }

        doomed
    }

    /// Recompute the derived aggregate.
    fn with_aggregate(mut self) -> Self {
        self.aggregate = self.schema.aggregate.as_ref().and_then(|spec| {
            let items = self.collections.get(&spec.collection)?;
            let scores: Vec<f64> = items.iter().filter_map(|i| i.number(&spec.field)).collect();
            if scores.is_empty() {
                return None;
            }
            #[allow(clippy::cast_precision_loss)]
            let mean = scores.iter().sum::<f64>() / scores.len() as f64;
            Some(round_one_decimal(mean))
        });
        self
    }
}

/// Round to one decimal place.
#[must_use]
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::label;
    use crate::schema::{AggregateSpec, CollectionSchema, FieldDescriptor, Layout};
    use crate::value::FieldValue;

    fn scored_schema() -> Arc<WidgetSchema> {
        Arc::new(
            WidgetSchema::new(
                "scored",
                label("评分", "Scored"),
                Layout::Radar {
                    collection: "rows".into(),
                    label: "name".into(),
                    value: "score".into(),
                },
            )
            .with_collection(
                CollectionSchema::new("rows", label("行", "Rows"), "row")
                    .with_field(FieldDescriptor::text("name", label("名称", "Name")).required())
                    .with_field(FieldDescriptor::score("score", label("分数", "Score"), 1.0, 5.0)),
            )
            .with_aggregate(AggregateSpec::mean("overall", label("总分", "Overall"), "rows", "score")),
        )
    }

    fn score_patch(score: f64) -> Patch {
        let mut patch = Patch::new();
        patch.insert("score".into(), FieldValue::Number(score));
        patch
    }

    #[test]
    fn test_empty_record_has_no_aggregate() {
        let record = WidgetRecord::new(scored_schema());
        assert_eq!(record.aggregate(), None);
        assert_eq!(record.item_count(), 0);
    }

    #[test]
    fn test_update_unknown_id_is_unchanged() {
        let record = WidgetRecord::new(scored_schema());
        let edit = record
            .updated("rows", &ItemId::from("ghost"), &score_patch(4.0))
            .expect("no error");
        assert!(matches!(edit, Edit::Unchanged));
    }

    #[test]
    fn test_update_unknown_collection_is_error() {
        let record = WidgetRecord::new(scored_schema());
        assert!(matches!(
            record.updated("columns", &ItemId::from("x"), &Patch::new()),
            Err(CoreError::UnknownCollection(_))
        ));
    }

    #[test]
    fn test_add_then_update_recomputes_aggregate() {
        let record = WidgetRecord::new(scored_schema());
        let (record, a) = record.added("rows", &score_patch(2.0)).expect("add");
        let (record, _b) = record.added("rows", &score_patch(3.0)).expect("add");
        assert_eq!(record.aggregate(), Some(2.5));

        let record = record
            .updated("rows", &a, &score_patch(5.0))
            .expect("update")
            .applied()
            .expect("applied");
        assert_eq!(record.aggregate(), Some(4.0));
    }

    #[test]
    fn test_to_json_emits_aggregate() {
        let (record, _) = WidgetRecord::new(scored_schema())
            .added("rows", &score_patch(4.0))
            .expect("add");
        let json = record.to_json();
        assert_eq!(json["overall"], serde_json::json!(4.0));
        assert_eq!(json["rows"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_from_json_rejects_duplicate_ids() {
        let err = WidgetRecord::from_json(
            scored_schema(),
            &serde_json::json!({
                "rows": [
                    { "id": "a", "name": "甲", "score": 1 },
                    { "id": "a", "name": "乙", "score": 2 }
                ]
            }),
        )
        .expect_err("duplicate");
        assert!(matches!(err, CoreError::DuplicateId(_)));
    }

    #[test]
    fn test_round_one_decimal() {
        assert!((round_one_decimal(3.44) - 3.4).abs() < f64::EPSILON);
        assert!((round_one_decimal(2.25) - 2.3).abs() < f64::EPSILON);
    }
}
