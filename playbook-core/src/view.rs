//! Localized read views of a record.
//!
//! A view resolves every text through the bilingual rule and formats every
//! scalar the way it is displayed and exported. The CSV projection and the
//! diagram layouts read records through these views.

use serde::Serialize;

use crate::item::{Item, ItemId};
use crate::lang::Lang;
use crate::record::WidgetRecord;
use crate::schema::{FieldDescriptor, FieldKind, NumberFormat};
use crate::value::{FieldValue, DATE_FORMAT};

/// Separator for list entries.
pub const LIST_SEPARATOR: &str = "; ";

/// Separator for reference lists.
pub const REF_SEPARATOR: &str = ", ";

/// A column header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnView {
    /// Field key.
    pub key: String,
    /// Localized label.
    pub label: String,
}

/// One item's display cells, aligned with its collection's columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemView {
    /// Item id.
    pub id: String,
    /// Display cells.
    pub cells: Vec<String>,
}

/// One collection rendered for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionView {
    /// Collection key.
    pub key: String,
    /// Localized collection label.
    pub label: String,
    /// Column headers in schema order.
    pub columns: Vec<ColumnView>,
    /// Items in insertion order.
    pub items: Vec<ItemView>,
}

/// The derived aggregate rendered for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateView {
    /// Output key.
    pub key: String,
    /// Localized label.
    pub label: String,
    /// Value, `None` when there is nothing to average.
    pub value: Option<f64>,
    /// One-decimal display (`"3.4"`), empty when `value` is `None`.
    pub display: String,
}

/// A whole record rendered for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordView {
    /// Framework slug.
    pub slug: String,
    /// Localized widget title.
    pub title: String,
    /// Language the view was resolved for.
    pub lang: Lang,
    /// Collections in schema order.
    pub collections: Vec<CollectionView>,
    /// Derived aggregate.
    pub aggregate: Option<AggregateView>,
}

impl RecordView {
    /// A collection view by key.
    #[must_use]
    pub fn collection(&self, key: &str) -> Option<&CollectionView> {
        self.collections.iter().find(|c| c.key == key)
    }

    /// Whether every collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collections.iter().all(|c| c.items.is_empty())
    }
}

impl CollectionView {
    /// Display cell of `item_id` for column `key`.
    #[must_use]
    pub fn cell(&self, item_id: &str, key: &str) -> Option<&str> {
        let column = self.columns.iter().position(|c| c.key == key)?;
        self.items
            .iter()
            .find(|i| i.id == item_id)
            .and_then(|i| i.cells.get(column))
            .map(String::as_str)
    }
}

impl WidgetRecord {
    /// Resolve the record for display in `lang`.
    #[must_use]
    pub fn view(&self, lang: Lang) -> RecordView {
        let schema = self.schema();
        let collections = schema
            .collections
            .iter()
            .map(|collection_schema| {
                let columns = collection_schema
                    .fields
                    .iter()
                    .map(|f| ColumnView {
                        key: f.key.clone(),
                        label: f.label.resolve(lang).to_string(),
                    })
                    .collect();
                let items = self
                    .collection(&collection_schema.key)
                    .map(|c| {
                        c.iter()
                            .map(|item| ItemView {
                                id: item.id().to_string(),
                                cells: collection_schema
                                    .fields
                                    .iter()
                                    .map(|f| self.display(f, item, lang))
                                    .collect(),
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                CollectionView {
                    key: collection_schema.key.clone(),
                    label: collection_schema.label.resolve(lang).to_string(),
                    columns,
                    items,
                }
            })
            .collect();

        let aggregate = schema.aggregate.as_ref().map(|spec| AggregateView {
            key: spec.key.clone(),
            label: spec.label.resolve(lang).to_string(),
            value: self.aggregate(),
            display: self.aggregate().map(|v| format!("{v:.1}")).unwrap_or_default(),
        });

        RecordView {
            slug: schema.slug.clone(),
            title: schema.title.resolve(lang).to_string(),
            lang,
            collections,
            aggregate,
        }
    }

    /// Display string of one field of `item`.
    ///
    /// Dangling references render as nothing.
    #[must_use]
    pub fn display(&self, field: &FieldDescriptor, item: &Item, lang: Lang) -> String {
        let Some(value) = item.value(&field.key) else {
            return String::new();
        };
        match (&field.kind, value) {
            (_, FieldValue::Text(text)) => text.resolve(lang).to_string(),
            (FieldKind::Number { format, .. }, FieldValue::Number(n)) => {
                let mut out = format_number(*n);
                if *format == NumberFormat::Percent {
                    out.push('%');
                }
                out
            }
            (_, FieldValue::Number(n)) => format_number(*n),
            (_, FieldValue::Choice(choice)) => field
                .option(choice)
                .map_or_else(|| choice.clone(), |o| o.label.resolve(lang).to_string()),
            (_, FieldValue::Date(date)) => date.format(DATE_FORMAT).to_string(),
            (_, FieldValue::List(list)) => list.resolve(lang).join(LIST_SEPARATOR),
            (FieldKind::Ref { target }, FieldValue::Ref(Some(id))) => {
                if self.find(target, id).is_some() {
                    id.to_string()
                } else {
                    String::new()
                }
            }
            (_, FieldValue::Ref(_)) => String::new(),
            (kind, FieldValue::RefList(ids)) => {
                let live: Vec<&str> = ids
                    .iter()
                    .filter(|id| kind.reference_target().is_some_and(|t| self.find(t, id).is_some()))
                    .map(ItemId::as_str)
                    .collect();
                live.join(REF_SEPARATOR)
            }
        }
    }
}

/// Format a number: whole values without decimals, others as-is.
#[must_use]
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}
