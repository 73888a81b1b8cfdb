//! Schema declarations for framework widgets.
//!
//! A framework is described by a [`WidgetSchema`]: its collections, the
//! descriptors of every field those collections carry, an optional derived
//! aggregate, and the diagram [`Layout`] used to draw it. All field access in
//! the crate goes through these descriptors.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::lang::{label, LocalizedList, LocalizedText};
use crate::value::FieldValue;
use crate::{CoreError, CoreResult};

/// How a number is displayed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberFormat {
    /// Plain number (`3`, `2.5`).
    #[default]
    Plain,
    /// Percentage with a `%` suffix (`40%`).
    Percent,
}

/// One option of a closed choice field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    /// Stored value.
    pub value: String,
    /// Display label.
    pub label: LocalizedText,
}

impl ChoiceOption {
    /// Create an option.
    #[must_use]
    pub fn new(value: &str, label: LocalizedText) -> Self {
        Self {
            value: value.to_string(),
            label,
        }
    }
}

/// The type of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// Free text.
    Text,
    /// Number with editor bounds. The bounds are hints for the editing UI;
    /// the data layer accepts any finite value.
    Number {
        /// Lower editor bound.
        min: f64,
        /// Upper editor bound.
        max: f64,
        /// Editor step.
        step: f64,
        /// Display format.
        format: NumberFormat,
    },
    /// A closed set of string options.
    Choice {
        /// Allowed options, in display order.
        options: Vec<ChoiceOption>,
    },
    /// Calendar date.
    Date,
    /// List of strings.
    List,
    /// Optional reference to one item of `target`. Removing the target
    /// removes the referencing item.
    Ref {
        /// Target collection key.
        target: String,
    },
    /// References to items of `target`. Removing a target strips its id.
    RefList {
        /// Target collection key.
        target: String,
    },
}

impl FieldKind {
    /// Short description used in error messages.
    #[must_use]
    pub const fn expected(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number { .. } => "a finite number",
            Self::Choice { .. } => "a choice string",
            Self::Date => "a YYYY-MM-DD date",
            Self::List => "a list of strings",
            Self::Ref { .. } => "an item id or null",
            Self::RefList { .. } => "a list of item ids",
        }
    }

    /// Target collection of a reference field.
    #[must_use]
    pub fn reference_target(&self) -> Option<&str> {
        match self {
            Self::Ref { target } | Self::RefList { target } => Some(target),
            _ => None,
        }
    }
}

/// Explicit description of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Field key.
    pub key: String,
    /// Column/editor label.
    pub label: LocalizedText,
    /// Field type.
    pub kind: FieldKind,
    /// Whether the field carries an English override.
    pub localizable: bool,
    /// Whether a text field must keep a non-empty base value.
    pub required: bool,
    /// Explicit template default.
    pub default: Option<FieldValue>,
}

impl FieldDescriptor {
    fn new(key: &str, label: LocalizedText, kind: FieldKind) -> Self {
        Self {
            key: key.to_string(),
            label,
            kind,
            localizable: false,
            required: false,
            default: None,
        }
    }

    /// Free-text field.
    #[must_use]
    pub fn text(key: &str, label: LocalizedText) -> Self {
        Self::new(key, label, FieldKind::Text)
    }

    /// Score field with integer steps between `min` and `max`.
    #[must_use]
    pub fn score(key: &str, label: LocalizedText, min: f64, max: f64) -> Self {
        Self::new(
            key,
            label,
            FieldKind::Number {
                min,
                max,
                step: 1.0,
                format: NumberFormat::Plain,
            },
        )
    }

    /// Percentage field between 0 and 100.
    #[must_use]
    pub fn percent(key: &str, label: LocalizedText) -> Self {
        Self::new(
            key,
            label,
            FieldKind::Number {
                min: 0.0,
                max: 100.0,
                step: 5.0,
                format: NumberFormat::Percent,
            },
        )
    }

    /// Closed choice field.
    #[must_use]
    pub fn choice(key: &str, label: LocalizedText, options: Vec<ChoiceOption>) -> Self {
        Self::new(key, label, FieldKind::Choice { options })
    }

    /// Date field.
    #[must_use]
    pub fn date(key: &str, label: LocalizedText) -> Self {
        Self::new(key, label, FieldKind::Date)
    }

    /// List-of-strings field.
    #[must_use]
    pub fn list(key: &str, label: LocalizedText) -> Self {
        Self::new(key, label, FieldKind::List)
    }

    /// Single reference into `target`.
    #[must_use]
    pub fn reference(key: &str, label: LocalizedText, target: &str) -> Self {
        Self::new(
            key,
            label,
            FieldKind::Ref {
                target: target.to_string(),
            },
        )
    }

    /// Reference list into `target`.
    #[must_use]
    pub fn references(key: &str, label: LocalizedText, target: &str) -> Self {
        Self::new(
            key,
            label,
            FieldKind::RefList {
                target: target.to_string(),
            },
        )
    }

    /// Mark the field as carrying an English override.
    #[must_use]
    pub fn localized(mut self) -> Self {
        self.localizable = true;
        self
    }

    /// Mark a text field as requiring a non-empty base value.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the template default.
    #[must_use]
    pub fn with_default(mut self, value: FieldValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Template value for new items.
    #[must_use]
    pub fn default_value(&self) -> FieldValue {
        if let Some(value) = &self.default {
            return value.clone();
        }
        match &self.kind {
            FieldKind::Text if self.required && self.localizable => {
                FieldValue::Text(label("新条目", "New item"))
            }
            FieldKind::Text if self.required => FieldValue::Text(LocalizedText::new("新条目")),
            FieldKind::Text => FieldValue::Text(LocalizedText::default()),
            FieldKind::Number { min, .. } => FieldValue::Number(*min),
            FieldKind::Choice { options } => FieldValue::Choice(
                options
                    .first()
                    .map(|o| o.value.clone())
                    .unwrap_or_default(),
            ),
            FieldKind::Date => FieldValue::Date(chrono::Utc::now().date_naive()),
            FieldKind::List => FieldValue::List(LocalizedList::default()),
            FieldKind::Ref { .. } => FieldValue::Ref(None),
            FieldKind::RefList { .. } => FieldValue::RefList(Vec::new()),
        }
    }

    /// Look up a choice option by stored value.
    #[must_use]
    pub fn option(&self, value: &str) -> Option<&ChoiceOption> {
        match &self.kind {
            FieldKind::Choice { options } => options.iter().find(|o| o.value == value),
            _ => None,
        }
    }

    /// Check that `value` fits this descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TypeMismatch`] for a value of the wrong shape,
    /// [`CoreError::InvalidChoice`] for an undeclared option and
    /// [`CoreError::EmptyBaseText`] when a required text loses its base value.
    pub fn check(&self, value: &FieldValue) -> CoreResult<()> {
        let mismatch = || CoreError::TypeMismatch {
            field: self.key.clone(),
            expected: self.kind.expected(),
        };
        match (&self.kind, value) {
            (FieldKind::Text, FieldValue::Text(text)) => {
                if !self.localizable && text.en.is_some() {
                    return Err(CoreError::TypeMismatch {
                        field: self.key.clone(),
                        expected: "a plain string",
                    });
                }
                if self.required && text.base.trim().is_empty() {
                    return Err(CoreError::EmptyBaseText(self.key.clone()));
                }
                Ok(())
            }
            (FieldKind::Number { .. }, FieldValue::Number(n)) if n.is_finite() => Ok(()),
            (FieldKind::Choice { .. }, FieldValue::Choice(choice)) => {
                if self.option(choice).is_some() {
                    Ok(())
                } else {
                    Err(CoreError::InvalidChoice {
                        field: self.key.clone(),
                        value: choice.clone(),
                    })
                }
            }
            (FieldKind::Date, FieldValue::Date(_))
            | (FieldKind::Ref { .. }, FieldValue::Ref(_))
            | (FieldKind::RefList { .. }, FieldValue::RefList(_)) => Ok(()),
            (FieldKind::List, FieldValue::List(list)) => {
                if !self.localizable && list.en.is_some() {
                    return Err(CoreError::TypeMismatch {
                        field: self.key.clone(),
                        expected: "a plain list of strings",
                    });
                }
                Ok(())
            }
            _ => Err(mismatch()),
        }
    }
}

/// One collection of items within a widget.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSchema {
    /// Collection key.
    pub key: String,
    /// Display label (also the CSV `Type` discriminator).
    pub label: LocalizedText,
    /// Prefix for generated item ids.
    pub id_prefix: String,
    /// Field descriptors in display order.
    pub fields: Vec<FieldDescriptor>,
}

impl CollectionSchema {
    /// Create an empty collection declaration.
    #[must_use]
    pub fn new(key: &str, label: LocalizedText, id_prefix: &str) -> Self {
        Self {
            key: key.to_string(),
            label,
            id_prefix: id_prefix.to_string(),
            fields: Vec::new(),
        }
    }

    /// Append a field descriptor.
    #[must_use]
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Look up a field descriptor.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Look up a field descriptor, failing on unknown keys.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownField`] if the collection has no such field.
    pub fn require_field(&self, key: &str) -> CoreResult<&FieldDescriptor> {
        self.field(key).ok_or_else(|| CoreError::UnknownField {
            collection: self.key.clone(),
            field: key.to_string(),
        })
    }
}

/// Derived mean over a numeric field, rounded to one decimal.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSpec {
    /// Output key.
    pub key: String,
    /// Display label.
    pub label: LocalizedText,
    /// Source collection.
    pub collection: String,
    /// Source number field.
    pub field: String,
}

impl AggregateSpec {
    /// Create an aggregate declaration.
    #[must_use]
    pub fn mean(key: &str, label: LocalizedText, collection: &str, field: &str) -> Self {
        Self {
            key: key.to_string(),
            label,
            collection: collection.to_string(),
            field: field.to_string(),
        }
    }
}

/// Milestones drawn on a timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestoneTrack {
    /// Milestone collection.
    pub collection: String,
    /// Text field drawn next to the marker.
    pub label: String,
    /// Date field.
    pub date: String,
    /// Reference to the owning task.
    pub task: String,
}

/// The diagram used to draw a widget. Every variant names the fields it reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// Radar/spider chart of one score per item.
    Radar {
        /// Collection drawn as axes.
        collection: String,
        /// Axis label field.
        label: String,
        /// Score field.
        value: String,
    },
    /// Gantt-like timeline.
    Timeline {
        /// Task collection.
        tasks: String,
        /// Bar label field.
        label: String,
        /// Start date field.
        start: String,
        /// End date field.
        end: String,
        /// Optional percent-complete field.
        progress: Option<String>,
        /// Optional dependency reference list.
        dependencies: Option<String>,
        /// Optional milestone markers.
        milestones: Option<MilestoneTrack>,
    },
    /// Four quadrants keyed by a four-option choice field.
    Quadrants {
        /// Entry collection.
        collection: String,
        /// Entry text field.
        label: String,
        /// Quadrant choice field.
        quadrant: String,
    },
    /// Row × column matrix whose cells live in a third collection.
    Grid {
        /// Row collection.
        rows: String,
        /// Row label field.
        row_label: String,
        /// Column collection.
        columns: String,
        /// Column label field.
        column_label: String,
        /// Cell collection.
        cells: String,
        /// Cell reference to its row.
        row_ref: String,
        /// Cell reference to its column.
        column_ref: String,
        /// Cell code field.
        code: String,
    },
    /// Indented tree built from a parent reference.
    Tree {
        /// Node collection.
        collection: String,
        /// Node label field.
        label: String,
        /// Parent reference field.
        parent: String,
    },
    /// Rows, optionally grouped by a choice field and scored.
    List {
        /// Row collection.
        collection: String,
        /// Row label field.
        label: String,
        /// Optional grouping choice field.
        group: Option<String>,
        /// Optional score field drawn as a bar.
        score: Option<String>,
    },
}

impl Layout {
    /// Every `(collection, field)` pair the layout reads.
    #[must_use]
    pub fn field_refs(&self) -> Vec<(&str, &str)> {
        match self {
            Self::Radar {
                collection,
                label,
                value,
            } => vec![
                (collection.as_str(), label.as_str()),
                (collection.as_str(), value.as_str()),
            ],
            Self::Timeline {
                tasks,
                label,
                start,
                end,
                progress,
                dependencies,
                milestones,
            } => {
                let tasks = tasks.as_str();
                let mut refs = vec![
                    (tasks, label.as_str()),
                    (tasks, start.as_str()),
                    (tasks, end.as_str()),
                ];
                refs.extend(progress.iter().map(|p| (tasks, p.as_str())));
                refs.extend(dependencies.iter().map(|d| (tasks, d.as_str())));
                if let Some(track) = milestones {
                    let c = track.collection.as_str();
                    refs.push((c, track.label.as_str()));
                    refs.push((c, track.date.as_str()));
                    refs.push((c, track.task.as_str()));
                }
                refs
            }
            Self::Quadrants {
                collection,
                label,
                quadrant,
            } => vec![
                (collection.as_str(), label.as_str()),
                (collection.as_str(), quadrant.as_str()),
            ],
            Self::Grid {
                rows,
                row_label,
                columns,
                column_label,
                cells,
                row_ref,
                column_ref,
                code,
            } => vec![
                (rows.as_str(), row_label.as_str()),
                (columns.as_str(), column_label.as_str()),
                (cells.as_str(), row_ref.as_str()),
                (cells.as_str(), column_ref.as_str()),
                (cells.as_str(), code.as_str()),
            ],
            Self::Tree {
                collection,
                label,
                parent,
            } => vec![
                (collection.as_str(), label.as_str()),
                (collection.as_str(), parent.as_str()),
            ],
            Self::List {
                collection,
                label,
                group,
                score,
            } => {
                let collection = collection.as_str();
                let mut refs = vec![(collection, label.as_str())];
                refs.extend(group.iter().map(|g| (collection, g.as_str())));
                refs.extend(score.iter().map(|s| (collection, s.as_str())));
                refs
            }
        }
    }
}

/// Complete declaration of one framework widget.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetSchema {
    /// Framework slug.
    pub slug: String,
    /// Widget title.
    pub title: LocalizedText,
    /// Collections in display/export order.
    pub collections: Vec<CollectionSchema>,
    /// Optional derived aggregate.
    pub aggregate: Option<AggregateSpec>,
    /// Diagram layout.
    pub layout: Layout,
}

impl WidgetSchema {
    /// Create a declaration without collections.
    #[must_use]
    pub fn new(slug: &str, title: LocalizedText, layout: Layout) -> Self {
        Self {
            slug: slug.to_string(),
            title,
            collections: Vec::new(),
            aggregate: None,
            layout,
        }
    }

    /// Append a collection.
    #[must_use]
    pub fn with_collection(mut self, collection: CollectionSchema) -> Self {
        self.collections.push(collection);
        self
    }

    /// Set the derived aggregate.
    #[must_use]
    pub fn with_aggregate(mut self, aggregate: AggregateSpec) -> Self {
        self.aggregate = Some(aggregate);
        self
    }

    /// Look up a collection declaration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownCollection`] if it is not declared.
    pub fn collection(&self, key: &str) -> CoreResult<&CollectionSchema> {
        self.collections
            .iter()
            .find(|c| c.key == key)
            .ok_or_else(|| CoreError::UnknownCollection(key.to_string()))
    }

    /// Fields anywhere in the schema that reference `target`, as
    /// `(collection, field)` pairs.
    pub fn references_to<'a>(
        &'a self,
        target: &'a str,
    ) -> impl Iterator<Item = (&'a CollectionSchema, &'a FieldDescriptor)> + 'a {
        self.collections.iter().flat_map(move |c| {
            c.fields
                .iter()
                .filter(move |f| f.kind.reference_target() == Some(target))
                .map(move |f| (c, f))
        })
    }

    /// Check the declaration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSchema`] describing the first problem found.
    pub fn validate(&self) -> CoreResult<()> {
        let invalid = |reason: String| CoreError::InvalidSchema {
            slug: self.slug.clone(),
            reason,
        };

        if self.collections.is_empty() {
            return Err(invalid("no collections declared".into()));
        }

        let mut collection_keys = HashSet::new();
        for collection in &self.collections {
            if !collection_keys.insert(collection.key.as_str()) {
                return Err(invalid(format!("duplicate collection '{}'", collection.key)));
            }
            let mut field_keys = HashSet::new();
            for field in &collection.fields {
                if field.key == "id" || !field_keys.insert(field.key.as_str()) {
                    return Err(invalid(format!(
                        "duplicate or reserved field '{}.{}'",
                        collection.key, field.key
                    )));
                }
                if let FieldKind::Choice { options } = &field.kind {
                    if options.is_empty() {
                        return Err(invalid(format!(
                            "choice '{}.{}' has no options",
                            collection.key, field.key
                        )));
                    }
                }
                if let Some(default) = &field.default {
                    field.check(default).map_err(|e| invalid(e.to_string()))?;
                }
            }
        }

        for collection in &self.collections {
            for field in &collection.fields {
                if let Some(target) = field.kind.reference_target() {
                    if !collection_keys.contains(target) {
                        return Err(invalid(format!(
                            "'{}.{}' references unknown collection '{target}'",
                            collection.key, field.key
                        )));
                    }
                }
            }
        }

        if let Some(aggregate) = &self.aggregate {
            let field = self
                .collection(&aggregate.collection)
                .and_then(|c| c.require_field(&aggregate.field))
                .map_err(|e| invalid(e.to_string()))?;
            if !matches!(field.kind, FieldKind::Number { .. }) {
                return Err(invalid(format!(
                    "aggregate '{}' reads non-number field '{}'",
                    aggregate.key, aggregate.field
                )));
            }
        }

        for (collection, field) in self.layout.field_refs() {
            self.collection(collection)
                .and_then(|c| c.require_field(field))
                .map_err(|e| invalid(format!("layout: {e}")))?;
        }

        Ok(())
    }
}
