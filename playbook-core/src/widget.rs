//! Widget instances: a record, its mount properties and a change listener.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::item::ItemId;
use crate::lang::Lang;
use crate::record::{Edit, WidgetRecord};
use crate::schema::WidgetSchema;
use crate::value::Patch;
use crate::view::RecordView;
use crate::{CoreError, CoreResult};

/// Callback invoked with the full new record after every applied mutation.
pub type ChangeListener = Box<dyn Fn(&WidgetRecord) + Send + Sync>;

/// Properties supplied by the hosting page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WidgetProps {
    /// Display language.
    #[serde(default)]
    pub lang: Lang,
    /// Seed record. The widget starts empty when absent.
    #[serde(default)]
    pub initial_data: Option<serde_json::Value>,
    /// Reject every mutation.
    #[serde(default)]
    pub read_only: bool,
}

/// What a mutation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationOutcome {
    /// A new record was committed.
    Applied,
    /// The target item does not exist; nothing changed.
    Unchanged,
}

/// One editable diagram instance.
pub struct Widget {
    id: String,
    props: WidgetProps,
    record: WidgetRecord,
    on_change: Option<ChangeListener>,
}

impl Widget {
    /// Mount a widget, decoding `props.initial_data` when present.
    ///
    /// # Errors
    ///
    /// Returns any [`CoreError`] raised while decoding the seed record.
    pub fn mount(id: &str, schema: Arc<WidgetSchema>, props: WidgetProps) -> CoreResult<Self> {
        let record = match &props.initial_data {
            Some(data) => WidgetRecord::from_json(schema, data)?,
            None => WidgetRecord::new(schema),
        };
        tracing::debug!(
            "Mounted widget {id} ({}) with {} items",
            record.schema().slug,
            record.item_count()
        );
        Ok(Self {
            id: id.to_string(),
            props,
            record,
            on_change: None,
        })
    }

    /// Set the change notification callback.
    pub fn set_on_change<F>(&mut self, callback: F)
    where
        F: Fn(&WidgetRecord) + Send + Sync + 'static,
    {
        self.on_change = Some(Box::new(callback));
    }

    /// Widget identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Stable id of the element the widget surface is drawn into.
    #[must_use]
    pub fn element_id(&self) -> String {
        format!("widget-{}", self.id)
    }

    /// Mount properties.
    #[must_use]
    pub fn props(&self) -> &WidgetProps {
        &self.props
    }

    /// Display language.
    #[must_use]
    pub fn lang(&self) -> Lang {
        self.props.lang
    }

    /// Change the display language. Records are language independent, so
    /// this is not a mutation and does not notify.
    pub fn set_lang(&mut self, lang: Lang) {
        self.props.lang = lang;
    }

    /// Whether mutations are rejected.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.props.read_only
    }

    /// The schema the widget follows.
    #[must_use]
    pub fn schema(&self) -> &Arc<WidgetSchema> {
        self.record.schema()
    }

    /// The current record.
    #[must_use]
    pub fn record(&self) -> &WidgetRecord {
        &self.record
    }

    /// Localized read view of the current record.
    #[must_use]
    pub fn view(&self, lang: Lang) -> RecordView {
        self.record.view(lang)
    }

    /// Shallow-merge `patch` into an item.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ReadOnly`] for read-only widgets, or any schema
    /// error raised by the patch.
    pub fn update(
        &mut self,
        collection: &str,
        id: &ItemId,
        patch: &Patch,
    ) -> CoreResult<MutationOutcome> {
        self.ensure_writable()?;
        let edit = self.record.updated(collection, id, patch)?;
        Ok(self.commit(edit, "update", collection, id))
    }

    /// Append a new item built from the template and `seed`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ReadOnly`] for read-only widgets, or any schema
    /// error raised by the seed.
    pub fn add(&mut self, collection: &str, seed: &Patch) -> CoreResult<ItemId> {
        self.ensure_writable()?;
        let (record, id) = self.record.added(collection, seed)?;
        self.commit(Edit::Applied(record), "add", collection, &id);
        Ok(id)
    }

    /// Remove an item and everything that depends on it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ReadOnly`] for read-only widgets, or
    /// [`CoreError::UnknownCollection`].
    pub fn remove(&mut self, collection: &str, id: &ItemId) -> CoreResult<MutationOutcome> {
        self.ensure_writable()?;
        let edit = self.record.removed(collection, id)?;
        Ok(self.commit(edit, "remove", collection, id))
    }

    fn ensure_writable(&self) -> CoreResult<()> {
        if self.props.read_only {
            return Err(CoreError::ReadOnly(self.id.clone()));
        }
        Ok(())
    }

    fn commit(&mut self, edit: Edit, op: &str, collection: &str, id: &ItemId) -> MutationOutcome {
        match edit {
            Edit::Applied(record) => {
                tracing::debug!("Widget {}: {op} {collection}/{id}", self.id);
                self.record = record;
                if let Some(ref callback) = self.on_change {
                    callback(&self.record);
                }
                MutationOutcome::Applied
            }
            Edit::Unchanged => {
                tracing::trace!("Widget {}: {op} {collection}/{id} not found, ignored", self.id);
                MutationOutcome::Unchanged
            }
        }
    }
}

impl fmt::Debug for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Widget")
            .field("id", &self.id)
            .field("props", &self.props)
            .field("record", &self.record)
            .field("on_change", &self.on_change.is_some())
            .finish()
    }
}
