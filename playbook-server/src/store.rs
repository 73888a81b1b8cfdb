//! Hosted widget storage.
//!
//! Owns every mounted [`Widget`] behind one lock. Mutations hold the write
//! lock for a single edit; exports copy a [`Surface`] out under the read lock
//! and render after releasing it.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use playbook_core::{
    decode_patch, Catalog, Controls, CoreError, ItemId, Lang, LocalizedText, MutationOutcome,
    RecordView, Shell, ShellView, Widget, WidgetFixture,
};
use playbook_renderer::{Surface, SurfaceLookup};
use serde::Serialize;
use serde_json::Value;

use crate::metrics;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No widget is hosted under the id.
    #[error("Widget not found: {0}")]
    WidgetNotFound(String),
    /// The widget rejected the operation.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

struct Hosted {
    widget: Widget,
    breadcrumbs: Vec<LocalizedText>,
}

impl Hosted {
    fn shell(&self) -> Shell {
        Shell::new(self.widget.schema().title.clone())
            .with_breadcrumbs(self.breadcrumbs.clone())
            .with_controls(Controls {
                read_only: self.widget.is_read_only(),
                ..Controls::default()
            })
    }
}

/// Listing entry for one hosted widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WidgetSummary {
    /// Widget id.
    pub id: String,
    /// Element id used for exports.
    pub element_id: String,
    /// Framework slug.
    pub framework: String,
    /// Localized title.
    pub title: String,
    /// Whether mutations are rejected.
    pub read_only: bool,
    /// Items across all collections.
    pub item_count: usize,
}

/// Thread-safe widget storage shared across HTTP handlers.
#[derive(Clone, Default)]
pub struct WidgetStore {
    widgets: Arc<RwLock<HashMap<String, Hosted>>>,
}

impl WidgetStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount every fixture.
    ///
    /// # Errors
    ///
    /// Returns the first fixture that fails to mount.
    pub fn from_fixtures(
        fixtures: &[WidgetFixture],
        catalog: &Catalog,
        force_read_only: bool,
    ) -> StoreResult<Self> {
        let store = Self::new();
        for fixture in fixtures {
            let widget = fixture.mount(catalog, Lang::default(), force_read_only)?;
            store.insert(widget, fixture.breadcrumbs.clone());
        }
        tracing::info!("Hosting {} widgets", store.len());
        Ok(store)
    }

    /// Host a widget, replacing any widget with the same id.
    pub fn insert(&self, mut widget: Widget, breadcrumbs: Vec<LocalizedText>) {
        let id = widget.id().to_string();
        metrics::set_widget_items(&id, widget.record().item_count());
        let gauge_id = id.clone();
        widget.set_on_change(move |record| metrics::set_widget_items(&gauge_id, record.item_count()));

        let mut widgets = self
            .widgets
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        widgets.insert(id, Hosted { widget, breadcrumbs });
    }

    /// Number of hosted widgets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.widgets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no widget is hosted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Summaries of every hosted widget, sorted by id.
    #[must_use]
    pub fn summaries(&self, lang: Lang) -> Vec<WidgetSummary> {
        let widgets = self.widgets.read().unwrap_or_else(PoisonError::into_inner);
        let mut summaries: Vec<WidgetSummary> = widgets
            .values()
            .map(|hosted| {
                let widget = &hosted.widget;
                WidgetSummary {
                    id: widget.id().to_string(),
                    element_id: widget.element_id(),
                    framework: widget.schema().slug.clone(),
                    title: widget.schema().title.resolve(lang).to_string(),
                    read_only: widget.is_read_only(),
                    item_count: widget.record().item_count(),
                }
            })
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    /// The shell view of a widget. `lang` defaults to the widget's own.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WidgetNotFound`] for an unknown id.
    pub fn view(&self, widget_id: &str, lang: Option<Lang>) -> StoreResult<ShellView<RecordView>> {
        self.read(widget_id, |hosted| {
            let lang = lang.unwrap_or_else(|| hosted.widget.lang());
            hosted.shell().present(lang, || hosted.widget.view(lang))
        })
    }

    /// The raw record JSON of a widget.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WidgetNotFound`] for an unknown id.
    pub fn record_json(&self, widget_id: &str) -> StoreResult<Value> {
        self.read(widget_id, |hosted| hosted.widget.record().to_json())
    }

    /// The display language a widget was mounted with.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WidgetNotFound`] for an unknown id.
    pub fn lang(&self, widget_id: &str) -> StoreResult<Lang> {
        self.read(widget_id, |hosted| hosted.widget.lang())
    }

    /// Add an item built from a JSON seed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WidgetNotFound`] or the widget's rejection.
    pub fn add(&self, widget_id: &str, collection: &str, seed: &Value) -> StoreResult<ItemId> {
        self.write(widget_id, |widget| {
            let seed = decode_patch(widget.schema().collection(collection)?, seed)?;
            widget.add(collection, &seed)
        })
    }

    /// Merge a JSON patch into an item.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WidgetNotFound`] or the widget's rejection.
    pub fn update(
        &self,
        widget_id: &str,
        collection: &str,
        item_id: &ItemId,
        patch: &Value,
    ) -> StoreResult<MutationOutcome> {
        self.write(widget_id, |widget| {
            let patch = decode_patch(widget.schema().collection(collection)?, patch)?;
            widget.update(collection, item_id, &patch)
        })
    }

    /// Remove an item and its dependents.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WidgetNotFound`] or the widget's rejection.
    pub fn remove(
        &self,
        widget_id: &str,
        collection: &str,
        item_id: &ItemId,
    ) -> StoreResult<MutationOutcome> {
        self.write(widget_id, |widget| widget.remove(collection, item_id))
    }

    /// Snapshot a widget's shell and record for rendering.
    #[must_use]
    pub fn snapshot(&self, widget_id: &str) -> Option<Surface> {
        self.read(widget_id, |hosted| Surface {
            shell: hosted.shell(),
            record: hosted.widget.record().clone(),
        })
        .ok()
    }

    fn read<T>(&self, widget_id: &str, f: impl FnOnce(&Hosted) -> T) -> StoreResult<T> {
        let widgets = self.widgets.read().unwrap_or_else(PoisonError::into_inner);
        widgets
            .get(widget_id)
            .map(f)
            .ok_or_else(|| StoreError::WidgetNotFound(widget_id.to_string()))
    }

    fn write<T>(
        &self,
        widget_id: &str,
        f: impl FnOnce(&mut Widget) -> Result<T, CoreError>,
    ) -> StoreResult<T> {
        let mut widgets = self
            .widgets
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let hosted = widgets
            .get_mut(widget_id)
            .ok_or_else(|| StoreError::WidgetNotFound(widget_id.to_string()))?;
        Ok(f(&mut hosted.widget)?)
    }
}

impl SurfaceLookup for WidgetStore {
    fn surface(&self, element_id: &str) -> Option<Surface> {
        self.snapshot(element_id.strip_prefix("widget-")?)
    }
}

impl std::fmt::Debug for WidgetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetStore")
            .field("widgets", &self.len())
            .finish()
    }
}
