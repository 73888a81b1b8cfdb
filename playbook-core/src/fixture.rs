//! Seed fixtures: JSON files that describe one hosted widget each.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::frameworks::Catalog;
use crate::lang::{Lang, LocalizedText};
use crate::widget::{Widget, WidgetProps};
use crate::CoreResult;

/// A widget seed as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetFixture {
    /// Widget identifier used by the host.
    pub widget_id: String,
    /// Framework slug.
    pub framework: String,
    /// Breadcrumb path shown in the shell header.
    #[serde(default)]
    pub breadcrumbs: Vec<LocalizedText>,
    /// Mount the widget read-only.
    #[serde(default)]
    pub read_only: bool,
    /// Seed record.
    #[serde(default)]
    pub initial_data: Option<serde_json::Value>,
}

impl WidgetFixture {
    /// Parse a fixture from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::Serialization`] on malformed JSON.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a fixture file.
    ///
    /// # Errors
    ///
    /// Returns an IO or serialization error.
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Read every `*.json` file in `dir`, in file-name order.
    ///
    /// # Errors
    ///
    /// Returns the first IO or serialization error.
    pub fn load_dir(dir: impl AsRef<Path>) -> CoreResult<Vec<Self>> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        paths
            .iter()
            .map(|path| {
                tracing::debug!("Loading fixture {}", path.display());
                Self::load(path)
            })
            .collect()
    }

    /// Mount the fixture as a widget.
    ///
    /// `force_read_only` overrides the fixture's own flag when set.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::UnknownFramework`] or a seed decoding error.
    pub fn mount(&self, catalog: &Catalog, lang: Lang, force_read_only: bool) -> CoreResult<Widget> {
        let schema = catalog.require(&self.framework)?;
        Widget::mount(
            &self.widget_id,
            schema,
            WidgetProps {
                lang,
                initial_data: self.initial_data.clone(),
                read_only: self.read_only || force_read_only,
            },
        )
    }
}
