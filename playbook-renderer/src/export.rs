//! Widget export boundary.
//!
//! Looks up a mounted widget surface by element id and turns it into a
//! downloadable [`Artifact`]: a CSV table, an SVG snapshot of the shell and
//! diagram, or a PNG rasterized from that SVG through resvg/tiny-skia.
//!
//! Every failure is reported to an [`AlertSink`] before it is returned.

use std::fmt::Write;
use std::sync::Arc;

use base64::Engine;
use playbook_core::{ExportFormat, Lang, Shell, WidgetRecord};
use serde::{Deserialize, Serialize};

use crate::csv::export_csv;
use crate::error::{ExportError, ExportResult};
use crate::layout::{shell, CANVAS_WIDTH};

/// Configuration for widget export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Scale factor applied to PNG and SVG output (default: 2.0).
    pub scale: f64,
    /// Background color as RGBA bytes.
    pub background: [u8; 4],
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            scale: 2.0,
            background: [255, 255, 255, 255],
        }
    }
}

/// Receives user-facing export failure messages.
pub trait AlertSink: Send + Sync {
    /// Show `message` to the person who asked for the export.
    fn alert(&self, message: &str);
}

/// Alert sink that logs at `error` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn alert(&self, message: &str) {
        tracing::error!("{message}");
    }
}

/// A widget as drawn on the page: its shell and its current record.
#[derive(Debug, Clone)]
pub struct Surface {
    /// Presentation shell.
    pub shell: Shell,
    /// Record snapshot.
    pub record: WidgetRecord,
}

/// Finds mounted widget surfaces by element id.
pub trait SurfaceLookup {
    /// The surface mounted under `element_id`, if any.
    fn surface(&self, element_id: &str) -> Option<Surface>;
}

/// A finished export ready for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Download filename, `{slug}-{YYYYMMDD-HHMMSS}.{ext}`.
    pub filename: String,
    /// MIME type.
    pub mime_type: &'static str,
    /// File content.
    pub bytes: Vec<u8>,
}

impl Artifact {
    /// Wrap `bytes` with a timestamped filename for `slug`.
    #[must_use]
    pub fn new(slug: &str, format: ExportFormat, bytes: Vec<u8>) -> Self {
        Self {
            filename: timestamped_filename(slug, format),
            mime_type: format.mime_type(),
            bytes,
        }
    }

    /// Encode the artifact as a `data:` URI.
    #[must_use]
    pub fn data_url(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{encoded}", self.mime_type)
    }
}

/// `{slug}-{YYYYMMDD-HHMMSS}.{ext}` in local time.
#[must_use]
pub fn timestamped_filename(slug: &str, format: ExportFormat) -> String {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    format!("{slug}-{stamp}.{}", format.extension())
}

/// Exports widget surfaces.
pub struct WidgetExporter {
    config: ExportConfig,
    alerts: Arc<dyn AlertSink>,
    #[cfg(feature = "png")]
    fontdb: Arc<usvg::fontdb::Database>,
}

impl WidgetExporter {
    /// Create an exporter that alerts through `tracing`.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self::with_alerts(config, Arc::new(TracingAlertSink))
    }

    /// Create an exporter with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ExportConfig::default())
    }

    /// Create an exporter with a custom alert sink.
    #[must_use]
    pub fn with_alerts(config: ExportConfig, alerts: Arc<dyn AlertSink>) -> Self {
        Self {
            config,
            alerts,
            #[cfg(feature = "png")]
            fontdb: Arc::new(load_fonts()),
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Export the surface mounted under `element_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::MissingElement`] when nothing is mounted under
    /// the id, or any rendering error. The alert sink has already been told
    /// about the failure when this returns `Err`.
    pub fn export(
        &self,
        lookup: &dyn SurfaceLookup,
        element_id: &str,
        format: ExportFormat,
        lang: Lang,
    ) -> ExportResult<Artifact> {
        let result = lookup
            .surface(element_id)
            .ok_or_else(|| ExportError::MissingElement(element_id.to_string()))
            .and_then(|surface| self.export_surface(&surface, format, lang));

        match result {
            Ok(artifact) => {
                tracing::info!(
                    "Exported {element_id} as {format} ({} bytes)",
                    artifact.bytes.len()
                );
                Ok(artifact)
            }
            Err(e) => {
                let message = match lang {
                    Lang::Zh => format!("导出失败：{e}"),
                    Lang::En => format!("Export failed: {e}"),
                };
                self.alerts.alert(&message);
                Err(e)
            }
        }
    }

    /// Export a surface that is already at hand.
    ///
    /// # Errors
    ///
    /// Returns any rendering error. No alert is raised.
    pub fn export_surface(
        &self,
        surface: &Surface,
        format: ExportFormat,
        lang: Lang,
    ) -> ExportResult<Artifact> {
        let slug = &surface.record.schema().slug;
        let bytes = match format {
            ExportFormat::Csv => export_csv(&surface.record, lang).into_bytes(),
            ExportFormat::Svg => self.render_svg(surface, lang).into_bytes(),
            ExportFormat::Png => self.png_bytes(surface, lang)?,
        };
        Ok(Artifact::new(slug, format, bytes))
    }

    /// Render the shell and diagram as a standalone SVG document.
    #[must_use]
    pub fn render_svg(&self, surface: &Surface, lang: Lang) -> String {
        let diagram = shell::draw(&surface.shell, &surface.record, lang);
        let scale = self.config.scale;
        let (view_w, view_h) = (CANVAS_WIDTH, diagram.height.max(1.0));
        let (out_w, out_h) = ((view_w * scale).round(), (view_h * scale).round());

        let mut svg = String::with_capacity(diagram.svg.len() + 256);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{out_w}\" height=\"{out_h}\" viewBox=\"0 0 {view_w} {view_h}\">",
        );

        let bg = &self.config.background;
        let bg_alpha = f64::from(bg[3]) / 255.0;
        let _ = write!(
            svg,
            "<rect width=\"100%\" height=\"100%\" fill=\"rgba({},{},{},{})\"/>",
            bg[0], bg[1], bg[2], bg_alpha,
        );

        svg.push_str(&diagram.svg);
        svg.push_str("</svg>");
        svg
    }

    /// Rasterize the surface to PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the SVG cannot be parsed or the pixmap cannot be
    /// allocated or encoded.
    #[cfg(feature = "png")]
    pub fn render_png(&self, surface: &Surface, lang: Lang) -> ExportResult<Vec<u8>> {
        let svg = self.render_svg(surface, lang);
        let pixmap = self.rasterize_svg(&svg)?;
        pixmap
            .encode_png()
            .map_err(|e| ExportError::Raster(format!("PNG encoding failed: {e}")))
    }

    #[cfg(feature = "png")]
    fn png_bytes(&self, surface: &Surface, lang: Lang) -> ExportResult<Vec<u8>> {
        self.render_png(surface, lang)
    }

    #[cfg(not(feature = "png"))]
    #[allow(clippy::unused_self)]
    fn png_bytes(&self, _surface: &Surface, _lang: Lang) -> ExportResult<Vec<u8>> {
        Err(ExportError::Unsupported(ExportFormat::Png))
    }

    #[cfg(feature = "png")]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn rasterize_svg(&self, svg: &str) -> ExportResult<tiny_skia::Pixmap> {
        let mut opt = usvg::Options::default();
        opt.fontdb = Arc::clone(&self.fontdb);
        let tree = usvg::Tree::from_str(svg, &opt).map_err(|e| ExportError::Svg(e.to_string()))?;

        let px_w = tree.size().width().round() as u32;
        let px_h = tree.size().height().round() as u32;

        let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
            .ok_or_else(|| ExportError::Raster("Failed to create pixmap".to_string()))?;
        let [r, g, b, a] = self.config.background;
        pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, a));

        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
        Ok(pixmap)
    }
}

impl Default for WidgetExporter {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for WidgetExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetExporter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "png")]
fn load_fonts() -> usvg::fontdb::Database {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    tracing::debug!("Loaded {} font faces for rasterization", db.len());
    db
}
