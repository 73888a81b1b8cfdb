//! Export error types.

use playbook_core::ExportFormat;
use thiserror::Error;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors that can occur while exporting a widget.
#[derive(Debug, Error)]
pub enum ExportError {
    /// No widget surface is mounted under the element id.
    #[error("No widget surface with element id '{0}'")]
    MissingElement(String),

    /// The generated SVG could not be parsed.
    #[error("SVG parsing failed: {0}")]
    Svg(String),

    /// Rasterization or PNG encoding failed.
    #[error("Rasterization failed: {0}")]
    Raster(String),

    /// The format is not compiled into this build.
    #[error("Export format not supported in this build: {0}")]
    Unsupported(ExportFormat),
}
