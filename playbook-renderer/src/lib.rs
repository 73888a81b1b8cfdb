//! # Playbook Renderer
//!
//! Export adapters for playbook widgets.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ WidgetRecord │ ─▶ │  RecordView  │ ─▶ │     CSV      │
//! └──────────────┘    └──────────────┘    └──────────────┘
//!        │
//!        ▼
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ Shell + Lay- │ ─▶ │     SVG      │ ─▶ │ PNG (resvg)  │
//! │ out diagram  │    │              │    │              │
//! └──────────────┘    └──────────────┘    └──────────────┘
//! ```
//!
//! Rasterization lives behind the default `png` feature.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod csv;
pub mod error;
pub mod export;
pub mod layout;

pub use csv::{escape_field, export_csv, split_line, CsvTable};
pub use error::{ExportError, ExportResult};
pub use export::{
    timestamped_filename, AlertSink, Artifact, ExportConfig, Surface, SurfaceLookup,
    TracingAlertSink, WidgetExporter,
};
pub use layout::{draw, Diagram, CANVAS_WIDTH};

/// Playbook renderer version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
