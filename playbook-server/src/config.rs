//! Command-line and environment configuration.

use std::path::PathBuf;

use clap::Parser;
use playbook_renderer::ExportConfig;

/// Default port for the playbook server.
pub const DEFAULT_PORT: u16 = 9474;

/// Largest accepted export scale factor.
pub const MAX_EXPORT_SCALE: f64 = 8.0;

/// Server configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "playbook-server", version, about = "Host editable framework widgets")]
pub struct ServerConfig {
    /// Port to bind on 127.0.0.1.
    #[arg(long, env = "PLAYBOOK_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Directory of widget fixture files.
    #[arg(long, env = "PLAYBOOK_FIXTURES", default_value = "fixtures")]
    pub fixtures: PathBuf,

    /// Mount every widget read-only.
    #[arg(long, env = "PLAYBOOK_READ_ONLY")]
    pub read_only: bool,

    /// Scale factor for PNG and SVG exports.
    #[arg(long, env = "PLAYBOOK_EXPORT_SCALE", default_value_t = 2.0, value_parser = parse_scale)]
    pub export_scale: f64,
}

impl ServerConfig {
    /// Exporter settings derived from the flags.
    #[must_use]
    pub fn export_config(&self) -> ExportConfig {
        ExportConfig {
            scale: self.export_scale,
            ..ExportConfig::default()
        }
    }
}

fn parse_scale(raw: &str) -> Result<f64, String> {
    let scale: f64 = raw
        .parse()
        .map_err(|e| format!("invalid scale '{raw}': {e}"))?;
    if scale > 0.0 && scale <= MAX_EXPORT_SCALE {
        Ok(scale)
    } else {
        Err(format!("scale must be in (0, {MAX_EXPORT_SCALE}]"))
    }
}
