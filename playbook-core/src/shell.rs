//! Presentation shell: the wrapper drawn around every widget.
//!
//! The shell is a three-state display switch. The host picks the state on
//! every render; there are no transitions to guard.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::lang::{Lang, LocalizedText};

/// Export targets offered by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Comma-separated table.
    Csv,
    /// Raster snapshot.
    Png,
    /// Vector snapshot.
    Svg,
}

impl ExportFormat {
    /// All formats in button order.
    pub const ALL: [Self; 3] = [Self::Csv, Self::Png, Self::Svg];

    /// File extension.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }

    /// MIME type of the artifact.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv;charset=utf-8",
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "png" => Ok(Self::Png),
            "svg" => Ok(Self::Svg),
            _ => Err(format!("Unknown export format: {s}")),
        }
    }
}

/// Which of the three shell states applies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ShellState {
    /// Show a spinner.
    Loading,
    /// Show an error panel.
    Error(String),
    /// Show the widget body.
    #[default]
    Ready,
}

/// Action controls in the shell header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controls {
    /// Whether the edit-mode toggle is on.
    pub edit_mode: bool,
    /// Whether editing is disabled altogether.
    pub read_only: bool,
    /// Export buttons.
    pub exports: Vec<ExportFormat>,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            edit_mode: false,
            read_only: false,
            exports: ExportFormat::ALL.to_vec(),
        }
    }
}

/// The shell declaration.
#[derive(Debug, Clone, Default)]
pub struct Shell {
    /// Widget title.
    pub title: LocalizedText,
    /// Breadcrumb path labels.
    pub breadcrumbs: Vec<LocalizedText>,
    /// Display state.
    pub state: ShellState,
    /// Header controls.
    pub controls: Controls,
}

/// Resolved header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderView {
    /// Title.
    pub title: String,
    /// Breadcrumb labels.
    pub breadcrumbs: Vec<String>,
}

/// What the shell renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ShellView<B> {
    /// Spinner placeholder.
    Loading {
        /// Header shown above the spinner.
        header: HeaderView,
    },
    /// Error panel.
    Error {
        /// Header shown above the panel.
        header: HeaderView,
        /// Error message.
        message: String,
    },
    /// Header, controls and body.
    Ready {
        /// Header.
        header: HeaderView,
        /// Controls.
        controls: Controls,
        /// Widget body.
        body: B,
    },
}

impl<B> ShellView<B> {
    /// The header, whatever the state.
    #[must_use]
    pub fn header(&self) -> &HeaderView {
        match self {
            Self::Loading { header } | Self::Error { header, .. } | Self::Ready { header, .. } => {
                header
            }
        }
    }

    /// The body, only in the ready state.
    #[must_use]
    pub fn body(&self) -> Option<&B> {
        match self {
            Self::Ready { body, .. } => Some(body),
            _ => None,
        }
    }
}

impl Shell {
    /// Create a ready shell.
    #[must_use]
    pub fn new(title: LocalizedText) -> Self {
        Self {
            title,
            ..Self::default()
        }
    }

    /// Set breadcrumbs.
    #[must_use]
    pub fn with_breadcrumbs(mut self, breadcrumbs: Vec<LocalizedText>) -> Self {
        self.breadcrumbs = breadcrumbs;
        self
    }

    /// Set the display state.
    #[must_use]
    pub fn with_state(mut self, state: ShellState) -> Self {
        self.state = state;
        self
    }

    /// Set the controls.
    #[must_use]
    pub fn with_controls(mut self, controls: Controls) -> Self {
        self.controls = controls;
        self
    }

    /// Resolve the header for `lang`.
    #[must_use]
    pub fn header(&self, lang: Lang) -> HeaderView {
        HeaderView {
            title: self.title.resolve(lang).to_string(),
            breadcrumbs: self
                .breadcrumbs
                .iter()
                .map(|b| b.resolve(lang).to_string())
                .collect(),
        }
    }

    /// Render the shell. `body` is only called in the ready state.
    #[must_use]
    pub fn present<B>(&self, lang: Lang, body: impl FnOnce() -> B) -> ShellView<B> {
        let header = self.header(lang);
        match &self.state {
            ShellState::Loading => ShellView::Loading { header },
            ShellState::Error(message) => ShellView::Error {
                header,
                message: message.clone(),
            },
            ShellState::Ready => ShellView::Ready {
                header,
                controls: self.controls.clone(),
                body: body(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::lang::label;

    #[test]
    fn test_body_only_built_when_ready() {
        let built = Cell::new(0);
        let shell = Shell::new(label("波特五力", "Porter's Five Forces"));

        let loading = shell
            .clone()
            .with_state(ShellState::Loading)
            .present(Lang::En, || built.set(built.get() + 1));
        assert!(loading.body().is_none());

        let error = shell
            .clone()
            .with_state(ShellState::Error("boom".into()))
            .present(Lang::En, || built.set(built.get() + 1));
        assert!(matches!(error, ShellView::Error { ref message, .. } if message == "boom"));
        assert_eq!(built.get(), 0);

        let ready = shell.present(Lang::En, || built.set(built.get() + 1));
        assert!(ready.body().is_some());
        assert_eq!(ready.header().title, "Porter's Five Forces");
        assert_eq!(built.get(), 1);
    }

    #[test]
    fn test_breadcrumbs_resolve() {
        let shell = Shell::new(label("甘特图", "Gantt"))
            .with_breadcrumbs(vec![label("框架", "Frameworks"), LocalizedText::new("项目管理")]);
        assert_eq!(shell.header(Lang::En).breadcrumbs, ["Frameworks", "项目管理"]);
    }

    #[test]
    fn test_export_format_parse() {
        assert_eq!("PNG".parse::<ExportFormat>(), Ok(ExportFormat::Png));
        assert!("pdf".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::Csv.extension(), "csv");
    }

    #[test]
    fn test_view_serializes_state_tag() {
        let view = Shell::new(LocalizedText::new("x"))
            .with_state(ShellState::Loading)
            .present(Lang::Zh, || ());
        let json = serde_json::to_value(&view).expect("json");
        assert_eq!(json["state"], "loading");
    }
}
