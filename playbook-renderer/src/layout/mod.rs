//! SVG diagram layouts.
//!
//! Every layout draws into a fixed-width canvas and reports the height it
//! used. Items whose references dangle are left out of the drawing.

pub mod grid;
pub mod list;
pub mod quadrants;
pub mod radar;
pub mod shell;
pub mod timeline;
pub mod tree;

use std::fmt::Write;

use playbook_core::{FieldKind, Item, Lang, Layout, WidgetRecord};

/// Width of the drawing canvas in SVG user units.
pub const CANVAS_WIDTH: f64 = 800.0;

pub(crate) const MARGIN: f64 = 24.0;

pub(crate) const PALETTE: [&str; 6] = [
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc948",
];

/// An SVG fragment and the height it occupies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagram {
    /// SVG markup without the surrounding `<svg>` element.
    pub svg: String,
    /// Height in SVG user units.
    pub height: f64,
}

/// Draw the record's diagram according to its schema layout.
#[must_use]
pub fn draw(record: &WidgetRecord, lang: Lang) -> Diagram {
    match &record.schema().layout {
        Layout::Radar {
            collection,
            label,
            value,
        } => radar::draw(record, lang, collection, label, value),
        Layout::Timeline {
            tasks,
            label,
            start,
            end,
            progress,
            dependencies,
            milestones,
        } => timeline::draw(
            record,
            lang,
            &timeline::TimelineKeys {
                tasks,
                label,
                start,
                end,
                progress: progress.as_deref(),
                dependencies: dependencies.as_deref(),
                milestones: milestones.as_ref(),
            },
        ),
        Layout::Quadrants {
            collection,
            label,
            quadrant,
        } => quadrants::draw(record, lang, collection, label, quadrant),
        Layout::Grid {
            rows,
            row_label,
            columns,
            column_label,
            cells,
            row_ref,
            column_ref,
            code,
        } => grid::draw(
            record,
            lang,
            &grid::GridKeys {
                rows,
                row_label,
                columns,
                column_label,
                cells,
                row_ref,
                column_ref,
                code,
            },
        ),
        Layout::Tree {
            collection,
            label,
            parent,
        } => tree::draw(record, lang, collection, label, parent),
        Layout::List {
            collection,
            label,
            group,
            score,
        } => list::draw(
            record,
            lang,
            collection,
            label,
            group.as_deref(),
            score.as_deref(),
        ),
    }
}

/// Items of a collection, empty when it is undeclared.
pub(crate) fn items<'a>(record: &'a WidgetRecord, collection: &str) -> Vec<&'a Item> {
    record
        .collection(collection)
        .map(|c| c.iter().collect())
        .unwrap_or_default()
}

/// Upper editor bound of a number field, used to scale bars and axes.
pub(crate) fn number_max(record: &WidgetRecord, collection: &str, field: &str) -> f64 {
    record
        .schema()
        .collection(collection)
        .ok()
        .and_then(|c| c.field(field))
        .and_then(|f| match f.kind {
            FieldKind::Number { max, .. } if max > 0.0 => Some(max),
            _ => None,
        })
        .unwrap_or(5.0)
}

/// Declared options of a choice field as `(value, localized label)`.
pub(crate) fn choice_options(
    record: &WidgetRecord,
    collection: &str,
    field: &str,
    lang: Lang,
) -> Vec<(String, String)> {
    record
        .schema()
        .collection(collection)
        .ok()
        .and_then(|c| c.field(field))
        .map(|f| match &f.kind {
            FieldKind::Choice { options } => options
                .iter()
                .map(|o| (o.value.clone(), o.label.resolve(lang).to_string()))
                .collect(),
            _ => Vec::new(),
        })
        .unwrap_or_default()
}

/// "No data" placeholder.
pub(crate) fn empty(lang: Lang) -> Diagram {
    let message = match lang {
        Lang::Zh => "暂无数据",
        Lang::En => "No data",
    };
    let mut svg = String::new();
    text(&mut svg, CANVAS_WIDTH / 2.0, 48.0, 14.0, "#999", "middle", message);
    Diagram { svg, height: 80.0 }
}

/// Append a `<text>` element.
pub(crate) fn text(svg: &mut String, x: f64, y: f64, size: f64, fill: &str, anchor: &str, content: &str) {
    let escaped = escape_xml(content);
    let _ = write!(
        svg,
        "<text x=\"{x:.1}\" y=\"{y:.1}\" font-size=\"{size}\" fill=\"{fill}\" text-anchor=\"{anchor}\" font-family=\"sans-serif\">{escaped}</text>",
    );
}

/// Escape special XML characters.
pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
