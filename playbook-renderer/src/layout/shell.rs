//! The presentation shell drawn around a diagram.

use std::fmt::Write;

use playbook_core::{Controls, HeaderView, Lang, Shell, ShellView, WidgetRecord};

use super::{escape_xml, text, Diagram, CANVAS_WIDTH, MARGIN};

/// Height of the title and breadcrumb header.
pub const HEADER_HEIGHT: f64 = 84.0;

const BUTTON_WIDTH: f64 = 52.0;

/// Draw `shell` in its current state. The diagram is only laid out when the
/// shell is ready.
#[must_use]
pub fn draw(shell: &Shell, record: &WidgetRecord, lang: Lang) -> Diagram {
    match shell.present(lang, || super::draw(record, lang)) {
        ShellView::Loading { header } => {
            let mut svg = draw_header(&header);
            let cy = HEADER_HEIGHT + 60.0;
            let _ = write!(
                svg,
                "<circle class=\"spinner\" cx=\"{:.1}\" cy=\"{cy:.1}\" r=\"18\" fill=\"none\" stroke=\"#4e79a7\" stroke-width=\"4\" stroke-dasharray=\"80 40\"/>",
                CANVAS_WIDTH / 2.0,
            );
            let caption = match lang {
                Lang::Zh => "加载中…",
                Lang::En => "Loading…",
            };
            text(&mut svg, CANVAS_WIDTH / 2.0, cy + 44.0, 13.0, "#666", "middle", caption);
            Diagram {
                svg,
                height: HEADER_HEIGHT + 140.0,
            }
        }
        ShellView::Error { header, message } => {
            let mut svg = draw_header(&header);
            let _ = write!(
                svg,
                "<rect class=\"error-panel\" x=\"{MARGIN}\" y=\"{HEADER_HEIGHT}\" width=\"{:.1}\" height=\"64\" fill=\"#fdecea\" stroke=\"#e15759\" rx=\"6\"/>",
                CANVAS_WIDTH - MARGIN * 2.0,
            );
            text(&mut svg, MARGIN + 16.0, HEADER_HEIGHT + 38.0, 13.0, "#b3261e", "start", &message);
            Diagram {
                svg,
                height: HEADER_HEIGHT + 64.0 + MARGIN,
            }
        }
        ShellView::Ready {
            header,
            controls,
            body,
        } => {
            let mut svg = draw_header(&header);
            draw_controls(&mut svg, &controls, lang);
            let _ = write!(
                svg,
                "<g transform=\"translate(0,{HEADER_HEIGHT})\">{}</g>",
                body.svg
            );
            Diagram {
                svg,
                height: HEADER_HEIGHT + body.height,
            }
        }
    }
}

fn draw_header(header: &HeaderView) -> String {
    let mut svg = String::with_capacity(4096);
    if !header.breadcrumbs.is_empty() {
        text(&mut svg, MARGIN, 26.0, 11.0, "#888", "start", &header.breadcrumbs.join(" / "));
    }
    let _ = write!(
        svg,
        "<text x=\"{MARGIN}\" y=\"56\" font-size=\"22\" font-weight=\"bold\" fill=\"#222\" font-family=\"sans-serif\">{}</text>",
        escape_xml(&header.title)
    );
    let _ = write!(
        svg,
        "<line x1=\"{MARGIN}\" y1=\"72\" x2=\"{:.1}\" y2=\"72\" stroke=\"#e5e5e5\"/>",
        CANVAS_WIDTH - MARGIN
    );
    svg
}

fn draw_controls(svg: &mut String, controls: &Controls, lang: Lang) {
    let mut x = CANVAS_WIDTH - MARGIN;
    for format in controls.exports.iter().rev() {
        x -= BUTTON_WIDTH;
        let _ = write!(
            svg,
            "<rect class=\"export-button\" x=\"{x:.1}\" y=\"36\" width=\"{:.1}\" height=\"24\" fill=\"#f4f4f4\" stroke=\"#ccc\" rx=\"4\"/>",
            BUTTON_WIDTH - 6.0,
        );
        let label = format.extension().to_uppercase();
        text(svg, x + (BUTTON_WIDTH - 6.0) / 2.0, 52.0, 11.0, "#333", "middle", &label);
    }

    let badge = match (controls.read_only, controls.edit_mode, lang) {
        (true, _, Lang::Zh) => Some("只读"),
        (true, _, Lang::En) => Some("Read-only"),
        (false, true, Lang::Zh) => Some("编辑中"),
        (false, true, Lang::En) => Some("Editing"),
        (false, false, _) => None,
    };
    if let Some(badge) = badge {
        text(svg, x - 12.0, 52.0, 11.0, "#888", "end", badge);
    }
}
