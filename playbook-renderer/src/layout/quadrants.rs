//! Four-quadrant board keyed by a choice field.

use std::fmt::Write;

use playbook_core::{Lang, WidgetRecord};

use super::{choice_options, items, text, Diagram, CANVAS_WIDTH, MARGIN, PALETTE};

const LINE_HEIGHT: f64 = 22.0;
const MIN_CELL_HEIGHT: f64 = 140.0;

/// Draw up to four quadrants, one per declared option of `quadrant`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn draw(record: &WidgetRecord, lang: Lang, collection: &str, label: &str, quadrant: &str) -> Diagram {
    let options = choice_options(record, collection, quadrant, lang);
    let entries = items(record, collection);

    let buckets: Vec<(&str, Vec<&str>)> = options
        .iter()
        .take(4)
        .map(|(value, title)| {
            let lines: Vec<&str> = entries
                .iter()
                .filter(|e| e.choice(quadrant) == Some(value.as_str()))
                .map(|e| e.text(label, lang).unwrap_or_default())
                .collect();
            (title.as_str(), lines)
        })
        .collect();

    let longest = buckets.iter().map(|(_, lines)| lines.len()).max().unwrap_or(0);
    let cell_w = (CANVAS_WIDTH - MARGIN * 3.0) / 2.0;
    let cell_h = (48.0 + longest as f64 * LINE_HEIGHT).max(MIN_CELL_HEIGHT);

    let mut svg = String::with_capacity(2048);
    for (index, (title, lines)) in buckets.iter().enumerate() {
        let x = MARGIN + (index % 2) as f64 * (cell_w + MARGIN);
        let y = MARGIN + (index / 2) as f64 * (cell_h + MARGIN);
        let color = PALETTE[index % PALETTE.len()];
        let _ = write!(
            svg,
            "<rect class=\"quadrant\" x=\"{x:.1}\" y=\"{y:.1}\" width=\"{cell_w:.1}\" height=\"{cell_h:.1}\" fill=\"{color}\" fill-opacity=\"0.12\" stroke=\"{color}\" rx=\"6\"/>",
        );
        text(&mut svg, x + 12.0, y + 24.0, 15.0, color, "start", title);
        for (line, entry) in lines.iter().enumerate() {
            let entry = format!("• {entry}");
            text(&mut svg, x + 12.0, y + 48.0 + line as f64 * LINE_HEIGHT, 12.0, "#333", "start", &entry);
        }
    }

    let rows = buckets.len().div_ceil(2).max(1) as f64;
    Diagram {
        svg,
        height: MARGIN + rows * (cell_h + MARGIN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playbook_core::Catalog;

    #[test]
    fn test_entries_land_in_their_quadrant() {
        let schema = Catalog::builtin().get("swot").expect("schema");
        let record = WidgetRecord::from_json(
            schema,
            &serde_json::json!({
                "entries": [
                    { "id": "s", "quadrant": "strength", "title": {"zh": "品牌", "en": "Brand"} },
                    { "id": "t", "quadrant": "threat", "title": "新进入者" }
                ]
            }),
        )
        .expect("record");

        let diagram = draw(&record, Lang::En, "entries", "title", "quadrant");
        assert_eq!(diagram.svg.matches("class=\"quadrant\"").count(), 4);
        assert!(diagram.svg.contains("Strengths"));
        assert!(diagram.svg.contains("• Brand"));
        assert!(diagram.svg.contains("• 新进入者"));
    }
}
