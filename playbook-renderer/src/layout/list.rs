//! Rows with optional grouping and score bars.

use std::fmt::Write;

use playbook_core::{format_number, Item, Lang, WidgetRecord};

use super::{choice_options, empty, items, number_max, text, Diagram, CANVAS_WIDTH, MARGIN, PALETTE};

const ROW_HEIGHT: f64 = 26.0;
const GROUP_HEIGHT: f64 = 32.0;
const BAR_X: f64 = 480.0;

/// Draw `collection` as a list, grouped by `group` in option order when set.
#[must_use]
pub fn draw(
    record: &WidgetRecord,
    lang: Lang,
    collection: &str,
    label: &str,
    group: Option<&str>,
    score: Option<&str>,
) -> Diagram {
    let rows = items(record, collection);
    if rows.is_empty() {
        return empty(lang);
    }

    let groups: Vec<(Option<String>, Vec<&Item>)> = match group {
        Some(field) => choice_options(record, collection, field, lang)
            .into_iter()
            .map(|(value, title)| {
                let members: Vec<&Item> = rows
                    .iter()
                    .filter(|r| r.choice(field) == Some(value.as_str()))
                    .copied()
                    .collect();
                (Some(title), members)
            })
            .filter(|(_, members)| !members.is_empty())
            .collect(),
        None => vec![(None, rows)],
    };

    let max = score.map_or(1.0, |s| number_max(record, collection, s));
    let bar_w = CANVAS_WIDTH - MARGIN - BAR_X - 40.0;
    let mut svg = String::with_capacity(2048);
    let mut y = MARGIN;

    for (index, (title, members)) in groups.iter().enumerate() {
        let color = PALETTE[index % PALETTE.len()];
        if let Some(title) = title {
            y += GROUP_HEIGHT;
            text(&mut svg, MARGIN, y - 10.0, 14.0, color, "start", title);
        }
        for member in members {
            y += ROW_HEIGHT;
            text(&mut svg, MARGIN + 12.0, y - 8.0, 12.0, "#333", "start", member.text(label, lang).unwrap_or_default());
            if let Some(value) = score.and_then(|s| member.number(s)) {
                let filled = bar_w * (value / max).clamp(0.0, 1.0);
                let _ = write!(
                    svg,
                    "<rect x=\"{BAR_X}\" y=\"{:.1}\" width=\"{bar_w:.1}\" height=\"10\" fill=\"#eee\" rx=\"5\"/><rect class=\"score\" x=\"{BAR_X}\" y=\"{:.1}\" width=\"{filled:.1}\" height=\"10\" fill=\"{color}\" rx=\"5\"/>",
                    y - 18.0,
                    y - 18.0,
                );
                text(&mut svg, BAR_X + bar_w + 8.0, y - 8.0, 11.0, "#666", "start", &format_number(value));
            }
        }
    }

    Diagram {
        svg,
        height: y + MARGIN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playbook_core::Catalog;

    #[test]
    fn test_groups_follow_option_order() {
        let schema = Catalog::builtin().get("pestle").expect("schema");
        let record = WidgetRecord::from_json(
            schema,
            &serde_json::json!({
                "factors": [
                    { "id": "t", "category": "technological", "title": "人工智能", "impact": 5 },
                    { "id": "p", "category": "political", "title": "政策", "impact": 2 }
                ]
            }),
        )
        .expect("record");

        let diagram = draw(&record, Lang::En, "factors", "title", Some("category"), Some("impact"));
        let political = diagram.svg.find(">Political<").expect("political");
        let technological = diagram.svg.find(">Technological<").expect("technological");
        assert!(political < technological);
        assert!(!diagram.svg.contains(">Economic<"));
        assert_eq!(diagram.svg.matches("class=\"score\"").count(), 2);
    }
}
