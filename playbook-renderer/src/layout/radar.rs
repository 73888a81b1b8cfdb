//! Radar chart: one axis per item, one score per axis.

use std::f64::consts::{FRAC_PI_2, TAU};
use std::fmt::Write;

use playbook_core::{Lang, WidgetRecord};

use super::{empty, items, number_max, text, Diagram, CANVAS_WIDTH, PALETTE};

const RADIUS: f64 = 150.0;
const RINGS: u32 = 5;

/// Draw a radar chart over `collection`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn draw(record: &WidgetRecord, lang: Lang, collection: &str, label: &str, value: &str) -> Diagram {
    let axes = items(record, collection);
    if axes.is_empty() {
        return empty(lang);
    }

    let max = number_max(record, collection, value);
    let cx = CANVAS_WIDTH / 2.0;
    let cy = RADIUS + 50.0;
    let n = axes.len() as f64;
    let point = |i: usize, r: f64| {
        let angle = TAU * i as f64 / n - FRAC_PI_2;
        (cx + r * angle.cos(), cy + r * angle.sin())
    };

    let mut svg = String::with_capacity(2048);

    for ring in 1..=RINGS {
        let r = RADIUS * f64::from(ring) / f64::from(RINGS);
        let points: Vec<String> = (0..axes.len())
            .map(|i| {
                let (x, y) = point(i, r);
                format!("{x:.1},{y:.1}")
            })
            .collect();
        let _ = write!(
            svg,
            "<polygon points=\"{}\" fill=\"none\" stroke=\"#ddd\" stroke-width=\"1\"/>",
            points.join(" ")
        );
    }

    for (i, item) in axes.iter().enumerate() {
        let (x, y) = point(i, RADIUS);
        let _ = write!(
            svg,
            "<line x1=\"{cx:.1}\" y1=\"{cy:.1}\" x2=\"{x:.1}\" y2=\"{y:.1}\" stroke=\"#ccc\" stroke-width=\"1\"/>",
        );
        let (lx, ly) = point(i, RADIUS + 24.0);
        let anchor = if (lx - cx).abs() < 1.0 {
            "middle"
        } else if lx > cx {
            "start"
        } else {
            "end"
        };
        text(&mut svg, lx, ly + 4.0, 12.0, "#333", anchor, item.text(label, lang).unwrap_or_default());
    }

    let values: Vec<(f64, f64)> = axes
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let score = item.number(value).unwrap_or(0.0);
            point(i, RADIUS * (score / max).clamp(0.0, 1.0))
        })
        .collect();
    let outline: Vec<String> = values.iter().map(|(x, y)| format!("{x:.1},{y:.1}")).collect();
    let _ = write!(
        svg,
        "<polygon points=\"{}\" fill=\"{}\" fill-opacity=\"0.3\" stroke=\"{}\" stroke-width=\"2\"/>",
        outline.join(" "),
        PALETTE[0],
        PALETTE[0],
    );
    for (x, y) in &values {
        let _ = write!(
            svg,
            "<circle cx=\"{x:.1}\" cy=\"{y:.1}\" r=\"4\" fill=\"{}\"/>",
            PALETTE[0]
        );
    }

    let mut height = cy + RADIUS + 50.0;
    if let (Some(spec), Some(aggregate)) = (&record.schema().aggregate, record.aggregate()) {
        let caption = format!("{}: {aggregate:.1}", spec.label.resolve(lang));
        text(&mut svg, cx, height, 14.0, "#333", "middle", &caption);
        height += 24.0;
    }

    Diagram { svg, height }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playbook_core::Catalog;

    #[test]
    fn test_radar_draws_one_point_per_axis() {
        let schema = Catalog::builtin().get("porter-five-forces").expect("schema");
        let record = WidgetRecord::from_json(
            schema,
            &serde_json::json!({
                "forces": [
                    { "id": "a", "name": "甲", "intensity": 2 },
                    { "id": "b", "name": "乙", "intensity": 4 },
                    { "id": "c", "name": {"zh": "丙", "en": "C"}, "intensity": 5 }
                ]
            }),
        )
        .expect("record");

        let diagram = draw(&record, Lang::En, "forces", "name", "intensity");
        assert_eq!(diagram.svg.matches("<circle").count(), 3);
        assert!(diagram.svg.contains(">C</text>"));
        assert!(diagram.svg.contains("Overall Intensity: 3.7"));
    }
}
