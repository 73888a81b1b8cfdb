//! Gantt-style timeline with dependency arrows and milestone markers.

use std::collections::HashMap;
use std::fmt::Write;

use playbook_core::{ItemId, Lang, MilestoneTrack, TimelineSpan, WidgetRecord, DATE_FORMAT};

use super::{empty, items, text, Diagram, CANVAS_WIDTH, MARGIN, PALETTE};

const LABEL_WIDTH: f64 = 180.0;
const ROW_HEIGHT: f64 = 32.0;
const BAR_HEIGHT: f64 = 18.0;
const TOP: f64 = 36.0;

/// Field keys read by the timeline.
#[derive(Debug, Clone, Copy)]
pub struct TimelineKeys<'a> {
    /// Task collection.
    pub tasks: &'a str,
    /// Bar label field.
    pub label: &'a str,
    /// Start date field.
    pub start: &'a str,
    /// End date field.
    pub end: &'a str,
    /// Percent-complete field.
    pub progress: Option<&'a str>,
    /// Dependency reference list.
    pub dependencies: Option<&'a str>,
    /// Milestone markers.
    pub milestones: Option<&'a MilestoneTrack>,
}

/// Draw the timeline.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn draw(record: &WidgetRecord, lang: Lang, keys: &TimelineKeys<'_>) -> Diagram {
    let tasks: Vec<_> = items(record, keys.tasks)
        .into_iter()
        .filter_map(|task| Some((task, task.date(keys.start)?, task.date(keys.end)?)))
        .collect();
    let Some(span) = TimelineSpan::covering(tasks.iter().map(|(_, s, e)| (*s, *e))) else {
        return empty(lang);
    };

    let chart_x = MARGIN + LABEL_WIDTH;
    let chart_w = CANVAS_WIDTH - chart_x - MARGIN;
    let x_of = |fraction: f64| chart_x + fraction.clamp(0.0, 1.0) * chart_w;
    let row_mid = |row: usize| TOP + row as f64 * ROW_HEIGHT + ROW_HEIGHT / 2.0;

    let mut svg = String::with_capacity(4096);
    svg.push_str(
        "<defs><marker id=\"arrow\" markerWidth=\"8\" markerHeight=\"8\" refX=\"6\" refY=\"3\" orient=\"auto\"><path d=\"M0,0 L6,3 L0,6 Z\" fill=\"#666\"/></marker></defs>",
    );
    text(&mut svg, chart_x, TOP - 12.0, 11.0, "#666", "start", &span.start.format(DATE_FORMAT).to_string());
    text(&mut svg, chart_x + chart_w, TOP - 12.0, 11.0, "#666", "end", &span.end.format(DATE_FORMAT).to_string());

    let rows: HashMap<&ItemId, usize> = tasks
        .iter()
        .enumerate()
        .map(|(row, (task, _, _))| (task.id(), row))
        .collect();
    let mut bar_ends = Vec::with_capacity(tasks.len());

    for (row, (task, start, end)) in tasks.iter().enumerate() {
        let y = row_mid(row);
        let bar = span.bar(*start, *end);
        let x = x_of(bar.left);
        let width = (bar.width * chart_w).max(2.0);
        let color = PALETTE[row % PALETTE.len()];
        bar_ends.push((x, x + width));

        text(&mut svg, MARGIN, y + 4.0, 12.0, "#333", "start", task.text(keys.label, lang).unwrap_or_default());
        let _ = write!(
            svg,
            "<rect x=\"{x:.1}\" y=\"{:.1}\" width=\"{width:.1}\" height=\"{BAR_HEIGHT}\" fill=\"{color}\" fill-opacity=\"0.35\" rx=\"3\"/>",
            y - BAR_HEIGHT / 2.0,
        );
        if let Some(progress) = keys.progress.and_then(|p| task.number(p)) {
            let done = width * (progress / 100.0).clamp(0.0, 1.0);
            let _ = write!(
                svg,
                "<rect x=\"{x:.1}\" y=\"{:.1}\" width=\"{done:.1}\" height=\"{BAR_HEIGHT}\" fill=\"{color}\" rx=\"3\"/>",
                y - BAR_HEIGHT / 2.0,
            );
        }
    }

    if let Some(dependencies) = keys.dependencies {
        for (row, (task, _, _)) in tasks.iter().enumerate() {
            for dependency in task.references(dependencies) {
                let Some(&from) = rows.get(dependency) else {
                    continue;
                };
                let (x1, y1) = (bar_ends[from].1, row_mid(from));
                let (x2, y2) = (bar_ends[row].0, row_mid(row));
                let _ = write!(
                    svg,
                    "<path class=\"dependency\" d=\"M{x1:.1},{y1:.1} C{:.1},{y1:.1} {:.1},{y2:.1} {x2:.1},{y2:.1}\" fill=\"none\" stroke=\"#666\" stroke-width=\"1\" marker-end=\"url(#arrow)\"/>",
                    x1 + 12.0,
                    x2 - 12.0,
                );
            }
        }
    }

    if let Some(track) = keys.milestones {
        for milestone in items(record, &track.collection) {
            let (Some(date), Some(row)) = (
                milestone.date(&track.date),
                milestone.reference(&track.task).and_then(|t| rows.get(t)),
            ) else {
                continue;
            };
            let x = x_of(span.position(date));
            let y = row_mid(*row);
            let _ = write!(
                svg,
                "<path class=\"milestone\" d=\"M{x:.1},{:.1} L{:.1},{y:.1} L{x:.1},{:.1} L{:.1},{y:.1} Z\" fill=\"#e15759\"/>",
                y - 8.0,
                x + 8.0,
                y + 8.0,
                x - 8.0,
            );
            text(&mut svg, x + 10.0, y - 10.0, 10.0, "#e15759", "start", milestone.text(&track.label, lang).unwrap_or_default());
        }
    }

    Diagram {
        svg,
        height: TOP + tasks.len() as f64 * ROW_HEIGHT + MARGIN,
    }
}
