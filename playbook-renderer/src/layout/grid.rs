//! Row × column matrix whose cells are items of a third collection.

use std::collections::HashMap;
use std::fmt::Write;

use playbook_core::{ItemId, Lang, WidgetRecord};

use super::{empty, items, text, Diagram, CANVAS_WIDTH, MARGIN, PALETTE};

const HEADER_COLUMN: f64 = 200.0;
const ROW_HEIGHT: f64 = 34.0;

/// Field keys read by the grid.
#[derive(Debug, Clone, Copy)]
pub struct GridKeys<'a> {
    /// Row collection.
    pub rows: &'a str,
    /// Row label field.
    pub row_label: &'a str,
    /// Column collection.
    pub columns: &'a str,
    /// Column label field.
    pub column_label: &'a str,
    /// Cell collection.
    pub cells: &'a str,
    /// Cell reference to its row.
    pub row_ref: &'a str,
    /// Cell reference to its column.
    pub column_ref: &'a str,
    /// Cell code field.
    pub code: &'a str,
}

/// Draw the matrix. Cells whose row or column no longer exists are skipped.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn draw(record: &WidgetRecord, lang: Lang, keys: &GridKeys<'_>) -> Diagram {
    let rows = items(record, keys.rows);
    let columns = items(record, keys.columns);
    if rows.is_empty() || columns.is_empty() {
        return empty(lang);
    }

    let mut codes: HashMap<(&ItemId, &ItemId), Vec<&str>> = HashMap::new();
    for cell in items(record, keys.cells) {
        let (Some(row), Some(column), Some(code)) = (
            cell.reference(keys.row_ref),
            cell.reference(keys.column_ref),
            cell.choice(keys.code),
        ) else {
            continue;
        };
        codes.entry((row, column)).or_default().push(code);
    }

    let column_w = (CANVAS_WIDTH - MARGIN * 2.0 - HEADER_COLUMN) / columns.len() as f64;
    let mut svg = String::with_capacity(4096);

    for (c, column) in columns.iter().enumerate() {
        let x = MARGIN + HEADER_COLUMN + c as f64 * column_w;
        text(&mut svg, x + column_w / 2.0, MARGIN + 20.0, 12.0, "#333", "middle", column.text(keys.column_label, lang).unwrap_or_default());
    }

    for (r, row) in rows.iter().enumerate() {
        let y = MARGIN + (r + 1) as f64 * ROW_HEIGHT;
        let _ = write!(
            svg,
            "<line x1=\"{MARGIN}\" y1=\"{y:.1}\" x2=\"{:.1}\" y2=\"{y:.1}\" stroke=\"#ddd\"/>",
            CANVAS_WIDTH - MARGIN,
        );
        text(&mut svg, MARGIN + 8.0, y + 22.0, 12.0, "#333", "start", row.text(keys.row_label, lang).unwrap_or_default());

        for (c, column) in columns.iter().enumerate() {
            let Some(cell) = codes.get(&(row.id(), column.id())) else {
                continue;
            };
            let x = MARGIN + HEADER_COLUMN + c as f64 * column_w;
            let color = PALETTE[c % PALETTE.len()];
            let _ = write!(
                svg,
                "<rect class=\"cell\" x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{color}\" fill-opacity=\"0.2\" rx=\"4\"/>",
                x + 4.0,
                y + 4.0,
                column_w - 8.0,
                ROW_HEIGHT - 8.0,
            );
            text(&mut svg, x + column_w / 2.0, y + 22.0, 13.0, "#222", "middle", &cell.join("/"));
        }
    }

    Diagram {
        svg,
        height: MARGIN * 2.0 + (rows.len() + 1) as f64 * ROW_HEIGHT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playbook_core::Catalog;

    #[test]
    fn test_cells_with_dangling_refs_are_skipped() {
        let schema = Catalog::builtin().get("raci").expect("schema");
        let record = WidgetRecord::from_json(
            schema,
            &serde_json::json!({
                "roles": [{ "id": "pm", "name": "经理" }],
                "activities": [{ "id": "plan", "name": "计划" }],
                "assignments": [
                    { "id": "x1", "activity": "plan", "role": "pm", "code": "A" },
                    { "id": "x2", "activity": "plan", "role": "ghost", "code": "R" }
                ]
            }),
        )
        .expect("record");

        let diagram = draw(
            &record,
            Lang::Zh,
            &GridKeys {
                rows: "activities",
                row_label: "name",
                columns: "roles",
                column_label: "name",
                cells: "assignments",
                row_ref: "activity",
                column_ref: "role",
                code: "code",
            },
        );
        assert_eq!(diagram.svg.matches("class=\"cell\"").count(), 1);
        assert!(diagram.svg.contains(">A</text>"));
    }
}
