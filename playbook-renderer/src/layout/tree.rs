//! Indented tree built from a parent reference.

use std::collections::{HashMap, HashSet};
use std::fmt::Write;

use playbook_core::{Item, ItemId, Lang, WidgetRecord};

use super::{empty, items, text, Diagram, MARGIN, PALETTE};

const INDENT: f64 = 28.0;
const ROW_HEIGHT: f64 = 30.0;

/// Draw `collection` as a tree. Nodes whose parent is missing or dangling
/// are roots; nodes caught in a parent cycle are not drawn.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn draw(record: &WidgetRecord, lang: Lang, collection: &str, label: &str, parent: &str) -> Diagram {
    let nodes = items(record, collection);
    if nodes.is_empty() {
        return empty(lang);
    }

    let ids: HashSet<&ItemId> = nodes.iter().map(|n| n.id()).collect();
    let mut roots = Vec::new();
    let mut children: HashMap<&ItemId, Vec<&Item>> = HashMap::new();
    for node in &nodes {
        match node.reference(parent).filter(|p| ids.contains(p)) {
            Some(p) => children.entry(p).or_default().push(*node),
            None => roots.push(*node),
        }
    }

    let mut rows: Vec<(usize, &Item)> = Vec::with_capacity(nodes.len());
    let mut visited = HashSet::new();
    let mut stack: Vec<(usize, &Item)> = roots.into_iter().rev().map(|n| (0, n)).collect();
    while let Some((depth, node)) = stack.pop() {
        if !visited.insert(node.id()) {
            continue;
        }
        rows.push((depth, node));
        if let Some(kids) = children.get(node.id()) {
            stack.extend(kids.iter().rev().map(|k| (depth + 1, *k)));
        }
    }

    let row_of: HashMap<&ItemId, usize> = rows
        .iter()
        .enumerate()
        .map(|(i, (_, n))| (n.id(), i))
        .collect();
    let y_of = |row: usize| MARGIN + row as f64 * ROW_HEIGHT + ROW_HEIGHT / 2.0;
    let x_of = |depth: usize| MARGIN + depth as f64 * INDENT;

    let mut svg = String::with_capacity(2048);
    for (row, (depth, node)) in rows.iter().enumerate() {
        let (x, y) = (x_of(*depth), y_of(row));
        if let Some(parent_row) = node.reference(parent).and_then(|p| row_of.get(p)) {
            let px = x_of(depth.saturating_sub(1)) + 6.0;
            let py = y_of(*parent_row);
            let _ = write!(
                svg,
                "<path class=\"edge\" d=\"M{px:.1},{py:.1} L{px:.1},{y:.1} L{x:.1},{y:.1}\" fill=\"none\" stroke=\"#bbb\"/>",
            );
        }
        let color = PALETTE[depth % PALETTE.len()];
        let _ = write!(
            svg,
            "<circle cx=\"{:.1}\" cy=\"{y:.1}\" r=\"5\" fill=\"{color}\"/>",
            x + 6.0
        );
        text(&mut svg, x + 16.0, y + 4.0, 12.0, "#333", "start", node.text(label, lang).unwrap_or_default());
    }

    Diagram {
        svg,
        height: MARGIN * 2.0 + rows.len() as f64 * ROW_HEIGHT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playbook_core::Catalog;

    #[test]
    fn test_tree_orders_depth_first_and_skips_cycles() {
        let schema = Catalog::builtin().get("issue-tree").expect("schema");
        let record = WidgetRecord::from_json(
            schema,
            &serde_json::json!({
                "nodes": [
                    { "id": "root", "title": "根" },
                    { "id": "b", "title": "乙", "parent": "root" },
                    { "id": "a", "title": "甲", "parent": "root" },
                    { "id": "a1", "title": "甲一", "parent": "a" },
                    { "id": "orphan", "title": "孤儿", "parent": "ghost" },
                    { "id": "x", "title": "环一", "parent": "y" },
                    { "id": "y", "title": "环二", "parent": "x" }
                ]
            }),
        )
        .expect("record");

        let diagram = draw(&record, Lang::Zh, "nodes", "title", "parent");
        let order: Vec<usize> = ["根", "乙", "甲", "甲一", "孤儿"]
            .iter()
            .map(|t| diagram.svg.find(&format!(">{t}</text>")).expect("drawn"))
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));
        assert!(!diagram.svg.contains("环一"));
        assert_eq!(diagram.svg.matches("class=\"edge\"").count(), 3);
    }
}
