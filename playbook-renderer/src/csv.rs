//! CSV projection of widget records.
//!
//! A record is flattened into one row per item. Single-collection widgets
//! use that collection's columns; multi-collection widgets concatenate every
//! collection behind a leading `Type` column and use the union of all
//! columns in schema order.

use playbook_core::{Lang, RecordView, WidgetRecord};

/// A flat header + rows table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    /// Header labels.
    pub header: Vec<String>,
    /// Rows, each aligned with `header`.
    pub rows: Vec<Vec<String>>,
}

/// Header of the collection discriminator column.
#[must_use]
pub fn type_column(lang: Lang) -> &'static str {
    match lang {
        Lang::Zh => "类型",
        Lang::En => "Type",
    }
}

impl CsvTable {
    /// Project a resolved record view.
    #[must_use]
    pub fn from_view(view: &RecordView) -> Self {
        if let [only] = view.collections.as_slice() {
            return Self {
                header: only.columns.iter().map(|c| c.label.clone()).collect(),
                rows: only.items.iter().map(|i| i.cells.clone()).collect(),
            };
        }

        let mut keys: Vec<&str> = Vec::new();
        let mut header = vec![type_column(view.lang).to_string()];
        for collection in &view.collections {
            for column in &collection.columns {
                if !keys.contains(&column.key.as_str()) {
                    keys.push(&column.key);
                    header.push(column.label.clone());
                }
            }
        }

        let mut rows = Vec::new();
        for collection in &view.collections {
            let positions: Vec<Option<usize>> = keys
                .iter()
                .map(|key| collection.columns.iter().position(|c| c.key == *key))
                .collect();
            for item in &collection.items {
                let mut row = Vec::with_capacity(header.len());
                row.push(collection.label.clone());
                row.extend(positions.iter().map(|p| {
                    p.and_then(|i| item.cells.get(i)).cloned().unwrap_or_default()
                }));
                rows.push(row);
            }
        }

        Self { header, rows }
    }

    /// Serialize. A table without rows yields the empty string.
    #[must_use]
    pub fn to_csv(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }
        std::iter::once(&self.header)
            .chain(&self.rows)
            .map(|row| row.iter().map(|v| escape_field(v)).collect::<Vec<_>>().join(","))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Export `record` as CSV text in `lang`.
#[must_use]
pub fn export_csv(record: &WidgetRecord, lang: Lang) -> String {
    let table = CsvTable::from_view(&record.view(lang));
    tracing::debug!(
        "CSV export of {}: {} rows x {} columns",
        record.schema().slug,
        table.rows.len(),
        table.header.len()
    );
    table.to_csv()
}

/// Quote a value when it contains a delimiter, a quote or a line break.
#[must_use]
pub fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Split one CSV line into unquoted fields.
#[must_use]
pub fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}
