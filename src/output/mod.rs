pub mod report;

use itertools::Itertools;
use serde::Serialize;

use crate::table::TableModel;
use crate::visibility::PanelEntry;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

/// One rendered page of results plus the column panel state.
#[derive(Clone, Copy, Debug)]
pub struct ResultPage<'a> {
    pub query: &'a str,
    pub total: u64,
    pub table: &'a TableModel,
    pub panel: &'a [PanelEntry],
}

#[derive(Serialize)]
struct JsonRow<'a> {
    id: &'a str,
    cells: Vec<&'a str>,
}

#[derive(Serialize)]
struct JsonPage<'a> {
    query: &'a str,
    total: u64,
    columns: Vec<&'a str>,
    rows: Vec<JsonRow<'a>>,
}

const MAX_TEXT_WIDTH: usize = 40;

fn clip(value: &str) -> String {
    if value.chars().count() <= MAX_TEXT_WIDTH {
        return value.to_string();
    }
    let mut out: String = value.chars().take(MAX_TEXT_WIDTH - 1).collect();
    out.push('~');
    out
}

/// Visible columns as an aligned plain-text table.
pub fn render_text(page: &ResultPage<'_>) -> Vec<u8> {
    let header = page.table.visible_header();
    let rows: Vec<Vec<String>> = page
        .table
        .visible_rows()
        .into_iter()
        .map(|cells| cells.into_iter().map(|c| clip(&c.text)).collect())
        .collect();

    let widths: Vec<usize> = header
        .iter()
        .enumerate()
        .map(|(i, column)| {
            rows.iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(column.label.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    out.push_str(
        &header
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<w$}", c.label, w = *w))
            .join("  ")
            .trim_end()
            .to_string(),
    );
    out.push('\n');
    for row in &rows {
        out.push_str(
            row.iter()
                .zip(&widths)
                .map(|(v, w)| format!("{:<w$}", v, w = *w))
                .join("  ")
                .trim_end(),
        );
        out.push('\n');
    }
    out.push_str(&format!(
        "\n{} of {} reports\n",
        page.table.rows().len(),
        page.total
    ));
    out.into_bytes()
}

pub fn render_json(page: &ResultPage<'_>) -> Vec<u8> {
    let doc = JsonPage {
        query: page.query,
        total: page.total,
        columns: page
            .table
            .visible_header()
            .iter()
            .map(|c| c.key.as_str())
            .collect(),
        rows: page
            .table
            .rows()
            .iter()
            .zip(page.table.visible_rows())
            .map(|(row, cells)| JsonRow {
                id: &row.id,
                cells: cells.into_iter().map(|c| c.text.as_str()).collect(),
            })
            .collect(),
    };
    let mut out = serde_json::to_vec_pretty(&doc).unwrap_or_else(|_| b"{}".to_vec());
    out.push(b'\n');
    out
}

pub fn render_html(page: &ResultPage<'_>) -> Vec<u8> {
    report::render_html(page)
}

pub fn render(format: OutputFormat, page: &ResultPage<'_>) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(page),
        OutputFormat::Json => render_json(page),
        OutputFormat::Html => render_html(page),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ColumnKey;
    use crate::record::{Hit, Record};
    use crate::render::Renderer;
    use crate::table;
    use crate::visibility::VisibilityStore;
    use std::collections::HashMap;

    fn model() -> TableModel {
        let store = VisibilityStore::from_catalog(&HashMap::new());
        store.set(ColumnKey::Host, true);
        let hits = vec![Hit::new(
            "doc-1",
            Record {
                target_symbol: Some("CD3, CD4".to_string()),
                host: Some("Mouse".to_string()),
                ..Record::default()
            },
        )];
        table::assemble(&hits, &store, &Renderer::new(""))
    }

    #[test]
    fn format_is_inferred_from_extension() {
        assert_eq!(infer_format_from_path("out.JSON"), Some(OutputFormat::Json));
        assert_eq!(infer_format_from_path("page.htm"), Some(OutputFormat::Html));
        assert_eq!(infer_format_from_path("out.csv"), None);
        assert_eq!(OutputFormat::parse(" TXT "), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::parse("xml"), None);
    }

    #[test]
    fn text_lists_visible_columns_only() {
        let table = model();
        let page = ResultPage {
            query: "",
            total: 1,
            table: &table,
            panel: &[],
        };
        let out = String::from_utf8(render_text(&page)).unwrap();
        let header = out.lines().next().unwrap();
        assert!(header.starts_with("Target Symbol"));
        assert!(header.contains("Host"));
        assert!(!header.contains("RRID"));
        assert!(out.contains("CD3, CD4"));
        assert!(out.ends_with("1 of 1 reports\n"));
    }

    #[test]
    fn json_carries_visible_keys_and_plain_cells() {
        let table = model();
        let page = ResultPage {
            query: "cd3",
            total: 1,
            table: &table,
            panel: &[],
        };
        let doc: serde_json::Value = serde_json::from_slice(&render_json(&page)).unwrap();
        let columns = doc["columns"].as_array().unwrap();
        assert_eq!(columns.len(), table.visible_header().len());
        assert!(columns.iter().any(|c| c == "host"));
        assert_eq!(doc["rows"][0]["id"], "doc-1");
        assert_eq!(doc["rows"][0]["cells"][0], "CD3, CD4");
    }

    #[test]
    fn render_dispatches_on_format() {
        let table = model();
        let page = ResultPage {
            query: "",
            total: 1,
            table: &table,
            panel: &[],
        };
        assert_eq!(render(OutputFormat::Text, &page), render_text(&page));
        assert_eq!(render(OutputFormat::Json, &page), render_json(&page));
        assert_eq!(render(OutputFormat::Html, &page), render_html(&page));
    }

    #[test]
    fn long_values_are_clipped() {
        let long = "x".repeat(100);
        assert_eq!(clip(&long).chars().count(), MAX_TEXT_WIDTH);
        assert_eq!(clip("short"), "short");
    }
}
