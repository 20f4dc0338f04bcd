use serde::Serialize;
use tracing::debug;

use crate::catalog::ColumnKey;
use crate::record::Hit;
use crate::render::{Mode, Renderer};
use crate::visibility::{ColumnSurface, VisibilityStore};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TableColumn {
    pub key: ColumnKey,
    pub label: &'static str,
    pub visible: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Cell {
    /// Escaped HTML with hyperlinks.
    pub html: String,
    /// Plain text of the same value.
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub id: String,
    pub cells: Vec<Cell>,
}

/// Every catalog column in canonical order with one rendered cell per column
/// and row. Hidden columns keep their cells; only the `visible` flag changes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TableModel {
    columns: Vec<TableColumn>,
    rows: Vec<TableRow>,
}

pub fn assemble(hits: &[Hit], store: &VisibilityStore, renderer: &Renderer) -> TableModel {
    let columns: Vec<TableColumn> = ColumnKey::ALL
        .into_iter()
        .map(|key| TableColumn {
            key,
            label: key.label(),
            visible: store.is_visible(key),
        })
        .collect();

    let rows: Vec<TableRow> = hits
        .iter()
        .map(|hit| TableRow {
            id: hit.id.clone(),
            cells: columns
                .iter()
                .map(|c| Cell {
                    html: renderer.render(c.key, &hit.source, Mode::Display),
                    text: renderer.render(c.key, &hit.source, Mode::Export),
                })
                .collect(),
        })
        .collect();

    debug!(rows = rows.len(), "table assembled");
    TableModel { columns, rows }
}

impl TableModel {
    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn visible_header(&self) -> Vec<&TableColumn> {
        self.columns.iter().filter(|c| c.visible).collect()
    }

    /// Cells of the visible columns only, row by row.
    pub fn visible_rows(&self) -> Vec<Vec<&Cell>> {
        self.rows
            .iter()
            .map(|row| {
                row.cells
                    .iter()
                    .zip(self.columns.iter())
                    .filter(|(_, c)| c.visible)
                    .map(|(cell, _)| cell)
                    .collect()
            })
            .collect()
    }

    pub fn apply(&mut self, changes: &[(ColumnKey, bool)]) {
        for (key, visible) in changes {
            self.show_column(*key, *visible);
        }
    }

    /// Re-read every column's visibility from the store.
    pub fn sync(&mut self, store: &VisibilityStore) {
        for column in self.columns.iter_mut() {
            column.visible = store.is_visible(column.key);
        }
    }
}

impl ColumnSurface for TableModel {
    fn show_column(&mut self, key: ColumnKey, visible: bool) {
        if let Some(column) = self.columns.iter_mut().find(|c| c.key == key) {
            column.visible = visible || !key.is_optional();
        }
    }
}
