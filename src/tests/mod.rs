use std::collections::HashMap;

use serde_json::json;

use crate::catalog::{self, ColumnKey};
use crate::export::ExportEngine;
use crate::preferences::{MemoryPreferences, PreferenceChannel, PreferenceFile};
use crate::render::{Mode, Renderer};
use crate::search::{SearchBackend, SearchError, SearchQuery, SearchResponse, SearchSession};
use crate::table;
use crate::visibility::{ColumnPanel, VisibilityStore};

// Answers every query with the same backend JSON, the way the index would.
struct JsonBackend {
    body: serde_json::Value,
}

impl SearchBackend for JsonBackend {
    async fn search(&self, _query: &SearchQuery) -> Result<SearchResponse, SearchError> {
        Ok(SearchResponse::from_json(self.body.clone()).unwrap_or_default())
    }
}

fn backend() -> JsonBackend {
    JsonBackend {
        body: json!({
            "hits": {
                "total": { "value": 2, "relation": "eq" },
                "hits": [
                    {
                        "_id": "a",
                        "_source": {
                            "target_symbol": "CD3, CD4",
                            "clonality": "Monoclonal",
                            "avr_pdf_filename": "cd3.pdf",
                            "avr_pdf_uuid": "u-1",
                            "lot_number": "L1",
                            "rrid": "AB_111"
                        }
                    },
                    {
                        "_id": "b",
                        "_source": {
                            "target_symbol": "CD8",
                            "method": "IF\nIHC",
                            "rrid": null
                        }
                    }
                ]
            }
        }),
    }
}

fn temp_prefs(name: &str) -> std::path::PathBuf {
    std::env::temp_dir()
        .join(format!("avrsearch-it-{}-{name}", std::process::id()))
        .join("columns.yml")
}

#[tokio::test]
async fn table_and_export_share_one_column_set() {
    let backend = backend();
    let mut session = SearchSession::new(SearchQuery::from_text("", 0, 1));
    let response = session.run(&backend).await.unwrap();

    let store = VisibilityStore::from_catalog(&HashMap::new());
    let renderer = Renderer::new("https://assets.example");
    let mut table = table::assemble(&response.hits, &store, &renderer);
    let mut panel = ColumnPanel::new(store.clone(), MemoryPreferences::new());
    panel.toggle(ColumnKey::Rrid, true, &mut table).unwrap();
    panel.toggle(ColumnKey::LotNumber, true, &mut table).unwrap();

    let bytes = ExportEngine::new()
        .export_all(&backend, &session, &store, &renderer)
        .await
        .unwrap();
    let csv = String::from_utf8(bytes).unwrap();

    let table_keys: Vec<&str> = table
        .visible_header()
        .iter()
        .map(|c| c.key.as_str())
        .collect();
    assert_eq!(csv.lines().next().unwrap(), table_keys.join(","));
    assert_eq!(csv.lines().count(), 1 + 2);
}

#[tokio::test]
async fn multi_value_targets_link_in_the_table_and_stay_whole_in_the_file() {
    let backend = backend();
    let mut session = SearchSession::new(SearchQuery::from_text("CD3", 0, 10));
    let response = session.run(&backend).await.unwrap();
    let store = VisibilityStore::from_catalog(&HashMap::new());
    let renderer = Renderer::new("https://assets.example");

    let model = table::assemble(&response.hits, &store, &renderer);
    let first = &model.rows()[0].cells[0];
    assert_eq!(first.html.matches("<a ").count(), 2);
    assert_eq!(first.text, "CD3, CD4");

    let csv = String::from_utf8(
        ExportEngine::new()
            .export_all(&backend, &session, &store, &renderer)
            .await
            .unwrap(),
    )
    .unwrap();
    let mut reader = csv::Reader::from_reader(csv.as_bytes());
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(&rows[0][0], "CD3, CD4");
    assert_eq!(&rows[1][3], "IF IHC");
}

#[tokio::test]
async fn persisted_preferences_reach_a_fresh_session() {
    let path = temp_prefs("persist");
    {
        let prefs = PreferenceFile::open(&path).unwrap();
        let store = VisibilityStore::from_catalog(&prefs.load().unwrap());
        let mut panel = ColumnPanel::new(store, prefs);
        panel
            .toggle(ColumnKey::LotNumber, true, &mut crate::visibility::Detached)
            .unwrap();
    }

    let prefs = PreferenceFile::open(&path).unwrap();
    let store = VisibilityStore::from_catalog(&prefs.load().unwrap());
    assert!(store.get(ColumnKey::LotNumber));

    let backend = backend();
    let mut session = SearchSession::new(SearchQuery::from_text("", 0, 10));
    let response = session.run(&backend).await.unwrap();

    let model = table::assemble(&response.hits, &store, &Renderer::new(""));
    let header: Vec<ColumnKey> = model.visible_header().iter().map(|c| c.key).collect();
    assert!(header.contains(&ColumnKey::LotNumber));
    assert!(!header.contains(&ColumnKey::Host));
    assert_eq!(model.visible_rows()[0].len(), header.len());

    let csv = String::from_utf8(
        ExportEngine::new()
            .export_all(&backend, &session, &store, &Renderer::new(""))
            .await
            .unwrap(),
    )
    .unwrap();
    assert!(csv.lines().next().unwrap().contains("lot_number"));
    assert!(csv.contains(",L1,"));
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[tokio::test]
async fn asset_urls_follow_the_configured_base() {
    let backend = backend();
    let mut session = SearchSession::new(SearchQuery::from_text("", 0, 10));
    let response = session.run(&backend).await.unwrap();
    let store = VisibilityStore::from_catalog(&HashMap::new());

    let renderer = Renderer::new("https://assets.example/").with_export_asset_urls(true);
    let html = renderer.render(ColumnKey::AvrPdfFilename, &response.hits[0].source, Mode::Display);
    assert!(html.contains("https://assets.example/u-1/cd3.pdf"));

    let csv = String::from_utf8(
        ExportEngine::new()
            .export_all(&backend, &session, &store, &renderer)
            .await
            .unwrap(),
    )
    .unwrap();
    assert!(csv.contains("https://assets.example/u-1/cd3.pdf"));
    assert!(!csv.contains("/u-1/,"));
}

#[test]
fn every_store_state_keeps_rows_rectangular() {
    let store = VisibilityStore::from_catalog(&HashMap::new());
    let renderer = Renderer::new("");
    let hits = vec![crate::record::Hit::default()];
    for round in 0..3 {
        match round {
            0 => store.clear_all(),
            1 => store.set_all(true),
            _ => {
                for (i, key) in catalog::optional_columns().enumerate() {
                    store.set(key, i % 2 == 0);
                }
            }
        }
        let model = table::assemble(&hits, &store, &renderer);
        let width = model.visible_header().len();
        assert!(model.visible_rows().iter().all(|r| r.len() == width));
        assert_eq!(store.visible_columns().len(), width);
    }
}
