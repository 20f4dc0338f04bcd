use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::catalog::ColumnKey;
use crate::record::Hit;
use crate::render::{Mode, Renderer};
use crate::search::{SearchBackend, SearchError, SearchQuery, SearchSession};
use crate::visibility::VisibilityStore;

pub const EXPORT_FILENAME: &str = "avr.csv";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("an export is already running")]
    InFlight,

    #[error("export query failed: {source}")]
    Search {
        #[source]
        source: SearchError,
    },

    #[error("failed to serialize export rows: {source}")]
    Serialize {
        #[source]
        source: csv::Error,
    },

    #[error("failed to deliver {filename}: {source}")]
    Deliver {
        filename: String,
        #[source]
        source: std::io::Error,
    },
}

/// Receives the finished file.
pub trait DownloadSink {
    /// Returns where the bytes ended up.
    fn deliver(&mut self, filename: &str, bytes: &[u8]) -> std::io::Result<String>;
}

/// Writes the export into a directory.
#[derive(Clone, Debug)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for FileSink {
    fn deliver(&mut self, filename: &str, bytes: &[u8]) -> std::io::Result<String> {
        if !self.dir.as_os_str().is_empty() {
            std::fs::create_dir_all(&self.dir)?;
        }
        let path = self.dir.join(filename);
        // Readers only ever see the previous file or the complete new one.
        let staging = self.dir.join(format!(".{filename}.part"));
        let written = std::fs::write(&staging, bytes).and_then(|_| std::fs::rename(&staging, &path));
        if let Err(e) = written {
            let _ = std::fs::remove_file(&staging);
            return Err(e);
        }
        Ok(path.display().to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportReport {
    pub location: String,
    pub rows: usize,
    pub columns: usize,
    pub bytes: usize,
}

struct Rendered {
    bytes: Vec<u8>,
    rows: usize,
    columns: usize,
}

/// Clears the in-flight flag when the export finishes, however it finishes.
struct InFlightGuard(Rc<Cell<bool>>);

impl InFlightGuard {
    fn acquire(flag: &Rc<Cell<bool>>) -> Option<Self> {
        if flag.replace(true) {
            return None;
        }
        Some(Self(Rc::clone(flag)))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Builds the full-result CSV. Reads the visibility store and the search
/// session; never looks at a rendered table.
#[derive(Clone, Debug, Default)]
pub struct ExportEngine {
    in_flight: Rc<Cell<bool>>,
}

impl ExportEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.get()
    }

    /// Core columns plus visible optional columns, in canonical order.
    pub fn export_columns(store: &VisibilityStore) -> Vec<ColumnKey> {
        store.visible_columns()
    }

    /// The session's query widened to every match, projected onto `columns`.
    pub fn build_query(session: &SearchSession, columns: &[ColumnKey]) -> SearchQuery {
        let size = session.total().unwrap_or(0);
        let mut fields: Vec<&str> = columns.iter().map(|k| k.as_str()).collect();
        if columns.contains(&ColumnKey::AvrPdfFilename) {
            fields.push("avr_pdf_uuid");
        }
        session.query().with_page(0, size).with_source(&fields)
    }

    pub async fn export_all<B: SearchBackend>(
        &self,
        backend: &B,
        session: &SearchSession,
        store: &VisibilityStore,
        renderer: &Renderer,
    ) -> Result<Vec<u8>, ExportError> {
        self.render(backend, session, store, renderer)
            .await
            .map(|r| r.bytes)
    }

    /// Export and hand the file to `sink` as [`EXPORT_FILENAME`].
    pub async fn download<B: SearchBackend, S: DownloadSink>(
        &self,
        backend: &B,
        session: &SearchSession,
        store: &VisibilityStore,
        renderer: &Renderer,
        sink: &mut S,
    ) -> Result<ExportReport, ExportError> {
        let rendered = self.render(backend, session, store, renderer).await?;
        let location = sink
            .deliver(EXPORT_FILENAME, &rendered.bytes)
            .map_err(|source| {
                let err = ExportError::Deliver {
                    filename: EXPORT_FILENAME.to_string(),
                    source,
                };
                error!(error = %err, "export failed");
                err
            })?;
        info!(%location, rows = rendered.rows, "export written");
        Ok(ExportReport {
            location,
            rows: rendered.rows,
            columns: rendered.columns,
            bytes: rendered.bytes.len(),
        })
    }

    async fn render<B: SearchBackend>(
        &self,
        backend: &B,
        session: &SearchSession,
        store: &VisibilityStore,
        renderer: &Renderer,
    ) -> Result<Rendered, ExportError> {
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(ExportError::InFlight)?;

        let columns = Self::export_columns(store);
        let query = Self::build_query(session, &columns);
        debug!(columns = columns.len(), size = query.size(), "export query");

        let result = match backend.search(&query).await {
            Ok(response) => serialize_rows(&columns, &response.hits, renderer).map(|bytes| {
                Rendered {
                    bytes,
                    rows: response.hits.len(),
                    columns: columns.len(),
                }
            }),
            Err(source) => Err(ExportError::Search { source }),
        };
        if let Err(err) = &result {
            error!(error = %err, "export failed");
        }
        result
    }
}

/// Header of raw keys, then one line per hit. Every line ends in `\n`.
pub fn serialize_rows(
    columns: &[ColumnKey],
    hits: &[Hit],
    renderer: &Renderer,
) -> Result<Vec<u8>, ExportError> {
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    wtr.write_record(columns.iter().map(|k| k.as_str()))
        .map_err(|source| ExportError::Serialize { source })?;

    for hit in hits {
        let row: Vec<String> = columns
            .iter()
            .map(|key| renderer.render(*key, &hit.source, Mode::Export))
            .collect();
        wtr.write_record(&row)
            .map_err(|source| ExportError::Serialize { source })?;
    }

    wtr.into_inner().map_err(|e| ExportError::Serialize {
        source: e.into_error().into(),
    })
}
