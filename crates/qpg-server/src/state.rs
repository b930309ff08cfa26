//! Shared server state (spec §4.11, §5): the catalog path (each request
//! opens its own short-lived read-only connection, so concurrent queries
//! never block each other beyond SQLite's own commit-time lock), the
//! embedding model loaded once per process, and the optional rerank hook
//! configuration.

use std::path::PathBuf;
use std::sync::Arc;

use rusqlite::{Connection, OpenFlags};

use qpg_model::{Error, Result};
use qpg_query::RerankConfig;
use qpg_vector::EmbeddingModel;

pub struct AppState {
    pub catalog_path: PathBuf,
    /// `None` when model assets haven't been fetched by `qpg model init`
    /// yet; `qpg_search`/`qpg_deep_search` then fall back to lexical-only
    /// retrieval rather than failing outright.
    pub model: Option<Arc<EmbeddingModel>>,
    pub rerank: Option<RerankConfig>,
}

impl AppState {
    pub fn new(catalog_path: PathBuf, model: Option<Arc<EmbeddingModel>>, rerank: Option<RerankConfig>) -> Self {
        AppState {
            catalog_path,
            model,
            rerank,
        }
    }

    /// Open a fresh read-only connection for one request. Readers never
    /// take the catalog's write lock and so never block a concurrent
    /// per-source rebuild beyond its final commit (spec §5).
    pub fn open_reader(&self) -> Result<Connection> {
        Connection::open_with_flags(&self.catalog_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| Error::Other(anyhow::anyhow!("opening catalog for read: {e}")))
    }
}
