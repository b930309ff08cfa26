use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("catalog schema version mismatch: found {found}, expected {expected}")]
    VersionMismatch { found: i64, expected: i64 },
    #[error("catalog schema is not initialized")]
    Uninitialized,
    #[error("index build failed for source {source}: {reason}")]
    Build { source: String, reason: String },
    #[error("serializing catalog row: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid context target: {0}")]
    InvalidTarget(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
