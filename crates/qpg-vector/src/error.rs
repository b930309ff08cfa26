use thiserror::Error;

#[derive(Debug, Error)]
pub enum VectorError {
    #[error("vector store error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("embedding model error: {0}")]
    Model(#[from] anyhow::Error),
    #[error("malformed stored vector for object {object_id}: {reason}")]
    MalformedVector { object_id: String, reason: String },
    #[error("embedding dimensionality mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

pub type Result<T> = std::result::Result<T, VectorError>;
