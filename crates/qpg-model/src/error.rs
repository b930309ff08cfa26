/// The error taxonomy shared by every crate boundary so the retrieval
/// tool surface and the CLI can map a failure onto a stable exit code or
/// response envelope error code without re-deriving the mapping in
/// multiple places.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("connection guard rejected read-only session settings: {0}")]
    GuardViolation(String),

    #[error("privilege check failed: prohibited privileges found: {0:?}")]
    PrivilegeFailure(Vec<String>),

    #[error("could not reach source database: {0}")]
    ConnectionError(String),

    #[error("canonical-identity collision while normalizing {fqname} ({kind})")]
    SchemaConflict { kind: String, fqname: String },

    #[error("index build failed for source {source}: {reason}")]
    IndexBuildError { source: String, reason: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("rerank hook failed: {0}")]
    HookError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Exit code reported by the CLI for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::NotFound(_) => 1,
            Error::PrivilegeFailure(_) => 2,
            Error::GuardViolation(_) | Error::ConnectionError(_) => 3,
            Error::SchemaConflict { .. }
            | Error::IndexBuildError { .. }
            | Error::ConfigError(_)
            | Error::Other(_) => 4,
            Error::HookError(_) => 0,
            Error::Cancelled => 1,
        }
    }

    /// Stable error code string for the JSON-RPC response envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Error::GuardViolation(_) => "guard_violation",
            Error::PrivilegeFailure(_) => "privilege_failure",
            Error::ConnectionError(_) => "connection_error",
            Error::SchemaConflict { .. } => "schema_conflict",
            Error::IndexBuildError { .. } => "index_build_error",
            Error::NotFound(_) => "not_found",
            Error::HookError(_) => "hook_error",
            Error::ConfigError(_) => "config_error",
            Error::Cancelled => "cancelled",
            Error::Other(_) => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
