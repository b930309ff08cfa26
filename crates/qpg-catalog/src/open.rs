use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::error::{CatalogError, Result};
use crate::schema::{SCHEMA_SQL, SCHEMA_VERSION};

/// `${XDG_CACHE_HOME:-~/.cache}/qpg/index.sqlite`.
pub fn default_catalog_path() -> PathBuf {
    let cache_dir = std::env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(|| PathBuf::from(".cache"));
    cache_dir.join("qpg").join("index.sqlite")
}

/// Create a new, empty catalog at `path`, or open it if the schema is
/// already present.
pub fn open_or_create(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| CatalogError::Build {
            source: "catalog".into(),
            reason: format!("creating catalog directory: {e}"),
        })?;
    }

    let already_exists = path.exists();
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    if !already_exists {
        init_schema(&conn)?;
    } else {
        ensure_schema_version(&conn)?;
    }
    Ok(conn)
}

/// Open an in-memory catalog, primarily for tests.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    init_schema(&conn)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT INTO schema_meta (version) VALUES (?1)",
        [SCHEMA_VERSION],
    )?;
    Ok(())
}

fn ensure_schema_version(conn: &Connection) -> Result<()> {
    let found: Option<i64> = conn
        .query_row("SELECT version FROM schema_meta", [], |row| row.get(0))
        .ok();
    match found {
        Some(v) if v == SCHEMA_VERSION => Ok(()),
        Some(v) => Err(CatalogError::VersionMismatch {
            found: v,
            expected: SCHEMA_VERSION,
        }),
        None => Err(CatalogError::Uninitialized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_fresh_in_memory_catalog() {
        let conn = open_in_memory().expect("opens");
        let version: i64 = conn
            .query_row("SELECT version FROM schema_meta", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn reopening_an_existing_file_preserves_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.sqlite");
        {
            let conn = open_or_create(&path).unwrap();
            conn.execute(
                "INSERT INTO sources (name, dsn, created_at) VALUES ('work', 'postgresql://x', '2024-01-01T00:00:00Z')",
                [],
            )
            .unwrap();
        }
        let conn = open_or_create(&path).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM sources", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
