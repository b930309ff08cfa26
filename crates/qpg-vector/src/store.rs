//! Vector Index storage: stores one dense vector per object and answers
//! nearest-neighbor queries. Vectors are stored as JSON-encoded-equivalent
//! little-endian float blobs and similarity is computed in-process; see
//! `DESIGN.md` for why the native-extension backend described in spec
//! §4.8/§9 was not wired up.

use qpg_model::ObjectId;
use rusqlite::{params, Connection};

use crate::error::{Result, VectorError};
use crate::model::EMBEDDING_DIM;

#[derive(Debug, Clone, PartialEq)]
pub struct VectorHit {
    pub object_id: ObjectId,
    pub score: f64,
}

/// Store (or replace) the embedding for one object.
pub fn store(
    conn: &Connection,
    object_id: ObjectId,
    vector: &[f32],
    model_id: &str,
    source_text_hash: &str,
) -> Result<()> {
    let blob = encode_vector(vector);
    conn.execute(
        "INSERT INTO object_vectors (object_id, vector, model_id, source_text_hash)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(object_id) DO UPDATE SET
            vector = excluded.vector,
            model_id = excluded.model_id,
            source_text_hash = excluded.source_text_hash",
        params![object_id.to_string(), blob, model_id, source_text_hash],
    )?;
    Ok(())
}

/// The `source_text_hash` stored for `object_id`, if any -- used to skip
/// re-embedding objects whose lexical text hasn't changed.
pub fn stored_text_hash(conn: &Connection, object_id: ObjectId) -> Result<Option<String>> {
    conn.query_row(
        "SELECT source_text_hash FROM object_vectors WHERE object_id = ?1",
        params![object_id.to_string()],
        |row| row.get(0),
    )
    .map(Some)
    .or_else(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => Ok(None),
        other => Err(VectorError::from(other)),
    })
}

/// Find the `limit` nearest stored vectors to `query`, ranked by cosine
/// similarity descending (`score = 1 - cosine_distance`).
pub fn nearest(conn: &Connection, query: &[f32], limit: usize) -> Result<Vec<VectorHit>> {
    let mut stmt = conn.prepare("SELECT object_id, vector FROM object_vectors")?;
    let rows = stmt.query_map([], |row| {
        let id: String = row.get(0)?;
        let blob: Vec<u8> = row.get(1)?;
        Ok((id, blob))
    })?;

    let mut scored = Vec::new();
    for row in rows {
        let (id, blob) = row?;
        let object_id =
            ObjectId::from_hex(&id).map_err(|_| VectorError::MalformedVector {
                object_id: id.clone(),
                reason: "invalid object_id hex".into(),
            })?;
        let vector = decode_vector(&blob, &id)?;
        let score = cosine_similarity(query, &vector);
        scored.push(VectorHit { object_id, score });
    }

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.object_id.cmp(&b.object_id))
    });
    scored.truncate(limit);
    Ok(scored)
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_vector(blob: &[u8], object_id: &str) -> Result<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return Err(VectorError::MalformedVector {
            object_id: object_id.to_string(),
            reason: format!("vector blob length {} not a multiple of 4", blob.len()),
        });
    }
    let got = blob.len() / 4;
    if got != EMBEDDING_DIM {
        return Err(VectorError::DimensionMismatch {
            expected: EMBEDDING_DIM,
            got,
        });
    }
    Ok(blob
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// `1 - cosine_distance`, i.e. plain cosine similarity.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qpg_model::ObjectKind;

    fn conn_with_table() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE object_vectors (
                object_id TEXT PRIMARY KEY,
                vector BLOB NOT NULL,
                model_id TEXT NOT NULL,
                source_text_hash TEXT NOT NULL
            );",
        )
        .unwrap();
        conn
    }

    #[test]
    fn stores_and_finds_nearest_by_cosine() {
        let conn = conn_with_table();
        let a = ObjectId::derive("work", ObjectKind::Table, "public.orders");
        let b = ObjectId::derive("work", ObjectKind::Table, "public.refunds");

        let mut va = vec![0f32; EMBEDDING_DIM];
        va[0] = 1.0;
        let mut vb = vec![0f32; EMBEDDING_DIM];
        vb[1] = 1.0;

        store(&conn, a, &va, "codebert-base-v1", "hash-a").unwrap();
        store(&conn, b, &vb, "codebert-base-v1", "hash-b").unwrap();

        let hits = nearest(&conn, &va, 1).unwrap();
        assert_eq!(hits[0].object_id, a);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_of_orthogonal_vectors_is_zero() {
        let mut a = vec![0f32; 4];
        a[0] = 1.0;
        let mut b = vec![0f32; 4];
        b[1] = 1.0;
        assert!((cosine_similarity(&a, &b)).abs() < 1e-9);
    }
}
