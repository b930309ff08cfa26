//! Query Planner: fans a query out to the lexical and vector indexes,
//! fuses the results, and optionally reranks.

use std::time::Duration;

use qpg_model::{ObjectId, ObjectKind};
use rusqlite::Connection;
use thiserror::Error;

use crate::expansion::expand;
use crate::fusion::{reciprocal_rank_fusion, FusedHit};
use crate::rerank::{self, HookError};

/// Candidates are fetched with this many results per index before fusion.
pub const DEFAULT_TOP_N: usize = 50;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("lexical retrieval failed: {0}")]
    Lexical(#[from] qpg_lexical::LexicalError),
    #[error("vector retrieval failed: {0}")]
    Vector(#[from] qpg_vector::VectorError),
    #[error("embedding the query failed: {0}")]
    Embed(#[from] anyhow::Error),
}

/// Pre-fusion filters on domain attributes, applied to the candidate set
/// before fusion since they constrain domain.
#[derive(Debug, Clone, Default)]
pub struct CandidateFilter {
    pub schema: Option<String>,
    pub kind: Option<ObjectKind>,
    pub source: Option<String>,
}

/// Post-fusion filters on score, applied after fusion since they
/// constrain score rather than domain.
#[derive(Debug, Clone, Default)]
pub struct ScoreFilter {
    pub min_score: Option<f64>,
}

pub struct RerankConfig {
    pub command: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

/// Object metadata needed to apply a [`CandidateFilter`]; callers supply
/// a lookup since filtering needs the catalog's `db_objects` rows, not
/// just an `ObjectId`.
pub trait ObjectLookup {
    fn schema_of(&self, id: ObjectId) -> Option<String>;
    fn kind_of(&self, id: ObjectId) -> Option<ObjectKind>;
    fn source_of(&self, id: ObjectId) -> Option<String>;
}

fn passes_filter(lookup: &dyn ObjectLookup, id: ObjectId, filter: &CandidateFilter) -> bool {
    if let Some(schema) = &filter.schema {
        if lookup.schema_of(id).as_deref() != Some(schema.as_str()) {
            return false;
        }
    }
    if let Some(kind) = filter.kind {
        if lookup.kind_of(id) != Some(kind) {
            return false;
        }
    }
    if let Some(source) = &filter.source {
        if lookup.source_of(id).as_deref() != Some(source.as_str()) {
            return false;
        }
    }
    true
}

/// Run lexical-only retrieval (`search`).
pub fn search_lexical(
    conn: &Connection,
    query: &str,
    lookup: &dyn ObjectLookup,
    filter: &CandidateFilter,
    top_n: usize,
) -> Result<Vec<qpg_lexical::LexicalHit>, QueryError> {
    let expanded = expand(query).join(" ");
    let hits = qpg_lexical::search(conn, &expanded, top_n)?;
    Ok(hits
        .into_iter()
        .filter(|h| passes_filter(lookup, h.object_id, filter))
        .collect())
}

/// Run vector-only retrieval (`vsearch`).
pub fn search_vector(
    conn: &Connection,
    model: &qpg_vector::EmbeddingModel,
    query: &str,
    lookup: &dyn ObjectLookup,
    filter: &CandidateFilter,
    top_n: usize,
) -> Result<Vec<qpg_vector::VectorHit>, QueryError> {
    let query_vec = model.embed(query)?;
    let hits = qpg_vector::nearest(conn, &query_vec, top_n)?;
    Ok(hits
        .into_iter()
        .filter(|h| passes_filter(lookup, h.object_id, filter))
        .collect())
}

/// Run the full hybrid plan (`query`/`deep-search`): expand, fan out to
/// both indexes, fuse, filter on score, and optionally rerank.
pub async fn hybrid_query(
    conn: &Connection,
    model: &qpg_vector::EmbeddingModel,
    query: &str,
    lookup: &dyn ObjectLookup,
    candidate_filter: &CandidateFilter,
    score_filter: &ScoreFilter,
    rerank_config: Option<&RerankConfig>,
    top_n: usize,
) -> Result<(Vec<FusedHit>, Option<HookError>), QueryError> {
    let lexical_hits = search_lexical(conn, query, lookup, candidate_filter, top_n)?;
    let vector_hits = search_vector(conn, model, query, lookup, candidate_filter, top_n)?;

    let lexical_ids: Vec<ObjectId> = lexical_hits.iter().map(|h| h.object_id).collect();
    let vector_ids: Vec<ObjectId> = vector_hits.iter().map(|h| h.object_id).collect();

    let mut fused = reciprocal_rank_fusion(&lexical_ids, &vector_ids);

    if let Some(min_score) = score_filter.min_score {
        fused.retain(|h| h.score >= min_score);
    }

    let mut hook_error = None;
    if let Some(cfg) = rerank_config {
        match rerank::rerank(&cfg.command, &cfg.args, query, &fused, cfg.timeout).await {
            Ok(reordered) => fused = reordered,
            Err(e) => {
                tracing::warn!(error = %e, "rerank hook failed, retaining fused order");
                hook_error = Some(e);
            }
        }
    }

    Ok((fused, hook_error))
}
