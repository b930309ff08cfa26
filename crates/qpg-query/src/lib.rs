//! Query Planner (spec §4.9): deterministic expansion, parallel lexical +
//! vector retrieval, reciprocal rank fusion, and an advisory rerank hook.

mod expansion;
mod fusion;
mod planner;
mod rerank;

pub use expansion::expand;
pub use fusion::{reciprocal_rank_fusion, FusedHit, RRF_K, TOP_RANK_BONUS};
pub use planner::{
    hybrid_query, search_lexical, search_vector, CandidateFilter, ObjectLookup, QueryError,
    RerankConfig, ScoreFilter, DEFAULT_TOP_N,
};
pub use rerank::{rerank, HookError, DEFAULT_TIMEOUT};
