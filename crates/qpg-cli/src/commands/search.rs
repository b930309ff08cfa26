//! `qpg search|vsearch|query` (spec §4.9): the three retrieval ops the
//! CLI exposes directly, distinct from the tool-surface names `qpg-server`
//! answers over JSON-RPC (spec §4.11 only bundles the hybrid plan).

use qpg_model::{Error, ObjectKind, Result};
use qpg_query::{CandidateFilter, ObjectLookup};

#[derive(Debug, clap::Args)]
pub struct SearchArgs {
    pub query: String,
    #[clap(long)]
    pub source: Option<String>,
    #[clap(long)]
    pub schema: Option<String>,
    #[clap(long)]
    pub kind: Option<String>,
    #[clap(long, default_value_t = qpg_query::DEFAULT_TOP_N)]
    pub top_n: usize,
}

struct CatalogLookup<'a>(&'a rusqlite::Connection);

impl<'a> ObjectLookup for CatalogLookup<'a> {
    fn schema_of(&self, id: qpg_model::ObjectId) -> Option<String> {
        self.0
            .query_row(
                "SELECT schema_name FROM db_objects WHERE object_id = ?1",
                rusqlite::params![id.to_string()],
                |row| row.get(0),
            )
            .ok()
    }
    fn kind_of(&self, id: qpg_model::ObjectId) -> Option<ObjectKind> {
        let raw: Option<String> = self
            .0
            .query_row(
                "SELECT kind FROM db_objects WHERE object_id = ?1",
                rusqlite::params![id.to_string()],
                |row| row.get(0),
            )
            .ok();
        raw.and_then(|k| k.parse().ok())
    }
    fn source_of(&self, id: qpg_model::ObjectId) -> Option<String> {
        self.0
            .query_row(
                "SELECT source_name FROM db_objects WHERE object_id = ?1",
                rusqlite::params![id.to_string()],
                |row| row.get(0),
            )
            .ok()
    }
}

fn filter_from(args: &SearchArgs) -> Result<CandidateFilter> {
    let kind = args
        .kind
        .as_deref()
        .map(|k| k.parse::<ObjectKind>())
        .transpose()
        .map_err(|e| Error::NotFound(format!("unrecognized kind: {e}")))?;
    Ok(CandidateFilter {
        schema: args.schema.clone(),
        kind,
        source: args.source.clone(),
    })
}

fn print_hits(conn: &rusqlite::Connection, ids_and_scores: Vec<(qpg_model::ObjectId, f64)>) {
    let mut table = comfy_table::Table::new();
    table.set_header(vec!["score", "fqname", "kind", "object_id"]);
    for (id, score) in ids_and_scores {
        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT fqname, kind FROM db_objects WHERE object_id = ?1",
                rusqlite::params![id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .ok();
        let (fqname, kind) = row.unwrap_or_default();
        table.add_row(vec![format!("{score:.4}"), fqname, kind, id.to_string()]);
    }
    println!("{table}");
}

/// `qpg search` (spec §4.9 `search`): lexical-only.
pub fn run_lexical(catalog_path: &std::path::Path, args: SearchArgs) -> Result<()> {
    let conn = qpg_catalog::open_or_create(catalog_path).map_err(|e| Error::Other(anyhow::anyhow!(e)))?;
    let lookup = CatalogLookup(&conn);
    let filter = filter_from(&args)?;
    let hits = qpg_query::search_lexical(&conn, &args.query, &lookup, &filter, args.top_n)
        .map_err(|e| Error::Other(anyhow::anyhow!(e)))?;
    print_hits(&conn, hits.into_iter().map(|h| (h.object_id, h.score)).collect());
    Ok(())
}

/// `qpg vsearch` (spec §4.9 `vsearch`): vector-only.
pub fn run_vector(catalog_path: &std::path::Path, args: SearchArgs) -> Result<()> {
    let conn = qpg_catalog::open_or_create(catalog_path).map_err(|e| Error::Other(anyhow::anyhow!(e)))?;
    let lookup = CatalogLookup(&conn);
    let filter = filter_from(&args)?;
    let model_dir = qpg_vector::model_dir();
    let model = qpg_vector::EmbeddingModel::load(&model_dir)
        .map_err(|e| Error::ConfigError(format!("embedding model not initialized: {e}")))?;
    let hits = qpg_query::search_vector(&conn, &model, &args.query, &lookup, &filter, args.top_n)
        .map_err(|e| Error::Other(anyhow::anyhow!(e)))?;
    print_hits(&conn, hits.into_iter().map(|h| (h.object_id, h.score)).collect());
    Ok(())
}

/// `qpg query` (spec §4.9 the full hybrid plan): expand, fuse, optionally
/// rerank if `--rerank-hook` is configured.
pub async fn run_hybrid(
    catalog_path: &std::path::Path,
    args: SearchArgs,
    rerank: Option<qpg_query::RerankConfig>,
) -> Result<()> {
    let conn = qpg_catalog::open_or_create(catalog_path).map_err(|e| Error::Other(anyhow::anyhow!(e)))?;
    let lookup = CatalogLookup(&conn);
    let filter = filter_from(&args)?;
    let model_dir = qpg_vector::model_dir();
    let model = qpg_vector::EmbeddingModel::load(&model_dir)
        .map_err(|e| Error::ConfigError(format!("embedding model not initialized: {e}")))?;
    let (fused, hook_error) = qpg_query::hybrid_query(
        &conn,
        &model,
        &args.query,
        &lookup,
        &filter,
        &qpg_query::ScoreFilter::default(),
        rerank.as_ref(),
        args.top_n,
    )
    .await
    .map_err(|e| Error::Other(anyhow::anyhow!(e)))?;
    if let Some(e) = hook_error {
        eprintln!("rerank hook failed, showing fused order: {e}");
    }
    print_hits(&conn, fused.into_iter().map(|h| (h.object_id, h.score)).collect());
    Ok(())
}
