//! `qpg serve` (spec §4.11, §6): stands up the retrieval tool surface over
//! stdio (default, for an MCP-style host process) or local HTTP.

use std::sync::Arc;

use qpg_model::{Error, Result};
use qpg_server::AppState;

#[derive(Debug, clap::Args)]
pub struct ServeArgs {
    /// Serve over HTTP instead of stdio.
    #[clap(long)]
    pub http: bool,
    /// Address to bind when `--http` is set (spec §4.11: "bound to
    /// localhost by default").
    #[clap(long, default_value = "127.0.0.1:4287")]
    pub bind: String,
}

pub async fn run(
    catalog_path: &std::path::Path,
    rerank: Option<qpg_query::RerankConfig>,
    args: ServeArgs,
) -> Result<()> {
    let model = load_model_if_present();
    let state = AppState::new(catalog_path.to_path_buf(), model, rerank);

    if args.http {
        let addr: std::net::SocketAddr = args
            .bind
            .parse()
            .map_err(|e| Error::ConfigError(format!("invalid --bind address: {e}")))?;
        let router = qpg_server::router(Arc::new(state));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Other(anyhow::anyhow!(e)))?;
        tracing::info!(%addr, "qpg serving over http");
        axum::serve(listener, router)
            .await
            .map_err(|e| Error::Other(anyhow::anyhow!(e)))?;
    } else {
        tracing::info!("qpg serving over stdio");
        qpg_server::serve_stdio(&state)
            .await
            .map_err(|e| Error::Other(anyhow::anyhow!(e)))?;
    }
    Ok(())
}

fn load_model_if_present() -> Option<Arc<qpg_vector::EmbeddingModel>> {
    let dir = qpg_vector::model_dir();
    if !dir.join("model.onnx").exists() {
        tracing::warn!("embedding model not installed; serving lexical-only results");
        return None;
    }
    match qpg_vector::EmbeddingModel::load(&dir) {
        Ok(model) => Some(Arc::new(model)),
        Err(e) => {
            tracing::warn!(error = %e, "failed to load embedding model; serving lexical-only results");
            None
        }
    }
}
