//! `qpg model init` (spec §4.8, §6): fetches the embedding model assets
//! into the local model cache. The only network call this system ever
//! makes outside an operator-configured rerank hook or LLM context flow.

use qpg_model::{Error, Result};

const MODEL_BASE_URL: &str = "https://huggingface.co/microsoft/codebert-base/resolve/main";
const ASSETS: &[&str] = &["model.onnx", "tokenizer.json"];

#[derive(Debug, clap::Args)]
pub struct ModelInitArgs {
    /// Overrides the default Hugging Face resolve URL, for mirrors or
    /// locally hosted asset bundles.
    #[clap(long)]
    pub base_url: Option<String>,
    #[clap(long)]
    pub force: bool,
}

pub async fn run(args: ModelInitArgs) -> Result<()> {
    let dir = qpg_vector::model_dir();
    std::fs::create_dir_all(&dir).map_err(|e| Error::Other(anyhow::anyhow!(e)))?;

    let base_url = args.base_url.as_deref().unwrap_or(MODEL_BASE_URL);
    for asset in ASSETS {
        let dest = dir.join(asset);
        if dest.exists() && !args.force {
            tracing::info!(asset, "already present, skipping");
            continue;
        }
        let url = format!("{base_url}/{asset}");
        tracing::info!(url, "downloading model asset");
        let resp = reqwest::get(&url)
            .await
            .map_err(|e| Error::ConfigError(format!("fetching {url}: {e}")))?;
        if !resp.status().is_success() {
            return Err(Error::ConfigError(format!(
                "fetching {url}: http {}",
                resp.status()
            )));
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| Error::ConfigError(format!("reading response body for {url}: {e}")))?;
        std::fs::write(&dest, &bytes).map_err(|e| Error::Other(anyhow::anyhow!(e)))?;
    }

    println!("model assets ready at {}", dir.display());
    Ok(())
}
