//! Deterministic local embedding model: `codebert-base-v1`, 768-d, run
//! locally via `ort` with no network calls at query time.

use std::path::{Path, PathBuf};

use anyhow::Context;
use ort::session::Session;
use tokenizers::Tokenizer;

pub const MODEL_ID: &str = "microsoft__codebert-base";
pub const EMBEDDING_DIM: usize = 768;
const MAX_TOKENS: usize = 512;

/// Where model assets are downloaded to and reused read-only from (spec
/// §4.8): `${XDG_CACHE_HOME:-~/.cache}/qpg/models/microsoft__codebert-base`.
pub fn model_dir() -> PathBuf {
    let cache_dir = std::env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(|| PathBuf::from(".cache"));
    cache_dir.join("qpg").join("models").join(MODEL_ID)
}

/// A loaded embedding model: an ONNX session plus its tokenizer, ready to
/// embed text deterministically (same input always yields the same
/// vector).
pub struct EmbeddingModel {
    session: Session,
    tokenizer: Tokenizer,
}

impl EmbeddingModel {
    /// Load model assets from `dir` (normally [`model_dir`]). Assets must
    /// already have been fetched by the explicit `qpg model init` step;
    /// this never downloads anything itself.
    pub fn load(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let dir = dir.as_ref();
        let session = Session::builder()
            .context("constructing ONNX Runtime session builder")?
            .commit_from_file(dir.join("model.onnx"))
            .with_context(|| format!("loading ONNX model from {}", dir.display()))?;
        let tokenizer = Tokenizer::from_file(dir.join("tokenizer.json"))
            .map_err(|e| anyhow::anyhow!("loading tokenizer from {}: {e}", dir.display()))?;
        Ok(EmbeddingModel { session, tokenizer })
    }

    /// Embed `text` into a 768-d vector. Truncates to the model's token
    /// window and mean-pools the final hidden state, matching the
    /// standard sentence-embedding recipe for encoder-only transformers.
    pub fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("tokenizing embedding input: {e}"))?;

        let mut ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        ids.truncate(MAX_TOKENS);
        let mut mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        mask.truncate(MAX_TOKENS);

        let seq_len = ids.len();
        let input_ids = ndarray::Array2::from_shape_vec((1, seq_len), ids)?;
        let attention_mask = ndarray::Array2::from_shape_vec((1, seq_len), mask.clone())?;

        let outputs = self
            .session
            .run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
            ]?)
            .context("running embedding model inference")?;

        let hidden = outputs[0]
            .try_extract_tensor::<f32>()
            .context("extracting model output tensor")?;

        let hidden_view = hidden.view();
        let dim = hidden_view.shape()[2];
        let mut pooled = vec![0f32; dim];
        let mut total_mask = 0f32;
        for t in 0..seq_len {
            let m = mask[t] as f32;
            total_mask += m;
            for d in 0..dim {
                pooled[d] += hidden_view[[0, t, d]] * m;
            }
        }
        if total_mask > 0.0 {
            for v in pooled.iter_mut() {
                *v /= total_mask;
            }
        }
        Ok(pooled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_dir_defaults_under_cache_home() {
        std::env::set_var("XDG_CACHE_HOME", "/tmp/qpg-test-cache");
        let dir = model_dir();
        assert!(dir.ends_with("qpg/models/microsoft__codebert-base"));
        std::env::remove_var("XDG_CACHE_HOME");
    }
}
