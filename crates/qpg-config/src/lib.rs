//! Configuration resolution (spec §4.14): CLI > env > YAML file > built-in
//! defaults, grounded on `flowctl::config::Config`'s serde-derived,
//! `Default`-backed struct, generalized into a precedence-merging
//! resolver.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_RERANK_TIMEOUT_SECS: u64 = 5;

/// Everything the rest of the system reads configuration through. Never
/// constructed directly outside tests; build one with [`resolve`].
#[derive(Clone, PartialEq, Eq, Default)]
pub struct ResolvedConfig {
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub openai_base_url: Option<String>,
    pub rerank_hook: Option<PathBuf>,
    pub rerank_timeout: Option<Duration>,
}

impl ResolvedConfig {
    pub fn rerank_timeout_or_default(&self) -> Duration {
        self.rerank_timeout
            .unwrap_or(Duration::from_secs(DEFAULT_RERANK_TIMEOUT_SECS))
    }
}

/// `openai_api_key` is always redacted; nothing else in this struct is
/// secret (spec §4.14).
impl std::fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| redact()))
            .field("openai_model", &self.openai_model)
            .field("openai_base_url", &self.openai_base_url)
            .field("rerank_hook", &self.rerank_hook)
            .field("rerank_timeout", &self.rerank_timeout)
            .finish()
    }
}

impl std::fmt::Display for ResolvedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

fn redact() -> &'static str {
    "sk-***redacted***"
}

/// CLI-supplied overrides; every field is optional since `clap` only
/// populates what the operator actually passed.
#[derive(Debug, Default, clap::Args)]
pub struct ConfigArgs {
    #[clap(long, env = "QPG_OPENAI_API_KEY")]
    pub openai_api_key: Option<String>,
    #[clap(long, env = "QPG_OPENAI_MODEL")]
    pub openai_model: Option<String>,
    #[clap(long, env = "QPG_OPENAI_BASE_URL")]
    pub openai_base_url: Option<String>,
    #[clap(long, env = "QPG_RERANK_HOOK")]
    pub rerank_hook: Option<PathBuf>,
    #[clap(long, env = "QPG_RERANK_TIMEOUT_SECS")]
    pub rerank_timeout_secs: Option<u64>,
}

/// The subset of fields a YAML config file or its `KEY=VALUE` fallback
/// may set.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    openai_api_key: Option<String>,
    openai_model: Option<String>,
    openai_base_url: Option<String>,
    rerank_hook: Option<PathBuf>,
    rerank_timeout_secs: Option<u64>,
}

/// `${XDG_CONFIG_HOME:-~/.config}/qpg/config.yaml` (spec §4.14).
pub fn default_config_path() -> PathBuf {
    let config_dir = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"));
    config_dir.join("qpg").join("config.yaml")
}

/// Resolve configuration at CLI > env (handled by `clap`'s own `env`
/// attribute on [`ConfigArgs`]) > YAML file > built-in defaults
/// precedence. `OPENAI_*` is consulted as a fallback alias for anything
/// `QPG_OPENAI_*` doesn't already set, matching the common convention of
/// OpenAI-compatible tools.
pub fn resolve(cli: ConfigArgs, config_path: &std::path::Path) -> anyhow::Result<ResolvedConfig> {
    let file = load_file_config(config_path)?;

    let openai_api_key = cli
        .openai_api_key
        .or_else(|| std::env::var("OPENAI_API_KEY").ok())
        .or(file.openai_api_key);
    let openai_model = cli
        .openai_model
        .or_else(|| std::env::var("OPENAI_MODEL").ok())
        .or(file.openai_model);
    let openai_base_url = cli
        .openai_base_url
        .or_else(|| std::env::var("OPENAI_BASE_URL").ok())
        .or(file.openai_base_url);
    let rerank_hook = cli.rerank_hook.or(file.rerank_hook);
    let rerank_timeout = cli
        .rerank_timeout_secs
        .or(file.rerank_timeout_secs)
        .map(Duration::from_secs);

    Ok(ResolvedConfig {
        openai_api_key,
        openai_model,
        openai_base_url,
        rerank_hook,
        rerank_timeout,
    })
}

fn load_file_config(path: &std::path::Path) -> anyhow::Result<FileConfig> {
    let Ok(raw) = std::fs::read_to_string(path) else {
        return Ok(FileConfig::default());
    };
    match serde_yaml::from_str::<FileConfig>(&raw) {
        Ok(cfg) => Ok(cfg),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "config file is not valid YAML, trying KEY=VALUE fallback");
            Ok(parse_key_value_fallback(&raw))
        }
    }
}

/// A permissive `KEY=VALUE` per-line parser used when the config file
/// isn't valid YAML (spec §4.14).
fn parse_key_value_fallback(raw: &str) -> FileConfig {
    let mut cfg = FileConfig::default();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim().trim_matches('"').to_string();
        match key {
            "openai_api_key" => cfg.openai_api_key = Some(value),
            "openai_model" => cfg.openai_model = Some(value),
            "openai_base_url" => cfg.openai_base_url = Some(value),
            "rerank_hook" => cfg.rerank_hook = Some(PathBuf::from(value)),
            "rerank_timeout_secs" => cfg.rerank_timeout_secs = value.parse().ok(),
            _ => {}
        }
    }
    cfg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_api_key() {
        let cfg = ResolvedConfig {
            openai_api_key: Some("sk-real-secret".into()),
            ..Default::default()
        };
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("sk-real-secret"));
        assert!(rendered.contains("redacted"));
    }

    #[test]
    fn yaml_file_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "openai_model: gpt-4o-mini\n").unwrap();
        let cfg = resolve(ConfigArgs::default(), &path).unwrap();
        assert_eq!(cfg.openai_model.as_deref(), Some("gpt-4o-mini"));
    }

    #[test]
    fn key_value_fallback_used_for_non_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.txt");
        std::fs::write(&path, "openai_model=gpt-4o-mini\nrerank_timeout_secs=8\n").unwrap();
        let cfg = resolve(ConfigArgs::default(), &path).unwrap();
        assert_eq!(cfg.openai_model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(cfg.rerank_timeout_or_default(), Duration::from_secs(8));
    }

    #[test]
    fn cli_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "openai_model: from-file\n").unwrap();
        let cli = ConfigArgs {
            openai_model: Some("from-cli".into()),
            ..Default::default()
        };
        let cfg = resolve(cli, &path).unwrap();
        assert_eq!(cfg.openai_model.as_deref(), Some("from-cli"));
    }
}
