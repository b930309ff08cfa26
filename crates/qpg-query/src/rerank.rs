//! Optional external rerank hook (spec §4.9 step 4): an advisory
//! subprocess that may permute the fused candidate order. Grounded on the
//! `config-encryption` crate's subprocess-with-piped-stdio pattern, made
//! async and timeout-bounded since this sits on the query hot path.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::fusion::FusedHit;
use qpg_model::ObjectId;

/// Default hard timeout for the rerank subprocess (spec §5).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum HookError {
    #[error("rerank hook failed to start: {0}")]
    Spawn(std::io::Error),
    #[error("rerank hook timed out after {0:?}")]
    Timeout(Duration),
    #[error("rerank hook exited with status {0}")]
    NonZeroExit(std::process::ExitStatus),
    #[error("rerank hook produced unparseable output: {0}")]
    MalformedOutput(#[from] serde_json::Error),
    #[error("rerank hook returned an unknown object_id: {0}")]
    UnknownObjectId(String),
    #[error("rerank hook omitted object_id(s) present in the candidate set")]
    MissingObjectIds,
}

#[derive(Debug, Serialize)]
struct HookRequest<'a> {
    query: &'a str,
    results: Vec<HookCandidate>,
}

#[derive(Debug, Serialize)]
struct HookCandidate {
    object_id: String,
    score: f64,
}

/// Run the configured rerank command over `fused`, returning the
/// permuted order on success. The hook is advisory: the candidate set
/// returned is always exactly `fused`'s set, only reordered; any
/// disagreement (unknown or missing ids) is itself a [`HookError`].
pub async fn rerank(
    command: &str,
    args: &[String],
    query: &str,
    fused: &[FusedHit],
    timeout: Duration,
) -> Result<Vec<FusedHit>, HookError> {
    let request = HookRequest {
        query,
        results: fused
            .iter()
            .map(|h| HookCandidate {
                object_id: h.object_id.to_string(),
                score: h.score,
            })
            .collect(),
    };
    let payload = serde_json::to_vec(&request)?;

    let run = async {
        let mut child = Command::new(command)
            .args(args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(HookError::Spawn)?;

        let mut stdin = child.stdin.take().expect("piped stdin");
        stdin
            .write_all(&payload)
            .await
            .map_err(HookError::Spawn)?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .map_err(HookError::Spawn)?;
        if !output.status.success() {
            return Err(HookError::NonZeroExit(output.status));
        }
        let parsed: Vec<String> = serde_json::from_slice(&output.stdout)?;
        Ok(parsed)
    };

    let ordered_ids = match tokio::time::timeout(timeout, run).await {
        Ok(result) => result?,
        Err(_) => return Err(HookError::Timeout(timeout)),
    };

    apply_order(fused, &ordered_ids)
}

fn apply_order(fused: &[FusedHit], ordered_ids: &[String]) -> Result<Vec<FusedHit>, HookError> {
    use std::collections::HashMap;

    let by_id: HashMap<ObjectId, &FusedHit> =
        fused.iter().map(|h| (h.object_id, h)).collect();

    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(fused.len());
    for raw_id in ordered_ids {
        let object_id = ObjectId::from_fragment(raw_id)
            .map_err(|_| HookError::UnknownObjectId(raw_id.clone()))?;
        let hit = by_id
            .get(&object_id)
            .ok_or_else(|| HookError::UnknownObjectId(raw_id.clone()))?;
        if seen.insert(object_id) {
            out.push((*hit).clone());
        }
    }
    if out.len() != fused.len() {
        return Err(HookError::MissingObjectIds);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qpg_model::ObjectKind;

    fn hit(name: &str, score: f64) -> FusedHit {
        FusedHit {
            object_id: ObjectId::derive("work", ObjectKind::Table, name),
            score,
        }
    }

    #[test]
    fn apply_order_permutes_without_changing_the_set() {
        let a = hit("public.a", 0.9);
        let b = hit("public.b", 0.5);
        let fused = vec![a.clone(), b.clone()];
        let ordered_ids = vec![b.object_id.to_string(), a.object_id.to_string()];
        let reordered = apply_order(&fused, &ordered_ids).unwrap();
        assert_eq!(reordered[0].object_id, b.object_id);
        assert_eq!(reordered[1].object_id, a.object_id);
    }

    #[test]
    fn apply_order_rejects_missing_ids() {
        let a = hit("public.a", 0.9);
        let b = hit("public.b", 0.5);
        let fused = vec![a.clone(), b];
        let ordered_ids = vec![a.object_id.to_string()];
        assert!(matches!(
            apply_order(&fused, &ordered_ids),
            Err(HookError::MissingObjectIds)
        ));
    }

    #[test]
    fn apply_order_rejects_unknown_ids() {
        let a = hit("public.a", 0.9);
        let fused = vec![a];
        let ordered_ids = vec!["deadbeefdeadbeef".to_string()];
        assert!(matches!(
            apply_order(&fused, &ordered_ids),
            Err(HookError::UnknownObjectId(_))
        ));
    }
}
