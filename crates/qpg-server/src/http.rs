//! HTTP transport (spec §6): `POST /rpc` carries the same JSON-RPC
//! envelope as the stdio transport, `GET /healthz` is a bare liveness
//! probe distinct from the richer `qpg_status` tool. Grounded on
//! `control-plane-api::server`'s axum router wiring (teacher), pared
//! down to this crate's single unauthenticated local surface (spec §4.11:
//! "bound to localhost by default").

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::rpc::{dispatch, JsonRpcRequest, JsonRpcResponse};
use crate::state::AppState;
use qpg_catalog::{list_sources, object_count};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/rpc", post(rpc_handler))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn rpc_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<JsonRpcRequest>,
) -> Json<JsonRpcResponse> {
    Json(dispatch(&state, req).await)
}

/// Bare liveness probe (spec §6): no tool dispatch, just proof the
/// catalog file opens and how many objects it currently holds.
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let objects_indexed = state
        .open_reader()
        .ok()
        .and_then(|conn| {
            let sources = list_sources(&conn).ok()?;
            let total: i64 = sources
                .iter()
                .filter_map(|s| object_count(&conn, &s.name).ok())
                .sum();
            Some(total)
        })
        .unwrap_or(0);

    Json(json!({"status": "ok", "objects_indexed": objects_indexed}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn empty_state() -> Arc<AppState> {
        Arc::new(AppState::new(std::env::temp_dir().join("qpg-http-test-missing.sqlite"), None, None))
    }

    #[tokio::test]
    async fn healthz_reports_ok_even_without_a_catalog() {
        let app = router(empty_state());
        let resp = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn rpc_endpoint_dispatches_initialize() {
        let app = router(empty_state());
        let body = serde_json::to_vec(&serde_json::json!({
            "jsonrpc": "2.0", "method": "initialize", "params": null, "id": 1
        }))
        .unwrap();
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/rpc")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
