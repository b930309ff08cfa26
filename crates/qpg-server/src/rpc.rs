//! JSON-RPC 2.0 framing (spec §4.11, §6): `initialize`, `tools/list`,
//! `tools/call`, shared by the stdio and HTTP transports. Protocol-level
//! errors (unknown method, malformed params) use the standard JSON-RPC
//! error object; a failed tool call instead returns `result` holding an
//! [`Envelope::Err`] so the "did the call happen" and "did it succeed"
//! layers stay distinct (spec §4.11).

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use qpg_model::Error as QpgError;

use crate::envelope::Envelope;
use crate::state::AppState;
use crate::tools;

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Value,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Value,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

const PARSE_ERROR: i64 = -32700;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

impl JsonRpcResponse {
    fn result(id: Value, result: Value) -> Self {
        JsonRpcResponse {
            jsonrpc: "2.0",
            result: Some(result),
            error: None,
            id,
        }
    }

    fn protocol_error(id: Value, code: i64, message: impl Into<String>) -> Self {
        JsonRpcResponse {
            jsonrpc: "2.0",
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
            id,
        }
    }
}

const TOOL_NAMES: &[&str] = &[
    "qpg_search",
    "qpg_deep_search",
    "qpg_get",
    "qpg_status",
    "qpg_list_sources",
];

/// Parse one line/body of input into a request, dispatch it, and always
/// return a response -- even a malformed request gets a JSON-RPC error
/// response rather than being dropped, so stdio callers can match
/// requests to responses strictly by position.
pub async fn handle_raw(state: &AppState, raw: &str) -> JsonRpcResponse {
    match serde_json::from_str::<JsonRpcRequest>(raw) {
        Ok(req) => dispatch(state, req).await,
        Err(e) => JsonRpcResponse::protocol_error(Value::Null, PARSE_ERROR, e.to_string()),
    }
}

pub async fn dispatch(state: &AppState, req: JsonRpcRequest) -> JsonRpcResponse {
    let id = req.id.clone();
    match req.method.as_str() {
        "initialize" => JsonRpcResponse::result(
            id,
            json!({
                "protocolVersion": "2024-11-05",
                "serverInfo": {"name": "qpg", "version": env!("CARGO_PKG_VERSION")},
                "capabilities": {"tools": {}},
            }),
        ),
        "tools/list" => JsonRpcResponse::result(
            id,
            json!({
                "tools": TOOL_NAMES.iter().map(|n| json!({"name": n})).collect::<Vec<_>>(),
            }),
        ),
        "tools/call" => call_tool(state, id, req.params).await,
        other => JsonRpcResponse::protocol_error(
            id,
            METHOD_NOT_FOUND,
            format!("unknown method: {other}"),
        ),
    }
}

async fn call_tool(state: &AppState, id: Value, params: Value) -> JsonRpcResponse {
    #[derive(Deserialize)]
    struct ToolCall {
        name: String,
        #[serde(default)]
        arguments: Value,
    }

    let call: ToolCall = match serde_json::from_value(params) {
        Ok(c) => c,
        Err(e) => return JsonRpcResponse::protocol_error(id, INVALID_PARAMS, e.to_string()),
    };

    let envelope = match call.name.as_str() {
        "qpg_search" => run_search(state, call.arguments, tools::qpg_search).await,
        "qpg_deep_search" => run_search(state, call.arguments, tools::qpg_deep_search).await,
        "qpg_get" => match serde_json::from_value(call.arguments) {
            Ok(p) => to_envelope(tools::qpg_get(state, p)),
            Err(e) => return JsonRpcResponse::protocol_error(id, INVALID_PARAMS, e.to_string()),
        },
        "qpg_status" => to_envelope(tools::qpg_status(state)),
        "qpg_list_sources" => to_envelope(tools::qpg_list_sources(state)),
        other => {
            return JsonRpcResponse::protocol_error(id, METHOD_NOT_FOUND, format!("unknown tool: {other}"))
        }
    };

    JsonRpcResponse::result(id, envelope)
}

async fn run_search<F, Fut>(state: &AppState, arguments: Value, f: F) -> Value
where
    F: FnOnce(&AppState, tools::SearchParams) -> Fut,
    Fut: std::future::Future<Output = qpg_model::Result<tools::SearchResponse>>,
{
    let params: tools::SearchParams = match serde_json::from_value(arguments) {
        Ok(p) => p,
        Err(e) => return serde_json::to_value(Envelope::<()>::err(&QpgError::ConfigError(e.to_string()))).unwrap(),
    };
    to_envelope(f(state, params).await)
}

fn to_envelope<T: Serialize>(result: qpg_model::Result<T>) -> Value {
    match result {
        Ok(data) => serde_json::to_value(Envelope::ok(data)).unwrap(),
        Err(e) => serde_json::to_value(Envelope::<()>::err(&e)).unwrap(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn empty_state() -> AppState {
        AppState::new(PathBuf::from(":memory:"), None, None)
    }

    #[tokio::test]
    async fn initialize_reports_server_info() {
        let state = empty_state();
        let req = JsonRpcRequest {
            jsonrpc: "2.0".into(),
            method: "initialize".into(),
            params: Value::Null,
            id: json!(1),
        };
        let resp = dispatch(&state, req).await;
        assert!(resp.error.is_none());
        assert_eq!(resp.result.unwrap()["serverInfo"]["name"], "qpg");
    }

    #[tokio::test]
    async fn tools_list_names_every_surface_tool() {
        let state = empty_state();
        let req = JsonRpcRequest {
            jsonrpc: "2.0".into(),
            method: "tools/list".into(),
            params: Value::Null,
            id: json!(2),
        };
        let resp = dispatch(&state, req).await;
        let names = resp.result.unwrap()["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect::<Vec<_>>();
        assert_eq!(names.len(), TOOL_NAMES.len());
    }

    #[tokio::test]
    async fn unknown_method_is_a_protocol_error() {
        let state = empty_state();
        let req = JsonRpcRequest {
            jsonrpc: "2.0".into(),
            method: "not_a_method".into(),
            params: Value::Null,
            id: json!(3),
        };
        let resp = dispatch(&state, req).await;
        assert_eq!(resp.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn tool_failure_is_a_result_level_envelope_error() {
        let state = empty_state();
        let req = JsonRpcRequest {
            jsonrpc: "2.0".into(),
            method: "tools/call".into(),
            params: json!({"name": "qpg_get", "arguments": {"source": "work", "identifier": "public.nope"}}),
            id: json!(4),
        };
        let resp = dispatch(&state, req).await;
        assert!(resp.error.is_none());
        assert_eq!(resp.result.unwrap()["ok"], false);
    }

    #[tokio::test]
    async fn malformed_request_is_a_parse_error() {
        let state = empty_state();
        let resp = handle_raw(&state, "not json").await;
        assert_eq!(resp.error.unwrap().code, PARSE_ERROR);
    }
}
