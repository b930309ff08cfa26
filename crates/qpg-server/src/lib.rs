//! Retrieval Tool Surface and server transports (spec §4.11, §6): the
//! same five tools and JSON-RPC envelope reachable over stdio (for an
//! MCP-style host process) or local HTTP (`POST /rpc`, `GET /healthz`).

mod envelope;
mod http;
mod rpc;
mod state;
mod stdio;
mod tools;

pub use envelope::{Envelope, ErrorBody};
pub use http::router;
pub use rpc::{dispatch, handle_raw, JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use state::AppState;
pub use stdio::serve_stdio;
pub use tools::{
    qpg_deep_search, qpg_get, qpg_list_sources, qpg_search, qpg_status, GetParams, SearchHit,
    SearchParams, SearchResponse, SourceStatus, SourceSummary, StatusReport,
};
