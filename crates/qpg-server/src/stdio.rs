//! Stdio transport (spec §6): newline-delimited JSON-RPC over stdin/stdout.
//! One request per line in, one response per line out, in order -- this is
//! the transport an MCP-style host process talks to `qpg serve` over.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::rpc::handle_raw;
use crate::state::AppState;

pub async fn serve_stdio(state: &AppState) -> std::io::Result<()> {
    let stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(stdin).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_raw(state, &line).await;
        let mut body = serde_json::to_string(&response).unwrap_or_else(|e| {
            format!(r#"{{"jsonrpc":"2.0","error":{{"code":-32603,"message":"{e}"}},"id":null}}"#)
        });
        body.push('\n');
        stdout.write_all(body.as_bytes()).await?;
        stdout.flush().await?;
    }
    Ok(())
}
