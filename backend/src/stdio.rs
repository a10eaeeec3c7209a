//! Line-delimited JSON transport
//!
//! Each input line is `{"tool": name, "arguments": {...}}` or
//! `{"list_tools": true}`; each gets exactly one output line.

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::Config;
use crate::error::AppError;
use crate::external::OdooGateway;
use crate::handlers::{dispatch, tool_definitions};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StdioRequest {
    ListTools {
        list_tools: bool,
    },
    Call {
        tool: String,
        #[serde(default)]
        arguments: Value,
    },
}

fn error_line(err: &AppError) -> Value {
    let payload = err.to_payload();
    json!({"error": payload.error, "is_error": payload.is_error})
}

/// Answer one request line
pub async fn handle_line<G: OdooGateway>(gateway: &G, config: &Config, line: &str) -> Value {
    let request: StdioRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            return error_line(&AppError::Validation(format!("Invalid request: {}", e)));
        }
    };

    match request {
        StdioRequest::ListTools { list_tools: true } => json!({"result": tool_definitions()}),
        StdioRequest::ListTools { list_tools: false } => {
            error_line(&AppError::Validation("Nothing to do".to_string()))
        }
        StdioRequest::Call { tool, arguments } => {
            match dispatch(gateway, config, &tool, arguments).await {
                Ok(result) => json!({"result": result}),
                Err(e) => error_line(&e),
            }
        }
    }
}

/// Serve requests from `reader` until end of input
pub async fn serve<G, R, W>(gateway: &G, config: &Config, reader: R, mut writer: W) -> std::io::Result<()>
where
    G: OdooGateway,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let response = handle_line(gateway, config, line).await;
        let mut out = response.to_string();
        out.push('\n');
        writer.write_all(out.as_bytes()).await?;
        writer.flush().await?;
    }
    tracing::info!("Input closed, stdio transport stopping");
    Ok(())
}
