//! HTTP handlers for tool listing and invocation

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use super::dispatch::dispatch;
use super::registry::{tool_definitions, ToolDefinition};
use crate::error::{AppError, AppResult};
use crate::external::OdooGateway;
use crate::AppState;

/// List every tool with its input schema
pub async fn list_tools() -> Json<Vec<ToolDefinition>> {
    Json(tool_definitions())
}

/// Call a tool; an empty body means no arguments
pub async fn call_tool<G: OdooGateway + 'static>(
    State(state): State<AppState<G>>,
    Path(name): Path<String>,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let arguments = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::Validation(format!("Invalid JSON body: {}", e)))?
    };
    let result = dispatch(state.gateway.as_ref(), &state.config, &name, arguments).await?;
    Ok(Json(result))
}
