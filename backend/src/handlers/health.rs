//! Health check handlers

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

/// Root endpoint
pub async fn root() -> &'static str {
    "Odoo Inventory Analysis server is running. List tools at /tools, call one with POST /tools/:name."
}

/// Health check endpoint handler
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "inventory-analysis-mcp",
    })
}
