//! Route definitions for the inventory analytics server

use axum::{
    routing::{get, post},
    Router,
};

use crate::external::OdooGateway;
use crate::{handlers, AppState};

/// Tool listing and invocation routes
pub fn tool_routes<G: OdooGateway + 'static>() -> Router<AppState<G>> {
    Router::new()
        .route("/tools", get(handlers::list_tools))
        .route("/tools/:name", post(handlers::call_tool::<G>))
}
