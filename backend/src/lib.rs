//! Inventory Analytics - Backend Library
//!
//! Analysis engines over an Odoo ERP, exposed as callable tools over HTTP
//! or line-delimited JSON on stdio.

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod routes;
pub mod services;
pub mod stdio;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use external::{OdooClient, OdooGateway};

/// Application state shared across handlers
pub struct AppState<G = OdooClient> {
    pub gateway: Arc<G>,
    pub config: Arc<Config>,
}

impl<G> AppState<G> {
    pub fn new(gateway: G, config: Config) -> Self {
        Self {
            gateway: Arc::new(gateway),
            config: Arc::new(config),
        }
    }
}

impl<G> Clone for AppState<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            config: Arc::clone(&self.config),
        }
    }
}

/// Create the application router with all routes and middleware
pub fn create_app<G: OdooGateway + 'static>(state: AppState<G>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .merge(routes::tool_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
