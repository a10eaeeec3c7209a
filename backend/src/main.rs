//! Inventory Analytics Server
//!
//! Serves the inventory analysis tools over HTTP or stdio, depending on
//! the configured transport.

use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inventory_analytics_backend::config::{Config, Transport};
use inventory_analytics_backend::{create_app, stdio, AppState, OdooClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout belongs to the stdio transport
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "inventory_analytics_server=debug,inventory_analytics_backend=debug,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Inventory Analytics Server");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!(url = %config.odoo.url, database = %config.odoo.database, "Using Odoo instance");

    let client = OdooClient::new(&config.odoo)?;

    match config.transport {
        Transport::Http => {
            let listener =
                tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port))
                    .await?;
            tracing::info!("Listening on {}", listener.local_addr()?);

            let app = create_app(AppState::new(client, config));
            axum::serve(listener, app).await?;
        }
        Transport::Stdio => {
            tracing::info!("Serving tool calls on stdio");
            let reader = BufReader::new(tokio::io::stdin());
            stdio::serve(&client, &config, reader, tokio::io::stdout()).await?;
        }
    }

    Ok(())
}
