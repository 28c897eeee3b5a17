use axum::{Router, routing::get};
use tokio::net::TcpListener;

use anyhow::anyhow;

use cyn::{ServerConfig, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = ServerConfig::from_env().map_err(|e| anyhow!(e.to_string()))?;
    let address = config.address();
    println!("Starting server on {address}");

    // Create application state
    let app_state = AppState::new(config);

    // Public health check route plus the API routes
    let public_routes = Router::new().route("/", get(cyn::handlers::api::health_check));

    let app = public_routes
        .merge(routes::api::create_api_router())
        .with_state(app_state);

    // Create listener
    let listener = TcpListener::bind(&address).await?;

    println!("Server listening on {address}");

    // Start server
    axum::serve(listener, app).await?;

    Ok(())
}
