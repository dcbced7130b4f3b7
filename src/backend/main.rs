/**
 * Auth Server Entry Point
 *
 * Loads `.env`, initializes tracing, reads the settings and serves the
 * application on `SERVER_PORT`.
 */

use rest_auth_toolkit::backend::server::config::{init_tracing, load_env_file, load_settings};
use rest_auth_toolkit::backend::server::create_app;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG may come from .env
    load_env_file();
    init_tracing();

    tracing::info!("Server initialization started");
    let settings = load_settings()?;

    let port = settings.server_port;
    let app = create_app(settings).await?;

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
