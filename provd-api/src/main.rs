use anyhow::Result;
use provd_api::{create_app, Config};
use provd_core::db;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter("provd_api=debug,provd_core=debug,tower_http=debug")
        .init();

    info!("Starting provd-api service...");

    // Load configuration
    let config = Config::from_env();
    info!(
        "Configuration loaded: bind_addr={}, db_path={}",
        config.bind_addr,
        config.db_path.display()
    );

    // Backup, connect, migrate
    let pool = db::bootstrap(&config.db_path).await?;
    info!("Database ready at {}", config.db_path.display());

    // Create app
    let app = create_app(pool).await?;

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
