pub mod health;
pub mod jobs;

use crate::state::AppState;
use axum::Router;
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub async fn create_app(pool: SqlitePool) -> anyhow::Result<Router> {
    let state = AppState::new(pool);

    // Allow CORS for local development (frontend on different port)
    let cors = CorsLayer::permissive();

    let app = Router::new()
        .merge(health::routes())
        .merge(jobs::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}
