mod config;

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use museum_api::router::api_router;
use museum_api::state::{AppState, AppStateInner};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "museum_server=debug,museum_api=debug,museum_db=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // No store, no traffic
    let db = museum_db::Database::open(&config.db_path)?;
    db.promote_admins(&config.admin_users)?;

    let app_state: AppState =
        Arc::new(AppStateInner::new(db, config.jwt_secret).with_admins(config.admin_users));

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(api_router(app_state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("Museum server listening on {}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
