mod sweep;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use retro_api::{AppState, AppStateInner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "retro=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let db_path = std::env::var("RETRO_DB_PATH").unwrap_or_else(|_| "retro.db".into());
    let host = std::env::var("RETRO_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("RETRO_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let sweep_interval_secs: u64 = std::env::var("RETRO_SWEEP_INTERVAL_SECS")
        .unwrap_or_else(|_| "3600".into())
        .parse()?;

    // Init database
    let db = retro_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner { db });

    // Background pruning of long-expired sessions
    tokio::spawn(sweep::run_sweep_loop(state.clone(), sweep_interval_secs));

    let app = retro_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Retro server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
