//! Binary entrypoint for the anggaran HTTP server.
//!
//! Reads configuration from environment variables:
//! - `ANGGARAN_DB_PATH`: SQLite database file path (default: "anggaran.db")
//! - `ANGGARAN_PORT`: Server listen port (default: "3000")
//! - `ANGGARAN_SESSION_TTL_SECS`: idle seconds before an editor session is
//!   dropped (default: 28800)

use std::time::Duration;

use anggaran_server::router::build_router;
use anggaran_server::service::{BudgetService, DEFAULT_SESSION_TTL};
use anggaran_server::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let db_path = std::env::var("ANGGARAN_DB_PATH")
        .unwrap_or_else(|_| "anggaran.db".to_string());
    let port = std::env::var("ANGGARAN_PORT")
        .unwrap_or_else(|_| "3000".to_string());

    let session_ttl = match std::env::var("ANGGARAN_SESSION_TTL_SECS") {
        Ok(secs) => Duration::from_secs(secs.parse()?),
        Err(_) => DEFAULT_SESSION_TTL,
    };

    let service = BudgetService::new(&db_path)?.with_session_ttl(session_ttl);
    let state = AppState::from_service(service);
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    tracing::info!(
        db = %db_path,
        session_ttl_secs = session_ttl.as_secs(),
        "anggaran server starting on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
