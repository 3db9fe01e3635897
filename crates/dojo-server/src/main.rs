use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, patch, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use dojo_api::middleware::require_auth;
use dojo_api::{AppState, AppStateInner, messages, notifications, recipients};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dojo=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let db_path = std::env::var("DOJO_DB_PATH").unwrap_or_else(|_| "dojo.db".into());
    let host = std::env::var("DOJO_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("DOJO_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = dojo_db::Database::open(&PathBuf::from(&db_path))?;

    let app_state: AppState = Arc::new(AppStateInner { db });

    // Routes
    let messaging_routes = Router::new()
        .route("/send", post(messages::send_message))
        .route("/conversations", get(messages::get_conversations))
        .route(
            "/thread/{thread_id}/messages",
            get(messages::get_thread_messages),
        )
        .route(
            "/message/{message_id}",
            patch(messages::update_message).delete(messages::delete_message),
        )
        .route(
            "/message/{message_id}/mark-read",
            post(messages::mark_message_read),
        )
        .route(
            "/message/{message_id}/archive",
            post(messages::archive_message),
        )
        .route("/stats", get(messages::get_stats))
        .route("/unread-count", get(messages::get_unread_count))
        .route("/recipients", get(recipients::get_recipients))
        .route(
            "/recipients/students",
            get(recipients::get_available_students),
        )
        .route(
            "/recipients/coaches",
            get(recipients::get_available_coaches),
        )
        .route(
            "/recipients/branch-managers",
            get(recipients::get_available_branch_managers),
        )
        .route(
            "/recipients/superadmins",
            get(recipients::get_available_superadmins),
        )
        .route("/notifications", get(notifications::get_notifications))
        .route(
            "/notifications/{notification_id}/read",
            put(notifications::mark_notification_read),
        )
        .layer(middleware::from_fn(require_auth))
        .with_state(app_state);

    let app = Router::new()
        .nest("/api/messages", messaging_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Dojo messaging server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
