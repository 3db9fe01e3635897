//! HTTP layer: axum handlers over the messaging core, plus JWT auth
//! middleware. Handlers stay thin; authorization and lifecycle rules live
//! in dojo-messaging.

pub mod error;
pub mod messages;
pub mod middleware;
pub mod notifications;
pub mod recipients;

use std::sync::Arc;

use dojo_db::Database;
use tracing::error;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
}

/// Run a messaging-core call on the blocking pool. SQLite work never sits
/// on the async runtime.
pub(crate) async fn run_blocking<T, F>(state: AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> dojo_messaging::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::from(dojo_messaging::MessagingError::Storage(anyhow::anyhow!(
                "blocking task failed"
            )))
        })?
        .map_err(ApiError::from)
}
