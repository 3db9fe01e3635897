use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};

use dojo_messaging::notify;
use dojo_types::api::{Ack, Claims};

use crate::error::ApiError;
use crate::messages::Pagination;
use crate::{AppState, run_blocking};

pub async fn get_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = claims.actor();
    let (skip, limit) = page.clamped();
    let listing =
        run_blocking(state, move |db| notify::notifications(db, &actor, skip, limit)).await?;
    Ok(Json(listing))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    Path(notification_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = claims.actor();
    run_blocking(state, move |db| {
        notify::mark_notification_read(db, &actor, &notification_id)
    })
    .await?;
    Ok(Json(Ack {
        message: "Notification marked as read",
    }))
}
