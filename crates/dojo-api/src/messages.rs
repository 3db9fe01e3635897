use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use dojo_messaging::lifecycle;
use dojo_types::api::{Ack, Claims, MessagePatch, SendMessageRequest};

use crate::error::ApiError;
use crate::{AppState, run_blocking};

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

impl Pagination {
    /// Negative skips read as zero; limit is capped at 100.
    pub fn clamped(&self) -> (i64, i64) {
        (self.skip.max(0), self.limit.clamp(1, 100))
    }
}

pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = claims.actor();
    let receipt =
        run_blocking(state, move |db| lifecycle::send_message(db, &actor, &req)).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn get_conversations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = claims.actor();
    let (skip, limit) = page.clamped();
    let listing =
        run_blocking(state, move |db| lifecycle::conversations(db, &actor, skip, limit)).await?;
    Ok(Json(listing))
}

pub async fn get_thread_messages(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = claims.actor();
    let (skip, limit) = page.clamped();
    let listing = run_blocking(state, move |db| {
        lifecycle::thread_messages(db, &actor, &thread_id, skip, limit)
    })
    .await?;
    Ok(Json(listing))
}

pub async fn update_message(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(patch): Json<MessagePatch>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = claims.actor();
    run_blocking(state, move |db| {
        lifecycle::update_message(db, &actor, &message_id, &patch)
    })
    .await?;
    Ok(Json(Ack {
        message: "Message updated successfully",
    }))
}

pub async fn mark_message_read(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = claims.actor();
    let patch = MessagePatch {
        is_read: Some(true),
        ..Default::default()
    };
    run_blocking(state, move |db| {
        lifecycle::update_message(db, &actor, &message_id, &patch)
    })
    .await?;
    Ok(Json(Ack {
        message: "Message marked as read",
    }))
}

pub async fn archive_message(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = claims.actor();
    let patch = MessagePatch {
        is_archived: Some(true),
        ..Default::default()
    };
    run_blocking(state, move |db| {
        lifecycle::update_message(db, &actor, &message_id, &patch)
    })
    .await?;
    Ok(Json(Ack {
        message: "Message archived",
    }))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = claims.actor();
    let patch = MessagePatch {
        is_deleted: Some(true),
        ..Default::default()
    };
    run_blocking(state, move |db| {
        lifecycle::update_message(db, &actor, &message_id, &patch)
    })
    .await?;
    Ok(Json(Ack {
        message: "Message deleted successfully",
    }))
}

pub async fn get_stats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = claims.actor();
    let stats = run_blocking(state, move |db| lifecycle::message_stats(db, &actor)).await?;
    Ok(Json(json!({ "stats": stats })))
}

pub async fn get_unread_count(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = claims.actor();
    let stats = run_blocking(state, move |db| lifecycle::message_stats(db, &actor)).await?;
    Ok(Json(json!({ "unread_count": stats.unread_messages })))
}
