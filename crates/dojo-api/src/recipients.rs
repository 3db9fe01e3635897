use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use dojo_messaging::recipients;
use dojo_types::api::{Claims, RecipientsResponse};
use dojo_types::models::Role;

use crate::error::ApiError;
use crate::{AppState, run_blocking};

#[derive(Debug, Deserialize)]
pub struct BranchFilter {
    pub branch_id: Option<String>,
}

/// Everyone the caller may address, per the role/branch matrix.
pub async fn get_recipients(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = claims.actor();
    let list = run_blocking(state, move |db| recipients::available_recipients(db, &actor)).await?;
    Ok(Json(RecipientsResponse {
        total_count: list.len() as i64,
        recipients: list,
    }))
}

async fn filtered_recipients(
    state: AppState,
    claims: Claims,
    want: Role,
    allowed: &'static [Role],
    branch_id: Option<String>,
) -> Result<Json<RecipientsResponse>, ApiError> {
    let actor = claims.actor();
    let slice = run_blocking(state, move |db| {
        recipients::recipients_of_role(db, &actor, want, allowed, branch_id.as_deref())
    })
    .await?;
    Ok(Json(RecipientsResponse {
        total_count: slice.len() as i64,
        recipients: slice,
    }))
}

pub async fn get_available_students(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(filter): Query<BranchFilter>,
) -> Result<impl IntoResponse, ApiError> {
    filtered_recipients(
        state,
        claims,
        Role::Student,
        &[Role::Coach, Role::BranchManager, Role::Superadmin],
        filter.branch_id,
    )
    .await
}

pub async fn get_available_coaches(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(filter): Query<BranchFilter>,
) -> Result<impl IntoResponse, ApiError> {
    filtered_recipients(
        state,
        claims,
        Role::Coach,
        &[Role::Student, Role::BranchManager, Role::Superadmin],
        filter.branch_id,
    )
    .await
}

pub async fn get_available_branch_managers(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    filtered_recipients(
        state,
        claims,
        Role::BranchManager,
        &[Role::Student, Role::Coach, Role::Superadmin],
        None,
    )
    .await
}

pub async fn get_available_superadmins(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    filtered_recipients(
        state,
        claims,
        Role::Superadmin,
        &[Role::Student, Role::Coach, Role::BranchManager],
        None,
    )
    .await
}
