//! Branch management

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    models::BranchPayload,
    scope::ensure_admin,
    state::AppState,
};

/// List every branch with its offices and visit reasons
pub async fn list_branches(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.branches.list().await?))
}

/// Create a branch
pub async fn create_branch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<BranchPayload>,
) -> ApiResult<impl IntoResponse> {
    ensure_admin(&user)?;

    let branch = payload.normalize().map_err(ApiError::BadRequest)?;
    let id = state.branches.create(&branch).await?;

    info!("Branch {} ({}) created by {}", id, branch.name, user.id);
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "id": id }))))
}

/// Replace a branch, including its offices and reasons
pub async fn update_branch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(payload): Json<BranchPayload>,
) -> ApiResult<impl IntoResponse> {
    ensure_admin(&user)?;

    let branch = payload.normalize().map_err(ApiError::BadRequest)?;
    if !state.branches.update(id, &branch).await? {
        return Err(ApiError::NotFound("Branch not found".to_string()));
    }

    info!("Branch {} updated by {}", id, user.id);
    Ok(Json(json!({ "success": true })))
}

/// Delete a branch with its offices and reasons
pub async fn delete_branch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    ensure_admin(&user)?;

    if !state.branches.delete(id).await? {
        return Err(ApiError::NotFound("Branch not found".to_string()));
    }

    info!("Branch {} deleted by {}", id, user.id);
    Ok(Json(json!({ "success": true })))
}
