//! User administration (admin only)

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    models::{NewUser, NewUserRecord, UpdateUser, UserChanges},
    password::hash_password_blocking,
    scope::ensure_admin,
    state::AppState,
    validation::{validate_email, validate_name, validate_password},
};

/// Body of the activation toggle
#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub is_active: bool,
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// List all users with their branch names
pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    ensure_admin(&user)?;
    let users = state.users.list().await?;
    Ok(Json(users))
}

/// Create a user account
pub async fn create_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<NewUser>,
) -> ApiResult<impl IntoResponse> {
    ensure_admin(&user)?;

    validate_name(&payload.name).map_err(ApiError::BadRequest)?;
    let email = payload.email.trim().to_string();
    validate_email(&email).map_err(ApiError::BadRequest)?;
    validate_password(&payload.password).map_err(ApiError::BadRequest)?;
    if let Some(branch_id) = payload.branch_id {
        if !state.branches.exists(branch_id).await? {
            return Err(ApiError::BadRequest("Invalid branch".to_string()));
        }
    }

    let password_hash = hash_password_blocking(payload.password).await?;
    let id = state
        .users
        .create(&NewUserRecord {
            name: payload.name.trim().to_string(),
            email,
            phone_number: blank_to_none(payload.phone_number),
            password_hash,
            branch_id: payload.branch_id,
            is_active: payload.is_active,
            is_admin: payload.is_admin,
        })
        .await?;

    info!("User {} created by {}", id, user.id);
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "id": id }))))
}

/// Update a user; the password changes only when one is supplied
pub async fn update_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUser>,
) -> ApiResult<impl IntoResponse> {
    ensure_admin(&user)?;

    validate_name(&payload.name).map_err(ApiError::BadRequest)?;
    let email = payload.email.trim().to_string();
    validate_email(&email).map_err(ApiError::BadRequest)?;
    if let Some(branch_id) = payload.branch_id {
        if !state.branches.exists(branch_id).await? {
            return Err(ApiError::BadRequest("Invalid branch".to_string()));
        }
    }

    let password_hash = match payload.password.filter(|p| !p.is_empty()) {
        Some(password) => {
            validate_password(&password).map_err(ApiError::BadRequest)?;
            Some(hash_password_blocking(password).await?)
        }
        None => None,
    };

    let changes = UserChanges {
        name: payload.name.trim().to_string(),
        email,
        phone_number: blank_to_none(payload.phone_number),
        password_hash,
        branch_id: payload.branch_id,
        is_active: payload.is_active,
        is_admin: payload.is_admin,
    };

    if !state.users.update(id, &changes).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    info!("User {} updated by {}", id, user.id);
    Ok(Json(json!({ "success": true })))
}

/// Delete a user
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    ensure_admin(&user)?;

    if id == user.id {
        return Err(ApiError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }

    if !state.users.delete(id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    info!("User {} deleted by {}", id, user.id);
    Ok(Json(json!({ "success": true })))
}

/// Activate or deactivate a user
pub async fn toggle_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(payload): Json<ToggleRequest>,
) -> ApiResult<impl IntoResponse> {
    ensure_admin(&user)?;

    if !state.users.set_active(id, payload.is_active).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    info!(
        "User {} {} by {}",
        id,
        if payload.is_active { "activated" } else { "deactivated" },
        user.id
    );
    Ok(Json(json!({ "success": true })))
}
