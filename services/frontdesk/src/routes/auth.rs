//! Login, logout and session verification

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;
use tracing::warn;

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    session::{self, LoginRequest},
    state::AppState,
};

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload.map_err(|e| {
        warn!("Malformed login body: {}", e);
        ApiError::BadRequest("Email and password are required".to_string())
    })?;

    let key = payload.email.trim().to_lowercase();
    if !key.is_empty() && !state.rate_limiter.is_allowed(&key).await {
        warn!("Login throttled");
        return Err(ApiError::TooManyRequests);
    }

    let response = session::login(
        state.users.as_ref(),
        &state.token_codec,
        &payload.email,
        &payload.password,
    )
    .await?;

    let jar = jar.add(session::session_cookie(
        response.token.clone(),
        state.cookie_secure,
    ));

    Ok((jar, Json(response)))
}

/// Logout endpoint; tokens stay valid until they expire
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let jar = jar.add(session::clear_session_cookie(state.cookie_secure));
    (jar, Json(json!({ "success": true })))
}

/// Return the profile behind the presented token
pub async fn verify(Extension(user): Extension<AuthUser>) -> impl IntoResponse {
    Json(json!({ "user": user.profile() }))
}
