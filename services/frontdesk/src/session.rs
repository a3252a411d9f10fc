//! Login orchestration and the session cookie

use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::{
    error::{ApiError, ApiResult},
    middleware::AUTH_COOKIE,
    models::PublicProfile,
    password::{hash_password_blocking, verify_password_blocking},
    store::UserStore,
    token::{TOKEN_LIFETIME_SECS, TokenCodec},
};

/// Request for user login
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Response for user login
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: PublicProfile,
}

/// Hash checked when no account matches, so both failure paths cost the same
async fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceCell<Option<String>> = OnceCell::const_new();
    DUMMY
        .get_or_init(|| async {
            hash_password_blocking("frontdesk-dummy-password".to_string())
                .await
                .ok()
        })
        .await
        .as_deref()
}

/// Verify `email`/`password` and issue a token.
///
/// An unknown email, an inactive account and a wrong password all produce
/// [`ApiError::InvalidCredentials`].
pub async fn login(
    users: &dyn UserStore,
    codec: &TokenCodec,
    email: &str,
    password: &str,
) -> ApiResult<LoginResponse> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let Some(user) = users.find_active_by_email(email).await? else {
        if let Some(hash) = dummy_hash().await {
            verify_password_blocking(password.to_string(), hash.to_string()).await;
        }
        warn!("Login rejected: no active account matches");
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password_blocking(password.to_string(), user.password_hash.clone()).await {
        warn!("Login rejected for user {}: wrong password", user.id);
        return Err(ApiError::InvalidCredentials);
    }

    let token = codec.encode(user.id)?;
    info!("User {} logged in", user.id);

    Ok(LoginResponse {
        token,
        user: user.public_profile(),
    })
}

/// Cookie carrying the session token for browser clients
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(TOKEN_LIFETIME_SECS))
        .build()
}

/// Expired cookie that makes the browser drop the session
pub fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, ""))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}
