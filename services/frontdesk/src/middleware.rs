//! Request authentication guard
//!
//! Every protected route goes through [`auth_middleware`], which resolves the
//! caller once and stores an [`AuthUser`] in the request extensions.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use crate::{
    error::{ApiError, ApiResult},
    models::{PublicProfile, User},
    state::AppState,
};

/// Cookie set at login
pub const AUTH_COOKIE: &str = "auth-token";
/// Cookie name used by older clients
pub const LEGACY_AUTH_COOKIE: &str = "token";

/// Authenticated user information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub branch_id: Option<i64>,
    pub is_admin: bool,
}

impl AuthUser {
    pub fn profile(&self) -> PublicProfile {
        PublicProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            branch_id: self.branch_id,
            is_admin: self.is_admin,
        }
    }
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        AuthUser {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            branch_id: user.branch_id,
            is_admin: user.is_admin,
        }
    }
}

/// Pull the raw token from a request.
///
/// An `Authorization: Bearer` header wins; otherwise the `auth-token`
/// cookie, then the legacy `token` cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    let jar = CookieJar::from_headers(headers);
    [AUTH_COOKIE, LEGACY_AUTH_COOKIE].iter().find_map(|name| {
        jar.get(name)
            .map(|cookie| cookie.value().trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

/// Resolve request headers to an active user.
///
/// Every failure, whether the token is missing, forged, expired, or names an
/// unknown or deactivated user, is the same `Unauthorized`.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> ApiResult<AuthUser> {
    let token = extract_token(headers).ok_or(ApiError::Unauthorized)?;

    let user_id = state.token_codec.decode(&token).ok_or_else(|| {
        warn!("Rejected invalid or expired token");
        ApiError::Unauthorized
    })?;

    match state.users.find_by_id(user_id).await? {
        Some(user) if user.is_active => Ok(AuthUser::from(&user)),
        Some(_) => {
            warn!("Rejected token of deactivated user {}", user_id);
            Err(ApiError::Unauthorized)
        }
        None => {
            warn!("Rejected token of unknown user {}", user_id);
            Err(ApiError::Unauthorized)
        }
    }
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&state, req.headers()).await?;

    // Insert the user into the request extensions
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, header::COOKIE};

    fn headers(pairs: &[(axum::http::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_bearer_header_is_preferred() {
        let map = headers(&[
            (AUTHORIZATION, "Bearer header-token"),
            (COOKIE, "auth-token=cookie-token"),
        ]);
        assert_eq!(extract_token(&map).as_deref(), Some("header-token"));
    }

    #[test]
    fn test_cookie_fallbacks() {
        let map = headers(&[(COOKIE, "theme=dark; auth-token=cookie-token")]);
        assert_eq!(extract_token(&map).as_deref(), Some("cookie-token"));

        let map = headers(&[(COOKIE, "token=legacy-token")]);
        assert_eq!(extract_token(&map).as_deref(), Some("legacy-token"));

        let map = headers(&[(COOKIE, "auth-token=primary; token=legacy")]);
        assert_eq!(extract_token(&map).as_deref(), Some("primary"));
    }

    #[test]
    fn test_non_bearer_header_falls_back_to_cookie() {
        let map = headers(&[
            (AUTHORIZATION, "Basic dXNlcjpwYXNz"),
            (COOKIE, "auth-token=cookie-token"),
        ]);
        assert_eq!(extract_token(&map).as_deref(), Some("cookie-token"));
    }

    #[test]
    fn test_missing_or_empty_token() {
        assert_eq!(extract_token(&HeaderMap::new()), None);
        assert_eq!(extract_token(&headers(&[(AUTHORIZATION, "Bearer ")])), None);
        assert_eq!(extract_token(&headers(&[(COOKIE, "auth-token=")])), None);
    }
}
