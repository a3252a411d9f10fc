//! Front-desk HTTP routes

use axum::{
    Json, Router, middleware,
    response::IntoResponse,
    routing::{get, patch, post, put},
};
use serde_json::json;

use crate::{middleware::auth_middleware, state::AppState};

pub mod auth;
pub mod branches;
pub mod dashboard;
pub mod reports;
pub mod users;
pub mod visitors;

/// Create the router for the front-desk service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/verify", get(auth::verify))
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route(
            "/api/users/:id",
            put(users::update_user).delete(users::delete_user),
        )
        .route("/api/users/:id/toggle", patch(users::toggle_user))
        .route(
            "/api/branches",
            get(branches::list_branches).post(branches::create_branch),
        )
        .route(
            "/api/branches/:id",
            put(branches::update_branch).delete(branches::delete_branch),
        )
        .route("/api/visitors/register", post(visitors::register))
        .route("/api/visitors/today", get(visitors::today))
        .route("/api/visitors/search", get(visitors::search))
        .route("/api/visitors/:id/signout", patch(visitors::sign_out))
        .route("/api/visitors/:id/photo", get(visitors::photo))
        .route("/api/reports/visitors", get(reports::visitor_reports))
        .route("/api/reports/visitors/:id", get(reports::visitor_detail))
        .route("/api/reports/available-dates", get(reports::available_dates))
        .route("/api/dashboard/stats", get(dashboard::stats))
        .route("/api/dashboard/chart", get(dashboard::chart))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/login", post(auth::login))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "frontdesk"
    }))
}
