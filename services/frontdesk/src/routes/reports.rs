//! Visitor reports, scoped to the caller's branch

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    models::{Pagination, ReportQuery, VisitorReportPage},
    scope::scope_for,
    state::AppState,
};

/// Paginated visitor listing
pub async fn visitor_reports(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = query.into_filter();
    let (visitors, total) = state
        .visits
        .visitor_reports(&filter, scope_for(&user))
        .await?;

    Ok(Json(VisitorReportPage {
        visitors,
        pagination: Pagination::new(filter.page, filter.limit, total),
    }))
}

/// A visitor with the visits the caller may see
pub async fn visitor_detail(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let detail = state
        .visits
        .visitor_detail(id, scope_for(&user))
        .await?
        .ok_or_else(|| ApiError::NotFound("Visitor not found".to_string()))?;

    Ok(Json(detail))
}

/// Dates with at least one visit, newest first
pub async fn available_dates(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let dates: Vec<String> = state
        .visits
        .available_dates(scope_for(&user))
        .await?
        .into_iter()
        .map(|date| date.format("%Y-%m-%d").to_string())
        .collect();

    Ok(Json(dates))
}
