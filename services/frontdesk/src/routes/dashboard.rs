//! Dashboard counters and charts

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;

use crate::{
    error::ApiResult,
    middleware::AuthUser,
    models::{ChartMode, ChartRange, report::fill_chart},
    scope::scope_for,
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct ChartQuery {
    pub mode: Option<String>,
    pub range: Option<String>,
}

/// Headline counters
pub async fn stats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.visits.stats(scope_for(&user)).await?))
}

/// Visit counts or average durations bucketed by hour, day or month
pub async fn chart(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ChartQuery>,
) -> ApiResult<impl IntoResponse> {
    let mode = ChartMode::from_query(query.mode.as_deref());
    let range = ChartRange::from_query(query.range.as_deref());

    let rows = state.visits.chart(mode, range, scope_for(&user)).await?;
    let points = fill_chart(mode, range, Utc::now().date_naive(), &rows);

    Ok(Json(points))
}
