//! Visitor registration, the daily board, sign-out and search

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{
    card,
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    models::{
        NewVisit, PhotoKind, RegisterVisit, SignOutOutcome, VisitStatusFilter, VisitorChoice,
        VisitorMatch,
        visit::{decode_data_url, to_data_url},
    },
    scope::scope_for,
    state::AppState,
    validation::validate_phone,
};

/// Shortest search term that hits the database
const MIN_SEARCH_LEN: usize = 3;

#[derive(Debug, Default, Deserialize)]
pub struct TodayQuery {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PhotoQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub phone: Option<String>,
    pub q: Option<String>,
}

fn decode_image(value: Option<&str>) -> ApiResult<Option<Vec<u8>>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(data) => decode_data_url(data).map(Some).map_err(ApiError::BadRequest),
        None => Ok(None),
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Register a visit, creating or updating the visitor record
pub async fn register(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<RegisterVisit>,
) -> ApiResult<impl IntoResponse> {
    if !payload.has_required_fields() {
        return Err(ApiError::BadRequest("Missing required fields".to_string()));
    }
    validate_phone(&payload.phone_number).map_err(ApiError::BadRequest)?;

    let branch_id = match (user.is_admin, payload.branch_id) {
        (true, Some(branch_id)) => branch_id,
        _ => user
            .branch_id
            .ok_or_else(|| ApiError::BadRequest("No branch assigned to user".to_string()))?,
    };
    if !state.branches.exists(branch_id).await? {
        return Err(ApiError::BadRequest("Invalid branch".to_string()));
    }

    let phone_number = payload.phone_number.trim().to_string();
    let visitor = if payload.is_new_visitor {
        VisitorChoice::New {
            name: payload.name.trim().to_string(),
            phone_number,
        }
    } else {
        let visitor_id = payload.visitor_id.ok_or_else(|| {
            ApiError::BadRequest("Visitor ID is required for returning visitors".to_string())
        })?;
        VisitorChoice::Returning {
            visitor_id,
            phone_number,
        }
    };

    let digital_card_no = match payload.manual_card_number() {
        Some(manual) => {
            if !card::is_valid(manual) {
                return Err(ApiError::BadRequest(
                    "Card number must be VIS followed by 6 digits".to_string(),
                ));
            }
            if state.visits.card_number_exists(manual).await? {
                return Err(ApiError::BadRequest(
                    "Card number already in use".to_string(),
                ));
            }
            manual.to_string()
        }
        None => card::generate(state.visits.as_ref()).await,
    };

    let (company, person_in_charge) = if payload.is_vendor {
        (
            trimmed(payload.company.clone()),
            trimmed(payload.person_in_charge.clone()),
        )
    } else {
        (None, None)
    };

    let visit = NewVisit {
        visitor,
        digital_card_no,
        reason: payload.reason.trim().to_string(),
        office: payload.office.trim().to_string(),
        branch_id,
        has_laptop: payload.has_laptop,
        laptop_brand: payload.has_laptop.then(|| trimmed(payload.laptop_brand.clone())).flatten(),
        laptop_model: payload.has_laptop.then(|| trimmed(payload.laptop_model.clone())).flatten(),
        company,
        person_in_charge,
        photo: decode_image(payload.photo.as_deref())?,
        id_photo_front: decode_image(payload.id_photo_front.as_deref())?,
        id_photo_back: decode_image(payload.id_photo_back.as_deref())?,
        sign_in_time: payload.sign_in_time.unwrap_or_else(Utc::now),
        registered_by: user.id,
    };

    let registered = state
        .visits
        .register(&visit)
        .await?
        .ok_or_else(|| ApiError::NotFound("Visitor not found".to_string()))?;

    info!(
        "Visit {} registered for visitor {} at branch {} by {}",
        registered.visit_id, registered.visitor_id, branch_id, user.id
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "digital_card_no": visit.digital_card_no,
            "visit_id": registered.visit_id,
            "visitor_id": registered.visitor_id,
            "is_new_visitor": payload.is_new_visitor,
        })),
    ))
}

/// Visits signed in today within the caller's scope
pub async fn today(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<TodayQuery>,
) -> ApiResult<impl IntoResponse> {
    let status = VisitStatusFilter::from_query(query.status.as_deref());
    let visits = state.visits.today(scope_for(&user), status).await?;
    Ok(Json(visits))
}

/// Record the sign-out time of a visit
pub async fn sign_out(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    match state.visits.sign_out(id, scope_for(&user)).await? {
        SignOutOutcome::SignedOut => {
            info!("Visit {} signed out by {}", id, user.id);
            Ok(Json(json!({ "success": true })))
        }
        SignOutOutcome::AlreadySignedOut => Err(ApiError::BadRequest(
            "Visitor already signed out".to_string(),
        )),
        SignOutOutcome::NotFound => Err(ApiError::NotFound("Visit not found".to_string())),
    }
}

/// One captured image of a visit as a data URL
pub async fn photo(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Query(query): Query<PhotoQuery>,
) -> ApiResult<impl IntoResponse> {
    let kind = PhotoKind::from_query(query.kind.as_deref());
    let bytes = state
        .visits
        .photo(id, kind, scope_for(&user))
        .await?
        .ok_or_else(|| ApiError::NotFound("Photo not found".to_string()))?;

    Ok(Json(json!({ "photo": to_data_url(&bytes) })))
}

/// Look up visitors by phone number or name
pub async fn search(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<impl IntoResponse> {
    let term = query
        .phone
        .or(query.q)
        .map(|t| t.trim().to_string())
        .unwrap_or_default();

    let scope = scope_for(&user);
    if term.chars().count() < MIN_SEARCH_LEN || scope.is_nothing() {
        return Ok(Json(Vec::<VisitorMatch>::new()));
    }

    let matches = state.visits.search_visitors(&term, scope).await?;
    Ok(Json(matches))
}
