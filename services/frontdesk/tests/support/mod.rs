//! In-memory stores and request helpers shared by the HTTP tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use chrono::{DateTime, NaiveDate, Utc};
use common::error::{DatabaseError, DatabaseResult};
use frontdesk::{
    AppState, create_router,
    models::{
        Branch, BranchInput, ChartMode, ChartRange, DashboardStats, NewUserRecord, NewVisit,
        PhotoKind, RegisteredVisit, ReportFilter, SignOutOutcome, TodayVisit, User, UserChanges,
        UserSummary, VendorFilter, VisitRecord, VisitStatistics, VisitStatusFilter,
        VisitorChoice, VisitorDetail, VisitorMatch, VisitorReportRow, VisitorSummary,
        visit::to_data_url,
    },
    rate_limiter::{RateLimiter, RateLimiterConfig},
    scope::BranchScope,
    store::{BranchStore, UserStore, VisitStore},
    token::{TokenCodec, TokenConfig},
};
use serde_json::Value;
use tower::ServiceExt;

pub const ADMIN_ID: i64 = 1;
pub const DESK_ID: i64 = 2;
pub const INACTIVE_ID: i64 = 3;
pub const UNASSIGNED_ID: i64 = 4;

pub const BRANCH_TWO: i64 = 2;
pub const BRANCH_THREE: i64 = 3;

/// Visitor whose only visit is at branch 3
pub const BRANCH_THREE_VISITOR: i64 = 1;
pub const BRANCH_THREE_VISIT: i64 = 1;
/// Visitor whose only visit is at branch 2
pub const BRANCH_TWO_VISITOR: i64 = 2;
pub const BRANCH_TWO_VISIT: i64 = 2;

#[derive(Debug, Clone)]
pub struct VisitorRow {
    pub id: i64,
    pub name: String,
    pub phone_number: String,
    pub visits: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct VisitRow {
    pub id: i64,
    pub visitor_id: i64,
    pub digital_card_no: String,
    pub reason: String,
    pub office: String,
    pub branch_id: Option<i64>,
    pub has_laptop: bool,
    pub company: Option<String>,
    pub photo: Option<Vec<u8>>,
    pub sign_in_time: DateTime<Utc>,
    pub sign_out_time: Option<DateTime<Utc>>,
}

impl VisitRow {
    fn duration_minutes(&self) -> Option<i64> {
        self.sign_out_time
            .map(|out| (out - self.sign_in_time).num_minutes())
    }
}

#[derive(Default)]
pub struct MemoryUsers {
    pub users: Mutex<Vec<User>>,
}

#[derive(Default)]
pub struct MemoryBranches {
    pub branches: Mutex<Vec<Branch>>,
}

#[derive(Default)]
pub struct MemoryVisits {
    pub visitors: Mutex<Vec<VisitorRow>>,
    pub visits: Mutex<Vec<VisitRow>>,
    /// Every card number is reported as taken
    pub cards_exhausted: bool,
    /// Accounts counted by the dashboard
    pub users: Arc<MemoryUsers>,
}

fn user(
    id: i64,
    email: &str,
    password: &str,
    branch_id: Option<i64>,
    active: bool,
    admin: bool,
) -> User {
    User {
        id,
        name: format!("User {}", id),
        email: email.to_string(),
        phone_number: None,
        password_hash: bcrypt::hash(password, 4).unwrap(),
        branch_id,
        is_active: active,
        is_admin: admin,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn branch(id: i64, name: &str) -> Branch {
    Branch {
        id,
        name: name.to_string(),
        location: "Nairobi".to_string(),
        offices: vec!["Reception".to_string()],
        reasons: vec!["Meeting".to_string()],
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

impl MemoryUsers {
    pub fn seeded() -> Self {
        Self {
            users: Mutex::new(vec![
                user(ADMIN_ID, "admin@x.com", "admin123", None, true, true),
                user(DESK_ID, "desk@x.com", "desk1234", Some(BRANCH_TWO), true, false),
                user(INACTIVE_ID, "gone@x.com", "gone1234", Some(BRANCH_TWO), false, false),
                user(UNASSIGNED_ID, "float@x.com", "float123", None, true, false),
            ]),
        }
    }
}

impl MemoryBranches {
    pub fn seeded() -> Self {
        Self {
            branches: Mutex::new(vec![branch(BRANCH_TWO, "Two"), branch(BRANCH_THREE, "Three")]),
        }
    }
}

impl MemoryVisits {
    pub fn seeded() -> Self {
        let now = Utc::now();
        let visitor = |id: i64, name: &str, phone: &str| VisitorRow {
            id,
            name: name.to_string(),
            phone_number: phone.to_string(),
            visits: 1,
            created_at: now,
        };
        let visit = |id: i64, visitor_id: i64, branch_id: i64| VisitRow {
            id,
            visitor_id,
            digital_card_no: format!("VIS10000{}", id),
            reason: "Meeting".to_string(),
            office: "Reception".to_string(),
            branch_id: Some(branch_id),
            has_laptop: false,
            company: None,
            photo: Some(b"jpeg".to_vec()),
            sign_in_time: now,
            sign_out_time: None,
        };

        Self {
            visitors: Mutex::new(vec![
                visitor(BRANCH_THREE_VISITOR, "Third Branch Guest", "0733000003"),
                visitor(BRANCH_TWO_VISITOR, "Second Branch Guest", "0722000002"),
            ]),
            visits: Mutex::new(vec![
                visit(BRANCH_THREE_VISIT, BRANCH_THREE_VISITOR, BRANCH_THREE),
                visit(BRANCH_TWO_VISIT, BRANCH_TWO_VISITOR, BRANCH_TWO),
            ]),
            cards_exhausted: false,
            users: Arc::default(),
        }
    }

    fn visitor_name(&self, visitor_id: i64) -> (String, i32) {
        self.visitors
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.id == visitor_id)
            .map(|v| (v.name.clone(), v.visits))
            .unwrap_or_default()
    }
}

#[async_trait]
impl UserStore for MemoryUsers {
    async fn find_active_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| u.email == email && u.is_active)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn list(&self) -> DatabaseResult<Vec<UserSummary>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .map(|u| UserSummary {
                id: u.id,
                name: u.name.clone(),
                email: u.email.clone(),
                phone_number: u.phone_number.clone(),
                branch_id: u.branch_id,
                branch_name: None,
                is_active: u.is_active,
                is_admin: u.is_admin,
                created_at: u.created_at,
            })
            .collect())
    }

    async fn count(&self) -> DatabaseResult<i64> {
        Ok(self.users.lock().unwrap().len() as i64)
    }

    async fn create(&self, record: &NewUserRecord) -> DatabaseResult<i64> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == record.email) {
            return Err(DatabaseError::Conflict("users_email_key".to_string()));
        }
        let id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        users.push(User {
            id,
            name: record.name.clone(),
            email: record.email.clone(),
            phone_number: record.phone_number.clone(),
            password_hash: record.password_hash.clone(),
            branch_id: record.branch_id,
            is_active: record.is_active,
            is_admin: record.is_admin,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
        Ok(id)
    }

    async fn update(&self, id: i64, changes: &UserChanges) -> DatabaseResult<bool> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(false);
        };
        user.name = changes.name.clone();
        user.email = changes.email.clone();
        user.phone_number = changes.phone_number.clone();
        if let Some(hash) = &changes.password_hash {
            user.password_hash = hash.clone();
        }
        user.branch_id = changes.branch_id;
        user.is_active = changes.is_active;
        user.is_admin = changes.is_admin;
        Ok(true)
    }

    async fn set_active(&self, id: i64, active: bool) -> DatabaseResult<bool> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.is_active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: i64) -> DatabaseResult<bool> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() < before)
    }
}

#[async_trait]
impl BranchStore for MemoryBranches {
    async fn list(&self) -> DatabaseResult<Vec<Branch>> {
        Ok(self.branches.lock().unwrap().clone())
    }

    async fn exists(&self, id: i64) -> DatabaseResult<bool> {
        Ok(self.branches.lock().unwrap().iter().any(|b| b.id == id))
    }

    async fn create(&self, input: &BranchInput) -> DatabaseResult<i64> {
        let mut branches = self.branches.lock().unwrap();
        let id = branches.iter().map(|b| b.id).max().unwrap_or(0) + 1;
        let mut created = branch(id, &input.name);
        created.location = input.location.clone();
        created.offices = input.offices.clone();
        created.reasons = input.reasons.clone();
        branches.push(created);
        Ok(id)
    }

    async fn update(&self, id: i64, input: &BranchInput) -> DatabaseResult<bool> {
        let mut branches = self.branches.lock().unwrap();
        let Some(existing) = branches.iter_mut().find(|b| b.id == id) else {
            return Ok(false);
        };
        existing.name = input.name.clone();
        existing.location = input.location.clone();
        existing.offices = input.offices.clone();
        existing.reasons = input.reasons.clone();
        Ok(true)
    }

    async fn delete(&self, id: i64) -> DatabaseResult<bool> {
        let mut branches = self.branches.lock().unwrap();
        let before = branches.len();
        branches.retain(|b| b.id != id);
        Ok(branches.len() < before)
    }
}

#[async_trait]
impl VisitStore for MemoryVisits {
    async fn card_number_exists(&self, card: &str) -> DatabaseResult<bool> {
        if self.cards_exhausted {
            return Ok(true);
        }
        Ok(self
            .visits
            .lock()
            .unwrap()
            .iter()
            .any(|v| v.digital_card_no == card))
    }

    async fn register(&self, visit: &NewVisit) -> DatabaseResult<Option<RegisteredVisit>> {
        let mut visitors = self.visitors.lock().unwrap();
        let visitor_id = match &visit.visitor {
            VisitorChoice::New { name, phone_number } => {
                match visitors.iter_mut().find(|v| &v.phone_number == phone_number) {
                    Some(existing) => {
                        existing.name = name.clone();
                        existing.visits += 1;
                        existing.id
                    }
                    None => {
                        let id = visitors.iter().map(|v| v.id).max().unwrap_or(0) + 1;
                        visitors.push(VisitorRow {
                            id,
                            name: name.clone(),
                            phone_number: phone_number.clone(),
                            visits: 1,
                            created_at: Utc::now(),
                        });
                        id
                    }
                }
            }
            VisitorChoice::Returning { visitor_id, .. } => {
                match visitors.iter_mut().find(|v| v.id == *visitor_id) {
                    Some(existing) => {
                        existing.visits += 1;
                        existing.id
                    }
                    None => return Ok(None),
                }
            }
        };

        let mut visits = self.visits.lock().unwrap();
        let visit_id = visits.iter().map(|v| v.id).max().unwrap_or(0) + 1;
        visits.push(VisitRow {
            id: visit_id,
            visitor_id,
            digital_card_no: visit.digital_card_no.clone(),
            reason: visit.reason.clone(),
            office: visit.office.clone(),
            branch_id: Some(visit.branch_id),
            has_laptop: visit.has_laptop,
            company: visit.company.clone(),
            photo: visit.photo.clone(),
            sign_in_time: visit.sign_in_time,
            sign_out_time: None,
        });

        Ok(Some(RegisteredVisit {
            visit_id,
            visitor_id,
        }))
    }

    async fn today(
        &self,
        scope: BranchScope,
        status: VisitStatusFilter,
    ) -> DatabaseResult<Vec<TodayVisit>> {
        let today = Utc::now().date_naive();
        let visits = self.visits.lock().unwrap().clone();
        Ok(visits
            .into_iter()
            .filter(|v| v.sign_in_time.date_naive() == today && scope.allows(v.branch_id))
            .filter(|v| match status {
                VisitStatusFilter::All => true,
                VisitStatusFilter::Active => v.sign_out_time.is_none(),
                VisitStatusFilter::Inactive => v.sign_out_time.is_some(),
            })
            .map(|v| {
                let (name, total_visits) = self.visitor_name(v.visitor_id);
                TodayVisit {
                    id: v.id,
                    digital_card_no: v.digital_card_no,
                    name,
                    reason: v.reason,
                    office: v.office,
                    sign_in_time: v.sign_in_time,
                    sign_out_time: v.sign_out_time,
                    has_laptop: v.has_laptop,
                    laptop_brand: None,
                    laptop_model: None,
                    photo: v.photo.as_deref().map(to_data_url),
                    branch_id: v.branch_id,
                    branch_name: None,
                    registered_by_name: None,
                    total_visits,
                }
            })
            .collect())
    }

    async fn sign_out(&self, visit_id: i64, scope: BranchScope) -> DatabaseResult<SignOutOutcome> {
        let mut visits = self.visits.lock().unwrap();
        match visits
            .iter_mut()
            .find(|v| v.id == visit_id && scope.allows(v.branch_id))
        {
            None => Ok(SignOutOutcome::NotFound),
            Some(v) if v.sign_out_time.is_some() => Ok(SignOutOutcome::AlreadySignedOut),
            Some(v) => {
                v.sign_out_time = Some(Utc::now());
                Ok(SignOutOutcome::SignedOut)
            }
        }
    }

    async fn photo(
        &self,
        visit_id: i64,
        kind: PhotoKind,
        scope: BranchScope,
    ) -> DatabaseResult<Option<Vec<u8>>> {
        if kind != PhotoKind::Photo {
            return Ok(None);
        }
        Ok(self
            .visits
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.id == visit_id && scope.allows(v.branch_id))
            .and_then(|v| v.photo.clone()))
    }

    async fn search_visitors(
        &self,
        term: &str,
        scope: BranchScope,
    ) -> DatabaseResult<Vec<VisitorMatch>> {
        let visitors = self.visitors.lock().unwrap().clone();
        let visits = self.visits.lock().unwrap().clone();
        Ok(visitors
            .into_iter()
            .filter(|v| v.phone_number.contains(term) || v.name.contains(term))
            .filter_map(|v| {
                let last = visits
                    .iter()
                    .filter(|visit| visit.visitor_id == v.id && scope.allows(visit.branch_id))
                    .max_by_key(|visit| visit.sign_in_time);
                if last.is_none() && scope != BranchScope::Unrestricted {
                    return None;
                }
                Some(VisitorMatch {
                    id: v.id,
                    name: v.name,
                    phone_number: v.phone_number,
                    visits: v.visits,
                    last_visit: last.map(|visit| visit.sign_in_time),
                    last_visit_details: None,
                })
            })
            .take(10)
            .collect())
    }

    async fn visitor_reports(
        &self,
        filter: &ReportFilter,
        scope: BranchScope,
    ) -> DatabaseResult<(Vec<VisitorReportRow>, i64)> {
        let visitors = self.visitors.lock().unwrap().clone();
        let visits = self.visits.lock().unwrap().clone();
        let rows: Vec<VisitorReportRow> = visitors
            .into_iter()
            .filter_map(|v| {
                let mine: Vec<&VisitRow> = visits
                    .iter()
                    .filter(|visit| visit.visitor_id == v.id && scope.allows(visit.branch_id))
                    .collect();
                let is_vendor = mine.iter().any(|visit| visit.company.is_some());
                let wanted = match filter.vendor {
                    VendorFilter::All => true,
                    VendorFilter::Vendors => is_vendor,
                    VendorFilter::Regular => !is_vendor,
                };
                let searched = filter
                    .search
                    .as_ref()
                    .is_none_or(|term| v.name.contains(term.as_str()));
                let last_visit = mine.iter().map(|visit| visit.sign_in_time).max()?;
                (wanted && searched).then(|| VisitorReportRow {
                    id: v.id,
                    name: v.name,
                    visit_count: mine.len() as i32,
                    avg_duration_minutes: 0,
                    last_visit,
                    total_visits: v.visits,
                })
            })
            .collect();

        let total = rows.len() as i64;
        let page = rows
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn visitor_detail(
        &self,
        visitor_id: i64,
        scope: BranchScope,
    ) -> DatabaseResult<Option<VisitorDetail>> {
        let Some(v) = self
            .visitors
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.id == visitor_id)
            .cloned()
        else {
            return Ok(None);
        };

        let visits: Vec<VisitRecord> = self
            .visits
            .lock()
            .unwrap()
            .iter()
            .filter(|visit| visit.visitor_id == visitor_id && scope.allows(visit.branch_id))
            .map(|visit| VisitRecord {
                id: visit.id,
                digital_card_no: visit.digital_card_no.clone(),
                reason: visit.reason.clone(),
                office: visit.office.clone(),
                has_laptop: visit.has_laptop,
                laptop_brand: None,
                laptop_model: None,
                photo: visit.photo.as_deref().map(to_data_url),
                id_photo_front: None,
                id_photo_back: None,
                signature: None,
                sign_in_time: visit.sign_in_time,
                sign_out_time: visit.sign_out_time,
                duration_minutes: visit.duration_minutes(),
                branch_id: visit.branch_id,
                branch_name: None,
                registered_by_name: None,
                status: VisitRecord::status_for(visit.sign_out_time),
            })
            .collect();

        let statistics = VisitStatistics::from_visits(&visits);
        Ok(Some(VisitorDetail {
            visitor: VisitorSummary {
                id: v.id,
                name: v.name,
                total_visits: v.visits,
                created_at: v.created_at,
                updated_at: v.created_at,
            },
            visits,
            statistics,
        }))
    }

    async fn available_dates(&self, scope: BranchScope) -> DatabaseResult<Vec<NaiveDate>> {
        let mut dates: Vec<NaiveDate> = self
            .visits
            .lock()
            .unwrap()
            .iter()
            .filter(|v| scope.allows(v.branch_id))
            .map(|v| v.sign_in_time.date_naive())
            .collect();
        dates.sort_unstable_by(|a, b| b.cmp(a));
        dates.dedup();
        dates.truncate(30);
        Ok(dates)
    }

    async fn stats(&self, scope: BranchScope) -> DatabaseResult<DashboardStats> {
        let visits: Vec<VisitRow> = self
            .visits
            .lock()
            .unwrap()
            .iter()
            .filter(|v| scope.allows(v.branch_id))
            .cloned()
            .collect();
        let today = Utc::now().date_naive();
        let mut visitor_ids: Vec<i64> = visits.iter().map(|v| v.visitor_id).collect();
        visitor_ids.sort_unstable();
        visitor_ids.dedup();
        let total_users = self
            .users
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.is_active && scope.allows(u.branch_id))
            .count() as i64;

        Ok(DashboardStats {
            total_visits: visits.len() as i64,
            average_duration: 0,
            total_users,
            today_visits: visits
                .iter()
                .filter(|v| v.sign_in_time.date_naive() == today)
                .count() as i64,
            unique_visitors: visitor_ids.len() as i64,
            active_visits: visits.iter().filter(|v| v.sign_out_time.is_none()).count() as i64,
        })
    }

    async fn chart(
        &self,
        mode: ChartMode,
        range: ChartRange,
        scope: BranchScope,
    ) -> DatabaseResult<Vec<(u32, f64)>> {
        if mode == ChartMode::Duration || range != ChartRange::Daily {
            return Ok(Vec::new());
        }
        let visits = self.visits.lock().unwrap();
        let mut buckets: Vec<(u32, f64)> = Vec::new();
        for visit in visits.iter().filter(|v| scope.allows(v.branch_id)) {
            let hour = chrono::Timelike::hour(&visit.sign_in_time);
            match buckets.iter_mut().find(|(b, _)| *b == hour) {
                Some((_, count)) => *count += 1.0,
                None => buckets.push((hour, 1.0)),
            }
        }
        Ok(buckets)
    }
}

/// Router plus handles on its stores and codec
pub struct TestApp {
    pub router: Router,
    pub codec: TokenCodec,
    pub users: Arc<MemoryUsers>,
    pub visits: Arc<MemoryVisits>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_limits(RateLimiterConfig::default())
    }

    pub fn with_limits(limits: RateLimiterConfig) -> Self {
        let codec = TokenCodec::new(&TokenConfig {
            secret: "test-secret".to_string(),
        });
        let users = Arc::new(MemoryUsers::seeded());
        let visits = Arc::new(MemoryVisits {
            users: users.clone(),
            ..MemoryVisits::seeded()
        });

        let state = AppState {
            users: users.clone(),
            branches: Arc::new(MemoryBranches::seeded()),
            visits: visits.clone(),
            token_codec: codec.clone(),
            rate_limiter: RateLimiter::new(limits),
            cookie_secure: false,
        };

        Self {
            router: create_router(state),
            codec,
            users,
            visits,
        }
    }

    /// Bearer token for a seeded user
    pub fn token_for(&self, user_id: i64) -> String {
        self.codec.encode(user_id).unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }

    pub async fn get(&self, uri: &str, user_id: i64) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token_for(user_id)))
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = self.send(request).await;
        (status, body)
    }

    pub async fn json(
        &self,
        method: &str,
        uri: &str,
        user_id: Option<i64>,
        body: Value,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(id) = user_id {
            builder =
                builder.header(header::AUTHORIZATION, format!("Bearer {}", self.token_for(id)));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, HeaderMap, Value) {
        self.json(
            "POST",
            "/api/auth/login",
            None,
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }
}

pub fn memory_visits_exhausted() -> MemoryVisits {
    MemoryVisits {
        cards_exhausted: true,
        ..MemoryVisits::default()
    }
}
