//! Persistence seams used by the HTTP layer
//!
//! Handlers only see these traits; `repositories` provides the PostgreSQL
//! implementations.

use async_trait::async_trait;
use chrono::NaiveDate;
use common::error::DatabaseResult;

use crate::{
    models::{
        Branch, BranchInput, ChartMode, ChartRange, DashboardStats, NewUserRecord, NewVisit,
        PhotoKind, RegisteredVisit, ReportFilter, SignOutOutcome, TodayVisit, User, UserChanges,
        UserSummary, VisitStatusFilter, VisitorDetail, VisitorMatch, VisitorReportRow,
    },
    scope::BranchScope,
};

/// User accounts
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Exact email match among active users only
    async fn find_active_by_email(&self, email: &str) -> DatabaseResult<Option<User>>;

    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>>;

    async fn list(&self) -> DatabaseResult<Vec<UserSummary>>;

    async fn count(&self) -> DatabaseResult<i64>;

    async fn create(&self, user: &NewUserRecord) -> DatabaseResult<i64>;

    /// Returns false when no such user exists
    async fn update(&self, id: i64, changes: &UserChanges) -> DatabaseResult<bool>;

    async fn set_active(&self, id: i64, active: bool) -> DatabaseResult<bool>;

    async fn delete(&self, id: i64) -> DatabaseResult<bool>;
}

/// Branches with their offices and visit reasons
#[async_trait]
pub trait BranchStore: Send + Sync {
    async fn list(&self) -> DatabaseResult<Vec<Branch>>;

    async fn exists(&self, id: i64) -> DatabaseResult<bool>;

    async fn create(&self, branch: &BranchInput) -> DatabaseResult<i64>;

    /// Replaces offices and reasons wholesale
    async fn update(&self, id: i64, branch: &BranchInput) -> DatabaseResult<bool>;

    /// Offices and reasons go with the branch
    async fn delete(&self, id: i64) -> DatabaseResult<bool>;
}

/// Visitors, visits and everything reported over them
#[async_trait]
pub trait VisitStore: Send + Sync {
    async fn card_number_exists(&self, card: &str) -> DatabaseResult<bool>;

    /// Upsert the visitor and insert the visit atomically.
    ///
    /// Returns `None` when a returning visitor id does not exist.
    async fn register(&self, visit: &NewVisit) -> DatabaseResult<Option<RegisteredVisit>>;

    async fn today(
        &self,
        scope: BranchScope,
        status: VisitStatusFilter,
    ) -> DatabaseResult<Vec<TodayVisit>>;

    async fn sign_out(&self, visit_id: i64, scope: BranchScope) -> DatabaseResult<SignOutOutcome>;

    async fn photo(
        &self,
        visit_id: i64,
        kind: PhotoKind,
        scope: BranchScope,
    ) -> DatabaseResult<Option<Vec<u8>>>;

    /// Up to ten visitors whose phone number or name contains `term`
    async fn search_visitors(
        &self,
        term: &str,
        scope: BranchScope,
    ) -> DatabaseResult<Vec<VisitorMatch>>;

    /// One page of the visitor report plus the total row count
    async fn visitor_reports(
        &self,
        filter: &ReportFilter,
        scope: BranchScope,
    ) -> DatabaseResult<(Vec<VisitorReportRow>, i64)>;

    /// Visitor header and the in-scope visits; `None` if the visitor is unknown
    async fn visitor_detail(
        &self,
        visitor_id: i64,
        scope: BranchScope,
    ) -> DatabaseResult<Option<VisitorDetail>>;

    /// Distinct sign-in dates, newest first, at most 30
    async fn available_dates(&self, scope: BranchScope) -> DatabaseResult<Vec<NaiveDate>>;

    async fn stats(&self, scope: BranchScope) -> DatabaseResult<DashboardStats>;

    /// Sparse `(bucket, value)` rows for the chart
    async fn chart(
        &self,
        mode: ChartMode,
        range: ChartRange,
        scope: BranchScope,
    ) -> DatabaseResult<Vec<(u32, f64)>>;
}
