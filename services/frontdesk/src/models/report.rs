//! Report and dashboard models

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Query parameters for the visitor report listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportQuery {
    /// Page number (1-based)
    pub page: Option<u32>,
    /// Number of rows per page
    pub limit: Option<u32>,
    /// Name search term
    pub search: Option<String>,
    /// `all`, `vendors` or `regular`
    pub vendor: Option<String>,
}

/// Whether to restrict the report to vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorFilter {
    All,
    /// Visitors with at least one visit on behalf of a company
    Vendors,
    /// Visitors that never came as a vendor
    Regular,
}

/// Normalized report filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFilter {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub vendor: VendorFilter,
}

impl ReportQuery {
    pub fn into_filter(self) -> ReportFilter {
        let vendor = match self.vendor.as_deref() {
            Some("vendors") => VendorFilter::Vendors,
            Some("regular") => VendorFilter::Regular,
            _ => VendorFilter::All,
        };

        ReportFilter {
            page: self.page.unwrap_or(1).max(1),
            limit: self.limit.unwrap_or(10).clamp(1, 100),
            search: self
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            vendor,
        }
    }
}

impl ReportFilter {
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }
}

/// One visitor in the report listing
#[derive(Debug, Clone, Serialize)]
pub struct VisitorReportRow {
    pub id: i64,
    pub name: String,
    pub visit_count: i32,
    pub avg_duration_minutes: i64,
    pub last_visit: DateTime<Utc>,
    pub total_visits: i32,
}

/// Pagination block of a report page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: i64) -> Self {
        let limit_i64 = i64::from(limit.max(1));
        let total_pages = (total + limit_i64 - 1) / limit_i64;
        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: i64::from(page) < total_pages,
            has_prev: page > 1,
        }
    }
}

/// Response for the visitor report listing
#[derive(Debug, Clone, Serialize)]
pub struct VisitorReportPage {
    pub visitors: Vec<VisitorReportRow>,
    pub pagination: Pagination,
}

/// Visitor header of the detail report
#[derive(Debug, Clone, Serialize)]
pub struct VisitorSummary {
    pub id: i64,
    pub name: String,
    pub total_visits: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One visit in the detail report; images are bare base64
#[derive(Debug, Clone, Serialize)]
pub struct VisitRecord {
    pub id: i64,
    pub digital_card_no: String,
    pub reason: String,
    pub office: String,
    pub has_laptop: bool,
    pub laptop_brand: Option<String>,
    pub laptop_model: Option<String>,
    pub photo: Option<String>,
    pub id_photo_front: Option<String>,
    pub id_photo_back: Option<String>,
    pub signature: Option<String>,
    pub sign_in_time: DateTime<Utc>,
    pub sign_out_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
    pub branch_id: Option<i64>,
    pub branch_name: Option<String>,
    pub registered_by_name: Option<String>,
    pub status: String,
}

impl VisitRecord {
    /// `completed` once signed out, `active` otherwise
    pub fn status_for(sign_out_time: Option<DateTime<Utc>>) -> String {
        if sign_out_time.is_some() {
            "completed".to_string()
        } else {
            "active".to_string()
        }
    }
}

/// Aggregates over the visits shown in a detail report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitStatistics {
    pub total_visits: usize,
    pub completed_visits: usize,
    pub active_visits: usize,
    pub avg_duration_minutes: i64,
}

impl VisitStatistics {
    pub fn from_visits(visits: &[VisitRecord]) -> Self {
        let total_visits = visits.len();
        let completed_visits = visits.iter().filter(|v| v.sign_out_time.is_some()).count();
        let total_minutes: i64 = visits.iter().filter_map(|v| v.duration_minutes).sum();
        let avg_duration_minutes = if completed_visits > 0 {
            (total_minutes as f64 / completed_visits as f64).round() as i64
        } else {
            0
        };

        Self {
            total_visits,
            completed_visits,
            active_visits: total_visits - completed_visits,
            avg_duration_minutes,
        }
    }
}

/// Response for the visitor detail report
#[derive(Debug, Clone, Serialize)]
pub struct VisitorDetail {
    pub visitor: VisitorSummary,
    pub visits: Vec<VisitRecord>,
    pub statistics: VisitStatistics,
}

/// Dashboard counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_visits: i64,
    pub average_duration: i64,
    pub total_users: i64,
    pub today_visits: i64,
    pub unique_visitors: i64,
    pub active_visits: i64,
}

/// What the chart plots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartMode {
    /// Number of sign-ins per bucket
    Visits,
    /// Average minutes on premises per bucket
    Duration,
}

/// Bucket granularity of the chart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartRange {
    /// Hours of today
    Daily,
    /// Days of the current month
    Monthly,
    /// Months of the current year
    Yearly,
}

impl ChartMode {
    pub fn from_query(mode: Option<&str>) -> Self {
        match mode {
            Some("duration") => ChartMode::Duration,
            _ => ChartMode::Visits,
        }
    }
}

impl ChartRange {
    pub fn from_query(range: Option<&str>) -> Self {
        match range {
            Some("monthly") => ChartRange::Monthly,
            Some("yearly") => ChartRange::Yearly,
            _ => ChartRange::Daily,
        }
    }
}

/// One chart bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartPoint {
    pub period: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
}

/// Expand sparse `(bucket, value)` rows into a zero-filled series.
///
/// Buckets are hours `0..24` for daily, days `1..=n` for monthly and months
/// `1..=12` for yearly. Duration has no daily series.
pub fn fill_chart(
    mode: ChartMode,
    range: ChartRange,
    today: NaiveDate,
    rows: &[(u32, f64)],
) -> Vec<ChartPoint> {
    let value_for = |bucket: u32| {
        rows.iter()
            .find(|(b, _)| *b == bucket)
            .map(|(_, v)| v.round() as i64)
            .unwrap_or(0)
    };
    let point = |period: String, bucket: u32| match mode {
        ChartMode::Visits => ChartPoint {
            period,
            count: Some(value_for(bucket)),
            duration: None,
        },
        ChartMode::Duration => ChartPoint {
            period,
            count: None,
            duration: Some(value_for(bucket)),
        },
    };

    match (mode, range) {
        (ChartMode::Duration, ChartRange::Daily) => Vec::new(),
        (_, ChartRange::Daily) => (0..24).map(|h| point(format!("{}:00", h), h)).collect(),
        (_, ChartRange::Monthly) => (1..=days_in_month(today))
            .map(|d| point(d.to_string(), d))
            .collect(),
        (_, ChartRange::Yearly) => MONTHS
            .iter()
            .zip(1u32..)
            .map(|(name, m)| point((*name).to_string(), m))
            .collect(),
    }
}

fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}
