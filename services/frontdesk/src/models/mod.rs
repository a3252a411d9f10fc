//! Front-desk domain models

pub mod branch;
pub mod report;
pub mod user;
pub mod visit;

// Re-export for convenience
pub use branch::{Branch, BranchInput, BranchPayload};
pub use report::{
    ChartMode, ChartPoint, ChartRange, DashboardStats, Pagination, ReportFilter, ReportQuery,
    VendorFilter, VisitRecord, VisitStatistics, VisitorDetail, VisitorReportPage,
    VisitorReportRow, VisitorSummary,
};
pub use user::{NewUser, NewUserRecord, PublicProfile, UpdateUser, User, UserChanges, UserSummary};
pub use visit::{
    LastVisitDetails, NewVisit, PhotoKind, RegisterVisit, RegisteredVisit, SignOutOutcome,
    TodayVisit, VisitStatusFilter, VisitorChoice, VisitorMatch,
};
