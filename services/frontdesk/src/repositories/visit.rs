//! Visitor and visit repository

use async_trait::async_trait;
use chrono::NaiveDate;
use common::error::DatabaseResult;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};
use tracing::{debug, info};

use super::{contains_pattern, push_scope};
use crate::{
    models::{
        ChartMode, ChartRange, DashboardStats, LastVisitDetails, NewVisit, PhotoKind,
        RegisteredVisit, ReportFilter, SignOutOutcome, TodayVisit, VendorFilter, VisitRecord,
        VisitStatistics, VisitStatusFilter, VisitorChoice, VisitorDetail, VisitorMatch,
        VisitorReportRow, VisitorSummary, visit::to_data_url,
    },
    scope::BranchScope,
    store::VisitStore,
};

const MAX_SEARCH_RESULTS: i64 = 10;
const MAX_AVAILABLE_DATES: i64 = 30;

/// Minutes between sign-in and sign-out of a visit aliased `v`
const DURATION_MINUTES: &str = "EXTRACT(EPOCH FROM (v.sign_out_time - v.sign_in_time)) / 60";

/// Visit repository
#[derive(Clone)]
pub struct PgVisitRepository {
    pool: PgPool,
}

impl PgVisitRepository {
    /// Create a new visit repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn image(row: &PgRow, column: &str) -> Option<String> {
    row.get::<Option<Vec<u8>>, _>(column)
        .map(|bytes| to_data_url(&bytes))
}

/// Shared `FROM .. HAVING` part of the visitor report
fn push_report_body(
    builder: &mut QueryBuilder<'_, Postgres>,
    filter: &ReportFilter,
    scope: BranchScope,
) {
    builder.push(
        " FROM visitors vi JOIN visits v ON v.visitor_id = vi.id WHERE TRUE",
    );
    push_scope(builder, "v.branch_id", scope);
    if let Some(search) = &filter.search {
        builder
            .push(" AND vi.name ILIKE ")
            .push_bind(contains_pattern(search))
            .push(r" ESCAPE '\'");
    }
    builder.push(" GROUP BY vi.id, vi.name, vi.visits");
    match filter.vendor {
        VendorFilter::All => {}
        VendorFilter::Vendors => {
            builder.push(" HAVING BOOL_OR(v.company IS NOT NULL)");
        }
        VendorFilter::Regular => {
            builder.push(" HAVING NOT BOOL_OR(v.company IS NOT NULL)");
        }
    }
}

#[async_trait]
impl VisitStore for PgVisitRepository {
    async fn card_number_exists(&self, card: &str) -> DatabaseResult<bool> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM visits WHERE digital_card_no = $1) AS found",
        )
        .bind(card)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("found"))
    }

    async fn register(&self, visit: &NewVisit) -> DatabaseResult<Option<RegisteredVisit>> {
        let mut tx = self.pool.begin().await?;

        let visitor_id: i64 = match &visit.visitor {
            VisitorChoice::New { name, phone_number } => {
                let row = sqlx::query(
                    r#"
                    INSERT INTO visitors (name, phone_number, visits)
                    VALUES ($1, $2, 1)
                    ON CONFLICT (phone_number) DO UPDATE
                    SET name = EXCLUDED.name, visits = visitors.visits + 1, updated_at = NOW()
                    RETURNING id
                    "#,
                )
                .bind(name)
                .bind(phone_number)
                .fetch_one(&mut *tx)
                .await?;
                row.get("id")
            }
            VisitorChoice::Returning { visitor_id, .. } => {
                let result = sqlx::query(
                    "UPDATE visitors SET visits = visits + 1, updated_at = NOW() WHERE id = $1",
                )
                .bind(visitor_id)
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() == 0 {
                    tx.rollback().await?;
                    return Ok(None);
                }
                *visitor_id
            }
        };

        let row = sqlx::query(
            r#"
            INSERT INTO visits (
                visitor_id, digital_card_no, reason, office, branch_id, has_laptop,
                laptop_brand, laptop_model, company, person_in_charge,
                photo, id_photo_front, id_photo_back, sign_in_time, registered_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING id
            "#,
        )
        .bind(visitor_id)
        .bind(&visit.digital_card_no)
        .bind(&visit.reason)
        .bind(&visit.office)
        .bind(visit.branch_id)
        .bind(visit.has_laptop)
        .bind(&visit.laptop_brand)
        .bind(&visit.laptop_model)
        .bind(&visit.company)
        .bind(&visit.person_in_charge)
        .bind(&visit.photo)
        .bind(&visit.id_photo_front)
        .bind(&visit.id_photo_back)
        .bind(visit.sign_in_time)
        .bind(visit.registered_by)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let visit_id: i64 = row.get("id");
        info!("Recorded visit {} for visitor {}", visit_id, visitor_id);
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
        let mut builder = QueryBuilder::<Postgres>::new(
            r#"
            SELECT v.id, v.digital_card_no, vi.name, v.reason, v.office,
                   v.sign_in_time, v.sign_out_time, v.has_laptop, v.laptop_brand,
                   v.laptop_model, v.photo, v.branch_id, b.name AS branch_name,
                   u.name AS registered_by_name, vi.visits AS total_visits
            FROM visits v
            JOIN visitors vi ON vi.id = v.visitor_id
            LEFT JOIN branches b ON b.id = v.branch_id
            LEFT JOIN users u ON u.id = v.registered_by
            WHERE v.sign_in_time >= date_trunc('day', NOW())
            "#,
        );
        push_scope(&mut builder, "v.branch_id", scope);
        match status {
            VisitStatusFilter::All => {}
            VisitStatusFilter::Active => {
                builder.push(" AND v.sign_out_time IS NULL");
            }
            VisitStatusFilter::Inactive => {
                builder.push(" AND v.sign_out_time IS NOT NULL");
            }
        }
        builder.push(" ORDER BY v.sign_in_time DESC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        let visits = rows
            .iter()
            .map(|row| TodayVisit {
                id: row.get("id"),
                digital_card_no: row.get("digital_card_no"),
                name: row.get("name"),
                reason: row.get("reason"),
                office: row.get("office"),
                sign_in_time: row.get("sign_in_time"),
                sign_out_time: row.get("sign_out_time"),
                has_laptop: row.get("has_laptop"),
                laptop_brand: row.get("laptop_brand"),
                laptop_model: row.get("laptop_model"),
                photo: image(row, "photo"),
                branch_id: row.get("branch_id"),
                branch_name: row.get("branch_name"),
                registered_by_name: row.get("registered_by_name"),
                total_visits: row.get("total_visits"),
            })
            .collect();

        Ok(visits)
    }

    async fn sign_out(&self, visit_id: i64, scope: BranchScope) -> DatabaseResult<SignOutOutcome> {
        let mut builder =
            QueryBuilder::<Postgres>::new("SELECT v.sign_out_time FROM visits v WHERE v.id = ");
        builder.push_bind(visit_id);
        push_scope(&mut builder, "v.branch_id", scope);

        let Some(row) = builder.build().fetch_optional(&self.pool).await? else {
            return Ok(SignOutOutcome::NotFound);
        };
        let signed_out: Option<chrono::DateTime<chrono::Utc>> = row.get("sign_out_time");
        if signed_out.is_some() {
            return Ok(SignOutOutcome::AlreadySignedOut);
        }

        let result = sqlx::query(
            "UPDATE visits SET sign_out_time = NOW() WHERE id = $1 AND sign_out_time IS NULL",
        )
        .bind(visit_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(SignOutOutcome::AlreadySignedOut);
        }
        Ok(SignOutOutcome::SignedOut)
    }

    async fn photo(
        &self,
        visit_id: i64,
        kind: PhotoKind,
        scope: BranchScope,
    ) -> DatabaseResult<Option<Vec<u8>>> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT v.");
        builder
            .push(kind.column())
            .push(" AS image FROM visits v WHERE v.id = ")
            .push_bind(visit_id);
        push_scope(&mut builder, "v.branch_id", scope);

        let row = builder.build().fetch_optional(&self.pool).await?;
        Ok(row.and_then(|row| row.get::<Option<Vec<u8>>, _>("image")))
    }

    async fn search_visitors(
        &self,
        term: &str,
        scope: BranchScope,
    ) -> DatabaseResult<Vec<VisitorMatch>> {
        debug!("Searching visitors");

        let mut builder = QueryBuilder::<Postgres>::new(
            r#"
            SELECT vi.id, vi.name, vi.phone_number, vi.visits,
                   lv.sign_in_time AS last_visit, lv.reason, lv.office,
                   lv.has_laptop, lv.laptop_brand, lv.laptop_model
            FROM visitors vi
            LEFT JOIN LATERAL (
                SELECT v.sign_in_time, v.reason, v.office, v.has_laptop,
                       v.laptop_brand, v.laptop_model
                FROM visits v
                WHERE v.visitor_id = vi.id
            "#,
        );
        push_scope(&mut builder, "v.branch_id", scope);
        builder.push(
            " ORDER BY v.sign_in_time DESC LIMIT 1) lv ON TRUE WHERE (vi.phone_number ILIKE ",
        );
        let pattern = contains_pattern(term);
        builder
            .push_bind(pattern.clone())
            .push(r" ESCAPE '\' OR vi.name ILIKE ")
            .push_bind(pattern)
            .push(r" ESCAPE '\')");
        if scope != BranchScope::Unrestricted {
            builder.push(" AND lv.sign_in_time IS NOT NULL");
        }
        builder
            .push(" ORDER BY lv.sign_in_time DESC NULLS LAST LIMIT ")
            .push_bind(MAX_SEARCH_RESULTS);

        let rows = builder.build().fetch_all(&self.pool).await?;
        let matches = rows
            .iter()
            .map(|row| {
                let last_visit: Option<chrono::DateTime<chrono::Utc>> = row.get("last_visit");
                VisitorMatch {
                    id: row.get("id"),
                    name: row.get("name"),
                    phone_number: row.get("phone_number"),
                    visits: row.get("visits"),
                    last_visit,
                    last_visit_details: last_visit.map(|_| LastVisitDetails {
                        reason: row.get("reason"),
                        office: row.get("office"),
                        has_laptop: row.get("has_laptop"),
                        laptop_brand: row.get("laptop_brand"),
                        laptop_model: row.get("laptop_model"),
                    }),
                }
            })
            .collect();

        Ok(matches)
    }

    async fn visitor_reports(
        &self,
        filter: &ReportFilter,
        scope: BranchScope,
    ) -> DatabaseResult<(Vec<VisitorReportRow>, i64)> {
        let mut count =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) AS total FROM (SELECT vi.id");
        push_report_body(&mut count, filter, scope);
        count.push(") counted");
        let total: i64 = count.build().fetch_one(&self.pool).await?.get("total");

        let mut page = QueryBuilder::<Postgres>::new(
            "SELECT vi.id, vi.name, COUNT(v.id)::INT AS visit_count, COALESCE(ROUND(AVG(",
        );
        page.push(DURATION_MINUTES).push(
            ") FILTER (WHERE v.sign_out_time IS NOT NULL)), 0)::BIGINT AS avg_duration_minutes, \
             MAX(v.sign_in_time) AS last_visit, vi.visits AS total_visits",
        );
        push_report_body(&mut page, filter, scope);
        page.push(" ORDER BY last_visit DESC LIMIT ")
            .push_bind(filter.limit as i64)
            .push(" OFFSET ")
            .push_bind(filter.offset());

        let rows = page.build().fetch_all(&self.pool).await?;
        let visitors = rows
            .iter()
            .map(|row| VisitorReportRow {
                id: row.get("id"),
                name: row.get("name"),
                visit_count: row.get("visit_count"),
                avg_duration_minutes: row.get("avg_duration_minutes"),
                last_visit: row.get("last_visit"),
                total_visits: row.get("total_visits"),
            })
            .collect();

        Ok((visitors, total))
    }

    async fn visitor_detail(
        &self,
        visitor_id: i64,
        scope: BranchScope,
    ) -> DatabaseResult<Option<VisitorDetail>> {
        let Some(row) = sqlx::query(
            "SELECT id, name, visits, created_at, updated_at FROM visitors WHERE id = $1",
        )
        .bind(visitor_id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let visitor = VisitorSummary {
            id: row.get("id"),
            name: row.get("name"),
            total_visits: row.get("visits"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        };

        let mut builder = QueryBuilder::<Postgres>::new(
            r#"
            SELECT v.id, v.digital_card_no, v.reason, v.office, v.has_laptop,
                   v.laptop_brand, v.laptop_model, v.photo, v.id_photo_front,
                   v.id_photo_back, v.signature, v.sign_in_time, v.sign_out_time,
                   v.branch_id, b.name AS branch_name, u.name AS registered_by_name,
                   CASE WHEN v.sign_out_time IS NOT NULL THEN ROUND(
            "#,
        );
        builder.push(DURATION_MINUTES).push(
            r#")::BIGINT END AS duration_minutes
            FROM visits v
            LEFT JOIN branches b ON b.id = v.branch_id
            LEFT JOIN users u ON u.id = v.registered_by
            WHERE v.visitor_id = "#,
        );
        builder.push_bind(visitor_id);
        push_scope(&mut builder, "v.branch_id", scope);
        builder.push(" ORDER BY v.sign_in_time DESC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        let visits: Vec<VisitRecord> = rows
            .iter()
            .map(|row| {
                let sign_out_time = row.get("sign_out_time");
                VisitRecord {
                    id: row.get("id"),
                    digital_card_no: row.get("digital_card_no"),
                    reason: row.get("reason"),
                    office: row.get("office"),
                    has_laptop: row.get("has_laptop"),
                    laptop_brand: row.get("laptop_brand"),
                    laptop_model: row.get("laptop_model"),
                    photo: image(row, "photo"),
                    id_photo_front: image(row, "id_photo_front"),
                    id_photo_back: image(row, "id_photo_back"),
                    signature: image(row, "signature"),
                    sign_in_time: row.get("sign_in_time"),
                    sign_out_time,
                    duration_minutes: row.get("duration_minutes"),
                    branch_id: row.get("branch_id"),
                    branch_name: row.get("branch_name"),
                    registered_by_name: row.get("registered_by_name"),
                    status: VisitRecord::status_for(sign_out_time),
                }
            })
            .collect();

        let statistics = VisitStatistics::from_visits(&visits);
        Ok(Some(VisitorDetail {
            visitor,
            visits,
            statistics,
        }))
    }

    async fn available_dates(&self, scope: BranchScope) -> DatabaseResult<Vec<NaiveDate>> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT DISTINCT DATE(v.sign_in_time) AS day FROM visits v WHERE TRUE",
        );
        push_scope(&mut builder, "v.branch_id", scope);
        builder
            .push(" ORDER BY day DESC LIMIT ")
            .push_bind(MAX_AVAILABLE_DATES);

        let rows = builder.build().fetch_all(&self.pool).await?;
        Ok(rows.iter().map(|row| row.get("day")).collect())
    }

    async fn stats(&self, scope: BranchScope) -> DatabaseResult<DashboardStats> {
        let mut visits = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) AS total_visits, COALESCE(ROUND(AVG(",
        );
        visits.push(DURATION_MINUTES).push(
            r#") FILTER (WHERE v.sign_out_time IS NOT NULL)), 0)::BIGINT AS average_duration,
               COUNT(*) FILTER (WHERE v.sign_in_time >= date_trunc('day', NOW())) AS today_visits,
               COUNT(DISTINCT v.visitor_id) AS unique_visitors,
               COUNT(*) FILTER (WHERE v.sign_out_time IS NULL) AS active_visits
            FROM visits v WHERE TRUE"#,
        );
        push_scope(&mut visits, "v.branch_id", scope);
        let row = visits.build().fetch_one(&self.pool).await?;

        let mut users = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) AS total FROM users u WHERE u.is_active = TRUE",
        );
        push_scope(&mut users, "u.branch_id", scope);
        let total_users: i64 = users.build().fetch_one(&self.pool).await?.get("total");

        Ok(DashboardStats {
            total_visits: row.get("total_visits"),
            average_duration: row.get("average_duration"),
            total_users,
            today_visits: row.get("today_visits"),
            unique_visitors: row.get("unique_visitors"),
            active_visits: row.get("active_visits"),
        })
    }

    async fn chart(
        &self,
        mode: ChartMode,
        range: ChartRange,
        scope: BranchScope,
    ) -> DatabaseResult<Vec<(u32, f64)>> {
        let (bucket, since) = match range {
            ChartRange::Daily => ("HOUR", "day"),
            ChartRange::Monthly => ("DAY", "month"),
            ChartRange::Yearly => ("MONTH", "year"),
        };
        if mode == ChartMode::Duration && range == ChartRange::Daily {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Postgres>::new("SELECT EXTRACT(");
        builder.push(bucket).push(" FROM v.sign_in_time)::INT AS bucket, ");
        match mode {
            ChartMode::Visits => builder.push("COUNT(*)::FLOAT8 AS value"),
            ChartMode::Duration => builder
                .push("AVG(")
                .push(DURATION_MINUTES)
                .push(")::FLOAT8 AS value"),
        };
        builder
            .push(" FROM visits v WHERE v.sign_in_time >= date_trunc('")
            .push(since)
            .push("', NOW())");
        if mode == ChartMode::Duration {
            builder.push(" AND v.sign_out_time IS NOT NULL");
        }
        push_scope(&mut builder, "v.branch_id", scope);
        builder.push(" GROUP BY bucket ORDER BY bucket");

        let rows = builder.build().fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(|row| {
                let bucket: i32 = row.get("bucket");
                (bucket.max(0) as u32, row.get::<f64, _>("value"))
            })
            .collect())
    }
}
