//! User repository for database operations

use async_trait::async_trait;
use common::error::DatabaseResult;
use sqlx::{PgPool, Row};
use tracing::info;

use crate::{
    models::{NewUserRecord, User, UserChanges, UserSummary},
    store::UserStore,
};

const USER_COLUMNS: &str = "id, name, email, phone_number, password, branch_id, is_active, \
                            is_admin, created_at, updated_at";

/// User repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserRepository {
    async fn find_active_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1 AND is_active = TRUE",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list(&self) -> DatabaseResult<Vec<UserSummary>> {
        let users = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.name, u.email, u.phone_number, u.branch_id,
                   b.name AS branch_name, u.is_active, u.is_admin, u.created_at
            FROM users u
            LEFT JOIN branches b ON b.id = u.branch_id
            ORDER BY u.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn count(&self) -> DatabaseResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("count"))
    }

    async fn create(&self, user: &NewUserRecord) -> DatabaseResult<i64> {
        info!("Creating new user: {}", user.email);

        let row = sqlx::query(
            r#"
            INSERT INTO users (name, email, phone_number, password, branch_id, is_active, is_admin)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone_number)
        .bind(&user.password_hash)
        .bind(user.branch_id)
        .bind(user.is_active)
        .bind(user.is_admin)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("id"))
    }

    async fn update(&self, id: i64, changes: &UserChanges) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = $2, email = $3, phone_number = $4,
                password = COALESCE($5, password),
                branch_id = $6, is_active = $7, is_admin = $8, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.email)
        .bind(&changes.phone_number)
        .bind(&changes.password_hash)
        .bind(changes.branch_id)
        .bind(changes.is_active)
        .bind(changes.is_admin)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_active(&self, id: i64, active: bool) -> DatabaseResult<bool> {
        let result =
            sqlx::query("UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(active)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
