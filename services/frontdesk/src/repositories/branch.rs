//! Branch repository

use async_trait::async_trait;
use common::error::DatabaseResult;
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::collections::HashMap;
use tracing::info;

use crate::{
    models::{Branch, BranchInput},
    store::BranchStore,
};

/// Branch repository
#[derive(Clone)]
pub struct PgBranchRepository {
    pool: PgPool,
}

impl PgBranchRepository {
    /// Create a new branch repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn insert_labels(
    tx: &mut Transaction<'_, Postgres>,
    table: &str,
    branch_id: i64,
    labels: &[String],
) -> DatabaseResult<()> {
    for label in labels {
        sqlx::query(&format!(
            "INSERT INTO {} (branch_id, name) VALUES ($1, $2)",
            table
        ))
        .bind(branch_id)
        .bind(label)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

async fn labels_by_branch(pool: &PgPool, table: &str) -> DatabaseResult<HashMap<i64, Vec<String>>> {
    let rows = sqlx::query(&format!(
        "SELECT branch_id, name FROM {} ORDER BY name",
        table
    ))
    .fetch_all(pool)
    .await?;

    let mut labels: HashMap<i64, Vec<String>> = HashMap::new();
    for row in rows {
        labels
            .entry(row.get("branch_id"))
            .or_default()
            .push(row.get("name"));
    }
    Ok(labels)
}

#[async_trait]
impl BranchStore for PgBranchRepository {
    async fn list(&self) -> DatabaseResult<Vec<Branch>> {
        let rows = sqlx::query(
            "SELECT id, name, location, created_at, updated_at FROM branches ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut offices = labels_by_branch(&self.pool, "branch_offices").await?;
        let mut reasons = labels_by_branch(&self.pool, "branch_reasons").await?;

        let branches = rows
            .into_iter()
            .map(|row| {
                let id: i64 = row.get("id");
                Branch {
                    id,
                    name: row.get("name"),
                    location: row.get("location"),
                    offices: offices.remove(&id).unwrap_or_default(),
                    reasons: reasons.remove(&id).unwrap_or_default(),
                    created_at: row.get("created_at"),
                    updated_at: row.get("updated_at"),
                }
            })
            .collect();

        Ok(branches)
    }

    async fn exists(&self, id: i64) -> DatabaseResult<bool> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM branches WHERE id = $1) AS found")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("found"))
    }

    async fn create(&self, branch: &BranchInput) -> DatabaseResult<i64> {
        info!("Creating branch: {}", branch.name);

        let mut tx = self.pool.begin().await?;
        let row = sqlx::query("INSERT INTO branches (name, location) VALUES ($1, $2) RETURNING id")
            .bind(&branch.name)
            .bind(&branch.location)
            .fetch_one(&mut *tx)
            .await?;
        let id: i64 = row.get("id");

        insert_labels(&mut tx, "branch_offices", id, &branch.offices).await?;
        insert_labels(&mut tx, "branch_reasons", id, &branch.reasons).await?;
        tx.commit().await?;

        Ok(id)
    }

    async fn update(&self, id: i64, branch: &BranchInput) -> DatabaseResult<bool> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "UPDATE branches SET name = $2, location = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(&branch.name)
        .bind(&branch.location)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        for table in ["branch_offices", "branch_reasons"] {
            sqlx::query(&format!("DELETE FROM {} WHERE branch_id = $1", table))
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        insert_labels(&mut tx, "branch_offices", id, &branch.offices).await?;
        insert_labels(&mut tx, "branch_reasons", id, &branch.reasons).await?;
        tx.commit().await?;

        Ok(true)
    }

    async fn delete(&self, id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM branches WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
