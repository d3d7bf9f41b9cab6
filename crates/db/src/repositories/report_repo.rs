//! Repository for the `reports` table.

use report_core::types::DbId;
use sqlx::PgPool;

use crate::models::report::{CreateReport, InsertedReport, Report, ReportWithAuthor};

const COLUMNS: &str = "id, title, category, summary, content, conversation_id, kpi_target, \
                       campaign_name, product_category, current_metrics_img, input_creative, \
                       user_id, created_at";

/// Same columns qualified with the `r` alias for joins.
const JOINED_COLUMNS: &str = "r.id, r.title, r.category, r.summary, r.content, \
                              r.conversation_id, r.kpi_target, r.campaign_name, \
                              r.product_category, r.current_metrics_img, r.input_creative, \
                              r.user_id, r.created_at, u.name AS user_name";

/// Provides insert, read, and delete operations for reports.
pub struct ReportRepo;

impl ReportRepo {
    /// Insert a completed report, returning its id and creation timestamp.
    pub async fn create(pool: &PgPool, input: &CreateReport) -> Result<InsertedReport, sqlx::Error> {
        sqlx::query_as::<_, InsertedReport>(
            "INSERT INTO reports (
                title, category, summary, content, conversation_id,
                kpi_target, campaign_name, product_category,
                current_metrics_img, input_creative, user_id
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING id, created_at",
        )
        .bind(&input.title)
        .bind(&input.category)
        .bind(&input.summary)
        .bind(&input.content)
        .bind(&input.conversation_id)
        .bind(&input.kpi_target)
        .bind(&input.campaign_name)
        .bind(&input.product_category)
        .bind(&input.current_metrics_img)
        .bind(&input.input_creative)
        .bind(input.user_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Report>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reports WHERE id = $1");
        sqlx::query_as::<_, Report>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List reports newest first, with the author's name when known.
    pub async fn list(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ReportWithAuthor>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS}
             FROM reports r
             LEFT JOIN users u ON r.user_id = u.id
             ORDER BY r.created_at DESC, r.id DESC
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, ReportWithAuthor>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Delete one report. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM reports WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every report whose id is in `ids`, returning the ids actually removed.
    pub async fn delete_many(pool: &PgPool, ids: &[DbId]) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>("DELETE FROM reports WHERE id = ANY($1) RETURNING id")
            .bind(ids)
            .fetch_all(pool)
            .await
    }
}
