//! Generated report entity and DTOs.
//!
//! Reports are written once when a generation stream completes and are
//! never updated afterwards; there is deliberately no update DTO.

use report_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `reports` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Report {
    pub id: DbId,
    pub title: String,
    pub category: String,
    pub summary: String,
    pub content: String,
    pub conversation_id: String,
    pub kpi_target: String,
    pub campaign_name: String,
    pub product_category: String,
    pub current_metrics_img: Option<String>,
    pub input_creative: Option<String>,
    pub user_id: Option<DbId>,
    pub created_at: Timestamp,
}

/// List row: a report plus the author's display name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReportWithAuthor {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub report: Report,
    pub user_name: Option<String>,
}

/// DTO for inserting a completed report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateReport {
    pub title: String,
    pub category: String,
    pub summary: String,
    pub content: String,
    pub conversation_id: String,
    pub kpi_target: String,
    pub campaign_name: String,
    pub product_category: String,
    pub current_metrics_img: Option<String>,
    pub input_creative: Option<String>,
    pub user_id: Option<DbId>,
}

/// Id and timestamp returned by the insert.
#[derive(Debug, Clone, Copy, FromRow, Serialize)]
pub struct InsertedReport {
    pub id: DbId,
    pub created_at: Timestamp,
}

/// Request body for batch deletion.
#[derive(Debug, Deserialize)]
pub struct DeleteReportsRequest {
    #[serde(default)]
    pub ids: Vec<DbId>,
}

/// Result of a batch deletion.
#[derive(Debug, Clone, Serialize)]
pub struct DeletedReports {
    pub deleted_count: u64,
    pub deleted_ids: Vec<DbId>,
}
