//! Destination for completed reports.

use async_trait::async_trait;
use report_db::models::report::{CreateReport, InsertedReport};
use report_db::repositories::ReportRepo;
use report_db::DbPool;

/// Persists a completed report.
///
/// Errors are returned to the relay, which logs and swallows them: the
/// client has already received the full stream by the time this runs.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn persist(&self, report: CreateReport) -> Result<InsertedReport, sqlx::Error>;
}

/// [`ReportSink`] writing to the `reports` table.
#[derive(Clone)]
pub struct PgReportSink {
    pool: DbPool,
}

impl PgReportSink {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportSink for PgReportSink {
    async fn persist(&self, report: CreateReport) -> Result<InsertedReport, sqlx::Error> {
        ReportRepo::create(&self.pool, &report).await
    }
}
