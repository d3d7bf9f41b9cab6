//! Handlers for the `/reports` resource.
//!
//! Reports are created only by the generation relay; these endpoints list,
//! fetch and delete them.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use report_core::error::CoreError;
use report_core::types::DbId;
use report_db::models::report::{DeleteReportsRequest, DeletedReports};
use report_db::repositories::{clamp_limit, clamp_offset, ReportRepo};

use crate::error::{AppError, AppResult};
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/reports?limit=&offset=
///
/// Newest first, each with the author's name when known.
pub async fn list_reports(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let reports = ReportRepo::list(
        &state.pool,
        clamp_limit(params.limit),
        clamp_offset(params.offset),
    )
    .await?;

    Ok(Json(DataResponse { data: reports }))
}

/// GET /api/v1/reports/{id}
pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let report = ReportRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Report",
            id,
        }))?;

    Ok(Json(DataResponse { data: report }))
}

/// DELETE /api/v1/reports/{id}
pub async fn delete_report(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !ReportRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Report",
            id,
        }));
    }

    tracing::info!(report_id = id, "Report deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/reports
///
/// Batch delete by id. Ids that do not exist are ignored; the response lists
/// the ids actually removed.
pub async fn delete_reports(
    State(state): State<AppState>,
    Json(input): Json<DeleteReportsRequest>,
) -> AppResult<impl IntoResponse> {
    if input.ids.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "ids must contain at least one report id".into(),
        )));
    }

    let deleted_ids = ReportRepo::delete_many(&state.pool, &input.ids).await?;

    tracing::info!(
        requested = input.ids.len(),
        deleted = deleted_ids.len(),
        "Reports batch deleted",
    );

    Ok(Json(DataResponse {
        data: DeletedReports {
            deleted_count: deleted_ids.len() as u64,
            deleted_ids,
        },
    }))
}
