use axum::routing::get;
use axum::Router;

use crate::handlers::reports;
use crate::state::AppState;

/// Routes mounted at `/reports`.
///
/// ```text
/// GET    /      -> list_reports
/// DELETE /      -> delete_reports (batch, body: {"ids": [...]})
/// GET    /{id}  -> get_report
/// DELETE /{id}  -> delete_report
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(reports::list_reports).delete(reports::delete_reports),
        )
        .route(
            "/{id}",
            get(reports::get_report).delete(reports::delete_report),
        )
}
