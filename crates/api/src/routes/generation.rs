use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;

use crate::handlers::generation;
use crate::state::AppState;

/// Routes mounted at `/generations`.
///
/// ```text
/// POST /  -> generate (multipart in, text/event-stream out)
/// ```
///
/// The body limit is raised to `max_upload_bytes` here only; other routes
/// keep axum's default.
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", post(generation::generate))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}
