pub mod auth;
pub mod categories;
pub mod generation;
pub mod health;
pub mod reports;

use axum::Router;

use crate::config::ServerConfig;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                 register (public)
/// /auth/login                    login (public)
/// /auth/user                     update profile (requires auth)
///
/// /categories                    list, create
/// /categories/{id}               rename, delete
///
/// /reports                       list (paginated), batch delete
/// /reports/{id}                  get, delete
///
/// /generations                   multipart submission -> event stream
/// ```
pub fn api_routes(config: &ServerConfig) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/categories", categories::router())
        .nest("/reports", reports::router())
        .nest("/generations", generation::router(config.max_upload_bytes))
}
