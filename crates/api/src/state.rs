use std::sync::Arc;

use report_upstream::GenerationService;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: report_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Upstream generation service client. Tests swap in a fake.
    pub generation: Arc<dyn GenerationService>,
}
