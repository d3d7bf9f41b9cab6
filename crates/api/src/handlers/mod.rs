//! Request handlers.
//!
//! Each submodule provides the async handler functions for one resource.
//! Handlers delegate to the repositories in `report_db` (or the relay
//! pipeline for generations) and map errors via [`AppError`](crate::error::AppError).

pub mod auth;
pub mod categories;
pub mod generation;
pub mod reports;
