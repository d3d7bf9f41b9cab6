//! Category lookup entity and DTOs.

use report_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `categories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Category {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
}

/// DTO for creating or renaming a category.
#[derive(Debug, Deserialize)]
pub struct CategoryInput {
    pub name: String,
}
