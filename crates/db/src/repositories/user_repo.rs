//! Repository for the `users` table.

use report_core::types::DbId;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::user::{CreateUser, UpdateUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";

/// Columns a partial update may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserColumn {
    Name,
    Email,
    PasswordHash,
}

impl UserColumn {
    fn as_sql(self) -> &'static str {
        match self {
            UserColumn::Name => "name",
            UserColumn::Email => "email",
            UserColumn::PasswordHash => "password_hash",
        }
    }
}

/// The `(column, value)` pairs a partial update will assign, in column order.
pub fn assignments(input: &UpdateUser) -> Vec<(UserColumn, String)> {
    [
        (UserColumn::Name, &input.name),
        (UserColumn::Email, &input.email),
        (UserColumn::PasswordHash, &input.password_hash),
    ]
    .into_iter()
    .filter_map(|(column, value)| value.clone().map(|v| (column, v)))
    .collect()
}

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (name, email, password_hash)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.password_hash)
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email (case-sensitive).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Update a user. Only non-`None` fields in `input` are applied, each
    /// through a bound parameter.
    ///
    /// Returns `None` if no row with the given `id` exists. An empty update
    /// returns the current row unchanged.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateUser,
    ) -> Result<Option<User>, sqlx::Error> {
        let pairs = assignments(input);
        if pairs.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET ");
        let mut set = builder.separated(", ");
        for (column, value) in pairs {
            set.push(column.as_sql());
            set.push_unseparated(" = ");
            set.push_bind_unseparated(value);
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(format!(" RETURNING {COLUMNS}"));

        builder
            .build_query_as::<User>()
            .fetch_optional(pool)
            .await
    }
}
