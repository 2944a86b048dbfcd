//! Journals, issues, submissions and review assignments.

mod issues;
mod journals;
mod reviews;
mod submissions;

use sqlx::PgPool;

use scholaris_core::AppError;

/// PostgreSQL-backed repository for the editorial tables.
#[derive(Clone)]
pub struct PostgresEditorialRepository {
    pool: PgPool,
}

impl PostgresEditorialRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn count_to_u64(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}

fn dependent_rows_or_internal(error: sqlx::Error, operation: &str, dependents: &str) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error
        && database_error.code().as_deref() == Some("23503")
    {
        return AppError::Conflict(format!("cannot {operation} while it still has {dependents}"));
    }

    AppError::Internal(format!("failed to {operation}: {error}"))
}
