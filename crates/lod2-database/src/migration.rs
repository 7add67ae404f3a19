//! Database migration runner.

use sqlx::SqlitePool;
use tracing::info;

use lod2_core::error::{AppError, ErrorKind};

/// Apply every pending migration under `migrations/`.
///
/// Applied versions are recorded in `_sqlx_migrations`; running this again
/// is a no-op. A failure here must abort startup.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    info!("Running database migrations...");

    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Failed to run migrations: {e}"),
                e,
            )
        })?;

    info!("Database migrations completed successfully");
    Ok(())
}
