// ============================================================================
// FPMS Infrastructure - PostgreSQL System Settings Repository
// File: crates/fpms-infrastructure/src/database/postgres/settings_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::error;

use fpms_core::error::DomainError;
use fpms_core::repositories::SystemSettingsRepository;

pub struct PgSystemSettingsRepository {
    pool: PgPool,
}

impl PgSystemSettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SystemSettingsRepository for PgSystemSettingsRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM system_settings WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    error!("Database error reading setting: {}", e);
                    DomainError::DatabaseError(e.to_string())
                })?;

        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO system_settings (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error writing setting: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }
}
