// ============================================================================
// FPMS Infrastructure - PostgreSQL Session Repository
// File: crates/fpms-infrastructure/src/database/postgres/session_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::error;
use uuid::Uuid;

use fpms_core::domain::Session;
use fpms_core::error::DomainError;
use fpms_core::repositories::SessionRepository;

pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct SessionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub csrf_token: String,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session {
            id: row.id,
            user_id: row.user_id,
            csrf_token: row.csrf_token,
            created_at: row.created_at,
            last_seen_at: row.last_seen_at,
            revoked_at: row.revoked_at,
        }
    }
}

fn db_err(context: &str) -> impl Fn(sqlx::Error) -> DomainError + '_ {
    move |e: sqlx::Error| {
        error!("Database error {}: {}", context, e);
        DomainError::DatabaseError(e.to_string())
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session, DomainError> {
        let row: SessionRow = sqlx::query_as(
            r#"
            INSERT INTO sessions (id, user_id, csrf_token, created_at, last_seen_at, revoked_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, csrf_token, created_at, last_seen_at, revoked_at
            "#,
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(&session.csrf_token)
        .bind(session.created_at)
        .bind(session.last_seen_at)
        .bind(session.revoked_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("creating session"))?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Session>, DomainError> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, csrf_token, created_at, last_seen_at, revoked_at
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("finding session"))?;

        Ok(row.map(|r| r.into()))
    }

    async fn touch(&self, id: &Uuid, at: DateTime<Utc>) -> Result<(), DomainError> {
        sqlx::query("UPDATE sessions SET last_seen_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(db_err("touching session"))?;
        Ok(())
    }

    async fn revoke(&self, id: &Uuid, at: DateTime<Utc>) -> Result<(), DomainError> {
        sqlx::query("UPDATE sessions SET revoked_at = $2 WHERE id = $1 AND revoked_at IS NULL")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(db_err("revoking session"))?;
        Ok(())
    }

    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError> {
        let result = sqlx::query(
            "DELETE FROM sessions WHERE last_seen_at < $1 OR revoked_at IS NOT NULL",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(db_err("purging sessions"))?;

        Ok(result.rows_affected())
    }
}
