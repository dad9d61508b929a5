// ============================================================================
// FPMS Infrastructure - PostgreSQL Audit Log Repository
// File: crates/fpms-infrastructure/src/database/postgres/audit_repo_impl.rs
// ============================================================================
//! Append-only adapter: only INSERT and SELECT are ever issued against
//! audit_logs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use tracing::error;
use uuid::Uuid;

use fpms_core::domain::{AuditAction, AuditLogEntry};
use fpms_core::error::DomainError;
use fpms_core::repositories::AuditLogRepository;
use fpms_shared::Pagination;

pub struct PgAuditLogRepository {
    pool: PgPool,
}

impl PgAuditLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditRow {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub table_name: Option<String>,
    pub record_id: Option<String>,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AuditRow> for AuditLogEntry {
    type Error = DomainError;

    fn try_from(row: AuditRow) -> Result<Self, Self::Error> {
        let action = AuditAction::from_str(&row.action)
            .ok_or_else(|| DomainError::DatabaseError(format!("unknown audit action: {}", row.action)))?;
        Ok(AuditLogEntry {
            id: row.id,
            user_id: row.user_id,
            action,
            table_name: row.table_name,
            record_id: row.record_id,
            old_values: row.old_values,
            new_values: row.new_values,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            created_at: row.created_at,
        })
    }
}

fn db_err(context: &str) -> impl Fn(sqlx::Error) -> DomainError + '_ {
    move |e: sqlx::Error| {
        error!("Database error {}: {}", context, e);
        DomainError::DatabaseError(e.to_string())
    }
}

#[async_trait]
impl AuditLogRepository for PgAuditLogRepository {
    async fn append(&self, entry: &AuditLogEntry) -> Result<AuditLogEntry, DomainError> {
        let row: AuditRow = sqlx::query_as(
            r#"
            INSERT INTO audit_logs (
                id, user_id, action, table_name, record_id,
                old_values, new_values, ip_address, user_agent, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING
                id, user_id, action, table_name, record_id,
                old_values, new_values, ip_address, user_agent, created_at
            "#,
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(entry.action.as_str())
        .bind(&entry.table_name)
        .bind(&entry.record_id)
        .bind(&entry.old_values)
        .bind(&entry.new_values)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(entry.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("appending audit entry"))?;

        row.try_into()
    }

    async fn list_for_user(
        &self,
        user_id: &Uuid,
        page: Pagination,
    ) -> Result<Vec<AuditLogEntry>, DomainError> {
        let rows: Vec<AuditRow> = sqlx::query_as(
            r#"
            SELECT
                id, user_id, action, table_name, record_id,
                old_values, new_values, ip_address, user_agent, created_at
            FROM audit_logs
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("listing audit entries"))?;

        rows.into_iter().map(AuditLogEntry::try_from).collect()
    }
}
