// ============================================================================
// FPMS Infrastructure - PostgreSQL Office Repository
// File: crates/fpms-infrastructure/src/database/postgres/office_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::error;

use fpms_core::domain::{Office, Role};
use fpms_core::error::DomainError;
use fpms_core::repositories::OfficeRepository;

pub struct PgOfficeRepository {
    pool: PgPool,
}

impl PgOfficeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct OfficeRow {
    pub code: String,
    pub name: String,
    pub office_type: String,
    pub parent_code: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<OfficeRow> for Office {
    fn from(row: OfficeRow) -> Self {
        Office {
            code: row.code,
            name: row.name,
            office_type: Role::from_str(&row.office_type).unwrap_or(Role::Gn),
            parent_code: row.parent_code,
            is_active: row.is_active,
            created_at: row.created_at,
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
impl OfficeRepository for PgOfficeRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<Office>, DomainError> {
        let row: Option<OfficeRow> = sqlx::query_as(
            r#"
            SELECT code, name, office_type, parent_code, is_active, created_at
            FROM offices
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("finding office by code"))?;

        Ok(row.map(|r| r.into()))
    }

    async fn create(&self, office: &Office) -> Result<Office, DomainError> {
        let row: OfficeRow = sqlx::query_as(
            r#"
            INSERT INTO offices (code, name, office_type, parent_code, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING code, name, office_type, parent_code, is_active, created_at
            "#,
        )
        .bind(&office.code)
        .bind(&office.name)
        .bind(office.office_type.as_str())
        .bind(&office.parent_code)
        .bind(office.is_active)
        .bind(office.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("creating office"))?;

        Ok(row.into())
    }

    async fn list_descendants(&self, code: &str) -> Result<Vec<Office>, DomainError> {
        let rows: Vec<OfficeRow> = sqlx::query_as(
            r#"
            WITH RECURSIVE subtree AS (
                SELECT code, name, office_type, parent_code, is_active, created_at
                FROM offices
                WHERE parent_code = $1
                UNION ALL
                SELECT o.code, o.name, o.office_type, o.parent_code, o.is_active, o.created_at
                FROM offices o
                JOIN subtree s ON o.parent_code = s.code
            )
            SELECT code, name, office_type, parent_code, is_active, created_at
            FROM subtree
            ORDER BY code
            "#,
        )
        .bind(code)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("listing descendant offices"))?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}
