// ============================================================================
// FPMS Infrastructure - PostgreSQL User Repository
// File: crates/fpms-infrastructure/src/database/postgres/user_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{error, info};
use uuid::Uuid;

use fpms_core::domain::{AuditLogEntry, Role, User};
use fpms_core::error::DomainError;
use fpms_core::repositories::UserRepository;
use fpms_shared::Pagination;

const USER_COLUMNS: &str = r#"
    id, username, email, phone, password_hash, role, office_code,
    is_active, failed_login_attempts, locked_until, last_login_at,
    created_at, created_by, modified_at, modified_by, removed_at, removed_by
"#;

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal row type for SQLx mapping
#[derive(Debug, FromRow)]
struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: String,
    pub office_code: String,
    pub is_active: bool,
    pub failed_login_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<Uuid>,
    pub removed_at: Option<DateTime<Utc>>,
    pub removed_by: Option<Uuid>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            phone: row.phone,
            password_hash: row.password_hash,
            // An unrecognized role string degrades to the least privilege.
            role: Role::from_str(&row.role).unwrap_or(Role::Gn),
            office_code: row.office_code,
            is_active: row.is_active,
            failed_login_attempts: row.failed_login_attempts,
            locked_until: row.locked_until,
            last_login_at: row.last_login_at,
            created_at: row.created_at,
            created_by: row.created_by,
            modified_at: row.modified_at,
            modified_by: row.modified_by,
            removed_at: row.removed_at,
            removed_by: row.removed_by,
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
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND removed_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("finding user by id"))?;

        Ok(row.map(|r| r.into()))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(username) = LOWER($1) AND removed_at IS NULL"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("finding user by username"))?;

        Ok(row.map(|r| r.into()))
    }

    async fn create(&self, user: &User) -> Result<User, DomainError> {
        info!("Creating user: {}", user.username);

        let row: UserRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO users (
                id, username, email, phone, password_hash, role, office_code,
                is_active, failed_login_attempts, locked_until, last_login_at,
                created_at, created_by, modified_at, modified_by, removed_at, removed_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.office_code)
        .bind(user.is_active)
        .bind(user.failed_login_attempts)
        .bind(user.locked_until)
        .bind(user.last_login_at)
        .bind(user.created_at)
        .bind(user.created_by)
        .bind(user.modified_at)
        .bind(user.modified_by)
        .bind(user.removed_at)
        .bind(user.removed_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating user: {}", e);
            let msg = e.to_string();
            if msg.contains("unique") || msg.contains("duplicate") {
                DomainError::UsernameAlreadyExists(user.username.clone())
            } else {
                DomainError::DatabaseError(msg)
            }
        })?;

        info!("User created: {}", row.id);
        Ok(row.into())
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let row: UserRow = sqlx::query_as(&format!(
            r#"
            UPDATE users
            SET
                email = $2,
                phone = $3,
                is_active = $4,
                modified_at = $5,
                modified_by = $6
            WHERE id = $1 AND removed_at IS NULL
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(user.is_active)
        .bind(user.modified_at)
        .bind(user.modified_by)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("updating user"))?;

        Ok(row.into())
    }

    async fn deactivate(&self, id: &Uuid, removed_by: &Uuid) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE users
            SET removed_at = NOW(), removed_by = $2, is_active = false
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(removed_by)
        .execute(&self.pool)
        .await
        .map_err(db_err("deactivating user"))?;

        Ok(())
    }

    async fn list_by_offices(
        &self,
        office_codes: &[String],
        page: Pagination,
    ) -> Result<Vec<User>, DomainError> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE office_code = ANY($1) AND removed_at IS NULL
            ORDER BY office_code, username
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(office_codes)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("listing users by offices"))?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn search(
        &self,
        office_codes: &[String],
        query: &str,
        page: Pagination,
    ) -> Result<Vec<User>, DomainError> {
        let pattern = format!("%{}%", query);
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE office_code = ANY($1)
              AND removed_at IS NULL
              AND (username ILIKE $2 OR email ILIKE $2)
            ORDER BY username
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(office_codes)
        .bind(&pattern)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("searching users"))?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn count_by_role(
        &self,
        office_codes: &[String],
    ) -> Result<Vec<(Role, i64)>, DomainError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT role, COUNT(*) FROM users
            WHERE office_code = ANY($1) AND removed_at IS NULL
            GROUP BY role
            "#,
        )
        .bind(office_codes)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("counting users by role"))?;

        Ok(rows
            .into_iter()
            .filter_map(|(role, count)| Role::from_str(&role).map(|r| (r, count)))
            .collect())
    }

    async fn record_login_success(&self, id: &Uuid, at: DateTime<Utc>) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE users
            SET last_login_at = $2, failed_login_attempts = 0, locked_until = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(db_err("recording login success"))?;

        Ok(())
    }

    async fn record_login_failure(
        &self,
        id: &Uuid,
        failed_attempts: i32,
        locked_until: Option<DateTime<Utc>>,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE users
            SET failed_login_attempts = $2, locked_until = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(failed_attempts)
        .bind(locked_until)
        .execute(&self.pool)
        .await
        .map_err(db_err("recording login failure"))?;

        Ok(())
    }

    async fn update_password(
        &self,
        id: &Uuid,
        new_hash: &str,
        audit: &AuditLogEntry,
    ) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err("opening transaction"))?;

        // Archive the superseded hash before overwriting it.
        sqlx::query(
            r#"
            INSERT INTO password_history (id, user_id, password_hash, created_at)
            SELECT gen_random_uuid(), id, password_hash, NOW()
            FROM users WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_err("archiving password hash"))?;

        let updated = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, failed_login_attempts = 0, locked_until = NULL,
                modified_at = NOW()
            WHERE id = $1 AND removed_at IS NULL
            "#,
        )
        .bind(id)
        .bind(new_hash)
        .execute(&mut *tx)
        .await
        .map_err(db_err("updating password hash"))?;

        if updated.rows_affected() == 0 {
            // Roll back the history insert as well.
            tx.rollback().await.map_err(db_err("rolling back"))?;
            return Err(DomainError::UserNotFound);
        }

        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                id, user_id, action, table_name, record_id,
                old_values, new_values, ip_address, user_agent, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(audit.id)
        .bind(audit.user_id)
        .bind(audit.action.as_str())
        .bind(&audit.table_name)
        .bind(&audit.record_id)
        .bind(&audit.old_values)
        .bind(&audit.new_values)
        .bind(&audit.ip_address)
        .bind(&audit.user_agent)
        .bind(audit.created_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err("appending audit entry"))?;

        tx.commit().await.map_err(db_err("committing transaction"))?;
        Ok(())
    }

    async fn recent_password_hashes(
        &self,
        id: &Uuid,
        limit: u32,
    ) -> Result<Vec<String>, DomainError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT password_hash FROM (
                SELECT password_hash, NOW() AS created_at
                FROM users WHERE id = $1
                UNION ALL
                SELECT password_hash, created_at
                FROM password_history WHERE user_id = $1
            ) h
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("loading password history"))?;

        Ok(rows.into_iter().map(|(hash,)| hash).collect())
    }
}
