//! One-shot bootstrap: migrations, root MOHA office, initial admin.
//!
//! Guarded by a persisted flag in system_settings; a second run refuses
//! instead of reseeding.

use anyhow::bail;
use sqlx::PgPool;
use tracing::info;

use fpms_core::domain::{AuditAction, AuditLogEntry, Office, Role, User};
use fpms_core::repositories::{
    AuditLogRepository, OfficeRepository, SystemSettingsRepository, UserRepository,
};
use fpms_infrastructure::{
    PgAuditLogRepository, PgOfficeRepository, PgSystemSettingsRepository, PgUserRepository,
};
use fpms_security::password::PasswordService;
use fpms_shared::constants::BOOTSTRAP_FLAG_KEY;
use fpms_shared::ClientInfo;

const ROOT_OFFICE_CODE: &str = "MOHA";
const ADMIN_USERNAME: &str = "moha_admin";

#[derive(Debug)]
pub struct SeededAdmin {
    pub username: String,
    pub password: String,
}

pub async fn run(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;

    let settings = PgSystemSettingsRepository::new(pool.clone());
    let offices = PgOfficeRepository::new(pool.clone());
    let users = PgUserRepository::new(pool.clone());
    let audit = PgAuditLogRepository::new(pool.clone());

    let admin = seed(&settings, &offices, &users, &audit).await?;

    // One-time display to the operator; the plaintext exists nowhere else.
    println!("Initial administrator account:");
    println!("  username: {}", admin.username);
    println!("  password: {}", admin.password);
    println!("Change this password after first login.");

    Ok(())
}

/// Seeds the root office and the initial admin. Refuses when the
/// persisted flag says a previous run already completed.
async fn seed(
    settings: &dyn SystemSettingsRepository,
    offices: &dyn OfficeRepository,
    users: &dyn UserRepository,
    audit: &dyn AuditLogRepository,
) -> anyhow::Result<SeededAdmin> {
    if settings.get(BOOTSTRAP_FLAG_KEY).await?.as_deref() == Some("true") {
        bail!("System already initialized; refusing to bootstrap again");
    }

    let office = offices
        .create(&Office::new(
            ROOT_OFFICE_CODE.to_string(),
            "Ministry of Home Affairs".to_string(),
            Role::Moha,
            None,
        ))
        .await?;
    info!("Root office created: {}", office.code);

    let initial_password = PasswordService::generate();
    let password_hash = PasswordService::hash(&initial_password)?;

    let admin = User::new(
        ADMIN_USERNAME.to_string(),
        "admin@moha.gov.lk".to_string(),
        None,
        password_hash,
        Role::Moha,
        office.code.clone(),
        None,
    )?;
    let created = users.create(&admin).await?;

    audit
        .append(
            &AuditLogEntry::new(
                Some(created.id),
                AuditAction::BootstrapCompleted,
                &ClientInfo::default(),
            )
            .on_record("users", created.id),
        )
        .await?;

    settings.set(BOOTSTRAP_FLAG_KEY, "true").await?;

    info!("Bootstrap completed");

    Ok(SeededAdmin {
        username: created.username,
        password: initial_password,
    })
}
