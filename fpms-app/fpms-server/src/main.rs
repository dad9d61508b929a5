use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::{error, info};

use fpms_api::{router, AppState};
use fpms_core::repositories::{
    AuditLogRepository, OfficeRepository, SessionRepository, UserRepository,
};
use fpms_core::services::{AccessControlService, AuthService, CredentialService, UserService};
use fpms_infrastructure::database::connection;
use fpms_infrastructure::{
    PgAuditLogRepository, PgOfficeRepository, PgSessionRepository, PgUserRepository,
};
use fpms_security::PasswordPolicy;
use fpms_shared::config::AppConfig;

mod bootstrap;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Initialize telemetry
    fpms_shared::telemetry::init_telemetry();

    info!("FPMS server starting...");

    // Load configuration
    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Connect to Database
    info!("Connecting to database...");
    let pool = connection::create_pool(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    info!("Database connection established.");

    // One-shot bootstrap subcommand
    if std::env::args().nth(1).as_deref() == Some("bootstrap") {
        return bootstrap::run(&pool).await;
    }

    sqlx::migrate!("./migrations").run(&pool).await?;

    // Wire repositories
    let users: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(pool.clone()));
    let offices: Arc<dyn OfficeRepository> = Arc::new(PgOfficeRepository::new(pool.clone()));
    let audit: Arc<dyn AuditLogRepository> = Arc::new(PgAuditLogRepository::new(pool.clone()));
    let sessions: Arc<dyn SessionRepository> = Arc::new(PgSessionRepository::new(pool.clone()));

    // Wire services
    let access = Arc::new(AccessControlService::new(offices.clone()));
    let auth = Arc::new(AuthService::new(
        users.clone(),
        sessions.clone(),
        audit.clone(),
        config.password.max_failed_logins,
        config.password.lockout_secs,
        config.session.idle_timeout_secs,
    ));
    let user_service = Arc::new(UserService::new(
        users.clone(),
        offices.clone(),
        audit.clone(),
        access.clone(),
    ));
    let credentials = Arc::new(CredentialService::new(
        users.clone(),
        access.clone(),
        PasswordPolicy { min_length: config.password.min_length },
        config.password.history_depth,
    ));

    let state = AppState {
        auth,
        users: user_service,
        credentials,
        config: config.clone(),
    };

    let app = router(state).layer(TraceLayer::new_for_http());

    // Bind address
    let host: std::net::IpAddr = config.app.host.parse()?;
    let addr = SocketAddr::from((host, config.app.port));
    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
