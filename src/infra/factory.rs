use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::{info, warn};
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::domain::ports::{MeetingProvider, Notifier};
use crate::error::AppError;
use crate::state::{Adapters, AppState};
use crate::infra::meeting::http_meeting_provider::HttpMeetingProvider;
use crate::infra::notify::http_notifier::HttpNotifier;
use crate::infra::repositories::{
    postgres_booking_repo::PostgresBookingRepo, postgres_reference_repo::PostgresReferenceRepo,
    postgres_slot_repo::PostgresSlotRepo,
    sqlite_booking_repo::SqliteBookingRepo, sqlite_reference_repo::SqliteReferenceRepo,
    sqlite_slot_repo::SqliteSlotRepo,
};

pub fn is_postgres_url(database_url: &str) -> bool {
    database_url.starts_with("postgres://") || database_url.starts_with("postgresql://")
}

pub async fn bootstrap_state(config: &Config) -> Result<AppState, AppError> {
    let notifier: Arc<dyn Notifier> = Arc::new(HttpNotifier::new(
        config.mail_service_url.clone(),
        config.mail_service_token.clone(),
    )?);

    let meeting_provider: Option<Arc<dyn MeetingProvider>> = match &config.meeting_service_url {
        Some(url) => Some(Arc::new(HttpMeetingProvider::new(url.clone(), config.meeting_service_token.clone())?)),
        None => {
            warn!("MEETING_SERVICE_URL not set, auto-approval will use generated fallback links");
            None
        }
    };

    let adapters = if is_postgres_url(&config.database_url) {
        info!("Initializing PostgreSQL connection...");
        let pool = connect_postgres(&config.database_url).await?;
        run_postgres_migrations(&pool).await?;

        let reference = Arc::new(PostgresReferenceRepo::new(pool.clone()));
        Adapters {
            slot_repo: Arc::new(PostgresSlotRepo::new(pool.clone())),
            booking_repo: Arc::new(PostgresBookingRepo::new(pool.clone())),
            time_slot_repo: reference.clone(),
            contacts: reference,
            notifier,
            meeting_provider,
        }
    } else {
        info!("Initializing SQLite connection with WAL Mode...");
        let pool = connect_sqlite(&config.database_url).await?;
        run_sqlite_migrations(&pool).await?;

        let reference = Arc::new(SqliteReferenceRepo::new(pool.clone()));
        Adapters {
            slot_repo: Arc::new(SqliteSlotRepo::new(pool.clone())),
            booking_repo: Arc::new(SqliteBookingRepo::new(pool.clone())),
            time_slot_repo: reference.clone(),
            contacts: reference,
            notifier,
            meeting_provider,
        }
    };

    Ok(AppState::new(config.clone(), adapters))
}

pub async fn connect_postgres(database_url: &str) -> Result<PgPool, AppError> {
    let opts: PgConnectOptions = database_url.parse().map_err(AppError::Database)?;
    let opts = opts.log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    PgPoolOptions::new()
        .max_connections(10)
        .connect_with(opts)
        .await
        .map_err(AppError::Database)
}

/// WAL plus a busy timeout lets concurrent reservations queue on the write
/// lock instead of failing with `SQLITE_BUSY`.
pub async fn connect_sqlite(database_url: &str) -> Result<SqlitePool, AppError> {
    let opts = SqliteConnectOptions::from_str(database_url)
        .map_err(AppError::Database)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await
        .map_err(AppError::Database)
}

pub async fn run_postgres_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .map_err(|e| AppError::InternalWithMsg(format!("Postgres migrations failed: {}", e)))
}

pub async fn run_sqlite_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .map_err(|e| AppError::InternalWithMsg(format!("SQLite migrations failed: {}", e)))
}
