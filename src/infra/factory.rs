use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::{error, info, warn};
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::state::AppState;
use crate::error::AppError;
use crate::domain::models::user::{User, ROLE_ADMIN};
use crate::infra::clock::SystemClock;
use crate::infra::repositories::{
    postgres_booking_repo::PostgresBookingRepo, postgres_slot_repo::PostgresSlotRepo,
    postgres_user_repo::PostgresUserRepo, postgres_dependent_repo::PostgresDependentRepo,
    sqlite_booking_repo::SqliteBookingRepo, sqlite_slot_repo::SqliteSlotRepo,
    sqlite_user_repo::SqliteUserRepo, sqlite_dependent_repo::SqliteDependentRepo,
};

const POOL_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;

    let state = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(POOL_ACQUIRE_TIMEOUT)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;

        AppState::new(
            config.clone(),
            Arc::new(PostgresUserRepo::new(pool.clone())),
            Arc::new(PostgresDependentRepo::new(pool.clone())),
            Arc::new(PostgresSlotRepo::new(pool.clone())),
            Arc::new(PostgresBookingRepo::new(pool.clone())),
            Arc::new(SystemClock),
        )
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(POOL_ACQUIRE_TIMEOUT)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;

        AppState::new(
            config.clone(),
            Arc::new(SqliteUserRepo::new(pool.clone())),
            Arc::new(SqliteDependentRepo::new(pool.clone())),
            Arc::new(SqliteSlotRepo::new(pool.clone())),
            Arc::new(SqliteBookingRepo::new(pool.clone())),
            Arc::new(SystemClock),
        )
    };

    if let Err(e) = seed_admin(&state).await {
        error!("Failed to seed admin account: {}", e);
    }
    state
}

/// Creates the configured admin account once. An existing account with that email is left alone.
pub async fn seed_admin(state: &AppState) -> Result<(), AppError> {
    let (Some(email), Some(password)) = (&state.config.admin_email, &state.config.admin_password) else {
        return Ok(());
    };

    if let Some(existing) = state.user_repo.find_by_email(email).await? {
        if !existing.is_admin() {
            warn!("ADMIN_EMAIL {} belongs to a non-admin account; not promoting it", existing.email);
        }
        return Ok(());
    }

    let password_hash = state.auth_service.hash_password(password)?;
    let mut admin = User::new(email.clone(), "Administrator".to_string(), password_hash);
    admin.role = ROLE_ADMIN.to_string();
    state.user_repo.create(&admin).await?;

    info!("Seeded admin account {}", admin.email);
    Ok(())
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
