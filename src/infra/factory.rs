use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::state::{AppState, Repositories};
use crate::infra::events::outbox_publisher::OutboxPublisher;
use crate::infra::identity::jwt_identity::JwtIdentityProvider;
use crate::infra::push::http_push_service::HttpPushService;
use crate::infra::repositories::{
    postgres_device_repo::PostgresDeviceRepo, postgres_invite_repo::PostgresInviteRepo,
    postgres_notification_repo::PostgresNotificationRepo, postgres_outbox_repo::PostgresOutboxRepo,
    postgres_post_repo::PostgresPostRepo,
    sqlite_device_repo::SqliteDeviceRepo, sqlite_invite_repo::SqliteInviteRepo,
    sqlite_notification_repo::SqliteNotificationRepo, sqlite_outbox_repo::SqliteOutboxRepo,
    sqlite_post_repo::SqlitePostRepo,
};

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;

    let push_service = Arc::new(
        HttpPushService::new(
            config.push_service_url.clone(),
            config.push_service_token.clone(),
            config.push_timeout,
        )
        .expect("Failed to build push client"),
    );
    let identity = Arc::new(
        JwtIdentityProvider::new(&config.identity_public_key, &config.identity_audience)
            .expect("Failed to load identity public key"),
    );

    let repos = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;

        Repositories {
            post_repo: Arc::new(PostgresPostRepo::new(pool.clone())),
            invite_repo: Arc::new(PostgresInviteRepo::new(pool.clone())),
            notification_repo: Arc::new(PostgresNotificationRepo::new(pool.clone())),
            device_repo: Arc::new(PostgresDeviceRepo::new(pool.clone())),
            outbox_repo: Arc::new(PostgresOutboxRepo::new(pool)),
        }
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;

        Repositories {
            post_repo: Arc::new(SqlitePostRepo::new(pool.clone())),
            invite_repo: Arc::new(SqliteInviteRepo::new(pool.clone())),
            notification_repo: Arc::new(SqliteNotificationRepo::new(pool.clone())),
            device_repo: Arc::new(SqliteDeviceRepo::new(pool.clone())),
            outbox_repo: Arc::new(SqliteOutboxRepo::new(pool)),
        }
    };

    let publisher = OutboxPublisher::new(repos.outbox_repo.clone());
    let event_signal = publisher.signal();

    AppState::new(config.clone(), repos, push_service, identity, Arc::new(publisher), event_signal)
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
