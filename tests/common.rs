#![allow(dead_code)]

use fanpost_backend::{
    api::router::create_router,
    state::{AppState, Repositories},
    config::Config,
    domain::{
        events::DomainEvent,
        models::{
            delivery::{DeliveryOutcome, DeliveryReport, DeliveryResult},
            device::Device,
            identity::{CallerIdentity, UserRole},
            post::{Post, PostKind},
        },
        ports::{IdentityProvider, PushService},
        services::dispatcher::DispatchSummary,
    },
    infra::{
        events::outbox_publisher::OutboxPublisher,
        repositories::{
            sqlite_device_repo::SqliteDeviceRepo,
            sqlite_invite_repo::SqliteInviteRepo,
            sqlite_notification_repo::SqliteNotificationRepo,
            sqlite_outbox_repo::SqliteOutboxRepo,
            sqlite_post_repo::SqlitePostRepo,
        },
    },
    background::process_outbox_batch,
    error::AppError,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions}, Pool, Sqlite};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    Router,
};
use std::str::FromStr;
use async_trait::async_trait;
use chrono::Utc;
use tower::ServiceExt;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct SentPush {
    pub handles: Vec<String>,
    pub title: String,
    pub body: String,
    pub payload: Value,
}

/// Records every push. Handles can be marked invalid (permanent) or
/// unreachable (the whole call fails as a transient error).
#[derive(Default)]
pub struct MockPushService {
    sent: Mutex<Vec<SentPush>>,
    invalid: Mutex<HashSet<String>>,
    unreachable: Mutex<HashSet<String>>,
}

impl MockPushService {
    pub fn mark_invalid(&self, handle: &str) {
        self.invalid.lock().unwrap().insert(handle.to_string());
    }

    pub fn mark_unreachable(&self, handle: &str) {
        self.unreachable.lock().unwrap().insert(handle.to_string());
    }

    pub fn sent(&self) -> Vec<SentPush> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, handle: &str) -> Vec<SentPush> {
        self.sent().into_iter().filter(|p| p.handles.iter().any(|h| h == handle)).collect()
    }
}

#[async_trait]
impl PushService for MockPushService {
    async fn send(&self, handles: &[String], title: &str, body: &str, payload: &Value) -> Result<DeliveryReport, AppError> {
        let unreachable = self.unreachable.lock().unwrap().clone();
        if handles.iter().any(|h| unreachable.contains(h)) {
            return Err(AppError::TransientDelivery("gateway timed out".into()));
        }

        self.sent.lock().unwrap().push(SentPush {
            handles: handles.to_vec(),
            title: title.to_string(),
            body: body.to_string(),
            payload: payload.clone(),
        });

        let invalid = self.invalid.lock().unwrap().clone();
        let results = handles.iter().map(|h| DeliveryResult {
            handle: h.clone(),
            outcome: if invalid.contains(h) { DeliveryOutcome::InvalidEndpoint } else { DeliveryOutcome::Delivered },
        }).collect();

        Ok(DeliveryReport { results })
    }
}

/// Accepts tokens of the form `user_id:ROLE`.
pub struct MockIdentity;

#[async_trait]
impl IdentityProvider for MockIdentity {
    async fn resolve_caller(&self, token: &str) -> Result<CallerIdentity, AppError> {
        let (user_id, role) = token.split_once(':').ok_or(AppError::Unauthorized)?;
        let role = match role {
            "ARTIST" => UserRole::Artist,
            "FAN" => UserRole::Fan,
            _ => return Err(AppError::Unauthorized),
        };
        Ok(CallerIdentity { user_id: user_id.to_string(), role })
    }
}

pub fn artist_token(user_id: &str) -> String {
    format!("{}:ARTIST", user_id)
}

pub fn fan_token(user_id: &str) -> String {
    format!("{}:FAN", user_id)
}

pub fn artist(user_id: &str) -> CallerIdentity {
    CallerIdentity { user_id: user_id.to_string(), role: UserRole::Artist }
}

pub fn fan(user_id: &str) -> CallerIdentity {
    CallerIdentity { user_id: user_id.to_string(), role: UserRole::Fan }
}

pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub push: Arc<MockPushService>,
    owns_db: bool,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        Self::with_database(db_filename, true).await
    }

    /// A second app over the same database file, as after a restart.
    /// The file stays until the app that created it is dropped.
    pub async fn reopen(&self) -> Self {
        Self::with_database(self.db_filename.clone(), false).await
    }

    async fn with_database(db_filename: String, owns_db: bool) -> Self {
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            push_service_url: "http://localhost".to_string(),
            push_service_token: "token".to_string(),
            push_timeout: Duration::from_secs(1),
            identity_public_key: include_str!("../tests/keys/test_public.pem").to_string(),
            identity_audience: "fanpost-test".to_string(),
            bundle_window_minutes: 15,
            bundle_threshold: 3,
            purge_interval: Duration::from_secs(3600),
        };

        let repos = Repositories {
            post_repo: Arc::new(SqlitePostRepo::new(pool.clone())),
            invite_repo: Arc::new(SqliteInviteRepo::new(pool.clone())),
            notification_repo: Arc::new(SqliteNotificationRepo::new(pool.clone())),
            device_repo: Arc::new(SqliteDeviceRepo::new(pool.clone())),
            outbox_repo: Arc::new(SqliteOutboxRepo::new(pool.clone())),
        };

        let push = Arc::new(MockPushService::default());
        let publisher = OutboxPublisher::new(repos.outbox_repo.clone());
        let event_signal = publisher.signal();

        let state = Arc::new(AppState::new(
            config,
            repos,
            push.clone(),
            Arc::new(MockIdentity),
            Arc::new(publisher),
            event_signal,
        ));

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            push,
            owns_db,
        }
    }

    /// Runs the notification worker over the outbox until nothing is pending.
    pub async fn process_events(&self) -> Vec<DispatchSummary> {
        let mut summaries = Vec::new();
        loop {
            let batch = process_outbox_batch(&self.state).await.expect("outbox batch failed");
            if batch.is_empty() {
                break;
            }
            summaries.extend(batch);
        }
        summaries
    }

    /// Marks pending events done without dispatching them.
    pub async fn discard_events(&self) -> Vec<DomainEvent> {
        let mut drained = Vec::new();
        loop {
            let entries = self.state.outbox_repo.claim_pending(100, Utc::now()).await.unwrap();
            if entries.is_empty() {
                break;
            }
            for entry in entries {
                self.state.outbox_repo.complete(&entry.id).await.unwrap();
                drained.push(entry.event().clone());
            }
        }
        drained
    }

    pub async fn create_post(&self, owner_id: &str, kind: PostKind) -> Post {
        let post = Post::new(owner_id.to_string(), kind, Some("caption".to_string()));
        self.state.post_repo.create(&post).await.unwrap()
    }

    pub async fn register_device(&self, user_id: &str, device_id: &str, push_token: &str) -> Device {
        let device = Device::new(user_id.to_string(), device_id.to_string(), push_token.to_string());
        self.state.device_repo.register(&device).await.unwrap()
    }

    /// Fan follows the artist through one of the artist's generic posts.
    pub async fn follow(&self, fan_id: &str, generic_post_id: &str) {
        self.state.invites.follow(fan_id, generic_post_id).await.unwrap();
    }

    /// Artist invites the fan and the fan accepts.
    pub async fn invite_and_accept(&self, artist_id: &str, fan_id: &str, post_id: &str) {
        let invite = self.state.invites
            .create_invite(&artist(artist_id), post_id, fan_id, None)
            .await
            .unwrap();
        self.state.invites
            .transition(fan_id, &invite.id, fanpost_backend::domain::models::invite::InviteStatus::Accepted)
            .await
            .unwrap();
    }

    pub async fn request(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
        (status, json)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if !self.owns_db {
            return;
        }
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
