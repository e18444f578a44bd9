use std::env;
use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub push_service_url: String,
    pub push_service_token: String,
    pub push_timeout: Duration,
    pub identity_public_key: String, // Ed25519 public key (PEM)
    pub identity_audience: String,
    pub bundle_window_minutes: i64,
    pub bundle_threshold: i64,
    pub purge_interval: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            push_service_url: env::var("PUSH_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8100/api/v1/push".to_string()),
            push_service_token: env::var("PUSH_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            push_timeout: Duration::from_secs(
                env::var("PUSH_TIMEOUT_SECS").unwrap_or_else(|_| "10".to_string()).parse().expect("PUSH_TIMEOUT_SECS must be a number"),
            ),
            identity_public_key: env::var("IDENTITY_PUBLIC_KEY").expect("IDENTITY_PUBLIC_KEY must be set (Ed25519 Public Key)"),
            identity_audience: env::var("IDENTITY_AUDIENCE").unwrap_or_else(|_| "fanpost-app".to_string()),
            bundle_window_minutes: env::var("BUNDLE_WINDOW_MINUTES").unwrap_or_else(|_| "15".to_string()).parse().expect("BUNDLE_WINDOW_MINUTES must be a number"),
            bundle_threshold: env::var("BUNDLE_THRESHOLD").unwrap_or_else(|_| "3".to_string()).parse().expect("BUNDLE_THRESHOLD must be a number"),
            purge_interval: Duration::from_secs(
                3600 * env::var("PURGE_INTERVAL_HOURS").unwrap_or_else(|_| "24".to_string()).parse::<u64>().expect("PURGE_INTERVAL_HOURS must be a number"),
            ),
        }
    }
}
