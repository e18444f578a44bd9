use crate::domain::models::delivery::{DeliveryOutcome, DeliveryReport, DeliveryResult};
use crate::domain::ports::PushService;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::error;

/// Gateway error codes that mean the token will never work again.
const PERMANENT_ERRORS: &[&str] = &["DeviceNotRegistered", "InvalidEndpoint", "InvalidRegistration", "NotRegistered"];

pub struct HttpPushService {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpPushService {
    pub fn new(api_url: String, api_key: String, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalWithMsg(format!("Push client build error: {}", e)))?;

        Ok(Self { client, api_url, api_key })
    }
}

#[derive(Serialize)]
struct PushPayload<'a> {
    tokens: &'a [String],
    title: &'a str,
    body: &'a str,
    data: &'a Value,
}

#[derive(Deserialize)]
struct GatewayResult {
    token: String,
    status: String,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct GatewayResponse {
    #[serde(default)]
    results: Vec<GatewayResult>,
}

fn classify(result: GatewayResult) -> DeliveryResult {
    let outcome = if result.status.eq_ignore_ascii_case("ok") {
        DeliveryOutcome::Delivered
    } else {
        match result.error {
            Some(code) if PERMANENT_ERRORS.contains(&code.as_str()) => DeliveryOutcome::InvalidEndpoint,
            Some(code) => DeliveryOutcome::Failed(code),
            None => DeliveryOutcome::Failed(result.status),
        }
    };

    DeliveryResult { handle: result.token, outcome }
}

#[async_trait]
impl PushService for HttpPushService {
    async fn send(&self, handles: &[String], title: &str, body: &str, payload: &Value) -> Result<DeliveryReport, AppError> {
        let request = PushPayload {
            tokens: handles,
            title,
            body,
            data: payload,
        };

        let res = self.client.post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let msg = if e.is_timeout() {
                    format!("Push gateway timed out: {}", e)
                } else {
                    format!("Push gateway connection error: {}", e)
                };
                error!("{}", msg);
                AppError::TransientDelivery(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Push gateway failed. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::TransientDelivery(msg));
        }

        let parsed: GatewayResponse = res.json().await
            .map_err(|e| AppError::TransientDelivery(format!("Unreadable push gateway response: {}", e)))?;

        Ok(DeliveryReport {
            results: parsed.results.into_iter().map(classify).collect(),
        })
    }
}
