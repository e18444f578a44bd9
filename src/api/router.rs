use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{health, devices, notifications, posts, invites, messages};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tower_cookies::CookieManagerLayer;
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Caller
        .route("/api/v1/devices", post(devices::register_device))
        .route("/api/v1/notifications", get(notifications::list_notifications))

        // Posts
        .route("/api/v1/posts/{post_id}/invites", post(posts::create_invite))
        .route("/api/v1/posts/{post_id}/follow", post(posts::follow))
        .route("/api/v1/posts/{post_id}/access", get(posts::get_access))
        .route("/api/v1/posts/{post_id}/fans", get(posts::list_fans))
        .route("/api/v1/posts/{post_id}/reactions", post(posts::react))
        .route("/api/v1/posts/{post_id}/comments", post(posts::comment))

        // Invites
        .route("/api/v1/invites/{invite_id}", put(invites::update_invite).delete(invites::delete_invite))

        // Messaging
        .route("/api/v1/conversations/{conversation_id}/messages", post(messages::send_message))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(CookieManagerLayer::new())
        .with_state(state)
}