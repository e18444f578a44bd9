use axum::{
    extract::{FromRequestParts, FromRef},
    http::{header, request::Parts, StatusCode},
};
use crate::state::AppState;
use crate::domain::models::identity::CallerIdentity;
use std::sync::Arc;
use tower_cookies::Cookies;
use tracing::Span;

/// The resolved caller. Token validation is delegated to the identity provider.
pub struct AuthUser(pub CallerIdentity);

fn bearer_token(parts: &Parts) -> Option<String> {
    parts.headers.get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}

fn cookie_token(parts: &Parts) -> Option<String> {
    let cookies = parts.extensions.get::<Cookies>()?;
    cookies.get("access_token").map(|cookie| cookie.value().to_string())
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let access_token = bearer_token(parts)
            .or_else(|| cookie_token(parts))
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);

        let caller = app_state.identity.resolve_caller(&access_token).await
            .map_err(|_| StatusCode::UNAUTHORIZED)?;

        Span::current().record("user_id", caller.user_id.as_str());

        Ok(AuthUser(caller))
    }
}
