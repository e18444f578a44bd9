use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::RegisterDeviceRequest;
use crate::domain::models::device::Device;
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn register_device(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Json(payload): Json<RegisterDeviceRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.device_id.trim().is_empty() || payload.push_token.trim().is_empty() {
        return Err(AppError::Validation("device_id and push_token are required".into()));
    }

    let device = Device::new(caller.user_id, payload.device_id, payload.push_token);
    let registered = state.device_repo.register(&device).await?;

    info!(device_id = %registered.device_id, "Registered push device");

    Ok((StatusCode::CREATED, Json(registered)))
}
