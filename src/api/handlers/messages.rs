use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::SendMessageRequest;
use crate::error::AppError;
use std::sync::Arc;

pub async fn send_message(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(conversation_id): Path<String>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.interactions
        .send_message(&caller.user_id, &payload.recipient_id, &conversation_id, &payload.text)
        .await?;
    Ok(StatusCode::ACCEPTED)
}
