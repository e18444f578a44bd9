use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::UpdateInviteRequest;
use crate::error::AppError;
use std::sync::Arc;

pub async fn update_invite(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(invite_id): Path<String>,
    Json(payload): Json<UpdateInviteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let updated = state.invites.transition(&caller.user_id, &invite_id, payload.status).await?;
    Ok(Json(updated))
}

pub async fn delete_invite(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(invite_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.invites.delete(&caller.user_id, &invite_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
