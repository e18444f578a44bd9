use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::{CreateInviteRequest, CreateCommentRequest};
use crate::api::dtos::responses::{AccessResponse, FansResponse, ReactionResponse, CommentResponse};
use crate::error::AppError;
use std::sync::Arc;

pub async fn create_invite(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(post_id): Path<String>,
    Json(payload): Json<CreateInviteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let invite = state.invites
        .create_invite(&caller, &post_id, &payload.user_id, payload.valid_until)
        .await?;
    Ok((StatusCode::CREATED, Json(invite)))
}

pub async fn follow(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let relationship = state.invites.follow(&caller.user_id, &post_id).await?;
    Ok((StatusCode::CREATED, Json(relationship)))
}

pub async fn get_access(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let can_access = state.access.can_access(&caller.user_id, &post_id).await?;
    Ok(Json(AccessResponse { post_id, can_access }))
}

pub async fn list_fans(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let owner_id = state.fans.get_post_owner_id(&post_id).await?;
    if owner_id != caller.user_id {
        return Err(AppError::Forbidden("Only the post owner can list fans".into()));
    }

    let mut fans: Vec<String> = state.fans.fans_with_access(&post_id, None).await?.into_iter().collect();
    fans.sort();

    Ok(Json(FansResponse { post_id, fans }))
}

pub async fn react(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let created = state.interactions.react(&caller.user_id, &post_id).await?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(ReactionResponse { post_id, created })))
}

pub async fn comment(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(post_id): Path<String>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let comment_id = state.interactions.comment(&caller.user_id, &post_id, &payload.text).await?;
    Ok((StatusCode::CREATED, Json(CommentResponse { post_id, comment_id })))
}
