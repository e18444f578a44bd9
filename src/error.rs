use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Push delivery failed: {0}")]
    TransientDelivery(String),
    #[error("Push endpoints permanently invalid: {0:?}")]
    PermanentDelivery(Vec<String>),
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(e) => {
                if let Some(db_err) = e.as_database_error() {
                    let code = db_err.code().unwrap_or_default();

                    // 2067 = SQLite Unique Constraint
                    // 23505 = PostgreSQL Unique Violation
                    if code == "2067" || code == "23505" {
                        return (
                            StatusCode::CONFLICT,
                            Json(json!({ "error": "Resource already exists (duplicate entry)" }))
                        ).into_response();
                    }
                }

                error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::TransientDelivery(msg) => {
                error!("Push delivery error: {}", msg);
                (StatusCode::BAD_GATEWAY, "Push delivery failed".to_string())
            }
            AppError::PermanentDelivery(handles) => {
                error!("Invalid push endpoints: {:?}", handles);
                (StatusCode::BAD_GATEWAY, "Push delivery failed".to_string())
            }
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(status_of(AppError::NotFound("post".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AppError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AppError::Forbidden("owner only".into())), StatusCode::FORBIDDEN);
        assert_eq!(status_of(AppError::Conflict("accepted".into())), StatusCode::CONFLICT);
        assert_eq!(status_of(AppError::Validation("text".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(AppError::TransientDelivery("timeout".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(status_of(AppError::PermanentDelivery(vec!["tok".into()])), StatusCode::BAD_GATEWAY);
        assert_eq!(status_of(AppError::InternalWithMsg("bad key".into())), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status_of(AppError::Database(sqlx::Error::RowNotFound)), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
