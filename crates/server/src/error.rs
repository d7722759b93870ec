use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tutor_core::TutorError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),
}

impl From<TutorError> for AppError {
    fn from(e: TutorError) -> Self {
        let message = e.to_string();
        match e {
            TutorError::NoSession => AppError::NotFound(message),
            TutorError::GameOver => AppError::Conflict(message),
            TutorError::MalformedMove(_)
            | TutorError::IllegalMove(_)
            | TutorError::InvalidConfirmation(_)
            | TutorError::InvalidSetting(_) => AppError::BadRequest(message),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
