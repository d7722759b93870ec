use axum::{extract::rejection::JsonRejection, Extension, Json};
use serde::Deserialize;
use tutor_core::session::Snapshot;
use tutor_core::tutor::MoveReport;
use tutor_core::TutorError;

use crate::error::AppError;
use crate::SharedTutor;

#[derive(Deserialize)]
pub struct MoveBody {
    #[serde(rename = "move")]
    pub uci: String,
}

#[derive(Deserialize)]
pub struct SettingsBody {
    pub difficulty_index: Option<i64>,
    pub tutor_mode_index: Option<i64>,
}

/// POST /new_game
/// Reset to the initial position with default settings.
pub async fn new_game(Extension(tutor): Extension<SharedTutor>) -> Json<Snapshot> {
    Json(tutor.lock().await.new_game().await)
}

/// GET /game_state
pub async fn game_state(
    Extension(tutor): Extension<SharedTutor>,
) -> Result<Json<Snapshot>, AppError> {
    Ok(Json(tutor.lock().await.snapshot()?))
}

/// POST /make_move
/// Body `{"move": "e2e4"}`; `"e2e4_confirmed"` confirms a pending move.
pub async fn make_move(
    Extension(tutor): Extension<SharedTutor>,
    payload: Result<Json<MoveBody>, JsonRejection>,
) -> Result<Json<MoveReport>, AppError> {
    let Json(body) = payload?;
    let report = tutor.lock().await.submit(&body.uci).await?;
    Ok(Json(report))
}

/// POST /confirm_move
pub async fn confirm_move(
    Extension(tutor): Extension<SharedTutor>,
    payload: Result<Json<MoveBody>, JsonRejection>,
) -> Result<Json<MoveReport>, AppError> {
    let Json(body) = payload?;
    let report = tutor.lock().await.confirm(&body.uci).await?;
    Ok(Json(report))
}

/// POST /cancel_move
pub async fn cancel_move(
    Extension(tutor): Extension<SharedTutor>,
) -> Result<Json<Snapshot>, AppError> {
    Ok(Json(tutor.lock().await.cancel()?))
}

/// POST /change_settings
/// Body `{"difficulty_index": 2, "tutor_mode_index": 1}`, both optional.
pub async fn change_settings(
    Extension(tutor): Extension<SharedTutor>,
    payload: Result<Json<SettingsBody>, JsonRejection>,
) -> Result<Json<Snapshot>, AppError> {
    let Json(body) = payload?;
    let difficulty = index("difficulty index", body.difficulty_index)?;
    let mode = index("tutor mode index", body.tutor_mode_index)?;

    let snapshot = tutor
        .lock()
        .await
        .change_settings(difficulty, mode)
        .await?;
    Ok(Json(snapshot))
}

/// Negative indices are as invalid as too large ones.
fn index(name: &str, value: Option<i64>) -> Result<Option<usize>, TutorError> {
    value
        .map(|v| usize::try_from(v).map_err(|_| TutorError::InvalidSetting(format!("{name} {v}"))))
        .transpose()
}
