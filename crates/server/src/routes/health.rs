use axum::{Extension, Json};
use serde_json::Value as JsonValue;
use tutor_core::engine::EngineStatus;

/// GET /health
pub async fn health_check(Extension(status): Extension<EngineStatus>) -> Json<JsonValue> {
    Json(serde_json::json!({
        "status": "ok",
        "engine_alive": status.is_alive(),
    }))
}
