pub mod config;
pub mod error;
pub mod routes;
pub mod stockfish;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tutor_core::engine::EngineStatus;
use tutor_core::Tutor;

/// The single tutoring session, serialized behind one lock.
pub type SharedTutor = Arc<Mutex<Tutor>>;

pub fn shared(tutor: Tutor) -> SharedTutor {
    Arc::new(Mutex::new(tutor))
}

/// Build the HTTP router around a tutor. `status` answers `/health` without the tutor lock.
pub fn app(tutor: SharedTutor, status: EngineStatus) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/new_game", post(routes::game::new_game))
        .route("/game_state", get(routes::game::game_state))
        .route("/make_move", post(routes::game::make_move))
        .route("/confirm_move", post(routes::game::confirm_move))
        .route("/cancel_move", post(routes::game::cancel_move))
        .route("/change_settings", post(routes::game::change_settings))
        .layer(Extension(tutor))
        .layer(Extension(status))
        .layer(cors)
}
