//! Integration tests for the tutoring HTTP API.
//!
//! Each test serves the router on an ephemeral port with a scripted engine.

mod common;

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};
use tutor_core::scripted::{position_after, EngineCall, ScriptedEngine};
use tutor_core::notation;

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// New game in the given mode with 1. e4 e5 already on the board.
async fn after_opening(mode_index: u32) -> common::TestApp {
    let app = common::spawn_app(common::opening_engine()).await;
    app.new_game().await;
    let (status, _) = app.settings(json!({ "tutor_mode_index": mode_index })).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app.make_move("e2e4").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    app.log.clear();
    app
}

fn history(state: &Value) -> Vec<String> {
    state["move_history"]
        .as_array()
        .expect("move_history is an array")
        .iter()
        .map(|m| m.as_str().unwrap_or_default().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn game_state_requires_a_game() {
    let app = common::spawn_app(ScriptedEngine::new()).await;

    let (status, body) = app.get("/game_state").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = app.make_move("e2e4").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn new_game_resets_to_start_position() {
    let app = common::spawn_app(common::opening_engine()).await;

    let state = app.new_game().await;

    assert_eq!(state["fen"], START_FEN);
    assert_eq!(state["turn"], "white");
    assert_eq!(state["tutor_mode"], "Advisory");
    assert_eq!(state["difficulty"], "Very Easy");
    assert_eq!(state["phase"], "awaiting_move");
    assert_eq!(state["feedback_severity"], "info");
    assert_eq!(state["is_game_over"], false);
    assert_eq!(state["game_result"], "Game in progress");

    let (status, same) = app.get("/game_state").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(same, state);
}

/// Opening move equal to the engine's top choice at the easiest tier.
#[tokio::test]
async fn top_move_is_accepted_with_reply() {
    let app = common::spawn_app(common::opening_engine()).await;
    app.new_game().await;

    let (status, body) = app.make_move("e2e4").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "accepted");
    assert_eq!(body["analysis"]["quality"], "excellent");
    assert_eq!(body["analysis"]["severity"], "excellent");
    assert_eq!(body["game_state"]["last_move"], "e7e5");
    assert_eq!(history(&body["game_state"]), vec!["e2e4", "e7e5"]);
}

/// Hanging a piece in strict mode is refused and the board stays put.
#[tokio::test]
async fn strict_mode_rejects_hanging_piece() {
    let app = after_opening(1).await;
    let (_, before) = app.get("/game_state").await;

    let (status, body) = app.make_move("f1a6").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["analysis"]["quality"], "blunder");
    assert_eq!(body["analysis"]["best_alternative"], "g1f3");
    assert_eq!(body["analysis"]["best_line"], "2. Nf3 Nc6");
    assert_eq!(body["game_state"]["fen"], before["fen"]);
    assert_eq!(body["game_state"]["best_alternative_move"], "g1f3");
    assert!(body["game_state"]["threat_move"].is_null());
    assert!(body["game_state"]["pending_move"].is_null());

    // Only analysis searches, no reply search at the profile budget.
    let reply_searches = app
        .log
        .calls()
        .iter()
        .filter(|c| matches!(c, EngineCall::BestMove { budget, .. } if budget.depth == 5))
        .count();
    assert_eq!(reply_searches, 0);
}

/// Advisory mode holds the move; confirming plays it and the reply follows.
#[tokio::test]
async fn advisory_mode_requires_confirmation() {
    let app = after_opening(0).await;
    let (_, before) = app.get("/game_state").await;

    let (status, held) = app.make_move("f1a6").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(held["status"], "confirmation_required");
    assert_eq!(held["analysis"]["threat"], "b7a6");
    assert_eq!(held["game_state"]["fen"], before["fen"]);
    assert_eq!(held["game_state"]["pending_move"], "f1a6");
    assert_eq!(held["game_state"]["threat_move"], "b7a6");
    assert_eq!(held["game_state"]["phase"], "pending_confirmation");

    app.log.clear();
    let (status, confirmed) = app.make_move("f1a6_confirmed").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["status"], "accepted");
    assert!(confirmed.get("analysis").is_none());
    assert_eq!(
        history(&confirmed["game_state"]),
        vec!["e2e4", "e7e5", "f1a6", "b7a6"]
    );
    assert_eq!(confirmed["game_state"]["feedback_severity"], "mistake");
    // Confirmation does not classify again.
    assert!(!app
        .log
        .calls()
        .iter()
        .any(|c| matches!(c, EngineCall::EvaluateTop { .. })));
}

#[tokio::test]
async fn confirm_endpoint_commits_pending_move() {
    let app = after_opening(0).await;
    app.make_move("f1a6").await;

    let (status, body) = app
        .post("/confirm_move", json!({ "move": "f1a6" }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "accepted");
    assert_eq!(body["game_state"]["last_move"], "b7a6");
}

#[tokio::test]
async fn wrong_confirmation_is_rejected_without_change() {
    let app = after_opening(0).await;

    let (status, body) = app.make_move("f1a6_confirmed").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    app.make_move("f1a6").await;
    let (_, staged) = app.get("/game_state").await;

    let (status, _) = app
        .post("/confirm_move", json!({ "move": "g1f3" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, after) = app.get("/game_state").await;
    assert_eq!(after, staged);
}

#[tokio::test]
async fn cancel_drops_pending_move() {
    let app = after_opening(0).await;
    app.make_move("f1a6").await;

    let (status, state) = app.post("/cancel_move", Value::Null).await;

    assert_eq!(status, StatusCode::OK);
    assert!(state["pending_move"].is_null());
    assert_eq!(state["phase"], "awaiting_move");

    let (status, _) = app.make_move("f1a6_confirmed").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn settings_change_keeps_position_and_clears_pending() {
    let app = after_opening(0).await;
    app.make_move("f1a6").await;
    let (_, before) = app.get("/game_state").await;

    let (status, state) = app
        .settings(json!({ "difficulty_index": 2, "tutor_mode_index": 1 }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["fen"], before["fen"]);
    assert_eq!(state["difficulty"], "Medium");
    assert_eq!(state["tutor_mode"], "Strict");
    assert!(state["pending_move"].is_null());
    assert!(state["best_alternative_move"].is_null());
    assert!(app.log.calls().contains(&EngineCall::SetStrength(Some(1600))));
}

#[tokio::test]
async fn invalid_settings_are_rejected() {
    let app = common::spawn_app(common::opening_engine()).await;
    let state = app.new_game().await;

    let (status, body) = app.settings(json!({ "difficulty_index": 4 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = app
        .settings(json!({ "difficulty_index": 1, "tutor_mode_index": -1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, after) = app.get("/game_state").await;
    assert_eq!(after, state);
}

#[tokio::test]
async fn bad_move_input_is_a_client_error() {
    let app = common::spawn_app(common::opening_engine()).await;
    app.new_game().await;

    let (status, _) = app.make_move("not-a-move").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.make_move("e2e5").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.post("/make_move", json!({ "uci": "e2e4" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (_, state) = app.get("/game_state").await;
    assert_eq!(state["fen"], START_FEN);
}

#[tokio::test]
async fn finished_game_refuses_moves() {
    let engine = ScriptedEngine::new()
        .with_best_move(
            &position_after(&["f2f3"]),
            notation::parse_uci("e7e5").unwrap(),
        )
        .with_best_move(
            &position_after(&["f2f3", "e7e5", "g2g4"]),
            notation::parse_uci("d8h4").unwrap(),
        );
    let app = common::spawn_app(engine).await;
    app.new_game().await;

    app.make_move("f2f3").await;
    let (status, body) = app.make_move("g2g4").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["game_state"]["is_game_over"], true);
    assert_eq!(body["game_state"]["game_result"], "Checkmate! Black wins.");

    let (status, body) = app.make_move("a2a3").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let state = app.new_game().await;
    assert_eq!(state["is_game_over"], false);
}

#[tokio::test]
async fn offline_engine_still_plays() {
    let app = common::spawn_app(common::opening_engine()).await;
    app.new_game().await;

    let (_, health) = app.get("/health").await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["engine_alive"], true);

    app.offline.set(true);
    let (status, body) = app.make_move("e2e4").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "accepted");
    assert_eq!(body["analysis"]["quality"], "good");
    assert_eq!(history(&body["game_state"]).len(), 2);

    let (_, health) = app.get("/health").await;
    assert_eq!(health["engine_alive"], false);

    // A new game brings the engine back.
    app.new_game().await;
    let (_, health) = app.get("/health").await;
    assert_eq!(health["engine_alive"], true);
}

#[tokio::test]
async fn health_answers_while_tutor_is_busy() {
    let app = common::spawn_app(common::opening_engine()).await;
    let _busy = app.tutor.lock().await;

    let (status, health) = tokio::time::timeout(Duration::from_secs(2), app.get("/health"))
        .await
        .expect("/health waited for the tutor");

    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["engine_alive"], true);
}
