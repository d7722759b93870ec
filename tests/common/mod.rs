use reqwest::{Client, StatusCode};
use serde_json::Value;
use server::SharedTutor;
use tokio::net::TcpListener;
use tutor_core::classify::ClassifierConfig;
use tutor_core::engine::{CandidateLine, Score};
use tutor_core::notation::parse_uci;
use tutor_core::scripted::{position_after, CallLog, OfflineSwitch, ScriptedEngine};
use tutor_core::shakmaty::Chess;
use tutor_core::Tutor;

/// A server running on an ephemeral port with a scripted engine behind it.
pub struct TestApp {
    pub base_url: String,
    pub client: Client,
    pub log: CallLog,
    pub offline: OfflineSwitch,
    pub tutor: SharedTutor,
}

impl TestApp {
    /// Build a URL for an API endpoint.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");
        let status = resp.status();
        (status, resp.json().await.expect("Response is not JSON"))
    }

    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let resp = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .expect("Failed to send POST request");
        let status = resp.status();
        (status, resp.json().await.expect("Response is not JSON"))
    }

    pub async fn new_game(&self) -> Value {
        let (status, body) = self.post("/new_game", Value::Null).await;
        assert_eq!(status, StatusCode::OK, "new_game failed: {body}");
        body
    }

    pub async fn make_move(&self, uci: &str) -> (StatusCode, Value) {
        self.post("/make_move", serde_json::json!({ "move": uci }))
            .await
    }

    pub async fn settings(&self, body: Value) -> (StatusCode, Value) {
        self.post("/change_settings", body).await
    }
}

/// Serve the router for `engine` on 127.0.0.1 with a random port.
pub async fn spawn_app(engine: ScriptedEngine) -> TestApp {
    let log = engine.call_log();
    let offline = engine.offline_switch();
    let tutor = Tutor::new(Box::new(engine), ClassifierConfig::default());
    let status = tutor.engine_status();
    let tutor = server::shared(tutor);
    let app = server::app(tutor.clone(), status);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server error");
    });

    TestApp {
        base_url: format!("http://{addr}"),
        client: Client::new(),
        log,
        offline,
        tutor,
    }
}

fn line(moves: &[&str], cp: i32) -> CandidateLine {
    CandidateLine {
        pv: moves.iter().map(|m| parse_uci(m).unwrap()).collect(),
        score: Score::Cp(cp),
    }
}

/// 1. e4 is the engine's first choice and is answered with 1... e5. After
/// that 2. Ba6 drops the bishop to bxa6 and 2. Nf3 is best.
pub fn opening_engine() -> ScriptedEngine {
    let bishop_hangs = position_after(&["e2e4", "e7e5", "f1a6"]);
    ScriptedEngine::new()
        .with_top_lines(
            &Chess::default(),
            vec![line(&["e2e4", "e7e5"], 30), line(&["d2d4"], 25)],
        )
        .with_best_move(&position_after(&["e2e4"]), parse_uci("e7e5").unwrap())
        .with_top_lines(
            &position_after(&["e2e4", "e7e5"]),
            vec![line(&["g1f3", "b8c6"], 40), line(&["b1c3"], 30)],
        )
        .with_eval(&bishop_hangs, Score::Cp(300))
        .with_best_move(&bishop_hangs, parse_uci("b7a6").unwrap())
}
