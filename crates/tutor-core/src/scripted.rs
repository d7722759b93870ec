//! Deterministic engine for tests: answers from per-position tables and
//! records every call.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use shakmaty::uci::UciMove;
use shakmaty::{Chess, Position};

use crate::engine::{AnalysisEngine, CandidateLine, EngineError, Score, SearchBudget};
use crate::notation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    EvaluateTop { fen: String, depth: u32, lines: usize },
    Evaluate { fen: String, depth: u32 },
    BestMove { fen: String, budget: SearchBudget },
    SetStrength(Option<u32>),
    Restart,
}

/// Shared view of the calls an engine received.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<EngineCall>>>);

impl CallLog {
    pub fn calls(&self) -> Vec<EngineCall> {
        self.0.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut calls) = self.0.lock() {
            calls.clear();
        }
    }

    fn push(&self, call: EngineCall) {
        if let Ok(mut calls) = self.0.lock() {
            calls.push(call);
        }
    }
}

/// Switch shared with the engine to take it offline from the outside.
#[derive(Debug, Clone, Default)]
pub struct OfflineSwitch(Arc<AtomicBool>);

impl OfflineSwitch {
    pub fn set(&self, offline: bool) {
        self.0.store(offline, Ordering::SeqCst);
    }

    pub fn is_offline(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Engine keyed by FEN.
///
/// Unknown positions get no candidate lines, a level evaluation and the
/// first legal move as best move.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    top_lines: HashMap<String, Vec<CandidateLine>>,
    evals: HashMap<String, Score>,
    best_moves: HashMap<String, Option<UciMove>>,
    log: CallLog,
    offline: OfflineSwitch,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_top_lines(mut self, pos: &Chess, lines: Vec<CandidateLine>) -> Self {
        self.top_lines.insert(notation::fen(pos), lines);
        self
    }

    pub fn with_eval(mut self, pos: &Chess, score: Score) -> Self {
        self.evals.insert(notation::fen(pos), score);
        self
    }

    pub fn with_best_move(mut self, pos: &Chess, mv: UciMove) -> Self {
        self.best_moves.insert(notation::fen(pos), Some(mv));
        self
    }

    /// Make the engine answer `bestmove (none)` in `pos`.
    pub fn with_no_move(mut self, pos: &Chess) -> Self {
        self.best_moves.insert(notation::fen(pos), None);
        self
    }

    pub fn call_log(&self) -> CallLog {
        self.log.clone()
    }

    pub fn offline_switch(&self) -> OfflineSwitch {
        self.offline.clone()
    }

    pub fn set_offline(&mut self, offline: bool) {
        self.offline.set(offline);
    }

    fn check_online(&self) -> Result<(), EngineError> {
        if self.offline.is_offline() {
            Err(EngineError::Unavailable("scripted engine is offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AnalysisEngine for ScriptedEngine {
    async fn evaluate_top(
        &mut self,
        pos: &Chess,
        depth: u32,
        lines: usize,
    ) -> Result<Vec<CandidateLine>, EngineError> {
        self.check_online()?;
        let fen = notation::fen(pos);
        let mut result = self.top_lines.get(&fen).cloned().unwrap_or_default();
        result.truncate(lines);
        self.log.push(EngineCall::EvaluateTop { fen, depth, lines });
        Ok(result)
    }

    async fn evaluate(&mut self, pos: &Chess, depth: u32) -> Result<Score, EngineError> {
        self.check_online()?;
        let fen = notation::fen(pos);
        let score = self.evals.get(&fen).copied().unwrap_or(Score::Cp(0));
        self.log.push(EngineCall::Evaluate { fen, depth });
        Ok(score)
    }

    async fn best_move(
        &mut self,
        pos: &Chess,
        budget: SearchBudget,
    ) -> Result<Option<UciMove>, EngineError> {
        self.check_online()?;
        let fen = notation::fen(pos);
        let mv = match self.best_moves.get(&fen) {
            Some(scripted) => *scripted,
            None => pos.legal_moves().first().map(|m| notation::to_uci(*m)),
        };
        self.log.push(EngineCall::BestMove { fen, budget });
        Ok(mv)
    }

    async fn set_strength(&mut self, elo: Option<u32>) -> Result<(), EngineError> {
        self.check_online()?;
        self.log.push(EngineCall::SetStrength(elo));
        Ok(())
    }

    fn is_alive(&self) -> bool {
        !self.offline.is_offline()
    }

    /// Comes back online, like a respawned process.
    async fn restart(&mut self) -> Result<(), EngineError> {
        self.log.push(EngineCall::Restart);
        self.offline.set(false);
        Ok(())
    }
}

/// Position reached by playing UCI moves from the start. Panics on an illegal move.
pub fn position_after(moves: &[&str]) -> Chess {
    let mut pos = Chess::default();
    for text in moves {
        let uci = notation::parse_uci(text).unwrap_or_else(|e| panic!("{e}"));
        let mv = notation::legal_move(&pos, uci).unwrap_or_else(|e| panic!("{e}"));
        pos.play_unchecked(mv);
    }
    pos
}
