//! Analysis engine abstraction.
//!
//! The tutor never searches on its own: every score and every reply comes from
//! an engine behind this trait. The production implementation is a UCI
//! subprocess; tests use the scripted engine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use shakmaty::uci::UciMove;
use shakmaty::Chess;
use thiserror::Error;

/// Score used for forced mates, in centipawns.
pub const MATE_SCORE: i32 = 10_000;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Engine unavailable: {0}")]
    Unavailable(String),

    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Engine did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Engine protocol error: {0}")]
    Protocol(String),
}

/// Last known engine liveness, readable without the tutor.
#[derive(Debug, Clone, Default)]
pub struct EngineStatus(Arc<AtomicBool>);

impl EngineStatus {
    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, alive: bool) {
        self.0.store(alive, Ordering::Relaxed);
    }
}

/// Engine evaluation relative to the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Cp(i32),
    /// Mate in N moves (positive = side to move mates, zero or negative = gets mated)
    Mate(i32),
}

impl Score {
    /// Collapse to centipawns, mapping mates to `±(MATE_SCORE - n)`.
    pub fn to_cp(self) -> i32 {
        match self {
            Score::Cp(cp) => cp,
            Score::Mate(n) if n > 0 => MATE_SCORE - n,
            Score::Mate(n) => -MATE_SCORE - n,
        }
    }

    /// Flip to the other side's point of view.
    pub fn negate(self) -> Score {
        match self {
            Score::Cp(cp) => Score::Cp(-cp),
            Score::Mate(n) => Score::Mate(-n),
        }
    }
}

/// One line of a multi-PV search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLine {
    pub pv: Vec<UciMove>,
    pub score: Score,
}

impl CandidateLine {
    pub fn first_move(&self) -> Option<UciMove> {
        self.pv.first().copied()
    }
}

/// Limits for a single move search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBudget {
    pub think_time: Duration,
    pub depth: u32,
}

#[async_trait]
pub trait AnalysisEngine: Send {
    /// Top `lines` candidate lines of `pos`, best first.
    async fn evaluate_top(
        &mut self,
        pos: &Chess,
        depth: u32,
        lines: usize,
    ) -> Result<Vec<CandidateLine>, EngineError>;

    /// Evaluation of `pos` from the side to move.
    async fn evaluate(&mut self, pos: &Chess, depth: u32) -> Result<Score, EngineError>;

    /// Single best move of `pos`. `None` when the engine has nothing to play.
    async fn best_move(
        &mut self,
        pos: &Chess,
        budget: SearchBudget,
    ) -> Result<Option<UciMove>, EngineError>;

    /// Cap playing strength at `elo`, or lift the cap with `None`.
    async fn set_strength(&mut self, elo: Option<u32>) -> Result<(), EngineError>;

    fn is_alive(&self) -> bool {
        true
    }

    /// Bring a dead engine back. Live engines are left untouched.
    async fn restart(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mate_scores_map_near_mate_constant() {
        assert_eq!(Score::Mate(3).to_cp(), 9_997);
        assert_eq!(Score::Mate(-2).to_cp(), -9_998);
        assert_eq!(Score::Mate(0).to_cp(), -10_000);
        assert_eq!(Score::Cp(-35).to_cp(), -35);
    }

    #[test]
    fn test_negate_flips_perspective() {
        assert_eq!(Score::Cp(120).negate(), Score::Cp(-120));
        assert_eq!(Score::Mate(2).negate(), Score::Mate(-2));
    }
}
