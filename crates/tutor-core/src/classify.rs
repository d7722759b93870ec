//! Move quality classification.
//!
//! One submitted move is scored with up to three engine queries: a multi-PV
//! search of the current position, an evaluation of the position after the
//! move, and the opponent's best reply there (the threat).

use std::str::FromStr;

use serde::Serialize;
use shakmaty::uci::UciMove;
use shakmaty::{Chess, Color, Move, Position};
use tracing::{debug, warn};

use crate::commentary::{self, CommentHints, Severity};
use crate::difficulty::DifficultyProfile;
use crate::engine::{AnalysisEngine, CandidateLine, EngineError, MATE_SCORE};
use crate::notation::{self, GameResult};

/// Classification thresholds (score delta from the mover's side, centipawns)
pub const BLUNDER_THRESHOLD: i32 = -200;
pub const MISTAKE_THRESHOLD: i32 = -90;
pub const INACCURACY_THRESHOLD: i32 = -40;

/// Candidate lines requested from the engine
const TOP_LINES: usize = 3;

/// Plies of the best line quoted in feedback
const BEST_LINE_PLIES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Excellent,
    Great,
    Good,
    Inaccuracy,
    Mistake,
    Blunder,
}

impl Quality {
    /// Mistakes and blunders need the policy's attention; everything else is played.
    pub fn is_flagged(self) -> bool {
        matches!(self, Quality::Mistake | Quality::Blunder)
    }

    pub fn severity(self) -> Severity {
        match self {
            Quality::Excellent => Severity::Excellent,
            Quality::Great | Quality::Good => Severity::Good,
            Quality::Inaccuracy => Severity::Inaccuracy,
            Quality::Mistake => Severity::Mistake,
            Quality::Blunder => Severity::Blunder,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Quality::Excellent => "excellent",
            Quality::Great => "great",
            Quality::Good => "good",
            Quality::Inaccuracy => "inaccuracy",
            Quality::Mistake => "mistake",
            Quality::Blunder => "blunder",
        }
    }
}

/// How moves that appear among the engine's top lines are labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QualityScale {
    /// First line excellent, other top lines good.
    #[default]
    Standard,
    /// First line excellent, other top lines great.
    Graded,
    /// Every top line is simply good.
    Collapsed,
}

impl FromStr for QualityScale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(QualityScale::Standard),
            "graded" => Ok(QualityScale::Graded),
            "collapsed" => Ok(QualityScale::Collapsed),
            other => Err(format!("unknown quality scale '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifierConfig {
    pub scale: QualityScale,
    /// Escalate to blunder when the threat wins the moved piece for free.
    pub hanging_piece_check: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub quality: Quality,
    pub delta: i32,
    pub alternative: Option<UciMove>,
    pub threat: Option<UciMove>,
    /// Start of the engine's preferred line in numbered SAN (empty for top moves).
    pub best_line: String,
    pub comment: String,
}

impl Classification {
    /// Verdict used when the engine could not be consulted.
    pub fn neutral() -> Self {
        Self {
            quality: Quality::Good,
            delta: 0,
            alternative: None,
            threat: None,
            best_line: String::new(),
            comment: commentary::NEUTRAL_COMMENT.to_string(),
        }
    }
}

/// Map a score delta to a tier. Worst tier is checked first.
pub fn quality_for_delta(delta: i32) -> Quality {
    if delta <= BLUNDER_THRESHOLD {
        Quality::Blunder
    } else if delta <= MISTAKE_THRESHOLD {
        Quality::Mistake
    } else if delta <= INACCURACY_THRESHOLD {
        Quality::Inaccuracy
    } else {
        Quality::Good
    }
}

/// Tier of a move found at `rank` among the engine's top lines.
pub fn top_move_quality(rank: usize, scale: QualityScale) -> Quality {
    match (rank, scale) {
        (_, QualityScale::Collapsed) => Quality::Good,
        (0, _) => Quality::Excellent,
        (_, QualityScale::Graded) => Quality::Great,
        (_, QualityScale::Standard) => Quality::Good,
    }
}

/// Score change from the mover's side.
///
/// `before` is relative to the mover (the side to move before the move),
/// `after_white` is from White's perspective.
pub fn mover_delta(before: i32, after_white: i32, mover: Color) -> i32 {
    match mover {
        Color::White => after_white - before,
        Color::Black => before - after_white,
    }
}

/// Score of a finished game from White's perspective.
fn terminal_white_score(result: GameResult) -> i32 {
    match result.winner() {
        Some(Color::White) => MATE_SCORE,
        Some(Color::Black) => -MATE_SCORE,
        None => 0,
    }
}

/// True when `threat` captures the piece that just moved and nothing of the
/// mover's defends its square.
pub fn leaves_piece_hanging(after: &Chess, mv: Move, threat: Move) -> bool {
    if mv.is_castle() || !threat.is_capture() || threat.to() != mv.to() {
        return false;
    }
    let mover = !after.turn();
    let board = after.board();
    board
        .attacks_to(mv.to(), mover, board.occupied())
        .is_empty()
}

/// Classify `mv` (already legal in `pos`). Never fails: engine trouble yields
/// the neutral verdict.
pub async fn classify(
    engine: &mut dyn AnalysisEngine,
    pos: &Chess,
    mv: Move,
    profile: &DifficultyProfile,
    config: &ClassifierConfig,
) -> Classification {
    if !engine.is_alive() {
        warn!("Engine not running, skipping move analysis");
        return Classification::neutral();
    }

    match analyse(engine, pos, mv, profile, config).await {
        Ok(classification) => classification,
        Err(e) => {
            warn!(error = %e, "Move analysis failed, using neutral verdict");
            Classification::neutral()
        }
    }
}

async fn analyse(
    engine: &mut dyn AnalysisEngine,
    pos: &Chess,
    mv: Move,
    profile: &DifficultyProfile,
    config: &ClassifierConfig,
) -> Result<Classification, EngineError> {
    let lines = engine.evaluate_top(pos, profile.depth, TOP_LINES).await?;
    let top_moves: Vec<UciMove> = lines.iter().filter_map(CandidateLine::first_move).collect();
    let best = lines
        .first()
        .ok_or_else(|| EngineError::Protocol("no candidate lines returned".into()))?;

    let uci = notation::to_uci(mv);
    if let Some(rank) = top_moves.iter().position(|m| *m == uci) {
        let quality = top_move_quality(rank, config.scale);
        debug!(mv = %uci, rank, "Move is among the top lines");
        return Ok(Classification {
            quality,
            delta: 0,
            alternative: None,
            threat: None,
            best_line: String::new(),
            comment: commentary::comment(mv, quality, &CommentHints::default()),
        });
    }

    let score_before = best.score.to_cp();
    let mut after = pos.clone();
    after.play_unchecked(mv);

    let (score_after_white, threat) = match notation::outcome(&after) {
        Some(result) => (terminal_white_score(result), None),
        None => {
            let relative = engine.evaluate(&after, profile.depth).await?;
            let score_after_white = match after.turn() {
                Color::White => relative,
                Color::Black => relative.negate(),
            }
            .to_cp();
            let threat = engine.best_move(&after, profile.threat_budget()).await?;
            (score_after_white, threat)
        }
    };

    let delta = mover_delta(score_before, score_after_white, pos.turn());
    let mut quality = quality_for_delta(delta);

    let threat_move = threat.and_then(|t| t.to_move(&after).ok());
    if config.hanging_piece_check
        && quality != Quality::Blunder
        && threat_move.is_some_and(|t| leaves_piece_hanging(&after, mv, t))
    {
        debug!(mv = %uci, "Moved piece left hanging");
        quality = Quality::Blunder;
    }

    let alternative = top_moves.first().copied();
    let best_line = notation::format_line(pos, &best.pv, BEST_LINE_PLIES);
    let comment = commentary::comment(
        mv,
        quality,
        &CommentHints {
            alternative,
            best_line: &best_line,
            threat: threat_move,
        },
    );

    debug!(mv = %uci, delta, quality = quality.as_str(), "Move classified");

    Ok(Classification {
        quality,
        delta,
        alternative,
        threat,
        best_line,
        comment,
    })
}
