//! State of the single tutoring game.

use std::collections::HashMap;

use serde::Serialize;
use shakmaty::uci::UciMove;
use shakmaty::{Chess, Move, Position};

use crate::commentary::{self, Severity};
use crate::difficulty::{DifficultyProfile, DIFFICULTY_LEVELS};
use crate::notation::{self, GameResult};
use crate::policy::TutorMode;

/// Occurrences of one position that end the game.
const FIVEFOLD: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    AwaitingMove,
    PendingConfirmation,
    Terminal,
}

#[derive(Debug, Clone)]
pub struct Session {
    position: Chess,
    mode: TutorMode,
    difficulty: usize,
    pending: Option<Move>,
    last_move: Option<UciMove>,
    feedback_text: String,
    feedback_severity: Severity,
    alternative: Option<UciMove>,
    threat: Option<UciMove>,
    history: Vec<UciMove>,
    repetitions: HashMap<String, u32>,
    result: Option<GameResult>,
}

impl Session {
    /// Fresh game from the standard start position. `difficulty` must be a valid tier index.
    pub fn new(mode: TutorMode, difficulty: usize) -> Self {
        let position = Chess::default();
        let mut repetitions = HashMap::new();
        repetitions.insert(notation::position_key(&position), 1);
        Self {
            position,
            mode,
            difficulty: difficulty.min(DIFFICULTY_LEVELS.len() - 1),
            pending: None,
            last_move: None,
            feedback_text: commentary::WELCOME.to_string(),
            feedback_severity: Severity::Info,
            alternative: None,
            threat: None,
            history: Vec::new(),
            repetitions,
            result: None,
        }
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    pub fn mode(&self) -> TutorMode {
        self.mode
    }

    pub fn difficulty_index(&self) -> usize {
        self.difficulty
    }

    pub fn profile(&self) -> &'static DifficultyProfile {
        &DIFFICULTY_LEVELS[self.difficulty]
    }

    pub fn pending(&self) -> Option<Move> {
        self.pending
    }

    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    pub fn phase(&self) -> Phase {
        if self.result.is_some() {
            Phase::Terminal
        } else if self.pending.is_some() {
            Phase::PendingConfirmation
        } else {
            Phase::AwaitingMove
        }
    }

    pub fn set_mode(&mut self, mode: TutorMode) {
        self.mode = mode;
    }

    /// Ignores indices outside the tier table.
    pub fn set_difficulty(&mut self, index: usize) {
        if index < DIFFICULTY_LEVELS.len() {
            self.difficulty = index;
        }
    }

    /// Stage `mv` for confirmation. It must be legal in the current position.
    pub fn hold(&mut self, mv: Move) {
        debug_assert!(self.position.is_legal(mv));
        self.pending = Some(mv);
    }

    pub fn take_pending(&mut self) -> Option<Move> {
        self.pending.take()
    }

    pub fn set_feedback(&mut self, text: impl Into<String>, severity: Severity) {
        self.feedback_text = text.into();
        self.feedback_severity = severity;
    }

    pub fn show_hints(&mut self, alternative: Option<UciMove>, threat: Option<UciMove>) {
        self.alternative = alternative;
        self.threat = threat;
    }

    /// Drop the pending move and any analysis hints.
    pub fn clear_hints(&mut self) {
        self.pending = None;
        self.alternative = None;
        self.threat = None;
    }

    /// Play a legal move, record it and update the game result.
    pub fn apply(&mut self, mv: Move) {
        let uci = notation::to_uci(mv);
        self.position.play_unchecked(mv);
        self.history.push(uci);
        self.last_move = Some(uci);

        let count = self
            .repetitions
            .entry(notation::position_key(&self.position))
            .or_insert(0);
        *count += 1;
        let seen = *count;

        self.result = notation::outcome(&self.position)
            .or((seen >= FIVEFOLD).then_some(GameResult::FivefoldRepetition));
    }

    pub fn snapshot(&self) -> Snapshot {
        let profile = self.profile();
        Snapshot {
            fen: notation::fen(&self.position),
            turn: notation::color_name(self.position.turn()).to_ascii_lowercase(),
            tutor_mode: self.mode.name(),
            tutor_mode_index: self.mode.index(),
            difficulty: profile.label,
            difficulty_index: self.difficulty,
            feedback_text: self.feedback_text.clone(),
            feedback_severity: self.feedback_severity,
            last_move: self.last_move.map(|m| m.to_string()),
            best_alternative_move: self.alternative.map(|m| m.to_string()),
            threat_move: self.threat.map(|m| m.to_string()),
            pending_move: self.pending.map(|m| notation::to_uci(m).to_string()),
            move_history: self.history.iter().map(ToString::to_string).collect(),
            phase: self.phase(),
            is_game_over: self.result.is_some(),
            game_result: self
                .result
                .map_or_else(|| commentary::GAME_IN_PROGRESS.to_string(), GameResult::describe),
        }
    }
}

/// Serializable view of the session returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub fen: String,
    pub turn: String,
    pub tutor_mode: &'static str,
    pub tutor_mode_index: usize,
    pub difficulty: &'static str,
    pub difficulty_index: usize,
    pub feedback_text: String,
    pub feedback_severity: Severity,
    pub last_move: Option<String>,
    pub best_alternative_move: Option<String>,
    pub threat_move: Option<String>,
    pub pending_move: Option<String>,
    pub move_history: Vec<String>,
    pub phase: Phase,
    pub is_game_over: bool,
    pub game_result: String,
}
