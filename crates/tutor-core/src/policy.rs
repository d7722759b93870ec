//! Tutoring policy: what happens to a classified move.

use serde::Serialize;

use crate::classify::Quality;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TutorMode {
    /// Flagged moves are held until the learner confirms them.
    #[default]
    Advisory,
    /// Flagged moves are refused outright.
    Strict,
}

pub const TUTOR_MODES: [TutorMode; 2] = [TutorMode::Advisory, TutorMode::Strict];

impl TutorMode {
    pub fn by_index(index: usize) -> Option<TutorMode> {
        TUTOR_MODES.get(index).copied()
    }

    pub fn index(self) -> usize {
        match self {
            TutorMode::Advisory => 0,
            TutorMode::Strict => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TutorMode::Advisory => "Advisory",
            TutorMode::Strict => "Strict",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Play the move and let the opponent answer.
    Commit,
    /// Leave the position untouched.
    Reject,
    /// Stage the move until it is confirmed.
    Hold,
}

pub fn decide(quality: Quality, mode: TutorMode) -> Verdict {
    match (quality.is_flagged(), mode) {
        (false, _) => Verdict::Commit,
        (true, TutorMode::Strict) => Verdict::Reject,
        (true, TutorMode::Advisory) => Verdict::Hold,
    }
}
