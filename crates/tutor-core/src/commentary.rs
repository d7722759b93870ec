//! Feedback text shown to the learner.

use rand::seq::SliceRandom;
use serde::Serialize;
use shakmaty::uci::UciMove;
use shakmaty::{Move, Rank, Role, Square};

use crate::classify::Quality;

pub const WELCOME: &str = "Welcome to the Chess Academy! Make your first move.";
pub const MAKE_YOUR_MOVE: &str = "Make your move.";
pub const SETTINGS_UPDATED: &str = "Settings updated. Make your move.";
pub const NEUTRAL_COMMENT: &str = "Good move!";
pub const NOT_PERMITTED: &str = "That move is not permitted. Try another one.";
pub const CONFIRM_PROMPT: &str = "Are you sure you want to play it anyway?";
pub const CONFIRMED_RISKY: &str = "You confirmed a risky move! Be more careful. Your turn.";
pub const GAME_IN_PROGRESS: &str = "Game in progress";
pub const ENGINE_OFFLINE_REPLY: &str = "The engine is unavailable, so your opponent played a random move.";

const CASTLE_PRAISE: &str = "Great way to keep your king safe! Your rook is ready to fight too.";
const CENTRE_PRAISE: &str = "Controlling the key central squares is very clever! You have the game in hand.";

const CENTRE: [Square; 4] = [Square::D4, Square::E4, Square::D5, Square::E5];

/// Display tag for feedback text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Excellent,
    Good,
    Inaccuracy,
    Mistake,
    Blunder,
}

/// Context that makes a comment concrete.
#[derive(Debug, Default)]
pub struct CommentHints<'a> {
    pub alternative: Option<UciMove>,
    pub best_line: &'a str,
    /// Opponent's best reply, legal in the position after the move.
    pub threat: Option<Move>,
}

fn piece_name(role: Role) -> &'static str {
    match role {
        Role::Pawn => "pawn",
        Role::Knight => "knight",
        Role::Bishop => "bishop",
        Role::Rook => "rook",
        Role::Queen => "queen",
        Role::King => "king",
    }
}

/// Praise for what a sound move achieves, when it does something recognisable.
pub fn purpose_praise(mv: Move) -> Option<String> {
    if mv.is_castle() {
        return Some(CASTLE_PRAISE.to_string());
    }
    if let Some(captured) = mv.capture() {
        return Some(format!(
            "You won the opponent's {} by capturing. Well done!",
            piece_name(captured)
        ));
    }
    let from_back_rank = mv
        .from()
        .is_some_and(|sq| matches!(sq.rank(), Rank::First | Rank::Eighth));
    if from_back_rank && matches!(mv.role(), Role::Knight | Role::Bishop) {
        return Some(format!(
            "Bringing your pieces into play is a great idea! This {} is more active now.",
            piece_name(mv.role())
        ));
    }
    if CENTRE.contains(&mv.to()) {
        return Some(CENTRE_PRAISE.to_string());
    }
    None
}

/// What the opponent's best reply does to the learner.
pub fn threat_explanation(threat: Move) -> String {
    match threat.capture() {
        Some(victim) => format!(
            "Your opponent's {} can take your {} on {}.",
            piece_name(threat.role()),
            piece_name(victim),
            threat.to()
        ),
        None => format!(
            "Your opponent can create serious danger on {}.",
            threat.to()
        ),
    }
}

/// Every comment that may be said about a move of this quality.
pub fn comment_pool(quality: Quality, hints: &CommentHints<'_>) -> Vec<String> {
    let mut pool: Vec<String> = match quality {
        Quality::Excellent => vec![
            "Excellent move! Just like a master.".into(),
            "Great vision! That was the engine's first choice too.".into(),
        ],
        Quality::Great => vec![
            "Great move! Solid and clever.".into(),
            "Nice idea! You are strengthening your position.".into(),
        ],
        Quality::Good => vec![
            "A sensible move. Keep it up!".into(),
            "A good, solid move.".into(),
        ],
        Quality::Inaccuracy => vec!["Not bad, but there was something better.".into()],
        Quality::Mistake => vec!["Careful! This move gives your opponent a chance.".into()],
        Quality::Blunder => vec!["Oh no! This is a very dangerous move!".into()],
    };

    match quality {
        Quality::Inaccuracy => {
            if let Some(alternative) = hints.alternative {
                pool.push(format!("{alternative} would have been more effective."));
            }
        }
        Quality::Mistake if !hints.best_line.is_empty() => {
            pool.push(format!("This continuation was stronger: {}", hints.best_line));
        }
        Quality::Blunder if !hints.best_line.is_empty() => {
            pool.push(format!(
                "That is a serious error! The recommended line was: {}",
                hints.best_line
            ));
        }
        _ => {}
    }

    pool
}

/// Pick the comment for a classified move. Sound moves are praised for their
/// purpose; mistakes and blunders name the threat when one is known.
pub fn comment(mv: Move, quality: Quality, hints: &CommentHints<'_>) -> String {
    if matches!(quality, Quality::Excellent | Quality::Great | Quality::Good) {
        if let Some(praise) = purpose_praise(mv) {
            return praise;
        }
    }

    let picked = comment_pool(quality, hints)
        .choose(&mut rand::thread_rng())
        .cloned()
        .unwrap_or_else(|| NEUTRAL_COMMENT.to_string());

    match hints.threat {
        Some(threat) if quality.is_flagged() => {
            format!("{picked} {}", threat_explanation(threat))
        }
        _ => picked,
    }
}
