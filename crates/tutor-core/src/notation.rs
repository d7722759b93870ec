//! Move notation, FEN keys and terminal-state helpers on top of shakmaty.

use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, Position};

use crate::error::TutorError;

/// Halfmove clock value at which the game is drawn without a claim.
const SEVENTY_FIVE_MOVE_PLIES: u32 = 150;

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    Checkmate { winner: Color },
    Stalemate,
    InsufficientMaterial,
    SeventyFiveMoves,
    FivefoldRepetition,
}

impl GameResult {
    pub fn winner(self) -> Option<Color> {
        match self {
            GameResult::Checkmate { winner } => Some(winner),
            _ => None,
        }
    }

    pub fn describe(self) -> String {
        match self {
            GameResult::Checkmate { winner } => format!("Checkmate! {} wins.", color_name(winner)),
            GameResult::Stalemate => "Game over! Draw by stalemate.".to_string(),
            GameResult::InsufficientMaterial => {
                "Game over! Draw by insufficient material.".to_string()
            }
            GameResult::SeventyFiveMoves => "Game over! Draw by the 75-move rule.".to_string(),
            GameResult::FivefoldRepetition => {
                "Game over! Draw by fivefold repetition.".to_string()
            }
        }
    }
}

pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}

/// Parse UCI text (`e2e4`, `e7e8q`) without checking legality.
pub fn parse_uci(text: &str) -> Result<UciMove, TutorError> {
    text.trim()
        .parse::<UciMove>()
        .map_err(|_| TutorError::MalformedMove(text.to_string()))
}

/// Resolve a UCI move against `pos`, failing when it is not legal there.
pub fn legal_move(pos: &Chess, uci: UciMove) -> Result<Move, TutorError> {
    uci.to_move(pos)
        .map_err(|_| TutorError::IllegalMove(uci.to_string()))
}

pub fn to_uci(m: Move) -> UciMove {
    m.to_uci(CastlingMode::Standard)
}

pub fn fen(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

/// FEN without move counters: identifies a position for repetition counting.
pub fn position_key(pos: &Chess) -> String {
    fen(pos).split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}

/// Terminal state visible from the position alone (no history).
pub fn outcome(pos: &Chess) -> Option<GameResult> {
    if pos.is_checkmate() {
        return Some(GameResult::Checkmate { winner: !pos.turn() });
    }
    if pos.is_stalemate() {
        return Some(GameResult::Stalemate);
    }
    if pos.is_insufficient_material() {
        return Some(GameResult::InsufficientMaterial);
    }
    if pos.halfmoves() >= SEVENTY_FIVE_MOVE_PLIES {
        return Some(GameResult::SeventyFiveMoves);
    }
    None
}

/// Render the start of a UCI line as numbered SAN, e.g. "12. Nf3 Nc6 13. Bb5".
/// Stops at `max_plies` or at the first move that is not legal.
pub fn format_line(start: &Chess, line: &[UciMove], max_plies: usize) -> String {
    let mut pos = start.clone();
    let mut out: Vec<String> = Vec::new();

    for uci in line.iter().take(max_plies) {
        let m = match uci.to_move(&pos) {
            Ok(m) => m,
            Err(_) => break,
        };
        let move_number = pos.fullmoves().get();
        if pos.turn() == Color::White {
            out.push(format!("{move_number}."));
        } else if out.is_empty() {
            out.push(format!("{move_number}..."));
        }
        out.push(San::from_move(&pos, m).to_string());
        pos.play_unchecked(m);
    }

    out.join(" ")
}
