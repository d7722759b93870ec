//! Opponent reply driver.

use rand::seq::SliceRandom;
use shakmaty::{Chess, Move, Position};
use tracing::{debug, warn};

use crate::difficulty::DifficultyProfile;
use crate::engine::AnalysisEngine;
use crate::notation;

/// Where the reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Engine,
    /// Random legal move played because the engine could not supply one.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply {
    pub mv: Move,
    pub source: ReplySource,
}

/// Pick the opponent's move in `pos`. `None` only when there is no legal move.
pub async fn reply(
    engine: &mut dyn AnalysisEngine,
    pos: &Chess,
    profile: &DifficultyProfile,
) -> Option<Reply> {
    if engine.is_alive() {
        match engine.best_move(pos, profile.reply_budget()).await {
            Ok(Some(uci)) => match uci.to_move(pos) {
                Ok(mv) => {
                    debug!(mv = %uci, "Engine reply");
                    return Some(Reply {
                        mv,
                        source: ReplySource::Engine,
                    });
                }
                Err(_) => warn!(mv = %uci, "Engine suggested an illegal reply"),
            },
            Ok(None) => warn!("Engine returned no reply"),
            Err(e) => warn!(error = %e, "Engine reply failed"),
        }
    } else {
        warn!("Engine not running, playing a random reply");
    }

    random_move(pos).map(|mv| {
        debug!(mv = %notation::to_uci(mv), "Fallback reply");
        Reply {
            mv,
            source: ReplySource::Fallback,
        }
    })
}

fn random_move(pos: &Chess) -> Option<Move> {
    let legals = pos.legal_moves();
    legals.choose(&mut rand::thread_rng()).copied()
}
