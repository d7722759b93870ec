//! Difficulty tiers: search budget and engine strength per level.

use std::time::Duration;

use crate::engine::SearchBudget;

/// Threat lookups never search shallower than this.
pub const MIN_THREAT_DEPTH: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyProfile {
    pub label: &'static str,
    pub think_time: Duration,
    pub depth: u32,
    /// Elo cap passed to the engine; `None` plays at full strength.
    pub elo: Option<u32>,
}

pub const DIFFICULTY_LEVELS: [DifficultyProfile; 4] = [
    DifficultyProfile {
        label: "Very Easy",
        think_time: Duration::from_millis(300),
        depth: 5,
        elo: Some(1320),
    },
    DifficultyProfile {
        label: "Easy",
        think_time: Duration::from_millis(500),
        depth: 8,
        elo: Some(1400),
    },
    DifficultyProfile {
        label: "Medium",
        think_time: Duration::from_millis(800),
        depth: 12,
        elo: Some(1600),
    },
    DifficultyProfile {
        label: "Hard",
        think_time: Duration::from_millis(1200),
        depth: 18,
        elo: Some(2200),
    },
];

impl DifficultyProfile {
    /// Tier at `index`, if it exists.
    pub fn by_index(index: usize) -> Option<&'static DifficultyProfile> {
        DIFFICULTY_LEVELS.get(index)
    }

    /// Budget for the opponent's reply.
    pub fn reply_budget(&self) -> SearchBudget {
        SearchBudget {
            think_time: self.think_time,
            depth: self.depth,
        }
    }

    /// Reduced budget used to look up the opponent's threat after a candidate move.
    pub fn threat_budget(&self) -> SearchBudget {
        SearchBudget {
            think_time: self.think_time / 3,
            depth: (self.depth / 2).max(MIN_THREAT_DEPTH),
        }
    }
}
