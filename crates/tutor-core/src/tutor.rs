//! The tutoring state machine.
//!
//! `Tutor` owns the engine and the single game session. Every operation
//! either fails with a `TutorError` and leaves the session untouched, or
//! completes its transition before returning.

use serde::Serialize;
use shakmaty::Move;
use tracing::{info, warn};

use crate::classify::{classify, Classification, ClassifierConfig, Quality};
use crate::commentary::{self, Severity};
use crate::difficulty::DifficultyProfile;
use crate::engine::{AnalysisEngine, EngineStatus};
use crate::error::TutorError;
use crate::notation;
use crate::opponent::{self, ReplySource};
use crate::policy::{decide, TutorMode, Verdict};
use crate::session::{Session, Snapshot};

/// Appended to a move's UCI text to confirm a pending move through `submit`.
pub const CONFIRMED_SUFFIX: &str = "_confirmed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveStatus {
    Accepted,
    Rejected,
    ConfirmationRequired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub quality: Quality,
    pub delta: i32,
    pub text: String,
    pub severity: Severity,
    pub best_alternative: Option<String>,
    pub threat: Option<String>,
    pub best_line: Option<String>,
}

impl From<&Classification> for AnalysisReport {
    fn from(c: &Classification) -> Self {
        Self {
            quality: c.quality,
            delta: c.delta,
            text: c.comment.clone(),
            severity: c.quality.severity(),
            best_alternative: c.alternative.map(|m| m.to_string()),
            threat: c.threat.map(|m| m.to_string()),
            best_line: (!c.best_line.is_empty()).then(|| c.best_line.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveReport {
    pub status: MoveStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisReport>,
    pub game_state: Snapshot,
}

pub struct Tutor {
    engine: Box<dyn AnalysisEngine>,
    session: Option<Session>,
    config: ClassifierConfig,
    /// Strength last accepted by the engine; `None` until one was applied.
    applied_strength: Option<Option<u32>>,
    /// Refreshed after every operation that talks to the engine.
    status: EngineStatus,
}

impl Tutor {
    pub fn new(engine: Box<dyn AnalysisEngine>, config: ClassifierConfig) -> Self {
        let status = EngineStatus::default();
        status.set(engine.is_alive());
        Self {
            engine,
            session: None,
            config,
            applied_strength: None,
            status,
        }
    }

    pub fn engine_alive(&self) -> bool {
        self.engine.is_alive()
    }

    /// Liveness handle shared with callers that must not wait for the tutor.
    pub fn engine_status(&self) -> EngineStatus {
        self.status.clone()
    }

    /// Start over from the initial position with default settings.
    pub async fn new_game(&mut self) -> Snapshot {
        if !self.engine.is_alive() {
            info!("Restarting engine for the new game");
            match self.engine.restart().await {
                Ok(()) => self.applied_strength = None,
                Err(e) => warn!(error = %e, "Engine restart failed"),
            }
        }

        let session = Session::new(TutorMode::default(), 0);
        apply_strength(
            self.engine.as_mut(),
            &mut self.applied_strength,
            session.profile(),
        )
        .await;

        let snapshot = session.snapshot();
        self.session = Some(session);
        self.status.set(self.engine.is_alive());
        info!("New game started");
        snapshot
    }

    pub fn snapshot(&self) -> Result<Snapshot, TutorError> {
        self.session
            .as_ref()
            .map(Session::snapshot)
            .ok_or(TutorError::NoSession)
    }

    /// Handle a move selection. `<uci>_confirmed` confirms the pending move.
    pub async fn submit(&mut self, text: &str) -> Result<MoveReport, TutorError> {
        if let Some(staged) = text.trim().strip_suffix(CONFIRMED_SUFFIX) {
            return self.confirm(staged).await;
        }

        let session = self.session.as_mut().ok_or(TutorError::NoSession)?;
        if session.result().is_some() {
            return Err(TutorError::GameOver);
        }
        let uci = notation::parse_uci(text)?;
        let mv = notation::legal_move(session.position(), uci)?;

        if session.take_pending().is_some() {
            info!(mv = %uci, "Pending move replaced by a new selection");
        }

        let pos = session.position().clone();
        let profile = session.profile();
        let classification =
            classify(self.engine.as_mut(), &pos, mv, profile, &self.config).await;
        let severity = classification.quality.severity();
        let verdict = decide(classification.quality, session.mode());
        info!(
            mv = %uci,
            quality = classification.quality.as_str(),
            delta = classification.delta,
            ?verdict,
            "Move submitted"
        );

        let status = match verdict {
            Verdict::Commit => {
                let text = format!("{} Your turn!", classification.comment);
                commit(self.engine.as_mut(), session, mv, text, severity).await;
                MoveStatus::Accepted
            }
            Verdict::Reject => {
                session.clear_hints();
                session.show_hints(classification.alternative, None);
                session.set_feedback(
                    format!("{} {}", classification.comment, commentary::NOT_PERMITTED),
                    severity,
                );
                MoveStatus::Rejected
            }
            Verdict::Hold => {
                session.hold(mv);
                session.show_hints(classification.alternative, classification.threat);
                session.set_feedback(
                    format!("{} {}", classification.comment, commentary::CONFIRM_PROMPT),
                    severity,
                );
                MoveStatus::ConfirmationRequired
            }
        };
        self.status.set(self.engine.is_alive());

        Ok(MoveReport {
            status,
            analysis: Some(AnalysisReport::from(&classification)),
            game_state: session.snapshot(),
        })
    }

    /// Commit the pending move named by `text` without classifying it again.
    pub async fn confirm(&mut self, text: &str) -> Result<MoveReport, TutorError> {
        let session = self.session.as_mut().ok_or(TutorError::NoSession)?;
        let uci = notation::parse_uci(text)?;

        let mv = match session.pending() {
            Some(pending) if notation::to_uci(pending) == uci => pending,
            _ => return Err(TutorError::InvalidConfirmation(uci.to_string())),
        };
        session.take_pending();
        info!(mv = %uci, "Pending move confirmed");

        commit(
            self.engine.as_mut(),
            session,
            mv,
            commentary::CONFIRMED_RISKY.to_string(),
            Severity::Mistake,
        )
        .await;
        self.status.set(self.engine.is_alive());

        Ok(MoveReport {
            status: MoveStatus::Accepted,
            analysis: None,
            game_state: session.snapshot(),
        })
    }

    /// Drop the pending move, if any.
    pub fn cancel(&mut self) -> Result<Snapshot, TutorError> {
        let session = self.session.as_mut().ok_or(TutorError::NoSession)?;
        session.clear_hints();
        session.set_feedback(commentary::MAKE_YOUR_MOVE, Severity::Info);
        Ok(session.snapshot())
    }

    /// Change difficulty and/or mode. Both indices are validated before anything changes.
    pub async fn change_settings(
        &mut self,
        difficulty_index: Option<usize>,
        tutor_mode_index: Option<usize>,
    ) -> Result<Snapshot, TutorError> {
        let session = self.session.as_mut().ok_or(TutorError::NoSession)?;

        let profile = match difficulty_index {
            Some(index) => Some(DifficultyProfile::by_index(index).ok_or_else(|| {
                TutorError::InvalidSetting(format!("difficulty index {index}"))
            })?),
            None => None,
        };
        let mode = match tutor_mode_index {
            Some(index) => Some(TutorMode::by_index(index).ok_or_else(|| {
                TutorError::InvalidSetting(format!("tutor mode index {index}"))
            })?),
            None => None,
        };

        if let Some(index) = difficulty_index {
            session.set_difficulty(index);
        }
        if let Some(mode) = mode {
            session.set_mode(mode);
        }
        session.clear_hints();
        session.set_feedback(commentary::SETTINGS_UPDATED, Severity::Info);

        if let Some(profile) = profile {
            apply_strength(self.engine.as_mut(), &mut self.applied_strength, profile).await;
            self.status.set(self.engine.is_alive());
        }

        info!(
            difficulty = session.profile().label,
            mode = session.mode().name(),
            "Settings changed"
        );
        Ok(session.snapshot())
    }
}

/// Set the engine strength for `profile` unless it is already in effect.
async fn apply_strength(
    engine: &mut dyn AnalysisEngine,
    applied: &mut Option<Option<u32>>,
    profile: &DifficultyProfile,
) {
    if *applied == Some(profile.elo) {
        return;
    }
    match engine.set_strength(profile.elo).await {
        Ok(()) => *applied = Some(profile.elo),
        Err(e) => warn!(error = %e, label = profile.label, "Could not set engine strength"),
    }
}

/// Play the learner's move, then the opponent's reply unless the game ended.
async fn commit(
    engine: &mut dyn AnalysisEngine,
    session: &mut Session,
    mv: Move,
    feedback: String,
    severity: Severity,
) {
    session.clear_hints();
    session.apply(mv);

    if let Some(result) = session.result() {
        session.set_feedback(result.describe(), Severity::Info);
        return;
    }

    let mut feedback = feedback;
    let profile = session.profile();
    let reply = opponent::reply(engine, session.position(), profile).await;
    match reply {
        Some(reply) => {
            if reply.source == ReplySource::Fallback {
                feedback = format!("{feedback} {}", commentary::ENGINE_OFFLINE_REPLY);
            }
            info!(mv = %notation::to_uci(reply.mv), "Opponent replied");
            session.apply(reply.mv);
        }
        None => warn!(
            fen = %notation::fen(session.position()),
            "No reply available in a live position"
        ),
    }

    match session.result() {
        Some(result) => session.set_feedback(result.describe(), Severity::Info),
        None => session.set_feedback(feedback, severity),
    }
}
