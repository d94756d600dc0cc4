use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::backend::ConnectionFactory;
use super::domain::{
    EvaluationResult, GameSession, SessionPhase, SessionView, QUALIFYING_FOLLOWERS,
};
use super::evaluator::DecisionEvaluator;
use super::heuristic::JitterSource;
use super::store::{
    Scoreboard, ScoreboardEntry, SessionId, SessionStore, StoreError,
};

/// Facade composing the evaluator, session store, and scoreboard.
pub struct GameService<F, J, S, B>
where
    F: ConnectionFactory,
    J: JitterSource,
    S: SessionStore,
    B: Scoreboard,
{
    evaluator: DecisionEvaluator<F, J>,
    sessions: Arc<S>,
    scoreboard: Arc<B>,
    in_flight: Mutex<HashSet<String>>,
}

/// Releases a session's in-flight slot however the evaluation ends.
struct InFlightSlot<'a> {
    slots: &'a Mutex<HashSet<String>>,
    id: String,
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        self.slots
            .lock()
            .expect("in-flight set poisoned")
            .remove(&self.id);
    }
}

/// Everything a caller needs to render round feedback.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionOutcome {
    pub result: EvaluationResult,
    pub session: SessionView,
}

#[derive(Debug, thiserror::Error)]
pub enum GameServiceError {
    #[error("no session with that id")]
    UnknownSession,
    #[error("submitted text was empty")]
    EmptyInput,
    #[error("a decision for this session is still being scored")]
    DecisionInFlight,
    #[error("game is not active (round {round})")]
    InvalidState { round: u32 },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl<F, J, S, B> GameService<F, J, S, B>
where
    F: ConnectionFactory,
    J: JitterSource,
    S: SessionStore,
    B: Scoreboard,
{
    pub fn new(evaluator: DecisionEvaluator<F, J>, sessions: Arc<S>, scoreboard: Arc<B>) -> Self {
        Self {
            evaluator,
            sessions,
            scoreboard,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    // Scoring awaits the backend, so two submissions for one session could
    // otherwise interleave fetch and update and lose a round record. The
    // second request is rejected instead of queued.
    fn claim_slot(&self, id: &SessionId) -> Result<InFlightSlot<'_>, GameServiceError> {
        let mut slots = self.in_flight.lock().expect("in-flight set poisoned");
        if !slots.insert(id.0.clone()) {
            return Err(GameServiceError::DecisionInFlight);
        }
        Ok(InFlightSlot {
            slots: &self.in_flight,
            id: id.0.clone(),
        })
    }

    /// Open a fresh ten-round session for the named religion.
    pub fn start_game(
        &self,
        religion_name: &str,
        player: &str,
    ) -> Result<(SessionId, SessionView), GameServiceError> {
        let name = religion_name.trim();
        if name.is_empty() {
            return Err(GameServiceError::EmptyInput);
        }

        let player = player.trim();
        let player = if player.is_empty() { "anonymous" } else { player };

        let session = GameSession::new(name, player);
        let view = session.view();
        let id = self.sessions.create(session)?;
        info!(session = %id.0, religion = name, "new game started");
        Ok((id, view))
    }

    /// Score one decision and advance the session.
    ///
    /// Validation failures leave the session untouched. Evaluation itself
    /// never fails; the pipeline degrades internally instead. At most one
    /// evaluation per session may be in flight at a time.
    pub async fn submit_decision(
        &self,
        id: &SessionId,
        decision: &str,
    ) -> Result<DecisionOutcome, GameServiceError> {
        let _slot = self.claim_slot(id)?;

        let mut session = self
            .sessions
            .fetch(id)?
            .ok_or(GameServiceError::UnknownSession)?;

        if !session.is_active() {
            return Err(GameServiceError::InvalidState {
                round: session.round(),
            });
        }

        let text = decision.trim();
        if text.is_empty() {
            return Err(GameServiceError::EmptyInput);
        }

        let result = self.evaluator.evaluate(text, &session.context()).await;
        session.apply_result(text, &result);
        self.sessions.update(id, session.clone())?;

        if session.phase() == SessionPhase::Completed
            && session.followers() >= QUALIFYING_FOLLOWERS
        {
            let entry = ScoreboardEntry {
                username: session.player().to_string(),
                religion: session.religion_name().to_string(),
                score: session.followers(),
                recorded_at: Utc::now(),
            };
            // The round result is already committed; a scoreboard hiccup
            // must not undo it.
            if let Err(error) = self.scoreboard.append(entry) {
                warn!(session = %id.0, %error, "scoreboard append failed");
            }
        }

        Ok(DecisionOutcome {
            result,
            session: session.view(),
        })
    }

    /// Current state for API responses.
    pub fn session_view(&self, id: &SessionId) -> Result<SessionView, GameServiceError> {
        let session = self
            .sessions
            .fetch(id)?
            .ok_or(GameServiceError::UnknownSession)?;
        Ok(session.view())
    }

    /// Abandon a session entirely.
    pub fn end_game(&self, id: &SessionId) -> Result<(), GameServiceError> {
        match self.sessions.delete(id) {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound) => Err(GameServiceError::UnknownSession),
            Err(other) => Err(GameServiceError::Store(other)),
        }
    }

    pub fn scoreboard_entries(&self) -> Vec<ScoreboardEntry> {
        match self.scoreboard.entries() {
            Ok(entries) => entries,
            Err(error) => {
                warn!(%error, "scoreboard read failed");
                Vec::new()
            }
        }
    }
}
