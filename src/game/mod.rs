//! Decision evaluation pipeline and round state machine for the creed
//! simulation, plus the narrow collaborator seams around them.

pub mod backend;
pub mod domain;
pub(crate) mod evaluator;
pub mod gemini;
pub mod heuristic;
pub(crate) mod keypool;
pub(crate) mod keywords;
pub(crate) mod parser;
pub(crate) mod prompt;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use backend::{BackendError, Candidate, ConnectionFactory, ModelOutput, ScoringConnection};
pub use domain::{
    EvaluationContext, EvaluationResult, GameSession, RoundRecord, SessionPhase, SessionView,
    FINAL_ROUND, HEURISTIC_CHANGE_MAX, HEURISTIC_CHANGE_MIN, MODEL_CHANGE_MAX, MODEL_CHANGE_MIN,
    QUALIFYING_FOLLOWERS, STARTING_FOLLOWERS, TERMINAL_ROUND, VIOLATION_SENTINEL,
};
pub use evaluator::DecisionEvaluator;
pub use gemini::{GeminiConnection, GeminiFactory};
pub use heuristic::{heuristic_score, JitterSource, UniformJitter};
pub use keypool::{KeyPoolClient, MAX_POOL_KEYS};
pub use keywords::{classify, Classification};
pub use parser::{parse_model_output, MalformedResponse, ParsedScore};
pub use prompt::build_prompt;
pub use router::{game_router, DecisionRequest, StartGameRequest};
pub use service::{DecisionOutcome, GameService, GameServiceError};
pub use store::{
    CsvScoreboard, InMemoryScoreboard, InMemorySessionStore, Scoreboard, ScoreboardEntry,
    ScoreboardError, SessionId, SessionStore, StoreError,
};
