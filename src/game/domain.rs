use serde::{Deserialize, Serialize};

/// Fixed change value reported for any violating decision.
pub const VIOLATION_SENTINEL: i64 = -10_000;

/// Bounds applied to model-reported follower changes.
pub const MODEL_CHANGE_MIN: i64 = -400;
pub const MODEL_CHANGE_MAX: i64 = 400;

/// Bounds applied to the heuristic fallback scorer.
pub const HEURISTIC_CHANGE_MIN: i64 = -150;
pub const HEURISTIC_CHANGE_MAX: i64 = 300;

/// Last round a player may submit a decision for.
pub const FINAL_ROUND: u32 = 10;

/// Round value marking a session as terminal.
pub const TERMINAL_ROUND: u32 = 11;

/// Followers a new religion starts with.
pub const STARTING_FOLLOWERS: i64 = 100;

/// Minimum final follower count required for a scoreboard entry.
pub const QUALIFYING_FOLLOWERS: i64 = 500;

pub(crate) const DEFAULT_VIOLATION_COMMENT: &str =
    "Your decree crossed a forbidden line. Authorities dissolve the faith overnight.";

/// Structured scoring outcome produced by the evaluation pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub violation: bool,
    pub change: i64,
    pub comment: String,
    pub tips: Vec<String>,
}

impl EvaluationResult {
    /// Fixed result for a violating decision, keeping any upstream comment.
    pub fn violation(comment: impl Into<String>) -> Self {
        let comment = comment.into();
        let comment = if comment.is_empty() {
            DEFAULT_VIOLATION_COMMENT.to_string()
        } else {
            comment
        };

        Self {
            violation: true,
            change: VIOLATION_SENTINEL,
            comment,
            tips: Vec::new(),
        }
    }

    pub fn scored(change: i64, comment: String, tips: Vec<String>) -> Self {
        Self {
            violation: false,
            change,
            comment,
            tips,
        }
    }
}

/// Read-only session snapshot handed to the scoring pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationContext {
    pub religion_name: String,
    pub round: u32,
    pub followers: i64,
}

/// One completed round, immutable once appended to the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: u32,
    pub decision: String,
    pub change: i64,
    pub comment: String,
    pub tips: Vec<String>,
}

/// Lifecycle of a session. Both terminal phases leave `round` at 11; the
/// phase distinguishes a clean finish from a violation ending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Active,
    Completed,
    Violated,
}

impl SessionPhase {
    pub fn label(&self) -> &'static str {
        match self {
            SessionPhase::Active => "active",
            SessionPhase::Completed => "completed",
            SessionPhase::Violated => "violated",
        }
    }
}

/// Per-player game state advanced one decision at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    religion_name: String,
    player: String,
    followers: i64,
    round: u32,
    phase: SessionPhase,
    history: Vec<RoundRecord>,
    last_feedback: Option<EvaluationResult>,
}

impl GameSession {
    pub fn new(religion_name: impl Into<String>, player: impl Into<String>) -> Self {
        Self {
            religion_name: religion_name.into(),
            player: player.into(),
            followers: STARTING_FOLLOWERS,
            round: 1,
            phase: SessionPhase::Active,
            history: Vec::new(),
            last_feedback: None,
        }
    }

    pub fn religion_name(&self) -> &str {
        &self.religion_name
    }

    pub fn player(&self) -> &str {
        &self.player
    }

    pub fn followers(&self) -> i64 {
        self.followers
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }

    pub fn history(&self) -> &[RoundRecord] {
        &self.history
    }

    pub fn last_feedback(&self) -> Option<&EvaluationResult> {
        self.last_feedback.as_ref()
    }

    pub fn context(&self) -> EvaluationContext {
        EvaluationContext {
            religion_name: self.religion_name.clone(),
            round: self.round,
            followers: self.followers,
        }
    }

    /// Consume an evaluation for the current round. Callers must have
    /// verified the session is active and the decision non-empty.
    pub fn apply_result(&mut self, decision: &str, result: &EvaluationResult) {
        debug_assert!(self.is_active(), "apply_result on terminal session");

        let record = RoundRecord {
            round: self.round,
            decision: decision.to_string(),
            change: result.change,
            comment: result.comment.clone(),
            tips: result.tips.clone(),
        };
        self.history.push(record);

        if result.violation {
            self.followers = 0;
            self.round = TERMINAL_ROUND;
            self.phase = SessionPhase::Violated;
        } else {
            self.followers = (self.followers + result.change).max(0);
            self.round += 1;
            if self.round > FINAL_ROUND {
                self.phase = SessionPhase::Completed;
            }
        }

        self.last_feedback = Some(result.clone());
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            religion_name: self.religion_name.clone(),
            player: self.player.clone(),
            followers: self.followers,
            round: self.round,
            phase: self.phase.label(),
            history: self.history.clone(),
            last_feedback: self.last_feedback.clone(),
        }
    }
}

/// Sanitized session representation for API responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub religion_name: String,
    pub player: String,
    pub followers: i64,
    pub round: u32,
    pub phase: &'static str,
    pub history: Vec<RoundRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_feedback: Option<EvaluationResult>,
}
