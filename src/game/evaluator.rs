use tracing::warn;

use super::backend::{BackendError, ConnectionFactory};
use super::domain::{
    EvaluationContext, EvaluationResult, MODEL_CHANGE_MAX, MODEL_CHANGE_MIN, VIOLATION_SENTINEL,
};
use super::heuristic::{heuristic_score, JitterSource, UniformJitter};
use super::keypool::KeyPoolClient;
use super::keywords::classify;
use super::parser::{parse_model_output, MalformedResponse};
use super::prompt::build_prompt;

#[derive(Debug, thiserror::Error)]
pub(crate) enum EvaluationFailure {
    #[error(transparent)]
    Service(#[from] BackendError),
    #[error(transparent)]
    Parse(#[from] MalformedResponse),
}

/// Composes the keyword screen, key pool, parser, and heuristic fallback
/// into one infallible `evaluate` call.
pub struct DecisionEvaluator<F: ConnectionFactory, J: JitterSource = UniformJitter> {
    pool: KeyPoolClient<F>,
    jitter: J,
}

impl<F: ConnectionFactory> DecisionEvaluator<F, UniformJitter> {
    pub fn new(pool: KeyPoolClient<F>) -> Self {
        Self::with_jitter(pool, UniformJitter)
    }
}

impl<F: ConnectionFactory, J: JitterSource> DecisionEvaluator<F, J> {
    pub fn with_jitter(pool: KeyPoolClient<F>, jitter: J) -> Self {
        Self { pool, jitter }
    }

    /// Score one decision. Never fails: backend or parser trouble degrades
    /// to the heuristic scorer instead of surfacing to the caller.
    pub async fn evaluate(&self, decision: &str, context: &EvaluationContext) -> EvaluationResult {
        // Violations are settled locally; no prompt is ever sent for them.
        if classify(decision).violation {
            return EvaluationResult::violation("");
        }

        let prompt = build_prompt(decision, context);
        match self.score_remotely(&prompt).await {
            Ok(result) => result,
            Err(failure) => {
                warn!(error = %failure, "scoring degraded to heuristic fallback");
                heuristic_score(decision, &self.jitter)
            }
        }
    }

    async fn score_remotely(&self, prompt: &str) -> Result<EvaluationResult, EvaluationFailure> {
        let output = self.pool.score(prompt).await?;
        let parsed = parse_model_output(&output)?;

        if parsed.change <= VIOLATION_SENTINEL {
            let mut result = EvaluationResult::violation(parsed.comment);
            result.tips = parsed.tips;
            return Ok(result);
        }

        Ok(EvaluationResult::scored(
            parsed.change.clamp(MODEL_CHANGE_MIN, MODEL_CHANGE_MAX),
            parsed.comment,
            parsed.tips,
        ))
    }
}
