use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::game::backend::{
    BackendError, ConnectionFactory, ModelOutput, ScoringConnection,
};
use crate::game::domain::EvaluationContext;
use crate::game::evaluator::DecisionEvaluator;
use crate::game::heuristic::JitterSource;
use crate::game::keypool::KeyPoolClient;
use crate::game::service::GameService;
use crate::game::store::{InMemoryScoreboard, InMemorySessionStore};

/// What a scripted key does when its connection is exercised.
#[derive(Debug, Clone)]
pub(super) enum KeyBehavior {
    Fail(&'static str),
    Respond(ModelOutput),
    RespondAfter(Duration, ModelOutput),
}

/// Factory whose connections replay scripted behaviors, recording every
/// connect and generate call for assertions.
#[derive(Clone)]
pub(super) struct ScriptedFactory {
    behaviors: HashMap<String, KeyBehavior>,
    pub(super) connects: Arc<Mutex<Vec<String>>>,
    pub(super) attempts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedFactory {
    pub(super) fn new(behaviors: Vec<(&str, KeyBehavior)>) -> Self {
        Self {
            behaviors: behaviors
                .into_iter()
                .map(|(key, behavior)| (key.to_string(), behavior))
                .collect(),
            connects: Arc::new(Mutex::new(Vec::new())),
            attempts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(super) fn connect_log(&self) -> Vec<String> {
        self.connects.lock().expect("connect log poisoned").clone()
    }

    pub(super) fn attempt_log(&self) -> Vec<String> {
        self.attempts.lock().expect("attempt log poisoned").clone()
    }
}

impl ConnectionFactory for ScriptedFactory {
    type Connection = ScriptedConnection;

    fn connect(&self, api_key: &str) -> Result<ScriptedConnection, BackendError> {
        self.connects
            .lock()
            .expect("connect log poisoned")
            .push(api_key.to_string());

        let behavior = self
            .behaviors
            .get(api_key)
            .cloned()
            .unwrap_or(KeyBehavior::Fail("unscripted key"));

        Ok(ScriptedConnection {
            key: api_key.to_string(),
            behavior,
            attempts: self.attempts.clone(),
        })
    }
}

pub(super) struct ScriptedConnection {
    key: String,
    behavior: KeyBehavior,
    attempts: Arc<Mutex<Vec<String>>>,
}

impl ScoringConnection for ScriptedConnection {
    async fn generate(&self, _model: &str, _prompt: &str) -> Result<ModelOutput, BackendError> {
        self.attempts
            .lock()
            .expect("attempt log poisoned")
            .push(self.key.clone());

        match &self.behavior {
            KeyBehavior::Fail(message) => Err(BackendError::Transport(message.to_string())),
            KeyBehavior::Respond(output) => Ok(output.clone()),
            KeyBehavior::RespondAfter(delay, output) => {
                tokio::time::sleep(*delay).await;
                Ok(output.clone())
            }
        }
    }
}

/// Deterministic jitter so heuristic outputs can be asserted exactly.
pub(super) struct FixedJitter(pub(super) i64);

impl JitterSource for FixedJitter {
    fn jitter(&self) -> i64 {
        self.0
    }
}

pub(super) fn context() -> EvaluationContext {
    EvaluationContext {
        religion_name: "River Creed".to_string(),
        round: 2,
        followers: 180,
    }
}

pub(super) fn pool_with(
    behaviors: Vec<(&'static str, KeyBehavior)>,
) -> (KeyPoolClient<ScriptedFactory>, ScriptedFactory) {
    pool_with_timeout(behaviors, Duration::from_millis(500))
}

pub(super) fn pool_with_timeout(
    behaviors: Vec<(&'static str, KeyBehavior)>,
    per_call_timeout: Duration,
) -> (KeyPoolClient<ScriptedFactory>, ScriptedFactory) {
    // An unscripted key fails on use, so an empty script still yields a
    // valid pool that always degrades to the heuristic.
    let keys: Vec<String> = if behaviors.is_empty() {
        vec!["key-unscripted".to_string()]
    } else {
        behaviors.iter().map(|(key, _)| key.to_string()).collect()
    };
    let factory = ScriptedFactory::new(behaviors);
    let pool = KeyPoolClient::new(keys, "scripted-model", per_call_timeout, factory.clone())
        .expect("pool builds");
    (pool, factory)
}

pub(super) fn evaluator_with(
    behaviors: Vec<(&'static str, KeyBehavior)>,
) -> (
    DecisionEvaluator<ScriptedFactory, FixedJitter>,
    ScriptedFactory,
) {
    let (pool, factory) = pool_with(behaviors);
    (DecisionEvaluator::with_jitter(pool, FixedJitter(0)), factory)
}

pub(super) type ScriptedService =
    GameService<ScriptedFactory, FixedJitter, InMemorySessionStore, InMemoryScoreboard>;

pub(super) fn service_with(
    behaviors: Vec<(&'static str, KeyBehavior)>,
) -> (Arc<ScriptedService>, Arc<InMemoryScoreboard>) {
    let (evaluator, _factory) = evaluator_with(behaviors);
    let scoreboard = Arc::new(InMemoryScoreboard::default());
    let service = Arc::new(GameService::new(
        evaluator,
        Arc::new(InMemorySessionStore::default()),
        scoreboard.clone(),
    ));
    (service, scoreboard)
}

pub(super) fn scored_response(change: i64, comment: &str, tips: &[&str]) -> ModelOutput {
    let tips: Vec<String> = tips.iter().map(|tip| format!("\"{tip}\"")).collect();
    ModelOutput::Plain(format!(
        "{{\"change\": {change}, \"comment\": \"{comment}\", \"tips\": [{}]}}",
        tips.join(", ")
    ))
}
