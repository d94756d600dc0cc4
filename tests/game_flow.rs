//! End-to-end runs of the decision pipeline and round state machine through
//! the public service facade and HTTP router, with a scripted scoring backend
//! standing in for the external model.

mod common {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use creedsim::game::{
        BackendError, ConnectionFactory, DecisionEvaluator, GameService, InMemoryScoreboard,
        InMemorySessionStore, JitterSource, KeyPoolClient, ModelOutput, ScoringConnection,
    };

    /// Backend that replays one scripted reply per call, in order.
    #[derive(Clone, Default)]
    pub(super) struct ReplayFactory {
        replies: Arc<Mutex<Vec<Result<ModelOutput, BackendError>>>>,
    }

    impl ReplayFactory {
        pub(super) fn push_reply(&self, reply: Result<ModelOutput, BackendError>) {
            self.replies
                .lock()
                .expect("replies mutex poisoned")
                .push(reply);
        }
    }

    impl ConnectionFactory for ReplayFactory {
        type Connection = ReplayConnection;

        fn connect(&self, _api_key: &str) -> Result<ReplayConnection, BackendError> {
            Ok(ReplayConnection {
                replies: self.replies.clone(),
            })
        }
    }

    pub(super) struct ReplayConnection {
        replies: Arc<Mutex<Vec<Result<ModelOutput, BackendError>>>>,
    }

    impl ScoringConnection for ReplayConnection {
        async fn generate(
            &self,
            _model: &str,
            _prompt: &str,
        ) -> Result<ModelOutput, BackendError> {
            let mut replies = self.replies.lock().expect("replies mutex poisoned");
            if replies.is_empty() {
                return Err(BackendError::Transport("no scripted reply".to_string()));
            }
            replies.remove(0)
        }
    }

    pub(super) struct ZeroJitter;

    impl JitterSource for ZeroJitter {
        fn jitter(&self) -> i64 {
            0
        }
    }

    pub(super) type ReplayService =
        GameService<ReplayFactory, ZeroJitter, InMemorySessionStore, InMemoryScoreboard>;

    pub(super) fn service() -> (Arc<ReplayService>, ReplayFactory, Arc<InMemoryScoreboard>) {
        let factory = ReplayFactory::default();
        let pool = KeyPoolClient::new(
            vec!["key-1".to_string()],
            "replay-model",
            Duration::from_millis(200),
            factory.clone(),
        )
        .expect("pool builds");
        let scoreboard = Arc::new(InMemoryScoreboard::default());
        let service = Arc::new(GameService::new(
            DecisionEvaluator::with_jitter(pool, ZeroJitter),
            Arc::new(InMemorySessionStore::default()),
            scoreboard.clone(),
        ));
        (service, factory, scoreboard)
    }

    pub(super) fn reply(change: i64, comment: &str) -> Result<ModelOutput, BackendError> {
        Ok(ModelOutput::Plain(format!(
            "{{\"change\": {change}, \"comment\": \"{comment}\", \"tips\": []}}"
        )))
    }
}

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use common::*;
use creedsim::game::{
    game_router, BackendError, ModelOutput, Scoreboard, SessionPhase, FINAL_ROUND,
    STARTING_FOLLOWERS, TERMINAL_ROUND,
};
use serde_json::Value;
use tower::ServiceExt;

#[tokio::test]
async fn a_full_run_completes_after_ten_rounds() {
    let (service, factory, scoreboard) = service();
    for round in 0..FINAL_ROUND {
        factory.push_reply(reply(100, &format!("round {} verdict", round + 1)));
    }

    let (id, view) = service
        .start_game("Order of the Quiet River", "ada")
        .expect("game starts");
    assert_eq!(view.round, 1);

    for _ in 0..FINAL_ROUND {
        service
            .submit_decision(&id, "shelter travelers and teach the young")
            .await
            .expect("decision accepted");
    }

    let view = service.session_view(&id).expect("session present");
    assert_eq!(view.round, TERMINAL_ROUND);
    assert_eq!(view.phase, SessionPhase::Completed.label());
    assert_eq!(view.followers, STARTING_FOLLOWERS + 100 * FINAL_ROUND as i64);
    assert_eq!(view.history.len() as u32, FINAL_ROUND);

    let entries = scoreboard.entries().expect("entries readable");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].score, view.followers);
}

#[tokio::test]
async fn a_scripted_outage_falls_back_without_surfacing_errors() {
    let (service, factory, _scoreboard) = service();
    factory.push_reply(Err(BackendError::Transport("upstream down".to_string())));

    let (id, _) = service
        .start_game("Order of the Quiet River", "ada")
        .expect("game starts");

    let outcome = service
        .submit_decision(&id, "hold a charity festival")
        .await
        .expect("pipeline degrades internally");

    assert!(!outcome.result.violation);
    assert_eq!(outcome.result.comment, "heuristic fallback");
    // two positive keyword hits, zero jitter
    assert_eq!(outcome.result.change, 100);
    assert_eq!(outcome.session.round, 2);
}

#[tokio::test]
async fn a_mid_run_violation_ends_the_game_over_http() {
    let (service, factory, scoreboard) = service();
    factory.push_reply(reply(50, "fine"));
    factory.push_reply(Ok(ModelOutput::Plain(
        "{\"change\": -10000, \"comment\": \"the council bans your order\"}".to_string(),
    )));

    let (id, _) = service
        .start_game("Order of the Quiet River", "ada")
        .expect("game starts");
    let app = game_router(service.clone());

    let first = app
        .clone()
        .oneshot(decision_request(&id.0, "collect modest donations"))
        .await
        .expect("router responds");
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .clone()
        .oneshot(decision_request(&id.0, "a scheme the model dislikes"))
        .await
        .expect("router responds");
    assert_eq!(second.status(), StatusCode::OK);
    let body = to_bytes(second.into_body(), 1024 * 64)
        .await
        .expect("body readable");
    let value: Value = serde_json::from_slice(&body).expect("valid json");
    assert_eq!(value["result"]["violation"], true);
    assert_eq!(value["result"]["comment"], "the council bans your order");
    assert_eq!(value["session"]["followers"], 0);
    assert_eq!(value["session"]["phase"], "violated");

    let third = app
        .oneshot(decision_request(&id.0, "try again"))
        .await
        .expect("router responds");
    assert_eq!(third.status(), StatusCode::CONFLICT);

    assert!(scoreboard.entries().expect("entries readable").is_empty());
}

fn decision_request(session_id: &str, decision: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/api/v1/game/{session_id}/decision"))
        .header("content-type", "application/json")
        .body(Body::from(format!("{{\"decision\": \"{decision}\"}}")))
        .expect("request builds")
}
