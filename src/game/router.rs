use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::backend::ConnectionFactory;
use super::heuristic::JitterSource;
use super::service::{GameService, GameServiceError};
use super::store::{Scoreboard, SessionId, SessionStore};

/// Router builder exposing the JSON game API.
pub fn game_router<F, J, S, B>(service: Arc<GameService<F, J, S, B>>) -> Router
where
    F: ConnectionFactory + 'static,
    J: JitterSource + 'static,
    S: SessionStore + 'static,
    B: Scoreboard + 'static,
{
    Router::new()
        .route("/api/v1/game", post(start_handler::<F, J, S, B>))
        .route(
            "/api/v1/game/:session_id",
            get(state_handler::<F, J, S, B>).delete(end_handler::<F, J, S, B>),
        )
        .route(
            "/api/v1/game/:session_id/decision",
            post(decision_handler::<F, J, S, B>),
        )
        .route("/api/v1/scoreboard", get(scoreboard_handler::<F, J, S, B>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct StartGameRequest {
    pub religion_name: String,
    #[serde(default)]
    pub player: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub decision: String,
}

pub(crate) async fn start_handler<F, J, S, B>(
    State(service): State<Arc<GameService<F, J, S, B>>>,
    axum::Json(request): axum::Json<StartGameRequest>,
) -> Response
where
    F: ConnectionFactory + 'static,
    J: JitterSource + 'static,
    S: SessionStore + 'static,
    B: Scoreboard + 'static,
{
    let player = request.player.as_deref().unwrap_or("");
    match service.start_game(&request.religion_name, player) {
        Ok((id, view)) => {
            let payload = json!({ "session_id": id.0, "session": view });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn decision_handler<F, J, S, B>(
    State(service): State<Arc<GameService<F, J, S, B>>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<DecisionRequest>,
) -> Response
where
    F: ConnectionFactory + 'static,
    J: JitterSource + 'static,
    S: SessionStore + 'static,
    B: Scoreboard + 'static,
{
    let id = SessionId(session_id);
    match service.submit_decision(&id, &request.decision).await {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn state_handler<F, J, S, B>(
    State(service): State<Arc<GameService<F, J, S, B>>>,
    Path(session_id): Path<String>,
) -> Response
where
    F: ConnectionFactory + 'static,
    J: JitterSource + 'static,
    S: SessionStore + 'static,
    B: Scoreboard + 'static,
{
    let id = SessionId(session_id);
    match service.session_view(&id) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn end_handler<F, J, S, B>(
    State(service): State<Arc<GameService<F, J, S, B>>>,
    Path(session_id): Path<String>,
) -> Response
where
    F: ConnectionFactory + 'static,
    J: JitterSource + 'static,
    S: SessionStore + 'static,
    B: Scoreboard + 'static,
{
    let id = SessionId(session_id);
    match service.end_game(&id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn scoreboard_handler<F, J, S, B>(
    State(service): State<Arc<GameService<F, J, S, B>>>,
) -> Response
where
    F: ConnectionFactory + 'static,
    J: JitterSource + 'static,
    S: SessionStore + 'static,
    B: Scoreboard + 'static,
{
    let entries = service.scoreboard_entries();
    (StatusCode::OK, axum::Json(entries)).into_response()
}

fn error_response(error: GameServiceError) -> Response {
    let status = match &error {
        GameServiceError::UnknownSession => StatusCode::NOT_FOUND,
        GameServiceError::EmptyInput => StatusCode::UNPROCESSABLE_ENTITY,
        GameServiceError::DecisionInFlight => StatusCode::CONFLICT,
        GameServiceError::InvalidState { .. } => StatusCode::CONFLICT,
        GameServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
