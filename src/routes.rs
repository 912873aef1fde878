//! REST endpoints for enrollment sessions.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::info;
use uuid::Uuid;

use crate::enrollment::funds::{CATALOG, Fund};
use crate::enrollment::{DecisionWidget, EnrollmentState, InitOptions, prompts};
use crate::error::SessionError;
use crate::session::{Session, SessionRegistry};

/// Shared state for the enrollment routes.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
}

/// Body of `POST /api/enrollment/sessions`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub is_eligible: Option<bool>,
    #[serde(default)]
    pub current_age: Option<i32>,
}

/// Body of `POST /api/enrollment/sessions/{id}/messages`.
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

/// One assistant turn as seen by a client.
#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub session_id: Uuid,
    pub state: EnrollmentState,
    pub message: String,
    pub is_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widget: Option<DecisionWidget>,
}

impl TurnResponse {
    fn new(session_id: Uuid, state: EnrollmentState, message: String, is_complete: bool) -> Self {
        let widget = DecisionWidget::for_step(state.step);
        Self {
            session_id,
            state,
            message,
            is_complete,
            widget,
        }
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = match self {
            SessionError::NotFound { .. } => StatusCode::NOT_FOUND,
            SessionError::InvalidId(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(serde_json::json!({"error": self.to_string()}))).into_response()
    }
}

fn parse_id(raw: &str) -> Result<Uuid, SessionError> {
    Uuid::parse_str(raw).map_err(|_| SessionError::InvalidId(raw.to_string()))
}

/// Build the enrollment REST router.
pub fn enrollment_routes(registry: Arc<SessionRegistry>) -> Router {
    let state = AppState { registry };

    Router::new()
        .route("/health", get(health))
        .route("/api/enrollment/funds", get(list_funds))
        .route("/api/enrollment/sessions", post(create_session))
        .route(
            "/api/enrollment/sessions/{id}",
            get(get_session).delete(delete_session),
        )
        .route("/api/enrollment/sessions/{id}/messages", post(post_message))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "enrollment-assist"
    }))
}

// ── Catalog ─────────────────────────────────────────────────────────────

async fn list_funds() -> Json<&'static [Fund]> {
    let funds: &'static [Fund] = &CATALOG;
    Json(funds)
}

// ── Sessions ────────────────────────────────────────────────────────────

/// POST /api/enrollment/sessions
///
/// Starts a conversation and returns the greeting. An empty body is
/// treated as no seeded options.
async fn create_session(
    State(state): State<AppState>,
    body: Option<Json<CreateSessionRequest>>,
) -> impl IntoResponse {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let session = state
        .registry
        .create(InitOptions {
            is_eligible: request.is_eligible,
            current_age: request.current_age,
        })
        .await;

    let greeting = prompts::step_prompt(session.state.step, &session.state);
    let response = TurnResponse::new(session.id, session.state, greeting, false);
    (StatusCode::CREATED, Json(response))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Session>, SessionError> {
    let id = parse_id(&id)?;
    state
        .registry
        .get(id)
        .await
        .map(Json)
        .ok_or(SessionError::NotFound { id })
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, SessionError> {
    let id = parse_id(&id)?;
    if state.registry.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(SessionError::NotFound { id })
    }
}

/// POST /api/enrollment/sessions/{id}/messages
///
/// Feeds one utterance through the state machine.
async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<MessageRequest>,
) -> Result<Json<TurnResponse>, SessionError> {
    let id = parse_id(&id)?;
    let (session, transition) = state
        .registry
        .advance(id, &body.text)
        .await
        .ok_or(SessionError::NotFound { id })?;

    if transition.is_complete {
        info!(session_id = %id, step = %session.state.step, "Enrollment conversation finished");
    }

    Ok(Json(TurnResponse::new(
        session.id,
        transition.next_state,
        transition.message,
        transition.is_complete,
    )))
}
