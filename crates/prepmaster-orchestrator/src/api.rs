//! HTTP API endpoints for the PrepMaster orchestrator.
//!
//! # Endpoints
//!
//! - `GET /api/status` - Current session snapshot
//! - `GET /api/catalog` - Suggested roles, topics and difficulties
//! - `POST /api/session/custom` - Start a generated session
//! - `POST /api/session/curated` - Start the curated session
//! - `POST /api/session/advance` - Next question (study mode)
//! - `POST /api/session/answer` - Submit an answer (scored mode)
//! - `POST /api/session/restart` - Back to idle
//! - `GET /api/session/results` - Results of a completed session
//! - `GET /ws` - Event stream
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use prepmaster_orchestrator::{
//!     create_router, AppState, Config, Orchestrator, QuestionSetProvider, SessionMode,
//! };
//!
//! # async fn example() {
//! let config = Config::default();
//! let orchestrator = Orchestrator::new(
//!     QuestionSetProvider::curated_only(),
//!     SessionMode::Study,
//!     config.question_count,
//! );
//! let router = create_router(AppState::new(config, Arc::new(orchestrator)));
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//! axum::serve(listener, router).await.unwrap();
//! # }
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::curated::{SAMPLE_ROLES, SAMPLE_TOPICS};
use crate::error::PrepError;
use crate::machine::Orchestrator;
use crate::question::Difficulty;
use crate::results::{share_line, ResultsSummary, ScoreBand};
use crate::session::{Progress, Session, SessionMode, SessionState};
use crate::websocket::ws_handler;
use crate::Config;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for `POST /api/session/custom`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomSessionRequest {
    /// Job role to practice for.
    pub role: String,
    /// Topic to focus on; empty or missing means core competencies.
    #[serde(default)]
    pub topic: String,
    /// Seniority level.
    #[serde(default)]
    pub difficulty: Difficulty,
}

/// Request body for `POST /api/session/answer`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRequest {
    /// The candidate's answer.
    pub answer: String,
}

/// Snapshot returned by every session endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// The `(status, session, last_error)` triple.
    #[serde(flatten)]
    pub state: SessionState,
    /// Position within the session, if one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    /// Study or scored.
    pub mode: SessionMode,
}

/// Response body for `GET /api/catalog`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResponse {
    /// Suggested job roles.
    pub roles: Vec<String>,
    /// Suggested topics.
    pub topics: Vec<String>,
    /// Available difficulties, ascending.
    pub difficulties: Vec<Difficulty>,
    /// Study or scored.
    pub mode: SessionMode,
    /// Questions requested per custom session.
    pub question_count: u32,
    /// Whether custom sessions are available.
    pub can_generate: bool,
    /// Model behind custom sessions, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Response body for `GET /api/session/results`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsResponse {
    /// The completed session.
    pub session: Session,
    /// Aggregated results.
    pub summary: ResultsSummary,
    /// Display band for the average score.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band: Option<ScoreBand>,
    /// Shareable one-liner for the average score.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_line: Option<String>,
}

/// Error response body returned on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Description of the error.
    pub error: String,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the HTTP server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Configuration the server was started with.
    pub config: Arc<Config>,
    /// The session state machine.
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Creates a new `AppState`.
    #[must_use]
    pub fn new(config: Config, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator,
        }
    }
}

impl FromRef<AppState> for Arc<Orchestrator> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.orchestrator)
    }
}

// ============================================================================
// API Error Type
// ============================================================================

/// Maps orchestrator errors to HTTP responses.
#[derive(Debug)]
struct ApiError(PrepError);

impl From<PrepError> for ApiError {
    fn from(err: PrepError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PrepError::ValidationFailure { .. } => StatusCode::BAD_REQUEST,
            PrepError::InvalidStateTransition { .. }
            | PrepError::ResultsNotReady { .. }
            | PrepError::SessionDiscarded => StatusCode::CONFLICT,
            PrepError::GenerationFailure { .. } | PrepError::EvaluationFailure { .. } => {
                StatusCode::BAD_GATEWAY
            }
            PrepError::ConfigParseError { .. }
            | PrepError::ConfigValidationError { .. }
            | PrepError::Io(_)
            | PrepError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            warn!(status = %status, error = %self.0, "Request failed");
        }

        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the HTTP router with all API endpoints, the `/ws` event stream,
/// CORS for development and request tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/status", get(handle_status))
        .route("/catalog", get(handle_catalog))
        .route("/session/custom", post(handle_start_custom))
        .route("/session/curated", post(handle_start_curated))
        .route("/session/advance", post(handle_advance))
        .route("/session/answer", post(handle_answer))
        .route("/session/restart", post(handle_restart))
        .route("/session/results", get(handle_results));

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

fn status_response(state: &AppState, snapshot: SessionState) -> Json<StatusResponse> {
    Json(StatusResponse {
        progress: snapshot.progress(),
        state: snapshot,
        mode: state.orchestrator.mode(),
    })
}

/// Handler for `GET /api/status`.
async fn handle_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let snapshot = state.orchestrator.snapshot().await;
    status_response(&state, snapshot)
}

/// Handler for `GET /api/catalog`.
async fn handle_catalog(State(state): State<AppState>) -> Json<CatalogResponse> {
    Json(CatalogResponse {
        roles: SAMPLE_ROLES.iter().map(ToString::to_string).collect(),
        topics: SAMPLE_TOPICS.iter().map(ToString::to_string).collect(),
        difficulties: Difficulty::ALL.to_vec(),
        mode: state.orchestrator.mode(),
        question_count: state.orchestrator.question_count(),
        can_generate: state.orchestrator.can_generate(),
        model: state
            .orchestrator
            .can_generate()
            .then(|| state.config.generator.model.clone()),
    })
}

/// Handler for `POST /api/session/custom`.
async fn handle_start_custom(
    State(state): State<AppState>,
    Json(request): Json<CustomSessionRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    info!(
        role = %request.role,
        topic = %request.topic,
        difficulty = %request.difficulty,
        "Custom session requested"
    );
    let snapshot = state
        .orchestrator
        .start_custom(&request.role, &request.topic, request.difficulty)
        .await?;
    Ok(status_response(&state, snapshot))
}

/// Handler for `POST /api/session/curated`.
async fn handle_start_curated(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, ApiError> {
    let snapshot = state.orchestrator.start_curated().await?;
    Ok(status_response(&state, snapshot))
}

/// Handler for `POST /api/session/advance`.
async fn handle_advance(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let snapshot = state.orchestrator.advance().await?;
    Ok(status_response(&state, snapshot))
}

/// Handler for `POST /api/session/answer`.
async fn handle_answer(
    State(state): State<AppState>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let snapshot = state.orchestrator.submit_answer(&request.answer).await?;
    Ok(status_response(&state, snapshot))
}

/// Handler for `POST /api/session/restart`.
async fn handle_restart(State(state): State<AppState>) -> Json<StatusResponse> {
    let snapshot = state.orchestrator.restart().await;
    status_response(&state, snapshot)
}

/// Handler for `GET /api/session/results`.
async fn handle_results(
    State(state): State<AppState>,
) -> Result<Json<ResultsResponse>, ApiError> {
    let (session, summary) = state.orchestrator.results().await?;
    let average = summary.average_score();
    Ok(Json(ResultsResponse {
        session,
        band: average.map(ScoreBand::from_score),
        share_line: average.map(share_line),
        summary,
    }))
}

// ============================================================================
// Tests
// ============================================================================
