//! PrepMaster Orchestrator
//!
//! Manages the interview session state machine, the seams to the remote
//! content service, results aggregation, the HTTP API and WebSocket events.

pub mod api;
pub mod config;
pub mod curated;
pub mod error;
pub mod machine;
pub mod provider;
pub mod question;
pub mod results;
pub mod session;
pub mod websocket;

pub use api::{
    create_router, AnswerRequest, AppState, CatalogResponse, CustomSessionRequest, ErrorResponse,
    ResultsResponse, StatusResponse,
};
pub use config::{Config, GeneratorBackend, GeneratorConfig, CONFIG_FILE_NAME, MAX_QUESTION_COUNT};
pub use curated::{curated_questions, CURATED_DIFFICULTY, CURATED_ROLE, CURATED_TOPIC};
pub use error::{PrepError, Result, ServiceErrorKind};
pub use machine::Orchestrator;
pub use provider::{
    AnswerEvaluator, AnswerScorer, EvaluationRequest, EvaluationVerdict, GenerationRequest,
    QuestionGenerator, QuestionSetProvider, DEFAULT_REQUEST_TIMEOUT,
};
pub use question::{AnswerSource, Difficulty, Question, QuestionType, NO_ANSWER_PLACEHOLDER};
pub use results::{
    share_line, summarize, ResultsSummary, ScoreBand, ScoredItem, ScoredSummary, StudyItem,
    StudySummary,
};
pub use session::{Evaluation, Progress, Session, SessionMode, SessionState, SessionStatus};
pub use websocket::{EventBroadcaster, SessionEvent};
