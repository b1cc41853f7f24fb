//! Integration tests for the content service clients.
//!
//! A local axum server plays the remote service so the real HTTP clients can
//! be checked for request shape, response parsing and error classification.

mod support;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::Json;
use axum::Router;
use prepmaster_genai::{connect, ServiceBackend};
use prepmaster_orchestrator::{
    AnswerEvaluator, Difficulty, EvaluationRequest, GenerationRequest, GeneratorBackend,
    GeneratorConfig, Orchestrator, QuestionGenerator, QuestionSetProvider, QuestionType,
    ServiceErrorKind, SessionMode, SessionStatus,
};
use secrecy::SecretString;
use serde_json::{json, Value};
use support::find_available_port;

/// What the fake service saw for one request.
#[derive(Debug, Clone)]
struct Seen {
    path: String,
    api_key: Option<String>,
    authorization: Option<String>,
    body: Value,
}

#[derive(Clone)]
struct FakeService {
    status: StatusCode,
    reply: Value,
    delay: Duration,
    seen: Arc<Mutex<Vec<Seen>>>,
}

async fn handle(
    State(fake): State<FakeService>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    fake.seen.lock().expect("seen lock").push(Seen {
        path: uri.path().to_string(),
        api_key: header("x-goog-api-key"),
        authorization: header("authorization"),
        body,
    });
    if !fake.delay.is_zero() {
        tokio::time::sleep(fake.delay).await;
    }
    (fake.status, Json(fake.reply.clone()))
}

/// Starts a fake service and returns its base URL and request log.
async fn spawn_fake(
    status: StatusCode,
    reply: Value,
    delay: Duration,
) -> (String, Arc<Mutex<Vec<Seen>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let fake = FakeService {
        status,
        reply,
        delay,
        seen: Arc::clone(&seen),
    };
    let router = Router::new().fallback(handle).with_state(fake);

    let addr = format!("127.0.0.1:{}", find_available_port());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    (format!("http://{addr}"), seen)
}

fn config(backend: GeneratorBackend, base_url: &str) -> GeneratorConfig {
    GeneratorConfig {
        backend,
        model: match backend {
            GeneratorBackend::Gemini => "gemini-2.5-flash".to_string(),
            GeneratorBackend::OpenAi => "gpt-4o-mini".to_string(),
        },
        base_url: base_url.to_string(),
        api_key_env: "UNUSED".to_string(),
        request_timeout_secs: 1,
    }
}

fn backend(config: &GeneratorConfig) -> ServiceBackend {
    let service = connect(config, SecretString::from("test-key")).expect("client");
    ServiceBackend::new(service)
}

fn gemini_reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

fn openai_reply(content: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
    })
}

fn generation_request(topic: Option<&str>) -> GenerationRequest {
    GenerationRequest {
        role: "Systems Engineer".to_string(),
        topic: topic.map(str::to_string),
        difficulty: Difficulty::Expert,
        count: 2,
        include_answers: true,
    }
}

fn evaluation_request() -> EvaluationRequest {
    EvaluationRequest {
        question_text: "Explain ownership.".to_string(),
        question_type: QuestionType::Text,
        reference_answer: Some("Each value has one owner.".to_string()),
        user_answer: "Values are dropped when the owner goes out of scope.".to_string(),
        role: "Systems Engineer".to_string(),
        difficulty: Difficulty::Expert,
    }
}

const TWO_QUESTIONS: &str = r#"```json
[
  {"id": "1", "text": "What is a lifetime?", "hint": "Borrows", "topic": "Rust",
   "answer": "A scope for which a reference is valid.", "example": "fn f<'a>(x: &'a str) {}"},
  {"id": "2", "text": "What does Send mean?", "hint": "Threads", "topic": "Rust",
   "answer": "The type can move to another thread.", "example": "std::thread::spawn(move || x)"}
]
```"#;

// ============================================================================
// Gemini
// ============================================================================

#[tokio::test]
async fn test_gemini_generates_questions() {
    let (base_url, seen) =
        spawn_fake(StatusCode::OK, gemini_reply(TWO_QUESTIONS), Duration::ZERO).await;
    let backend = backend(&config(GeneratorBackend::Gemini, &base_url));

    let questions = backend
        .generate(&generation_request(Some("Rust")))
        .await
        .expect("generate");
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0].id, "1");
    assert_eq!(
        questions[1].resolved_answer(),
        "The type can move to another thread."
    );

    let seen = seen.lock().expect("lock");
    assert_eq!(seen[0].path, "/v1beta/models/gemini-2.5-flash:generateContent");
    assert_eq!(seen[0].api_key.as_deref(), Some("test-key"));
    let body = &seen[0].body;
    assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    assert_eq!(body["generationConfig"]["responseSchema"]["type"], "ARRAY");
    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .expect("prompt text");
    assert!(prompt.contains("Generate 2 Expert level interview questions"));
    assert!(prompt.contains("focusing specifically on Rust"));
}

#[tokio::test]
async fn test_gemini_rate_limit() {
    let (base_url, _) = spawn_fake(
        StatusCode::TOO_MANY_REQUESTS,
        json!({"error": {"code": 429, "message": "Resource exhausted"}}),
        Duration::ZERO,
    )
    .await;
    let backend = backend(&config(GeneratorBackend::Gemini, &base_url));

    let err = backend
        .generate(&generation_request(None))
        .await
        .expect_err("rate limited");
    assert!(err.is_generation_failure());
    assert_eq!(err.service_kind(), Some(ServiceErrorKind::RateLimit));
    assert!(err.to_string().contains("Resource exhausted"));
}

#[tokio::test]
async fn test_server_error_body_is_truncated() {
    let (base_url, _) = spawn_fake(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!("x".repeat(4000)),
        Duration::ZERO,
    )
    .await;
    let backend = backend(&config(GeneratorBackend::Gemini, &base_url));

    let err = backend
        .generate(&generation_request(None))
        .await
        .expect_err("server error");
    assert_eq!(err.service_kind(), Some(ServiceErrorKind::Server));
    let message = err.to_string();
    assert!(message.contains("HTTP 500"));
    assert!(message.contains(&"x".repeat(100)));
    assert!(message.len() < 1500);
}

#[tokio::test]
async fn test_gemini_empty_candidates() {
    let (base_url, _) = spawn_fake(StatusCode::OK, json!({"candidates": []}), Duration::ZERO).await;
    let backend = backend(&config(GeneratorBackend::Gemini, &base_url));

    let err = backend
        .generate(&generation_request(None))
        .await
        .expect_err("empty");
    assert_eq!(err.service_kind(), Some(ServiceErrorKind::EmptyResponse));
}

#[tokio::test]
async fn test_gemini_evaluates_answer() {
    let (base_url, seen) = spawn_fake(
        StatusCode::OK,
        gemini_reply(r#"{"score": 7, "feedback": "Mostly right.", "idealAnswer": "Each value has one owner."}"#),
        Duration::ZERO,
    )
    .await;
    let backend = backend(&config(GeneratorBackend::Gemini, &base_url));

    let verdict = backend
        .evaluate(&evaluation_request())
        .await
        .expect("evaluate");
    assert!((verdict.score - 7.0).abs() < f64::EPSILON);
    assert_eq!(verdict.feedback, "Mostly right.");

    let seen = seen.lock().expect("lock");
    let prompt = seen[0].body["contents"][0]["parts"][0]["text"]
        .as_str()
        .expect("prompt text");
    assert!(prompt.contains("treat as ground truth"));
    assert_eq!(seen[0].body["generationConfig"]["responseSchema"]["type"], "OBJECT");
}

// ============================================================================
// OpenAI-compatible
// ============================================================================

#[tokio::test]
async fn test_openai_evaluates_answer() {
    let (base_url, seen) = spawn_fake(
        StatusCode::OK,
        openai_reply(r#"{"score": "9", "feedback": "Great.", "ideal_answer": "Ownership rules."}"#),
        Duration::ZERO,
    )
    .await;
    let backend = backend(&config(GeneratorBackend::OpenAi, &base_url));

    let verdict = backend
        .evaluate(&evaluation_request())
        .await
        .expect("evaluate");
    assert!((verdict.score - 9.0).abs() < f64::EPSILON);
    assert_eq!(verdict.ideal_answer, "Ownership rules.");

    let seen = seen.lock().expect("lock");
    assert_eq!(seen[0].path, "/v1/chat/completions");
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer test-key"));
    assert_eq!(seen[0].body["model"], "gpt-4o-mini");
    assert_eq!(seen[0].body["messages"][0]["role"], "system");
    let user = seen[0].body["messages"][1]["content"]
        .as_str()
        .expect("user message");
    assert!(user.contains("The reply must be JSON matching this schema"));
}

#[tokio::test]
async fn test_openai_generates_questions() {
    let (base_url, _) =
        spawn_fake(StatusCode::OK, openai_reply(TWO_QUESTIONS), Duration::ZERO).await;
    let backend = backend(&config(GeneratorBackend::OpenAi, &base_url));

    let questions = backend
        .generate(&generation_request(None))
        .await
        .expect("generate");
    assert_eq!(questions.len(), 2);
}

#[tokio::test]
async fn test_openai_unauthorized() {
    let (base_url, _) = spawn_fake(
        StatusCode::UNAUTHORIZED,
        json!({"error": {"message": "Incorrect API key provided"}}),
        Duration::ZERO,
    )
    .await;
    let backend = backend(&config(GeneratorBackend::OpenAi, &base_url));

    let err = backend
        .evaluate(&evaluation_request())
        .await
        .expect_err("unauthorized");
    assert!(err.is_evaluation_failure());
    assert_eq!(err.service_kind(), Some(ServiceErrorKind::Authentication));
}

// ============================================================================
// Transport failures
// ============================================================================

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let base_url = format!("http://127.0.0.1:{}", find_available_port());
    let backend = backend(&config(GeneratorBackend::Gemini, &base_url));

    let err = backend
        .generate(&generation_request(None))
        .await
        .expect_err("nothing listening");
    assert_eq!(err.service_kind(), Some(ServiceErrorKind::Network));
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let (base_url, _) = spawn_fake(
        StatusCode::OK,
        gemini_reply(TWO_QUESTIONS),
        Duration::from_secs(3),
    )
    .await;
    let backend = backend(&config(GeneratorBackend::Gemini, &base_url));

    let err = backend
        .generate(&generation_request(None))
        .await
        .expect_err("timed out");
    assert_eq!(err.service_kind(), Some(ServiceErrorKind::Timeout));
}

// ============================================================================
// Through the orchestrator
// ============================================================================

#[tokio::test]
async fn test_orchestrator_with_gemini_backend() {
    let (base_url, _) =
        spawn_fake(StatusCode::OK, gemini_reply(TWO_QUESTIONS), Duration::ZERO).await;
    let backend = Arc::new(backend(&config(GeneratorBackend::Gemini, &base_url)));
    let orchestrator = Orchestrator::new(
        QuestionSetProvider::new(backend, Duration::from_secs(5)),
        SessionMode::Study,
        2,
    );

    let state = orchestrator
        .start_custom("Systems Engineer", "Rust", Difficulty::Expert)
        .await
        .expect("start");
    assert_eq!(state.status, SessionStatus::Interviewing);
    let session = state.session.as_ref().expect("session");
    assert_eq!(session.questions.len(), 2);
    assert_eq!(
        session.current_question().map(|q| q.text.as_str()),
        Some("What is a lifetime?")
    );
}

#[tokio::test]
async fn test_study_session_rejects_questions_without_answers() {
    let reply = r#"[{"id": "1", "text": "What is a lifetime?", "hint": "Borrows", "topic": "Rust"}]"#;
    let (base_url, _) = spawn_fake(StatusCode::OK, gemini_reply(reply), Duration::ZERO).await;
    let backend = Arc::new(backend(&config(GeneratorBackend::Gemini, &base_url)));
    let orchestrator = Orchestrator::new(
        QuestionSetProvider::new(backend, Duration::from_secs(5)),
        SessionMode::Study,
        1,
    );

    let err = orchestrator
        .start_custom("Systems Engineer", "Rust", Difficulty::Expert)
        .await
        .expect_err("answers were requested");
    assert_eq!(err.service_kind(), Some(ServiceErrorKind::InvalidResponse));

    let state = orchestrator.snapshot().await;
    assert_eq!(state.status, SessionStatus::Error);
    assert!(state.session.is_none());
}
