//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use prepmaster_orchestrator::{
    create_router, AnswerEvaluator, AnswerScorer, AnswerSource, AppState, Config,
    EvaluationRequest, EvaluationVerdict, GenerationRequest, Orchestrator, PrepError, Question,
    QuestionGenerator, QuestionSetProvider, QuestionType, Result, ServiceErrorKind, SessionMode,
};

/// Builds `count` generated questions with ids `g1..gN`.
pub fn generated_questions(count: usize) -> Vec<Question> {
    (1..=count)
        .map(|i| Question {
            id: format!("g{i}"),
            text: format!("Generated question {i}?"),
            hint: format!("Hint {i}"),
            topic: "Testing".to_string(),
            question_type: if i % 2 == 0 {
                QuestionType::Code
            } else {
                QuestionType::Text
            },
            source: AnswerSource::Generated {
                answer: format!("Answer {i}"),
                example: format!("example_{i}()"),
            },
        })
        .collect()
}

/// Question generator with a fixed reply.
pub struct ScriptedGenerator {
    reply: std::result::Result<Vec<Question>, ServiceErrorKind>,
    delay: Duration,
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn returning(questions: Vec<Question>) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(questions),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(kind: ServiceErrorKind) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(kind),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn slow(questions: Vec<Question>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(questions),
            delay,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl QuestionGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<Question>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.reply {
            Ok(questions) => Ok(questions.clone()),
            Err(kind) => Err(PrepError::generation(*kind, "scripted failure")),
        }
    }
}

/// Answer evaluator that replays a queue of scores.
///
/// `Err` entries fail the call with that kind. An empty queue scores 7.
pub struct ScriptedEvaluator {
    replies: Mutex<VecDeque<std::result::Result<f64, ServiceErrorKind>>>,
    delay: Duration,
    pub requests: Mutex<Vec<EvaluationRequest>>,
}

impl ScriptedEvaluator {
    pub fn new(replies: Vec<std::result::Result<f64, ServiceErrorKind>>) -> Arc<Self> {
        Self::with_delay(replies, Duration::ZERO)
    }

    pub fn with_delay(
        replies: Vec<std::result::Result<f64, ServiceErrorKind>>,
        delay: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            delay,
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl AnswerEvaluator for ScriptedEvaluator {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationVerdict> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        let reply = self
            .replies
            .lock()
            .expect("replies lock")
            .pop_front()
            .unwrap_or(Ok(7.0));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match reply {
            Ok(score) => Ok(EvaluationVerdict {
                score,
                feedback: format!("Scored {score}"),
                ideal_answer: "The ideal answer.".to_string(),
            }),
            Err(kind) => Err(PrepError::evaluation(kind, "scripted failure")),
        }
    }
}

pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Study-mode orchestrator over a generator.
pub fn study_orchestrator(generator: Arc<ScriptedGenerator>, count: u32) -> Orchestrator {
    Orchestrator::new(
        QuestionSetProvider::new(generator, TEST_TIMEOUT),
        SessionMode::Study,
        count,
    )
}

/// Scored-mode orchestrator over a generator and evaluator.
pub fn scored_orchestrator(
    generator: Arc<ScriptedGenerator>,
    evaluator: Arc<ScriptedEvaluator>,
    count: u32,
) -> Orchestrator {
    Orchestrator::new(
        QuestionSetProvider::new(generator, TEST_TIMEOUT),
        SessionMode::Scored,
        count,
    )
    .with_scorer(AnswerScorer::new(evaluator, TEST_TIMEOUT))
}

/// Finds a free local port.
pub fn find_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

/// Serves the API for `orchestrator` and returns the base address (`127.0.0.1:PORT`).
pub async fn spawn_server(orchestrator: Arc<Orchestrator>) -> String {
    let addr = format!("127.0.0.1:{}", find_available_port());
    let router = create_router(AppState::new(Config::default(), orchestrator));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    // Give the server a moment to start
    tokio::time::sleep(Duration::from_millis(50)).await;
    addr
}
