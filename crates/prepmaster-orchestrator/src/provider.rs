//! Seams to the remote content service.
//!
//! [`QuestionGenerator`] and [`AnswerEvaluator`] are implemented by the
//! service clients. [`QuestionSetProvider`] and [`AnswerScorer`] wrap them
//! with the timeout and the validation every result must pass before it
//! reaches the state machine.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::curated::curated_questions;
use crate::error::{PrepError, Result, ServiceErrorKind};
use crate::question::{Difficulty, Question, QuestionType};
use crate::session::{validate_question_set, Evaluation};

/// Default bound on every remote call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Lowest and highest score an evaluation may carry.
pub const SCORE_RANGE: std::ops::RangeInclusive<u8> = 1..=10;

// ============================================================================
// Question generation
// ============================================================================

/// Parameters for a question set request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Job role the questions target.
    pub role: String,
    /// Topic to focus on; `None` means core competencies.
    pub topic: Option<String>,
    /// Seniority level.
    pub difficulty: Difficulty,
    /// Number of questions wanted.
    pub count: u32,
    /// Ask the service for a direct answer and example with every question.
    pub include_answers: bool,
}

/// Produces question sets from a remote content service.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Requests a question set.
    ///
    /// Implementations report every failure as `PrepError::GenerationFailure`.
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<Question>>;
}

/// Supplies ordered question sets, either generated or curated.
#[derive(Clone)]
pub struct QuestionSetProvider {
    generator: Option<Arc<dyn QuestionGenerator>>,
    timeout: Duration,
}

impl std::fmt::Debug for QuestionSetProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestionSetProvider")
            .field("generator", &self.generator.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl QuestionSetProvider {
    /// Creates a provider backed by a content service.
    #[must_use]
    pub fn new(generator: Arc<dyn QuestionGenerator>, timeout: Duration) -> Self {
        Self {
            generator: Some(generator),
            timeout,
        }
    }

    /// Creates a provider that can only serve the curated set.
    #[must_use]
    pub const fn curated_only() -> Self {
        Self {
            generator: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Returns `true` if custom sessions can be generated.
    #[must_use]
    pub const fn can_generate(&self) -> bool {
        self.generator.is_some()
    }

    /// Requests a question set, preserving the order received.
    ///
    /// # Errors
    ///
    /// Returns `PrepError::ValidationFailure` if `count` is zero.
    ///
    /// Returns `PrepError::GenerationFailure` if no service is configured, the
    /// call fails or times out, or the result is empty, has duplicate ids or
    /// blank question text.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Vec<Question>> {
        if request.count == 0 {
            return Err(PrepError::validation("question count must be greater than 0"));
        }

        let Some(generator) = &self.generator else {
            return Err(PrepError::generation(
                ServiceErrorKind::Authentication,
                "no content service is configured",
            ));
        };

        let questions = match tokio::time::timeout(self.timeout, generator.generate(request)).await
        {
            Ok(Ok(questions)) => questions,
            Ok(Err(e)) if e.is_generation_failure() => return Err(e),
            Ok(Err(e)) => return Err(PrepError::generation(ServiceErrorKind::Other, e.to_string())),
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "Question generation timed out");
                return Err(PrepError::generation(
                    ServiceErrorKind::Timeout,
                    format!("no response within {}s", self.timeout.as_secs()),
                ));
            }
        };

        validate_question_set(&questions)
            .map_err(|e| PrepError::generation(ServiceErrorKind::InvalidResponse, e.to_string()))?;
        if let Some(blank) = questions.iter().find(|q| q.text.trim().is_empty()) {
            return Err(PrepError::generation(
                ServiceErrorKind::InvalidResponse,
                format!("question '{}' has no text", blank.id),
            ));
        }

        debug!(
            requested = request.count,
            received = questions.len(),
            "Question set generated"
        );
        Ok(questions)
    }

    /// Returns the curated question set. Never fails.
    #[must_use]
    pub fn curated(&self) -> Vec<Question> {
        curated_questions()
    }
}

// ============================================================================
// Answer evaluation
// ============================================================================

/// Parameters for scoring one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRequest {
    /// The question as asked.
    pub question_text: String,
    /// Expected answer shape.
    pub question_type: QuestionType,
    /// Curated ground truth, when the question has one.
    pub reference_answer: Option<String>,
    /// The candidate's answer.
    pub user_answer: String,
    /// Job role the session targets.
    pub role: String,
    /// Seniority level.
    pub difficulty: Difficulty,
}

/// Raw verdict from the evaluation service, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationVerdict {
    /// Score as returned; may be fractional or out of range.
    pub score: f64,
    /// Feedback on the answer.
    pub feedback: String,
    /// What a strong answer would have said.
    pub ideal_answer: String,
}

/// Scores answers through a remote evaluation service.
#[async_trait]
pub trait AnswerEvaluator: Send + Sync {
    /// Requests a verdict for one answer.
    ///
    /// Implementations report every failure as `PrepError::EvaluationFailure`.
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationVerdict>;
}

/// Turns verdicts from an [`AnswerEvaluator`] into validated [`Evaluation`]s.
#[derive(Clone)]
pub struct AnswerScorer {
    evaluator: Arc<dyn AnswerEvaluator>,
    timeout: Duration,
}

impl std::fmt::Debug for AnswerScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerScorer")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AnswerScorer {
    /// Creates a scorer backed by an evaluation service.
    #[must_use]
    pub fn new(evaluator: Arc<dyn AnswerEvaluator>, timeout: Duration) -> Self {
        Self { evaluator, timeout }
    }

    /// Scores `user_answer` against `question`.
    ///
    /// A curated model answer is passed along as ground truth; otherwise the
    /// service synthesizes its own reference.
    ///
    /// # Errors
    ///
    /// Returns `PrepError::ValidationFailure` for a blank answer.
    ///
    /// Returns `PrepError::EvaluationFailure` if the call fails or times out,
    /// the score is outside 1 to 10, or feedback or ideal answer is blank.
    pub async fn evaluate(
        &self,
        question: &Question,
        user_answer: &str,
        role: &str,
        difficulty: Difficulty,
    ) -> Result<Evaluation> {
        if user_answer.trim().is_empty() {
            return Err(PrepError::validation("answer must not be empty"));
        }

        let request = EvaluationRequest {
            question_text: question.text.clone(),
            question_type: question.question_type,
            reference_answer: question.model_answer().map(str::to_string),
            user_answer: user_answer.to_string(),
            role: role.to_string(),
            difficulty,
        };

        let verdict = match tokio::time::timeout(self.timeout, self.evaluator.evaluate(&request))
            .await
        {
            Ok(Ok(verdict)) => verdict,
            Ok(Err(e)) if e.is_evaluation_failure() => return Err(e),
            Ok(Err(e)) => return Err(PrepError::evaluation(ServiceErrorKind::Other, e.to_string())),
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), question_id = %question.id, "Answer evaluation timed out");
                return Err(PrepError::evaluation(
                    ServiceErrorKind::Timeout,
                    format!("no response within {}s", self.timeout.as_secs()),
                ));
            }
        };

        let score = normalize_score(verdict.score)?;
        if verdict.feedback.trim().is_empty() {
            return Err(PrepError::evaluation(
                ServiceErrorKind::InvalidResponse,
                "evaluation has no feedback",
            ));
        }
        if verdict.ideal_answer.trim().is_empty() {
            return Err(PrepError::evaluation(
                ServiceErrorKind::InvalidResponse,
                "evaluation has no ideal answer",
            ));
        }

        Ok(Evaluation::new(
            question.id.clone(),
            score,
            verdict.feedback,
            verdict.ideal_answer,
            user_answer,
        ))
    }
}

/// Validates a raw score and rounds it to the nearest integer.
fn normalize_score(raw: f64) -> Result<u8> {
    let (low, high) = (f64::from(*SCORE_RANGE.start()), f64::from(*SCORE_RANGE.end()));
    if !raw.is_finite() || raw < low || raw > high {
        return Err(PrepError::evaluation(
            ServiceErrorKind::InvalidResponse,
            format!("score {raw} is outside {low}..={high}"),
        ));
    }
    // in range, so the cast is exact after rounding
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let score = raw.round() as u8;
    Ok(score)
}
