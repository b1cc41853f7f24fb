//! Session state types for the PrepMaster orchestrator.
//!
//! This module defines the state machine types for tracking a practice
//! session: its status, the fixed question list, the current position and
//! the evaluations collected in scored mode.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};
use crate::question::{Difficulty, Question};

// ============================================================================
// SessionStatus
// ============================================================================

/// Current status of the orchestrator.
///
/// The status transitions through these states:
/// - `Idle` -> `GeneratingQuestions` -> `Interviewing` (custom start)
/// - `Idle` -> `Interviewing` (curated start)
/// - `GeneratingQuestions` -> `Error` (generation failed)
/// - `Interviewing` <-> `Evaluating` (scored answers)
/// - `Interviewing` / `Evaluating` -> `Results` (last question done)
/// - any -> `Idle` (restart)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No session.
    #[default]
    Idle,
    /// Waiting on the content service for a question set.
    GeneratingQuestions,
    /// A question is on screen.
    Interviewing,
    /// Waiting on the content service to score an answer.
    Evaluating,
    /// Every question has been handled.
    Results,
    /// Question generation failed; only a restart is accepted.
    Error,
}

impl SessionStatus {
    /// Returns `true` while a remote call is in flight.
    ///
    /// # Examples
    ///
    /// ```
    /// use prepmaster_orchestrator::SessionStatus;
    ///
    /// assert!(SessionStatus::Evaluating.is_busy());
    /// assert!(!SessionStatus::Interviewing.is_busy());
    /// ```
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::GeneratingQuestions | Self::Evaluating)
    }

    /// Returns `true` if a session must exist in this status.
    #[must_use]
    pub const fn has_session(&self) -> bool {
        matches!(self, Self::Interviewing | Self::Evaluating | Self::Results)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::GeneratingQuestions => write!(f, "generating questions"),
            Self::Interviewing => write!(f, "interviewing"),
            Self::Evaluating => write!(f, "evaluating"),
            Self::Results => write!(f, "showing results"),
            Self::Error => write!(f, "in error"),
        }
    }
}

// ============================================================================
// SessionMode
// ============================================================================

/// How the user works through the questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Questions are read and answers revealed; nothing is scored.
    #[default]
    Study,
    /// Every answer is submitted for scoring.
    Scored,
}

impl SessionMode {
    /// Maps the `evaluationMode` configuration flag to a mode.
    #[must_use]
    pub const fn from_evaluation_flag(evaluation_mode: bool) -> Self {
        if evaluation_mode {
            Self::Scored
        } else {
            Self::Study
        }
    }
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Study => write!(f, "study"),
            Self::Scored => write!(f, "scored"),
        }
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// The score and feedback for one answered question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    /// Id of the question this evaluation belongs to.
    pub question_id: String,

    /// Score from 1 to 10.
    pub score: u8,

    /// Feedback on the answer.
    pub feedback: String,

    /// What a strong answer would have said.
    pub ideal_answer: String,

    /// The answer as submitted.
    pub user_answer: String,

    /// When the evaluation was recorded.
    pub evaluated_at: DateTime<Utc>,
}

impl Evaluation {
    /// Creates a new `Evaluation` stamped with the current time.
    #[must_use]
    pub fn new(
        question_id: impl Into<String>,
        score: u8,
        feedback: impl Into<String>,
        ideal_answer: impl Into<String>,
        user_answer: impl Into<String>,
    ) -> Self {
        Self {
            question_id: question_id.into(),
            score,
            feedback: feedback.into(),
            ideal_answer: ideal_answer.into(),
            user_answer: user_answer.into(),
            evaluated_at: Utc::now(),
        }
    }
}

// ============================================================================
// Progress
// ============================================================================

/// Position within a session, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// 1-based number of the question on screen (equals `total` once complete).
    pub current: usize,
    /// Number of questions in the session.
    pub total: usize,
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Question {} of {}", self.current, self.total)
    }
}

// ============================================================================
// Session
// ============================================================================

/// A practice session over a fixed list of questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Topic the questions focus on (empty for core competencies).
    pub topic: String,

    /// Job role the session targets.
    pub job_role: String,

    /// Seniority level.
    pub difficulty: Difficulty,

    /// Study or scored.
    pub mode: SessionMode,

    /// The questions, in presentation order.
    pub questions: Vec<Question>,

    /// Evaluations keyed by question id. Only populated in scored mode.
    pub evaluations: BTreeMap<String, Evaluation>,

    /// Index of the question on screen; equals `questions.len()` once complete.
    pub current_question_index: usize,

    /// When the session started.
    pub started_at: DateTime<Utc>,

    /// When the session was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Creates a session positioned at the first question.
    ///
    /// # Errors
    ///
    /// Returns `PrepError::ValidationFailure` if `questions` is empty or
    /// contains duplicate ids.
    pub fn new(
        topic: impl Into<String>,
        job_role: impl Into<String>,
        difficulty: Difficulty,
        mode: SessionMode,
        questions: Vec<Question>,
    ) -> Result<Self> {
        validate_question_set(&questions)?;
        let now = Utc::now();
        Ok(Self {
            topic: topic.into(),
            job_role: job_role.into(),
            difficulty,
            mode,
            questions,
            evaluations: BTreeMap::new(),
            current_question_index: 0,
            started_at: now,
            updated_at: now,
        })
    }

    /// Returns the question on screen, or `None` once complete.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_question_index)
    }

    /// Returns `true` once every question has been handled.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.current_question_index >= self.questions.len()
    }

    /// Moves to the next question. Returns `true` if the session is now complete.
    ///
    /// # Errors
    ///
    /// Returns `PrepError::ValidationFailure` if the session is already complete.
    pub fn advance(&mut self) -> Result<bool> {
        if self.is_complete() {
            return Err(PrepError::validation("session has no remaining questions"));
        }
        self.current_question_index += 1;
        self.touch();
        Ok(self.is_complete())
    }

    /// Records an evaluation for the current question and moves past it.
    ///
    /// Returns `true` if the session is now complete.
    ///
    /// # Errors
    ///
    /// Returns `PrepError::ValidationFailure` if the evaluation is not for the
    /// current question, or that question was already evaluated.
    pub fn record_evaluation(&mut self, evaluation: Evaluation) -> Result<bool> {
        let Some(current) = self.current_question() else {
            return Err(PrepError::validation("session has no remaining questions"));
        };
        if current.id != evaluation.question_id {
            return Err(PrepError::validation(format!(
                "evaluation for '{}' does not match current question '{}'",
                evaluation.question_id, current.id
            )));
        }
        if self.evaluations.contains_key(&evaluation.question_id) {
            return Err(PrepError::validation(format!(
                "question '{}' was already evaluated",
                evaluation.question_id
            )));
        }
        self.evaluations
            .insert(evaluation.question_id.clone(), evaluation);
        self.advance()
    }

    /// Returns the current position for display.
    #[must_use]
    pub fn progress(&self) -> Progress {
        let total = self.questions.len();
        Progress {
            current: (self.current_question_index + 1).min(total),
            total,
        }
    }

    /// Updates the `updated_at` timestamp to the current time.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Returns the duration since the session started.
    #[must_use]
    pub fn elapsed(&self) -> chrono::Duration {
        self.updated_at - self.started_at
    }
}

/// Checks that a question set is non-empty with unique ids.
///
/// # Errors
///
/// Returns `PrepError::ValidationFailure` describing the first problem found.
pub fn validate_question_set(questions: &[Question]) -> Result<()> {
    if questions.is_empty() {
        return Err(PrepError::validation("question set is empty"));
    }
    let mut seen = std::collections::HashSet::with_capacity(questions.len());
    for question in questions {
        if !seen.insert(question.id.as_str()) {
            return Err(PrepError::validation(format!(
                "duplicate question id '{}'",
                question.id
            )));
        }
    }
    Ok(())
}

// ============================================================================
// SessionState
// ============================================================================

/// The `(status, session, last_error)` triple exposed to callers as a snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Current status.
    pub status: SessionStatus,

    /// The live session, if the status has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<Session>,

    /// User-visible message for the most recent failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,

    /// Bumped on every restart and every remote call, so late results can be
    /// told apart from current ones.
    #[serde(skip)]
    pub epoch: u64,
}

impl SessionState {
    /// Creates an idle state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current progress, if a session exists.
    #[must_use]
    pub fn progress(&self) -> Option<Progress> {
        self.session.as_ref().map(Session::progress)
    }

    /// Returns `true` if status and session agree.
    ///
    /// `Idle`, `GeneratingQuestions` and `Error` carry no session;
    /// `Interviewing` and `Evaluating` carry an incomplete one; `Results`
    /// carries a complete one.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        match (self.status, &self.session) {
            (
                SessionStatus::Idle | SessionStatus::GeneratingQuestions | SessionStatus::Error,
                None,
            ) => true,
            (SessionStatus::Interviewing | SessionStatus::Evaluating, Some(session)) => {
                !session.is_complete()
            }
            (SessionStatus::Results, Some(session)) => {
                session.current_question_index == session.questions.len()
            }
            _ => false,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
