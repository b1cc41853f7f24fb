//! PrepMaster Report Generation
//!
//! Turns a completed practice session into a report that can be written as
//! JSON for programmatic access or rendered to Markdown for review.
//!
//! # Types
//!
//! - [`Report`] - The complete report for one session
//! - [`ReportSummary`] - Role, level, mode, timing and score
//! - [`ReportEntry`] - One question with its reference answer and, in scored
//!   mode, the candidate's answer and evaluation
//!
//! # Generators
//!
//! - [`json::JsonGenerator`] - Compact or pretty JSON
//! - [`MarkdownGenerator`] - Human-readable Markdown
//!
//! # Example
//!
//! ```rust
//! use prepmaster_orchestrator::{curated_questions, summarize, Difficulty, Session, SessionMode};
//! use prepmaster_report::{MarkdownGenerator, Report};
//!
//! let mut session = Session::new(
//!     "Full Stack Curated",
//!     "Senior Developer",
//!     Difficulty::Senior,
//!     SessionMode::Study,
//!     curated_questions(),
//! )
//! .unwrap();
//! while !session.is_complete() {
//!     session.advance().unwrap();
//! }
//!
//! let summary = summarize(&session).unwrap();
//! let report = Report::from_results(&session, &summary).unwrap();
//! let markdown = MarkdownGenerator::new(&report).generate();
//! assert!(markdown.contains("# PrepMaster Session Report"));
//! ```

pub mod json;
mod markdown;

pub use markdown::MarkdownGenerator;

use prepmaster_orchestrator::{
    share_line, QuestionType, ResultsSummary, ScoreBand, Session, SessionMode,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Failed to serialize the report to JSON.
    #[error("failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to read or write report files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Session and results disagree.
    #[error("invalid report data: {0}")]
    InvalidData(String),
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

// ============================================================================
// Report
// ============================================================================

/// Complete report for one practice session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// High-level summary of the session.
    pub summary: ReportSummary,

    /// One entry per question, in presentation order.
    pub entries: Vec<ReportEntry>,
}

impl Report {
    /// Builds a report from a session and its results.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidData` if the results were produced for a
    /// different mode than the session ran in.
    pub fn from_results(session: &Session, results: &ResultsSummary) -> Result<Self> {
        let entries: Vec<ReportEntry> = match (session.mode, results) {
            (SessionMode::Scored, ResultsSummary::Scored(scored)) => scored
                .per_question
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let mut entry = ReportEntry::new(i + 1, &item.question);
                    entry.evaluation = Some(EntryEvaluation {
                        score: item.evaluation.score,
                        feedback: item.evaluation.feedback.clone(),
                        ideal_answer: item.evaluation.ideal_answer.clone(),
                        user_answer: item.evaluation.user_answer.clone(),
                    });
                    entry
                })
                .collect(),
            (SessionMode::Study, ResultsSummary::Study(study)) => study
                .items
                .iter()
                .enumerate()
                .map(|(i, item)| ReportEntry::new(i + 1, &item.question))
                .collect(),
            (mode, _) => {
                return Err(ReportError::InvalidData(format!(
                    "results do not match a {mode} session"
                )))
            }
        };

        let average_score = results.average_score();
        let duration_seconds = u64::try_from(session.elapsed().num_seconds()).unwrap_or(0);

        Ok(Self {
            summary: ReportSummary {
                job_role: session.job_role.clone(),
                topic: session.topic.clone(),
                difficulty: session.difficulty.to_string(),
                mode: session.mode,
                question_count: session.questions.len(),
                answered: entries.len(),
                average_score,
                band: average_score.map(ScoreBand::from_score),
                duration_seconds,
                share_line: average_score.map(share_line),
            },
            entries,
        })
    }

    /// Serializes the report to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Serialization` if JSON serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(ReportError::from)
    }

    /// Returns `true` if the session was scored.
    #[must_use]
    pub fn is_scored(&self) -> bool {
        self.summary.mode == SessionMode::Scored
    }

    /// Entries whose score falls in the weak band, lowest first.
    #[must_use]
    pub fn weakest_entries(&self) -> Vec<&ReportEntry> {
        let mut weak: Vec<&ReportEntry> = self
            .entries
            .iter()
            .filter(|e| {
                e.evaluation
                    .as_ref()
                    .is_some_and(|ev| ScoreBand::from_score(f64::from(ev.score)) == ScoreBand::Weak)
            })
            .collect();
        weak.sort_by_key(|e| e.evaluation.as_ref().map_or(0, |ev| ev.score));
        weak
    }
}

/// High-level summary of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Job role the session targeted.
    pub job_role: String,

    /// Topic focus; empty for core competencies.
    pub topic: String,

    /// Seniority level, as displayed.
    pub difficulty: String,

    /// Study or scored.
    pub mode: SessionMode,

    /// Questions in the session.
    pub question_count: usize,

    /// Questions that were answered (scored) or reviewed (study).
    pub answered: usize,

    /// Mean score, scored sessions only.
    pub average_score: Option<f64>,

    /// Band for the mean score.
    pub band: Option<ScoreBand>,

    /// Time from start to last update.
    pub duration_seconds: u64,

    /// Shareable one-liner, scored sessions only.
    pub share_line: Option<String>,
}

/// One question in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// 1-based position.
    pub number: usize,

    /// Question id.
    pub id: String,

    /// Sub-topic.
    pub topic: String,

    /// Expected answer shape.
    pub question_type: QuestionType,

    /// The question.
    pub text: String,

    /// Hint shown on request.
    pub hint: String,

    /// Answer shown to a studying user.
    pub reference_answer: String,

    /// Generated example, if any.
    pub example: Option<String>,

    /// Scored sessions only.
    pub evaluation: Option<EntryEvaluation>,
}

impl ReportEntry {
    fn new(number: usize, question: &prepmaster_orchestrator::Question) -> Self {
        Self {
            number,
            id: question.id.clone(),
            topic: question.topic.clone(),
            question_type: question.question_type,
            text: question.text.clone(),
            hint: question.hint.clone(),
            reference_answer: question.resolved_answer().to_string(),
            example: question.example().map(str::to_string),
            evaluation: None,
        }
    }
}

/// The candidate's answer and how it scored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryEvaluation {
    /// Score from 1 to 10.
    pub score: u8,

    /// Feedback on the answer.
    pub feedback: String,

    /// What a strong answer would have said.
    pub ideal_answer: String,

    /// The answer as submitted.
    pub user_answer: String,
}
