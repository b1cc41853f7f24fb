//! Results aggregation for completed sessions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};
use crate::question::Question;
use crate::session::{Evaluation, Session, SessionMode};

/// A question paired with its evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredItem {
    /// The question as asked.
    pub question: Question,
    /// How the answer scored.
    pub evaluation: Evaluation,
}

/// Outcome of a scored session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredSummary {
    /// Arithmetic mean of every recorded score.
    pub average_score: f64,
    /// Evaluated questions in presentation order.
    pub per_question: Vec<ScoredItem>,
}

/// A question paired with the answer shown to a studying user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyItem {
    /// The question as asked.
    pub question: Question,
    /// See [`Question::resolved_answer`].
    pub resolved_answer: String,
}

/// Outcome of a study session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySummary {
    /// Every question in presentation order.
    pub items: Vec<StudyItem>,
}

/// Results payload for a completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ResultsSummary {
    /// Scores and feedback.
    Scored(ScoredSummary),
    /// Questions with their answers.
    Study(StudySummary),
}

impl ResultsSummary {
    /// Returns the average score for scored sessions.
    #[must_use]
    pub const fn average_score(&self) -> Option<f64> {
        match self {
            Self::Scored(summary) => Some(summary.average_score),
            Self::Study(_) => None,
        }
    }
}

/// Display band for an average score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    /// 8 and above.
    Strong,
    /// 5 up to 8.
    Fair,
    /// Below 5.
    Weak,
}

impl ScoreBand {
    /// Classifies an average score.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 8.0 {
            Self::Strong
        } else if score >= 5.0 {
            Self::Fair
        } else {
            Self::Weak
        }
    }
}

impl std::fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strong => write!(f, "strong"),
            Self::Fair => write!(f, "fair"),
            Self::Weak => write!(f, "weak"),
        }
    }
}

/// Returns the one-line message used when sharing a score.
#[must_use]
pub fn share_line(average_score: f64) -> String {
    format!("I just scored {average_score:.1}/10 on PrepMaster AI!")
}

/// Returns the mean of every recorded score.
///
/// # Errors
///
/// Returns `PrepError::ValidationFailure` if there are no evaluations.
pub fn average_score(evaluations: &BTreeMap<String, Evaluation>) -> Result<f64> {
    if evaluations.is_empty() {
        return Err(PrepError::validation(
            "cannot average an empty set of evaluations",
        ));
    }
    let total: u32 = evaluations.values().map(|e| u32::from(e.score)).sum();
    #[allow(clippy::cast_precision_loss)]
    let count = evaluations.len() as f64;
    Ok(f64::from(total) / count)
}

/// Reduces a scored session's evaluations into a summary.
///
/// # Errors
///
/// Returns `PrepError::ValidationFailure` if `evaluations` is empty or holds
/// a key that is not a question id.
pub fn summarize_evaluations(
    questions: &[Question],
    evaluations: &BTreeMap<String, Evaluation>,
) -> Result<ScoredSummary> {
    if let Some(stray) = evaluations
        .keys()
        .find(|id| !questions.iter().any(|q| &q.id == *id))
    {
        return Err(PrepError::validation(format!(
            "evaluation for unknown question '{stray}'"
        )));
    }
    let average_score = average_score(evaluations)?;
    let per_question = questions
        .iter()
        .filter_map(|q| {
            evaluations.get(&q.id).map(|evaluation| ScoredItem {
                question: q.clone(),
                evaluation: evaluation.clone(),
            })
        })
        .collect();
    Ok(ScoredSummary {
        average_score,
        per_question,
    })
}

/// Pairs every question with its resolved answer.
#[must_use]
pub fn summarize_questions(questions: &[Question]) -> StudySummary {
    StudySummary {
        items: questions
            .iter()
            .map(|q| StudyItem {
                question: q.clone(),
                resolved_answer: q.resolved_answer().to_string(),
            })
            .collect(),
    }
}

/// Builds the results payload for a session according to its mode.
///
/// # Errors
///
/// Returns `PrepError::ValidationFailure` for a scored session with no
/// evaluations.
pub fn summarize(session: &Session) -> Result<ResultsSummary> {
    match session.mode {
        SessionMode::Scored => {
            summarize_evaluations(&session.questions, &session.evaluations)
                .map(ResultsSummary::Scored)
        }
        SessionMode::Study => Ok(ResultsSummary::Study(summarize_questions(
            &session.questions,
        ))),
    }
}
