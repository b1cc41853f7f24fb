//! Question model shared by the provider, the state machine and the reports.

use serde::{Deserialize, Serialize};

/// Text shown when a question carries no answer of any kind.
pub const NO_ANSWER_PLACEHOLDER: &str = "No answer provided.";

/// Seniority level a session is pitched at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Difficulty {
    /// Entry level.
    Junior,
    /// Mid-level (default).
    #[default]
    MidLevel,
    /// Senior.
    Senior,
    /// Expert / staff level.
    Expert,
}

impl Difficulty {
    /// All difficulties in ascending order.
    pub const ALL: [Self; 4] = [Self::Junior, Self::MidLevel, Self::Senior, Self::Expert];

    /// Returns the display name used in prompts and on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Junior => "Junior",
            Self::MidLevel => "Mid-Level",
            Self::Senior => "Senior",
            Self::Expert => "Expert",
        }
    }

    /// Parses a difficulty name, case-insensitively.
    fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "junior" => Some(Self::Junior),
            "mid-level" | "midlevel" | "mid_level" | "mid" => Some(Self::MidLevel),
            "senior" => Some(Self::Senior),
            "expert" => Some(Self::Expert),
            _ => None,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_case_insensitive(s).ok_or_else(|| {
            format!("invalid difficulty '{s}': expected one of 'Junior', 'Mid-Level', 'Senior', 'Expert'")
        })
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for Difficulty {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Expected shape of the candidate's answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// Free-form prose.
    #[default]
    Text,
    /// A code snippet.
    Code,
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Code => write!(f, "code"),
        }
    }
}

/// Where a question's reference material came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerSource {
    /// Hand-written reference answer, treated as ground truth when scoring.
    Curated {
        /// The reference answer or code solution.
        #[serde(rename = "modelAnswer")]
        model_answer: String,
    },
    /// Direct answer produced by the content service alongside the question.
    Generated {
        /// Concise direct answer.
        answer: String,
        /// Short illustrative example.
        example: String,
    },
    /// No answer shipped with the question.
    Open,
}

/// A single interview question. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Identifier, unique within a session.
    pub id: String,
    /// The question itself.
    pub text: String,
    /// A short nudge toward the answer.
    pub hint: String,
    /// Sub-topic, e.g. "React Hooks".
    pub topic: String,
    /// Expected answer shape.
    #[serde(default, rename = "type")]
    pub question_type: QuestionType,
    /// Reference material attached to the question.
    pub source: AnswerSource,
}

impl Question {
    /// Returns the answer to show a studying user.
    ///
    /// Prefers a generated answer, then a curated model answer, then the
    /// [`NO_ANSWER_PLACEHOLDER`].
    #[must_use]
    pub fn resolved_answer(&self) -> &str {
        match &self.source {
            AnswerSource::Generated { answer, .. } if !answer.trim().is_empty() => answer,
            AnswerSource::Curated { model_answer } if !model_answer.trim().is_empty() => {
                model_answer.trim()
            }
            _ => NO_ANSWER_PLACEHOLDER,
        }
    }

    /// Returns the curated model answer, if any.
    ///
    /// Generated answers are never returned here: only curated answers are
    /// ground truth for scoring.
    #[must_use]
    pub fn model_answer(&self) -> Option<&str> {
        match &self.source {
            AnswerSource::Curated { model_answer } => Some(model_answer.trim()),
            _ => None,
        }
    }

    /// Returns the generated example, if any.
    #[must_use]
    pub fn example(&self) -> Option<&str> {
        match &self.source {
            AnswerSource::Generated { example, .. } if !example.trim().is_empty() => {
                Some(example)
            }
            _ => None,
        }
    }
}
