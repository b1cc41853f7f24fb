//! Parsing of service replies into domain types.

use once_cell::sync::Lazy;
use prepmaster_orchestrator::{AnswerSource, EvaluationVerdict, Question, QuestionType};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::GenAiError;

// pattern is a literal
#[allow(clippy::unwrap_used)]
static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*\s*\n?(.*?)\n?\s*```\s*$").unwrap());

/// Removes a surrounding Markdown code fence, if present.
pub fn strip_code_fences(text: &str) -> &str {
    CODE_FENCE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map_or_else(|| text.trim(), |m| m.as_str().trim())
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    id: Value,
    text: String,
    hint: String,
    topic: String,
    #[serde(default, rename = "type")]
    question_type: Option<String>,
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    example: Option<String>,
}

/// Returns the trimmed value of a required answer field.
fn required(field: Option<String>, name: &str, number: usize) -> Result<String, GenAiError> {
    match field {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(GenAiError::Parse(format!("question {number}: missing `{name}`"))),
    }
}

impl RawQuestion {
    fn into_question(self, number: usize, include_answers: bool) -> Result<Question, GenAiError> {
        let id = match self.id {
            Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            other => {
                return Err(GenAiError::Parse(format!(
                    "question {number}: invalid id {other}"
                )))
            }
        };

        let question_type = match self.question_type.as_deref().map(str::to_ascii_lowercase) {
            Some(t) if t == "code" => QuestionType::Code,
            _ => QuestionType::Text,
        };

        // Answers are only trusted when they were asked for.
        let source = if include_answers {
            AnswerSource::Generated {
                answer: required(self.answer, "answer", number)?,
                example: required(self.example, "example", number)?,
            }
        } else {
            AnswerSource::Open
        };

        Ok(Question {
            id,
            text: self.text.trim().to_string(),
            hint: self.hint.trim().to_string(),
            topic: self.topic.trim().to_string(),
            question_type,
            source,
        })
    }
}

/// Parses a question set.
///
/// Accepts a bare array or an object with a `questions` array. Every item
/// needs `id`, `text`, `hint` and `topic`; with `include_answers` it also
/// needs a non-blank `answer` and `example`.
pub fn parse_questions(text: &str, include_answers: bool) -> Result<Vec<Question>, GenAiError> {
    let body = strip_code_fences(text);
    if body.is_empty() {
        return Err(GenAiError::EmptyResponse);
    }

    let value: Value =
        serde_json::from_str(body).map_err(|e| GenAiError::Parse(format!("invalid JSON: {e}")))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("questions") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(GenAiError::Parse(
                    "expected an array of questions".to_string(),
                ))
            }
        },
        _ => {
            return Err(GenAiError::Parse(
                "expected an array of questions".to_string(),
            ))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(position, item)| {
            let number = position + 1;
            serde_json::from_value::<RawQuestion>(item)
                .map_err(|e| GenAiError::Parse(format!("question {number}: {e}")))?
                .into_question(number, include_answers)
        })
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVerdict {
    score: Value,
    #[serde(default)]
    feedback: String,
    #[serde(default, alias = "ideal_answer")]
    ideal_answer: String,
}

/// Parses an evaluation verdict.
///
/// The score may arrive as a number or a numeric string. Range checks are
/// left to the orchestrator.
pub fn parse_verdict(text: &str) -> Result<EvaluationVerdict, GenAiError> {
    let body = strip_code_fences(text);
    if body.is_empty() {
        return Err(GenAiError::EmptyResponse);
    }

    let raw: RawVerdict =
        serde_json::from_str(body).map_err(|e| GenAiError::Parse(format!("invalid JSON: {e}")))?;

    let score = match &raw.score {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| GenAiError::Parse(format!("score is not a number: {}", raw.score)))?;

    Ok(EvaluationVerdict {
        score,
        feedback: raw.feedback.trim().to_string(),
        ideal_answer: raw.ideal_answer.trim().to_string(),
    })
}
