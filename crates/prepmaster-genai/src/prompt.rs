//! Prompt text and response schemas.
//!
//! Schemas use the `OpenAPI` subset Gemini accepts for `responseSchema`
//! (upper-case type names). The `OpenAI` client inlines them into the prompt.

use prepmaster_orchestrator::{EvaluationRequest, GenerationRequest, QuestionType};
use serde_json::{json, Value};

/// Builds the prompt for a question set.
pub fn question_prompt(request: &GenerationRequest) -> String {
    let topic_phrase = match request.topic.as_deref().map(str::trim) {
        Some(topic) if !topic.is_empty() => format!("focusing specifically on {topic}"),
        _ => "focusing on core competencies".to_string(),
    };

    let mut prompt = format!(
        "Generate {count} {difficulty} level interview questions for a {role} position {topic_phrase}.\n\
         The questions should be practical and commonly asked.\n",
        count = request.count,
        difficulty = request.difficulty,
        role = request.role.trim(),
    );

    if request.include_answers {
        prompt.push_str(
            "For each question:\n\
             1. Provide a VERY concise direct 'answer' (1-2 sentences max).\n\
             2. Provide an 'example' which is a short, simple code snippet or concrete example illustrating the concept.\n\
             \n\
             Optimize for rapid learning/studying.",
        );
    } else {
        prompt.push_str(
            "For each question provide a short 'hint'. Set 'type' to \"code\" when the candidate \
             should answer with code, otherwise \"text\". Do not include answers.",
        );
    }
    prompt
}

/// Response schema for a question set.
pub fn question_schema(include_answers: bool) -> Value {
    let mut properties = json!({
        "id": { "type": "STRING", "description": "Unique ID" },
        "text": { "type": "STRING", "description": "The question" },
        "hint": { "type": "STRING", "description": "A short hint" },
        "topic": { "type": "STRING", "description": "Sub-topic (e.g. Hooks, CSS Grid)" },
        "type": { "type": "STRING", "enum": ["text", "code"], "description": "Expected answer shape" }
    });
    let mut required = vec!["id", "text", "hint", "topic"];

    if include_answers {
        if let Some(map) = properties.as_object_mut() {
            map.insert(
                "answer".to_string(),
                json!({ "type": "STRING", "description": "Direct, concise answer." }),
            );
            map.insert(
                "example".to_string(),
                json!({ "type": "STRING", "description": "Simple code example or usage syntax." }),
            );
        }
        required.extend(["answer", "example"]);
    }

    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": properties,
            "required": required,
        }
    })
}

/// Builds the prompt for scoring one answer.
pub fn evaluation_prompt(request: &EvaluationRequest) -> String {
    let answer_kind = match request.question_type {
        QuestionType::Code => "code solution",
        QuestionType::Text => "answer",
    };

    let reference = request.reference_answer.as_deref().map_or_else(
        || {
            "No reference answer is available. Judge the answer on technical accuracy and \
             completeness, and write the ideal answer yourself."
                .to_string()
        },
        |reference| {
            format!(
                "Reference answer (treat as ground truth):\n{reference}\n\n\
                 Use the reference answer as the ideal answer, rephrasing only for clarity."
            )
        },
    );

    format!(
        "You are interviewing a candidate for a {difficulty} level {role} position.\n\n\
         Question:\n{question}\n\n\
         Candidate's {answer_kind}:\n{answer}\n\n\
         {reference}\n\n\
         Score the {answer_kind} from 1 (poor) to 10 (excellent). Give short, constructive \
         feedback addressed to the candidate.\n\
         Return JSON with fields: score (integer 1-10), feedback, idealAnswer.",
        difficulty = request.difficulty,
        role = request.role.trim(),
        question = request.question_text,
        answer = request.user_answer,
    )
}

/// Response schema for an evaluation.
pub fn evaluation_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "score": { "type": "INTEGER", "description": "Score from 1 to 10" },
            "feedback": { "type": "STRING", "description": "Constructive feedback" },
            "idealAnswer": { "type": "STRING", "description": "What a strong answer says" }
        },
        "required": ["score", "feedback", "idealAnswer"]
    })
}
