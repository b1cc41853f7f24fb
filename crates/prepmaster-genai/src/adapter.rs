//! Adapts a [`ContentService`] to the orchestrator traits.

use std::sync::Arc;

use async_trait::async_trait;
use prepmaster_orchestrator::{
    AnswerEvaluator, EvaluationRequest, EvaluationVerdict, GenerationRequest, PrepError,
    Question, QuestionGenerator, Result,
};

use crate::parse::{parse_questions, parse_verdict};
use crate::prompt::{evaluation_prompt, evaluation_schema, question_prompt, question_schema};
use crate::ContentService;

/// Question generator and answer evaluator over one content service.
#[derive(Clone)]
pub struct ServiceBackend {
    service: Arc<dyn ContentService>,
}

impl std::fmt::Debug for ServiceBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceBackend")
            .field("service", &self.service.name())
            .finish()
    }
}

impl ServiceBackend {
    /// Wraps a content service.
    #[must_use]
    pub fn new(service: Arc<dyn ContentService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl QuestionGenerator for ServiceBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<Question>> {
        let prompt = question_prompt(request);
        let schema = question_schema(request.include_answers);

        let text = self
            .service
            .complete_json(&prompt, &schema)
            .await
            .map_err(|e| PrepError::generation(e.kind(), e.to_string()))?;

        let questions = parse_questions(&text, request.include_answers)
            .map_err(|e| PrepError::generation(e.kind(), e.to_string()))?;

        tracing::info!(
            service = self.service.name(),
            requested = request.count,
            received = questions.len(),
            "Question set generated"
        );
        Ok(questions)
    }
}

#[async_trait]
impl AnswerEvaluator for ServiceBackend {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationVerdict> {
        let prompt = evaluation_prompt(request);

        let text = self
            .service
            .complete_json(&prompt, &evaluation_schema())
            .await
            .map_err(|e| PrepError::evaluation(e.kind(), e.to_string()))?;

        let verdict =
            parse_verdict(&text).map_err(|e| PrepError::evaluation(e.kind(), e.to_string()))?;

        tracing::debug!(service = self.service.name(), score = verdict.score, "Answer evaluated");
        Ok(verdict)
    }
}
