//! The interview session state machine.
//!
//! [`Orchestrator`] owns the single live [`SessionState`]. Every transition
//! takes the lock, checks its precondition and commits status and session
//! together. The two remote calls (question generation and answer
//! evaluation) run with the lock released so observers see
//! `GeneratingQuestions` / `Evaluating`; when the call returns the lock is
//! re-taken and the result is applied only if no restart happened meanwhile.

use tokio::sync::{broadcast, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::curated::{CURATED_DIFFICULTY, CURATED_ROLE, CURATED_TOPIC};
use crate::error::{PrepError, Result, ServiceErrorKind};
use crate::provider::{AnswerScorer, GenerationRequest, QuestionSetProvider};
use crate::question::Difficulty;
use crate::results::{self, ResultsSummary};
use crate::session::{Session, SessionMode, SessionState, SessionStatus};
use crate::websocket::{EventBroadcaster, SessionEvent};

/// Drives one practice session at a time.
#[derive(Debug)]
pub struct Orchestrator {
    state: Mutex<SessionState>,
    broadcaster: EventBroadcaster,
    provider: QuestionSetProvider,
    scorer: Option<AnswerScorer>,
    mode: SessionMode,
    question_count: u32,
}

impl Orchestrator {
    /// Creates an idle orchestrator.
    #[must_use]
    pub fn new(provider: QuestionSetProvider, mode: SessionMode, question_count: u32) -> Self {
        Self {
            state: Mutex::new(SessionState::new()),
            broadcaster: EventBroadcaster::default(),
            provider,
            scorer: None,
            mode,
            question_count,
        }
    }

    /// Attaches the evaluation service used in scored mode.
    #[must_use]
    pub fn with_scorer(mut self, scorer: AnswerScorer) -> Self {
        self.scorer = Some(scorer);
        self
    }

    /// Replaces the event broadcaster.
    #[must_use]
    pub fn with_broadcaster(mut self, broadcaster: EventBroadcaster) -> Self {
        self.broadcaster = broadcaster;
        self
    }

    /// Study or scored.
    #[must_use]
    pub const fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Number of questions requested for custom sessions.
    #[must_use]
    pub const fn question_count(&self) -> u32 {
        self.question_count
    }

    /// Returns `true` if custom sessions can be generated.
    #[must_use]
    pub const fn can_generate(&self) -> bool {
        self.provider.can_generate()
    }

    /// Subscribes to session events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.broadcaster.subscribe()
    }

    /// Returns a copy of the current state.
    pub async fn snapshot(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    /// Starts a session from generated questions.
    ///
    /// A blank `topic` means core competencies. Only valid from `Idle`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank role or a wrong state,
    /// `PrepError::GenerationFailure` if no usable question set came back
    /// (the state is then `Error`), and `PrepError::SessionDiscarded` if a
    /// restart happened while waiting.
    pub async fn start_custom(
        &self,
        role: &str,
        topic: &str,
        difficulty: Difficulty,
    ) -> Result<SessionState> {
        let role = role.trim();
        let topic = topic.trim();
        if role.is_empty() {
            return Err(PrepError::validation("job role must not be empty"));
        }
        if self.question_count == 0 {
            return Err(PrepError::validation("question count must be greater than 0"));
        }

        let request = GenerationRequest {
            role: role.to_string(),
            topic: (!topic.is_empty()).then(|| topic.to_string()),
            difficulty,
            count: self.question_count,
            include_answers: self.mode == SessionMode::Study,
        };

        let epoch = {
            let mut state = self.state.lock().await;
            Self::require(&state, &[SessionStatus::Idle], "start a custom session")?;
            state.status = SessionStatus::GeneratingQuestions;
            state.last_error = None;
            state.epoch += 1;
            self.publish_status(&state);
            state.epoch
        };

        info!(
            role = %role,
            topic = %topic,
            difficulty = %difficulty,
            count = self.question_count,
            "Generating question set"
        );

        let outcome = self.provider.generate(&request).await.and_then(|questions| {
            Session::new(topic, role, difficulty, self.mode, questions)
                .map_err(|e| PrepError::generation(ServiceErrorKind::InvalidResponse, e.to_string()))
        });

        let mut state = self.lock_if_current(epoch).await?;
        match outcome {
            Ok(session) => {
                info!(questions = session.questions.len(), "Session started");
                state.session = Some(session);
                state.status = SessionStatus::Interviewing;
                Ok(self.commit(&state))
            }
            Err(e) => {
                warn!(error = %e, "Question generation failed");
                state.session = None;
                state.status = SessionStatus::Error;
                state.last_error = Some(e.to_string());
                self.broadcaster.send(SessionEvent::error(e.to_string()));
                self.commit(&state);
                Err(e)
            }
        }
    }

    /// Starts a session over the curated question set. Only valid from `Idle`.
    pub async fn start_curated(&self) -> Result<SessionState> {
        let mut state = self.state.lock().await;
        Self::require(&state, &[SessionStatus::Idle], "start a curated session")?;

        let session = Session::new(
            CURATED_TOPIC,
            CURATED_ROLE,
            CURATED_DIFFICULTY,
            self.mode,
            self.provider.curated(),
        )?;
        info!(questions = session.questions.len(), "Curated session started");

        state.session = Some(session);
        state.status = SessionStatus::Interviewing;
        state.last_error = None;
        Ok(self.commit(&state))
    }

    /// Moves to the next question in study mode.
    ///
    /// Reaching the end moves to `Results`.
    pub async fn advance(&self) -> Result<SessionState> {
        let mut state = self.state.lock().await;
        if self.mode != SessionMode::Study {
            return Err(PrepError::invalid_transition(
                "in scored mode",
                "advance without an answer",
            ));
        }
        Self::require(&state, &[SessionStatus::Interviewing], "advance")?;

        let status = state.status;
        let Some(session) = state.session.as_mut() else {
            return Err(PrepError::invalid_transition(status, "advance"));
        };
        let complete = session.advance()?;
        debug!(index = session.current_question_index, "Advanced");

        if complete {
            let question_count = session.questions.len();
            state.status = SessionStatus::Results;
            info!(questions = question_count, "Study session complete");
            self.broadcaster
                .send(SessionEvent::session_complete(question_count, None));
        }
        Ok(self.commit(&state))
    }

    /// Submits an answer to the current question for scoring.
    ///
    /// On success the evaluation is recorded and the session moves on. On
    /// failure the session stays on the same question with evaluations
    /// unchanged, and the error is also kept in `last_error`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank answer, a wrong state or study
    /// mode, `PrepError::EvaluationFailure` if scoring failed, and
    /// `PrepError::SessionDiscarded` if a restart happened while waiting.
    pub async fn submit_answer(&self, answer: &str) -> Result<SessionState> {
        let answer = answer.trim();

        let (epoch, question, role, difficulty) = {
            let mut state = self.state.lock().await;
            if self.mode != SessionMode::Scored {
                return Err(PrepError::invalid_transition(
                    "in study mode",
                    "submit an answer",
                ));
            }
            Self::require(&state, &[SessionStatus::Interviewing], "submit an answer")?;
            if answer.is_empty() {
                return Err(PrepError::validation("answer must not be empty"));
            }
            let Some(session) = state.session.as_ref() else {
                return Err(PrepError::invalid_transition(state.status, "submit an answer"));
            };
            let Some(question) = session.current_question().cloned() else {
                return Err(PrepError::validation("session has no remaining questions"));
            };
            let role = session.job_role.clone();
            let difficulty = session.difficulty;

            if self.scorer.is_none() {
                return Err(PrepError::evaluation(
                    ServiceErrorKind::Authentication,
                    "no evaluation service is configured",
                ));
            }

            state.status = SessionStatus::Evaluating;
            state.last_error = None;
            state.epoch += 1;
            self.publish_status(&state);
            (state.epoch, question, role, difficulty)
        };

        info!(question_id = %question.id, answer_len = answer.len(), "Evaluating answer");

        let outcome = match &self.scorer {
            Some(scorer) => scorer.evaluate(&question, answer, &role, difficulty).await,
            None => Err(PrepError::evaluation(
                ServiceErrorKind::Authentication,
                "no evaluation service is configured",
            )),
        };

        let mut state = self.lock_if_current(epoch).await?;
        state.status = SessionStatus::Interviewing;

        let evaluation = match outcome {
            Ok(evaluation) => evaluation,
            Err(e) => {
                warn!(question_id = %question.id, error = %e, "Answer evaluation failed");
                state.last_error = Some(e.to_string());
                self.broadcaster.send(SessionEvent::error(e.to_string()));
                self.commit(&state);
                return Err(e);
            }
        };

        let Some(session) = state.session.as_mut() else {
            return Err(PrepError::invalid_transition(
                SessionStatus::Interviewing,
                "record an evaluation",
            ));
        };
        let score = evaluation.score;
        let complete = match session.record_evaluation(evaluation) {
            Ok(complete) => complete,
            Err(e) => {
                self.commit(&state);
                return Err(e);
            }
        };
        self.broadcaster
            .send(SessionEvent::answer_evaluated(question.id.clone(), score));
        info!(question_id = %question.id, score, "Answer scored");

        if complete {
            let question_count = session.questions.len();
            let average = results::average_score(&session.evaluations).ok();
            state.status = SessionStatus::Results;
            info!(questions = question_count, average_score = ?average, "Scored session complete");
            self.broadcaster
                .send(SessionEvent::session_complete(question_count, average));
        }
        Ok(self.commit(&state))
    }

    /// Discards any session and error and returns to `Idle`. Valid from any state.
    ///
    /// A remote call still in flight has its result discarded.
    pub async fn restart(&self) -> SessionState {
        let mut state = self.state.lock().await;
        let was_busy = state.status.is_busy();
        state.status = SessionStatus::Idle;
        state.session = None;
        state.last_error = None;
        state.epoch += 1;
        info!(discarded_in_flight = was_busy, "Session restarted");
        self.commit(&state)
    }

    /// Returns the results summary of a completed session.
    ///
    /// # Errors
    ///
    /// Returns `PrepError::ResultsNotReady` unless the status is `Results`.
    pub async fn results(&self) -> Result<(Session, ResultsSummary)> {
        let state = self.state.lock().await;
        let (SessionStatus::Results, Some(session)) = (state.status, state.session.as_ref()) else {
            return Err(PrepError::results_not_ready(state.status));
        };
        let summary = results::summarize(session)?;
        Ok((session.clone(), summary))
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn require(state: &SessionState, allowed: &[SessionStatus], action: &str) -> Result<()> {
        if allowed.contains(&state.status) {
            Ok(())
        } else {
            warn!(status = %state.status, action, "Rejected transition");
            Err(PrepError::invalid_transition(state.status, action))
        }
    }

    /// Re-takes the lock after a remote call, unless a restart intervened.
    async fn lock_if_current(&self, epoch: u64) -> Result<MutexGuard<'_, SessionState>> {
        let state = self.state.lock().await;
        if state.epoch == epoch {
            Ok(state)
        } else {
            warn!(
                started_epoch = epoch,
                current_epoch = state.epoch,
                "Discarding late result after restart"
            );
            Err(PrepError::SessionDiscarded)
        }
    }

    fn publish_status(&self, state: &SessionState) {
        self.broadcaster
            .send(SessionEvent::status_changed(state.status, state.progress()));
    }

    /// Announces the new status and returns the snapshot.
    fn commit(&self, state: &SessionState) -> SessionState {
        debug_assert!(state.is_consistent(), "inconsistent state: {state:?}");
        self.publish_status(state);
        state.clone()
    }
}
