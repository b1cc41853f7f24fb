//! End-to-end tests for practice sessions driven through the orchestrator.
//!
//! These run whole sessions from start to report, with scripted content
//! services standing in for the remote one.

mod support;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use prepmaster_orchestrator::{
    curated_questions, Difficulty, Orchestrator, PrepError, QuestionSetProvider, ResultsSummary,
    ScoreBand, ServiceErrorKind, SessionEvent, SessionMode, SessionStatus, CURATED_ROLE,
    CURATED_TOPIC, NO_ANSWER_PLACEHOLDER,
};
use prepmaster_report::{json::JsonGenerator, MarkdownGenerator, Report};
use support::{
    generated_questions, scored_orchestrator, study_orchestrator, ScriptedEvaluator,
    ScriptedGenerator,
};

// ============================================================================
// Study mode
// ============================================================================

#[tokio::test]
async fn test_study_session_to_report() {
    let generator = ScriptedGenerator::returning(generated_questions(3));
    let orchestrator = study_orchestrator(generator.clone(), 3);

    let state = orchestrator
        .start_custom("  QA Engineer ", "Testing", Difficulty::Junior)
        .await
        .expect("start");
    assert_eq!(state.status, SessionStatus::Interviewing);
    assert_eq!(state.progress().map(|p| p.to_string()).as_deref(), Some("Question 1 of 3"));

    {
        let requests = generator.requests.lock().expect("lock");
        assert_eq!(requests[0].role, "QA Engineer");
        assert_eq!(requests[0].count, 3);
        assert!(requests[0].include_answers);
    }

    for _ in 0..3 {
        orchestrator.advance().await.expect("advance");
    }
    assert_eq!(orchestrator.snapshot().await.status, SessionStatus::Results);

    let (session, summary) = orchestrator.results().await.expect("results");
    let ResultsSummary::Study(study) = &summary else {
        panic!("expected a study summary, got {summary:?}");
    };
    assert_eq!(study.items.len(), 3);
    assert_eq!(study.items[2].resolved_answer, "Answer 3");

    let report = Report::from_results(&session, &summary).expect("report");
    let markdown = MarkdownGenerator::new(&report).generate();
    assert!(markdown.contains("# PrepMaster Session Report: QA Engineer"));
    assert!(markdown.contains("| Questions | 3 of 3 |"));
    let json = JsonGenerator::new(&report).generate().expect("json");
    assert!(json.contains("\"mode\":\"study\""));
}

#[tokio::test]
async fn test_curated_sessions_are_identical() {
    let orchestrator = Orchestrator::new(
        QuestionSetProvider::curated_only(),
        SessionMode::Study,
        20,
    );

    let first = orchestrator.start_curated().await.expect("first start");
    let first_ids: Vec<String> = first
        .session
        .as_ref()
        .expect("session")
        .questions
        .iter()
        .map(|q| q.id.clone())
        .collect();

    orchestrator.restart().await;
    let second = orchestrator.start_curated().await.expect("second start");
    let second_session = second.session.as_ref().expect("session");
    let second_ids: Vec<String> = second_session.questions.iter().map(|q| q.id.clone()).collect();

    assert_eq!(first_ids, second_ids);
    assert_eq!(first_ids.len(), curated_questions().len());
    assert_eq!(second_session.topic, CURATED_TOPIC);
    assert_eq!(second_session.job_role, CURATED_ROLE);
    assert_eq!(second_session.difficulty, Difficulty::Senior);
}

#[tokio::test]
async fn test_curated_study_session_reveals_model_answers() {
    let orchestrator = Orchestrator::new(
        QuestionSetProvider::curated_only(),
        SessionMode::Study,
        20,
    );
    orchestrator.start_curated().await.expect("start");

    while orchestrator.snapshot().await.status == SessionStatus::Interviewing {
        orchestrator.advance().await.expect("advance");
    }

    let (_, summary) = orchestrator.results().await.expect("results");
    let ResultsSummary::Study(study) = summary else {
        panic!("expected a study summary");
    };
    assert!(study
        .items
        .iter()
        .all(|item| item.resolved_answer != NO_ANSWER_PLACEHOLDER));
}

#[tokio::test]
async fn test_custom_without_generator_fails_into_error() {
    let orchestrator = Orchestrator::new(
        QuestionSetProvider::curated_only(),
        SessionMode::Study,
        5,
    );
    let err = orchestrator
        .start_custom("Dev", "", Difficulty::MidLevel)
        .await
        .expect_err("no generator");
    assert!(err.is_generation_failure());

    let state = orchestrator.snapshot().await;
    assert_eq!(state.status, SessionStatus::Error);
    assert!(state.session.is_none());
    assert!(state.last_error.is_some());

    // Error only leaves through restart
    assert!(orchestrator.start_curated().await.is_err());
    orchestrator.restart().await;
    assert!(orchestrator.start_curated().await.is_ok());
}

// ============================================================================
// Scored mode
// ============================================================================

#[tokio::test]
async fn test_scored_session_average_and_report() {
    let generator = ScriptedGenerator::returning(generated_questions(3));
    let evaluator = ScriptedEvaluator::new(vec![Ok(8.0), Ok(6.0), Ok(10.0)]);
    let orchestrator = scored_orchestrator(generator.clone(), evaluator.clone(), 3);
    let mut events = orchestrator.subscribe();

    orchestrator
        .start_custom("Backend Engineer", "", Difficulty::Senior)
        .await
        .expect("start");
    assert!(!generator.requests.lock().expect("lock")[0].include_answers);

    for answer in ["first", "second", "third"] {
        orchestrator.submit_answer(answer).await.expect("submit");
    }

    let (session, summary) = orchestrator.results().await.expect("results");
    assert_eq!(summary.average_score(), Some(8.0));
    assert_eq!(session.evaluations.len(), 3);
    assert_eq!(session.evaluations["g2"].user_answer, "second");

    // Generated answers are not ground truth
    assert!(evaluator
        .requests
        .lock()
        .expect("lock")
        .iter()
        .all(|r| r.reference_answer.is_none()));

    let report = Report::from_results(&session, &summary).expect("report");
    assert_eq!(report.summary.band, Some(ScoreBand::Strong));
    assert_eq!(
        report.summary.share_line.as_deref(),
        Some("I just scored 8.0/10 on PrepMaster AI!")
    );

    let mut complete = None;
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::SessionComplete(payload) = event {
            complete = Some(payload);
        }
    }
    let complete = complete.expect("session_complete event");
    assert_eq!(complete.question_count, 3);
    assert_eq!(complete.average_score, Some(8.0));
}

#[tokio::test]
async fn test_curated_scored_session_sends_model_answer() {
    let evaluator = ScriptedEvaluator::new(vec![]);
    let orchestrator = Orchestrator::new(
        QuestionSetProvider::curated_only(),
        SessionMode::Scored,
        20,
    )
    .with_scorer(prepmaster_orchestrator::AnswerScorer::new(
        evaluator.clone(),
        support::TEST_TIMEOUT,
    ));

    orchestrator.start_curated().await.expect("start");
    orchestrator
        .submit_answer("function sum(a, b) { return a + b; }")
        .await
        .expect("submit");

    let requests = evaluator.requests.lock().expect("lock");
    let expected = curated_questions()[0]
        .model_answer()
        .map(str::to_string);
    assert!(expected.is_some());
    assert_eq!(requests[0].reference_answer, expected);
    assert_eq!(requests[0].role, CURATED_ROLE);
}

#[tokio::test]
async fn test_evaluation_failure_allows_retry() {
    let generator = ScriptedGenerator::returning(generated_questions(2));
    let evaluator = ScriptedEvaluator::new(vec![
        Err(ServiceErrorKind::RateLimit),
        Ok(11.0),
        Ok(9.0),
        Ok(4.0),
    ]);
    let orchestrator = scored_orchestrator(generator, evaluator, 2);
    orchestrator
        .start_custom("Dev", "", Difficulty::Junior)
        .await
        .expect("start");

    let err = orchestrator.submit_answer("try 1").await.expect_err("rate limited");
    assert_eq!(err.service_kind(), Some(ServiceErrorKind::RateLimit));

    let err = orchestrator.submit_answer("try 2").await.expect_err("score out of range");
    assert_eq!(err.service_kind(), Some(ServiceErrorKind::InvalidResponse));

    let state = orchestrator.snapshot().await;
    assert_eq!(state.status, SessionStatus::Interviewing);
    let session = state.session.as_ref().expect("session");
    assert_eq!(session.current_question_index, 0);
    assert!(session.evaluations.is_empty());
    assert!(state.last_error.is_some());

    orchestrator.submit_answer("try 3").await.expect("scored");
    orchestrator.submit_answer("answer two").await.expect("scored");

    let (_, summary) = orchestrator.results().await.expect("results");
    assert_eq!(summary.average_score(), Some(6.5));
}

#[tokio::test]
async fn test_scored_mode_rejects_advance_and_blank_answers() {
    let generator = ScriptedGenerator::returning(generated_questions(2));
    let orchestrator = scored_orchestrator(generator, ScriptedEvaluator::new(vec![]), 2);
    orchestrator
        .start_custom("Dev", "", Difficulty::Junior)
        .await
        .expect("start");

    assert!(matches!(
        orchestrator.advance().await,
        Err(PrepError::InvalidStateTransition { .. })
    ));
    assert!(matches!(
        orchestrator.submit_answer("   ").await,
        Err(PrepError::ValidationFailure { .. })
    ));
    assert!(matches!(
        orchestrator.results().await,
        Err(PrepError::ResultsNotReady { .. })
    ));
}

// ============================================================================
// Restart while busy
// ============================================================================

#[tokio::test]
async fn test_restart_discards_in_flight_generation() {
    let generator =
        ScriptedGenerator::slow(generated_questions(2), Duration::from_millis(200));
    let orchestrator = Arc::new(study_orchestrator(generator.clone(), 2));

    let task = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            orchestrator
                .start_custom("Dev", "", Difficulty::Junior)
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(
        orchestrator.snapshot().await.status,
        SessionStatus::GeneratingQuestions
    );
    orchestrator.restart().await;

    let outcome = task.await.expect("join");
    assert!(matches!(outcome, Err(PrepError::SessionDiscarded)));

    let state = orchestrator.snapshot().await;
    assert_eq!(state.status, SessionStatus::Idle);
    assert!(state.session.is_none());
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_restart_discards_in_flight_evaluation() {
    let generator = ScriptedGenerator::returning(generated_questions(2));
    let evaluator = ScriptedEvaluator::with_delay(vec![Ok(9.0)], Duration::from_millis(200));
    let orchestrator = Arc::new(scored_orchestrator(generator, evaluator, 2));
    orchestrator
        .start_custom("Dev", "", Difficulty::Junior)
        .await
        .expect("start");

    let task = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move { orchestrator.submit_answer("late").await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(orchestrator.snapshot().await.status, SessionStatus::Evaluating);
    orchestrator.restart().await;
    orchestrator.start_curated().await.expect("new session");

    let outcome = task.await.expect("join");
    assert!(matches!(outcome, Err(PrepError::SessionDiscarded)));

    let state = orchestrator.snapshot().await;
    assert_eq!(state.status, SessionStatus::Interviewing);
    let session = state.session.as_ref().expect("session");
    assert_eq!(session.topic, CURATED_TOPIC);
    assert!(session.evaluations.is_empty());
}
