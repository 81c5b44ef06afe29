use std::sync::Arc;
use std::time::Duration;

use quiz_core::model::{Question, Quiz, QuizId, UserId};
use quiz_core::time::{fixed_clock, fixed_now};
use services::{
    RepositoryQuestionSource, RepositoryResultReporter, ScoreHistoryService, SessionEvent,
    SessionRunner, StaticAuthProvider,
};
use storage::repository::{InMemoryRepository, QuizRepository, ScoreRepository, Storage};

fn build_quiz() -> Quiz {
    let questions = vec![
        Question::new(
            "Which planet is known as the red planet?",
            vec!["Venus".into(), "Mars".into(), "Jupiter".into()],
            "Mars",
        )
        .unwrap(),
        Question::new(
            "What is the chemical symbol for gold?",
            vec!["Ag".into(), "Au".into(), "Fe".into()],
            "Au",
        )
        .unwrap(),
    ];
    Quiz::new(QuizId::new("smoke-quiz"), "Smoke Quiz", questions).unwrap()
}

async fn wait_for(
    rx: &mut tokio::sync::mpsc::UnboundedReceiver<SessionEvent>,
    matches: impl Fn(&SessionEvent) -> bool,
) -> SessionEvent {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for a session event")
            .expect("event stream closed unexpectedly");
        if matches(&event) {
            return event;
        }
    }
}

#[tokio::test]
async fn repository_backed_session_persists_the_final_score() {
    let repo = InMemoryRepository::new();
    repo.upsert_quiz(&build_quiz()).await.unwrap();

    let quizzes: Arc<InMemoryRepository> = Arc::new(repo.clone());
    let runner = SessionRunner::new(
        Arc::new(RepositoryQuestionSource::new(quizzes)),
        Arc::new(StaticAuthProvider::signed_in(UserId::new("uid-smoke"))),
        Arc::new(RepositoryResultReporter::new(Arc::new(repo.clone()))),
    )
    .with_clock(fixed_clock())
    .with_tick_interval(Duration::from_secs(600));

    let (handle, mut rx) = runner.spawn(QuizId::new("smoke-quiz"));

    wait_for(&mut rx, |e| matches!(e, SessionEvent::Loaded { .. })).await;
    handle.select_option("Mars");
    handle.advance();
    handle.select_option("Fe");
    handle.advance();

    let completed = wait_for(&mut rx, |e| matches!(e, SessionEvent::Completed { .. })).await;
    assert!(matches!(
        completed,
        SessionEvent::Completed { score: 1, total_questions: 2 }
    ));
    wait_for(&mut rx, |e| matches!(e, SessionEvent::ScorePersisted { .. })).await;

    let stored = repo
        .get_score(&UserId::new("uid-smoke"), &QuizId::new("smoke-quiz"))
        .await
        .expect("score persisted");
    assert_eq!(stored.score(), 1);
    assert_eq!(stored.total_questions(), 2);
    assert_eq!(stored.quiz_title(), "Smoke Quiz");
    assert_eq!(stored.completed_at(), fixed_now());

    let history = ScoreHistoryService::new(Arc::new(repo));
    let listed = history
        .list_for_user(&UserId::new("uid-smoke"))
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn sqlite_backed_session_runs_end_to_end() {
    let storage = Storage::sqlite("sqlite:file:memdb_session_flow?mode=memory&cache=shared")
        .await
        .expect("connect sqlite");
    storage.quizzes.upsert_quiz(&build_quiz()).await.unwrap();

    let runner = SessionRunner::new(
        Arc::new(RepositoryQuestionSource::new(Arc::clone(&storage.quizzes))),
        Arc::new(StaticAuthProvider::signed_in(UserId::new("uid-smoke"))),
        Arc::new(RepositoryResultReporter::new(Arc::clone(&storage.scores))),
    )
    .with_clock(fixed_clock())
    .with_tick_interval(Duration::from_secs(600));

    let (handle, mut rx) = runner.spawn(QuizId::new("smoke-quiz"));

    wait_for(&mut rx, |e| matches!(e, SessionEvent::Loaded { .. })).await;
    handle.select_option("Mars");
    handle.advance();
    handle.select_option("Au");
    handle.advance();

    let completed = wait_for(&mut rx, |e| matches!(e, SessionEvent::Completed { .. })).await;
    assert!(matches!(
        completed,
        SessionEvent::Completed { score: 2, total_questions: 2 }
    ));
    wait_for(&mut rx, |e| matches!(e, SessionEvent::ScorePersisted { .. })).await;

    let stored = storage
        .scores
        .get_score(&UserId::new("uid-smoke"), &QuizId::new("smoke-quiz"))
        .await
        .expect("score persisted");
    assert_eq!(stored.score(), 2);
    assert!(stored.is_passing());
}
