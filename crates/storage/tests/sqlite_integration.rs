use chrono::Duration;
use quiz_core::model::{Question, Quiz, QuizId, ScoreRecord, UserId};
use quiz_core::time::fixed_now;
use storage::repository::{QuizRepository, ScoreRepository, StorageError};
use storage::sqlite::SqliteRepository;

fn build_quiz(id: &str, title: &str) -> Quiz {
    let questions = vec![
        Question::new(
            "What is the capital of Japan?",
            vec!["Tokyo".into(), "Osaka".into(), "Kyoto".into()],
            "Tokyo",
        )
        .unwrap(),
        Question::new(
            "Which planet is closest to the sun?",
            vec!["Venus".into(), "Mercury".into()],
            "Mercury",
        )
        .unwrap(),
    ];
    Quiz::new(QuizId::new(id), title, questions).unwrap()
}

fn build_score(user: &str, quiz: &str, score: u32, days_ago: i64) -> ScoreRecord {
    ScoreRecord::new(
        UserId::new(user),
        QuizId::new(quiz),
        "Mixed Trivia",
        score,
        2,
        fixed_now() - Duration::days(days_ago),
    )
    .unwrap()
}

#[tokio::test]
async fn sqlite_roundtrip_preserves_question_and_option_order() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_quiz_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let quiz = build_quiz("quiz-1", "Mixed Trivia");
    repo.upsert_quiz(&quiz).await.unwrap();

    let fetched = repo.get_quiz(&QuizId::new("quiz-1")).await.expect("fetch");
    assert_eq!(fetched, quiz);
    assert_eq!(fetched.questions()[0].options()[0], "Tokyo");
    assert_eq!(fetched.questions()[1].correct_answer(), "Mercury");
}

#[tokio::test]
async fn sqlite_upsert_replaces_question_set() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_quiz_replace?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.upsert_quiz(&build_quiz("quiz-1", "Before")).await.unwrap();

    let replacement = Quiz::new(
        QuizId::new("quiz-1"),
        "After",
        vec![
            Question::new("Only question?", vec!["Yes".into(), "No".into()], "Yes").unwrap(),
        ],
    )
    .unwrap();
    repo.upsert_quiz(&replacement).await.unwrap();

    let fetched = repo.get_quiz(&QuizId::new("quiz-1")).await.unwrap();
    assert_eq!(fetched.title(), "After");
    assert_eq!(fetched.total_questions(), 1);

    let listed = repo.list_quizzes().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].question_count, 1);
}

#[tokio::test]
async fn sqlite_missing_quiz_is_not_found() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_quiz_missing?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let err = repo.get_quiz(&QuizId::new("ghost")).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_score_upsert_is_last_write_wins() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_scores?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.upsert_score(&build_score("uid-1", "quiz-1", 1, 2)).await.unwrap();
    repo.upsert_score(&build_score("uid-1", "quiz-1", 2, 0)).await.unwrap();

    let stored = repo
        .get_score(&UserId::new("uid-1"), &QuizId::new("quiz-1"))
        .await
        .expect("fetch");
    assert_eq!(stored.score(), 2);
    assert_eq!(stored.completed_at(), fixed_now());
}

#[tokio::test]
async fn sqlite_lists_scores_recent_first_per_user() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_score_list?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.upsert_score(&build_score("uid-1", "quiz-1", 1, 5)).await.unwrap();
    repo.upsert_score(&build_score("uid-1", "quiz-2", 2, 1)).await.unwrap();
    repo.upsert_score(&build_score("uid-2", "quiz-1", 2, 0)).await.unwrap();

    let listed = repo.list_for_user(&UserId::new("uid-1")).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].quiz_id(), &QuizId::new("quiz-2"));
    assert_eq!(listed[1].quiz_id(), &QuizId::new("quiz-1"));
}
