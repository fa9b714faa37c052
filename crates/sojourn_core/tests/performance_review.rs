use rusqlite::Connection;
use sojourn_core::db::open_db_in_memory;
use sojourn_core::{
    PerformanceRepository, PerformanceService, PerformanceServiceError, QuestionDeleteOutcome,
    RepoError, RichText, SqlitePerformanceRepository, SqliteUserRepository, UserId,
    UserRepository, DEFAULT_QUESTIONS,
};

#[test]
fn seeding_defaults_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "auth0|alice");
    let service = performance_service(&conn);

    let inserted = service.seed_defaults(user).unwrap();
    assert_eq!(inserted as usize, DEFAULT_QUESTIONS.len());

    let again = service.seed_defaults(user).unwrap();
    assert_eq!(again, 0);

    let questions = service.list_questions(user).unwrap();
    assert_eq!(questions.len(), DEFAULT_QUESTIONS.len());
    let prompts: Vec<&str> = questions.iter().map(|q| q.prompt.as_str()).collect();
    assert_eq!(prompts, DEFAULT_QUESTIONS);
    assert!(questions.iter().all(|q| q.is_default && q.is_active));
    let orders: Vec<i64> = questions.iter().map(|q| q.sort_order).collect();
    assert_eq!(orders, (0..DEFAULT_QUESTIONS.len() as i64).collect::<Vec<_>>());
}

#[test]
fn custom_questions_append_after_defaults() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "auth0|alice");
    let service = performance_service(&conn);

    service.seed_defaults(user).unwrap();
    let added = service.add_question(user, "What blocked you?").unwrap();
    assert_eq!(added.sort_order, DEFAULT_QUESTIONS.len() as i64);
    assert!(!added.is_default);

    let err = service.add_question(user, "   ").unwrap_err();
    assert!(matches!(err, PerformanceServiceError::EmptyPrompt));
}

#[test]
fn reorder_rewrites_contiguous_positions() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "auth0|alice");
    let repo = SqlitePerformanceRepository::try_new(&conn).unwrap();

    let a = repo.create_question(user, "a", false).unwrap();
    repo.create_question(user, "b", false).unwrap();
    let c = repo.create_question(user, "c", false).unwrap();

    let reordered = repo.reorder_question(user, c.uuid, Some(0)).unwrap();
    let prompts: Vec<&str> = reordered.iter().map(|q| q.prompt.as_str()).collect();
    assert_eq!(prompts, ["c", "a", "b"]);
    let orders: Vec<i64> = reordered.iter().map(|q| q.sort_order).collect();
    assert_eq!(orders, [0, 1, 2]);

    // None moves to the end.
    let reordered = repo.reorder_question(user, a.uuid, None).unwrap();
    let prompts: Vec<&str> = reordered.iter().map(|q| q.prompt.as_str()).collect();
    assert_eq!(prompts, ["c", "b", "a"]);
}

#[test]
fn delete_without_responses_removes_the_row() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "auth0|alice");
    let repo = SqlitePerformanceRepository::try_new(&conn).unwrap();

    let a = repo.create_question(user, "a", false).unwrap();
    let b = repo.create_question(user, "b", false).unwrap();
    let c = repo.create_question(user, "c", false).unwrap();

    let outcome = repo.delete_question(user, b.uuid).unwrap();
    assert_eq!(outcome, QuestionDeleteOutcome::Removed);

    let err = repo.get_question(user, b.uuid).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));

    // Ordering gap is closed.
    let remaining = repo.list_questions(user, false).unwrap();
    let ids: Vec<_> = remaining.iter().map(|q| q.uuid).collect();
    assert_eq!(ids, [a.uuid, c.uuid]);
    let orders: Vec<i64> = remaining.iter().map(|q| q.sort_order).collect();
    assert_eq!(orders, [0, 1]);
}

#[test]
fn delete_with_responses_deactivates_and_keeps_answers() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "auth0|alice");
    let repo = SqlitePerformanceRepository::try_new(&conn).unwrap();

    let question = repo.create_question(user, "answered", false).unwrap();
    repo.upsert_response(user, question.uuid, "2025-06", &RichText::from_plain("done"))
        .unwrap();

    let outcome = repo.delete_question(user, question.uuid).unwrap();
    assert_eq!(outcome, QuestionDeleteOutcome::Deactivated);

    // Row survives with its prompt; it only leaves the active list.
    let kept = repo.get_question(user, question.uuid).unwrap();
    assert!(!kept.is_active);
    assert_eq!(kept.prompt, "answered");

    assert!(repo.list_questions(user, false).unwrap().is_empty());
    let all = repo.list_questions(user, true).unwrap();
    assert_eq!(all.len(), 1);

    let responses = repo.list_responses_for_question(user, question.uuid).unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].answer.plain, "done");
}

#[test]
fn responses_upsert_per_question_and_period() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "auth0|alice");
    let repo = SqlitePerformanceRepository::try_new(&conn).unwrap();

    let question = repo.create_question(user, "impact?", false).unwrap();

    let first = repo
        .upsert_response(user, question.uuid, "2025-06", &RichText::from_plain("v1"))
        .unwrap();
    let second = repo
        .upsert_response(user, question.uuid, "2025-06", &RichText::from_plain("v2"))
        .unwrap();
    assert_eq!(second.uuid, first.uuid);
    assert_eq!(second.answer.plain, "v2");

    repo.upsert_response(user, question.uuid, "2025-07", &RichText::from_plain("july"))
        .unwrap();
    let for_question = repo.list_responses_for_question(user, question.uuid).unwrap();
    assert_eq!(for_question.len(), 2);
    // Newest period first.
    assert_eq!(for_question[0].period, "2025-07");

    let june = repo.list_responses_for_period(user, "2025-06").unwrap();
    assert_eq!(june.len(), 1);
    assert_eq!(june[0].answer.plain, "v2");
}

#[test]
fn service_validates_period_and_active_state() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "auth0|alice");
    let service = performance_service(&conn);

    let question = service.add_question(user, "growth?").unwrap();

    for bad in ["2025-13", "2025-0", "202506", "2025/06", "garbage"] {
        let err = service
            .record_response(user, question.uuid, bad, RichText::from_plain("x"))
            .unwrap_err();
        assert!(
            matches!(err, PerformanceServiceError::InvalidPeriod(_)),
            "period `{bad}` should be rejected"
        );
    }

    service
        .record_response(user, question.uuid, "2025-06", RichText::from_plain("x"))
        .unwrap();
    service.delete_question(user, question.uuid).unwrap();

    let err = service
        .record_response(user, question.uuid, "2025-07", RichText::from_plain("late"))
        .unwrap_err();
    assert!(matches!(err, PerformanceServiceError::QuestionInactive(_)));
}

#[test]
fn questions_are_scoped_to_their_owner() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "auth0|alice");
    let mallory = seed_user(&conn, "auth0|mallory");
    let repo = SqlitePerformanceRepository::try_new(&conn).unwrap();

    let question = repo.create_question(alice, "private", false).unwrap();

    let err = repo.delete_question(mallory, question.uuid).unwrap_err();
    assert!(matches!(err, RepoError::Unauthorized(_)));
    let err = repo
        .upsert_response(mallory, question.uuid, "2025-06", &RichText::default())
        .unwrap_err();
    assert!(matches!(err, RepoError::Unauthorized(_)));
}

fn performance_service(conn: &Connection) -> PerformanceService<SqlitePerformanceRepository<'_>> {
    PerformanceService::new(SqlitePerformanceRepository::try_new(conn).unwrap())
}

fn seed_user(conn: &Connection, subject: &str) -> UserId {
    let repo = SqliteUserRepository::try_new(conn).unwrap();
    let (profile, _) = repo.ensure_user(subject, "", "User").unwrap();
    profile.uuid
}
