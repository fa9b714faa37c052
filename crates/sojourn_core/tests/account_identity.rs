use rusqlite::Connection;
use sojourn_core::db::open_db_in_memory;
use sojourn_core::{
    AccountService, AccountServiceError, AdoptionKind, AdoptionRepository, ClockFormat, RepoError,
    SqliteAdoptionRepository, SqliteUserRepository, UserRepository, WeekStartDay,
};
use uuid::Uuid;

#[test]
fn ensure_user_creates_once_and_reuses_after() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let (first, created) = repo.ensure_user("auth0|alice", "alice@example.com", "Alice").unwrap();
    assert!(created);
    assert_eq!(first.subject, "auth0|alice");

    let (second, created_again) = repo.ensure_user("auth0|alice", "", "").unwrap();
    assert!(!created_again);
    assert_eq!(second.uuid, first.uuid);
    // Re-authenticating must not overwrite stored profile fields.
    assert_eq!(second.email, "alice@example.com");
}

#[test]
fn first_sign_in_adoption_milestone_is_recorded_once() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let adoption = SqliteAdoptionRepository::try_new(&conn).unwrap();

    let (profile, _) = users.ensure_user("auth0|bob", "", "Bob").unwrap();
    users.ensure_user("auth0|bob", "", "Bob").unwrap();

    let achieved = adoption.list(profile.uuid).unwrap();
    assert_eq!(achieved.len(), 1);
    assert_eq!(achieved[0].kind, AdoptionKind::FirstSignIn);

    // Direct re-recording is also a no-op.
    assert!(!adoption.record(profile.uuid, AdoptionKind::FirstSignIn).unwrap());
}

#[test]
fn update_profile_replaces_fields_and_rejects_unknown_user() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let (profile, _) = repo.ensure_user("auth0|carol", "old@example.com", "C").unwrap();
    let updated = repo
        .update_profile(profile.uuid, "new@example.com", "Carol")
        .unwrap();
    assert_eq!(updated.email, "new@example.com");
    assert_eq!(updated.display_name, "Carol");

    let missing = Uuid::new_v4();
    let err = repo.update_profile(missing, "x@example.com", "X").unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == missing));
}

#[test]
fn settings_read_defaults_until_stored() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let (profile, _) = repo.ensure_user("auth0|dave", "", "").unwrap();
    let defaults = repo.get_settings(profile.uuid).unwrap();
    assert_eq!(defaults.timezone, "UTC");
    assert_eq!(defaults.clock, ClockFormat::TwentyFourHour);
    assert_eq!(defaults.week_starts_on, WeekStartDay::Monday);

    let stored = repo
        .update_settings(
            profile.uuid,
            "Europe/Berlin",
            ClockFormat::TwelveHour,
            WeekStartDay::Sunday,
        )
        .unwrap();
    assert_eq!(stored.timezone, "Europe/Berlin");
    assert_eq!(stored.clock, ClockFormat::TwelveHour);
    assert_eq!(stored.week_starts_on, WeekStartDay::Sunday);

    // Second write updates the same row.
    let rewritten = repo
        .update_settings(
            profile.uuid,
            "Asia/Tokyo",
            ClockFormat::TwelveHour,
            WeekStartDay::Saturday,
        )
        .unwrap();
    assert_eq!(rewritten.timezone, "Asia/Tokyo");
    let row_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM account_settings;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(row_count, 1);
}

#[test]
fn service_rejects_blank_subject_and_unknown_timezone() {
    let conn = open_db_in_memory().unwrap();
    let service = account_service(&conn);

    let err = service.ensure_user("   ", "", "").unwrap_err();
    assert!(matches!(err, AccountServiceError::InvalidSubject));

    let (profile, _) = service.ensure_user("auth0|erin", "", "Erin").unwrap();
    let err = service
        .update_settings(
            profile.uuid,
            "Mars/Olympus_Mons",
            ClockFormat::TwentyFourHour,
            WeekStartDay::Monday,
        )
        .unwrap_err();
    assert!(matches!(err, AccountServiceError::UnsupportedTimezone(_)));
}

fn account_service(conn: &Connection) -> AccountService<SqliteUserRepository<'_>> {
    AccountService::new(SqliteUserRepository::try_new(conn).unwrap())
}
