use rusqlite::Connection;
use sojourn_core::db::open_db_in_memory;
use sojourn_core::{
    NoteListQuery, NoteRepository, NoteService, NoteServiceError, RepoError, RichText,
    SqliteNoteRepository, SqliteUserRepository, UserId, UserRepository,
};

#[test]
fn create_derives_preview_from_html_mirror() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn);
    let service = note_service(&conn);

    let body = RichText {
        plain: "Ship the Q3 plan and review".to_string(),
        html: "<h1>Ship</h1><p>the <em>Q3</em> plan &amp; review</p>".to_string(),
        json: r#"{"type":"doc"}"#.to_string(),
    };
    let note = service.create_note(user, "Planning", body.clone()).unwrap();

    assert_eq!(note.title, "Planning");
    assert_eq!(note.body, body);
    assert_eq!(note.preview_text.as_deref(), Some("Ship the Q3 plan & review"));
}

#[test]
fn update_replaces_content_and_recomputes_preview() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn);
    let service = note_service(&conn);

    let note = service
        .create_note(user, "Draft", RichText::from_plain("first body"))
        .unwrap();
    let updated = service
        .update_note(user, note.uuid, "Draft v2", RichText::from_plain("second body"))
        .unwrap();

    assert_eq!(updated.title, "Draft v2");
    assert_eq!(updated.preview_text.as_deref(), Some("second body"));
}

#[test]
fn empty_title_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn);
    let service = note_service(&conn);

    let err = service
        .create_note(user, "   ", RichText::from_plain("body"))
        .unwrap_err();
    assert!(matches!(err, NoteServiceError::EmptyTitle));
}

#[test]
fn soft_delete_hides_note_until_restored() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn);
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();

    let note = repo
        .create_note(user, "Keep", &RichText::from_plain("body"), None)
        .unwrap();

    repo.soft_delete_note(user, note.uuid).unwrap();
    // Idempotent.
    repo.soft_delete_note(user, note.uuid).unwrap();

    let err = repo.get_note(user, note.uuid, false).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
    let tombstoned = repo.get_note(user, note.uuid, true).unwrap();
    assert!(tombstoned.is_deleted);

    let visible = repo.list_notes(user, &NoteListQuery::default()).unwrap();
    assert!(visible.is_empty());
    let all = repo
        .list_notes(user, &NoteListQuery {
            include_deleted: true,
            ..NoteListQuery::default()
        })
        .unwrap();
    assert_eq!(all.len(), 1);

    let restored = repo.restore_note(user, note.uuid).unwrap();
    assert!(!restored.is_deleted);
    let visible = repo.list_notes(user, &NoteListQuery::default()).unwrap();
    assert_eq!(visible.len(), 1);
}

#[test]
fn update_rejects_tombstoned_notes() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn);
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();

    let note = repo
        .create_note(user, "Gone", &RichText::from_plain("body"), None)
        .unwrap();
    repo.soft_delete_note(user, note.uuid).unwrap();

    let err = repo
        .update_note_full(user, note.uuid, "Gone", &RichText::default(), None)
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
}

#[test]
fn list_limit_clamps_to_contract_bounds() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn);
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();

    for index in 0..12 {
        repo.create_note(
            user,
            &format!("note {index}"),
            &RichText::from_plain("body"),
            None,
        )
        .unwrap();
    }

    // Default limit is 10.
    let page = repo.list_notes(user, &NoteListQuery::default()).unwrap();
    assert_eq!(page.len(), 10);

    // Requesting more than the max clamps to 50; 12 exist.
    let page = repo
        .list_notes(user, &NoteListQuery {
            limit: Some(500),
            ..NoteListQuery::default()
        })
        .unwrap();
    assert_eq!(page.len(), 12);

    let page = repo
        .list_notes(user, &NoteListQuery {
            limit: Some(5),
            offset: 10,
            ..NoteListQuery::default()
        })
        .unwrap();
    assert_eq!(page.len(), 2);
}

#[test]
fn notes_are_scoped_to_their_owner() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let (alice, _) = users.ensure_user("auth0|alice", "", "").unwrap();
    let (mallory, _) = users.ensure_user("auth0|mallory", "", "").unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();

    let note = repo
        .create_note(alice.uuid, "Private", &RichText::from_plain("secret"), None)
        .unwrap();

    let err = repo.get_note(mallory.uuid, note.uuid, false).unwrap_err();
    assert!(matches!(err, RepoError::Unauthorized(_)));
    let err = repo.soft_delete_note(mallory.uuid, note.uuid).unwrap_err();
    assert!(matches!(err, RepoError::Unauthorized(_)));
}

fn note_service(conn: &Connection) -> NoteService<SqliteNoteRepository<'_>> {
    NoteService::new(SqliteNoteRepository::try_new(conn).unwrap())
}

fn seed_user(conn: &Connection) -> UserId {
    let repo = SqliteUserRepository::try_new(conn).unwrap();
    let (profile, _) = repo.ensure_user("auth0|alice", "", "Alice").unwrap();
    profile.uuid
}
