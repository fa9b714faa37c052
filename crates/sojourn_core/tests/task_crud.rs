use rusqlite::Connection;
use sojourn_core::db::open_db_in_memory;
use sojourn_core::{
    NewTask, RepoError, RichText, SqliteTaskRepository, SqliteUserRepository, TaskListQuery,
    TaskRepository, TaskService, TaskStatus, TaskUpdate, UserId, UserRepository,
};

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "auth0|alice");
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let created = repo
        .create_task(user, &NewTask {
            title: "File expenses".to_string(),
            description: RichText::from_plain("before Friday"),
            due_date: Some(20_100),
        })
        .unwrap();
    assert_eq!(created.status, TaskStatus::Todo);
    assert_eq!(created.due_date, Some(20_100));

    let loaded = repo.get_task(user, created.uuid).unwrap();
    assert_eq!(loaded, created);
}

#[test]
fn terminal_status_stamps_completed_at_and_reopening_clears_it() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "auth0|alice");
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let task = repo.create_task(user, &draft("write report")).unwrap();

    let done = repo
        .set_task_status(user, task.uuid, TaskStatus::Done)
        .unwrap();
    assert!(done.completed_at.is_some());

    let cancelled = repo
        .set_task_status(user, task.uuid, TaskStatus::Cancelled)
        .unwrap();
    assert!(cancelled.completed_at.is_some());

    let reopened = repo
        .set_task_status(user, task.uuid, TaskStatus::InProgress)
        .unwrap();
    assert!(reopened.completed_at.is_none());
}

#[test]
fn list_filters_by_status_and_due_ceiling() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "auth0|alice");
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let soon = repo
        .create_task(user, &NewTask {
            title: "due soon".to_string(),
            description: RichText::default(),
            due_date: Some(100),
        })
        .unwrap();
    let later = repo
        .create_task(user, &NewTask {
            title: "due later".to_string(),
            description: RichText::default(),
            due_date: Some(200),
        })
        .unwrap();
    let undated = repo.create_task(user, &draft("no due date")).unwrap();
    repo.set_task_status(user, later.uuid, TaskStatus::Done)
        .unwrap();

    let todo = repo
        .list_tasks(user, &TaskListQuery {
            status: Some(TaskStatus::Todo),
            ..TaskListQuery::default()
        })
        .unwrap();
    assert_eq!(todo.len(), 2);
    assert!(todo.iter().all(|task| task.status == TaskStatus::Todo));

    let due = repo
        .list_tasks(user, &TaskListQuery {
            due_on_or_before: Some(150),
            ..TaskListQuery::default()
        })
        .unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].uuid, soon.uuid);

    // Undated tasks never match a due ceiling.
    let all_due = repo
        .list_tasks(user, &TaskListQuery {
            due_on_or_before: Some(10_000),
            ..TaskListQuery::default()
        })
        .unwrap();
    assert!(all_due.iter().all(|task| task.uuid != undated.uuid));
}

#[test]
fn update_replaces_fields_and_delete_is_hard() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "auth0|alice");
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let task = repo.create_task(user, &draft("draft")).unwrap();
    let updated = repo
        .update_task(user, task.uuid, &TaskUpdate {
            title: "final".to_string(),
            description: RichText::from_plain("reviewed"),
            due_date: None,
        })
        .unwrap();
    assert_eq!(updated.title, "final");
    assert_eq!(updated.due_date, None);

    repo.delete_task(user, task.uuid).unwrap();
    let err = repo.get_task(user, task.uuid).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));

    let row_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM tasks;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(row_count, 0);
}

#[test]
fn tasks_are_scoped_to_their_owner() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "auth0|alice");
    let mallory = seed_user(&conn, "auth0|mallory");
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let task = repo.create_task(alice, &draft("private")).unwrap();

    let err = repo.get_task(mallory, task.uuid).unwrap_err();
    assert!(matches!(err, RepoError::Unauthorized(_)));
    let err = repo.delete_task(mallory, task.uuid).unwrap_err();
    assert!(matches!(err, RepoError::Unauthorized(_)));

    let listed = repo.list_tasks(mallory, &TaskListQuery::default()).unwrap();
    assert!(listed.is_empty());
}

#[test]
fn service_wraps_repository_calls() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "auth0|alice");
    let service = TaskService::new(SqliteTaskRepository::try_new(&conn).unwrap());

    let task = service.create_task(user, &draft("from service")).unwrap();
    let fetched = service.get_task(user, task.uuid).unwrap();
    assert_eq!(fetched.title, "from service");

    let listed = service.list_tasks(user, &TaskListQuery::default()).unwrap();
    assert_eq!(listed.len(), 1);
}

fn draft(title: &str) -> NewTask {
    NewTask {
        title: title.to_string(),
        description: RichText::default(),
        due_date: None,
    }
}

fn seed_user(conn: &Connection, subject: &str) -> UserId {
    let repo = SqliteUserRepository::try_new(conn).unwrap();
    let (profile, _) = repo.ensure_user(subject, "", "User").unwrap();
    profile.uuid
}
