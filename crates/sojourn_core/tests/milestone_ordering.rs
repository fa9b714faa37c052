use rusqlite::Connection;
use sojourn_core::db::open_db_in_memory;
use sojourn_core::{
    GoalId, GoalRepository, MilestoneStatus, MilestoneUpdate, NewGoal, NewMilestone, RepoError,
    RichText, SqliteGoalRepository, SqliteUserRepository, UserId, UserRepository,
};
use uuid::Uuid;

#[test]
fn milestones_append_at_end_of_ordering() {
    let conn = open_db_in_memory().unwrap();
    let (user, goal) = seed_goal(&conn);
    let repo = SqliteGoalRepository::try_new(&conn).unwrap();

    let first = repo.add_milestone(user, goal, &draft("outline")).unwrap();
    let second = repo.add_milestone(user, goal, &draft("draft")).unwrap();
    let third = repo.add_milestone(user, goal, &draft("publish")).unwrap();
    assert_eq!(first.sort_order, 0);
    assert_eq!(second.sort_order, 1);
    assert_eq!(third.sort_order, 2);

    let listed = repo.list_milestones(user, goal).unwrap();
    let titles: Vec<&str> = listed.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, ["outline", "draft", "publish"]);
}

#[test]
fn reorder_moves_and_rewrites_contiguous_positions() {
    let conn = open_db_in_memory().unwrap();
    let (user, goal) = seed_goal(&conn);
    let repo = SqliteGoalRepository::try_new(&conn).unwrap();

    let a = repo.add_milestone(user, goal, &draft("a")).unwrap();
    let b = repo.add_milestone(user, goal, &draft("b")).unwrap();
    let c = repo.add_milestone(user, goal, &draft("c")).unwrap();

    // Move the last milestone to the front.
    let reordered = repo.reorder_milestone(user, c.uuid, Some(0)).unwrap();
    let ids: Vec<Uuid> = reordered.iter().map(|m| m.uuid).collect();
    assert_eq!(ids, [c.uuid, a.uuid, b.uuid]);
    let orders: Vec<i64> = reordered.iter().map(|m| m.sort_order).collect();
    assert_eq!(orders, [0, 1, 2]);

    // None moves to the end; out-of-range clamps.
    let reordered = repo.reorder_milestone(user, c.uuid, None).unwrap();
    let ids: Vec<Uuid> = reordered.iter().map(|m| m.uuid).collect();
    assert_eq!(ids, [a.uuid, b.uuid, c.uuid]);

    let reordered = repo.reorder_milestone(user, a.uuid, Some(99)).unwrap();
    let ids: Vec<Uuid> = reordered.iter().map(|m| m.uuid).collect();
    assert_eq!(ids, [b.uuid, c.uuid, a.uuid]);

    let reordered = repo.reorder_milestone(user, a.uuid, Some(-5)).unwrap();
    let ids: Vec<Uuid> = reordered.iter().map(|m| m.uuid).collect();
    assert_eq!(ids, [a.uuid, b.uuid, c.uuid]);
}

#[test]
fn remove_closes_the_ordering_gap() {
    let conn = open_db_in_memory().unwrap();
    let (user, goal) = seed_goal(&conn);
    let repo = SqliteGoalRepository::try_new(&conn).unwrap();

    let a = repo.add_milestone(user, goal, &draft("a")).unwrap();
    let b = repo.add_milestone(user, goal, &draft("b")).unwrap();
    let c = repo.add_milestone(user, goal, &draft("c")).unwrap();

    repo.remove_milestone(user, b.uuid).unwrap();

    let listed = repo.list_milestones(user, goal).unwrap();
    let ids: Vec<Uuid> = listed.iter().map(|m| m.uuid).collect();
    assert_eq!(ids, [a.uuid, c.uuid]);
    let orders: Vec<i64> = listed.iter().map(|m| m.sort_order).collect();
    assert_eq!(orders, [0, 1]);

    let err = repo.get_milestone(user, b.uuid).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
}

#[test]
fn ordering_is_scoped_per_goal() {
    let conn = open_db_in_memory().unwrap();
    let (user, goal_one) = seed_goal(&conn);
    let repo = SqliteGoalRepository::try_new(&conn).unwrap();
    let goal_two = repo
        .create_goal(user, &NewGoal {
            title: "second goal".to_string(),
            description: RichText::default(),
            target_date: None,
        })
        .unwrap()
        .uuid;

    repo.add_milestone(user, goal_one, &draft("one/a")).unwrap();
    let two_a = repo.add_milestone(user, goal_two, &draft("two/a")).unwrap();
    let one_b = repo.add_milestone(user, goal_one, &draft("one/b")).unwrap();

    // Each goal counts from zero independently.
    assert_eq!(two_a.sort_order, 0);
    assert_eq!(one_b.sort_order, 1);
}

#[test]
fn status_transitions_stamp_and_clear_completed_at() {
    let conn = open_db_in_memory().unwrap();
    let (user, goal) = seed_goal(&conn);
    let repo = SqliteGoalRepository::try_new(&conn).unwrap();

    let milestone = repo.add_milestone(user, goal, &draft("measure")).unwrap();
    assert_eq!(milestone.status, MilestoneStatus::Pending);
    assert!(milestone.completed_at.is_none());

    let started = repo
        .set_milestone_status(user, milestone.uuid, MilestoneStatus::InProgress)
        .unwrap();
    assert_eq!(started.status, MilestoneStatus::InProgress);
    assert!(started.completed_at.is_none());

    let done = repo
        .set_milestone_status(user, milestone.uuid, MilestoneStatus::Done)
        .unwrap();
    assert_eq!(done.status, MilestoneStatus::Done);
    assert!(done.completed_at.is_some());

    let reverted = repo
        .set_milestone_status(user, milestone.uuid, MilestoneStatus::Pending)
        .unwrap();
    assert!(reverted.completed_at.is_none());
}

#[test]
fn update_replaces_title_and_description() {
    let conn = open_db_in_memory().unwrap();
    let (user, goal) = seed_goal(&conn);
    let repo = SqliteGoalRepository::try_new(&conn).unwrap();

    let milestone = repo.add_milestone(user, goal, &draft("rough")).unwrap();
    let updated = repo
        .update_milestone(user, milestone.uuid, &MilestoneUpdate {
            title: "polished".to_string(),
            description: RichText::from_plain("with details"),
        })
        .unwrap();
    assert_eq!(updated.title, "polished");
    assert_eq!(updated.description.plain, "with details");
    assert_eq!(updated.sort_order, milestone.sort_order);
}

#[test]
fn milestone_ownership_is_enforced() {
    let conn = open_db_in_memory().unwrap();
    let (alice, goal) = seed_goal(&conn);
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let (mallory, _) = users.ensure_user("auth0|mallory", "", "").unwrap();
    let repo = SqliteGoalRepository::try_new(&conn).unwrap();

    let milestone = repo.add_milestone(alice, goal, &draft("secret")).unwrap();

    let err = repo
        .reorder_milestone(mallory.uuid, milestone.uuid, Some(0))
        .unwrap_err();
    assert!(matches!(err, RepoError::Unauthorized(_)));

    let err = repo.remove_milestone(mallory.uuid, milestone.uuid).unwrap_err();
    assert!(matches!(err, RepoError::Unauthorized(_)));

    let err = repo.list_milestones(mallory.uuid, goal).unwrap_err();
    assert!(matches!(err, RepoError::Unauthorized(_)));
}

fn draft(title: &str) -> NewMilestone {
    NewMilestone {
        title: title.to_string(),
        description: RichText::default(),
    }
}

fn seed_goal(conn: &Connection) -> (UserId, GoalId) {
    let users = SqliteUserRepository::try_new(conn).unwrap();
    let (profile, _) = users.ensure_user("auth0|alice", "", "Alice").unwrap();
    let goals = SqliteGoalRepository::try_new(conn).unwrap();
    let goal = goals
        .create_goal(profile.uuid, &NewGoal {
            title: "first goal".to_string(),
            description: RichText::default(),
            target_date: None,
        })
        .unwrap();
    (profile.uuid, goal.uuid)
}
