use rusqlite::Connection;
use sojourn_core::db::open_db_in_memory;
use sojourn_core::{
    GoalRepository, NewGoal, NewMilestone, RichText, SqliteGoalRepository,
    SqliteTimelineRepository, SqliteUserRepository, TimelineEventKind, TimelineListQuery,
    TimelineRepository, TimelineService, UserId, UserRepository,
};

const DAY_MS: i64 = 86_400_000;

#[test]
fn events_list_newest_first_with_filters() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "auth0|alice");
    let goals = SqliteGoalRepository::try_new(&conn).unwrap();
    let timeline = SqliteTimelineRepository::try_new(&conn).unwrap();

    let goal_one = goals.create_goal(user, &goal_draft("one")).unwrap();
    let goal_two = goals.create_goal(user, &goal_draft("two")).unwrap();
    goals
        .add_milestone(user, goal_one.uuid, &milestone_draft("step"))
        .unwrap();

    let all = timeline
        .list_events(user, &TimelineListQuery::default())
        .unwrap();
    assert_eq!(all.len(), 3);

    let scoped = timeline
        .list_events(user, &TimelineListQuery {
            goal_uuid: Some(goal_one.uuid),
            ..TimelineListQuery::default()
        })
        .unwrap();
    assert_eq!(scoped.len(), 2);
    assert!(scoped.iter().all(|event| event.goal_uuid == goal_one.uuid));

    let created_only = timeline
        .list_events(user, &TimelineListQuery {
            kind: Some(TimelineEventKind::GoalCreated),
            ..TimelineListQuery::default()
        })
        .unwrap();
    assert_eq!(created_only.len(), 2);

    let goal_two_created = timeline
        .list_events(user, &TimelineListQuery {
            goal_uuid: Some(goal_two.uuid),
            kind: Some(TimelineEventKind::GoalCreated),
            ..TimelineListQuery::default()
        })
        .unwrap();
    assert_eq!(goal_two_created.len(), 1);
    assert_eq!(goal_two_created[0].detail, "two");
}

#[test]
fn events_are_scoped_per_user() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "auth0|alice");
    let mallory = seed_user(&conn, "auth0|mallory");
    let goals = SqliteGoalRepository::try_new(&conn).unwrap();
    let timeline = SqliteTimelineRepository::try_new(&conn).unwrap();

    goals.create_goal(alice, &goal_draft("mine")).unwrap();

    let foreign = timeline
        .list_events(mallory, &TimelineListQuery::default())
        .unwrap();
    assert!(foreign.is_empty());
}

#[test]
fn activity_feed_groups_events_by_day() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "auth0|alice");
    let goals = SqliteGoalRepository::try_new(&conn).unwrap();

    let goal = goals.create_goal(user, &goal_draft("journal")).unwrap();
    goals
        .add_milestone(user, goal.uuid, &milestone_draft("monday step"))
        .unwrap();
    goals
        .add_milestone(user, goal.uuid, &milestone_draft("wednesday step"))
        .unwrap();

    // Pin event times to three distinct days.
    pin_event_time(&conn, "journal", 10 * DAY_MS + 3_600_000);
    pin_event_time(&conn, "monday step", 12 * DAY_MS + 60_000);
    pin_event_time(&conn, "wednesday step", 12 * DAY_MS + 120_000);

    let service = TimelineService::new(SqliteTimelineRepository::try_new(&conn).unwrap());
    let feed = service.activity_feed(user, None).unwrap();

    assert_eq!(feed.len(), 2);
    assert_eq!(feed[0].day, 12);
    assert_eq!(feed[0].events.len(), 2);
    assert_eq!(feed[0].events[0].detail, "wednesday step");
    assert_eq!(feed[0].events[1].detail, "monday step");
    assert_eq!(feed[1].day, 10);
    assert_eq!(feed[1].events.len(), 1);
    assert_eq!(feed[1].events[0].detail, "journal");
}

#[test]
fn feed_limit_bounds_the_event_window() {
    let conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "auth0|alice");
    let goals = SqliteGoalRepository::try_new(&conn).unwrap();

    for index in 0..5 {
        goals
            .create_goal(user, &goal_draft(&format!("goal {index}")))
            .unwrap();
    }

    let service = TimelineService::new(SqliteTimelineRepository::try_new(&conn).unwrap());
    let feed = service.activity_feed(user, Some(3)).unwrap();
    let total: usize = feed.iter().map(|day| day.events.len()).sum();
    assert_eq!(total, 3);
}

fn pin_event_time(conn: &Connection, detail: &str, created_at: i64) {
    conn.execute(
        "UPDATE timeline_events SET created_at = ?1 WHERE detail = ?2;",
        rusqlite::params![created_at, detail],
    )
    .unwrap();
}

fn goal_draft(title: &str) -> NewGoal {
    NewGoal {
        title: title.to_string(),
        description: RichText::default(),
        target_date: None,
    }
}

fn milestone_draft(title: &str) -> NewMilestone {
    NewMilestone {
        title: title.to_string(),
        description: RichText::default(),
    }
}

fn seed_user(conn: &Connection, subject: &str) -> UserId {
    let repo = SqliteUserRepository::try_new(conn).unwrap();
    let (profile, _) = repo.ensure_user(subject, "", "User").unwrap();
    profile.uuid
}
