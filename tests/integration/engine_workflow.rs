/// End-to-end engine workflows: raw activity in, snapshots, summaries,
/// trends, goals, insights and sessions out.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use tempfile::NamedTempFile;

use productivity_mcp::analytics::{self, EngineError};
use productivity_mcp::domain::period;
use productivity_mcp::storage::{InsightStore, SessionStore, SnapshotStore};
use productivity_mcp::*;

fn storage() -> (SqliteStorage, NamedTempFile) {
    let temp_file = NamedTempFile::new().expect("Failed to create temp file");
    let storage = SqliteStorage::new(temp_file.path().to_path_buf())
        .expect("Failed to create storage");
    (storage, temp_file)
}

fn user() -> UserId {
    UserId::new("test-user").unwrap()
}

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

#[test]
fn test_compute_snapshot_from_raw_activity() {
    let (storage, _guard) = storage();
    let day = date(10);

    // 10 tasks created, 8 of them completed that day at 9:00
    for i in 0..10 {
        let completed = i < 8;
        storage
            .record_task(
                &user(),
                day,
                completed.then_some(day),
                completed.then_some(9),
                None,
                completed.then_some(20),
                Some("work"),
            )
            .unwrap();
    }
    storage
        .record_time_block(&user(), day, "completed", 120, Some("work"))
        .unwrap();
    storage
        .record_habit_entry(&user(), "habit-1", day, true, true, 7)
        .unwrap();

    // One completed 60-minute focus session during the day
    let session_start = Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap();
    let mut session = TimeSession::start(
        user(),
        SessionType::Focus,
        "Deep work".to_string(),
        None,
        None,
        session_start,
    )
    .unwrap();
    session.end(session_start + Duration::minutes(60), None).unwrap();
    storage.create_session(&session).unwrap();

    let snapshot = analytics::compute_snapshot(&storage, &user(), day).unwrap();

    assert_eq!(snapshot.tasks_created, 10);
    assert_eq!(snapshot.tasks_completed, 8);
    // 8 completed out of 18 seen that day
    assert!((snapshot.task_completion_rate - 8.0 / 18.0).abs() < 1e-9);
    assert_eq!(snapshot.blocks_completed, 1);
    assert_eq!(snapshot.habits_completed, 1);
    assert_eq!(snapshot.focus_sessions, 1);
    assert_eq!(snapshot.focus_minutes, 60);
    assert_eq!(snapshot.peak_hours.get(&9), Some(&8));
    assert!(snapshot.productivity_score > 0);

    // Persisted under the (user, date) key
    let stored = storage.get_snapshot(&user(), day).unwrap().unwrap();
    assert_eq!(stored.productivity_score, snapshot.productivity_score);

    // Recomputing the same day keeps a single row
    analytics::compute_snapshot(&storage, &user(), day).unwrap();
    let all = storage
        .get_snapshots_in_range(&user(), day, day)
        .unwrap();
    assert_eq!(all.len(), 1);
}

#[test]
fn test_weekly_summary_flow() {
    let (storage, _guard) = storage();

    // Two snapshot days in the week of Wed 2024-01-10
    for (day, completed) in [(8, 4u32), (9, 6u32)] {
        let snapshot = SnapshotBuilder::new(user(), date(day))
            .task_metrics(10, completed, 0, 0.0)
            .focus_metrics(2, 60)
            .build();
        storage.upsert_snapshot(&snapshot).unwrap();
    }

    let result =
        analytics::compute_weekly_summary(&storage, &user(), date(10), Utc::now()).unwrap();

    assert_eq!(result.summary.week_start, date(8));
    assert_eq!(result.summary.week_end, date(14));
    assert_eq!(result.summary.tasks_completed, 10);
    assert_eq!(result.summary.focus_minutes, 120);
    assert_eq!(result.days_with_data, 2);
    assert!(!result.is_complete);
    // No prior week stored
    assert_eq!(result.summary.productivity_trend_pct, 0.0);
    assert_eq!(result.trend_text, "stable");
}

#[test]
fn test_trends_detect_improvement() {
    let (storage, _guard) = storage();
    let today = Utc::now().date_naive();

    // Previous window: weak days; current window: strong days
    for offset in 0..14 {
        let day = today - Duration::days(offset);
        let completed = if offset < 7 { 9 } else { 1 };
        let snapshot = SnapshotBuilder::new(user(), day)
            .task_metrics(10, completed, 0, 0.0)
            .build();
        storage.upsert_snapshot(&snapshot).unwrap();
    }

    let report = analytics::get_trends(&storage, &user(), 7, Utc::now()).unwrap();
    assert_eq!(report.productivity.direction, TrendDirection::Up);
    assert!(report.productivity.change_pct > 5.0);
    assert!(report.best_day.is_some());
}

#[test]
fn test_goal_lifecycle_through_engine() {
    let (storage, _guard) = storage();
    let now = Utc::now();

    // Implied period: weekly_tasks needs no explicit period
    let goal =
        analytics::create_goal(&storage, &user(), GoalType::WeeklyTasks, 10, None, now).unwrap();
    assert_eq!(goal.period_type, PeriodType::Weekly);
    assert_eq!(goal.current_value, 0);

    let goal = analytics::increment_goal(&storage, &goal.id, 6, now).unwrap();
    assert!(!goal.achieved);

    let goal = analytics::update_goal_progress(&storage, &goal.id, 12, now).unwrap();
    assert!(goal.achieved);
    assert_eq!(goal.current_value, 12);
    assert_eq!(goal.progress_percentage(), 100.0);

    // Achieved goals are frozen
    let result = analytics::update_goal_progress(&storage, &goal.id, 1, now);
    assert!(matches!(
        result,
        Err(EngineError::Domain(DomainError::GoalAlreadyAchieved { .. }))
    ));
}

#[test]
fn test_habit_streak_goal_requires_explicit_period() {
    let (storage, _guard) = storage();
    let result =
        analytics::create_goal(&storage, &user(), GoalType::HabitStreak, 30, None, Utc::now());
    assert!(matches!(
        result,
        Err(EngineError::Domain(DomainError::Validation { .. }))
    ));

    let goal = analytics::create_goal(
        &storage,
        &user(),
        GoalType::HabitStreak,
        30,
        Some(PeriodType::Monthly),
        Utc::now(),
    )
    .unwrap();
    assert_eq!(goal.period_type, PeriodType::Monthly);
}

#[test]
fn test_insight_generation_skips_duplicates_on_second_pass() {
    let (storage, _guard) = storage();
    let now = Utc::now();
    let today = now.date_naive();

    // Three recent days with little focus and a 7-day streak on the latest
    for offset in (0..3).rev() {
        let snapshot = SnapshotBuilder::new(user(), today - Duration::days(offset))
            .task_metrics(5, 5, 0, 0.0)
            .habit_metrics(2, 2, 7)
            .focus_metrics(1, 30)
            .build();
        storage.upsert_snapshot(&snapshot).unwrap();
    }

    let first = analytics::generate_insights(&storage, &user(), now).unwrap();
    let types: Vec<InsightType> = first.generated.iter().map(|i| i.insight_type).collect();
    assert!(types.contains(&InsightType::FocusTimeLow));
    assert!(types.contains(&InsightType::HabitStreakMilestone));
    assert!(first.errors.is_empty());

    // A second pass generates nothing new while those insights are live
    let second = analytics::generate_insights(&storage, &user(), now).unwrap();
    assert!(second.generated.is_empty());
    assert!(second.skipped_duplicates >= 2);

    // Stored insights did not multiply
    let focus_insights = storage
        .get_insights_by_type(&user(), InsightType::FocusTimeLow)
        .unwrap();
    assert_eq!(focus_insights.len(), 1);
}

#[test]
fn test_dismissed_insight_unblocks_generation() {
    let (storage, _guard) = storage();
    let now = Utc::now();
    let today = now.date_naive();

    for offset in (0..3).rev() {
        let snapshot = SnapshotBuilder::new(user(), today - Duration::days(offset))
            .focus_metrics(1, 30)
            .build();
        storage.upsert_snapshot(&snapshot).unwrap();
    }

    let first = analytics::generate_insights(&storage, &user(), now).unwrap();
    let focus = first
        .generated
        .iter()
        .find(|i| i.insight_type == InsightType::FocusTimeLow)
        .expect("focus insight generated");

    analytics::dismiss_insight(&storage, &user(), &focus.id, now)
        .unwrap()
        .expect("dismissal applies to own insight");

    // With no actionable duplicate left, the rule fires again
    let second = analytics::generate_insights(&storage, &user(), now).unwrap();
    assert!(second
        .generated
        .iter()
        .any(|i| i.insight_type == InsightType::FocusTimeLow));
}

#[test]
fn test_cross_user_dismiss_is_silent_noop() {
    let (storage, _guard) = storage();
    let now = Utc::now();

    let insight = ActionableInsight::new(
        user(),
        InsightType::PeakHour,
        InsightPriority::Medium,
        "Peak hour",
        "Description",
        "Suggestion",
        HashMap::new(),
        5,
        now,
    );
    storage.create_insight(&insight).unwrap();

    let other = UserId::new("other-user").unwrap();
    let outcome = analytics::dismiss_insight(&storage, &other, &insight.id, now).unwrap();
    assert!(outcome.is_none());

    // The insight is untouched and still actionable for its owner
    let stored = storage.get_insight(&insight.id).unwrap();
    assert!(stored.is_actionable(now));
}

#[test]
fn test_session_invariants_through_engine() {
    let (storage, _guard) = storage();
    let now = Utc::now();

    let session = analytics::start_session(
        &storage,
        &user(),
        SessionType::Focus,
        "Writing".to_string(),
        None,
        Some("work".to_string()),
        now,
    )
    .unwrap();
    assert!(session.is_active());

    // A second session cannot start while one is active
    let result = analytics::start_session(
        &storage,
        &user(),
        SessionType::Task,
        "Other work".to_string(),
        None,
        None,
        now,
    );
    assert!(matches!(
        result,
        Err(EngineError::Domain(DomainError::SessionAlreadyActive { .. }))
    ));

    let ended = analytics::end_session(
        &storage,
        &user(),
        Some("Done".to_string()),
        now + Duration::minutes(45),
    )
    .unwrap();
    assert_eq!(ended.status, SessionStatus::Completed);
    assert_eq!(ended.duration_minutes, Some(45));

    // Ending again fails: nothing is active anymore
    let result = analytics::end_session(&storage, &user(), None, now + Duration::hours(1));
    assert!(matches!(result, Err(EngineError::NoActiveSession { .. })));
}

#[test]
fn test_dashboard_assembles_state() {
    let (storage, _guard) = storage();
    let now = Utc::now();
    let today = now.date_naive();

    let snapshot = SnapshotBuilder::new(user(), today)
        .task_metrics(5, 5, 0, 0.0)
        .build();
    storage.upsert_snapshot(&snapshot).unwrap();
    analytics::compute_weekly_summary(&storage, &user(), today, now).unwrap();
    analytics::create_goal(&storage, &user(), GoalType::WeeklyTasks, 20, None, now).unwrap();
    analytics::start_session(
        &storage,
        &user(),
        SessionType::Focus,
        "Deep work".to_string(),
        None,
        None,
        now,
    )
    .unwrap();

    let dashboard = analytics::get_dashboard(&storage, &user(), now).unwrap();
    assert!(dashboard.today.is_some());
    assert!(dashboard.this_week.is_some());
    assert!(dashboard.active_session.is_some());
    assert_eq!(dashboard.active_goals.len(), 1);
    assert_eq!(dashboard.recent_snapshots.len(), 1);
    assert!(dashboard.avg_score_last_week > 0.0);
    assert_eq!(
        dashboard.this_week.as_ref().unwrap().week_start,
        period::week_start(today)
    );
}

#[tokio::test]
async fn test_server_initialization_and_persistence() {
    let temp_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = temp_file.path().to_path_buf();

    let server = ProductivityServer::new(db_path.clone(), Some("test-user".to_string()))
        .expect("Failed to create server");
    assert_eq!(server.default_user(), Some("test-user"));

    let snapshot = SnapshotBuilder::new(user(), date(10))
        .task_metrics(5, 5, 0, 0.0)
        .build();
    server.storage().upsert_snapshot(&snapshot).unwrap();
    drop(server);

    // Reopening the same file sees the stored data
    let reopened = ProductivityServer::new(db_path, None).expect("Failed to reopen server");
    let loaded = reopened
        .storage()
        .get_snapshot(&user(), date(10))
        .unwrap()
        .unwrap();
    assert_eq!(loaded.tasks_completed, 5);
}
