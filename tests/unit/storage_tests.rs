/// Round-trip and query tests for the SQLite storage adapter
///
/// Everything goes through the store traits, the same way the engine uses
/// the adapter.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use productivity_mcp::storage::{
    ActivitySource, GoalStore, InsightStore, SessionStore, SnapshotStore, StorageError,
    SummaryStore,
};
use productivity_mcp::*;

fn storage() -> SqliteStorage {
    SqliteStorage::in_memory().expect("Failed to open in-memory storage")
}

fn user() -> UserId {
    UserId::new("test-user").unwrap()
}

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

fn snapshot(day: u32, tasks_completed: u32) -> ProductivitySnapshot {
    SnapshotBuilder::new(user(), date(day))
        .task_metrics(10, tasks_completed, 0, 25.0)
        .block_metrics(4, 3, 1, 240, 180)
        .habit_metrics(3, 2, 5)
        .focus_metrics(2, 90)
        .peak_hours(HashMap::from([(9, 3), (14, 1)]))
        .time_by_category(HashMap::from([("work".to_string(), 180)]))
        .build()
}

#[test]
fn test_snapshot_upsert_and_get() {
    let storage = storage();
    let snapshot = snapshot(10, 8);

    storage.upsert_snapshot(&snapshot).unwrap();
    let loaded = storage.get_snapshot(&user(), date(10)).unwrap().unwrap();

    assert_eq!(loaded.tasks_completed, 8);
    assert_eq!(loaded.productivity_score, snapshot.productivity_score);
    assert_eq!(loaded.peak_hours, snapshot.peak_hours);
    assert_eq!(loaded.time_by_category, snapshot.time_by_category);
    // Rates are rederived from the stored counts
    assert!((loaded.task_completion_rate - snapshot.task_completion_rate).abs() < 1e-9);
}

#[test]
fn test_snapshot_upsert_overwrites_same_day() {
    let storage = storage();
    storage.upsert_snapshot(&snapshot(10, 3)).unwrap();
    storage.upsert_snapshot(&snapshot(10, 9)).unwrap();

    let loaded = storage.get_snapshot(&user(), date(10)).unwrap().unwrap();
    assert_eq!(loaded.tasks_completed, 9);

    // Still a single row
    let all = storage
        .get_snapshots_in_range(&user(), date(1), date(31))
        .unwrap();
    assert_eq!(all.len(), 1);
}

#[test]
fn test_snapshot_range_ordering_and_recent() {
    let storage = storage();
    for day in [12, 10, 11] {
        storage.upsert_snapshot(&snapshot(day, day)).unwrap();
    }

    let range = storage
        .get_snapshots_in_range(&user(), date(10), date(12))
        .unwrap();
    let dates: Vec<NaiveDate> = range.iter().map(|s| s.date).collect();
    assert_eq!(dates, vec![date(10), date(11), date(12)]);

    let recent = storage.get_recent_snapshots(&user(), 2).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].date, date(12));

    let latest = storage.get_latest_snapshot(&user()).unwrap().unwrap();
    assert_eq!(latest.date, date(12));
}

#[test]
fn test_average_score_empty_range_is_zero() {
    let storage = storage();
    let avg = storage
        .average_score_in_range(&user(), date(1), date(7))
        .unwrap();
    assert_eq!(avg, 0.0);
}

#[test]
fn test_snapshots_are_per_user() {
    let storage = storage();
    storage.upsert_snapshot(&snapshot(10, 5)).unwrap();

    let other = UserId::new("other-user").unwrap();
    assert!(storage.get_snapshot(&other, date(10)).unwrap().is_none());
}

#[test]
fn test_summary_roundtrip() {
    let storage = storage();
    let snapshots = vec![snapshot(8, 4), snapshot(9, 6)];
    let summary =
        WeeklySummary::from_snapshots(user(), date(10), &snapshots, None, Utc::now());

    storage.upsert_summary(&summary).unwrap();
    let loaded = storage.get_summary(&user(), date(8)).unwrap().unwrap();

    assert_eq!(loaded.week_start, date(8));
    assert_eq!(loaded.tasks_completed, 10);
    assert_eq!(loaded.best_day, summary.best_day);
    assert_eq!(loaded.worst_day, summary.worst_day);

    let latest = storage.get_latest_summary(&user()).unwrap().unwrap();
    assert_eq!(latest.week_start, loaded.week_start);
}

#[test]
fn test_recent_summaries_ordering_and_limit() {
    let storage = storage();
    // Mondays 2024-01-01, 01-08 and 01-15, inserted out of order
    for d in [8, 1, 15] {
        let summary = WeeklySummary::from_snapshots(user(), date(d), &[], None, Utc::now());
        storage.upsert_summary(&summary).unwrap();
    }

    let recent = storage.get_recent_summaries(&user(), 2).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].week_start, date(15));
    assert_eq!(recent[1].week_start, date(8));
}

#[test]
fn test_goal_lifecycle_through_store() {
    let storage = storage();
    let now = Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap();
    let mut goal = ProductivityGoal::new(
        user(),
        GoalType::WeeklyTasks,
        10,
        PeriodType::Weekly,
        now,
    )
    .unwrap();

    storage.create_goal(&goal).unwrap();
    let active = storage.get_active_goals(&user(), now).unwrap();
    assert_eq!(active.len(), 1);

    goal.update_progress(10, now).unwrap();
    storage.update_goal(&goal).unwrap();

    let loaded = storage.get_goal(&goal.id).unwrap();
    assert!(loaded.achieved);
    assert_eq!(loaded.current_value, 10);

    // Achieved goals leave the active set and join the achieved list
    assert!(storage.get_active_goals(&user(), now).unwrap().is_empty());
    let achieved = storage.get_achieved_goals(&user(), 5).unwrap();
    assert_eq!(achieved.len(), 1);
}

#[test]
fn test_goal_not_found() {
    let storage = storage();
    let missing = GoalId::new();
    assert!(matches!(
        storage.get_goal(&missing),
        Err(StorageError::GoalNotFound { .. })
    ));
    assert!(matches!(
        storage.delete_goal(&missing),
        Err(StorageError::GoalNotFound { .. })
    ));
}

#[test]
fn test_goals_in_period_overlap_bounds() {
    let storage = storage();
    let jan10 = Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap();
    let jan20 = Utc.with_ymd_and_hms(2024, 1, 20, 9, 0, 0).unwrap();

    let wednesday_goal =
        ProductivityGoal::new(user(), GoalType::DailyTasks, 5, PeriodType::Daily, jan10).unwrap();
    let saturday_goal =
        ProductivityGoal::new(user(), GoalType::DailyTasks, 5, PeriodType::Daily, jan20).unwrap();
    storage.create_goal(&wednesday_goal).unwrap();
    storage.create_goal(&saturday_goal).unwrap();

    // A window inside Jan 10 overlaps only the first goal's period
    let hits = storage
        .get_goals_in_period(&user(), jan10, jan10 + Duration::hours(1))
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, wednesday_goal.id);

    // A window spanning both days overlaps both
    let hits = storage.get_goals_in_period(&user(), jan10, jan20).unwrap();
    assert_eq!(hits.len(), 2);

    // A window before either period overlaps neither
    let hits = storage
        .get_goals_in_period(
            &user(),
            jan10 - Duration::days(5),
            jan10 - Duration::days(4),
        )
        .unwrap();
    assert!(hits.is_empty());
}

fn insight(insight_type: InsightType, valid_days: i64) -> ActionableInsight {
    ActionableInsight::new(
        user(),
        insight_type,
        InsightPriority::Medium,
        "Test insight",
        "Description",
        "Suggestion",
        HashMap::new(),
        valid_days,
        Utc::now(),
    )
}

#[test]
fn test_insight_active_and_dismissal() {
    let storage = storage();
    let now = Utc::now();
    let mut stored = insight(InsightType::PeakHour, 5);
    storage.create_insight(&stored).unwrap();

    let active = storage.get_active_insights(&user(), now).unwrap();
    assert_eq!(active.len(), 1);

    stored.dismiss(now);
    storage.update_insight(&stored).unwrap();
    assert!(storage.get_active_insights(&user(), now).unwrap().is_empty());

    // Still present for type queries, just not actionable
    let by_type = storage
        .get_insights_by_type(&user(), InsightType::PeakHour)
        .unwrap();
    assert_eq!(by_type.len(), 1);
    assert!(by_type[0].dismissed);
}

#[test]
fn test_delete_expired_insights() {
    let storage = storage();
    storage.create_insight(&insight(InsightType::PeakHour, 2)).unwrap();
    storage
        .create_insight(&insight(InsightType::FocusTimeLow, 30))
        .unwrap();

    let later = Utc::now() + Duration::days(10);
    let deleted = storage.delete_expired_insights(later).unwrap();
    assert_eq!(deleted, 1);

    let remaining = storage.get_recent_insights(&user(), 10).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].insight_type, InsightType::FocusTimeLow);
}

#[test]
fn test_session_store_active_and_focus_totals() {
    let storage = storage();
    let start = Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap();

    let mut session = TimeSession::start(
        user(),
        SessionType::Focus,
        "Deep work".to_string(),
        None,
        None,
        start,
    )
    .unwrap();
    storage.create_session(&session).unwrap();

    let active = storage.get_active_session(&user()).unwrap().unwrap();
    assert_eq!(active.id, session.id);

    session.end(start + Duration::minutes(50), None).unwrap();
    storage.update_session(&session).unwrap();
    assert!(storage.get_active_session(&user()).unwrap().is_none());

    let total = storage
        .total_focus_minutes(
            &user(),
            start - Duration::hours(1),
            start + Duration::hours(8),
        )
        .unwrap();
    assert_eq!(total, 50);
}

#[test]
fn test_focus_totals_ignore_non_focus_and_unfinished() {
    let storage = storage();
    let start = Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap();

    // A meeting session, completed
    let mut meeting = TimeSession::start(
        user(),
        SessionType::Meeting,
        "Standup".to_string(),
        None,
        None,
        start,
    )
    .unwrap();
    meeting.end(start + Duration::minutes(30), None).unwrap();
    storage.create_session(&meeting).unwrap();

    // A focus session still running
    let running = TimeSession::start(
        user(),
        SessionType::Focus,
        "Writing".to_string(),
        None,
        None,
        start + Duration::hours(1),
    )
    .unwrap();
    storage.create_session(&running).unwrap();

    let total = storage
        .total_focus_minutes(&user(), start - Duration::hours(1), start + Duration::hours(8))
        .unwrap();
    assert_eq!(total, 0);
}

#[test]
fn test_sessions_by_type_limit_and_filter() {
    let storage = storage();
    let base = Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap();

    for (offset, title) in [(0, "Morning"), (2, "Midday"), (4, "Afternoon")] {
        let started = base + Duration::hours(offset);
        let mut session = TimeSession::start(
            user(),
            SessionType::Focus,
            title.to_string(),
            None,
            None,
            started,
        )
        .unwrap();
        session.end(started + Duration::minutes(30), None).unwrap();
        storage.create_session(&session).unwrap();
    }
    let mut meeting = TimeSession::start(
        user(),
        SessionType::Meeting,
        "Standup".to_string(),
        None,
        None,
        base + Duration::hours(1),
    )
    .unwrap();
    meeting
        .end(base + Duration::minutes(75), None)
        .unwrap();
    storage.create_session(&meeting).unwrap();

    // Newest first, capped at the limit, meetings filtered out
    let sessions = storage
        .get_sessions_by_type(&user(), SessionType::Focus, 2)
        .unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].title, "Afternoon");
    assert_eq!(sessions[1].title, "Midday");
}

#[test]
fn test_activity_source_aggregates() {
    let storage = storage();
    let day = date(10);

    // 3 tasks created, 2 completed at hour 9, one overdue and still open
    for i in 0..3 {
        let completed = i < 2;
        storage
            .record_task(
                &user(),
                day,
                completed.then_some(day),
                completed.then_some(9),
                (i == 2).then_some(day),
                completed.then_some(30),
                Some("work"),
            )
            .unwrap();
    }

    let tasks = storage.task_stats(&user(), day, day).unwrap();
    assert_eq!(tasks.created, 3);
    assert_eq!(tasks.completed, 2);
    assert_eq!(tasks.overdue, 1);
    assert_eq!(tasks.avg_duration_minutes, 30.0);

    let hours = storage.peak_hours(&user(), day, day).unwrap();
    assert_eq!(hours.get(&9), Some(&2));

    storage
        .record_time_block(&user(), day, "completed", 60, Some("work"))
        .unwrap();
    storage
        .record_time_block(&user(), day, "missed", 30, Some("admin"))
        .unwrap();

    let blocks = storage.block_stats(&user(), day, day).unwrap();
    assert_eq!(blocks.scheduled, 2);
    assert_eq!(blocks.completed, 1);
    assert_eq!(blocks.missed, 1);
    assert_eq!(blocks.minutes_scheduled, 90);
    assert_eq!(blocks.minutes_completed, 60);

    // Only completed blocks contribute category minutes
    let categories = storage.time_by_category(&user(), day, day).unwrap();
    assert_eq!(categories.get("work"), Some(&60));
    assert!(!categories.contains_key("admin"));

    storage
        .record_habit_entry(&user(), "habit-1", day, true, true, 7)
        .unwrap();
    storage
        .record_habit_entry(&user(), "habit-2", day, true, false, 0)
        .unwrap();

    let habits = storage.habit_stats(&user(), day, day).unwrap();
    assert_eq!(habits.due, 2);
    assert_eq!(habits.completed, 1);
    assert_eq!(habits.longest_streak, 7);
}

#[test]
fn test_activity_source_empty_ranges() {
    let storage = storage();
    let day = date(10);

    let tasks = storage.task_stats(&user(), day, day).unwrap();
    assert_eq!(tasks.created, 0);
    assert_eq!(tasks.avg_duration_minutes, 0.0);

    let blocks = storage.block_stats(&user(), day, day).unwrap();
    assert_eq!(blocks.scheduled, 0);
    assert_eq!(blocks.minutes_scheduled, 0);

    let habits = storage.habit_stats(&user(), day, day).unwrap();
    assert_eq!(habits.due, 0);
    assert_eq!(habits.longest_streak, 0);

    assert!(storage.peak_hours(&user(), day, day).unwrap().is_empty());
    assert!(storage.time_by_category(&user(), day, day).unwrap().is_empty());
}
