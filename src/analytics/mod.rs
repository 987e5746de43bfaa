/// The analytics engine: synchronous computation over fetched data
///
/// Every operation takes an explicit user, reads through the storage
/// traits, runs pure domain logic, and writes the result back. The engine
/// never holds state of its own and never depends on a concrete storage
/// backend.

pub mod insights;
pub mod trend;

pub use insights::{generate_insights, InsightReport};
pub use trend::{calculate_trend, MetricTrend, TrendReport};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::domain::{
    period, ActionableInsight, DomainError, GoalId, GoalType, InsightId, PeriodType,
    ProductivityGoal, ProductivitySnapshot, SessionId, SessionType, SnapshotBuilder, TimeSession,
    UserId, WeeklySummary,
};
use crate::storage::{
    ActivitySource, GoalStore, InsightStore, SessionStore, SnapshotStore, StorageError,
    SummaryStore,
};

/// Errors surfaced by engine operations
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("No active session for user {user_id}")]
    NoActiveSession { user_id: String },
}

/// Days of snapshot history pulled into the dashboard
const DASHBOARD_RECENT_DAYS: u32 = 7;

/// Result of a weekly summary computation
#[derive(Debug, Clone, Serialize)]
pub struct WeeklySummaryResult {
    pub summary: WeeklySummary,
    /// Days of the week that actually had a snapshot
    pub days_with_data: u32,
    pub trend_text: &'static str,
    /// True once all seven days of the week have data
    pub is_complete: bool,
}

/// Snapshot of everything the user sees at a glance
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub today: Option<ProductivitySnapshot>,
    pub this_week: Option<WeeklySummary>,
    pub active_session: Option<TimeSession>,
    pub active_goals: Vec<ProductivityGoal>,
    pub recent_snapshots: Vec<ProductivitySnapshot>,
    pub avg_score_last_week: f64,
    pub focus_minutes_this_week: i64,
}

/// Compute (or recompute) the snapshot for one user-day and persist it
///
/// Task, block and habit stats come from the activity source; focus stats
/// come from completed focus sessions recorded that day. Recomputing an
/// existing day overwrites it in place.
pub fn compute_snapshot<S>(
    storage: &S,
    user_id: &UserId,
    date: NaiveDate,
) -> Result<ProductivitySnapshot, EngineError>
where
    S: ActivitySource + SessionStore + SnapshotStore,
{
    let tasks = storage.task_stats(user_id, date, date)?;
    let blocks = storage.block_stats(user_id, date, date)?;
    let habits = storage.habit_stats(user_id, date, date)?;
    let peak_hours = storage.peak_hours(user_id, date, date)?;
    let time_by_category = storage.time_by_category(user_id, date, date)?;

    let day_sessions = storage.get_sessions_in_range(
        user_id,
        period::start_of_day(date),
        period::end_of_day(date),
    )?;
    let focus: Vec<&TimeSession> = day_sessions
        .iter()
        .filter(|s| {
            s.session_type == SessionType::Focus
                && s.status == crate::domain::SessionStatus::Completed
        })
        .collect();
    let focus_minutes: i64 = focus.iter().filter_map(|s| s.duration_minutes).sum();

    let snapshot = SnapshotBuilder::new(user_id.clone(), date)
        .task_metrics(
            tasks.created,
            tasks.completed,
            tasks.overdue,
            tasks.avg_duration_minutes,
        )
        .block_metrics(
            blocks.scheduled,
            blocks.completed,
            blocks.missed,
            blocks.minutes_scheduled,
            blocks.minutes_completed,
        )
        .habit_metrics(habits.due, habits.completed, habits.longest_streak)
        .focus_metrics(focus.len() as u32, focus_minutes.max(0) as u32)
        .peak_hours(peak_hours)
        .time_by_category(time_by_category)
        .build();

    storage.upsert_snapshot(&snapshot)?;

    tracing::info!(
        "Computed snapshot for {} on {}: score {}",
        user_id.as_str(),
        date,
        snapshot.productivity_score
    );
    Ok(snapshot)
}

/// Roll up the week containing `reference` into a summary and persist it
pub fn compute_weekly_summary<S>(
    storage: &S,
    user_id: &UserId,
    reference: NaiveDate,
    now: DateTime<Utc>,
) -> Result<WeeklySummaryResult, EngineError>
where
    S: SnapshotStore + SummaryStore,
{
    let week_start = period::week_start(reference);
    let week_end = week_start + Duration::days(6);

    let snapshots = storage.get_snapshots_in_range(user_id, week_start, week_end)?;
    let previous = storage.get_summary(user_id, week_start - Duration::days(7))?;

    let summary =
        WeeklySummary::from_snapshots(user_id.clone(), reference, &snapshots, previous.as_ref(), now);
    storage.upsert_summary(&summary)?;

    let days_with_data = snapshots.len() as u32;
    Ok(WeeklySummaryResult {
        trend_text: summary.trend_description(),
        is_complete: days_with_data == 7,
        summary,
        days_with_data,
    })
}

/// Assemble the at-a-glance dashboard for a user
pub fn get_dashboard<S>(
    storage: &S,
    user_id: &UserId,
    now: DateTime<Utc>,
) -> Result<Dashboard, EngineError>
where
    S: SnapshotStore + SummaryStore + GoalStore + SessionStore,
{
    let today = now.date_naive();
    let week_start = period::week_start(today);

    let recent_snapshots = storage.get_recent_snapshots(user_id, DASHBOARD_RECENT_DAYS)?;
    let avg_score_last_week = storage.average_score_in_range(
        user_id,
        today - Duration::days(DASHBOARD_RECENT_DAYS as i64 - 1),
        today,
    )?;
    let focus_minutes_this_week = storage.total_focus_minutes(
        user_id,
        period::start_of_day(week_start),
        period::end_of_day(week_start + Duration::days(6)),
    )?;

    Ok(Dashboard {
        today: storage.get_snapshot(user_id, today)?,
        this_week: storage.get_summary(user_id, week_start)?,
        active_session: storage.get_active_session(user_id)?,
        active_goals: storage.get_active_goals(user_id, now)?,
        recent_snapshots,
        avg_score_last_week,
        focus_minutes_this_week,
    })
}

/// Compare the last `days` days against the preceding window
pub fn get_trends<S>(
    storage: &S,
    user_id: &UserId,
    days: u32,
    now: DateTime<Utc>,
) -> Result<TrendReport, EngineError>
where
    S: SnapshotStore,
{
    let days = days.max(1) as i64;
    let today = now.date_naive();
    let current_start = today - Duration::days(days - 1);
    let previous_start = today - Duration::days(2 * days - 1);
    let previous_end = today - Duration::days(days);

    let current = storage.get_snapshots_in_range(user_id, current_start, today)?;
    let previous = storage.get_snapshots_in_range(user_id, previous_start, previous_end)?;

    Ok(trend::analyze(&current, &previous))
}

/// Create a goal anchored to the current period and persist it
///
/// When no explicit period is given the goal type's implied period is
/// used; a `HabitStreak` goal must name its period explicitly.
pub fn create_goal<S>(
    storage: &S,
    user_id: &UserId,
    goal_type: GoalType,
    target_value: u32,
    period_type: Option<PeriodType>,
    now: DateTime<Utc>,
) -> Result<ProductivityGoal, EngineError>
where
    S: GoalStore,
{
    let period_type = period_type
        .or_else(|| goal_type.implied_period())
        .ok_or_else(|| DomainError::Validation {
            message: format!(
                "Goal type {} requires an explicit period",
                goal_type.as_str()
            ),
        })?;

    let goal = ProductivityGoal::new(user_id.clone(), goal_type, target_value, period_type, now)?;
    storage.create_goal(&goal)?;
    Ok(goal)
}

/// Set absolute progress on a goal
pub fn update_goal_progress<S>(
    storage: &S,
    goal_id: &GoalId,
    value: u32,
    now: DateTime<Utc>,
) -> Result<ProductivityGoal, EngineError>
where
    S: GoalStore,
{
    let mut goal = storage.get_goal(goal_id)?;
    goal.update_progress(value, now)?;
    storage.update_goal(&goal)?;
    Ok(goal)
}

/// Add to a goal's progress
pub fn increment_goal<S>(
    storage: &S,
    goal_id: &GoalId,
    delta: u32,
    now: DateTime<Utc>,
) -> Result<ProductivityGoal, EngineError>
where
    S: GoalStore,
{
    let mut goal = storage.get_goal(goal_id)?;
    goal.increment_progress(delta, now)?;
    storage.update_goal(&goal)?;
    Ok(goal)
}

/// Dismiss an insight; a cross-user dismissal silently does nothing
pub fn dismiss_insight<S>(
    storage: &S,
    user_id: &UserId,
    insight_id: &InsightId,
    now: DateTime<Utc>,
) -> Result<Option<ActionableInsight>, EngineError>
where
    S: InsightStore,
{
    let mut insight = storage.get_insight(insight_id)?;
    if insight.user_id != *user_id {
        tracing::warn!(
            "User {} attempted to dismiss insight {} owned by another user",
            user_id.as_str(),
            insight_id.to_string()
        );
        return Ok(None);
    }
    insight.dismiss(now);
    storage.update_insight(&insight)?;
    Ok(Some(insight))
}

/// Mark an insight acted on; cross-user marking silently does nothing
pub fn mark_insight_acted<S>(
    storage: &S,
    user_id: &UserId,
    insight_id: &InsightId,
    now: DateTime<Utc>,
) -> Result<Option<ActionableInsight>, EngineError>
where
    S: InsightStore,
{
    let mut insight = storage.get_insight(insight_id)?;
    if insight.user_id != *user_id {
        tracing::warn!(
            "User {} attempted to act on insight {} owned by another user",
            user_id.as_str(),
            insight_id.to_string()
        );
        return Ok(None);
    }
    insight.mark_acted_on(now);
    storage.update_insight(&insight)?;
    Ok(Some(insight))
}

/// Start a session; fails while another session is active for the user
pub fn start_session<S>(
    storage: &S,
    user_id: &UserId,
    session_type: SessionType,
    title: String,
    reference_id: Option<String>,
    category: Option<String>,
    now: DateTime<Utc>,
) -> Result<TimeSession, EngineError>
where
    S: SessionStore,
{
    if let Some(active) = storage.get_active_session(user_id)? {
        return Err(DomainError::SessionAlreadyActive {
            session_id: active.id.to_string(),
        }
        .into());
    }

    let session = TimeSession::start(
        user_id.clone(),
        session_type,
        title,
        reference_id,
        category,
        now,
    )?;
    storage.create_session(&session)?;
    Ok(session)
}

/// End the user's active session as completed
pub fn end_session<S>(
    storage: &S,
    user_id: &UserId,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> Result<TimeSession, EngineError>
where
    S: SessionStore,
{
    let mut session =
        storage
            .get_active_session(user_id)?
            .ok_or_else(|| EngineError::NoActiveSession {
                user_id: user_id.as_str().to_string(),
            })?;
    session.end(now, notes)?;
    storage.update_session(&session)?;
    Ok(session)
}

/// End the user's active session as interrupted
pub fn interrupt_session<S>(
    storage: &S,
    user_id: &UserId,
    now: DateTime<Utc>,
) -> Result<TimeSession, EngineError>
where
    S: SessionStore,
{
    let mut session =
        storage
            .get_active_session(user_id)?
            .ok_or_else(|| EngineError::NoActiveSession {
                user_id: user_id.as_str().to_string(),
            })?;
    session.interrupt(now)?;
    storage.update_session(&session)?;
    Ok(session)
}

/// Dismiss an insight by id string, resolving the id for callers that only
/// hold text (the tool layer)
pub fn parse_insight_id(raw: &str) -> Result<InsightId, EngineError> {
    InsightId::from_string(raw).map_err(|_| {
        DomainError::Validation {
            message: format!("Invalid insight id: {}", raw),
        }
        .into()
    })
}

/// Resolve a goal id from text
pub fn parse_goal_id(raw: &str) -> Result<GoalId, EngineError> {
    GoalId::from_string(raw).map_err(|_| {
        DomainError::Validation {
            message: format!("Invalid goal id: {}", raw),
        }
        .into()
    })
}
