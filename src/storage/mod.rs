/// Storage layer: persistence contracts and the SQLite adapter
///
/// The analytics engine depends only on the traits defined here, never on
/// a concrete backend, so storage engines can be swapped behind the same
/// contract. The SQLite implementation lives in `sqlite.rs`.

pub mod migrations;
pub mod sqlite;

pub use sqlite::SqliteStorage;

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    ActionableInsight, GoalId, InsightId, InsightType, ProductivityGoal, ProductivitySnapshot,
    SessionId, SessionType, TimeSession, UserId, WeeklySummary,
};

/// Errors that can occur during storage operations
///
/// Not-found variants are expected, recoverable outcomes that callers
/// branch on; `Connection`/`Query` failures are opaque and abort the
/// operation with prior state intact.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Goal not found: {goal_id}")]
    GoalNotFound { goal_id: String },

    #[error("Insight not found: {insight_id}")]
    InsightNotFound { insight_id: String },

    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Raw task statistics for a date range, supplied by the data source
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskStats {
    pub created: u32,
    pub completed: u32,
    pub overdue: u32,
    pub avg_duration_minutes: f64,
}

/// Raw time-block statistics for a date range
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockStats {
    pub scheduled: u32,
    pub completed: u32,
    pub missed: u32,
    pub minutes_scheduled: u32,
    pub minutes_completed: u32,
}

/// Raw habit statistics for a date range
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HabitStats {
    pub due: u32,
    pub completed: u32,
    pub longest_streak: u32,
}

/// Persistence contract for daily snapshots
pub trait SnapshotStore {
    /// Insert or overwrite the snapshot for its (user, date) key
    fn upsert_snapshot(&self, snapshot: &ProductivitySnapshot) -> Result<(), StorageError>;

    fn get_snapshot(
        &self,
        user_id: &UserId,
        date: NaiveDate,
    ) -> Result<Option<ProductivitySnapshot>, StorageError>;

    /// Snapshots with dates in [start, end], ordered by date ascending
    fn get_snapshots_in_range(
        &self,
        user_id: &UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ProductivitySnapshot>, StorageError>;

    fn get_latest_snapshot(
        &self,
        user_id: &UserId,
    ) -> Result<Option<ProductivitySnapshot>, StorageError>;

    /// The most recent `count` snapshots, newest first
    fn get_recent_snapshots(
        &self,
        user_id: &UserId,
        count: u32,
    ) -> Result<Vec<ProductivitySnapshot>, StorageError>;

    /// Average productivity score over the range; zero when no snapshots
    fn average_score_in_range(
        &self,
        user_id: &UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<f64, StorageError>;
}

/// Persistence contract for weekly summaries, keyed by (user, week_start)
pub trait SummaryStore {
    fn upsert_summary(&self, summary: &WeeklySummary) -> Result<(), StorageError>;

    fn get_summary(
        &self,
        user_id: &UserId,
        week_start: NaiveDate,
    ) -> Result<Option<WeeklySummary>, StorageError>;

    /// The most recent `count` summaries, newest week first
    fn get_recent_summaries(
        &self,
        user_id: &UserId,
        count: u32,
    ) -> Result<Vec<WeeklySummary>, StorageError>;

    fn get_latest_summary(&self, user_id: &UserId) -> Result<Option<WeeklySummary>, StorageError>;
}

/// Persistence contract for productivity goals
pub trait GoalStore {
    fn create_goal(&self, goal: &ProductivityGoal) -> Result<(), StorageError>;

    fn update_goal(&self, goal: &ProductivityGoal) -> Result<(), StorageError>;

    fn get_goal(&self, goal_id: &GoalId) -> Result<ProductivityGoal, StorageError>;

    /// Goals that are unachieved and whose period contains `now`
    fn get_active_goals(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<ProductivityGoal>, StorageError>;

    /// Goals whose period overlaps [start, end]
    fn get_goals_in_period(
        &self,
        user_id: &UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ProductivityGoal>, StorageError>;

    /// Achieved goals, most recently achieved first
    fn get_achieved_goals(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<ProductivityGoal>, StorageError>;

    fn delete_goal(&self, goal_id: &GoalId) -> Result<(), StorageError>;
}

/// Persistence contract for generated insights
pub trait InsightStore {
    fn create_insight(&self, insight: &ActionableInsight) -> Result<(), StorageError>;

    fn update_insight(&self, insight: &ActionableInsight) -> Result<(), StorageError>;

    fn get_insight(&self, insight_id: &InsightId) -> Result<ActionableInsight, StorageError>;

    /// Insights that are currently actionable for the user
    fn get_active_insights(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<ActionableInsight>, StorageError>;

    /// All stored insights of the given type for the user, newest first
    fn get_insights_by_type(
        &self,
        user_id: &UserId,
        insight_type: InsightType,
    ) -> Result<Vec<ActionableInsight>, StorageError>;

    fn get_recent_insights(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<ActionableInsight>, StorageError>;

    fn delete_insight(&self, insight_id: &InsightId) -> Result<(), StorageError>;

    /// Bulk housekeeping: remove insights whose validity window has passed
    fn delete_expired_insights(&self, now: DateTime<Utc>) -> Result<usize, StorageError>;
}

/// Persistence contract for tracked time sessions
pub trait SessionStore {
    fn create_session(&self, session: &TimeSession) -> Result<(), StorageError>;

    fn update_session(&self, session: &TimeSession) -> Result<(), StorageError>;

    fn get_session(&self, session_id: &SessionId) -> Result<TimeSession, StorageError>;

    /// The single active session for the user, if any
    fn get_active_session(&self, user_id: &UserId) -> Result<Option<TimeSession>, StorageError>;

    fn get_sessions_in_range(
        &self,
        user_id: &UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TimeSession>, StorageError>;

    fn get_sessions_by_type(
        &self,
        user_id: &UserId,
        session_type: SessionType,
        limit: u32,
    ) -> Result<Vec<TimeSession>, StorageError>;

    /// Sum of completed focus-session minutes in the range
    fn total_focus_minutes(
        &self,
        user_id: &UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64, StorageError>;

    fn delete_session(&self, session_id: &SessionId) -> Result<(), StorageError>;
}

/// Read-only contract over the raw activity records the capture layer
/// writes (tasks, time blocks, habit completions)
///
/// The snapshot scorer pulls one day at a time through this interface; it
/// never touches the underlying tables directly.
pub trait ActivitySource {
    fn task_stats(
        &self,
        user_id: &UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TaskStats, StorageError>;

    fn block_stats(
        &self,
        user_id: &UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BlockStats, StorageError>;

    fn habit_stats(
        &self,
        user_id: &UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HabitStats, StorageError>;

    /// Hour of day mapped to completions recorded in that hour
    fn peak_hours(
        &self,
        user_id: &UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HashMap<u8, u32>, StorageError>;

    /// Category name mapped to minutes spent
    fn time_by_category(
        &self,
        user_id: &UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HashMap<String, u32>, StorageError>;
}
