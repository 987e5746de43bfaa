/// SQLite implementation of the persistence contracts
///
/// One `SqliteStorage` implements every store trait plus the activity
/// source, so the engine can be handed a single value for all of its
/// collaborator needs. Datetimes are stored as RFC 3339 text, dates as
/// ISO `YYYY-MM-DD`, and the peak-hours/time-by-category maps as JSON.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, Row};

use crate::domain::{
    ActionableInsight, GoalId, GoalType, InsightId, InsightPriority, InsightType, PeriodType,
    ProductivityGoal, ProductivitySnapshot, SessionId, SessionStatus, SessionType,
    SnapshotBuilder, TimeSession, UserId, WeeklySummary,
};
use crate::domain::summary::DayScore;
use crate::storage::{
    migrations, ActivitySource, BlockStats, GoalStore, HabitStats, InsightStore, SessionStore,
    SnapshotStore, StorageError, SummaryStore, TaskStats,
};

/// SQLite-based storage implementation
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Open the database file and run any pending migrations
    pub fn new(db_path: PathBuf) -> Result<Self, StorageError> {
        let conn = Connection::open(&db_path)
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;

        conn.execute("PRAGMA foreign_keys = ON", [])
            .map_err(|e| StorageError::Connection(format!("Failed to enable foreign keys: {}", e)))?;

        migrations::initialize_database(&conn)?;

        tracing::info!("SQLite storage initialized at: {:?}", db_path);

        Ok(Self { conn })
    }

    /// In-memory database, mainly for tests
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;
        migrations::initialize_database(&conn)?;
        Ok(Self { conn })
    }

    // Capture-layer write helpers for the raw activity tables. The engine
    // itself never calls these; they exist for the recording surface and
    // for tests that need raw data to aggregate.

    #[allow(clippy::too_many_arguments)]
    pub fn record_task(
        &self,
        user_id: &UserId,
        created_on: NaiveDate,
        completed_on: Option<NaiveDate>,
        completed_hour: Option<u8>,
        due_on: Option<NaiveDate>,
        duration_minutes: Option<u32>,
        category: Option<&str>,
    ) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO tasks (id, user_id, created_on, completed_on, completed_hour,
                                due_on, duration_minutes, category)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                uuid::Uuid::new_v4().to_string(),
                user_id.as_str(),
                created_on.to_string(),
                completed_on.map(|d| d.to_string()),
                completed_hour,
                due_on.map(|d| d.to_string()),
                duration_minutes,
                category,
            ],
        )?;
        Ok(())
    }

    pub fn record_time_block(
        &self,
        user_id: &UserId,
        date: NaiveDate,
        status: &str,
        minutes: u32,
        category: Option<&str>,
    ) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO time_blocks (id, user_id, date, status, minutes, category)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                uuid::Uuid::new_v4().to_string(),
                user_id.as_str(),
                date.to_string(),
                status,
                minutes,
                category,
            ],
        )?;
        Ok(())
    }

    pub fn record_habit_entry(
        &self,
        user_id: &UserId,
        habit_id: &str,
        date: NaiveDate,
        due: bool,
        completed: bool,
        streak: u32,
    ) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO habit_entries (id, user_id, habit_id, date, due, completed, streak)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                uuid::Uuid::new_v4().to_string(),
                user_id.as_str(),
                habit_id,
                date.to_string(),
                due,
                completed,
                streak,
            ],
        )?;
        Ok(())
    }
}

// Row conversion helpers. Parse failures surface as InvalidColumnType so
// they flow through rusqlite's error channel like any other bad column.

fn column_error(index: usize, what: &str) -> rusqlite::Error {
    rusqlite::Error::InvalidColumnType(index, what.to_string(), rusqlite::types::Type::Text)
}

fn parse_datetime(index: usize, s: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| column_error(index, "Invalid datetime"))
}

fn parse_opt_datetime(
    index: usize,
    s: Option<String>,
) -> Result<Option<DateTime<Utc>>, rusqlite::Error> {
    match s {
        Some(s) => parse_datetime(index, &s).map(Some),
        None => Ok(None),
    }
}

fn parse_date(index: usize, s: &str) -> Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| column_error(index, "Invalid date"))
}

fn snapshot_from_row(row: &Row<'_>) -> Result<ProductivitySnapshot, rusqlite::Error> {
    let user_id = UserId(row.get::<_, String>(0)?);
    let date_str: String = row.get(1)?;
    let date = parse_date(1, &date_str)?;

    let peak_hours_json: String = row.get(16)?;
    let peak_hours: HashMap<u8, u32> =
        serde_json::from_str(&peak_hours_json).map_err(|_| column_error(16, "Invalid JSON"))?;
    let categories_json: String = row.get(17)?;
    let time_by_category: HashMap<String, u32> =
        serde_json::from_str(&categories_json).map_err(|_| column_error(17, "Invalid JSON"))?;

    let computed_at = parse_datetime(19, &row.get::<_, String>(19)?)?;
    let created_at = parse_datetime(20, &row.get::<_, String>(20)?)?;
    let updated_at = parse_datetime(21, &row.get::<_, String>(21)?)?;

    // Rates and score are rederived from the stored counts; they are never
    // trusted from disk independently of the counts.
    let builder = SnapshotBuilder::new(user_id.clone(), date)
        .task_metrics(row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?)
        .block_metrics(
            row.get(6)?,
            row.get(7)?,
            row.get(8)?,
            row.get(9)?,
            row.get(10)?,
        )
        .habit_metrics(row.get(11)?, row.get(12)?, row.get(13)?)
        .focus_metrics(row.get(14)?, row.get(15)?)
        .peak_hours(peak_hours)
        .time_by_category(time_by_category);

    Ok(ProductivitySnapshot::from_existing(
        user_id, date, builder, computed_at, created_at, updated_at,
    ))
}

fn summary_from_row(row: &Row<'_>) -> Result<WeeklySummary, rusqlite::Error> {
    let best_day = match (
        row.get::<_, Option<String>>(12)?,
        row.get::<_, Option<u32>>(13)?,
    ) {
        (Some(date), Some(score)) => Some(DayScore {
            date: parse_date(12, &date)?,
            score,
        }),
        _ => None,
    };
    let worst_day = match (
        row.get::<_, Option<String>>(14)?,
        row.get::<_, Option<u32>>(15)?,
    ) {
        (Some(date), Some(score)) => Some(DayScore {
            date: parse_date(14, &date)?,
            score,
        }),
        _ => None,
    };

    Ok(WeeklySummary {
        user_id: UserId(row.get::<_, String>(0)?),
        week_start: parse_date(1, &row.get::<_, String>(1)?)?,
        week_end: parse_date(2, &row.get::<_, String>(2)?)?,
        tasks_completed: row.get(3)?,
        habits_completed: row.get(4)?,
        blocks_completed: row.get(5)?,
        focus_minutes: row.get(6)?,
        avg_productivity_score: row.get(7)?,
        avg_focus_minutes: row.get(8)?,
        productivity_trend_pct: row.get(9)?,
        focus_trend_pct: row.get(10)?,
        best_day,
        worst_day,
        habits_with_streak: row.get(16)?,
        longest_streak: row.get(17)?,
        created_at: parse_datetime(18, &row.get::<_, String>(18)?)?,
        updated_at: parse_datetime(19, &row.get::<_, String>(19)?)?,
    })
}

fn goal_from_row(row: &Row<'_>) -> Result<ProductivityGoal, rusqlite::Error> {
    let id = GoalId::from_string(&row.get::<_, String>(0)?)
        .map_err(|_| column_error(0, "Invalid UUID"))?;
    let goal_type = GoalType::parse(&row.get::<_, String>(2)?)
        .map_err(|_| column_error(2, "Invalid goal type"))?;
    let period_type = PeriodType::parse(&row.get::<_, String>(5)?)
        .map_err(|_| column_error(5, "Invalid period type"))?;

    Ok(ProductivityGoal::from_existing(
        id,
        UserId(row.get::<_, String>(1)?),
        goal_type,
        row.get(3)?,
        row.get(4)?,
        period_type,
        parse_datetime(6, &row.get::<_, String>(6)?)?,
        parse_datetime(7, &row.get::<_, String>(7)?)?,
        row.get(8)?,
        parse_opt_datetime(9, row.get(9)?)?,
        parse_datetime(10, &row.get::<_, String>(10)?)?,
    ))
}

fn insight_from_row(row: &Row<'_>) -> Result<ActionableInsight, rusqlite::Error> {
    let id = InsightId::from_string(&row.get::<_, String>(0)?)
        .map_err(|_| column_error(0, "Invalid UUID"))?;
    let insight_type = InsightType::parse(&row.get::<_, String>(2)?)
        .map_err(|_| column_error(2, "Invalid insight type"))?;
    let priority = InsightPriority::parse(&row.get::<_, String>(3)?)
        .map_err(|_| column_error(3, "Invalid priority"))?;
    let context_json: String = row.get(7)?;
    let context: HashMap<String, serde_json::Value> =
        serde_json::from_str(&context_json).map_err(|_| column_error(7, "Invalid JSON"))?;

    Ok(ActionableInsight::from_existing(
        id,
        UserId(row.get::<_, String>(1)?),
        insight_type,
        priority,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        context,
        parse_datetime(8, &row.get::<_, String>(8)?)?,
        parse_datetime(9, &row.get::<_, String>(9)?)?,
        row.get(10)?,
        parse_opt_datetime(11, row.get(11)?)?,
        row.get(12)?,
        parse_opt_datetime(13, row.get(13)?)?,
        parse_datetime(14, &row.get::<_, String>(14)?)?,
    ))
}

fn session_from_row(row: &Row<'_>) -> Result<TimeSession, rusqlite::Error> {
    let id = SessionId::from_string(&row.get::<_, String>(0)?)
        .map_err(|_| column_error(0, "Invalid UUID"))?;
    let session_type = SessionType::parse(&row.get::<_, String>(2)?)
        .map_err(|_| column_error(2, "Invalid session type"))?;
    let status = SessionStatus::parse(&row.get::<_, String>(9)?)
        .map_err(|_| column_error(9, "Invalid session status"))?;

    Ok(TimeSession::from_existing(
        id,
        UserId(row.get::<_, String>(1)?),
        session_type,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        parse_datetime(6, &row.get::<_, String>(6)?)?,
        parse_opt_datetime(7, row.get(7)?)?,
        row.get(8)?,
        status,
        row.get(10)?,
        row.get(11)?,
    ))
}

const SNAPSHOT_COLUMNS: &str = "user_id, date, tasks_created, tasks_completed, tasks_overdue,
    avg_task_duration_minutes, blocks_scheduled, blocks_completed, blocks_missed,
    block_minutes_scheduled, block_minutes_completed, habits_due, habits_completed,
    longest_habit_streak, focus_sessions, focus_minutes, peak_hours, time_by_category,
    productivity_score, computed_at, created_at, updated_at";

const SUMMARY_COLUMNS: &str = "user_id, week_start, week_end, tasks_completed,
    habits_completed, blocks_completed, focus_minutes, avg_productivity_score,
    avg_focus_minutes, productivity_trend_pct, focus_trend_pct, best_day_date,
    best_day_score, worst_day_date, worst_day_score, habits_with_streak,
    longest_streak, created_at, updated_at";

const GOAL_COLUMNS: &str = "id, user_id, goal_type, target_value, current_value,
    period_type, period_start, period_end, achieved, achieved_at, created_at";

const INSIGHT_COLUMNS: &str = "id, user_id, insight_type, priority, title, description,
    suggestion, context, valid_from, valid_to, dismissed, dismissed_at, acted_on,
    acted_on_at, created_at";

const SESSION_COLUMNS: &str = "id, user_id, session_type, reference_id, title, category,
    started_at, ended_at, duration_minutes, status, interruptions, notes";

impl SnapshotStore for SqliteStorage {
    fn upsert_snapshot(&self, snapshot: &ProductivitySnapshot) -> Result<(), StorageError> {
        let peak_hours = serde_json::to_string(&snapshot.peak_hours)?;
        let time_by_category = serde_json::to_string(&snapshot.time_by_category)?;

        // created_at survives re-computation of the same day
        self.conn.execute(
            "INSERT INTO snapshots (
                user_id, date, tasks_created, tasks_completed, tasks_overdue,
                avg_task_duration_minutes, blocks_scheduled, blocks_completed,
                blocks_missed, block_minutes_scheduled, block_minutes_completed,
                habits_due, habits_completed, longest_habit_streak, focus_sessions,
                focus_minutes, peak_hours, time_by_category, productivity_score,
                computed_at, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                       ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)
             ON CONFLICT (user_id, date) DO UPDATE SET
                tasks_created = excluded.tasks_created,
                tasks_completed = excluded.tasks_completed,
                tasks_overdue = excluded.tasks_overdue,
                avg_task_duration_minutes = excluded.avg_task_duration_minutes,
                blocks_scheduled = excluded.blocks_scheduled,
                blocks_completed = excluded.blocks_completed,
                blocks_missed = excluded.blocks_missed,
                block_minutes_scheduled = excluded.block_minutes_scheduled,
                block_minutes_completed = excluded.block_minutes_completed,
                habits_due = excluded.habits_due,
                habits_completed = excluded.habits_completed,
                longest_habit_streak = excluded.longest_habit_streak,
                focus_sessions = excluded.focus_sessions,
                focus_minutes = excluded.focus_minutes,
                peak_hours = excluded.peak_hours,
                time_by_category = excluded.time_by_category,
                productivity_score = excluded.productivity_score,
                computed_at = excluded.computed_at,
                updated_at = excluded.updated_at",
            params![
                snapshot.user_id.as_str(),
                snapshot.date.to_string(),
                snapshot.tasks_created,
                snapshot.tasks_completed,
                snapshot.tasks_overdue,
                snapshot.avg_task_duration_minutes,
                snapshot.blocks_scheduled,
                snapshot.blocks_completed,
                snapshot.blocks_missed,
                snapshot.block_minutes_scheduled,
                snapshot.block_minutes_completed,
                snapshot.habits_due,
                snapshot.habits_completed,
                snapshot.longest_habit_streak,
                snapshot.focus_sessions,
                snapshot.focus_minutes,
                peak_hours,
                time_by_category,
                snapshot.productivity_score,
                snapshot.computed_at.to_rfc3339(),
                snapshot.created_at.to_rfc3339(),
                snapshot.updated_at.to_rfc3339(),
            ],
        )?;

        tracing::debug!(
            "Upserted snapshot for {} on {}",
            snapshot.user_id.as_str(),
            snapshot.date
        );
        Ok(())
    }

    fn get_snapshot(
        &self,
        user_id: &UserId,
        date: NaiveDate,
    ) -> Result<Option<ProductivitySnapshot>, StorageError> {
        let sql = format!(
            "SELECT {} FROM snapshots WHERE user_id = ?1 AND date = ?2",
            SNAPSHOT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;

        match stmt.query_row(params![user_id.as_str(), date.to_string()], snapshot_from_row) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StorageError::Query(e)),
        }
    }

    fn get_snapshots_in_range(
        &self,
        user_id: &UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ProductivitySnapshot>, StorageError> {
        let sql = format!(
            "SELECT {} FROM snapshots
             WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3
             ORDER BY date ASC",
            SNAPSHOT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![user_id.as_str(), start.to_string(), end.to_string()],
            snapshot_from_row,
        )?;

        let mut snapshots = Vec::new();
        for snapshot in rows {
            snapshots.push(snapshot?);
        }
        Ok(snapshots)
    }

    fn get_latest_snapshot(
        &self,
        user_id: &UserId,
    ) -> Result<Option<ProductivitySnapshot>, StorageError> {
        let sql = format!(
            "SELECT {} FROM snapshots WHERE user_id = ?1 ORDER BY date DESC LIMIT 1",
            SNAPSHOT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;

        match stmt.query_row(params![user_id.as_str()], snapshot_from_row) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StorageError::Query(e)),
        }
    }

    fn get_recent_snapshots(
        &self,
        user_id: &UserId,
        count: u32,
    ) -> Result<Vec<ProductivitySnapshot>, StorageError> {
        let sql = format!(
            "SELECT {} FROM snapshots WHERE user_id = ?1 ORDER BY date DESC LIMIT ?2",
            SNAPSHOT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id.as_str(), count], snapshot_from_row)?;

        let mut snapshots = Vec::new();
        for snapshot in rows {
            snapshots.push(snapshot?);
        }
        Ok(snapshots)
    }

    fn average_score_in_range(
        &self,
        user_id: &UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<f64, StorageError> {
        let avg: f64 = self.conn.query_row(
            "SELECT COALESCE(AVG(productivity_score), 0)
             FROM snapshots WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3",
            params![user_id.as_str(), start.to_string(), end.to_string()],
            |row| row.get(0),
        )?;
        Ok(avg)
    }
}

impl SummaryStore for SqliteStorage {
    fn upsert_summary(&self, summary: &WeeklySummary) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO weekly_summaries (
                user_id, week_start, week_end, tasks_completed, habits_completed,
                blocks_completed, focus_minutes, avg_productivity_score,
                avg_focus_minutes, productivity_trend_pct, focus_trend_pct,
                best_day_date, best_day_score, worst_day_date, worst_day_score,
                habits_with_streak, longest_streak, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                       ?15, ?16, ?17, ?18, ?19)
             ON CONFLICT (user_id, week_start) DO UPDATE SET
                week_end = excluded.week_end,
                tasks_completed = excluded.tasks_completed,
                habits_completed = excluded.habits_completed,
                blocks_completed = excluded.blocks_completed,
                focus_minutes = excluded.focus_minutes,
                avg_productivity_score = excluded.avg_productivity_score,
                avg_focus_minutes = excluded.avg_focus_minutes,
                productivity_trend_pct = excluded.productivity_trend_pct,
                focus_trend_pct = excluded.focus_trend_pct,
                best_day_date = excluded.best_day_date,
                best_day_score = excluded.best_day_score,
                worst_day_date = excluded.worst_day_date,
                worst_day_score = excluded.worst_day_score,
                habits_with_streak = excluded.habits_with_streak,
                longest_streak = excluded.longest_streak,
                updated_at = excluded.updated_at",
            params![
                summary.user_id.as_str(),
                summary.week_start.to_string(),
                summary.week_end.to_string(),
                summary.tasks_completed,
                summary.habits_completed,
                summary.blocks_completed,
                summary.focus_minutes,
                summary.avg_productivity_score,
                summary.avg_focus_minutes,
                summary.productivity_trend_pct,
                summary.focus_trend_pct,
                summary.best_day.map(|d| d.date.to_string()),
                summary.best_day.map(|d| d.score),
                summary.worst_day.map(|d| d.date.to_string()),
                summary.worst_day.map(|d| d.score),
                summary.habits_with_streak,
                summary.longest_streak,
                summary.created_at.to_rfc3339(),
                summary.updated_at.to_rfc3339(),
            ],
        )?;

        tracing::debug!(
            "Upserted weekly summary for {} week {}",
            summary.user_id.as_str(),
            summary.week_start
        );
        Ok(())
    }

    fn get_summary(
        &self,
        user_id: &UserId,
        week_start: NaiveDate,
    ) -> Result<Option<WeeklySummary>, StorageError> {
        let sql = format!(
            "SELECT {} FROM weekly_summaries WHERE user_id = ?1 AND week_start = ?2",
            SUMMARY_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;

        match stmt.query_row(
            params![user_id.as_str(), week_start.to_string()],
            summary_from_row,
        ) {
            Ok(summary) => Ok(Some(summary)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StorageError::Query(e)),
        }
    }

    fn get_recent_summaries(
        &self,
        user_id: &UserId,
        count: u32,
    ) -> Result<Vec<WeeklySummary>, StorageError> {
        let sql = format!(
            "SELECT {} FROM weekly_summaries WHERE user_id = ?1
             ORDER BY week_start DESC LIMIT ?2",
            SUMMARY_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id.as_str(), count], summary_from_row)?;

        let mut summaries = Vec::new();
        for summary in rows {
            summaries.push(summary?);
        }
        Ok(summaries)
    }

    fn get_latest_summary(&self, user_id: &UserId) -> Result<Option<WeeklySummary>, StorageError> {
        let sql = format!(
            "SELECT {} FROM weekly_summaries WHERE user_id = ?1
             ORDER BY week_start DESC LIMIT 1",
            SUMMARY_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;

        match stmt.query_row(params![user_id.as_str()], summary_from_row) {
            Ok(summary) => Ok(Some(summary)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StorageError::Query(e)),
        }
    }
}

impl GoalStore for SqliteStorage {
    fn create_goal(&self, goal: &ProductivityGoal) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO goals (
                id, user_id, goal_type, target_value, current_value, period_type,
                period_start, period_end, achieved, achieved_at, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                goal.id.to_string(),
                goal.user_id.as_str(),
                goal.goal_type.as_str(),
                goal.target_value,
                goal.current_value,
                goal.period_type.as_str(),
                goal.period_start.to_rfc3339(),
                goal.period_end.to_rfc3339(),
                goal.achieved,
                goal.achieved_at.map(|t| t.to_rfc3339()),
                goal.created_at.to_rfc3339(),
            ],
        )?;

        tracing::debug!("Created goal {} ({})", goal.id.to_string(), goal.goal_type.as_str());
        Ok(())
    }

    fn update_goal(&self, goal: &ProductivityGoal) -> Result<(), StorageError> {
        let rows_affected = self.conn.execute(
            "UPDATE goals SET
                current_value = ?2,
                achieved = ?3,
                achieved_at = ?4
             WHERE id = ?1",
            params![
                goal.id.to_string(),
                goal.current_value,
                goal.achieved,
                goal.achieved_at.map(|t| t.to_rfc3339()),
            ],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::GoalNotFound {
                goal_id: goal.id.to_string(),
            });
        }

        tracing::debug!("Updated goal {}", goal.id.to_string());
        Ok(())
    }

    fn get_goal(&self, goal_id: &GoalId) -> Result<ProductivityGoal, StorageError> {
        let sql = format!("SELECT {} FROM goals WHERE id = ?1", GOAL_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;

        match stmt.query_row(params![goal_id.to_string()], goal_from_row) {
            Ok(goal) => Ok(goal),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(StorageError::GoalNotFound {
                goal_id: goal_id.to_string(),
            }),
            Err(e) => Err(StorageError::Query(e)),
        }
    }

    fn get_active_goals(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<ProductivityGoal>, StorageError> {
        let sql = format!(
            "SELECT {} FROM goals
             WHERE user_id = ?1 AND achieved = 0
               AND period_start <= ?2 AND period_end >= ?2
             ORDER BY created_at DESC",
            GOAL_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id.as_str(), now.to_rfc3339()], goal_from_row)?;

        let mut goals = Vec::new();
        for goal in rows {
            goals.push(goal?);
        }
        Ok(goals)
    }

    fn get_goals_in_period(
        &self,
        user_id: &UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ProductivityGoal>, StorageError> {
        let sql = format!(
            "SELECT {} FROM goals
             WHERE user_id = ?1 AND period_start <= ?3 AND period_end >= ?2
             ORDER BY created_at DESC",
            GOAL_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![user_id.as_str(), start.to_rfc3339(), end.to_rfc3339()],
            goal_from_row,
        )?;

        let mut goals = Vec::new();
        for goal in rows {
            goals.push(goal?);
        }
        Ok(goals)
    }

    fn get_achieved_goals(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<ProductivityGoal>, StorageError> {
        let sql = format!(
            "SELECT {} FROM goals
             WHERE user_id = ?1 AND achieved = 1
             ORDER BY achieved_at DESC LIMIT ?2",
            GOAL_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id.as_str(), limit], goal_from_row)?;

        let mut goals = Vec::new();
        for goal in rows {
            goals.push(goal?);
        }
        Ok(goals)
    }

    fn delete_goal(&self, goal_id: &GoalId) -> Result<(), StorageError> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM goals WHERE id = ?1", params![goal_id.to_string()])?;

        if rows_affected == 0 {
            return Err(StorageError::GoalNotFound {
                goal_id: goal_id.to_string(),
            });
        }
        Ok(())
    }
}

impl InsightStore for SqliteStorage {
    fn create_insight(&self, insight: &ActionableInsight) -> Result<(), StorageError> {
        let context = serde_json::to_string(&insight.context)?;

        self.conn.execute(
            "INSERT INTO insights (
                id, user_id, insight_type, priority, title, description, suggestion,
                context, valid_from, valid_to, dismissed, dismissed_at, acted_on,
                acted_on_at, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                insight.id.to_string(),
                insight.user_id.as_str(),
                insight.insight_type.as_str(),
                insight.priority.as_str(),
                insight.title,
                insight.description,
                insight.suggestion,
                context,
                insight.valid_from.to_rfc3339(),
                insight.valid_to.to_rfc3339(),
                insight.dismissed,
                insight.dismissed_at.map(|t| t.to_rfc3339()),
                insight.acted_on,
                insight.acted_on_at.map(|t| t.to_rfc3339()),
                insight.created_at.to_rfc3339(),
            ],
        )?;

        tracing::debug!(
            "Created insight {} ({})",
            insight.id.to_string(),
            insight.insight_type.as_str()
        );
        Ok(())
    }

    fn update_insight(&self, insight: &ActionableInsight) -> Result<(), StorageError> {
        let rows_affected = self.conn.execute(
            "UPDATE insights SET
                dismissed = ?2,
                dismissed_at = ?3,
                acted_on = ?4,
                acted_on_at = ?5
             WHERE id = ?1",
            params![
                insight.id.to_string(),
                insight.dismissed,
                insight.dismissed_at.map(|t| t.to_rfc3339()),
                insight.acted_on,
                insight.acted_on_at.map(|t| t.to_rfc3339()),
            ],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::InsightNotFound {
                insight_id: insight.id.to_string(),
            });
        }
        Ok(())
    }

    fn get_insight(&self, insight_id: &InsightId) -> Result<ActionableInsight, StorageError> {
        let sql = format!("SELECT {} FROM insights WHERE id = ?1", INSIGHT_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;

        match stmt.query_row(params![insight_id.to_string()], insight_from_row) {
            Ok(insight) => Ok(insight),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(StorageError::InsightNotFound {
                insight_id: insight_id.to_string(),
            }),
            Err(e) => Err(StorageError::Query(e)),
        }
    }

    fn get_active_insights(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<ActionableInsight>, StorageError> {
        let sql = format!(
            "SELECT {} FROM insights
             WHERE user_id = ?1 AND dismissed = 0 AND acted_on = 0
               AND valid_from <= ?2 AND valid_to >= ?2
             ORDER BY created_at DESC",
            INSIGHT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id.as_str(), now.to_rfc3339()], insight_from_row)?;

        let mut insights = Vec::new();
        for insight in rows {
            insights.push(insight?);
        }
        Ok(insights)
    }

    fn get_insights_by_type(
        &self,
        user_id: &UserId,
        insight_type: InsightType,
    ) -> Result<Vec<ActionableInsight>, StorageError> {
        let sql = format!(
            "SELECT {} FROM insights
             WHERE user_id = ?1 AND insight_type = ?2
             ORDER BY created_at DESC",
            INSIGHT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![user_id.as_str(), insight_type.as_str()],
            insight_from_row,
        )?;

        let mut insights = Vec::new();
        for insight in rows {
            insights.push(insight?);
        }
        Ok(insights)
    }

    fn get_recent_insights(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<ActionableInsight>, StorageError> {
        let sql = format!(
            "SELECT {} FROM insights WHERE user_id = ?1
             ORDER BY created_at DESC LIMIT ?2",
            INSIGHT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id.as_str(), limit], insight_from_row)?;

        let mut insights = Vec::new();
        for insight in rows {
            insights.push(insight?);
        }
        Ok(insights)
    }

    fn delete_insight(&self, insight_id: &InsightId) -> Result<(), StorageError> {
        let rows_affected = self.conn.execute(
            "DELETE FROM insights WHERE id = ?1",
            params![insight_id.to_string()],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::InsightNotFound {
                insight_id: insight_id.to_string(),
            });
        }
        Ok(())
    }

    fn delete_expired_insights(&self, now: DateTime<Utc>) -> Result<usize, StorageError> {
        let deleted = self.conn.execute(
            "DELETE FROM insights WHERE valid_to < ?1",
            params![now.to_rfc3339()],
        )?;

        if deleted > 0 {
            tracing::debug!("Purged {} expired insights", deleted);
        }
        Ok(deleted)
    }
}

impl SessionStore for SqliteStorage {
    fn create_session(&self, session: &TimeSession) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO sessions (
                id, user_id, session_type, reference_id, title, category, started_at,
                ended_at, duration_minutes, status, interruptions, notes
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                session.id.to_string(),
                session.user_id.as_str(),
                session.session_type.as_str(),
                session.reference_id,
                session.title,
                session.category,
                session.started_at.to_rfc3339(),
                session.ended_at.map(|t| t.to_rfc3339()),
                session.duration_minutes,
                session.status.as_str(),
                session.interruptions,
                session.notes,
            ],
        )?;

        tracing::debug!("Created session {}", session.id.to_string());
        Ok(())
    }

    fn update_session(&self, session: &TimeSession) -> Result<(), StorageError> {
        let rows_affected = self.conn.execute(
            "UPDATE sessions SET
                ended_at = ?2,
                duration_minutes = ?3,
                status = ?4,
                interruptions = ?5,
                notes = ?6
             WHERE id = ?1",
            params![
                session.id.to_string(),
                session.ended_at.map(|t| t.to_rfc3339()),
                session.duration_minutes,
                session.status.as_str(),
                session.interruptions,
                session.notes,
            ],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::SessionNotFound {
                session_id: session.id.to_string(),
            });
        }
        Ok(())
    }

    fn get_session(&self, session_id: &SessionId) -> Result<TimeSession, StorageError> {
        let sql = format!("SELECT {} FROM sessions WHERE id = ?1", SESSION_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;

        match stmt.query_row(params![session_id.to_string()], session_from_row) {
            Ok(session) => Ok(session),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(StorageError::SessionNotFound {
                session_id: session_id.to_string(),
            }),
            Err(e) => Err(StorageError::Query(e)),
        }
    }

    fn get_active_session(&self, user_id: &UserId) -> Result<Option<TimeSession>, StorageError> {
        let sql = format!(
            "SELECT {} FROM sessions
             WHERE user_id = ?1 AND status = 'active'
             ORDER BY started_at DESC LIMIT 1",
            SESSION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;

        match stmt.query_row(params![user_id.as_str()], session_from_row) {
            Ok(session) => Ok(Some(session)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StorageError::Query(e)),
        }
    }

    fn get_sessions_in_range(
        &self,
        user_id: &UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TimeSession>, StorageError> {
        let sql = format!(
            "SELECT {} FROM sessions
             WHERE user_id = ?1 AND started_at >= ?2 AND started_at <= ?3
             ORDER BY started_at ASC",
            SESSION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![user_id.as_str(), start.to_rfc3339(), end.to_rfc3339()],
            session_from_row,
        )?;

        let mut sessions = Vec::new();
        for session in rows {
            sessions.push(session?);
        }
        Ok(sessions)
    }

    fn get_sessions_by_type(
        &self,
        user_id: &UserId,
        session_type: SessionType,
        limit: u32,
    ) -> Result<Vec<TimeSession>, StorageError> {
        let sql = format!(
            "SELECT {} FROM sessions
             WHERE user_id = ?1 AND session_type = ?2
             ORDER BY started_at DESC LIMIT ?3",
            SESSION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![user_id.as_str(), session_type.as_str(), limit],
            session_from_row,
        )?;

        let mut sessions = Vec::new();
        for session in rows {
            sessions.push(session?);
        }
        Ok(sessions)
    }

    fn total_focus_minutes(
        &self,
        user_id: &UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64, StorageError> {
        let total: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(duration_minutes), 0) FROM sessions
             WHERE user_id = ?1 AND session_type = 'focus' AND status = 'completed'
               AND started_at >= ?2 AND started_at <= ?3",
            params![user_id.as_str(), start.to_rfc3339(), end.to_rfc3339()],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    fn delete_session(&self, session_id: &SessionId) -> Result<(), StorageError> {
        let rows_affected = self.conn.execute(
            "DELETE FROM sessions WHERE id = ?1",
            params![session_id.to_string()],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::SessionNotFound {
                session_id: session_id.to_string(),
            });
        }
        Ok(())
    }
}

impl ActivitySource for SqliteStorage {
    fn task_stats(
        &self,
        user_id: &UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TaskStats, StorageError> {
        let created: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE user_id = ?1 AND created_on BETWEEN ?2 AND ?3",
            params![user_id.as_str(), start.to_string(), end.to_string()],
            |row| row.get(0),
        )?;

        let (completed, avg_duration_minutes): (u32, f64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(AVG(duration_minutes), 0)
             FROM tasks WHERE user_id = ?1 AND completed_on BETWEEN ?2 AND ?3",
            params![user_id.as_str(), start.to_string(), end.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        // Overdue: due in the range and either still open or finished late
        let overdue: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM tasks
             WHERE user_id = ?1 AND due_on BETWEEN ?2 AND ?3
               AND (completed_on IS NULL OR completed_on > due_on)",
            params![user_id.as_str(), start.to_string(), end.to_string()],
            |row| row.get(0),
        )?;

        Ok(TaskStats {
            created,
            completed,
            overdue,
            avg_duration_minutes,
        })
    }

    fn block_stats(
        &self,
        user_id: &UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BlockStats, StorageError> {
        self.conn
            .query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0),
                        COALESCE(SUM(CASE WHEN status = 'missed' THEN 1 ELSE 0 END), 0),
                        COALESCE(SUM(minutes), 0),
                        COALESCE(SUM(CASE WHEN status = 'completed' THEN minutes ELSE 0 END), 0)
                 FROM time_blocks WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3",
                params![user_id.as_str(), start.to_string(), end.to_string()],
                |row| {
                    Ok(BlockStats {
                        scheduled: row.get(0)?,
                        completed: row.get(1)?,
                        missed: row.get(2)?,
                        minutes_scheduled: row.get(3)?,
                        minutes_completed: row.get(4)?,
                    })
                },
            )
            .map_err(StorageError::Query)
    }

    fn habit_stats(
        &self,
        user_id: &UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HabitStats, StorageError> {
        self.conn
            .query_row(
                "SELECT COALESCE(SUM(CASE WHEN due = 1 THEN 1 ELSE 0 END), 0),
                        COALESCE(SUM(CASE WHEN due = 1 AND completed = 1 THEN 1 ELSE 0 END), 0),
                        COALESCE(MAX(streak), 0)
                 FROM habit_entries WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3",
                params![user_id.as_str(), start.to_string(), end.to_string()],
                |row| {
                    Ok(HabitStats {
                        due: row.get(0)?,
                        completed: row.get(1)?,
                        longest_streak: row.get(2)?,
                    })
                },
            )
            .map_err(StorageError::Query)
    }

    fn peak_hours(
        &self,
        user_id: &UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HashMap<u8, u32>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT completed_hour, COUNT(*) FROM tasks
             WHERE user_id = ?1 AND completed_on BETWEEN ?2 AND ?3
               AND completed_hour IS NOT NULL
             GROUP BY completed_hour",
        )?;
        let rows = stmt.query_map(
            params![user_id.as_str(), start.to_string(), end.to_string()],
            |row| Ok((row.get::<_, u8>(0)?, row.get::<_, u32>(1)?)),
        )?;

        let mut hours = HashMap::new();
        for row in rows {
            let (hour, count) = row?;
            hours.insert(hour, count);
        }
        Ok(hours)
    }

    fn time_by_category(
        &self,
        user_id: &UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HashMap<String, u32>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT category, COALESCE(SUM(minutes), 0) FROM time_blocks
             WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3
               AND status = 'completed' AND category IS NOT NULL
             GROUP BY category",
        )?;
        let rows = stmt.query_map(
            params![user_id.as_str(), start.to_string(), end.to_string()],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?)),
        )?;

        let mut categories = HashMap::new();
        for row in rows {
            let (category, minutes) = row?;
            categories.insert(category, minutes);
        }
        Ok(categories)
    }
}
