/// Database migration management
///
/// Creates and upgrades the SQLite schema: engine-owned tables (snapshots,
/// weekly summaries, goals, insights, sessions) plus the raw activity
/// tables (tasks, time blocks, habit entries) the capture layer writes and
/// the activity source reads.

use rusqlite::Connection;

use crate::storage::StorageError;

/// Current database schema version
///
/// Increment this when you add new migrations
const CURRENT_VERSION: i32 = 1;

/// Initialize the database schema
///
/// Creates all required tables and indexes if they don't exist and records
/// the schema version for future migrations. Safe to call repeatedly.
pub fn initialize_database(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        [],
    )?;

    let current_version = get_current_version(conn)?;

    if current_version < CURRENT_VERSION {
        run_migrations(conn, current_version)?;
        set_version(conn, CURRENT_VERSION)?;
    }

    Ok(())
}

fn get_current_version(conn: &Connection) -> Result<i32, StorageError> {
    let version = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get::<_, i32>(0)
        })
        .unwrap_or(0);

    Ok(version)
}

fn set_version(conn: &Connection, version: i32) -> Result<(), StorageError> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

fn run_migrations(conn: &Connection, from_version: i32) -> Result<(), StorageError> {
    if from_version < 1 {
        migration_v1(conn)?;
    }

    Ok(())
}

/// Migration to version 1: engine tables plus raw activity tables
fn migration_v1(conn: &Connection) -> Result<(), StorageError> {
    // One row per (user, day); recomputation overwrites in place
    conn.execute(
        "CREATE TABLE IF NOT EXISTS snapshots (
            user_id TEXT NOT NULL,
            date TEXT NOT NULL,
            tasks_created INTEGER NOT NULL DEFAULT 0,
            tasks_completed INTEGER NOT NULL DEFAULT 0,
            tasks_overdue INTEGER NOT NULL DEFAULT 0,
            avg_task_duration_minutes REAL NOT NULL DEFAULT 0,
            blocks_scheduled INTEGER NOT NULL DEFAULT 0,
            blocks_completed INTEGER NOT NULL DEFAULT 0,
            blocks_missed INTEGER NOT NULL DEFAULT 0,
            block_minutes_scheduled INTEGER NOT NULL DEFAULT 0,
            block_minutes_completed INTEGER NOT NULL DEFAULT 0,
            habits_due INTEGER NOT NULL DEFAULT 0,
            habits_completed INTEGER NOT NULL DEFAULT 0,
            longest_habit_streak INTEGER NOT NULL DEFAULT 0,
            focus_sessions INTEGER NOT NULL DEFAULT 0,
            focus_minutes INTEGER NOT NULL DEFAULT 0,
            peak_hours TEXT NOT NULL DEFAULT '{}',
            time_by_category TEXT NOT NULL DEFAULT '{}',
            productivity_score INTEGER NOT NULL DEFAULT 0,
            computed_at TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (user_id, date)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS weekly_summaries (
            user_id TEXT NOT NULL,
            week_start TEXT NOT NULL,
            week_end TEXT NOT NULL,
            tasks_completed INTEGER NOT NULL DEFAULT 0,
            habits_completed INTEGER NOT NULL DEFAULT 0,
            blocks_completed INTEGER NOT NULL DEFAULT 0,
            focus_minutes INTEGER NOT NULL DEFAULT 0,
            avg_productivity_score REAL NOT NULL DEFAULT 0,
            avg_focus_minutes REAL NOT NULL DEFAULT 0,
            productivity_trend_pct REAL NOT NULL DEFAULT 0,
            focus_trend_pct REAL NOT NULL DEFAULT 0,
            best_day_date TEXT,
            best_day_score INTEGER,
            worst_day_date TEXT,
            worst_day_score INTEGER,
            habits_with_streak INTEGER NOT NULL DEFAULT 0,
            longest_streak INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (user_id, week_start)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS goals (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            goal_type TEXT NOT NULL,
            target_value INTEGER NOT NULL,
            current_value INTEGER NOT NULL DEFAULT 0,
            period_type TEXT NOT NULL,
            period_start TEXT NOT NULL,
            period_end TEXT NOT NULL,
            achieved INTEGER NOT NULL DEFAULT 0,
            achieved_at TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS insights (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            insight_type TEXT NOT NULL,
            priority TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            suggestion TEXT NOT NULL,
            context TEXT NOT NULL DEFAULT '{}',
            valid_from TEXT NOT NULL,
            valid_to TEXT NOT NULL,
            dismissed INTEGER NOT NULL DEFAULT 0,
            dismissed_at TEXT,
            acted_on INTEGER NOT NULL DEFAULT 0,
            acted_on_at TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            session_type TEXT NOT NULL,
            reference_id TEXT,
            title TEXT NOT NULL,
            category TEXT,
            started_at TEXT NOT NULL,
            ended_at TEXT,
            duration_minutes INTEGER,
            status TEXT NOT NULL,
            interruptions INTEGER NOT NULL DEFAULT 0,
            notes TEXT
        )",
        [],
    )?;

    // Raw activity tables written by the capture layer
    conn.execute(
        "CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            created_on TEXT NOT NULL,
            completed_on TEXT,
            completed_hour INTEGER,
            due_on TEXT,
            duration_minutes INTEGER,
            category TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS time_blocks (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            date TEXT NOT NULL,
            status TEXT NOT NULL,
            minutes INTEGER NOT NULL DEFAULT 0,
            category TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS habit_entries (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            habit_id TEXT NOT NULL,
            date TEXT NOT NULL,
            due INTEGER NOT NULL DEFAULT 1,
            completed INTEGER NOT NULL DEFAULT 0,
            streak INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    create_indexes_v1(conn)?;

    tracing::info!("Applied migration v1: Created initial database schema");
    Ok(())
}

fn create_indexes_v1(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_snapshots_user_date
         ON snapshots (user_id, date)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_goals_user_period
         ON goals (user_id, period_start, period_end)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_insights_user_type
         ON insights (user_id, insight_type)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_insights_valid_to
         ON insights (valid_to)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sessions_user_status
         ON sessions (user_id, status)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_tasks_user_completed
         ON tasks (user_id, completed_on)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_time_blocks_user_date
         ON time_blocks (user_id, date)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_habit_entries_user_date
         ON habit_entries (user_id, date)",
        [],
    )?;

    tracing::info!("Created database indexes for v1");
    Ok(())
}
