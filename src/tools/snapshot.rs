/// Tools for computing daily snapshots and weekly summaries
///
/// Implements the snapshot_compute and summary_week MCP tools.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::analytics::{self, EngineError};
use crate::domain::ProductivitySnapshot;
use crate::storage::{ActivitySource, SessionStore, SnapshotStore, SummaryStore};
use crate::tools::{parse_date_or_today, parse_user};

/// Parameters for computing a daily snapshot
#[derive(Debug, Deserialize)]
pub struct ComputeSnapshotParams {
    pub user: String,
    /// Optional date (YYYY-MM-DD), defaults to today
    pub date: Option<String>,
}

/// Response from computing a snapshot
#[derive(Debug, Serialize)]
pub struct ComputeSnapshotResponse {
    pub success: bool,
    pub message: String,
    pub snapshot: ProductivitySnapshot,
}

/// Compute (or recompute) the productivity snapshot for one day
pub fn compute_snapshot<S>(
    storage: &S,
    params: ComputeSnapshotParams,
) -> Result<ComputeSnapshotResponse, EngineError>
where
    S: ActivitySource + SessionStore + SnapshotStore,
{
    let user_id = parse_user(&params.user)?;
    let date = parse_date_or_today(params.date.as_deref())?;

    let snapshot = analytics::compute_snapshot(storage, &user_id, date)?;

    Ok(ComputeSnapshotResponse {
        message: format!(
            "Snapshot for {}: score {}/100 ({} tasks, {} blocks, {} habits, {} focus minutes)",
            date,
            snapshot.productivity_score,
            snapshot.tasks_completed,
            snapshot.blocks_completed,
            snapshot.habits_completed,
            snapshot.focus_minutes
        ),
        success: true,
        snapshot,
    })
}

/// Parameters for computing a weekly summary
#[derive(Debug, Deserialize)]
pub struct WeeklySummaryParams {
    pub user: String,
    /// Any date inside the week of interest (YYYY-MM-DD), defaults to today
    pub date: Option<String>,
}

/// Response from computing a weekly summary
#[derive(Debug, Serialize)]
pub struct WeeklySummaryResponse {
    pub success: bool,
    pub message: String,
    pub result: analytics::WeeklySummaryResult,
}

/// Roll up the week containing the given date
pub fn summary_week<S>(
    storage: &S,
    params: WeeklySummaryParams,
) -> Result<WeeklySummaryResponse, EngineError>
where
    S: SnapshotStore + SummaryStore,
{
    let user_id = parse_user(&params.user)?;
    let reference = parse_date_or_today(params.date.as_deref())?;

    let result = analytics::compute_weekly_summary(storage, &user_id, reference, Utc::now())?;
    let summary = &result.summary;

    Ok(WeeklySummaryResponse {
        message: format!(
            "Week of {}: avg score {:.0}, {} tasks completed, {} focus minutes ({} of 7 days, productivity {})",
            summary.week_start,
            summary.avg_productivity_score,
            summary.tasks_completed,
            summary.focus_minutes,
            result.days_with_data,
            result.trend_text
        ),
        success: true,
        result,
    })
}
