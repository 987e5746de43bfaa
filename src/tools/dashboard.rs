/// Tool for the at-a-glance dashboard
///
/// Implements the dashboard_get MCP tool.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::analytics::{self, Dashboard, EngineError};
use crate::storage::{GoalStore, SessionStore, SnapshotStore, SummaryStore};
use crate::tools::parse_user;

/// Parameters for fetching the dashboard
#[derive(Debug, Deserialize)]
pub struct DashboardParams {
    pub user: String,
}

/// Response containing the assembled dashboard
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub success: bool,
    pub message: String,
    pub dashboard: Dashboard,
}

/// Fetch today's snapshot, the current week, goals and the active session
pub fn get_dashboard<S>(
    storage: &S,
    params: DashboardParams,
) -> Result<DashboardResponse, EngineError>
where
    S: SnapshotStore + SummaryStore + GoalStore + SessionStore,
{
    let user_id = parse_user(&params.user)?;
    let dashboard = analytics::get_dashboard(storage, &user_id, Utc::now())?;

    let today_line = match &dashboard.today {
        Some(snapshot) => format!("Today's score: {}/100.", snapshot.productivity_score),
        None => "No snapshot computed for today yet.".to_string(),
    };
    let session_line = match &dashboard.active_session {
        Some(session) => format!(" Active session: {}.", session.title),
        None => String::new(),
    };

    Ok(DashboardResponse {
        message: format!(
            "{} 7-day average: {:.0}. {} active goal{}. {} focus minutes this week.{}",
            today_line,
            dashboard.avg_score_last_week,
            dashboard.active_goals.len(),
            if dashboard.active_goals.len() == 1 { "" } else { "s" },
            dashboard.focus_minutes_this_week,
            session_line
        ),
        success: true,
        dashboard,
    })
}
