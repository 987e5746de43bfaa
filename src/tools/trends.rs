/// Tool for trend analysis
///
/// Implements the trends_get MCP tool.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::analytics::{self, EngineError, TrendReport};
use crate::storage::SnapshotStore;
use crate::tools::parse_user;

/// Default analysis window in days
const DEFAULT_TREND_DAYS: u32 = 7;

/// Parameters for fetching trends
#[derive(Debug, Deserialize)]
pub struct TrendsParams {
    pub user: String,
    /// Window length in days, defaults to 7
    pub days: Option<u32>,
}

/// Response containing the trend report
#[derive(Debug, Serialize)]
pub struct TrendsResponse {
    pub success: bool,
    pub message: String,
    pub trends: TrendReport,
}

/// Compare the recent window against the preceding one
pub fn get_trends<S>(storage: &S, params: TrendsParams) -> Result<TrendsResponse, EngineError>
where
    S: SnapshotStore,
{
    let user_id = parse_user(&params.user)?;
    let days = params.days.unwrap_or(DEFAULT_TREND_DAYS);

    let trends = analytics::get_trends(storage, &user_id, days, Utc::now())?;

    let peak_line = match trends.peak_hour {
        Some(hour) => format!(" Peak hour: {}:00.", hour),
        None => String::new(),
    };
    let weekday_line = match &trends.best_weekday {
        Some(weekday) => format!(" Best day: {}.", weekday),
        None => String::new(),
    };

    Ok(TrendsResponse {
        message: format!(
            "Productivity is {} ({:+.1}%) over the last {} days.{}{}",
            trends.productivity.direction.as_str(),
            trends.productivity.change_pct,
            days,
            peak_line,
            weekday_line
        ),
        success: true,
        trends,
    })
}
