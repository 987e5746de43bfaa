/// Tools for insight generation and lifecycle
///
/// Implements the insights_generate, insight_dismiss and insight_act MCP
/// tools.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::analytics::{self, EngineError, InsightReport};
use crate::storage::{GoalStore, InsightStore, SnapshotStore};
use crate::tools::parse_user;

/// Parameters for running an insight generation pass
#[derive(Debug, Deserialize)]
pub struct GenerateInsightsParams {
    pub user: String,
}

/// Response from an insight generation pass
#[derive(Debug, Serialize)]
pub struct GenerateInsightsResponse {
    pub success: bool,
    pub message: String,
    pub report: InsightReport,
}

/// Run every insight rule for the user and persist new findings
pub fn generate_insights<S>(
    storage: &S,
    params: GenerateInsightsParams,
) -> Result<GenerateInsightsResponse, EngineError>
where
    S: SnapshotStore + GoalStore + InsightStore,
{
    let user_id = parse_user(&params.user)?;
    let report = analytics::generate_insights(storage, &user_id, Utc::now())?;

    let headline = if report.generated.is_empty() {
        "No new insights right now.".to_string()
    } else {
        let titles: Vec<&str> = report.generated.iter().map(|i| i.title.as_str()).collect();
        format!(
            "{} new insight{}: {}",
            report.generated.len(),
            if report.generated.len() == 1 { "" } else { "s" },
            titles.join("; ")
        )
    };

    let mut message = headline;
    if report.skipped_duplicates > 0 {
        message.push_str(&format!(
            " ({} duplicate{} skipped)",
            report.skipped_duplicates,
            if report.skipped_duplicates == 1 { "" } else { "s" }
        ));
    }

    Ok(GenerateInsightsResponse {
        success: true,
        message,
        report,
    })
}

/// Parameters for dismissing or acting on an insight
#[derive(Debug, Deserialize)]
pub struct InsightActionParams {
    pub user: String,
    pub insight_id: String,
}

/// Response from an insight lifecycle action
#[derive(Debug, Serialize)]
pub struct InsightActionResponse {
    pub success: bool,
    pub message: String,
}

/// Dismiss an insight so it no longer surfaces (or blocks duplicates)
pub fn dismiss_insight<S>(
    storage: &S,
    params: InsightActionParams,
) -> Result<InsightActionResponse, EngineError>
where
    S: InsightStore,
{
    let user_id = parse_user(&params.user)?;
    let insight_id = analytics::parse_insight_id(&params.insight_id)?;

    match analytics::dismiss_insight(storage, &user_id, &insight_id, Utc::now())? {
        Some(insight) => Ok(InsightActionResponse {
            success: true,
            message: format!("Dismissed: {}", insight.title),
        }),
        // Cross-user action: report nothing happened, leak nothing
        None => Ok(InsightActionResponse {
            success: true,
            message: "Nothing to dismiss.".to_string(),
        }),
    }
}

/// Mark an insight as acted on
pub fn act_on_insight<S>(
    storage: &S,
    params: InsightActionParams,
) -> Result<InsightActionResponse, EngineError>
where
    S: InsightStore,
{
    let user_id = parse_user(&params.user)?;
    let insight_id = analytics::parse_insight_id(&params.insight_id)?;

    match analytics::mark_insight_acted(storage, &user_id, &insight_id, Utc::now())? {
        Some(insight) => Ok(InsightActionResponse {
            success: true,
            message: format!("Marked as acted on: {}", insight.title),
        }),
        None => Ok(InsightActionResponse {
            success: true,
            message: "Nothing to update.".to_string(),
        }),
    }
}
