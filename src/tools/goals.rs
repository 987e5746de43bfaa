/// Tools for goal management
///
/// Implements the goal_create and goal_progress MCP tools.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::analytics::{self, EngineError};
use crate::domain::{GoalType, PeriodType, ProductivityGoal};
use crate::storage::GoalStore;
use crate::tools::parse_user;

/// Parameters for creating a goal
#[derive(Debug, Deserialize)]
pub struct CreateGoalParams {
    pub user: String,
    /// One of: daily_tasks, weekly_tasks, monthly_tasks, daily_focus_minutes,
    /// weekly_focus_minutes, monthly_focus_minutes, daily_habits,
    /// weekly_habits, monthly_habits, habit_streak
    pub goal_type: String,
    pub target_value: u32,
    /// Optional period (daily/weekly/monthly); defaults to the period the
    /// goal type implies. Required for habit_streak.
    pub period_type: Option<String>,
}

/// Response from creating a goal
#[derive(Debug, Serialize)]
pub struct CreateGoalResponse {
    pub success: bool,
    pub message: String,
    pub goal: ProductivityGoal,
}

/// Create a goal anchored to the current period
pub fn create_goal<S>(storage: &S, params: CreateGoalParams) -> Result<CreateGoalResponse, EngineError>
where
    S: GoalStore,
{
    let user_id = parse_user(&params.user)?;
    let goal_type = GoalType::parse(&params.goal_type)?;
    let period_type = params
        .period_type
        .as_deref()
        .map(PeriodType::parse)
        .transpose()?;

    let goal = analytics::create_goal(
        storage,
        &user_id,
        goal_type,
        params.target_value,
        period_type,
        Utc::now(),
    )?;

    Ok(CreateGoalResponse {
        message: format!(
            "Created {} goal: {} by {} (id {})",
            goal.period_type.as_str(),
            goal.target_value,
            goal.period_end.date_naive(),
            goal.id.to_string()
        ),
        success: true,
        goal,
    })
}

/// Parameters for updating goal progress
#[derive(Debug, Deserialize)]
pub struct GoalProgressParams {
    pub user: String,
    pub goal_id: String,
    /// Absolute progress value; mutually exclusive with `increment`
    pub value: Option<u32>,
    /// Amount to add to the current progress
    pub increment: Option<u32>,
}

/// Response from updating goal progress
#[derive(Debug, Serialize)]
pub struct GoalProgressResponse {
    pub success: bool,
    pub message: String,
    pub goal: ProductivityGoal,
}

/// Set or increment a goal's progress
pub fn goal_progress<S>(
    storage: &S,
    params: GoalProgressParams,
) -> Result<GoalProgressResponse, EngineError>
where
    S: GoalStore,
{
    // User is accepted for interface symmetry; goals are addressed by id
    let _user_id = parse_user(&params.user)?;
    let goal_id = analytics::parse_goal_id(&params.goal_id)?;
    let now = Utc::now();

    let goal = match (params.value, params.increment) {
        (Some(value), _) => analytics::update_goal_progress(storage, &goal_id, value, now)?,
        (None, Some(delta)) => analytics::increment_goal(storage, &goal_id, delta, now)?,
        (None, None) => {
            return Err(EngineError::Domain(crate::domain::DomainError::Validation {
                message: "Provide either 'value' or 'increment'".to_string(),
            }))
        }
    };

    let message = if goal.achieved {
        format!(
            "Goal achieved! You hit {} of {}.",
            goal.current_value, goal.target_value
        )
    } else {
        format!(
            "Progress updated: {}/{} ({:.0}%), {} remaining.",
            goal.current_value,
            goal.target_value,
            goal.progress_percentage(),
            goal.remaining()
        )
    };

    Ok(GoalProgressResponse {
        success: true,
        message,
        goal,
    })
}
