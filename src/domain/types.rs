/// Core identifier and enum types used throughout the domain layer
///
/// This module defines the id newtypes and the closed enumerations
/// (period types, goal types, insight types, session types) that the
/// analytics engine operates on.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for the user owning a snapshot, goal, insight or session
///
/// The engine never assumes an implicit user - every operation takes an
/// explicit `UserId`. CLI-style callers supply a default via `--user`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    /// Create a user id, rejecting empty strings
    pub fn new(id: impl Into<String>) -> Result<Self, crate::domain::DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(crate::domain::DomainError::Validation {
                message: "User id cannot be empty".to_string(),
            });
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Unique identifier for a productivity goal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GoalId(pub Uuid);

impl GoalId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a goal ID from a string (useful for database loading)
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    pub fn to_string(&self) -> String {
        self.0.to_string()
    }
}

/// Unique identifier for a generated insight
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InsightId(pub Uuid);

impl InsightId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    pub fn to_string(&self) -> String {
        self.0.to_string()
    }
}

/// Unique identifier for a tracked time session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    pub fn to_string(&self) -> String {
        self.0.to_string()
    }
}

/// Calendar period a goal or summary is aligned to
///
/// Weeks start on Monday. The exact boundary arithmetic lives in
/// `domain::period` and is shared by goal creation and weekly rollups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    Daily,
    Weekly,
    Monthly,
}

impl PeriodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodType::Daily => "daily",
            PeriodType::Weekly => "weekly",
            PeriodType::Monthly => "monthly",
        }
    }

    pub fn parse(s: &str) -> Result<Self, crate::domain::DomainError> {
        match s {
            "daily" => Ok(PeriodType::Daily),
            "weekly" => Ok(PeriodType::Weekly),
            "monthly" => Ok(PeriodType::Monthly),
            other => Err(crate::domain::DomainError::Validation {
                message: format!("Unknown period type: {}", other),
            }),
        }
    }
}

/// What a productivity goal measures
///
/// The cross product of period and metric, plus a streak-length target
/// which measures the longest active habit streak rather than a count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    DailyTasks,
    WeeklyTasks,
    MonthlyTasks,
    DailyFocusMinutes,
    WeeklyFocusMinutes,
    MonthlyFocusMinutes,
    DailyHabits,
    WeeklyHabits,
    MonthlyHabits,
    HabitStreak,
}

impl GoalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::DailyTasks => "daily_tasks",
            GoalType::WeeklyTasks => "weekly_tasks",
            GoalType::MonthlyTasks => "monthly_tasks",
            GoalType::DailyFocusMinutes => "daily_focus_minutes",
            GoalType::WeeklyFocusMinutes => "weekly_focus_minutes",
            GoalType::MonthlyFocusMinutes => "monthly_focus_minutes",
            GoalType::DailyHabits => "daily_habits",
            GoalType::WeeklyHabits => "weekly_habits",
            GoalType::MonthlyHabits => "monthly_habits",
            GoalType::HabitStreak => "habit_streak",
        }
    }

    pub fn parse(s: &str) -> Result<Self, crate::domain::DomainError> {
        match s {
            "daily_tasks" => Ok(GoalType::DailyTasks),
            "weekly_tasks" => Ok(GoalType::WeeklyTasks),
            "monthly_tasks" => Ok(GoalType::MonthlyTasks),
            "daily_focus_minutes" => Ok(GoalType::DailyFocusMinutes),
            "weekly_focus_minutes" => Ok(GoalType::WeeklyFocusMinutes),
            "monthly_focus_minutes" => Ok(GoalType::MonthlyFocusMinutes),
            "daily_habits" => Ok(GoalType::DailyHabits),
            "weekly_habits" => Ok(GoalType::WeeklyHabits),
            "monthly_habits" => Ok(GoalType::MonthlyHabits),
            "habit_streak" => Ok(GoalType::HabitStreak),
            other => Err(crate::domain::DomainError::Validation {
                message: format!("Unknown goal type: {}", other),
            }),
        }
    }

    /// The period this goal type naturally aligns to, where it implies one
    ///
    /// `HabitStreak` carries no implied period; the caller chooses.
    pub fn implied_period(&self) -> Option<PeriodType> {
        match self {
            GoalType::DailyTasks | GoalType::DailyFocusMinutes | GoalType::DailyHabits => {
                Some(PeriodType::Daily)
            }
            GoalType::WeeklyTasks | GoalType::WeeklyFocusMinutes | GoalType::WeeklyHabits => {
                Some(PeriodType::Weekly)
            }
            GoalType::MonthlyTasks | GoalType::MonthlyFocusMinutes | GoalType::MonthlyHabits => {
                Some(PeriodType::Monthly)
            }
            GoalType::HabitStreak => None,
        }
    }
}

/// Closed set of insight kinds the rule engine can emit
///
/// Deduplication works per type: while an actionable insight of a given
/// type exists for a user, no new insight of the same type is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    ProductivityDrop,
    ProductivityImprove,
    PeakHour,
    BestDay,
    HabitStreakMilestone,
    HabitStreakRisk,
    FocusTimeHigh,
    FocusTimeLow,
    GoalProgress,
    GoalAtRisk,
    GoalAchieved,
    TaskOverdue,
    ScheduleOptimize,
}

impl InsightType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightType::ProductivityDrop => "productivity_drop",
            InsightType::ProductivityImprove => "productivity_improve",
            InsightType::PeakHour => "peak_hour",
            InsightType::BestDay => "best_day",
            InsightType::HabitStreakMilestone => "habit_streak_milestone",
            InsightType::HabitStreakRisk => "habit_streak_risk",
            InsightType::FocusTimeHigh => "focus_time_high",
            InsightType::FocusTimeLow => "focus_time_low",
            InsightType::GoalProgress => "goal_progress",
            InsightType::GoalAtRisk => "goal_at_risk",
            InsightType::GoalAchieved => "goal_achieved",
            InsightType::TaskOverdue => "task_overdue",
            InsightType::ScheduleOptimize => "schedule_optimize",
        }
    }

    pub fn parse(s: &str) -> Result<Self, crate::domain::DomainError> {
        match s {
            "productivity_drop" => Ok(InsightType::ProductivityDrop),
            "productivity_improve" => Ok(InsightType::ProductivityImprove),
            "peak_hour" => Ok(InsightType::PeakHour),
            "best_day" => Ok(InsightType::BestDay),
            "habit_streak_milestone" => Ok(InsightType::HabitStreakMilestone),
            "habit_streak_risk" => Ok(InsightType::HabitStreakRisk),
            "focus_time_high" => Ok(InsightType::FocusTimeHigh),
            "focus_time_low" => Ok(InsightType::FocusTimeLow),
            "goal_progress" => Ok(InsightType::GoalProgress),
            "goal_at_risk" => Ok(InsightType::GoalAtRisk),
            "goal_achieved" => Ok(InsightType::GoalAchieved),
            "task_overdue" => Ok(InsightType::TaskOverdue),
            "schedule_optimize" => Ok(InsightType::ScheduleOptimize),
            other => Err(crate::domain::DomainError::Validation {
                message: format!("Unknown insight type: {}", other),
            }),
        }
    }
}

/// How urgently an insight should be surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightPriority {
    High,
    Medium,
    Low,
}

impl InsightPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightPriority::High => "high",
            InsightPriority::Medium => "medium",
            InsightPriority::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Result<Self, crate::domain::DomainError> {
        match s {
            "high" => Ok(InsightPriority::High),
            "medium" => Ok(InsightPriority::Medium),
            "low" => Ok(InsightPriority::Low),
            other => Err(crate::domain::DomainError::Validation {
                message: format!("Unknown insight priority: {}", other),
            }),
        }
    }
}

/// Direction of a metric trend between two windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Up => "up",
            TrendDirection::Down => "down",
            TrendDirection::Stable => "stable",
        }
    }
}

/// What kind of work a time session tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Task,
    Habit,
    Focus,
    Meeting,
    Other,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Task => "task",
            SessionType::Habit => "habit",
            SessionType::Focus => "focus",
            SessionType::Meeting => "meeting",
            SessionType::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Result<Self, crate::domain::DomainError> {
        match s {
            "task" => Ok(SessionType::Task),
            "habit" => Ok(SessionType::Habit),
            "focus" => Ok(SessionType::Focus),
            "meeting" => Ok(SessionType::Meeting),
            "other" => Ok(SessionType::Other),
            other => Err(crate::domain::DomainError::Validation {
                message: format!("Unknown session type: {}", other),
            }),
        }
    }
}

/// Lifecycle state of a time session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed,
    Interrupted,
    Abandoned,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Interrupted => "interrupted",
            SessionStatus::Abandoned => "abandoned",
        }
    }

    pub fn parse(s: &str) -> Result<Self, crate::domain::DomainError> {
        match s {
            "active" => Ok(SessionStatus::Active),
            "completed" => Ok(SessionStatus::Completed),
            "interrupted" => Ok(SessionStatus::Interrupted),
            "abandoned" => Ok(SessionStatus::Abandoned),
            other => Err(crate::domain::DomainError::Validation {
                message: format!("Unknown session status: {}", other),
            }),
        }
    }
}
