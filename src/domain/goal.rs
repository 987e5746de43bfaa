/// Productivity goal entity and lifecycle rules
///
/// A goal is a numeric target bound to a calendar period computed at
/// creation time via `domain::period`. Progress updates are absolute sets
/// (with an increment convenience); once achieved the goal freezes and
/// further updates are rejected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::period;
use crate::domain::{DomainError, GoalId, GoalType, PeriodType, UserId};

/// A user-defined numeric target over a daily/weekly/monthly period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductivityGoal {
    pub id: GoalId,
    pub user_id: UserId,
    pub goal_type: GoalType,
    /// Target value, strictly positive (validated at creation)
    pub target_value: u32,
    /// Stored progress; may exceed `target_value`
    pub current_value: u32,
    pub period_type: PeriodType,
    /// Computed from the period type at creation, never editable
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub achieved: bool,
    pub achieved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ProductivityGoal {
    /// Create a goal with zero progress, anchored to the current period
    ///
    /// Fails with a validation error if the target is zero. Period bounds
    /// are derived from `now` and the period type; they are not
    /// user-supplied and cannot be edited afterwards.
    pub fn new(
        user_id: UserId,
        goal_type: GoalType,
        target_value: u32,
        period_type: PeriodType,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if target_value == 0 {
            return Err(DomainError::InvalidGoalTarget {
                message: "Goal target must be greater than 0".to_string(),
            });
        }

        let (period_start, period_end) = period::period_bounds(now, period_type);

        Ok(Self {
            id: GoalId::new(),
            user_id,
            goal_type,
            target_value,
            current_value: 0,
            period_type,
            period_start,
            period_end,
            achieved: false,
            achieved_at: None,
            created_at: now,
        })
    }

    /// Rehydrate a goal from stored data (database loading)
    #[allow(clippy::too_many_arguments)]
    pub fn from_existing(
        id: GoalId,
        user_id: UserId,
        goal_type: GoalType,
        target_value: u32,
        current_value: u32,
        period_type: PeriodType,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        achieved: bool,
        achieved_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            goal_type,
            target_value,
            current_value,
            period_type,
            period_start,
            period_end,
            achieved,
            achieved_at,
            created_at,
        }
    }

    /// Set absolute progress, marking the goal achieved when the target is
    /// reached
    ///
    /// Fails without mutating anything if the goal is already achieved.
    /// Achievement is stamped once; a goal cannot re-achieve.
    pub fn update_progress(&mut self, value: u32, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.achieved {
            return Err(DomainError::GoalAlreadyAchieved {
                goal_id: self.id.to_string(),
            });
        }

        self.current_value = value;
        if self.current_value >= self.target_value {
            self.achieved = true;
            self.achieved_at = Some(now);
        }

        Ok(())
    }

    /// Add to the current progress; sugar over `update_progress`
    pub fn increment_progress(&mut self, delta: u32, now: DateTime<Utc>) -> Result<(), DomainError> {
        let next = self.current_value.saturating_add(delta);
        self.update_progress(next, now)
    }

    /// Progress toward the target, clamped to 100 for reporting
    ///
    /// The stored `current_value` is free to exceed the target; only the
    /// percentage view is clamped.
    pub fn progress_percentage(&self) -> f64 {
        if self.target_value == 0 {
            return 0.0;
        }
        (self.current_value as f64 / self.target_value as f64 * 100.0).min(100.0)
    }

    /// Amount still missing toward the target, floored at zero
    pub fn remaining(&self) -> u32 {
        self.target_value.saturating_sub(self.current_value)
    }

    /// Whether the goal is still open and within its period
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.achieved && now >= self.period_start && now <= self.period_end
    }

    /// Whether the period elapsed without the goal being achieved
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        !self.achieved && now > self.period_end
    }

    /// Whole days until the period ends; zero once achieved or expired
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        if self.achieved || self.is_expired(now) {
            return 0;
        }
        (self.period_end - now).num_days()
    }

    /// Fraction of the goal period that is still ahead of `now`, in [0, 1]
    ///
    /// Computed from the full period length even for goals created
    /// mid-period.
    pub fn time_remaining_fraction(&self, now: DateTime<Utc>) -> f64 {
        let total = (self.period_end - self.period_start).num_seconds();
        if total <= 0 {
            return 0.0;
        }
        let remaining = (self.period_end - now).num_seconds().max(0);
        (remaining as f64 / total as f64).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn goal(target: u32) -> ProductivityGoal {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap();
        ProductivityGoal::new(
            UserId::new("test-user").unwrap(),
            GoalType::DailyTasks,
            target,
            PeriodType::Daily,
            now,
        )
        .unwrap()
    }

    #[test]
    fn test_zero_target_rejected() {
        let now = Utc::now();
        let result = ProductivityGoal::new(
            UserId::new("test-user").unwrap(),
            GoalType::DailyTasks,
            0,
            PeriodType::Daily,
            now,
        );
        assert!(matches!(result, Err(DomainError::InvalidGoalTarget { .. })));
    }

    #[test]
    fn test_daily_goal_achievement_scenario() {
        let mut goal = goal(10);
        let now = goal.created_at;

        goal.update_progress(10, now).unwrap();
        assert!(goal.achieved);
        assert!(goal.achieved_at.is_some());
        assert_eq!(goal.progress_percentage(), 100.0);
        assert_eq!(goal.remaining(), 0);
        assert_eq!(goal.days_remaining(now), 0);
    }

    #[test]
    fn test_achieved_goal_is_frozen() {
        let mut goal = goal(5);
        let now = goal.created_at;
        goal.update_progress(5, now).unwrap();
        let achieved_at = goal.achieved_at;

        let result = goal.update_progress(3, now);
        assert!(matches!(result, Err(DomainError::GoalAlreadyAchieved { .. })));
        // Nothing was mutated
        assert_eq!(goal.current_value, 5);
        assert_eq!(goal.achieved_at, achieved_at);

        let result = goal.increment_progress(1, now);
        assert!(result.is_err());
        assert_eq!(goal.current_value, 5);
    }

    #[test]
    fn test_percentage_clamped_but_value_stored_raw() {
        let mut goal = goal(10);
        let now = goal.created_at;
        goal.update_progress(15, now).unwrap();
        assert_eq!(goal.current_value, 15);
        assert_eq!(goal.progress_percentage(), 100.0);
        assert_eq!(goal.remaining(), 0);
    }

    #[test]
    fn test_increment_is_sugar_for_update() {
        let mut goal = goal(10);
        let now = goal.created_at;
        goal.increment_progress(3, now).unwrap();
        goal.increment_progress(4, now).unwrap();
        assert_eq!(goal.current_value, 7);
        assert!(!goal.achieved);
        assert_eq!(goal.remaining(), 3);
        assert!((goal.progress_percentage() - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_active_and_expired_windows() {
        let goal = goal(10);
        let during = goal.created_at;
        let after = goal.period_end + chrono::Duration::hours(1);

        assert!(goal.is_active(during));
        assert!(!goal.is_expired(during));
        assert!(!goal.is_active(after));
        assert!(goal.is_expired(after));
        assert_eq!(goal.days_remaining(after), 0);
    }
}
