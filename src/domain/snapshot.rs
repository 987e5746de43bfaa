/// Daily productivity snapshot and its scoring logic
///
/// A `ProductivitySnapshot` aggregates one calendar day of activity for one
/// user: task, time-block, habit and focus counts, the derived completion
/// rates, and a 0-100 productivity score. Snapshots are built through
/// `SnapshotBuilder`, which finalizes every derived value exactly once so a
/// snapshot is never observable in a partially-consistent state. Rates are
/// always recomputed from counts, never stored independently.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::UserId;

/// How much each category contributes to the productivity score
const TASK_WEIGHT: f64 = 0.30;
const BLOCK_WEIGHT: f64 = 0.30;
const HABIT_WEIGHT: f64 = 0.25;
const FOCUS_WEIGHT: f64 = 0.15;

/// Multiplier applied when a category earns its bonus condition
const BONUS_MULTIPLIER: f64 = 1.10;

/// Daily focus minutes that count as a "full" focus day
const FOCUS_TARGET_MINUTES: f64 = 240.0;

/// Average session length that qualifies for the focus bonus
const FOCUS_BONUS_SESSION_MINUTES: f64 = 25.0;

/// Streak length that qualifies for the habit bonus
const HABIT_BONUS_STREAK: u32 = 7;

/// One day of aggregated productivity metrics for one user
///
/// Exactly one snapshot exists per (user, date); recomputing a day
/// overwrites the stored row in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductivitySnapshot {
    pub user_id: UserId,
    pub date: NaiveDate,

    // Task metrics
    pub tasks_created: u32,
    pub tasks_completed: u32,
    pub tasks_overdue: u32,
    pub avg_task_duration_minutes: f64,

    // Time-block metrics
    pub blocks_scheduled: u32,
    pub blocks_completed: u32,
    pub blocks_missed: u32,
    pub block_minutes_scheduled: u32,
    pub block_minutes_completed: u32,

    // Habit metrics
    pub habits_due: u32,
    pub habits_completed: u32,
    /// Longest currently-active streak across the user's habits
    pub longest_habit_streak: u32,

    // Focus metrics
    pub focus_sessions: u32,
    pub focus_minutes: u32,
    pub avg_focus_session_minutes: f64,

    // Derived rates, all in [0, 1]
    pub task_completion_rate: f64,
    pub block_completion_rate: f64,
    pub habit_completion_rate: f64,

    /// Weighted multi-factor score in [0, 100]
    pub productivity_score: u32,

    /// Hour of day (0-23) mapped to completions recorded in that hour
    pub peak_hours: HashMap<u8, u32>,
    /// Category name mapped to minutes spent
    pub time_by_category: HashMap<String, u32>,

    pub computed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductivitySnapshot {
    /// Rehydrate a snapshot from already-derived values (database loading)
    #[allow(clippy::too_many_arguments)]
    pub fn from_existing(
        user_id: UserId,
        date: NaiveDate,
        builder: SnapshotBuilder,
        computed_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        let mut snapshot = builder.build();
        snapshot.user_id = user_id;
        snapshot.date = date;
        snapshot.computed_at = computed_at;
        snapshot.created_at = created_at;
        snapshot.updated_at = updated_at;
        snapshot
    }

    /// Total minutes recorded across all categories
    pub fn total_category_minutes(&self) -> u32 {
        self.time_by_category.values().sum()
    }
}

/// Staged builder that derives rates and the score exactly once
///
/// Raw counts go in through the metric methods; `build()` computes the
/// completion rates and the weighted score and returns an immutable value.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    user_id: UserId,
    date: NaiveDate,
    tasks_created: u32,
    tasks_completed: u32,
    tasks_overdue: u32,
    avg_task_duration_minutes: f64,
    blocks_scheduled: u32,
    blocks_completed: u32,
    blocks_missed: u32,
    block_minutes_scheduled: u32,
    block_minutes_completed: u32,
    habits_due: u32,
    habits_completed: u32,
    longest_habit_streak: u32,
    focus_sessions: u32,
    focus_minutes: u32,
    peak_hours: HashMap<u8, u32>,
    time_by_category: HashMap<String, u32>,
}

impl SnapshotBuilder {
    /// The only way in: every builder starts from a validated user and a
    /// concrete date
    pub fn new(user_id: UserId, date: NaiveDate) -> Self {
        Self {
            user_id,
            date,
            tasks_created: 0,
            tasks_completed: 0,
            tasks_overdue: 0,
            avg_task_duration_minutes: 0.0,
            blocks_scheduled: 0,
            blocks_completed: 0,
            blocks_missed: 0,
            block_minutes_scheduled: 0,
            block_minutes_completed: 0,
            habits_due: 0,
            habits_completed: 0,
            longest_habit_streak: 0,
            focus_sessions: 0,
            focus_minutes: 0,
            peak_hours: HashMap::new(),
            time_by_category: HashMap::new(),
        }
    }

    pub fn task_metrics(
        mut self,
        created: u32,
        completed: u32,
        overdue: u32,
        avg_duration_minutes: f64,
    ) -> Self {
        self.tasks_created = created;
        self.tasks_completed = completed;
        self.tasks_overdue = overdue;
        self.avg_task_duration_minutes = avg_duration_minutes;
        self
    }

    pub fn block_metrics(
        mut self,
        scheduled: u32,
        completed: u32,
        missed: u32,
        minutes_scheduled: u32,
        minutes_completed: u32,
    ) -> Self {
        self.blocks_scheduled = scheduled;
        self.blocks_completed = completed;
        self.blocks_missed = missed;
        self.block_minutes_scheduled = minutes_scheduled;
        self.block_minutes_completed = minutes_completed;
        self
    }

    pub fn habit_metrics(mut self, due: u32, completed: u32, longest_streak: u32) -> Self {
        self.habits_due = due;
        self.habits_completed = completed;
        self.longest_habit_streak = longest_streak;
        self
    }

    pub fn focus_metrics(mut self, sessions: u32, total_minutes: u32) -> Self {
        self.focus_sessions = sessions;
        self.focus_minutes = total_minutes;
        self
    }

    pub fn peak_hours(mut self, hours: HashMap<u8, u32>) -> Self {
        self.peak_hours = hours;
        self
    }

    pub fn time_by_category(mut self, categories: HashMap<String, u32>) -> Self {
        self.time_by_category = categories;
        self
    }

    /// Finalize the snapshot: derive rates, compute the score, stamp times
    pub fn build(self) -> ProductivitySnapshot {
        let task_completion_rate = task_rate(self.tasks_created, self.tasks_completed);
        let block_completion_rate = ratio(self.blocks_completed, self.blocks_scheduled);
        let habit_completion_rate = ratio(self.habits_completed, self.habits_due);
        let avg_focus_session_minutes = if self.focus_sessions > 0 {
            self.focus_minutes as f64 / self.focus_sessions as f64
        } else {
            0.0
        };

        let productivity_score = self.score(
            task_completion_rate,
            block_completion_rate,
            habit_completion_rate,
            avg_focus_session_minutes,
        );

        let now = Utc::now();
        ProductivitySnapshot {
            user_id: self.user_id,
            date: self.date,
            tasks_created: self.tasks_created,
            tasks_completed: self.tasks_completed,
            tasks_overdue: self.tasks_overdue,
            avg_task_duration_minutes: self.avg_task_duration_minutes,
            blocks_scheduled: self.blocks_scheduled,
            blocks_completed: self.blocks_completed,
            blocks_missed: self.blocks_missed,
            block_minutes_scheduled: self.block_minutes_scheduled,
            block_minutes_completed: self.block_minutes_completed,
            habits_due: self.habits_due,
            habits_completed: self.habits_completed,
            longest_habit_streak: self.longest_habit_streak,
            focus_sessions: self.focus_sessions,
            focus_minutes: self.focus_minutes,
            avg_focus_session_minutes,
            task_completion_rate,
            block_completion_rate,
            habit_completion_rate,
            productivity_score,
            peak_hours: self.peak_hours,
            time_by_category: self.time_by_category,
            computed_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Weighted multi-factor score
    ///
    /// Each category contributes only when it has data for the day.
    /// Categories with no data contribute zero and the score is NOT
    /// renormalized over the missing weight: a day with no habits tracked
    /// must not be inflated to compensate.
    fn score(
        &self,
        task_rate: f64,
        block_rate: f64,
        habit_rate: f64,
        avg_session_minutes: f64,
    ) -> u32 {
        let mut score = 0.0;
        let mut weight_total = 0.0;

        if self.tasks_created > 0 || self.tasks_completed > 0 {
            let mut share = TASK_WEIGHT * task_rate;
            // Clearing backlog counts extra
            if self.tasks_overdue > 0 && self.tasks_completed > self.tasks_overdue {
                share *= BONUS_MULTIPLIER;
            }
            score += share * 100.0;
            weight_total += TASK_WEIGHT;
        }

        if self.blocks_scheduled > 0 {
            score += BLOCK_WEIGHT * block_rate * 100.0;
            weight_total += BLOCK_WEIGHT;
        }

        if self.habits_due > 0 {
            let mut share = HABIT_WEIGHT * habit_rate;
            if self.longest_habit_streak >= HABIT_BONUS_STREAK {
                share *= BONUS_MULTIPLIER;
            }
            score += share * 100.0;
            weight_total += HABIT_WEIGHT;
        }

        if self.focus_sessions > 0 {
            let focus_ratio = (self.focus_minutes as f64 / FOCUS_TARGET_MINUTES).min(1.0);
            let mut share = FOCUS_WEIGHT * focus_ratio;
            if avg_session_minutes >= FOCUS_BONUS_SESSION_MINUTES {
                share *= BONUS_MULTIPLIER;
            }
            score += share * 100.0;
            weight_total += FOCUS_WEIGHT;
        }

        if weight_total == 0.0 {
            return 0;
        }

        score.min(100.0) as u32
    }
}

/// Task completion rate: completed / (created + completed)
///
/// The denominator counts both so a day that only clears old tasks still
/// scores, and a day that only creates new ones scores zero.
fn task_rate(created: u32, completed: u32) -> f64 {
    let denominator = created + completed;
    if denominator > 0 {
        completed as f64 / denominator as f64
    } else {
        0.0
    }
}

fn ratio(numerator: u32, denominator: u32) -> f64 {
    if denominator > 0 {
        numerator as f64 / denominator as f64
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> SnapshotBuilder {
        let user = UserId::new("test-user").unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        SnapshotBuilder::new(user, date)
    }

    #[test]
    fn test_build_carries_constructor_identity() {
        // The user and date handed to the constructor are the ones the
        // built snapshot carries
        let snapshot = builder().build();
        assert_eq!(snapshot.user_id.as_str(), "test-user");
        assert_eq!(snapshot.date, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
    }

    #[test]
    fn test_task_rate_scenario() {
        // 10 created, 8 completed -> 8 / 18
        let snapshot = builder().task_metrics(10, 8, 0, 0.0).build();
        assert!((snapshot.task_completion_rate - 8.0 / 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_rates_stay_in_unit_interval() {
        let snapshot = builder()
            .task_metrics(0, 25, 0, 0.0)
            .block_metrics(4, 4, 0, 240, 240)
            .habit_metrics(3, 3, 0)
            .build();
        for rate in [
            snapshot.task_completion_rate,
            snapshot.block_completion_rate,
            snapshot.habit_completion_rate,
        ] {
            assert!((0.0..=1.0).contains(&rate));
        }
    }

    #[test]
    fn test_score_zero_without_data() {
        let snapshot = builder().build();
        assert_eq!(snapshot.productivity_score, 0);
    }

    #[test]
    fn test_score_full_day_with_bonuses() {
        // Every category at 100% with every bonus qualifying:
        // 0.30*1.1 + 0.30 + 0.25*1.1 + 0.15*1.1 = 1.07, capped at 100.
        let snapshot = builder()
            .task_metrics(0, 10, 2, 30.0) // completed > overdue > 0
            .block_metrics(5, 5, 0, 300, 300)
            .habit_metrics(4, 4, 10) // streak >= 7
            .focus_metrics(8, 240) // avg 30 min sessions, full 240 minutes
            .build();
        assert!((95..=100).contains(&snapshot.productivity_score));
    }

    #[test]
    fn test_score_not_renormalized_for_missing_categories() {
        // Only tasks have data, at a perfect rate with no bonus:
        // achievable maximum for the day is 30, not 100.
        let snapshot = builder().task_metrics(0, 5, 0, 0.0).build();
        assert_eq!(snapshot.productivity_score, 30);
    }

    #[test]
    fn test_task_bonus_requires_clearing_backlog() {
        // Overdue present but completions don't exceed it: no bonus
        let without_bonus = builder().task_metrics(0, 2, 3, 0.0).build();
        let with_bonus = builder().task_metrics(0, 4, 3, 0.0).build();
        let base = without_bonus.task_completion_rate * TASK_WEIGHT * 100.0;
        assert_eq!(without_bonus.productivity_score, base as u32);
        let boosted = with_bonus.task_completion_rate * TASK_WEIGHT * BONUS_MULTIPLIER * 100.0;
        assert_eq!(with_bonus.productivity_score, boosted as u32);
    }

    #[test]
    fn test_focus_minutes_capped_at_target() {
        // 600 minutes caps at the 240-minute target
        let long_day = builder().focus_metrics(10, 600).build();
        let exact_day = builder().focus_metrics(10, 240).build();
        assert_eq!(long_day.productivity_score, exact_day.productivity_score);
    }
}
