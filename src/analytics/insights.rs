/// Rule-based insight generation with duplicate suppression
///
/// Seven rule evaluators run in a fixed order over the last seven days of
/// snapshots and the seven days before that. Each rule yields zero or more
/// candidate insights; a candidate is discarded when an actionable insight
/// of the same type already exists for the user, so repeated generation
/// passes never pile up duplicates. Failures while loading one rule's data
/// or while persisting one candidate are collected into the report and do
/// not stop the pass.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::json;

use crate::analytics::trend;
use crate::domain::summary::percentage_change;
use crate::domain::{
    ActionableInsight, InsightPriority, InsightType, ProductivityGoal, ProductivitySnapshot,
    UserId,
};
use crate::storage::{GoalStore, InsightStore, SnapshotStore, StorageError};

/// Length of the recent and baseline windows, in days
const WINDOW_DAYS: i64 = 7;

/// Minimum days of data in both windows for the statistical rules
const MIN_STATISTICAL_DAYS: usize = 3;

/// Score movement (percent) that triggers a drop/improvement insight
const SCORE_CHANGE_THRESHOLD_PCT: f64 = 15.0;

/// Aggregated completions needed before the peak hour is worth reporting
const PEAK_HOUR_MIN_COMPLETIONS: u32 = 5;

/// Snapshots needed before a best-weekday pattern is worth reporting
const BEST_DAY_MIN_SNAPSHOTS: usize = 5;
const BEST_DAY_MIN_AVG_SCORE: f64 = 50.0;

/// Daily focus-minute bands
const FOCUS_LOW_MINUTES: f64 = 60.0;
const FOCUS_HIGH_MINUTES: f64 = 180.0;
const FOCUS_DROP_THRESHOLD_PCT: f64 = 25.0;

/// Goal rule thresholds
const GOAL_AT_RISK_PROGRESS_PCT: f64 = 50.0;
const GOAL_AT_RISK_TIME_FRACTION: f64 = 0.30;
const GOAL_PROGRESS_PCT: f64 = 75.0;

/// Streak lengths worth celebrating
const STREAK_MILESTONES: [u32; 6] = [7, 14, 21, 30, 60, 90];
const STREAK_RISK_MIN_STREAK: u32 = 3;
const STREAK_RISK_MISSED_DAYS: usize = 2;

/// Overdue backlog size that triggers an alert
const OVERDUE_THRESHOLD: u32 = 5;

/// Block completion band that suggests an over-ambitious schedule
const SCHEDULE_OPTIMIZE_MAX_RATE: f64 = 0.6;
const SCHEDULE_OPTIMIZE_MIN_DAYS: usize = 5;

/// Outcome of one generation pass
#[derive(Debug, Clone, Serialize)]
pub struct InsightReport {
    pub generated: Vec<ActionableInsight>,
    pub skipped_duplicates: u32,
    pub errors: Vec<String>,
}

impl InsightReport {
    pub fn generated_count(&self) -> usize {
        self.generated.len()
    }
}

/// Run every rule for the user and persist the non-duplicate candidates
pub fn generate_insights<S>(
    storage: &S,
    user_id: &UserId,
    now: DateTime<Utc>,
) -> Result<InsightReport, StorageError>
where
    S: SnapshotStore + GoalStore + InsightStore,
{
    let today = now.date_naive();
    let recent_start = today - Duration::days(WINDOW_DAYS - 1);
    let previous_start = today - Duration::days(2 * WINDOW_DAYS - 1);
    let previous_end = today - Duration::days(WINDOW_DAYS);

    let mut report = InsightReport {
        generated: Vec::new(),
        skipped_duplicates: 0,
        errors: Vec::new(),
    };

    // Each supporting read fails on its own: the error lands in the report
    // and the rules whose data did load still run.
    let recent = load(
        storage.get_snapshots_in_range(user_id, recent_start, today),
        "recent snapshots",
        &mut report,
    )
    .unwrap_or_default();
    let previous = load(
        storage.get_snapshots_in_range(user_id, previous_start, previous_end),
        "previous snapshots",
        &mut report,
    )
    .unwrap_or_default();
    let latest = load(
        storage.get_latest_snapshot(user_id),
        "latest snapshot",
        &mut report,
    )
    .flatten();
    let active_goals = load(
        storage.get_active_goals(user_id, now),
        "active goals",
        &mut report,
    )
    .unwrap_or_default();
    let achieved_goals = load(
        storage.get_achieved_goals(user_id, 10),
        "achieved goals",
        &mut report,
    )
    .unwrap_or_default();

    let mut candidates = Vec::new();
    candidates.extend(score_change_rule(user_id, &recent, &previous, now));
    candidates.extend(peak_hour_rule(user_id, &recent, now));
    candidates.extend(best_day_rule(user_id, &recent, now));
    candidates.extend(focus_time_rule(user_id, &recent, &previous, now));
    candidates.extend(goal_rules(user_id, &active_goals, &achieved_goals, now));
    candidates.extend(streak_rules(user_id, &recent, latest.as_ref(), now));
    candidates.extend(workload_rules(user_id, &recent, latest.as_ref(), now));

    for candidate in candidates {
        match storage.get_insights_by_type(user_id, candidate.insight_type) {
            Ok(existing) => {
                if existing.iter().any(|i| i.is_actionable(now)) {
                    report.skipped_duplicates += 1;
                    tracing::debug!(
                        "Skipping duplicate {} insight for {}",
                        candidate.insight_type.as_str(),
                        user_id.as_str()
                    );
                    continue;
                }
            }
            Err(e) => {
                report.errors.push(format!(
                    "{}: duplicate check failed: {}",
                    candidate.insight_type.as_str(),
                    e
                ));
                continue;
            }
        }

        match storage.create_insight(&candidate) {
            Ok(()) => report.generated.push(candidate),
            Err(e) => report.errors.push(format!(
                "{}: failed to persist: {}",
                candidate.insight_type.as_str(),
                e
            )),
        }
    }

    tracing::info!(
        "Insight pass for {}: {} generated, {} duplicates skipped, {} errors",
        user_id.as_str(),
        report.generated.len(),
        report.skipped_duplicates,
        report.errors.len()
    );

    Ok(report)
}

/// Record a failed supporting read and carry on without its data
fn load<T>(
    result: Result<T, StorageError>,
    what: &str,
    report: &mut InsightReport,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Insight pass could not load {}: {}", what, e);
            report.errors.push(format!("failed to load {}: {}", what, e));
            None
        }
    }
}

/// Rule 1: week-over-week productivity score movement
fn score_change_rule(
    user_id: &UserId,
    recent: &[ProductivitySnapshot],
    previous: &[ProductivitySnapshot],
    now: DateTime<Utc>,
) -> Vec<ActionableInsight> {
    if recent.len() < MIN_STATISTICAL_DAYS || previous.len() < MIN_STATISTICAL_DAYS {
        return Vec::new();
    }

    let recent_avg = average_score(recent);
    let previous_avg = average_score(previous);
    let change = percentage_change(recent_avg, previous_avg);
    let context = HashMap::from([
        ("recent_avg".to_string(), json!(recent_avg)),
        ("previous_avg".to_string(), json!(previous_avg)),
        ("change_pct".to_string(), json!(change)),
    ]);

    if change < -SCORE_CHANGE_THRESHOLD_PCT {
        vec![ActionableInsight::new(
            user_id.clone(),
            InsightType::ProductivityDrop,
            InsightPriority::High,
            "Your productivity has dropped this week",
            format!(
                "Your average score fell from {:.0} to {:.0} ({:.0}%) compared to last week.",
                previous_avg, recent_avg, change
            ),
            "Review what changed this week and consider lightening your schedule.",
            context,
            7,
            now,
        )]
    } else if change > SCORE_CHANGE_THRESHOLD_PCT {
        vec![ActionableInsight::new(
            user_id.clone(),
            InsightType::ProductivityImprove,
            InsightPriority::Low,
            "Your productivity is up this week",
            format!(
                "Your average score rose from {:.0} to {:.0} ({:+.0}%) compared to last week.",
                previous_avg, recent_avg, change
            ),
            "Keep whatever you changed - it's working.",
            context,
            3,
            now,
        )]
    } else {
        Vec::new()
    }
}

/// Rule 2: the hour of day where completions cluster
fn peak_hour_rule(
    user_id: &UserId,
    recent: &[ProductivitySnapshot],
    now: DateTime<Utc>,
) -> Vec<ActionableInsight> {
    match trend::aggregate_peak_hour(recent) {
        Some((hour, count)) if count > PEAK_HOUR_MIN_COMPLETIONS => {
            let context = HashMap::from([
                ("hour".to_string(), json!(hour)),
                ("completions".to_string(), json!(count)),
            ]);
            vec![ActionableInsight::new(
                user_id.clone(),
                InsightType::PeakHour,
                InsightPriority::Medium,
                format!("Your peak hour is {}:00", hour),
                format!(
                    "You completed {} items around {}:00 over the last week, more than any other hour.",
                    count, hour
                ),
                format!("Schedule your most demanding work around {}:00.", hour),
                context,
                5,
                now,
            )]
        }
        _ => Vec::new(),
    }
}

/// Rule 3: the weekday where scores are consistently highest
fn best_day_rule(
    user_id: &UserId,
    recent: &[ProductivitySnapshot],
    now: DateTime<Utc>,
) -> Vec<ActionableInsight> {
    if recent.len() < BEST_DAY_MIN_SNAPSHOTS {
        return Vec::new();
    }

    match trend::best_weekday(recent) {
        Some((weekday, avg)) if avg > BEST_DAY_MIN_AVG_SCORE => {
            let context = HashMap::from([
                ("weekday".to_string(), json!(weekday.to_string())),
                ("avg_score".to_string(), json!(avg)),
            ]);
            vec![ActionableInsight::new(
                user_id.clone(),
                InsightType::BestDay,
                InsightPriority::Medium,
                format!("{} is your strongest day", weekday),
                format!(
                    "Your average score on {} is {:.0}, higher than any other day.",
                    weekday, avg
                ),
                format!("Reserve {} for your most important work.", weekday),
                context,
                5,
                now,
            )]
        }
        _ => Vec::new(),
    }
}

/// Rule 4: daily focus-time bands and week-over-week focus collapse
fn focus_time_rule(
    user_id: &UserId,
    recent: &[ProductivitySnapshot],
    previous: &[ProductivitySnapshot],
    now: DateTime<Utc>,
) -> Vec<ActionableInsight> {
    let mut candidates = Vec::new();
    if recent.is_empty() {
        return candidates;
    }

    let total: u32 = recent.iter().map(|s| s.focus_minutes).sum();
    let avg_daily = total as f64 / recent.len() as f64;
    let context = HashMap::from([
        ("avg_daily_focus_minutes".to_string(), json!(avg_daily)),
        ("total_focus_minutes".to_string(), json!(total)),
    ]);

    if avg_daily < FOCUS_LOW_MINUTES {
        candidates.push(ActionableInsight::new(
            user_id.clone(),
            InsightType::FocusTimeLow,
            InsightPriority::High,
            "Your focus time is low",
            format!(
                "You averaged {:.0} minutes of focused work per day over the last week.",
                avg_daily
            ),
            "Block at least one uninterrupted hour per day for deep work.",
            context.clone(),
            3,
            now,
        ));
    } else if avg_daily > FOCUS_HIGH_MINUTES {
        candidates.push(ActionableInsight::new(
            user_id.clone(),
            InsightType::FocusTimeHigh,
            InsightPriority::Low,
            "Strong focus habits",
            format!(
                "You averaged {:.0} minutes of focused work per day over the last week.",
                avg_daily
            ),
            "Your deep-work routine is solid - protect it.",
            context.clone(),
            3,
            now,
        ));
    }

    if recent.len() >= MIN_STATISTICAL_DAYS && previous.len() >= MIN_STATISTICAL_DAYS {
        let previous_total: u32 = previous.iter().map(|s| s.focus_minutes).sum();
        let change = percentage_change(total as f64, previous_total as f64);
        if change < -FOCUS_DROP_THRESHOLD_PCT {
            let mut drop_context = context;
            drop_context.insert("change_pct".to_string(), json!(change));
            drop_context.insert(
                "previous_total_focus_minutes".to_string(),
                json!(previous_total),
            );
            candidates.push(ActionableInsight::new(
                user_id.clone(),
                InsightType::FocusTimeLow,
                InsightPriority::Medium,
                "Your focus time dropped sharply",
                format!(
                    "Total focus time fell from {} to {} minutes week over week ({:.0}%).",
                    previous_total, total, change
                ),
                "Check what displaced your focus blocks this week.",
                drop_context,
                3,
                now,
            ));
        }
    }

    candidates
}

/// Rule 5: goal progress, risk and recent achievement
fn goal_rules(
    user_id: &UserId,
    active_goals: &[ProductivityGoal],
    achieved_goals: &[ProductivityGoal],
    now: DateTime<Utc>,
) -> Vec<ActionableInsight> {
    let mut candidates = Vec::new();

    for goal in active_goals {
        let progress = goal.progress_percentage();
        let context = HashMap::from([
            ("goal_id".to_string(), json!(goal.id.to_string())),
            ("goal_type".to_string(), json!(goal.goal_type.as_str())),
            ("progress_pct".to_string(), json!(progress)),
            ("target".to_string(), json!(goal.target_value)),
            ("current".to_string(), json!(goal.current_value)),
        ]);

        if progress < GOAL_AT_RISK_PROGRESS_PCT
            && goal.time_remaining_fraction(now) < GOAL_AT_RISK_TIME_FRACTION
            && goal.days_remaining(now) > 0
        {
            candidates.push(ActionableInsight::new(
                user_id.clone(),
                InsightType::GoalAtRisk,
                InsightPriority::High,
                format!("Your {} goal is at risk", goal.goal_type.as_str()),
                format!(
                    "You're at {:.0}% with most of the period already gone.",
                    progress
                ),
                format!(
                    "You need {} more to hit the target - prioritize it today.",
                    goal.remaining()
                ),
                context,
                2,
                now,
            ));
        } else if (GOAL_PROGRESS_PCT..100.0).contains(&progress) {
            candidates.push(ActionableInsight::new(
                user_id.clone(),
                InsightType::GoalProgress,
                InsightPriority::Low,
                format!("Almost there on your {} goal", goal.goal_type.as_str()),
                format!("You're at {:.0}% of the target.", progress),
                format!("Just {} more to go.", goal.remaining()),
                context,
                2,
                now,
            ));
        }
    }

    for goal in achieved_goals {
        let achieved_recently = goal
            .achieved_at
            .map(|at| now - at <= Duration::hours(24))
            .unwrap_or(false);
        if achieved_recently {
            let context = HashMap::from([
                ("goal_id".to_string(), json!(goal.id.to_string())),
                ("goal_type".to_string(), json!(goal.goal_type.as_str())),
                ("target".to_string(), json!(goal.target_value)),
            ]);
            candidates.push(ActionableInsight::new(
                user_id.clone(),
                InsightType::GoalAchieved,
                InsightPriority::Low,
                format!("Goal achieved: {}", goal.goal_type.as_str()),
                format!("You hit your target of {}.", goal.target_value),
                "Consider raising the bar for the next period.",
                context,
                2,
                now,
            ));
        }
    }

    candidates
}

/// Rule 6: habit streak milestones and streaks in danger
fn streak_rules(
    user_id: &UserId,
    recent: &[ProductivitySnapshot],
    latest: Option<&ProductivitySnapshot>,
    now: DateTime<Utc>,
) -> Vec<ActionableInsight> {
    let mut candidates = Vec::new();
    let Some(latest) = latest else {
        return candidates;
    };

    if STREAK_MILESTONES.contains(&latest.longest_habit_streak) {
        let context = HashMap::from([(
            "streak_days".to_string(),
            json!(latest.longest_habit_streak),
        )]);
        candidates.push(ActionableInsight::new(
            user_id.clone(),
            InsightType::HabitStreakMilestone,
            InsightPriority::Low,
            format!("{}-day streak!", latest.longest_habit_streak),
            format!(
                "Your longest habit streak just reached {} days.",
                latest.longest_habit_streak
            ),
            "Keep the chain going.",
            context,
            3,
            now,
        ));
    }

    // Streak in danger: habits going incomplete on most of the last few
    // days while a meaningful streak is on the line
    if latest.longest_habit_streak > STREAK_RISK_MIN_STREAK {
        let last_days = recent.iter().rev().take(3);
        let missed = last_days
            .filter(|s| s.habits_due > 0 && s.habits_completed < s.habits_due)
            .count();
        if missed >= STREAK_RISK_MISSED_DAYS {
            let context = HashMap::from([
                (
                    "streak_days".to_string(),
                    json!(latest.longest_habit_streak),
                ),
                ("recent_missed_days".to_string(), json!(missed)),
            ]);
            candidates.push(ActionableInsight::new(
                user_id.clone(),
                InsightType::HabitStreakRisk,
                InsightPriority::Medium,
                "Your streak is at risk",
                format!(
                    "You've missed habits on {} of the last 3 days with a {}-day streak on the line.",
                    missed, latest.longest_habit_streak
                ),
                "Do the smallest version of the habit today to keep the streak alive.",
                context,
                3,
                now,
            ));
        }
    }

    candidates
}

/// Rule 7: overdue backlog and over-ambitious scheduling
fn workload_rules(
    user_id: &UserId,
    recent: &[ProductivitySnapshot],
    latest: Option<&ProductivitySnapshot>,
    now: DateTime<Utc>,
) -> Vec<ActionableInsight> {
    let mut candidates = Vec::new();

    if let Some(latest) = latest {
        if latest.tasks_overdue >= OVERDUE_THRESHOLD {
            let context =
                HashMap::from([("overdue_count".to_string(), json!(latest.tasks_overdue))]);
            candidates.push(ActionableInsight::new(
                user_id.clone(),
                InsightType::TaskOverdue,
                InsightPriority::High,
                format!("{} tasks are overdue", latest.tasks_overdue),
                format!("Your overdue backlog has grown to {} tasks.", latest.tasks_overdue),
                "Triage the backlog: reschedule, delegate or drop what no longer matters.",
                context,
                2,
                now,
            ));
        }
    }

    let days_with_blocks: Vec<f64> = recent
        .iter()
        .filter(|s| s.blocks_scheduled > 0)
        .map(|s| s.block_completion_rate)
        .collect();
    if days_with_blocks.len() >= SCHEDULE_OPTIMIZE_MIN_DAYS {
        let avg_rate = days_with_blocks.iter().sum::<f64>() / days_with_blocks.len() as f64;
        if avg_rate > 0.0 && avg_rate < SCHEDULE_OPTIMIZE_MAX_RATE {
            let context = HashMap::from([
                ("avg_block_completion_rate".to_string(), json!(avg_rate)),
                ("days_observed".to_string(), json!(days_with_blocks.len())),
            ]);
            candidates.push(ActionableInsight::new(
                user_id.clone(),
                InsightType::ScheduleOptimize,
                InsightPriority::Medium,
                "Your schedule may be over-ambitious",
                format!(
                    "You completed only {:.0}% of your scheduled time blocks this week.",
                    avg_rate * 100.0
                ),
                "Plan fewer blocks, or make them shorter, until you complete most of them.",
                context,
                5,
                now,
            ));
        }
    }

    candidates
}

fn average_score(snapshots: &[ProductivitySnapshot]) -> f64 {
    if snapshots.is_empty() {
        return 0.0;
    }
    snapshots
        .iter()
        .map(|s| s.productivity_score as f64)
        .sum::<f64>()
        / snapshots.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::domain::{GoalId, SnapshotBuilder};
    use crate::storage::SqliteStorage;

    fn user() -> UserId {
        UserId::new("test-user").unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn scored(date: NaiveDate, created: u32, completed: u32) -> ProductivitySnapshot {
        SnapshotBuilder::new(user(), date)
            .task_metrics(created, completed, 0, 0.0)
            .build()
    }

    #[test]
    fn test_score_drop_rule_fires() {
        // Previous week near-perfect task rates, this week poor ones
        let previous: Vec<_> = (1..=3).map(|d| scored(day(d), 1, 9)).collect();
        let recent: Vec<_> = (8..=10).map(|d| scored(day(d), 9, 1)).collect();

        let candidates = score_change_rule(&user(), &recent, &previous, Utc::now());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].insight_type, InsightType::ProductivityDrop);
        assert_eq!(candidates[0].priority, InsightPriority::High);
    }

    #[test]
    fn test_score_rule_needs_three_days_each_window() {
        let previous = vec![scored(day(1), 1, 9), scored(day(2), 1, 9)];
        let recent: Vec<_> = (8..=10).map(|d| scored(day(d), 9, 1)).collect();

        let candidates = score_change_rule(&user(), &recent, &previous, Utc::now());
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_streak_milestone_fires_on_exact_lengths() {
        let mut snapshot = scored(day(10), 0, 5);
        snapshot.longest_habit_streak = 7;
        let candidates = streak_rules(&user(), &[], Some(&snapshot), Utc::now());
        assert_eq!(candidates.len(), 1);
        assert_eq!(
            candidates[0].insight_type,
            InsightType::HabitStreakMilestone
        );

        snapshot.longest_habit_streak = 8;
        let candidates = streak_rules(&user(), &[], Some(&snapshot), Utc::now());
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_focus_low_rule() {
        let recent: Vec<_> = (8..=10)
            .map(|d| {
                SnapshotBuilder::new(user(), day(d))
                    .focus_metrics(1, 30)
                    .build()
            })
            .collect();
        let candidates = focus_time_rule(&user(), &recent, &[], Utc::now());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].insight_type, InsightType::FocusTimeLow);
        assert_eq!(candidates[0].priority, InsightPriority::High);
    }

    #[test]
    fn test_overdue_rule_threshold() {
        let mut snapshot = scored(day(10), 5, 5);
        snapshot.tasks_overdue = 5;
        let candidates = workload_rules(&user(), &[], Some(&snapshot), Utc::now());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].insight_type, InsightType::TaskOverdue);

        snapshot.tasks_overdue = 4;
        let candidates = workload_rules(&user(), &[], Some(&snapshot), Utc::now());
        assert!(candidates.is_empty());
    }

    /// Storage double whose goal reads are down while everything else
    /// delegates to a real in-memory database
    struct GoalOutageStore {
        inner: SqliteStorage,
    }

    fn goal_outage() -> StorageError {
        StorageError::Connection("goal store down".to_string())
    }

    impl SnapshotStore for GoalOutageStore {
        fn upsert_snapshot(&self, snapshot: &ProductivitySnapshot) -> Result<(), StorageError> {
            self.inner.upsert_snapshot(snapshot)
        }

        fn get_snapshot(
            &self,
            user_id: &UserId,
            date: NaiveDate,
        ) -> Result<Option<ProductivitySnapshot>, StorageError> {
            self.inner.get_snapshot(user_id, date)
        }

        fn get_snapshots_in_range(
            &self,
            user_id: &UserId,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Vec<ProductivitySnapshot>, StorageError> {
            self.inner.get_snapshots_in_range(user_id, start, end)
        }

        fn get_latest_snapshot(
            &self,
            user_id: &UserId,
        ) -> Result<Option<ProductivitySnapshot>, StorageError> {
            self.inner.get_latest_snapshot(user_id)
        }

        fn get_recent_snapshots(
            &self,
            user_id: &UserId,
            count: u32,
        ) -> Result<Vec<ProductivitySnapshot>, StorageError> {
            self.inner.get_recent_snapshots(user_id, count)
        }

        fn average_score_in_range(
            &self,
            user_id: &UserId,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<f64, StorageError> {
            self.inner.average_score_in_range(user_id, start, end)
        }
    }

    impl InsightStore for GoalOutageStore {
        fn create_insight(&self, insight: &ActionableInsight) -> Result<(), StorageError> {
            self.inner.create_insight(insight)
        }

        fn update_insight(&self, insight: &ActionableInsight) -> Result<(), StorageError> {
            self.inner.update_insight(insight)
        }

        fn get_insight(
            &self,
            insight_id: &crate::domain::InsightId,
        ) -> Result<ActionableInsight, StorageError> {
            self.inner.get_insight(insight_id)
        }

        fn get_active_insights(
            &self,
            user_id: &UserId,
            now: DateTime<Utc>,
        ) -> Result<Vec<ActionableInsight>, StorageError> {
            self.inner.get_active_insights(user_id, now)
        }

        fn get_insights_by_type(
            &self,
            user_id: &UserId,
            insight_type: InsightType,
        ) -> Result<Vec<ActionableInsight>, StorageError> {
            self.inner.get_insights_by_type(user_id, insight_type)
        }

        fn get_recent_insights(
            &self,
            user_id: &UserId,
            limit: u32,
        ) -> Result<Vec<ActionableInsight>, StorageError> {
            self.inner.get_recent_insights(user_id, limit)
        }

        fn delete_insight(
            &self,
            insight_id: &crate::domain::InsightId,
        ) -> Result<(), StorageError> {
            self.inner.delete_insight(insight_id)
        }

        fn delete_expired_insights(&self, now: DateTime<Utc>) -> Result<usize, StorageError> {
            self.inner.delete_expired_insights(now)
        }
    }

    impl GoalStore for GoalOutageStore {
        fn create_goal(&self, _goal: &ProductivityGoal) -> Result<(), StorageError> {
            Err(goal_outage())
        }

        fn update_goal(&self, _goal: &ProductivityGoal) -> Result<(), StorageError> {
            Err(goal_outage())
        }

        fn get_goal(&self, _goal_id: &GoalId) -> Result<ProductivityGoal, StorageError> {
            Err(goal_outage())
        }

        fn get_active_goals(
            &self,
            _user_id: &UserId,
            _now: DateTime<Utc>,
        ) -> Result<Vec<ProductivityGoal>, StorageError> {
            Err(goal_outage())
        }

        fn get_goals_in_period(
            &self,
            _user_id: &UserId,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<Vec<ProductivityGoal>, StorageError> {
            Err(goal_outage())
        }

        fn get_achieved_goals(
            &self,
            _user_id: &UserId,
            _limit: u32,
        ) -> Result<Vec<ProductivityGoal>, StorageError> {
            Err(goal_outage())
        }

        fn delete_goal(&self, _goal_id: &GoalId) -> Result<(), StorageError> {
            Err(goal_outage())
        }
    }

    #[test]
    fn test_goal_read_failure_collected_while_other_rules_run() {
        let storage = GoalOutageStore {
            inner: SqliteStorage::in_memory().unwrap(),
        };
        let now = Utc::now();
        let today = now.date_naive();
        for offset in 0..3 {
            let snapshot = SnapshotBuilder::new(user(), today - Duration::days(offset))
                .focus_metrics(1, 30)
                .build();
            storage.inner.upsert_snapshot(&snapshot).unwrap();
        }

        let report = generate_insights(&storage, &user(), now).unwrap();

        // The focus rule still ran on the data that loaded
        assert!(report
            .generated
            .iter()
            .any(|i| i.insight_type == InsightType::FocusTimeLow));
        // Both failed goal reads were collected, not fatal
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors.iter().all(|e| e.contains("goal store down")));
    }

    #[test]
    fn test_goal_progress_band() {
        let now = Utc::now();
        let mut goal = ProductivityGoal::new(
            user(),
            crate::domain::GoalType::WeeklyTasks,
            10,
            crate::domain::PeriodType::Weekly,
            now,
        )
        .unwrap();
        goal.update_progress(8, now).unwrap();

        let candidates = goal_rules(&user(), &[goal], &[], now);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].insight_type, InsightType::GoalProgress);
    }
}
