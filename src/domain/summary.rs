/// Weekly summary rollup
///
/// A `WeeklySummary` aggregates one Monday-aligned week of snapshots:
/// completion totals, daily averages over days that actually have data,
/// best/worst day, streak aggregates, and trend percentages against the
/// previous week's stored summary.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::period;
use crate::domain::{ProductivitySnapshot, UserId};

/// Reference to a single day and its score, used for best/worst day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayScore {
    pub date: NaiveDate,
    pub score: u32,
}

/// One week's rolled-up metrics and trend vs. the prior week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub user_id: UserId,
    /// Always the Monday of the week, regardless of the date supplied
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,

    pub tasks_completed: u32,
    pub habits_completed: u32,
    pub blocks_completed: u32,
    pub focus_minutes: u32,

    /// Averaged over days with a snapshot, not calendar days
    pub avg_productivity_score: f64,
    pub avg_focus_minutes: f64,

    /// Percentage change vs. the immediately preceding week (0 when the
    /// prior week has no summary)
    pub productivity_trend_pct: f64,
    pub focus_trend_pct: f64,

    pub best_day: Option<DayScore>,
    pub worst_day: Option<DayScore>,

    /// Days in the week where a habit streak was active
    pub habits_with_streak: u32,
    /// Largest longest-streak value seen in the week
    pub longest_streak: u32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WeeklySummary {
    /// Roll up a week of snapshots into a summary
    ///
    /// `reference` may be any date; the summary is anchored to the Monday
    /// of its calendar week. `previous` is the stored summary of the
    /// immediately preceding week, used for the trend percentages.
    pub fn from_snapshots(
        user_id: UserId,
        reference: NaiveDate,
        snapshots: &[ProductivitySnapshot],
        previous: Option<&WeeklySummary>,
        now: DateTime<Utc>,
    ) -> Self {
        let week_start = period::week_start(reference);
        let week_end = week_start + Duration::days(6);

        let mut tasks_completed = 0u32;
        let mut habits_completed = 0u32;
        let mut blocks_completed = 0u32;
        let mut focus_minutes = 0u32;
        let mut score_sum = 0u64;
        let mut habits_with_streak = 0u32;
        let mut longest_streak = 0u32;
        let mut best_day: Option<DayScore> = None;
        let mut worst_day: Option<DayScore> = None;

        for snapshot in snapshots {
            tasks_completed += snapshot.tasks_completed;
            habits_completed += snapshot.habits_completed;
            blocks_completed += snapshot.blocks_completed;
            focus_minutes += snapshot.focus_minutes;
            score_sum += snapshot.productivity_score as u64;

            if snapshot.longest_habit_streak > 0 {
                habits_with_streak += 1;
            }
            longest_streak = longest_streak.max(snapshot.longest_habit_streak);

            let day = DayScore {
                date: snapshot.date,
                score: snapshot.productivity_score,
            };
            // Strict comparisons keep the first-encountered day on ties
            match best_day {
                None => best_day = Some(day),
                Some(best) if day.score > best.score => best_day = Some(day),
                _ => {}
            }
            match worst_day {
                None => worst_day = Some(day),
                Some(worst) if day.score < worst.score => worst_day = Some(day),
                _ => {}
            }
        }

        let days = snapshots.len() as f64;
        let (avg_productivity_score, avg_focus_minutes) = if days > 0.0 {
            (score_sum as f64 / days, focus_minutes as f64 / days)
        } else {
            (0.0, 0.0)
        };

        let productivity_trend_pct = previous
            .map(|prev| percentage_change(avg_productivity_score, prev.avg_productivity_score))
            .unwrap_or(0.0);
        let focus_trend_pct = previous
            .map(|prev| percentage_change(focus_minutes as f64, prev.focus_minutes as f64))
            .unwrap_or(0.0);

        Self {
            user_id,
            week_start,
            week_end,
            tasks_completed,
            habits_completed,
            blocks_completed,
            focus_minutes,
            avg_productivity_score,
            avg_focus_minutes,
            productivity_trend_pct,
            focus_trend_pct,
            best_day,
            worst_day,
            habits_with_streak,
            longest_streak,
            created_at: now,
            updated_at: now,
        }
    }

    /// Human-readable direction of the productivity trend
    pub fn trend_description(&self) -> &'static str {
        trend_text(self.productivity_trend_pct)
    }
}

/// Percentage change between two values; zero when the baseline is empty
pub fn percentage_change(current: f64, previous: f64) -> f64 {
    if previous > 0.0 {
        (current - previous) / previous * 100.0
    } else {
        0.0
    }
}

/// Map a percentage change to the human-readable direction
pub fn trend_text(change_pct: f64) -> &'static str {
    if change_pct > 10.0 {
        "significantly improved"
    } else if change_pct > 0.0 {
        "improved"
    } else if change_pct < -10.0 {
        "significantly declined"
    } else if change_pct < 0.0 {
        "declined"
    } else {
        "stable"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SnapshotBuilder;

    fn user() -> UserId {
        UserId::new("test-user").unwrap()
    }

    fn snapshot(date: NaiveDate, completed: u32, focus: u32, streak: u32) -> ProductivitySnapshot {
        SnapshotBuilder::new(user(), date)
            .task_metrics(0, completed, 0, 0.0)
            .habit_metrics(2, 2, streak)
            .focus_metrics(2, focus)
            .build()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_week_start_normalized_to_monday() {
        // Reference Wednesday 2024-01-10
        let summary = WeeklySummary::from_snapshots(user(), date(10), &[], None, Utc::now());
        assert_eq!(summary.week_start, date(8));
        assert_eq!(summary.week_end, date(14));
    }

    #[test]
    fn test_totals_and_averages_over_days_with_data() {
        let snapshots = vec![
            snapshot(date(8), 4, 60, 0),
            snapshot(date(9), 6, 120, 3),
        ];
        let summary = WeeklySummary::from_snapshots(user(), date(10), &snapshots, None, Utc::now());

        assert_eq!(summary.tasks_completed, 10);
        assert_eq!(summary.focus_minutes, 180);
        // Two days of data, not seven calendar days
        assert_eq!(summary.avg_focus_minutes, 90.0);
        assert_eq!(summary.habits_with_streak, 1);
        assert_eq!(summary.longest_streak, 3);
    }

    #[test]
    fn test_best_day_keeps_first_on_tie() {
        // Both days score identically; the first encountered wins
        let snapshots = vec![
            snapshot(date(8), 5, 0, 0),
            snapshot(date(9), 5, 0, 0),
        ];
        let summary = WeeklySummary::from_snapshots(user(), date(8), &snapshots, None, Utc::now());
        assert_eq!(summary.best_day.unwrap().date, date(8));
        assert_eq!(summary.worst_day.unwrap().date, date(8));
    }

    #[test]
    fn test_trend_zero_without_previous_week() {
        let snapshots = vec![snapshot(date(8), 5, 60, 0)];
        let summary = WeeklySummary::from_snapshots(user(), date(8), &snapshots, None, Utc::now());
        assert_eq!(summary.productivity_trend_pct, 0.0);
        assert_eq!(summary.focus_trend_pct, 0.0);
        assert_eq!(summary.trend_description(), "stable");
    }

    #[test]
    fn test_trend_text_bands() {
        assert_eq!(trend_text(15.0), "significantly improved");
        assert_eq!(trend_text(5.0), "improved");
        assert_eq!(trend_text(0.0), "stable");
        assert_eq!(trend_text(-5.0), "declined");
        assert_eq!(trend_text(-15.0), "significantly declined");
    }
}
