/// Trend analysis between two observation windows
///
/// A trend compares the average of a metric over a current window against
/// the preceding window of the same length. Small movements are reported
/// as stable so day-to-day noise never flips the direction indicator.

use chrono::{Datelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::domain::summary::percentage_change;
use crate::domain::{DayScore, ProductivitySnapshot, TrendDirection};

/// Movement below this magnitude (percent) counts as stable
const STABLE_BAND_PCT: f64 = 5.0;

/// One metric's movement between the previous and current window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricTrend {
    pub direction: TrendDirection,
    pub change_pct: f64,
    pub current_avg: f64,
    pub previous_avg: f64,
}

/// Compare two value series and classify the movement
///
/// The average of an empty series is zero, and a zero baseline yields a
/// zero change (there is nothing meaningful to divide by), so a user's
/// first window always reads as stable.
pub fn calculate_trend(current: &[f64], previous: &[f64]) -> MetricTrend {
    let current_avg = average(current);
    let previous_avg = average(previous);
    let change_pct = percentage_change(current_avg, previous_avg);

    let direction = if change_pct > STABLE_BAND_PCT {
        TrendDirection::Up
    } else if change_pct < -STABLE_BAND_PCT {
        TrendDirection::Down
    } else {
        TrendDirection::Stable
    };

    MetricTrend {
        direction,
        change_pct,
        current_avg,
        previous_avg,
    }
}

fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Full trend report over a window of snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub productivity: MetricTrend,
    pub task_completion: MetricTrend,
    pub habit_completion: MetricTrend,
    pub focus_minutes: MetricTrend,
    pub best_day: Option<DayScore>,
    pub worst_day: Option<DayScore>,
    /// Day of week with the highest average score in the current window
    pub best_weekday: Option<String>,
    /// Hour of day with the most completions in the current window
    pub peak_hour: Option<u8>,
}

/// Analyze a current window of snapshots against the preceding one
///
/// Score, task rate and habit rate are compared day-by-day; focus time is
/// compared as window totals. Best/worst day keep the first-encountered
/// date on score ties.
pub fn analyze(current: &[ProductivitySnapshot], previous: &[ProductivitySnapshot]) -> TrendReport {
    let scores = |snaps: &[ProductivitySnapshot]| -> Vec<f64> {
        snaps.iter().map(|s| s.productivity_score as f64).collect()
    };
    let task_rates = |snaps: &[ProductivitySnapshot]| -> Vec<f64> {
        snaps.iter().map(|s| s.task_completion_rate).collect()
    };
    let habit_rates = |snaps: &[ProductivitySnapshot]| -> Vec<f64> {
        snaps.iter().map(|s| s.habit_completion_rate).collect()
    };
    let focus_total = |snaps: &[ProductivitySnapshot]| -> f64 {
        snaps.iter().map(|s| s.focus_minutes as f64).sum()
    };

    let mut best_day: Option<DayScore> = None;
    let mut worst_day: Option<DayScore> = None;
    for snapshot in current {
        let day = DayScore {
            date: snapshot.date,
            score: snapshot.productivity_score,
        };
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

    TrendReport {
        productivity: calculate_trend(&scores(current), &scores(previous)),
        task_completion: calculate_trend(&task_rates(current), &task_rates(previous)),
        habit_completion: calculate_trend(&habit_rates(current), &habit_rates(previous)),
        focus_minutes: calculate_trend(&[focus_total(current)], &[focus_total(previous)]),
        best_day,
        worst_day,
        best_weekday: best_weekday(current).map(|(weekday, _)| weekday.to_string()),
        peak_hour: aggregate_peak_hour(current).map(|(hour, _)| hour),
    }
}

/// Day of week with the highest average score, with that average
///
/// Ties resolve to the earlier weekday (Monday first).
pub fn best_weekday(snapshots: &[ProductivitySnapshot]) -> Option<(Weekday, f64)> {
    let mut by_weekday: [(u64, u32); 7] = [(0, 0); 7];
    for snapshot in snapshots {
        let idx = snapshot.date.weekday().num_days_from_monday() as usize;
        by_weekday[idx].0 += snapshot.productivity_score as u64;
        by_weekday[idx].1 += 1;
    }

    let weekdays = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    let mut best: Option<(Weekday, f64)> = None;
    for (idx, (sum, count)) in by_weekday.iter().enumerate() {
        if *count == 0 {
            continue;
        }
        let avg = *sum as f64 / *count as f64;
        match best {
            None => best = Some((weekdays[idx], avg)),
            Some((_, best_avg)) if avg > best_avg => best = Some((weekdays[idx], avg)),
            _ => {}
        }
    }
    best
}

/// Hour of day with the most completions across the window, with its count
///
/// Ties resolve to the earlier hour.
pub fn aggregate_peak_hour(snapshots: &[ProductivitySnapshot]) -> Option<(u8, u32)> {
    let mut by_hour: [u32; 24] = [0; 24];
    for snapshot in snapshots {
        for (hour, count) in &snapshot.peak_hours {
            if (*hour as usize) < 24 {
                by_hour[*hour as usize] += count;
            }
        }
    }

    let mut peak: Option<(u8, u32)> = None;
    for (hour, count) in by_hour.iter().enumerate() {
        if *count == 0 {
            continue;
        }
        match peak {
            None => peak = Some((hour as u8, *count)),
            Some((_, peak_count)) if *count > peak_count => peak = Some((hour as u8, *count)),
            _ => {}
        }
    }
    peak
}
