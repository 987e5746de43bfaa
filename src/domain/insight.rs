/// Actionable insight entity
///
/// Insights are generated recommendations with a fixed validity window.
/// After creation they are immutable except for the dismissed/acted-on
/// flags. An insight is "actionable" only while now is inside its window
/// and it has been neither dismissed nor acted on - that predicate drives
/// both presentation and the generator's duplicate suppression.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{InsightId, InsightPriority, InsightType, UserId};

/// A generated, time-bounded recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionableInsight {
    pub id: InsightId,
    pub user_id: UserId,
    pub insight_type: InsightType,
    pub priority: InsightPriority,
    pub title: String,
    pub description: String,
    /// Concrete next step the user can take
    pub suggestion: String,
    /// Free-form values justifying the insight (thresholds, averages, ids)
    pub context: HashMap<String, Value>,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub dismissed: bool,
    pub dismissed_at: Option<DateTime<Utc>>,
    pub acted_on: bool,
    pub acted_on_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ActionableInsight {
    /// Create an insight valid for `valid_days` days starting now
    pub fn new(
        user_id: UserId,
        insight_type: InsightType,
        priority: InsightPriority,
        title: impl Into<String>,
        description: impl Into<String>,
        suggestion: impl Into<String>,
        context: HashMap<String, Value>,
        valid_days: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: InsightId::new(),
            user_id,
            insight_type,
            priority,
            title: title.into(),
            description: description.into(),
            suggestion: suggestion.into(),
            context,
            valid_from: now,
            valid_to: now + Duration::days(valid_days),
            dismissed: false,
            dismissed_at: None,
            acted_on: false,
            acted_on_at: None,
            created_at: now,
        }
    }

    /// Rehydrate an insight from stored data (database loading)
    #[allow(clippy::too_many_arguments)]
    pub fn from_existing(
        id: InsightId,
        user_id: UserId,
        insight_type: InsightType,
        priority: InsightPriority,
        title: String,
        description: String,
        suggestion: String,
        context: HashMap<String, Value>,
        valid_from: DateTime<Utc>,
        valid_to: DateTime<Utc>,
        dismissed: bool,
        dismissed_at: Option<DateTime<Utc>>,
        acted_on: bool,
        acted_on_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            insight_type,
            priority,
            title,
            description,
            suggestion,
            context,
            valid_from,
            valid_to,
            dismissed,
            dismissed_at,
            acted_on,
            acted_on_at,
            created_at,
        }
    }

    /// Whether this insight should still be shown and still blocks
    /// duplicates of its type
    pub fn is_actionable(&self, now: DateTime<Utc>) -> bool {
        !self.dismissed
            && !self.acted_on
            && now >= self.valid_from
            && now <= self.valid_to
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.valid_to
    }

    /// Mark dismissed; idempotent, keeps the first dismissal timestamp
    pub fn dismiss(&mut self, now: DateTime<Utc>) {
        if !self.dismissed {
            self.dismissed = true;
            self.dismissed_at = Some(now);
        }
    }

    /// Mark acted on; idempotent, keeps the first timestamp
    pub fn mark_acted_on(&mut self, now: DateTime<Utc>) {
        if !self.acted_on {
            self.acted_on = true;
            self.acted_on_at = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insight(valid_days: i64) -> ActionableInsight {
        ActionableInsight::new(
            UserId::new("test-user").unwrap(),
            InsightType::PeakHour,
            InsightPriority::Medium,
            "Your peak hour is 9:00",
            "Most completions land at 9:00.",
            "Schedule demanding work in the morning.",
            HashMap::new(),
            valid_days,
            Utc::now(),
        )
    }

    #[test]
    fn test_actionable_within_window() {
        let insight = insight(3);
        let now = Utc::now();
        assert!(insight.is_actionable(now));
        assert!(!insight.is_actionable(now + Duration::days(4)));
        assert!(insight.is_expired(now + Duration::days(4)));
    }

    #[test]
    fn test_dismiss_stops_actionability() {
        let mut insight = insight(7);
        let now = Utc::now();
        insight.dismiss(now);
        assert!(!insight.is_actionable(now));
        assert_eq!(insight.dismissed_at, Some(now));

        // A second dismissal keeps the original timestamp
        insight.dismiss(now + Duration::hours(1));
        assert_eq!(insight.dismissed_at, Some(now));
    }

    #[test]
    fn test_acted_on_stops_actionability() {
        let mut insight = insight(7);
        let now = Utc::now();
        insight.mark_acted_on(now);
        assert!(!insight.is_actionable(now));
        assert!(insight.acted_on);
    }
}
