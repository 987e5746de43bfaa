/// Tracked time session entity
///
/// A session is an interval of focused work (task, habit, focus block,
/// meeting or other). At most one session may be active per user - that
/// invariant is enforced by the engine against the session store. Duration
/// is frozen when the session ends; while active it is computed live.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, SessionId, SessionStatus, SessionType, UserId};

/// A tracked focus/work interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSession {
    pub id: SessionId,
    pub user_id: UserId,
    pub session_type: SessionType,
    /// Optional id of the related task/habit/meeting entity
    pub reference_id: Option<String>,
    pub title: String,
    pub category: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Frozen at end time; None while the session is running
    pub duration_minutes: Option<i64>,
    pub status: SessionStatus,
    pub interruptions: u32,
    pub notes: Option<String>,
}

impl TimeSession {
    /// Start a new active session
    pub fn start(
        user_id: UserId,
        session_type: SessionType,
        title: String,
        reference_id: Option<String>,
        category: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if title.trim().is_empty() {
            return Err(DomainError::Validation {
                message: "Session title cannot be empty".to_string(),
            });
        }

        Ok(Self {
            id: SessionId::new(),
            user_id,
            session_type,
            reference_id,
            title,
            category,
            started_at: now,
            ended_at: None,
            duration_minutes: None,
            status: SessionStatus::Active,
            interruptions: 0,
            notes: None,
        })
    }

    /// Rehydrate a session from stored data (database loading)
    #[allow(clippy::too_many_arguments)]
    pub fn from_existing(
        id: SessionId,
        user_id: UserId,
        session_type: SessionType,
        reference_id: Option<String>,
        title: String,
        category: Option<String>,
        started_at: DateTime<Utc>,
        ended_at: Option<DateTime<Utc>>,
        duration_minutes: Option<i64>,
        status: SessionStatus,
        interruptions: u32,
        notes: Option<String>,
    ) -> Self {
        Self {
            id,
            user_id,
            session_type,
            reference_id,
            title,
            category,
            started_at,
            ended_at,
            duration_minutes,
            status,
            interruptions,
            notes,
        }
    }

    /// End the session as completed, freezing its duration
    ///
    /// Ending a session that is not active is a state-conflict error and
    /// leaves the session untouched.
    pub fn end(&mut self, now: DateTime<Utc>, notes: Option<String>) -> Result<(), DomainError> {
        self.finish(SessionStatus::Completed, now, notes)
    }

    /// End the session as interrupted
    pub fn interrupt(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.finish(SessionStatus::Interrupted, now, None)
    }

    /// End the session as abandoned
    pub fn abandon(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.finish(SessionStatus::Abandoned, now, None)
    }

    /// Count an interruption without ending the session
    pub fn record_interruption(&mut self) -> Result<(), DomainError> {
        if self.status != SessionStatus::Active {
            return Err(DomainError::SessionNotActive {
                session_id: self.id.to_string(),
            });
        }
        self.interruptions += 1;
        Ok(())
    }

    /// Minutes elapsed: frozen for ended sessions, live for active ones
    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> i64 {
        match self.duration_minutes {
            Some(minutes) => minutes,
            None => (now - self.started_at).num_minutes().max(0),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    fn finish(
        &mut self,
        status: SessionStatus,
        now: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<(), DomainError> {
        if self.status != SessionStatus::Active {
            return Err(DomainError::SessionNotActive {
                session_id: self.id.to_string(),
            });
        }

        self.ended_at = Some(now);
        self.duration_minutes = Some((now - self.started_at).num_minutes().max(0));
        self.status = status;
        if notes.is_some() {
            self.notes = notes;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session() -> TimeSession {
        TimeSession::start(
            UserId::new("test-user").unwrap(),
            SessionType::Focus,
            "Deep work".to_string(),
            None,
            Some("writing".to_string()),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_title_rejected() {
        let result = TimeSession::start(
            UserId::new("test-user").unwrap(),
            SessionType::Focus,
            "   ".to_string(),
            None,
            None,
            Utc::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_end_freezes_duration() {
        let mut session = session();
        let end = session.started_at + Duration::minutes(50);
        session.end(end, None).unwrap();

        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.duration_minutes, Some(50));
        // Frozen: later reads report the same duration
        assert_eq!(session.elapsed_minutes(end + Duration::hours(2)), 50);
    }

    #[test]
    fn test_double_end_is_error() {
        let mut session = session();
        let end = session.started_at + Duration::minutes(10);
        session.end(end, None).unwrap();

        let result = session.end(end + Duration::minutes(5), None);
        assert!(matches!(result, Err(DomainError::SessionNotActive { .. })));
        // First end untouched
        assert_eq!(session.duration_minutes, Some(10));
    }

    #[test]
    fn test_live_duration_while_active() {
        let session = session();
        let later = session.started_at + Duration::minutes(25);
        assert_eq!(session.elapsed_minutes(later), 25);
    }

    #[test]
    fn test_interruption_only_while_active() {
        let mut session = session();
        session.record_interruption().unwrap();
        assert_eq!(session.interruptions, 1);

        session.interrupt(session.started_at + Duration::minutes(5)).unwrap();
        assert_eq!(session.status, SessionStatus::Interrupted);
        assert!(session.record_interruption().is_err());
    }
}
