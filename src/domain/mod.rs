/// Domain module containing core business logic and data types
///
/// This module defines the engine's entities (ProductivitySnapshot,
/// WeeklySummary, ProductivityGoal, ActionableInsight, TimeSession), the
/// shared calendar-period arithmetic, and their validation rules.

pub mod goal;
pub mod insight;
pub mod period;
pub mod session;
pub mod snapshot;
pub mod summary;
pub mod types;

// Re-export public types for easy access
pub use goal::*;
pub use insight::*;
pub use session::*;
pub use snapshot::*;
pub use summary::*;
pub use types::*;

use thiserror::Error;

/// Errors that can occur during domain operations
///
/// Validation errors are returned before any state mutation; state-conflict
/// errors leave the underlying entity untouched.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid goal target: {message}")]
    InvalidGoalTarget { message: String },

    #[error("Goal {goal_id} is already achieved and can no longer be updated")]
    GoalAlreadyAchieved { goal_id: String },

    #[error("Session {session_id} is not active")]
    SessionNotActive { session_id: String },

    #[error("A session is already active: {session_id}")]
    SessionAlreadyActive { session_id: String },

    #[error("Invalid date: {0}")]
    InvalidDate(String),
}
