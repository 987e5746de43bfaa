/// MCP tools for productivity analytics
///
/// This module contains all the MCP tools that external clients can call:
/// snapshot computation, dashboards, trends, weekly summaries, goals,
/// insight generation and time sessions. Every tool takes an explicit
/// `user` argument; the server never assumes an implicit user.

pub mod dashboard;
pub mod goals;
pub mod insights;
pub mod session;
pub mod snapshot;
pub mod trends;

// Re-export tool functions for easy access
pub use dashboard::*;
pub use goals::*;
pub use insights::*;
pub use session::*;
pub use snapshot::*;
pub use trends::*;

use chrono::{NaiveDate, Utc};

use crate::analytics::EngineError;
use crate::domain::{DomainError, UserId};

/// Parse the mandatory user argument shared by every tool
pub(crate) fn parse_user(raw: &str) -> Result<UserId, EngineError> {
    UserId::new(raw).map_err(EngineError::from)
}

/// Parse an optional YYYY-MM-DD date, defaulting to today
pub(crate) fn parse_date_or_today(raw: Option<&str>) -> Result<NaiveDate, EngineError> {
    match raw {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
            EngineError::from(DomainError::InvalidDate(format!(
                "Expected YYYY-MM-DD, got '{}'",
                s
            )))
        }),
        None => Ok(Utc::now().date_naive()),
    }
}
