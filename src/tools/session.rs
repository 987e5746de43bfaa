/// Tools for tracked time sessions
///
/// Implements the session_start and session_end MCP tools.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::analytics::{self, EngineError};
use crate::domain::{SessionType, TimeSession};
use crate::storage::SessionStore;
use crate::tools::parse_user;

/// Parameters for starting a session
#[derive(Debug, Deserialize)]
pub struct StartSessionParams {
    pub user: String,
    /// One of: task, habit, focus, meeting, other (defaults to focus)
    pub session_type: Option<String>,
    pub title: String,
    /// Optional id of the related task/habit entity
    pub reference_id: Option<String>,
    pub category: Option<String>,
}

/// Response from starting a session
#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub success: bool,
    pub message: String,
    pub session: TimeSession,
}

/// Start a session; fails while another one is active
pub fn start_session<S>(
    storage: &S,
    params: StartSessionParams,
) -> Result<StartSessionResponse, EngineError>
where
    S: SessionStore,
{
    let user_id = parse_user(&params.user)?;
    let session_type = match params.session_type.as_deref() {
        Some(s) => SessionType::parse(s)?,
        None => SessionType::Focus,
    };

    let session = analytics::start_session(
        storage,
        &user_id,
        session_type,
        params.title,
        params.reference_id,
        params.category,
        Utc::now(),
    )?;

    Ok(StartSessionResponse {
        message: format!("Started {} session: {}", session.session_type.as_str(), session.title),
        success: true,
        session,
    })
}

/// Parameters for ending the active session
#[derive(Debug, Deserialize)]
pub struct EndSessionParams {
    pub user: String,
    pub notes: Option<String>,
    /// End as interrupted instead of completed
    pub interrupted: Option<bool>,
}

/// Response from ending a session
#[derive(Debug, Serialize)]
pub struct EndSessionResponse {
    pub success: bool,
    pub message: String,
    pub session: TimeSession,
}

/// End the user's active session, freezing its duration
pub fn end_session<S>(storage: &S, params: EndSessionParams) -> Result<EndSessionResponse, EngineError>
where
    S: SessionStore,
{
    let user_id = parse_user(&params.user)?;
    let now = Utc::now();

    let session = if params.interrupted.unwrap_or(false) {
        analytics::interrupt_session(storage, &user_id, now)?
    } else {
        analytics::end_session(storage, &user_id, params.notes, now)?
    };

    let minutes = session.duration_minutes.unwrap_or(0);
    Ok(EndSessionResponse {
        message: format!(
            "Ended session '{}' after {} minute{} ({}).",
            session.title,
            minutes,
            if minutes == 1 { "" } else { "s" },
            session.status.as_str()
        ),
        success: true,
        session,
    })
}
