/// Public library interface for the Productivity Analytics MCP server
///
/// This module exports the server implementation, the analytics engine and
/// the public types used by the binary and the test targets.

use std::path::PathBuf;
use thiserror::Error;

pub mod analytics;
pub mod domain;
pub mod mcp;
pub mod storage;
pub mod tools;

pub use analytics::{EngineError, InsightReport, MetricTrend, TrendReport};
pub use domain::*;
pub use storage::{SqliteStorage, StorageError};

/// Errors that can occur during server operation
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Database error: {0}")]
    Database(#[from] storage::StorageError),

    #[error("Domain validation error: {0}")]
    Domain(#[from] domain::DomainError),

    #[error("Engine error: {0}")]
    Engine(#[from] analytics::EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Main productivity analytics server that implements the MCP protocol
///
/// The server owns the SQLite storage and an optional default user id for
/// single-user installs. All analytics run synchronously against storage;
/// only the JSON-RPC transport is async.
pub struct ProductivityServer {
    storage: SqliteStorage,
    default_user: Option<String>,
}

impl ProductivityServer {
    /// Create a new server with the specified database path
    ///
    /// This will initialize the SQLite database with the required schema
    /// if it doesn't already exist.
    pub fn new(db_path: PathBuf, default_user: Option<String>) -> Result<Self, ServerError> {
        tracing::info!(
            "Initializing productivity analytics server with database: {:?}",
            db_path
        );

        let storage = SqliteStorage::new(db_path)?;

        Ok(Self {
            storage,
            default_user,
        })
    }

    /// Run the MCP server, handling JSON-RPC requests over stdin/stdout
    ///
    /// This method blocks until stdin closes or an error occurs.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("Starting MCP server...");

        let mut mcp_server = mcp::McpServer::new(self);
        mcp_server.run().await?;

        Ok(())
    }

    /// Get a reference to the storage layer (useful for testing)
    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    /// The user id applied when a tool call omits the `user` argument
    pub fn default_user(&self) -> Option<&str> {
        self.default_user.as_deref()
    }
}
