/// Main entry point for the Productivity Analytics MCP server
///
/// Sets up logging, parses command line arguments, resolves the database
/// path, and starts the MCP server. The server listens for JSON-RPC
/// requests over stdin/stdout following the MCP protocol.

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use productivity_mcp::ProductivityServer;

/// Get the default database path with a fallback chain
fn get_default_database_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    // Try various locations in order of preference
    let potential_paths = [
        dirs::home_dir().map(|mut p| {
            p.push(".productivity_mcp");
            p
        }),
        dirs::data_dir().map(|mut p| {
            p.push("productivity_mcp");
            p
        }),
        dirs::config_dir().map(|mut p| {
            p.push("productivity_mcp");
            p
        }),
        std::env::current_dir().ok().map(|mut p| {
            p.push(".productivity_mcp");
            p
        }),
    ];

    for potential_path in potential_paths.iter().flatten() {
        if let Ok(()) = std::fs::create_dir_all(potential_path) {
            // Only pick a directory we can actually write to
            let test_file = potential_path.join(".test_write");
            if std::fs::write(&test_file, "test").is_ok() {
                let _ = std::fs::remove_file(&test_file);
                let mut db_path = potential_path.clone();
                db_path.push("productivity.db");
                return Ok(db_path);
            }
        }
    }

    // Ultimate fallback: use a temporary directory
    let mut temp_path = std::env::temp_dir();
    temp_path.push("productivity_mcp");
    std::fs::create_dir_all(&temp_path)?;
    temp_path.push("productivity.db");

    tracing::warn!(
        "Using temporary directory for database: {}",
        temp_path.display()
    );
    Ok(temp_path)
}

/// Command line arguments for the Productivity Analytics MCP server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    /// If not provided, uses a default location in the user's home directory
    #[arg(long)]
    database: Option<PathBuf>,

    /// Default user id for tool calls that omit one (single-user installs)
    #[arg(short, long)]
    user: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = if args.verbose {
        "debug"
    } else if args.debug {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!("productivity_mcp={}", log_level))
        .with_writer(std::io::stderr) // stdout is the JSON-RPC channel
        .init();

    info!("Starting Productivity Analytics MCP server");

    let db_path = match args.database {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            path
        }
        None => get_default_database_path()?,
    };

    info!("Using database at: {}", db_path.display());

    let server = ProductivityServer::new(db_path, args.user)?;
    server.run().await?;

    info!("Productivity Analytics MCP server shutdown complete");
    Ok(())
}
