/// MCP protocol layer: JSON-RPC types and the stdin/stdout server loop

pub mod protocol;
pub mod server;

pub use server::McpServer;
