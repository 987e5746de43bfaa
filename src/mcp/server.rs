/// MCP server implementation that handles JSON-RPC communication
///
/// Reads JSON-RPC requests from stdin line by line, dispatches tool calls
/// against the analytics engine, and writes JSON-RPC responses to stdout.
/// All logging goes to stderr; stdout carries only protocol traffic.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use crate::mcp::protocol::*;
use crate::tools;
use crate::{ProductivityServer, ServerError};

/// MCP server bridging stdio JSON-RPC to the analytics tools
pub struct McpServer {
    server: ProductivityServer,
    initialized: bool,
}

impl McpServer {
    pub fn new(server: ProductivityServer) -> Self {
        Self {
            server,
            initialized: false,
        }
    }

    /// Run the MCP server, handling JSON-RPC over stdin/stdout
    pub async fn run(&mut self) -> Result<(), ServerError> {
        info!("Starting MCP server, waiting for JSON-RPC requests...");

        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin);
        let mut stdout = tokio::io::stdout();

        let mut line = String::new();

        loop {
            line.clear();

            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("MCP server shutting down (stdin closed)");
                    break;
                }
                Ok(_) => {
                    if let Some(response) = self.process_line(&line) {
                        let response_str = serde_json::to_string(&response)?;

                        stdout.write_all(response_str.as_bytes()).await?;
                        stdout.write_all(b"\n").await?;
                        stdout.flush().await?;

                        debug!("Sent response: {}", response_str);
                    }
                }
                Err(e) => {
                    error!("Failed to read from stdin: {}", e);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Process a single line of JSON-RPC input
    fn process_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        debug!("Processing request: {}", line);

        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse JSON-RPC request: {}", e);
                return Some(JsonRpcResponse::error(
                    json!(null),
                    error_codes::PARSE_ERROR,
                    format!("Invalid JSON: {}", e),
                    None,
                ));
            }
        };

        Some(self.handle_request(request))
    }

    fn handle_request(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request),
            "initialized" => {
                self.initialized = true;
                JsonRpcResponse::success(request.id, json!(null))
            }
            "tools/list" => self.handle_tools_list(request),
            "tools/call" => self.handle_tools_call(request),
            _ => JsonRpcResponse::error(
                request.id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method '{}' not found", request.method),
                None,
            ),
        }
    }

    fn handle_initialize(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        info!("MCP client connected");

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: "Productivity Analytics MCP".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(e) => JsonRpcResponse::error(
                request.id,
                error_codes::INTERNAL_ERROR,
                format!("Failed to serialize initialize result: {}", e),
                None,
            ),
        }
    }

    fn handle_tools_list(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        let user_arg = json!({"type": "string", "description": "User id the operation applies to (optional when the server was started with --user)"});

        let tools = vec![
            ToolDefinition {
                name: "snapshot_compute".to_string(),
                description: "Compute (or recompute) the productivity snapshot and score for one day".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "user": user_arg,
                        "date": {"type": "string", "description": "Date to compute (YYYY-MM-DD, optional - defaults to today)"}
                    },
                    "required": []
                }),
            },
            ToolDefinition {
                name: "dashboard_get".to_string(),
                description: "Get the at-a-glance dashboard: today's score, current week, active goals and session".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "user": user_arg
                    },
                    "required": []
                }),
            },
            ToolDefinition {
                name: "trends_get".to_string(),
                description: "Compare recent productivity against the preceding window: score, task/habit rates, focus time, peak hour and best weekday".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "user": user_arg,
                        "days": {"type": "number", "description": "Window length in days (optional, defaults to 7)"}
                    },
                    "required": []
                }),
            },
            ToolDefinition {
                name: "summary_week".to_string(),
                description: "Roll up one week into totals, averages, best/worst day and a trend vs. the previous week".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "user": user_arg,
                        "date": {"type": "string", "description": "Any date inside the week (YYYY-MM-DD, optional - defaults to today)"}
                    },
                    "required": []
                }),
            },
            ToolDefinition {
                name: "goal_create".to_string(),
                description: "Create a productivity goal for the current day, week or month".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "user": user_arg,
                        "goal_type": {"type": "string", "description": "daily_tasks, weekly_tasks, monthly_tasks, daily_focus_minutes, weekly_focus_minutes, monthly_focus_minutes, daily_habits, weekly_habits, monthly_habits or habit_streak"},
                        "target_value": {"type": "number", "description": "Target to reach (must be greater than 0)"},
                        "period_type": {"type": "string", "description": "daily, weekly or monthly (optional - defaults to the period the goal type implies; required for habit_streak)"}
                    },
                    "required": ["goal_type", "target_value"]
                }),
            },
            ToolDefinition {
                name: "goal_progress".to_string(),
                description: "Set or increment a goal's progress; the goal locks once achieved".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "user": user_arg,
                        "goal_id": {"type": "string", "description": "ID of the goal to update"},
                        "value": {"type": "number", "description": "Absolute progress value (optional)"},
                        "increment": {"type": "number", "description": "Amount to add to the current progress (optional)"}
                    },
                    "required": ["goal_id"]
                }),
            },
            ToolDefinition {
                name: "insights_generate".to_string(),
                description: "Run the insight rules over the last two weeks of data; duplicates of still-actionable insights are skipped".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "user": user_arg
                    },
                    "required": []
                }),
            },
            ToolDefinition {
                name: "insight_dismiss".to_string(),
                description: "Dismiss an insight so it no longer surfaces".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "user": user_arg,
                        "insight_id": {"type": "string", "description": "ID of the insight to dismiss"}
                    },
                    "required": ["insight_id"]
                }),
            },
            ToolDefinition {
                name: "insight_act".to_string(),
                description: "Mark an insight as acted on".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "user": user_arg,
                        "insight_id": {"type": "string", "description": "ID of the insight to mark"}
                    },
                    "required": ["insight_id"]
                }),
            },
            ToolDefinition {
                name: "session_start".to_string(),
                description: "Start a tracked work session (only one can be active at a time)".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "user": user_arg,
                        "title": {"type": "string", "description": "What you're working on"},
                        "session_type": {"type": "string", "description": "task, habit, focus, meeting or other (optional, defaults to focus)"},
                        "reference_id": {"type": "string", "description": "ID of the related task or habit (optional)"},
                        "category": {"type": "string", "description": "Category label (optional)"}
                    },
                    "required": ["title"]
                }),
            },
            ToolDefinition {
                name: "session_end".to_string(),
                description: "End the active session, freezing its duration".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "user": user_arg,
                        "notes": {"type": "string", "description": "Notes about the session (optional)"},
                        "interrupted": {"type": "boolean", "description": "End as interrupted instead of completed (optional)"}
                    },
                    "required": []
                }),
            },
        ];

        JsonRpcResponse::success(request.id, json!({"tools": tools}))
    }

    fn handle_tools_call(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        let tool_params: ToolCallParams = match request.params {
            Some(params) => match serde_json::from_value(params) {
                Ok(p) => p,
                Err(e) => {
                    return JsonRpcResponse::error(
                        request.id,
                        error_codes::INVALID_PARAMS,
                        format!("Invalid parameters: {}", e),
                        None,
                    );
                }
            },
            None => {
                return JsonRpcResponse::error(
                    request.id,
                    error_codes::INVALID_PARAMS,
                    "Missing parameters".to_string(),
                    None,
                );
            }
        };

        let result = self.dispatch_tool(&tool_params.name, tool_params.arguments);

        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(e) => JsonRpcResponse::error(
                request.id,
                error_codes::INTERNAL_ERROR,
                format!("Failed to serialize tool result: {}", e),
                None,
            ),
        }
    }

    fn dispatch_tool(&self, name: &str, args: HashMap<String, Value>) -> ToolCallResult {
        let storage = self.server.storage();
        match name {
            "snapshot_compute" => self.run_tool(args, |p| {
                tools::compute_snapshot(storage, p).map(|r| r.message)
            }),
            "dashboard_get" => self.run_tool(args, |p| {
                tools::get_dashboard(storage, p).map(|r| r.message)
            }),
            "trends_get" => {
                self.run_tool(args, |p| tools::get_trends(storage, p).map(|r| r.message))
            }
            "summary_week" => {
                self.run_tool(args, |p| tools::summary_week(storage, p).map(|r| r.message))
            }
            "goal_create" => {
                self.run_tool(args, |p| tools::create_goal(storage, p).map(|r| r.message))
            }
            "goal_progress" => {
                self.run_tool(args, |p| tools::goal_progress(storage, p).map(|r| r.message))
            }
            "insights_generate" => self.run_tool(args, |p| {
                tools::generate_insights(storage, p).map(|r| r.message)
            }),
            "insight_dismiss" => self.run_tool(args, |p| {
                tools::dismiss_insight(storage, p).map(|r| r.message)
            }),
            "insight_act" => self.run_tool(args, |p| {
                tools::act_on_insight(storage, p).map(|r| r.message)
            }),
            "session_start" => self.run_tool(args, |p| {
                tools::start_session(storage, p).map(|r| r.message)
            }),
            "session_end" => {
                self.run_tool(args, |p| tools::end_session(storage, p).map(|r| r.message))
            }
            _ => ToolCallResult::error(format!("Unknown tool: {}", name)),
        }
    }

    /// Deserialize tool arguments and run the handler, mapping both
    /// argument errors and engine errors to an error result
    fn run_tool<P, F>(&self, args: HashMap<String, Value>, handler: F) -> ToolCallResult
    where
        P: DeserializeOwned,
        F: FnOnce(P) -> Result<String, crate::analytics::EngineError>,
    {
        let params: P = match self.parse_args(args) {
            Ok(p) => p,
            Err(e) => return ToolCallResult::error(e),
        };
        match handler(params) {
            Ok(message) => ToolCallResult::success(message),
            Err(e) => ToolCallResult::error(e.to_string()),
        }
    }

    /// Build the typed parameter struct from raw arguments, filling in the
    /// server's default user when the caller omitted one
    fn parse_args<P: DeserializeOwned>(
        &self,
        mut args: HashMap<String, Value>,
    ) -> Result<P, String> {
        if !args.contains_key("user") {
            if let Some(user) = self.server.default_user() {
                args.insert("user".to_string(), json!(user));
            }
        }

        let object: serde_json::Map<String, Value> = args.into_iter().collect();
        serde_json::from_value(Value::Object(object)).map_err(|e| format!("Invalid arguments: {}", e))
    }
}
