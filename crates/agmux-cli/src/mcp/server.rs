use agmux_runtime::AgentManager;
use schemars::schema_for;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;

use super::dto::{AgentStatusArgs, ListTasksArgs, SpawnAgentArgs, StopAgentsArgs};
use super::tools::{
    handle_agent_status, handle_list_tasks, handle_spawn_agent, handle_stop_agents,
};

const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i32 = -32700;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

#[derive(Debug, Deserialize)]
struct RpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Option<Value>,
}

#[derive(Debug, Serialize)]
struct RpcReply {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcFailure>,
}

impl RpcReply {
    fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn fail(id: Value, failure: RpcFailure) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(failure),
        }
    }
}

#[derive(Debug, Serialize)]
struct RpcFailure {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl RpcFailure {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Decode tool arguments, mapping serde failures to MCP invalid-params
fn decode<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, RpcFailure> {
    serde_json::from_value(arguments).map_err(|err| invalid_arguments(tool, &err))
}

/// Argument-validation failures carry structured data naming the tool and,
/// when serde can identify one, the absent field
fn invalid_arguments(tool: &str, err: &serde_json::Error) -> RpcFailure {
    let detail = err.to_string();

    // serde phrases absent required fields as: missing field `task_name`
    let missing = detail
        .starts_with("missing field")
        .then(|| detail.split('`').nth(1))
        .flatten();

    match missing {
        Some(field) => RpcFailure::new(
            INVALID_PARAMS,
            format!("Invalid params: missing required field \"{}\"", field),
        )
        .with_data(json!({ "missing": [field], "tool": tool })),
        None => RpcFailure::new(INVALID_PARAMS, format!("Invalid params: {}", detail))
            .with_data(json!({ "tool": tool, "detail": detail })),
    }
}

pub struct McpServer {
    manager: Arc<AgentManager>,
}

impl McpServer {
    pub fn new(manager: Arc<AgentManager>) -> Self {
        Self { manager }
    }

    async fn handle(&self, request: RpcRequest) -> RpcReply {
        let id = request.id.unwrap_or(Value::Null);

        let outcome = match request.method.as_str() {
            "initialize" => Ok(self.initialize_result()),
            "tools/list" => Ok(self.tool_listing()),
            "tools/call" => self.call_tool(request.params).await,
            other => Err(RpcFailure::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            )),
        };

        match outcome {
            Ok(result) => RpcReply::ok(id, result),
            Err(failure) => RpcReply::fail(id, failure),
        }
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": "agmux",
                "version": env!("CARGO_PKG_VERSION")
            },
            "instructions": "agmux supervises AI coding-agent CLIs as child processes. \
                Spawn agents under task labels, poll their summarized activity with \
                agent_status (pass the returned cursor back for deltas), and stop \
                tasks when done."
        })
    }

    fn tool_listing(&self) -> Value {
        fn tool(name: &str, description: &str, schema: impl Serialize) -> Value {
            json!({
                "name": name,
                "description": description,
                "inputSchema": serde_json::to_value(&schema).unwrap_or_default(),
            })
        }

        json!({
            "tools": [
                tool(
                    "spawn_agent",
                    "Spawn a coding agent (claude/codex/gemini/cursor/opencode) under a task label",
                    schema_for!(SpawnAgentArgs),
                ),
                tool(
                    "agent_status",
                    "Summarized activity for a task's agents; pass the returned cursor as `since` to poll deltas",
                    schema_for!(AgentStatusArgs),
                ),
                tool(
                    "stop_agents",
                    "Stop a task's running agents (or one agent by id); graceful signal then kill",
                    schema_for!(StopAgentsArgs),
                ),
                tool(
                    "list_tasks",
                    "Known tasks with per-status agent counts, most recently active first",
                    schema_for!(ListTasksArgs),
                ),
            ]
        })
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value, RpcFailure> {
        let params = params.ok_or_else(|| RpcFailure::new(INVALID_PARAMS, "Missing params"))?;
        let tool = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcFailure::new(INVALID_PARAMS, "Missing tool name"))?
            .to_string();
        let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

        let outcome = match tool.as_str() {
            "spawn_agent" => handle_spawn_agent(&self.manager, decode(&tool, arguments)?).await,
            "agent_status" => handle_agent_status(&self.manager, decode(&tool, arguments)?).await,
            "stop_agents" => handle_stop_agents(&self.manager, decode(&tool, arguments)?).await,
            "list_tasks" => handle_list_tasks(&self.manager, decode(&tool, arguments)?).await,
            other => json!({ "error": format!("Unknown tool: {}", other) }),
        };

        let text =
            serde_json::to_string_pretty(&outcome).unwrap_or_else(|_| outcome.to_string());
        Ok(json!({ "content": [{ "type": "text", "text": text }] }))
    }
}

/// Serve tool calls over stdio until the client closes stdin
///
/// One request per line in, one reply per line out; stdout carries nothing
/// else. A line that is not JSON-RPC at all gets a parse-error reply with a
/// null id, since no id can be recovered from it.
pub async fn run_server(manager: Arc<AgentManager>) -> anyhow::Result<()> {
    let server = McpServer::new(manager);
    let mut out = std::io::stdout();

    for line in BufReader::new(std::io::stdin()).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let reply = match serde_json::from_str::<RpcRequest>(line.trim()) {
            Ok(request) => server.handle(request).await,
            Err(err) => RpcReply::fail(
                Value::Null,
                RpcFailure::new(PARSE_ERROR, format!("Parse error: {}", err)),
            ),
        };

        writeln!(out, "{}", serde_json::to_string(&reply)?)?;
        out.flush()?;
    }

    Ok(())
}
