use anyhow::Result;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Write};
use std::sync::Arc;
use tracing::{info, warn};

use crate::use_cases::{CheckUseCase, DrawUseCase, FetchUseCase};

const JSONRPC_VERSION: &str = "2.0";
const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const INTERNAL_ERROR: i32 = -32603;

#[derive(Debug, serde::Deserialize)]
struct JsonRpcRequest {
    #[serde(default = "default_jsonrpc")]
    jsonrpc: String,
    method: String,
    params: Option<Value>,
    id: Option<Value>,
}

fn default_jsonrpc() -> String {
    JSONRPC_VERSION.to_string()
}

#[derive(Debug, serde::Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
    id: Option<Value>,
}

#[derive(Debug, serde::Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl JsonRpcResponse {
    fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            result: Some(result),
            error: None,
            id: Some(id.unwrap_or(json!(1))),
        }
    }

    fn failure(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
            id,
        }
    }

    fn with_data(mut self, data: Value) -> Self {
        if let Some(error) = self.error.as_mut() {
            error.data = Some(data);
        }
        self
    }
}

#[derive(Debug, serde::Serialize)]
struct Tool {
    name: &'static str,
    description: &'static str,
    #[serde(rename = "inputSchema")]
    input_schema: Value,
}

pub struct MCPHandler {
    draw_use_case: Arc<DrawUseCase>,
    check_use_case: Arc<CheckUseCase>,
    fetch_use_case: Arc<FetchUseCase>,
}

impl MCPHandler {
    pub fn new(
        draw_use_case: Arc<DrawUseCase>,
        check_use_case: Arc<CheckUseCase>,
        fetch_use_case: Arc<FetchUseCase>,
    ) -> Self {
        Self {
            draw_use_case,
            check_use_case,
            fetch_use_case,
        }
    }

    /// Answers one JSON-RPC message per input line until the reader is exhausted.
    pub async fn serve<R, W>(self, reader: R, mut writer: W) -> Result<()>
    where
        R: BufRead,
        W: Write,
    {
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<JsonRpcRequest>(&line) {
                Ok(request) => {
                    // Notifications never get a response.
                    if request.id.is_none() || request.method.starts_with("notifications/") {
                        if request.method == "notifications/initialized" {
                            info!("🎱 Client initialized");
                        }
                        continue;
                    }
                    self.handle_request(request).await
                }
                Err(e) => {
                    warn!(error = %e, %line, "unparseable request");
                    JsonRpcResponse::failure(None, PARSE_ERROR, "Parse error")
                        .with_data(json!(e.to_string()))
                }
            };

            writeln!(writer, "{}", serde_json::to_string(&response)?)?;
            writer.flush()?;
        }

        Ok(())
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id;
        if request.jsonrpc != JSONRPC_VERSION {
            return JsonRpcResponse::failure(
                id,
                INVALID_REQUEST,
                format!("Unsupported jsonrpc version: {}", request.jsonrpc),
            );
        }

        match request.method.as_str() {
            "initialize" => {
                info!("🎱 Initializing lotto MCP server");
                JsonRpcResponse::success(
                    id,
                    json!({
                        "protocolVersion": PROTOCOL_VERSION,
                        "capabilities": { "tools": {} },
                        "serverInfo": {
                            "name": "lotto-mcp-server",
                            "version": env!("CARGO_PKG_VERSION")
                        }
                    }),
                )
            }
            "tools/list" => JsonRpcResponse::success(id, json!({ "tools": self.get_tools() })),
            "tools/call" => self.handle_call_tool(request.params, id).await,
            other => JsonRpcResponse::failure(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            ),
        }
    }

    async fn handle_call_tool(&self, params: Option<Value>, id: Option<Value>) -> JsonRpcResponse {
        let Some(params) = params else {
            return JsonRpcResponse::failure(id, INVALID_PARAMS, "Missing params");
        };
        let Some(tool_name) = params.get("name").and_then(Value::as_str) else {
            return JsonRpcResponse::failure(id, INVALID_PARAMS, "Missing tool name");
        };

        let arguments: HashMap<String, Value> = match params.get("arguments") {
            None | Some(Value::Null) => HashMap::new(),
            Some(value) => match serde_json::from_value(value.clone()) {
                Ok(map) => map,
                Err(_) => {
                    return JsonRpcResponse::failure(
                        id,
                        INVALID_PARAMS,
                        "Tool arguments must be an object",
                    );
                }
            },
        };

        match self.execute_tool(tool_name, &arguments).await {
            Ok(text) => JsonRpcResponse::success(
                id,
                json!({ "content": [{ "type": "text", "text": text }] }),
            ),
            Err(e) => {
                warn!(tool = tool_name, error = %e, "tool failed");
                JsonRpcResponse::failure(
                    id,
                    INTERNAL_ERROR,
                    format!("Tool execution error: {:#}", e),
                )
            }
        }
    }

    async fn execute_tool(
        &self,
        tool_name: &str,
        arguments: &HashMap<String, Value>,
    ) -> Result<String> {
        match tool_name {
            "check_numbers" => self.check_use_case.check_numbers(arguments).await,
            "check_wish_file" => self.check_use_case.check_wish_file(arguments).await,
            "get_latest_draws" => self.draw_use_case.get_latest_draws(arguments).await,
            "get_draw" => self.draw_use_case.get_draw(arguments).await,
            "get_draws_by_date_range" => self.draw_use_case.get_draws_by_date_range(arguments).await,
            "number_frequency" => self.draw_use_case.number_frequency(arguments).await,
            "fetch_draws" => self.fetch_use_case.fetch_draws(arguments).await,
            "update_draws" => self.fetch_use_case.update_draws(arguments).await,
            _ => Err(anyhow::anyhow!("Unknown tool: {}", tool_name)),
        }
    }

    fn get_tools(&self) -> Vec<Tool> {
        vec![
            Tool {
                name: "check_numbers",
                description: "Check six numbers against every stored draw and summarize prize tiers",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "numbers": {
                            "description": "Six distinct numbers 1-45, as an array or a comma separated string",
                            "oneOf": [
                                {
                                    "type": "array",
                                    "items": {"type": "integer", "minimum": 1, "maximum": 45},
                                    "minItems": 6,
                                    "maxItems": 6
                                },
                                {"type": "string"}
                            ]
                        }
                    },
                    "required": ["numbers"]
                }),
            },
            Tool {
                name: "check_wish_file",
                description: "Check every row of a wish file (.xlsx or .csv) and write Result/Details columns",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "path": {
                            "type": "string",
                            "description": "Path to an .xlsx or .csv file with Num1..Num6 columns"
                        }
                    },
                    "required": ["path"]
                }),
            },
            Tool {
                name: "get_latest_draws",
                description: "Get the most recent draws, newest first",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "limit": {
                            "type": "integer",
                            "description": "Number of draws to return (default: 10)"
                        }
                    }
                }),
            },
            Tool {
                name: "get_draw",
                description: "Get a single draw by its draw number",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "draw_no": {
                            "type": "integer",
                            "description": "Draw number"
                        }
                    },
                    "required": ["draw_no"]
                }),
            },
            Tool {
                name: "get_draws_by_date_range",
                description: "Get draws held within a date range",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "start_date": {
                            "type": "string",
                            "description": "Start date in YYYY-MM-DD format"
                        },
                        "end_date": {
                            "type": "string",
                            "description": "End date in YYYY-MM-DD format"
                        }
                    },
                    "required": ["start_date", "end_date"]
                }),
            },
            Tool {
                name: "number_frequency",
                description: "Count how often each main number was drawn",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "last": {
                            "type": "integer",
                            "description": "Only count the most recent N draws (default: all)"
                        }
                    }
                }),
            },
            Tool {
                name: "fetch_draws",
                description: "Fetch a range of draws from the lottery operator and save new ones",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "from": {
                            "type": "integer",
                            "description": "First draw number"
                        },
                        "to": {
                            "type": "integer",
                            "description": "Last draw number (inclusive)"
                        }
                    },
                    "required": ["from", "to"]
                }),
            },
            Tool {
                name: "update_draws",
                description: "Fetch every draw published since the latest stored one",
                input_schema: json!({
                    "type": "object",
                    "properties": {}
                }),
            },
        ]
    }
}

pub fn stdio() -> (BufReader<io::Stdin>, io::Stdout) {
    (BufReader::new(io::stdin()), io::stdout())
}
