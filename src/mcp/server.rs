//! The central Model Context Protocol engine
//!
//! `Dispatcher::handle` routes a parsed request by method name to the resource or tool catalog
//! and always answers with a well-formed envelope: every fault is converted into a JSON-RPC error
//! carrying the request's own id.

use std::{future::Future, sync::Arc, time::Duration};

use rust_mcp_sdk::schema::{ListResourcesResult, ListToolsResult};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::capabilities::TimeProvider;
use crate::domain::{resources::ResourceRegistry, tools::ToolRegistry, ContentItem};
use crate::errors::McpError;
use crate::mcp::rpc::{json_rpc_result, mcp_error_to_json_rpc, Request, Response};

pub const DEFAULT_CAPABILITY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Ping,
    ListResources,
    ReadResource,
    ListTools,
    CallTool,
}

impl Method {
    pub const ALL: [Method; 5] = [
        Method::Ping,
        Method::ListResources,
        Method::ReadResource,
        Method::ListTools,
        Method::CallTool,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::ListResources => "list_resources",
            Self::ReadResource => "read_resource",
            Self::ListTools => "list_tools",
            Self::CallTool => "call_tool",
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.as_str() == name)
    }
}

#[derive(Debug, Deserialize)]
struct ReadResourceParams {
    uri: String,
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize)]
struct PingResult {
    pong: String,
}

#[derive(Debug, Serialize)]
struct ReadResourceOutput {
    contents: Vec<ContentItem>,
}

#[derive(Debug, Serialize)]
struct CallToolOutput {
    content: Vec<ContentItem>,
}

pub struct Dispatcher {
    clock: Arc<dyn TimeProvider>,
    resources: ResourceRegistry,
    tools: ToolRegistry,
    capability_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        clock: Arc<dyn TimeProvider>,
        resources: ResourceRegistry,
        tools: ToolRegistry,
        capability_timeout: Duration,
    ) -> Self {
        Self {
            clock,
            resources,
            tools,
            capability_timeout,
        }
    }

    pub async fn handle(&self, request: Request) -> Response {
        let Request {
            id, method, params, ..
        } = request;
        let audit_params = redact_audit_params(params.as_ref());

        let outcome = match Method::from_name(&method) {
            Some(known) => self.dispatch(known, params).await,
            None => Err(McpError::MethodNotFound(method.clone())),
        };

        let response = match outcome {
            Ok(result) => json_rpc_result(id, result),
            Err(err) => {
                if err.is_not_found() {
                    warn!(method = %method, error = %err, "mcp lookup failed");
                } else {
                    error!(method = %method, error = %err, "mcp handler failed");
                }
                mcp_error_to_json_rpc(id, &err)
            }
        };

        info!(
            method = %method,
            params = %audit_params,
            outcome = if response.is_error() { "failure" } else { "success" },
            "mcp action audited"
        );

        response
    }

    async fn dispatch(&self, method: Method, params: Option<Value>) -> Result<Value, McpError> {
        match method {
            Method::Ping => to_result(PingResult {
                pong: self.clock.now().iso_time,
            }),
            Method::ListResources => to_result(ListResourcesResult {
                meta: None,
                next_cursor: None,
                resources: self.resources.list(),
            }),
            Method::ReadResource => {
                let ReadResourceParams { uri } = parse_params(params)?;
                let contents = self.with_timeout(self.resources.read(&uri)).await?;
                to_result(ReadResourceOutput { contents })
            }
            Method::ListTools => to_result(ListToolsResult {
                meta: None,
                next_cursor: None,
                tools: self.tools.list(),
            }),
            Method::CallTool => {
                let CallToolParams { name, arguments } = parse_params(params)?;
                let content = self
                    .with_timeout(self.tools.call(&name, arguments.unwrap_or_default()))
                    .await?;
                to_result(CallToolOutput { content })
            }
        }
    }

    async fn with_timeout<T>(
        &self,
        call: impl Future<Output = Result<T, McpError>>,
    ) -> Result<T, McpError> {
        tokio::time::timeout(self.capability_timeout, call)
            .await
            .map_err(|_| McpError::Timeout(self.capability_timeout.as_millis()))?
    }
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, McpError> {
    let params = params.ok_or_else(|| McpError::invalid_params("params are required"))?;
    serde_json::from_value(params).map_err(|err| McpError::invalid_params(err.to_string()))
}

fn to_result(result: impl Serialize) -> Result<Value, McpError> {
    serde_json::to_value(result)
        .map_err(|err| McpError::internal(format!("result serialization failed: {err}")))
}

pub fn redact_audit_params(params: Option<&Value>) -> Value {
    params.map(redact_audit_value).unwrap_or(Value::Null)
}

pub fn redact_audit_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| {
                    if is_sensitive_key(key) {
                        (key.clone(), Value::String("[REDACTED]".to_string()))
                    } else if key == "prompt" {
                        (key.clone(), summarize_prompt(item))
                    } else {
                        (key.clone(), redact_audit_value(item))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_audit_value).collect()),
        _ => value.clone(),
    }
}

fn summarize_prompt(prompt: &Value) -> Value {
    match prompt.as_str() {
        Some(text) => Value::String(format!("[{} chars]", text.chars().count())),
        None => redact_audit_value(prompt),
    }
}

pub fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.trim().to_ascii_lowercase();
    matches!(
        normalized.as_str(),
        "authorization" | "bearer" | "api_key" | "apikey"
    ) || normalized.contains("token")
        || normalized.contains("secret")
        || normalized.contains("password")
        || normalized.contains("credential")
}
