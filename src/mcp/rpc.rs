//! JSON-RPC envelope types and response construction
//!
//! `Response` carries its outcome as a sum type so a serialized envelope always holds exactly one
//! of `result` or `error`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::McpError;

pub const JSONRPC_VERSION: &str = "2.0";
pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;

/// Incoming call. `jsonrpc` is accepted in any form and never checked; a missing `id` reads as
/// `null`. Unknown top-level fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub jsonrpc: Option<Value>,
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

impl Request {
    pub fn new(id: Value, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: Some(Value::String(JSONRPC_VERSION.to_string())),
            id,
            method: method.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Result(Value),
    Error(RpcError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl Response {
    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Error(_))
    }
}

pub fn json_rpc_result(id: Value, result: Value) -> Response {
    Response {
        jsonrpc: JSONRPC_VERSION,
        id,
        outcome: Outcome::Result(result),
    }
}

pub fn json_rpc_error(id: Value, code: i64, message: impl Into<String>) -> Response {
    Response {
        jsonrpc: JSONRPC_VERSION,
        id,
        outcome: Outcome::Error(RpcError {
            code,
            message: message.into(),
        }),
    }
}

pub fn mcp_error_to_json_rpc(id: Value, err: &McpError) -> Response {
    json_rpc_error(id, err.code(), err.to_string())
}
