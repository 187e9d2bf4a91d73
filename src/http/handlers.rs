//! Axum HTTP handlers for the web server
//!
//! Provides the Model Context Protocol endpoint, the REST time endpoint and the
//! health/discovery endpoints. Protocol level failures are always answered with HTTP 200 and a
//! JSON-RPC error body.

use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::capabilities::format_iso;
use crate::errors::ApiError;
use crate::mcp::rpc::{json_rpc_error, Request, Response, INVALID_REQUEST, PARSE_ERROR};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct DiscoveryResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub mcp_endpoint: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct TimeQuery {
    pub format: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFormat {
    Timestamp,
    Formatted,
    Both,
}

impl TimeFormat {
    pub const ALLOWED: &'static str = "timestamp, formatted, both";

    /// An absent `format` means `timestamp`; anything else must match exactly.
    pub fn from_query(value: Option<&str>) -> Result<Self, ApiError> {
        match value {
            None | Some("timestamp") => Ok(Self::Timestamp),
            Some("formatted") => Ok(Self::Formatted),
            Some("both") => Ok(Self::Both),
            Some(other) => Err(ApiError::invalid_value("format", other, Self::ALLOWED)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TimeData {
    /// Unix epoch seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// `YYYY-MM-DD HH:MM:SS` in UTC.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiSuccess<T> {
    pub success: bool,
    pub data: T,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: format_iso(Utc::now()),
    })
}

pub async fn discovery() -> Json<DiscoveryResponse> {
    Json(DiscoveryResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        mcp_endpoint: "/mcp",
    })
}

pub async fn time(
    State(state): State<AppState>,
    Query(query): Query<TimeQuery>,
) -> Result<Json<ApiSuccess<TimeData>>, ApiError> {
    let format = TimeFormat::from_query(query.format.as_deref())?;
    let snapshot = state.clock.now();

    let data = TimeData {
        timestamp: (format != TimeFormat::Formatted).then(|| snapshot.unix_seconds()),
        formatted: if format == TimeFormat::Timestamp {
            None
        } else {
            snapshot.formatted_utc()
        },
    };
    info!(format = ?format, timestamp = snapshot.unix_seconds(), "time request processed");

    Ok(Json(ApiSuccess {
        success: true,
        data,
    }))
}

pub async fn mcp_endpoint(State(state): State<AppState>, body: Bytes) -> Json<Response> {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(err) => {
            debug!(error = %err, "rejecting unparseable mcp body");
            return Json(json_rpc_error(Value::Null, PARSE_ERROR, "Parse error"));
        }
    };

    if !payload.is_object() {
        return Json(json_rpc_error(Value::Null, INVALID_REQUEST, "Invalid Request"));
    }

    let request_id = payload.get("id").cloned().unwrap_or(Value::Null);
    let request: Request = match serde_json::from_value(payload) {
        Ok(request) => request,
        Err(err) => {
            debug!(error = %err, "rejecting malformed mcp request");
            return Json(json_rpc_error(request_id, INVALID_REQUEST, "Invalid Request"));
        }
    };

    Json(state.dispatcher.handle(request).await)
}
