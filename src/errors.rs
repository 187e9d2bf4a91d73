use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::capabilities::GenerationError;

pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INTERNAL_ERROR: i64 = -32603;

#[derive(Debug, Error)]
pub enum McpError {
    #[error("Method not found: {0}")]
    MethodNotFound(String),
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),
    #[error("Tool not found: {0}")]
    ToolNotFound(String),
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid params: {0}")]
    InvalidParams(String),
    #[error("text generation failed: {0}")]
    Generation(#[from] GenerationError),
    #[error("capability call timed out after {0}ms")]
    Timeout(u128),
    #[error("{0}")]
    Internal(String),
}

impl McpError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams(message.into())
    }

    pub fn code(&self) -> i64 {
        match self {
            Self::MethodNotFound(_) | Self::ResourceNotFound(_) | Self::ToolNotFound(_) => {
                METHOD_NOT_FOUND
            }
            Self::MissingParameter(_)
            | Self::InvalidParams(_)
            | Self::Generation(_)
            | Self::Timeout(_)
            | Self::Internal(_) => INTERNAL_ERROR,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.code() == METHOD_NOT_FOUND
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("resource already registered: {0}")]
    DuplicateResource(String),
    #[error("tool already registered: {0}")]
    DuplicateTool(String),
}

/// Failures of the plain REST endpoints, answered as `{"success": false, "error": {..}}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid value for {field}: {value}. Allowed values: {allowed}")]
    InvalidValue {
        field: &'static str,
        value: String,
        allowed: &'static str,
    },
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error: ApiErrorBody,
}

impl ApiError {
    pub fn invalid_value(field: &'static str, value: impl Into<String>, allowed: &'static str) -> Self {
        Self::InvalidValue {
            field,
            value: value.into(),
            allowed,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, code) = match self {
            Self::InvalidValue { .. } => (StatusCode::BAD_REQUEST, "INVALID_VALUE"),
        };

        (
            status,
            Json(ApiErrorResponse {
                success: false,
                error: ApiErrorBody { code, message },
            }),
        )
            .into_response()
    }
}
