use std::{env, net::SocketAddr, time::Duration};

use chrono_tz::Tz;
use thiserror::Error;

use crate::capabilities::llm::{DEFAULT_DASHSCOPE_BASE_URL, DEFAULT_MODEL};
use crate::capabilities::time::{host_timezone, parse_timezone};
use crate::domain::tools::PromptPolicy;

pub const DEFAULT_MODELS: [&str; 2] = ["qwen-max", "qwen-plus"];

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub bind_port: u16,
    pub timezone: Tz,
    pub dashscope_api_key: Option<String>,
    pub dashscope_base_url: String,
    pub models: Vec<String>,
    pub default_model: String,
    pub capability_timeout: Duration,
    pub prompt_policy: PromptPolicy,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("MCP_PORT must be a valid u16")]
    InvalidPort,
    #[error("invalid bind address or port")]
    InvalidSocket,
    #[error("unknown IANA time zone: {0}")]
    InvalidTimezone(String),
    #[error("CAPABILITY_TIMEOUT_MS must be a positive integer")]
    InvalidTimeout,
    #[error("GENERATE_TEXT_PROMPT_POLICY must be one of: placeholder, require")]
    InvalidPromptPolicy,
    #[error("LLM_MODELS must list at least one model")]
    EmptyModels,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = non_empty_var("MCP_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let bind_port = non_empty_var("MCP_PORT")
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(3001);
        let timezone = resolve_timezone(non_empty_var("MCP_TIMEZONE"), non_empty_var("TZ"))?;
        let models = match non_empty_var("LLM_MODELS") {
            Some(value) => parse_models(&value)?,
            None => DEFAULT_MODELS.iter().map(|model| model.to_string()).collect(),
        };
        let capability_timeout = non_empty_var("CAPABILITY_TIMEOUT_MS")
            .map(|value| {
                value
                    .parse::<u64>()
                    .ok()
                    .filter(|millis| *millis > 0)
                    .map(Duration::from_millis)
                    .ok_or(ConfigError::InvalidTimeout)
            })
            .transpose()?
            .unwrap_or(Duration::from_secs(30));
        let prompt_policy = non_empty_var("GENERATE_TEXT_PROMPT_POLICY")
            .map(|value| {
                value
                    .parse::<PromptPolicy>()
                    .map_err(|_| ConfigError::InvalidPromptPolicy)
            })
            .transpose()?
            .unwrap_or_default();

        let config = Self {
            bind_addr,
            bind_port,
            timezone,
            dashscope_api_key: non_empty_var("DASHSCOPE_API_KEY"),
            dashscope_base_url: non_empty_var("DASHSCOPE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_DASHSCOPE_BASE_URL.to_string()),
            models,
            default_model: non_empty_var("LLM_DEFAULT_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            capability_timeout,
            prompt_policy,
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `MCP_TIMEZONE` wins over `TZ`; both must name an IANA zone. A `TZ` that points at a zoneinfo
/// file (`:/etc/localtime`) defers to the host zone, as does an unset pair.
fn resolve_timezone(configured: Option<String>, tz: Option<String>) -> Result<Tz, ConfigError> {
    if let Some(name) = configured {
        return parse_timezone(&name).ok_or(ConfigError::InvalidTimezone(name));
    }

    match tz {
        Some(value) => {
            let name = value.strip_prefix(':').unwrap_or(&value);
            if name.starts_with('/') {
                return Ok(host_timezone());
            }
            parse_timezone(name).ok_or(ConfigError::InvalidTimezone(value))
        }
        None => Ok(host_timezone()),
    }
}

fn parse_models(value: &str) -> Result<Vec<String>, ConfigError> {
    let models: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|model| !model.is_empty())
        .map(str::to_string)
        .collect();

    if models.is_empty() {
        return Err(ConfigError::EmptyModels);
    }
    Ok(models)
}
