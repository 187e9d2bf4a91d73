use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub mod capabilities;
pub mod config;
pub mod domain;
pub mod errors;
pub mod http;
pub mod logging;
pub mod mcp;

use capabilities::{TextGenerator, TimeProvider};
use config::Config;
use domain::{resources::ResourceRegistry, tools::ToolRegistry};
use errors::RegistryError;
use mcp::server::Dispatcher;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub clock: Arc<dyn TimeProvider>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, clock: Arc<dyn TimeProvider>) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            clock,
        }
    }

    /// Seeds both catalogs from `config` around the given capabilities.
    pub fn from_config(
        config: &Config,
        clock: Arc<dyn TimeProvider>,
        generator: Arc<dyn TextGenerator>,
    ) -> Result<Self, RegistryError> {
        let resources = ResourceRegistry::seeded(clock.clone(), config.models.clone())?;
        let tools = ToolRegistry::seeded(
            clock.clone(),
            generator,
            Some(config.default_model.clone()),
            config.prompt_policy,
        )?;

        let dispatcher = Dispatcher::new(clock.clone(), resources, tools, config.capability_timeout);
        Ok(Self::new(dispatcher, clock))
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(http::handlers::health))
        .route("/.well-known/mcp", get(http::handlers::discovery))
        .route("/api/time", get(http::handlers::time))
        .route("/mcp", post(http::handlers::mcp_endpoint))
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::capabilities::{
        testing::{CapturedLogs, FixedClock},
        PlaceholderGenerator,
    };
    use crate::domain::tools::PromptPolicy;

    use super::*;

    fn test_config(prompt_policy: PromptPolicy) -> Config {
        Config {
            bind_addr: "127.0.0.1".to_string(),
            bind_port: 3001,
            timezone: chrono_tz::Asia::Shanghai,
            dashscope_api_key: None,
            dashscope_base_url: capabilities::llm::DEFAULT_DASHSCOPE_BASE_URL.to_string(),
            models: vec!["qwen-max".to_string(), "qwen-plus".to_string()],
            default_model: "qwen-max".to_string(),
            capability_timeout: Duration::from_secs(5),
            prompt_policy,
        }
    }

    fn app_with(prompt_policy: PromptPolicy) -> Router {
        let state = AppState::from_config(
            &test_config(prompt_policy),
            Arc::new(FixedClock),
            Arc::new(PlaceholderGenerator),
        )
        .expect("app state");
        build_app(state)
    }

    fn app() -> Router {
        app_with(PromptPolicy::Placeholder)
    }

    async fn post_mcp(app: Router, body: &'static str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/mcp")
                    .method("POST")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .expect("request build"),
            )
            .await
            .expect("request execution");

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        (status, body.to_vec())
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .method("GET")
                    .body(Body::empty())
                    .expect("request build"),
            )
            .await
            .expect("request execution");

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        (status, serde_json::from_slice(&body).expect("valid json response"))
    }

    async fn post_mcp_json(app: Router, body: &'static str) -> Value {
        let (status, body) = post_mcp(app, body).await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_slice(&body).expect("valid json response")
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .method("GET")
                    .body(Body::empty())
                    .expect("request build"),
            )
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::OK);
        let body = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        let body_json: Value = serde_json::from_slice(&body).expect("valid json response");
        assert_eq!(body_json["status"], "ok");
        assert!(body_json["timestamp"].as_str().expect("timestamp").ends_with('Z'));
    }

    #[tokio::test]
    async fn discovery_points_at_mcp_endpoint() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/.well-known/mcp")
                    .method("GET")
                    .body(Body::empty())
                    .expect("request build"),
            )
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::OK);
        let body = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        let body_json: Value = serde_json::from_slice(&body).expect("valid json response");
        assert_eq!(body_json["mcp_endpoint"], "/mcp");
        assert_eq!(body_json["name"], env!("CARGO_PKG_NAME"));
    }

    #[tokio::test]
    async fn root_get_is_not_found() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .method("GET")
                    .body(Body::empty())
                    .expect("request build"),
            )
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn mcp_unknown_method_returns_method_not_found() {
        let (status, body) =
            post_mcp(app(), r#"{"jsonrpc":"2.0","id":1,"method":"unknown"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            br#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"Method not found: unknown"}}"#
        );
    }

    #[tokio::test]
    async fn mcp_invalid_json_is_parse_error() {
        let body_json = post_mcp_json(app(), r#"{"jsonrpc":"2.0","id":1,"method""#).await;

        assert_eq!(body_json["error"]["code"], -32700);
        assert_eq!(body_json["id"], Value::Null);
    }

    #[tokio::test]
    async fn mcp_batch_is_rejected() {
        let body_json = post_mcp_json(app(), r#"[{"jsonrpc":"2.0","id":1,"method":"ping"}]"#).await;

        assert_eq!(body_json["error"]["code"], -32600);
        assert!(body_json.get("result").is_none());
    }

    #[tokio::test]
    async fn mcp_request_without_method_echoes_id() {
        let body_json = post_mcp_json(app(), r#"{"jsonrpc":"2.0","id":"abc"}"#).await;

        assert_eq!(body_json["error"]["code"], -32600);
        assert_eq!(body_json["id"], "abc");
    }

    #[tokio::test]
    async fn mcp_accepts_missing_version_and_id() {
        let body_json = post_mcp_json(app(), r#"{"method":"ping","extra":true}"#).await;

        assert_eq!(body_json["jsonrpc"], "2.0");
        assert_eq!(body_json["id"], Value::Null);
        assert_eq!(body_json["result"]["pong"], "2026-02-27T08:30:00.000Z");
    }

    #[tokio::test]
    async fn mcp_list_tools_returns_seeded_tools() {
        let body_json = post_mcp_json(
            app(),
            r#"{"jsonrpc":"2.0","id":2,"method":"list_tools","params":{}}"#,
        )
        .await;

        assert_eq!(body_json["id"], 2);
        assert_eq!(body_json["result"]["tools"][0]["name"], "get_current_time");
        assert_eq!(body_json["result"]["tools"][1]["name"], "generate_text");
    }

    #[tokio::test]
    async fn mcp_read_llm_resource_lists_configured_models() {
        let body_json = post_mcp_json(
            app(),
            r#"{"jsonrpc":"2.0","id":3,"method":"read_resource","params":{"uri":"resource://llm-service"}}"#,
        )
        .await;

        let text = body_json["result"]["contents"][0]["text"]
            .as_str()
            .expect("text content");
        let content: Value = serde_json::from_str(text).expect("json content");
        assert_eq!(content["models"][1], "qwen-plus");
    }

    #[tokio::test]
    async fn mcp_call_tool_returns_content() {
        let body_json = post_mcp_json(
            app(),
            r#"{"jsonrpc":"2.0","id":4,"method":"call_tool","params":{"name":"get_current_time","arguments":{}}}"#,
        )
        .await;

        let text = body_json["result"]["content"][0]["text"]
            .as_str()
            .expect("text content");
        let content: Value = serde_json::from_str(text).expect("json content");
        assert_eq!(content["timezone"], "Asia/Shanghai");
    }

    #[tokio::test]
    async fn mcp_strict_prompt_policy_rejects_missing_prompt() {
        let body_json = post_mcp_json(
            app_with(PromptPolicy::Require),
            r#"{"jsonrpc":"2.0","id":5,"method":"call_tool","params":{"name":"generate_text","arguments":{}}}"#,
        )
        .await;

        assert_eq!(body_json["error"]["code"], -32603);
        assert_eq!(
            body_json["error"]["message"],
            "Missing required parameter: prompt"
        );
    }

    // FixedClock reads 2026-02-27T08:30:00Z.
    const FIXED_UNIX_SECONDS: i64 = 1_772_181_000;

    #[tokio::test]
    async fn time_defaults_to_unix_seconds_only() {
        let (status, body_json) = get_json(app(), "/api/time").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body_json["success"], true);
        assert_eq!(body_json["data"]["timestamp"], FIXED_UNIX_SECONDS);
        assert!(body_json["data"].get("formatted").is_none());
    }

    #[tokio::test]
    async fn time_formats_on_request() {
        let (_, timestamp) = get_json(app(), "/api/time?format=timestamp").await;
        assert_eq!(timestamp["data"], serde_json::json!({ "timestamp": FIXED_UNIX_SECONDS }));

        let (_, formatted) = get_json(app(), "/api/time?format=formatted").await;
        assert_eq!(
            formatted["data"],
            serde_json::json!({ "formatted": "2026-02-27 08:30:00" })
        );

        let (status, both) = get_json(app(), "/api/time?format=both").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            both["data"],
            serde_json::json!({
                "timestamp": FIXED_UNIX_SECONDS,
                "formatted": "2026-02-27 08:30:00"
            })
        );
    }

    #[tokio::test]
    async fn time_rejects_unknown_format() {
        let (status, body_json) = get_json(app(), "/api/time?format=iso").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body_json["success"], false);
        assert_eq!(body_json["error"]["code"], "INVALID_VALUE");
        assert_eq!(
            body_json["error"]["message"],
            "Invalid value for format: iso. Allowed values: timestamp, formatted, both"
        );
    }

    #[tokio::test]
    async fn time_rejects_empty_format() {
        let (status, body_json) = get_json(app(), "/api/time?format=").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body_json["error"]["code"], "INVALID_VALUE");
    }

    #[tokio::test]
    async fn request_id_header_is_echoed_and_tags_logs() {
        let logs = CapturedLogs::default();
        let _guard = logs.install();

        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/mcp")
                    .method("POST")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header("x-request-id", "trace-abc-123")
                    .body(Body::from(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#))
                    .expect("request build"),
            )
            .await
            .expect("request execution");

        assert_eq!(
            response.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
            Some("trace-abc-123")
        );

        let output = logs.output();
        let audit_line = output
            .lines()
            .find(|line| line.contains("mcp action audited"))
            .expect("audit line");
        assert!(audit_line.contains("request_id=trace-abc-123"));
        let summary_line = output
            .lines()
            .find(|line| line.contains("request summary"))
            .expect("summary line");
        assert!(summary_line.contains("request_id=trace-abc-123"));
    }

    #[tokio::test]
    async fn request_id_is_generated_when_absent() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .method("GET")
                    .body(Body::empty())
                    .expect("request build"),
            )
            .await
            .expect("request execution");

        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .expect("generated request id");
        assert!(request_id.starts_with("req-"));
    }
}
