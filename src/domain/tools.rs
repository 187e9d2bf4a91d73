//! Invocable tools exposed via Model Context Protocol
//!
//! Provides `get_current_time` and `generate_text`, delegating to the injected `TimeProvider`
//! and `TextGenerator`.

use std::{str::FromStr, sync::Arc};

use async_trait::async_trait;
use rust_mcp_sdk::{macros, schema::Tool};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::capabilities::{TextGenerator, TimeProvider};
use crate::domain::{current_time_content, ContentItem};
use crate::errors::{McpError, RegistryError};

pub const PROMPT_PLACEHOLDER: &str = "No prompt provided";

#[macros::mcp_tool(name = "get_current_time", description = "Get the current time and date")]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct GetCurrentTimeTool {}

#[macros::mcp_tool(
    name = "generate_text",
    description = "Generate text using language model"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct GenerateTextTool {
    /// The prompt for text generation
    pub prompt: String,
    /// The model to use for generation
    pub model: Option<String>,
}

/// What `generate_text` does when `arguments.prompt` is absent or empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PromptPolicy {
    /// Substitute [`PROMPT_PLACEHOLDER`] and continue.
    #[default]
    Placeholder,
    /// Fail with `MissingParameter`.
    Require,
}

impl FromStr for PromptPolicy {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "placeholder" => Ok(Self::Placeholder),
            "require" | "required" | "strict" => Ok(Self::Require),
            _ => Err(()),
        }
    }
}

#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: Map<String, Value>) -> Result<Vec<ContentItem>, McpError>;
}

pub struct CurrentTimeHandler {
    clock: Arc<dyn TimeProvider>,
}

impl CurrentTimeHandler {
    pub fn new(clock: Arc<dyn TimeProvider>) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl ToolHandler for CurrentTimeHandler {
    async fn call(&self, _arguments: Map<String, Value>) -> Result<Vec<ContentItem>, McpError> {
        Ok(vec![current_time_content(self.clock.as_ref())])
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateTextArgs {
    prompt: Option<String>,
    model: Option<String>,
}

pub struct GenerateTextHandler {
    generator: Arc<dyn TextGenerator>,
    default_model: Option<String>,
    policy: PromptPolicy,
}

impl GenerateTextHandler {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        default_model: Option<String>,
        policy: PromptPolicy,
    ) -> Self {
        Self {
            generator,
            default_model,
            policy,
        }
    }
}

#[async_trait]
impl ToolHandler for GenerateTextHandler {
    async fn call(&self, arguments: Map<String, Value>) -> Result<Vec<ContentItem>, McpError> {
        let args: GenerateTextArgs = serde_json::from_value(Value::Object(arguments))
            .map_err(|err| McpError::invalid_params(err.to_string()))?;

        let prompt = match (args.prompt.filter(|prompt| !prompt.is_empty()), self.policy) {
            (Some(prompt), _) => prompt,
            (None, PromptPolicy::Placeholder) => {
                debug!("generate_text called without prompt, using placeholder");
                PROMPT_PLACEHOLDER.to_string()
            }
            (None, PromptPolicy::Require) => return Err(McpError::MissingParameter("prompt")),
        };
        let model = args.model.or_else(|| self.default_model.clone());

        let text = self.generator.generate(&prompt, model.as_deref()).await?;
        Ok(vec![ContentItem::text(text)])
    }
}

struct ToolEntry {
    descriptor: Tool,
    handler: Arc<dyn ToolHandler>,
}

pub struct ToolRegistry {
    entries: Vec<ToolEntry>,
}

#[derive(Default)]
pub struct ToolRegistryBuilder {
    entries: Vec<ToolEntry>,
}

impl ToolRegistryBuilder {
    pub fn register(
        mut self,
        descriptor: Tool,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<Self, RegistryError> {
        if self
            .entries
            .iter()
            .any(|entry| entry.descriptor.name == descriptor.name)
        {
            return Err(RegistryError::DuplicateTool(descriptor.name));
        }

        self.entries.push(ToolEntry {
            descriptor,
            handler,
        });
        Ok(self)
    }

    pub fn build(self) -> ToolRegistry {
        ToolRegistry {
            entries: self.entries,
        }
    }
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    pub fn seeded(
        clock: Arc<dyn TimeProvider>,
        generator: Arc<dyn TextGenerator>,
        default_model: Option<String>,
        policy: PromptPolicy,
    ) -> Result<Self, RegistryError> {
        Ok(Self::builder()
            .register(
                GetCurrentTimeTool::tool(),
                Arc::new(CurrentTimeHandler::new(clock)),
            )?
            .register(
                GenerateTextTool::tool(),
                Arc::new(GenerateTextHandler::new(generator, default_model, policy)),
            )?
            .build())
    }

    pub fn list(&self) -> Vec<Tool> {
        self.entries
            .iter()
            .map(|entry| entry.descriptor.clone())
            .collect()
    }

    pub async fn call(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<Vec<ContentItem>, McpError> {
        let entry = self
            .entries
            .iter()
            .find(|entry| entry.descriptor.name == name)
            .ok_or_else(|| McpError::ToolNotFound(name.to_string()))?;

        entry.handler.call(arguments).await
    }
}
