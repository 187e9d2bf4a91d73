//! Model Context Protocol resource catalog
//!
//! Resources are addressed by `resource://` URIs. The catalog is assembled once at startup and
//! never changes afterwards; content is produced fresh on every read.

use std::sync::Arc;

use async_trait::async_trait;
use rust_mcp_sdk::schema::Resource;
use serde_json::json;

use crate::capabilities::TimeProvider;
use crate::domain::{current_time_content, ContentItem};
use crate::errors::{McpError, RegistryError};

pub const TIME_SERVICE_URI: &str = "resource://time-service";
pub const LLM_SERVICE_URI: &str = "resource://llm-service";
pub const LLM_CAPABILITIES: [&str; 2] = ["text-generation", "chat-completion"];

#[async_trait]
pub trait ResourceProvider: Send + Sync {
    async fn read(&self) -> Result<Vec<ContentItem>, McpError>;
}

pub struct TimeServiceResource {
    clock: Arc<dyn TimeProvider>,
}

impl TimeServiceResource {
    pub fn new(clock: Arc<dyn TimeProvider>) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl ResourceProvider for TimeServiceResource {
    async fn read(&self) -> Result<Vec<ContentItem>, McpError> {
        Ok(vec![current_time_content(self.clock.as_ref())])
    }
}

/// Static descriptor of the text generation backend; makes no external call.
pub struct LlmServiceResource {
    models: Vec<String>,
}

impl LlmServiceResource {
    pub fn new(models: Vec<String>) -> Self {
        Self { models }
    }
}

#[async_trait]
impl ResourceProvider for LlmServiceResource {
    async fn read(&self) -> Result<Vec<ContentItem>, McpError> {
        Ok(vec![ContentItem::from_json(json!({
            "capabilities": LLM_CAPABILITIES,
            "models": self.models,
        }))])
    }
}

struct ResourceEntry {
    descriptor: Resource,
    provider: Arc<dyn ResourceProvider>,
}

pub struct ResourceRegistry {
    entries: Vec<ResourceEntry>,
}

#[derive(Default)]
pub struct ResourceRegistryBuilder {
    entries: Vec<ResourceEntry>,
}

impl ResourceRegistryBuilder {
    pub fn register(
        mut self,
        descriptor: Resource,
        provider: Arc<dyn ResourceProvider>,
    ) -> Result<Self, RegistryError> {
        if self
            .entries
            .iter()
            .any(|entry| entry.descriptor.uri == descriptor.uri)
        {
            return Err(RegistryError::DuplicateResource(descriptor.uri));
        }

        self.entries.push(ResourceEntry {
            descriptor,
            provider,
        });
        Ok(self)
    }

    pub fn build(self) -> ResourceRegistry {
        ResourceRegistry {
            entries: self.entries,
        }
    }
}

impl ResourceRegistry {
    pub fn builder() -> ResourceRegistryBuilder {
        ResourceRegistryBuilder::default()
    }

    pub fn seeded(
        clock: Arc<dyn TimeProvider>,
        models: Vec<String>,
    ) -> Result<Self, RegistryError> {
        Ok(Self::builder()
            .register(
                resource_descriptor(
                    TIME_SERVICE_URI,
                    "Time Service",
                    "Provides current time information",
                ),
                Arc::new(TimeServiceResource::new(clock)),
            )?
            .register(
                resource_descriptor(
                    LLM_SERVICE_URI,
                    "LLM Service",
                    "Provides language model capabilities",
                ),
                Arc::new(LlmServiceResource::new(models)),
            )?
            .build())
    }

    pub fn list(&self) -> Vec<Resource> {
        self.entries
            .iter()
            .map(|entry| entry.descriptor.clone())
            .collect()
    }

    pub async fn read(&self, uri: &str) -> Result<Vec<ContentItem>, McpError> {
        let entry = self
            .entries
            .iter()
            .find(|entry| entry.descriptor.uri == uri)
            .ok_or_else(|| McpError::ResourceNotFound(uri.to_string()))?;

        entry.provider.read().await
    }
}

pub fn resource_descriptor(uri: &str, name: &str, description: &str) -> Resource {
    Resource {
        annotations: None,
        description: Some(description.to_string()),
        icons: vec![],
        meta: None,
        mime_type: Some("application/json".to_string()),
        name: name.to_string(),
        size: None,
        title: None,
        uri: uri.to_string(),
    }
}
