//! Resource and tool catalogs exposed over the MCP surface

pub mod resources;
pub mod tools;

use serde::Serialize;
use serde_json::{json, Value};

use crate::capabilities::TimeProvider;

/// One block of `contents` / `content` in a read or call result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentItem {
    pub text: String,
}

impl ContentItem {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn from_json(value: Value) -> Self {
        Self {
            text: value.to_string(),
        }
    }
}

/// Shared by `resource://time-service` and the `get_current_time` tool.
pub fn current_time_content(clock: &dyn TimeProvider) -> ContentItem {
    let snapshot = clock.now();
    ContentItem::from_json(json!({
        "currentTime": snapshot.iso_time,
        "timezone": snapshot.timezone,
    }))
}
