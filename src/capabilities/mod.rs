//! External collaborators consumed by the MCP core
//!
//! The dispatcher and registries only see the `TimeProvider` and `TextGenerator` traits; the
//! concrete clock and LLM backends are chosen by the binary at startup.

pub mod llm;
pub mod time;

pub use llm::{DashScopeGenerator, GenerationError, PlaceholderGenerator, TextGenerator};
pub use time::{format_iso, SystemClock, TimeProvider, TimeSnapshot};
