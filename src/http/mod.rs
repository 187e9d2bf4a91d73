//! HTTP transport layer for the Model Context Protocol
//!
//! Binds the dispatcher to `POST /mcp` and serves the health and discovery endpoints.

pub mod handlers;
