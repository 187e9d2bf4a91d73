//! Model Context Protocol request handling
//!
//! `rpc` holds the JSON-RPC envelope types and response construction; `server` routes requests
//! to the resource and tool catalogs.

pub mod rpc;
pub mod server;
