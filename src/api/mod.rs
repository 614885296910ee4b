//! HTTP API: server, wire types, and the SSE activity log.

pub mod logs;
pub mod server;
pub mod types;
