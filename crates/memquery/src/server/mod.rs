//! MCP server layer.

pub mod tools;
pub mod types;
